use std::rc::Rc;

use vexi_api_core::{TypedPath, Value};
use vexi_machine_core::fixtures::{button_machine, pingpong_machine};
use vexi_machine_core::{
    ArtboardInstance, LayerDef, MachineContext, NestedMachine, StateDef, StateMachineDef,
};

fn approx(a: f32, b: f32, eps: f32) {
    assert!((a - b).abs() <= eps, "left={a} right={b} eps={eps}");
}

fn parent_def() -> Rc<StateMachineDef> {
    let mut def = StateMachineDef::new("host");
    def.layers.push(LayerDef::new("main", vec![StateDef::Entry]));
    Rc::new(def)
}

#[test]
fn nested_machines_advance_with_scaled_time() {
    let mut ctx = MachineContext::default();
    let (inner_def, inner_ab) = pingpong_machine();
    let inner = ctx.instantiate(inner_def, inner_ab).unwrap();

    let mut ab = ArtboardInstance::new();
    ab.add_nested(NestedMachine {
        name: "wave".into(),
        instance: Box::new(inner),
        collapsed: false,
        time_scale: 0.5,
    });
    let mut host = ctx.instantiate(parent_def(), ab).unwrap();

    host.advance(0.0);
    host.advance(2.0);

    // 2s of host time at scale 0.5 is 1s into a 5s sweep of 0..100.
    let x = host.artboard().nested()[0]
        .instance
        .artboard()
        .property(&TypedPath::new("rect", "x"))
        .and_then(Value::as_float)
        .unwrap();
    approx(x, 20.0, 1e-3);
}

#[test]
fn collapsed_nested_machines_hold_time_but_keep_inputs() {
    let mut ctx = MachineContext::default();
    let (inner_def, inner_ab) = button_machine();
    let inner = ctx.instantiate(inner_def, inner_ab).unwrap();

    let mut ab = ArtboardInstance::new();
    ab.add_nested(NestedMachine {
        name: "button".into(),
        instance: Box::new(inner),
        collapsed: true,
        time_scale: 1.0,
    });
    let mut host = ctx.instantiate(parent_def(), ab).unwrap();

    host.advance(1.0);
    host.advance(1.0);
    let nested = host.artboard_mut().find_nested_mut("button").unwrap();
    assert_eq!(nested.instance.current_state(0), Some(0)); // never advanced

    // Fire while collapsed, then expand: the pending trigger is latched
    // by the nested machine's first advance and drives it all the way to
    // the pressed state.
    let press = nested.instance.get_trigger("press").unwrap();
    nested.instance.fire(press);
    nested.collapsed = false;
    host.advance(0.0);

    let nested = host.artboard().nested();
    assert_eq!(nested[0].instance.current_state(0), Some(2));
}
