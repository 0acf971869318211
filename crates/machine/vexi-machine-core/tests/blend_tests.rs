use std::rc::Rc;

use vexi_api_core::{TypedPath, Value};
use vexi_machine_core::fixtures::blend_machine;
use vexi_machine_core::{
    ArtboardInstance, BlendDirectMember, IdAllocator, InputDef, InputId, Interp, Keypoint,
    LayerDef, LoopMode, MachineContext, StateDef, StateIdx, StateMachineDef, StateMachineInstance,
    Timeline, TimelineIdx, Track, TransitionDef,
};

fn approx(a: f32, b: f32, eps: f32) {
    assert!((a - b).abs() <= eps, "left={a} right={b} eps={eps}");
}

fn rect_prop(inst: &StateMachineInstance, field: &str) -> f32 {
    inst.artboard()
        .property(&TypedPath::new("rect", field))
        .and_then(Value::as_float)
        .unwrap_or(f32::NAN)
}

#[test]
fn one_dimensional_blend_tracks_its_input() {
    let (def, ab) = blend_machine();
    let mut inst = MachineContext::default().instantiate(def, ab).unwrap();
    inst.advance(0.0);
    approx(rect_prop(&inst, "y"), 0.0, 1e-4);

    let amount = inst.get_number("amount").unwrap();
    inst.set_number(amount, 50.0);
    inst.advance(0.0);
    approx(rect_prop(&inst, "y"), 50.0, 1e-4);

    inst.set_number(amount, 100.0);
    inst.advance(0.0);
    approx(rect_prop(&inst, "y"), 100.0, 1e-4);

    // Out of range clamps to the nearest member.
    inst.set_number(amount, 250.0);
    inst.advance(0.0);
    approx(rect_prop(&inst, "y"), 100.0, 1e-4);
}

#[test]
fn blend_states_keep_the_machine_alive() {
    let (def, ab) = blend_machine();
    let mut inst = MachineContext::default().instantiate(def, ab).unwrap();
    inst.advance(0.0);
    // Long after every member clip's duration, the blend still reports
    // work to do: weights re-evaluate every frame.
    assert!(inst.advance(100.0));
    assert!(inst.advance(100.0));
}

fn const_timeline(name: &str, field: &str, v: f32) -> Timeline {
    Timeline {
        name: name.into(),
        duration_s: 1.0,
        loop_mode: LoopMode::Loop,
        tracks: vec![Track {
            path: TypedPath::new("rect", field),
            points: vec![Keypoint {
                stamp: 0.0,
                value: Value::f(v),
                interp: Interp::Linear,
            }],
        }],
    }
}

fn direct_blend_machine() -> (Rc<StateMachineDef>, ArtboardInstance) {
    let mut def = StateMachineDef::new("direct");
    def.inputs.push(InputDef::Number {
        name: "w_a".into(),
        default: 0.0,
    });
    def.inputs.push(InputDef::Number {
        name: "w_b".into(),
        default: 0.0,
    });
    def.timelines.push(const_timeline("a", "y", 100.0));
    def.timelines.push(const_timeline("b", "y", 100.0));

    let mut layer = LayerDef::new(
        "main",
        vec![
            StateDef::Entry,
            StateDef::BlendDirect {
                members: vec![
                    BlendDirectMember {
                        timeline: TimelineIdx(0),
                        input: InputId(0),
                    },
                    BlendDirectMember {
                        timeline: TimelineIdx(1),
                        input: InputId(1),
                    },
                ],
            },
        ],
    );
    layer.add_transition(StateIdx(0), TransitionDef::immediate(StateIdx(1)));
    def.layers.push(layer);

    let mut alloc = IdAllocator::new();
    let mut ab = ArtboardInstance::new();
    ab.add_component(alloc.alloc_component(), "rect", None, false);
    (Rc::new(def), ab)
}

#[test]
fn direct_blend_applies_weights_as_authored() {
    let (def, ab) = direct_blend_machine();
    let mut inst = MachineContext::default().instantiate(def, ab).unwrap();
    inst.advance(0.0);

    let w_a = inst.get_number("w_a").unwrap();
    let w_b = inst.get_number("w_b").unwrap();

    inst.set_number(w_a, 0.5);
    inst.advance(0.0);
    approx(rect_prop(&inst, "y"), 50.0, 1e-4);

    // Weights summing past 1 are not renormalized.
    inst.set_number(w_a, 0.8);
    inst.set_number(w_b, 0.8);
    inst.advance(0.0);
    approx(rect_prop(&inst, "y"), 160.0, 1e-4);
}
