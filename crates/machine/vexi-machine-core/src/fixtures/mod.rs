//! Canned machines shared by integration tests and benches.

use std::rc::Rc;

use vexi_api_core::{TypedPath, Value};

use crate::artboard::ArtboardInstance;
use crate::def::{LayerDef, StateMachineDef};
use crate::hit::HitShape;
use crate::ids::{ComponentId, IdAllocator, InputId, StateIdx, TimelineIdx};
use crate::inputs::InputDef;
use crate::listener::{InputChange, ListenerDef, PointerEventKind};
use crate::state::{Blend1dMember, StateDef};
use crate::timeline::{Interp, Keypoint, LoopMode, Timeline, Track};
use crate::transition::{Comparator, Condition, TransitionDef};

fn keys(values: &[(f32, f32)]) -> Vec<Keypoint> {
    values
        .iter()
        .map(|&(stamp, v)| Keypoint {
            stamp,
            value: Value::f(v),
            interp: Interp::Linear,
        })
        .collect()
}

fn timeline(name: &str, duration_s: f32, loop_mode: LoopMode, tracks: Vec<Track>) -> Timeline {
    Timeline {
        name: name.into(),
        duration_s,
        loop_mode,
        tracks,
    }
}

fn track(path: &str, points: Vec<Keypoint>) -> Track {
    Track {
        path: TypedPath::new(
            path.split('.').next().unwrap_or(path),
            path.split('.').nth(1).unwrap_or(""),
        ),
        points,
    }
}

fn anim(timeline: u32) -> StateDef {
    StateDef::Animation {
        timeline: Some(TimelineIdx(timeline)),
        speed: 1.0,
        loop_override: None,
    }
}

fn rect_artboard() -> ArtboardInstance {
    let mut alloc = IdAllocator::new();
    let mut ab = ArtboardInstance::new();
    ab.add_component(
        alloc.alloc_component(),
        "rect",
        Some(HitShape::Rect {
            x: 0.0,
            y: 0.0,
            w: 100.0,
            h: 100.0,
        }),
        true,
    );
    ab
}

/// A press button: looping idle clip, trigger-driven press clip that
/// returns to idle when it completes.
pub fn button_machine() -> (Rc<StateMachineDef>, ArtboardInstance) {
    let mut def = StateMachineDef::new("button");
    def.inputs.push(InputDef::Trigger {
        name: "press".into(),
    });
    def.timelines.push(timeline(
        "idle",
        2.0,
        LoopMode::Loop,
        vec![track("rect.x", keys(&[(0.0, 0.0), (1.0, 10.0)]))],
    ));
    def.timelines.push(timeline(
        "pressed",
        1.0,
        LoopMode::Once,
        vec![track("rect.x", keys(&[(0.0, 10.0), (1.0, 60.0)]))],
    ));

    let mut layer = LayerDef::new("main", vec![StateDef::Entry, anim(0), anim(1)]);
    layer.add_transition(StateIdx(0), TransitionDef::immediate(StateIdx(1)));
    layer.add_transition(
        StateIdx(1),
        TransitionDef::with_conditions(StateIdx(2), vec![Condition::trigger(InputId(0))]),
    );
    layer.add_transition(
        StateIdx(2),
        TransitionDef::immediate(StateIdx(1)).with_exit_time(1.0),
    );
    def.layers.push(layer);

    (Rc::new(def), rect_artboard())
}

/// Two held poses joined by a 2.5s cross-fade on a bool flip: rect.x
/// rests at 50, fades toward 433.
pub fn slide_machine() -> (Rc<StateMachineDef>, ArtboardInstance) {
    let mut def = StateMachineDef::new("slide");
    def.inputs.push(InputDef::Bool {
        name: "go".into(),
        default: false,
    });
    def.timelines.push(timeline(
        "at_left",
        1.0,
        LoopMode::Loop,
        vec![track("rect.x", keys(&[(0.0, 50.0)]))],
    ));
    def.timelines.push(timeline(
        "at_right",
        1.0,
        LoopMode::Loop,
        vec![track("rect.x", keys(&[(0.0, 433.0)]))],
    ));

    let mut layer = LayerDef::new("main", vec![StateDef::Entry, anim(0), anim(1)]);
    layer.add_transition(StateIdx(0), TransitionDef::immediate(StateIdx(1)));
    layer.add_transition(
        StateIdx(1),
        TransitionDef::with_conditions(StateIdx(2), vec![Condition::bool_is(InputId(0), true)])
            .with_duration(2.5),
    );
    def.layers.push(layer);

    (Rc::new(def), rect_artboard())
}

/// A two-member 1D blend over a number input in [0, 100] driving rect.y.
pub fn blend_machine() -> (Rc<StateMachineDef>, ArtboardInstance) {
    let mut def = StateMachineDef::new("blend");
    def.inputs.push(InputDef::Number {
        name: "amount".into(),
        default: 0.0,
    });
    def.timelines.push(timeline(
        "low",
        1.0,
        LoopMode::Loop,
        vec![track("rect.y", keys(&[(0.0, 0.0)]))],
    ));
    def.timelines.push(timeline(
        "high",
        1.0,
        LoopMode::Loop,
        vec![track("rect.y", keys(&[(0.0, 100.0)]))],
    ));

    let mut layer = LayerDef::new(
        "main",
        vec![
            StateDef::Entry,
            StateDef::Blend1D {
                input: InputId(0),
                members: vec![
                    Blend1dMember {
                        timeline: TimelineIdx(0),
                        position: 0.0,
                    },
                    Blend1dMember {
                        timeline: TimelineIdx(1),
                        position: 100.0,
                    },
                ],
                baseline_reset: false,
            },
        ],
    );
    layer.add_transition(StateIdx(0), TransitionDef::immediate(StateIdx(1)));
    def.layers.push(layer);

    (Rc::new(def), rect_artboard())
}

/// A click listener under an opaque overlay: the button rect spans
/// x 0..100, the overlay covers x 60..160 above it.
pub fn listener_scene() -> (Rc<StateMachineDef>, ArtboardInstance) {
    let mut def = StateMachineDef::new("clickable");
    def.inputs.push(InputDef::Trigger {
        name: "tapped".into(),
    });

    let mut alloc = IdAllocator::new();
    let mut ab = ArtboardInstance::new();
    let button = ab.add_component(
        alloc.alloc_component(),
        "button",
        Some(HitShape::Rect {
            x: 0.0,
            y: 0.0,
            w: 100.0,
            h: 100.0,
        }),
        true,
    );
    ab.add_component(
        alloc.alloc_component(),
        "overlay",
        Some(HitShape::Rect {
            x: 60.0,
            y: 0.0,
            w: 100.0,
            h: 100.0,
        }),
        true,
    );

    let mut listener = ListenerDef::new(PointerEventKind::Click, vec![button]);
    listener.changes.push(InputChange::FireTrigger {
        input: InputId(0),
    });
    listener.reported_event = Some("clicked".into());
    def.listeners.push(listener);

    def.layers
        .push(LayerDef::new("main", vec![StateDef::Entry]));

    (Rc::new(def), ab)
}

/// A 5 second ping-pong clip sweeping rect.x across 0..100.
pub fn pingpong_machine() -> (Rc<StateMachineDef>, ArtboardInstance) {
    let mut def = StateMachineDef::new("pingpong");
    def.timelines.push(timeline(
        "wave",
        5.0,
        LoopMode::PingPong,
        vec![track("rect.x", keys(&[(0.0, 0.0), (1.0, 100.0)]))],
    ));
    let mut layer = LayerDef::new("main", vec![StateDef::Entry, anim(0)]);
    layer.add_transition(StateIdx(0), TransitionDef::immediate(StateIdx(1)));
    def.layers.push(layer);
    (Rc::new(def), rect_artboard())
}

/// Number-gated three-state chain used by first-match and numeric
/// comparator tests: entry -> a; a -> b when n >= 10; a -> c when n >= 5.
pub fn gated_machine() -> (Rc<StateMachineDef>, ArtboardInstance) {
    let mut def = StateMachineDef::new("gated");
    def.inputs.push(InputDef::Number {
        name: "n".into(),
        default: 0.0,
    });
    def.timelines.push(timeline(
        "a",
        1.0,
        LoopMode::Loop,
        vec![track("rect.x", keys(&[(0.0, 1.0)]))],
    ));
    def.timelines.push(timeline(
        "b",
        1.0,
        LoopMode::Loop,
        vec![track("rect.x", keys(&[(0.0, 2.0)]))],
    ));
    def.timelines.push(timeline(
        "c",
        1.0,
        LoopMode::Loop,
        vec![track("rect.x", keys(&[(0.0, 3.0)]))],
    ));

    let mut layer = LayerDef::new("main", vec![StateDef::Entry, anim(0), anim(1), anim(2)]);
    layer.add_transition(StateIdx(0), TransitionDef::immediate(StateIdx(1)));
    layer.add_transition(
        StateIdx(1),
        TransitionDef::with_conditions(
            StateIdx(2),
            vec![Condition::number(InputId(0), Comparator::Ge, 10.0)],
        ),
    );
    layer.add_transition(
        StateIdx(1),
        TransitionDef::with_conditions(
            StateIdx(3),
            vec![Condition::number(InputId(0), Comparator::Ge, 5.0)],
        ),
    );
    def.layers.push(layer);

    (Rc::new(def), rect_artboard())
}

pub fn component_id(ab: &ArtboardInstance, name: &str) -> Option<ComponentId> {
    ab.find(name).map(|c| c.id)
}
