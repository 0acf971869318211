//! Pointer listeners: declarative pointer-to-input wiring.
//!
//! A listener names target components, a pointer event kind, and the input
//! changes to apply when the event lands on a target. Click is a composed
//! gesture: press and release must both land on a target, tracked per
//! pointer through `GesturePhase`.

use hashbrown::HashMap;
use serde::{Deserialize, Serialize};

use crate::hit::Vec2;
use crate::ids::{ComponentId, InputId};

#[derive(Copy, Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum PointerEventKind {
    Down,
    Up,
    Move,
    Enter,
    Exit,
    Click,
}

/// Input mutation applied when a listener fires.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub enum InputChange {
    SetBool { input: InputId, value: bool },
    ToggleBool { input: InputId },
    SetNumber { input: InputId, value: f32 },
    FireTrigger { input: InputId },
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ListenerDef {
    pub event_kind: PointerEventKind,
    /// Components whose hit area activates this listener. A hit on any
    /// one of them counts; the gesture state is shared across the group.
    pub targets: Vec<ComponentId>,
    #[serde(default)]
    pub changes: Vec<InputChange>,
    /// Component dragged to the pointer position when the listener fires.
    #[serde(default)]
    pub align_target: Option<ComponentId>,
    /// Keep the offset between pointer and component captured at gesture
    /// start instead of snapping the origin to the pointer.
    #[serde(default)]
    pub preserve_offset: bool,
    /// Event name surfaced to the host when the listener fires.
    #[serde(default)]
    pub reported_event: Option<String>,
}

impl ListenerDef {
    pub fn new(event_kind: PointerEventKind, targets: Vec<ComponentId>) -> Self {
        Self {
            event_kind,
            targets,
            changes: Vec::new(),
            align_target: None,
            preserve_offset: false,
            reported_event: None,
        }
    }
}

/// Per-pointer click gesture progress, shared by a listener's targets.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Default)]
pub enum GesturePhase {
    #[default]
    Out,
    Down,
    Clicked,
    Disabled,
}

/// Per-pointer bookkeeping: last position plus per-listener phase and
/// hover flags. Pooled so pointer churn does not reallocate.
#[derive(Debug, Default)]
struct PointerData {
    position: Vec2,
    phases: Vec<GesturePhase>,
    hovering: Vec<bool>,
}

impl PointerData {
    fn reset(&mut self, listeners: usize) {
        self.position = Vec2::default();
        self.phases.clear();
        self.phases.resize(listeners, GesturePhase::Out);
        self.hovering.clear();
        self.hovering.resize(listeners, false);
    }
}

/// A listener firing, surfaced to the instance for input application.
#[derive(Debug, PartialEq)]
pub struct ListenerFire {
    pub listener: usize,
    pub pointer: u64,
    pub position: Vec2,
}

/// Runtime gesture and hover state for one machine's listeners.
#[derive(Debug, Default)]
pub struct ListenerGroup {
    listeners: usize,
    pointers: HashMap<u64, PointerData>,
    free: Vec<PointerData>,
    needs_down: bool,
    needs_up: bool,
    needs_move: bool,
}

impl ListenerGroup {
    pub fn new(listeners: &[ListenerDef]) -> Self {
        let mut group = Self {
            listeners: listeners.len(),
            ..Self::default()
        };
        for l in listeners {
            match l.event_kind {
                PointerEventKind::Down => group.needs_down = true,
                PointerEventKind::Up => group.needs_up = true,
                PointerEventKind::Move | PointerEventKind::Enter | PointerEventKind::Exit => {
                    group.needs_move = true
                }
                PointerEventKind::Click => {
                    group.needs_down = true;
                    group.needs_up = true;
                }
            }
            if l.align_target.is_some() {
                group.needs_move = true;
            }
        }
        group
    }

    /// Whether an event of this kind can be dropped without observable
    /// effect. Conservative: hover and click tracking keep Move/Down/Up
    /// relevant even when no listener names them directly.
    pub fn can_early_out(&self, kind: PointerEventKind) -> bool {
        match kind {
            PointerEventKind::Down => !self.needs_down,
            PointerEventKind::Up => !self.needs_up,
            PointerEventKind::Move | PointerEventKind::Enter => !self.needs_move,
            // Exit must always clear hover state we may be holding.
            PointerEventKind::Exit => !self.needs_move,
            PointerEventKind::Click => false,
        }
    }

    fn pointer(&mut self, id: u64) -> &mut PointerData {
        let listeners = self.listeners;
        self.pointers.entry(id).or_insert_with(|| {
            let mut data = self.free.pop().unwrap_or_default();
            data.reset(listeners);
            data
        })
    }

    /// Forget a pointer, recycling its bookkeeping.
    pub fn release_pointer(&mut self, id: u64) {
        if let Some(data) = self.pointers.remove(&id) {
            self.free.push(data);
        }
    }

    /// Process one pointer event. `hit[i]` says whether the event landed
    /// on a target of listener `i` after occlusion. Returns fired
    /// listeners in declaration order.
    pub fn process_event(
        &mut self,
        defs: &[ListenerDef],
        kind: PointerEventKind,
        pointer: u64,
        position: Vec2,
        hit: &[bool],
    ) -> Vec<ListenerFire> {
        let mut fired = Vec::new();
        let data = self.pointer(pointer);
        data.position = position;

        for (i, def) in defs.iter().enumerate() {
            if data.phases[i] == GesturePhase::Disabled {
                continue;
            }
            let over = hit.get(i).copied().unwrap_or(false);
            let mut fires = false;

            match kind {
                PointerEventKind::Down => {
                    if over {
                        data.phases[i] = GesturePhase::Down;
                        fires = def.event_kind == PointerEventKind::Down;
                    }
                }
                PointerEventKind::Up => {
                    if over && data.phases[i] == GesturePhase::Down {
                        data.phases[i] = GesturePhase::Clicked;
                        fires = matches!(
                            def.event_kind,
                            PointerEventKind::Up | PointerEventKind::Click
                        );
                    } else {
                        data.phases[i] = GesturePhase::Out;
                        fires = over && def.event_kind == PointerEventKind::Up;
                    }
                }
                PointerEventKind::Move => {
                    let was_hovering = data.hovering[i];
                    data.hovering[i] = over;
                    fires = match def.event_kind {
                        PointerEventKind::Move => over,
                        PointerEventKind::Enter => over && !was_hovering,
                        PointerEventKind::Exit => !over && was_hovering,
                        _ => false,
                    };
                }
                PointerEventKind::Exit => {
                    let was_hovering = data.hovering[i];
                    data.hovering[i] = false;
                    data.phases[i] = GesturePhase::Out;
                    fires = was_hovering && def.event_kind == PointerEventKind::Exit;
                }
                // Synthetic kinds are produced here, never consumed.
                PointerEventKind::Enter | PointerEventKind::Click => {}
            }

            if fires {
                fired.push(ListenerFire {
                    listener: i,
                    pointer,
                    position,
                });
            }
        }

        if kind == PointerEventKind::Exit {
            self.release_pointer(pointer);
        }
        fired
    }

    /// Drop all gesture and hover state.
    pub fn reset(&mut self) {
        let ids: Vec<u64> = self.pointers.keys().copied().collect();
        for id in ids {
            self.release_pointer(id);
        }
    }
}
