//! Runtime input bank: named, typed values driving conditions and listeners.
//!
//! Bool and Number inputs persist across frames. Triggers are one-shot:
//! `fire` marks them pending, the top of the next `advance` latches the
//! pending flag into the scan-visible flag (and clears pending), so a fire
//! is observed by exactly one advance cycle.

use serde::{Deserialize, Serialize};

use crate::ids::InputId;

#[derive(Copy, Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum InputKind {
    Bool,
    Number,
    Trigger,
}

/// Static input declaration on the definition.
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
pub enum InputDef {
    Bool {
        name: String,
        #[serde(default)]
        default: bool,
    },
    Number {
        name: String,
        #[serde(default)]
        default: f32,
    },
    Trigger {
        name: String,
    },
}

impl InputDef {
    pub fn name(&self) -> &str {
        match self {
            InputDef::Bool { name, .. } => name,
            InputDef::Number { name, .. } => name,
            InputDef::Trigger { name } => name,
        }
    }

    pub fn kind(&self) -> InputKind {
        match self {
            InputDef::Bool { .. } => InputKind::Bool,
            InputDef::Number { .. } => InputKind::Number,
            InputDef::Trigger { .. } => InputKind::Trigger,
        }
    }
}

/// Typed handles returned by name lookup; invalid name/kind pairs yield None.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct BoolHandle(pub(crate) u32);

#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct NumberHandle(pub(crate) u32);

#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct TriggerHandle(pub(crate) u32);

#[derive(Clone, Debug)]
enum Slot {
    Bool { name: String, value: bool },
    Number { name: String, value: f32 },
    Trigger { name: String, pending: bool, fired: bool },
}

impl Slot {
    fn name(&self) -> &str {
        match self {
            Slot::Bool { name, .. } => name,
            Slot::Number { name, .. } => name,
            Slot::Trigger { name, .. } => name,
        }
    }
}

/// Per-instance mutable copy of the declared inputs.
#[derive(Clone, Debug, Default)]
pub struct InputBank {
    slots: Vec<Slot>,
    /// Bumped on every observable mutation; layers re-scan when it moves.
    revision: u64,
}

impl InputBank {
    pub fn from_defs(defs: &[InputDef]) -> Self {
        let slots = defs
            .iter()
            .map(|d| match d {
                InputDef::Bool { name, default } => Slot::Bool {
                    name: name.clone(),
                    value: *default,
                },
                InputDef::Number { name, default } => Slot::Number {
                    name: name.clone(),
                    value: *default,
                },
                InputDef::Trigger { name } => Slot::Trigger {
                    name: name.clone(),
                    pending: false,
                    fired: false,
                },
            })
            .collect();
        Self { slots, revision: 0 }
    }

    #[inline]
    pub fn revision(&self) -> u64 {
        self.revision
    }

    pub fn len(&self) -> usize {
        self.slots.len()
    }

    pub fn is_empty(&self) -> bool {
        self.slots.is_empty()
    }

    fn index_of(&self, name: &str) -> Option<usize> {
        self.slots.iter().position(|s| s.name() == name)
    }

    pub fn get_bool(&self, name: &str) -> Option<BoolHandle> {
        match self.index_of(name) {
            Some(i) if matches!(self.slots[i], Slot::Bool { .. }) => Some(BoolHandle(i as u32)),
            _ => None,
        }
    }

    pub fn get_number(&self, name: &str) -> Option<NumberHandle> {
        match self.index_of(name) {
            Some(i) if matches!(self.slots[i], Slot::Number { .. }) => Some(NumberHandle(i as u32)),
            _ => None,
        }
    }

    pub fn get_trigger(&self, name: &str) -> Option<TriggerHandle> {
        match self.index_of(name) {
            Some(i) if matches!(self.slots[i], Slot::Trigger { .. }) => {
                Some(TriggerHandle(i as u32))
            }
            _ => None,
        }
    }

    pub fn bool_value(&self, h: BoolHandle) -> bool {
        match self.slots.get(h.0 as usize) {
            Some(Slot::Bool { value, .. }) => *value,
            _ => false,
        }
    }

    /// Returns whether the stored value changed.
    pub fn set_bool(&mut self, h: BoolHandle, v: bool) -> bool {
        if let Some(Slot::Bool { value, .. }) = self.slots.get_mut(h.0 as usize) {
            if *value != v {
                *value = v;
                self.revision += 1;
                return true;
            }
        }
        false
    }

    pub fn number_value(&self, h: NumberHandle) -> f32 {
        match self.slots.get(h.0 as usize) {
            Some(Slot::Number { value, .. }) => *value,
            _ => 0.0,
        }
    }

    /// Returns whether the stored value changed.
    pub fn set_number(&mut self, h: NumberHandle, v: f32) -> bool {
        if let Some(Slot::Number { value, .. }) = self.slots.get_mut(h.0 as usize) {
            if *value != v {
                *value = v;
                self.revision += 1;
                return true;
            }
        }
        false
    }

    pub fn fire(&mut self, h: TriggerHandle) {
        if let Some(Slot::Trigger { pending, .. }) = self.slots.get_mut(h.0 as usize) {
            *pending = true;
            self.revision += 1;
        }
    }

    /// Whether the trigger is visible to the current advance cycle's scan.
    pub fn fired(&self, h: TriggerHandle) -> bool {
        match self.slots.get(h.0 as usize) {
            Some(Slot::Trigger { fired, .. }) => *fired,
            _ => false,
        }
    }

    /// Latch pending trigger fires into the scan-visible flag and clear
    /// pending. Called unconditionally at the top of every advance, before
    /// transition re-scanning.
    pub fn latch_triggers(&mut self) {
        for slot in &mut self.slots {
            if let Slot::Trigger { pending, fired, .. } = slot {
                *fired = *pending;
                *pending = false;
            }
        }
    }

    // By-id access used by conditions and blend states. Out-of-range or
    // kind-mismatched ids fail soft with None.

    pub fn bool_by_id(&self, id: InputId) -> Option<bool> {
        match self.slots.get(id.0 as usize) {
            Some(Slot::Bool { value, .. }) => Some(*value),
            _ => None,
        }
    }

    pub fn number_by_id(&self, id: InputId) -> Option<f32> {
        match self.slots.get(id.0 as usize) {
            Some(Slot::Number { value, .. }) => Some(*value),
            _ => None,
        }
    }

    pub fn fired_by_id(&self, id: InputId) -> Option<bool> {
        match self.slots.get(id.0 as usize) {
            Some(Slot::Trigger { fired, .. }) => Some(*fired),
            _ => None,
        }
    }

    // Returns whether the id resolved to a slot of the right kind.

    pub(crate) fn set_bool_by_id(&mut self, id: InputId, v: bool) -> bool {
        match self.slots.get_mut(id.0 as usize) {
            Some(Slot::Bool { value, .. }) => {
                if *value != v {
                    *value = v;
                    self.revision += 1;
                }
                true
            }
            _ => false,
        }
    }

    pub(crate) fn toggle_bool_by_id(&mut self, id: InputId) -> bool {
        match self.slots.get_mut(id.0 as usize) {
            Some(Slot::Bool { value, .. }) => {
                *value = !*value;
                self.revision += 1;
                true
            }
            _ => false,
        }
    }

    pub(crate) fn set_number_by_id(&mut self, id: InputId, v: f32) -> bool {
        match self.slots.get_mut(id.0 as usize) {
            Some(Slot::Number { value, .. }) => {
                if *value != v {
                    *value = v;
                    self.revision += 1;
                }
                true
            }
            _ => false,
        }
    }

    pub(crate) fn fire_by_id(&mut self, id: InputId) -> bool {
        match self.slots.get_mut(id.0 as usize) {
            Some(Slot::Trigger { pending, .. }) => {
                *pending = true;
                self.revision += 1;
                true
            }
            _ => false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn defs() -> Vec<InputDef> {
        vec![
            InputDef::Bool {
                name: "hover".into(),
                default: false,
            },
            InputDef::Number {
                name: "blend".into(),
                default: 0.5,
            },
            InputDef::Trigger {
                name: "tap".into(),
            },
        ]
    }

    #[test]
    fn handles_are_kind_checked() {
        let bank = InputBank::from_defs(&defs());
        assert!(bank.get_bool("hover").is_some());
        assert!(bank.get_bool("blend").is_none());
        assert!(bank.get_number("blend").is_some());
        assert!(bank.get_trigger("tap").is_some());
        assert!(bank.get_trigger("missing").is_none());
    }

    #[test]
    fn triggers_latch_for_exactly_one_cycle() {
        let mut bank = InputBank::from_defs(&defs());
        let t = bank.get_trigger("tap").unwrap();
        assert!(!bank.fired(t));

        bank.fire(t);
        assert!(!bank.fired(t)); // pending, not yet visible

        bank.latch_triggers();
        assert!(bank.fired(t)); // visible to this cycle's scan

        bank.latch_triggers();
        assert!(!bank.fired(t)); // cleared for the next
    }

    #[test]
    fn revision_moves_only_on_change() {
        let mut bank = InputBank::from_defs(&defs());
        let b = bank.get_bool("hover").unwrap();
        let r0 = bank.revision();
        bank.set_bool(b, false);
        assert_eq!(bank.revision(), r0);
        bank.set_bool(b, true);
        assert!(bank.revision() > r0);
    }
}
