//! Transitions: directed edges between layer states, gated by conditions
//! and an optional exit-time threshold.

use serde::{Deserialize, Serialize};

use crate::ids::{InputId, StateIdx};
use crate::inputs::InputBank;

#[derive(Copy, Clone, Debug, Serialize, Deserialize, PartialEq, Eq)]
pub enum Comparator {
    Eq,
    Ne,
    Lt,
    Le,
    Gt,
    Ge,
}

/// Operand a condition compares its input against.
#[derive(Copy, Clone, Debug, Serialize, Deserialize, PartialEq)]
pub enum ConditionValue {
    Bool(bool),
    Number(f32),
}

/// A single predicate over one input.
///
/// Trigger inputs use no operand: the condition holds when the trigger
/// fired this advance cycle. Bools support Eq/Ne only; other comparators
/// on a bool evaluate false.
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
pub struct Condition {
    pub input: InputId,
    #[serde(default = "Condition::default_op")]
    pub op: Comparator,
    #[serde(default)]
    pub value: Option<ConditionValue>,
}

impl Condition {
    fn default_op() -> Comparator {
        Comparator::Eq
    }

    pub fn trigger(input: InputId) -> Self {
        Self {
            input,
            op: Comparator::Eq,
            value: None,
        }
    }

    pub fn bool_is(input: InputId, expected: bool) -> Self {
        Self {
            input,
            op: Comparator::Eq,
            value: Some(ConditionValue::Bool(expected)),
        }
    }

    pub fn number(input: InputId, op: Comparator, operand: f32) -> Self {
        Self {
            input,
            op,
            value: Some(ConditionValue::Number(operand)),
        }
    }

    /// Evaluate against the bank. A condition naming a nonexistent or
    /// kind-mismatched input evaluates false (authoring defect, degrade).
    pub fn evaluate(&self, bank: &InputBank) -> bool {
        match self.value {
            None => bank.fired_by_id(self.input).unwrap_or(false),
            Some(ConditionValue::Bool(expected)) => match bank.bool_by_id(self.input) {
                Some(actual) => match self.op {
                    Comparator::Eq => actual == expected,
                    Comparator::Ne => actual != expected,
                    _ => false,
                },
                None => false,
            },
            Some(ConditionValue::Number(operand)) => match bank.number_by_id(self.input) {
                Some(actual) => match self.op {
                    Comparator::Eq => actual == operand,
                    Comparator::Ne => actual != operand,
                    Comparator::Lt => actual < operand,
                    Comparator::Le => actual <= operand,
                    Comparator::Gt => actual > operand,
                    Comparator::Ge => actual >= operand,
                },
                None => false,
            },
        }
    }
}

/// Directed edge between two states of one layer.
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
pub struct TransitionDef {
    pub to: StateIdx,
    #[serde(default)]
    pub conditions: Vec<Condition>,
    /// Cross-fade duration in seconds; 0 switches instantly.
    #[serde(default)]
    pub duration_s: f32,
    /// Exit-time gate: normalized time of the source state must reach this
    /// before the transition can fire.
    #[serde(default)]
    pub exit_time: Option<f32>,
    /// Whether an edge may re-enter its own source state.
    #[serde(default)]
    pub allow_self: bool,
    /// Freeze the source state's local time for the duration of the fade.
    #[serde(default)]
    pub pause_on_exit: bool,
}

impl TransitionDef {
    pub fn immediate(to: StateIdx) -> Self {
        Self {
            to,
            conditions: Vec::new(),
            duration_s: 0.0,
            exit_time: None,
            allow_self: false,
            pause_on_exit: false,
        }
    }

    pub fn with_conditions(to: StateIdx, conditions: Vec<Condition>) -> Self {
        Self {
            conditions,
            ..Self::immediate(to)
        }
    }

    pub fn with_duration(mut self, duration_s: f32) -> Self {
        self.duration_s = duration_s;
        self
    }

    pub fn with_exit_time(mut self, exit_time: f32) -> Self {
        self.exit_time = Some(exit_time);
        self
    }

    /// All conditions hold and the exit-time gate (if any) passes.
    pub fn is_satisfied(&self, bank: &InputBank, from_normalized_time: f32) -> bool {
        if let Some(gate) = self.exit_time {
            if from_normalized_time < gate {
                return false;
            }
        }
        self.conditions.iter().all(|c| c.evaluate(bank))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::inputs::InputDef;

    #[test]
    fn number_comparators() {
        let mut bank = InputBank::from_defs(&[InputDef::Number {
            name: "n".into(),
            default: 2.0,
        }]);
        let id = InputId(0);
        assert!(Condition::number(id, Comparator::Eq, 2.0).evaluate(&bank));
        assert!(Condition::number(id, Comparator::Ge, 2.0).evaluate(&bank));
        assert!(!Condition::number(id, Comparator::Lt, 2.0).evaluate(&bank));
        let h = bank.get_number("n").unwrap();
        bank.set_number(h, 1.0);
        assert!(Condition::number(id, Comparator::Lt, 2.0).evaluate(&bank));
    }

    #[test]
    fn dangling_input_evaluates_false() {
        let bank = InputBank::from_defs(&[]);
        assert!(!Condition::bool_is(InputId(7), true).evaluate(&bank));
        assert!(!Condition::trigger(InputId(7)).evaluate(&bank));
    }

    #[test]
    fn exit_time_gates_satisfaction() {
        let bank = InputBank::from_defs(&[]);
        let t = TransitionDef::immediate(StateIdx(1)).with_exit_time(0.8);
        assert!(!t.is_satisfied(&bank, 0.5));
        assert!(t.is_satisfied(&bank, 0.8));
    }
}
