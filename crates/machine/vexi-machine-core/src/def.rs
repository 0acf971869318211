//! Immutable machine definitions.
//!
//! A `StateMachineDef` is authored (or deserialized) once and shared by
//! every instance created from it. Structural defects split two ways:
//! errors (`DefError`) make the definition unusable for a layer, while
//! dangling references degrade at runtime and are logged when an instance
//! is created.

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::ids::{InputId, StateIdx};
use crate::inputs::InputDef;
use crate::listener::ListenerDef;
use crate::state::{StateDef, StateKind};
use crate::timeline::Timeline;
use crate::transition::TransitionDef;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum DefError {
    #[error("layer '{layer}' has no entry state")]
    MissingEntry { layer: String },
    #[error("layer '{layer}' has more than one {kind:?} state")]
    DuplicatePseudoState { layer: String, kind: StateKind },
    #[error("duplicate input name '{name}'")]
    DuplicateInput { name: String },
}

/// One layer: a set of states and, per state, its ordered outgoing edges.
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
pub struct LayerDef {
    pub name: String,
    pub states: Vec<StateDef>,
    /// Outgoing transitions indexed by source state. Order is authoring
    /// order and decides which edge wins when several are satisfied.
    pub transitions: Vec<Vec<TransitionDef>>,
}

impl LayerDef {
    pub fn new(name: impl Into<String>, states: Vec<StateDef>) -> Self {
        let transitions = states.iter().map(|_| Vec::new()).collect();
        Self {
            name: name.into(),
            states,
            transitions,
        }
    }

    pub fn add_transition(&mut self, from: StateIdx, transition: TransitionDef) {
        let idx = from.0 as usize;
        if idx < self.transitions.len() {
            self.transitions[idx].push(transition);
        } else {
            log::warn!(
                "layer '{}': transition from missing state {} dropped",
                self.name,
                from.0
            );
        }
    }

    fn find_unique(&self, kind: StateKind) -> Result<Option<usize>, DefError> {
        let mut found = None;
        for (i, s) in self.states.iter().enumerate() {
            if s.kind() == kind {
                if found.is_some() {
                    return Err(DefError::DuplicatePseudoState {
                        layer: self.name.clone(),
                        kind,
                    });
                }
                found = Some(i);
            }
        }
        Ok(found)
    }

    pub fn entry_index(&self) -> Result<usize, DefError> {
        self.find_unique(StateKind::Entry)?
            .ok_or_else(|| DefError::MissingEntry {
                layer: self.name.clone(),
            })
    }

    pub fn any_index(&self) -> Result<Option<usize>, DefError> {
        self.find_unique(StateKind::Any)
    }

    /// Ordered outgoing edges of a state; empty for out-of-range indexes.
    pub fn edges(&self, state: usize) -> &[TransitionDef] {
        self.transitions
            .get(state)
            .map(Vec::as_slice)
            .unwrap_or(&[])
    }
}

/// Full machine definition: inputs, timelines, layers, and listeners.
#[derive(Clone, Debug, Default, Serialize, Deserialize, PartialEq)]
pub struct StateMachineDef {
    pub name: String,
    #[serde(default)]
    pub inputs: Vec<InputDef>,
    #[serde(default)]
    pub timelines: Vec<Timeline>,
    #[serde(default)]
    pub layers: Vec<LayerDef>,
    #[serde(default)]
    pub listeners: Vec<ListenerDef>,
}

impl StateMachineDef {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Self::default()
        }
    }

    /// Resolve an input by name.
    pub fn input_index(&self, name: &str) -> Option<InputId> {
        self.inputs
            .iter()
            .position(|d| d.name() == name)
            .map(|i| InputId(i as u32))
    }

    /// Structural validation. Errors abort instantiation; dangling
    /// references are only warned about because instances degrade them
    /// to no-ops at runtime.
    pub fn validate(&self) -> Result<(), DefError> {
        for (i, a) in self.inputs.iter().enumerate() {
            if self.inputs[..i].iter().any(|b| b.name() == a.name()) {
                return Err(DefError::DuplicateInput {
                    name: a.name().to_string(),
                });
            }
        }
        for layer in &self.layers {
            layer.entry_index()?;
            layer.any_index()?;
            self.warn_dangling(layer);
        }
        Ok(())
    }

    fn warn_dangling(&self, layer: &LayerDef) {
        for (from, edges) in layer.transitions.iter().enumerate() {
            for t in edges {
                if t.to.0 as usize >= layer.states.len() {
                    log::warn!(
                        "layer '{}': transition from state {} targets missing state {}",
                        layer.name,
                        from,
                        t.to.0
                    );
                }
                for c in &t.conditions {
                    if c.input.0 as usize >= self.inputs.len() {
                        log::warn!(
                            "layer '{}': condition references missing input {}",
                            layer.name,
                            c.input.0
                        );
                    }
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn entry_is_required_and_unique() {
        let mut def = StateMachineDef::new("m");
        def.layers
            .push(LayerDef::new("base", vec![StateDef::Animation {
                timeline: None,
                speed: 1.0,
                loop_override: None,
            }]));
        assert_eq!(
            def.validate(),
            Err(DefError::MissingEntry {
                layer: "base".into()
            })
        );

        def.layers[0] = LayerDef::new("base", vec![StateDef::Entry, StateDef::Entry]);
        assert!(matches!(
            def.validate(),
            Err(DefError::DuplicatePseudoState { .. })
        ));
    }

    #[test]
    fn duplicate_input_names_rejected() {
        let mut def = StateMachineDef::new("m");
        def.layers.push(LayerDef::new("base", vec![StateDef::Entry]));
        def.inputs.push(InputDef::Trigger { name: "go".into() });
        def.inputs.push(InputDef::Bool {
            name: "go".into(),
            default: false,
        });
        assert_eq!(
            def.validate(),
            Err(DefError::DuplicateInput { name: "go".into() })
        );
    }

    #[test]
    fn input_lookup_by_name() {
        let mut def = StateMachineDef::new("m");
        def.inputs.push(InputDef::Trigger { name: "go".into() });
        assert_eq!(def.input_index("go"), Some(InputId(0)));
        assert_eq!(def.input_index("stop"), None);
    }
}
