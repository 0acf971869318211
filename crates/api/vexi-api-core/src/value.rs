//! Value: runtime instances of animatable properties.
//! All numeric types use f32.

use serde::{Deserialize, Serialize};

/// Lightweight kind enum for pattern-matching and quick dispatch.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum ValueKind {
    Float,
    Bool,
    Vec2,
    ColorRgba,
    Text,
}

#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
#[serde(tag = "type", content = "data")]
pub enum Value {
    /// Scalar float
    Float(f32),

    /// Boolean (step)
    Bool(bool),

    /// 2D vector
    Vec2([f32; 2]),

    /// RGBA color (linear by convention)
    ColorRgba([f32; 4]),

    /// Text / string; step-only for interpolation
    Text(String),
}

impl Value {
    /// Return the coarse kind of this value.
    #[inline]
    pub fn kind(&self) -> ValueKind {
        match self {
            Value::Float(_) => ValueKind::Float,
            Value::Bool(_) => ValueKind::Bool,
            Value::Vec2(_) => ValueKind::Vec2,
            Value::ColorRgba(_) => ValueKind::ColorRgba,
            Value::Text(_) => ValueKind::Text,
        }
    }

    /// Convenience constructors
    pub fn f(v: f32) -> Self {
        Value::Float(v)
    }

    pub fn vec2(x: f32, y: f32) -> Self {
        Value::Vec2([x, y])
    }

    pub fn color(r: f32, g: f32, b: f32, a: f32) -> Self {
        Value::ColorRgba([r, g, b, a])
    }

    /// Scalar accessor; None for non-float values.
    #[inline]
    pub fn as_float(&self) -> Option<f32> {
        match self {
            Value::Float(v) => Some(*v),
            _ => None,
        }
    }

    #[inline]
    pub fn as_bool(&self) -> Option<bool> {
        match self {
            Value::Bool(v) => Some(*v),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn kinds_match_variants() {
        assert_eq!(Value::f(1.0).kind(), ValueKind::Float);
        assert_eq!(Value::Bool(true).kind(), ValueKind::Bool);
        assert_eq!(Value::vec2(0.0, 1.0).kind(), ValueKind::Vec2);
        assert_eq!(Value::color(1.0, 0.0, 0.0, 1.0).kind(), ValueKind::ColorRgba);
        assert_eq!(Value::Text("x".into()).kind(), ValueKind::Text);
    }
}
