//! TypedPath parsing and formatting.
//!
//! Grammar (simple, engine-agnostic):
//!   target.field
//! - `target` names a scene component, `field` one of its animatable
//!   properties. Examples: "rectangle.x", "Star-Stroke.color".
//!
//! TypedPath is intentionally simple and string-based; the artboard
//! collaborator resolves it into concrete component properties.

use serde::{de, Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum PathError {
    #[error("empty path")]
    Empty,
    #[error("path '{0}' is missing a '.field' selector")]
    MissingField(String),
    #[error("path '{0}' has an empty segment")]
    EmptySegment(String),
}

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct TypedPath {
    /// Component name.
    pub target: String,
    /// Animatable property on the target.
    pub field: String,
}

impl TypedPath {
    pub fn new(target: impl Into<String>, field: impl Into<String>) -> Self {
        Self {
            target: target.into(),
            field: field.into(),
        }
    }

    /// Parse a "target.field" path string.
    pub fn parse(s: &str) -> Result<Self, PathError> {
        if s.is_empty() {
            return Err(PathError::Empty);
        }
        let Some((target, field)) = s.split_once('.') else {
            return Err(PathError::MissingField(s.to_string()));
        };
        if target.is_empty() || field.is_empty() {
            return Err(PathError::EmptySegment(s.to_string()));
        }
        Ok(Self::new(target, field))
    }
}

impl fmt::Display for TypedPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{}", self.target, self.field)
    }
}

impl FromStr for TypedPath {
    type Err = PathError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        TypedPath::parse(s)
    }
}

// Serialize as a plain "target.field" string so WriteOps stay readable in JSON.
impl Serialize for TypedPath {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.serialize_str(&self.to_string())
    }
}

impl<'de> Deserialize<'de> for TypedPath {
    fn deserialize<D>(deserializer: D) -> Result<TypedPath, D::Error>
    where
        D: Deserializer<'de>,
    {
        let s = String::deserialize(deserializer)?;
        TypedPath::parse(&s).map_err(de::Error::custom)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_target_and_field() {
        let p = TypedPath::parse("rectangle.x").unwrap();
        assert_eq!(p.target, "rectangle");
        assert_eq!(p.field, "x");
        assert_eq!(p.to_string(), "rectangle.x");
    }

    #[test]
    fn rejects_malformed_paths() {
        assert_eq!(TypedPath::parse(""), Err(PathError::Empty));
        assert!(matches!(
            TypedPath::parse("rectangle"),
            Err(PathError::MissingField(_))
        ));
        assert!(matches!(
            TypedPath::parse(".x"),
            Err(PathError::EmptySegment(_))
        ));
    }

    #[test]
    fn roundtrips_through_serde_as_string() {
        let p = TypedPath::new("shape", "y");
        let json = serde_json::to_string(&p).unwrap();
        assert_eq!(json, "\"shape.y\"");
        let back: TypedPath = serde_json::from_str(&json).unwrap();
        assert_eq!(back, p);
    }
}
