//! Write operations produced by the animation engine to describe property
//! writes into an artboard using typed paths.
//!
//! WriteOp serializes to JSON as:
//!   { "path": "rectangle.x", "value": { "type": "Float", "data": 241.5 } }
//!
//! WriteBatch is a simple Vec<WriteOp> with helpers.

use crate::{typed_path::TypedPath, Value};
use hashbrown::HashMap;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WriteOp {
    pub path: TypedPath,
    pub value: Value,
}

impl WriteOp {
    pub fn new(path: TypedPath, value: Value) -> Self {
        Self { path, value }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct WriteBatch(pub Vec<WriteOp>);

impl WriteBatch {
    pub fn new() -> Self {
        Self(Vec::new())
    }

    #[inline]
    pub fn push(&mut self, op: WriteOp) {
        self.0.push(op);
    }

    #[inline]
    pub fn set(&mut self, path: TypedPath, value: Value) {
        self.0.push(WriteOp { path, value });
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.0.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    #[inline]
    pub fn clear(&mut self) {
        self.0.clear();
    }

    pub fn iter(&self) -> impl Iterator<Item = &WriteOp> {
        self.0.iter()
    }

    /// Collapse to a map keyed by path; later writes win.
    pub fn into_map(self) -> HashMap<TypedPath, Value> {
        let mut map = HashMap::with_capacity(self.0.len());
        for op in self.0 {
            map.insert(op.path, op.value);
        }
        map
    }
}

impl IntoIterator for WriteBatch {
    type Item = WriteOp;
    type IntoIter = std::vec::IntoIter<WriteOp>;

    fn into_iter(self) -> Self::IntoIter {
        self.0.into_iter()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn later_writes_win_in_map_form() {
        let mut batch = WriteBatch::new();
        batch.set(TypedPath::new("rect", "x"), Value::f(1.0));
        batch.set(TypedPath::new("rect", "x"), Value::f(2.0));
        let map = batch.into_map();
        assert_eq!(map.get(&TypedPath::new("rect", "x")), Some(&Value::f(2.0)));
    }
}
