//! Pose buffers: per-frame property values keyed by typed path.
//!
//! Layers write into a shared PoseBuffer in declared order, so later
//! layers override earlier ones. Cross-fades mix a new value against the
//! value already present for the same path.

use hashbrown::HashMap;

use vexi_api_core::{blend, lerp_value, TypedPath, Value};

#[derive(Clone, Debug, Default)]
pub struct PoseBuffer {
    values: HashMap<TypedPath, Value>,
}

impl PoseBuffer {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_capacity(cap: usize) -> Self {
        Self {
            values: HashMap::with_capacity(cap),
        }
    }

    #[inline]
    pub fn clear(&mut self) {
        self.values.clear();
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.values.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    #[inline]
    pub fn get(&self, path: &TypedPath) -> Option<&Value> {
        self.values.get(path)
    }

    /// Overwrite the value for a path.
    #[inline]
    pub fn set(&mut self, path: TypedPath, value: Value) {
        self.values.insert(path, value);
    }

    /// Mix `value` toward whatever the buffer already holds for `path`.
    /// With no existing value (or mix >= 1) this is a plain set.
    pub fn mix_in(&mut self, path: TypedPath, value: Value, mix: f32) {
        if mix >= 1.0 {
            self.values.insert(path, value);
            return;
        }
        match self.values.get(&path) {
            Some(existing) => {
                let mixed = lerp_value(existing, &value, mix);
                self.values.insert(path, mixed);
            }
            None => {
                self.values.insert(path, value);
            }
        }
    }

    pub fn iter(&self) -> impl Iterator<Item = (&TypedPath, &Value)> {
        self.values.iter()
    }

    /// Copy every entry of `other` into this buffer (plain set semantics).
    pub fn overlay(&mut self, other: &PoseBuffer) {
        for (path, value) in other.iter() {
            self.values.insert(path.clone(), value.clone());
        }
    }
}

/// Weighted accumulation staging for blend states.
///
/// Weights are applied exactly as provided; sums past 1 are an authoring
/// contract, not enforced, and no renormalization happens here.
#[derive(Debug, Default)]
pub struct WeightedAccum {
    sums: HashMap<TypedPath, Value>,
}

impl WeightedAccum {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add(&mut self, path: &TypedPath, value: &Value, weight: f32) {
        if weight <= 0.0 {
            return;
        }
        match self.sums.get_mut(path) {
            Some(acc) => blend::add_weighted(acc, value, weight),
            None => {
                let mut acc = blend::zero_like(value);
                blend::add_weighted(&mut acc, value, weight);
                self.sums.insert(path.clone(), acc);
            }
        }
    }

    /// Write accumulated values into the pose at the given outer mix.
    pub fn write_into(self, pose: &mut PoseBuffer, mix: f32) {
        for (path, value) in self.sums {
            pose.mix_in(path, value, mix);
        }
    }

    pub fn is_empty(&self) -> bool {
        self.sums.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn mix_in_lerps_against_existing() {
        let mut pose = PoseBuffer::new();
        let p = TypedPath::new("rect", "x");
        pose.set(p.clone(), Value::f(50.0));
        pose.mix_in(p.clone(), Value::f(433.0), 0.5);
        assert_eq!(pose.get(&p), Some(&Value::f(241.5)));
    }

    #[test]
    fn accum_keeps_authored_weights() {
        let mut acc = WeightedAccum::new();
        let p = TypedPath::new("rect", "x");
        acc.add(&p, &Value::f(100.0), 0.9);
        acc.add(&p, &Value::f(100.0), 0.9);
        let mut pose = PoseBuffer::new();
        acc.write_into(&mut pose, 1.0);
        assert_eq!(pose.get(&p), Some(&Value::f(180.0)));
    }
}
