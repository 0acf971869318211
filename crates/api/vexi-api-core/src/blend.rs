//! Linear mixing of Values.
//!
//! Cross-fades and blend states combine poses with a weight in [0,1].
//! Continuous kinds interpolate component-wise; discrete kinds (Bool/Text)
//! step at t >= 0.5 since a half-mixed boolean has no meaning.

use crate::value::Value;

/// Scalar linear interpolation.
#[inline]
pub fn lerp(a: f32, b: f32, t: f32) -> f32 {
    a + (b - a) * t
}

/// Step behavior for discrete kinds: hold the left value.
#[inline]
pub fn step_value(left: &Value) -> Value {
    left.clone()
}

/// Mix `a` toward `b` by weight `t`.
///
/// Mismatched kinds fail soft: the dominant side (by the 0.5 threshold)
/// wins outright rather than producing a hybrid.
pub fn lerp_value(a: &Value, b: &Value, t: f32) -> Value {
    let t = t.clamp(0.0, 1.0);
    match (a, b) {
        (Value::Float(x), Value::Float(y)) => Value::Float(lerp(*x, *y, t)),
        (Value::Vec2(x), Value::Vec2(y)) => {
            Value::Vec2([lerp(x[0], y[0], t), lerp(x[1], y[1], t)])
        }
        (Value::ColorRgba(x), Value::ColorRgba(y)) => Value::ColorRgba([
            lerp(x[0], y[0], t),
            lerp(x[1], y[1], t),
            lerp(x[2], y[2], t),
            lerp(x[3], y[3], t),
        ]),
        // Discrete kinds and mismatches: threshold pick.
        _ => {
            if t >= 0.5 {
                b.clone()
            } else {
                a.clone()
            }
        }
    }
}

/// Scale a value's numeric components by `w` and add into `acc`.
/// Used by direct-weight blending where weights are applied as authored
/// (no renormalization). Discrete kinds keep the latest contribution.
pub fn add_weighted(acc: &mut Value, v: &Value, w: f32) {
    match (acc, v) {
        (Value::Float(s), Value::Float(x)) => *s += x * w,
        (Value::Vec2(s), Value::Vec2(x)) => {
            s[0] += x[0] * w;
            s[1] += x[1] * w;
        }
        (Value::ColorRgba(s), Value::ColorRgba(x)) => {
            for i in 0..4 {
                s[i] += x[i] * w;
            }
        }
        (acc @ (Value::Bool(_) | Value::Text(_)), v) => {
            if w > 0.0 {
                *acc = v.clone();
            }
        }
        _ => {
            // Mismatched kind; ignore the contribution to keep fail-soft behavior.
        }
    }
}

/// Zero value of the same kind as `v`, used to seed weighted accumulation.
pub fn zero_like(v: &Value) -> Value {
    match v {
        Value::Float(_) => Value::Float(0.0),
        Value::Vec2(_) => Value::Vec2([0.0, 0.0]),
        Value::ColorRgba(_) => Value::ColorRgba([0.0, 0.0, 0.0, 0.0]),
        Value::Bool(_) => Value::Bool(false),
        Value::Text(_) => Value::Text(String::new()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn lerp_float_midpoint() {
        let v = lerp_value(&Value::f(50.0), &Value::f(433.0), 0.5);
        assert_eq!(v, Value::f(241.5));
    }

    #[test]
    fn discrete_steps_at_half() {
        let a = Value::Bool(false);
        let b = Value::Bool(true);
        assert_eq!(lerp_value(&a, &b, 0.49), Value::Bool(false));
        assert_eq!(lerp_value(&a, &b, 0.5), Value::Bool(true));
    }

    #[test]
    fn weighted_sum_is_not_renormalized() {
        let mut acc = Value::Float(0.0);
        add_weighted(&mut acc, &Value::f(10.0), 0.8);
        add_weighted(&mut acc, &Value::f(10.0), 0.8);
        // 0.8 + 0.8 = 1.6 total weight, applied as authored.
        assert_eq!(acc, Value::f(16.0));
    }
}
