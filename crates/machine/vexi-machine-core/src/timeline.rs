//! Timelines and playback time math.
//!
//! Model:
//! - Each Track has ordered Keypoints with normalized stamps in [0,1].
//! - Segment interpolation is per left keypoint: Linear or Hold.
//! - Bool/Text values always hold (step) regardless of the declared interp.
//!
//! `TimelineCursor` owns the loop rules shared by animation states:
//! Once clamps at the range end, Loop wraps, PingPong reflects and flips
//! an observable direction flag. Negative speed reverses start/end
//! semantics.

use serde::{Deserialize, Serialize};

use vexi_api_core::{lerp_value, step_value, TypedPath, Value, ValueKind};

/// Segment timing from a keypoint to its successor.
#[derive(Copy, Clone, Debug, Default, Serialize, Deserialize, PartialEq, Eq)]
pub enum Interp {
    #[default]
    Linear,
    Hold,
}

/// A single keypoint in normalized time [0..1].
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
pub struct Keypoint {
    /// Normalized time in [0,1] within the clip duration.
    pub stamp: f32,
    pub value: Value,
    #[serde(default)]
    pub interp: Interp,
}

/// A track targeting a component property with a series of keypoints.
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
pub struct Track {
    pub path: TypedPath,
    pub points: Vec<Keypoint>,
}

/// How playback continues past the clip range.
#[derive(Copy, Clone, Debug, Serialize, Deserialize, PartialEq, Eq)]
pub enum LoopMode {
    Once,
    Loop,
    PingPong,
}

/// A named clip of property tracks.
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
pub struct Timeline {
    pub name: String,
    /// Clip duration in seconds (authoritative for mapping stamps).
    pub duration_s: f32,
    #[serde(default)]
    pub loop_mode: LoopMode,
    pub tracks: Vec<Track>,
}

impl Default for LoopMode {
    fn default() -> Self {
        LoopMode::Once
    }
}

impl Timeline {
    /// Validate basic invariants (monotonic stamps in [0,1], positive duration).
    pub fn validate_basic(&self) -> Result<(), String> {
        if !(self.duration_s > 0.0) {
            return Err(format!("timeline '{}' duration must be > 0", self.name));
        }
        for track in &self.tracks {
            let mut last = -f32::INFINITY;
            for p in &track.points {
                if !p.stamp.is_finite() || p.stamp < 0.0 || p.stamp > 1.0 {
                    return Err(format!(
                        "keypoint stamp must be in [0,1] and finite for '{}'",
                        track.path
                    ));
                }
                if p.stamp < last {
                    return Err(format!(
                        "keypoint stamps must be non-decreasing for '{}'",
                        track.path
                    ));
                }
                last = p.stamp;
            }
        }
        Ok(())
    }
}

/// Find the segment [i, i+1] containing normalized time u and the local
/// position within it. Degenerate cases collapse to a single index.
fn find_segment(points: &[Keypoint], u: f32) -> (usize, usize, f32) {
    let n = points.len();
    if n == 0 {
        return (0, 0, 0.0);
    }
    if n == 1 || u <= points[0].stamp {
        return (0, 0, 0.0);
    }
    if u >= points[n - 1].stamp {
        return (n - 1, n - 1, 0.0);
    }
    for i in 0..(n - 1) {
        let t0 = points[i].stamp;
        let t1 = points[i + 1].stamp;
        if u >= t0 && u <= t1 {
            let denom = (t1 - t0).max(f32::EPSILON);
            let lt = (u - t0) / denom;
            return (i, i + 1, lt.clamp(0.0, 1.0));
        }
    }
    (n - 1, n - 1, 0.0)
}

/// Sample a single track at normalized time u in [0,1].
pub fn sample_track(track: &Track, u: f32) -> Value {
    let points = &track.points;
    match points.len() {
        0 => Value::Float(0.0), // no points: neutral scalar, fail-soft
        1 => points[0].value.clone(),
        _ => {
            let (i0, i1, lt) = find_segment(points, u.clamp(0.0, 1.0));
            if i0 == i1 {
                return points[i0].value.clone();
            }
            let left = &points[i0];
            let right = &points[i1];

            // Step behavior for discrete kinds and Hold segments.
            match left.value.kind() {
                ValueKind::Bool | ValueKind::Text => return step_value(&left.value),
                _ => {}
            }
            if left.interp == Interp::Hold {
                return step_value(&left.value);
            }

            lerp_value(&left.value, &right.value, lt)
        }
    }
}

fn fmod(a: f32, b: f32) -> f32 {
    if b == 0.0 {
        return 0.0;
    }
    let m = a % b;
    if (m < 0.0 && b > 0.0) || (m > 0.0 && b < 0.0) {
        m + b
    } else {
        m
    }
}

/// Playback cursor over one timeline.
///
/// `direction` is externally observable: +1 while playing forward, -1
/// after a ping-pong reflection. `did_loop` reports whether the most
/// recent `advance` crossed a range boundary.
#[derive(Clone, Debug)]
pub struct TimelineCursor {
    time: f32,
    direction: f32,
    did_loop: bool,
    finished: bool,
}

impl TimelineCursor {
    /// Cursor positioned at the natural start for the given speed
    /// (range end when speed is negative).
    pub fn new(duration: f32, speed: f32) -> Self {
        Self {
            time: if speed < 0.0 { duration } else { 0.0 },
            direction: 1.0,
            did_loop: false,
            finished: false,
        }
    }

    #[inline]
    pub fn time(&self) -> f32 {
        self.time
    }

    #[inline]
    pub fn direction(&self) -> f32 {
        self.direction
    }

    #[inline]
    pub fn did_loop(&self) -> bool {
        self.did_loop
    }

    #[inline]
    pub fn is_finished(&self) -> bool {
        self.finished
    }

    /// Normalized time in [0,1].
    pub fn normalized(&self, duration: f32) -> f32 {
        if duration <= 0.0 {
            return 0.0;
        }
        (self.time / duration).clamp(0.0, 1.0)
    }

    pub fn reset(&mut self, duration: f32, speed: f32) {
        *self = Self::new(duration, speed);
    }

    /// Advance by `dt * speed` under the given loop mode.
    /// Returns whether playback still requires future advances.
    pub fn advance(&mut self, dt: f32, duration: f32, mode: LoopMode, speed: f32) -> bool {
        self.did_loop = false;
        if duration <= 0.0 {
            self.finished = true;
            return false;
        }
        let step = dt * speed;
        match mode {
            LoopMode::Once => {
                self.time += step;
                if speed >= 0.0 {
                    if self.time >= duration {
                        self.time = duration;
                        self.finished = true;
                    }
                    if self.time < 0.0 {
                        self.time = 0.0;
                    }
                } else {
                    if self.time <= 0.0 {
                        self.time = 0.0;
                        self.finished = true;
                    }
                    if self.time > duration {
                        self.time = duration;
                    }
                }
                !self.finished
            }
            LoopMode::Loop => {
                let t = self.time + step;
                if t < 0.0 || t > duration {
                    self.did_loop = true;
                }
                let m = fmod(t, duration);
                self.time = if m < 0.0 { m + duration } else { m };
                true
            }
            LoopMode::PingPong => {
                self.time += step * self.direction;
                // Reflect until the cursor lands inside the range; large
                // steps may cross more than one boundary.
                while self.time < 0.0 || self.time > duration {
                    if self.time > duration {
                        self.time = 2.0 * duration - self.time;
                    } else {
                        self.time = -self.time;
                    }
                    self.direction = -self.direction;
                    self.did_loop = true;
                }
                true
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn track_linear(path: &str, keys: &[(f32, f32)]) -> Track {
        Track {
            path: TypedPath::parse(path).unwrap(),
            points: keys
                .iter()
                .map(|(stamp, v)| Keypoint {
                    stamp: *stamp,
                    value: Value::f(*v),
                    interp: Interp::Linear,
                })
                .collect(),
        }
    }

    #[test]
    fn samples_linear_segments() {
        let t = track_linear("rect.x", &[(0.0, 0.0), (1.0, 100.0)]);
        assert_eq!(sample_track(&t, 0.5), Value::f(50.0));
        assert_eq!(sample_track(&t, 0.0), Value::f(0.0));
        assert_eq!(sample_track(&t, 1.0), Value::f(100.0));
        assert_eq!(sample_track(&t, 2.0), Value::f(100.0));
    }

    #[test]
    fn hold_segments_step() {
        let t = Track {
            path: TypedPath::new("rect", "x"),
            points: vec![
                Keypoint {
                    stamp: 0.0,
                    value: Value::f(1.0),
                    interp: Interp::Hold,
                },
                Keypoint {
                    stamp: 1.0,
                    value: Value::f(2.0),
                    interp: Interp::Linear,
                },
            ],
        };
        assert_eq!(sample_track(&t, 0.75), Value::f(1.0));
        assert_eq!(sample_track(&t, 1.0), Value::f(2.0));
    }

    #[test]
    fn ping_pong_reflects_and_flips_direction() {
        let mut c = TimelineCursor::new(5.0, 1.0);
        assert!(c.advance(2.0, 5.0, LoopMode::PingPong, 1.0));
        assert_eq!(c.time(), 2.0);
        assert_eq!(c.direction(), 1.0);
        assert!(!c.did_loop());

        assert!(c.advance(5.0, 5.0, LoopMode::PingPong, 1.0));
        assert_eq!(c.time(), 3.0);
        assert_eq!(c.direction(), -1.0);
        assert!(c.did_loop());
    }

    #[test]
    fn once_clamps_and_finishes() {
        let mut c = TimelineCursor::new(1.0, 1.0);
        assert!(c.advance(0.5, 1.0, LoopMode::Once, 1.0));
        assert!(!c.advance(1.0, 1.0, LoopMode::Once, 1.0));
        assert_eq!(c.time(), 1.0);
        assert!(c.is_finished());
    }

    #[test]
    fn negative_speed_plays_from_range_end() {
        let mut c = TimelineCursor::new(2.0, -1.0);
        assert_eq!(c.time(), 2.0);
        assert!(c.advance(1.0, 2.0, LoopMode::Once, -1.0));
        assert_eq!(c.time(), 1.0);
        assert!(!c.advance(2.0, 2.0, LoopMode::Once, -1.0));
        assert_eq!(c.time(), 0.0);
    }

    #[test]
    fn loop_wraps_and_reports() {
        let mut c = TimelineCursor::new(1.0, 1.0);
        assert!(c.advance(1.5, 1.0, LoopMode::Loop, 1.0));
        assert!(c.did_loop());
        assert!((c.time() - 0.5).abs() < 1e-6);
    }
}
