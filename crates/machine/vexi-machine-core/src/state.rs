//! Layer states as a closed tagged variant.
//!
//! The definition side (`StateDef`) is immutable and shared; the runtime
//! side (`StateCursor`) owns per-instance playback time and blend weights.
//! Dispatch is a flat match per operation rather than virtual calls, and
//! "is this a subtype of X" queries go through the kind-hierarchy table
//! (`StateKind::is_kind_of`).

use serde::{Deserialize, Serialize};

use crate::artboard::ArtboardInstance;
use crate::def::StateMachineDef;
use crate::ids::{InputId, TimelineIdx};
use crate::inputs::InputBank;
use crate::pose::{PoseBuffer, WeightedAccum};
use crate::reset_pool::{PoolHandle, ResetResource};
use crate::timeline::{sample_track, LoopMode, TimelineCursor};

#[derive(Copy, Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum StateKind {
    Entry,
    Exit,
    Any,
    Animation,
    Blend1D,
    BlendDirect,
}

/// Coarse classes forming the kind hierarchy:
/// Pseudo < Base, Playable < Base, Blend < Playable.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum StateClass {
    Base,
    Pseudo,
    Playable,
    Blend,
}

impl StateClass {
    fn parent(self) -> Option<StateClass> {
        match self {
            StateClass::Base => None,
            StateClass::Pseudo | StateClass::Playable => Some(StateClass::Base),
            StateClass::Blend => Some(StateClass::Playable),
        }
    }
}

impl StateKind {
    pub fn class(self) -> StateClass {
        match self {
            StateKind::Entry | StateKind::Exit | StateKind::Any => StateClass::Pseudo,
            StateKind::Animation => StateClass::Playable,
            StateKind::Blend1D | StateKind::BlendDirect => StateClass::Blend,
        }
    }

    /// Transitive membership query over the class hierarchy.
    pub fn is_kind_of(self, class: StateClass) -> bool {
        let mut cursor = Some(self.class());
        while let Some(c) = cursor {
            if c == class {
                return true;
            }
            cursor = c.parent();
        }
        false
    }
}

/// One member of a 1D blend: a timeline pinned at a scalar position.
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
pub struct Blend1dMember {
    pub timeline: TimelineIdx,
    pub position: f32,
}

/// One member of a direct blend: a timeline weighted by its own input.
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
pub struct BlendDirectMember {
    pub timeline: TimelineIdx,
    pub input: InputId,
}

fn default_speed() -> f32 {
    1.0
}

/// Static state declaration within a layer.
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
pub enum StateDef {
    Entry,
    Exit,
    Any,
    Animation {
        /// Unresolved timelines degrade to a zero-duration no-op.
        timeline: Option<TimelineIdx>,
        #[serde(default = "default_speed")]
        speed: f32,
        #[serde(default)]
        loop_override: Option<LoopMode>,
    },
    Blend1D {
        input: InputId,
        members: Vec<Blend1dMember>,
        /// Capture a baseline snapshot when the state is entered, applied
        /// under the blend each frame.
        #[serde(default)]
        baseline_reset: bool,
    },
    BlendDirect {
        members: Vec<BlendDirectMember>,
    },
}

impl StateDef {
    pub fn kind(&self) -> StateKind {
        match self {
            StateDef::Entry => StateKind::Entry,
            StateDef::Exit => StateKind::Exit,
            StateDef::Any => StateKind::Any,
            StateDef::Animation { .. } => StateKind::Animation,
            StateDef::Blend1D { .. } => StateKind::Blend1D,
            StateDef::BlendDirect { .. } => StateKind::BlendDirect,
        }
    }
}

#[derive(Debug)]
pub struct MemberCursor {
    timeline: usize,
    cursor: TimelineCursor,
    /// Weight applied when building the blended pose.
    mix: f32,
    /// Blend1D position or 0 for direct members.
    position: f32,
    /// Direct members read their weight from this input.
    input: Option<InputId>,
}

impl MemberCursor {
    #[inline]
    pub fn mix(&self) -> f32 {
        self.mix
    }
}

/// Runtime counterpart of a `StateDef`.
#[derive(Debug)]
pub enum StateCursor {
    Entry,
    Exit,
    Any,
    Animation {
        timeline: Option<usize>,
        cursor: TimelineCursor,
        speed: f32,
        mode: LoopMode,
    },
    Blend1D {
        input: InputId,
        members: Vec<MemberCursor>,
        reset: Option<ResetResource>,
    },
    BlendDirect {
        members: Vec<MemberCursor>,
    },
}

impl StateCursor {
    /// Build a cursor for the given state, resolving timeline references.
    /// Blend states flagged for baseline reset acquire a pooled snapshot of
    /// the artboard values their member tracks touch.
    pub fn instantiate(
        def: &StateMachineDef,
        state: &StateDef,
        inputs: &InputBank,
        artboard: &ArtboardInstance,
        pool: &PoolHandle,
        owner_key: u64,
    ) -> StateCursor {
        match state {
            StateDef::Entry => StateCursor::Entry,
            StateDef::Exit => StateCursor::Exit,
            StateDef::Any => StateCursor::Any,
            StateDef::Animation {
                timeline,
                speed,
                loop_override,
            } => {
                let resolved = timeline.and_then(|t| {
                    let idx = t.0 as usize;
                    if idx < def.timelines.len() {
                        Some(idx)
                    } else {
                        log::warn!("animation state references missing timeline {}", t.0);
                        None
                    }
                });
                let (duration, mode) = match resolved {
                    Some(idx) => {
                        let tl = &def.timelines[idx];
                        (tl.duration_s, loop_override.unwrap_or(tl.loop_mode))
                    }
                    None => (0.0, LoopMode::Once),
                };
                StateCursor::Animation {
                    timeline: resolved,
                    cursor: TimelineCursor::new(duration, *speed),
                    speed: *speed,
                    mode,
                }
            }
            StateDef::Blend1D {
                input,
                members,
                baseline_reset,
            } => {
                let mut cursors = build_members(
                    def,
                    members.iter().map(|m| (m.timeline, m.position, None)),
                );
                // Bracketing by position expects sorted members.
                cursors.sort_by(|a, b| a.position.total_cmp(&b.position));
                update_1d_mixes(&mut cursors, inputs.number_by_id(*input).unwrap_or(0.0));
                let reset = if *baseline_reset {
                    let mut resource = pool.borrow_mut().acquire(owner_key);
                    capture_baseline(def, artboard, &cursors, resource.snapshot_mut());
                    Some(resource)
                } else {
                    None
                };
                StateCursor::Blend1D {
                    input: *input,
                    members: cursors,
                    reset,
                }
            }
            StateDef::BlendDirect { members } => {
                let mut cursors = build_members(
                    def,
                    members.iter().map(|m| (m.timeline, 0.0, Some(m.input))),
                );
                for m in cursors.iter_mut() {
                    if let Some(id) = m.input {
                        m.mix = inputs.number_by_id(id).unwrap_or(0.0);
                    }
                }
                StateCursor::BlendDirect { members: cursors }
            }
        }
    }

    pub fn kind(&self) -> StateKind {
        match self {
            StateCursor::Entry => StateKind::Entry,
            StateCursor::Exit => StateKind::Exit,
            StateCursor::Any => StateKind::Any,
            StateCursor::Animation { .. } => StateKind::Animation,
            StateCursor::Blend1D { .. } => StateKind::Blend1D,
            StateCursor::BlendDirect { .. } => StateKind::BlendDirect,
        }
    }

    /// Advance local playback time. Returns whether the state still
    /// requires future advances. Blend states always keep going: their
    /// weights re-evaluate every frame even when member clips have
    /// individually finished.
    pub fn advance(&mut self, dt: f32, def: &StateMachineDef, inputs: &InputBank) -> bool {
        match self {
            StateCursor::Entry | StateCursor::Exit | StateCursor::Any => false,
            StateCursor::Animation {
                timeline,
                cursor,
                speed,
                mode,
            } => match timeline {
                Some(idx) => {
                    let tl = &def.timelines[*idx];
                    cursor.advance(dt, tl.duration_s, *mode, *speed)
                }
                None => false,
            },
            StateCursor::Blend1D {
                input,
                members,
                ..
            } => {
                for m in members.iter_mut() {
                    let tl = &def.timelines[m.timeline];
                    m.cursor.advance(dt, tl.duration_s, tl.loop_mode, 1.0);
                }
                update_1d_mixes(members, inputs.number_by_id(*input).unwrap_or(0.0));
                true
            }
            StateCursor::BlendDirect { members } => {
                for m in members.iter_mut() {
                    let tl = &def.timelines[m.timeline];
                    m.cursor.advance(dt, tl.duration_s, tl.loop_mode, 1.0);
                    if let Some(id) = m.input {
                        m.mix = inputs.number_by_id(id).unwrap_or(0.0);
                    }
                }
                true
            }
        }
    }

    /// Write this state's pose into the buffer at the given mix.
    pub fn apply(&self, def: &StateMachineDef, pose: &mut PoseBuffer, mix: f32) {
        match self {
            StateCursor::Entry | StateCursor::Exit | StateCursor::Any => {}
            StateCursor::Animation {
                timeline: Some(idx),
                cursor,
                ..
            } => {
                let tl = &def.timelines[*idx];
                let u = cursor.normalized(tl.duration_s);
                for track in &tl.tracks {
                    pose.mix_in(track.path.clone(), sample_track(track, u), mix);
                }
            }
            StateCursor::Animation { timeline: None, .. } => {}
            StateCursor::Blend1D { members, reset, .. } => {
                if let Some(resource) = reset {
                    for (path, value) in resource.snapshot().iter() {
                        pose.mix_in(path.clone(), value.clone(), mix);
                    }
                }
                apply_members(def, members, pose, mix);
            }
            StateCursor::BlendDirect { members } => {
                apply_members(def, members, pose, mix);
            }
        }
    }

    /// Whether this state has nothing further to play.
    pub fn is_finished(&self) -> bool {
        match self {
            StateCursor::Entry | StateCursor::Exit | StateCursor::Any => true,
            StateCursor::Animation {
                timeline, cursor, ..
            } => timeline.is_none() || cursor.is_finished(),
            StateCursor::Blend1D { .. } | StateCursor::BlendDirect { .. } => false,
        }
    }

    /// Normalized local time used by exit-time gates. Pseudo states and
    /// unresolved animations report 1 so gates never deadlock on them.
    pub fn normalized_time(&self, def: &StateMachineDef) -> f32 {
        match self {
            StateCursor::Animation {
                timeline: Some(idx),
                cursor,
                ..
            } => cursor.normalized(def.timelines[*idx].duration_s),
            StateCursor::Blend1D { members, .. } | StateCursor::BlendDirect { members } => {
                members
                    .first()
                    .map(|m| m.cursor.normalized(def.timelines[m.timeline].duration_s))
                    .unwrap_or(1.0)
            }
            _ => 1.0,
        }
    }

    /// Name of the driving timeline(s), for host introspection.
    pub fn collect_timeline_names<'a>(&self, def: &'a StateMachineDef, out: &mut Vec<&'a str>) {
        match self {
            StateCursor::Animation {
                timeline: Some(idx),
                ..
            } => out.push(def.timelines[*idx].name.as_str()),
            StateCursor::Blend1D { members, .. } | StateCursor::BlendDirect { members } => {
                for m in members {
                    if m.mix > 0.0 {
                        out.push(def.timelines[m.timeline].name.as_str());
                    }
                }
            }
            _ => {}
        }
    }

    /// Give any held reset resource back to the pool. Called when the
    /// cursor is retired (state exited or instance dropped).
    pub fn release_resets(&mut self, pool: &PoolHandle) {
        if let StateCursor::Blend1D { reset, .. } = self {
            if let Some(resource) = reset.take() {
                pool.borrow_mut().release(resource);
            }
        }
    }

    /// Observable ping-pong direction of the primary cursor (+1/-1).
    pub fn direction(&self) -> f32 {
        match self {
            StateCursor::Animation { cursor, .. } => cursor.direction(),
            StateCursor::Blend1D { members, .. } | StateCursor::BlendDirect { members } => {
                members.first().map(|m| m.cursor.direction()).unwrap_or(1.0)
            }
            _ => 1.0,
        }
    }

    /// Local time of the primary cursor, in seconds.
    pub fn local_time(&self) -> f32 {
        match self {
            StateCursor::Animation { cursor, .. } => cursor.time(),
            StateCursor::Blend1D { members, .. } | StateCursor::BlendDirect { members } => {
                members.first().map(|m| m.cursor.time()).unwrap_or(0.0)
            }
            _ => 0.0,
        }
    }

    /// Whether the primary cursor crossed a range boundary last advance.
    pub fn did_loop(&self) -> bool {
        match self {
            StateCursor::Animation { cursor, .. } => cursor.did_loop(),
            _ => false,
        }
    }
}

fn build_members(
    def: &StateMachineDef,
    items: impl Iterator<Item = (TimelineIdx, f32, Option<InputId>)>,
) -> Vec<MemberCursor> {
    let mut out = Vec::new();
    for (timeline, position, input) in items {
        let idx = timeline.0 as usize;
        if idx >= def.timelines.len() {
            log::warn!("blend member references missing timeline {}", timeline.0);
            continue;
        }
        let tl = &def.timelines[idx];
        out.push(MemberCursor {
            timeline: idx,
            cursor: TimelineCursor::new(tl.duration_s, 1.0),
            mix: 0.0,
            position,
            input,
        });
    }
    out
}

/// Select the bracketing pair for `value` and distribute mix weights:
/// the pair splits the weight linearly, everyone else drops to zero.
fn update_1d_mixes(members: &mut [MemberCursor], value: f32) {
    if members.is_empty() {
        return;
    }
    // Binary search for the first member at or above the value.
    let mut start = 0usize;
    let mut end = members.len();
    while start < end {
        let mid = (start + end) / 2;
        if members[mid].position < value {
            start = mid + 1;
        } else {
            end = mid;
        }
    }
    for m in members.iter_mut() {
        m.mix = 0.0;
    }
    if start == 0 {
        // Below the first member.
        members[0].mix = 1.0;
    } else if start >= members.len() {
        // Past the last member.
        members[members.len() - 1].mix = 1.0;
    } else {
        let from = start - 1;
        let from_pos = members[from].position;
        let to_pos = members[start].position;
        if to_pos == from_pos {
            members[start].mix = 1.0;
        } else {
            let t = (value - from_pos) / (to_pos - from_pos);
            members[from].mix = 1.0 - t;
            members[start].mix = t;
        }
    }
}

fn apply_members(def: &StateMachineDef, members: &[MemberCursor], pose: &mut PoseBuffer, mix: f32) {
    let mut accum = WeightedAccum::new();
    for m in members {
        if m.mix <= 0.0 {
            continue;
        }
        let tl = &def.timelines[m.timeline];
        let u = m.cursor.normalized(tl.duration_s);
        for track in &tl.tracks {
            accum.add(&track.path, &sample_track(track, u), m.mix);
        }
    }
    accum.write_into(pose, mix);
}

/// Seed a baseline snapshot from the artboard's current values for every
/// property the member tracks touch, falling back to the first keypoint
/// when the artboard does not carry the property yet.
fn capture_baseline(
    def: &StateMachineDef,
    artboard: &ArtboardInstance,
    members: &[MemberCursor],
    snapshot: &mut PoseBuffer,
) {
    for m in members {
        let tl = &def.timelines[m.timeline];
        for track in &tl.tracks {
            if snapshot.get(&track.path).is_some() {
                continue;
            }
            let value = artboard
                .property(&track.path)
                .cloned()
                .unwrap_or_else(|| sample_track(track, 0.0));
            snapshot.set(track.path.clone(), value);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn member_at(position: f32) -> MemberCursor {
        MemberCursor {
            timeline: 0,
            cursor: TimelineCursor::new(1.0, 1.0),
            mix: 0.0,
            position,
            input: None,
        }
    }

    #[test]
    fn one_dimensional_mixes_bracket_the_value() {
        let mut members = vec![member_at(0.0), member_at(50.0), member_at(100.0)];
        update_1d_mixes(&mut members, 75.0);
        assert_eq!(members[0].mix, 0.0);
        assert!((members[1].mix - 0.5).abs() < 1e-6);
        assert!((members[2].mix - 0.5).abs() < 1e-6);

        // Out-of-range values clamp to the nearest member.
        update_1d_mixes(&mut members, -10.0);
        assert_eq!(members[0].mix, 1.0);
        update_1d_mixes(&mut members, 200.0);
        assert_eq!(members[2].mix, 1.0);
        assert_eq!(members[0].mix, 0.0);
    }

    #[test]
    fn kind_hierarchy_is_transitive() {
        assert!(StateKind::Blend1D.is_kind_of(StateClass::Blend));
        assert!(StateKind::Blend1D.is_kind_of(StateClass::Playable));
        assert!(StateKind::Blend1D.is_kind_of(StateClass::Base));
        assert!(StateKind::Animation.is_kind_of(StateClass::Playable));
        assert!(!StateKind::Animation.is_kind_of(StateClass::Blend));
        assert!(StateKind::Entry.is_kind_of(StateClass::Pseudo));
        assert!(!StateKind::Entry.is_kind_of(StateClass::Playable));
    }
}
