//! Per-layer runtime: the current state cursor, the transition scan, and
//! cross-fade bookkeeping.
//!
//! Each advance first moves playback time, then runs the transition scan:
//! the current state's edges in authoring order, then the Any state's.
//! The first satisfied edge wins and the scan restarts from the new state,
//! so chains of instant transitions resolve within one advance. A hop
//! guard bounds pathological always-true cycles.

use crate::artboard::ArtboardInstance;
use crate::def::{LayerDef, StateMachineDef};
use crate::inputs::InputBank;
use crate::pose::PoseBuffer;
use crate::reset_pool::{PoolHandle, ResetResource};
use crate::state::StateCursor;
use crate::transition::TransitionDef;

const MAX_HOPS_PER_ADVANCE: u32 = 32;

#[derive(Debug)]
struct Fade {
    from_cursor: StateCursor,
    /// Pose visible the instant the transition fired; the fade baseline.
    snapshot: ResetResource,
    elapsed: f32,
    duration: f32,
    pause_on_exit: bool,
}

#[derive(Copy, Clone, Debug, Default, PartialEq, Eq)]
pub struct LayerOutcome {
    pub keeps_going: bool,
    pub state_changes: u32,
}

#[derive(Debug)]
pub struct LayerCursor {
    layer: usize,
    current: usize,
    cursor: StateCursor,
    fade: Option<Fade>,
    any: Option<usize>,
    /// Pool key shared by this layer's acquisitions, for diagnostics.
    key: u64,
}

impl LayerCursor {
    pub fn instantiate(
        def: &StateMachineDef,
        layer: usize,
        entry: usize,
        any: Option<usize>,
        inputs: &InputBank,
        artboard: &ArtboardInstance,
        pool: &PoolHandle,
        key: u64,
    ) -> Self {
        let cursor = StateCursor::instantiate(
            def,
            &def.layers[layer].states[entry],
            inputs,
            artboard,
            pool,
            key,
        );
        Self {
            layer,
            current: entry,
            cursor,
            fade: None,
            any,
            key,
        }
    }

    #[inline]
    pub fn current_state(&self) -> usize {
        self.current
    }

    #[inline]
    pub fn cursor(&self) -> &StateCursor {
        &self.cursor
    }

    #[inline]
    pub fn is_fading(&self) -> bool {
        self.fade.is_some()
    }

    fn layer_def<'a>(&self, def: &'a StateMachineDef) -> &'a LayerDef {
        &def.layers[self.layer]
    }

    /// First satisfied outgoing edge, scanning the current state's edges
    /// before the Any state's.
    fn scan<'a>(
        &self,
        layer: &'a LayerDef,
        inputs: &InputBank,
        normalized: f32,
    ) -> Option<&'a TransitionDef> {
        let own = layer.edges(self.current).iter();
        let any = self
            .any
            .filter(|&a| a != self.current)
            .map(|a| layer.edges(a))
            .unwrap_or(&[])
            .iter();
        for t in own.chain(any) {
            let to = t.to.0 as usize;
            if to >= layer.states.len() {
                continue;
            }
            if to == self.current && !t.allow_self {
                continue;
            }
            if t.is_satisfied(inputs, normalized) {
                return Some(t);
            }
        }
        None
    }

    fn retire_fade(&mut self, pool: &PoolHandle) {
        if let Some(mut fade) = self.fade.take() {
            fade.from_cursor.release_resets(pool);
            pool.borrow_mut().release(fade.snapshot);
        }
    }

    fn commit(
        &mut self,
        def: &StateMachineDef,
        edge: &TransitionDef,
        inputs: &InputBank,
        artboard: &ArtboardInstance,
        pool: &PoolHandle,
    ) {
        let to = edge.to.0 as usize;
        let next = StateCursor::instantiate(
            def,
            &self.layer_def(def).states[to],
            inputs,
            artboard,
            pool,
            self.key,
        );
        if edge.duration_s > 0.0 {
            let mut snapshot = pool.borrow_mut().acquire(self.key);
            self.apply(def, snapshot.snapshot_mut());
            self.retire_fade(pool);
            let from_cursor = std::mem::replace(&mut self.cursor, next);
            self.fade = Some(Fade {
                from_cursor,
                snapshot,
                elapsed: 0.0,
                duration: edge.duration_s,
                pause_on_exit: edge.pause_on_exit,
            });
        } else {
            self.retire_fade(pool);
            let mut old = std::mem::replace(&mut self.cursor, next);
            old.release_resets(pool);
        }
        self.current = to;
    }

    /// One advance step: move playback, settle fades, run the scan.
    pub fn advance(
        &mut self,
        dt: f32,
        def: &StateMachineDef,
        inputs: &InputBank,
        artboard: &ArtboardInstance,
        pool: &PoolHandle,
    ) -> LayerOutcome {
        let mut still_playing = self.cursor.advance(dt, def, inputs);

        if let Some(fade) = self.fade.as_mut() {
            if !fade.pause_on_exit {
                fade.from_cursor.advance(dt, def, inputs);
            }
            fade.elapsed += dt;
            if fade.elapsed >= fade.duration {
                self.retire_fade(pool);
            }
        }

        let mut state_changes = 0u32;
        let mut hops = 0u32;
        loop {
            let normalized = self.cursor.normalized_time(def);
            let Some(edge) = self.scan(self.layer_def(def), inputs, normalized) else {
                break;
            };
            if hops >= MAX_HOPS_PER_ADVANCE {
                log::warn!(
                    "layer '{}': transition hop guard hit, scan stopped",
                    self.layer_def(def).name
                );
                break;
            }
            self.commit(def, edge, inputs, artboard, pool);
            state_changes += 1;
            hops += 1;
            still_playing = true;
        }

        LayerOutcome {
            keeps_going: still_playing || self.fade.is_some() || !self.cursor.is_finished(),
            state_changes,
        }
    }

    /// Compose this layer's pose: fade baseline first, then the outgoing
    /// state live (unless paused, where the baseline already holds its
    /// frozen values), then the incoming state at the fade mix.
    pub fn apply(&self, def: &StateMachineDef, pose: &mut PoseBuffer) {
        match &self.fade {
            Some(fade) => {
                for (path, value) in fade.snapshot.snapshot().iter() {
                    pose.set(path.clone(), value.clone());
                }
                if !fade.pause_on_exit {
                    fade.from_cursor.apply(def, pose, 1.0);
                }
                let mix = if fade.duration > 0.0 {
                    (fade.elapsed / fade.duration).clamp(0.0, 1.0)
                } else {
                    1.0
                };
                self.cursor.apply(def, pose, mix);
            }
            None => self.cursor.apply(def, pose, 1.0),
        }
    }

    /// Names of timelines currently contributing to this layer.
    pub fn collect_timeline_names<'a>(&self, def: &'a StateMachineDef, out: &mut Vec<&'a str>) {
        if let Some(fade) = &self.fade {
            fade.from_cursor.collect_timeline_names(def, out);
        }
        self.cursor.collect_timeline_names(def, out);
    }

    /// Return every held pool resource. Called when the owning instance
    /// is dropped or reset.
    pub fn release_resets(&mut self, pool: &PoolHandle) {
        self.retire_fade(pool);
        self.cursor.release_resets(pool);
    }
}
