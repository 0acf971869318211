//! A live state machine bound to an artboard.
//!
//! One instance owns its input bank, one cursor per layer, the listener
//! group, and the artboard it poses. Driving it is two calls: pointer
//! events between frames, then `advance(dt)` once per frame. Nested
//! machines hosted by the artboard advance recursively with scaled time.

use std::rc::Rc;

use hashbrown::HashMap;

use vexi_api_core::{Value, WriteBatch};

use crate::artboard::ArtboardInstance;
use crate::config::Config;
use crate::def::{DefError, StateMachineDef};
use crate::hit::{hit_test, Vec2};
use crate::ids::ComponentId;
use crate::inputs::{BoolHandle, InputBank, NumberHandle, TriggerHandle};
use crate::layer::LayerCursor;
use crate::listener::{InputChange, ListenerGroup, PointerEventKind};
use crate::pose::PoseBuffer;
use crate::reset_pool::PoolHandle;

#[derive(Debug)]
pub struct StateMachineInstance {
    def: Rc<StateMachineDef>,
    inputs: InputBank,
    layers: Vec<LayerCursor>,
    listeners: ListenerGroup,
    artboard: ArtboardInstance,
    pool: PoolHandle,
    config: Config,
    pose: PoseBuffer,
    /// Events queued by listeners since the last advance.
    pending_events: Vec<String>,
    /// Events surfaced by the most recent advance.
    reported: Vec<String>,
    /// Drag offsets captured per (listener, pointer) for preserve_offset.
    align_offsets: HashMap<(usize, u64), Vec2>,
    state_changes: u64,
    needs_advance: bool,
}

impl StateMachineInstance {
    pub(crate) fn new(
        def: Rc<StateMachineDef>,
        artboard: ArtboardInstance,
        pool: PoolHandle,
        config: Config,
        key: u64,
    ) -> Result<Self, DefError> {
        def.validate()?;
        let inputs = InputBank::from_defs(&def.inputs);
        let mut layers = Vec::with_capacity(def.layers.len());
        for (i, layer) in def.layers.iter().enumerate() {
            let entry = layer.entry_index()?;
            let any = layer.any_index()?;
            layers.push(LayerCursor::instantiate(
                &def, i, entry, any, &inputs, &artboard, &pool, key,
            ));
        }
        let listeners = ListenerGroup::new(&def.listeners);
        let pose = PoseBuffer::with_capacity(config.pose_capacity);
        Ok(Self {
            def,
            inputs,
            layers,
            listeners,
            artboard,
            pool,
            config,
            pose,
            pending_events: Vec::new(),
            reported: Vec::new(),
            align_offsets: HashMap::new(),
            state_changes: 0,
            needs_advance: true,
        })
    }

    #[inline]
    pub fn name(&self) -> &str {
        &self.def.name
    }

    /// Advance every layer by `dt` seconds and flush the composed pose
    /// into the artboard. Returns whether another advance is needed for
    /// the machine to settle.
    pub fn advance(&mut self, dt: f32) -> bool {
        self.inputs.latch_triggers();
        self.reported.clear();
        std::mem::swap(&mut self.reported, &mut self.pending_events);
        self.pose.clear();

        let mut keeps_going = false;
        for layer in &mut self.layers {
            let outcome = layer.advance(dt, &self.def, &self.inputs, &self.artboard, &self.pool);
            self.state_changes += u64::from(outcome.state_changes);
            keeps_going |= outcome.keeps_going;
            layer.apply(&self.def, &mut self.pose);
        }
        self.artboard.apply(&self.pose);
        keeps_going |= self.artboard.advance(dt);

        self.needs_advance = false;
        keeps_going
    }

    // Input access ---------------------------------------------------------

    pub fn get_bool(&self, name: &str) -> Option<BoolHandle> {
        self.inputs.get_bool(name)
    }

    pub fn get_number(&self, name: &str) -> Option<NumberHandle> {
        self.inputs.get_number(name)
    }

    pub fn get_trigger(&self, name: &str) -> Option<TriggerHandle> {
        self.inputs.get_trigger(name)
    }

    pub fn bool_value(&self, handle: BoolHandle) -> bool {
        self.inputs.bool_value(handle)
    }

    pub fn set_bool(&mut self, handle: BoolHandle, value: bool) {
        if self.inputs.set_bool(handle, value) {
            self.needs_advance = true;
        }
    }

    pub fn number_value(&self, handle: NumberHandle) -> f32 {
        self.inputs.number_value(handle)
    }

    pub fn set_number(&mut self, handle: NumberHandle, value: f32) {
        if self.inputs.set_number(handle, value) {
            self.needs_advance = true;
        }
    }

    pub fn fire(&mut self, handle: TriggerHandle) {
        self.inputs.fire(handle);
        self.needs_advance = true;
    }

    // Pointer events -------------------------------------------------------

    pub fn pointer_down(&mut self, pointer: u64, position: Vec2) {
        self.process_pointer(PointerEventKind::Down, pointer, position);
    }

    pub fn pointer_move(&mut self, pointer: u64, position: Vec2) {
        self.process_pointer(PointerEventKind::Move, pointer, position);
    }

    pub fn pointer_up(&mut self, pointer: u64, position: Vec2) {
        self.process_pointer(PointerEventKind::Up, pointer, position);
        self.align_offsets.retain(|(_, p), _| *p != pointer);
    }

    /// Pointer left the artboard entirely.
    pub fn pointer_exit(&mut self, pointer: u64, position: Vec2) {
        self.process_pointer(PointerEventKind::Exit, pointer, position);
        self.align_offsets.retain(|(_, p), _| *p != pointer);
    }

    fn process_pointer(&mut self, kind: PointerEventKind, pointer: u64, position: Vec2) {
        // The early-out covers this machine's listeners only; nested
        // machines judge their own needs, so forwarding must still run.
        if !self.config.listener_early_out || !self.listeners.can_early_out(kind) {
            let hit = self.hit_flags(position);
            let fires =
                self.listeners
                    .process_event(&self.def.listeners, kind, pointer, position, &hit);

            for fire in fires {
                let def = Rc::clone(&self.def);
                let listener = &def.listeners[fire.listener];
                for change in &listener.changes {
                    self.apply_change(change);
                }
                if let Some(target) = listener.align_target {
                    self.align(fire.listener, pointer, target, position, listener.preserve_offset);
                }
                if let Some(event) = &listener.reported_event {
                    if self.pending_events.len() < self.config.max_events_per_tick {
                        self.pending_events.push(event.clone());
                    } else {
                        log::warn!("machine '{}': reported event budget hit, dropping", def.name);
                    }
                }
                self.needs_advance = true;
            }
        }

        for nested in self.artboard.nested_mut() {
            if nested.collapsed {
                continue;
            }
            match kind {
                PointerEventKind::Down => nested.instance.pointer_down(pointer, position),
                PointerEventKind::Up => nested.instance.pointer_up(pointer, position),
                PointerEventKind::Move => nested.instance.pointer_move(pointer, position),
                PointerEventKind::Exit => nested.instance.pointer_exit(pointer, position),
                _ => {}
            }
        }
    }

    /// Per-listener hit flags after occlusion: walking top-most first,
    /// every hit component counts until the first opaque hit, which
    /// occludes everything below it.
    fn hit_flags(&self, position: Vec2) -> Vec<bool> {
        let mut hit_components: Vec<ComponentId> = Vec::new();
        for c in self.artboard.draw_order_top_down() {
            if let Some(shape) = c.placed_shape() {
                if hit_test(&shape, position, self.config.pointer_tolerance) {
                    hit_components.push(c.id);
                    if c.opaque {
                        break;
                    }
                }
            }
        }
        self.def
            .listeners
            .iter()
            .map(|l| l.targets.iter().any(|t| hit_components.contains(t)))
            .collect()
    }

    fn apply_change(&mut self, change: &InputChange) {
        let applied = match change {
            InputChange::SetBool { input, value } => self.inputs.set_bool_by_id(*input, *value),
            InputChange::ToggleBool { input } => self.inputs.toggle_bool_by_id(*input),
            InputChange::SetNumber { input, value } => {
                self.inputs.set_number_by_id(*input, *value)
            }
            InputChange::FireTrigger { input } => self.inputs.fire_by_id(*input),
        };
        if !applied {
            log::warn!(
                "machine '{}': listener change names a missing or mismatched input",
                self.def.name
            );
        }
    }

    fn align(
        &mut self,
        listener: usize,
        pointer: u64,
        target: ComponentId,
        position: Vec2,
        preserve_offset: bool,
    ) {
        let offset = if preserve_offset {
            let current = self
                .artboard
                .component(target)
                .map(|c| {
                    Vec2::new(
                        c.property("x").and_then(Value::as_float).unwrap_or(0.0),
                        c.property("y").and_then(Value::as_float).unwrap_or(0.0),
                    )
                })
                .unwrap_or_default();
            *self
                .align_offsets
                .entry((listener, pointer))
                .or_insert(Vec2::new(current.x - position.x, current.y - position.y))
        } else {
            Vec2::default()
        };
        if let Some(c) = self.artboard.component_mut(target) {
            c.set_property("x", Value::f(position.x + offset.x));
            c.set_property("y", Value::f(position.y + offset.y));
        }
    }

    // Introspection --------------------------------------------------------

    #[inline]
    pub fn needs_advance(&self) -> bool {
        self.needs_advance
    }

    /// Total committed transitions since creation, across all layers.
    #[inline]
    pub fn state_changed_count(&self) -> u64 {
        self.state_changes
    }

    pub fn reported_event_count(&self) -> usize {
        self.reported.len()
    }

    pub fn reported_event(&self, index: usize) -> Option<&str> {
        self.reported.get(index).map(String::as_str)
    }

    /// Timelines currently contributing to the pose, across layers.
    pub fn current_animation_count(&self) -> usize {
        self.current_animations().len()
    }

    pub fn current_animation_by_index(&self, index: usize) -> Option<&str> {
        self.current_animations().get(index).copied()
    }

    fn current_animations(&self) -> Vec<&str> {
        let mut names = Vec::new();
        for layer in &self.layers {
            layer.collect_timeline_names(&self.def, &mut names);
        }
        names
    }

    pub fn layer_count(&self) -> usize {
        self.layers.len()
    }

    /// Index of the current state of a layer, for hosts and tests.
    pub fn current_state(&self, layer: usize) -> Option<usize> {
        self.layers.get(layer).map(LayerCursor::current_state)
    }

    /// The last composed pose as a write batch, for hosts that mirror
    /// property writes into their own scene graph.
    pub fn pose_writes(&self) -> WriteBatch {
        let mut batch = WriteBatch::new();
        for (path, value) in self.pose.iter() {
            batch.set(path.clone(), value.clone());
        }
        batch
    }

    pub fn artboard(&self) -> &ArtboardInstance {
        &self.artboard
    }

    pub fn artboard_mut(&mut self) -> &mut ArtboardInstance {
        &mut self.artboard
    }

    pub fn def(&self) -> &StateMachineDef {
        &self.def
    }
}

impl Drop for StateMachineInstance {
    fn drop(&mut self) {
        for layer in &mut self.layers {
            layer.release_resets(&self.pool);
        }
    }
}
