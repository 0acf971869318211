//! Core runtime for interactive state-machine animation.
//!
//! The crate is organized around three lifetimes:
//! - definitions (`StateMachineDef` and friends): immutable, serializable,
//!   shared by every instance;
//! - instances (`StateMachineInstance`): per-artboard mutable runtime,
//!   driven by pointer events and `advance(dt)`;
//! - the context (`MachineContext`): creates instances and owns the
//!   reset pool their transitions borrow baseline snapshots from.
//!
//! Rendering, asset loading, and file formats are out of scope; an
//! artboard here is the property store a pose is flushed into plus the
//! hit geometry listeners test against.

pub mod artboard;
pub mod config;
pub mod context;
pub mod def;
pub mod fixtures;
pub mod hit;
pub mod ids;
pub mod inputs;
pub mod instance;
pub mod layer;
pub mod listener;
pub mod pose;
pub mod reset_pool;
pub mod state;
pub mod timeline;
pub mod transition;

pub use artboard::{ArtboardInstance, Component, NestedMachine};
pub use config::Config;
pub use context::MachineContext;
pub use def::{DefError, LayerDef, StateMachineDef};
pub use hit::{hit_test, HitShape, Hittable, PlacedShape, Vec2};
pub use ids::{ComponentId, IdAllocator, InputId, StateIdx, TimelineIdx};
pub use inputs::{BoolHandle, InputBank, InputDef, InputKind, NumberHandle, TriggerHandle};
pub use instance::StateMachineInstance;
pub use listener::{InputChange, ListenerDef, PointerEventKind};
pub use pose::PoseBuffer;
pub use reset_pool::{new_pool_handle, PoolHandle, ResetPool, ResetResource};
pub use state::{Blend1dMember, BlendDirectMember, StateClass, StateDef, StateKind};
pub use timeline::{Interp, Keypoint, LoopMode, Timeline, TimelineCursor, Track};
pub use transition::{Comparator, Condition, ConditionValue, TransitionDef};
