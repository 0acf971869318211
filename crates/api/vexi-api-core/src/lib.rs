//! vexi-api-core: unified Value & property-write API (core, engine-agnostic)

pub mod blend;
pub mod typed_path;
pub mod value;
pub mod write_ops;

pub use blend::{lerp, lerp_value, step_value};
pub use typed_path::{PathError, TypedPath};
pub use value::{Value, ValueKind};
pub use write_ops::{WriteBatch, WriteOp};
