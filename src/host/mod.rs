//! Host runtime
//!
//! The managed side of the bridge: object allocation, a private slot per
//! object, property/function registration through prototypes, and
//! finalization callbacks run when unrooted objects are collected.

pub mod class;
pub mod heap;
pub mod value;

pub use class::{Class, FunctionSpec, NativeFn, Prototype, PropertySpec, OBJECT_PROTO, PLAIN_CLASS};
pub use heap::{Heap, HeapConfig, HeapObject, ObjectId, Swept};
pub use value::{string_arg, Value};
