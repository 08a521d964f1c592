//! Bridge context
//!
//! One managed heap plus the native trees its objects stand for. Every
//! operation runs on the thread that owns the context; collection only
//! happens when [`Context::collect_garbage`] is called, never in the middle
//! of a property access.

use crate::bridge;
use crate::dom::{NodeRef, TreeStore};
use crate::error::{Error, Result};
use crate::host::class::{Class, Prototype, OBJECT_PROTO, PLAIN_CLASS};
use crate::host::heap::{stale, Heap, HeapConfig, ObjectId};
use crate::host::value::Value;

/// Private payload carried by managed objects in this context
pub type Private = NodeRef;

/// Context configuration
#[derive(Debug, Clone, Default)]
pub struct ContextConfig {
    /// Maximum number of simultaneously live managed objects
    pub object_limit: Option<usize>,
}

/// Managed heap and native tree store
pub struct Context {
    heap: Heap<Private>,
    trees: TreeStore,
}

impl Default for Context {
    fn default() -> Self {
        Self::new()
    }
}

impl Context {
    pub fn new() -> Self {
        Self::with_config(ContextConfig::default())
    }

    pub fn with_config(config: ContextConfig) -> Self {
        Context {
            heap: Heap::new(HeapConfig {
                object_limit: config.object_limit,
            }),
            trees: TreeStore::new(),
        }
    }

    pub fn heap(&self) -> &Heap<Private> {
        &self.heap
    }

    pub fn trees(&self) -> &TreeStore {
        &self.trees
    }

    pub(crate) fn trees_mut(&mut self) -> &mut TreeStore {
        &mut self.trees
    }

    pub(crate) fn alloc_object(
        &mut self,
        class: &'static Class,
        proto: &'static Prototype,
        private: Option<Private>,
    ) -> Result<ObjectId> {
        self.heap.alloc(class, proto, private)
    }

    /// Allocate an object with no native backing
    pub fn new_plain_object(&mut self) -> Result<ObjectId> {
        self.heap.alloc(&PLAIN_CLASS, &OBJECT_PROTO, None)
    }

    /// Keep `obj` alive across collections
    pub fn root(&mut self, obj: ObjectId) -> Result<()> {
        self.heap.root(obj)
    }

    /// Release one root taken with [`Context::root`]
    pub fn unroot(&mut self, obj: ObjectId) -> Result<()> {
        self.heap.unroot(obj)
    }

    /// Private payload of a live object; `None` for objects without one
    pub fn private_of(&self, obj: ObjectId) -> Result<Option<Private>> {
        let object = self.heap.get(obj).ok_or_else(|| stale(obj))?;
        Ok(object.private().copied())
    }

    fn prototype_of(&self, obj: ObjectId) -> Result<&'static Prototype> {
        self.heap
            .get(obj)
            .map(|o| o.prototype())
            .ok_or_else(|| stale(obj))
    }

    /// Read a property. Unknown properties read as `Undefined`.
    pub fn get(&mut self, obj: ObjectId, name: &str) -> Result<Value> {
        let proto = self.prototype_of(obj)?;
        match proto.find_property(name) {
            Some(spec) => (spec.getter)(self, obj),
            None => Ok(Value::Undefined),
        }
    }

    /// Write a property through its setter
    pub fn set(&mut self, obj: ObjectId, name: &str, value: Value) -> Result<()> {
        let proto = self.prototype_of(obj)?;
        let spec = proto
            .find_property(name)
            .ok_or_else(|| Error::invalid(format!("cannot set unknown property {}", name)))?;
        match spec.setter {
            Some(setter) => setter(self, obj, value),
            None => Err(Error::invalid(format!("property {} is read-only", name))),
        }
    }

    /// Call a method found on the object's prototype chain
    pub fn call_method(&mut self, obj: ObjectId, name: &str, args: &[Value]) -> Result<Value> {
        let proto = self.prototype_of(obj)?;
        self.call_method_of(proto, name, obj, args)
    }

    /// Call `proto`'s function `name` with an arbitrary receiver
    pub fn call_method_of(
        &mut self,
        proto: &'static Prototype,
        name: &str,
        this: ObjectId,
        args: &[Value],
    ) -> Result<Value> {
        if !self.heap.is_live(this) {
            return Err(stale(this));
        }
        let spec = proto
            .find_function(name)
            .ok_or_else(|| Error::type_error(format!("{} is not a function", name)))?;
        (spec.call)(self, this, args)
    }

    /// Collect every unrooted object and run its finalizer.
    ///
    /// Returns the number of objects collected.
    pub fn collect_garbage(&mut self) -> usize {
        let swept = self.heap.sweep();
        let count = swept.len();
        for object in swept {
            if let Some(finalize) = object.class.finalize {
                finalize(self, object.id, object.private);
            }
        }
        tracing::trace!(
            collected = count,
            live = self.heap.live_objects(),
            "garbage collection finished"
        );
        count
    }

    /// Parse `text` and return the wrapped document
    pub fn parse_from_string(&mut self, text: &str, mime_type: &str) -> Result<ObjectId> {
        bridge::parse_from_string(self, text, mime_type)
    }

    /// Create a managed `DOMParser` object
    pub fn new_dom_parser(&mut self) -> Result<ObjectId> {
        bridge::new_dom_parser(self)
    }

    /// Value of an exported module constant such as `ELEMENT_NODE`
    pub fn module_constant(&self, name: &str) -> Option<Value> {
        bridge::NODE_TYPE_CONSTANTS
            .iter()
            .find(|(constant, _)| *constant == name)
            .map(|(_, value)| Value::Int(*value))
    }
}
