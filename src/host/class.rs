//! Classes and prototypes
//!
//! A [`Class`] decides what happens when an object dies; a [`Prototype`]
//! decides what an object exposes. Prototypes are static tables of accessor
//! and function specs chained through `parent`, so a derived capability set
//! is layered over its base without re-checking anything per call.

use std::fmt;

use super::heap::ObjectId;
use super::value::Value;
use crate::context::{Context, Private};
use crate::error::Result;

/// Property read accessor
pub type Getter = fn(&mut Context, ObjectId) -> Result<Value>;
/// Property write accessor
pub type Setter = fn(&mut Context, ObjectId, Value) -> Result<()>;
/// Native function; receives the receiver and arguments
pub type NativeFn = fn(&mut Context, ObjectId, &[Value]) -> Result<Value>;
/// Called once for each collected object, after it has left the heap
pub type Finalizer = fn(&mut Context, ObjectId, Option<Private>);

/// Accessor property
pub struct PropertySpec {
    pub name: &'static str,
    pub getter: Getter,
    /// `None` makes the property read-only
    pub setter: Option<Setter>,
}

/// Function property
pub struct FunctionSpec {
    pub name: &'static str,
    pub arity: u8,
    pub call: NativeFn,
}

/// Property/function table with an optional parent
pub struct Prototype {
    pub name: &'static str,
    pub parent: Option<&'static Prototype>,
    pub properties: &'static [PropertySpec],
    pub functions: &'static [FunctionSpec],
}

impl Prototype {
    /// This prototype followed by its ancestors
    pub fn chain(&'static self) -> impl Iterator<Item = &'static Prototype> {
        std::iter::successors(Some(self), |p| p.parent)
    }

    /// Find an accessor on this prototype or an ancestor
    pub fn find_property(&'static self, name: &str) -> Option<&'static PropertySpec> {
        self.chain()
            .flat_map(|p| p.properties.iter())
            .find(|spec| spec.name == name)
    }

    /// Find a function on this prototype or an ancestor
    pub fn find_function(&'static self, name: &str) -> Option<&'static FunctionSpec> {
        self.chain()
            .flat_map(|p| p.functions.iter())
            .find(|spec| spec.name == name)
    }

    /// Whether `other` is this prototype or one of its ancestors
    pub fn inherits(&'static self, other: &Prototype) -> bool {
        self.chain().any(|p| std::ptr::eq(p, other))
    }
}

impl fmt::Debug for Prototype {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Prototype")
            .field("name", &self.name)
            .field("parent", &self.parent.map(|p| p.name))
            .finish()
    }
}

/// Object class
pub struct Class {
    pub name: &'static str,
    pub finalize: Option<Finalizer>,
}

impl fmt::Debug for Class {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Class")
            .field("name", &self.name)
            .field("finalize", &self.finalize.is_some())
            .finish()
    }
}

/// Class of objects with no native backing
pub static PLAIN_CLASS: Class = Class {
    name: "Object",
    finalize: None,
};

/// Empty root prototype
pub static OBJECT_PROTO: Prototype = Prototype {
    name: "Object",
    parent: None,
    properties: &[],
    functions: &[],
};
