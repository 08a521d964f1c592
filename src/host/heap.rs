//! Managed heap
//!
//! Generational slot arena of managed objects. Each object carries its class,
//! its prototype and an optional private payload owned by the embedder.
//!
//! Objects stay alive while rooted. Collection is explicit: [`Heap::sweep`]
//! removes every unrooted object and hands back what the embedder needs to
//! run finalizers. Handles to swept objects go stale and are never reused
//! for a different object (the slot generation is bumped).

use std::fmt;

use super::class::{Class, Prototype};
use crate::error::{Error, Result};

/// Handle to a managed object. Equality is reference identity.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ObjectId {
    index: u32,
    generation: u32,
}

impl fmt::Display for ObjectId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "object#{}.{}", self.index, self.generation)
    }
}

/// Heap limits
#[derive(Debug, Clone, Default)]
pub struct HeapConfig {
    /// Maximum number of simultaneously live objects; `None` is unbounded
    pub object_limit: Option<usize>,
}

/// A live managed object
pub struct HeapObject<P> {
    class: &'static Class,
    proto: &'static Prototype,
    private: Option<P>,
    roots: u32,
}

impl<P> HeapObject<P> {
    pub fn class(&self) -> &'static Class {
        self.class
    }

    pub fn prototype(&self) -> &'static Prototype {
        self.proto
    }

    pub fn private(&self) -> Option<&P> {
        self.private.as_ref()
    }

    pub fn is_rooted(&self) -> bool {
        self.roots > 0
    }
}

/// An object removed by [`Heap::sweep`], awaiting finalization
pub struct Swept<P> {
    pub id: ObjectId,
    pub class: &'static Class,
    pub private: Option<P>,
}

struct Slot<P> {
    generation: u32,
    object: Option<HeapObject<P>>,
}

/// The managed heap
pub struct Heap<P> {
    slots: Vec<Slot<P>>,
    free_slots: Vec<u32>,
    live: usize,
    config: HeapConfig,
    collections: u64,
}

impl<P> Heap<P> {
    pub fn new(config: HeapConfig) -> Self {
        Heap {
            slots: Vec::new(),
            free_slots: Vec::new(),
            live: 0,
            config,
            collections: 0,
        }
    }

    /// Allocate an unrooted object.
    ///
    /// Fails with [`Error::OutOfMemory`] when the object limit is reached; the
    /// heap is left untouched.
    pub fn alloc(
        &mut self,
        class: &'static Class,
        proto: &'static Prototype,
        private: Option<P>,
    ) -> Result<ObjectId> {
        if self.config.object_limit.is_some_and(|limit| self.live >= limit) {
            return Err(Error::OutOfMemory);
        }

        let object = HeapObject {
            class,
            proto,
            private,
            roots: 0,
        };

        let index = match self.free_slots.pop() {
            Some(index) => {
                self.slots[index as usize].object = Some(object);
                index
            }
            None => {
                self.slots.push(Slot {
                    generation: 0,
                    object: Some(object),
                });
                (self.slots.len() - 1) as u32
            }
        };
        self.live += 1;

        Ok(ObjectId {
            index,
            generation: self.slots[index as usize].generation,
        })
    }

    pub fn get(&self, id: ObjectId) -> Option<&HeapObject<P>> {
        let slot = self.slots.get(id.index as usize)?;
        if slot.generation != id.generation {
            return None;
        }
        slot.object.as_ref()
    }

    fn get_mut(&mut self, id: ObjectId) -> Option<&mut HeapObject<P>> {
        let slot = self.slots.get_mut(id.index as usize)?;
        if slot.generation != id.generation {
            return None;
        }
        slot.object.as_mut()
    }

    #[inline]
    pub fn is_live(&self, id: ObjectId) -> bool {
        self.get(id).is_some()
    }

    /// Private payload of a live object
    pub fn private(&self, id: ObjectId) -> Option<&P> {
        self.get(id)?.private()
    }

    /// Add a root to a live object
    pub fn root(&mut self, id: ObjectId) -> Result<()> {
        let object = self.get_mut(id).ok_or_else(|| stale(id))?;
        object.roots += 1;
        Ok(())
    }

    /// Drop one root from a live object
    pub fn unroot(&mut self, id: ObjectId) -> Result<()> {
        let object = self.get_mut(id).ok_or_else(|| stale(id))?;
        if object.roots == 0 {
            return Err(Error::invalid(format!("{} is not rooted", id)));
        }
        object.roots -= 1;
        Ok(())
    }

    /// Remove every unrooted object.
    ///
    /// The returned objects are already unreachable through their handles.
    pub fn sweep(&mut self) -> Vec<Swept<P>> {
        let mut swept = Vec::new();
        for (index, slot) in self.slots.iter_mut().enumerate() {
            let garbage = slot.object.as_ref().is_some_and(|o| !o.is_rooted());
            if !garbage {
                continue;
            }
            let Some(object) = slot.object.take() else {
                continue;
            };
            let id = ObjectId {
                index: index as u32,
                generation: slot.generation,
            };
            slot.generation = slot.generation.wrapping_add(1);
            self.free_slots.push(index as u32);
            swept.push(Swept {
                id,
                class: object.class,
                private: object.private,
            });
        }
        self.live -= swept.len();
        self.collections += 1;
        swept
    }

    /// Number of live objects
    pub fn live_objects(&self) -> usize {
        self.live
    }

    /// Number of completed sweeps
    pub fn collections(&self) -> u64 {
        self.collections
    }
}

pub(crate) fn stale(id: ObjectId) -> Error {
    Error::type_error(format!("{} is no longer alive", id))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::host::class::{OBJECT_PROTO, PLAIN_CLASS};

    fn heap(limit: Option<usize>) -> Heap<u32> {
        Heap::new(HeapConfig {
            object_limit: limit,
        })
    }

    #[test]
    fn test_alloc_and_private() {
        let mut heap = heap(None);
        let id = heap.alloc(&PLAIN_CLASS, &OBJECT_PROTO, Some(7)).unwrap();
        assert!(heap.is_live(id));
        assert_eq!(heap.private(id), Some(&7));
        assert_eq!(heap.live_objects(), 1);
    }

    #[test]
    fn test_sweep_unrooted_only() {
        let mut heap = heap(None);
        let kept = heap.alloc(&PLAIN_CLASS, &OBJECT_PROTO, Some(1)).unwrap();
        let dropped = heap.alloc(&PLAIN_CLASS, &OBJECT_PROTO, Some(2)).unwrap();
        heap.root(kept).unwrap();

        let swept = heap.sweep();
        assert_eq!(swept.len(), 1);
        assert_eq!(swept[0].id, dropped);
        assert_eq!(swept[0].private, Some(2));
        assert!(heap.is_live(kept));
        assert!(!heap.is_live(dropped));
        assert_eq!(heap.collections(), 1);
    }

    #[test]
    fn test_stale_handle_not_revived_by_reuse() {
        let mut heap = heap(None);
        let old = heap.alloc(&PLAIN_CLASS, &OBJECT_PROTO, Some(1)).unwrap();
        heap.sweep();
        let new = heap.alloc(&PLAIN_CLASS, &OBJECT_PROTO, Some(2)).unwrap();
        assert_ne!(old, new);
        assert!(heap.get(old).is_none());
        assert!(matches!(heap.root(old), Err(Error::Type(_))));
    }

    #[test]
    fn test_object_limit() {
        let mut heap = heap(Some(1));
        let first = heap.alloc(&PLAIN_CLASS, &OBJECT_PROTO, None).unwrap();
        assert_eq!(
            heap.alloc(&PLAIN_CLASS, &OBJECT_PROTO, None).err(),
            Some(Error::OutOfMemory)
        );
        assert_eq!(heap.live_objects(), 1);

        heap.sweep();
        assert!(!heap.is_live(first));
        assert!(heap.alloc(&PLAIN_CLASS, &OBJECT_PROTO, None).is_ok());
    }

    #[test]
    fn test_root_counting() {
        let mut heap = heap(None);
        let id = heap.alloc(&PLAIN_CLASS, &OBJECT_PROTO, None).unwrap();
        heap.root(id).unwrap();
        heap.root(id).unwrap();
        heap.unroot(id).unwrap();
        assert!(heap.sweep().is_empty());

        heap.unroot(id).unwrap();
        assert!(matches!(heap.unroot(id), Err(Error::InvalidOperation(_))));
        assert_eq!(heap.sweep().len(), 1);
    }
}
