//! Native tree store
//!
//! Owns every parsed [`XmlDocument`] until it is explicitly freed. A freed
//! slot is recycled for the next insert under a new generation, so handles
//! to the freed tree never resolve to its successor.

use std::fmt;

use super::document::XmlDocument;
use super::node::{NodeId, DOCUMENT_NODE_ID};

/// Handle to a tree held by a [`TreeStore`]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct TreeId {
    index: u32,
    generation: u32,
}

impl fmt::Display for TreeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "tree#{}.{}", self.index, self.generation)
    }
}

/// Handle to one node of one stored tree
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct NodeRef {
    pub tree: TreeId,
    pub node: NodeId,
}

impl NodeRef {
    pub fn new(tree: TreeId, node: NodeId) -> Self {
        NodeRef { tree, node }
    }

    /// The document node of `tree`
    pub fn document(tree: TreeId) -> Self {
        NodeRef {
            tree,
            node: DOCUMENT_NODE_ID,
        }
    }

    /// Another node of the same tree
    pub fn with_node(self, node: NodeId) -> Self {
        NodeRef { node, ..self }
    }
}

impl fmt::Display for NodeRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/node#{}", self.tree, self.node)
    }
}

struct TreeSlot {
    generation: u32,
    doc: Option<XmlDocument>,
}

/// Slab of native trees
#[derive(Debug, Default)]
pub struct TreeStore {
    slots: Vec<TreeSlot>,
    free_slots: Vec<u32>,
    inserted: u64,
    freed: u64,
}

impl fmt::Debug for TreeSlot {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TreeSlot")
            .field("generation", &self.generation)
            .field("nodes", &self.doc.as_ref().map(XmlDocument::node_count))
            .finish()
    }
}

impl TreeStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Take ownership of a tree
    pub fn insert(&mut self, doc: XmlDocument) -> TreeId {
        self.inserted += 1;
        if let Some(index) = self.free_slots.pop() {
            let slot = &mut self.slots[index as usize];
            slot.doc = Some(doc);
            return TreeId {
                index,
                generation: slot.generation,
            };
        }
        let index = self.slots.len() as u32;
        self.slots.push(TreeSlot {
            generation: 0,
            doc: Some(doc),
        });
        TreeId {
            index,
            generation: 0,
        }
    }

    fn slot(&self, id: TreeId) -> Option<&TreeSlot> {
        self.slots
            .get(id.index as usize)
            .filter(|slot| slot.generation == id.generation)
    }

    fn slot_mut(&mut self, id: TreeId) -> Option<&mut TreeSlot> {
        self.slots
            .get_mut(id.index as usize)
            .filter(|slot| slot.generation == id.generation)
    }

    /// The tree behind `id`; `None` once it has been freed
    pub fn get(&self, id: TreeId) -> Option<&XmlDocument> {
        self.slot(id)?.doc.as_ref()
    }

    pub fn get_mut(&mut self, id: TreeId) -> Option<&mut XmlDocument> {
        self.slot_mut(id)?.doc.as_mut()
    }

    /// Whether `id` still refers to an unfreed tree
    pub fn contains(&self, id: TreeId) -> bool {
        self.get(id).is_some()
    }

    /// Release a tree and every node in it.
    ///
    /// Returns false if the tree was already freed.
    pub fn free(&mut self, id: TreeId) -> bool {
        let Some(slot) = self.slot_mut(id) else {
            return false;
        };
        let Some(doc) = slot.doc.take() else {
            return false;
        };
        slot.generation = slot.generation.wrapping_add(1);
        let nodes = doc.node_count();
        drop(doc);

        self.free_slots.push(id.index);
        self.freed += 1;
        tracing::debug!(
            tree = %id,
            nodes,
            allocated = crate::memory::allocated(),
            "freed native tree"
        );
        true
    }

    /// Number of trees currently held
    pub fn live(&self) -> usize {
        self.slots.iter().filter(|slot| slot.doc.is_some()).count()
    }

    /// Total trees ever inserted
    pub fn inserted(&self) -> u64 {
        self.inserted
    }

    /// Total trees ever freed
    pub fn freed(&self) -> u64 {
        self.freed
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_insert_and_free() {
        let mut store = TreeStore::new();
        let id = store.insert(XmlDocument::new());
        assert!(store.contains(id));
        assert_eq!(store.live(), 1);

        assert!(store.free(id));
        assert!(!store.contains(id));
        assert_eq!(store.live(), 0);
        assert_eq!(store.freed(), 1);
    }

    #[test]
    fn test_double_free_is_refused() {
        let mut store = TreeStore::new();
        let id = store.insert(XmlDocument::new());
        assert!(store.free(id));
        assert!(!store.free(id));
        assert_eq!(store.freed(), 1);
    }

    #[test]
    fn test_slot_reuse_bumps_generation() {
        let mut store = TreeStore::new();
        let a = store.insert(XmlDocument::new());
        store.free(a);
        let b = store.insert(XmlDocument::new());
        assert_eq!(a.index, b.index);
        assert_ne!(a, b);
        assert_eq!(store.inserted(), 2);
        assert_eq!(store.live(), 1);

        // The old handle does not reach the new tree.
        assert!(!store.contains(a));
        assert!(store.get_mut(a).is_none());
        assert!(!store.free(a));
        assert!(store.contains(b));
    }

    #[test]
    fn test_display() {
        let mut store = TreeStore::new();
        let a = store.insert(XmlDocument::new());
        assert_eq!(a.to_string(), "tree#0.0");
        store.free(a);
        let b = store.insert(XmlDocument::new());
        assert_eq!(NodeRef::new(b, 3).to_string(), "tree#0.1/node#3");
    }
}
