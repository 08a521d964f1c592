//! XML Document - Arena-based native tree
//!
//! Efficient DOM storage with:
//! - Arena allocation for nodes
//! - NodeId indices for traversal
//! - String interning for names and namespace URIs
//! - One opaque side-slot per node for foreign data

use std::any::Any;

use super::node::{NodeId, NodeKind, XmlAttribute, XmlNode, DOCUMENT_NODE_ID};
use super::strings::StringPool;

/// An XML document stored in arena format
///
/// Node 0 is always the document node. Dropping the document releases every
/// node, including anything stored in their side-slots.
#[derive(Debug)]
pub struct XmlDocument {
    /// Arena of nodes
    nodes: Vec<XmlNode>,
    /// Interned strings
    pub strings: StringPool,
    /// Root element node ID (not document node)
    root_element: Option<NodeId>,
}

impl Default for XmlDocument {
    fn default() -> Self {
        Self::new()
    }
}

impl XmlDocument {
    /// Create a document containing only the document node
    pub fn new() -> Self {
        let mut nodes = Vec::with_capacity(64);
        nodes.push(XmlNode::document());
        XmlDocument {
            nodes,
            strings: StringPool::new(),
            root_element: None,
        }
    }

    /// Append `node` as the last child of `parent`, returning its ID.
    ///
    /// The node's links are overwritten to match its position.
    pub fn append_child(&mut self, parent_id: NodeId, mut node: XmlNode) -> NodeId {
        node.parent = Some(parent_id);
        node.prev_sibling = None;
        node.next_sibling = None;

        let is_element = node.is_element();
        let node_id = self.nodes.len() as NodeId;
        self.nodes.push(node);
        self.link_child(parent_id, node_id);

        if is_element && parent_id == DOCUMENT_NODE_ID && self.root_element.is_none() {
            self.root_element = Some(node_id);
        }
        node_id
    }

    /// Link a child node to its parent
    fn link_child(&mut self, parent_id: NodeId, child_id: NodeId) {
        // Get parent's last_child first to avoid borrow issues
        let last_child_opt = self.nodes[parent_id as usize].last_child;

        if let Some(last_child_id) = last_child_opt {
            self.nodes[child_id as usize].prev_sibling = Some(last_child_id);
            self.nodes[last_child_id as usize].next_sibling = Some(child_id);
        } else {
            self.nodes[parent_id as usize].first_child = Some(child_id);
        }
        self.nodes[parent_id as usize].last_child = Some(child_id);
    }

    /// Get root element ID
    pub fn root_element_id(&self) -> Option<NodeId> {
        self.root_element
    }

    /// Get a node by ID
    pub fn get_node(&self, id: NodeId) -> Option<&XmlNode> {
        self.nodes.get(id as usize)
    }

    /// Get a mutable node by ID
    pub fn get_node_mut(&mut self, id: NodeId) -> Option<&mut XmlNode> {
        self.nodes.get_mut(id as usize)
    }

    /// Get total number of nodes
    pub fn node_count(&self) -> usize {
        self.nodes.len()
    }

    /// Kind of a node
    pub fn kind(&self, id: NodeId) -> Option<NodeKind> {
        self.get_node(id).map(|n| n.kind)
    }

    /// The node's name field (local name for elements, target for PIs)
    pub fn node_name(&self, id: NodeId) -> Option<&str> {
        let node = self.get_node(id)?;
        if node.name_id == 0 {
            return None;
        }
        self.strings.get_str(node.name_id)
    }

    /// The node's namespace prefix, if any
    pub fn node_prefix(&self, id: NodeId) -> Option<&str> {
        let node = self.get_node(id)?;
        if node.prefix_id == 0 {
            return None;
        }
        self.strings.get_str(node.prefix_id)
    }

    /// The node's namespace URI, if any
    pub fn namespace_uri(&self, id: NodeId) -> Option<&str> {
        let node = self.get_node(id)?;
        if node.namespace_id == 0 {
            return None;
        }
        self.strings.get_str(node.namespace_id)
    }

    /// Stored content (text, CDATA, comment, PI data)
    pub fn content(&self, id: NodeId) -> Option<&str> {
        self.get_node(id)?.content.as_deref()
    }

    /// Replace a node's content in place.
    ///
    /// Returns false if the node does not exist.
    pub fn set_content(&mut self, id: NodeId, content: impl Into<String>) -> bool {
        match self.get_node_mut(id) {
            Some(node) => {
                node.content = Some(content.into());
                true
            }
            None => false,
        }
    }

    // ------------------------------------------------------------------
    // Links
    // ------------------------------------------------------------------

    pub fn parent(&self, id: NodeId) -> Option<NodeId> {
        self.get_node(id)?.parent
    }

    pub fn first_child(&self, id: NodeId) -> Option<NodeId> {
        self.get_node(id)?.first_child
    }

    pub fn last_child(&self, id: NodeId) -> Option<NodeId> {
        self.get_node(id)?.last_child
    }

    pub fn prev_sibling(&self, id: NodeId) -> Option<NodeId> {
        self.get_node(id)?.prev_sibling
    }

    pub fn next_sibling(&self, id: NodeId) -> Option<NodeId> {
        self.get_node(id)?.next_sibling
    }

    /// Owning document of a node. The document node owns itself.
    pub fn owner_document(&self, id: NodeId) -> Option<NodeId> {
        self.get_node(id).map(|_| DOCUMENT_NODE_ID)
    }

    /// Iterate over children of a node
    pub fn children(&self, id: NodeId) -> ChildIter<'_> {
        ChildIter {
            doc: self,
            next: self.first_child(id),
        }
    }

    // ------------------------------------------------------------------
    // Attributes
    // ------------------------------------------------------------------

    /// Get attributes for an element
    pub fn attributes(&self, id: NodeId) -> &[XmlAttribute] {
        match self.get_node(id) {
            Some(node) => &node.attributes,
            None => &[],
        }
    }

    /// Value of the attribute `name` that has no namespace
    pub fn get_no_ns_attribute(&self, node_id: NodeId, name: &str) -> Option<&str> {
        let name_id = self.strings.lookup(name)?;
        self.attributes(node_id)
            .iter()
            .find(|a| a.name_id == name_id && a.namespace_id == 0)
            .map(|a| a.value.as_str())
    }

    /// Value of the attribute with local name `name` in namespace `namespace`
    pub fn get_ns_attribute(&self, node_id: NodeId, name: &str, namespace: &str) -> Option<&str> {
        let name_id = self.strings.lookup(name)?;
        let ns_id = self.strings.lookup(namespace)?;
        self.attributes(node_id)
            .iter()
            .find(|a| a.name_id == name_id && a.namespace_id == ns_id)
            .map(|a| a.value.as_str())
    }

    // ------------------------------------------------------------------
    // Side-slot
    // ------------------------------------------------------------------

    /// Borrow a node's side-slot
    pub fn private(&self, id: NodeId) -> Option<&(dyn Any + 'static)> {
        self.get_node(id)?.private.as_deref()
    }

    /// Mutably borrow a node's side-slot
    pub fn private_mut(&mut self, id: NodeId) -> Option<&mut (dyn Any + 'static)> {
        self.get_node_mut(id)?.private.as_deref_mut()
    }

    /// Fill a node's side-slot, returning what was there before
    pub fn set_private(&mut self, id: NodeId, data: Box<dyn Any>) -> Option<Box<dyn Any>> {
        let node = self.get_node_mut(id)?;
        node.private.replace(data)
    }
}

/// Iterator over child nodes
pub struct ChildIter<'a> {
    doc: &'a XmlDocument,
    next: Option<NodeId>,
}

impl<'a> Iterator for ChildIter<'a> {
    type Item = NodeId;

    fn next(&mut self) -> Option<Self::Item> {
        let current = self.next?;
        self.next = self.doc.next_sibling(current);
        Some(current)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> (XmlDocument, NodeId, NodeId, NodeId) {
        let mut doc = XmlDocument::new();
        let name = doc.strings.intern("root");
        let root = doc.append_child(DOCUMENT_NODE_ID, XmlNode::element(name));
        let a = doc.append_child(root, XmlNode::text("a".into()));
        let b = doc.append_child(root, XmlNode::cdata("b".into()));
        (doc, root, a, b)
    }

    #[test]
    fn test_links() {
        let (doc, root, a, b) = sample();
        assert_eq!(doc.root_element_id(), Some(root));
        assert_eq!(doc.first_child(DOCUMENT_NODE_ID), Some(root));
        assert_eq!(doc.parent(root), Some(DOCUMENT_NODE_ID));
        assert_eq!(doc.first_child(root), Some(a));
        assert_eq!(doc.last_child(root), Some(b));
        assert_eq!(doc.next_sibling(a), Some(b));
        assert_eq!(doc.prev_sibling(b), Some(a));
        assert_eq!(doc.prev_sibling(a), None);
        assert_eq!(doc.next_sibling(b), None);
        assert_eq!(doc.get_node(b).and_then(|n| n.parent), Some(root));
    }

    #[test]
    fn test_children_iter() {
        let (doc, root, a, b) = sample();
        let children: Vec<_> = doc.children(root).collect();
        assert_eq!(children, vec![a, b]);
        assert_eq!(doc.children(a).count(), 0);
    }

    #[test]
    fn test_owner_document() {
        let (doc, root, a, _) = sample();
        assert_eq!(doc.owner_document(a), Some(DOCUMENT_NODE_ID));
        assert_eq!(doc.owner_document(root), Some(DOCUMENT_NODE_ID));
        assert_eq!(doc.owner_document(DOCUMENT_NODE_ID), Some(DOCUMENT_NODE_ID));
        assert_eq!(doc.owner_document(99), None);
    }

    #[test]
    fn test_set_content() {
        let (mut doc, _, a, _) = sample();
        assert_eq!(doc.content(a), Some("a"));
        assert!(doc.set_content(a, "changed"));
        assert_eq!(doc.content(a), Some("changed"));
        assert!(!doc.set_content(99, "nope"));
    }

    #[test]
    fn test_attribute_lookup() {
        let mut doc = XmlDocument::new();
        let name = doc.strings.intern("medicine");
        let elem = doc.append_child(DOCUMENT_NODE_ID, XmlNode::element(name));

        let plain = XmlAttribute::new(doc.strings.intern("type"), "pills".into());
        let mut scoped = XmlAttribute::new(doc.strings.intern("effectiveness"), "mega".into());
        scoped.prefix_id = doc.strings.intern("ultramed");
        scoped.namespace_id = doc.strings.intern("http://ultramed.com/ns");
        if let Some(node) = doc.get_node_mut(elem) {
            node.attributes.push(plain);
            node.attributes.push(scoped);
        }

        assert_eq!(doc.get_no_ns_attribute(elem, "type"), Some("pills"));
        assert_eq!(doc.get_no_ns_attribute(elem, "effectiveness"), None);
        assert_eq!(doc.get_no_ns_attribute(elem, "missing"), None);
        assert_eq!(
            doc.get_ns_attribute(elem, "effectiveness", "http://ultramed.com/ns"),
            Some("mega")
        );
        assert_eq!(doc.get_ns_attribute(elem, "effectiveness", "http://other"), None);
        assert_eq!(doc.get_ns_attribute(elem, "type", "http://ultramed.com/ns"), None);
    }

    #[test]
    fn test_private_slot() {
        let (mut doc, root, _, _) = sample();
        assert!(doc.private(root).is_none());
        assert!(doc.set_private(root, Box::new(7u32)).is_none());
        assert_eq!(doc.private(root).and_then(|p| p.downcast_ref::<u32>()), Some(&7));

        if let Some(slot) = doc.private_mut(root).and_then(|p| p.downcast_mut::<u32>()) {
            *slot = 8;
        }
        assert_eq!(doc.private(root).and_then(|p| p.downcast_ref::<u32>()), Some(&8));
    }
}
