//! XML Node representation
//!
//! Uses NodeId (u32) for compact, cache-friendly node references.

use std::any::Any;
use std::fmt;

/// Compact node identifier (index into arena)
pub type NodeId = u32;

/// The document node always occupies the first arena slot.
pub const DOCUMENT_NODE_ID: NodeId = 0;

/// Type of XML node
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum NodeKind {
    /// Document root
    Document,
    /// Element node
    Element,
    /// Attribute node
    Attribute,
    /// Text content
    Text,
    /// CDATA section
    CData,
    /// Comment
    Comment,
    /// Processing instruction
    ProcessingInstruction,
    /// Reference to a general entity
    EntityRef,
    /// Entity declaration
    Entity,
    /// Notation declaration
    Notation,
    /// Document fragment
    DocumentFragment,
    /// Document type declaration
    DocumentType,
}

impl NodeKind {
    /// Numbering exposed to managed code.
    ///
    /// EntityRef and Entity share 5; callers depend on that value.
    pub fn dom_type(self) -> i32 {
        match self {
            NodeKind::Element => 1,
            NodeKind::Attribute => 2,
            NodeKind::Text => 3,
            NodeKind::CData => 4,
            NodeKind::EntityRef | NodeKind::Entity => 5,
            NodeKind::ProcessingInstruction => 7,
            NodeKind::Comment => 8,
            NodeKind::Document => 9,
            NodeKind::DocumentType => 10,
            NodeKind::DocumentFragment => 11,
            NodeKind::Notation => 12,
        }
    }

    /// Text-bearing kinds whose content is exposed and writable.
    #[inline]
    pub fn is_character_data(self) -> bool {
        matches!(self, NodeKind::Text | NodeKind::CData)
    }
}

/// Stored attribute
#[derive(Debug, Clone)]
pub struct XmlAttribute {
    /// Index into string pool for the local name
    pub name_id: u32,
    /// Index into string pool for namespace prefix, or 0
    pub prefix_id: u32,
    /// Index into string pool for namespace URI, or 0
    pub namespace_id: u32,
    /// Attribute value with references expanded
    pub value: String,
}

impl XmlAttribute {
    pub fn new(name_id: u32, value: String) -> Self {
        XmlAttribute {
            name_id,
            prefix_id: 0,
            namespace_id: 0,
            value,
        }
    }
}

/// An XML node in the arena
pub struct XmlNode {
    /// Type of this node
    pub kind: NodeKind,
    /// Parent node (None for document root)
    pub parent: Option<NodeId>,
    /// First child node
    pub first_child: Option<NodeId>,
    /// Last child node
    pub last_child: Option<NodeId>,
    /// Previous sibling
    pub prev_sibling: Option<NodeId>,
    /// Next sibling
    pub next_sibling: Option<NodeId>,
    /// Index into string pool for name (elements, PIs, entities, notations), or 0
    pub name_id: u32,
    /// Index into string pool for namespace prefix, or 0
    pub prefix_id: u32,
    /// Index into string pool for namespace URI, or 0
    pub namespace_id: u32,
    /// Text, CDATA and comment content; PI data
    pub content: Option<String>,
    /// Attributes (elements only)
    pub attributes: Vec<XmlAttribute>,
    /// Foreign data slot, owned by whoever set it
    pub(crate) private: Option<Box<dyn Any>>,
}

impl XmlNode {
    /// A detached node; [`super::XmlDocument::append_child`] links it in
    fn with_kind(kind: NodeKind) -> Self {
        XmlNode {
            kind,
            parent: None,
            first_child: None,
            last_child: None,
            prev_sibling: None,
            next_sibling: None,
            name_id: 0,
            prefix_id: 0,
            namespace_id: 0,
            content: None,
            attributes: Vec::new(),
            private: None,
        }
    }

    fn with_content(kind: NodeKind, content: String) -> Self {
        let mut node = Self::with_kind(kind);
        node.content = Some(content);
        node
    }

    /// Create a new document root node
    pub fn document() -> Self {
        Self::with_kind(NodeKind::Document)
    }

    /// Create a new element node
    pub fn element(name_id: u32) -> Self {
        Self::named(NodeKind::Element, name_id)
    }

    pub fn text(content: String) -> Self {
        Self::with_content(NodeKind::Text, content)
    }

    pub fn cdata(content: String) -> Self {
        Self::with_content(NodeKind::CData, content)
    }

    pub fn comment(content: String) -> Self {
        Self::with_content(NodeKind::Comment, content)
    }

    /// Create a processing instruction node; `target_id` becomes its name
    pub fn processing_instruction(target_id: u32, data: String) -> Self {
        let mut node = Self::with_content(NodeKind::ProcessingInstruction, data);
        node.name_id = target_id;
        node
    }

    /// Create a named node of any other kind (entity, notation, fragment, ...)
    pub fn named(kind: NodeKind, name_id: u32) -> Self {
        let mut node = Self::with_kind(kind);
        node.name_id = name_id;
        node
    }

    /// Check if this is an element node
    #[inline]
    pub fn is_element(&self) -> bool {
        self.kind == NodeKind::Element
    }

    /// Whether the side-slot is occupied
    #[inline]
    pub fn has_private(&self) -> bool {
        self.private.is_some()
    }
}

impl fmt::Debug for XmlNode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("XmlNode")
            .field("kind", &self.kind)
            .field("parent", &self.parent)
            .field("first_child", &self.first_child)
            .field("last_child", &self.last_child)
            .field("prev_sibling", &self.prev_sibling)
            .field("next_sibling", &self.next_sibling)
            .field("name_id", &self.name_id)
            .field("content", &self.content)
            .field("attributes", &self.attributes.len())
            .field("has_private", &self.private.is_some())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_node_creation() {
        let doc = XmlNode::document();
        assert_eq!(doc.kind, NodeKind::Document);
        assert!(doc.parent.is_none());
        assert!(!doc.has_private());
    }

    #[test]
    fn test_element_node() {
        let elem = XmlNode::element(1);
        assert_eq!(elem.kind, NodeKind::Element);
        assert!(elem.parent.is_none());
        assert_eq!(elem.name_id, 1);
        assert!(elem.is_element());

        let pi = XmlNode::processing_instruction(2, "data".into());
        assert_eq!(pi.kind, NodeKind::ProcessingInstruction);
        assert_eq!(pi.name_id, 2);
        assert_eq!(pi.content.as_deref(), Some("data"));
    }

    #[test]
    fn test_dom_type_numbering() {
        assert_eq!(NodeKind::Element.dom_type(), 1);
        assert_eq!(NodeKind::Text.dom_type(), 3);
        assert_eq!(NodeKind::CData.dom_type(), 4);
        assert_eq!(NodeKind::ProcessingInstruction.dom_type(), 7);
        assert_eq!(NodeKind::Document.dom_type(), 9);
        assert_eq!(NodeKind::Notation.dom_type(), 12);
    }

    #[test]
    fn test_entity_kinds_share_a_number() {
        // Kept for compatibility with existing callers, not a typo.
        assert_eq!(NodeKind::EntityRef.dom_type(), 5);
        assert_eq!(NodeKind::Entity.dom_type(), 5);
    }

    #[test]
    fn test_character_data() {
        assert!(NodeKind::Text.is_character_data());
        assert!(NodeKind::CData.is_character_data());
        assert!(!NodeKind::Comment.is_character_data());
        assert!(!NodeKind::Element.is_character_data());
    }
}
