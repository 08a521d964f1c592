//! DOM Module - Arena-based native XML tree
//!
//! The tree the bridge wraps. It knows nothing about managed objects:
//! - Arena allocation for nodes, NodeId (u32) indices for traversal
//! - parent / first-child / last-child / sibling links on every node
//! - One opaque side-slot per node for foreign data
//! - String interning for names and namespace URIs
//! - Explicit, whole-tree release through [`TreeStore::free`]

pub mod builder;
pub mod document;
pub mod namespace;
pub mod node;
pub mod store;
pub mod strings;

pub use builder::parse;
pub use document::{ChildIter, XmlDocument};
pub use node::{NodeId, NodeKind, XmlAttribute, XmlNode, DOCUMENT_NODE_ID};
pub use store::{NodeRef, TreeId, TreeStore};
pub use strings::StringPool;
