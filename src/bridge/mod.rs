//! Bridge Module - Native nodes as managed objects
//!
//! Connects the native trees in [`crate::dom`] to the managed heap in
//! [`crate::host`]:
//! - One live wrapper per native node, cached in the node's side-slot
//! - A per-document count of live wrappers that owns the native tree
//! - Node and element capability sets (prototypes) over those wrappers
//! - The `parseFromString` entry point and the exported node-type constants

pub mod element;
pub mod node;
pub mod parser;
pub mod wrap;

pub use element::ELEMENT_PROTO;
pub use node::{NODE_CLASS, NODE_PROTO};
pub use parser::{new_dom_parser, parse_from_string, DomParser, SUPPORTED_MIME_TYPES};
pub use wrap::{cached_wrapper, live_wrapper_count, wrap};

/// Node-type constants exported to managed code
pub const NODE_TYPE_CONSTANTS: &[(&str, i32)] = &[
    ("ELEMENT_NODE", 1),
    ("ATTRIBUTE_NODE", 2),
    ("TEXT_NODE", 3),
    ("CDATA_SECTION_NODE", 4),
    ("ENTITY_REFERENCE_NODE", 5),
    ("ENTITY_NODE", 5),
    ("PROCESSING_INSTRUCTION_NODE", 7),
    ("COMMENT_NODE", 8),
    ("DOCUMENT_NODE", 9),
    ("DOCUMENT_TYPE_NODE", 10),
    ("DOCUMENT_FRAGMENT_NODE", 11),
    ("NOTATION_NODE", 12),
];
