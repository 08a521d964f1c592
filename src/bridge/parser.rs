//! Parser entry point
//!
//! Text in, wrapped document out. The native tree is handed to the store
//! only after a successful parse, and the wrapper for its document node is
//! created immediately so the tree always has an owner.

use crate::context::Context;
use crate::dom::{self, NodeRef};
use crate::error::{Error, Result};
use crate::host::class::{Class, FunctionSpec, Prototype, OBJECT_PROTO};
use crate::host::heap::ObjectId;
use crate::host::value::{string_arg, Value};

use super::wrap::wrap;

/// MIME types accepted by `parseFromString`. Matching is exact.
pub const SUPPORTED_MIME_TYPES: &[&str] = &[
    "text/xml",
    "application/xml",
    "application/xhtml+xml",
    "image/svg+xml",
];

/// Whether `mime_type` is on the allow-list
#[inline]
pub fn is_supported_mime_type(mime_type: &str) -> bool {
    SUPPORTED_MIME_TYPES.contains(&mime_type)
}

/// Stateless parser front end
#[derive(Debug, Clone, Copy, Default)]
pub struct DomParser;

impl DomParser {
    /// Parse `text` as `mime_type` and return the (unrooted) document wrapper.
    pub fn parse_from_string(cx: &mut Context, text: &str, mime_type: &str) -> Result<ObjectId> {
        parse_from_string(cx, text, mime_type)
    }
}

/// Parse `text` as `mime_type` and return the (unrooted) document wrapper.
///
/// Unsupported MIME types are refused before the parser runs. If the
/// document wrapper cannot be allocated the freshly built tree is freed
/// again, so a failed call leaves nothing behind.
pub fn parse_from_string(cx: &mut Context, text: &str, mime_type: &str) -> Result<ObjectId> {
    if !is_supported_mime_type(mime_type) {
        return Err(Error::UnsupportedType(mime_type.to_owned()));
    }

    tracing::debug!(bytes = text.len(), mime_type, "parsing document");
    let doc = match dom::parse(text) {
        Ok(doc) => doc,
        Err(err) => {
            tracing::debug!(error = %err, "document rejected");
            return Err(err);
        }
    };
    let nodes = doc.node_count();

    let tree_id = cx.trees_mut().insert(doc);
    match wrap(cx, NodeRef::document(tree_id)) {
        Ok(obj) => {
            tracing::debug!(tree = %tree_id, nodes, document = %obj, "parsed document");
            Ok(obj)
        }
        Err(err) => {
            cx.trees_mut().free(tree_id);
            Err(err)
        }
    }
}

/// Class of managed `DOMParser` objects; they own nothing native
pub static DOM_PARSER_CLASS: Class = Class {
    name: "DOMParser",
    finalize: None,
};

/// Capability set of managed `DOMParser` objects
pub static DOM_PARSER_PROTO: Prototype = Prototype {
    name: "DOMParser",
    parent: Some(&OBJECT_PROTO),
    properties: &[],
    functions: &[FunctionSpec {
        name: "parseFromString",
        arity: 2,
        call: parse_from_string_method,
    }],
};

/// Allocate a managed `DOMParser`
pub fn new_dom_parser(cx: &mut Context) -> Result<ObjectId> {
    cx.alloc_object(&DOM_PARSER_CLASS, &DOM_PARSER_PROTO, None)
}

fn parse_from_string_method(cx: &mut Context, _this: ObjectId, args: &[Value]) -> Result<Value> {
    let text = string_arg(args, 0, "parseFromString")?;
    let mime_type = string_arg(args, 1, "parseFromString")?;
    parse_from_string(cx, text, mime_type).map(Value::Object)
}
