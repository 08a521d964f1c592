//! Element facade
//!
//! Layered over the node facade. Every entry point re-checks the receiver,
//! since a caller can borrow these functions for any object.

use crate::context::Context;
use crate::dom::{NodeKind, NodeRef, XmlDocument};
use crate::error::{Error, Result};
use crate::host::class::{FunctionSpec, PropertySpec, Prototype};
use crate::host::heap::ObjectId;
use crate::host::value::{string_arg, Value};

use super::node::{node_of, NODE_PROTO};
use super::wrap::tree;

/// Capability set of wrapped elements
pub static ELEMENT_PROTO: Prototype = Prototype {
    name: "DOMElement",
    parent: Some(&NODE_PROTO),
    properties: &[PropertySpec {
        name: "tagName",
        getter: get_tag_name,
        setter: None,
    }],
    functions: &[
        FunctionSpec {
            name: "getAttribute",
            arity: 1,
            call: get_attribute,
        },
        FunctionSpec {
            name: "getAttributeNS",
            arity: 2,
            call: get_attribute_ns,
        },
    ],
};

/// The element behind `obj` and its tree
fn element_of(cx: &Context, obj: ObjectId) -> Result<(NodeRef, &XmlDocument)> {
    let node = node_of(cx, obj).map_err(|_| Error::type_error("Not a DOMElement"))?;
    let doc = tree(cx.trees(), node.tree);
    match doc.kind(node.node) {
        Some(NodeKind::Element) => Ok((node, doc)),
        _ => Err(Error::type_error("Not a DOMElement")),
    }
}

fn get_tag_name(cx: &mut Context, this: ObjectId) -> Result<Value> {
    let (node, doc) = element_of(cx, this)?;
    Ok(Value::from(doc.node_name(node.node).unwrap_or_default()))
}

fn get_attribute(cx: &mut Context, this: ObjectId, args: &[Value]) -> Result<Value> {
    let (node, doc) = element_of(cx, this)?;
    let name = string_arg(args, 0, "getAttribute")?;
    Ok(Value::from(doc.get_no_ns_attribute(node.node, name)))
}

fn get_attribute_ns(cx: &mut Context, this: ObjectId, args: &[Value]) -> Result<Value> {
    let (node, doc) = element_of(cx, this)?;
    let name = string_arg(args, 0, "getAttributeNS")?;
    let namespace = string_arg(args, 1, "getAttributeNS")?;
    Ok(Value::from(doc.get_ns_attribute(node.node, name, namespace)))
}
