//! Node facade
//!
//! Accessors shared by every wrapped node. Navigation accessors wrap the
//! neighbouring native node on demand; nothing is wrapped until it is read.

use crate::context::Context;
use crate::dom::{NodeId, NodeKind, NodeRef, XmlDocument};
use crate::error::{Error, Result};
use crate::host::class::{Class, FunctionSpec, PropertySpec, Prototype, OBJECT_PROTO};
use crate::host::heap::ObjectId;
use crate::host::value::Value;

use super::wrap::{release, tree, tree_mut, wrap};

/// Class of every node wrapper
pub static NODE_CLASS: Class = Class {
    name: "DOMNode",
    finalize: Some(finalize_node),
};

/// Capability set of every wrapped node
pub static NODE_PROTO: Prototype = Prototype {
    name: "DOMNode",
    parent: Some(&OBJECT_PROTO),
    properties: &[
        PropertySpec {
            name: "kind",
            getter: get_kind,
            setter: None,
        },
        PropertySpec {
            name: "nodeType",
            getter: get_kind,
            setter: None,
        },
        PropertySpec {
            name: "name",
            getter: get_name,
            setter: None,
        },
        PropertySpec {
            name: "nodeName",
            getter: get_name,
            setter: None,
        },
        PropertySpec {
            name: "value",
            getter: get_value,
            setter: Some(set_value),
        },
        PropertySpec {
            name: "nodeValue",
            getter: get_value,
            setter: Some(set_value),
        },
        PropertySpec {
            name: "ownerDocument",
            getter: get_owner_document,
            setter: None,
        },
        PropertySpec {
            name: "parentNode",
            getter: get_parent_node,
            setter: None,
        },
        PropertySpec {
            name: "firstChild",
            getter: get_first_child,
            setter: None,
        },
        PropertySpec {
            name: "lastChild",
            getter: get_last_child,
            setter: None,
        },
        PropertySpec {
            name: "previousSibling",
            getter: get_previous_sibling,
            setter: None,
        },
        PropertySpec {
            name: "nextSibling",
            getter: get_next_sibling,
            setter: None,
        },
    ],
    functions: &[
        FunctionSpec {
            name: "toString",
            arity: 0,
            call: to_string,
        },
        FunctionSpec {
            name: "isSameNode",
            arity: 1,
            call: is_same_node,
        },
    ],
};

/// Native node behind a wrapper.
///
/// Objects without a node payload (plain objects, parsers) are rejected.
pub(crate) fn node_of(cx: &Context, obj: ObjectId) -> Result<NodeRef> {
    cx.private_of(obj)?.ok_or_else(|| Error::type_error("Not a DOMNode"))
}

fn kind_of(cx: &Context, node: NodeRef) -> NodeKind {
    match tree(cx.trees(), node.tree).kind(node.node) {
        Some(kind) => kind,
        None => panic!("{} does not exist", node),
    }
}

/// Type-dependent node name
pub(crate) fn node_name(doc: &XmlDocument, id: NodeId) -> &str {
    let Some(kind) = doc.kind(id) else {
        return "#unknown";
    };
    match kind {
        NodeKind::Element
        | NodeKind::Attribute
        | NodeKind::EntityRef
        | NodeKind::Entity
        | NodeKind::ProcessingInstruction
        | NodeKind::Notation
        | NodeKind::DocumentType => doc.node_name(id).unwrap_or("#unknown"),
        NodeKind::CData => "#cdata-section",
        NodeKind::Comment => "#comment",
        NodeKind::Document => "#document",
        NodeKind::DocumentFragment => "#document-fragment",
        NodeKind::Text => "#text",
    }
}

fn get_kind(cx: &mut Context, this: ObjectId) -> Result<Value> {
    let node = node_of(cx, this)?;
    Ok(Value::Int(kind_of(cx, node).dom_type()))
}

fn get_name(cx: &mut Context, this: ObjectId) -> Result<Value> {
    let node = node_of(cx, this)?;
    let doc = tree(cx.trees(), node.tree);
    Ok(Value::from(node_name(doc, node.node)))
}

fn get_value(cx: &mut Context, this: ObjectId) -> Result<Value> {
    let node = node_of(cx, this)?;
    let doc = tree(cx.trees(), node.tree);
    if !kind_of(cx, node).is_character_data() {
        return Ok(Value::Null);
    }
    Ok(Value::from(doc.content(node.node).unwrap_or_default()))
}

fn set_value(cx: &mut Context, this: ObjectId, value: Value) -> Result<()> {
    let node = node_of(cx, this)?;
    let kind = kind_of(cx, node);
    if !kind.is_character_data() {
        return Err(Error::invalid(format!(
            "cannot set the value of a {} node",
            node_name(tree(cx.trees(), node.tree), node.node)
        )));
    }
    let Some(text) = value.as_str() else {
        return Err(Error::type_error("Must be a string"));
    };
    tree_mut(cx.trees_mut(), node.tree).set_content(node.node, text);
    Ok(())
}

/// Wrap whatever `link` leads to, or Null
fn navigate(
    cx: &mut Context,
    this: ObjectId,
    link: fn(&XmlDocument, NodeId) -> Option<NodeId>,
) -> Result<Value> {
    let node = node_of(cx, this)?;
    match link(tree(cx.trees(), node.tree), node.node) {
        Some(target) => Ok(Value::Object(wrap(cx, node.with_node(target))?)),
        None => Ok(Value::Null),
    }
}

fn get_owner_document(cx: &mut Context, this: ObjectId) -> Result<Value> {
    navigate(cx, this, XmlDocument::owner_document)
}

fn get_parent_node(cx: &mut Context, this: ObjectId) -> Result<Value> {
    navigate(cx, this, XmlDocument::parent)
}

fn get_first_child(cx: &mut Context, this: ObjectId) -> Result<Value> {
    navigate(cx, this, XmlDocument::first_child)
}

fn get_last_child(cx: &mut Context, this: ObjectId) -> Result<Value> {
    navigate(cx, this, XmlDocument::last_child)
}

fn get_previous_sibling(cx: &mut Context, this: ObjectId) -> Result<Value> {
    navigate(cx, this, XmlDocument::prev_sibling)
}

fn get_next_sibling(cx: &mut Context, this: ObjectId) -> Result<Value> {
    navigate(cx, this, XmlDocument::next_sibling)
}

fn to_string(cx: &mut Context, this: ObjectId, _args: &[Value]) -> Result<Value> {
    let node = node_of(cx, this)?;
    let tag = match kind_of(cx, node) {
        NodeKind::Element => "[object Element]",
        NodeKind::Text => "[object Text]",
        NodeKind::CData => "[object CDATASection]",
        NodeKind::Document => "[object Document]",
        _ => "[object Node]",
    };
    Ok(Value::from(tag))
}

fn is_same_node(cx: &mut Context, this: ObjectId, args: &[Value]) -> Result<Value> {
    let node = node_of(cx, this)?;
    let Some(other) = args.first().and_then(Value::as_object) else {
        return Err(Error::type_error("Not a DOMNode"));
    };
    let other = node_of(cx, other)?;
    Ok(Value::Bool(node == other))
}

fn finalize_node(cx: &mut Context, obj: ObjectId, private: Option<NodeRef>) {
    let Some(node) = private else {
        panic!("finalized {} without a node payload", obj);
    };
    tracing::debug!(%node, wrapper = %obj, "finalizing wrapper");
    release(cx.trees_mut(), obj, node);
}
