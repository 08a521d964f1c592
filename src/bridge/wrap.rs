//! Wrapper records
//!
//! Per-node bridge state kept in the native node's side-slot: which managed
//! object currently stands for the node, and for document nodes, how many
//! managed objects currently stand for any node of that document.
//!
//! The count is what owns the native tree. It only moves when a wrapper is
//! created ([`wrap`]) or finalized ([`release`]); walking the tree never
//! touches it.

use crate::context::Context;
use crate::dom::{NodeId, NodeKind, NodeRef, TreeId, TreeStore, XmlDocument};
use crate::error::Result;
use crate::host::class::Prototype;
use crate::host::heap::ObjectId;

use super::element::ELEMENT_PROTO;
use super::node::{NODE_CLASS, NODE_PROTO};

/// Bridge metadata for one native node
#[derive(Debug)]
pub struct WrapperRecord {
    /// Managed object currently wrapping the node, if any
    pub(crate) wrapper: Option<ObjectId>,
    /// The node this record is attached to
    pub(crate) node: NodeId,
}

/// Record for a document node
#[derive(Debug)]
pub struct DocumentRecord {
    pub(crate) record: WrapperRecord,
    /// Live wrappers for any node of this document, the document included
    pub(crate) live_wrapper_count: u64,
}

/// What the bridge stores in a node's side-slot
#[derive(Debug)]
pub enum Record {
    Node(WrapperRecord),
    Document(DocumentRecord),
}

impl Record {
    fn base(&self) -> &WrapperRecord {
        match self {
            Record::Node(record) => record,
            Record::Document(doc) => &doc.record,
        }
    }

    fn base_mut(&mut self) -> &mut WrapperRecord {
        match self {
            Record::Node(record) => record,
            Record::Document(doc) => &mut doc.record,
        }
    }

    /// Current wrapper, if one is live
    pub fn wrapper(&self) -> Option<ObjectId> {
        self.base().wrapper
    }
}

/// Capability set for a node kind
#[inline]
pub(crate) fn facade_for(kind: NodeKind) -> &'static Prototype {
    match kind {
        NodeKind::Element => &ELEMENT_PROTO,
        _ => &NODE_PROTO,
    }
}

/// Borrow a tree the bridge still owns.
///
/// # Panics
///
/// If the tree was freed: no live wrapper can lead here once the count
/// reached zero, so this is a lifetime bookkeeping defect.
pub(crate) fn tree(trees: &TreeStore, id: TreeId) -> &XmlDocument {
    match trees.get(id) {
        Some(doc) => doc,
        None => panic!("{} accessed after it was freed", id),
    }
}

pub(crate) fn tree_mut(trees: &mut TreeStore, id: TreeId) -> &mut XmlDocument {
    match trees.get_mut(id) {
        Some(doc) => doc,
        None => panic!("{} accessed after it was freed", id),
    }
}

fn record(doc: &XmlDocument, node: NodeId) -> Option<&Record> {
    doc.private(node)?.downcast_ref::<Record>()
}

fn record_mut(doc: &mut XmlDocument, node: NodeId) -> Option<&mut Record> {
    doc.private_mut(node)?.downcast_mut::<Record>()
}

/// The document record, created empty if the document node was never wrapped
fn document_record_mut(doc: &mut XmlDocument, owner: NodeId) -> &mut DocumentRecord {
    if !matches!(record(doc, owner), Some(Record::Document(_))) {
        doc.set_private(
            owner,
            Box::new(Record::Document(DocumentRecord {
                record: WrapperRecord {
                    wrapper: None,
                    node: owner,
                },
                live_wrapper_count: 0,
            })),
        );
    }
    match record_mut(doc, owner) {
        Some(Record::Document(record)) => record,
        _ => unreachable!("document record was just installed"),
    }
}

fn owner_of(doc: &XmlDocument, node: NodeRef) -> NodeId {
    match doc.owner_document(node.node) {
        Some(owner) => owner,
        None => panic!("{} does not exist", node),
    }
}

/// Current wrapper of a node, if one is live
pub fn cached_wrapper(cx: &Context, node: NodeRef) -> Option<ObjectId> {
    let doc = cx.trees().get(node.tree)?;
    record(doc, node.node)?.wrapper()
}

/// Live wrapper count of a tree, or `None` once the tree has been freed
pub fn live_wrapper_count(cx: &Context, tree_id: TreeId) -> Option<u64> {
    let doc = cx.trees().get(tree_id)?;
    let owner = doc.owner_document(crate::dom::DOCUMENT_NODE_ID)?;
    match record(doc, owner) {
        Some(Record::Document(record)) => Some(record.live_wrapper_count),
        _ => Some(0),
    }
}

/// Return the managed object for `node`, creating it if needed.
///
/// At most one wrapper per node is live at a time, so repeated calls for the
/// same node return the same object. Allocation failure leaves every record
/// and count untouched.
pub fn wrap(cx: &mut Context, node: NodeRef) -> Result<ObjectId> {
    let doc = tree(cx.trees(), node.tree);
    let Some(kind) = doc.kind(node.node) else {
        panic!("{} does not exist", node);
    };

    if let Some(existing) = record(doc, node.node).and_then(Record::wrapper) {
        debug_assert!(cx.heap().is_live(existing), "cached wrapper {} is dead", existing);
        tracing::trace!(%node, wrapper = %existing, "reusing wrapper");
        return Ok(existing);
    }

    let obj = cx.alloc_object(&NODE_CLASS, facade_for(kind), Some(node))?;

    let doc = tree_mut(cx.trees_mut(), node.tree);
    match record_mut(doc, node.node) {
        Some(record) => record.base_mut().wrapper = Some(obj),
        None => {
            let base = WrapperRecord {
                wrapper: Some(obj),
                node: node.node,
            };
            let record = if kind == NodeKind::Document {
                Record::Document(DocumentRecord {
                    record: base,
                    live_wrapper_count: 0,
                })
            } else {
                Record::Node(base)
            };
            doc.set_private(node.node, Box::new(record));
        }
    }

    let owner = owner_of(doc, node);
    let doc_record = document_record_mut(doc, owner);
    doc_record.live_wrapper_count += 1;

    tracing::debug!(
        %node,
        ?kind,
        wrapper = %obj,
        live = doc_record.live_wrapper_count,
        "created wrapper"
    );
    Ok(obj)
}

/// Forget a collected wrapper and give up its share of the tree.
///
/// The record's wrapper is cleared before the count moves. When the count
/// reaches zero the whole tree is freed.
///
/// # Panics
///
/// If the node has no record, the record names a different wrapper, or the
/// count would drop below zero.
pub(crate) fn release(trees: &mut TreeStore, obj: ObjectId, node: NodeRef) {
    let doc = tree_mut(trees, node.tree);

    match record_mut(doc, node.node) {
        Some(record) => {
            let base = record.base_mut();
            debug_assert_eq!(base.node, node.node, "record attached to the wrong node");
            assert_eq!(
                base.wrapper,
                Some(obj),
                "finalized {} is not the wrapper of {}",
                obj,
                node
            );
            base.wrapper = None;
        }
        None => panic!("finalized {} but {} has no wrapper record", obj, node),
    }

    let owner = owner_of(doc, node);
    let doc_record = match record_mut(doc, owner) {
        Some(Record::Document(record)) => record,
        _ => panic!("{} has no document record", node.tree),
    };
    let Some(remaining) = doc_record.live_wrapper_count.checked_sub(1) else {
        panic!("live wrapper count of {} dropped below zero", node.tree);
    };
    doc_record.live_wrapper_count = remaining;

    tracing::debug!(%node, wrapper = %obj, live = remaining, "released wrapper");

    if remaining == 0 {
        trees.free(node.tree);
    }
}
