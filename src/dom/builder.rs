//! Tree builder
//!
//! Drives the `quick-xml` tokenizer and assembles an [`XmlDocument`] from its
//! events, enforcing document-level well-formedness the tokenizer does not
//! check on its own.

use quick_xml::events::{BytesStart, Event};
use quick_xml::Reader;

use super::document::XmlDocument;
use super::namespace::{split_qname, NamespaceResolver};
use super::node::{NodeId, XmlAttribute, XmlNode, DOCUMENT_NODE_ID};
use crate::error::{Error, Result};

/// Parse `input` into a native tree.
///
/// Fails with [`Error::Parse`] if the text is not a well-formed document; no
/// partially built tree escapes on failure.
pub fn parse(input: &str) -> Result<XmlDocument> {
    let mut doc = XmlDocument::new();
    let mut resolver = NamespaceResolver::new(&mut doc.strings);
    let mut reader = Reader::from_str(input);

    let mut stack: Vec<NodeId> = vec![DOCUMENT_NODE_ID];
    let mut tag_stack: Vec<String> = Vec::new();
    let mut seen_root_element = false;
    let mut seen_markup = false;

    loop {
        let event = reader.read_event()?;
        let parent = *stack.last().unwrap_or(&DOCUMENT_NODE_ID);
        let at_document_level = stack.len() == 1;

        match event {
            Event::Start(elem) => {
                if at_document_level {
                    check_single_root(&mut seen_root_element)?;
                }
                let node_id = open_element(&mut doc, &mut resolver, &elem, parent)?;
                tag_stack.push(utf8(elem.name().as_ref())?.to_owned());
                stack.push(node_id);
            }

            Event::Empty(elem) => {
                if at_document_level {
                    check_single_root(&mut seen_root_element)?;
                }
                open_element(&mut doc, &mut resolver, &elem, parent)?;
                resolver.pop_scope();
            }

            Event::End(end_elem) => {
                let end_qname = end_elem.name();
                let end_name = utf8(end_qname.as_ref())?;
                match tag_stack.pop() {
                    Some(start_name) if start_name == end_name => {}
                    Some(start_name) => {
                        return Err(Error::Parse(format!(
                            "Tag mismatch: <{}> closed with </{}>",
                            start_name, end_name
                        )));
                    }
                    None => {
                        return Err(Error::Parse(format!(
                            "Unexpected end tag: </{}> without matching start tag",
                            end_name
                        )));
                    }
                }
                stack.pop();
                resolver.pop_scope();
            }

            Event::Text(content) => {
                let text = content.unescape()?;
                if at_document_level {
                    if !is_xml_whitespace(&text) {
                        return Err(Error::Parse(
                            "Text content not allowed at document level".to_string(),
                        ));
                    }
                    continue;
                }
                if !text.is_empty() {
                    doc.append_child(parent, XmlNode::text(text.into_owned()));
                }
            }

            Event::CData(content) => {
                if at_document_level {
                    return Err(Error::Parse(
                        "CDATA section not allowed at document level".to_string(),
                    ));
                }
                let text = utf8(&content)?.to_owned();
                doc.append_child(parent, XmlNode::cdata(text));
            }

            Event::Comment(content) => {
                let text = utf8(&content)?.to_owned();
                doc.append_child(parent, XmlNode::comment(text));
            }

            Event::PI(pi) => {
                let target = utf8(pi.target())?;
                let data = utf8(pi.content())?.trim_start().to_owned();
                let target_id = doc.strings.intern(target);
                doc.append_child(
                    parent,
                    XmlNode::processing_instruction(target_id, data),
                );
            }

            Event::Decl(_) => {
                if seen_markup {
                    return Err(Error::Parse(
                        "XML declaration allowed only at the start of the document".to_string(),
                    ));
                }
            }

            Event::DocType(_) => {
                if seen_root_element {
                    return Err(Error::Parse(
                        "DOCTYPE must come before root element".to_string(),
                    ));
                }
                if !at_document_level {
                    return Err(Error::Parse("DOCTYPE not allowed inside an element".to_string()));
                }
            }

            Event::Eof => break,
        }
        seen_markup = true;
    }

    if let Some(unclosed) = tag_stack.first() {
        return Err(Error::Parse(format!("Unclosed tag: <{}>", unclosed)));
    }
    if !seen_root_element {
        return Err(Error::Parse("Document has no root element".to_string()));
    }

    Ok(doc)
}

fn check_single_root(seen_root_element: &mut bool) -> Result<()> {
    if *seen_root_element {
        return Err(Error::Parse("Document has multiple root elements".to_string()));
    }
    *seen_root_element = true;
    Ok(())
}

/// Create an element node for a start (or empty) tag and append it to `parent`.
///
/// Opens a namespace scope; the caller closes it when the element ends.
fn open_element(
    doc: &mut XmlDocument,
    resolver: &mut NamespaceResolver,
    elem: &BytesStart<'_>,
    parent: NodeId,
) -> Result<NodeId> {
    resolver.push_scope();

    // Namespace declarations apply to the element that carries them, so
    // collect them before resolving any names.
    let mut attrs: Vec<(String, String)> = Vec::new();
    for attr in elem.attributes() {
        let attr = attr.map_err(|e| Error::Parse(e.to_string()))?;
        let key = utf8(attr.key.as_ref())?;
        let value = attr.unescape_value()?;

        if key == "xmlns" {
            let uri_id = doc.strings.intern(&value);
            resolver.declare_default(uri_id);
        } else if let Some(prefix) = key.strip_prefix("xmlns:") {
            let prefix_id = doc.strings.intern(prefix);
            let uri_id = doc.strings.intern(&value);
            resolver.declare(prefix_id, uri_id);
        } else {
            attrs.push((key.to_owned(), value.into_owned()));
        }
    }

    let elem_qname = elem.name();
    let qname = utf8(elem_qname.as_ref())?;
    let mut node = match split_qname(qname) {
        (Some(prefix), local) => {
            let prefix_id = doc.strings.intern(prefix);
            match resolver.resolve(prefix_id) {
                Some(uri_id) => {
                    let mut node = XmlNode::element(doc.strings.intern(local));
                    node.prefix_id = prefix_id;
                    node.namespace_id = uri_id;
                    node
                }
                // Undeclared prefix: keep the qualified name, no namespace
                None => XmlNode::element(doc.strings.intern(qname)),
            }
        }
        (None, local) => {
            let mut node = XmlNode::element(doc.strings.intern(local));
            node.namespace_id = resolver.resolve_default().unwrap_or(0);
            node
        }
    };

    node.attributes.reserve(attrs.len());
    for (key, value) in attrs {
        let attr = match split_qname(&key) {
            (Some(prefix), local) => {
                let prefix_id = doc.strings.intern(prefix);
                match resolver.resolve(prefix_id) {
                    Some(uri_id) => {
                        let mut attr = XmlAttribute::new(doc.strings.intern(local), value);
                        attr.prefix_id = prefix_id;
                        attr.namespace_id = uri_id;
                        attr
                    }
                    None => XmlAttribute::new(doc.strings.intern(&key), value),
                }
            }
            // Unprefixed attributes are never in the default namespace
            (None, local) => XmlAttribute::new(doc.strings.intern(local), value),
        };
        node.attributes.push(attr);
    }

    Ok(doc.append_child(parent, node))
}

#[inline]
fn utf8(bytes: &[u8]) -> Result<&str> {
    std::str::from_utf8(bytes).map_err(|e| Error::Parse(e.to_string()))
}

#[inline]
fn is_xml_whitespace(s: &str) -> bool {
    s.bytes().all(|b| matches!(b, b' ' | b'\t' | b'\n' | b'\r'))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dom::node::NodeKind;

    const DOCTOR: &str = concat!(
        r#"<doctor xmlns:ultramed="http://ultramed.com/xml/500BC/ultramed">"#,
        "  prescribed  ",
        "<![CDATA[ extra ]]>",
        r#"<medicine name="Mega Pills" type="pills" ultramed:effectiveness="mega"/>"#,
        "</doctor>"
    );

    #[test]
    fn test_parse_structure() {
        let doc = parse(DOCTOR).unwrap();
        let root = doc.root_element_id().unwrap();
        assert_eq!(doc.first_child(DOCUMENT_NODE_ID), Some(root));
        assert_eq!(doc.node_name(root), Some("doctor"));

        let kids: Vec<_> = doc.children(root).collect();
        assert_eq!(kids.len(), 3);
        assert_eq!(doc.kind(kids[0]), Some(NodeKind::Text));
        assert_eq!(doc.content(kids[0]), Some("  prescribed  "));
        assert_eq!(doc.kind(kids[1]), Some(NodeKind::CData));
        assert_eq!(doc.content(kids[1]), Some(" extra "));
        assert_eq!(doc.kind(kids[2]), Some(NodeKind::Element));
    }

    #[test]
    fn test_parse_attributes_and_namespaces() {
        let doc = parse(DOCTOR).unwrap();
        let root = doc.root_element_id().unwrap();
        let medicine = doc.last_child(root).unwrap();

        assert_eq!(doc.get_no_ns_attribute(medicine, "name"), Some("Mega Pills"));
        assert_eq!(doc.get_no_ns_attribute(medicine, "type"), Some("pills"));
        assert_eq!(doc.get_no_ns_attribute(medicine, "effectiveness"), None);
        assert_eq!(
            doc.get_ns_attribute(
                medicine,
                "effectiveness",
                "http://ultramed.com/xml/500BC/ultramed"
            ),
            Some("mega")
        );
        // Declarations are not attributes
        assert_eq!(doc.get_no_ns_attribute(root, "xmlns:ultramed"), None);
        assert_eq!(doc.attributes(root).len(), 0);
    }

    #[test]
    fn test_default_namespace_applies_to_elements_only() {
        let doc = parse(r#"<svg xmlns="http://www.w3.org/2000/svg" width="10"><rect/></svg>"#)
            .unwrap();
        let svg = doc.root_element_id().unwrap();
        let rect = doc.first_child(svg).unwrap();
        assert_eq!(doc.namespace_uri(svg), Some("http://www.w3.org/2000/svg"));
        assert_eq!(doc.namespace_uri(rect), Some("http://www.w3.org/2000/svg"));
        assert_eq!(doc.get_no_ns_attribute(svg, "width"), Some("10"));
    }

    #[test]
    fn test_prefixed_element_uses_local_name() {
        let doc = parse(r#"<s:svg xmlns:s="http://www.w3.org/2000/svg"/>"#).unwrap();
        let svg = doc.root_element_id().unwrap();
        assert_eq!(doc.node_name(svg), Some("svg"));
        assert_eq!(doc.node_prefix(svg), Some("s"));
    }

    #[test]
    fn test_xml_prefix_needs_no_declaration() {
        let doc = parse(r#"<p xml:lang="en"/>"#).unwrap();
        let p = doc.root_element_id().unwrap();
        let lang = doc.get_ns_attribute(p, "lang", crate::dom::namespace::XML_NAMESPACE);
        assert_eq!(lang, Some("en"));
        assert_eq!(doc.get_no_ns_attribute(p, "lang"), None);
    }

    #[test]
    fn test_undeclared_prefix_is_kept() {
        let doc = parse("<a:b/>").unwrap();
        let root = doc.root_element_id().unwrap();
        assert_eq!(doc.node_name(root), Some("a:b"));
        assert_eq!(doc.namespace_uri(root), None);
    }

    #[test]
    fn test_comments_and_pis() {
        let doc = parse("<?xml version=\"1.0\"?><!-- top --><r><?go fast?></r>").unwrap();
        let comment = doc.first_child(DOCUMENT_NODE_ID).unwrap();
        assert_eq!(doc.kind(comment), Some(NodeKind::Comment));
        assert_eq!(doc.content(comment), Some(" top "));

        let root = doc.root_element_id().unwrap();
        let pi = doc.first_child(root).unwrap();
        assert_eq!(doc.kind(pi), Some(NodeKind::ProcessingInstruction));
        assert_eq!(doc.node_name(pi), Some("go"));
        assert_eq!(doc.content(pi), Some("fast"));
    }

    #[test]
    fn test_entities_expanded() {
        let doc = parse(r#"<a t="&lt;x&gt;">1 &amp; 2 &#65;</a>"#).unwrap();
        let root = doc.root_element_id().unwrap();
        let text = doc.first_child(root).unwrap();
        assert_eq!(doc.content(text), Some("1 & 2 A"));
        assert_eq!(doc.get_no_ns_attribute(root, "t"), Some("<x>"));
    }

    #[test]
    fn test_document_level_whitespace_dropped() {
        let doc = parse("\n<a/>\n").unwrap();
        assert_eq!(doc.children(DOCUMENT_NODE_ID).count(), 1);
    }

    #[test]
    fn test_doctype_produces_no_node() {
        let doc = parse("<!DOCTYPE a><a/>").unwrap();
        let first = doc.first_child(DOCUMENT_NODE_ID).unwrap();
        assert_eq!(doc.kind(first), Some(NodeKind::Element));
    }

    #[test]
    fn test_malformed_rejected() {
        assert!(matches!(parse("<a><"), Err(Error::Parse(_))));
        assert!(matches!(parse("<a>"), Err(Error::Parse(_))));
        assert!(matches!(parse("<a></b>"), Err(Error::Parse(_))));
        assert!(matches!(parse("<a/><b/>"), Err(Error::Parse(_))));
        assert!(matches!(parse("text"), Err(Error::Parse(_))));
        assert!(matches!(parse(""), Err(Error::Parse(_))));
        assert!(matches!(parse("<a x='1' x='2'/>"), Err(Error::Parse(_))));
        assert!(matches!(parse("<a>&bogus;</a>"), Err(Error::Parse(_))));
    }
}
