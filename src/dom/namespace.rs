//! Namespace scopes
//!
//! Prefix bindings seen while building a tree. Each element opens a scope;
//! closing it drops whatever the element declared.

use super::strings::StringPool;

/// URI permanently bound to the `xml` prefix
pub const XML_NAMESPACE: &str = "http://www.w3.org/XML/1998/namespace";

/// Prefix id used for the default namespace
const DEFAULT_PREFIX: u32 = 0;

/// Split a qualified name into `(prefix, local_name)`.
#[inline]
pub fn split_qname(name: &str) -> (Option<&str>, &str) {
    match memchr::memchr(b':', name.as_bytes()) {
        Some(pos) => (Some(&name[..pos]), &name[pos + 1..]),
        None => (None, name),
    }
}

/// In-scope prefix bindings, innermost last
#[derive(Debug)]
pub struct NamespaceResolver {
    /// `(prefix_id, uri_id)`; a `uri_id` of 0 undeclares the prefix
    bindings: Vec<(u32, u32)>,
    /// `bindings.len()` at each open scope
    marks: Vec<usize>,
    xml_prefix_id: u32,
}

impl NamespaceResolver {
    /// A resolver with only the `xml` prefix bound
    pub fn new(strings: &mut StringPool) -> Self {
        let xml_prefix_id = strings.intern("xml");
        let xml_uri_id = strings.intern(XML_NAMESPACE);
        NamespaceResolver {
            bindings: vec![(xml_prefix_id, xml_uri_id)],
            marks: Vec::new(),
            xml_prefix_id,
        }
    }

    pub fn push_scope(&mut self) {
        self.marks.push(self.bindings.len());
    }

    /// Close the innermost scope and forget its declarations
    pub fn pop_scope(&mut self) {
        if let Some(mark) = self.marks.pop() {
            self.bindings.truncate(mark);
        }
    }

    /// Bind `prefix_id` in the innermost scope. The `xml` prefix cannot be rebound.
    pub fn declare(&mut self, prefix_id: u32, uri_id: u32) {
        if prefix_id != self.xml_prefix_id {
            self.bindings.push((prefix_id, uri_id));
        }
    }

    /// `xmlns="..."`; an empty URI (id 0) removes the default namespace
    pub fn declare_default(&mut self, uri_id: u32) {
        self.declare(DEFAULT_PREFIX, uri_id);
    }

    /// URI bound to `prefix_id`, if it is declared and not undeclared
    pub fn resolve(&self, prefix_id: u32) -> Option<u32> {
        let (_, uri_id) = self.bindings.iter().rev().find(|(p, _)| *p == prefix_id)?;
        Some(*uri_id).filter(|&id| id != 0)
    }

    pub fn resolve_default(&self) -> Option<u32> {
        self.resolve(DEFAULT_PREFIX)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn setup() -> (StringPool, NamespaceResolver) {
        let mut strings = StringPool::new();
        let resolver = NamespaceResolver::new(&mut strings);
        (strings, resolver)
    }

    #[test]
    fn test_xml_prefix_is_fixed() {
        let (mut strings, mut resolver) = setup();
        let xml = strings.intern("xml");
        let other = strings.intern("urn:other");

        resolver.push_scope();
        resolver.declare(xml, other);
        let uri = resolver.resolve(xml).and_then(|id| strings.get_str(id));
        assert_eq!(uri, Some(XML_NAMESPACE));
    }

    #[test]
    fn test_scope_pop() {
        let (mut strings, mut resolver) = setup();
        let prefix = strings.intern("foo");
        let uri = strings.intern("http://example.com/foo");

        resolver.push_scope();
        resolver.declare(prefix, uri);
        assert_eq!(resolver.resolve(prefix), Some(uri));

        resolver.pop_scope();
        assert_eq!(resolver.resolve(prefix), None);
    }

    #[test]
    fn test_inner_binding_shadows_outer() {
        let (mut strings, mut resolver) = setup();
        let prefix = strings.intern("ns");
        let outer = strings.intern("urn:outer");
        let inner = strings.intern("urn:inner");

        resolver.push_scope();
        resolver.declare(prefix, outer);
        resolver.push_scope();
        resolver.declare(prefix, inner);
        assert_eq!(resolver.resolve(prefix), Some(inner));

        resolver.pop_scope();
        assert_eq!(resolver.resolve(prefix), Some(outer));
    }

    #[test]
    fn test_default_can_be_undeclared() {
        let (mut strings, mut resolver) = setup();
        let svg = strings.intern("http://www.w3.org/2000/svg");

        resolver.push_scope();
        resolver.declare_default(svg);
        assert_eq!(resolver.resolve_default(), Some(svg));

        resolver.push_scope();
        resolver.declare_default(0);
        assert_eq!(resolver.resolve_default(), None);

        resolver.pop_scope();
        assert_eq!(resolver.resolve_default(), Some(svg));
    }

    #[test]
    fn test_unbalanced_pop_keeps_xml() {
        let (strings, mut resolver) = setup();
        resolver.pop_scope();
        let xml = strings.lookup("xml").unwrap();
        assert!(resolver.resolve(xml).is_some());
    }

    #[test]
    fn test_split_qname() {
        assert_eq!(split_qname("svg:rect"), (Some("svg"), "rect"));
        assert_eq!(split_qname("rect"), (None, "rect"));
    }
}
