//! String Interning Pool
//!
//! Deduplicated storage for element names, attribute names, prefixes and
//! namespace URIs. Character data is not interned; it lives on the node so it
//! can be rewritten in place.

use std::collections::HashMap;

/// String interning pool
///
/// ID 0 is reserved for "no string" and resolves to `""`.
#[derive(Debug)]
pub struct StringPool {
    /// Strings indexed by ID
    entries: Vec<Box<str>>,
    /// Content -> ID
    index: HashMap<Box<str>, u32>,
}

impl Default for StringPool {
    fn default() -> Self {
        Self::new()
    }
}

impl StringPool {
    /// Create a new empty string pool
    pub fn new() -> Self {
        let mut pool = StringPool {
            entries: Vec::with_capacity(64),
            index: HashMap::new(),
        };
        pool.entries.push(Box::from(""));
        pool
    }

    /// Intern a string, returning its ID
    pub fn intern(&mut self, s: &str) -> u32 {
        if s.is_empty() {
            return 0;
        }
        if let Some(&id) = self.index.get(s) {
            return id;
        }

        let id = self.entries.len() as u32;
        self.entries.push(Box::from(s));
        self.index.insert(Box::from(s), id);
        id
    }

    /// Look up a string's ID without interning it
    pub fn lookup(&self, s: &str) -> Option<u32> {
        if s.is_empty() {
            return Some(0);
        }
        self.index.get(s).copied()
    }

    /// Get a string by ID
    #[inline]
    pub fn get_str(&self, id: u32) -> Option<&str> {
        self.entries.get(id as usize).map(|s| &**s)
    }

    /// Number of interned strings (including the reserved empty entry)
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether only the reserved empty entry is present
    pub fn is_empty(&self) -> bool {
        self.entries.len() == 1
    }
}
