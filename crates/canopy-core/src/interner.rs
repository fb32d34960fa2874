//! Name interning for grammar compilation.
//!
//! Converts rule and token names into cheap integer handles (`NameId`).
//! Comparing two ids is O(1) integer comparison; the compiler keys its
//! symbol tables off these handles and only resolves back to strings for
//! diagnostics and the final symbol listing.

use std::collections::HashMap;

/// A lightweight handle to an interned name.
///
/// Ids are ordered by insertion order, not lexicographically; use
/// `NameInterner::resolve` if you need string ordering.
#[derive(Clone, Copy, PartialEq, Eq, Hash, Debug)]
pub struct NameId(u32);

impl NameId {
    /// Raw index for serialization/debugging.
    #[inline]
    pub fn as_u32(self) -> u32 {
        self.0
    }

    /// Create a NameId from a raw index. Use only for deserialization.
    #[inline]
    pub fn from_raw(index: u32) -> Self {
        Self(index)
    }
}

impl PartialOrd for NameId {
    fn partial_cmp(&self, other: &Self) -> Option<std::cmp::Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for NameId {
    fn cmp(&self, other: &Self) -> std::cmp::Ordering {
        self.0.cmp(&other.0)
    }
}

/// Name interner. Deduplicates names and returns cheap NameId handles.
#[derive(Debug, Clone, Default)]
pub struct NameInterner {
    /// Map from name to id for deduplication.
    map: HashMap<String, NameId>,
    /// Storage for interned names, indexed by NameId.
    names: Vec<String>,
}

impl NameInterner {
    pub fn new() -> Self {
        Self::default()
    }

    /// Intern a name, returning its id.
    /// If the name was already interned, returns the existing id.
    pub fn intern(&mut self, name: &str) -> NameId {
        if let Some(&id) = self.map.get(name) {
            return id;
        }

        let id = NameId(self.names.len() as u32);
        self.names.push(name.to_owned());
        self.map.insert(name.to_owned(), id);
        id
    }

    /// Intern an owned name, avoiding a clone when not already present.
    pub fn intern_owned(&mut self, name: String) -> NameId {
        if let Some(&id) = self.map.get(&name) {
            return id;
        }

        let id = NameId(self.names.len() as u32);
        self.names.push(name.clone());
        self.map.insert(name, id);
        id
    }

    /// Look up an already-interned name without inserting.
    #[inline]
    pub fn get(&self, name: &str) -> Option<NameId> {
        self.map.get(name).copied()
    }

    /// Resolve an id back to its name.
    ///
    /// # Panics
    /// Panics if the id was not created by this interner.
    #[inline]
    pub fn resolve(&self, id: NameId) -> &str {
        &self.names[id.0 as usize]
    }

    /// Try to resolve an id, returning None if invalid.
    #[inline]
    pub fn try_resolve(&self, id: NameId) -> Option<&str> {
        self.names.get(id.0 as usize).map(|s| s.as_str())
    }

    /// Number of interned names.
    #[inline]
    pub fn len(&self) -> usize {
        self.names.len()
    }

    /// Whether the interner is empty.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.names.is_empty()
    }

    /// Iterate over all interned names with their ids.
    #[inline]
    pub fn iter(&self) -> impl Iterator<Item = (NameId, &str)> {
        self.names
            .iter()
            .enumerate()
            .map(|(i, s)| (NameId(i as u32), s.as_str()))
    }
}
