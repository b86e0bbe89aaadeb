//! Interned string table.
//!
//! Entries refer to their strings through small [`StrId`] handles, so the
//! whole store serializes as one flat blob without offset arithmetic.

use std::collections::HashMap;

/// Handle into a [`StringTable`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct StrId(pub(crate) u32);

impl StrId {
    #[must_use]
    pub fn index(self) -> usize {
        self.0 as usize
    }
}

/// Deduplicating string storage addressed by [`StrId`].
#[derive(Debug, Clone, Default)]
pub struct StringTable {
    strings: Vec<Box<str>>,
    lookup: HashMap<Box<str>, StrId>,
}

impl StringTable {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a table from strings in handle order. Handle `i` refers to
    /// `strings[i]`; duplicates keep their own handles but interning resolves
    /// to the first.
    #[must_use]
    pub fn from_strings(strings: Vec<String>) -> Self {
        let mut table = Self::new();
        for s in strings {
            let id = table.next_id();
            let boxed: Box<str> = s.into_boxed_str();
            table.lookup.entry(boxed.clone()).or_insert(id);
            table.strings.push(boxed);
        }
        table
    }

    /// Return the handle for `s`, adding it if absent.
    pub fn intern(&mut self, s: &str) -> StrId {
        if let Some(&id) = self.lookup.get(s) {
            return id;
        }
        let id = self.next_id();
        let boxed: Box<str> = s.into();
        self.lookup.insert(boxed.clone(), id);
        self.strings.push(boxed);
        id
    }

    #[must_use]
    pub fn get(&self, id: StrId) -> Option<&str> {
        self.strings.get(id.index()).map(AsRef::as_ref)
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.strings.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.strings.is_empty()
    }

    /// Strings in handle order.
    pub fn iter(&self) -> impl Iterator<Item = &str> {
        self.strings.iter().map(AsRef::as_ref)
    }

    fn next_id(&self) -> StrId {
        // The codec stores handles as u32; a history never approaches that.
        StrId(u32::try_from(self.strings.len()).unwrap_or(u32::MAX))
    }
}
