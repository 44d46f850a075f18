// Copyright (c) 2025 Cloudflare, Inc.
// Licensed under the Apache 2.0 license found in the LICENSE file or at:
//     https://opensource.org/licenses/Apache-2.0

use indexmap::IndexMap;

use crate::bare_item::{BareItem, Key};

/// An ordered mapping from parameter key to bare item. Parameter order is
/// load-bearing, so this wraps `IndexMap` rather than a `HashMap`.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Parameters(IndexMap<Key, BareItem>);

impl Parameters {
    pub fn new() -> Self {
        Parameters(IndexMap::new())
    }

    pub fn insert(&mut self, key: Key, value: BareItem) -> Option<BareItem> {
        self.0.insert(key, value)
    }

    pub fn get(&self, key: &str) -> Option<&BareItem> {
        self.0.get(key)
    }

    pub fn contains_key(&self, key: &str) -> bool {
        self.0.contains_key(key)
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&Key, &BareItem)> {
        self.0.iter()
    }
}

impl<'a> IntoIterator for &'a Parameters {
    type Item = (&'a Key, &'a BareItem);
    type IntoIter = indexmap::map::Iter<'a, Key, BareItem>;

    fn into_iter(self) -> Self::IntoIter {
        self.0.iter()
    }
}

impl FromIterator<(Key, BareItem)> for Parameters {
    fn from_iter<T: IntoIterator<Item = (Key, BareItem)>>(iter: T) -> Self {
        Parameters(IndexMap::from_iter(iter))
    }
}

/// A bare item together with its parameters — the unit that appears as a
/// List member, a Dictionary member's value, or an Inner List member.
#[derive(Debug, Clone, PartialEq)]
pub struct Item {
    pub bare_item: BareItem,
    pub params: Parameters,
}

impl Item {
    pub fn new(bare_item: BareItem) -> Self {
        Item {
            bare_item,
            params: Parameters::new(),
        }
    }

    pub fn with_params(bare_item: BareItem, params: Parameters) -> Self {
        Item { bare_item, params }
    }

    /// Returns a new `Item` sharing the same bare value but with different
    /// parameters.
    pub fn with_params_replaced(&self, params: Parameters) -> Self {
        Item {
            bare_item: self.bare_item.clone(),
            params,
        }
    }
}

/// An ordered sequence of items, with its own parameters (the Inner List
/// variant).
#[derive(Debug, Clone, PartialEq)]
pub struct InnerList {
    pub items: Vec<Item>,
    pub params: Parameters,
}

impl InnerList {
    pub fn new(items: Vec<Item>) -> Self {
        InnerList {
            items,
            params: Parameters::new(),
        }
    }

    pub fn with_params(items: Vec<Item>, params: Parameters) -> Self {
        InnerList { items, params }
    }
}

/// A member of a top-level List, or the value half of a Dictionary member:
/// either a bare `Item` or an `InnerList`.
#[derive(Debug, Clone, PartialEq)]
pub enum ListEntry {
    Item(Item),
    InnerList(InnerList),
}

impl ListEntry {
    pub fn params(&self) -> &Parameters {
        match self {
            ListEntry::Item(item) => &item.params,
            ListEntry::InnerList(inner) => &inner.params,
        }
    }

    pub fn as_item(&self) -> Option<&Item> {
        match self {
            ListEntry::Item(item) => Some(item),
            ListEntry::InnerList(_) => None,
        }
    }

    pub fn as_inner_list(&self) -> Option<&InnerList> {
        match self {
            ListEntry::InnerList(inner) => Some(inner),
            ListEntry::Item(_) => None,
        }
    }
}

/// A top-level List: an ordered sequence of `ListEntry`.
pub type List = Vec<ListEntry>;

/// A top-level Dictionary: an ordered mapping from `Key` to `ListEntry`,
/// with insertion order preserved and duplicate keys resolved "last
/// wins" — RFC 9421 signature-label selection assumes this.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Dictionary(IndexMap<Key, ListEntry>);

impl Dictionary {
    pub fn new() -> Self {
        Dictionary(IndexMap::new())
    }

    /// Insert a member, overwriting the value of any prior entry under the
    /// same key while leaving that key's position in iteration order
    /// unchanged (`IndexMap::insert`'s native behavior) — the last-written
    /// value wins without reordering the dictionary.
    pub fn insert(&mut self, key: Key, value: ListEntry) -> Option<ListEntry> {
        self.0.insert(key, value)
    }

    pub fn get(&self, key: &str) -> Option<&ListEntry> {
        self.0.get(key)
    }

    pub fn shift_remove(&mut self, key: &str) -> Option<ListEntry> {
        self.0.shift_remove(key)
    }

    pub fn contains_key(&self, key: &str) -> bool {
        self.0.contains_key(key)
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&Key, &ListEntry)> {
        self.0.iter()
    }
}

impl IntoIterator for Dictionary {
    type Item = (Key, ListEntry);
    type IntoIter = indexmap::map::IntoIter<Key, ListEntry>;

    fn into_iter(self) -> Self::IntoIter {
        self.0.into_iter()
    }
}

impl<'a> IntoIterator for &'a Dictionary {
    type Item = (&'a Key, &'a ListEntry);
    type IntoIter = indexmap::map::Iter<'a, Key, ListEntry>;

    fn into_iter(self) -> Self::IntoIter {
        self.0.iter()
    }
}

impl FromIterator<(Key, ListEntry)> for Dictionary {
    fn from_iter<T: IntoIterator<Item = (Key, ListEntry)>>(iter: T) -> Self {
        let mut map = IndexMap::new();
        for (k, v) in iter {
            map.insert(k, v);
        }
        Dictionary(map)
    }
}

/// The result of `parse_any`: a top-level value whose shape (List,
/// Dictionary, or bare Item) was determined at parse time.
#[derive(Debug, Clone, PartialEq)]
pub enum StructuredValue {
    List(List),
    Dictionary(Dictionary),
    Item(Item),
}
