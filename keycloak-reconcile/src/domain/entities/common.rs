use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};

/// Unordered collection of strings.
///
/// Remote admin APIs return lists (redirect URIs, scope names, role names) in no stable
/// order, so membership is all that matters when two realms are compared. Backed by a
/// `BTreeSet` so serialization is sorted and deterministic.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct StringSet(BTreeSet<String>);

impl StringSet {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, value: impl Into<String>) -> bool {
        self.0.insert(value.into())
    }

    pub fn contains(&self, value: &str) -> bool {
        self.0.contains(value)
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &String> {
        self.0.iter()
    }

    /// Members present in `self` but not in `other`, in sorted order.
    pub fn difference<'a>(&'a self, other: &'a StringSet) -> impl Iterator<Item = &'a String> {
        self.0.difference(&other.0)
    }

    pub fn intersection<'a>(
        &'a self,
        other: &'a StringSet,
    ) -> impl Iterator<Item = &'a String> {
        self.0.intersection(&other.0)
    }

    pub fn union(&self, other: &StringSet) -> StringSet {
        self.0.union(&other.0).cloned().collect()
    }

    pub fn to_vec(&self) -> Vec<String> {
        self.0.iter().cloned().collect()
    }
}

impl<S: Into<String>> FromIterator<S> for StringSet {
    fn from_iter<I: IntoIterator<Item = S>>(iter: I) -> Self {
        Self(iter.into_iter().map(Into::into).collect())
    }
}

impl IntoIterator for StringSet {
    type Item = String;
    type IntoIter = std::collections::btree_set::IntoIter<String>;

    fn into_iter(self) -> Self::IntoIter {
        self.0.into_iter()
    }
}

impl<'a> IntoIterator for &'a StringSet {
    type Item = &'a String;
    type IntoIter = std::collections::btree_set::Iter<'a, String>;

    fn into_iter(self) -> Self::IntoIter {
        self.0.iter()
    }
}

/// Map from a key to a list of values, compared without regard to value order.
///
/// Used for attributes (`key -> values`) and client role assignments
/// (`clientId -> role names`). Two maps are equal iff they have the same key set and,
/// for every key, the same values taken as a set. A key with an empty list is still a key.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct MultiMap(BTreeMap<String, Vec<String>>);

impl MultiMap {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, key: impl Into<String>, values: Vec<String>) {
        self.0.insert(key.into(), values);
    }

    /// Append one value under `key`, creating the key if needed.
    pub fn push(&mut self, key: impl Into<String>, value: impl Into<String>) {
        self.0.entry(key.into()).or_default().push(value.into());
    }

    pub fn get(&self, key: &str) -> Option<&Vec<String>> {
        self.0.get(key)
    }

    pub fn keys(&self) -> impl Iterator<Item = &String> {
        self.0.keys()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&String, &Vec<String>)> {
        self.0.iter()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn unordered_eq(&self, other: &MultiMap) -> bool {
        if self.0.len() != other.0.len() {
            return false;
        }

        self.0.iter().all(|(key, values)| match other.0.get(key) {
            Some(other_values) => {
                let left: BTreeSet<&String> = values.iter().collect();
                let right: BTreeSet<&String> = other_values.iter().collect();
                left == right
            }
            None => false,
        })
    }
}

impl PartialEq for MultiMap {
    fn eq(&self, other: &Self) -> bool {
        self.unordered_eq(other)
    }
}

impl Eq for MultiMap {}

impl<K: Into<String>> FromIterator<(K, Vec<String>)> for MultiMap {
    fn from_iter<I: IntoIterator<Item = (K, Vec<String>)>>(iter: I) -> Self {
        Self(iter.into_iter().map(|(k, v)| (k.into(), v)).collect())
    }
}
