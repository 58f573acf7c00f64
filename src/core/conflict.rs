//! Key binding conflict index and queries
//!
//! This module builds the conflict index across packages and derives the two
//! conflict views from it:
//! - **Direct conflicts:** the same canonical chord sequence bound by more
//!   than one package (or more than once inside one package, on request)
//! - **Overlaps:** one sequence is a strict chord-by-chord prefix of another,
//!   so the longer one can never be reached
//!
//! # Ordering
//! The index is a `BTreeMap`, so every view comes out in lexicographic key
//! order. Per key, packages keep insertion order (`IndexMap`) and bindings
//! keep file order.

use indexmap::IndexMap;
use serde::Serialize;
use std::collections::BTreeMap;

use crate::core::ignore::IgnoreRules;
use crate::core::types::{ChordSequence, Keybinding};

/// Everything bound to one canonical key
#[derive(Clone, Debug, Default, PartialEq, Serialize)]
pub struct KeyEntry {
    /// Every distinct chord sequence filed under this key, in arrival order.
    /// A one-chord `["x,y"]` and a two-chord `["x", "y"]` share the key `x,y`.
    #[serde(skip)]
    pub sequences: Vec<ChordSequence>,

    /// Package name to the bindings it contributes, in processing order.
    /// A package only appears here once it contributed at least one binding.
    pub packages: IndexMap<String, Vec<Keybinding>>,
}

impl KeyEntry {
    /// Package names in processing order
    pub fn package_names(&self) -> Vec<&str> {
        self.packages.keys().map(String::as_str).collect()
    }

    pub fn binding_count(&self) -> usize {
        self.packages.values().map(Vec::len).sum()
    }

    /// Some package binds this key more than once
    pub fn has_internal_duplicate(&self) -> bool {
        self.packages.values().any(|bindings| bindings.len() > 1)
    }

    pub fn is_conflict(&self, include_internal: bool) -> bool {
        self.packages.len() > 1 || (include_internal && self.has_internal_duplicate())
    }
}

/// A direct conflict: one key, several bindings
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Conflict<'a> {
    /// Canonical key string
    pub key: &'a str,

    /// All packages and bindings using the key
    pub entry: &'a KeyEntry,
}

/// A prefix key and every longer key it shadows
#[derive(Clone, Debug, PartialEq)]
pub struct Overlap<'a> {
    pub prefix: &'a str,

    /// Longer keys extending `prefix`, in lexicographic order
    pub extensions: Vec<&'a str>,
}

/// Builds the conflict index and answers conflict queries.
///
/// Ignore rules are applied on insertion, after canonicalisation.
#[derive(Debug, Default)]
pub struct ConflictDetector {
    rules: IgnoreRules,
    index: BTreeMap<String, KeyEntry>,
    ignored: usize,
}

impl ConflictDetector {
    /// Creates a new empty detector with no ignore rules.
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_rules(rules: IgnoreRules) -> Self {
        Self {
            rules,
            ..Self::default()
        }
    }

    /// Adds a binding found in `package`.
    ///
    /// Returns `false` when an ignore rule dropped it.
    pub fn add_binding(&mut self, package: &str, binding: Keybinding) -> bool {
        if self.rules.is_ignored(&binding.sequence) {
            self.ignored += 1;
            return false;
        }

        let entry = self
            .index
            .entry(binding.key())
            .or_default();

        if !entry.sequences.contains(&binding.sequence) {
            entry.sequences.push(binding.sequence.clone());
        }

        entry
            .packages
            .entry(package.to_string())
            .or_default()
            .push(binding);

        true
    }

    /// Finds all direct conflicts, sorted by key.
    ///
    /// With `include_internal`, a key bound twice by a single package counts
    /// as a conflict too.
    pub fn find_conflicts(&self, include_internal: bool) -> Vec<Conflict<'_>> {
        self.index
            .iter()
            .filter(|(_, entry)| entry.is_conflict(include_internal))
            .map(|(key, entry)| Conflict {
                key: key.as_str(),
                entry,
            })
            .collect()
    }

    /// Finds every key that is a strict prefix of another indexed key.
    ///
    /// Package boundaries are irrelevant here: the shorter sequence fires
    /// first wherever it comes from. Prefixes are taken from every sequence
    /// stored under a key, so insertion order never changes the result.
    pub fn find_overlaps(&self) -> Vec<Overlap<'_>> {
        let mut overlaps: BTreeMap<&str, Vec<&str>> = BTreeMap::new();

        for (key, entry) in &self.index {
            let prefixes = entry.sequences.iter().flat_map(ChordSequence::prefix_keys);
            for prefix in prefixes {
                if let Some((prefix, _)) = self.index.get_key_value(&prefix) {
                    let extensions = overlaps.entry(prefix.as_str()).or_default();
                    // Keys arrive in order, so a repeat is always the last one
                    if extensions.last() != Some(&key.as_str()) {
                        extensions.push(key.as_str());
                    }
                }
            }
        }

        overlaps
            .into_iter()
            .map(|(prefix, extensions)| Overlap { prefix, extensions })
            .collect()
    }

    /// Checks if a specific canonical key has a direct conflict.
    pub fn has_conflict(&self, key: &str, include_internal: bool) -> bool {
        self.index
            .get(key)
            .map(|entry| entry.is_conflict(include_internal))
            .unwrap_or(false)
    }

    pub fn get(&self, key: &str) -> Option<&KeyEntry> {
        self.index.get(key)
    }

    /// Full unfiltered index in key order
    pub fn entries(&self) -> impl Iterator<Item = (&str, &KeyEntry)> {
        self.index.iter().map(|(key, entry)| (key.as_str(), entry))
    }

    /// Number of distinct canonical keys
    pub fn len(&self) -> usize {
        self.index.len()
    }

    pub fn is_empty(&self) -> bool {
        self.index.is_empty()
    }

    /// Returns the total number of bindings tracked.
    pub fn total_bindings(&self) -> usize {
        self.index.values().map(KeyEntry::binding_count).sum()
    }

    /// Bindings dropped by ignore rules
    pub fn ignored_count(&self) -> usize {
        self.ignored
    }
}
