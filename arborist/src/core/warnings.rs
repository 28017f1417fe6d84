//! Suppression of repeated allow-list warnings across fleet cycles.

use std::collections::BTreeSet;

/// Allow-list entries that have already been warned about.
///
/// Owned by the fleet loop and diffed once per cycle: an entry is reported the
/// first cycle it is unresolved, stays quiet while it remains unresolved, and
/// is forgotten once it resolves so a later regression warns again.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct WarnedEntries {
    entries: BTreeSet<String>,
}

impl WarnedEntries {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record this cycle's unresolved entries and return the ones not yet warned.
    ///
    /// Returned entries keep the order of `current`.
    pub fn diff<'a, I>(&mut self, current: I) -> Vec<&'a str>
    where
        I: IntoIterator<Item = &'a str>,
    {
        let current: Vec<&str> = current.into_iter().collect();
        let fresh: Vec<&str> = current
            .iter()
            .copied()
            .filter(|entry| !self.entries.contains(*entry))
            .collect();
        self.entries = current.iter().map(|entry| entry.to_string()).collect();
        fresh
    }

    pub fn contains(&self, entry: &str) -> bool {
        self.entries.contains(entry)
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
