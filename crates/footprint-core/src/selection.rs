//! The set of region names marked visited.

use std::collections::BTreeSet;

/// In-memory set of visited region names.
///
/// Every operation is total. The store does not know which names exist
/// in the active scope; [`crate::sync::RenderSync`] only forwards names
/// that do. [`SelectionStore::version`] increases on every mutation that
/// changes membership, which is what observers poll to decide whether to
/// re-derive state.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SelectionStore {
    names: BTreeSet<String>,
    version: u64,
}

impl SelectionStore {
    /// An empty store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Flip membership of `name`. Returns the new membership.
    pub fn toggle(&mut self, name: &str) -> bool {
        let selected = if self.names.remove(name) {
            false
        } else {
            self.names.insert(name.to_owned());
            true
        };
        self.bump();
        selected
    }

    /// Set membership of `name` explicitly. Returns `true` if it changed.
    pub fn set(&mut self, name: &str, selected: bool) -> bool {
        let changed = if selected {
            self.names.insert(name.to_owned())
        } else {
            self.names.remove(name)
        };
        if changed {
            self.bump();
        }
        changed
    }

    /// Replace the set with exactly `names`.
    pub fn select_all<I, S>(&mut self, names: I)
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let next: BTreeSet<String> = names.into_iter().map(Into::into).collect();
        if next != self.names {
            self.names = next;
            self.bump();
        }
    }

    /// Remove every name.
    pub fn deselect_all(&mut self) {
        if !self.names.is_empty() {
            self.names.clear();
            self.bump();
        }
    }

    /// Remove every name; used on scope switch.
    pub fn clear(&mut self) {
        self.deselect_all();
    }

    /// Keep only names for which `keep` returns `true`.
    pub fn retain<F: FnMut(&str) -> bool>(&mut self, mut keep: F) {
        let before = self.names.len();
        self.names.retain(|name| keep(name));
        if self.names.len() != before {
            self.bump();
        }
    }

    /// Returns `true` if `name` is selected.
    #[must_use]
    pub fn contains(&self, name: &str) -> bool {
        self.names.contains(name)
    }

    /// Number of selected names.
    #[must_use]
    pub fn len(&self) -> usize {
        self.names.len()
    }

    /// Returns `true` if nothing is selected.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.names.is_empty()
    }

    /// Selected names in sorted order.
    pub fn iter(&self) -> impl Iterator<Item = &str> {
        self.names.iter().map(String::as_str)
    }

    /// Returns `true` if the selection is exactly the set `names`.
    #[must_use]
    pub fn equals_all<'a, I>(&self, names: I) -> bool
    where
        I: IntoIterator<Item = &'a str>,
    {
        let other: BTreeSet<&str> = names.into_iter().collect();
        other.len() == self.names.len() && other.iter().all(|name| self.names.contains(*name))
    }

    /// Mutation counter.
    #[must_use]
    pub const fn version(&self) -> u64 {
        self.version
    }

    const fn bump(&mut self) {
        self.version = self.version.wrapping_add(1);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn toggle_flips_membership() {
        let mut s = SelectionStore::new();
        assert!(s.toggle("France"));
        assert!(s.contains("France"));
        assert!(!s.toggle("France"));
        assert!(s.is_empty());
    }

    #[test]
    fn double_toggle_restores_prior_state() {
        let mut s = SelectionStore::new();
        s.select_all(["Chile", "Peru"]);
        let before = s.clone();
        for name in ["Chile", "Bolivia"] {
            s.toggle(name);
            s.toggle(name);
            assert!(s.equals_all(before.iter()));
        }
    }

    #[test]
    fn select_all_replaces_and_is_idempotent() {
        let mut s = SelectionStore::new();
        s.toggle("Atlantis");
        s.select_all(["A", "B"]);
        assert!(!s.contains("Atlantis"));
        let version = s.version();
        s.select_all(["B", "A"]);
        assert_eq!(s.version(), version);
        assert_eq!(s.len(), 2);
    }

    #[test]
    fn select_all_then_deselect_all_is_empty() {
        let mut s = SelectionStore::new();
        s.toggle("X");
        s.select_all(["A", "B", "C"]);
        s.deselect_all();
        assert!(s.is_empty());
    }

    #[test]
    fn version_only_moves_on_effective_change() {
        let mut s = SelectionStore::new();
        s.deselect_all();
        assert_eq!(s.version(), 0);
        s.toggle("A");
        assert_eq!(s.version(), 1);
        assert!(!s.set("A", true));
        assert_eq!(s.version(), 1);
        s.clear();
        assert_eq!(s.version(), 2);
    }

    #[test]
    fn equals_all_is_set_equality() {
        let mut s = SelectionStore::new();
        s.select_all(["A", "B"]);
        assert!(s.equals_all(["B", "A"]));
        assert!(!s.equals_all(["A"]));
        assert!(!s.equals_all(["A", "B", "C"]));
    }

    #[test]
    fn retain_drops_unknown_names() {
        let mut s = SelectionStore::new();
        s.select_all(["A", "Stale"]);
        s.retain(|name| name != "Stale");
        assert!(s.equals_all(["A"]));
    }
}
