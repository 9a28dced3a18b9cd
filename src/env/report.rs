use std::collections::{btree_map::Entry, BTreeMap};

/// Per-episode tallies of named metrics
///
/// Environments bump entries as they step; a harness calls [`Report::take`] at the end of
/// each episode to collect the values and zero them for the next one.
#[derive(Debug, Clone)]
pub struct Report {
    keys: Vec<&'static str>,
    data: BTreeMap<&'static str, f64>,
}

impl Report {
    pub fn new(keys: Vec<&'static str>) -> Self {
        let data = keys.iter().map(|&k| (k, 0.0)).collect();
        Self { keys, data }
    }

    /// The metric names in declaration order
    pub fn keys(&self) -> &[&'static str] {
        &self.keys
    }

    pub fn entry(&mut self, key: &'static str) -> Entry<'_, &'static str, f64> {
        self.data.entry(key)
    }

    pub fn get(&self, key: &str) -> Option<f64> {
        self.data.get(key).copied()
    }

    /// Return the current values and reset every metric to zero
    pub fn take(&mut self) -> BTreeMap<&'static str, f64> {
        let fresh = self.keys.iter().map(|&k| (k, 0.0)).collect();
        std::mem::replace(&mut self.data, fresh)
    }
}
