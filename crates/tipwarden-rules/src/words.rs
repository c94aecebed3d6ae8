//! Category-keyed regex word lists.
//!
//! Shared pattern lists (for example the group-wide `reactive` fallback) are
//! kept in one map keyed by category and indexed explicitly at call sites.

use regex::{Regex, RegexBuilder};
use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};

/// Category tested after keyword rules as the group-wide fallback.
pub const REACTIVE: &str = "reactive";

#[derive(Debug)]
struct Entry {
    pattern: String,
    regex: Regex,
    hits: AtomicU64,
}

/// Compiled patterns of one category with per-pattern hit counters.
#[derive(Debug, Default)]
pub struct WordList {
    entries: Vec<Entry>,
}

impl WordList {
    /// Compile patterns case-insensitively. Fails on the first invalid one.
    pub fn compile<I, S>(patterns: I) -> Result<Self, regex::Error>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let entries = patterns
            .into_iter()
            .map(|p| {
                let pattern = p.into();
                let regex = RegexBuilder::new(&pattern).case_insensitive(true).build()?;
                Ok(Entry {
                    pattern,
                    regex,
                    hits: AtomicU64::new(0),
                })
            })
            .collect::<Result<Vec<_>, regex::Error>>()?;
        Ok(Self { entries })
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// First pattern matching `text`; counts the hit.
    pub fn find(&self, text: &str) -> Option<&str> {
        let entry = self.entries.iter().find(|e| e.regex.is_match(text))?;
        entry.hits.fetch_add(1, Ordering::Relaxed);
        Some(entry.pattern.as_str())
    }

    pub fn hits(&self) -> Vec<(String, u64)> {
        self.entries
            .iter()
            .map(|e| (e.pattern.clone(), e.hits.load(Ordering::Relaxed)))
            .collect()
    }

    pub fn reset_hits(&self) {
        for entry in &self.entries {
            entry.hits.store(0, Ordering::Relaxed);
        }
    }
}

/// All word lists, keyed by category.
#[derive(Debug, Default)]
pub struct WordLists {
    lists: HashMap<String, WordList>,
}

impl WordLists {
    pub fn new() -> Self {
        Self::default()
    }

    /// Replace a category's patterns.
    pub fn set(&mut self, category: &str, list: WordList) {
        self.lists.insert(category.to_string(), list);
    }

    pub fn get(&self, category: &str) -> Option<&WordList> {
        self.lists.get(category)
    }

    /// Match `text` against one category.
    pub fn find(&self, category: &str, text: &str) -> Option<&str> {
        self.lists.get(category)?.find(text)
    }

    pub fn categories(&self) -> impl Iterator<Item = &str> {
        self.lists.keys().map(String::as_str)
    }

    pub fn reset_hits(&self) {
        for list in self.lists.values() {
            list.reset_hits();
        }
    }
}
