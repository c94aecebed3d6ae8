//! Keyword rules and the per-group rule set.

use crate::action::ActionPlan;
use crate::markup::Notice;
use crate::mode::MatchModes;
use crate::spec::RuleSpec;
use crate::target::Target;
use std::collections::{BTreeMap, BTreeSet};

/// Match counters for one rule.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct RuleCounters {
    pub total: u64,
    pub today: u64,
}

/// An administrator-defined keyword rule.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct KeywordRule {
    pub key: String,
    pub words: BTreeSet<String>,
    pub notice: Notice,
    pub modes: MatchModes,
    pub actions: ActionPlan,
    pub target: Target,
    /// Lifetime of this rule's reply before the sweep deletes it.
    pub destruct: u32,
    pub raw: String,
    /// Admin who last added or edited the rule.
    pub author: i64,
    /// Unix seconds of the last add/edit.
    pub updated_at: i64,
    #[cfg_attr(feature = "serde", serde(default))]
    pub counters: RuleCounters,
}

impl KeywordRule {
    pub fn from_spec(key: String, spec: RuleSpec, author: i64, now: i64) -> Self {
        Self {
            key,
            words: spec.words,
            notice: spec.notice,
            modes: spec.modes,
            actions: spec.actions,
            target: spec.target,
            destruct: spec.destruct,
            raw: spec.raw,
            author,
            updated_at: now,
            counters: RuleCounters::default(),
        }
    }

    /// Replace the definition while keeping the key and counters.
    pub fn apply_edit(&mut self, spec: RuleSpec, author: i64, now: i64) {
        self.words = spec.words;
        self.notice = spec.notice;
        self.modes = spec.modes;
        self.actions = spec.actions;
        self.target = spec.target;
        self.destruct = spec.destruct;
        self.raw = spec.raw;
        self.author = author;
        self.updated_at = now;
    }
}

/// All keyword rules of one group, ordered by key.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(transparent))]
pub struct RuleSet {
    rules: BTreeMap<String, KeywordRule>,
}

impl RuleSet {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.rules.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rules.is_empty()
    }

    pub fn contains(&self, key: &str) -> bool {
        self.rules.contains_key(key)
    }

    pub fn get(&self, key: &str) -> Option<&KeywordRule> {
        self.rules.get(key)
    }

    pub fn get_mut(&mut self, key: &str) -> Option<&mut KeywordRule> {
        self.rules.get_mut(key)
    }

    pub fn insert(&mut self, rule: KeywordRule) -> Option<KeywordRule> {
        self.rules.insert(rule.key.clone(), rule)
    }

    pub fn remove(&mut self, key: &str) -> Option<KeywordRule> {
        self.rules.remove(key)
    }

    pub fn iter(&self) -> impl Iterator<Item = &KeywordRule> {
        self.rules.values()
    }

    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.rules.keys().map(String::as_str)
    }

    /// Record one match. Returns false if the rule no longer exists.
    pub fn record_hit(&mut self, key: &str) -> bool {
        match self.rules.get_mut(key) {
            Some(rule) => {
                rule.counters.total += 1;
                rule.counters.today += 1;
                true
            }
            None => false,
        }
    }

    pub fn reset_today(&mut self) {
        for rule in self.rules.values_mut() {
            rule.counters.today = 0;
        }
    }
}
