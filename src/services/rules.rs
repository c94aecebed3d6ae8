//! Rule administration: add, edit, remove and show, gated by the edit lease.

use crate::error::CommandError;
use crate::platform::{GroupId, UserId};
use crate::state::{GroupState, lease};
use crate::warden::Warden;
use rand::Rng;
use rand::distributions::Alphanumeric;
use serde::Serialize;
use tipwarden_rules::{
    KeywordRule, RuleCounters, RuleSet, SpecStyle, ValidationError, validate_rule,
};
use tracing::{debug, info};

const KEY_LEN: usize = 6;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EditMode {
    /// Create a rule under a freshly generated key.
    Add,
    /// Replace the rule with this key, keeping its counters.
    Edit(String),
}

/// Admin-facing rendering of one rule.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RuleView {
    pub key: String,
    pub author: UserId,
    pub words: Vec<String>,
    pub modes: Vec<&'static str>,
    pub actions: Vec<String>,
    pub target: &'static str,
    pub destruct: u32,
    pub counters: RuleCounters,
    pub raw: String,
}

impl From<&KeywordRule> for RuleView {
    fn from(rule: &KeywordRule) -> Self {
        let m = &rule.modes;
        let mut modes = vec![m.kind.as_str()];
        for (set, name) in [
            (m.case_sensitive, "case"),
            (m.name, "name"),
            (m.forward, "forward"),
            (m.pure, "pure"),
        ] {
            if set {
                modes.push(name);
            }
        }

        Self {
            key: rule.key.clone(),
            author: rule.author,
            words: rule.words.iter().cloned().collect(),
            modes,
            actions: rule.actions.actions().iter().map(ToString::to_string).collect(),
            target: rule.target.as_str(),
            destruct: rule.destruct,
            counters: rule.counters,
            raw: rule.raw.clone(),
        }
    }
}

fn generate_key(rules: &RuleSet) -> String {
    let mut rng = rand::thread_rng();
    loop {
        let key: String = (&mut rng)
            .sample_iter(&Alphanumeric)
            .take(KEY_LEN)
            .map(char::from)
            .collect::<String>()
            .to_lowercase();
        if !rules.contains(&key) {
            return key;
        }
    }
}

impl Warden {
    /// Validate `raw` and store it as a new or replacement rule. Returns the key.
    pub fn add_or_edit(
        &self,
        group: GroupId,
        admin: UserId,
        raw: &str,
        style: SpecStyle,
        mode: EditMode,
        now: i64,
    ) -> Result<String, CommandError> {
        let state = self.admin_group(group, admin)?;
        self.claim_lease(&state, admin, now)?;

        let spec = validate_rule(raw, style, &self.limits)?;
        let max_rules = self.config.limits.max_rules;

        let key = state.rules_mut(|rules| match mode {
            EditMode::Add => {
                if rules.len() >= max_rules {
                    return Err(CommandError::Invalid(ValidationError::TooManyRules(
                        max_rules,
                    )));
                }
                let key = generate_key(rules);
                rules.insert(KeywordRule::from_spec(key.clone(), spec, admin, now));
                Ok(key)
            }
            EditMode::Edit(key) => match rules.get_mut(&key) {
                Some(rule) => {
                    rule.apply_edit(spec, admin, now);
                    Ok(key)
                }
                None => Err(CommandError::UnknownRule(key)),
            },
        })?;

        self.persist_rules(&state);
        info!(group, admin, key = %key, "Rule saved");
        Ok(key)
    }

    pub fn remove_rule(
        &self,
        group: GroupId,
        admin: UserId,
        key: &str,
        now: i64,
    ) -> Result<(), CommandError> {
        let state = self.admin_group(group, admin)?;
        self.claim_lease(&state, admin, now)?;

        if state.rules_mut(|rules| rules.remove(key)).is_none() {
            return Err(CommandError::UnknownRule(key.to_string()));
        }
        self.persist_rules(&state);
        info!(group, admin, key, "Rule removed; its slot is cleared on the next sweep");
        Ok(())
    }

    /// Every rule of the group in key order.
    pub fn show_rules(&self, group: GroupId, admin: UserId) -> Result<Vec<RuleView>, CommandError> {
        let state = self.admin_group(group, admin)?;
        Ok(state.rules(|rules| rules.iter().map(RuleView::from).collect()))
    }

    /// Give up the edit lease early. Returns whether `admin` held it.
    pub fn release_lease(&self, group: GroupId, admin: UserId) -> bool {
        self.registry
            .get(group)
            .is_some_and(|state| state.lease(|l| lease::release(l, admin)))
    }

    /// Claim the edit lease. A successful claim frees any lease the same
    /// admin holds in other groups.
    fn claim_lease(&self, state: &GroupState, admin: UserId, now: i64) -> Result<(), CommandError> {
        let ttl = i64::try_from(self.config.timers.edit_lock_ttl).unwrap_or(i64::MAX);
        state.lease(|l| lease::claim(l, admin, now, ttl))?;

        for other in self.registry.ids() {
            if other == state.id {
                continue;
            }
            if let Some(group) = self.registry.get(other)
                && group.lease(|l| lease::release(l, admin))
            {
                debug!(group = other, admin, "Released lease held elsewhere");
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn generated_keys_avoid_collisions() {
        let mut rules = RuleSet::new();
        for _ in 0..50 {
            let key = generate_key(&rules);
            assert_eq!(key.len(), KEY_LEN);
            assert!(!rules.contains(&key));
            let spec = validate_rule(
                "w\n+++\nr",
                SpecStyle::Trimmed,
                &tipwarden_rules::Limits::default(),
            )
            .unwrap();
            rules.insert(KeywordRule::from_spec(key, spec, 1, 0));
        }
        assert_eq!(rules.len(), 50);
    }

    #[test]
    fn view_lists_modes_and_actions() {
        let spec = validate_rule(
            "a||b\n+++\nhi\n+++\nexact case\n+++\nreply ban-600\n+++\nmember\n+++\n400",
            SpecStyle::Trimmed,
            &tipwarden_rules::Limits::default(),
        )
        .unwrap();
        let view = RuleView::from(&KeywordRule::from_spec("k".into(), spec, 9, 0));
        assert_eq!(view.words, vec!["a", "b"]);
        assert_eq!(view.modes, vec!["exact", "case"]);
        assert_eq!(view.target, "member");
        assert_eq!(view.destruct, 400);
        assert!(view.actions.contains(&"reply".to_string()));
    }
}
