//! Keyword matching.
//!
//! Matching never fails: an absent match is a normal result.

use crate::mode::{MatchKind, MatchModes};
use crate::rule::{KeywordRule, RuleSet};
use crate::target::Role;

/// The parts of an inbound message the matcher looks at.
#[derive(Debug, Clone, Copy)]
pub struct MessageView<'a> {
    /// Message text or caption.
    pub text: Option<&'a str>,
    /// Display name tested by `name` rules: the forwarded-from name when the
    /// message is forwarded, otherwise the author's own name.
    pub name: Option<&'a str>,
    pub forwarded: bool,
    pub role: Role,
}

/// Which rule matched and on which trigger word.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RuleMatch {
    pub key: String,
    pub word: String,
}

/// Strip the `{{word}}` escape, if present.
fn forced_exact(word: &str) -> Option<&str> {
    word.strip_prefix("{{")
        .and_then(|rest| rest.strip_suffix("}}"))
        .filter(|inner| !inner.is_empty())
}

/// Test one trigger word against a candidate string under `modes`.
pub fn word_matches(word: &str, candidate: &str, modes: &MatchModes) -> bool {
    let (word, kind) = match (modes.pure, forced_exact(word)) {
        (true, Some(inner)) => (inner, MatchKind::Exact),
        _ => (word, modes.kind),
    };

    let compare = |w: &str, c: &str| match kind {
        MatchKind::Include => c.contains(w),
        MatchKind::Exact => c.trim() == w,
    };

    if modes.case_sensitive {
        compare(word, candidate)
    } else {
        compare(&word.to_lowercase(), &candidate.to_lowercase())
    }
}

/// Test a single rule; returns the first trigger word that matched.
pub fn match_rule<'r>(rule: &'r KeywordRule, message: &MessageView<'_>) -> Option<&'r str> {
    if !rule.target.admits(message.role) {
        return None;
    }
    if rule.modes.forward && !message.forwarded {
        return None;
    }

    let candidate = if rule.modes.name {
        message.name?
    } else {
        message.text?
    };
    if candidate.is_empty() {
        return None;
    }

    rule.words
        .iter()
        .find(|word| word_matches(word, candidate, &rule.modes))
        .map(String::as_str)
}

/// Evaluate a message against every rule, returning the first match.
pub fn match_rules(rules: &RuleSet, message: &MessageView<'_>) -> Option<RuleMatch> {
    rules.iter().find_map(|rule| {
        match_rule(rule, message).map(|word| RuleMatch {
            key: rule.key.clone(),
            word: word.to_string(),
        })
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::spec::{Limits, SEGMENT_SEPARATOR, SpecStyle, validate_rule};

    fn rule(key: &str, parts: &[&str]) -> KeywordRule {
        let raw = parts.join(SEGMENT_SEPARATOR);
        let spec = validate_rule(&raw, SpecStyle::Trimmed, &Limits::default()).unwrap();
        KeywordRule::from_spec(key.to_string(), spec, 1, 0)
    }

    fn text(t: &str) -> MessageView<'_> {
        MessageView {
            text: Some(t),
            name: Some("Alice"),
            forwarded: false,
            role: Role::Member,
        }
    }

    #[test]
    fn include_is_case_insensitive_substring() {
        let r = rule("k", &["hello||hi", "Welcome!"]);
        assert_eq!(match_rule(&r, &text("oh HI there")), Some("hi"));
        assert_eq!(match_rule(&r, &text("nothing")), None);
    }

    #[test]
    fn case_mode_is_sensitive() {
        let r = rule("k", &["Hi", "x", "include case"]);
        assert!(match_rule(&r, &text("Hi all")).is_some());
        assert!(match_rule(&r, &text("hi all")).is_none());
    }

    #[test]
    fn exact_requires_whole_text() {
        let r = rule("k", &["ping", "pong", "exact"]);
        assert!(match_rule(&r, &text("PING")).is_some());
        assert!(match_rule(&r, &text(" ping ")).is_some());
        assert!(match_rule(&r, &text("ping please")).is_none());
    }

    #[test]
    fn name_mode_tests_display_name() {
        let r = rule("k", &["alice", "x", "include name"]);
        assert!(match_rule(&r, &text("unrelated")).is_some());
        let nameless = MessageView {
            name: None,
            ..text("alice")
        };
        assert!(match_rule(&r, &nameless).is_none());
    }

    #[test]
    fn forward_mode_requires_forwarded_message() {
        let r = rule("k", &["promo", "x", "include forward"]);
        assert!(match_rule(&r, &text("promo")).is_none());
        let fwd = MessageView {
            forwarded: true,
            ..text("big promo")
        };
        assert!(match_rule(&r, &fwd).is_some());
    }

    #[test]
    fn pure_mode_forces_braced_words_exact() {
        let r = rule("k", &["{{help}}||bot", "x", "include pure"]);
        assert!(match_rule(&r, &text("help")).is_some());
        assert!(match_rule(&r, &text("help me")).is_none());
        assert_eq!(match_rule(&r, &text("the bot is down")), Some("bot"));
    }

    #[test]
    fn braces_are_literal_without_pure() {
        let r = rule("k", &["{{help}}", "x", "include"]);
        assert!(match_rule(&r, &text("help")).is_none());
        assert!(match_rule(&r, &text("type {{help}} now")).is_some());
    }

    #[test]
    fn target_filters_authors() {
        let r = rule("k", &["spam", "x", "include", "reply", "member"]);
        let admin = MessageView {
            role: Role::Admin,
            ..text("spam")
        };
        assert!(match_rule(&r, &admin).is_none());
        assert!(match_rule(&r, &text("spam")).is_some());
    }

    #[test]
    fn first_rule_in_key_order_wins() {
        let mut set = RuleSet::new();
        set.insert(rule("b", &["spam", "second"]));
        set.insert(rule("a", &["spa", "first"]));
        let found = match_rules(&set, &text("spam")).unwrap();
        assert_eq!(found, RuleMatch { key: "a".into(), word: "spa".into() });
    }

    #[test]
    fn media_without_text_never_matches_text_rules() {
        let mut set = RuleSet::new();
        set.insert(rule("a", &["spam", "x"]));
        let media = MessageView {
            text: None,
            ..text("")
        };
        assert!(match_rules(&set, &media).is_none());
    }
}
