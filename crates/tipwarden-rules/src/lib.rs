//! # tipwarden-rules
//!
//! Keyword rule model for group moderation: raw specification parsing and
//! validation, trigger-word matching, reply templates and regex word lists.
//!
//! Everything here is pure. Nothing in this crate performs I/O, reads the
//! clock or holds locks; callers pass `now` and own the state.
//!
//! ## Quick Start
//!
//! ```rust
//! use tipwarden_rules::{
//!     KeywordRule, Limits, MessageView, Role, RuleSet, SpecStyle, match_rules, validate_rule,
//! };
//!
//! let spec = validate_rule("hello||hi\n+++\nWelcome!", SpecStyle::Trimmed, &Limits::default())
//!     .expect("valid rule");
//! let mut rules = RuleSet::new();
//! rules.insert(KeywordRule::from_spec("greet".into(), spec, 1, 0));
//!
//! let msg = MessageView { text: Some("hi all"), name: None, forwarded: false, role: Role::Member };
//! assert_eq!(match_rules(&rules, &msg).map(|m| m.key), Some("greet".to_string()));
//! ```

#![deny(clippy::all)]

pub mod action;
pub mod error;
pub mod markup;
pub mod matcher;
pub mod mode;
pub mod rule;
pub mod spec;
pub mod target;
pub mod template;
pub mod words;

pub use self::action::{Action, ActionPlan, Terminal};
pub use self::error::ValidationError;
pub use self::markup::{Button, Notice, parse_notice};
pub use self::matcher::{MessageView, RuleMatch, match_rule, match_rules, word_matches};
pub use self::mode::{MatchKind, MatchModes};
pub use self::rule::{KeywordRule, RuleCounters, RuleSet};
pub use self::spec::{Limits, RuleSpec, SEGMENT_SEPARATOR, SpecStyle, WORD_SEPARATOR, validate_rule};
pub use self::target::{Role, Target};
pub use self::template::{TemplateContext, escape, render};
pub use self::words::{REACTIVE, WordList, WordLists};
