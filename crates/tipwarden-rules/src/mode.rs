//! Match modes.
//!
//! A rule carries exactly one base comparison ([`MatchKind`]) plus any number
//! of additive modifiers. The base is stored as a single enum field so the
//! include/exact exclusivity cannot be violated once a [`MatchModes`] exists.

use crate::error::ValidationError;
use std::fmt;

/// Base comparison applied to each trigger word.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "lowercase"))]
pub enum MatchKind {
    /// Word occurs anywhere in the candidate text.
    Include,
    /// Word equals the whole candidate text.
    Exact,
}

impl MatchKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            MatchKind::Include => "include",
            MatchKind::Exact => "exact",
        }
    }
}

/// Validated set of match modes for one rule.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct MatchModes {
    pub kind: MatchKind,
    /// `case`: compare case-sensitively.
    pub case_sensitive: bool,
    /// `name`: test the sender's display name instead of the message text.
    pub name: bool,
    /// `forward`: only forwarded messages can match.
    pub forward: bool,
    /// `pure`: `{{word}}` triggers compare exactly regardless of `kind`.
    pub pure: bool,
}

impl Default for MatchModes {
    fn default() -> Self {
        Self::new(MatchKind::Include)
    }
}

impl MatchModes {
    pub const DEFAULT_SEGMENT: &'static str = "include";

    pub fn new(kind: MatchKind) -> Self {
        Self {
            kind,
            case_sensitive: false,
            name: false,
            forward: false,
            pure: false,
        }
    }

    fn is_known(word: &str) -> bool {
        matches!(
            word,
            "include" | "exact" | "case" | "name" | "forward" | "pure"
        )
    }

    /// Parse a whitespace-separated mode list such as `"exact case"`.
    pub fn parse(segment: &str) -> Result<Self, ValidationError> {
        let mut kind = None;
        let mut modes = Self::default();

        let words: Vec<&str> = segment.split_whitespace().collect();
        if words.is_empty() {
            return Err(ValidationError::ModeMissing);
        }

        // Unknown names are reported before structural problems.
        if let Some(bad) = words.iter().find(|w| !Self::is_known(w)) {
            return Err(ValidationError::ModeInvalid(bad.to_string()));
        }

        let mut conflict = false;
        for word in words {
            let next = match word {
                "include" => MatchKind::Include,
                "exact" => MatchKind::Exact,
                "case" => {
                    modes.case_sensitive = true;
                    continue;
                }
                "name" => {
                    modes.name = true;
                    continue;
                }
                "forward" => {
                    modes.forward = true;
                    continue;
                }
                _ => {
                    modes.pure = true;
                    continue;
                }
            };

            match kind {
                Some(existing) if existing != next => conflict = true,
                _ => kind = Some(next),
            }
        }

        if conflict {
            return Err(ValidationError::ModeConflict);
        }
        modes.kind = kind.ok_or(ValidationError::ModeMissing)?;
        Ok(modes)
    }
}

impl fmt::Display for MatchModes {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.kind.as_str())?;
        for (on, name) in [
            (self.case_sensitive, "case"),
            (self.name, "name"),
            (self.forward, "forward"),
            (self.pure, "pure"),
        ] {
            if on {
                write!(f, " {}", name)?;
            }
        }
        Ok(())
    }
}
