//! Inline-button markup embedded in reply templates.
//!
//! Trailing lines made only of `[label](url)` items become button rows:
//!
//! ```text
//! Please read the rules first.
//! [Rules](https://example.org/rules) [FAQ](https://example.org/faq)
//! [Support](tg://resolve?domain=support)
//! ```

use crate::error::ValidationError;
use regex::Regex;
use std::sync::OnceLock;

/// URL schemes a button may point to.
const ALLOWED_SCHEMES: [&str; 3] = ["https://", "http://", "tg://"];

/// One inline URL button.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Button {
    pub label: String,
    pub url: String,
}

/// Reply text split from its button rows.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Notice {
    pub text: String,
    pub buttons: Vec<Vec<Button>>,
}

impl Notice {
    pub fn text(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            buttons: Vec::new(),
        }
    }

    pub fn button_count(&self) -> usize {
        self.buttons.iter().map(Vec::len).sum()
    }
}

fn item_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"\[([^\[\]\n]+)\]\(([^()\s]+)\)").expect("static regex"))
}

fn line_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r"^\s*(\[[^\[\]\n]+\]\([^()\s]+\)\s*)+$").expect("static regex")
    })
}

/// Whether a line is meant as a button row, well-formed or not.
fn looks_like_buttons(line: &str) -> bool {
    let trimmed = line.trim_start();
    trimmed.starts_with('[') && trimmed.contains("](")
}

fn parse_row(line: &str) -> Result<Vec<Button>, ValidationError> {
    if !line_regex().is_match(line) {
        return Err(ValidationError::MarkupInvalid(line.trim().to_string()));
    }

    item_regex()
        .captures_iter(line)
        .map(|caps| {
            let label = caps[1].trim().to_string();
            let url = caps[2].to_string();
            if label.is_empty() || !ALLOWED_SCHEMES.iter().any(|s| url.starts_with(s)) {
                return Err(ValidationError::MarkupInvalid(caps[0].to_string()));
            }
            Ok(Button { label, url })
        })
        .collect()
}

/// Split a reply template into text and button rows, enforcing the button cap.
pub fn parse_notice(reply: &str, max_buttons: usize) -> Result<Notice, ValidationError> {
    let lines: Vec<&str> = reply.lines().collect();

    let split = lines
        .iter()
        .rposition(|line| !line.trim().is_empty() && !looks_like_buttons(line))
        .map_or(0, |i| i + 1);

    let mut buttons = Vec::new();
    for line in &lines[split..] {
        if line.trim().is_empty() {
            continue;
        }
        buttons.push(parse_row(line)?);
    }

    let notice = Notice {
        text: lines[..split].join("\n"),
        buttons,
    };

    let count = notice.button_count();
    if count > max_buttons {
        return Err(ValidationError::ButtonOverflow {
            count,
            max: max_buttons,
        });
    }

    Ok(notice)
}
