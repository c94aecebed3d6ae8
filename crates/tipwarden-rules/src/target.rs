//! Rule targets and author roles.

use crate::error::ValidationError;
use std::fmt;

/// Role of a message author within its group.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "lowercase"))]
pub enum Role {
    Member,
    Admin,
}

/// Which authors a rule applies to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "lowercase"))]
pub enum Target {
    Member,
    Admin,
    #[default]
    All,
}

impl Target {
    pub const DEFAULT_SEGMENT: &'static str = "all";

    pub fn parse(segment: &str) -> Result<Self, ValidationError> {
        match segment.trim() {
            "member" => Ok(Target::Member),
            "admin" => Ok(Target::Admin),
            "all" => Ok(Target::All),
            other => Err(ValidationError::TargetInvalid(other.to_string())),
        }
    }

    pub fn admits(&self, role: Role) -> bool {
        match self {
            Target::All => true,
            Target::Member => role == Role::Member,
            Target::Admin => role == Role::Admin,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Target::Member => "member",
            Target::Admin => "admin",
            Target::All => "all",
        }
    }
}

impl fmt::Display for Target {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
