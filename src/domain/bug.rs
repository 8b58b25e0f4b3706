//! Bug lifecycle primitives.
//!
//! Status is an explicit state with a fixed transition table rather than a
//! free-form field, so "close" and "reopen" are checked moves.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum BugStatus {
    #[default]
    Open,
    InProgress,
    Closed,
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TransitionError {
    #[error("Bug is already {0}")]
    Unchanged(BugStatus),

    #[error("Cannot move a bug from {from} to {to}")]
    NotAllowed { from: BugStatus, to: BugStatus },
}

impl BugStatus {
    pub const ALL: [Self; 3] = [Self::Open, Self::InProgress, Self::Closed];

    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Open => "open",
            Self::InProgress => "inProgress",
            Self::Closed => "closed",
        }
    }

    /// States reachable in a single move from this one.
    #[must_use]
    pub const fn next_states(&self) -> &'static [Self] {
        match self {
            Self::Open => &[Self::InProgress, Self::Closed],
            Self::InProgress => &[Self::Open, Self::Closed],
            Self::Closed => &[Self::Open],
        }
    }

    pub fn transition_to(self, to: Self) -> Result<Self, TransitionError> {
        if self == to {
            return Err(TransitionError::Unchanged(self));
        }
        if self.next_states().contains(&to) {
            Ok(to)
        } else {
            Err(TransitionError::NotAllowed { from: self, to })
        }
    }
}

impl fmt::Display for BugStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for BugStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|status| status.as_str() == s)
            .ok_or_else(|| format!("Unknown bug status: {s}"))
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum BugClassification {
    #[default]
    Unclassified,
    Approved,
    Unapproved,
    Duplicate,
}

impl BugClassification {
    pub const ALL: [Self; 4] = [
        Self::Unclassified,
        Self::Approved,
        Self::Unapproved,
        Self::Duplicate,
    ];

    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Unclassified => "unclassified",
            Self::Approved => "approved",
            Self::Unapproved => "unapproved",
            Self::Duplicate => "duplicate",
        }
    }
}

impl fmt::Display for BugClassification {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for BugClassification {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|classification| classification.as_str() == s)
            .ok_or_else(|| format!("Unknown bug classification: {s}"))
    }
}
