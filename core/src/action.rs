//! The four canonical operations a request can represent.
//!
//! HTTP verbs and CLI tokens are two spellings of the same thing; both
//! resolve into [`Action`] before a request is constructed, so an
//! unresolvable operation never reaches a handler.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Transport-independent operation of a request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Action {
    Create,
    Read,
    Update,
    Delete,
}

/// Returned when a CLI token names no known action.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("invalid action")]
pub struct InvalidAction(pub String);

impl Action {
    /// Map an HTTP method token to an action.
    ///
    /// The mapping is fixed: GET→Read, POST→Create, PUT→Update,
    /// DELETE→Delete. Any other verb yields `None`.
    pub fn from_method(method: &str) -> Option<Self> {
        match method {
            "GET" => Some(Action::Read),
            "POST" => Some(Action::Create),
            "PUT" => Some(Action::Update),
            "DELETE" => Some(Action::Delete),
            _ => None,
        }
    }

    /// The HTTP method this action is spelled as on the wire.
    pub fn method(self) -> &'static str {
        match self {
            Action::Create => "POST",
            Action::Read => "GET",
            Action::Update => "PUT",
            Action::Delete => "DELETE",
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Action::Create => "CREATE",
            Action::Read => "READ",
            Action::Update => "UPDATE",
            Action::Delete => "DELETE",
        }
    }
}

/// Parses the leading token of a CLI command. Matching is case-sensitive.
impl FromStr for Action {
    type Err = InvalidAction;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "CREATE" => Ok(Action::Create),
            "READ" => Ok(Action::Read),
            "UPDATE" => Ok(Action::Update),
            "DELETE" => Ok(Action::Delete),
            other => Err(InvalidAction(other.to_string())),
        }
    }
}

impl fmt::Display for Action {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
