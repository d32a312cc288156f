use serde::{Deserialize, Serialize};
use std::fmt;

/// Outcome code shared by every command result.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Status {
    #[serde(rename = "OK")]
    Okay,
    #[serde(rename = "CREATED")]
    Created,
    #[serde(rename = "INVALID_PARAMS")]
    Invalid,
    #[serde(rename = "NOT_FOUND")]
    NotFound,
    #[serde(rename = "CONFLICT")]
    Conflict,
    #[serde(rename = "INTERNAL_ERROR")]
    InternalError,
}

impl Status {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Okay => "OK",
            Self::Created => "CREATED",
            Self::Invalid => "INVALID_PARAMS",
            Self::NotFound => "NOT_FOUND",
            Self::Conflict => "CONFLICT",
            Self::InternalError => "INTERNAL_ERROR",
        }
    }

    pub fn is_success(&self) -> bool {
        matches!(self, Self::Okay | Self::Created)
    }
}

impl fmt::Display for Status {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
