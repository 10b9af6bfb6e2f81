//! Logical line types carried by console fragments.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Kind of output a fragment belongs to.
///
/// The set is closed: every consumer (style table, sinks, CLI) matches on it
/// exhaustively.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum LineType {
    /// Standard output of the supervised server process.
    #[serde(rename = "stdout")]
    StdOut,
    /// Standard error of the supervised server process.
    #[serde(rename = "stderr")]
    StdErr,
    /// Console command issued by an admin (context carries the admin name).
    #[serde(rename = "admin")]
    AdminCmd,
    /// Command or marker generated by the panel itself.
    #[serde(rename = "system")]
    SystemCmd,
    /// Informational panel output, e.g. the boot banner.
    #[serde(rename = "info")]
    Info,
}

impl LineType {
    /// All line types, in declaration order.
    pub const ALL: [Self; 5] = [
        Self::StdOut,
        Self::StdErr,
        Self::AdminCmd,
        Self::SystemCmd,
        Self::Info,
    ];

    /// Stable lowercase identifier, matching the serde representation.
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::StdOut => "stdout",
            Self::StdErr => "stderr",
            Self::AdminCmd => "admin",
            Self::SystemCmd => "system",
            Self::Info => "info",
        }
    }
}

impl fmt::Display for LineType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Returned when a string does not name a known line type.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("unknown console line type: {0:?}")]
pub struct ParseLineTypeError(pub String);

impl FromStr for LineType {
    type Err = ParseLineTypeError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|t| t.as_str().eq_ignore_ascii_case(s.trim()))
            .ok_or_else(|| ParseLineTypeError(s.to_string()))
    }
}
