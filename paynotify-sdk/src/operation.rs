use serde::{Deserialize, Serialize};
use std::str::FromStr;

use crate::error::NotificationError;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
/// Payment lifecycle event reported by a callback notification.
#[serde(rename_all = "camelCase")]
pub enum Operation {
    /// Funds were put on hold.
    Approved,
    /// The order expired before payment completed.
    DeclinedByTimeout,
    /// Held funds were captured.
    Deposited,
    /// The hold was cancelled.
    Reversed,
    /// Captured funds were returned.
    Refunded,
}

impl Operation {
    pub const ALL: [Operation; 5] = [
        Operation::Approved,
        Operation::DeclinedByTimeout,
        Operation::Deposited,
        Operation::Reversed,
        Operation::Refunded,
    ];

    /// Wire spelling, as sent in the `operation` field.
    pub fn as_str(&self) -> &'static str {
        match self {
            Operation::Approved => "approved",
            Operation::DeclinedByTimeout => "declinedByTimeout",
            Operation::Deposited => "deposited",
            Operation::Reversed => "reversed",
            Operation::Refunded => "refunded",
        }
    }
}

impl std::fmt::Display for Operation {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Operation {
    type Err = NotificationError;

    /// Exact, case-sensitive match against the wire spelling.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Operation::ALL
            .into_iter()
            .find(|op| op.as_str() == s)
            .ok_or_else(|| NotificationError::UnknownOperation(s.to_owned()))
    }
}
