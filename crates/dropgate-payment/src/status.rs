//! Accepted payment statuses
//!
//! Providers report invoice progress as free-form strings ("waiting",
//! "confirming", "confirmed", "finished", ...). Which of these count as
//! settled is deployment policy, so it is carried as a configurable set.

use std::collections::HashSet;

/// The set of provider statuses treated as "payment settled".
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AcceptedStatuses {
    statuses: HashSet<String>,
}

impl AcceptedStatuses {
    /// Build from an explicit list; entries are matched case-insensitively
    pub fn new<I, S>(statuses: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        Self {
            statuses: statuses
                .into_iter()
                .map(|s| s.as_ref().to_lowercase())
                .collect(),
        }
    }

    /// Does `status` authorize releasing the purchase?
    pub fn is_authorized(&self, status: &str) -> bool {
        self.statuses.contains(&status.to_lowercase())
    }
}

impl Default for AcceptedStatuses {
    /// The statuses the reference provider uses for a settled invoice
    fn default() -> Self {
        Self::new(["confirmed", "finished", "paid"])
    }
}
