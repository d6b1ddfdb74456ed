//! Worker lifecycle states, control messages and step reports.

use std::fmt;
use std::str::FromStr;
use url::Url;

/// Lifecycle of one worker version.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WorkerState {
    Parsed,
    Installing,
    Installed,
    Activating,
    Activated,
    /// Replaced by a newer version or discarded while waiting.
    Redundant,
}

impl WorkerState {
    pub fn as_str(self) -> &'static str {
        match self {
            WorkerState::Parsed => "parsed",
            WorkerState::Installing => "installing",
            WorkerState::Installed => "installed",
            WorkerState::Activating => "activating",
            WorkerState::Activated => "activated",
            WorkerState::Redundant => "redundant",
        }
    }
}

impl fmt::Display for WorkerState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Messages a page can post to the worker.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WorkerMessage {
    /// Activate now instead of waiting for every controlled page to close.
    SkipWaiting,
}

impl FromStr for WorkerMessage {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim() {
            "SKIP_WAITING" => Ok(WorkerMessage::SkipWaiting),
            other => Err(format!("unknown worker message: {other}")),
        }
    }
}

/// Outcome of the install step.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct InstallReport {
    /// Shell addresses stored in the shell bucket.
    pub precached: Vec<Url>,
    /// Shell addresses that could not be fetched (network error or non-2xx).
    pub failed: Vec<Url>,
}

/// Outcome of the activation sweep.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ActivationReport {
    /// Stale buckets of this family that were removed.
    pub deleted: Vec<String>,
    /// Buckets left in place: the current version's and foreign ones.
    pub kept: Vec<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn message_parsing() {
        assert_eq!("SKIP_WAITING".parse::<WorkerMessage>(), Ok(WorkerMessage::SkipWaiting));
        assert_eq!(" SKIP_WAITING\n".parse::<WorkerMessage>(), Ok(WorkerMessage::SkipWaiting));
        assert!("skip".parse::<WorkerMessage>().is_err());
    }

    #[test]
    fn state_names() {
        assert_eq!(WorkerState::Activated.to_string(), "activated");
        assert_eq!(WorkerState::Redundant.as_str(), "redundant");
    }
}
