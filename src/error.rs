use std::fmt;
use thiserror::Error;

/// A problem with a single configuration entry. None of these abort loading;
/// the offending entry is skipped.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub(crate) enum ConfigError {
    #[error("{category} limit of {max} exceeded")]
    CapacityExceeded { category: Category, max: usize },

    #[error("Invalid shortcut: {0:?}")]
    InvalidShortcut(String),

    #[error("Too many modifiers in {spec:?} (at most {max})")]
    TooManyModifiers { spec: String, max: usize },

    #[error("Invalid switch identifier: {0:?} (expected CODE:VALUE)")]
    InvalidSwitch(String),

    #[error("Invalid idle timeout: {0:?}")]
    InvalidIdle(String),

    #[error("Duplicate {category} binding {spec:?}")]
    Duplicate { category: Category, spec: String },

    #[error("Expected a command string for {0:?}")]
    InvalidCommand(String),

    #[error("Expected a list of device paths, got {0}")]
    InvalidListen(String),

    #[error("Invalid tick: {0:?}")]
    InvalidTick(String),

    #[error("Unknown section [{0}]")]
    UnknownSection(String),

    #[error("Unknown option {0:?}")]
    UnknownOption(String),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Category {
    Key,
    Switch,
    Idle,
    Listener,
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Category::Key => "key event",
            Category::Switch => "switch event",
            Category::Idle => "idle event",
            Category::Listener => "listener",
        })
    }
}

/// A [`ConfigError`] with the line it came from, when known.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct LoadIssue {
    pub line: Option<usize>,
    pub error: ConfigError,
}

#[derive(Debug, Error)]
pub(crate) enum SpawnError {
    #[error("Failed to run {command:?}: {source}")]
    Spawn {
        command: String,
        #[source]
        source: std::io::Error,
    },
}
