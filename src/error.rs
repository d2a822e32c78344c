//! Error types shared by every analysis operation.

use std::fmt;

/// Result alias used across the crate.
pub type Result<T> = std::result::Result<T, TrajectoryError>;

/// Broad class of a [`TrajectoryError`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    /// The caller asked for something the configuration cannot express.
    Configuration,
    /// The request is valid but the log does not contain what it needs.
    Data,
    /// The rendering collaborator failed.
    Render,
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Configuration => write!(f, "configuration"),
            Self::Data => write!(f, "data"),
            Self::Render => write!(f, "render"),
        }
    }
}

/// Error type for trajectory operations.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum TrajectoryError {
    /// Normalization mode other than `full` or `node`.
    #[error("unknown normalization type: {0}")]
    UnknownNormalization(String),

    /// Reverse alignment target other than `pos` or `neg`.
    #[error("unknown reverse target: {0} (expected 'pos' or 'neg')")]
    UnknownReverseTarget(String),

    /// Session segmentation called with neither rule.
    #[error("must specify at least one of by_event or thresh")]
    MissingSessionRule,

    /// A role the operation needs is not mapped.
    #[error("role '{0}' is not set in the role config")]
    MissingRole(&'static str),

    /// A column name that is neither a role column nor present in the log.
    #[error("column '{0}' does not exist in the event log")]
    UnknownColumn(String),

    /// Reverse alignment found no trajectory ending in the target.
    #[error("there is no '{0}' event terminating any trajectory")]
    MissingTarget(String),

    /// Renderer failure, carried as text.
    #[error("renderer failed: {0}")]
    Render(String),
}

impl TrajectoryError {
    /// Classify the error.
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::UnknownNormalization(_)
            | Self::UnknownReverseTarget(_)
            | Self::MissingSessionRule
            | Self::MissingRole(_)
            | Self::UnknownColumn(_) => ErrorKind::Configuration,
            Self::MissingTarget(_) => ErrorKind::Data,
            Self::Render(_) => ErrorKind::Render,
        }
    }

    /// Create a render error from any error type.
    pub fn from_renderer<E: std::error::Error>(e: E) -> Self {
        Self::Render(e.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_kinds() {
        assert_eq!(
            TrajectoryError::UnknownNormalization("row".into()).kind(),
            ErrorKind::Configuration
        );
        assert_eq!(TrajectoryError::MissingSessionRule.kind(), ErrorKind::Configuration);
        assert_eq!(TrajectoryError::MissingTarget("buy".into()).kind(), ErrorKind::Data);
        assert_eq!(TrajectoryError::Render("boom".into()).kind(), ErrorKind::Render);
    }

    #[test]
    fn test_missing_target_names_event() {
        let err = TrajectoryError::MissingTarget("purchase".into());
        assert!(err.to_string().contains("purchase"));
    }
}
