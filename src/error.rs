use thiserror::Error;

/// Crate-wide result type alias.
pub type Result<T> = std::result::Result<T, Error>;

/// Error type for the collision simulator.
///
/// Stale events are not errors; they are discarded silently by the simulation loop.
#[derive(Debug, Error)]
pub enum Error {
    /// Invalid user or API parameter (non-positive radius or mass, non-finite time, ...).
    #[error("invalid parameter: {0}")]
    InvalidParam(String),

    /// Malformed textual particle record.
    #[error("parse error on line {line}: {reason}")]
    Parse { line: usize, reason: String },

    /// Dequeue on an empty event schedule. Indicates a logic error in the caller.
    #[error("event schedule is empty")]
    EmptySchedule,

    /// Scenario configuration could not be decoded.
    #[error("config error: {0}")]
    Config(String),

    /// Propagated I/O errors from the particle loader.
    #[error(transparent)]
    Io(#[from] std::io::Error),
}

impl From<serde_yaml::Error> for Error {
    fn from(e: serde_yaml::Error) -> Self {
        Error::Config(e.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn error_display_is_informative() {
        let e = Error::InvalidParam("radius must be > 0".to_string());
        let msg = format!("{e}");
        assert!(msg.contains("invalid parameter"));
        assert!(msg.contains("radius"));
    }

    #[test]
    fn parse_error_names_line() {
        let e = Error::Parse {
            line: 3,
            reason: "expected 9 fields, found 4".into(),
        };
        let msg = e.to_string();
        assert!(msg.contains("line 3"));
        assert!(msg.contains("9 fields"));
    }

    #[test]
    fn yaml_errors_become_config_errors() {
        let bad: std::result::Result<f64, _> = serde_yaml::from_str("[1, 2");
        let e: Error = bad.unwrap_err().into();
        assert!(matches!(e, Error::Config(_)));
    }
}
