use std::fmt::{self, Debug, Display};
use std::io;

/// Provides `EpiError` and maps to other errors to
/// convert to an `EpiError`
#[derive(Debug)]
#[allow(clippy::module_name_repetitions)]
pub enum EpiError {
    IoError(io::Error),
    JsonError(serde_json::Error),
    CSVError(csv::Error),
    /// Parameters that cannot describe a runnable simulation. Raised before any state is built.
    ConfigurationError(String),
    ReportError(String),
    /// Internal bookkeeping went wrong, e.g. the compartment counts no longer add up to the
    /// population. Always a bug.
    InvariantViolation(String),
    EpiError(String),
}

impl From<io::Error> for EpiError {
    fn from(error: io::Error) -> Self {
        EpiError::IoError(error)
    }
}

impl From<serde_json::Error> for EpiError {
    fn from(error: serde_json::Error) -> Self {
        EpiError::JsonError(error)
    }
}

impl From<csv::Error> for EpiError {
    fn from(error: csv::Error) -> Self {
        EpiError::CSVError(error)
    }
}

impl From<String> for EpiError {
    fn from(error: String) -> Self {
        EpiError::EpiError(error)
    }
}

impl From<&str> for EpiError {
    fn from(error: &str) -> Self {
        EpiError::EpiError(error.to_string())
    }
}

impl std::error::Error for EpiError {}

impl Display for EpiError {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            EpiError::ConfigurationError(msg) => write!(f, "Configuration error: {msg}"),
            EpiError::InvariantViolation(msg) => write!(f, "Invariant violation: {msg}"),
            _ => write!(f, "Error: {self:?}"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn string_conversions() {
        let error: EpiError = "bad thing".into();
        assert!(matches!(error, EpiError::EpiError(ref msg) if msg == "bad thing"));

        let error: EpiError = String::from("worse thing").into();
        assert!(matches!(error, EpiError::EpiError(ref msg) if msg == "worse thing"));
    }

    #[test]
    fn display_configuration_error() {
        let error = EpiError::ConfigurationError("population must be at least 1".to_string());
        assert_eq!(
            error.to_string(),
            "Configuration error: population must be at least 1"
        );
    }

    #[test]
    fn io_error_conversion() {
        let error: EpiError = io::Error::new(io::ErrorKind::NotFound, "missing").into();
        assert!(matches!(error, EpiError::IoError(_)));
    }
}
