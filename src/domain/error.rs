//! Domain error types.

use chrono::NaiveDate;

/// Top-level error type for sigfusion.
#[derive(Debug, thiserror::Error)]
pub enum SignalError {
    #[error("config parse error in {file}: {reason}")]
    ConfigParse { file: String, reason: String },

    #[error("missing config key [{section}] {key}")]
    ConfigMissing { section: String, key: String },

    #[error("invalid config value [{section}] {key}: {reason}")]
    ConfigInvalid {
        section: String,
        key: String,
        reason: String,
    },

    #[error("unknown strategy: {name}")]
    UnknownStrategy { name: String },

    #[error("composite strategy has no enabled signals")]
    EmptySignalSet,

    #[error("data supply error: {reason}")]
    DataSupply { reason: String },

    #[error("invalid bar sequence at {date}: {reason}")]
    InvalidBars { date: NaiveDate, reason: String },

    #[error("decision log error: {reason}")]
    DecisionLog { reason: String },

    #[error("no data for {code}")]
    NoData { code: String },

    #[error("insufficient data for {code}: have {bars} bars, need {minimum}")]
    InsufficientData {
        code: String,
        bars: usize,
        minimum: usize,
    },

    #[error(transparent)]
    Io(#[from] std::io::Error),
}

impl SignalError {
    pub(crate) fn invalid(section: &str, key: &str, reason: impl Into<String>) -> Self {
        SignalError::ConfigInvalid {
            section: section.to_string(),
            key: key.to_string(),
            reason: reason.into(),
        }
    }

    /// True for errors raised while building a run, before any bar is processed.
    pub fn is_configuration(&self) -> bool {
        matches!(
            self,
            SignalError::ConfigParse { .. }
                | SignalError::ConfigMissing { .. }
                | SignalError::ConfigInvalid { .. }
                | SignalError::UnknownStrategy { .. }
                | SignalError::EmptySignalSet
        )
    }
}

impl From<&SignalError> for std::process::ExitCode {
    fn from(err: &SignalError) -> Self {
        let code: u8 = match err {
            SignalError::Io(_) => 1,
            SignalError::ConfigParse { .. }
            | SignalError::ConfigMissing { .. }
            | SignalError::ConfigInvalid { .. }
            | SignalError::UnknownStrategy { .. }
            | SignalError::EmptySignalSet => 2,
            SignalError::DataSupply { .. } | SignalError::InvalidBars { .. } => 3,
            SignalError::DecisionLog { .. } => 4,
            SignalError::NoData { .. } | SignalError::InsufficientData { .. } => 5,
        };
        std::process::ExitCode::from(code)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn config_invalid_message() {
        let err = SignalError::invalid("rsi", "period", "period must be at least 1");
        assert_eq!(
            err.to_string(),
            "invalid config value [rsi] period: period must be at least 1"
        );
    }

    #[test]
    fn configuration_errors_are_classified() {
        assert!(SignalError::EmptySignalSet.is_configuration());
        assert!(SignalError::UnknownStrategy { name: "x".into() }.is_configuration());
        assert!(!SignalError::NoData { code: "BHP".into() }.is_configuration());
        assert!(!SignalError::DecisionLog { reason: "x".into() }.is_configuration());
    }

    #[test]
    fn insufficient_data_message() {
        let err = SignalError::InsufficientData {
            code: "600487".into(),
            bars: 10,
            minimum: 34,
        };
        assert_eq!(
            err.to_string(),
            "insufficient data for 600487: have 10 bars, need 34"
        );
    }
}
