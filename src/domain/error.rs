//! Domain error types.

/// Top-level error type for policysim.
#[derive(Debug, thiserror::Error)]
pub enum PolicysimError {
    #[error("invalid input: {reason}")]
    InvalidInput { reason: String },

    #[error("unknown policy '{name}'")]
    UnknownPolicy { name: String },

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

    #[error("data error: {reason}")]
    Data { reason: String },

    #[error("no price data for {ticker} between {start} and {end}")]
    NoData {
        ticker: String,
        start: String,
        end: String,
    },

    #[error("report error: {reason}")]
    Report { reason: String },

    #[error(transparent)]
    Io(#[from] std::io::Error),
}

impl PolicysimError {
    pub fn invalid_input(reason: impl Into<String>) -> Self {
        PolicysimError::InvalidInput {
            reason: reason.into(),
        }
    }
}

impl From<&PolicysimError> for std::process::ExitCode {
    fn from(err: &PolicysimError) -> Self {
        let code: u8 = match err {
            PolicysimError::Io(_) | PolicysimError::Report { .. } => 1,
            PolicysimError::ConfigParse { .. }
            | PolicysimError::ConfigMissing { .. }
            | PolicysimError::ConfigInvalid { .. } => 2,
            PolicysimError::Data { .. } | PolicysimError::NoData { .. } => 3,
            PolicysimError::UnknownPolicy { .. } => 4,
            PolicysimError::InvalidInput { .. } => 5,
        };
        std::process::ExitCode::from(code)
    }
}
