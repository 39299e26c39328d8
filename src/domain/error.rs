//! Domain error types.

/// Top-level error type for tickwheel.
#[derive(Debug, thiserror::Error)]
pub enum TickwheelError {
    #[error("authentication failed: {reason}")]
    Auth { reason: String },

    #[error("feed error: {reason}")]
    Feed { reason: String },

    #[error("data fetch failed for {symbol}: {reason}")]
    DataFetch { symbol: String, reason: String },

    #[error("no historical data for {symbol}")]
    NoData { symbol: String },

    #[error("persistence error in {store} store: {reason}")]
    Persistence { store: String, reason: String },

    #[error("unknown strategy '{name}'")]
    UnknownStrategy { name: String },

    #[error("malformed tick for {symbol}: {reason}")]
    MalformedTick { symbol: String, reason: String },

    #[error("a {running} session is already active")]
    SessionActive { running: String },

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

    #[error(transparent)]
    Io(#[from] std::io::Error),
}

impl From<&TickwheelError> for std::process::ExitCode {
    fn from(err: &TickwheelError) -> Self {
        let code: u8 = match err {
            TickwheelError::Io(_) => 1,
            TickwheelError::ConfigParse { .. }
            | TickwheelError::ConfigMissing { .. }
            | TickwheelError::ConfigInvalid { .. } => 2,
            TickwheelError::Auth { .. } => 3,
            TickwheelError::DataFetch { .. } | TickwheelError::NoData { .. } => 4,
            TickwheelError::Persistence { .. } => 5,
            TickwheelError::UnknownStrategy { .. } => 6,
            TickwheelError::SessionActive { .. } => 7,
            TickwheelError::Feed { .. } | TickwheelError::MalformedTick { .. } => 8,
        };
        std::process::ExitCode::from(code)
    }
}
