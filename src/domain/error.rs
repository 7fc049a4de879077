//! Domain error types.

/// Top-level error type for bandtrader.
#[derive(Debug, thiserror::Error)]
pub enum BotError {
    #[error("database error: {reason}")]
    Database { reason: String },

    #[error("database query error: {reason}")]
    DatabaseQuery { reason: String },

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

    #[error("no price data for {asset}: {reason}")]
    DataUnavailable { asset: String, reason: String },

    #[error("state file {path} is corrupt: {reason}")]
    StorageCorruption { path: String, reason: String },

    #[error("failed to persist state to {path}: {reason}")]
    StorageWrite { path: String, reason: String },

    #[error("{collaborator} failed: {reason}")]
    Upstream {
        collaborator: &'static str,
        reason: String,
    },

    #[error(transparent)]
    Io(#[from] std::io::Error),
}

impl BotError {
    pub fn ledger(reason: impl ToString) -> Self {
        BotError::Upstream {
            collaborator: "trade ledger",
            reason: reason.to_string(),
        }
    }

    pub fn alert(reason: impl ToString) -> Self {
        BotError::Upstream {
            collaborator: "alert",
            reason: reason.to_string(),
        }
    }
}

impl From<&BotError> for std::process::ExitCode {
    fn from(err: &BotError) -> Self {
        let code: u8 = match err {
            BotError::Io(_) => 1,
            BotError::ConfigParse { .. }
            | BotError::ConfigMissing { .. }
            | BotError::ConfigInvalid { .. } => 2,
            BotError::Database { .. } | BotError::DatabaseQuery { .. } => 3,
            BotError::StorageCorruption { .. } | BotError::StorageWrite { .. } => 4,
            BotError::DataUnavailable { .. } | BotError::Upstream { .. } => 5,
        };
        std::process::ExitCode::from(code)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn upstream_helpers_name_the_collaborator() {
        let err = BotError::ledger("disk full");
        assert_eq!(err.to_string(), "trade ledger failed: disk full");

        let err = BotError::alert("channel closed");
        assert_eq!(err.to_string(), "alert failed: channel closed");
    }

    #[test]
    fn config_invalid_message() {
        let err = BotError::ConfigInvalid {
            section: "strategy".into(),
            key: "fee_rate".into(),
            reason: "fee_rate must be in [0, 1)".into(),
        };
        assert_eq!(
            err.to_string(),
            "invalid config value [strategy] fee_rate: fee_rate must be in [0, 1)"
        );
    }
}
