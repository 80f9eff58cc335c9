use litequeue_db::DbError;
use miette::Diagnostic;
use thiserror::Error;

/// Configuration-specific errors
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum ConfigError {
    #[error("IO error: {0}")]
    Io(String),

    #[error("TOML parse error: {0}")]
    TomlParse(String),

    #[error("Invalid value for field {field}: {reason}")]
    InvalidValue { field: String, reason: String },
}

#[derive(Error, Diagnostic, Debug)]
pub enum CoreError {
    #[error("Failed to open queue storage at {locator}")]
    #[diagnostic(
        code(litequeue_core::construction_failed),
        help("Check that the locator names a writable path, or use a memory: locator")
    )]
    Construction {
        locator: String,
        #[source]
        cause: DbError,
    },

    #[error("Queue storage operation `{operation}` failed")]
    #[diagnostic(
        code(litequeue_core::storage_operation_failed),
        help("The queue is still usable; retry the operation once storage recovers")
    )]
    Storage {
        operation: &'static str,
        #[source]
        cause: DbError,
    },

    #[error("Invalid queue configuration: {0}")]
    #[diagnostic(
        code(litequeue_core::configuration_error),
        help("Check the queue configuration file or builder values")
    )]
    Config(#[from] ConfigError),
}

impl CoreError {
    pub(crate) fn storage(operation: &'static str, cause: DbError) -> Self {
        Self::Storage { operation, cause }
    }

    pub(crate) fn invalid_config(field: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::Config(ConfigError::InvalidValue {
            field: field.into(),
            reason: reason.into(),
        })
    }

    /// Whether this error came from using the queue after it was closed.
    pub fn is_closed(&self) -> bool {
        match self {
            Self::Storage { cause, .. } => cause.is_closed(),
            _ => false,
        }
    }
}

pub type Result<T> = std::result::Result<T, CoreError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_config_error_renders_field() {
        let err = CoreError::invalid_config("idle_interval_ms", "must be greater than zero");
        let rendered = err.to_string();
        assert!(rendered.contains("idle_interval_ms"));
    }
}
