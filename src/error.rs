use thiserror::Error;

/// Startup configuration problems. Any of these stops the process before the
/// monitoring loop starts.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum ConfigError {
    #[error("each extra host requires an address and a name (got {count} values)")]
    UnpairedExtraHost { count: usize },

    #[error("extra host #{index} has an empty {field}")]
    EmptyField { index: usize, field: &'static str },

    #[error("{name} must be greater than zero")]
    Zero { name: &'static str },
}
