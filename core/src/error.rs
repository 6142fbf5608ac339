use thiserror::Error;

/// Failures raised while validating a request or resolving a channel.
///
/// A zero-range field is not an error: normalization maps it to all zeros
/// (see [`crate::utils::Normalization::Degenerate`]).
#[derive(Debug, Error)]
pub enum NoiseError {
    #[error("invalid parameter `{name}`: {reason}")]
    InvalidParameter { name: &'static str, reason: String },

    #[error("failed to parse generation request: {0}")]
    Config(#[from] toml::de::Error),

    #[error("failed to read generation request: {0}")]
    Io(#[from] std::io::Error),
}

impl NoiseError {
    pub(crate) fn invalid(name: &'static str, reason: impl Into<String>) -> Self {
        NoiseError::InvalidParameter {
            name,
            reason: reason.into(),
        }
    }
}

pub type Result<T> = std::result::Result<T, NoiseError>;
