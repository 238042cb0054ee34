/// Convenience result type used across maskpack.
pub type MaskpackResult<T> = Result<T, MaskpackError>;

/// Top-level error taxonomy used by maskpack APIs.
///
/// Degenerate geometry and pool exhaustion during shrink are steady-state inputs and never
/// surface here; only configuration/model validation and device failures do.
#[derive(thiserror::Error, Debug)]
pub enum MaskpackError {
    /// Invalid user-provided configuration or model data.
    #[error("validation error: {0}")]
    Validation(String),

    /// A surface operation failed at the graphics-device boundary.
    #[error("device error: {0}")]
    Device(String),

    /// Errors when serializing or deserializing configuration or model data.
    #[error("serialization error: {0}")]
    Serde(String),

    /// Wrapped lower-level error from dependencies or IO.
    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

impl MaskpackError {
    /// Build a [`MaskpackError::Validation`] value.
    pub fn validation(msg: impl Into<String>) -> Self {
        Self::Validation(msg.into())
    }

    /// Build a [`MaskpackError::Device`] value.
    pub fn device(msg: impl Into<String>) -> Self {
        Self::Device(msg.into())
    }

    /// Build a [`MaskpackError::Serde`] value.
    pub fn serde(msg: impl Into<String>) -> Self {
        Self::Serde(msg.into())
    }
}

#[cfg(test)]
#[path = "../../tests/unit/foundation/error.rs"]
mod tests;
