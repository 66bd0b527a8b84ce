/// Convenience result type used across Imago.
pub type ImagoResult<T> = Result<T, ImagoError>;

/// Top-level error taxonomy used by engine APIs.
///
/// Per-layer shader failures never escape a frame draw as an `Err`;
/// they are logged and the affected layer is skipped. `Shader` values
/// only surface from the lower-level compile/link APIs.
#[derive(thiserror::Error, Debug)]
pub enum ImagoError {
    /// Invalid caller-provided data (dimensions, buffer sizes, stage kinds).
    #[error("validation error: {0}")]
    Validation(String),

    /// Shader compilation or program linking failed.
    #[error("shader error: {0}")]
    Shader(String),

    /// The graphics backend rejected an operation. The engine assumes a
    /// functioning context, so these are not retried.
    #[error("gpu error: {0}")]
    Gpu(String),

    /// Wrapped lower-level error from dependencies or IO.
    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

impl ImagoError {
    /// Build an [`ImagoError::Validation`] value.
    pub fn validation(msg: impl Into<String>) -> Self {
        Self::Validation(msg.into())
    }

    /// Build an [`ImagoError::Shader`] value.
    pub fn shader(msg: impl Into<String>) -> Self {
        Self::Shader(msg.into())
    }

    /// Build an [`ImagoError::Gpu`] value.
    pub fn gpu(msg: impl Into<String>) -> Self {
        Self::Gpu(msg.into())
    }
}
