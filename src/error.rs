//! Error type shared by the blitter and the GPU backend

pub type BlitResult<T> = Result<T, BlitError>;

#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum BlitError {
    /// A precondition on a caller-supplied argument was violated.
    /// Always raised before any render pass is recorded.
    #[error("invalid argument: {0}")]
    InvalidArgument(String),

    /// Preprocessing, parsing, validation or linking of a shader failed
    #[error("shader compilation failed: {0}")]
    Compilation(String),

    #[error("pipeline creation failed: {0}")]
    PipelineCreation(String),

    /// Any other failure reported by the device layer
    #[error("device error: {0}")]
    Device(String),
}

impl BlitError {
    pub fn invalid_argument(msg: impl Into<String>) -> Self {
        Self::InvalidArgument(msg.into())
    }

    pub fn compilation(msg: impl Into<String>) -> Self {
        Self::Compilation(msg.into())
    }

    pub fn pipeline_creation(msg: impl Into<String>) -> Self {
        Self::PipelineCreation(msg.into())
    }

    pub fn device(msg: impl Into<String>) -> Self {
        Self::Device(msg.into())
    }
}
