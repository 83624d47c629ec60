//! Error types for GPU setup and rendering.

use thiserror::Error;

/// Errors raised while creating or using GPU resources.
#[derive(Error, Debug)]
pub enum RenderError {
    /// A shader stage failed to compile; `log` is the compiler output.
    #[error("{stage} shader compilation failed: {log}")]
    ShaderCompile { stage: &'static str, log: String },

    /// The program failed to link; carries the linker output.
    #[error("shader program link failed: {0}")]
    ShaderLink(String),

    /// The driver refused a buffer, vertex array or program handle.
    #[error("GPU allocation failed: {0}")]
    Allocation(String),

    /// A draw or upload was attempted before `init`.
    #[error("renderer is not initialized")]
    NotInitialized,

    /// A configuration document could not be parsed.
    #[error("invalid configuration: {0}")]
    Config(#[from] serde_json::Error),
}

pub type Result<T> = std::result::Result<T, RenderError>;
