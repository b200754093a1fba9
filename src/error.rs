//! Error taxonomy shared by the mesh, volume and modal pipeline

use std::path::PathBuf;
use thiserror::Error;

/// Errors surfaced by pipeline operations
///
/// Every variant leaves the caller's previous state intact: operations build
/// their result privately and only hand it back on success.
#[derive(Debug, Error)]
pub enum ModalError {
    #[error("failed to access {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("unsupported format: {0}")]
    UnsupportedFormat(String),

    #[error("parse error on line {line}: {message}")]
    Parse { line: usize, message: String },

    #[error("tetrahedralization failed: {0}")]
    TetrahedralizationFailed(String),

    #[error("volumetric mesh is empty or has near-zero volume")]
    EmptyVolume,

    #[error("no usable modes: requested {requested}, solver produced {available}")]
    InsufficientModes { requested: usize, available: usize },

    #[error("eigen-solve failed: {0}")]
    EigenSolveFailed(String),

    #[error("invalid parameters: {0}")]
    InvalidParameters(String),

    #[error("synthesis runtime unavailable: {0}")]
    DeviceOrRuntimeUnavailable(String),

    #[error("background task failed: {0}")]
    TaskFailed(String),

    #[error("background task is already running")]
    TaskBusy,

    #[error("operation cancelled")]
    Cancelled,

    #[error("configuration error: {0}")]
    Config(String),
}

impl ModalError {
    pub fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }

    pub fn parse(line: usize, message: impl Into<String>) -> Self {
        Self::Parse {
            line,
            message: message.into(),
        }
    }
}

pub type Result<T> = std::result::Result<T, ModalError>;
