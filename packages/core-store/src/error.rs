//! Error types shared by trees and containers.

use std::path::PathBuf;

use crate::dataset::ObjectId;
use crate::path::{Path, PathError};

/// Errors raised by sources, containers and configuration parsing.
#[derive(thiserror::Error, Debug)]
pub enum Error {
    /// A caller-supplied setting is not recognized.
    #[error("configuration error: {message}")]
    Config { message: String },

    #[error("path error: {0}")]
    Path(#[from] PathError),

    /// No member exists at the path.
    #[error("no such member: {path}")]
    NotFound { path: Path },

    /// A member already exists at the path.
    #[error("member already exists: {path}")]
    AlreadyExists { path: Path },

    /// The path crosses a member that is not a group.
    #[error("not a group: {path}")]
    NotAGroup { path: Path },

    /// Soft link resolution did not terminate.
    #[error("too many levels of soft links while resolving {path}")]
    LinkLoop { path: Path },

    /// A hard link was requested to an object the container does not hold.
    #[error("unknown object id {id}")]
    UnknownObject { id: ObjectId },

    /// The dataset shape and element count disagree.
    #[error("invalid dataset: {message}")]
    InvalidDataset { message: String },

    /// The backing file must exist for the requested mode.
    #[error("file not found: {}", path.display())]
    FileNotFound { path: PathBuf },

    /// The backing file must not exist for the requested mode.
    #[error("file already exists: {}", path.display())]
    FileExists { path: PathBuf },

    /// The storage library rejected an operation on the file.
    #[error("storage error in {}: {message}", file.display())]
    Storage { file: PathBuf, message: String },
}

impl Error {
    /// Build a configuration error.
    pub fn config(message: impl Into<String>) -> Self {
        Error::Config {
            message: message.into(),
        }
    }

    /// Wrap a storage library failure on `file`.
    pub fn storage(file: impl Into<PathBuf>, message: impl ToString) -> Self {
        Error::Storage {
            file: file.into(),
            message: message.to_string(),
        }
    }

    /// Whether this is a configuration error.
    pub fn is_config(&self) -> bool {
        matches!(self, Error::Config { .. })
    }
}
