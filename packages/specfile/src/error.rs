use std::io;
use std::path::PathBuf;

use spectree_core::{Error as TreeError, PathError};

#[derive(thiserror::Error, Debug)]
pub enum SpecFileError {
    #[error("cannot read {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    /// The text does not follow the SPEC format.
    #[error("line {line}: {message}")]
    Parse { line: usize, message: String },

    #[error("{0}")]
    Tree(#[from] TreeError),
}

impl SpecFileError {
    pub(crate) fn parse(line: usize, message: impl Into<String>) -> Self {
        SpecFileError::Parse {
            line,
            message: message.into(),
        }
    }
}

impl From<PathError> for SpecFileError {
    fn from(error: PathError) -> Self {
        SpecFileError::Tree(TreeError::Path(error))
    }
}
