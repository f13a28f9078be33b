use spectree_core::{Error as TreeError, PathError};
use spectree_specfile::SpecFileError;

#[derive(thiserror::Error, Debug)]
pub enum ConvertError {
    /// Rejected settings. Raised before anything is opened or written.
    #[error("configuration error: {message}")]
    Config { message: String },

    #[error(transparent)]
    Tree(TreeError),

    #[error(transparent)]
    SpecFile(#[from] SpecFileError),
}

impl ConvertError {
    pub(crate) fn config(message: impl Into<String>) -> Self {
        ConvertError::Config {
            message: message.into(),
        }
    }

    pub fn is_config(&self) -> bool {
        matches!(self, ConvertError::Config { .. })
    }
}

impl From<TreeError> for ConvertError {
    fn from(error: TreeError) -> Self {
        match error {
            TreeError::Config { message } => ConvertError::Config { message },
            other => ConvertError::Tree(other),
        }
    }
}

impl From<PathError> for ConvertError {
    fn from(error: PathError) -> Self {
        ConvertError::Tree(TreeError::Path(error))
    }
}
