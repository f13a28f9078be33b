//! Settings for the two conversion entry points.

use serde::Deserialize;
use spectree_core::{DatasetOptions, FileMode, LinkKind};

use crate::error::ConvertError;

/// Settings for [`crate::write_spec_to_tree`].
///
/// ```rust
/// use spectree_convert::WriteOptions;
/// use spectree_core::{DatasetOptions, LinkKind};
///
/// let options = WriteOptions::default()
///     .h5path("/entry")
///     .overwrite(true)
///     .link_type("soft")
///     .unwrap()
///     .dataset_options(DatasetOptions::new().with("compression", "gzip"));
/// assert_eq!(options.link_kind, LinkKind::Soft);
/// ```
#[derive(Clone, Debug, PartialEq, Deserialize)]
#[serde(default)]
pub struct WriteOptions {
    /// Group under which scans are written.
    pub h5path: String,
    /// How a target given as a path is opened. Ignored for open containers.
    pub file_mode: FileMode,
    /// Replace existing datasets and links instead of skipping them.
    pub overwrite: bool,
    pub link_kind: LinkKind,
    /// Applied to every non-scalar dataset.
    pub dataset_options: DatasetOptions,
}

impl Default for WriteOptions {
    fn default() -> Self {
        WriteOptions {
            h5path: "/".to_string(),
            file_mode: FileMode::Append,
            overwrite: false,
            link_kind: LinkKind::Hard,
            dataset_options: DatasetOptions::new(),
        }
    }
}

impl WriteOptions {
    #[must_use]
    pub fn h5path(mut self, h5path: impl Into<String>) -> Self {
        self.h5path = h5path.into();
        self
    }

    #[must_use]
    pub fn file_mode(mut self, file_mode: FileMode) -> Self {
        self.file_mode = file_mode;
        self
    }

    #[must_use]
    pub fn overwrite(mut self, overwrite: bool) -> Self {
        self.overwrite = overwrite;
        self
    }

    #[must_use]
    pub fn link_kind(mut self, link_kind: LinkKind) -> Self {
        self.link_kind = link_kind;
        self
    }

    /// Set the link kind from its name, `"hard"` or `"soft"`.
    pub fn link_type(self, name: &str) -> Result<Self, ConvertError> {
        Ok(self.link_kind(name.parse()?))
    }

    #[must_use]
    pub fn dataset_options(mut self, dataset_options: DatasetOptions) -> Self {
        self.dataset_options = dataset_options;
        self
    }
}

/// Settings for [`crate::convert`], which always writes into a new file.
#[derive(Clone, Debug, PartialEq, Deserialize)]
#[serde(default)]
pub struct ConvertOptions {
    /// Must be `w` or `w-`.
    pub file_mode: FileMode,
    pub link_kind: LinkKind,
    pub dataset_options: DatasetOptions,
}

impl Default for ConvertOptions {
    fn default() -> Self {
        ConvertOptions {
            file_mode: FileMode::Exclusive,
            link_kind: LinkKind::Hard,
            dataset_options: DatasetOptions::new(),
        }
    }
}

impl ConvertOptions {
    #[must_use]
    pub fn file_mode(mut self, file_mode: FileMode) -> Self {
        self.file_mode = file_mode;
        self
    }

    #[must_use]
    pub fn link_kind(mut self, link_kind: LinkKind) -> Self {
        self.link_kind = link_kind;
        self
    }

    /// Set the link kind from its name, `"hard"` or `"soft"`.
    pub fn link_type(self, name: &str) -> Result<Self, ConvertError> {
        Ok(self.link_kind(name.parse()?))
    }

    #[must_use]
    pub fn dataset_options(mut self, dataset_options: DatasetOptions) -> Self {
        self.dataset_options = dataset_options;
        self
    }
}
