//! Settings that shape how members are written: link kinds, file modes and
//! dataset creation options.

use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::Error;

/// How a derived alias is bound to its target.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LinkKind {
    /// Bind to the target object's identity.
    #[default]
    Hard,
    /// Bind to the target's absolute path, resolved on every access.
    Soft,
}

impl FromStr for LinkKind {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "hard" => Ok(LinkKind::Hard),
            "soft" => Ok(LinkKind::Soft),
            other => Err(Error::config(format!(
                "link type must be 'hard' or 'soft', got '{}'",
                other
            ))),
        }
    }
}

impl fmt::Display for LinkKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            LinkKind::Hard => f.write_str("hard"),
            LinkKind::Soft => f.write_str("soft"),
        }
    }
}

/// How a backing file is opened.
///
/// Parsed from the conventional short forms: `r+`, `w`, `w-` (or `x`), `a`.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub enum FileMode {
    /// `r+`: read/write, the file must exist.
    ReadWrite,
    /// `w`: create, truncating any existing file.
    Truncate,
    /// `w-`: create, fail if the file exists.
    Exclusive,
    /// `a`: read/write if the file exists, create it otherwise.
    #[default]
    Append,
}

impl FileMode {
    /// Modes that always start from an empty tree.
    pub fn creates_new(&self) -> bool {
        matches!(self, FileMode::Truncate | FileMode::Exclusive)
    }
}

impl FromStr for FileMode {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "r+" => Ok(FileMode::ReadWrite),
            "w" => Ok(FileMode::Truncate),
            "w-" | "x" => Ok(FileMode::Exclusive),
            "a" => Ok(FileMode::Append),
            other => Err(Error::config(format!(
                "file mode must be one of 'r+', 'w', 'w-', 'x' or 'a', got '{}'",
                other
            ))),
        }
    }
}

impl TryFrom<String> for FileMode {
    type Error = Error;

    fn try_from(s: String) -> Result<Self, Self::Error> {
        s.parse()
    }
}

impl From<FileMode> for String {
    fn from(mode: FileMode) -> Self {
        mode.to_string()
    }
}

impl fmt::Display for FileMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            FileMode::ReadWrite => "r+",
            FileMode::Truncate => "w",
            FileMode::Exclusive => "w-",
            FileMode::Append => "a",
        };
        f.write_str(s)
    }
}

/// Opaque creation options for non-scalar datasets (filters, chunking, ...).
///
/// Options are passed through untouched to the container; their meaning is
/// the container's business.
///
/// ```rust
/// use spectree_core::DatasetOptions;
///
/// let options = DatasetOptions::new()
///     .with("compression", "gzip")
///     .with("compression_opts", 4);
/// assert_eq!(options.len(), 2);
/// ```
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct DatasetOptions(BTreeMap<String, serde_json::Value>);

impl DatasetOptions {
    pub fn new() -> Self {
        Self::default()
    }

    /// Builder-style insert.
    #[must_use]
    pub fn with(mut self, key: impl Into<String>, value: impl Into<serde_json::Value>) -> Self {
        self.insert(key, value);
        self
    }

    pub fn insert(&mut self, key: impl Into<String>, value: impl Into<serde_json::Value>) {
        self.0.insert(key.into(), value.into());
    }

    pub fn get(&self, key: &str) -> Option<&serde_json::Value> {
        self.0.get(key)
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&String, &serde_json::Value)> {
        self.0.iter()
    }
}

impl FromIterator<(String, serde_json::Value)> for DatasetOptions {
    fn from_iter<I: IntoIterator<Item = (String, serde_json::Value)>>(iter: I) -> Self {
        DatasetOptions(iter.into_iter().collect())
    }
}
