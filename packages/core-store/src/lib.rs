//! Core spectree: the shared vocabulary of the workspace.
//!
//! This layer defines what a hierarchical tree looks like, without saying
//! where it lives:
//! - `Path`: rooted, slash-separated member path
//! - `Dataset`: shaped, typed element buffer (empty shape = scalar)
//! - `SourceTree`: a tree that can be visited member by member
//! - `Container`: a tree that can be written member by member
//! - `LinkKind`, `FileMode`, `DatasetOptions`: write settings
//!
//! # Example
//!
//! ```rust
//! use spectree_core::{path, Container, Dataset, Error};
//!
//! fn write_title(container: &mut dyn Container) -> Result<(), Error> {
//!     container.create_dataset(&path!("/1.1/title"), &Dataset::from("ascan"), None)?;
//!     Ok(())
//! }
//! ```

mod dataset;
mod error;
mod options;
mod path;
mod traits;

pub use dataset::{DType, Data, Dataset, ObjectId};
pub use error::Error;
pub use options::{DatasetOptions, FileMode, LinkKind};
pub use path::{Path, PathError};
pub use traits::{Container, LinkTarget, SourceNode, SourceTree, Visitor};
