//! # spectree-specfile
//!
//! Reader for SPEC data files, the line-oriented ASCII format written by the
//! SPEC diffractometer control software.
//!
//! [`SpecFile::parse`] reads the scans; [`SpecFile::to_tree`] lays them out as
//! a [`spectree_store::TreeFile`] with one group per scan, keyed
//! `<number>.<order>`, including the `measurement/mca_<i>/data` and
//! `measurement/mca_<i>/info` hard links.
//!
//! ```rust
//! use spectree_core::{path, Dataset};
//! use spectree_specfile::SpecFile;
//!
//! let spec = SpecFile::parse("#S 1 ct 1\n#L sec  det\n1 42\n").unwrap();
//! let tree = spec.to_tree().unwrap();
//! assert_eq!(
//!     tree.dataset(&path!("/1.1/measurement/det")).unwrap(),
//!     Some(&Dataset::from(vec![42.0]))
//! );
//! ```

mod error;
mod layout;
mod parser;

pub use error::SpecFileError;
pub use parser::{McaChannels, Scan, SpecFile};
