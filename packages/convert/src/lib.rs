//! # spectree-convert
//!
//! Writes SPEC scans, or any other [`spectree_core::SourceTree`], into a
//! hierarchical container: an HDF5 file named by path, or any open
//! [`spectree_core::Container`] such as an in-memory `TreeFile`.
//!
//! ```rust
//! use spectree_convert::{write_spec_to_tree, Source, Target, WriteOptions};
//! use spectree_core::{path, Container};
//! use spectree_specfile::SpecFile;
//! use spectree_store::TreeFile;
//!
//! let scans = SpecFile::parse("#S 1 ascan\n#L th  det\n0 10\n1 12\n")
//!     .unwrap()
//!     .to_tree()
//!     .unwrap();
//!
//! let mut out = TreeFile::new();
//! let report = write_spec_to_tree(
//!     Source::Tree(&scans),
//!     Target::Container(&mut out),
//!     &WriteOptions::default().h5path("/entry"),
//! )
//! .unwrap();
//!
//! assert!(out.is_group(&path!("/entry/1.1/measurement")).unwrap());
//! assert_eq!(report.datasets_skipped, 0);
//! ```

mod alias;
mod error;
mod options;
mod writer;

pub use alias::{mca_data_alias, mca_info_alias};
pub use error::ConvertError;
pub use options::{ConvertOptions, WriteOptions};
pub use writer::{convert, write_spec_to_tree, ConversionReport, Source, Target};
