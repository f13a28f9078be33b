//! # spectree-store
//!
//! `TreeFile`, an in-memory HDF5-shaped container: groups, datasets, hard
//! links and soft links. Files on disk are handled by `spectree-h5`.
//!
//! `TreeFile` implements both sides of the core contract:
//! - [`spectree_core::Container`] so converters can write into it
//! - [`spectree_core::SourceTree`] so it can be walked as a source
//!
//! ```rust
//! use spectree_core::{path, Container, Dataset, SourceNode, SourceTree};
//! use spectree_store::TreeFile;
//!
//! let mut tree = TreeFile::new();
//! tree.create_dataset(&path!("/1.1/title"), &Dataset::from("ascan"), None).unwrap();
//! assert_eq!(tree.dataset(&path!("/1.1/title")).unwrap(), Some(&Dataset::from("ascan")));
//!
//! let mut groups = 0;
//! tree.visit_items(&mut |_, node| {
//!     if node == SourceNode::Group {
//!         groups += 1;
//!     }
//!     Ok(())
//! })
//! .unwrap();
//! assert_eq!(groups, 1);
//! ```

mod object;
mod tree_file;
mod visit;

pub use object::{LinkInfo, Member};
pub use tree_file::TreeFile;
