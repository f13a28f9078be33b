//! # spectree-h5
//!
//! HDF5 files as spectree containers.
//!
//! [`H5File`] implements [`spectree_core::Container`] on top of the `hdf5`
//! crate: groups and datasets are created in the file, aliases become HDF5
//! hard or soft links, and dataset options become storage filters (see
//! [`Filters`]). Datasets can be read back for inspection.
//!
//! ```rust,no_run
//! use spectree_core::{path, Container, Dataset, FileMode};
//! use spectree_h5::H5File;
//!
//! let mut file = H5File::open("scans.h5", FileMode::Append)?;
//! file.create_dataset(&path!("/1.1/title"), &Dataset::from("ascan"), None)?;
//! assert_eq!(file.dataset(&path!("/1.1/title"))?, Some(Dataset::from("ascan")));
//! file.close()?;
//! # Ok::<(), spectree_core::Error>(())
//! ```

mod filters;
mod h5_file;
mod read;

pub use filters::Filters;
pub use h5_file::H5File;
