//! Reading members back out of an `H5File`.

use std::fmt::Write as _;

use hdf5::types::{TypeDescriptor, VarLenAscii, VarLenUnicode};
use spectree_core::{Data, Dataset, Error, Path};

use crate::h5_file::H5File;

/// Links are followed while listing; past this depth a soft link cycle is
/// assumed and the walk stops descending.
const MAX_LISTING_DEPTH: usize = 32;

impl H5File {
    /// The dataset at `path`, following links. `None` when `path` is missing,
    /// dangles or names a group.
    pub fn dataset(&self, path: &Path) -> Result<Option<Dataset>, Error> {
        if path.is_root() {
            return Ok(None);
        }
        let Ok(stored) = self.file_dataset(path) else {
            return Ok(None);
        };
        let shape = stored.shape();
        let descriptor = stored
            .dtype()
            .and_then(|dtype| dtype.to_descriptor())
            .map_err(|err| self.storage(err))?;

        let empty = shape.iter().product::<usize>() == 0 && !shape.is_empty();
        let data = match descriptor {
            TypeDescriptor::Float(_) => {
                Data::Float(if empty { Vec::new() } else { self.read(&stored)? })
            }
            TypeDescriptor::Integer(_) | TypeDescriptor::Unsigned(_) => {
                Data::Integer(if empty { Vec::new() } else { self.read(&stored)? })
            }
            TypeDescriptor::VarLenUnicode => Data::Text(if empty {
                Vec::new()
            } else {
                self.read::<VarLenUnicode>(&stored)?
                    .iter()
                    .map(|s| s.as_str().to_string())
                    .collect()
            }),
            TypeDescriptor::VarLenAscii => Data::Text(if empty {
                Vec::new()
            } else {
                self.read::<VarLenAscii>(&stored)?
                    .iter()
                    .map(|s| s.as_str().to_string())
                    .collect()
            }),
            other => {
                return Err(Error::InvalidDataset {
                    message: format!("{}: unsupported element type {:?}", path, other),
                })
            }
        };
        Dataset::new(shape, data).map(Some)
    }

    /// Whether the dataset at `path` uses a chunked layout, which every
    /// filtered dataset does.
    pub fn is_chunked(&self, path: &Path) -> Result<bool, Error> {
        self.file_dataset(path)
            .map(|stored| stored.is_chunked())
            .map_err(|_| Error::NotFound { path: path.clone() })
    }

    /// Names held by the group at `path`, sorted.
    pub fn members(&self, path: &Path) -> Result<Vec<String>, Error> {
        let group = self
            .group(path)
            .ok_or_else(|| Error::NotFound { path: path.clone() })?;
        let mut names = group.member_names().map_err(|err| self.storage(err))?;
        names.sort();
        Ok(names)
    }

    /// Recursive listing, one member per line, links followed.
    ///
    /// ```text
    /// /1.1                                     Group
    /// /1.1/title                               Dataset {SCALAR} text
    /// /1.1/measurement/mca_0/info              Group
    /// ```
    pub fn listing(&self) -> Result<String, Error> {
        let mut out = String::new();
        self.list_group(&Path::root(), 0, &mut out)?;
        Ok(out)
    }

    fn list_group(&self, path: &Path, depth: usize, out: &mut String) -> Result<(), Error> {
        if depth > MAX_LISTING_DEPTH {
            log::warn!("Not descending into {}: too deeply nested", path);
            return Ok(());
        }
        for name in self.members(path)? {
            let child = path.child(&name)?;
            let name = child.to_string();
            if self.group(&child).is_some() {
                let _ = writeln!(out, "{:<40} Group", name);
                self.list_group(&child, depth + 1, out)?;
            } else if let Some(dataset) = self.dataset(&child)? {
                let _ = writeln!(
                    out,
                    "{:<40} Dataset {} {}",
                    name,
                    shape_text(dataset.shape()),
                    dataset.dtype()
                );
            } else {
                let _ = writeln!(out, "{:<40} Dangling link", name);
            }
        }
        Ok(())
    }

    fn file_dataset(&self, path: &Path) -> hdf5::Result<hdf5::Dataset> {
        self.file.dataset(&path.to_string())
    }

    fn read<T: hdf5::H5Type>(&self, stored: &hdf5::Dataset) -> Result<Vec<T>, Error> {
        stored.read_raw::<T>().map_err(|err| self.storage(err))
    }
}

fn shape_text(shape: &[usize]) -> String {
    if shape.is_empty() {
        return "{SCALAR}".to_string();
    }
    let dims: Vec<String> = shape.iter().map(usize::to_string).collect();
    format!("{{{}}}", dims.join(", "))
}

#[cfg(test)]
mod tests {
    use super::*;
    use spectree_core::{path, Container, FileMode, LinkTarget};

    #[test]
    fn values_come_back_with_their_type_and_shape() {
        let dir = tempfile::tempdir().unwrap();
        let mut file = H5File::open(dir.path().join("t.h5"), FileMode::Exclusive).unwrap();
        let rows = Dataset::from_rows(&[vec![1.0, 2.0, 3.0], vec![4.0, 5.0, 6.0]]).unwrap();
        file.create_dataset(&path!("/mca"), &rows, None).unwrap();
        file.create_dataset(&path!("/n"), &Dataset::from(vec![1_i64, -2]), None)
            .unwrap();
        file.create_dataset(&path!("/title"), &Dataset::from("ascan  samx 0 1"), None)
            .unwrap();
        file.create_dataset(&path!("/empty"), &Dataset::from(Vec::<f64>::new()), None)
            .unwrap();

        assert_eq!(file.dataset(&path!("/mca")).unwrap(), Some(rows));
        assert_eq!(
            file.dataset(&path!("/n")).unwrap(),
            Some(Dataset::from(vec![1_i64, -2]))
        );
        assert_eq!(
            file.dataset(&path!("/title")).unwrap(),
            Some(Dataset::from("ascan  samx 0 1"))
        );
        assert_eq!(
            file.dataset(&path!("/empty")).unwrap(),
            Some(Dataset::from(Vec::<f64>::new()))
        );
        assert_eq!(file.dataset(&path!("/missing")).unwrap(), None);
    }

    #[test]
    fn listing_follows_links() {
        let dir = tempfile::tempdir().unwrap();
        let mut file = H5File::open(dir.path().join("t.h5"), FileMode::Exclusive).unwrap();
        file.create_dataset(&path!("/a/data"), &Dataset::from(vec![1.0, 2.0]), None)
            .unwrap();
        file.create_dataset(&path!("/a/title"), &Dataset::from("scan"), None)
            .unwrap();
        file.create_link(&path!("/b/info"), LinkTarget::Soft(&path!("/a")))
            .unwrap();
        file.create_link(&path!("/b/lost"), LinkTarget::Soft(&path!("/nowhere")))
            .unwrap();

        let listing = file.listing().unwrap();
        let lines: Vec<&str> = listing.lines().collect();
        assert_eq!(lines.len(), 8, "{}", listing);
        assert!(lines[0].starts_with("/a ") && lines[0].ends_with("Group"));
        assert!(lines[1].ends_with("Dataset {2} float64"));
        assert!(lines[2].ends_with("Dataset {SCALAR} text"));
        assert!(lines[4].starts_with("/b/info ") && lines[4].ends_with("Group"));
        assert!(lines[5].starts_with("/b/info/data "));
        assert!(lines[7].ends_with("Dangling link"));
    }

    #[test]
    fn members_of_a_dataset_are_not_found() {
        let dir = tempfile::tempdir().unwrap();
        let mut file = H5File::open(dir.path().join("t.h5"), FileMode::Exclusive).unwrap();
        file.create_dataset(&path!("/x"), &Dataset::from(1.0), None)
            .unwrap();
        assert!(matches!(
            file.members(&path!("/x")),
            Err(Error::NotFound { .. })
        ));
        assert_eq!(file.members(&Path::root()).unwrap(), vec!["x".to_string()]);
    }
}
