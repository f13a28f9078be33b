//! `H5File`: the `Container` implementation over an HDF5 file.

use std::cell::RefCell;
use std::collections::HashMap;
use std::path::{Path as FsPath, PathBuf};

use hdf5::types::{H5Type, VarLenUnicode};
use hdf5::{File, Group};
use spectree_core::{
    Container, Data, Dataset, DatasetOptions, Error, FileMode, LinkTarget, ObjectId, Path,
    PathError,
};

use crate::filters::Filters;

/// An HDF5 file opened for writing.
///
/// Groups, datasets and links are created in the file as they are written;
/// there is no separate save step. [`H5File::close`] flushes and releases
/// the file.
///
/// Object ids handed out by [`Container::create_group`],
/// [`Container::create_dataset`] and [`Container::object_id`] name the path
/// the object was reached at, so a hard link to an id binds to whatever
/// object that path names when the link is created.
pub struct H5File {
    pub(crate) file: File,
    location: PathBuf,
    handles: RefCell<Handles>,
}

#[derive(Default)]
struct Handles {
    paths: Vec<Path>,
    ids: HashMap<Path, ObjectId>,
}

impl Handles {
    fn id(&mut self, path: &Path) -> ObjectId {
        if let Some(id) = self.ids.get(path) {
            return *id;
        }
        let id = ObjectId(self.paths.len());
        self.paths.push(path.clone());
        self.ids.insert(path.clone(), id);
        id
    }
}

impl H5File {
    /// Open an HDF5 file.
    ///
    /// | mode | file exists | file missing |
    /// |------|-------------|--------------|
    /// | `r+` | open        | `FileNotFound` |
    /// | `w`  | truncate    | create       |
    /// | `w-` | `FileExists`| create       |
    /// | `a`  | open        | create       |
    pub fn open(path: impl AsRef<FsPath>, mode: FileMode) -> Result<Self, Error> {
        let path = path.as_ref();
        let file = match mode {
            FileMode::ReadWrite => {
                if !path.exists() {
                    return Err(Error::FileNotFound {
                        path: path.to_path_buf(),
                    });
                }
                File::open_rw(path)
            }
            FileMode::Truncate => File::create(path),
            FileMode::Exclusive => {
                if path.exists() {
                    return Err(Error::FileExists {
                        path: path.to_path_buf(),
                    });
                }
                File::create_excl(path)
            }
            FileMode::Append => File::append(path),
        }
        .map_err(|err| Error::storage(path, err))?;

        log::debug!("Opened {} with mode {}", path.display(), mode);
        Ok(Self::wrap(file, path))
    }

    /// Open an existing file read-only, for inspection.
    pub fn open_read(path: impl AsRef<FsPath>) -> Result<Self, Error> {
        let path = path.as_ref();
        if !path.exists() {
            return Err(Error::FileNotFound {
                path: path.to_path_buf(),
            });
        }
        let file = File::open(path).map_err(|err| Error::storage(path, err))?;
        Ok(Self::wrap(file, path))
    }

    fn wrap(file: File, path: &FsPath) -> Self {
        H5File {
            file,
            location: path.to_path_buf(),
            handles: RefCell::new(Handles::default()),
        }
    }

    /// Where the file lives on disk.
    pub fn location(&self) -> &FsPath {
        &self.location
    }

    pub fn flush(&self) -> Result<(), Error> {
        self.file.flush().map_err(|err| self.storage(err))
    }

    /// Flush and release the file.
    pub fn close(self) -> Result<(), Error> {
        let location = self.location;
        self.file
            .close()
            .map_err(|err| Error::storage(&location, err))?;
        log::debug!("Closed {}", location.display());
        Ok(())
    }

    pub(crate) fn storage(&self, err: impl ToString) -> Error {
        Error::storage(&self.location, err)
    }

    pub(crate) fn root(&self) -> Result<Group, Error> {
        self.file.group("/").map_err(|err| self.storage(err))
    }

    /// The group at `path`, following links, or `None` when `path` is
    /// missing or names something else.
    pub(crate) fn group(&self, path: &Path) -> Option<Group> {
        if path.is_root() {
            return self.root().ok();
        }
        self.file.group(&path.to_string()).ok()
    }

    pub(crate) fn handle(&self, path: &Path) -> ObjectId {
        self.handles.borrow_mut().id(path)
    }

    fn handle_path(&self, id: ObjectId) -> Result<Path, Error> {
        self.handles
            .borrow()
            .paths
            .get(id.0)
            .cloned()
            .ok_or(Error::UnknownObject { id })
    }

    /// Walk `path`, creating missing groups, and return the final group.
    fn ensure_group(&self, path: &Path) -> Result<Group, Error> {
        let mut group = self.root()?;
        for i in 0..path.len() {
            let name = &path[i];
            let here = path.slice(0, i + 1);
            group = if group.link_exists(name) {
                group
                    .group(name)
                    .map_err(|_| Error::NotAGroup { path: here })?
            } else {
                log::debug!("Creating intermediate group {}", here);
                group.create_group(name).map_err(|err| self.storage(err))?
            };
        }
        Ok(group)
    }

    /// Parent group for a new member at `path`, which must not exist yet.
    fn free_slot(&self, path: &Path) -> Result<(Group, String), Error> {
        let (Some(parent), Some(name)) = (path.parent(), path.name()) else {
            return Err(Error::AlreadyExists { path: path.clone() });
        };
        let group = self.ensure_group(&parent)?;
        if group.link_exists(name) {
            return Err(Error::AlreadyExists { path: path.clone() });
        }
        Ok((group, name.to_string()))
    }

    fn write_dataset(
        &self,
        group: &Group,
        name: &str,
        dataset: &Dataset,
        filters: &Filters,
    ) -> Result<(), Error> {
        let shape = dataset.shape();
        match dataset.data() {
            Data::Float(values) => self.write_values(group, name, shape, values, filters),
            Data::Integer(values) => self.write_values(group, name, shape, values, filters),
            Data::Text(values) => {
                let values = values
                    .iter()
                    .map(|value| {
                        value.parse::<VarLenUnicode>().map_err(|err| Error::InvalidDataset {
                            message: format!("{}: cannot store {:?}: {}", name, value, err),
                        })
                    })
                    .collect::<Result<Vec<_>, _>>()?;
                self.write_values(group, name, shape, &values, filters)
            }
        }
    }

    fn write_values<T: H5Type>(
        &self,
        group: &Group,
        name: &str,
        shape: &[usize],
        values: &[T],
        filters: &Filters,
    ) -> Result<(), Error> {
        if shape.is_empty() {
            let Some(value) = values.first() else {
                return Err(Error::InvalidDataset {
                    message: format!("{}: scalar without a value", name),
                });
            };
            return group
                .new_dataset::<T>()
                .shape(())
                .create(name)
                .and_then(|created| created.write_scalar(value))
                .map_err(|err| self.storage(err));
        }

        let mut builder = group.new_dataset::<T>().shape(shape.to_vec());
        if let Some(chunk) = filters.chunk_for(shape)? {
            builder = builder.chunk(chunk);
        }
        if let Some(level) = filters.deflate {
            builder = builder.deflate(level);
        }
        if filters.shuffle {
            builder = builder.shuffle();
        }
        if filters.fletcher32 {
            builder = builder.fletcher32();
        }
        let created = builder.create(name).map_err(|err| self.storage(err))?;
        if !values.is_empty() {
            created.write_raw(values).map_err(|err| self.storage(err))?;
        }
        Ok(())
    }
}

impl Container for H5File {
    fn contains(&self, path: &Path) -> Result<bool, Error> {
        let (Some(parent), Some(name)) = (path.parent(), path.name()) else {
            return Ok(true);
        };
        Ok(match self.group(&parent) {
            Some(group) => group.link_exists(name),
            None => false,
        })
    }

    fn delete(&mut self, path: &Path) -> Result<(), Error> {
        let (Some(parent), Some(name)) = (path.parent(), path.name()) else {
            return Err(PathError::InvalidPath {
                message: "cannot delete the root group".to_string(),
            }
            .into());
        };
        let group = self
            .group(&parent)
            .filter(|group| group.link_exists(name))
            .ok_or_else(|| Error::NotFound { path: path.clone() })?;
        group.unlink(name).map_err(|err| self.storage(err))?;
        log::debug!("Deleted {}", path);
        Ok(())
    }

    fn create_group(&mut self, path: &Path) -> Result<ObjectId, Error> {
        let (group, name) = self.free_slot(path)?;
        group.create_group(&name).map_err(|err| self.storage(err))?;
        Ok(self.handle(path))
    }

    fn create_dataset(
        &mut self,
        path: &Path,
        dataset: &Dataset,
        options: Option<&DatasetOptions>,
    ) -> Result<ObjectId, Error> {
        let filters = Filters::from_options(options)?;
        let (group, name) = self.free_slot(path)?;
        self.write_dataset(&group, &name, dataset, &filters)?;
        Ok(self.handle(path))
    }

    fn create_link(&mut self, path: &Path, target: LinkTarget<'_>) -> Result<(), Error> {
        let (group, name) = self.free_slot(path)?;
        match target {
            LinkTarget::Hard(id) => {
                let to = self.handle_path(id)?;
                group.link_hard(&to.to_string(), &name)
            }
            LinkTarget::Soft(to) => group.link_soft(&to.to_string(), &name),
        }
        .map_err(|err| self.storage(err))
    }

    fn object_id(&self, path: &Path) -> Result<Option<ObjectId>, Error> {
        let exists = path.is_root()
            || self.file.group(&path.to_string()).is_ok()
            || self.file.dataset(&path.to_string()).is_ok();
        Ok(exists.then(|| self.handle(path)))
    }

    fn is_group(&self, path: &Path) -> Result<bool, Error> {
        Ok(self.group(path).is_some())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use spectree_core::path;

    fn scratch() -> (tempfile::TempDir, H5File) {
        let dir = tempfile::tempdir().unwrap();
        let file = H5File::open(dir.path().join("t.h5"), FileMode::Exclusive).unwrap();
        (dir, file)
    }

    #[test]
    fn create_dataset_creates_intermediate_groups() {
        let (_dir, mut file) = scratch();
        file.create_dataset(&path!("/1.1/instrument/mca_0/data"), &Dataset::from(1.0), None)
            .unwrap();

        assert!(file.is_group(&path!("/1.1")).unwrap());
        assert!(file.is_group(&path!("/1.1/instrument/mca_0")).unwrap());
        assert!(!file.is_group(&path!("/1.1/instrument/mca_0/data")).unwrap());
        assert!(file.contains(&path!("/1.1/instrument/mca_0/data")).unwrap());
    }

    #[test]
    fn existing_member_cannot_be_recreated() {
        let (_dir, mut file) = scratch();
        file.create_group(&path!("/1.1")).unwrap();
        let err = file.create_group(&path!("/1.1")).unwrap_err();
        assert!(matches!(err, Error::AlreadyExists { .. }));
    }

    #[test]
    fn datasets_are_not_groups() {
        let (_dir, mut file) = scratch();
        file.create_dataset(&path!("/title"), &Dataset::from("x"), None)
            .unwrap();
        let err = file
            .create_dataset(&path!("/title/deeper"), &Dataset::from(1.0), None)
            .unwrap_err();
        assert!(matches!(err, Error::NotAGroup { .. }));
        assert!(!file.contains(&path!("/title/deeper")).unwrap());
    }

    #[test]
    fn hard_links_share_the_object() {
        let (_dir, mut file) = scratch();
        let id = file
            .create_dataset(&path!("/a/data"), &Dataset::from(vec![1.0, 2.0]), None)
            .unwrap();
        file.create_link(&path!("/b/data"), LinkTarget::Hard(id))
            .unwrap();

        file.delete(&path!("/a/data")).unwrap();
        assert!(!file.contains(&path!("/a/data")).unwrap());
        assert_eq!(
            file.dataset(&path!("/b/data")).unwrap(),
            Some(Dataset::from(vec![1.0, 2.0]))
        );
    }

    #[test]
    fn soft_links_dangle_once_their_target_is_gone() {
        let (_dir, mut file) = scratch();
        file.create_dataset(&path!("/a/data"), &Dataset::from(vec![1.0, 2.0]), None)
            .unwrap();
        file.create_link(&path!("/b/data"), LinkTarget::Soft(&path!("/a/data")))
            .unwrap();
        assert_eq!(
            file.dataset(&path!("/b/data")).unwrap(),
            Some(Dataset::from(vec![1.0, 2.0]))
        );

        file.delete(&path!("/a/data")).unwrap();
        assert!(file.contains(&path!("/b/data")).unwrap());
        assert_eq!(file.dataset(&path!("/b/data")).unwrap(), None);
        assert_eq!(file.object_id(&path!("/b/data")).unwrap(), None);
    }

    #[test]
    fn hard_link_to_unknown_object_fails() {
        let (_dir, mut file) = scratch();
        let err = file
            .create_link(&path!("/x"), LinkTarget::Hard(ObjectId(99)))
            .unwrap_err();
        assert!(matches!(err, Error::UnknownObject { .. }));
    }

    #[test]
    fn delete_missing_member_fails() {
        let (_dir, mut file) = scratch();
        let err = file.delete(&path!("/nothing")).unwrap_err();
        assert!(matches!(err, Error::NotFound { .. }));
        assert!(file.delete(&Path::root()).is_err());
    }

    #[test]
    fn object_ids_are_stable_per_path() {
        let (_dir, mut file) = scratch();
        let id = file.create_group(&path!("/g")).unwrap();
        assert_eq!(file.object_id(&path!("/g")).unwrap(), Some(id));
        assert_eq!(file.object_id(&path!("/missing")).unwrap(), None);
    }

    #[test]
    fn option_errors_leave_the_file_untouched() {
        let (_dir, mut file) = scratch();
        let options = DatasetOptions::new().with("compression", "lzf");
        let err = file
            .create_dataset(&path!("/1.1/data"), &Dataset::from(vec![1.0]), Some(&options))
            .unwrap_err();
        assert!(err.is_config());
        assert!(!file.contains(&path!("/1.1")).unwrap());
    }
}
