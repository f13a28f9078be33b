//! The `TreeFile` object arena and its `Container` implementation.

use std::collections::BTreeMap;

use spectree_core::{
    Container, Dataset, DatasetOptions, Error, LinkTarget, ObjectId, Path, PathError,
};

use crate::object::{Link, LinkInfo, Member, Object};

pub(crate) const ROOT: ObjectId = ObjectId(0);

/// Soft links may chain; resolution gives up past this depth.
const MAX_SOFT_LINK_DEPTH: usize = 16;

/// An HDF5-shaped tree: groups holding named links to groups and datasets.
///
/// Objects live in an arena and are named by links. A hard link binds a name
/// to an object, so several names may share one object. A soft link binds a
/// name to an absolute path that is resolved each time it is crossed.
///
/// A `TreeFile` lives in memory only. It serves as the parsed form of a
/// SPEC file and as an open container for callers that do not want a file.
///
/// # Example
///
/// ```rust
/// use spectree_core::{path, Container, Dataset, LinkTarget};
/// use spectree_store::TreeFile;
///
/// let mut tree = TreeFile::new();
/// let id = tree
///     .create_dataset(&path!("/1.1/instrument/mca_0/data"), &Dataset::from(vec![1.0, 2.0]), None)
///     .unwrap();
/// tree.create_link(&path!("/1.1/measurement/mca_0/data"), LinkTarget::Hard(id))
///     .unwrap();
///
/// assert_eq!(tree.object_id(&path!("/1.1/measurement/mca_0/data")).unwrap(), Some(id));
/// ```
#[derive(Debug)]
pub struct TreeFile {
    pub(crate) objects: Vec<Object>,
}

impl Default for TreeFile {
    fn default() -> Self {
        Self::new()
    }
}

impl TreeFile {
    /// Create an empty in-memory tree holding only the root group.
    pub fn new() -> Self {
        TreeFile {
            objects: vec![Object::empty_group()],
        }
    }

    pub(crate) fn object(&self, id: ObjectId) -> Result<&Object, Error> {
        self.objects.get(id.0).ok_or(Error::UnknownObject { id })
    }

    fn links(&self, id: ObjectId, at: &Path) -> Result<&BTreeMap<String, Link>, Error> {
        match self.object(id)? {
            Object::Group { links } => Ok(links),
            Object::Dataset { .. } => Err(Error::NotAGroup { path: at.clone() }),
        }
    }

    fn links_mut(&mut self, id: ObjectId, at: &Path) -> Result<&mut BTreeMap<String, Link>, Error> {
        match self.objects.get_mut(id.0) {
            Some(Object::Group { links }) => Ok(links),
            Some(Object::Dataset { .. }) => Err(Error::NotAGroup { path: at.clone() }),
            None => Err(Error::UnknownObject { id }),
        }
    }

    /// Cross one link. `at` is the path of the link itself.
    fn follow(&self, link: &Link, depth: usize, at: &Path) -> Result<Option<ObjectId>, Error> {
        match link {
            Link::Hard(id) => Ok(Some(*id)),
            Link::Soft(target) => {
                if depth >= MAX_SOFT_LINK_DEPTH {
                    return Err(Error::LinkLoop { path: at.clone() });
                }
                self.resolve_at(&Path::parse(target)?, depth + 1)
            }
        }
    }

    fn resolve_at(&self, path: &Path, depth: usize) -> Result<Option<ObjectId>, Error> {
        let mut current = ROOT;
        for (i, name) in path.iter().enumerate() {
            let links = self.links(current, &path.slice(0, i))?;
            let Some(link) = links.get(name) else {
                return Ok(None);
            };
            match self.follow(link, depth, &path.slice(0, i + 1))? {
                Some(id) => current = id,
                None => return Ok(None),
            }
        }
        Ok(Some(current))
    }

    /// Object at `path`, following hard and soft links.
    ///
    /// Returns `Ok(None)` when a component is missing or a soft link dangles,
    /// and `NotAGroup` when the path crosses a dataset.
    pub fn resolve(&self, path: &Path) -> Result<Option<ObjectId>, Error> {
        self.resolve_at(path, 0)
    }

    /// The member at `path`, following links.
    pub fn get(&self, path: &Path) -> Result<Option<Member<'_>>, Error> {
        let Some(id) = self.resolve(path)? else {
            return Ok(None);
        };
        Ok(Some(match self.object(id)? {
            Object::Group { .. } => Member::Group,
            Object::Dataset { dataset, options } => Member::Dataset { dataset, options },
        }))
    }

    /// The dataset at `path`, or `None` if absent or a group.
    pub fn dataset(&self, path: &Path) -> Result<Option<&Dataset>, Error> {
        Ok(match self.get(path)? {
            Some(Member::Dataset { dataset, .. }) => Some(dataset),
            _ => None,
        })
    }

    /// Creation options recorded for the dataset at `path`.
    pub fn dataset_options(&self, path: &Path) -> Result<Option<&DatasetOptions>, Error> {
        Ok(match self.get(path)? {
            Some(Member::Dataset { options, .. }) => Some(options),
            _ => None,
        })
    }

    /// Names held by the group at `path`, in order.
    pub fn members(&self, path: &Path) -> Result<Vec<String>, Error> {
        let id = self
            .resolve(path)?
            .ok_or_else(|| Error::NotFound { path: path.clone() })?;
        Ok(self.links(id, path)?.keys().cloned().collect())
    }

    /// How `path` is bound in its parent, without following the final link.
    pub fn link_info(&self, path: &Path) -> Result<Option<LinkInfo>, Error> {
        let (Some(parent), Some(name)) = (path.parent(), path.name()) else {
            return Ok(Some(LinkInfo::Hard(ROOT)));
        };
        let Some(parent_id) = self.resolve(&parent)? else {
            return Ok(None);
        };
        Ok(match self.links(parent_id, &parent)?.get(name) {
            None => None,
            Some(Link::Hard(id)) => Some(LinkInfo::Hard(*id)),
            Some(Link::Soft(target)) => Some(LinkInfo::Soft(Path::parse(target)?)),
        })
    }

    /// Walk `path`, creating missing groups, and return the final group.
    fn ensure_group(&mut self, path: &Path) -> Result<ObjectId, Error> {
        let mut current = ROOT;
        for i in 0..path.len() {
            let here = path.slice(0, i + 1);
            let existing = self.links(current, &path.slice(0, i))?.get(&path[i]).cloned();
            current = match existing {
                Some(link) => {
                    let id = self
                        .follow(&link, 0, &here)?
                        .ok_or_else(|| Error::NotFound { path: here.clone() })?;
                    if !self.object(id)?.is_group() {
                        return Err(Error::NotAGroup { path: here });
                    }
                    id
                }
                None => {
                    log::debug!("Creating intermediate group {}", here);
                    self.attach(current, &path.slice(0, i), &path[i], Object::empty_group())?
                }
            };
        }
        Ok(current)
    }

    fn attach(
        &mut self,
        parent: ObjectId,
        parent_path: &Path,
        name: &str,
        object: Object,
    ) -> Result<ObjectId, Error> {
        let id = ObjectId(self.objects.len());
        self.links_mut(parent, parent_path)?
            .insert(name.to_string(), Link::Hard(id));
        self.objects.push(object);
        Ok(id)
    }

    /// Parent group for a new member at `path`, which must not exist yet.
    fn free_slot(&mut self, path: &Path) -> Result<(ObjectId, Path, String), Error> {
        let (Some(parent), Some(name)) = (path.parent(), path.name()) else {
            return Err(Error::AlreadyExists { path: path.clone() });
        };
        let name = name.to_string();
        let parent_id = self.ensure_group(&parent)?;
        if self.links(parent_id, &parent)?.contains_key(&name) {
            return Err(Error::AlreadyExists { path: path.clone() });
        }
        Ok((parent_id, parent, name))
    }
}

impl Container for TreeFile {
    fn contains(&self, path: &Path) -> Result<bool, Error> {
        let (Some(parent), Some(name)) = (path.parent(), path.name()) else {
            return Ok(true);
        };
        match self.resolve(&parent) {
            Ok(Some(id)) => Ok(match self.object(id)? {
                Object::Group { links } => links.contains_key(name),
                Object::Dataset { .. } => false,
            }),
            Ok(None) | Err(Error::NotAGroup { .. }) => Ok(false),
            Err(e) => Err(e),
        }
    }

    fn delete(&mut self, path: &Path) -> Result<(), Error> {
        let (Some(parent), Some(name)) = (path.parent(), path.name()) else {
            return Err(PathError::InvalidPath {
                message: "cannot delete the root group".to_string(),
            }
            .into());
        };
        let parent_id = self
            .resolve(&parent)?
            .ok_or_else(|| Error::NotFound { path: path.clone() })?;
        self.links_mut(parent_id, &parent)?
            .remove(name)
            .ok_or_else(|| Error::NotFound { path: path.clone() })?;
        log::debug!("Deleted {}", path);
        Ok(())
    }

    fn create_group(&mut self, path: &Path) -> Result<ObjectId, Error> {
        let (parent_id, parent, name) = self.free_slot(path)?;
        self.attach(parent_id, &parent, &name, Object::empty_group())
    }

    fn create_dataset(
        &mut self,
        path: &Path,
        dataset: &Dataset,
        options: Option<&DatasetOptions>,
    ) -> Result<ObjectId, Error> {
        let (parent_id, parent, name) = self.free_slot(path)?;
        let object = Object::Dataset {
            dataset: dataset.clone(),
            options: options.cloned().unwrap_or_default(),
        };
        self.attach(parent_id, &parent, &name, object)
    }

    fn create_link(&mut self, path: &Path, target: LinkTarget<'_>) -> Result<(), Error> {
        let link = match target {
            LinkTarget::Hard(id) => {
                self.object(id)?;
                Link::Hard(id)
            }
            LinkTarget::Soft(target) => Link::Soft(target.to_string()),
        };
        let (parent_id, parent, name) = self.free_slot(path)?;
        self.links_mut(parent_id, &parent)?.insert(name, link);
        Ok(())
    }

    fn object_id(&self, path: &Path) -> Result<Option<ObjectId>, Error> {
        self.resolve(path)
    }

    fn is_group(&self, path: &Path) -> Result<bool, Error> {
        Ok(matches!(self.get(path)?, Some(Member::Group)))
    }
}
