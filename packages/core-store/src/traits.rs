//! Core traits: SourceTree, Container.

use crate::{Dataset, DatasetOptions, Error, ObjectId, Path};

/// One member yielded while visiting a source tree.
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum SourceNode<'a> {
    Group,
    Dataset(&'a Dataset),
    /// An alias of a group that is (or will be) yielded under its own path.
    LinkToGroup(&'a Path),
    /// An alias of a dataset that is (or will be) yielded under its own path.
    LinkToDataset(&'a Path),
}

impl SourceNode<'_> {
    pub fn is_link(&self) -> bool {
        matches!(self, SourceNode::LinkToGroup(_) | SourceNode::LinkToDataset(_))
    }
}

/// Callback used by [`SourceTree::visit_items`].
pub type Visitor<'v> = dyn FnMut(&Path, SourceNode<'_>) -> Result<(), Error> + 'v;

/// A readable hierarchical tree.
///
/// # Object Safety
///
/// This trait is object-safe: you can use `&dyn SourceTree`.
pub trait SourceTree {
    /// Visit every member below the root.
    ///
    /// Members are visited in pre-order: a group is yielded before anything
    /// it contains. Paths are rooted. The root itself is not yielded. The
    /// first error returned by `visitor` stops the walk and is returned.
    fn visit_items(&self, visitor: &mut Visitor<'_>) -> Result<(), Error>;
}

/// What a new link points at.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum LinkTarget<'a> {
    /// Bind to an object's identity.
    Hard(ObjectId),
    /// Bind to an absolute path, resolved on access.
    Soft(&'a Path),
}

/// A writable hierarchical container.
///
/// Creation calls create missing intermediate groups. Creating a member
/// where one already exists is an error; callers check with `contains` and
/// `delete` first.
pub trait Container {
    /// Whether a member (or a link, dangling or not) exists at `path`.
    fn contains(&self, path: &Path) -> Result<bool, Error>;

    /// Remove the member at `path`.
    fn delete(&mut self, path: &Path) -> Result<(), Error>;

    fn create_group(&mut self, path: &Path) -> Result<ObjectId, Error>;

    /// Create a dataset. `options` are opaque creation properties.
    fn create_dataset(
        &mut self,
        path: &Path,
        dataset: &Dataset,
        options: Option<&DatasetOptions>,
    ) -> Result<ObjectId, Error>;

    fn create_link(&mut self, path: &Path, target: LinkTarget<'_>) -> Result<(), Error>;

    /// Identity of the object at `path`, following links.
    fn object_id(&self, path: &Path) -> Result<Option<ObjectId>, Error>;

    /// Whether `path` resolves to a group, following links.
    fn is_group(&self, path: &Path) -> Result<bool, Error>;
}

// Blanket implementations for references and boxes

impl<T: SourceTree + ?Sized> SourceTree for &T {
    fn visit_items(&self, visitor: &mut Visitor<'_>) -> Result<(), Error> {
        (**self).visit_items(visitor)
    }
}

impl<T: SourceTree + ?Sized> SourceTree for Box<T> {
    fn visit_items(&self, visitor: &mut Visitor<'_>) -> Result<(), Error> {
        self.as_ref().visit_items(visitor)
    }
}

impl<T: Container + ?Sized> Container for &mut T {
    fn contains(&self, path: &Path) -> Result<bool, Error> {
        (**self).contains(path)
    }

    fn delete(&mut self, path: &Path) -> Result<(), Error> {
        (**self).delete(path)
    }

    fn create_group(&mut self, path: &Path) -> Result<ObjectId, Error> {
        (**self).create_group(path)
    }

    fn create_dataset(
        &mut self,
        path: &Path,
        dataset: &Dataset,
        options: Option<&DatasetOptions>,
    ) -> Result<ObjectId, Error> {
        (**self).create_dataset(path, dataset, options)
    }

    fn create_link(&mut self, path: &Path, target: LinkTarget<'_>) -> Result<(), Error> {
        (**self).create_link(path, target)
    }

    fn object_id(&self, path: &Path) -> Result<Option<ObjectId>, Error> {
        (**self).object_id(path)
    }

    fn is_group(&self, path: &Path) -> Result<bool, Error> {
        (**self).is_group(path)
    }
}

impl<T: Container + ?Sized> Container for Box<T> {
    fn contains(&self, path: &Path) -> Result<bool, Error> {
        self.as_ref().contains(path)
    }

    fn delete(&mut self, path: &Path) -> Result<(), Error> {
        self.as_mut().delete(path)
    }

    fn create_group(&mut self, path: &Path) -> Result<ObjectId, Error> {
        self.as_mut().create_group(path)
    }

    fn create_dataset(
        &mut self,
        path: &Path,
        dataset: &Dataset,
        options: Option<&DatasetOptions>,
    ) -> Result<ObjectId, Error> {
        self.as_mut().create_dataset(path, dataset, options)
    }

    fn create_link(&mut self, path: &Path, target: LinkTarget<'_>) -> Result<(), Error> {
        self.as_mut().create_link(path, target)
    }

    fn object_id(&self, path: &Path) -> Result<Option<ObjectId>, Error> {
        self.as_ref().object_id(path)
    }

    fn is_group(&self, path: &Path) -> Result<bool, Error> {
        self.as_ref().is_group(path)
    }
}
