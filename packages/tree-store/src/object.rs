//! Stored objects and the links that name them.

use std::collections::BTreeMap;

use spectree_core::{Dataset, DatasetOptions, ObjectId};

/// A named entry inside a group.
#[derive(Clone, Debug, PartialEq)]
pub(crate) enum Link {
    Hard(ObjectId),
    /// Absolute path, re-resolved on every access.
    Soft(String),
}

#[derive(Clone, Debug, PartialEq)]
pub(crate) enum Object {
    Group { links: BTreeMap<String, Link> },
    Dataset {
        dataset: Dataset,
        options: DatasetOptions,
    },
}

impl Object {
    pub(crate) fn empty_group() -> Self {
        Object::Group {
            links: BTreeMap::new(),
        }
    }

    pub(crate) fn is_group(&self) -> bool {
        matches!(self, Object::Group { .. })
    }
}

/// How a path is bound inside its parent group.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum LinkInfo {
    /// Bound to a stored object.
    Hard(ObjectId),
    /// Bound to a path string, which may or may not resolve.
    Soft(spectree_core::Path),
}

/// A resolved member.
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum Member<'a> {
    Group,
    Dataset {
        dataset: &'a Dataset,
        options: &'a DatasetOptions,
    },
}

impl Member<'_> {
    pub fn is_group(&self) -> bool {
        matches!(self, Member::Group)
    }
}
