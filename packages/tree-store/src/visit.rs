//! Walking a `TreeFile` as a source tree.

use std::collections::HashMap;

use spectree_core::{Error, ObjectId, Path, SourceNode, SourceTree, Visitor};

use crate::object::{Link, Object};
use crate::tree_file::{TreeFile, ROOT};

impl SourceTree for TreeFile {
    /// Pre-order walk, members in name order.
    ///
    /// An object reachable through several hard links is yielded as a group
    /// or dataset under the first name reached, and as a link under every
    /// later one. Soft links are yielded as links to whatever they resolve
    /// to; dangling soft links are skipped. The walk never descends through a
    /// link.
    fn visit_items(&self, visitor: &mut Visitor<'_>) -> Result<(), Error> {
        let mut first_seen = HashMap::from([(ROOT, Path::root())]);
        self.visit_group(ROOT, &Path::root(), &mut first_seen, visitor)
    }
}

impl TreeFile {
    fn visit_group(
        &self,
        id: ObjectId,
        path: &Path,
        first_seen: &mut HashMap<ObjectId, Path>,
        visitor: &mut Visitor<'_>,
    ) -> Result<(), Error> {
        let Object::Group { links } = self.object(id)? else {
            return Err(Error::NotAGroup { path: path.clone() });
        };

        for (name, link) in links {
            let child = path.child(name)?;
            match link {
                Link::Hard(target) => {
                    let object = self.object(*target)?;
                    if let Some(original) = first_seen.get(target) {
                        let node = if object.is_group() {
                            SourceNode::LinkToGroup(original)
                        } else {
                            SourceNode::LinkToDataset(original)
                        };
                        visitor(&child, node)?;
                        continue;
                    }

                    first_seen.insert(*target, child.clone());
                    match object {
                        Object::Group { .. } => {
                            visitor(&child, SourceNode::Group)?;
                            self.visit_group(*target, &child, first_seen, visitor)?;
                        }
                        Object::Dataset { dataset, .. } => {
                            visitor(&child, SourceNode::Dataset(dataset))?;
                        }
                    }
                }
                Link::Soft(target) => {
                    let target_path = Path::parse(target)?;
                    match self.resolve(&target_path) {
                        Ok(Some(resolved)) => {
                            let node = if self.object(resolved)?.is_group() {
                                SourceNode::LinkToGroup(&target_path)
                            } else {
                                SourceNode::LinkToDataset(&target_path)
                            };
                            visitor(&child, node)?;
                        }
                        Ok(None) | Err(Error::NotAGroup { .. }) => {
                            log::debug!("Skipping dangling soft link {} -> {}", child, target);
                        }
                        Err(e) => return Err(e),
                    }
                }
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use spectree_core::{path, Container, Dataset, LinkTarget};

    fn collect(tree: &TreeFile) -> Vec<(String, String)> {
        let mut seen = Vec::new();
        tree.visit_items(&mut |path, node| {
            let kind = match node {
                SourceNode::Group => "group".to_string(),
                SourceNode::Dataset(_) => "dataset".to_string(),
                SourceNode::LinkToGroup(t) => format!("link-group {}", t),
                SourceNode::LinkToDataset(t) => format!("link-dataset {}", t),
            };
            seen.push((path.to_string(), kind));
            Ok(())
        })
        .unwrap();
        seen
    }

    #[test]
    fn visits_in_pre_order_by_name() {
        let mut tree = TreeFile::new();
        tree.create_dataset(&path!("/b/x"), &Dataset::from(1.0), None)
            .unwrap();
        tree.create_group(&path!("/a")).unwrap();

        assert_eq!(
            collect(&tree),
            vec![
                ("/a".to_string(), "group".to_string()),
                ("/b".to_string(), "group".to_string()),
                ("/b/x".to_string(), "dataset".to_string()),
            ]
        );
    }

    #[test]
    fn second_hard_link_is_yielded_as_link() {
        let mut tree = TreeFile::new();
        let data = tree
            .create_dataset(&path!("/1.1/instrument/mca_0/data"), &Dataset::from(1.0), None)
            .unwrap();
        let group = tree.object_id(&path!("/1.1/instrument/mca_0")).unwrap().unwrap();
        tree.create_link(&path!("/1.1/measurement/mca_0/data"), LinkTarget::Hard(data))
            .unwrap();
        tree.create_link(&path!("/1.1/measurement/mca_0/info"), LinkTarget::Hard(group))
            .unwrap();

        let seen = collect(&tree);
        assert!(seen.contains(&(
            "/1.1/measurement/mca_0/data".to_string(),
            "link-dataset /1.1/instrument/mca_0/data".to_string()
        )));
        assert!(seen.contains(&(
            "/1.1/measurement/mca_0/info".to_string(),
            "link-group /1.1/instrument/mca_0".to_string()
        )));
        // Nothing is visited below a linked group.
        assert!(!seen
            .iter()
            .any(|(p, _)| p.starts_with("/1.1/measurement/mca_0/info/")));
    }

    #[test]
    fn soft_links_are_links_and_dangling_ones_are_skipped() {
        let mut tree = TreeFile::new();
        tree.create_group(&path!("/g")).unwrap();
        tree.create_link(&path!("/to_g"), LinkTarget::Soft(&path!("/g")))
            .unwrap();
        tree.create_link(&path!("/nowhere"), LinkTarget::Soft(&path!("/missing")))
            .unwrap();

        assert_eq!(
            collect(&tree),
            vec![
                ("/g".to_string(), "group".to_string()),
                ("/to_g".to_string(), "link-group /g".to_string()),
            ]
        );
    }
}
