//! Copying a source tree into a container.

use std::path::Path as FsPath;

use spectree_core::{
    Container, Dataset, Error as TreeError, LinkKind, LinkTarget, ObjectId, Path,
    SourceNode, SourceTree,
};
use spectree_h5::{Filters, H5File};
use spectree_specfile::SpecFile;

use crate::alias::{mca_data_alias, mca_info_alias};
use crate::error::ConvertError;
use crate::options::{ConvertOptions, WriteOptions};

/// Where scans are read from.
#[derive(Clone, Copy)]
pub enum Source<'a> {
    /// A SPEC file on disk, parsed for the duration of the call.
    Path(&'a FsPath),
    /// An already open tree. Borrowed, never closed.
    Tree(&'a dyn SourceTree),
}

/// Where scans are written to.
pub enum Target<'a> {
    /// An HDF5 file on disk, opened with the configured file mode and closed
    /// when the conversion succeeds.
    Path(&'a FsPath),
    /// An already open container. Borrowed, never closed.
    Container(&'a mut dyn Container),
}

/// What a conversion did.
///
/// Collisions are not errors: they are logged as warnings and counted here.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct ConversionReport {
    pub groups_created: usize,
    pub datasets_created: usize,
    pub datasets_overwritten: usize,
    pub datasets_skipped: usize,
    pub links_created: usize,
    pub links_overwritten: usize,
    pub links_skipped: usize,
    /// Link nodes of the source, which are never copied.
    pub source_links_ignored: usize,
}

/// Write every member of `source` into `target` below `options.h5path`.
///
/// Existing groups are reused. Existing datasets and links are skipped, or
/// replaced when `options.overwrite` is set. MCA data and MCA groups written
/// under `<scan>/instrument/mca_<i>` get aliases under
/// `<scan>/measurement/mca_<i>`.
///
/// Configuration problems, including unsupported dataset options for a file
/// target, are reported before any file is opened. Errors from the source or
/// the target stop the conversion. Whatever was already written stays in the
/// target; nothing is rolled back.
pub fn write_spec_to_tree(
    source: Source<'_>,
    target: Target<'_>,
    options: &WriteOptions,
) -> Result<ConversionReport, ConvertError> {
    let mount = Path::parse(&options.h5path)
        .map_err(|err| ConvertError::config(format!("invalid h5path {:?}: {}", options.h5path, err)))?;
    if let Target::Path(_) = target {
        Filters::from_options(Some(&options.dataset_options))?;
    }

    let parsed;
    let source: &dyn SourceTree = match source {
        Source::Path(path) => {
            parsed = SpecFile::open(path)?.to_tree()?;
            &parsed
        }
        Source::Tree(tree) => tree,
    };

    match target {
        Target::Container(container) => write_tree(source, container, &mount, options),
        Target::Path(path) => {
            let mut file = H5File::open(path, options.file_mode)?;
            let report = write_tree(source, &mut file, &mount, options)?;
            file.close()?;
            Ok(report)
        }
    }
}

/// Write `source` into a new HDF5 file at `target`.
///
/// Only the `w` and `w-` modes are accepted: scans land at the root and
/// nothing is overwritten.
pub fn convert(
    source: Source<'_>,
    target: &FsPath,
    options: &ConvertOptions,
) -> Result<ConversionReport, ConvertError> {
    if !options.file_mode.creates_new() {
        return Err(ConvertError::config(format!(
            "invalid file mode {:?} for conversion, expected \"w\" or \"w-\"",
            options.file_mode.to_string()
        )));
    }

    let write_options = WriteOptions::default()
        .file_mode(options.file_mode)
        .link_kind(options.link_kind)
        .dataset_options(options.dataset_options.clone());
    write_spec_to_tree(source, Target::Path(target), &write_options)
}

fn write_tree(
    source: &dyn SourceTree,
    target: &mut dyn Container,
    mount: &Path,
    options: &WriteOptions,
) -> Result<ConversionReport, ConvertError> {
    let mut writer = Writer {
        target,
        mount,
        options,
        report: ConversionReport::default(),
    };
    source.visit_items(&mut |path, node| writer.write_node(path, node))?;
    log::debug!("Conversion finished: {:?}", writer.report);
    Ok(writer.report)
}

struct Writer<'w> {
    target: &'w mut dyn Container,
    mount: &'w Path,
    options: &'w WriteOptions,
    report: ConversionReport,
}

impl Writer<'_> {
    fn write_node(&mut self, path: &Path, node: SourceNode<'_>) -> Result<(), TreeError> {
        let target_path = self.mount.join(path);
        match node {
            SourceNode::Group => self.write_group(&target_path),
            SourceNode::Dataset(dataset) => self.write_dataset(&target_path, dataset),
            SourceNode::LinkToGroup(to) | SourceNode::LinkToDataset(to) => {
                log::debug!("Ignoring source link {} -> {}", path, to);
                self.report.source_links_ignored += 1;
                Ok(())
            }
        }
    }

    fn write_group(&mut self, path: &Path) -> Result<(), TreeError> {
        let id = if self.target.contains(path)? {
            if !self.target.is_group(path)? {
                return Err(TreeError::NotAGroup { path: path.clone() });
            }
            match self.target.object_id(path)? {
                Some(id) => id,
                None => return Err(TreeError::NotFound { path: path.clone() }),
            }
        } else {
            log::debug!("Creating group {}", path);
            self.report.groups_created += 1;
            self.target.create_group(path)?
        };

        if let Some(alias) = mca_info_alias(path) {
            self.link(&alias, path, id)?;
        }
        Ok(())
    }

    fn write_dataset(&mut self, path: &Path, dataset: &Dataset) -> Result<(), TreeError> {
        if self.target.contains(path)? {
            if !self.options.overwrite {
                log::warn!("Ignoring existing dataset {}", path);
                self.report.datasets_skipped += 1;
                return Ok(());
            }
            log::warn!("Overwriting dataset {}", path);
            self.target.delete(path)?;
            self.report.datasets_overwritten += 1;
        } else {
            self.report.datasets_created += 1;
        }

        // Creation options only apply to arrays.
        let dataset_options = if dataset.is_scalar() || self.options.dataset_options.is_empty() {
            None
        } else {
            Some(&self.options.dataset_options)
        };
        log::debug!("Creating dataset {}", path);
        let id = self.target.create_dataset(path, dataset, dataset_options)?;

        if let Some(alias) = mca_data_alias(path) {
            self.link(&alias, path, id)?;
        }
        Ok(())
    }

    /// Create `alias` pointing at the object just written at `to`.
    fn link(&mut self, alias: &Path, to: &Path, id: ObjectId) -> Result<(), TreeError> {
        if self.target.contains(alias)? {
            if !self.options.overwrite {
                log::warn!("Ignoring existing link {}", alias);
                self.report.links_skipped += 1;
                return Ok(());
            }
            log::warn!("Overwriting link {}", alias);
            self.target.delete(alias)?;
            self.report.links_overwritten += 1;
        } else {
            self.report.links_created += 1;
        }

        log::debug!("Creating {:?} link {} -> {}", self.options.link_kind, alias, to);
        let target = match self.options.link_kind {
            LinkKind::Hard => LinkTarget::Hard(id),
            LinkKind::Soft => LinkTarget::Soft(to),
        };
        self.target.create_link(alias, target)
    }
}
