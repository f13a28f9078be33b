//! Mapping parsed scans onto the tree layout.
//!
//! ```text
//! /<n>.<order>/
//!     title, start_time
//!     instrument/
//!         specfile/file_header, specfile/scan_header
//!         positioners/<motor>
//!         mca_<i>/data, mca_<i>/calibration, mca_<i>/channels
//!     measurement/
//!         <label>
//!         mca_<i>/data -> instrument/mca_<i>/data
//!         mca_<i>/info -> instrument/mca_<i>
//! ```

use spectree_core::{Container, Dataset, LinkTarget, Path};
use spectree_store::TreeFile;

use crate::error::SpecFileError;
use crate::parser::{Scan, SpecFile};

impl SpecFile {
    /// Build the in-memory tree for every scan.
    pub fn to_tree(&self) -> Result<TreeFile, SpecFileError> {
        let mut tree = TreeFile::new();
        for scan in self.scans() {
            write_scan(&mut tree, scan)?;
        }
        Ok(tree)
    }
}

fn write_scan(tree: &mut TreeFile, scan: &Scan) -> Result<(), SpecFileError> {
    let root = Path::root().child(&scan.key())?;
    tree.create_group(&root)?;

    tree.create_dataset(&root.child("title")?, &Dataset::from(scan.command.as_str()), None)?;
    let start_time = scan.date.clone().unwrap_or_default();
    tree.create_dataset(&root.child("start_time")?, &Dataset::from(start_time), None)?;

    let instrument = root.child("instrument")?;
    let specfile = instrument.child("specfile")?;
    tree.create_dataset(
        &specfile.child("file_header")?,
        &Dataset::from(scan.file_header.clone()),
        None,
    )?;
    tree.create_dataset(
        &specfile.child("scan_header")?,
        &Dataset::from(scan.header.clone()),
        None,
    )?;

    let positioners = instrument.child("positioners")?;
    tree.create_group(&positioners)?;
    if scan.motor_names.len() != scan.motor_positions.len() {
        log::warn!(
            "Scan {} has {} motor names but {} positions",
            scan.key(),
            scan.motor_names.len(),
            scan.motor_positions.len()
        );
    }
    for (name, position) in scan.motor_names.iter().zip(&scan.motor_positions) {
        let path = positioners.child(&member_name(name, "motor"))?;
        create_unique(tree, &path, &Dataset::from(*position))?;
    }

    let mca_spectra = scan.mca_spectra()?;
    let measurement = root.child("measurement")?;
    tree.create_group(&measurement)?;
    for index in 0..scan.column_count() {
        let fallback = format!("column_{}", index);
        let label = scan.labels.get(index).map_or(fallback.as_str(), String::as_str);
        let mut name = member_name(label, &fallback);
        // mca_<i> under measurement holds the MCA aliases.
        if is_mca_alias_name(&name, mca_spectra.len()) {
            log::warn!(
                "Scan {} column {:?} clashes with an MCA alias, stored as {}",
                scan.key(),
                name,
                fallback
            );
            name = fallback;
        }
        let path = measurement.child(&name)?;
        create_unique(tree, &path, &Dataset::from(scan.column(index)))?;
    }

    let calibration = scan.mca_calibration.unwrap_or([0.0, 1.0, 0.0]);
    for (index, spectra) in mca_spectra.iter().enumerate() {
        let name = format!("mca_{}", index);
        let mca = instrument.child(&name)?;
        let group = tree.create_group(&mca)?;
        let data = tree.create_dataset(&mca.child("data")?, &Dataset::from_rows(spectra)?, None)?;
        tree.create_dataset(&mca.child("calibration")?, &Dataset::from(calibration.to_vec()), None)?;

        let (first, reduction) = scan
            .mca_channels
            .map_or((0.0, 1.0), |c| (c.first, c.reduction));
        let channels: Vec<f64> = (0..spectra[0].len())
            .map(|c| first + c as f64 * reduction)
            .collect();
        tree.create_dataset(&mca.child("channels")?, &Dataset::from(channels), None)?;

        let alias = measurement.child(&name)?;
        tree.create_link(&alias.child("data")?, LinkTarget::Hard(data))?;
        tree.create_link(&alias.child("info")?, LinkTarget::Hard(group))?;
    }

    Ok(())
}

/// Labels become member names; the separator is not allowed inside one.
fn member_name(label: &str, fallback: &str) -> String {
    let name = label.trim().replace('/', "_");
    if name.is_empty() || name == "." || name == ".." {
        fallback.to_string()
    } else {
        name
    }
}

fn is_mca_alias_name(name: &str, mca_count: usize) -> bool {
    (0..mca_count).any(|index| name == format!("mca_{}", index))
}

fn create_unique(tree: &mut TreeFile, path: &Path, dataset: &Dataset) -> Result<(), SpecFileError> {
    if tree.contains(path)? {
        log::warn!("Duplicate name {}, keeping the first value", path);
        return Ok(());
    }
    tree.create_dataset(path, dataset, None)?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use spectree_core::{path, Data};
    use spectree_store::LinkInfo;

    const SCAN: &str = "\
#F demo.dat
#O0 th  tth
#O1 I0/mon

#S 1 ascan th 0 1 2 1
#D Mon Mar 14 10:00:00 2016
#P0 1.5 3.0
#P1 7
#L th  det  det
0 10 11
1 12 13
@A 1 2 3
@A 4 5 6
";

    #[test]
    fn scan_layout_is_built() {
        let tree = SpecFile::parse(SCAN).unwrap().to_tree().unwrap();

        assert_eq!(
            tree.dataset(&path!("/1.1/title")).unwrap(),
            Some(&Dataset::from("ascan th 0 1 2 1"))
        );
        assert_eq!(
            tree.dataset(&path!("/1.1/start_time")).unwrap(),
            Some(&Dataset::from("Mon Mar 14 10:00:00 2016"))
        );
        assert_eq!(
            tree.dataset(&path!("/1.1/instrument/positioners/tth")).unwrap(),
            Some(&Dataset::from(3.0))
        );
        // '/' in a motor name is replaced.
        assert_eq!(
            tree.dataset(&path!("/1.1/instrument/positioners/I0_mon")).unwrap(),
            Some(&Dataset::from(7.0))
        );
        assert_eq!(
            tree.dataset(&path!("/1.1/measurement/det")).unwrap(),
            Some(&Dataset::from(vec![10.0, 12.0]))
        );
        assert_eq!(
            tree.dataset(&path!("/1.1/instrument/specfile/scan_header"))
                .unwrap()
                .map(Dataset::len),
            Some(5)
        );
    }

    #[test]
    fn mca_aliases_are_hard_links() {
        let tree = SpecFile::parse(SCAN).unwrap().to_tree().unwrap();

        let data = tree.dataset(&path!("/1.1/instrument/mca_0/data")).unwrap().unwrap();
        assert_eq!(data.shape(), &[2, 3]);
        assert_eq!(
            data.data(),
            &Data::Float(vec![1.0, 2.0, 3.0, 4.0, 5.0, 6.0])
        );
        assert_eq!(
            tree.dataset(&path!("/1.1/instrument/mca_0/calibration")).unwrap(),
            Some(&Dataset::from(vec![0.0, 1.0, 0.0]))
        );
        assert_eq!(
            tree.dataset(&path!("/1.1/instrument/mca_0/channels")).unwrap(),
            Some(&Dataset::from(vec![0.0, 1.0, 2.0]))
        );

        let target = tree.object_id(&path!("/1.1/instrument/mca_0/data")).unwrap().unwrap();
        assert_eq!(
            tree.link_info(&path!("/1.1/measurement/mca_0/data")).unwrap(),
            Some(LinkInfo::Hard(target))
        );
        let group = tree.object_id(&path!("/1.1/instrument/mca_0")).unwrap().unwrap();
        assert_eq!(
            tree.link_info(&path!("/1.1/measurement/mca_0/info")).unwrap(),
            Some(LinkInfo::Hard(group))
        );
    }

    #[test]
    fn duplicate_labels_keep_first_column() {
        let text = "#S 1 a\n#L x  x\n1 2\n";
        let tree = SpecFile::parse(text).unwrap().to_tree().unwrap();
        assert_eq!(
            tree.dataset(&path!("/1.1/measurement/x")).unwrap(),
            Some(&Dataset::from(vec![1.0]))
        );
    }

    #[test]
    fn unlabeled_columns_get_fallback_names() {
        let text = "#S 1 a\n#L x\n1 2\n";
        let tree = SpecFile::parse(text).unwrap().to_tree().unwrap();
        assert!(tree.contains(&path!("/1.1/measurement/column_1")).unwrap());
    }

    #[test]
    fn column_named_like_an_mca_alias_is_renamed() {
        let text = "#S 1 a\n#L x  mca_0  mca_1\n1 2 3\n@A 4 5\n";
        let tree = SpecFile::parse(text).unwrap().to_tree().unwrap();

        assert_eq!(
            tree.dataset(&path!("/1.1/measurement/column_1")).unwrap(),
            Some(&Dataset::from(vec![2.0]))
        );
        // Only one MCA, so mca_1 is free.
        assert_eq!(
            tree.dataset(&path!("/1.1/measurement/mca_1")).unwrap(),
            Some(&Dataset::from(vec![3.0]))
        );
        assert!(tree.is_group(&path!("/1.1/measurement/mca_0")).unwrap());
        assert!(tree
            .dataset(&path!("/1.1/measurement/mca_0/data"))
            .unwrap()
            .is_some());
    }

    #[test]
    fn member_name_replaces_separator() {
        assert_eq!(member_name("I0/mon", "x"), "I0_mon");
        assert_eq!(member_name("  ", "column_3"), "column_3");
        assert_eq!(member_name("..", "column_3"), "column_3");
    }
}
