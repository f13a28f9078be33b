//! Derived alias names for MCA members.
//!
//! Scan trees keep MCA data under `instrument`; readers expect it under
//! `measurement` as well:
//!
//! ```text
//! .../<n>.<m>/measurement/mca_<i>/data  ->  .../<n>.<m>/instrument/mca_<i>/data
//! .../<n>.<m>/measurement/mca_<i>/info  ->  .../<n>.<m>/instrument/mca_<i>
//! ```
//!
//! Matching works on path components, so only the `instrument` component in
//! that exact position is replaced.

use spectree_core::Path;

const INSTRUMENT: &str = "instrument";
const MEASUREMENT: &str = "measurement";

/// Alias for an MCA data dataset: `.../S.S/instrument/mca_N/data`.
pub fn mca_data_alias(path: &Path) -> Option<Path> {
    let n = path.len();
    if n < 4 || path[n - 1] != "data" {
        return None;
    }
    measurement_twin(path, n - 4)
}

/// Alias for an MCA group: `.../S.S/instrument/mca_N`.
pub fn mca_info_alias(path: &Path) -> Option<Path> {
    let n = path.len();
    if n < 3 {
        return None;
    }
    let mut alias = measurement_twin(path, n - 3)?;
    alias.components.push("info".to_string());
    Some(alias)
}

/// Checks `<scan>/instrument/mca_<i>` starting at `scan`, and returns the
/// path with that `instrument` replaced by `measurement`.
fn measurement_twin(path: &Path, scan: usize) -> Option<Path> {
    if !is_scan_key(&path[scan]) || path[scan + 1] != INSTRUMENT || !is_mca_name(&path[scan + 2]) {
        return None;
    }
    let mut alias = path.clone();
    alias.components[scan + 1] = MEASUREMENT.to_string();
    Some(alias)
}

fn is_digits(s: &str) -> bool {
    !s.is_empty() && s.bytes().all(|b| b.is_ascii_digit())
}

/// `<digits>.<digits>`
fn is_scan_key(s: &str) -> bool {
    s.split_once('.')
        .is_some_and(|(number, order)| is_digits(number) && is_digits(order))
}

/// `mca_<digits>`
fn is_mca_name(s: &str) -> bool {
    s.strip_prefix("mca_").is_some_and(is_digits)
}
