//! Line-oriented reader for SPEC data files.
//!
//! A SPEC file is a sequence of blocks. File header lines (`#F`, `#E`, `#D`,
//! `#O0`, ...) describe the session; each scan starts with `#S <number>
//! <command>`, carries its own `#` header lines, numeric data rows, and
//! optional multichannel analyser spectra on `@A` lines. A blank line ends a
//! scan.

use std::collections::HashMap;
use std::fs;
use std::path::Path as FsPath;

use lazy_static::lazy_static;
use regex::Regex;

use crate::error::SpecFileError;

lazy_static! {
    static ref HEADER_LINE: Regex = Regex::new(r"^#(\S+)\s*(.*)$").unwrap();
    static ref MOTOR_KEY: Regex = Regex::new(r"^([OP])[0-9]+$").unwrap();
    // Labels and motor names may contain single spaces.
    static ref NAME_SEPARATOR: Regex = Regex::new(r"\s{2,}").unwrap();
}

/// `#@CHANN <count> <first> <last> <reduction>`
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct McaChannels {
    pub first: f64,
    pub reduction: f64,
}

/// One `#S` block.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct Scan {
    /// Scan number from the `#S` line.
    pub number: u32,
    /// 1 for the first scan with this number, 2 for the second, ...
    pub order: u32,
    /// The command text following the scan number.
    pub command: String,
    /// First `#D` line of the scan.
    pub date: Option<String>,
    /// Header lines of the file block this scan belongs to.
    pub file_header: Vec<String>,
    /// Header lines of the scan, starting with `#S`.
    pub header: Vec<String>,
    /// Column labels from `#L`.
    pub labels: Vec<String>,
    /// Motor names from the file header `#O` lines.
    pub motor_names: Vec<String>,
    /// Motor positions from the scan `#P` lines.
    pub motor_positions: Vec<f64>,
    /// Data rows, all the same length.
    pub rows: Vec<Vec<f64>>,
    /// MCA spectra in file order.
    pub mca: Vec<Vec<f64>>,
    pub mca_calibration: Option<[f64; 3]>,
    pub mca_channels: Option<McaChannels>,
    /// Line number of the `#S` line.
    pub line: usize,
}

impl Scan {
    /// Key of the scan group, `<number>.<order>`.
    pub fn key(&self) -> String {
        format!("{}.{}", self.number, self.order)
    }

    /// Values of data column `index`.
    pub fn column(&self, index: usize) -> Vec<f64> {
        self.rows.iter().filter_map(|r| r.get(index).copied()).collect()
    }

    pub fn column_count(&self) -> usize {
        self.rows.first().map_or(0, Vec::len)
    }

    /// MCA spectra split per analyser.
    ///
    /// Spectra are interleaved: with `k` analysers, spectrum `i` belongs to
    /// analyser `i % k`. `k` is the number of spectra per data row, or 1 when
    /// the scan has no data rows.
    pub fn mca_spectra(&self) -> Result<Vec<Vec<Vec<f64>>>, SpecFileError> {
        if self.mca.is_empty() {
            return Ok(Vec::new());
        }

        let per_point = if self.rows.is_empty() {
            1
        } else if self.mca.len() % self.rows.len() == 0 {
            self.mca.len() / self.rows.len()
        } else {
            return Err(SpecFileError::parse(
                self.line,
                format!(
                    "scan {} has {} MCA spectra for {} data rows",
                    self.key(),
                    self.mca.len(),
                    self.rows.len()
                ),
            ));
        };

        let mut analysers = vec![Vec::new(); per_point];
        for (i, spectrum) in self.mca.iter().enumerate() {
            analysers[i % per_point].push(spectrum.clone());
        }

        for (index, spectra) in analysers.iter().enumerate() {
            let channels = spectra[0].len();
            if spectra.iter().any(|s| s.len() != channels) {
                return Err(SpecFileError::parse(
                    self.line,
                    format!(
                        "scan {} has MCA {} spectra of different lengths",
                        self.key(),
                        index
                    ),
                ));
            }
        }
        Ok(analysers)
    }
}

/// A parsed SPEC file.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct SpecFile {
    scans: Vec<Scan>,
}

impl SpecFile {
    /// Read and parse the file at `path`.
    pub fn open(path: impl AsRef<FsPath>) -> Result<Self, SpecFileError> {
        let path = path.as_ref();
        log::debug!("Reading {}...", path.display());
        let text = fs::read_to_string(path).map_err(|source| SpecFileError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Self::parse(&text)
    }

    /// Parse SPEC text.
    ///
    /// ```rust
    /// use spectree_specfile::SpecFile;
    ///
    /// let spec = SpecFile::parse("#F demo\n\n#S 1 ascan th 0 1 2 1\n#L th  det\n0 10\n1 12\n").unwrap();
    /// assert_eq!(spec.scans()[0].key(), "1.1");
    /// assert_eq!(spec.scans()[0].column(1), vec![10.0, 12.0]);
    /// ```
    pub fn parse(text: &str) -> Result<Self, SpecFileError> {
        let mut parser = Parser::default();
        for (index, line) in text.lines().enumerate() {
            parser.line(index + 1, line)?;
        }
        Ok(parser.finish())
    }

    pub fn scans(&self) -> &[Scan] {
        &self.scans
    }

    /// Look up a scan by its `<number>.<order>` key.
    pub fn scan(&self, key: &str) -> Option<&Scan> {
        self.scans.iter().find(|s| s.key() == key)
    }

    pub fn len(&self) -> usize {
        self.scans.len()
    }

    pub fn is_empty(&self) -> bool {
        self.scans.is_empty()
    }
}

#[derive(Default)]
struct Parser {
    file_header: Vec<String>,
    motor_names: Vec<String>,
    current: Option<Scan>,
    /// An `@A` spectrum continued with a trailing backslash.
    pending_mca: Option<Vec<f64>>,
    occurrences: HashMap<u32, u32>,
    scans: Vec<Scan>,
}

impl Parser {
    fn line(&mut self, number: usize, raw: &str) -> Result<(), SpecFileError> {
        let line = raw.trim_end();

        if let Some(mut values) = self.pending_mca.take() {
            let (body, continues) = split_continuation(line);
            values.extend(parse_numbers(body, number)?);
            if continues {
                self.pending_mca = Some(values);
            } else {
                self.push_mca(values);
            }
            return Ok(());
        }

        if line.trim().is_empty() {
            self.end_scan();
        } else if let Some(rest) = line.strip_prefix("@A") {
            let (body, continues) = split_continuation(rest);
            let values = parse_numbers(body, number)?;
            if self.current.is_none() {
                log::debug!("Ignoring MCA spectrum outside of a scan at line {}", number);
            } else if continues {
                self.pending_mca = Some(values);
            } else {
                self.push_mca(values);
            }
        } else if line.starts_with('#') {
            self.header_line(number, line)?;
        } else {
            self.data_line(number, line)?;
        }
        Ok(())
    }

    fn header_line(&mut self, number: usize, line: &str) -> Result<(), SpecFileError> {
        let (key, value) = match HEADER_LINE.captures(line) {
            Some(caps) => (
                caps.get(1).map_or("", |m| m.as_str()),
                caps.get(2).map_or("", |m| m.as_str().trim()),
            ),
            None => ("", ""),
        };

        match key {
            "F" => {
                self.end_scan();
                self.file_header = vec![line.to_string()];
                self.motor_names.clear();
            }
            "S" => {
                self.end_scan();
                self.start_scan(number, line, value)?;
            }
            _ => match self.current.as_mut() {
                Some(scan) => {
                    scan.header.push(line.to_string());
                    scan_header_entry(scan, number, key, value)?;
                }
                None => {
                    self.file_header.push(line.to_string());
                    if MOTOR_KEY.is_match(key) && key.starts_with('O') {
                        self.motor_names.extend(split_names(value));
                    }
                }
            },
        }
        Ok(())
    }

    fn start_scan(&mut self, number: usize, line: &str, value: &str) -> Result<(), SpecFileError> {
        let mut parts = value.splitn(2, char::is_whitespace);
        let scan_number: u32 = parts
            .next()
            .and_then(|n| n.parse().ok())
            .ok_or_else(|| SpecFileError::parse(number, format!("invalid scan number in '{}'", line)))?;
        let command = parts.next().unwrap_or("").trim().to_string();

        let order = self.occurrences.entry(scan_number).or_insert(0);
        *order += 1;

        self.current = Some(Scan {
            number: scan_number,
            order: *order,
            command,
            file_header: self.file_header.clone(),
            header: vec![line.to_string()],
            motor_names: self.motor_names.clone(),
            line: number,
            ..Scan::default()
        });
        Ok(())
    }

    fn data_line(&mut self, number: usize, line: &str) -> Result<(), SpecFileError> {
        let Some(scan) = self.current.as_mut() else {
            log::debug!("Ignoring line {} outside of a scan", number);
            return Ok(());
        };
        let row = parse_numbers(line, number)?;
        if let Some(first) = scan.rows.first() {
            if first.len() != row.len() {
                return Err(SpecFileError::parse(
                    number,
                    format!("expected {} values, found {}", first.len(), row.len()),
                ));
            }
        }
        scan.rows.push(row);
        Ok(())
    }

    fn push_mca(&mut self, values: Vec<f64>) {
        if let Some(scan) = self.current.as_mut() {
            scan.mca.push(values);
        }
    }

    fn end_scan(&mut self) {
        if let Some(values) = self.pending_mca.take() {
            self.push_mca(values);
        }
        if let Some(scan) = self.current.take() {
            self.scans.push(scan);
        }
    }

    fn finish(mut self) -> SpecFile {
        self.end_scan();
        SpecFile { scans: self.scans }
    }
}

fn scan_header_entry(
    scan: &mut Scan,
    number: usize,
    key: &str,
    value: &str,
) -> Result<(), SpecFileError> {
    match key {
        "D" => {
            if scan.date.is_none() {
                scan.date = Some(value.to_string());
            }
        }
        "L" => scan.labels = split_names(value),
        "@CALIB" => {
            let values = parse_numbers(value, number)?;
            let calibration: [f64; 3] = values.as_slice().try_into().map_err(|_| {
                SpecFileError::parse(number, "#@CALIB needs exactly 3 values")
            })?;
            scan.mca_calibration = Some(calibration);
        }
        "@CHANN" => {
            let values = parse_numbers(value, number)?;
            if values.len() < 4 {
                return Err(SpecFileError::parse(number, "#@CHANN needs 4 values"));
            }
            scan.mca_channels = Some(McaChannels {
                first: values[1],
                reduction: values[3],
            });
        }
        k if MOTOR_KEY.is_match(k) && k.starts_with('P') => {
            scan.motor_positions.extend(parse_numbers(value, number)?);
        }
        _ => {}
    }
    Ok(())
}

fn split_names(value: &str) -> Vec<String> {
    NAME_SEPARATOR
        .split(value.trim())
        .filter(|s| !s.is_empty())
        .map(str::to_string)
        .collect()
}

fn split_continuation(line: &str) -> (&str, bool) {
    let trimmed = line.trim_end();
    match trimmed.strip_suffix('\\') {
        Some(body) => (body, true),
        None => (trimmed, false),
    }
}

fn parse_numbers(text: &str, line: usize) -> Result<Vec<f64>, SpecFileError> {
    text.split_whitespace()
        .map(|token| {
            token
                .parse::<f64>()
                .map_err(|_| SpecFileError::parse(line, format!("'{}' is not a number", token)))
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    const SAMPLE: &str = "\
#F /tmp/sample.dat
#E 1455180875
#D Thu Feb 11 09:54:35 2016
#O0 Pslit HGap  MRTSlit UP  MRTSlit DOWN

#S 25  ascan  c3th 1.33245 1.52245  40 0.15
#D Thu Feb 11 10:00:31 2016
#P0 1.0 2.0 3.0
#N 3
#@CALIB 1 2 3
#@CHANN 3 0 2 1
#L MRTSlit UP  second column  3rd_col
-1.23 5.89  8
8.478100E+01  5 1.56
@A 0 1 2
@A 10 \\
 11 12
3.14 2.72 -1

#S 1 aaaaaa
#L a  b
1 2
";

    #[test]
    fn parses_scans_and_headers() {
        let spec = SpecFile::parse(SAMPLE).unwrap();
        assert_eq!(spec.len(), 2);

        let scan = &spec.scans()[0];
        assert_eq!(scan.key(), "25.1");
        assert_eq!(scan.command, "ascan  c3th 1.33245 1.52245  40 0.15");
        assert_eq!(scan.date.as_deref(), Some("Thu Feb 11 10:00:31 2016"));
        assert_eq!(scan.file_header.len(), 4);
        assert_eq!(scan.header.len(), 7);
        assert_eq!(
            scan.labels,
            vec!["MRTSlit UP", "second column", "3rd_col"]
        );
        assert_eq!(
            scan.motor_names,
            vec!["Pslit HGap", "MRTSlit UP", "MRTSlit DOWN"]
        );
        assert_eq!(scan.motor_positions, vec![1.0, 2.0, 3.0]);
        assert_eq!(scan.rows.len(), 3);
        assert_eq!(scan.column(0), vec![-1.23, 84.781, 3.14]);
        assert_eq!(scan.mca_calibration, Some([1.0, 2.0, 3.0]));
        assert_eq!(
            scan.mca_channels,
            Some(McaChannels {
                first: 0.0,
                reduction: 1.0
            })
        );
    }

    #[test]
    fn continued_mca_lines_are_joined() {
        let spec = SpecFile::parse(SAMPLE).unwrap();
        let scan = &spec.scans()[0];
        assert_eq!(scan.mca, vec![vec![0.0, 1.0, 2.0], vec![10.0, 11.0, 12.0]]);
    }

    #[test]
    fn mca_count_must_divide_rows() {
        let spec = SpecFile::parse(SAMPLE).unwrap();
        let err = spec.scans()[0].mca_spectra().unwrap_err();
        assert!(matches!(err, SpecFileError::Parse { line: 6, .. }));
    }

    #[test]
    fn mca_spectra_are_interleaved() {
        let text = "#S 1 ct\n#L t\n1\n@A 1 1\n@A 2 2\n2\n@A 3 3\n@A 4 4\n";
        let spec = SpecFile::parse(text).unwrap();
        let analysers = spec.scans()[0].mca_spectra().unwrap();
        assert_eq!(analysers.len(), 2);
        assert_eq!(analysers[0], vec![vec![1.0, 1.0], vec![3.0, 3.0]]);
        assert_eq!(analysers[1], vec![vec![2.0, 2.0], vec![4.0, 4.0]]);
    }

    #[test]
    fn repeated_scan_numbers_get_increasing_order() {
        let text = "#S 3 a\n1\n\n#S 3 b\n2\n\n#S 4 c\n3\n";
        let spec = SpecFile::parse(text).unwrap();
        let keys: Vec<String> = spec.scans().iter().map(Scan::key).collect();
        assert_eq!(keys, vec!["3.1", "3.2", "4.1"]);
        assert_eq!(spec.scan("3.2").unwrap().command, "b");
    }

    #[test]
    fn invalid_scan_number_is_reported() {
        let err = SpecFile::parse("#F x\n#S abc ascan\n").unwrap_err();
        assert!(matches!(err, SpecFileError::Parse { line: 2, .. }));
    }

    #[test]
    fn non_numeric_data_is_reported() {
        let err = SpecFile::parse("#S 1 a\n1 2\n3 x\n").unwrap_err();
        match err {
            SpecFileError::Parse { line, message } => {
                assert_eq!(line, 3);
                assert!(message.contains("'x'"));
            }
            other => panic!("unexpected error {:?}", other),
        }
    }

    #[test]
    fn ragged_rows_are_reported() {
        let err = SpecFile::parse("#S 1 a\n1 2\n3\n").unwrap_err();
        assert!(matches!(err, SpecFileError::Parse { line: 3, .. }));
    }

    #[test]
    fn new_file_header_resets_motor_names() {
        let text = "#F a\n#O0 m1  m2\n\n#S 1 a\n#P0 1 2\n\n#F b\n#O0 m3\n\n#S 2 b\n#P0 3\n";
        let spec = SpecFile::parse(text).unwrap();
        assert_eq!(spec.scans()[0].motor_names, vec!["m1", "m2"]);
        assert_eq!(spec.scans()[1].motor_names, vec!["m3"]);
        assert_eq!(spec.scans()[1].file_header, vec!["#F b", "#O0 m3"]);
    }

    #[test]
    fn lines_outside_scans_are_ignored() {
        let spec = SpecFile::parse("1 2 3\n@A 1 2\n").unwrap();
        assert!(spec.is_empty());
    }
}
