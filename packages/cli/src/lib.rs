//! # spectree-cli
//!
//! Command line front end for `spectree-convert`.
//!
//! ## Usage
//!
//! ```bash
//! # New file, refusing to replace an existing one
//! spectree convert scans.dat scans.h5
//!
//! # Add scans below /entry of an existing file, replacing datasets
//! spectree write scans.dat scans.h5 --h5path /entry --overwrite \
//!     --dataset-option compression='"gzip"'
//!
//! # Show the result
//! spectree ls scans.h5
//! ```

use std::fmt::Write as _;
use std::path::PathBuf;

use clap::{ArgAction, Args, Parser, Subcommand};
use spectree_convert::{
    convert, write_spec_to_tree, ConversionReport, ConvertError, ConvertOptions, Source, Target,
    WriteOptions,
};
use spectree_core::{DatasetOptions, FileMode, LinkKind};
use spectree_h5::H5File;

/// Convert SPEC data files into HDF5 files
#[derive(Parser, Debug)]
#[command(name = "spectree")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Increase log output (-v info, -vv debug). RUST_LOG takes precedence.
    #[arg(short, long, action = ArgAction::Count, global = true)]
    pub verbose: u8,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Write all scans of a SPEC file into a new HDF5 file
    Convert {
        /// SPEC file to read
        spec: PathBuf,
        /// HDF5 file to create
        output: PathBuf,
        /// "w" replaces an existing file, "w-" refuses to
        #[arg(long, default_value = "w-")]
        mode: FileMode,
        #[command(flatten)]
        links: LinkArgs,
    },
    /// Write all scans of a SPEC file into a new or existing HDF5 file
    Write {
        spec: PathBuf,
        output: PathBuf,
        /// Group under which scans are written
        #[arg(long, default_value = "/")]
        h5path: String,
        /// One of r+, w, w-, a
        #[arg(long, default_value = "a")]
        mode: FileMode,
        /// Replace existing datasets and links
        #[arg(long)]
        overwrite: bool,
        #[command(flatten)]
        links: LinkArgs,
    },
    /// List the members of an HDF5 file
    Ls {
        file: PathBuf,
    },
}

#[derive(Args, Debug)]
pub struct LinkArgs {
    /// How MCA aliases are linked: hard or soft
    #[arg(long = "link-type", default_value = "hard")]
    pub link_type: LinkKind,

    /// Dataset creation option as key=value, the value parsed as JSON when
    /// possible. Repeatable.
    #[arg(long = "dataset-option", value_parser = parse_dataset_option)]
    pub dataset_options: Vec<(String, serde_json::Value)>,
}

impl LinkArgs {
    fn dataset_options(&self) -> DatasetOptions {
        self.dataset_options.iter().cloned().collect()
    }
}

#[derive(thiserror::Error, Debug)]
pub enum CliError {
    #[error(transparent)]
    Convert(#[from] ConvertError),

    #[error(transparent)]
    Tree(#[from] spectree_core::Error),
}

/// `key=value`, with `value` taken as JSON or else as a plain string.
pub fn parse_dataset_option(arg: &str) -> Result<(String, serde_json::Value), String> {
    let (key, value) = arg
        .split_once('=')
        .ok_or_else(|| format!("expected key=value, got {:?}", arg))?;
    let key = key.trim();
    if key.is_empty() {
        return Err(format!("missing option name in {:?}", arg));
    }
    let value = serde_json::from_str(value)
        .unwrap_or_else(|_| serde_json::Value::String(value.to_string()));
    Ok((key.to_string(), value))
}

/// Log level for a `-v` count.
pub fn log_level(verbose: u8) -> log::LevelFilter {
    match verbose {
        0 => log::LevelFilter::Warn,
        1 => log::LevelFilter::Info,
        _ => log::LevelFilter::Debug,
    }
}

/// Run one command and return what should be printed on stdout.
pub fn run(cli: &Cli) -> Result<String, CliError> {
    match &cli.command {
        Command::Convert {
            spec,
            output,
            mode,
            links,
        } => {
            let options = ConvertOptions::default()
                .file_mode(*mode)
                .link_kind(links.link_type)
                .dataset_options(links.dataset_options());
            let report = convert(Source::Path(spec), output, &options)?;
            log::info!("Converted {} into {}", spec.display(), output.display());
            Ok(summary(&report))
        }
        Command::Write {
            spec,
            output,
            h5path,
            mode,
            overwrite,
            links,
        } => {
            let options = WriteOptions::default()
                .h5path(h5path.as_str())
                .file_mode(*mode)
                .overwrite(*overwrite)
                .link_kind(links.link_type)
                .dataset_options(links.dataset_options());
            let report = write_spec_to_tree(Source::Path(spec), Target::Path(output), &options)?;
            log::info!("Wrote {} into {} at {}", spec.display(), output.display(), h5path);
            Ok(summary(&report))
        }
        Command::Ls { file } => {
            let file = H5File::open_read(file)?;
            Ok(file.listing()?)
        }
    }
}

fn summary(report: &ConversionReport) -> String {
    let mut out = String::new();
    let _ = writeln!(
        out,
        "{} groups, {} datasets, {} links created",
        report.groups_created, report.datasets_created, report.links_created
    );
    if report.datasets_overwritten + report.links_overwritten > 0 {
        let _ = writeln!(
            out,
            "{} datasets, {} links overwritten",
            report.datasets_overwritten, report.links_overwritten
        );
    }
    if report.datasets_skipped + report.links_skipped > 0 {
        let _ = writeln!(
            out,
            "{} datasets, {} links already present",
            report.datasets_skipped, report.links_skipped
        );
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn cli_definition_is_consistent() {
        Cli::command().debug_assert();
    }

    #[test]
    fn dataset_option_values_are_json_or_text() {
        assert_eq!(
            parse_dataset_option("compression_opts=4").unwrap(),
            ("compression_opts".to_string(), serde_json::json!(4))
        );
        assert_eq!(
            parse_dataset_option("compression=gzip").unwrap(),
            ("compression".to_string(), serde_json::json!("gzip"))
        );
        assert_eq!(
            parse_dataset_option("chunks=[1,2]").unwrap().1,
            serde_json::json!([1, 2])
        );
        assert!(parse_dataset_option("compression").is_err());
        assert!(parse_dataset_option("=4").is_err());
    }

    #[test]
    fn convert_defaults() {
        let cli = Cli::try_parse_from(["spectree", "convert", "in.dat", "out.h5"]).unwrap();
        match cli.command {
            Command::Convert { mode, links, .. } => {
                assert_eq!(mode, FileMode::Exclusive);
                assert_eq!(links.link_type, LinkKind::Hard);
                assert!(links.dataset_options().is_empty());
            }
            other => panic!("unexpected command {:?}", other),
        }
    }

    #[test]
    fn write_flags() {
        let cli = Cli::try_parse_from([
            "spectree",
            "-vv",
            "write",
            "in.dat",
            "out.h5",
            "--h5path",
            "/entry",
            "--mode",
            "r+",
            "--overwrite",
            "--link-type",
            "soft",
            "--dataset-option",
            "compression=gzip",
            "--dataset-option",
            "shuffle=true",
        ])
        .unwrap();
        assert_eq!(log_level(cli.verbose), log::LevelFilter::Debug);
        match cli.command {
            Command::Write {
                h5path,
                mode,
                overwrite,
                links,
                ..
            } => {
                assert_eq!(h5path, "/entry");
                assert_eq!(mode, FileMode::ReadWrite);
                assert!(overwrite);
                assert_eq!(links.link_type, LinkKind::Soft);
                let options = links.dataset_options();
                assert_eq!(options.get("shuffle"), Some(&serde_json::json!(true)));
                assert_eq!(options.len(), 2);
            }
            other => panic!("unexpected command {:?}", other),
        }
    }

    #[test]
    fn unknown_link_type_is_rejected_by_parser() {
        let result =
            Cli::try_parse_from(["spectree", "convert", "a", "b", "--link-type", "symbolic"]);
        assert!(result.is_err());
    }

    #[test]
    fn summary_mentions_skips_only_when_present() {
        let report = ConversionReport {
            datasets_created: 3,
            ..Default::default()
        };
        assert_eq!(summary(&report), "0 groups, 3 datasets, 0 links created\n");

        let report = ConversionReport {
            datasets_skipped: 2,
            links_skipped: 1,
            ..Default::default()
        };
        assert!(summary(&report).contains("2 datasets, 1 links already present"));
    }
}
