//! Configuration settings for mclub
//!
//! Defines the CLI arguments, the per-run copy policy and the runtime
//! configuration derived from them.

use clap::{Parser, ValueEnum};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// mclub - gather files from many folders into one destination
#[derive(Parser, Debug, Clone)]
#[command(name = "mclub")]
#[command(version = env!("CARGO_PKG_VERSION"))]
#[command(about = "Consolidate files from multiple sources into a single destination")]
#[command(long_about = r#"
mclub copies files from several source folders (or individual files) into
one destination folder.

Before anything is written the total size of the selection is compared with
the free space on the destination volume; the run stops if it will not fit.

Examples:
  mclub ~/photos/2019 ~/photos/2020 -d /mnt/backup        # Keep full paths
  mclub /media/card/DCIM -d ~/pictures --flatten 3        # Drop 3 leading dirs
  mclub ./a ./b -d ./out --overwrite newer --progress     # Replace older copies
  mclub ./a -d ./out --flatten 10 --preview               # Show the mapping only
"#)]
pub struct CliArgs {
    /// Source files or directories to copy
    #[arg(value_name = "SOURCE", required = true)]
    pub sources: Vec<PathBuf>,

    /// Destination directory
    #[arg(short = 'd', long = "dest", env = "MCLUB_DEST", value_name = "DIR")]
    pub destination: Option<PathBuf>,

    /// Number of leading path segments to strip from each source path
    #[arg(short = 'f', long, default_value = "0", value_name = "N")]
    pub flatten: usize,

    /// Policy for destination files that already exist
    #[arg(short = 'o', long, value_enum, default_value = "never")]
    pub overwrite: OverwriteMode,

    /// What to do when flattening maps two sources onto one destination
    #[arg(long = "on-collision", value_enum, default_value = "rename")]
    pub on_collision: CollisionPolicy,

    /// Print the source -> destination mapping without copying
    #[arg(long)]
    pub preview: bool,

    /// Show progress bars
    #[arg(short = 'p', long)]
    pub progress: bool,

    /// Verbose output (can be repeated: -v, -vv)
    #[arg(short = 'v', long, action = clap::ArgAction::Count)]
    pub verbose: u8,

    /// Quiet mode (suppress non-error output)
    #[arg(short = 'q', long)]
    pub quiet: bool,

    /// Output format for the run summary
    #[arg(long, value_enum, default_value = "text")]
    pub output_format: OutputFormat,
}

/// Replacement policy for destination files that already exist
#[derive(ValueEnum, Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum OverwriteMode {
    /// Replace when the source was modified more recently
    Newer,
    /// Replace when the source is bigger
    Larger,
    /// Replace when the source is newer or bigger
    Either,
    /// Never replace an existing file
    #[default]
    Never,
}

impl OverwriteMode {
    /// Get human-readable name
    pub fn name(&self) -> &'static str {
        match self {
            Self::Newer => "newer",
            Self::Larger => "larger",
            Self::Either => "either",
            Self::Never => "never",
        }
    }
}

/// Resolution for two sources landing on the same destination path
#[derive(ValueEnum, Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum CollisionPolicy {
    /// Give later sources a numbered name: `photo (1).jpg`
    #[default]
    Rename,
    /// Refuse to start the run
    Abort,
}

/// Output format for reports
#[derive(ValueEnum, Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum OutputFormat {
    /// Human-readable text
    #[default]
    Text,
    /// JSON format
    Json,
}

/// Rules applied to every file of one run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
pub struct CopyPolicy {
    /// Leading path segments to drop
    pub flatten_depth: usize,
    /// Existing-file replacement rule
    pub overwrite_mode: OverwriteMode,
    /// Flatten collision rule
    pub collision: CollisionPolicy,
}

/// Runtime configuration derived from CLI args
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CopyConfig {
    /// Selected source files and directories
    pub sources: Vec<PathBuf>,
    /// Destination root
    pub destination: PathBuf,
    /// Leading path segments to drop
    pub flatten_depth: usize,
    /// Existing-file replacement rule
    pub overwrite: OverwriteMode,
    /// Flatten collision rule
    pub collision: CollisionPolicy,
    /// Preserve permissions and modification times
    pub preserve: bool,
    /// Only compute and print the plan
    pub preview: bool,
}

impl Default for CopyConfig {
    fn default() -> Self {
        Self {
            sources: Vec::new(),
            destination: PathBuf::new(),
            flatten_depth: 0,
            overwrite: OverwriteMode::Never,
            collision: CollisionPolicy::Rename,
            preserve: true,
            preview: false,
        }
    }
}

impl CopyConfig {
    /// Create config from CLI arguments
    pub fn from_cli(args: &CliArgs) -> Result<Self, String> {
        if args.sources.is_empty() {
            return Err("At least one source path required".to_string());
        }
        let destination = args
            .destination
            .clone()
            .ok_or("Destination path required (use --dest or MCLUB_DEST)")?;
        if destination.as_os_str().is_empty() {
            return Err("Destination path is empty".to_string());
        }

        Ok(Self {
            sources: args.sources.clone(),
            destination,
            flatten_depth: args.flatten,
            overwrite: args.overwrite,
            collision: args.on_collision,
            preserve: true,
            preview: args.preview,
        })
    }

    /// The per-run policy handed to the planner
    pub fn policy(&self) -> CopyPolicy {
        CopyPolicy {
            flatten_depth: self.flatten_depth,
            overwrite_mode: self.overwrite,
            collision: self.collision,
        }
    }
}
