use std::path::PathBuf;

use clap::Parser;

pub mod global;
pub mod root_commands;

pub use global::{GlobalFlags, OutputFormat};
pub use root_commands::{Commands, RunArgs};

/// Top-level CLI parser for the `rtprep` binary.
#[derive(Debug, Parser)]
#[command(
    name = "rtprep",
    version,
    about = "rtprep - radiotherapy record cleanup and quality control"
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Output format: json, table, raw
    #[arg(short, long, global = true, default_value = "json")]
    pub format: OutputFormat,

    /// Quiet mode (errors only, no progress bars)
    #[arg(short, long, global = true)]
    pub quiet: bool,

    /// Verbose mode (debug logging)
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Working folder holding the manifests and patient folders (overrides `workspace.folder`)
    #[arg(short, long, global = true)]
    pub workdir: Option<PathBuf>,
}

impl Cli {
    #[must_use]
    pub fn global_flags(&self) -> GlobalFlags {
        GlobalFlags {
            format: self.format,
            quiet: self.quiet,
            workdir: self.workdir.clone(),
        }
    }
}
