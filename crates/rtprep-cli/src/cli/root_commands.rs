use clap::{Args, Subcommand};
use rtprep_config::StagesConfig;

/// Top-level command tree.
#[derive(Clone, Debug, Subcommand)]
pub enum Commands {
    /// Run the enabled stages over the working folder.
    Run(RunArgs),
    /// Print the effective configuration.
    Config,
}

/// Stage switches. An absent flag keeps the configured value.
#[derive(Clone, Debug, Default, Args)]
pub struct RunArgs {
    /// Count exported files against the extraction manifest.
    #[arg(long, num_args = 0..=1, require_equals = true, default_missing_value = "true")]
    pub extraction_qc: Option<bool>,

    /// Normalize plan and dose records from the cleanup manifest.
    #[arg(long, num_args = 0..=1, require_equals = true, default_missing_value = "true")]
    pub cleanup: Option<bool>,

    /// Cross-validate the research store against the validation manifest.
    #[arg(long, num_args = 0..=1, require_equals = true, default_missing_value = "true")]
    pub cleanup_qc: Option<bool>,

    /// Collect dose metrics from the research store.
    #[arg(long, num_args = 0..=1, require_equals = true, default_missing_value = "true")]
    pub collection: Option<bool>,
}

impl RunArgs {
    /// The configured switches with any flag given on the command line applied on top.
    #[must_use]
    pub fn apply(&self, configured: StagesConfig) -> StagesConfig {
        StagesConfig {
            extraction_qc: self.extraction_qc.unwrap_or(configured.extraction_qc),
            cleanup: self.cleanup.unwrap_or(configured.cleanup),
            cleanup_qc: self.cleanup_qc.unwrap_or(configured.cleanup_qc),
            collection: self.collection.unwrap_or(configured.collection),
        }
    }
}
