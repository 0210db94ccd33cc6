//! # rtprep-config
//!
//! Layered configuration loading for rtprep using figment.
//!
//! Later sources override earlier ones:
//! built-in defaults, `~/.config/rtprep/config.toml`, `.rtprep/config.toml`
//! in the current directory, then `RTPREP_*` environment variables.
//!
//! Environment keys use `__` between section and field, so
//! `RTPREP_WORKSPACE__FOLDER` sets `workspace.folder` and
//! `RTPREP_STAGES__CLEANUP_QC` sets `stages.cleanup_qc`.
//!
//! # Usage
//!
//! ```no_run
//! use rtprep_config::RtPrepConfig;
//!
//! let config = RtPrepConfig::load_with_dotenv().expect("config");
//! if config.stages.cleanup {
//!     println!("cleanup manifest: {}", config.workspace.cleanup_manifest_path().display());
//! }
//! ```

mod collection;
mod error;
mod records;
mod reference;
mod research;
mod stages;
mod tolerances;
mod workspace;

pub use collection::CollectionConfig;
pub use error::ConfigError;
pub use records::RecordsConfig;
pub use reference::ReferenceConfig;
pub use research::ResearchConfig;
pub use stages::StagesConfig;
pub use tolerances::TolerancesConfig;
pub use workspace::WorkspaceConfig;

use figment::{
    Figment,
    providers::{Env, Format, Serialized, Toml},
};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct RtPrepConfig {
    #[serde(default)]
    pub workspace: WorkspaceConfig,
    #[serde(default)]
    pub stages: StagesConfig,
    #[serde(default)]
    pub records: RecordsConfig,
    #[serde(default)]
    pub tolerances: TolerancesConfig,
    #[serde(default)]
    pub reference: ReferenceConfig,
    #[serde(default)]
    pub collection: CollectionConfig,
    #[serde(default)]
    pub research: ResearchConfig,
}

impl RtPrepConfig {
    /// Load from the config files and `RTPREP_*` variables. No `.env` handling.
    pub fn load() -> Result<Self, ConfigError> {
        Self::from_figment(&Self::figment())
    }

    /// Like [`Self::load`], after exporting the nearest `.env` file (searched
    /// from the current directory upwards) into the environment.
    pub fn load_with_dotenv() -> Result<Self, ConfigError> {
        // A missing `.env` is the normal case.
        let _ = dotenvy::dotenv();
        Self::load()
    }

    /// Extract and validate a configuration from an arbitrary figment.
    pub fn from_figment(figment: &Figment) -> Result<Self, ConfigError> {
        let config: Self = figment.extract()?;
        config.validate()?;
        Ok(config)
    }

    /// Defaults, then every existing config file, then the environment.
    pub fn figment() -> Figment {
        let defaults = Figment::from(Serialized::defaults(Self::default()));
        Self::config_files()
            .into_iter()
            .filter(|path| path.is_file())
            .fold(defaults, |figment, path| figment.merge(Toml::file(path)))
            .merge(Env::prefixed("RTPREP_").split("__"))
    }

    /// Candidate config files, lowest priority first.
    fn config_files() -> Vec<PathBuf> {
        let user = dirs::config_dir().map(|dir| dir.join("rtprep").join("config.toml"));
        let project = Path::new(".rtprep").join("config.toml");
        user.into_iter().chain([project]).collect()
    }

    /// Check cross-field constraints that serde cannot express.
    pub fn validate(&self) -> Result<(), ConfigError> {
        self.records.validate()?;
        self.tolerances.validate()?;
        self.reference.validate()?;
        self.collection.validate()?;
        Ok(())
    }

    /// The research snapshot directory resolved against the working folder.
    #[must_use]
    pub fn research_snapshot_dir(&self) -> PathBuf {
        self.research.snapshot_dir_in(&self.workspace.folder)
    }
}
