//! Integration tests for TOML and environment configuration loading.
//!
//! Uses figment::Jail for safe, sandboxed env var manipulation.

use figment::{
    Figment, Jail,
    providers::{Env, Format, Serialized, Toml},
};
use pretty_assertions::assert_eq;
use rtprep_config::{ConfigError, RtPrepConfig};

fn layered() -> Figment {
    Figment::from(Serialized::defaults(RtPrepConfig::default()))
        .merge(Toml::file("config.toml"))
        .merge(Env::prefixed("RTPREP_").split("__"))
}

#[test]
fn loads_sections_from_toml() {
    Jail::expect_with(|jail| {
        jail.create_file(
            "config.toml",
            r#"
[workspace]
folder = "/data/export"
cleanup_manifest = "cleanup.tsv"

[stages]
extraction_qc = true
cleanup = false
cleanup_qc = true

[tolerances]
dose = 0.05

[reference]
prefix = "Lung"
preferred = "Lung_R"

[collection]
structure = "Esophagus"
dose_level = 35.0
"#,
        )?;

        let config = RtPrepConfig::from_figment(&layered()).expect("config loads");

        assert_eq!(config.workspace.folder.to_str(), Some("/data/export"));
        assert_eq!(config.workspace.cleanup_manifest, "cleanup.tsv");
        assert_eq!(config.workspace.extraction_manifest, "listExtraction.txt");
        assert!(config.stages.extraction_qc);
        assert!(!config.stages.cleanup);
        assert!(config.stages.cleanup_qc);
        assert!(!config.stages.collection);
        assert!((config.tolerances.dose - 0.05).abs() < f64::EPSILON);
        assert!((config.tolerances.distance - 0.3).abs() < f64::EPSILON);
        assert_eq!(config.reference.preferred, "Lung_R");
        assert_eq!(config.reference.plan, "P1");
        assert_eq!(config.collection.structure, "Esophagus");
        assert!((config.collection.dose_level - 35.0).abs() < f64::EPSILON);
        Ok(())
    });
}

#[test]
fn env_overrides_toml() {
    Jail::expect_with(|jail| {
        jail.create_file(
            "config.toml",
            r#"
[stages]
collection = false
"#,
        )?;
        jail.set_env("RTPREP_STAGES__COLLECTION", "true");
        jail.set_env("RTPREP_RECORDS__PLAN_GLOB", "RP*.json");

        let config = RtPrepConfig::from_figment(&layered()).expect("config loads");
        assert!(config.stages.collection);
        assert_eq!(config.records.plan_glob, "RP*.json");
        Ok(())
    });
}

#[test]
fn project_config_file_is_picked_up() {
    Jail::expect_with(|jail| {
        jail.create_dir(".rtprep")?;
        jail.create_file(
            ".rtprep/config.toml",
            r#"
[research]
snapshot_dir = "snapshots"
"#,
        )?;

        let config = RtPrepConfig::load().expect("config loads");
        assert_eq!(config.research.snapshot_dir.to_str(), Some("snapshots"));
        Ok(())
    });
}

#[test]
fn invalid_tolerance_is_rejected() {
    Jail::expect_with(|jail| {
        jail.create_file(
            "config.toml",
            r#"
[tolerances]
intensity = -1.0
"#,
        )?;

        let err = RtPrepConfig::from_figment(&layered()).expect_err("negative tolerance");
        assert!(matches!(
            err,
            ConfigError::InvalidValue { ref field, .. } if field == "tolerances.intensity"
        ));
        Ok(())
    });
}

#[test]
fn empty_glob_is_rejected() {
    Jail::expect_with(|jail| {
        jail.create_file(
            "config.toml",
            r#"
[records]
dose_glob = "  "
"#,
        )?;

        let err = RtPrepConfig::from_figment(&layered()).expect_err("empty glob");
        assert!(err.to_string().contains("records.dose_glob"));
        Ok(())
    });
}
