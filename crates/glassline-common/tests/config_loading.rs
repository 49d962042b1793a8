//! ---
//! ems_section: "15-testing-qa-runbook"
//! ems_subsection: "integration-tests"
//! ems_type: "source"
//! ems_scope: "code"
//! ems_description: "Configuration discovery against files on disk."
//! ems_version: "v0.1.0"
//! ems_owner: "tbd"
//! ---
use std::fs;

use glassline_common::AppConfig;
use tempfile::tempdir;

#[test]
fn first_existing_candidate_wins() -> anyhow::Result<()> {
    let dir = tempdir()?;
    let missing = dir.path().join("missing.toml");
    let present = dir.path().join("glassline.toml");
    fs::write(
        &present,
        "[output]\ndirectory = \"profiles\"\nplots = true\n\n[machines.solar_panel]\n",
    )?;

    let loaded = AppConfig::load_with_source(&[&missing, &present])?;
    assert_eq!(loaded.source, present);
    assert!(loaded.config.output.plots);
    assert!(loaded.config.machines.contains_key("solar_panel"));
    Ok(())
}

#[test]
fn missing_candidates_are_listed_in_error() {
    let err = AppConfig::load(&["/nonexistent/glassline.toml"]).unwrap_err();
    assert!(err.to_string().contains("/nonexistent/glassline.toml"));
}

#[test]
fn parse_errors_name_the_file() -> anyhow::Result<()> {
    let dir = tempdir()?;
    let path = dir.path().join("broken.toml");
    fs::write(&path, "[generation\nsamples = 10")?;
    let err = AppConfig::from_path(&path).unwrap_err();
    assert!(format!("{err:#}").contains("broken.toml"));
    Ok(())
}

#[test]
fn defaults_apply_without_any_candidate() -> anyhow::Result<()> {
    if std::env::var(AppConfig::ENV_CONFIG_PATH).is_ok() {
        return Ok(());
    }
    let dir = tempdir()?;
    let config = AppConfig::load_or_default(&[dir.path().join("absent.toml")])?;
    assert_eq!(config.generation.samples, 1440);
    assert!(config.machines.is_empty());
    Ok(())
}

#[test]
fn broken_candidate_is_not_replaced_by_defaults() -> anyhow::Result<()> {
    if std::env::var(AppConfig::ENV_CONFIG_PATH).is_ok() {
        return Ok(());
    }
    let dir = tempdir()?;
    let path = dir.path().join("glassline.toml");
    fs::write(&path, "[generation]\nsamples = 0\n")?;
    assert!(AppConfig::load_or_default(&[&path]).is_err());
    Ok(())
}
