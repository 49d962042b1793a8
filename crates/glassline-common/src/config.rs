//! ---
//! ems_section: "01-core-functionality"
//! ems_subsection: "module"
//! ems_type: "source"
//! ems_scope: "code"
//! ems_description: "Generator configuration loading and validation."
//! ems_version: "v0.1.0"
//! ems_owner: "tbd"
//! ---
use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{anyhow, Context, Result};
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::logging::LogFormat;

fn default_samples() -> usize {
    1440
}

fn default_column_label() -> String {
    "ActivePower".to_owned()
}

fn default_output_directory() -> PathBuf {
    PathBuf::from("target/profiles")
}

fn default_logging_directory() -> PathBuf {
    PathBuf::from("target/logs")
}

fn default_log_format() -> LogFormat {
    LogFormat::Pretty
}

/// Primary configuration object for the profile generator.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct AppConfig {
    #[serde(default)]
    pub generation: GenerationConfig,
    #[serde(default)]
    pub output: OutputConfig,
    #[serde(default)]
    pub logging: LoggingConfig,
    /// Machines to generate, keyed by catalog name. Empty means the full line.
    #[serde(default)]
    pub machines: IndexMap<String, MachineConfig>,
}

/// Metadata describing where an [`AppConfig`] was loaded from.
#[derive(Debug, Clone)]
pub struct LoadedAppConfig {
    pub config: AppConfig,
    pub source: PathBuf,
}

impl AppConfig {
    pub const ENV_CONFIG_PATH: &str = "GLASSLINE_CONFIG";

    /// Load configuration from disk, respecting the `GLASSLINE_CONFIG` override.
    pub fn load<P: AsRef<Path>>(candidates: &[P]) -> Result<Self> {
        Ok(Self::load_with_source(candidates)?.config)
    }

    /// Load configuration from disk together with the effective source path.
    pub fn load_with_source<P: AsRef<Path>>(candidates: &[P]) -> Result<LoadedAppConfig> {
        if let Ok(env_path) = std::env::var(Self::ENV_CONFIG_PATH) {
            if !env_path.trim().is_empty() {
                let path = PathBuf::from(env_path);
                let config = Self::from_path(&path)?;
                return Ok(LoadedAppConfig {
                    config,
                    source: path,
                });
            }
        }

        for candidate in candidates {
            if candidate.as_ref().exists() {
                let path = candidate.as_ref().to_path_buf();
                let config = Self::from_path(&path)?;
                return Ok(LoadedAppConfig {
                    config,
                    source: path,
                });
            }
        }

        Err(anyhow!(
            "no configuration files found. inspected: {}",
            candidates
                .iter()
                .map(|p| p.as_ref().display().to_string())
                .collect::<Vec<_>>()
                .join(", ")
        ))
    }

    /// Like [`AppConfig::load`], but falls back to the built-in defaults when neither
    /// `GLASSLINE_CONFIG` nor any candidate exists. Existing but broken files still fail.
    pub fn load_or_default<P: AsRef<Path>>(candidates: &[P]) -> Result<Self> {
        let env_set = std::env::var(Self::ENV_CONFIG_PATH)
            .map(|path| !path.trim().is_empty())
            .unwrap_or(false);
        if env_set || candidates.iter().any(|path| path.as_ref().exists()) {
            return Self::load(candidates);
        }
        debug!("no configuration file found; using defaults");
        Ok(Self::default())
    }

    pub fn from_path(path: &Path) -> Result<Self> {
        debug!(config_path = %path.display(), "loading configuration");
        let contents = fs::read_to_string(path)
            .with_context(|| format!("unable to read config file {}", path.display()))?;
        contents
            .parse::<AppConfig>()
            .with_context(|| format!("invalid config file {}", path.display()))
    }

    /// Validate structural invariants.
    pub fn validate(&self) -> Result<()> {
        self.generation.validate()?;
        for (name, machine) in &self.machines {
            machine.validate(name)?;
        }
        Ok(())
    }
}

impl std::str::FromStr for AppConfig {
    type Err = anyhow::Error;

    fn from_str(content: &str) -> std::result::Result<Self, Self::Err> {
        let config: AppConfig =
            toml::from_str(content).with_context(|| "failed to parse configuration")?;
        config.validate()?;
        Ok(config)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GenerationConfig {
    /// Samples per day; 1440 gives one per minute.
    #[serde(default = "default_samples")]
    pub samples: usize,
    #[serde(default = "default_column_label")]
    pub column_label: String,
}

impl Default for GenerationConfig {
    fn default() -> Self {
        Self {
            samples: default_samples(),
            column_label: default_column_label(),
        }
    }
}

impl GenerationConfig {
    pub fn validate(&self) -> Result<()> {
        if self.samples == 0 {
            return Err(anyhow!("generation.samples must be greater than zero"));
        }
        if self.column_label.trim().is_empty() {
            return Err(anyhow!("generation.column_label cannot be empty"));
        }
        Ok(())
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OutputConfig {
    #[serde(default = "default_output_directory")]
    pub directory: PathBuf,
    /// Write a plot descriptor next to every series.
    #[serde(default)]
    pub plots: bool,
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            directory: default_output_directory(),
            plots: false,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    #[serde(default = "default_logging_directory")]
    pub directory: PathBuf,
    #[serde(default = "default_log_format")]
    pub format: LogFormat,
    #[serde(default)]
    pub file_prefix: Option<String>,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            directory: default_logging_directory(),
            format: default_log_format(),
            file_prefix: None,
        }
    }
}

/// Per machine-type overrides on top of the catalog profile.
#[derive(Debug, Clone, Serialize, Deserialize, Default, PartialEq)]
pub struct MachineConfig {
    /// Healthy units to generate; the catalog default when unset.
    #[serde(default)]
    pub count: Option<u32>,
    /// Append one faulty unit after the healthy ones.
    #[serde(default)]
    pub faulty: Option<bool>,
    /// Relative standard deviation of the production noise.
    #[serde(default)]
    pub variability: Option<f64>,
    #[serde(default)]
    pub seed_offset: Option<u64>,
    #[serde(default)]
    pub daily_tons: Option<f64>,
    #[serde(default)]
    pub age_years: Option<f64>,
    /// Fractional power increase of the faulty unit, e.g. `0.2` for +20%.
    #[serde(default)]
    pub fault_excess: Option<f64>,
}

impl MachineConfig {
    pub fn validate(&self, name: &str) -> Result<()> {
        let checks = [
            ("variability", self.variability),
            ("daily_tons", self.daily_tons),
            ("age_years", self.age_years),
            ("fault_excess", self.fault_excess),
        ];
        for (field, value) in checks {
            if let Some(value) = value {
                if !value.is_finite() || value < 0.0 {
                    return Err(anyhow!(
                        "machines.{}.{} must be a finite non-negative number, got {}",
                        name,
                        field,
                        value
                    ));
                }
            }
        }
        if self.count == Some(0) && self.faulty != Some(true) {
            return Err(anyhow!(
                "machines.{} generates nothing: count is 0 and no faulty unit requested",
                name
            ));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_document_uses_defaults() {
        let config: AppConfig = "".parse().unwrap();
        assert_eq!(config.generation.samples, 1440);
        assert_eq!(config.generation.column_label, "ActivePower");
        assert_eq!(config.output.directory, PathBuf::from("target/profiles"));
        assert!(!config.output.plots);
        assert!(config.machines.is_empty());
    }

    #[test]
    fn machine_overrides_keep_declaration_order() {
        let config: AppConfig = r#"
            [generation]
            samples = 288

            [machines.forming_machine]
            count = 2
            faulty = true

            [machines.batch_mixer]
            variability = 0.05
        "#
        .parse()
        .unwrap();
        let names: Vec<_> = config.machines.keys().cloned().collect();
        assert_eq!(names, ["forming_machine", "batch_mixer"]);
        assert_eq!(config.machines["forming_machine"].count, Some(2));
        assert_eq!(config.machines["batch_mixer"].variability, Some(0.05));
        assert_eq!(config.generation.samples, 288);
    }

    #[test]
    fn rejects_invalid_values() {
        assert!("[generation]\nsamples = 0".parse::<AppConfig>().is_err());
        assert!("[generation]\ncolumn_label = ' '"
            .parse::<AppConfig>()
            .is_err());
        assert!("[machines.lehr_oven]\nage_years = -1.0"
            .parse::<AppConfig>()
            .is_err());
        assert!("[machines.lehr_oven]\ncount = 0".parse::<AppConfig>().is_err());
        assert!("[machines.lehr_oven]\nfault_excess = -0.1"
            .parse::<AppConfig>()
            .is_err());
    }

    #[test]
    fn log_format_is_kebab_case() {
        let config: AppConfig = "[logging]\nformat = \"structured-json\"".parse().unwrap();
        assert_eq!(config.logging.format, LogFormat::StructuredJson);
    }
}
