//! Configuration file support for riskplan
//!
//! Loads the organizational risk policy and presentation defaults from JSON.
//!
//! Search order:
//! 1. Explicit path (--config CLI flag)
//! 2. `.riskplanrc.json` in project root
//! 3. `riskplan.config.json` in project root
//! 4. `"riskplan"` key in `package.json`
//!
//! All fields are optional. CLI flags take precedence over config file values.

use crate::authz::StaticRoleStore;
use crate::band::{default_bands, Band};
use crate::catalog::SortKey;
use crate::policy::RiskPolicy;
use crate::scale::{Scale, DEFAULT_SCALE};
use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// riskplan configuration loaded from a JSON config file
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct RiskPlanConfig {
    /// Probability/impact scale (default: 1..5)
    #[serde(default)]
    pub scale: Option<ScaleConfig>,

    /// Score bands; must partition every score attainable on the scale
    #[serde(default)]
    pub bands: Option<Vec<BandConfig>>,

    /// Initial ordering of the risk list (default: scoreDesc)
    #[serde(default)]
    pub default_sort: Option<SortKey>,

    /// User ids allowed to edit the global measure library
    #[serde(default)]
    pub admins: Vec<String>,

    /// Render the matrix below the risk list (default: true)
    #[serde(default)]
    pub show_matrix: Option<bool>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ScaleConfig {
    pub min: i32,
    pub max: i32,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct BandConfig {
    pub id: String,
    /// Display label (default: the id)
    #[serde(default)]
    pub label: Option<String>,
    pub min: i32,
    pub max: i32,
}

/// Resolved configuration with a validated policy
#[derive(Debug)]
pub struct ResolvedConfig {
    pub policy: RiskPolicy,
    pub default_sort: SortKey,
    pub roles: StaticRoleStore,
    pub show_matrix: bool,
    /// Path of the config file this came from (None = defaults)
    pub config_path: Option<PathBuf>,
}

impl RiskPlanConfig {
    fn scale(&self) -> Scale {
        match &self.scale {
            Some(s) => Scale {
                min: s.min,
                max: s.max,
            },
            None => DEFAULT_SCALE,
        }
    }

    fn bands(&self) -> Vec<Band> {
        match &self.bands {
            Some(bands) => bands
                .iter()
                .map(|b| Band {
                    id: b.id.clone(),
                    label: b.label.clone().unwrap_or_else(|| b.id.clone()),
                    min: b.min,
                    max: b.max,
                })
                .collect(),
            None => default_bands(),
        }
    }

    /// Validate the configuration for logical errors
    pub fn validate(&self) -> Result<()> {
        for admin in &self.admins {
            if admin.trim().is_empty() {
                anyhow::bail!("admins must not contain blank user ids");
            }
        }
        if let Some(bands) = &self.bands {
            for band in bands {
                if band.id.trim().is_empty() {
                    anyhow::bail!("bands[].id must not be blank");
                }
            }
        }

        let scale = self.scale();
        if self.scale.is_some() && self.bands.is_none() {
            RiskPolicy::new(scale, default_bands()).with_context(|| {
                format!(
                    "default bands do not fit scale {}..{}; configure `bands` as well",
                    scale.min, scale.max
                )
            })?;
        } else {
            RiskPolicy::new(scale, self.bands())?;
        }
        Ok(())
    }

    /// Resolve config into validated form ready for use
    pub fn resolve(&self) -> Result<ResolvedConfig> {
        self.validate()?;

        let policy = RiskPolicy::new(self.scale(), self.bands())?;
        Ok(ResolvedConfig {
            policy,
            default_sort: self.default_sort.unwrap_or_default(),
            roles: StaticRoleStore::with_admins(self.admins.iter().cloned()),
            show_matrix: self.show_matrix.unwrap_or(true),
            config_path: None,
        })
    }
}

impl ResolvedConfig {
    /// Build a ResolvedConfig with all defaults (no config file)
    pub fn defaults() -> Result<Self> {
        RiskPlanConfig::default().resolve()
    }
}

/// A place a config can be read from, relative to the project root
enum ConfigSource {
    /// A whole JSON file holds the config
    File(&'static str),
    /// The config sits under `key` in a larger JSON file
    Embedded {
        file: &'static str,
        key: &'static str,
    },
}

/// Discovery order; the first source present wins
const CONFIG_SOURCES: &[ConfigSource] = &[
    ConfigSource::File(".riskplanrc.json"),
    ConfigSource::File("riskplan.config.json"),
    ConfigSource::Embedded {
        file: "package.json",
        key: "riskplan",
    },
];

impl ConfigSource {
    fn load(&self, project_root: &Path) -> Result<Option<(RiskPlanConfig, PathBuf)>> {
        let (file, key) = match self {
            ConfigSource::File(file) => (*file, None),
            ConfigSource::Embedded { file, key } => (*file, Some(*key)),
        };
        let path = project_root.join(file);
        if !path.is_file() {
            return Ok(None);
        }

        let mut document = read_json(&path)?;
        let value = match key {
            None => document,
            Some(key) => match document.get_mut(key) {
                Some(embedded) => embedded.take(),
                None => return Ok(None),
            },
        };
        let config = parse_config(value, &path)?;
        Ok(Some((config, path)))
    }
}

fn read_json(path: &Path) -> Result<serde_json::Value> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("failed to read config file: {}", path.display()))?;
    serde_json::from_str(&content)
        .with_context(|| format!("failed to parse config file: {}", path.display()))
}

fn parse_config(value: serde_json::Value, path: &Path) -> Result<RiskPlanConfig> {
    let config: RiskPlanConfig = serde_json::from_value(value)
        .with_context(|| format!("invalid config in: {}", path.display()))?;
    config
        .validate()
        .with_context(|| format!("invalid config in: {}", path.display()))?;
    Ok(config)
}

/// Discover and load a config file from the project root
///
/// Returns `None` if no config file is found (use defaults).
pub fn discover_config(project_root: &Path) -> Result<Option<(RiskPlanConfig, PathBuf)>> {
    for source in CONFIG_SOURCES {
        if let Some(found) = source.load(project_root)? {
            return Ok(Some(found));
        }
    }
    Ok(None)
}

/// Load config from an explicit file path
pub fn load_config_file(path: &Path) -> Result<RiskPlanConfig> {
    parse_config(read_json(path)?, path)
}

/// Load and resolve config for a project
///
/// An explicit `config_path` bypasses discovery. Defaults apply when nothing
/// is found.
pub fn load_and_resolve(project_root: &Path, config_path: Option<&Path>) -> Result<ResolvedConfig> {
    let found = match config_path {
        Some(path) => Some((load_config_file(path)?, path.to_path_buf())),
        None => discover_config(project_root)?,
    };
    let Some((config, path)) = found else {
        return ResolvedConfig::defaults();
    };

    let mut resolved = config.resolve()?;
    log::info!("loaded config from {}", path.display());
    resolved.config_path = Some(path);
    Ok(resolved)
}
