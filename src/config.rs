//! Configuration management with layered loading
//!
//! Precedence (lowest to highest):
//! 1. Compiled defaults
//! 2. Global config: `$XDG_CONFIG_HOME/obtree/obtree.toml`
//! 3. Local config: `--config <file>` or `./obtree.toml`
//! 4. Environment variables: `OBTREE_*` prefix, `__` between nested keys

use std::path::{Path, PathBuf};

use config::{Config, ConfigError, Environment};
use directories::ProjectDirs;
use serde::{Deserialize, Serialize};

use crate::application::services::DEFAULT_COUNT;
use crate::application::ApplicationError;
use crate::domain::{BuildOptions, GrandChildNum, NameFormat, NumRange};

/// Name of the local config file looked up in the working directory.
pub const LOCAL_CONFIG_FILE: &str = "obtree.toml";

/// Unified configuration for obtree.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct Settings {
    /// Seed for the random source (entropy when unset)
    pub seed: Option<u64>,
    /// Number of parents built by `create`
    pub count: usize,
    /// JSON snapshot to build from (benchmark snapshot when unset)
    pub snapshot: Option<PathBuf>,
    /// Build options
    pub build: BuildOptions,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            seed: None,
            count: DEFAULT_COUNT,
            snapshot: None,
            build: BuildOptions::default(),
        }
    }
}

/// Raw format settings for intermediate parsing.
#[derive(Debug, Clone, Deserialize, Default)]
#[serde(default)]
pub struct RawFormat {
    pub name_separator: Option<String>,
    pub combo_separator: Option<String>,
}

/// Raw build settings for intermediate parsing.
#[derive(Debug, Clone, Deserialize, Default)]
#[serde(default)]
pub struct RawBuild {
    pub child_num: Option<NumRange>,
    pub grandchild_num: Option<GrandChildNum>,
    pub format: RawFormat,
}

/// Raw settings for intermediate parsing (`None` means "not specified,
/// inherit from the layer below").
#[derive(Debug, Clone, Deserialize, Default)]
#[serde(default)]
pub struct RawSettings {
    pub seed: Option<u64>,
    pub count: Option<usize>,
    pub snapshot: Option<PathBuf>,
    pub build: RawBuild,
}

/// Get the XDG config directory for obtree.
pub fn global_config_dir() -> Option<PathBuf> {
    ProjectDirs::from("", "", "obtree").map(|dirs| dirs.config_dir().to_path_buf())
}

/// Get the path to the global config file.
pub fn global_config_path() -> Option<PathBuf> {
    global_config_dir().map(|dir| dir.join("obtree.toml"))
}

/// Load a TOML file into RawSettings for manual merging.
fn load_raw_settings(path: &Path) -> Result<RawSettings, ApplicationError> {
    let content = std::fs::read_to_string(path).map_err(|e| ApplicationError::Config {
        message: format!("read {}: {}", path.display(), e),
    })?;
    toml::from_str(&content).map_err(|e| ApplicationError::Config {
        message: format!("parse {}: {}", path.display(), e),
    })
}

/// Expand `~`, `$VAR` and `${VAR}` in a path; unchanged when expansion fails.
fn expand_path(path: &Path) -> PathBuf {
    let raw = path.to_string_lossy();
    shellexpand::full(raw.as_ref())
        .map(|s| PathBuf::from(s.into_owned()))
        .unwrap_or_else(|_| path.to_path_buf())
}

impl Settings {
    /// Expand shell variables and tilde in path-like fields.
    fn expand_paths(&mut self) {
        if let Some(snapshot) = &self.snapshot {
            self.snapshot = Some(expand_path(snapshot));
        }
    }

    /// Overlay wins for every field it specifies.
    fn merge_with(&self, overlay: &RawSettings) -> Self {
        let build = &overlay.build;
        Self {
            seed: overlay.seed.or(self.seed),
            count: overlay.count.unwrap_or(self.count),
            snapshot: overlay.snapshot.clone().or_else(|| self.snapshot.clone()),
            build: BuildOptions {
                child_num: build.child_num.unwrap_or(self.build.child_num),
                grandchild_num: build.grandchild_num.unwrap_or(self.build.grandchild_num),
                format: NameFormat {
                    name_separator: build
                        .format
                        .name_separator
                        .clone()
                        .unwrap_or_else(|| self.build.format.name_separator.clone()),
                    combo_separator: build
                        .format
                        .combo_separator
                        .clone()
                        .unwrap_or_else(|| self.build.format.combo_separator.clone()),
                },
            },
        }
    }

    /// Load settings with layered precedence.
    ///
    /// # Arguments
    /// * `local` - Explicit local config file; `./obtree.toml` is used when
    ///   `None` and the file exists
    pub fn load(local: Option<&Path>) -> Result<Self, ApplicationError> {
        // 1. Start with defaults
        let mut current = Self::default();

        // 2. Global config
        if let Some(global_path) = global_config_path() {
            if global_path.exists() {
                let raw = load_raw_settings(&global_path)?;
                current = current.merge_with(&raw);
            }
        }

        // 3. Local config: an explicit path must exist
        match local {
            Some(path) => {
                if !path.exists() {
                    return Err(ApplicationError::Config {
                        message: format!("config file not found: {}", path.display()),
                    });
                }
                current = current.merge_with(&load_raw_settings(path)?);
            }
            None => {
                let default_local = Path::new(LOCAL_CONFIG_FILE);
                if default_local.exists() {
                    current = current.merge_with(&load_raw_settings(default_local)?);
                }
            }
        }

        // 4. Environment variables
        current = Self::apply_env_overrides(current)?;

        current.expand_paths();
        current.validate()?;

        Ok(current)
    }

    /// Apply OBTREE_* environment variables as explicit overrides.
    fn apply_env_overrides(mut settings: Self) -> Result<Self, ApplicationError> {
        let builder = Config::builder().add_source(
            Environment::with_prefix("OBTREE")
                .prefix_separator("_")
                .separator("__"),
        );

        let config = builder.build().map_err(config_err)?;

        if let Ok(val) = config.get::<u64>("seed") {
            settings.seed = Some(val);
        }
        if let Ok(val) = config.get::<usize>("count") {
            settings.count = val;
        }
        if let Ok(val) = config.get_string("snapshot") {
            settings.snapshot = Some(PathBuf::from(val));
        }
        if let Ok(val) = config.get_float("build.child_num.min") {
            settings.build.child_num.min = val;
        }
        if let Ok(val) = config.get_float("build.child_num.max") {
            settings.build.child_num.max = val;
        }
        if let Ok(mode) = config.get_string("build.grandchild_num.mode") {
            settings.build.grandchild_num = match mode.as_str() {
                "zero" => GrandChildNum::Zero,
                "random" => match settings.build.grandchild_num {
                    GrandChildNum::Random(range) => GrandChildNum::Random(range),
                    GrandChildNum::Zero => GrandChildNum::default(),
                },
                other => {
                    return Err(ApplicationError::Config {
                        message: format!("unknown grandchild_num mode: {other}"),
                    })
                }
            };
        }
        if let GrandChildNum::Random(range) = &mut settings.build.grandchild_num {
            if let Ok(val) = config.get_float("build.grandchild_num.min") {
                range.min = val;
            }
            if let Ok(val) = config.get_float("build.grandchild_num.max") {
                range.max = val;
            }
        }
        if let Ok(val) = config.get_string("build.format.name_separator") {
            settings.build.format.name_separator = val;
        }
        if let Ok(val) = config.get_string("build.format.combo_separator") {
            settings.build.format.combo_separator = val;
        }

        Ok(settings)
    }

    /// Reject ranges that cannot be drawn from.
    pub fn validate(&self) -> Result<(), ApplicationError> {
        if !self.build.child_num.is_valid() {
            return Err(ApplicationError::Config {
                message: format!(
                    "build.child_num: invalid range [{}, {})",
                    self.build.child_num.min, self.build.child_num.max
                ),
            });
        }
        if let GrandChildNum::Random(range) = self.build.grandchild_num {
            if !range.is_valid() {
                return Err(ApplicationError::Config {
                    message: format!(
                        "build.grandchild_num: invalid range [{}, {})",
                        range.min, range.max
                    ),
                });
            }
        }
        Ok(())
    }

    /// Show the effective configuration as TOML.
    pub fn to_toml(&self) -> Result<String, ApplicationError> {
        toml::to_string_pretty(self).map_err(|e| ApplicationError::Config {
            message: format!("serialize config: {e}"),
        })
    }

    /// Generate a template config file.
    pub fn template() -> String {
        r#"# obtree configuration
#
# Locations (by precedence, lowest to highest):
#   Global: ~/.config/obtree/obtree.toml
#   Local:  ./obtree.toml or --config <file>
#   Env:    OBTREE_* environment variables, e.g. OBTREE_SEED=7,
#           OBTREE_BUILD__CHILD_NUM__MAX=50

# Seed for reproducible builds (entropy when unset)
# seed = 42

# Parents built by `obtree create`
# count = 10

# JSON snapshot to build from (benchmark snapshot when unset)
# snapshot = "~/snapshots/parent.json"

# [build.child_num]
# min = 1.0
# max = 100.0

# "random" draws from [min, max), "zero" starts every grandchild at 0
# [build.grandchild_num]
# mode = "random"
# min = 0.0
# max = 10.0

# [build.format]
# name_separator = " "
# combo_separator = " -> "
"#
        .to_string()
    }
}

fn config_err(e: ConfigError) -> ApplicationError {
    ApplicationError::Config {
        message: e.to_string(),
    }
}
