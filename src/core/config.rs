//! Gantry configuration (gantry.toml)
//!
//! Searched in order: gantry.toml, .gantry.toml, .config/gantry.toml.
//! The config is read-only here; the version bump edits the file in place
//! through `toml_edit` so comments and layout survive (see release::version).

use crate::core::error::{ConfigError, GantryError, GantryResult, ResultExt, ValidationError};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

/// Top-level gantry configuration
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct GantryConfig {
  #[serde(default)]
  pub build: BuildConfig,
  #[serde(default)]
  pub bump: BumpConfig,
  #[serde(default)]
  pub version: Option<VersionConfig>,
}

/// Build-impact detection settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BuildConfig {
  /// Filename that marks a directory as a package (container build manifest)
  #[serde(default = "default_manifest")]
  pub manifest: String,

  /// Default repository type when --repo-type is not given
  #[serde(default)]
  pub repo_type: Option<String>,

  /// Compare refs used when the CI gives us no previous commit
  #[serde(default)]
  pub fallbacks: FallbackConfig,
}

fn default_manifest() -> String {
  "Dockerfile".to_string()
}

impl Default for BuildConfig {
  fn default() -> Self {
    Self {
      manifest: default_manifest(),
      repo_type: None,
      fallbacks: FallbackConfig::default(),
    }
  }
}

/// Per-build-type compare fallbacks
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FallbackConfig {
  /// Compare ref for feature builds without pipeline history
  #[serde(default = "default_feature_fallback")]
  pub feature: String,

  /// Compare ref for stage builds
  #[serde(default = "default_stage_fallback")]
  pub stage: String,
}

fn default_feature_fallback() -> String {
  "develop".to_string()
}

fn default_stage_fallback() -> String {
  "master".to_string()
}

impl Default for FallbackConfig {
  fn default() -> Self {
    Self {
      feature: default_feature_fallback(),
      stage: default_stage_fallback(),
    }
  }
}

/// Release flow settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BumpConfig {
  /// Branch releases are cut from when the CI does not name one
  #[serde(default = "default_branch")]
  pub branch: String,

  /// Branch the release is merged back into (git flow)
  #[serde(default = "default_develop_branch")]
  pub develop_branch: String,

  /// Changelog path relative to the repository root
  #[serde(default = "default_changelog")]
  pub changelog: String,
}

fn default_branch() -> String {
  "master".to_string()
}

fn default_develop_branch() -> String {
  "develop".to_string()
}

fn default_changelog() -> String {
  "CHANGELOG.md".to_string()
}

impl Default for BumpConfig {
  fn default() -> Self {
    Self {
      branch: default_branch(),
      develop_branch: default_develop_branch(),
      changelog: default_changelog(),
    }
  }
}

/// Version state for the bump command
///
/// `current` is the source of truth; every path in `files` has occurrences of
/// the old version string rewritten to the new one on bump.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct VersionConfig {
  /// Current released version (semver)
  pub current: String,

  /// Files carrying the version string, relative to the repository root
  #[serde(default)]
  pub files: Vec<PathBuf>,
}

impl VersionConfig {
  /// Parse the current version, rejecting anything that is not semver
  pub fn current_version(&self) -> GantryResult<semver::Version> {
    semver::Version::parse(&self.current).map_err(|_| {
      GantryError::Validation(ValidationError::InvalidVersion {
        value: self.current.clone(),
      })
    })
  }
}

impl GantryConfig {
  /// Find config file in search order: gantry.toml, .gantry.toml, .config/gantry.toml
  pub fn find_config_path(path: &Path) -> Option<PathBuf> {
    let candidates = vec![
      path.join("gantry.toml"),
      path.join(".gantry.toml"),
      path.join(".config").join("gantry.toml"),
    ];

    candidates.into_iter().find(|p| p.exists())
  }

  /// Load and validate the config at an explicit path
  pub fn load_file(config_path: &Path) -> GantryResult<Self> {
    let content = fs::read_to_string(config_path)
      .with_context(|| format!("Failed to read config from {}", config_path.display()))?;
    let config: GantryConfig = toml_edit::de::from_str(&content)
      .with_context(|| format!("Failed to parse config from {}", config_path.display()))?;

    config
      .validate()
      .with_context(|| format!("Invalid configuration in {}", config_path.display()))?;

    Ok(config)
  }

  /// Check if config exists at the given path
  pub fn exists(path: &Path) -> bool {
    Self::find_config_path(path).is_some()
  }

  /// Validate the configuration
  pub fn validate(&self) -> GantryResult<()> {
    if self.build.manifest.is_empty() {
      return Err(GantryError::Config(ConfigError::MissingField {
        field: "build.manifest".to_string(),
      }));
    }

    if let Some(ref version) = self.version {
      version.current_version()?;

      let mut seen = std::collections::BTreeSet::new();
      for file in &version.files {
        if !seen.insert(file) {
          return Err(GantryError::message(format!(
            "Duplicate entry in [version] files: {}",
            file.display()
          )));
        }
      }
    }

    Ok(())
  }
}
