//! Version state and rewrite
//!
//! The current version lives in a TOML config file under `[version] current`
//! (normally `gantry.toml` itself). Bumping edits the document through
//! `toml_edit` so comments and layout survive, then replaces the raw version
//! string in every file listed under `[version] files`.

use crate::core::error::{ConfigError, GantryError, GantryResult, ResultExt, ValidationError};
use crate::release::labels::VersionBump;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use toml_edit::DocumentMut;
use tracing::{error, info};

/// Version used for the tag when no config yields one
const DEFAULT_VERSION: &str = "1.0.0";

/// Old and new version of one config file bump
#[derive(Debug, Clone)]
pub struct AppliedBump {
  pub from: semver::Version,
  pub to: semver::Version,
}

/// Compute the versions a bump of `part` would move between, without writing
pub fn preview_bump(config_path: &Path, part: VersionBump) -> GantryResult<AppliedBump> {
  let doc = read_document(config_path)?;
  let from = current_version_in(&doc)?;
  let to = part.apply(&from);
  Ok(AppliedBump { from, to })
}

/// Bump the version in `config_path` in place and rewrite every listed file
///
/// `root` anchors the relative paths under `[version] files`. Returns the
/// versions actually moved between, which can differ from a stale preview.
pub fn apply_bump(root: &Path, config_path: &Path, part: VersionBump) -> GantryResult<AppliedBump> {
  let mut doc = read_document(config_path)?;
  let from = current_version_in(&doc)?;
  let to = part.apply(&from);

  info!("Bumping {} version: {} -> {}", part, from, to);

  let files = versioned_files(&doc);
  doc["version"]["current"] = toml_edit::value(to.to_string());
  fs::write(config_path, doc.to_string()).with_context(|| format!("Failed to write {}", config_path.display()))?;

  for file in &files {
    rewrite_version_string(&root.join(file), &from.to_string(), &to.to_string())?;
  }

  Ok(AppliedBump { from, to })
}

/// Version the release is tagged with
///
/// The primary config wins, then the secondary `--config-file`, else the
/// literal `1.0.0` with an error log.
pub fn read_back(primary: Option<&AppliedBump>, secondary: Option<&AppliedBump>) -> String {
  match primary.or(secondary) {
    Some(bump) => bump.to.to_string(),
    None => {
      error!("Could not read current version, using default");
      DEFAULT_VERSION.to_string()
    }
  }
}

fn read_document(path: &Path) -> GantryResult<DocumentMut> {
  let content =
    fs::read_to_string(path).with_context(|| format!("Failed to read version config from {}", path.display()))?;
  let doc = content
    .parse::<DocumentMut>()
    .with_context(|| format!("Failed to parse {}", path.display()))?;
  Ok(doc)
}

/// `[version] current` as semver, rejecting anything else
fn current_version_in(doc: &DocumentMut) -> GantryResult<semver::Version> {
  let current = doc
    .get("version")
    .and_then(|item| item.get("current"))
    .and_then(|item| item.as_str())
    .ok_or_else(|| {
      GantryError::Config(ConfigError::MissingField {
        field: "version.current".to_string(),
      })
    })?;

  semver::Version::parse(current).map_err(|_| {
    GantryError::Validation(ValidationError::InvalidVersion {
      value: current.to_string(),
    })
  })
}

/// Paths listed under `[version] files`, if any
fn versioned_files(doc: &DocumentMut) -> Vec<PathBuf> {
  doc
    .get("version")
    .and_then(|item| item.get("files"))
    .and_then(|item| item.as_array())
    .map(|array| array.iter().filter_map(|v| v.as_str()).map(PathBuf::from).collect())
    .unwrap_or_default()
}

/// Replace every occurrence of `old` with `new` in the file at `path`
fn rewrite_version_string(path: &Path, old: &str, new: &str) -> GantryResult<()> {
  let content = match fs::read_to_string(path) {
    Ok(content) => content,
    Err(err) if err.kind() == io::ErrorKind::NotFound => {
      return Err(GantryError::Config(ConfigError::VersionedFileMissing {
        path: path.to_path_buf(),
      }));
    }
    Err(err) => return Err(err.into()),
  };

  if !content.contains(old) {
    return Err(GantryError::with_help(
      format!("{} does not contain version {}", path.display(), old),
      "Update the [version] files list in gantry.toml or fix the file contents",
    ));
  }

  fs::write(path, content.replace(old, new)).with_context(|| format!("Failed to write {}", path.display()))?;
  info!("Rewrote version in {}", path.display());
  Ok(())
}
