//! Change detection against a compare ref
//!
//! Which ref to diff against depends on what the CI hands us and, failing
//! that, on the kind of build. Every build type prefers the previous
//! pipeline commit; without one, feature builds fall back to the develop
//! branch, stage builds to master, prod builds to the previous commit.
//! Every fallback is logged, never fatal - a failed detection upstream
//! degrades to building everything.

use crate::core::config::FallbackConfig;
use crate::core::env::CiEnv;
use crate::core::error::{GantryError, GantryResult};
use crate::core::vcs::SystemGit;
use std::collections::BTreeSet;
use std::fmt;
use std::path::PathBuf;
use tracing::{debug, info, warn};

/// Kind of pipeline the build runs in
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BuildType {
  Feature,
  Stage,
  Prod,
  Tag,
}

impl BuildType {
  pub fn from_str(s: &str) -> GantryResult<Self> {
    match s {
      "feature" => Ok(BuildType::Feature),
      "stage" => Ok(BuildType::Stage),
      "prod" => Ok(BuildType::Prod),
      "tag" => Ok(BuildType::Tag),
      _ => Err(GantryError::with_help(
        format!("Unknown build type: {}", s),
        "Valid build types: feature, stage, prod, tag",
      )),
    }
  }
}

impl fmt::Display for BuildType {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    match self {
      BuildType::Feature => write!(f, "feature"),
      BuildType::Stage => write!(f, "stage"),
      BuildType::Prod => write!(f, "prod"),
      BuildType::Tag => write!(f, "tag"),
    }
  }
}

/// Changed files plus the directory set derived from them
#[derive(Debug, Clone)]
pub struct ChangeSet {
  /// Ref the working tree was diffed against
  pub compare: String,

  /// Changed file paths as git reported them
  pub files: Vec<PathBuf>,

  /// Parent directories of the changed files; root-level files map to `.`
  pub directories: BTreeSet<PathBuf>,
}

/// Pick the ref to diff against for this build.
///
/// `--since` always wins, then the previous pipeline commit
/// (CI_COMMIT_BEFORE_SHA) regardless of build type. Only when the CI hands
/// us neither does the per-build-type fallback apply, exactly like a first
/// pipeline on a fresh branch. Tag builds never diff, so this is not called
/// for them.
pub fn resolve_compare_ref(
  build_type: BuildType,
  since: Option<&str>,
  env: &CiEnv,
  fallbacks: &FallbackConfig,
) -> String {
  if let Some(explicit) = since {
    return explicit.to_string();
  }

  if let Some(sha) = env.pipeline_before_sha() {
    return sha.to_string();
  }

  let fallback = match build_type {
    BuildType::Feature => fallbacks.feature.clone(),
    BuildType::Stage => fallbacks.stage.clone(),
    BuildType::Prod | BuildType::Tag => "HEAD~1".to_string(),
  };
  warn!(
    "Could not find previous pipeline commit, comparing with '{}'",
    fallback
  );
  fallback
}

/// Diff the working tree against `compare` and derive changed directories.
pub fn detect(git: &SystemGit, compare: &str) -> GantryResult<ChangeSet> {
  let files = git.changed_files(compare)?;
  let directories = directories_of(&files);

  info!("Found {} changed paths comparing against {}", files.len(), compare);
  debug!("Changed directories: {:?}", directories);

  Ok(ChangeSet {
    compare: compare.to_string(),
    files,
    directories,
  })
}

/// Parent directories of changed files, with root-level files mapping to `.`
fn directories_of(files: &[PathBuf]) -> BTreeSet<PathBuf> {
  files
    .iter()
    .map(|f| match f.parent() {
      Some(parent) if !parent.as_os_str().is_empty() => parent.to_path_buf(),
      _ => PathBuf::from("."),
    })
    .collect()
}
