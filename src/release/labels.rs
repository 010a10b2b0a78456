//! Bump size from merge request labels
//!
//! `bump-major` and `bump-minor` labels pick the bump size; anything else,
//! including no labels at all, is a patch release. Labels arrive on the
//! command line or through `CI_MERGE_REQUEST_LABELS`, never from a hosting
//! API.
//!
//! This module also owns the merge reference regexes used to tell a
//! merge-request merge apart from a direct commit.

use crate::core::env::CiProvider;
use crate::core::error::{GantryError, GantryResult};
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::LazyLock;
use tracing::info;

/// Matches commit messages that reference a merge request, e.g.
/// "See merge request group/proj!42"
static GITLAB_MERGE_REF_RE: LazyLock<Regex> =
  LazyLock::new(|| Regex::new(r"(?im)(\S*/\S*!)(\d+)").expect("valid regex"));

/// Matches merge and squash commit messages that reference a pull request
/// number, e.g. "Merge pull request #7 from user/branch" or "Fix parser (#12)"
static GITHUB_MERGE_REF_RE: LazyLock<Regex> =
  LazyLock::new(|| Regex::new(r"(?im)(^Merge pull request #|[\w*\s*\(]#)(\d+)").expect("valid regex"));

/// Version bump size
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum VersionBump {
  /// Breaking change, bumps the major component
  Major,
  /// New functionality, bumps the minor component
  Minor,
  /// Everything else
  Patch,
}

impl VersionBump {
  /// Decide the bump size from merge request labels
  ///
  /// `bump-minor` wins over `bump-major` when both labels are present;
  /// unlabeled merge requests are patch releases.
  pub fn from_labels(labels: &[String]) -> Self {
    if labels.iter().any(|label| label == "bump-minor") {
      VersionBump::Minor
    } else if labels.iter().any(|label| label == "bump-major") {
      VersionBump::Major
    } else {
      VersionBump::Patch
    }
  }

  /// Parse a bump part name as it appears in plans
  pub fn from_part(s: &str) -> GantryResult<Self> {
    match s.to_lowercase().as_str() {
      "major" => Ok(Self::Major),
      "minor" => Ok(Self::Minor),
      "patch" => Ok(Self::Patch),
      _ => Err(GantryError::message(format!(
        "Unknown version part '{}'. Valid parts: major, minor, patch",
        s
      ))),
    }
  }

  /// Compute the next version for this bump size
  pub fn apply(&self, version: &semver::Version) -> semver::Version {
    match self {
      VersionBump::Major => semver::Version::new(version.major + 1, 0, 0),
      VersionBump::Minor => semver::Version::new(version.major, version.minor + 1, 0),
      VersionBump::Patch => semver::Version::new(version.major, version.minor, version.patch + 1),
    }
  }
}

impl fmt::Display for VersionBump {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    match self {
      VersionBump::Major => write!(f, "major"),
      VersionBump::Minor => write!(f, "minor"),
      VersionBump::Patch => write!(f, "patch"),
    }
  }
}

/// Regex recognizing the provider's merge reference in commit messages
pub fn merge_ref_regex(provider: CiProvider) -> &'static Regex {
  match provider {
    CiProvider::GitLab => &GITLAB_MERGE_REF_RE,
    CiProvider::Travis => &GITHUB_MERGE_REF_RE,
  }
}

/// Extract the merge request ID a commit message references, if any
pub fn merge_request_id(message: &str, provider: CiProvider) -> Option<String> {
  let captures = merge_ref_regex(provider).captures(message)?;
  let id = captures.get(2)?.as_str().to_string();
  info!("Found merge request ID {}", id);
  Some(id)
}
