//! Impact computation
//!
//! The rule, in full: a package is impacted iff some changed directory lies
//! under the package's own path, or under one of its private dependency path
//! prefixes. "Lies under" is component-wise - `a/b` covers `a/b/c` and `a/b`
//! itself but never `a/bc` - and the root package `.` covers everything.

use crate::impact::dependencies::DependencyMap;
use crate::impact::packages::PackageSet;
use serde::Serialize;
use std::collections::BTreeSet;
use std::fmt;
use std::path::{Path, PathBuf};

/// Why the build targets came out the way they did
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum PlanReason {
  /// Targets were computed from the change set
  Changes,
  /// GANTRY_FORCE_BUILD was set; every package is a target
  ForcedBuild,
  /// Tag pipeline; every package is a target
  TagBuild,
  /// Change or dependency detection failed; every package is a target
  DetectionFailed,
}

impl fmt::Display for PlanReason {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    match self {
      PlanReason::Changes => write!(f, "changes"),
      PlanReason::ForcedBuild => write!(f, "forced build"),
      PlanReason::TagBuild => write!(f, "tag build"),
      PlanReason::DetectionFailed => write!(f, "detection failed"),
    }
  }
}

/// Result of the impact computation
#[derive(Debug, Clone, Serialize)]
pub struct ImpactAnalysis {
  /// Packages whose own files changed
  pub direct: BTreeSet<String>,

  /// Packages pulled in through a private dependency (and not direct)
  pub via_dependencies: BTreeSet<String>,

  /// Union: every package that needs a container build
  pub build_targets: BTreeSet<String>,
}

impl ImpactAnalysis {
  /// Mark every package as a direct target (forced, tag and degraded builds)
  pub fn all_of(packages: &PackageSet) -> Self {
    let all: BTreeSet<String> = packages.names().into_iter().collect();
    Self {
      direct: all.clone(),
      via_dependencies: BTreeSet::new(),
      build_targets: all,
    }
  }

  pub fn is_empty(&self) -> bool {
    self.build_targets.is_empty()
  }
}

/// Apply the two-level prefix rule.
pub fn analyze(packages: &PackageSet, changed_dirs: &BTreeSet<PathBuf>, dependencies: &DependencyMap) -> ImpactAnalysis {
  let mut direct = BTreeSet::new();
  let mut via_dependencies = BTreeSet::new();

  for (name, path) in packages.iter() {
    if changed_dirs.iter().any(|dir| path_covers(path, dir)) {
      direct.insert(name.clone());
      continue;
    }

    if let Some(deps) = dependencies.get(name)
      && deps
        .iter()
        .any(|dep| changed_dirs.iter().any(|dir| path_covers(dep, dir)))
    {
      via_dependencies.insert(name.clone());
    }
  }

  let build_targets = direct.union(&via_dependencies).cloned().collect();

  ImpactAnalysis {
    direct,
    via_dependencies,
    build_targets,
  }
}

/// Component-wise "lies under": the root prefix `.` covers every path.
fn path_covers(prefix: &Path, candidate: &Path) -> bool {
  if prefix == Path::new(".") {
    return true;
  }
  candidate.starts_with(prefix)
}
