//! Private dependency resolution
//!
//! Per-package, repo-type-specific subprocess listing. Only dependencies that
//! live inside this repository matter for build impact; they are recognized
//! by the project's module prefix (Go) or npm scope (node) and mapped back to
//! repo-relative path prefixes.
//!
//! Listing shells out once per package, so packages are resolved in parallel.

use crate::core::env::CiEnv;
use crate::core::error::{GantryError, GantryResult, ResultExt};
use crate::impact::packages::PackageSet;
use crate::ui::progress::ResolveProgress;
use rayon::prelude::*;
use std::collections::{BTreeMap, BTreeSet};
use std::fmt;
use std::path::{Path, PathBuf};
use std::process::Command;
use tracing::debug;

/// Package name → private dependency path prefixes
pub type DependencyMap = BTreeMap<String, BTreeSet<PathBuf>>;

/// Language ecosystem the monorepo's packages are built with
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RepoType {
  Go,
  Node,
}

impl RepoType {
  pub fn from_str(s: &str) -> GantryResult<Self> {
    match s {
      "go" => Ok(RepoType::Go),
      "node" => Ok(RepoType::Node),
      _ => Err(GantryError::with_help(
        format!("Unknown repo type: {}", s),
        "Valid repo types: go, node",
      )),
    }
  }
}

impl fmt::Display for RepoType {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    match self {
      RepoType::Go => write!(f, "go"),
      RepoType::Node => write!(f, "node"),
    }
  }
}

/// Resolves private dependencies for every package of one repo type
pub struct DependencyResolver {
  root: PathBuf,
  repo_type: RepoType,
  /// Module prefix (Go) or package scope (node) marking repo-internal deps
  private_prefix: String,
}

impl DependencyResolver {
  /// Build a resolver, deriving the private prefix from the CI environment.
  pub fn new(root: &Path, repo_type: RepoType, env: &CiEnv) -> GantryResult<Self> {
    let private_prefix = match repo_type {
      RepoType::Go => env.go_module_prefix()?,
      RepoType::Node => env.node_scope_prefix()?,
    };

    Ok(Self {
      root: root.to_path_buf(),
      repo_type,
      private_prefix,
    })
  }

  /// Resolve all packages in parallel.
  ///
  /// Pass a progress handle only when stdout is not being parsed by a CI
  /// script (text output mode).
  pub fn resolve_all(&self, packages: &PackageSet, progress: Option<&ResolveProgress>) -> GantryResult<DependencyMap> {
    let entries: Vec<(&String, &PathBuf)> = packages.iter().collect();

    let resolved: Vec<(String, BTreeSet<PathBuf>)> = entries
      .par_iter()
      .map(|(name, path)| {
        let deps = self.resolve_one(name, path)?;
        if let Some(p) = progress {
          p.tick();
        }
        Ok(((*name).clone(), deps))
      })
      .collect::<GantryResult<Vec<_>>>()?;

    Ok(resolved.into_iter().collect())
  }

  fn resolve_one(&self, name: &str, path: &Path) -> GantryResult<BTreeSet<PathBuf>> {
    let deps = match self.repo_type {
      RepoType::Go => {
        // The first run may download modules and interleave that noise with
        // the listing; only the second, clean run is parsed.
        self.run_go_list(path)?;
        let output = self.run_go_list(path)?;
        parse_go_dependencies(&output, &self.private_prefix, path)
      }
      RepoType::Node => {
        let output = self.run_lerna_ls(name)?;
        parse_node_dependencies(&output, &self.private_prefix, name, path)
      }
    };

    debug!("{} private dependencies for {}", deps.len(), name);
    Ok(deps)
  }

  fn run_go_list(&self, package_path: &Path) -> GantryResult<String> {
    let mut cmd = Command::new("go");
    cmd.args(["list", "-deps=true"]).current_dir(self.root.join(package_path));
    run_lister(cmd, "go list -deps=true")
  }

  fn run_lerna_ls(&self, package_name: &str) -> GantryResult<String> {
    let scoped = format!("{}{}", self.private_prefix, package_name);
    let mut cmd = Command::new("lerna");
    cmd
      .args(["ls", "--scope", &scoped, "--include-filtered-dependencies"])
      .current_dir(&self.root);
    run_lister(cmd, "lerna ls")
  }
}

fn run_lister(mut cmd: Command, description: &str) -> GantryResult<String> {
  let output = cmd
    .output()
    .with_context(|| format!("Failed to execute {}", description))?;

  if !output.status.success() {
    let stderr = String::from_utf8_lossy(&output.stderr);
    return Err(GantryError::message(format!(
      "Dependency listing failed: {}\n{}",
      description, stderr
    )));
  }

  Ok(String::from_utf8_lossy(&output.stdout).into_owned())
}

/// Keep `go list` lines under the module prefix and strip it off.
///
/// The package's own import path comes back too and is dropped.
fn parse_go_dependencies(output: &str, prefix: &str, own_path: &Path) -> BTreeSet<PathBuf> {
  output
    .lines()
    .map(str::trim)
    .filter_map(|line| line.strip_prefix(prefix))
    .filter(|rest| !rest.is_empty())
    .map(PathBuf::from)
    .filter(|path| path != own_path)
    .collect()
}

/// Map scoped lerna package names back to repo paths.
///
/// Local packages share the parent directory of the package being resolved,
/// so `@proj/util` seen from `packages/api` maps to `packages/util`.
fn parse_node_dependencies(output: &str, scope: &str, package_name: &str, package_path: &Path) -> BTreeSet<PathBuf> {
  let parent = package_path.parent().filter(|p| !p.as_os_str().is_empty());

  output
    .lines()
    .filter_map(|line| line.split_whitespace().next())
    .filter_map(|token| token.strip_prefix(scope))
    .filter(|dep| !dep.is_empty() && *dep != package_name)
    .map(|dep| match parent {
      Some(p) => p.join(dep),
      None => PathBuf::from(dep),
    })
    .collect()
}
