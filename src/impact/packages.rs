//! Package discovery over build manifests
//!
//! A package is a directory containing a container build manifest (Dockerfile
//! unless configured otherwise). Discovery walks the tree once per invocation;
//! the resulting name → path map is the unit of everything downstream.

use crate::core::error::{GantryError, GantryResult, ValidationError};
use std::collections::BTreeMap;
use std::path::{Component, Path, PathBuf};
use tracing::info;

/// Discovered packages: name → directory path relative to the root.
///
/// A manifest in the repository root yields the path `.` and takes the
/// project's name instead of a directory basename.
#[derive(Debug, Clone)]
pub struct PackageSet {
  packages: BTreeMap<String, PathBuf>,
}

impl PackageSet {
  /// Discover packages under `root` by looking for files named `manifest`.
  ///
  /// `project_name` names the root package when the manifest sits directly in
  /// the repository root. Hidden directories (`.git` and friends) are never
  /// packages. Two directories sharing a basename is an error: the basename
  /// is the package name and build targets must be unambiguous.
  pub fn discover(root: &Path, manifest: &str, project_name: &str) -> GantryResult<Self> {
    // The root is a literal path; only the manifest part may glob.
    let root_glob = glob::Pattern::escape(&root.display().to_string());
    let pattern = format!("{}/**/{}", root_glob, manifest);
    let mut packages: BTreeMap<String, PathBuf> = BTreeMap::new();

    for entry in glob::glob(&pattern)? {
      let manifest_path = entry?;
      let relative = manifest_path.strip_prefix(root)?;
      let dir = relative.parent().unwrap_or_else(|| Path::new(""));

      if is_hidden(dir) {
        continue;
      }

      let (name, path) = match dir.file_name() {
        Some(basename) => (basename.to_string_lossy().to_string(), dir.to_path_buf()),
        None => (project_name.to_string(), PathBuf::from(".")),
      };

      if let Some(existing) = packages.get(&name) {
        return Err(GantryError::Validation(ValidationError::DuplicatePackage {
          name,
          first: existing.clone(),
          second: path,
        }));
      }

      packages.insert(name, path);
    }

    info!("Found {} packages to build", packages.len());

    Ok(Self { packages })
  }

  /// Build a set from known entries without touching the filesystem
  #[cfg(test)]
  pub fn from_entries(entries: impl IntoIterator<Item = (String, PathBuf)>) -> Self {
    Self {
      packages: entries.into_iter().collect(),
    }
  }

  /// Iterate packages in name order
  pub fn iter(&self) -> impl Iterator<Item = (&String, &PathBuf)> {
    self.packages.iter()
  }

  /// All package names, sorted
  pub fn names(&self) -> Vec<String> {
    self.packages.keys().cloned().collect()
  }

  /// Directory of a package
  #[cfg(test)]
  pub fn path_of(&self, name: &str) -> Option<&PathBuf> {
    self.packages.get(name)
  }

  pub fn len(&self) -> usize {
    self.packages.len()
  }

  pub fn is_empty(&self) -> bool {
    self.packages.is_empty()
  }
}

/// Any path component starting with a dot hides the directory
fn is_hidden(dir: &Path) -> bool {
  dir.components().any(|c| match c {
    Component::Normal(name) => name.to_string_lossy().starts_with('.'),
    _ => false,
  })
}
