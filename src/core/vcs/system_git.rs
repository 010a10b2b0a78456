//! System git backend - shells out to the `git` binary
//!
//! CI runners always have git on PATH, and the release flow depends on the
//! same transport behavior the runner itself uses (credential rewriting,
//! push options). Every subprocess runs with a scrubbed environment so
//! local git config cannot change what happens in a pipeline.

use crate::core::error::{GantryError, GantryResult, GitError, ResultExt};
use std::path::{Path, PathBuf};
use std::process::Command;

/// Handle to a git checkout, anchored at the resolved work tree root
pub struct SystemGit {
  /// Directory the command was invoked from (any path inside the checkout)
  pub(crate) repo_path: PathBuf,

  /// Repository root as resolved by `git rev-parse --show-toplevel`
  pub(crate) work_tree: PathBuf,
}

impl SystemGit {
  /// Open the repository containing `path`
  ///
  /// Resolves the work tree root in one subprocess call, so running from a
  /// nested package directory still anchors discovery at the repo root.
  pub fn open(path: &Path) -> GantryResult<Self> {
    let output = Command::new("git")
      .arg("-C")
      .arg(path)
      .args(["rev-parse", "--show-toplevel"])
      .output()
      .context("could not spawn git rev-parse")?;

    if !output.status.success() {
      let stderr = String::from_utf8_lossy(&output.stderr);
      if stderr.contains("not a git repository") {
        return Err(GantryError::Git(GitError::RepoNotFound {
          path: path.to_path_buf(),
        }));
      }
      return Err(GantryError::message(format!("Failed to open git repository: {}", stderr)));
    }

    let work_tree = String::from_utf8_lossy(&output.stdout).trim().to_string();

    Ok(Self {
      repo_path: path.to_path_buf(),
      work_tree: PathBuf::from(work_tree),
    })
  }

  /// Work tree root as reported by git
  pub fn work_tree(&self) -> &Path {
    &self.work_tree
  }

  /// SHA of the commit currently checked out
  ///
  /// Works on a detached HEAD, which is how GitLab CI checks out the
  /// pipeline ref.
  pub fn head_commit(&self) -> GantryResult<String> {
    let output = self
      .git_cmd()
      .args(["rev-parse", "HEAD"])
      .output()
      .context("Failed to resolve HEAD")?;

    if !output.status.success() {
      return Err(GantryError::Git(GitError::CommandFailed {
        command: "git rev-parse HEAD".to_string(),
        stderr: String::from_utf8_lossy(&output.stderr).to_string(),
      }));
    }

    Ok(String::from_utf8_lossy(&output.stdout).trim().to_string())
  }

  /// Base command for every git subprocess
  ///
  /// The environment is cleared down to PATH and HOME, and a few config
  /// overrides pin behavior that user or system config could otherwise
  /// change out from under the pipeline.
  pub(crate) fn git_cmd(&self) -> Command {
    let mut cmd = Command::new("git");

    cmd.arg("-C").arg(&self.repo_path);

    cmd.env_clear();
    if let Ok(path) = std::env::var("PATH") {
      cmd.env("PATH", path);
    }
    if let Ok(home) = std::env::var("HOME") {
      cmd.env("HOME", home);
    }

    cmd.arg("-c").arg("protocol.version=2");
    cmd.arg("-c").arg("advice.detachedHead=false");
    cmd.arg("-c").arg("core.quotePath=false"); // Non-ASCII paths stay literal

    cmd
  }
}
