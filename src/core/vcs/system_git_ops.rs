//! Additional operations for SystemGit (diffs, history, release plumbing)

use super::system_git::SystemGit;
use crate::core::error::{GantryError, GantryResult, GitError, ResultExt};
use std::path::PathBuf;

impl SystemGit {
  /// Get files changed between a compare ref and the working tree
  ///
  /// Mirrors `git --no-pager diff --name-only <compare>`: the compare ref is
  /// diffed against what is currently checked out, which is what CI wants.
  pub fn changed_files(&self, compare: &str) -> GantryResult<Vec<PathBuf>> {
    let output = self
      .git_cmd()
      .args(["--no-pager", "diff", "--name-only", compare])
      .output()
      .context("Failed to run git diff")?;

    if !output.status.success() {
      let stderr = String::from_utf8_lossy(&output.stderr);
      return Err(GantryError::Git(GitError::CommandFailed {
        command: format!("git diff --name-only {}", compare),
        stderr: stderr.to_string(),
      }));
    }

    let files = String::from_utf8_lossy(&output.stdout)
      .lines()
      .map(str::trim)
      .filter(|l| !l.is_empty())
      .map(PathBuf::from)
      .collect();

    Ok(files)
  }

  /// Full commit message (subject + body) for a single ref
  pub fn commit_message(&self, refspec: &str) -> GantryResult<String> {
    let output = self
      .git_cmd()
      .args(["log", "-1", "--pretty=%B", refspec])
      .output()
      .context("Failed to read commit message")?;

    if !output.status.success() {
      let stderr = String::from_utf8_lossy(&output.stderr);
      return Err(GantryError::Git(GitError::CommandFailed {
        command: format!("git log -1 --pretty=%B {}", refspec),
        stderr: stderr.to_string(),
      }));
    }

    Ok(String::from_utf8_lossy(&output.stdout).trim().to_string())
  }

  /// Parent SHAs of HEAD (two entries for a merge commit)
  pub fn head_parents(&self) -> GantryResult<Vec<String>> {
    let output = self
      .git_cmd()
      .args(["log", "-1", "--pretty=%P"])
      .output()
      .context("Failed to read HEAD parents")?;

    if !output.status.success() {
      let stderr = String::from_utf8_lossy(&output.stderr);
      return Err(GantryError::Git(GitError::CommandFailed {
        command: "git log -1 --pretty=%P".to_string(),
        stderr: stderr.to_string(),
      }));
    }

    Ok(
      String::from_utf8_lossy(&output.stdout)
        .split_whitespace()
        .map(|s| s.to_string())
        .collect(),
    )
  }

  /// Full messages of all commits in a range, newest first
  ///
  /// Messages are NUL-separated on the wire so multi-line bodies survive.
  pub fn commit_messages_in_range(&self, range: &str) -> GantryResult<Vec<String>> {
    let output = self
      .git_cmd()
      .args(["log", "--pretty=%B%x00", range])
      .output()
      .context("Failed to list commit messages")?;

    if !output.status.success() {
      let stderr = String::from_utf8_lossy(&output.stderr);
      return Err(GantryError::Git(GitError::CommandFailed {
        command: format!("git log --pretty=%B%x00 {}", range),
        stderr: stderr.to_string(),
      }));
    }

    let messages = String::from_utf8_lossy(&output.stdout)
      .split('\0')
      .map(str::trim)
      .filter(|m| !m.is_empty())
      .map(|m| m.to_string())
      .collect();

    Ok(messages)
  }

  /// Checkout an existing branch
  pub fn checkout(&self, branch: &str) -> GantryResult<()> {
    let output = self
      .git_cmd()
      .args(["checkout", branch])
      .output()
      .context("Failed to checkout branch")?;

    if !output.status.success() {
      let stderr = String::from_utf8_lossy(&output.stderr);
      return Err(GantryError::Git(GitError::CommandFailed {
        command: format!("git checkout {}", branch),
        stderr: stderr.to_string(),
      }));
    }

    Ok(())
  }

  /// Pull the current branch from its upstream
  pub fn pull(&self) -> GantryResult<()> {
    let output = self.git_cmd().arg("pull").output().context("Failed to pull")?;

    if !output.status.success() {
      let stderr = String::from_utf8_lossy(&output.stderr);
      return Err(GantryError::Git(GitError::CommandFailed {
        command: "git pull".to_string(),
        stderr: stderr.to_string(),
      }));
    }

    Ok(())
  }

  /// Stage a single path
  pub fn add(&self, path: &str) -> GantryResult<()> {
    let output = self
      .git_cmd()
      .args(["add", path])
      .output()
      .context("Failed to stage file")?;

    if !output.status.success() {
      let stderr = String::from_utf8_lossy(&output.stderr);
      return Err(GantryError::Git(GitError::CommandFailed {
        command: format!("git add {}", path),
        stderr: stderr.to_string(),
      }));
    }

    Ok(())
  }

  /// Commit all tracked changes
  pub fn commit_all(&self, message: &str) -> GantryResult<()> {
    let output = self
      .git_cmd()
      .args(["commit", "-a", "-m", message])
      .output()
      .context("Failed to commit")?;

    if !output.status.success() {
      let stderr = String::from_utf8_lossy(&output.stderr);
      let stdout = String::from_utf8_lossy(&output.stdout);
      return Err(GantryError::Git(GitError::CommandFailed {
        command: "git commit -a".to_string(),
        stderr: format!("{}{}", stdout, stderr),
      }));
    }

    Ok(())
  }

  /// Push a branch, forwarding push options (e.g. `ci.skip`)
  pub fn push(&self, remote: &str, branch: &str, options: &[&str]) -> GantryResult<()> {
    let mut cmd = self.git_cmd();
    cmd.args(["push", remote, branch]);
    for option in options {
      cmd.args(["-o", option]);
    }

    let output = cmd.output().context("Failed to push")?;

    if !output.status.success() {
      let stderr = String::from_utf8_lossy(&output.stderr);
      return Err(GantryError::Git(GitError::PushFailed {
        remote: remote.to_string(),
        branch: branch.to_string(),
        reason: stderr.to_string(),
      }));
    }

    Ok(())
  }

  /// Push a branch along with all tags
  pub fn push_tags(&self, remote: &str, branch: &str) -> GantryResult<()> {
    let output = self
      .git_cmd()
      .args(["push", remote, branch, "--tags"])
      .output()
      .context("Failed to push tags")?;

    if !output.status.success() {
      let stderr = String::from_utf8_lossy(&output.stderr);
      return Err(GantryError::Git(GitError::PushFailed {
        remote: remote.to_string(),
        branch: branch.to_string(),
        reason: stderr.to_string(),
      }));
    }

    Ok(())
  }

  /// Create an annotated tag
  pub fn tag_annotated(&self, name: &str, message: &str) -> GantryResult<()> {
    let output = self
      .git_cmd()
      .args(["tag", "-a", name, "-m", message])
      .output()
      .context("Failed to create tag")?;

    if !output.status.success() {
      let stderr = String::from_utf8_lossy(&output.stderr);
      return Err(GantryError::Git(GitError::CommandFailed {
        command: format!("git tag -a {}", name),
        stderr: stderr.to_string(),
      }));
    }

    Ok(())
  }

  /// Merge a branch into the current one
  pub fn merge(&self, branch: &str) -> GantryResult<()> {
    let output = self
      .git_cmd()
      .args(["merge", branch])
      .output()
      .context("Failed to merge")?;

    if !output.status.success() {
      let stderr = String::from_utf8_lossy(&output.stderr);
      let stdout = String::from_utf8_lossy(&output.stdout);
      return Err(GantryError::Git(GitError::CommandFailed {
        command: format!("git merge {}", branch),
        stderr: format!("{}{}", stdout, stderr),
      }));
    }

    Ok(())
  }

  /// Point the push URL of a remote at an authenticated URL
  pub fn set_push_url(&self, remote: &str, url: &str) -> GantryResult<()> {
    let output = self
      .git_cmd()
      .args(["remote", "set-url", "--push", remote, url])
      .output()
      .context("Failed to set push URL")?;

    if !output.status.success() {
      let stderr = String::from_utf8_lossy(&output.stderr);
      return Err(GantryError::Git(GitError::CommandFailed {
        command: format!("git remote set-url --push {}", remote),
        stderr: stderr.to_string(),
      }));
    }

    Ok(())
  }

  /// Configure the committer identity for this repository
  pub fn set_identity(&self, email: &str, name: &str) -> GantryResult<()> {
    for (key, value) in [("user.email", email), ("user.name", name)] {
      let output = self
        .git_cmd()
        .args(["config", key, value])
        .output()
        .context("Failed to set git identity")?;

      if !output.status.success() {
        let stderr = String::from_utf8_lossy(&output.stderr);
        return Err(GantryError::Git(GitError::CommandFailed {
          command: format!("git config {}", key),
          stderr: stderr.to_string(),
        }));
      }
    }

    Ok(())
  }
}
