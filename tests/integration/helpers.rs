//! Shared fixtures for the integration suite

use anyhow::{Context, Result};
use std::path::{Path, PathBuf};
use std::process::{Command, Output};
use tempfile::TempDir;

/// Environment variables the binary reads, cleared before every run so the
/// host CI cannot leak into assertions.
const CI_VARS: &[&str] = &[
  "CI_PROJECT_URL",
  "CI_PROJECT_NAME",
  "CI_REPOSITORY_URL",
  "CI_COMMIT_BEFORE_SHA",
  "CI_COMMIT_TAG",
  "CI_COMMIT_BRANCH",
  "CI_MERGE_REQUEST_LABELS",
  "GANTRY_FORCE_BUILD",
  "NPA_GITLAB_TOKEN",
  "NPA_EMAIL",
  "TRAVIS",
  "TRAVIS_BRANCH",
  "TRAVIS_REPO_SLUG",
  "GH_TOKEN",
];

/// A monorepo under test: a working clone plus a bare origin it pushes to
pub struct TestRepo {
  _root: TempDir,
  pub path: PathBuf,
  pub origin: PathBuf,
}

impl TestRepo {
  /// Create a repo with a gantry.toml, master and develop branches, and a
  /// bare origin that accepts push options
  pub fn new() -> Result<Self> {
    let root = TempDir::new()?;
    let path = root.path().join("work");
    let origin = root.path().join("origin.git");

    std::fs::create_dir_all(&path)?;
    git(&path, &["init", "--initial-branch=master"])?;
    git(&path, &["config", "user.name", "Test User"])?;
    git(&path, &["config", "user.email", "test@example.com"])?;

    std::fs::write(
      path.join("gantry.toml"),
      r#"[build]
manifest = "Dockerfile"

[bump]
branch = "master"
develop_branch = "develop"
changelog = "CHANGELOG.md"

[version]
current = "1.0.0"
"#,
    )?;

    git(&path, &["add", "."])?;
    git(&path, &["commit", "-m", "Initial repository setup"])?;

    git(root.path(), &["init", "--bare", "origin.git"])?;
    git(&origin, &["config", "receive.advertisePushOptions", "true"])?;
    git(&path, &["remote", "add", "origin", &format!("file://{}", origin.display())])?;
    git(&path, &["push", "-u", "origin", "master"])?;
    git(&path, &["branch", "develop"])?;
    git(&path, &["push", "origin", "develop"])?;

    Ok(Self { _root: root, path, origin })
  }

  /// Add a package directory holding the manifest file
  pub fn add_package(&self, name: &str) -> Result<()> {
    let package_path = self.path.join(name);
    std::fs::create_dir_all(&package_path)?;
    std::fs::write(package_path.join("Dockerfile"), "FROM alpine:3.20\n")?;
    std::fs::write(package_path.join("app.conf"), format!("name = {}\n", name))?;
    Ok(())
  }

  /// Commit current changes and return the commit SHA
  pub fn commit(&self, message: &str) -> Result<String> {
    git(&self.path, &["add", "."])?;
    git(&self.path, &["commit", "-m", message])?;

    let output = git(&self.path, &["rev-parse", "HEAD"])?;
    Ok(String::from_utf8_lossy(&output.stdout).trim().to_string())
  }

  /// Overwrite a file relative to the repo root
  pub fn modify_file(&self, relative: &str, content: &str) -> Result<()> {
    std::fs::write(self.path.join(relative), content)?;
    Ok(())
  }

  /// Merge a fresh feature branch into `target` with a GitLab-style merge
  /// commit carrying the merge request title and reference
  pub fn merge_with_merge_request(&self, target: &str, feature: &str, title: &str, mr_number: u32) -> Result<()> {
    git(&self.path, &["checkout", target])?;
    git(&self.path, &["checkout", "-b", feature])?;

    let file = format!("{}.txt", feature.replace('/', "-"));
    std::fs::write(self.path.join(&file), format!("{}\n", title))?;
    git(&self.path, &["add", "."])?;
    git(&self.path, &["commit", "-m", title])?;

    git(&self.path, &["checkout", target])?;
    let message = format!(
      "Merge branch '{}' into '{}'\n\n{}\n\nSee merge request group/proj!{}",
      feature, target, title, mr_number
    );
    git(&self.path, &["merge", "--no-ff", feature, "-m", &message])?;
    Ok(())
  }

  /// Commit subjects of a branch, newest first
  pub fn log_subjects(&self, branch: &str) -> Result<Vec<String>> {
    let output = git(&self.path, &["log", branch, "--pretty=%s"])?;
    Ok(
      String::from_utf8_lossy(&output.stdout)
        .lines()
        .map(String::from)
        .collect(),
    )
  }

  /// All tag names in the working repo
  pub fn tags(&self) -> Result<Vec<String>> {
    let output = git(&self.path, &["tag", "-l"])?;
    Ok(
      String::from_utf8_lossy(&output.stdout)
        .lines()
        .map(String::from)
        .collect(),
    )
  }

  /// Full annotated tag object, failing for lightweight tags
  pub fn tag_object(&self, name: &str) -> Result<String> {
    let output = git(&self.path, &["cat-file", "tag", &format!("refs/tags/{}", name)])?;
    Ok(String::from_utf8_lossy(&output.stdout).to_string())
  }

  /// Whether the bare origin has a ref (branch or tag)
  pub fn origin_has_ref(&self, refname: &str) -> bool {
    Command::new("git")
      .current_dir(&self.origin)
      .args(["rev-parse", "--verify", "--quiet", refname])
      .output()
      .map(|o| o.status.success())
      .unwrap_or(false)
  }

  /// Check if a file exists relative to the repo root
  pub fn file_exists(&self, relative: &str) -> bool {
    self.path.join(relative).exists()
  }

  /// Read a file relative to the repo root
  pub fn read_file(&self, relative: &str) -> Result<String> {
    Ok(std::fs::read_to_string(self.path.join(relative))?)
  }
}

/// CI variables for a GitLab release job pushing to the local origin
pub fn gitlab_release_env(repo: &TestRepo) -> Vec<(&'static str, String)> {
  vec![
    ("CI_PROJECT_URL", "https://gitlab.example.com/group/proj".to_string()),
    ("CI_PROJECT_NAME", "proj".to_string()),
    ("CI_REPOSITORY_URL", format!("file://{}", repo.origin.display())),
    ("NPA_GITLAB_TOKEN", "test-token".to_string()),
    ("NPA_EMAIL", "release-bot@example.com".to_string()),
    ("CI_COMMIT_BRANCH", "master".to_string()),
  ]
}

/// Invoke git in `cwd` and capture its output
pub fn git(cwd: &Path, args: &[&str]) -> Result<Output> {
  let output = Command::new("git")
    .current_dir(cwd)
    .args(args)
    .output()
    .context("could not spawn git")?;

  if !output.status.success() {
    let stderr = String::from_utf8_lossy(&output.stderr);
    anyhow::bail!("git {} failed:\n{}", args.join(" "), stderr);
  }

  Ok(output)
}

/// Run gantry with a controlled CI environment, expecting success
pub fn run_gantry(cwd: &Path, args: &[&str], vars: &[(&str, String)]) -> Result<Output> {
  let output = gantry_command(cwd, args, vars)
    .output()
    .context("Failed to run gantry")?;

  if !output.status.success() {
    let stderr = String::from_utf8_lossy(&output.stderr);
    let stdout = String::from_utf8_lossy(&output.stdout);
    anyhow::bail!(
      "gantry command failed: gantry {}\nstdout: {}\nstderr: {}",
      args.join(" "),
      stdout,
      stderr
    );
  }

  Ok(output)
}

/// Run gantry expecting failure, returning the raw output
pub fn run_gantry_expecting_failure(cwd: &Path, args: &[&str], vars: &[(&str, String)]) -> Result<Output> {
  let output = gantry_command(cwd, args, vars)
    .output()
    .context("Failed to run gantry")?;

  if output.status.success() {
    anyhow::bail!("gantry {} succeeded but failure was expected", args.join(" "));
  }

  Ok(output)
}

fn gantry_command(cwd: &Path, args: &[&str], vars: &[(&str, String)]) -> Command {
  let mut cmd = Command::new(env!("CARGO_BIN_EXE_gantry"));
  cmd.current_dir(cwd).args(args);

  for var in CI_VARS {
    cmd.env_remove(var);
  }
  for (key, value) in vars {
    cmd.env(key, value);
  }

  cmd
}
