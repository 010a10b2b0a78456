//! Integration tests for the `bump` command
//!
//! These run the full release sequence against a local bare origin: version
//! bump, changelog, release commit, annotated tag, and the merge back into
//! develop.

use crate::helpers::{TestRepo, git, gitlab_release_env, run_gantry, run_gantry_expecting_failure};
use anyhow::Result;

fn rev(repo_path: &std::path::Path, refname: &str) -> Result<String> {
  let output = git(repo_path, &["rev-parse", refname])?;
  Ok(String::from_utf8_lossy(&output.stdout).trim().to_string())
}

#[test]
fn test_bump_full_release_flow() -> Result<()> {
  let repo = TestRepo::new()?;
  repo.merge_with_merge_request("master", "feature/login", "Add login page", 7)?;

  let vars = gitlab_release_env(&repo);
  let output = run_gantry(&repo.path, &["bump"], &vars)?;
  let stdout = String::from_utf8_lossy(&output.stdout);

  assert!(stdout.contains("✅ Release 1.0.1 completed!"), "got: {}", stdout);

  // Version bumped in place
  let config = repo.read_file("gantry.toml")?;
  assert!(config.contains(r#"current = "1.0.1""#), "got: {}", config);

  // Changelog created with the merge request title under the tag link
  let changelog = repo.read_file("CHANGELOG.md")?;
  assert_eq!(
    changelog,
    "## [1.0.1](https://gitlab.example.com/group/proj/-/tags/1.0.1)\n- Add login page\n"
  );

  // Annotated tag with the release message
  assert_eq!(repo.tags()?, vec!["1.0.1"]);
  let tag = repo.tag_object("1.0.1")?;
  assert!(tag.contains("Auto-bumping project to version 1.0.1 (skip-build)"), "got: {}", tag);

  // Branches and tag pushed to origin
  assert!(repo.origin_has_ref("refs/tags/1.0.1"));
  assert_eq!(rev(&repo.path, "master")?, rev(&repo.origin, "master")?);
  assert_eq!(rev(&repo.path, "develop")?, rev(&repo.origin, "develop")?);

  // Release merged back into develop
  let develop_log = repo.log_subjects("develop")?;
  assert!(
    develop_log.iter().any(|s| s.contains("Auto-bumping project to version 1.0.1")),
    "got: {:?}",
    develop_log
  );

  Ok(())
}

#[test]
fn test_bump_minor_label() -> Result<()> {
  let repo = TestRepo::new()?;
  repo.merge_with_merge_request("master", "feature/search", "Add search", 12)?;

  let vars = gitlab_release_env(&repo);
  run_gantry(&repo.path, &["bump", "--labels", "bump-minor"], &vars)?;

  let config = repo.read_file("gantry.toml")?;
  assert!(config.contains(r#"current = "1.1.0""#), "got: {}", config);
  assert_eq!(repo.tags()?, vec!["1.1.0"]);

  Ok(())
}

#[test]
fn test_bump_major_label() -> Result<()> {
  let repo = TestRepo::new()?;
  repo.merge_with_merge_request("master", "feature/v2", "New API surface", 20)?;

  let vars = gitlab_release_env(&repo);
  run_gantry(&repo.path, &["bump", "--labels", "bump-major"], &vars)?;

  let config = repo.read_file("gantry.toml")?;
  assert!(config.contains(r#"current = "2.0.0""#), "got: {}", config);

  Ok(())
}

#[test]
fn test_bump_minor_wins_over_major() -> Result<()> {
  let repo = TestRepo::new()?;
  repo.merge_with_merge_request("master", "feature/both", "Both labels set", 21)?;

  let vars = gitlab_release_env(&repo);
  run_gantry(&repo.path, &["bump", "--labels", "bump-major,bump-minor"], &vars)?;

  assert_eq!(repo.tags()?, vec!["1.1.0"]);

  Ok(())
}

#[test]
fn test_bump_dry_run_mutates_nothing() -> Result<()> {
  let repo = TestRepo::new()?;
  repo.merge_with_merge_request("master", "feature/login", "Add login page", 7)?;

  let vars = gitlab_release_env(&repo);
  let output = run_gantry(&repo.path, &["bump", "--dry-run"], &vars)?;
  let stdout = String::from_utf8_lossy(&output.stdout);

  assert!(stdout.contains("📋 Plan: bump ("), "got: {}", stdout);
  assert!(stdout.contains("Release 1.0.1 from branch master"), "got: {}", stdout);
  assert!(stdout.contains("Dry-run mode"), "got: {}", stdout);

  let config = repo.read_file("gantry.toml")?;
  assert!(config.contains(r#"current = "1.0.0""#), "version must not change");
  assert!(repo.tags()?.is_empty(), "no tag must be created");
  assert!(!repo.file_exists("CHANGELOG.md"), "no changelog must be written");

  Ok(())
}

#[test]
fn test_bump_no_git_flow_skips_develop() -> Result<()> {
  let repo = TestRepo::new()?;
  repo.merge_with_merge_request("master", "feature/login", "Add login page", 7)?;

  let vars = gitlab_release_env(&repo);
  run_gantry(&repo.path, &["bump", "--no-git-flow"], &vars)?;

  let develop_log = repo.log_subjects("develop")?;
  assert!(
    !develop_log.iter().any(|s| s.contains("Auto-bumping")),
    "develop must not receive the release, got: {:?}",
    develop_log
  );

  let master_log = repo.log_subjects("master")?;
  assert!(master_log.iter().any(|s| s.contains("Auto-bumping project to version 1.0.1")));

  Ok(())
}

#[test]
fn test_bump_requires_credentials() -> Result<()> {
  let repo = TestRepo::new()?;
  repo.merge_with_merge_request("master", "feature/login", "Add login page", 7)?;

  let vars: Vec<(&str, String)> = gitlab_release_env(&repo)
    .into_iter()
    .filter(|(key, _)| *key != "NPA_GITLAB_TOKEN")
    .collect();

  let output = run_gantry_expecting_failure(&repo.path, &["bump"], &vars)?;
  let stderr = String::from_utf8_lossy(&output.stderr);

  assert!(
    stderr.contains("Expected the following environment variable to be set: NPA_GITLAB_TOKEN"),
    "got: {}",
    stderr
  );

  // Planning failed before any mutation
  assert!(repo.tags()?.is_empty());
  let config = repo.read_file("gantry.toml")?;
  assert!(config.contains(r#"current = "1.0.0""#));

  Ok(())
}

#[test]
fn test_bump_collects_titles_of_merged_requests() -> Result<()> {
  let repo = TestRepo::new()?;

  // Two merge requests land on develop, then develop is released to master
  repo.merge_with_merge_request("develop", "feature/billing", "Add billing export", 31)?;
  repo.merge_with_merge_request("develop", "feature/splash", "Fix splash crash", 32)?;
  git(&repo.path, &["checkout", "master"])?;
  git(
    &repo.path,
    &[
      "merge",
      "--no-ff",
      "develop",
      "-m",
      "Merge branch 'develop' into 'master'\n\nRelease week 34\n\nSee merge request group/proj!33",
    ],
  )?;

  let vars = gitlab_release_env(&repo);
  run_gantry(&repo.path, &["bump"], &vars)?;

  let changelog = repo.read_file("CHANGELOG.md")?;
  assert!(changelog.contains("- Add billing export"), "got: {}", changelog);
  assert!(changelog.contains("- Fix splash crash"), "got: {}", changelog);
  assert!(
    !changelog.contains("Release week 34"),
    "release merge request title must not be listed, got: {}",
    changelog
  );

  Ok(())
}

#[test]
fn test_bump_direct_commit_falls_back_to_message() -> Result<()> {
  let repo = TestRepo::new()?;
  repo.modify_file("prod.conf", "replicas = 3\n")?;
  repo.commit("Quick fix for prod config")?;

  let vars = gitlab_release_env(&repo);
  run_gantry(&repo.path, &["bump"], &vars)?;

  let changelog = repo.read_file("CHANGELOG.md")?;
  assert!(changelog.contains("- Quick fix for prod config"), "got: {}", changelog);

  Ok(())
}

#[test]
fn test_bump_prepends_to_existing_changelog() -> Result<()> {
  let repo = TestRepo::new()?;
  repo.modify_file(
    "CHANGELOG.md",
    "## [1.0.0](https://gitlab.example.com/group/proj/-/tags/1.0.0)\n- First release\n",
  )?;
  repo.commit("Add changelog")?;
  repo.merge_with_merge_request("master", "feature/login", "Add login page", 7)?;

  let vars = gitlab_release_env(&repo);
  run_gantry(&repo.path, &["bump"], &vars)?;

  let changelog = repo.read_file("CHANGELOG.md")?;
  assert_eq!(
    changelog,
    "## [1.0.1](https://gitlab.example.com/group/proj/-/tags/1.0.1)\n\
     - Add login page\n\
     \n\
     ## [1.0.0](https://gitlab.example.com/group/proj/-/tags/1.0.0)\n\
     - First release\n"
  );

  Ok(())
}

#[test]
fn test_bump_android_bumps_secondary_config() -> Result<()> {
  let repo = TestRepo::new()?;
  repo.modify_file("android.toml", "[version]\ncurrent = \"5.0.0\"\n")?;
  repo.commit("Add android version config")?;
  repo.merge_with_merge_request("master", "feature/login", "Add login page", 7)?;

  let vars = gitlab_release_env(&repo);
  run_gantry(
    &repo.path,
    &["bump", "--project", "android", "--config-file", "android.toml"],
    &vars,
  )?;

  // Primary version takes the label bump, the android config always majors
  let config = repo.read_file("gantry.toml")?;
  assert!(config.contains(r#"current = "1.0.1""#), "got: {}", config);
  let android = repo.read_file("android.toml")?;
  assert!(android.contains(r#"current = "6.0.0""#), "got: {}", android);
  assert_eq!(repo.tags()?, vec!["1.0.1"]);

  Ok(())
}

#[test]
fn test_bump_android_without_config_file_fails() -> Result<()> {
  let repo = TestRepo::new()?;

  let vars = gitlab_release_env(&repo);
  let output = run_gantry_expecting_failure(&repo.path, &["bump", "--project", "android"], &vars)?;
  let stderr = String::from_utf8_lossy(&output.stderr);

  assert!(stderr.contains("requires --config-file"), "got: {}", stderr);
  assert!(repo.tags()?.is_empty());

  Ok(())
}
