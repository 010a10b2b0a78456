//! Integration tests for the `build` command

use crate::helpers::{TestRepo, run_gantry, run_gantry_expecting_failure};
use anyhow::Result;

#[test]
fn test_build_dry_run_lists_changed_directories() -> Result<()> {
  let repo = TestRepo::new()?;
  repo.add_package("svc-a")?;
  repo.add_package("svc-b")?;
  repo.commit("Add services")?;

  repo.modify_file("svc-a/app.conf", "name = svc-a\nport = 8080\n")?;
  repo.commit("Tune svc-a")?;

  let output = run_gantry(&repo.path, &["build", "--since", "HEAD~1", "--dry-run"], &[])?;
  let stdout = String::from_utf8_lossy(&output.stdout);

  assert!(stdout.contains("DRY RUN"), "should announce dry run, got: {}", stdout);
  assert!(stdout.contains("svc-a"), "changed directory should be listed");
  assert!(!stdout.contains("svc-b"), "unchanged directory should not be listed");

  Ok(())
}

#[test]
fn test_build_without_repo_type_builds_everything() -> Result<()> {
  let repo = TestRepo::new()?;
  repo.add_package("svc-a")?;
  repo.add_package("svc-b")?;
  repo.commit("Add services")?;

  repo.modify_file("svc-a/app.conf", "name = svc-a\nport = 8080\n")?;
  repo.commit("Tune svc-a")?;

  // No repo type configured: dependency resolution is impossible, so the
  // command falls back to building every package instead of failing the job.
  let output = run_gantry(&repo.path, &["build", "--since", "HEAD~1", "--format", "names"], &[])?;
  let stdout = String::from_utf8_lossy(&output.stdout);
  let names: Vec<&str> = stdout.lines().collect();

  assert!(names.contains(&"svc-a"), "got: {:?}", names);
  assert!(names.contains(&"svc-b"), "got: {:?}", names);

  Ok(())
}

#[test]
fn test_build_forced_builds_everything() -> Result<()> {
  let repo = TestRepo::new()?;
  repo.add_package("svc-a")?;
  repo.add_package("svc-b")?;
  repo.commit("Add services")?;

  let vars = [("GANTRY_FORCE_BUILD", "1".to_string())];
  let output = run_gantry(&repo.path, &["build", "--format", "names"], &vars)?;
  let stdout = String::from_utf8_lossy(&output.stdout);

  assert!(stdout.lines().any(|l| l == "svc-a"));
  assert!(stdout.lines().any(|l| l == "svc-b"));

  Ok(())
}

#[test]
fn test_build_tag_type_builds_everything() -> Result<()> {
  let repo = TestRepo::new()?;
  repo.add_package("svc-a")?;
  repo.add_package("svc-b")?;
  repo.commit("Add services")?;

  let output = run_gantry(&repo.path, &["build", "--build", "tag", "--format", "json"], &[])?;
  let json: serde_json::Value = serde_json::from_slice(&output.stdout).expect("Should be valid JSON");

  assert_eq!(json["reason"], "tag_build");
  let targets = json["impact"]["build_targets"].as_array().expect("build_targets array");
  assert_eq!(targets.len(), 2);

  Ok(())
}

#[test]
fn test_build_tag_env_forces_full_build() -> Result<()> {
  let repo = TestRepo::new()?;
  repo.add_package("svc-a")?;
  repo.commit("Add service")?;

  // A pipeline running for a tag builds everything even as a feature build
  let vars = [("CI_COMMIT_TAG", "2.0.0".to_string())];
  let output = run_gantry(&repo.path, &["build", "--format", "json"], &vars)?;
  let json: serde_json::Value = serde_json::from_slice(&output.stdout).expect("Should be valid JSON");

  assert_eq!(json["reason"], "tag_build");

  Ok(())
}

#[test]
fn test_build_json_reports_detection_failure() -> Result<()> {
  let repo = TestRepo::new()?;
  repo.add_package("svc-a")?;
  repo.add_package("svc-b")?;
  repo.commit("Add services")?;

  repo.modify_file("svc-a/app.conf", "name = svc-a\nport = 9090\n")?;
  repo.commit("Tune svc-a")?;

  let output = run_gantry(&repo.path, &["build", "--since", "HEAD~1", "--format", "json"], &[])?;
  let json: serde_json::Value = serde_json::from_slice(&output.stdout).expect("Should be valid JSON");

  assert_eq!(json["reason"], "detection_failed");
  assert_eq!(json["summary"]["build_targets_count"], 2);
  let plan_id = json["plan_id"].as_str().expect("plan_id string");
  assert_eq!(plan_id.len(), 64);
  assert!(json["head_commit"].as_str().is_some());

  Ok(())
}

#[test]
fn test_build_nothing_to_build() -> Result<()> {
  let repo = TestRepo::new()?;
  repo.modify_file("README.md", "# proj\n")?;
  repo.commit("Add readme")?;

  // Changed files but no package manifests anywhere
  let vars = [("CI_PROJECT_NAME", "proj".to_string())];
  let output = run_gantry(
    &repo.path,
    &["build", "--since", "HEAD~1", "--repo-type", "node", "--format", "text"],
    &vars,
  )?;
  let stdout = String::from_utf8_lossy(&output.stdout);

  assert!(stdout.contains("Nothing to build"), "got: {}", stdout);
  assert!(stdout.contains("Reason: changes"), "got: {}", stdout);

  Ok(())
}

#[test]
fn test_build_unknown_build_type_fails() -> Result<()> {
  let repo = TestRepo::new()?;

  let output = run_gantry_expecting_failure(&repo.path, &["build", "--build", "nightly"], &[])?;
  let stderr = String::from_utf8_lossy(&output.stderr);

  assert!(stderr.contains("Unknown build type"), "got: {}", stderr);

  Ok(())
}

#[test]
fn test_build_unknown_repo_type_fails_instead_of_degrading() -> Result<()> {
  let repo = TestRepo::new()?;
  repo.add_package("svc-a")?;
  repo.commit("Add service")?;

  repo.modify_file("svc-a/app.conf", "name = svc-a\nport = 1234\n")?;
  repo.commit("Tune svc-a")?;

  // A typoed repo type is an invocation error, not a detection failure
  let output = run_gantry_expecting_failure(
    &repo.path,
    &["build", "--since", "HEAD~1", "--repo-type", "rust"],
    &[],
  )?;
  let stderr = String::from_utf8_lossy(&output.stderr);

  assert!(stderr.contains("Unknown repo type"), "got: {}", stderr);

  Ok(())
}

#[test]
fn test_build_duplicate_package_names_fail() -> Result<()> {
  let repo = TestRepo::new()?;
  repo.add_package("services/api")?;
  repo.add_package("legacy/api")?;
  repo.commit("Add colliding packages")?;

  let vars = [("GANTRY_FORCE_BUILD", "1".to_string())];
  let output = run_gantry_expecting_failure(&repo.path, &["build", "--format", "names"], &vars)?;
  let stderr = String::from_utf8_lossy(&output.stderr);

  assert!(stderr.contains("api"), "got: {}", stderr);

  Ok(())
}
