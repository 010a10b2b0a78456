//! Tests for the `init` command

use crate::helpers::{run_gantry, run_gantry_expecting_failure};
use anyhow::Result;

#[test]
fn test_init_creates_config() -> Result<()> {
  let temp = tempfile::TempDir::new()?;
  let path = temp.path();

  let output = run_gantry(path, &["init"], &[])?;
  let stdout = String::from_utf8_lossy(&output.stdout);

  assert!(stdout.contains("✅ Created"), "got: {}", stdout);
  assert!(path.join("gantry.toml").exists());

  let config = std::fs::read_to_string(path.join("gantry.toml"))?;
  assert!(config.contains("[build]"));
  assert!(config.contains(r#"manifest = "Dockerfile""#));
  assert!(config.contains("[bump]"));
  assert!(config.contains("[version]"));
  assert!(config.contains(r#"current = "1.0.0""#));

  Ok(())
}

#[test]
fn test_init_refuses_to_overwrite() -> Result<()> {
  let temp = tempfile::TempDir::new()?;
  let path = temp.path();

  run_gantry(path, &["init"], &[])?;
  let before = std::fs::read_to_string(path.join("gantry.toml"))?;

  let output = run_gantry_expecting_failure(path, &["init"], &[])?;
  let stderr = String::from_utf8_lossy(&output.stderr);
  assert!(stderr.contains("already exists"), "got: {}", stderr);

  let after = std::fs::read_to_string(path.join("gantry.toml"))?;
  assert_eq!(before, after, "existing config must be left alone");

  Ok(())
}

#[test]
fn test_init_config_is_loadable() -> Result<()> {
  let temp = tempfile::TempDir::new()?;
  let path = temp.path();

  run_gantry(path, &["init"], &[])?;

  // The starter config must parse and validate on the next invocation
  let output = run_gantry(path, &["build", "--build", "tag", "--format", "names"], &[])?;
  let stdout = String::from_utf8_lossy(&output.stdout);
  assert!(stdout.trim().is_empty(), "no packages yet, got: {}", stdout);

  Ok(())
}
