//! `gantry init` - Write a starter gantry.toml
//!
//! Scaffolds a commented configuration in the current directory so teams can
//! adopt the tool without reading docs first. Refuses to overwrite an
//! existing configuration.

use crate::core::config::GantryConfig;
use crate::core::context::PipelineContext;
use crate::core::error::{ConfigError, GantryError, GantryResult, ResultExt};
use std::fs;

const STARTER_CONFIG: &str = r#"# gantry configuration
#
# `gantry build` walks the repository for package manifests and decides which
# packages a pipeline has to build. `gantry bump` bumps the version tracked
# below, updates the changelog and pushes an annotated tag.

[build]
# File that marks a directory as a buildable package
manifest = "Dockerfile"

# Language ecosystem used to resolve private dependencies: "go" or "node".
# Leave unset to skip dependency resolution and build changed packages only.
# repo_type = "go"

[build.fallbacks]
# Compare refs used when the CI environment gives us nothing better
feature = "develop"
stage = "master"

[bump]
# Branch released from, and the branch releases are merged back into
branch = "master"
develop_branch = "develop"
changelog = "CHANGELOG.md"

[version]
# Version of the repository, maintained by `gantry bump`
current = "1.0.0"

# Additional files whose version strings are rewritten on every bump
# files = ["helm/Chart.yaml"]
"#;

/// Run the init command
pub fn run_init(ctx: &PipelineContext) -> GantryResult<()> {
  let path = ctx.workspace_root().join("gantry.toml");

  if GantryConfig::exists(ctx.workspace_root()) {
    return Err(GantryError::Config(ConfigError::AlreadyExists { path }));
  }

  fs::write(&path, STARTER_CONFIG).with_context(|| format!("Failed to write {}", path.display()))?;

  println!("✅ Created {}", path.display());
  println!();
  println!("Next steps:");
  println!("  1. Set [build] repo_type to your ecosystem (go or node)");
  println!("  2. Set [version] current to the last released version");
  println!("  3. Run 'gantry build --dry-run' to preview change detection");

  Ok(())
}
