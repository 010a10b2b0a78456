//! Unified pipeline context - build once, pass everywhere
//!
//! # Design
//!
//! PipelineContext eliminates redundant config loads and scattered
//! `std::env` reads by capturing all job-level data once in main.rs, then
//! passing by reference to all commands.
//!
//! ```text
//! main.rs:
//!   PipelineContext::build() -> &PipelineContext
//!   |
//!   v
//! commands/build.rs, bump.rs, etc:
//!   fn run(ctx: &PipelineContext, ...)
//! ```

use crate::core::config::GantryConfig;
use crate::core::env::CiEnv;
use crate::core::error::GantryResult;
use std::path::{Path, PathBuf};
use std::sync::Arc;

/// Everything a command needs to know about the job it runs in.
///
/// Built once at startup, passed by reference to all commands. Config is
/// optional because `gantry init` runs before one exists and `gantry build`
/// works entirely on defaults.
#[derive(Clone)]
pub struct PipelineContext {
  /// Repository root directory (absolute path)
  pub root: PathBuf,

  /// Gantry configuration (gantry.toml), if present
  pub config: Option<Arc<GantryConfig>>,

  /// Path the configuration was loaded from, if present
  pub config_path: Option<PathBuf>,

  /// Captured CI job environment
  pub env: CiEnv,
}

impl PipelineContext {
  /// Build pipeline context from a root directory.
  ///
  /// Captures the CI environment and loads gantry.toml when one exists; a
  /// malformed config aborts here rather than mid-command.
  pub fn build(root: &Path) -> GantryResult<Self> {
    let root = root.to_path_buf();
    let config_path = GantryConfig::find_config_path(&root);
    let config = match config_path {
      Some(ref path) => Some(Arc::new(GantryConfig::load_file(path)?)),
      None => None,
    };

    Ok(Self {
      root,
      config,
      config_path,
      env: CiEnv::capture(),
    })
  }

  /// Effective config: the loaded one or all defaults.
  pub fn config_or_default(&self) -> GantryConfig {
    self
      .config
      .as_ref()
      .map(|c| c.as_ref().clone())
      .unwrap_or_default()
  }

  /// Repository root as Path reference (convenience)
  pub fn workspace_root(&self) -> &Path {
    &self.root
  }
}
