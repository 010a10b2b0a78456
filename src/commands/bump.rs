//! `gantry bump` - Version bump, changelog, tag, and back-merge
//!
//! Builds a release plan from the merge request labels and the CI
//! environment, shows it, and executes it unless `--dry-run` was given.
//! Every mutating step goes through the plan so a dry run prints exactly
//! what a real run would do.

use crate::core::context::PipelineContext;
use crate::core::error::GantryResult;
use crate::core::plan::Operation;
use crate::core::vcs::SystemGit;
use crate::release::flow;
use crate::release::labels::VersionBump;
use std::path::PathBuf;
use tracing::info;

/// Run the bump command
pub fn run_bump(
  ctx: &PipelineContext,
  project: Option<String>,
  config_file: Option<PathBuf>,
  labels: Vec<String>,
  no_git_flow: bool,
  dry_run: bool,
) -> GantryResult<()> {
  let part = VersionBump::from_labels(&labels);
  info!("Bumping the {} version", part);

  let git = SystemGit::open(ctx.workspace_root())?;
  let plan = flow::plan(ctx, &git, part, project.as_deref(), config_file.as_deref(), no_git_flow)?;

  println!("{}", plan.to_human_readable());

  if dry_run {
    println!("🔍 Dry-run mode (no changes applied)");
    return Ok(());
  }

  flow::execute(&plan, ctx, &git)?;

  let tag = plan.operations.iter().find_map(|op| match op {
    Operation::CreateTag { name } => Some(name.as_str()),
    _ => None,
  });

  println!();
  match tag {
    Some(tag) => println!("✅ Release {} completed!", tag),
    None => println!("✅ Release completed!"),
  }

  Ok(())
}
