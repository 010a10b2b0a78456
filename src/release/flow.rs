//! The bump git sequence
//!
//! Assembles the release as a `Plan` of typed operations, printed under
//! `--dry-run` and executed otherwise. The order is the one the pipelines
//! rely on: authenticate the push remote, sync the release branch, bump and
//! changelog, commit and push with ci.skip, tag, then merge back to develop
//! unless git flow is disabled.
//!
//! Missing release credentials abort during planning, before any mutation.

use crate::core::context::PipelineContext;
use crate::core::env::CiProvider;
use crate::core::error::{GantryError, GantryResult};
use crate::core::plan::{Operation, Plan};
use crate::core::vcs::SystemGit;
use crate::release::changelog;
use crate::release::labels::VersionBump;
use crate::release::version::{self, AppliedBump};
use std::path::Path;
use tracing::info;

/// Assemble the release plan for one bump run
pub fn plan(
  ctx: &PipelineContext,
  git: &SystemGit,
  part: VersionBump,
  project_type: Option<&str>,
  config_file: Option<&Path>,
  no_git_flow: bool,
) -> GantryResult<Plan> {
  let config = ctx.config_or_default();
  let env = &ctx.env;
  let root = git.work_tree();

  let branch = env.branch().unwrap_or(&config.bump.branch).to_string();
  info!("Using branch {}", branch);

  let (email, name) = env.identity()?;
  // Credentials are verified up front; the executor resolves the push URL
  // again when it applies SetPushUrl, so the plan never carries it.
  env.push_url()?;

  let android = project_type == Some("android");
  if android && config_file.is_none() {
    return Err(GantryError::with_help(
      "--project android requires --config-file",
      "Pass the version-code config, e.g. --config-file android-version.toml",
    ));
  }

  let primary = match (&ctx.config_path, ctx.config.as_ref().and_then(|c| c.version.as_ref())) {
    (Some(path), Some(version_config)) => {
      let from = version_config.current_version()?;
      let to = part.apply(&from);
      let relative = path.strip_prefix(root).unwrap_or(path).display().to_string();
      Some((relative, AppliedBump { from, to }))
    }
    _ => None,
  };

  let secondary = match config_file {
    Some(file) if android => {
      let preview = version::preview_bump(&root.join(file), VersionBump::Major)?;
      Some((file.display().to_string(), preview))
    }
    _ => None,
  };

  let tag = version::read_back(primary.as_ref().map(|(_, b)| b), secondary.as_ref().map(|(_, b)| b));
  info!("Generated new tag version {}", tag);

  let mut plan = Plan::new().with_summary(format!("Release {} from branch {}", tag, branch));

  plan.add_operation(Operation::SetPushUrl {
    remote: "origin".to_string(),
  });
  plan.add_operation(Operation::Checkout { branch: branch.clone() });
  plan.add_operation(Operation::Pull);
  plan.add_operation(Operation::ConfigureIdentity { email, name });

  if let Some((config, bump)) = &primary {
    plan.add_operation(Operation::BumpVersion {
      config: config.clone(),
      part: part.to_string(),
      from: bump.from.to_string(),
      to: bump.to.to_string(),
    });
  }

  if let Some((config, bump)) = &secondary {
    plan.add_operation(Operation::BumpVersion {
      config: config.clone(),
      part: VersionBump::Major.to_string(),
      from: bump.from.to_string(),
      to: bump.to.to_string(),
    });
  }

  // TODO: changelog links for GitHub releases; GitLab-only until then
  if env.provider() == CiProvider::GitLab {
    env.require_project_url()?;
    let changes = changelog::collect_changes(git, env.provider())?;
    plan.add_operation(Operation::WriteChangelog {
      path: config.bump.changelog.clone(),
      tag: tag.clone(),
      changes,
    });
  }

  plan.add_operation(Operation::CommitAll {
    message: commit_message(&tag),
  });
  plan.add_operation(Operation::Push {
    remote: "origin".to_string(),
    branch: branch.clone(),
    skip_ci: true,
  });
  plan.add_operation(Operation::CreateTag { name: tag.clone() });
  plan.add_operation(Operation::PushTags {
    remote: "origin".to_string(),
    branch: branch.clone(),
  });

  if !no_git_flow {
    let develop = config.bump.develop_branch.clone();
    plan.add_operation(Operation::Checkout { branch: develop.clone() });
    plan.add_operation(Operation::Merge { branch });
    plan.add_operation(Operation::Push {
      remote: "origin".to_string(),
      branch: develop,
      skip_ci: true,
    });
  }

  Ok(plan)
}

/// Execute a plan against the repository, operation by operation
pub fn execute(plan: &Plan, ctx: &PipelineContext, git: &SystemGit) -> GantryResult<()> {
  info!("Executing plan {} ({} operations)", plan.id, plan.len());

  for operation in &plan.operations {
    apply(operation, ctx, git)?;
  }

  Ok(())
}

fn apply(operation: &Operation, ctx: &PipelineContext, git: &SystemGit) -> GantryResult<()> {
  match operation {
    Operation::SetPushUrl { remote } => {
      info!("Switching push URL to authenticated one");
      let url = ctx.env.push_url()?;
      git.set_push_url(remote, &url)
    }
    Operation::Checkout { branch } => git.checkout(branch),
    Operation::Pull => git.pull(),
    Operation::ConfigureIdentity { email, name } => {
      info!("Configuring Git email and username");
      git.set_identity(email, name)
    }
    Operation::BumpVersion { config, part, .. } => {
      let part = VersionBump::from_part(part)?;
      version::apply_bump(git.work_tree(), &git.work_tree().join(config), part)?;
      Ok(())
    }
    Operation::WriteChangelog { path, tag, changes } => {
      let project_url = ctx.env.require_project_url()?;
      changelog::update(git, path, project_url, tag, changes)
    }
    Operation::CommitAll { message } => {
      info!("Committing files changed by version bumping");
      git.commit_all(message)
    }
    Operation::Push { remote, branch, skip_ci } => {
      let options: &[&str] = if *skip_ci { &["ci.skip"] } else { &[] };
      git.push(remote, branch, options)
    }
    Operation::CreateTag { name } => {
      info!("Creating tag number {}", name);
      git.tag_annotated(name, &commit_message(name))
    }
    Operation::PushTags { remote, branch } => git.push_tags(remote, branch),
    Operation::Merge { branch } => git.merge(branch),
  }
}

/// Commit and tag annotation message for a release
fn commit_message(version: &str) -> String {
  format!("Auto-bumping project to version {} (skip-build)", version)
}
