//! `gantry build` - Decide which packages a pipeline has to build
//!
//! This command compares the working tree against a ref chosen from the
//! build type, then determines:
//! - Which packages directly contain changed paths
//! - Which packages pull in a changed path through a private dependency
//! - The full set of packages the pipeline should build
//!
//! Forced and tag builds skip detection entirely, and a failed detection
//! degrades to building every package rather than aborting the pipeline.

use crate::core::context::PipelineContext;
use crate::core::error::{GantryError, GantryResult, ValidationError};
use crate::core::plan::PlanId;
use crate::core::vcs::SystemGit;
use crate::impact::analysis::{self, ImpactAnalysis, PlanReason};
use crate::impact::changes::{self, BuildType};
use crate::impact::dependencies::{DependencyResolver, RepoType};
use crate::impact::packages::PackageSet;
use crate::ui::progress::ResolveProgress;
use serde::Serialize;
use tracing::{info, warn};

/// Output format for the build command
#[derive(Debug, Clone, Copy)]
enum OutputFormat {
  Text,
  Json,
  Names,
}

impl OutputFormat {
  fn from_str(s: &str) -> GantryResult<Self> {
    match s.to_lowercase().as_str() {
      "text" => Ok(Self::Text),
      "json" => Ok(Self::Json),
      "names" | "names-only" => Ok(Self::Names),
      _ => Err(GantryError::message(format!(
        "Unknown format '{}'. Valid formats: text, json, names",
        s
      ))),
    }
  }
}

/// What the pipeline should build and why
///
/// The id is derived from the reason and the impact sets, so two runs that
/// reach the same decision produce the same id regardless of when they ran.
#[derive(Debug, Serialize)]
pub struct BuildPlan {
  pub id: PlanId,
  pub head_commit: Option<String>,
  pub reason: PlanReason,
  pub impact: ImpactAnalysis,
}

impl BuildPlan {
  fn new(reason: PlanReason, head_commit: Option<String>, impact: ImpactAnalysis) -> GantryResult<Self> {
    let contents = serde_json::to_vec(&(&reason, &impact))?;
    Ok(Self {
      id: PlanId::from_contents(&contents),
      head_commit,
      reason,
      impact,
    })
  }
}

/// Run the build command
pub fn run_build(
  ctx: &PipelineContext,
  build: String,
  repo_type: Option<String>,
  since: Option<String>,
  format: String,
  dry_run: bool,
) -> GantryResult<()> {
  let output_format = OutputFormat::from_str(&format)?;
  let build_type = BuildType::from_str(&build)?;
  let config = ctx.config_or_default();

  // A mistyped repo type should abort, not degrade into a full build, so
  // parse it before detection starts.
  let repo_type = match repo_type.as_deref().or(config.build.repo_type.as_deref()) {
    Some(value) => Some(RepoType::from_str(value)?),
    None => None,
  };

  let project_name = project_name(ctx);
  info!(
    "Building {} project for {} build, repo type: {}",
    project_name,
    build_type,
    repo_type.map(|r| r.to_string()).unwrap_or_else(|| "unset".to_string())
  );

  let packages = PackageSet::discover(ctx.workspace_root(), &config.build.manifest, &project_name)?;

  let forced = if build_type == BuildType::Tag || ctx.env.commit_tag.is_some() {
    Some(PlanReason::TagBuild)
  } else if ctx.env.force_build {
    Some(PlanReason::ForcedBuild)
  } else {
    None
  };

  let (impact, reason) = if let Some(reason) = forced {
    info!("Forced or tag build, going to build entire project");
    if dry_run {
      println!("DRY RUN: Would build all {} packages", packages.len());
      for name in packages.names() {
        println!("  - {}", name);
      }
      return Ok(());
    }
    (ImpactAnalysis::all_of(&packages), reason)
  } else {
    let compare = changes::resolve_compare_ref(build_type, since.as_deref(), &ctx.env, &config.build.fallbacks);
    match detect_impact(ctx, &packages, &compare, repo_type, dry_run, output_format)? {
      Some(outcome) => outcome,
      // Dry run already printed what it would do
      None => return Ok(()),
    }
  };

  let head_commit = SystemGit::open(ctx.workspace_root())
    .and_then(|git| git.head_commit())
    .ok();

  let plan = BuildPlan::new(reason, head_commit, impact)?;
  display_results(&plan, output_format)
}

/// Detect changed directories and resolve them to impacted packages
///
/// Detection failures (no git history, missing repo type, lister errors)
/// degrade to building everything. Only errors that point at a broken
/// invocation propagate.
fn detect_impact(
  ctx: &PipelineContext,
  packages: &PackageSet,
  compare: &str,
  repo_type: Option<RepoType>,
  dry_run: bool,
  format: OutputFormat,
) -> GantryResult<Option<(ImpactAnalysis, PlanReason)>> {
  match try_detect_impact(ctx, packages, compare, repo_type, dry_run, format) {
    Ok(outcome) => Ok(outcome),
    Err(
      err @ (GantryError::Validation(ValidationError::RepoTypeNotSet)
      | GantryError::Git(_)
      | GantryError::Message { .. }),
    ) => {
      warn!("{}", err);
      info!("Building all packages found instead");
      Ok(Some((ImpactAnalysis::all_of(packages), PlanReason::DetectionFailed)))
    }
    Err(other) => Err(other),
  }
}

fn try_detect_impact(
  ctx: &PipelineContext,
  packages: &PackageSet,
  compare: &str,
  repo_type: Option<RepoType>,
  dry_run: bool,
  format: OutputFormat,
) -> GantryResult<Option<(ImpactAnalysis, PlanReason)>> {
  let git = SystemGit::open(ctx.workspace_root())?;
  let change_set = changes::detect(&git, compare)?;

  if dry_run {
    println!(
      "DRY RUN: Would analyze {} changed directories ({} files against {})",
      change_set.directories.len(),
      change_set.files.len(),
      change_set.compare
    );
    for dir in &change_set.directories {
      println!("  - {}", dir.display());
    }
    return Ok(None);
  }

  let repo_type = repo_type.ok_or(GantryError::Validation(ValidationError::RepoTypeNotSet))?;
  let resolver = DependencyResolver::new(ctx.workspace_root(), repo_type, &ctx.env)?;

  // Progress bars only when a human reads the output
  let progress = (matches!(format, OutputFormat::Text) && !packages.is_empty())
    .then(|| ResolveProgress::new(packages.len()));
  let dependencies = resolver.resolve_all(packages, progress.as_ref())?;

  let impact = analysis::analyze(packages, &change_set.directories, &dependencies);
  info!("Found {} packages impacted by changes", impact.build_targets.len());

  Ok(Some((impact, PlanReason::Changes)))
}

/// Project name for the top-level package, from CI or the directory name
fn project_name(ctx: &PipelineContext) -> String {
  if let Some(name) = &ctx.env.project_name {
    return name.clone();
  }

  ctx
    .workspace_root()
    .file_name()
    .map(|name| name.to_string_lossy().into_owned())
    .unwrap_or_else(|| "repository".to_string())
}

/// Display build plan results
fn display_results(plan: &BuildPlan, format: OutputFormat) -> GantryResult<()> {
  match format {
    OutputFormat::Text => display_text(plan),
    OutputFormat::Json => display_json(plan),
    OutputFormat::Names => display_names(plan),
  }
}

/// Display results in human-readable text format
fn display_text(plan: &BuildPlan) -> GantryResult<()> {
  println!("Build Impact");
  println!("============");
  println!();

  println!("Reason: {}", plan.reason);
  if let Some(commit) = &plan.head_commit {
    println!("Head: {}", commit);
  }
  println!();

  println!("Direct impact: {} packages", plan.impact.direct.len());
  for name in &plan.impact.direct {
    println!("  📦 {}", name);
  }
  println!();

  println!("Via dependencies: {} packages", plan.impact.via_dependencies.len());
  for name in &plan.impact.via_dependencies {
    println!("  ⬆  {}", name);
  }
  println!();

  if plan.impact.is_empty() {
    println!("✅ Nothing to build");
    return Ok(());
  }

  println!("Build targets: {} packages", plan.impact.build_targets.len());
  for name in &plan.impact.build_targets {
    println!("  🎯 {}", name);
  }
  println!();
  println!("Plan: {}", plan.id.short());

  Ok(())
}

/// Display results in JSON format
fn display_json(plan: &BuildPlan) -> GantryResult<()> {
  use serde_json::json;

  let output = json!({
      "plan_id": plan.id,
      "head_commit": plan.head_commit,
      "reason": plan.reason,
      "impact": {
          "direct": plan.impact.direct,
          "via_dependencies": plan.impact.via_dependencies,
          "build_targets": plan.impact.build_targets
      },
      "summary": {
          "direct_count": plan.impact.direct.len(),
          "via_dependencies_count": plan.impact.via_dependencies.len(),
          "build_targets_count": plan.impact.build_targets.len()
      }
  });

  println!("{}", serde_json::to_string_pretty(&output)?);

  Ok(())
}

/// Display only package names (build targets), one per line
fn display_names(plan: &BuildPlan) -> GantryResult<()> {
  for name in &plan.impact.build_targets {
    println!("{}", name);
  }

  Ok(())
}
