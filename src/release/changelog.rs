//! Changelog update
//!
//! Change titles come from git history rather than a hosting API. A release
//! merged through a merge request collects the titles of the merge requests
//! that converged into it (git flow: feature merges land on develop, then one
//! release merge request lands on master); a direct commit falls back to its
//! own message.

use crate::core::env::CiProvider;
use crate::core::error::GantryResult;
use crate::core::vcs::SystemGit;
use crate::release::labels;
use std::fs;
use std::io;
use tracing::{info, warn};

/// Collect the change titles converging into this release
///
/// If `HEAD` carries a merge reference, the commits between its two parents
/// are scanned for nested merge commits and each one contributes its embedded
/// title; with no nested merges the `HEAD` title itself is the single change.
/// A direct commit contributes its full message.
pub fn collect_changes(git: &SystemGit, provider: CiProvider) -> GantryResult<Vec<String>> {
  let head_message = git.commit_message("HEAD")?;

  if labels::merge_request_id(&head_message, provider).is_none() {
    warn!(
      "Unable to extract merge request from commit message: {}",
      head_message.trim_end()
    );
    return Ok(vec![head_message.trim_end().to_string()]);
  }

  let mut titles = Vec::new();
  if git.head_parents()?.len() > 1 {
    for message in git.commit_messages_in_range("HEAD^1..HEAD^2")? {
      let subject = message.lines().next().unwrap_or("").trim();
      if subject.starts_with("Merge branch ") && labels::merge_request_id(&message, CiProvider::GitLab).is_some() {
        titles.push(embedded_title(&message));
      }
    }
  }

  if titles.is_empty() {
    titles.push(embedded_title(&head_message));
  }

  info!("List of changes:\n{}", titles.join("\n"));
  Ok(titles)
}

/// Prepend the changelog entry for `tag`, creating the file if needed
///
/// A created file is staged so the release commit picks it up.
pub fn update(git: &SystemGit, relative_path: &str, project_url: &str, tag: &str, changes: &[String]) -> GantryResult<()> {
  info!("Found {} changes since last tag", changes.len());
  let path = git.work_tree().join(relative_path);

  let (existing, created) = match fs::read_to_string(&path) {
    Ok(content) => (content, false),
    Err(err) if err.kind() == io::ErrorKind::NotFound => {
      info!("{} does not exist, will be created", relative_path);
      (String::new(), true)
    }
    Err(err) => return Err(err.into()),
  };

  fs::write(&path, render(project_url, tag, changes, &existing))?;

  if created {
    info!("Adding {} to git changelist", relative_path);
    git.add(relative_path)?;
  }

  info!("Changelog updated");
  Ok(())
}

/// Render the new entry on top of the existing content, newest release first
fn render(project_url: &str, tag: &str, changes: &[String], existing: &str) -> String {
  let mut sorted: Vec<&String> = changes.iter().collect();
  sorted.sort();

  let mut block = String::new();
  block.push_str(&format!("## [{}]({}/-/tags/{})\n", tag, project_url, tag));
  for change in sorted {
    block.push_str(&format!("- {}\n", change));
  }

  if existing.is_empty() {
    block
  } else {
    format!("{}\n{}", block, existing)
  }
}

/// Title embedded in a merge commit message
///
/// GitLab merge commits carry the merge request title as the first body
/// paragraph, between the "Merge branch 'x' into 'y'" subject and the
/// "See merge request group/proj!N" trailer. Falls back to the subject when
/// no usable body line exists (e.g. GitHub squash merges).
fn embedded_title(message: &str) -> String {
  let mut lines = message.lines();
  let subject = lines.next().unwrap_or("").trim().to_string();

  lines
    .map(str::trim)
    .find(|line| !line.is_empty() && !labels::merge_ref_regex(CiProvider::GitLab).is_match(line))
    .map(str::to_string)
    .unwrap_or(subject)
}
