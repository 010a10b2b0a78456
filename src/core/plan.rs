//! Plan-based release operations
//!
//! Every mutating bump run produces a `Plan` before execution, enabling:
//!
//! - **Dry-run mode**: show the exact git sequence without running it
//! - **Idempotency**: the same operations hash to the same id whenever planned
//! - **Auditability**: plans serialize to JSON for logging and review
//!
//! The plan is data only; execution lives in `release::flow` where the git
//! backend and CI environment are in scope.

use serde::Serialize;
use sha2::{Digest, Sha256};
use std::fmt;

/// Content hash of a plan's operations (SHA-256, hex)
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PlanId(String);

impl PlanId {
  /// Hash serialized plan contents into an id
  pub fn from_contents(contents: &[u8]) -> Self {
    Self(format!("{:x}", Sha256::digest(contents)))
  }

  /// First 12 hex characters, enough to eyeball in logs
  pub fn short(&self) -> &str {
    &self.0[..12.min(self.0.len())]
  }
}

impl fmt::Display for PlanId {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    write!(f, "{}", self.short())
  }
}

/// One step of the release flow
///
/// Credentials never live in a plan: `SetPushUrl` names the remote only and
/// the executor resolves the authenticated URL from the environment.
#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Operation {
  /// Point the push URL of a remote at the authenticated URL
  SetPushUrl { remote: String },

  /// Checkout a branch
  Checkout { branch: String },

  /// Pull the current branch
  Pull,

  /// Configure committer identity
  ConfigureIdentity { email: String, name: String },

  /// Rewrite the version in a config file and its listed files
  BumpVersion {
    config: String,
    part: String,
    from: String,
    to: String,
  },

  /// Prepend a changelog entry (creates and stages the file if missing)
  WriteChangelog {
    path: String,
    tag: String,
    changes: Vec<String>,
  },

  /// Commit all tracked changes
  CommitAll { message: String },

  /// Push a branch
  Push {
    remote: String,
    branch: String,
    skip_ci: bool,
  },

  /// Create an annotated tag
  CreateTag { name: String },

  /// Push a branch along with all tags
  PushTags { remote: String, branch: String },

  /// Merge a branch into the current one
  Merge { branch: String },
}

impl fmt::Display for Operation {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    match self {
      Operation::SetPushUrl { remote } => {
        write!(f, "Point push URL of '{}' at the authenticated remote", remote)
      }
      Operation::Checkout { branch } => write!(f, "Checkout branch {}", branch),
      Operation::Pull => write!(f, "Pull current branch"),
      Operation::ConfigureIdentity { email, name } => write!(f, "Configure identity {} <{}>", name, email),
      Operation::BumpVersion { config, part, from, to } => {
        write!(f, "Bump {} version {} → {} in {}", part, from, to, config)
      }
      Operation::WriteChangelog { path, tag, changes } => {
        write!(f, "Prepend changelog entry for {} to {} ({} changes)", tag, path, changes.len())
      }
      Operation::CommitAll { message } => write!(f, "Commit all changes: {}", message),
      Operation::Push { remote, branch, skip_ci } => {
        if *skip_ci {
          write!(f, "Push to {}/{} (ci.skip)", remote, branch)
        } else {
          write!(f, "Push to {}/{}", remote, branch)
        }
      }
      Operation::CreateTag { name } => write!(f, "Create annotated tag {}", name),
      Operation::PushTags { remote, branch } => write!(f, "Push {}/{} with tags", remote, branch),
      Operation::Merge { branch } => write!(f, "Merge branch {}", branch),
    }
  }
}

/// A plan is a sequence of operations to perform, in order
#[derive(Debug, Clone, Serialize)]
pub struct Plan {
  /// Content hash of the operations
  pub id: PlanId,

  /// When the plan was created (RFC 3339)
  pub created_at: String,

  /// One-line summary shown above the operation list
  pub summary: String,

  /// Git operations in execution order
  pub operations: Vec<Operation>,
}

impl Plan {
  /// Create a new empty plan
  pub fn new() -> Self {
    let operations = Vec::new();
    Self {
      id: Self::id_for(&operations),
      created_at: chrono::Utc::now().to_rfc3339(),
      summary: String::new(),
      operations,
    }
  }

  /// Append an operation
  pub fn add_operation(&mut self, operation: Operation) {
    self.operations.push(operation);
    self.id = Self::id_for(&self.operations);
  }

  /// Set the summary
  pub fn with_summary(mut self, summary: impl Into<String>) -> Self {
    self.summary = summary.into();
    self
  }

  /// Hash of the operation list
  ///
  /// Timestamp and summary stay out of the hash, so re-planning the same
  /// release later yields the same id.
  fn id_for(operations: &[Operation]) -> PlanId {
    let json = serde_json::to_vec(operations).unwrap_or_default();
    PlanId::from_contents(&json)
  }

  /// Multi-line rendering for terminal output
  pub fn to_human_readable(&self) -> String {
    let mut output = String::new();

    output.push_str(&format!("📋 Plan: bump ({})\n", self.id));

    if !self.summary.is_empty() {
      output.push_str(&format!("\n{}\n", self.summary));
    }

    output.push_str(&format!("\n   Operations ({}):\n", self.operations.len()));

    for (i, op) in self.operations.iter().enumerate() {
      output.push_str(&format!("   {}. {}\n", i + 1, op));
    }

    output
  }

  /// Number of queued operations
  pub fn len(&self) -> usize {
    self.operations.len()
  }
}

impl Default for Plan {
  fn default() -> Self {
    Self::new()
  }
}
