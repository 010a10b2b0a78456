//! Error types for gantry with contextual messages and exit codes
//!
//! A single enum covers every failure the commands can produce, grouped by
//! what the operator should do about it. That grouping drives the process
//! exit code, and most variants attach a suggestion that `print_error`
//! shows under the message.

use std::fmt;
use std::io;
use std::path::PathBuf;

/// Exit codes for gantry
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExitCode {
  /// User error (config, invalid args, missing environment)
  User = 1,
  /// System error (git, subprocess, I/O)
  System = 2,
  /// Validation failure (bad version, duplicate packages)
  Validation = 3,
}

impl ExitCode {
  /// Numeric value passed to `process::exit`
  pub fn as_i32(self) -> i32 {
    self as i32
  }
}

/// Main error type for gantry
#[derive(Debug)]
pub enum GantryError {
  /// Problems with gantry.toml
  Config(ConfigError),

  /// Failures from invoking git
  Git(GitError),

  /// Missing or malformed CI environment
  Env(EnvError),

  /// Validation errors (versions, package layout)
  Validation(ValidationError),

  /// I/O errors
  Io(io::Error),

  /// Catch-all with a message, optional context lines, and optional help
  Message {
    message: String,
    context: Option<String>,
    help: Option<String>,
  },
}

impl GantryError {
  /// Plain message with no context or help
  pub fn message(msg: impl Into<String>) -> Self {
    GantryError::Message {
      message: msg.into(),
      context: None,
      help: None,
    }
  }

  /// Message plus a suggestion shown under the error
  pub fn with_help(msg: impl Into<String>, help: impl Into<String>) -> Self {
    GantryError::Message {
      message: msg.into(),
      context: None,
      help: Some(help.into()),
    }
  }

  /// Prepend a context line; only `Message` errors accumulate context
  pub fn context(self, ctx: impl Into<String>) -> Self {
    match self {
      GantryError::Message { message, context, help } => {
        let line = ctx.into();
        let merged = match context {
          Some(existing) => format!("{}\n{}", line, existing),
          None => line,
        };
        GantryError::Message { message, context: Some(merged), help }
      }
      _ => self,
    }
  }

  /// Exit code the process should finish with
  pub fn exit_code(&self) -> ExitCode {
    match self {
      GantryError::Config(_) => ExitCode::User,
      GantryError::Git(_) => ExitCode::System,
      GantryError::Env(_) => ExitCode::User,
      GantryError::Validation(_) => ExitCode::Validation,
      GantryError::Io(_) => ExitCode::System,
      GantryError::Message { .. } => ExitCode::User,
    }
  }

  /// Suggestion to print under the error, when one applies
  pub fn help_message(&self) -> Option<String> {
    match self {
      GantryError::Config(e) => e.help_message(),
      GantryError::Git(e) => e.help_message(),
      GantryError::Env(e) => e.help_message(),
      GantryError::Validation(e) => e.help_message(),
      GantryError::Message { help, .. } => help.clone(),
      _ => None,
    }
  }
}

impl fmt::Display for GantryError {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    match self {
      GantryError::Config(e) => write!(f, "{}", e),
      GantryError::Git(e) => write!(f, "{}", e),
      GantryError::Env(e) => write!(f, "{}", e),
      GantryError::Validation(e) => write!(f, "{}", e),
      GantryError::Io(e) => write!(f, "I/O error: {}", e),
      GantryError::Message { message, context, .. } => {
        write!(f, "{}", message)?;
        if let Some(ctx) = context {
          write!(f, "\n{}", ctx)?;
        }
        Ok(())
      }
    }
  }
}

impl std::error::Error for GantryError {
  fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
    match self {
      GantryError::Io(e) => Some(e),
      _ => None,
    }
  }
}

impl From<io::Error> for GantryError {
  fn from(err: io::Error) -> Self {
    GantryError::Io(err)
  }
}

impl From<String> for GantryError {
  fn from(msg: String) -> Self {
    GantryError::message(msg)
  }
}

impl From<&str> for GantryError {
  fn from(msg: &str) -> Self {
    GantryError::message(msg)
  }
}

impl From<ConfigError> for GantryError {
  fn from(err: ConfigError) -> Self {
    GantryError::Config(err)
  }
}

impl From<GitError> for GantryError {
  fn from(err: GitError) -> Self {
    GantryError::Git(err)
  }
}

impl From<EnvError> for GantryError {
  fn from(err: EnvError) -> Self {
    GantryError::Env(err)
  }
}

impl From<ValidationError> for GantryError {
  fn from(err: ValidationError) -> Self {
    GantryError::Validation(err)
  }
}

impl From<toml_edit::TomlError> for GantryError {
  fn from(err: toml_edit::TomlError) -> Self {
    GantryError::message(format!("TOML parse error: {}", err))
  }
}

impl From<toml_edit::de::Error> for GantryError {
  fn from(err: toml_edit::de::Error) -> Self {
    GantryError::message(format!("TOML deserialization error: {}", err))
  }
}

impl From<toml_edit::ser::Error> for GantryError {
  fn from(err: toml_edit::ser::Error) -> Self {
    GantryError::message(format!("TOML serialization error: {}", err))
  }
}

impl From<serde_json::Error> for GantryError {
  fn from(err: serde_json::Error) -> Self {
    GantryError::message(format!("JSON error: {}", err))
  }
}

impl From<std::str::Utf8Error> for GantryError {
  fn from(err: std::str::Utf8Error) -> Self {
    GantryError::message(format!("UTF-8 error: {}", err))
  }
}

impl From<std::string::FromUtf8Error> for GantryError {
  fn from(err: std::string::FromUtf8Error) -> Self {
    GantryError::message(format!("UTF-8 conversion error: {}", err))
  }
}

impl From<std::path::StripPrefixError> for GantryError {
  fn from(err: std::path::StripPrefixError) -> Self {
    GantryError::message(format!("Path strip prefix error: {}", err))
  }
}

impl From<glob::PatternError> for GantryError {
  fn from(err: glob::PatternError) -> Self {
    GantryError::message(format!("Glob pattern error: {}", err))
  }
}

impl From<glob::GlobError> for GantryError {
  fn from(err: glob::GlobError) -> Self {
    GantryError::message(format!("Glob walk error: {}", err))
  }
}

/// Errors around reading and validating gantry.toml
#[derive(Debug)]
pub enum ConfigError {
  /// Config file already exists (init refuses to overwrite)
  AlreadyExists { path: PathBuf },

  /// Required key absent from the config
  MissingField { field: String },

  /// A file listed under [version] files does not exist
  VersionedFileMissing { path: PathBuf },
}

impl ConfigError {
  fn help_message(&self) -> Option<String> {
    match self {
      ConfigError::AlreadyExists { .. } => {
        Some("Edit the existing file instead, or remove it before running `gantry init` again.".to_string())
      }
      ConfigError::VersionedFileMissing { .. } => {
        Some("Fix the [version] files list in gantry.toml or create the missing file.".to_string())
      }
      _ => None,
    }
  }
}

impl fmt::Display for ConfigError {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    match self {
      ConfigError::AlreadyExists { path } => {
        write!(f, "Configuration file already exists: {}", path.display())
      }
      ConfigError::MissingField { field } => {
        write!(f, "gantry.toml is missing required field: {}", field)
      }
      ConfigError::VersionedFileMissing { path } => {
        write!(f, "Versioned file listed in config does not exist: {}", path.display())
      }
    }
  }
}

/// Errors from the system git binary
#[derive(Debug)]
pub enum GitError {
  /// git exited non-zero
  CommandFailed { command: String, stderr: String },

  /// No work tree at the given path
  RepoNotFound { path: PathBuf },

  /// Push rejected by the remote
  PushFailed {
    remote: String,
    branch: String,
    reason: String,
  },
}

impl GitError {
  fn help_message(&self) -> Option<String> {
    match self {
      GitError::PushFailed { reason, .. } => {
        if reason.contains("non-fast-forward") {
          Some("The remote has commits you don't have. Pull first before bumping.".to_string())
        } else if reason.contains("permission denied") || reason.contains("403") {
          Some("Check that the push token (NPA_GITLAB_TOKEN / GH_TOKEN) grants write access.".to_string())
        } else {
          None
        }
      }
      GitError::RepoNotFound { path } => Some(format!(
        "No git work tree at {}. Run gantry from the repository root.",
        path.display()
      )),
      _ => None,
    }
  }
}

impl fmt::Display for GitError {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    match self {
      GitError::CommandFailed { command, stderr } => {
        write!(f, "{} failed:\n{}", command, stderr)
      }
      GitError::RepoNotFound { path } => {
        write!(f, "Not a git repository: {}", path.display())
      }
      GitError::PushFailed { remote, branch, reason } => {
        write!(f, "Failed to push {} to {}: {}", branch, remote, reason)
      }
    }
  }
}

/// Missing or malformed CI environment
#[derive(Debug)]
pub enum EnvError {
  /// A required environment variable is not set
  Missing { name: String },
}

impl EnvError {
  fn help_message(&self) -> Option<String> {
    match self {
      EnvError::Missing { name } => Some(format!(
        "Set {} in the CI job environment (project CI/CD variables for tokens).",
        name
      )),
    }
  }
}

impl fmt::Display for EnvError {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    match self {
      EnvError::Missing { name } => {
        write!(f, "Expected the following environment variable to be set: {}", name)
      }
    }
  }
}

/// Validation errors
#[derive(Debug)]
pub enum ValidationError {
  /// Repo type needed for dependency resolution but not provided
  RepoTypeNotSet,

  /// Two package directories share a basename
  DuplicatePackage {
    name: String,
    first: PathBuf,
    second: PathBuf,
  },

  /// A version string is not valid semver
  InvalidVersion { value: String },
}

impl ValidationError {
  fn help_message(&self) -> Option<String> {
    match self {
      ValidationError::RepoTypeNotSet => {
        Some("Pass --repo-type <go|node> or set repo_type under [build] in gantry.toml.".to_string())
      }
      ValidationError::DuplicatePackage { .. } => {
        Some("Package names are directory basenames and must be unique across the repository.".to_string())
      }
      ValidationError::InvalidVersion { .. } => {
        Some("Versions must be semver, e.g. 1.2.3. Check [version] current in gantry.toml.".to_string())
      }
    }
  }
}

impl fmt::Display for ValidationError {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    match self {
      ValidationError::RepoTypeNotSet => {
        write!(f, "Repository type is not set")
      }
      ValidationError::DuplicatePackage { name, first, second } => {
        write!(
          f,
          "Duplicate package name '{}': {} and {}",
          name,
          first.display(),
          second.display()
        )
      }
      ValidationError::InvalidVersion { value } => {
        write!(f, "Version is not valid semver: '{}'", value)
      }
    }
  }
}

/// Result type alias for gantry
pub type GantryResult<T> = Result<T, GantryError>;

/// Extension trait for attaching context at the call site
pub trait ResultExt<T> {
  /// Attach a fixed context string to the error
  fn context(self, ctx: impl Into<String>) -> GantryResult<T>;

  /// Attach context computed only on the error path
  fn with_context<F>(self, f: F) -> GantryResult<T>
  where
    F: FnOnce() -> String;
}

impl<T, E> ResultExt<T> for Result<T, E>
where
  E: Into<GantryError>,
{
  fn context(self, ctx: impl Into<String>) -> GantryResult<T> {
    self.map_err(|e| e.into().context(ctx))
  }

  fn with_context<F>(self, f: F) -> GantryResult<T>
  where
    F: FnOnce() -> String,
  {
    self.map_err(|e| e.into().context(f()))
  }
}

/// Print an error to stderr, with its help suggestion when present
pub fn print_error(error: &GantryError) {
  eprintln!("\n❌ {}\n", error);

  if let Some(help) = error.help_message() {
    eprintln!("💡 Help: {}\n", help);
  }
}
