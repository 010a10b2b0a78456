//! Label-driven release flow
//!
//! Implements the merge-to-master release automation:
//!
//! - **labels**: merge request labels decide the bump size
//!   (`bump-major`, `bump-minor`, default patch)
//! - **version**: `[version]` state in TOML, edited losslessly, plus raw
//!   string rewrite of every listed file
//! - **changelog**: change titles recovered from git history, entry
//!   prepended newest-first
//! - **flow**: the git sequence (authenticate, sync, bump, commit, tag,
//!   merge back to develop) planned first and then executed
//!
//! Everything mutating goes through a `Plan`, so `--dry-run` can print the
//! exact sequence without touching the repository.

pub mod changelog;
pub mod flow;
pub mod labels;
pub mod version;

pub use labels::VersionBump;
