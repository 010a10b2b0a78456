//! Core engine for gantry operations
//!
//! This module contains the fundamental building blocks for all gantry functionality:
//!
//! - **config**: Gantry configuration (gantry.toml) parsing and validation
//! - **context**: Unified pipeline context for efficient data sharing across commands
//! - **env**: One-shot capture of the CI job environment
//! - **error**: Comprehensive error types with contextual help messages
//! - **plan**: Release operation planning and serialization
//! - **vcs**: Git operations abstraction (SystemGit)

pub mod config;
pub mod context;
pub mod env;
pub mod error;
pub mod plan;
pub mod vcs;
