//! CLI commands for gantry
//!
//! This module contains all user-facing command implementations:
//!
//! - **build**: Decide which packages a pipeline has to build
//! - **bump**: Bump the version, update the changelog, tag and back-merge
//! - **init**: Write a starter gantry.toml configuration
//!
//! All commands accept `&PipelineContext` to avoid redundant environment
//! captures and config loads.

pub mod build;
pub mod bump;
pub mod init;

pub use build::run_build;
pub use bump::run_bump;
pub use init::run_init;
