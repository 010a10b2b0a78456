//! Build-impact analysis for container monorepos
//!
//! Given a set of changed paths, determine:
//! - Which packages directly contain those paths
//! - Which packages pull them in through private dependencies
//! - Minimal set of packages that need a container build
//!
//! Built on plain path-prefix matching - no build-system graph, the package
//! layout IS the graph.

pub mod analysis;
pub mod changes;
pub mod dependencies;
pub mod packages;

pub use analysis::ImpactAnalysis;
pub use packages::PackageSet;
