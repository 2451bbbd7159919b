//! Configuration module for bake runs
//!
//! This module provides the `BakeConfig` struct and its type-safe builder
//! with validation and sensible defaults.

// Sub-modules
pub mod builder;
pub mod getters;
pub mod methods;
pub mod types;

// Re-exports for public API
pub use builder::{BakeConfigBuilder, WithOutputDir, WithSourceOrigin};
pub use types::BakeConfig;
