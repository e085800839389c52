//! Configuration module for redirect-chain crawls
//!
//! This module provides the `CrawlConfig` struct, its type-safe builder and
//! the `CrawlArgs` entry payload with its validation rules.

// Sub-modules
pub mod builder;
pub mod getters;
pub mod methods;
pub mod types;
pub mod validation;

// Re-exports for public API
pub use builder::{CrawlConfigBuilder, WithStartUrl};
pub use types::{CrawlConfig, Viewport};
pub use validation::{CrawlArgs, ValidationError};
