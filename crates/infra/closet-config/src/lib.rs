//! Configuration for the avatar closet generator.
//!
//! This crate provides:
//! - [`ClosetConfig`]: The root configuration type with namespaced sections
//! - [`load_merged`]: Two-layer config loading (global + local) with env overrides
//! - [`schema`]: JSON Schema generation for editor completion
//! - [`validation`]: Advisory validation that produces warnings
//!
//! # Configuration Precedence (lowest to highest)
//! 1. Default values
//! 2. Global config (`~/.config/avatar-closet/closet.json`)
//! 3. Local config (`./closet.json`)
//! 4. Environment variables
//!
//! # Example
//! ```no_run
//! use closet_config::load_merged;
//! use std::path::Path;
//!
//! let loaded = load_merged(Path::new(".")).unwrap();
//! println!("Module name: {}", loaded.config.generator.module_name);
//!
//! for warning in &loaded.warnings {
//!     eprintln!("Warning: {}", warning);
//! }
//! ```
//!
//! # Environment Variables
//! - `CLOSET_FRAMEWORK`: Override the framework layout
//! - `CLOSET_LOG_LEVEL`: Override log level
//! - `CLOSET_LOG_JSON`: Enable JSON logging ("true" or "1")
//! - `CLOSET_JOURNAL_DIR`: Override the run journal directory
//! - `CLOSET_JOURNAL_DISABLED`: Disable the run journal ("true" or "1")

pub mod loader;
pub mod merge;
pub mod schema;
pub mod types;
pub mod validation;
pub mod writer;

pub use loader::{ClosetConfigPaths, LoadedClosetConfig, load_from_paths, load_merged};
pub use schema::schema_json_pretty;
pub use types::{ClosetConfig, FrameworkConfig, GeneratorConfig, JournalConfig, LoggingConfig};
pub use validation::AdvisoryWarning;
