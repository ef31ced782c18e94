//! Configuration module for Deepcrawl
//!
//! This module handles loading, parsing, and validating TOML project files.
//!
//! # Example
//!
//! ```no_run
//! use deepcrawl::config::load_project;
//! use std::path::Path;
//!
//! let project = load_project(Path::new("quotes.toml")).unwrap();
//! println!("Crawler will use max depth: {}", project.settings.max_depth);
//! ```

mod parser;
mod types;
mod validation;

// Re-export types
pub use types::{ProjectConfig, Settings};

// Re-export parser and validation functions
pub use parser::{load_project, parse_project};
pub use validation::{validate, validate_settings, validate_start_url};
