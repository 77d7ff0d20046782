//! # tmpl-resolve
//!
//! Bulk template-variable resolver.
//!
//! Finds every file whose name contains a template marker (`.tmpl` by
//! default), replaces `$NAME` / `${NAME}` placeholders with values from the
//! `tmpl_config` settings file or the environment, and writes the result next
//! to the template with the marker removed from the file name.
//!
//! ## Features
//!
//! - Parallel rendering using Rayon with a bounded worker pool
//! - Per-file failure isolation
//! - Layered lookup: environment overlay, settings file, dotted environment names
//! - File permissions carried over to the output
//!
//! ## Usage
//!
//! ```ignore
//! use tmpl_resolve::processor::Renderer;
//! use tmpl_resolve::settings::{default_search_dirs, Settings};
//! use tmpl_resolve::token::TokenExtractor;
//!
//! let settings = Settings::load(None, &default_search_dirs())?;
//! let extractor = TokenExtractor::new()?;
//! let renderer = Renderer::new(&extractor, &settings, ".tmpl");
//! renderer.render_file(Path::new("db.tmpl.yaml"))?;
//! ```

/// CLI configuration and argument parsing
pub mod config;

/// Error types for rendering and settings loading
pub mod error;

/// Per-file template rendering
pub mod processor;

/// Batch execution on a worker pool
pub mod runner;

/// Template discovery
pub mod scanner;

/// Settings file loading and value resolution
pub mod settings;

/// Placeholder extraction and substitution
pub mod token;
