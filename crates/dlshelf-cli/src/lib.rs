//! CLI adapter for dlshelf.
//!
//! Drives the engine against the in-memory host from a terminal and renders
//! the toolbar glyph to image files. It contains no business logic of its
//! own; everything it shows comes from `dlshelf-core` and `dlshelf-engine`.
//!
//! # Structure
//!
//! - `parser` - Top-level argument parsing
//! - `commands` - Subcommand definitions
//! - `config` - Settings flags and their environment fallbacks
//! - `handlers` - One module per subcommand
//! - `presentation` - Panel tables, change log and console surface
//! - `error` - CLI error type with process exit codes

#![deny(unused_crate_dependencies)]

pub mod commands;
pub mod config;
pub mod error;
pub mod handlers;
pub mod parser;
pub mod presentation;

pub use commands::Commands;
pub use config::{SettingsArgs, resolve_settings};
pub use error::CliError;
pub use parser::Cli;

// Binary-only dependencies
use dotenvy as _;
use tracing_subscriber as _;
