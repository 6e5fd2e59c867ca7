//! usort: a fast organizer for C# `using` directives.
//!
//! The crate exposes the reorganization engine as a library: parse a file
//! into the reduced source model, run the fix engine over it, render the
//! result. The binary wires the engine into a directory walker, a parallel
//! analyzer with an incremental cache, and a small CLI.

pub mod analyzer;
pub mod cache;
pub mod config;
pub mod fix;
pub mod incremental;
pub mod rules;
pub mod source_io;
pub mod syntax;
pub mod walker;

pub use analyzer::{AnalysisResults, Analyzer};
pub use config::{Config, ImportsConfig, Placement};
pub use fix::{organize_at, organize_file, organize_text};
pub use syntax::{parse, render, SourceFile};
