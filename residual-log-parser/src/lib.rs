//! OpenFOAM Residual Log Parser
//!
//! A small, stateless library for pulling final residuals out of an OpenFOAM
//! solver log (`log.foamRun` and friends).
//!
//! # Architecture
//!
//! This library only parses:
//! - Scans the log line by line and emits time markers and residual matches
//! - Folds those events into a [`ResidualTable`] keyed by [`TrackedVariable`]
//! - Rejects logs without usable data
//!
//! The library does NOT:
//! - Render charts
//! - Print user-facing messages
//! - Assume fixed file paths (callers pass the log path or a reader)
//!
//! All of that is in the application layer (residual-plot-cli).
//!
//! # Example Usage
//!
//! ```no_run
//! use residual_log_parser::{ResidualExtractor, TrackedVariable};
//! use std::path::Path;
//!
//! let extractor = ResidualExtractor::new().unwrap();
//! let table = extractor.extract_file(Path::new("log.foamRun")).unwrap();
//!
//! for variable in TrackedVariable::ALL {
//!     println!("{}: {:?}", variable.series_key(), table.series(variable).last());
//! }
//! ```

// Public modules
pub mod extractor;
pub mod patterns;
pub mod types;

// Re-export main types for convenience
pub use extractor::{extract_file, LogEvent, LogEvents, ResidualExtractor};
pub use patterns::{LineMatcher, ResidualMatch};
pub use types::{ExtractError, ResidualTable, Result, TrackedVariable};

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
