//! Core types for the residual log parser
//!
//! This module defines the tracked solver variables, the table of residual
//! series produced by a scan, and the error type shared by the library.

use std::collections::HashSet;
use std::fmt;
use std::path::PathBuf;
use std::str::FromStr;

/// Result type for extractor operations
pub type Result<T> = std::result::Result<T, ExtractError>;

/// Errors that can occur while extracting residuals
#[derive(Debug, thiserror::Error)]
pub enum ExtractError {
    #[error("The file '{}' was not found.", .path.display())]
    FileNotFound { path: PathBuf },

    #[error("The file '{}' could not be opened: {source}", .path.display())]
    Unreadable {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("No residual data was found in the log file.")]
    NoData,

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Invalid line pattern: {0}")]
    Pattern(#[from] regex::Error),
}

/// A solver variable whose final residual is tracked
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TrackedVariable {
    Ux,
    Uy,
    Uz,
    /// Pressure. Solved by GAMG rather than smoothSolver, accumulated the same way.
    P,
    Epsilon,
    K,
}

impl TrackedVariable {
    /// All tracked variables, in plotting order
    pub const ALL: [TrackedVariable; 6] = [
        TrackedVariable::Ux,
        TrackedVariable::Uy,
        TrackedVariable::Uz,
        TrackedVariable::P,
        TrackedVariable::Epsilon,
        TrackedVariable::K,
    ];

    /// Name as spelled in the solver log
    pub fn name(self) -> &'static str {
        match self {
            TrackedVariable::Ux => "Ux",
            TrackedVariable::Uy => "Uy",
            TrackedVariable::Uz => "Uz",
            TrackedVariable::P => "p",
            TrackedVariable::Epsilon => "epsilon",
            TrackedVariable::K => "k",
        }
    }

    /// Table key for this variable's series (e.g. `Ux_final`)
    pub fn series_key(self) -> String {
        format!("{}_final", self.name())
    }

    /// Legend text for this variable's line
    pub fn label(self) -> String {
        format!("{} final residual", self.name())
    }

    /// Look up a variable by its log spelling
    pub fn from_name(name: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|v| v.name() == name)
    }
}

impl fmt::Display for TrackedVariable {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for TrackedVariable {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        Self::from_name(s).ok_or_else(|| format!("Unknown tracked variable: {}", s))
    }
}

/// Final residuals per tracked variable, alongside the distinct time steps
///
/// All series are append-only. `time` holds each time value once, in the
/// order it was first seen; a value that reappears later in the log is not
/// appended again. Variable series are NOT checked against the time series
/// length, see [`ResidualTable::misaligned_series`].
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ResidualTable {
    time: Vec<u64>,
    seen_times: HashSet<u64>,
    ux: Vec<f64>,
    uy: Vec<f64>,
    uz: Vec<f64>,
    p: Vec<f64>,
    epsilon: Vec<f64>,
    k: Vec<f64>,
}

impl ResidualTable {
    /// Create an empty table
    pub fn new() -> Self {
        Self::default()
    }

    /// Distinct time steps in first-seen order
    pub fn time(&self) -> &[u64] {
        &self.time
    }

    /// Final residuals recorded for `variable`
    pub fn series(&self, variable: TrackedVariable) -> &[f64] {
        match variable {
            TrackedVariable::Ux => &self.ux,
            TrackedVariable::Uy => &self.uy,
            TrackedVariable::Uz => &self.uz,
            TrackedVariable::P => &self.p,
            TrackedVariable::Epsilon => &self.epsilon,
            TrackedVariable::K => &self.k,
        }
    }

    fn series_mut(&mut self, variable: TrackedVariable) -> &mut Vec<f64> {
        match variable {
            TrackedVariable::Ux => &mut self.ux,
            TrackedVariable::Uy => &mut self.uy,
            TrackedVariable::Uz => &mut self.uz,
            TrackedVariable::P => &mut self.p,
            TrackedVariable::Epsilon => &mut self.epsilon,
            TrackedVariable::K => &mut self.k,
        }
    }

    /// Record a time step. Returns false if the value was already present.
    pub fn record_time(&mut self, time: u64) -> bool {
        if !self.seen_times.insert(time) {
            return false;
        }
        self.time.push(time);
        true
    }

    /// Append a final residual to `variable`'s series
    pub fn record_residual(&mut self, variable: TrackedVariable, value: f64) {
        self.series_mut(variable).push(value);
    }

    /// True when there is something worth plotting
    ///
    /// Uses the `Ux` series as a proxy for "the log contained solve lines".
    pub fn has_usable_data(&self) -> bool {
        !self.time.is_empty() && !self.ux.is_empty()
    }

    /// True if no time steps and no residuals were recorded
    pub fn is_empty(&self) -> bool {
        self.time.is_empty()
            && TrackedVariable::ALL
                .iter()
                .all(|v| self.series(*v).is_empty())
    }

    /// Variables whose series length differs from the number of time steps
    pub fn misaligned_series(&self) -> Vec<(TrackedVariable, usize)> {
        TrackedVariable::ALL
            .iter()
            .map(|v| (*v, self.series(*v).len()))
            .filter(|(_, len)| *len != self.time.len())
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_variable_names() {
        assert_eq!(TrackedVariable::P.name(), "p");
        assert_eq!(TrackedVariable::Epsilon.series_key(), "epsilon_final");
        assert_eq!(TrackedVariable::Ux.label(), "Ux final residual");
        assert_eq!(TrackedVariable::from_name("k"), Some(TrackedVariable::K));
        assert_eq!(TrackedVariable::from_name("p_rgh"), None);
        assert!("omega".parse::<TrackedVariable>().is_err());
    }

    #[test]
    fn test_time_dedup_keeps_first_seen_order() {
        let mut table = ResidualTable::new();
        assert!(table.record_time(2));
        assert!(table.record_time(1));
        assert!(!table.record_time(2));
        assert!(table.record_time(3));
        assert!(!table.record_time(1));
        assert_eq!(table.time(), &[2, 1, 3]);
    }

    #[test]
    fn test_usable_data_requires_time_and_ux() {
        let mut table = ResidualTable::new();
        assert!(table.is_empty());
        assert!(!table.has_usable_data());

        table.record_time(1);
        table.record_residual(TrackedVariable::P, 1e-3);
        assert!(!table.has_usable_data());

        table.record_residual(TrackedVariable::Ux, 1e-4);
        assert!(table.has_usable_data());
        assert!(!table.is_empty());
    }

    #[test]
    fn test_misaligned_series() {
        let mut table = ResidualTable::new();
        table.record_time(1);
        for variable in TrackedVariable::ALL {
            table.record_residual(variable, 0.5);
        }
        assert!(table.misaligned_series().is_empty());

        table.record_residual(TrackedVariable::K, 0.25);
        assert_eq!(table.misaligned_series(), vec![(TrackedVariable::K, 2)]);
    }

    #[test]
    fn test_error_messages() {
        let err = ExtractError::FileNotFound {
            path: PathBuf::from("log.foamRun"),
        };
        assert_eq!(err.to_string(), "The file 'log.foamRun' was not found.");
        assert_eq!(
            ExtractError::NoData.to_string(),
            "No residual data was found in the log file."
        );
    }
}
