//! Line patterns for OpenFOAM solver logs
//!
//! Two line shapes carry data:
//! - `Time = 48s` at the start of a line opens a new time step
//! - `... Solving for Ux, Initial residual = ..., Final residual = 2.3e-06, ...`
//!   reports a solve for one of the tracked variables

use crate::types::{Result, TrackedVariable};
use regex::Regex;

const TIME_PATTERN: &str = r"^Time = (\d+)s";
const RESIDUAL_PATTERN: &str =
    r"Solving for (Ux|Uy|Uz|p|epsilon|k),.*Final residual = ([\d.e-]+)";

/// A final residual reported on a single log line
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ResidualMatch {
    pub variable: TrackedVariable,
    pub value: f64,
}

/// Compiled matchers for time markers and residual lines
#[derive(Debug, Clone)]
pub struct LineMatcher {
    time: Regex,
    residual: Regex,
}

impl LineMatcher {
    /// Compile the line patterns
    pub fn new() -> Result<Self> {
        Ok(Self {
            time: Regex::new(TIME_PATTERN)?,
            residual: Regex::new(RESIDUAL_PATTERN)?,
        })
    }

    /// Integer time of a `Time = <n>s` marker, if the line starts with one
    pub fn time_marker(&self, line: &str) -> Option<u64> {
        let caps = self.time.captures(line)?;
        match caps[1].parse::<u64>() {
            Ok(time) => Some(time),
            Err(e) => {
                log::debug!("Ignoring time marker {:?}: {}", &caps[1], e);
                None
            }
        }
    }

    /// First `Solving for <var>, ... Final residual = <value>` match in the line
    pub fn residual(&self, line: &str) -> Option<ResidualMatch> {
        let caps = self.residual.captures(line)?;
        let variable = TrackedVariable::from_name(&caps[1])?;
        match caps[2].parse::<f64>() {
            Ok(value) => Some(ResidualMatch { variable, value }),
            Err(e) => {
                log::debug!(
                    "Ignoring unparseable residual {:?} for {}: {}",
                    &caps[2],
                    variable,
                    e
                );
                None
            }
        }
    }
}
