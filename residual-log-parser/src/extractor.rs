//! Residual extraction API
//!
//! The [`ResidualExtractor`] scans a solver log line by line. Time markers move a
//! "current time" cursor forward; residual lines seen while a current time is
//! set are appended to their variable's series.

use crate::patterns::{LineMatcher, ResidualMatch};
use crate::types::{ExtractError, ResidualTable, Result};
use std::collections::VecDeque;
use std::fs::File;
use std::io::{BufRead, BufReader, ErrorKind};
use std::path::Path;

/// A data-bearing event found in the log
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum LogEvent {
    /// Start of a time step
    Time(u64),
    /// A final residual for one variable
    Residual(ResidualMatch),
}

/// Entry point for residual extraction
#[derive(Debug, Clone)]
pub struct ResidualExtractor {
    matcher: LineMatcher,
}

impl ResidualExtractor {
    /// Create an extractor with compiled line patterns
    pub fn new() -> Result<Self> {
        Ok(Self {
            matcher: LineMatcher::new()?,
        })
    }

    /// Extract residuals from a log file on disk
    ///
    /// # Errors
    /// * [`ExtractError::FileNotFound`] if `path` does not exist
    /// * [`ExtractError::Unreadable`] if it exists but cannot be opened
    /// * [`ExtractError::NoData`] if no time step or no `Ux` residual was found
    ///
    /// # Example
    /// ```no_run
    /// use residual_log_parser::ResidualExtractor;
    /// use std::path::Path;
    ///
    /// let extractor = ResidualExtractor::new().unwrap();
    /// let table = extractor.extract_file(Path::new("log.foamRun")).unwrap();
    /// println!("{} time steps", table.time().len());
    /// ```
    pub fn extract_file(&self, path: &Path) -> Result<ResidualTable> {
        log::info!("Reading solver log: {:?}", path);

        let file = File::open(path).map_err(|e| match e.kind() {
            ErrorKind::NotFound => ExtractError::FileNotFound {
                path: path.to_path_buf(),
            },
            _ => ExtractError::Unreadable {
                path: path.to_path_buf(),
                source: e,
            },
        })?;

        self.extract_reader(BufReader::new(file))
    }

    /// Extract residuals from any buffered reader, rejecting logs with no usable data
    pub fn extract_reader<R: BufRead>(&self, reader: R) -> Result<ResidualTable> {
        let table = self.scan_reader(reader)?;
        if !table.has_usable_data() {
            return Err(ExtractError::NoData);
        }
        Ok(table)
    }

    /// Fold every event of the log into a table, without checking the result
    pub fn scan_reader<R: BufRead>(&self, reader: R) -> Result<ResidualTable> {
        let mut table = ResidualTable::new();
        let mut current_time: Option<u64> = None;
        let mut dropped = 0usize;

        for event in self.events(reader) {
            match event? {
                LogEvent::Time(time) => {
                    current_time = Some(time);
                    if table.record_time(time) {
                        log::debug!("Time step {}s", time);
                    } else {
                        log::debug!("Time step {}s already recorded", time);
                    }
                }
                LogEvent::Residual(found) => {
                    if current_time.is_none() {
                        dropped += 1;
                        continue;
                    }
                    log::trace!("{} final residual = {}", found.variable, found.value);
                    table.record_residual(found.variable, found.value);
                }
            }
        }

        if dropped > 0 {
            log::debug!("Dropped {} residual line(s) before the first time marker", dropped);
        }
        log::info!("Scanned {} time step(s)", table.time().len());

        Ok(table)
    }

    /// Lazily iterate over the time markers and residuals of a log
    pub fn events<R: BufRead>(&self, reader: R) -> LogEvents<'_, R> {
        LogEvents::new(reader, &self.matcher)
    }
}

/// Extract residuals from a log file with a default extractor
pub fn extract_file(path: &Path) -> Result<ResidualTable> {
    ResidualExtractor::new()?.extract_file(path)
}

/// Iterator over the events of a log
///
/// `\n`, `\r\n` and a lone `\r` all end a line. Each line is decoded as lossy
/// UTF-8, so a stray non-UTF-8 byte only affects the line it sits on. A line
/// holding both a time marker and a residual yields the time marker first.
pub struct LogEvents<'a, R: BufRead> {
    chunks: std::io::Split<R>,
    lines: VecDeque<String>,
    matcher: &'a LineMatcher,
    pending: Option<LogEvent>,
}

impl<'a, R: BufRead> LogEvents<'a, R> {
    fn new(reader: R, matcher: &'a LineMatcher) -> Self {
        Self {
            chunks: reader.split(b'\n'),
            lines: VecDeque::new(),
            matcher,
            pending: None,
        }
    }

    /// Next non-empty line, refilling from the reader as needed
    fn next_line(&mut self) -> Option<Result<String>> {
        loop {
            if let Some(line) = self.lines.pop_front() {
                return Some(Ok(line));
            }
            let bytes = match self.chunks.next()? {
                Ok(bytes) => bytes,
                Err(e) => return Some(Err(e.into())),
            };
            self.lines.extend(
                bytes
                    .split(|&b| b == b'\r')
                    .filter(|piece| !piece.is_empty())
                    .map(|piece| String::from_utf8_lossy(piece).into_owned()),
            );
        }
    }
}

impl<'a, R: BufRead> Iterator for LogEvents<'a, R> {
    type Item = Result<LogEvent>;

    fn next(&mut self) -> Option<Self::Item> {
        if let Some(event) = self.pending.take() {
            return Some(Ok(event));
        }

        loop {
            let line = match self.next_line()? {
                Ok(line) => line,
                Err(e) => return Some(Err(e)),
            };

            let time = self.matcher.time_marker(&line).map(LogEvent::Time);
            let residual = self.matcher.residual(&line).map(LogEvent::Residual);

            match (time, residual) {
                (Some(time), residual) => {
                    self.pending = residual;
                    return Some(Ok(time));
                }
                (None, Some(residual)) => return Some(Ok(residual)),
                (None, None) => continue,
            }
        }
    }
}
