//! Single-value memory control files.
//!
//! - `memory.current`, `memory.swap.current`, `memory.peak`: one byte count, parsed into
//!   [`MemoryUsage`].
//! - `memory.{low,min,high,max}`, `memory.swap.max`: one byte count or the literal `max`,
//!   parsed into [`MemoryLimit`]. `max` becomes [`MEMORY_MAX`].
//! - `memory.high.tmp`: a limit followed by the remaining duration in microseconds, parsed
//!   into [`TemporaryLimit`].
//! - `memory.oom.group` and other boolean knobs: `0` or `1`, parsed into [`Flag`].
//!
//! # Examples
//!
//! ```rust
//! use cgroup_fs::cgroup::stats::{MemoryLimit, SingleLineStat, MEMORY_MAX};
//!
//! let limit = MemoryLimit::from_reader(&mut "max\n".as_bytes()).unwrap();
//! assert_eq!(limit.limit_bytes, MEMORY_MAX);
//! ```

use std::io::BufRead;
use std::time::Duration;

use super::parser::{first_line, parse_u64};
use super::{SingleLineStat, StatParseError};

/// The value `max` maps to: no limit.
pub const MEMORY_MAX: u64 = u64::MAX;

/// Parses a byte count that may be the literal `max`.
pub(crate) fn parse_limit(value: &str, lineno: usize) -> Result<u64, StatParseError> {
    match value {
        "max" => Ok(MEMORY_MAX),
        value => parse_u64(value, lineno),
    }
}

/// Formats a limit the way the kernel accepts it, turning [`MEMORY_MAX`] back into `max`.
pub(crate) fn format_limit(value: u64) -> String {
    if value == MEMORY_MAX {
        "max".to_string()
    } else {
        value.to_string()
    }
}

/// A byte count such as `memory.current`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct MemoryUsage {
    pub usage_bytes: u64,
}

impl SingleLineStat for MemoryUsage {
    /// # Errors
    ///
    /// Returns [`StatParseError::InvalidValue`] if the line is not an unsigned integer.
    fn from_reader<R: BufRead>(buf: &mut R) -> Result<Self, StatParseError> {
        let line = first_line(buf)?;
        Ok(MemoryUsage {
            usage_bytes: parse_u64(&line, 1)?,
        })
    }
}

/// A memory limit such as `memory.high`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MemoryLimit {
    /// Limit in bytes, [`MEMORY_MAX`] when the file says `max`.
    pub limit_bytes: u64,
}

impl MemoryLimit {
    pub fn is_unlimited(&self) -> bool {
        self.limit_bytes == MEMORY_MAX
    }
}

impl SingleLineStat for MemoryLimit {
    fn from_reader<R: BufRead>(buf: &mut R) -> Result<Self, StatParseError> {
        let line = first_line(buf)?;
        Ok(MemoryLimit {
            limit_bytes: parse_limit(&line, 1)?,
        })
    }
}

/// The content of `memory.high.tmp`: a self-reverting `memory.high`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TemporaryLimit {
    pub limit_bytes: u64,
    /// Time left before the limit reverts. Older kernels only print the limit.
    pub remaining: Option<Duration>,
}

impl SingleLineStat for TemporaryLimit {
    fn from_reader<R: BufRead>(buf: &mut R) -> Result<Self, StatParseError> {
        let line = first_line(buf)?;
        let mut tokens = line.split_whitespace();
        let limit_bytes = parse_limit(tokens.next().unwrap_or_default(), 1)?;
        let remaining = tokens
            .next()
            .map(|micros| parse_u64(micros, 1).map(Duration::from_micros))
            .transpose()?;
        if tokens.next().is_some() {
            return Err(StatParseError::invalid_format(1, &line));
        }
        Ok(TemporaryLimit {
            limit_bytes,
            remaining,
        })
    }
}

/// A boolean knob written as `0` or `1`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Flag(pub bool);

impl SingleLineStat for Flag {
    fn from_reader<R: BufRead>(buf: &mut R) -> Result<Self, StatParseError> {
        let line = first_line(buf)?;
        match line.as_str() {
            "0" => Ok(Flag(false)),
            "1" => Ok(Flag(true)),
            other => Err(StatParseError::invalid_format(1, other)),
        }
    }
}
