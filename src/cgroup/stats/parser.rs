//! Generic parsing traits for kernel control files.
//!
//! - [`KeyValueStat`]: multi-line files made of key/value pairs with a fixed set of known
//!   keys, such as `cgroup.events`, `cgroup.stat` or one device line of `io.stat`.
//! - [`SingleLineStat`]: files holding one value, such as `memory.current` or `memory.high`.
//!
//! Keys without a handler are ignored, so newer kernels adding fields do not break parsing.
//!
//! # Example: Implementing `KeyValueStat`
//!
//! ```rust
//! use std::collections::HashMap;
//! use std::sync::LazyLock;
//! use cgroup_fs::cgroup::stats::KeyValueStat;
//!
//! #[derive(Default)]
//! struct Events {
//!     frozen: u64,
//! }
//!
//! fn set_frozen(events: &mut Events, v: u64) {
//!     events.frozen = v;
//! }
//!
//! static HANDLERS: LazyLock<HashMap<&'static str, fn(&mut Events, u64)>> =
//!     LazyLock::new(|| HashMap::from([("frozen", set_frozen as fn(&mut Events, u64))]));
//!
//! impl KeyValueStat for Events {
//!     const SPLIT_CHAR: Option<char> = None;
//!     const SKIP_VALUES: usize = 0;
//!     const ALLOW_DUPLICATE_KEYS: bool = false;
//!     const ALLOW_MULTIPLE_KV_PER_LINE: bool = false;
//!
//!     fn field_handlers() -> &'static HashMap<&'static str, fn(&mut Self, u64)> {
//!         &HANDLERS
//!     }
//! }
//!
//! let events = Events::from_reader(&mut "populated 1\nfrozen 1\n".as_bytes()).unwrap();
//! assert_eq!(events.frozen, 1);
//! ```

use std::collections::{HashMap, HashSet};
use std::io::BufRead;

use super::StatParseError;

/// A trait for parsing key/value control files into a struct with known fields.
///
/// Implementors describe the layout through the associated constants and map each known key
/// to a handler that stores (or accumulates) the parsed value.
pub trait KeyValueStat: Default
where
    Self: 'static,
{
    /// If `Some(c)`, pairs are written as `key<c>value` (`rbytes=1024`); if `None`, key and
    /// value are separate whitespace-delimited tokens (`populated 1`).
    const SPLIT_CHAR: Option<char>;

    /// Whitespace-separated tokens to skip at the start of each line, e.g. a device id.
    const SKIP_VALUES: usize;

    /// If `false`, a key seen twice is a [`StatParseError::DuplicateField`].
    const ALLOW_DUPLICATE_KEYS: bool;

    /// If `false`, only the first pair of each line is read.
    const ALLOW_MULTIPLE_KV_PER_LINE: bool;

    /// Known keys and the functions applying their values.
    fn field_handlers() -> &'static HashMap<&'static str, fn(&mut Self, u64)>;

    /// Checks the parsed struct once the input is exhausted, e.g. for required keys.
    #[inline]
    fn validate(&self) -> Result<(), StatParseError> {
        Ok(())
    }

    /// Parses the whole buffer line by line.
    ///
    /// # Errors
    ///
    /// Returns [`StatParseError::InvalidKeyValue`] for a known key whose value is not an
    /// unsigned integer, [`StatParseError::DuplicateField`] for repeated keys when they are
    /// disallowed, and whatever [`KeyValueStat::validate`] reports.
    fn from_reader<R: BufRead>(buf: &mut R) -> Result<Self, StatParseError> {
        let mut stat = Self::default();
        let handlers = Self::field_handlers();
        let mut seen_keys = HashSet::with_capacity(handlers.len());

        let mut line = String::new();
        let mut lineno = 0;
        while buf.read_line(&mut line)? != 0 {
            lineno += 1;
            Self::parse_line(&mut stat, &line, lineno, handlers, &mut seen_keys)?;
            line.clear();
        }

        stat.validate()?;
        Ok(stat)
    }

    /// Parses a single line into one or more pairs.
    fn parse_line(
        stat: &mut Self,
        line: &str,
        lineno: usize,
        handlers: &HashMap<&'static str, fn(&mut Self, u64)>,
        seen_keys: &mut HashSet<&'static str>,
    ) -> Result<(), StatParseError> {
        let mut parts = line.split_whitespace().skip(Self::SKIP_VALUES);

        match Self::SPLIT_CHAR {
            Some(split_char) => {
                for part in parts {
                    if let Some((key, val)) = part.split_once(split_char) {
                        Self::parse_and_set(key, val, stat, lineno, handlers, seen_keys)?;
                    }
                    if !Self::ALLOW_MULTIPLE_KV_PER_LINE {
                        break;
                    }
                }
            }
            None => {
                while let (Some(key), Some(val)) = (parts.next(), parts.next()) {
                    Self::parse_and_set(key, val, stat, lineno, handlers, seen_keys)?;
                    if !Self::ALLOW_MULTIPLE_KV_PER_LINE {
                        break;
                    }
                }
            }
        }
        Ok(())
    }

    /// Parses one value and hands it to the key's handler. Unknown keys are skipped.
    fn parse_and_set(
        key: &str,
        val: &str,
        stat: &mut Self,
        lineno: usize,
        handlers: &HashMap<&'static str, fn(&mut Self, u64)>,
        seen_keys: &mut HashSet<&'static str>,
    ) -> Result<(), StatParseError> {
        let Some((k, handler)) = handlers.get_key_value(key) else {
            return Ok(());
        };
        let parsed = val
            .parse::<u64>()
            .map_err(|source| StatParseError::InvalidKeyValue {
                key: key.to_string(),
                value: val.to_string(),
                line: lineno,
                source,
            })?;
        if !Self::ALLOW_DUPLICATE_KEYS && !seen_keys.insert(*k) {
            return Err(StatParseError::DuplicateField {
                field: key.to_string(),
                line: lineno,
            });
        }
        handler(stat, parsed);
        Ok(())
    }
}

/// A trait for files holding a single value on their first line.
pub trait SingleLineStat: Sized {
    /// Parses the first line of `buf`.
    fn from_reader<R: BufRead>(buf: &mut R) -> Result<Self, StatParseError>;
}

/// Reads the first line of `buf` with surrounding whitespace removed.
pub(crate) fn first_line<R: BufRead>(buf: &mut R) -> Result<String, StatParseError> {
    let mut line = String::new();
    buf.read_line(&mut line)?;
    Ok(line.trim().to_string())
}

pub(crate) fn parse_u64(value: &str, lineno: usize) -> Result<u64, StatParseError> {
    value
        .parse::<u64>()
        .map_err(|source| StatParseError::InvalidValue {
            value: value.to_string(),
            line: lineno,
            source,
        })
}
