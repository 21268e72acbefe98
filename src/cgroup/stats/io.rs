//! Parsing of the per-device cgroup `io.stat` file.
//!
//! Each line names a block device by `major:minor` followed by `key=value` counters in any
//! order:
//!
//! ```text
//! 8:0 rbytes=1024 wbytes=2048 rios=12 wios=24 dbytes=0 dios=0
//! ```
//!
//! Every line becomes one [`IoStatEntry`]; keys other than the six byte/operation counters
//! (e.g. `cost.*` on kernels with io.cost) are ignored, and a counter missing from a line
//! stays `0`.
//!
//! # Example
//!
//! ```rust
//! use cgroup_fs::cgroup::stats::{parse_io_stat, sum_io_stat};
//!
//! let data = "\
//! 8:0 rbytes=1024 wbytes=2048 rios=12 wios=24
//! 254:0 rbytes=1024 wbytes=2048 rios=12 wios=24
//! ";
//! let entries = parse_io_stat(&mut data.as_bytes()).unwrap();
//! assert_eq!(entries[1].dev_id, "254:0");
//!
//! let total = sum_io_stat(&entries);
//! assert_eq!(total.rbytes, 2048);
//! assert_eq!(total.wios, 48);
//! ```

use std::collections::{HashMap, HashSet};
use std::io::BufRead;
use std::sync::LazyLock;

use super::StatParseError;
use super::parser::KeyValueStat;

/// Cumulative I/O counters of one cgroup against one block device.
#[derive(Debug, Clone, PartialEq, Eq, Default, serde::Serialize)]
pub struct IoStatEntry {
    /// Device as `major:minor`.
    pub dev_id: String,
    pub rbytes: u64,
    pub wbytes: u64,
    pub dbytes: u64,
    pub rios: u64,
    pub wios: u64,
    pub dios: u64,
}

impl IoStatEntry {
    fn set_rbytes(&mut self, v: u64) {
        self.rbytes = v;
    }

    fn set_wbytes(&mut self, v: u64) {
        self.wbytes = v;
    }

    fn set_dbytes(&mut self, v: u64) {
        self.dbytes = v;
    }

    fn set_rios(&mut self, v: u64) {
        self.rios = v;
    }

    fn set_wios(&mut self, v: u64) {
        self.wios = v;
    }

    fn set_dios(&mut self, v: u64) {
        self.dios = v;
    }
}

type Setter = fn(&mut IoStatEntry, u64);

static SETTERS: LazyLock<HashMap<&'static str, Setter>> = LazyLock::new(|| {
    let mut m: HashMap<&'static str, Setter> = HashMap::with_capacity(6);

    m.insert("rbytes", IoStatEntry::set_rbytes);
    m.insert("wbytes", IoStatEntry::set_wbytes);
    m.insert("dbytes", IoStatEntry::set_dbytes);
    m.insert("rios", IoStatEntry::set_rios);
    m.insert("wios", IoStatEntry::set_wios);
    m.insert("dios", IoStatEntry::set_dios);

    m
});

impl KeyValueStat for IoStatEntry {
    const SPLIT_CHAR: Option<char> = Some('=');
    const SKIP_VALUES: usize = 1;
    const ALLOW_DUPLICATE_KEYS: bool = false;
    const ALLOW_MULTIPLE_KV_PER_LINE: bool = true;

    #[inline]
    fn field_handlers() -> &'static HashMap<&'static str, fn(&mut Self, u64)> {
        &SETTERS
    }
}

/// Parses `io.stat` into one entry per device line, in file order.
///
/// # Errors
///
/// - [`StatParseError::InvalidFormat`] if a line does not start with a `major:minor` id.
/// - [`StatParseError::InvalidKeyValue`] if a counter is not an unsigned integer.
/// - [`StatParseError::DuplicateField`] if a counter repeats within one line.
pub fn parse_io_stat<R: BufRead>(buf: &mut R) -> Result<Vec<IoStatEntry>, StatParseError> {
    let handlers = IoStatEntry::field_handlers();
    let mut entries = Vec::new();
    let mut line = String::new();
    let mut lineno = 0;

    while buf.read_line(&mut line)? != 0 {
        lineno += 1;
        let Some(dev_id) = line.split_whitespace().next() else {
            line.clear();
            continue;
        };
        if !is_device_id(dev_id) {
            return Err(StatParseError::invalid_format(lineno, &line));
        }

        let mut entry = IoStatEntry {
            dev_id: dev_id.to_string(),
            ..IoStatEntry::default()
        };
        let mut seen_keys = HashSet::with_capacity(handlers.len());
        IoStatEntry::parse_line(&mut entry, &line, lineno, handlers, &mut seen_keys)?;
        entries.push(entry);
        line.clear();
    }

    Ok(entries)
}

fn is_device_id(token: &str) -> bool {
    token.split_once(':').is_some_and(|(major, minor)| {
        !major.is_empty()
            && !minor.is_empty()
            && major.bytes().all(|b| b.is_ascii_digit())
            && minor.bytes().all(|b| b.is_ascii_digit())
    })
}

/// Sums the counters of all devices, saturating at `u64::MAX`. The result has an empty
/// `dev_id`.
pub fn sum_io_stat(entries: &[IoStatEntry]) -> IoStatEntry {
    entries
        .iter()
        .fold(IoStatEntry::default(), |mut acc, entry| {
            acc.rbytes = acc.rbytes.saturating_add(entry.rbytes);
            acc.wbytes = acc.wbytes.saturating_add(entry.wbytes);
            acc.dbytes = acc.dbytes.saturating_add(entry.dbytes);
            acc.rios = acc.rios.saturating_add(entry.rios);
            acc.wios = acc.wios.saturating_add(entry.wios);
            acc.dios = acc.dios.saturating_add(entry.dios);
            acc
        })
}
