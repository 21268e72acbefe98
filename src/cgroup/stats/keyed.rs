//! Free-form `key value [unit]` files: `memory.stat`, `/proc/vmstat` and `/proc/meminfo`.
//!
//! Unlike [`super::KeyValueStat`] implementors, a [`KeyedCounterMap`] keeps every key it
//! finds, since the set of keys changes between kernel versions. Looking up a key the kernel
//! did not print yields `0`.
//!
//! ```rust
//! use cgroup_fs::cgroup::stats::KeyedCounterMap;
//!
//! let data = "MemTotal:       16318480 kB\nHugePages_Total:       0\n";
//! let meminfo = KeyedCounterMap::from_reader(&mut data.as_bytes()).unwrap();
//! assert_eq!(meminfo.get("MemTotal"), 16318480 * 1024);
//! assert_eq!(meminfo["asdf"], 0);
//! ```

use std::collections::HashMap;
use std::collections::hash_map::Entry;
use std::io::BufRead;
use std::ops::Index;

use super::StatParseError;

/// Counters by name; absent keys read as zero.
#[derive(Debug, Clone, Default, PartialEq, Eq, serde::Serialize)]
#[serde(transparent)]
pub struct KeyedCounterMap(HashMap<String, u64>);

impl KeyedCounterMap {
    /// Returns the counter for `key`, or `0` if the key is not present.
    pub fn get(&self, key: &str) -> u64 {
        self.0.get(key).copied().unwrap_or(0)
    }

    pub fn contains_key(&self, key: &str) -> bool {
        self.0.contains_key(key)
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, u64)> {
        self.0.iter().map(|(k, v)| (k.as_str(), *v))
    }

    /// Parses `key value [unit]` lines.
    ///
    /// A trailing `:` on the key is dropped and a `kB` unit scales the value by 1024.
    /// Blank lines are skipped.
    ///
    /// # Errors
    ///
    /// - [`StatParseError::InvalidKeyValue`] if a value is not an unsigned integer.
    /// - [`StatParseError::DuplicateField`] if a key appears twice.
    /// - [`StatParseError::InvalidFormat`] for a line without a value or with an unknown unit.
    pub fn from_reader<R: BufRead>(buf: &mut R) -> Result<Self, StatParseError> {
        let mut map = HashMap::new();
        let mut line = String::new();
        let mut lineno = 0;

        while buf.read_line(&mut line)? != 0 {
            lineno += 1;
            let mut parts = line.split_whitespace();
            let Some(key) = parts.next() else {
                line.clear();
                continue;
            };
            let (Some(value), unit, None) = (parts.next(), parts.next(), parts.next()) else {
                return Err(StatParseError::invalid_format(lineno, &line));
            };
            let key = key.strip_suffix(':').unwrap_or(key);

            let parsed = value
                .parse::<u64>()
                .map_err(|source| StatParseError::InvalidKeyValue {
                    key: key.to_string(),
                    value: value.to_string(),
                    line: lineno,
                    source,
                })?;
            let parsed = match unit {
                None => parsed,
                Some("kB") => parsed.saturating_mul(1024),
                Some(_) => return Err(StatParseError::invalid_format(lineno, &line)),
            };

            match map.entry(key.to_string()) {
                Entry::Occupied(_) => {
                    return Err(StatParseError::DuplicateField {
                        field: key.to_string(),
                        line: lineno,
                    });
                }
                Entry::Vacant(slot) => {
                    slot.insert(parsed);
                }
            }
            line.clear();
        }

        Ok(KeyedCounterMap(map))
    }
}

impl Index<&str> for KeyedCounterMap {
    type Output = u64;

    fn index(&self, key: &str) -> &u64 {
        self.0.get(key).unwrap_or(&0)
    }
}

impl FromIterator<(String, u64)> for KeyedCounterMap {
    fn from_iter<I: IntoIterator<Item = (String, u64)>>(iter: I) -> Self {
        KeyedCounterMap(iter.into_iter().collect())
    }
}
