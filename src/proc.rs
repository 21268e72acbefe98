//! System-wide counters from procfs.

use std::path::Path;

use crate::cgroup::stats::{KeyedCounterMap, PressureMetric, PressureType, parse_pressure};
use crate::fsutil::read_control_file;
use crate::{Error, Result};

pub const VMSTAT: &str = "vmstat";
pub const MEMINFO: &str = "meminfo";
pub const PRESSURE_DIR: &str = "pressure";

fn read_keyed(path: &Path) -> Result<Option<KeyedCounterMap>> {
    let Some(content) = read_control_file(path)? else {
        return Ok(None);
    };
    KeyedCounterMap::from_reader(&mut content.as_bytes())
        .map(Some)
        .map_err(|err| Error::from_parse(path, err))
}

/// Reads `/proc/vmstat`-formatted `path`.
pub fn read_vmstat(path: impl AsRef<Path>) -> Result<Option<KeyedCounterMap>> {
    read_keyed(path.as_ref())
}

/// Reads `/proc/meminfo`-formatted `path`. `kB` values are returned in bytes.
pub fn read_meminfo(path: impl AsRef<Path>) -> Result<Option<KeyedCounterMap>> {
    read_keyed(path.as_ref())
}

/// Reads a pressure file such as `/proc/pressure/memory`.
pub fn read_pressure(
    path: impl AsRef<Path>,
    pressure_type: PressureType,
) -> Result<Option<PressureMetric>> {
    let path = path.as_ref();
    let Some(content) = read_control_file(path)? else {
        return Ok(None);
    };
    parse_pressure(&mut content.as_bytes(), pressure_type)
        .map(Some)
        .map_err(|err| Error::from_parse(path, err))
}
