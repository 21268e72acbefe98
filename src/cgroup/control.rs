//! Readers for the control files of one cgroup.
//!
//! Every reader resolves its file relative to a [`DirectoryHandle`] and returns:
//!
//! - `Ok(None)` if the file does not exist (controller not enabled, cgroup being removed),
//! - `Ok(Some(value))` on success,
//! - `Err(Error::BadControlFile)` if the file exists but does not parse.

use crate::cgroup::stats::{
    CgroupEvents, CgroupStat, Flag, IoStatEntry, KeyValueStat, KeyedCounterMap, MemoryLimit,
    MemoryUsage, PressureMetric, PressureType, SingleLineStat, StatParseError, TemporaryLimit,
    parse_controllers, parse_io_stat, parse_pids, parse_pressure,
};
use crate::fsutil::{DirectoryHandle, read_control_file_at};
use crate::{Error, Result};

pub const CGROUP_PROCS: &str = "cgroup.procs";
pub const CGROUP_EVENTS: &str = "cgroup.events";
pub const CGROUP_STAT: &str = "cgroup.stat";
pub const CGROUP_CONTROLLERS: &str = "cgroup.controllers";
pub const MEMORY_CURRENT: &str = "memory.current";
pub const MEMORY_LOW: &str = "memory.low";
pub const MEMORY_MIN: &str = "memory.min";
pub const MEMORY_HIGH: &str = "memory.high";
pub const MEMORY_MAX_FILE: &str = "memory.max";
pub const MEMORY_HIGH_TMP: &str = "memory.high.tmp";
pub const MEMORY_PEAK: &str = "memory.peak";
pub const MEMORY_RECLAIM: &str = "memory.reclaim";
pub const MEMORY_SWAP_CURRENT: &str = "memory.swap.current";
pub const MEMORY_SWAP_MAX: &str = "memory.swap.max";
pub const MEMORY_OOM_GROUP: &str = "memory.oom.group";
pub const MEMORY_STAT: &str = "memory.stat";
pub const MEMORY_PRESSURE: &str = "memory.pressure";
pub const IO_STAT: &str = "io.stat";
pub const IO_PRESSURE: &str = "io.pressure";

/// Reads `name` inside `dir` and parses it, attaching the file's path to parse errors.
pub(crate) fn read_at<T>(
    dir: &DirectoryHandle,
    name: &str,
    parse: impl FnOnce(&mut &[u8]) -> std::result::Result<T, StatParseError>,
) -> Result<Option<T>> {
    let Some(content) = read_control_file_at(dir, name)? else {
        return Ok(None);
    };
    parse(&mut content.as_bytes())
        .map(Some)
        .map_err(|err| Error::from_parse(&dir.child_path(name), err))
}

fn read_usage_at(dir: &DirectoryHandle, name: &str) -> Result<Option<u64>> {
    read_at(dir, name, |buf| MemoryUsage::from_reader(buf)).map(|v| v.map(|u| u.usage_bytes))
}

fn read_limit_at(dir: &DirectoryHandle, name: &str) -> Result<Option<u64>> {
    read_at(dir, name, |buf| MemoryLimit::from_reader(buf)).map(|v| v.map(|l| l.limit_bytes))
}

/// `memory.current`: bytes charged to the cgroup.
pub fn read_memory_current_at(dir: &DirectoryHandle) -> Result<Option<u64>> {
    read_usage_at(dir, MEMORY_CURRENT)
}

/// `memory.low`; `max` reads as [`crate::cgroup::stats::MEMORY_MAX`], as for all limits.
pub fn read_memory_low_at(dir: &DirectoryHandle) -> Result<Option<u64>> {
    read_limit_at(dir, MEMORY_LOW)
}

pub fn read_memory_min_at(dir: &DirectoryHandle) -> Result<Option<u64>> {
    read_limit_at(dir, MEMORY_MIN)
}

pub fn read_memory_high_at(dir: &DirectoryHandle) -> Result<Option<u64>> {
    read_limit_at(dir, MEMORY_HIGH)
}

pub fn read_memory_max_at(dir: &DirectoryHandle) -> Result<Option<u64>> {
    read_limit_at(dir, MEMORY_MAX_FILE)
}

/// The limit currently set through `memory.high.tmp`, ignoring the time left.
pub fn read_memory_high_tmp_at(dir: &DirectoryHandle) -> Result<Option<u64>> {
    read_at(dir, MEMORY_HIGH_TMP, |buf| TemporaryLimit::from_reader(buf))
        .map(|v| v.map(|t| t.limit_bytes))
}

pub fn read_memory_peak_at(dir: &DirectoryHandle) -> Result<Option<u64>> {
    read_usage_at(dir, MEMORY_PEAK)
}

pub fn read_swap_current_at(dir: &DirectoryHandle) -> Result<Option<u64>> {
    read_usage_at(dir, MEMORY_SWAP_CURRENT)
}

pub fn read_swap_max_at(dir: &DirectoryHandle) -> Result<Option<u64>> {
    read_limit_at(dir, MEMORY_SWAP_MAX)
}

/// Controllers available in this cgroup, from `cgroup.controllers`.
pub fn read_controllers_at(dir: &DirectoryHandle) -> Result<Option<Vec<String>>> {
    read_at(dir, CGROUP_CONTROLLERS, |buf| parse_controllers(buf))
}

/// The `populated` key of `cgroup.events`.
pub fn read_is_populated_at(dir: &DirectoryHandle) -> Result<Option<bool>> {
    read_at(dir, CGROUP_EVENTS, |buf| CgroupEvents::from_reader(buf)).map(|v| v.map(|e| e.populated()))
}

/// The `nr_dying_descendants` key of `cgroup.stat`.
pub fn read_nr_dying_descendants_at(dir: &DirectoryHandle) -> Result<Option<u64>> {
    read_at(dir, CGROUP_STAT, |buf| CgroupStat::from_reader(buf))
        .map(|v| v.map(|s| s.nr_dying_descendants()))
}

/// The `nr_descendants` key of `cgroup.stat`.
pub fn read_nr_descendants_at(dir: &DirectoryHandle) -> Result<Option<u64>> {
    read_at(dir, CGROUP_STAT, |buf| CgroupStat::from_reader(buf)).map(|v| v.map(|s| s.nr_descendants))
}

/// Whether the OOM killer treats the cgroup as one unit (`memory.oom.group`).
pub fn read_memory_oom_group_at(dir: &DirectoryHandle) -> Result<Option<bool>> {
    read_at(dir, MEMORY_OOM_GROUP, |buf| Flag::from_reader(buf)).map(|v| v.map(|Flag(on)| on))
}

/// Pids of the processes directly in this cgroup. `Some(vec![])` for an empty cgroup.
pub fn read_pids_at(dir: &DirectoryHandle) -> Result<Option<Vec<u32>>> {
    read_at(dir, CGROUP_PROCS, |buf| parse_pids(buf))
}

pub fn read_memory_stat_at(dir: &DirectoryHandle) -> Result<Option<KeyedCounterMap>> {
    read_at(dir, MEMORY_STAT, |buf| KeyedCounterMap::from_reader(buf))
}

/// Per-device entries of `io.stat`, in file order.
pub fn read_io_stat_at(dir: &DirectoryHandle) -> Result<Option<Vec<IoStatEntry>>> {
    read_at(dir, IO_STAT, |buf| parse_io_stat(buf))
}

pub fn read_memory_pressure_at(
    dir: &DirectoryHandle,
    pressure_type: PressureType,
) -> Result<Option<PressureMetric>> {
    read_at(dir, MEMORY_PRESSURE, |buf| parse_pressure(buf, pressure_type))
}

pub fn read_io_pressure_at(
    dir: &DirectoryHandle,
    pressure_type: PressureType,
) -> Result<Option<PressureMetric>> {
    read_at(dir, IO_PRESSURE, |buf| parse_pressure(buf, pressure_type))
}
