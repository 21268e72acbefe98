//! Point-in-time view of a cgroup and its children, as printed by the `cgroup-fs` binary.
//!
//! Collection never fails as a whole: a missing control file leaves its field empty and a
//! malformed one is logged and skipped, the way a scan loop must treat a cgroup tree that
//! changes while it is being read.

use std::path::{Path, PathBuf};

use crate::cgroup::stats::{IoStatEntry, KeyedCounterMap, PressureMetric, PressureType, sum_io_stat};
use crate::cgroup;
use crate::error::ResultOkLogExt;
use crate::fsutil::DirectoryHandle;
use crate::listing::{EntryFilter, read_dir_at};
use crate::{Result, proc};

fn read<T>(result: Result<Option<T>>) -> Option<T> {
    result.ok_log().flatten()
}

#[derive(Debug, Clone, PartialEq, Default, serde::Serialize)]
pub struct PressureSnapshot {
    pub some: Option<PressureMetric>,
    pub full: Option<PressureMetric>,
}

/// Everything readable from one cgroup directory.
#[derive(Debug, Clone, PartialEq, Default, serde::Serialize)]
pub struct CgroupSnapshot {
    pub path: PathBuf,
    pub populated: Option<bool>,
    pub nr_descendants: Option<u64>,
    pub nr_dying_descendants: Option<u64>,
    pub controllers: Option<Vec<String>>,
    pub pids: Option<Vec<u32>>,
    pub memory_current: Option<u64>,
    pub memory_low: Option<u64>,
    pub memory_min: Option<u64>,
    pub memory_high: Option<u64>,
    pub memory_max: Option<u64>,
    pub memory_high_tmp: Option<u64>,
    pub memory_peak: Option<u64>,
    pub swap_current: Option<u64>,
    pub swap_max: Option<u64>,
    pub oom_group: Option<bool>,
    pub memory_stat: Option<KeyedCounterMap>,
    /// `io.stat` summed over all devices.
    pub io_total: Option<IoStatEntry>,
    pub memory_pressure: PressureSnapshot,
    pub io_pressure: PressureSnapshot,
}

impl CgroupSnapshot {
    pub fn collect(dir: &DirectoryHandle) -> Self {
        log::trace!("Collecting snapshot of `{}`", dir.path().display());
        Self {
            path: dir.path().to_path_buf(),
            populated: read(cgroup::read_is_populated_at(dir)),
            nr_descendants: read(cgroup::read_nr_descendants_at(dir)),
            nr_dying_descendants: read(cgroup::read_nr_dying_descendants_at(dir)),
            controllers: read(cgroup::read_controllers_at(dir)),
            pids: read(cgroup::read_pids_at(dir)),
            memory_current: read(cgroup::read_memory_current_at(dir)),
            memory_low: read(cgroup::read_memory_low_at(dir)),
            memory_min: read(cgroup::read_memory_min_at(dir)),
            memory_high: read(cgroup::read_memory_high_at(dir)),
            memory_max: read(cgroup::read_memory_max_at(dir)),
            memory_high_tmp: read(cgroup::read_memory_high_tmp_at(dir)),
            memory_peak: read(cgroup::read_memory_peak_at(dir)),
            swap_current: read(cgroup::read_swap_current_at(dir)),
            swap_max: read(cgroup::read_swap_max_at(dir)),
            oom_group: read(cgroup::read_memory_oom_group_at(dir)),
            memory_stat: read(cgroup::read_memory_stat_at(dir)),
            io_total: read(cgroup::read_io_stat_at(dir)).map(|entries| sum_io_stat(&entries)),
            memory_pressure: PressureSnapshot {
                some: read(cgroup::read_memory_pressure_at(dir, PressureType::Some)),
                full: read(cgroup::read_memory_pressure_at(dir, PressureType::Full)),
            },
            io_pressure: PressureSnapshot {
                some: read(cgroup::read_io_pressure_at(dir, PressureType::Some)),
                full: read(cgroup::read_io_pressure_at(dir, PressureType::Full)),
            },
        }
    }
}

/// Host-wide counters from procfs.
#[derive(Debug, Clone, PartialEq, Default, serde::Serialize)]
pub struct SystemSnapshot {
    pub vmstat: Option<KeyedCounterMap>,
    pub meminfo: Option<KeyedCounterMap>,
    pub memory_pressure: PressureSnapshot,
    pub io_pressure: PressureSnapshot,
}

impl SystemSnapshot {
    pub fn collect(proc_root: &Path) -> Self {
        let pressure = |name: &str| {
            let path = proc_root.join(proc::PRESSURE_DIR).join(name);
            PressureSnapshot {
                some: read(proc::read_pressure(&path, PressureType::Some)),
                full: read(proc::read_pressure(&path, PressureType::Full)),
            }
        };
        Self {
            vmstat: read(proc::read_vmstat(proc_root.join(proc::VMSTAT))),
            meminfo: read(proc::read_meminfo(proc_root.join(proc::MEMINFO))),
            memory_pressure: pressure("memory"),
            io_pressure: pressure("io"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, serde::Serialize)]
pub struct Report {
    pub cgroup: CgroupSnapshot,
    /// Direct child cgroups, sorted by path. Children removed during the scan are skipped.
    pub children: Vec<CgroupSnapshot>,
    pub system: SystemSnapshot,
}

impl Report {
    pub fn collect(dir: &DirectoryHandle, proc_root: &Path) -> Self {
        let mut names = read_dir_at(dir, EntryFilter::Dirs)
            .ok_log()
            .map(|entries| entries.dirs)
            .unwrap_or_default();
        names.sort();

        let children = names
            .iter()
            .filter_map(|name| {
                let child = read(dir.open_dir_at(name));
                if child.is_none() {
                    log::warn!("Cgroup `{name}` vanished from `{}`", dir.path().display());
                }
                child
            })
            .map(|child| CgroupSnapshot::collect(&child))
            .collect();

        Self {
            cgroup: CgroupSnapshot::collect(dir),
            children,
            system: SystemSnapshot::collect(proc_root),
        }
    }
}
