//! Text formats of the kernel control files, independent of where the text comes from.
//!
//! Every parser works on a [`std::io::BufRead`] and reports grammar problems as a
//! [`StatParseError`]; opening files and attaching paths to errors is the job of
//! [`crate::cgroup::control`] and [`crate::proc`].
//!
//! # Main types
//!
//! - [`KeyValueStat`] / [`SingleLineStat`]: reusable parsing traits.
//! - [`KeyedCounterMap`]: `memory.stat`, `/proc/vmstat`, `/proc/meminfo`.
//! - [`IoStatEntry`]: one device line of `io.stat`.
//! - [`PressureMetric`]: PSI averages, see [`parse_pressure`].

mod cgroup;
mod error;
mod io;
mod keyed;
mod memory;
mod parser;
mod pressure;

pub use cgroup::{CgroupEvents, CgroupStat, parse_controllers, parse_pids};
pub use error::StatParseError;
pub use io::{IoStatEntry, parse_io_stat, sum_io_stat};
pub use keyed::KeyedCounterMap;
pub use memory::{Flag, MEMORY_MAX, MemoryLimit, MemoryUsage, TemporaryLimit};
pub(crate) use memory::format_limit;
pub use parser::{KeyValueStat, SingleLineStat};
pub use pressure::{PressureMetric, PressureType, parse_pressure};
