//! Typed access to cgroup v2 control files.
//!
//! # Key Components
//!
//! - [`stats`]: parsers for the text formats.
//! - [`control`]: readers taking a [`crate::fsutil::DirectoryHandle`] of a cgroup.
//! - [`write`]: actuation primitives (`memory.high`, `memory.high.tmp`, ...).
//!
//! # Supported Files
//!
//! - `memory.{current,low,min,high,max,high.tmp,peak,swap.current,swap.max,oom.group}`
//! - `memory.stat`, `memory.pressure`
//! - `io.stat`, `io.pressure`
//! - `cgroup.{controllers,events,stat,procs}`
pub mod control;
pub mod stats;
pub mod write;

pub use control::*;
pub use write::*;
