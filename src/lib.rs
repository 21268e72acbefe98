//! cgroup-fs: the filesystem access layer of an out-of-memory protection daemon.
//!
//! This library reads and writes the cgroup v2, procfs and sysfs control files that a
//! pressure-driven OOM killer consumes, tolerating a cgroup tree that changes underneath it.
//! Every directory is opened once into a [`fsutil::DirectoryHandle`] and every later read or
//! write is resolved relative to that descriptor, never by re-walking an absolute path.
//!
//! Readers return `Result<Option<T>>`: `Ok(None)` when the control file does not exist,
//! `Err` when it exists but does not match the kernel format.

use std::path::PathBuf;

pub mod cgroup;
pub mod device;
pub mod error;
pub mod fsutil;
pub mod listing;
pub mod mountinfo;
pub mod path;
pub mod proc;
pub mod snapshot;

#[cfg(test)]
pub(crate) mod testutil;

pub use error::{Error, Result};

/// Runs the `cgroup-fs` probe.
///
/// Locates the cgroup2 mount, opens the cgroup named by the first positional argument
/// (relative to that mount, defaulting to the root) and prints a JSON document with its
/// snapshot, its child cgroups and the system-wide counters.
///
/// The probe is configured through the environment:
/// - `CGROUP_FS_MOUNTS`: mount table to search, default `/proc/self/mounts`.
/// - `CGROUP_FS_PROC`: procfs root, default `/proc`.
///
/// # Errors
///
/// Returns an error if the mount table has no cgroup2 entry, if the requested cgroup lies
/// outside the mount or does not exist, or if the output cannot be serialized.
pub fn run(mut args: impl Iterator<Item = String>) -> std::result::Result<(), Box<dyn std::error::Error>> {
    let mounts = std::env::var_os("CGROUP_FS_MOUNTS")
        .map(PathBuf::from)
        .unwrap_or_else(|| PathBuf::from("/proc/self/mounts"));
    let proc_root = std::env::var_os("CGROUP_FS_PROC")
        .map(PathBuf::from)
        .unwrap_or_else(|| PathBuf::from("/proc"));

    let cgroup_root = mountinfo::get_cgroup2_mount_point(&mounts)?;
    log::debug!("Cgroup root: {cgroup_root}");

    let mut relative = args.next().unwrap_or_default();
    path::remove_prefix(&mut relative, "/");
    let requested = PathBuf::from(format!("{cgroup_root}{relative}"));
    let resolved = std::fs::canonicalize(&requested).map_err(|source| Error::Read {
        path: requested.clone(),
        source,
    })?;
    if !path::is_under_parent_path(&cgroup_root, &resolved.to_string_lossy()) {
        return Err(format!(
            "cgroup `{}` is outside of the cgroup2 mount `{cgroup_root}`",
            resolved.display()
        )
        .into());
    }

    let dir = fsutil::DirectoryHandle::open(&resolved)?
        .ok_or_else(|| format!("cgroup `{}` does not exist", resolved.display()))?;
    let report = snapshot::Report::collect(&dir, &proc_root);

    println!("{}", serde_json::to_string_pretty(&report)?);
    Ok(())
}
