//! Writers for the memory control knobs.
//!
//! Values are written as decimal bytes; [`MEMORY_MAX`](crate::cgroup::stats::MEMORY_MAX) is
//! written as the literal `max`. The kernel validates the value on `write(2)`, so a refused
//! value surfaces as [`Error::WriteRejected`](crate::Error::WriteRejected).

use std::time::Duration;

use crate::Result;
use crate::cgroup::control::{MEMORY_HIGH, MEMORY_HIGH_TMP, MEMORY_MAX_FILE, MEMORY_RECLAIM};
use crate::cgroup::stats::format_limit;
use crate::fsutil::{DirectoryHandle, write_control_file_at};

/// Sets `memory.high`, the throttling threshold of the cgroup.
pub fn write_memory_high_at(dir: &DirectoryHandle, value: u64) -> Result<()> {
    let value = format_limit(value);
    log::debug!("Setting {} of `{}` to {value}", MEMORY_HIGH, dir.path().display());
    write_control_file_at(dir, MEMORY_HIGH, &value)
}

/// Sets `memory.high.tmp`: a `memory.high` that the kernel reverts after `duration`.
///
/// The duration is written in whole microseconds, truncating any remainder.
pub fn write_memory_high_tmp_at(dir: &DirectoryHandle, value: u64, duration: Duration) -> Result<()> {
    let value = format!("{} {}", format_limit(value), duration.as_micros());
    log::debug!("Setting {} of `{}` to {value}", MEMORY_HIGH_TMP, dir.path().display());
    write_control_file_at(dir, MEMORY_HIGH_TMP, &value)
}

/// Sets `memory.max`, the hard limit of the cgroup.
pub fn write_memory_max_at(dir: &DirectoryHandle, value: u64) -> Result<()> {
    let value = format_limit(value);
    log::debug!("Setting {} of `{}` to {value}", MEMORY_MAX_FILE, dir.path().display());
    write_control_file_at(dir, MEMORY_MAX_FILE, &value)
}

/// Asks the kernel to reclaim `bytes` from the cgroup through `memory.reclaim`.
///
/// The kernel fails the write with `EAGAIN` if it could not reclaim the full amount.
pub fn write_memory_reclaim_at(dir: &DirectoryHandle, bytes: u64) -> Result<()> {
    log::debug!("Reclaiming {bytes} bytes from `{}`", dir.path().display());
    write_control_file_at(dir, MEMORY_RECLAIM, &bytes.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::Error;
    use crate::cgroup::control::{read_memory_high_at, read_memory_high_tmp_at, read_memory_max_at};
    use crate::cgroup::stats::MEMORY_MAX;
    use crate::fsutil::read_control_file_at;
    use crate::testutil::cgroup_tree;

    fn root(tree: &tempfile::TempDir) -> DirectoryHandle {
        DirectoryHandle::open(tree.path()).unwrap().unwrap()
    }

    #[test]
    fn test_write_memory_high() {
        let tree = cgroup_tree();
        let dir = root(&tree);

        write_memory_high_at(&dir, 54321).unwrap();
        assert_eq!(read_memory_high_at(&dir).unwrap(), Some(54321));
    }

    #[test]
    fn test_write_memory_high_tmp() {
        let tree = cgroup_tree();
        let dir = root(&tree);

        write_memory_high_tmp_at(&dir, 54321, Duration::from_micros(400000)).unwrap();
        assert_eq!(read_memory_high_tmp_at(&dir).unwrap(), Some(54321));
        assert_eq!(
            read_control_file_at(&dir, MEMORY_HIGH_TMP).unwrap().unwrap(),
            "54321 400000"
        );
    }

    #[test]
    fn test_write_memory_high_tmp_truncates_to_micros() {
        let tree = cgroup_tree();
        let dir = root(&tree);

        write_memory_high_tmp_at(&dir, 1, Duration::from_nanos(2_500)).unwrap();
        assert_eq!(read_control_file_at(&dir, MEMORY_HIGH_TMP).unwrap().unwrap(), "1 2");
    }

    #[test]
    fn test_write_unlimited() {
        let tree = cgroup_tree();
        let dir = root(&tree);

        write_memory_max_at(&dir, MEMORY_MAX).unwrap();
        assert_eq!(read_control_file_at(&dir, MEMORY_MAX_FILE).unwrap().unwrap(), "max");
        assert_eq!(read_memory_max_at(&dir).unwrap(), Some(MEMORY_MAX));
    }

    #[test]
    fn test_write_missing_file_is_rejected() {
        let tree = cgroup_tree();
        let dir = DirectoryHandle::open(tree.path().join("service1.service"))
            .unwrap()
            .unwrap();

        let err = write_memory_high_at(&dir, 1).unwrap_err();
        assert!(matches!(err, Error::WriteRejected { .. }));
        assert_eq!(err.path(), tree.path().join("service1.service/memory.high"));

        let err = write_memory_reclaim_at(&dir, 4096).unwrap_err();
        assert!(matches!(err, Error::WriteRejected { .. }));
    }
}
