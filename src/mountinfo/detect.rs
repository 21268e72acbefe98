use std::path::Path;

use super::parser::parse_mount_line;
use crate::fsutil::read_control_file;
use crate::{Error, Result};

const CGROUP2_FS_TYPE: &str = "cgroup2";

/// Detects the cgroup v2 mount point by scanning a mount table such as `/proc/self/mounts`.
///
/// The first `cgroup2` entry wins. The returned path always ends in `/`, so relative cgroup
/// paths can be appended directly.
///
/// # Errors
///
/// - [`Error::Read`] if the file cannot be read (including when it does not exist).
/// - [`Error::ParseMounts`] if a line is malformed.
/// - [`Error::MissingCgroup2Mount`] if there is no `cgroup2` entry.
///
/// # Example
///
/// ```no_run
/// use cgroup_fs::mountinfo::get_cgroup2_mount_point;
///
/// let root = get_cgroup2_mount_point("/proc/self/mounts").unwrap();
/// assert!(root.ends_with('/'));
/// ```
pub fn get_cgroup2_mount_point(path: impl AsRef<Path>) -> Result<String> {
    let path = path.as_ref();
    let content = read_control_file(path)?.ok_or_else(|| Error::Read {
        path: path.to_path_buf(),
        source: std::io::ErrorKind::NotFound.into(),
    })?;

    for (i, line) in content.lines().enumerate() {
        if line.trim().is_empty() {
            continue;
        }
        let entry = parse_mount_line(line, i + 1).map_err(|source| Error::ParseMounts {
            path: path.to_path_buf(),
            source,
        })?;
        if entry.fs_type == CGROUP2_FS_TYPE {
            log::debug!(
                "Found `cgroup2` mount point from `{}`: {}",
                entry.source,
                entry.mount_point
            );
            let mut mount_point = entry.mount_point;
            if !mount_point.ends_with('/') {
                mount_point.push('/');
            }
            return Ok(mount_point);
        }
    }

    Err(Error::MissingCgroup2Mount {
        path: path.to_path_buf(),
    })
}
