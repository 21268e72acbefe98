//! Block device classification from sysfs.

use std::path::Path;

use crate::fsutil::{DirectoryHandle, read_control_file_at};
use crate::{Error, Result};

pub const DEVICE_TYPE_DIR: &str = "queue";
pub const DEVICE_TYPE_FILE: &str = "rotational";

/// Storage medium of a block device.
#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize)]
#[serde(rename_all = "lowercase")]
pub enum DeviceType {
    Ssd,
    Hdd,
}

/// Reads the `rotational` attribute inside a device's `queue` directory.
///
/// # Errors
///
/// Returns [`Error::BadControlFile`] with reason `invalid format` for anything but `0` or `1`.
pub fn read_device_type_at(dir: &DirectoryHandle) -> Result<Option<DeviceType>> {
    let Some(content) = read_control_file_at(dir, DEVICE_TYPE_FILE)? else {
        return Ok(None);
    };
    match content.trim() {
        "0" => Ok(Some(DeviceType::Ssd)),
        "1" => Ok(Some(DeviceType::Hdd)),
        _ => Err(Error::bad_control_file(
            dir.child_path(DEVICE_TYPE_FILE),
            "invalid format",
        )),
    }
}

/// Classifies the device `device_id` (`major:minor`) below `sysfs_root`, usually
/// `/sys/dev/block`.
///
/// # Errors
///
/// Returns [`Error::BadControlFile`] naming `<sysfs_root>/<device_id>/queue/rotational` if
/// the attribute is missing or malformed.
pub fn get_device_type(device_id: &str, sysfs_root: impl AsRef<Path>) -> Result<DeviceType> {
    let queue = sysfs_root.as_ref().join(device_id).join(DEVICE_TYPE_DIR);
    let missing = || Error::bad_control_file(queue.join(DEVICE_TYPE_FILE), "missing file");

    let dir = DirectoryHandle::open(&queue)?.ok_or_else(missing)?;
    read_device_type_at(&dir)?.ok_or_else(missing)
}
