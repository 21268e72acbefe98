//! Mount table line parser for Linux systems.
//!
//! Two layouts are accepted:
//!
//! - `/proc/mounts` (see [`fstab(5)`](https://man7.org/linux/man-pages/man5/fstab.5.html)):
//!   `source mount_point fs_type options dump pass`
//! - `/proc/[pid]/mountinfo` (see
//!   [`proc_pid_mountinfo(5)`](https://man7.org/linux/man-pages/man5/proc_pid_mountinfo.5.html)):
//!   `id parent major:minor root mount_point options [optional...] - fs_type source super_options`
//!
//! A line containing the ` - ` separator is read as mountinfo.

/// The fields of a mount table line needed to locate a filesystem.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MountEntry {
    /// Mount source (device or pseudo-filesystem name).
    pub source: String,
    /// Mount point, with the kernel's octal escapes (`\040` etc.) decoded.
    pub mount_point: String,
    /// Filesystem type (e.g. `ext4`, `cgroup2`).
    pub fs_type: String,
}

/// Named fields in a mount table line.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MountField {
    Source,
    MountPoint,
    FsType,
}

impl std::fmt::Display for MountField {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            MountField::Source => "source",
            MountField::MountPoint => "mount_point",
            MountField::FsType => "fs_type",
        };
        write!(f, "{name}")
    }
}

/// Errors that may occur when parsing a mount table line.
#[derive(Debug, thiserror::Error)]
pub enum ParseError {
    #[error("missing `{field}` in line {lineno}: `{line}`")]
    MissingField {
        field: MountField,
        lineno: usize,
        line: String,
    },
}

/// Decodes the octal escapes the kernel uses for whitespace and backslashes in paths.
fn unescape(field: &str) -> String {
    let bytes = field.as_bytes();
    let mut out = Vec::with_capacity(bytes.len());
    let mut i = 0;
    while i < bytes.len() {
        if bytes[i] == b'\\' && i + 3 < bytes.len() {
            let digits = &bytes[i + 1..i + 4];
            if digits.iter().all(|b| (b'0'..=b'7').contains(b)) {
                let value = digits
                    .iter()
                    .fold(0u32, |acc, b| acc * 8 + u32::from(b - b'0'));
                if let Ok(byte) = u8::try_from(value) {
                    out.push(byte);
                    i += 4;
                    continue;
                }
            }
        }
        out.push(bytes[i]);
        i += 1;
    }
    String::from_utf8_lossy(&out).into_owned()
}

/// Parses one line of a mount table. `lineno` is only used for error messages.
///
/// # Errors
///
/// Returns [`ParseError::MissingField`] if the line is too short for its layout.
pub fn parse_mount_line(line: &str, lineno: usize) -> Result<MountEntry, ParseError> {
    let missing = |field| ParseError::MissingField {
        field,
        lineno,
        line: line.trim_end().to_owned(),
    };

    if let Some((pre, post)) = line.split_once(" - ") {
        let mount_point = pre
            .split_whitespace()
            .nth(4)
            .ok_or_else(|| missing(MountField::MountPoint))?;
        let mut post_fields = post.split_whitespace();
        let fs_type = post_fields.next().ok_or_else(|| missing(MountField::FsType))?;
        let source = post_fields.next().ok_or_else(|| missing(MountField::Source))?;
        return Ok(MountEntry {
            source: unescape(source),
            mount_point: unescape(mount_point),
            fs_type: fs_type.to_owned(),
        });
    }

    let mut fields = line.split_whitespace();
    let source = fields.next().ok_or_else(|| missing(MountField::Source))?;
    let mount_point = fields.next().ok_or_else(|| missing(MountField::MountPoint))?;
    let fs_type = fields.next().ok_or_else(|| missing(MountField::FsType))?;
    Ok(MountEntry {
        source: unescape(source),
        mount_point: unescape(mount_point),
        fs_type: fs_type.to_owned(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_proc_mounts_line() {
        let line = "cgroup2 /sys/fs/cgroup cgroup2 rw,nosuid,nodev,noexec,relatime 0 0";
        let entry = parse_mount_line(line, 1).unwrap();
        assert_eq!(entry.source, "cgroup2");
        assert_eq!(entry.mount_point, "/sys/fs/cgroup");
        assert_eq!(entry.fs_type, "cgroup2");
    }

    #[test]
    fn parses_mountinfo_line_with_optional_fields() {
        let line = "70 56 0:45 / /var rw,nosuid,nodev,noexec,relatime shared:20 - ext4 /dev/sdb1 rw,errors=remount-ro";
        let entry = parse_mount_line(line, 1).unwrap();
        assert_eq!(entry.mount_point, "/var");
        assert_eq!(entry.fs_type, "ext4");
        assert_eq!(entry.source, "/dev/sdb1");
    }

    #[test]
    fn parses_mountinfo_line_without_optional_fields() {
        let entry = parse_mount_line("36 25 0:32 / /sys rw - sysfs sysfs rw", 1).unwrap();
        assert_eq!(entry.fs_type, "sysfs");
        assert_eq!(entry.mount_point, "/sys");
    }

    #[test]
    fn decodes_escaped_mount_point() {
        let line = "/dev/sdc1 /media/my\\040disk vfat rw 0 0";
        let entry = parse_mount_line(line, 1).unwrap();
        assert_eq!(entry.mount_point, "/media/my disk");

        assert_eq!(unescape("a\\134b"), "a\\b");
        assert_eq!(unescape("trailing\\04"), "trailing\\04");
        assert_eq!(unescape("\\999"), "\\999");
    }

    #[test]
    fn error_on_missing_fields() {
        let err = parse_mount_line("42 35 0:22 / - ext4 /dev/sda1 rw", 3).unwrap_err();
        let ParseError::MissingField { field, lineno, .. } = err;
        assert_eq!(field, MountField::MountPoint);
        assert_eq!(lineno, 3);

        let err = parse_mount_line("42 35 0:22 / /mnt rw - ext4", 1).unwrap_err();
        let ParseError::MissingField { field, .. } = err;
        assert_eq!(field.to_string(), "source");

        let err = parse_mount_line("proc /proc", 1).unwrap_err();
        let ParseError::MissingField { field, .. } = err;
        assert_eq!(field, MountField::FsType);
    }
}
