//! Descriptor handles bound to the path they were opened from.
//!
//! A cgroup directory can be removed and recreated under the same name at any time. Once a
//! [`DirectoryHandle`] is open, every file below it is opened with `openat(2)` against the
//! pinned directory inode, so a later read never lands in a different cgroup that happens to
//! reuse the name. If the inode itself goes away, the read fails with `ENOENT`/`ENODEV`,
//! which is reported as "absent" just like a file that never existed.

use std::fs::File;
use std::io::{self, Read, Write};
use std::os::fd::{AsFd, BorrowedFd, OwnedFd};
use std::path::{Path, PathBuf};

use nix::errno::Errno;
use nix::fcntl::{OFlag, open, openat};
use nix::sys::stat::Mode;

use crate::{Error, Result};

const DIR_FLAGS: OFlag = OFlag::O_RDONLY
    .union(OFlag::O_DIRECTORY)
    .union(OFlag::O_CLOEXEC);

/// Errors meaning "the thing is not there (any more)".
///
/// `ENODEV` is what kernfs returns for files of a cgroup that was removed after it was opened.
fn is_absent_errno(errno: Errno) -> bool {
    matches!(errno, Errno::ENOENT | Errno::ENOTDIR | Errno::ENODEV)
}

pub(crate) fn is_absent_io(err: &io::Error) -> bool {
    err.kind() == io::ErrorKind::NotFound
        || err
            .raw_os_error()
            .is_some_and(|code| is_absent_errno(Errno::from_raw(code)))
}

/// An open directory.
///
/// The descriptor is closed when the handle is dropped.
#[derive(Debug)]
pub struct DirectoryHandle {
    fd: OwnedFd,
    path: PathBuf,
}

impl DirectoryHandle {
    /// Opens the directory at `path`.
    ///
    /// Returns `Ok(None)` if the path does not exist or is not a directory.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Read`] for any other failure, e.g. `EACCES`.
    pub fn open(path: impl AsRef<Path>) -> Result<Option<Self>> {
        let path = path.as_ref();
        match open(path, DIR_FLAGS, Mode::empty()) {
            Ok(fd) => Ok(Some(Self {
                fd,
                path: path.to_path_buf(),
            })),
            Err(errno) if is_absent_errno(errno) => Ok(None),
            Err(errno) => Err(Error::Read {
                path: path.to_path_buf(),
                source: errno.into(),
            }),
        }
    }

    /// Opens the child directory `name` relative to this handle.
    ///
    /// Returns `Ok(None)` if the child does not exist, is not a directory, or this directory
    /// has been removed.
    pub fn open_dir_at(&self, name: &str) -> Result<Option<Self>> {
        let path = self.path.join(name);
        match openat(self.fd.as_fd(), name, DIR_FLAGS, Mode::empty()) {
            Ok(fd) => Ok(Some(Self { fd, path })),
            Err(errno) if is_absent_errno(errno) => Ok(None),
            Err(errno) => Err(Error::Read {
                path,
                source: errno.into(),
            }),
        }
    }

    /// The path this handle was opened from.
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// The path `name` would have when resolved against this directory, for error messages.
    pub fn child_path(&self, name: &str) -> PathBuf {
        self.path.join(name)
    }
}

impl AsFd for DirectoryHandle {
    fn as_fd(&self) -> BorrowedFd<'_> {
        self.fd.as_fd()
    }
}

/// An open regular file, usually a control file inside a [`DirectoryHandle`].
#[derive(Debug)]
pub struct FileHandle {
    file: File,
    path: PathBuf,
}

impl FileHandle {
    /// Opens `name` inside `dir` for reading.
    ///
    /// Returns `Ok(None)` if the file does not exist.
    pub fn open_at(dir: &DirectoryHandle, name: &str) -> Result<Option<Self>> {
        let path = dir.child_path(name);
        match openat(dir.as_fd(), name, OFlag::O_RDONLY | OFlag::O_CLOEXEC, Mode::empty()) {
            Ok(fd) => Ok(Some(Self {
                file: File::from(fd),
                path,
            })),
            Err(errno) if is_absent_errno(errno) => Ok(None),
            Err(errno) => Err(Error::Read {
                path,
                source: errno.into(),
            }),
        }
    }

    /// Opens `name` inside `dir` for writing.
    ///
    /// Control files are never created; a missing file is a rejected write.
    ///
    /// # Errors
    ///
    /// Returns [`Error::WriteRejected`] if the file cannot be opened for writing.
    pub fn open_for_write_at(dir: &DirectoryHandle, name: &str) -> Result<Self> {
        let path = dir.child_path(name);
        let flags = OFlag::O_WRONLY | OFlag::O_TRUNC | OFlag::O_CLOEXEC;
        match openat(dir.as_fd(), name, flags, Mode::empty()) {
            Ok(fd) => Ok(Self {
                file: File::from(fd),
                path,
            }),
            Err(errno) => Err(Error::WriteRejected {
                path,
                source: errno.into(),
            }),
        }
    }

    /// Opens the file at `path` for reading.
    ///
    /// Returns `Ok(None)` if the file does not exist.
    pub fn open(path: impl AsRef<Path>) -> Result<Option<Self>> {
        let path = path.as_ref();
        match File::open(path) {
            Ok(file) => Ok(Some(Self {
                file,
                path: path.to_path_buf(),
            })),
            Err(err) if is_absent_io(&err) => Ok(None),
            Err(source) => Err(Error::Read {
                path: path.to_path_buf(),
                source,
            }),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Reads the whole file.
    ///
    /// Returns `Ok(None)` if the backing cgroup disappeared while reading.
    ///
    /// # Errors
    ///
    /// Returns [`Error::BadControlFile`] for content that is not UTF-8 and [`Error::Read`] for
    /// other I/O failures.
    pub fn read_to_string(mut self) -> Result<Option<String>> {
        let mut content = String::new();
        match self.file.read_to_string(&mut content) {
            Ok(_) => Ok(Some(content)),
            Err(err) if is_absent_io(&err) => Ok(None),
            Err(err) if err.kind() == io::ErrorKind::InvalidData => {
                Err(Error::bad_control_file(self.path, "invalid utf-8"))
            }
            Err(source) => Err(Error::Read {
                path: self.path,
                source,
            }),
        }
    }

    /// Writes `contents` with a single `write(2)`, as the kernel expects for control files.
    ///
    /// # Errors
    ///
    /// Returns [`Error::WriteRejected`] if the kernel refuses the value or accepts only part
    /// of it.
    pub fn write_str(mut self, contents: &str) -> Result<()> {
        match self.file.write(contents.as_bytes()) {
            Ok(n) if n == contents.len() => Ok(()),
            Ok(n) => Err(Error::WriteRejected {
                path: self.path,
                source: io::Error::new(
                    io::ErrorKind::WriteZero,
                    format!("short write: {n} of {} bytes", contents.len()),
                ),
            }),
            Err(source) => Err(Error::WriteRejected {
                path: self.path,
                source,
            }),
        }
    }
}

/// Reads `name` inside `dir` as a string.
pub(crate) fn read_control_file_at(dir: &DirectoryHandle, name: &str) -> Result<Option<String>> {
    match FileHandle::open_at(dir, name)? {
        Some(file) => file.read_to_string(),
        None => Ok(None),
    }
}

pub(crate) fn read_control_file(path: &Path) -> Result<Option<String>> {
    match FileHandle::open(path)? {
        Some(file) => file.read_to_string(),
        None => Ok(None),
    }
}

/// Writes `contents` to the existing file `name` inside `dir`.
pub(crate) fn write_control_file_at(dir: &DirectoryHandle, name: &str, contents: &str) -> Result<()> {
    FileHandle::open_for_write_at(dir, name)?.write_str(contents)
}

fn split_lines(content: String) -> Vec<String> {
    content.lines().map(str::to_owned).collect()
}

/// Reads all lines of the file at `path`, without line terminators.
///
/// Returns `Ok(None)` if the file does not exist.
pub fn read_file_by_line(path: impl AsRef<Path>) -> Result<Option<Vec<String>>> {
    Ok(read_control_file(path.as_ref())?.map(split_lines))
}

/// Reads all lines of `name` inside `dir`, without line terminators.
///
/// Returns `Ok(None)` if the file does not exist.
pub fn read_file_by_line_at(dir: &DirectoryHandle, name: &str) -> Result<Option<Vec<String>>> {
    Ok(read_control_file_at(dir, name)?.map(split_lines))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testutil::write_tree;

    #[test]
    fn test_open_missing_directory() {
        let tmp = tempfile::tempdir().unwrap();
        assert!(DirectoryHandle::open(tmp.path().join("gone")).unwrap().is_none());
    }

    #[test]
    fn test_open_file_as_directory_is_absent() {
        let tmp = tempfile::tempdir().unwrap();
        write_tree(tmp.path(), &[("file", "x")]);
        assert!(DirectoryHandle::open(tmp.path().join("file")).unwrap().is_none());
    }

    #[test]
    fn test_read_file_by_line() {
        let tmp = tempfile::tempdir().unwrap();
        write_tree(tmp.path(), &[("dir1/stuff", "hello world\nmy good man\n\n1\n")]);

        let lines = read_file_by_line(tmp.path().join("dir1/stuff"))
            .unwrap()
            .unwrap();
        assert_eq!(lines, vec!["hello world", "my good man", "", "1"]);

        let dir = DirectoryHandle::open(tmp.path().join("dir1")).unwrap().unwrap();
        assert_eq!(read_file_by_line_at(&dir, "stuff").unwrap().unwrap(), lines);
    }

    #[test]
    fn test_read_missing_file_is_absent() {
        let tmp = tempfile::tempdir().unwrap();
        assert!(read_file_by_line(tmp.path().join("ksldjfksdlfdsjf")).unwrap().is_none());

        let dir = DirectoryHandle::open(tmp.path()).unwrap().unwrap();
        assert!(read_file_by_line_at(&dir, "ksldjfksdlfdsjf").unwrap().is_none());
    }

    #[test]
    fn test_handle_survives_rename() {
        let tmp = tempfile::tempdir().unwrap();
        write_tree(tmp.path(), &[("cg/memory.current", "42\n")]);

        let dir = DirectoryHandle::open(tmp.path().join("cg")).unwrap().unwrap();
        std::fs::rename(tmp.path().join("cg"), tmp.path().join("moved")).unwrap();
        write_tree(tmp.path(), &[("cg/memory.current", "7\n")]);

        let lines = read_file_by_line_at(&dir, "memory.current").unwrap().unwrap();
        assert_eq!(lines, vec!["42"]);
        assert_eq!(dir.path(), tmp.path().join("cg"));
    }

    #[test]
    fn test_handle_of_removed_directory_reads_absent() {
        let tmp = tempfile::tempdir().unwrap();
        write_tree(tmp.path(), &[("cg/memory.current", "42\n")]);

        let dir = DirectoryHandle::open(tmp.path().join("cg")).unwrap().unwrap();
        std::fs::remove_dir_all(tmp.path().join("cg")).unwrap();

        assert!(read_file_by_line_at(&dir, "memory.current").unwrap().is_none());
        assert!(dir.open_dir_at("child").unwrap().is_none());
    }

    #[test]
    fn test_open_dir_at() {
        let tmp = tempfile::tempdir().unwrap();
        write_tree(tmp.path(), &[("a/b/file", "1")]);

        let a = DirectoryHandle::open(tmp.path().join("a")).unwrap().unwrap();
        let b = a.open_dir_at("b").unwrap().unwrap();
        assert_eq!(b.path(), tmp.path().join("a/b"));
        assert!(a.open_dir_at("missing").unwrap().is_none());
        assert!(b.open_dir_at("file").unwrap().is_none());
    }

    #[test]
    fn test_write_to_missing_file_is_rejected() {
        let tmp = tempfile::tempdir().unwrap();
        let dir = DirectoryHandle::open(tmp.path()).unwrap().unwrap();
        let err = write_control_file_at(&dir, "memory.high", "1").unwrap_err();
        match err {
            Error::WriteRejected { path, source } => {
                assert_eq!(path, tmp.path().join("memory.high"));
                assert_eq!(source.kind(), io::ErrorKind::NotFound);
            }
            other => panic!("expected WriteRejected, got {other:?}"),
        }
    }

    #[test]
    fn test_write_truncates() {
        let tmp = tempfile::tempdir().unwrap();
        write_tree(tmp.path(), &[("memory.high", "123456789\n")]);
        let dir = DirectoryHandle::open(tmp.path()).unwrap().unwrap();

        write_control_file_at(&dir, "memory.high", "5").unwrap();
        assert_eq!(read_control_file_at(&dir, "memory.high").unwrap().unwrap(), "5");
    }
}
