//! Directory listing and wildcard path expansion.
//!
//! Listings go through a [`DirectoryHandle`], so walking a cgroup tree only ever resolves one
//! name at a time relative to an already pinned parent.

use std::ffi::OsStr;
use std::os::fd::AsFd;
use std::path::{Component, Path, PathBuf};

use glob::{MatchOptions, Pattern};
use nix::dir::{Dir, Type};
use nix::errno::Errno;
use nix::fcntl::{AtFlags, OFlag, openat};
use nix::sys::stat::{Mode, SFlag, fstatat};

use crate::fsutil::DirectoryHandle;
use crate::{Error, Result};

/// Which kinds of entries a listing keeps.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EntryFilter {
    Dirs,
    Files,
    All,
}

impl EntryFilter {
    fn wants_dirs(self) -> bool {
        matches!(self, EntryFilter::Dirs | EntryFilter::All)
    }

    fn wants_files(self) -> bool {
        matches!(self, EntryFilter::Files | EntryFilter::All)
    }
}

/// Names found in one directory, split by kind. `.` and `..` are never included.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DirectoryEntries {
    pub dirs: Vec<String>,
    pub files: Vec<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum EntryKind {
    Dir,
    File,
    Other,
}

/// Lists the directory at `path`.
///
/// Returns `Ok(None)` if the path does not exist or is not a directory.
pub fn read_dir(path: impl AsRef<Path>, filter: EntryFilter) -> Result<Option<DirectoryEntries>> {
    match DirectoryHandle::open(path)? {
        Some(dir) => read_dir_at(&dir, filter).map(Some),
        None => Ok(None),
    }
}

/// Lists the directory behind `dir`.
///
/// A directory removed while it is being listed yields the entries seen so far.
pub fn read_dir_at(dir: &DirectoryHandle, filter: EntryFilter) -> Result<DirectoryEntries> {
    let read_err = |errno: Errno| Error::Read {
        path: dir.path().to_path_buf(),
        source: errno.into(),
    };

    let mut entries = DirectoryEntries::default();
    // A fresh descriptor gives the listing its own offset, independent of `dir`.
    let fd = match openat(
        dir.as_fd(),
        ".",
        OFlag::O_RDONLY | OFlag::O_DIRECTORY | OFlag::O_CLOEXEC,
        Mode::empty(),
    ) {
        Ok(fd) => fd,
        Err(Errno::ENOENT | Errno::ENODEV) => return Ok(entries),
        Err(errno) => return Err(read_err(errno)),
    };
    let mut stream = Dir::from_fd(fd).map_err(read_err)?;

    for entry in stream.iter() {
        let entry = match entry {
            Ok(entry) => entry,
            Err(Errno::ENOENT | Errno::ENODEV) => break,
            Err(errno) => return Err(read_err(errno)),
        };
        let Ok(name) = entry.file_name().to_str() else {
            log::warn!(
                "skipping non UTF-8 entry {:?} in `{}`",
                entry.file_name(),
                dir.path().display()
            );
            continue;
        };
        if name == "." || name == ".." {
            continue;
        }

        let kind = match entry.file_type() {
            Some(Type::Directory) => EntryKind::Dir,
            Some(Type::File) => EntryKind::File,
            Some(_) => EntryKind::Other,
            None => kind_at(dir, name),
        };
        match kind {
            EntryKind::Dir if filter.wants_dirs() => entries.dirs.push(name.to_owned()),
            EntryKind::File if filter.wants_files() => entries.files.push(name.to_owned()),
            _ => {}
        }
    }

    Ok(entries)
}

/// Fallback for filesystems that do not report `d_type`. cgroupfs, procfs and sysfs always do.
///
/// Stats `name` relative to `dir` without following symlinks.
fn kind_at(dir: &DirectoryHandle, name: &str) -> EntryKind {
    let Ok(stat) = fstatat(dir.as_fd(), name, AtFlags::AT_SYMLINK_NOFOLLOW) else {
        return EntryKind::Other;
    };
    match SFlag::from_bits_truncate(stat.st_mode) & SFlag::S_IFMT {
        SFlag::S_IFDIR => EntryKind::Dir,
        SFlag::S_IFREG => EntryKind::File,
        _ => EntryKind::Other,
    }
}

/// Returns true if `path` exists and is a directory.
pub fn is_dir(path: impl AsRef<Path>) -> bool {
    std::fs::metadata(path).is_ok_and(|meta| meta.is_dir())
}

const MATCH_OPTIONS: MatchOptions = MatchOptions {
    case_sensitive: true,
    require_literal_separator: true,
    require_literal_leading_dot: true,
};

/// Compiles a path component into a pattern, or `None` if it is a literal name.
fn wildcard(component: &OsStr) -> Option<Pattern> {
    let component = component.to_str()?;
    if !component.contains(['*', '?', '[']) {
        return None;
    }
    // An unbalanced `[` is matched literally, like glob(3) does.
    Pattern::new(component).ok()
}

/// Expands a path containing shell wildcards (`*`, `?`, `[...]`) in any component.
///
/// Every component but the last must resolve to a directory; with `dir_only` the last one
/// must too. Returns the matching paths in sorted order, or an empty list if nothing matches,
/// including when an intermediate directory is missing.
pub fn glob(pattern: impl AsRef<Path>, dir_only: bool) -> Vec<PathBuf> {
    let pattern = pattern.as_ref();
    let mut base = PathBuf::new();
    let mut rest = Vec::new();
    for component in pattern.components() {
        match component {
            Component::RootDir | Component::Prefix(_) if rest.is_empty() => {
                base.push(component.as_os_str())
            }
            Component::CurDir if rest.is_empty() && base.as_os_str().is_empty() => base.push("."),
            Component::CurDir => {}
            other => rest.push(other.as_os_str()),
        }
    }

    let mut out = Vec::new();
    expand(base, &rest, dir_only, &mut out);
    log::trace!("glob `{}` matched {} paths", pattern.display(), out.len());
    out
}

fn expand(base: PathBuf, rest: &[&OsStr], dir_only: bool, out: &mut Vec<PathBuf>) {
    let Some((head, tail)) = rest.split_first() else {
        out.push(base);
        return;
    };
    let want_dir = dir_only || !tail.is_empty();

    let Some(pattern) = wildcard(head) else {
        let next = base.join(head);
        let exists = match std::fs::metadata(&next) {
            Ok(meta) => !want_dir || meta.is_dir(),
            Err(_) => false,
        };
        if exists {
            expand(next, tail, dir_only, out);
        }
        return;
    };

    let listing_dir = if base.as_os_str().is_empty() {
        Path::new(".")
    } else {
        base.as_path()
    };
    let filter = if want_dir {
        EntryFilter::Dirs
    } else {
        EntryFilter::All
    };
    let entries = match read_dir(listing_dir, filter) {
        Ok(Some(entries)) => entries,
        Ok(None) => return,
        Err(err) => {
            log::debug!("glob: skipping `{}`: {err}", listing_dir.display());
            return;
        }
    };

    let mut names: Vec<String> = entries
        .dirs
        .into_iter()
        .chain(entries.files)
        .filter(|name| pattern.matches_with(name, MATCH_OPTIONS))
        .collect();
    names.sort();
    for name in names {
        expand(base.join(name), tail, dir_only, out);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testutil::write_tree;

    fn fs_data() -> tempfile::TempDir {
        let tmp = tempfile::tempdir().unwrap();
        write_tree(
            tmp.path(),
            &[
                ("dir1/stuff", "hello world\nmy good man\n\n1\n"),
                ("dir2/dir21/", ""),
                ("dir2/dir22/", ""),
                ("dir3/", ""),
                ("wildcard/dir1/", ""),
                ("wildcard/dir2/", ""),
                ("wildcard/different_dir/", ""),
                ("wildcard/file", ""),
                ("wildcard/.hidden", ""),
                ("file1", ""),
                ("file2", ""),
                ("file3", ""),
                ("file4", ""),
            ],
        );
        tmp
    }

    fn sorted(mut v: Vec<String>) -> Vec<String> {
        v.sort();
        v
    }

    #[test]
    fn test_find_directories() {
        let tmp = fs_data();
        let de = read_dir(tmp.path(), EntryFilter::Dirs).unwrap().unwrap();
        assert_eq!(sorted(de.dirs), vec!["dir1", "dir2", "dir3", "wildcard"]);
        assert!(de.files.is_empty());
    }

    #[test]
    fn test_find_files() {
        let tmp = fs_data();
        let de = read_dir(tmp.path(), EntryFilter::Files).unwrap().unwrap();
        assert_eq!(sorted(de.files), vec!["file1", "file2", "file3", "file4"]);
        assert!(de.dirs.is_empty());
    }

    #[test]
    fn test_find_all_keeps_kinds_disjoint() {
        let tmp = fs_data();
        let de = read_dir(tmp.path(), EntryFilter::All).unwrap().unwrap();
        assert_eq!(de.dirs.len(), 4);
        assert_eq!(de.files.len(), 4);
        for name in &de.files {
            assert!(!de.dirs.contains(name));
            assert!(!is_dir(tmp.path().join(name)));
        }
        for name in &de.dirs {
            assert!(is_dir(tmp.path().join(name)));
        }
    }

    #[test]
    fn test_read_dir_missing() {
        let tmp = fs_data();
        assert!(read_dir(tmp.path().join("nope"), EntryFilter::All).unwrap().is_none());
        assert!(read_dir(tmp.path().join("file1"), EntryFilter::All).unwrap().is_none());
    }

    #[test]
    fn test_read_dir_at_removed_directory() {
        let tmp = fs_data();
        let dir = DirectoryHandle::open(tmp.path().join("dir3")).unwrap().unwrap();
        std::fs::remove_dir(tmp.path().join("dir3")).unwrap();
        let de = read_dir_at(&dir, EntryFilter::All).unwrap();
        assert_eq!(de, DirectoryEntries::default());
    }

    #[test]
    fn test_kind_at_resolves_through_handle() {
        let tmp = fs_data();
        let dir = DirectoryHandle::open(tmp.path().join("dir2")).unwrap().unwrap();
        std::fs::rename(tmp.path().join("dir2"), tmp.path().join("moved")).unwrap();
        write_tree(tmp.path(), &[("dir2/dir21", "not a directory")]);

        assert_eq!(kind_at(&dir, "dir21"), EntryKind::Dir);
        assert_eq!(kind_at(&dir, "missing"), EntryKind::Other);

        let files = DirectoryHandle::open(tmp.path().join("dir1")).unwrap().unwrap();
        assert_eq!(kind_at(&files, "stuff"), EntryKind::File);

        std::os::unix::fs::symlink(tmp.path().join("dir1"), tmp.path().join("dir1/link")).unwrap();
        assert_eq!(kind_at(&files, "link"), EntryKind::Other);
    }

    #[test]
    fn test_is_dir() {
        let tmp = fs_data();
        assert!(is_dir(tmp.path().join("dir1")));
        assert!(!is_dir(tmp.path().join("dir1/stuff")));
        assert!(!is_dir(tmp.path().join("NOTINFS")));
    }

    #[test]
    fn test_glob() {
        let tmp = fs_data();
        let dir = tmp.path().join("wildcard");

        let resolved = glob(dir.join("dir*"), false);
        assert_eq!(resolved, vec![dir.join("dir1"), dir.join("dir2")]);

        let resolved = glob(dir.join("*"), true);
        assert_eq!(
            resolved,
            vec![dir.join("different_dir"), dir.join("dir1"), dir.join("dir2")]
        );

        let resolved = glob(dir.join("*"), false);
        assert_eq!(resolved.len(), 4);
        assert!(resolved.contains(&dir.join("file")));
        assert!(!resolved.contains(&dir.join(".hidden")));
    }

    #[test]
    fn test_glob_multiple_wildcards() {
        let tmp = fs_data();
        let resolved = glob(tmp.path().join("dir?/dir2*"), false);
        assert_eq!(
            resolved,
            vec![tmp.path().join("dir2/dir21"), tmp.path().join("dir2/dir22")]
        );

        let resolved = glob(tmp.path().join("*/stuff"), false);
        assert_eq!(resolved, vec![tmp.path().join("dir1/stuff")]);

        let resolved = glob(tmp.path().join("[w]ildcard/dir[12]"), false);
        assert_eq!(resolved.len(), 2);
    }

    #[test]
    fn test_glob_literal_and_missing() {
        let tmp = fs_data();
        assert_eq!(glob(tmp.path().join("dir1"), false), vec![tmp.path().join("dir1")]);
        assert!(glob(tmp.path().join("dir1/stuff"), true).is_empty());
        assert!(glob(tmp.path().join("wildcard/not/a/valid/dir"), false).is_empty());
        assert!(glob(tmp.path().join("missing/*/x"), false).is_empty());
        assert!(glob(tmp.path().join("file1/*"), false).is_empty());
    }
}
