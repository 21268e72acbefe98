use std::path::{Path, PathBuf};

use crate::cgroup::stats::StatParseError;

/// Errors surfaced by the control-file layer.
///
/// A control file that does not exist is not an error; readers report it as `Ok(None)`.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// The file exists but its content does not match the kernel format.
    #[error("{path}: {reason}")]
    BadControlFile { path: PathBuf, reason: String },

    /// Opening a control file for writing, or the write itself, failed.
    #[error("failed to write control file `{path}`: {source}")]
    WriteRejected {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to read `{path}`: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to detect cgroup v2 mount point in file `{path}`")]
    MissingCgroup2Mount { path: PathBuf },

    #[error("failed to parse mount table `{path}`: {source}")]
    ParseMounts {
        path: PathBuf,
        #[source]
        source: crate::mountinfo::ParseError,
    },
}

impl Error {
    pub(crate) fn bad_control_file(path: impl Into<PathBuf>, reason: impl Into<String>) -> Self {
        Error::BadControlFile {
            path: path.into(),
            reason: reason.into(),
        }
    }

    /// Attaches the path of the file that failed to parse.
    pub(crate) fn from_parse(path: &Path, err: StatParseError) -> Self {
        match err {
            StatParseError::Io(source) => Error::Read {
                path: path.to_path_buf(),
                source,
            },
            other => Error::bad_control_file(path, other.to_string()),
        }
    }

    /// Returns true for malformed control files.
    pub fn is_bad_control_file(&self) -> bool {
        matches!(self, Error::BadControlFile { .. })
    }

    /// Returns the path the error refers to.
    pub fn path(&self) -> &Path {
        match self {
            Error::BadControlFile { path, .. }
            | Error::WriteRejected { path, .. }
            | Error::Read { path, .. }
            | Error::MissingCgroup2Mount { path }
            | Error::ParseMounts { path, .. } => path,
        }
    }
}

pub type Result<T> = std::result::Result<T, Error>;

/// Turns a failed result into `None` after logging it.
///
/// Used by scan loops that must keep going when one cgroup has a bad control file.
pub trait ResultOkLogExt<T, E> {
    fn ok_log(self) -> Option<T>;
}

impl<T, E> ResultOkLogExt<T, E> for std::result::Result<T, E>
where
    E: std::error::Error,
{
    fn ok_log(self) -> Option<T> {
        match self {
            Ok(ok) => Some(ok),
            Err(err) => {
                log::error!("{err}");
                None
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_bad_control_file_display_names_path() {
        let err = Error::bad_control_file("/sys/block/1:2/queue/rotational", "invalid format");
        assert_eq!(err.to_string(), "/sys/block/1:2/queue/rotational: invalid format");
        assert!(err.is_bad_control_file());
        assert_eq!(err.path(), Path::new("/sys/block/1:2/queue/rotational"));
    }

    #[test]
    fn test_from_parse_keeps_io_errors_apart() {
        let io = std::io::Error::new(std::io::ErrorKind::PermissionDenied, "nope");
        let err = Error::from_parse(Path::new("/x"), StatParseError::Io(io));
        assert!(matches!(err, Error::Read { .. }));

        let err = Error::from_parse(
            Path::new("/x"),
            StatParseError::MissingField { field: "populated" },
        );
        assert!(err.is_bad_control_file());
    }

    #[test]
    fn test_ok_log() {
        let ok: std::result::Result<u32, Error> = Ok(3);
        assert_eq!(ok.ok_log(), Some(3));

        let err: std::result::Result<u32, Error> = Err(Error::bad_control_file("/x", "bad"));
        assert_eq!(err.ok_log(), None);
    }
}
