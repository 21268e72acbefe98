//! Core cgroup interface files: `cgroup.events`, `cgroup.stat`, `cgroup.procs` and
//! `cgroup.controllers`.

use std::collections::HashMap;
use std::io::BufRead;
use std::sync::LazyLock;

use super::StatParseError;
use super::parser::{KeyValueStat, parse_u64};

/// `cgroup.events`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct CgroupEvents {
    populated: Option<bool>,
    frozen: Option<bool>,
}

impl CgroupEvents {
    fn set_populated(&mut self, v: u64) {
        self.populated = Some(v != 0);
    }

    fn set_frozen(&mut self, v: u64) {
        self.frozen = Some(v != 0);
    }

    /// Whether the cgroup or any descendant has live processes.
    pub fn populated(&self) -> bool {
        self.populated.unwrap_or_default()
    }

    /// `None` on kernels without the freezer.
    pub fn frozen(&self) -> Option<bool> {
        self.frozen
    }
}

static EVENT_SETTERS: LazyLock<HashMap<&'static str, fn(&mut CgroupEvents, u64)>> =
    LazyLock::new(|| {
        let mut m: HashMap<&'static str, fn(&mut CgroupEvents, u64)> = HashMap::with_capacity(2);
        m.insert("populated", CgroupEvents::set_populated);
        m.insert("frozen", CgroupEvents::set_frozen);
        m
    });

impl KeyValueStat for CgroupEvents {
    const SPLIT_CHAR: Option<char> = None;
    const SKIP_VALUES: usize = 0;
    const ALLOW_DUPLICATE_KEYS: bool = false;
    const ALLOW_MULTIPLE_KV_PER_LINE: bool = false;

    fn field_handlers() -> &'static HashMap<&'static str, fn(&mut Self, u64)> {
        &EVENT_SETTERS
    }

    fn validate(&self) -> Result<(), StatParseError> {
        match self.populated {
            Some(_) => Ok(()),
            None => Err(StatParseError::MissingField { field: "populated" }),
        }
    }
}

/// `cgroup.stat`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct CgroupStat {
    pub nr_descendants: u64,
    nr_dying_descendants: Option<u64>,
}

impl CgroupStat {
    fn set_nr_descendants(&mut self, v: u64) {
        self.nr_descendants = v;
    }

    fn set_nr_dying_descendants(&mut self, v: u64) {
        self.nr_dying_descendants = Some(v);
    }

    /// Removed descendants the kernel has not freed yet.
    pub fn nr_dying_descendants(&self) -> u64 {
        self.nr_dying_descendants.unwrap_or_default()
    }
}

static STAT_SETTERS: LazyLock<HashMap<&'static str, fn(&mut CgroupStat, u64)>> =
    LazyLock::new(|| {
        let mut m: HashMap<&'static str, fn(&mut CgroupStat, u64)> = HashMap::with_capacity(2);
        m.insert("nr_descendants", CgroupStat::set_nr_descendants);
        m.insert("nr_dying_descendants", CgroupStat::set_nr_dying_descendants);
        m
    });

impl KeyValueStat for CgroupStat {
    const SPLIT_CHAR: Option<char> = None;
    const SKIP_VALUES: usize = 0;
    const ALLOW_DUPLICATE_KEYS: bool = false;
    const ALLOW_MULTIPLE_KV_PER_LINE: bool = false;

    fn field_handlers() -> &'static HashMap<&'static str, fn(&mut Self, u64)> {
        &STAT_SETTERS
    }

    fn validate(&self) -> Result<(), StatParseError> {
        match self.nr_dying_descendants {
            Some(_) => Ok(()),
            None => Err(StatParseError::MissingField {
                field: "nr_dying_descendants",
            }),
        }
    }
}

/// Parses `cgroup.procs`: one pid per line. An empty file is an empty list.
pub fn parse_pids<R: BufRead>(buf: &mut R) -> Result<Vec<u32>, StatParseError> {
    let mut pids = Vec::new();
    let mut line = String::new();
    let mut lineno = 0;

    while buf.read_line(&mut line)? != 0 {
        lineno += 1;
        let trimmed = line.trim();
        if !trimmed.is_empty() {
            let pid = parse_u64(trimmed, lineno)?;
            let pid = u32::try_from(pid)
                .map_err(|_| StatParseError::invalid_format(lineno, trimmed))?;
            pids.push(pid);
        }
        line.clear();
    }

    Ok(pids)
}

/// Parses `cgroup.controllers`: whitespace-separated controller names.
pub fn parse_controllers<R: BufRead>(buf: &mut R) -> Result<Vec<String>, StatParseError> {
    let mut content = String::new();
    buf.read_to_string(&mut content)?;
    Ok(content.split_whitespace().map(str::to_owned).collect())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_events() {
        let events = CgroupEvents::from_reader(&mut "populated 1\nfrozen 0\n".as_bytes()).unwrap();
        assert!(events.populated());
        assert_eq!(events.frozen(), Some(false));

        let events = CgroupEvents::from_reader(&mut "populated 0\n".as_bytes()).unwrap();
        assert!(!events.populated());
        assert_eq!(events.frozen(), None);
    }

    #[test]
    fn test_events_missing_populated() {
        let err = CgroupEvents::from_reader(&mut "frozen 0\n".as_bytes()).unwrap_err();
        assert!(matches!(err, StatParseError::MissingField { field: "populated" }));
    }

    #[test]
    fn test_events_invalid_value() {
        let err = CgroupEvents::from_reader(&mut "populated yes\n".as_bytes()).unwrap_err();
        assert!(matches!(err, StatParseError::InvalidKeyValue { line: 1, .. }));
    }

    #[test]
    fn test_parse_cgroup_stat() {
        let data = "nr_descendants 34\nnr_dying_descendants 27\n";
        let stat = CgroupStat::from_reader(&mut data.as_bytes()).unwrap();
        assert_eq!(stat.nr_descendants, 34);
        assert_eq!(stat.nr_dying_descendants(), 27);
    }

    #[test]
    fn test_cgroup_stat_missing_dying() {
        let err = CgroupStat::from_reader(&mut "nr_descendants 1\n".as_bytes()).unwrap_err();
        assert!(matches!(
            err,
            StatParseError::MissingField {
                field: "nr_dying_descendants"
            }
        ));
    }

    #[test]
    fn test_cgroup_stat_duplicate() {
        let data = "nr_dying_descendants 1\nnr_dying_descendants 2\n";
        let err = CgroupStat::from_reader(&mut data.as_bytes()).unwrap_err();
        assert!(matches!(err, StatParseError::DuplicateField { line: 2, .. }));
    }

    #[test]
    fn test_parse_pids() {
        assert_eq!(parse_pids(&mut "456\n789\n".as_bytes()).unwrap(), vec![456, 789]);
        assert!(parse_pids(&mut "".as_bytes()).unwrap().is_empty());

        let err = parse_pids(&mut "1\nabc\n".as_bytes()).unwrap_err();
        assert!(matches!(err, StatParseError::InvalidValue { line: 2, .. }));
    }

    #[test]
    fn test_parse_controllers() {
        let controllers = parse_controllers(&mut "cpu io memory pids\n".as_bytes()).unwrap();
        assert_eq!(controllers, vec!["cpu", "io", "memory", "pids"]);
        assert!(parse_controllers(&mut "\n".as_bytes()).unwrap().is_empty());
    }
}
