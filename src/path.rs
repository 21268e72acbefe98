//! String-level path helpers used when resolving configured cgroup paths.

/// Removes `prefix` from the start of `s`, if present.
///
/// A leading `./` on `s` is ignored when `prefix` does not carry one itself, so
/// `"./var/log/messages"` minus `"var/log/"` is `"messages"`.
pub fn remove_prefix(s: &mut String, prefix: &str) {
    if s.starts_with(prefix) {
        s.drain(..prefix.len());
        return;
    }
    if !prefix.starts_with("./") && s.strip_prefix("./").is_some_and(|rest| rest.starts_with(prefix)) {
        s.drain(..2 + prefix.len());
    }
}

/// Lexically normalized components: empty and `.` segments dropped, `..` applied.
fn components(path: &str) -> Vec<&str> {
    let mut out = Vec::new();
    for part in path.split('/') {
        match part {
            "" | "." => {}
            ".." => {
                out.pop();
            }
            part => out.push(part),
        }
    }
    out
}

/// Returns true if `candidate` is `parent` or lies below it.
///
/// Both paths are compared component-wise after normalization, so a trailing `/` does not
/// matter and `/sys/fs/cgroupfoo` is not under `/sys/fs/cgroup`. An empty `parent` or
/// `candidate` never matches; `/` is the parent of every non-empty path.
pub fn is_under_parent_path(parent: &str, candidate: &str) -> bool {
    if parent.is_empty() || candidate.is_empty() {
        return false;
    }
    let parent = components(parent);
    let candidate = components(candidate);
    candidate.len() >= parent.len() && candidate.iter().zip(&parent).all(|(c, p)| c == p)
}
