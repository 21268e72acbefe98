//! Locating the cgroup v2 hierarchy from a mount table.
//!
//! Both the `/proc/mounts` layout and the `/proc/[pid]/mountinfo` layout are understood;
//! each line is classified on its own, see [`parse_mount_line`].

mod detect;
mod parser;

pub use detect::get_cgroup2_mount_point;
pub use parser::{MountEntry, MountField, ParseError, parse_mount_line};
