/// Entry point for the cgroup-fs probe.
///
/// Prints a JSON snapshot of one cgroup and of the host's memory counters.
///
/// # Examples
///
/// ```bash
/// RUST_LOG=debug cargo run -- system.slice
/// ```
fn main() -> std::result::Result<(), Box<dyn std::error::Error>> {
    env_logger::init();
    cgroup_fs::run(std::env::args().skip(1))
}
