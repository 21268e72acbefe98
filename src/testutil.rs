//! Synthetic cgroup, procfs and sysfs trees for tests.

use std::path::Path;

use tempfile::TempDir;

/// Materializes `entries` below `root`. A path ending in `/` becomes an empty directory,
/// anything else a file with the given content. Parent directories are created as needed.
pub(crate) fn write_tree(root: &Path, entries: &[(&str, &str)]) {
    for (path, content) in entries {
        if let Some(dir) = path.strip_suffix('/') {
            std::fs::create_dir_all(root.join(dir)).unwrap();
            continue;
        }
        let path = root.join(path);
        std::fs::create_dir_all(path.parent().unwrap()).unwrap();
        std::fs::write(path, content).unwrap();
    }
}

pub(crate) const MEMORY_STAT: &str = "\
anon 1294168064
file 3870687232
kernel_stack 7274496
slab 328818688
sock 3743744
shmem 1765376
file_mapped 122880
file_dirty 2875392
file_writeback 0
inactive_anon 1277378560
active_anon 12140544
inactive_file 2283470848
active_file 1586524160
unevictable 0
slab_reclaimable 276643840
slab_unreclaimable 52174848
pgfault 85453779
pgmajfault 1243
pgrefill 143458
pgscan 6044006
pgsteal 5730003
pgactivate 1092341
pgdeactivate 152812
pglazyfree 0
pglazyfreed 0
workingset_refault 1354186
workingset_activate 343546
workingset_nodereclaim 6400
thp_fault_alloc 0
";

/// A cgroup2 tree rooted at the returned directory:
///
/// - the root carries every memory, io and cgroup control file,
/// - `service1.service` has two pids,
/// - `service2.service` exposes pressure in the labeled legacy format,
/// - `service3.service` is unpopulated and exposes pressure in the bare legacy format,
/// - `slice1.slice` has `memory.oom.group` set, its `service1.service` child does not.
pub(crate) fn cgroup_tree() -> TempDir {
    let tmp = tempfile::tempdir().unwrap();
    write_tree(
        tmp.path(),
        &[
            ("cgroup.procs", "123\n"),
            ("cgroup.events", "populated 1\nfrozen 0\n"),
            ("cgroup.stat", "nr_descendants 34\nnr_dying_descendants 27\n"),
            ("cgroup.controllers", "cpu io memory pids\n"),
            ("memory.current", "987654321\n"),
            ("memory.low", "333333\n"),
            ("memory.min", "666\n"),
            ("memory.high", "1000\n"),
            ("memory.max", "654\n"),
            ("memory.high.tmp", "2000 20000\n"),
            ("memory.peak", "999999999\n"),
            ("memory.swap.current", "321321\n"),
            ("memory.swap.max", "max\n"),
            ("memory.stat", MEMORY_STAT),
            (
                "memory.pressure",
                "some avg10=1.11 avg60=2.22 avg300=3.33 total=111111\n\
                 full avg10=4.44 avg60=5.55 avg300=6.66 total=222222\n",
            ),
            (
                "io.pressure",
                "some avg10=1.12 avg60=2.23 avg300=3.34 total=111112\n\
                 full avg10=4.45 avg60=5.56 avg300=6.67 total=222223\n",
            ),
            (
                "io.stat",
                "1:10 rbytes=1111111 wbytes=2222222 rios=33 wios=44 dbytes=5555555555 dios=6\n\
                 1:11 rbytes=2222222 wbytes=3333333 rios=44 wios=55 dbytes=6666666666 dios=7\n",
            ),
            ("service1.service/cgroup.procs", "456\n789\n"),
            ("service1.service/cgroup.events", "populated 1\nfrozen 0\n"),
            (
                "service2.service/memory.pressure",
                "aggr 316016073\nsome 1.11 2.22 3.33\nfull 4.44 5.55 6.66\n",
            ),
            ("service3.service/cgroup.events", "populated 0\nfrozen 0\n"),
            (
                "service3.service/memory.pressure",
                "nr_stalls 120\ntotal_stall_us 4521\n1.11\n2.22\n3.33\n",
            ),
            ("slice1.slice/memory.oom.group", "1\n"),
            ("slice1.slice/service1.service/memory.oom.group", "0\n"),
        ],
    );
    tmp
}
