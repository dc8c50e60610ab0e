//! This module provides parsing utilities for block I/O statistics as reported in the cgroup v1
//! `blkio.throttle.io_serviced` and `blkio.throttle.io_service_bytes` items.
//!
//! Both items share one format: each line names a block device, an operation and a counter.
//!
//! ```text
//! 8:0 Read 1024
//! 8:0 Write 2048
//! 8:0 Sync 3072
//! 8:0 Async 0
//! 8:0 Total 3072
//! Total 3072
//! ```
//!
//! # Key features
//!
//! - **Aggregation across devices:** `Read` and `Write` counters of every device are summed into
//!   a single [`BlkioStat`].
//! - **Everything else is ignored:** `Sync`, `Async`, `Discard`, per-device `Total` lines and the
//!   trailing grand total do not contribute.
//! - **Strict values:** a `Read` or `Write` line with a missing or non-numeric counter is an error.
//!
//! # Example
//!
//! ```rust
//! use lxc_stats::cgroup::stats::{BlkioStat, KeyValueStat};
//!
//! let lines = ["8:0 Read 5", "8:0 Write 3", "8:16 Read 2", "Total 10"];
//! let stat = BlkioStat::from_lines(lines).unwrap();
//!
//! assert_eq!(stat.read, 7);
//! assert_eq!(stat.write, 3);
//! ```

use std::collections::HashMap;
use std::sync::LazyLock;

use super::parser::KeyValueStat;

/// Aggregated `Read`/`Write` counters of a blkio throttle item, summed across all devices.
///
/// Depending on the item this counts operations (`io_serviced`) or bytes (`io_service_bytes`).
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct BlkioStat {
    /// Total read counter across all devices.
    pub read: u64,
    /// Total write counter across all devices.
    pub write: u64,
}

impl BlkioStat {
    fn add_read(&mut self, read: u64) {
        self.read = self.read.saturating_add(read);
    }

    fn add_write(&mut self, write: u64) {
        self.write = self.write.saturating_add(write);
    }
}

type Accumulator = fn(&mut BlkioStat, u64);

static ACCUMULATORS: LazyLock<HashMap<&'static str, Accumulator>> = LazyLock::new(|| {
    let mut m: HashMap<&'static str, Accumulator> = HashMap::with_capacity(2);

    m.insert("Read", BlkioStat::add_read);
    m.insert("Write", BlkioStat::add_write);

    m
});

impl KeyValueStat for BlkioStat {
    const SKIP_VALUES: usize = 1;
    const ALLOW_DUPLICATE_KEYS: bool = true;

    #[inline]
    fn field_handlers() -> &'static HashMap<&'static str, fn(&mut Self, u64)> {
        &ACCUMULATORS
    }
}
