//! Per-container resource collection from the cgroup v1 hierarchy.
//!
//! The [`Collector`] turns the cgroup items of one container into a
//! [`MetricSet`](stats::MetricSet), and the [`Monitor`] runs one collector task per
//! container and merges the results into an [`AggregateReport`](stats::AggregateReport).
//!
//! # Supported Stats
//!
//! The following items are read, if available:
//!
//! - `memory.usage_in_bytes`, `memory.limit_in_bytes` and their `memory.memsw.*` counterparts
//! - `cpuacct.usage` and `cpuset.cpus`
//! - `blkio.throttle.io_serviced` and `blkio.throttle.io_service_bytes`
//! - `/sys/class/net/<iface>/statistics/{rx,tx}_bytes` for every configured host interface
//! - `MemTotal` of `/proc/meminfo` to clamp unlimited memory limits
mod collector;
mod error;
mod monitor;
pub mod stats;

pub use collector::Collector;
pub use error::{CollectError, Skip};
pub use monitor::{CollectionMessage, Monitor};
