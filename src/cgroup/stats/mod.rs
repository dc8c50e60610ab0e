//! This module provides core types and utilities for collecting and representing container resource usage statistics.
//!
//! It bundles the parsers for the individual cgroup v1 and host items (block I/O, host memory,
//! network interface counters) and exposes the typed metric containers the collector fills.
//!
//! # Main types
//!
//! - [`MetricValue`]: a metric value, tagged at collection time as an unsigned integer or a float.
//! - [`MetricSet`]: the metrics collected for one container, keyed by metric name.
//! - [`AggregateReport`]: the metric sets of every container of one collection run.
//!
//! # Usage
//!
//! A [`MetricSet`] is built incrementally by the collector; every successful query inserts its
//! keys and a failed query inserts nothing. The monitor then files each set under its container
//! in an [`AggregateReport`], which the line protocol encoder serializes.

mod blkio;
mod error;
mod memory;
mod net;
mod parser;

pub use blkio::BlkioStat;
pub use error::StatParseError;
pub use memory::{HostMemoryError, MemInfo, host_total_memory};
pub use net::{InterfaceStat, InterfaceStatError};
pub use parser::{KeyValueStat, count_cores, parse_u64};

#[cfg(test)]
pub(crate) use net::tests::write_interface;

use std::collections::BTreeMap;
use std::collections::btree_map;

use crate::container::ContainerName;

/// A single metric value.
///
/// The variant is decided when the metric is collected and determines its wire encoding.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum MetricValue {
    /// Counters and byte values, rendered as bare integers.
    Unsigned(u64),
    /// Derived ratios, rendered in fixed-point notation.
    Float(f64),
}

impl From<u64> for MetricValue {
    fn from(value: u64) -> Self {
        MetricValue::Unsigned(value)
    }
}

impl From<f64> for MetricValue {
    fn from(value: f64) -> Self {
        MetricValue::Float(value)
    }
}

/// The metrics collected for one container, ordered by name.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct MetricSet(BTreeMap<&'static str, MetricValue>);

impl MetricSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Inserts or replaces the metric `name`.
    pub fn insert(&mut self, name: &'static str, value: impl Into<MetricValue>) {
        self.0.insert(name, value.into());
    }

    pub fn get(&self, name: &str) -> Option<MetricValue> {
        self.0.get(name).copied()
    }

    /// Returns the value of `name` if it is present and unsigned.
    pub fn get_unsigned(&self, name: &str) -> Option<u64> {
        match self.get(name)? {
            MetricValue::Unsigned(v) => Some(v),
            MetricValue::Float(_) => None,
        }
    }

    pub fn contains(&self, name: &str) -> bool {
        self.0.contains_key(name)
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&'static str, MetricValue)> + '_ {
        self.0.iter().map(|(name, value)| (*name, *value))
    }
}

/// The result of one collection run: exactly one [`MetricSet`] per container, ordered by name.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct AggregateReport(BTreeMap<ContainerName, MetricSet>);

impl AggregateReport {
    pub fn new() -> Self {
        Self::default()
    }

    /// Files `metrics` under `container`, replacing any earlier set.
    pub fn insert(&mut self, container: ContainerName, metrics: MetricSet) {
        self.0.insert(container, metrics);
    }

    pub fn get(&self, container: &str) -> Option<&MetricSet> {
        self.0.get(container)
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn iter(&self) -> btree_map::Iter<'_, ContainerName, MetricSet> {
        self.0.iter()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_metric_set_incremental_build() {
        let mut set = MetricSet::new();
        assert!(set.is_empty());

        set.insert("mem_usage", 1024u64);
        set.insert("mem_usage_perc", 12.5);
        assert_eq!(set.len(), 2);
        assert_eq!(set.get("mem_usage"), Some(MetricValue::Unsigned(1024)));
        assert_eq!(set.get_unsigned("mem_usage"), Some(1024));
        assert_eq!(set.get_unsigned("mem_usage_perc"), None);
        assert!(!set.contains("cpu_time"));
    }

    #[test]
    fn test_metric_set_iterates_by_name() {
        let mut set = MetricSet::new();
        set.insert("mem_usage", 1u64);
        set.insert("bytes_sent", 2u64);
        set.insert("cpu_time", 3u64);
        let names: Vec<_> = set.iter().map(|(name, _)| name).collect();
        assert_eq!(names, ["bytes_sent", "cpu_time", "mem_usage"]);
    }

    #[test]
    fn test_aggregate_report_one_entry_per_container() {
        let mut report = AggregateReport::new();
        let web = ContainerName::new("web1").unwrap();
        report.insert(web.clone(), MetricSet::new());
        let mut set = MetricSet::new();
        set.insert("cpu_time", 5u64);
        report.insert(web, set);

        assert_eq!(report.len(), 1);
        assert_eq!(report.get("web1").unwrap().get_unsigned("cpu_time"), Some(5));
    }
}
