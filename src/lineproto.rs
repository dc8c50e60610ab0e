//! Line protocol encoding of an [`AggregateReport`].
//!
//! Every container becomes one line:
//!
//! ```text
//! lxcstats,lxc_host=<name> <key1>=<value1>,<key2>=<value2>,...
//! ```
//!
//! Lines are separated by `\n` without a trailing newline. Unsigned metrics are written as
//! bare integers and float metrics with six fractional digits.
use std::fmt;

use crate::cgroup::stats::{AggregateReport, MetricSet, MetricValue};

/// The measurement name every line starts with.
pub const MEASUREMENT: &str = "lxcstats";
/// The tag carrying the container name.
pub const HOST_TAG: &str = "lxc_host";

/// Displays an [`AggregateReport`] in line protocol.
///
/// # Examples
///
/// ```
/// # use lxc_stats::cgroup::stats::{AggregateReport, MetricSet};
/// # use lxc_stats::container::ContainerName;
/// # use lxc_stats::lineproto::LineProtocol;
/// let mut metrics = MetricSet::new();
/// metrics.insert("mem_usage", 1048576u64);
/// metrics.insert("mem_usage_perc", 42.5);
/// let mut report = AggregateReport::new();
/// report.insert(ContainerName::new("web1").unwrap(), metrics);
///
/// assert_eq!(
///     LineProtocol(&report).to_string(),
///     "lxcstats,lxc_host=web1 mem_usage=1048576,mem_usage_perc=42.500000"
/// );
/// ```
#[derive(Debug, Clone, Copy)]
pub struct LineProtocol<'a>(pub &'a AggregateReport);

impl fmt::Display for LineProtocol<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, (container, metrics)) in self.0.iter().enumerate() {
            if i > 0 {
                f.write_str("\n")?;
            }
            write!(f, "{MEASUREMENT},{HOST_TAG}=")?;
            write_tag_value(f, container.as_ref())?;
            f.write_str(" ")?;
            write_fields(f, metrics)?;
        }
        Ok(())
    }
}

/// Encodes `report` in line protocol.
pub fn encode(report: &AggregateReport) -> String {
    LineProtocol(report).to_string()
}

fn write_fields(f: &mut fmt::Formatter<'_>, metrics: &MetricSet) -> fmt::Result {
    for (i, (name, value)) in metrics.iter().enumerate() {
        if i > 0 {
            f.write_str(",")?;
        }
        match value {
            MetricValue::Unsigned(v) => write!(f, "{name}={v}")?,
            MetricValue::Float(v) => write!(f, "{name}={v:.6}")?,
        }
    }
    Ok(())
}

// tag values escape `,`, `=` and space
fn write_tag_value(f: &mut fmt::Formatter<'_>, value: &str) -> fmt::Result {
    for c in value.chars() {
        if matches!(c, ',' | '=' | ' ') {
            f.write_str("\\")?;
        }
        write!(f, "{c}")?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use crate::container::ContainerName;

    use super::*;

    fn report(entries: Vec<(&str, MetricSet)>) -> AggregateReport {
        let mut report = AggregateReport::new();
        for (name, metrics) in entries {
            report.insert(ContainerName::new(name).unwrap(), metrics);
        }
        report
    }

    #[test]
    fn test_encode_single_container() {
        let mut metrics = MetricSet::new();
        metrics.insert("mem_usage", 1048576u64);
        metrics.insert("mem_usage_perc", 42.5);

        let out = encode(&report(vec![("web1", metrics)]));

        assert!(out.starts_with("lxcstats,lxc_host=web1 "));
        assert!(out.contains("mem_usage=1048576"));
        assert!(out.contains("mem_usage_perc=42.500000"));
        assert!(!out.ends_with('\n'));
    }

    #[test]
    fn test_empty_metric_set_keeps_trailing_space() {
        let out = encode(&report(vec![("idle", MetricSet::new())]));
        assert_eq!(out, "lxcstats,lxc_host=idle ");
    }

    #[test]
    fn test_empty_report_encodes_to_empty_string() {
        assert_eq!(encode(&AggregateReport::new()), "");
    }

    #[test]
    fn test_lines_and_fields_are_sorted() {
        let mut web = MetricSet::new();
        web.insert("mem_usage", 2u64);
        web.insert("cpu_time", 1u64);
        web.insert("bytes_sent", 3u64);
        let mut db = MetricSet::new();
        db.insert("cpu_time_percpu", 0.25);

        let out = encode(&report(vec![("web", web), ("db", db)]));

        assert_eq!(
            out,
            "lxcstats,lxc_host=db cpu_time_percpu=0.250000\n\
             lxcstats,lxc_host=web bytes_sent=3,cpu_time=1,mem_usage=2"
        );
    }

    #[test]
    fn test_tag_value_is_escaped() {
        let out = encode(&report(vec![("a,b=c", MetricSet::new())]));
        assert_eq!(out, "lxcstats,lxc_host=a\\,b\\=c ");
    }
}
