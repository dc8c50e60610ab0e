use std::collections::HashSet;
use std::fmt;
use std::path::PathBuf;

use crate::container::{ContainerHandle, ContainerName};
use crate::error::ResultOkLogExt;

use super::error::{CollectError, Skip};
use super::stats::{
    BlkioStat, InterfaceStat, InterfaceStatError, KeyValueStat, MetricSet, StatParseError,
    count_cores, host_total_memory, parse_u64,
};

const MEMORY_USAGE: &str = "memory.usage_in_bytes";
const MEMORY_LIMIT: &str = "memory.limit_in_bytes";
const MEMSW_USAGE: &str = "memory.memsw.usage_in_bytes";
const MEMSW_LIMIT: &str = "memory.memsw.limit_in_bytes";
const CPU_USAGE: &str = "cpuacct.usage";
const CPUSET_CPUS: &str = "cpuset.cpus";
const BLKIO_SERVICED: &str = "blkio.throttle.io_serviced";
const BLKIO_SERVICE_BYTES: &str = "blkio.throttle.io_service_bytes";

/// Result of a metric query: the outer error ends the container's collection,
/// the inner one only leaves the metric out.
type Query<T> = Result<Result<T, Skip>, CollectError>;

/// Collects the metric set of a single container.
///
/// Every metric is queried independently; a query that cannot produce a value
/// is skipped without affecting the others. Malformed values and an unknown
/// host memory size abort the whole container.
#[derive(Debug, Clone)]
pub struct Collector {
    sys_class_net: PathBuf,
    meminfo: PathBuf,
}

impl Collector {
    /// Creates a collector reading interface counters below `sys_class_net`
    /// and the host's memory size from `meminfo`.
    pub fn new(sys_class_net: impl Into<PathBuf>, meminfo: impl Into<PathBuf>) -> Self {
        Self {
            sys_class_net: sys_class_net.into(),
            meminfo: meminfo.into(),
        }
    }

    /// Collects all metrics of the container behind `handle`.
    ///
    /// # Errors
    ///
    /// Returns [`CollectError::Parse`] if any item holds malformed numeric text and
    /// [`CollectError::HostMemory`] if a limit needs clamping but the host memory is unknown.
    pub fn collect<H: ContainerHandle>(&self, handle: &H) -> Result<MetricSet, CollectError> {
        let name = handle.name();
        let skipped = |metric| Skipped {
            container: name,
            metric,
        };
        let mut metrics = MetricSet::new();

        let mem_usage =
            single_value(handle, MEMORY_USAGE)?.ok_log(log::Level::Debug, skipped("mem_usage"));
        if let Some(usage) = mem_usage {
            metrics.insert("mem_usage", usage);
        }
        let mem_limit = self
            .clamped_limit(handle, MEMORY_LIMIT)?
            .ok_log(log::Level::Debug, skipped("mem_limit"));
        if let Some(limit) = mem_limit {
            metrics.insert("mem_limit", limit);
        }
        if let (Some(usage), Some(limit)) = (mem_usage, mem_limit)
            && let Some(perc) =
                usage_percent(usage, limit).ok_log(log::Level::Debug, skipped("mem_usage_perc"))
        {
            metrics.insert("mem_usage_perc", perc);
        }

        if let Some(usage) =
            single_value(handle, MEMSW_USAGE)?.ok_log(log::Level::Debug, skipped("memsw_usage"))
        {
            metrics.insert("memsw_usage", usage);
        }
        if let Some(limit) = self
            .clamped_limit(handle, MEMSW_LIMIT)?
            .ok_log(log::Level::Debug, skipped("memsw_limit"))
        {
            metrics.insert("memsw_limit", limit);
        }

        if let Some(cpu_time) =
            single_value(handle, CPU_USAGE)?.ok_log(log::Level::Debug, skipped("cpu_time"))
        {
            metrics.insert("cpu_time", cpu_time);
            if let Some(percpu) = cpu_time_percpu(handle, cpu_time)?
                .ok_log(log::Level::Debug, skipped("cpu_time_percpu"))
            {
                metrics.insert("cpu_time_percpu", percpu);
            }
        }

        let serviced = blkio(handle, BLKIO_SERVICED)?;
        metrics.insert("blkio_reads", serviced.read);
        metrics.insert("blkio_writes", serviced.write);

        let service_bytes = blkio(handle, BLKIO_SERVICE_BYTES)?;
        metrics.insert("blkio_read_bytes", service_bytes.read);
        metrics.insert("blkio_write_bytes", service_bytes.write);

        if let Some(net) = self
            .interface_stats(handle)?
            .ok_log(log::Level::Debug, skipped("bytes_sent,bytes_recv"))
        {
            // counters are taken at the host end of the link
            metrics.insert("bytes_sent", net.rx_bytes);
            metrics.insert("bytes_recv", net.tx_bytes);
        }

        Ok(metrics)
    }

    /// Reads a memory limit and clamps it to the host's physical memory.
    fn clamped_limit<H: ContainerHandle>(&self, handle: &H, item: &'static str) -> Query<u64> {
        let limit = match single_value(handle, item)? {
            Ok(limit) => limit,
            Err(skip) => return Ok(Err(skip)),
        };
        let total = host_total_memory(&self.meminfo)?;
        Ok(Ok(limit.min(total)))
    }

    /// Sums the host-side counters of every network interface of the container.
    ///
    /// A single unreadable or unnamed interface leaves out the network metrics entirely.
    fn interface_stats<H: ContainerHandle>(&self, handle: &H) -> Query<InterfaceStat> {
        let mut seen = HashSet::new();
        let mut total = InterfaceStat::default();

        for index in 0..handle.config_item("lxc.network").len() {
            let Some(iface_type) = handle.running_config_item(&format!("lxc.network.{index}.type"))
            else {
                continue;
            };
            let name_key = match iface_type.first().map(String::as_str) {
                Some("veth") => format!("lxc.network.{index}.veth.pair"),
                _ => format!("lxc.network.{index}.link"),
            };
            let Some(iface) = handle
                .running_config_item(&name_key)
                .and_then(|values| values.into_iter().next())
                .filter(|iface| !iface.is_empty() && !iface.contains('/'))
            else {
                return Ok(Err(Skip::InterfaceName(name_key)));
            };
            if !seen.insert(iface.clone()) {
                continue;
            }

            match InterfaceStat::read(&self.sys_class_net, &iface) {
                Ok(stat) => total += stat,
                Err(InterfaceStatError::Parse { path, source }) => {
                    return Err(parse_error(path.display(), source));
                }
                Err(source) => return Ok(Err(Skip::Interface { iface, source })),
            }
        }

        Ok(Ok(total))
    }
}

/// Context of a skipped metric, rendered into the debug log.
struct Skipped<'a> {
    container: &'a ContainerName,
    metric: &'static str,
}

impl fmt::Display for Skipped<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "skipping metric: container={}, metric={}",
            self.container, self.metric
        )
    }
}

fn parse_error(item: impl fmt::Display, source: StatParseError) -> CollectError {
    CollectError::Parse {
        item: item.to_string(),
        source,
    }
}

/// Returns the first line of a cgroup item, or `None` if the item is empty.
fn first_line<H: ContainerHandle>(handle: &H, item: &str) -> Option<String> {
    handle
        .cgroup_item(item)
        .into_iter()
        .next()
        .filter(|line| !line.is_empty())
}

fn single_value<H: ContainerHandle>(handle: &H, item: &'static str) -> Query<u64> {
    match first_line(handle, item) {
        Some(line) => parse_u64(&line)
            .map(Ok)
            .map_err(|source| parse_error(item, source)),
        None => Ok(Err(Skip::EmptyItem(item))),
    }
}

fn usage_percent(usage: u64, limit: u64) -> Result<f64, Skip> {
    if limit == 0 {
        return Err(Skip::ZeroLimit);
    }
    Ok(usage as f64 / limit as f64 * 100.0)
}

fn cpu_time_percpu<H: ContainerHandle>(handle: &H, cpu_time: u64) -> Query<f64> {
    let Some(cpus) = first_line(handle, CPUSET_CPUS) else {
        return Ok(Err(Skip::EmptyItem(CPUSET_CPUS)));
    };
    let cores = count_cores(&cpus).map_err(|source| parse_error(CPUSET_CPUS, source))?;
    if cores == 0 {
        return Ok(Err(Skip::NoCores(cpus)));
    }
    Ok(Ok(cpu_time as f64 / cores as f64))
}

fn blkio<H: ContainerHandle>(handle: &H, item: &'static str) -> Result<BlkioStat, CollectError> {
    let lines = handle.cgroup_item(item);
    BlkioStat::from_lines(lines.iter().map(String::as_str))
        .map_err(|source| parse_error(item, source))
}
