//! LXC Stats: collects resource usage of running LXC containers from the cgroup v1
//! filesystem and reports it in line protocol.
//!
//! This library discovers the active containers below the LXC path, collects memory, CPU,
//! block I/O and network metrics for each of them concurrently, and encodes the merged
//! report as one `lxcstats` line per container.
pub mod cgroup;
pub mod config;
pub mod container;
pub mod discovery;
pub mod error;
pub mod fsutil;
pub mod lineproto;

use config::Config;
use container::ContainerRuntime;

/// Runs one collection over all active containers.
///
/// # Returns
///
/// The encoded report, one line per container, without a trailing newline.
///
/// # Errors
///
/// Fails only if the list of active containers cannot be determined. Failures while
/// collecting a single container are logged and leave that container without metrics.
pub async fn run(config: Config) -> Result<String, Box<dyn std::error::Error>> {
    let runtime = discovery::lxc::LxcRuntime::from_config(&config);
    let containers = runtime.active_containers()?;
    log::debug!("Found {} active containers", containers.len());

    let collector = cgroup::Collector::new(&config.sys_class_net, &config.meminfo);
    let monitor = cgroup::Monitor::new(runtime, collector)
        .with_max_concurrency(config.max_concurrency)
        .with_timeout(config.timeout);

    let before = std::time::Instant::now();
    let report = monitor.collect_stats(containers).await;
    let took = before.elapsed();
    log::trace!("collect_stats() took {} nanoseconds", took.as_nanos());

    Ok(lineproto::encode(&report))
}

#[cfg(test)]
mod tests {
    use crate::cgroup::stats::write_interface;
    use crate::discovery::lxc::tests::FakeHost;

    use super::*;

    fn well_formed(host: &FakeHost, name: &str) {
        host.add_container(name, "lxc.net.0.type = veth\n");
        for (key, content) in [
            ("memory.usage_in_bytes", "1048576\n"),
            ("memory.limit_in_bytes", "4194304\n"),
            ("memory.memsw.usage_in_bytes", "2097152\n"),
            ("memory.memsw.limit_in_bytes", "9223372036854771712\n"),
            ("cpuacct.usage", "4000000000\n"),
            ("cpuset.cpus", "0-1\n"),
            ("blkio.throttle.io_serviced", "8:0 Read 5\n8:0 Write 3\nTotal 8\n"),
            ("blkio.throttle.io_service_bytes", "8:0 Read 512\n8:0 Write 0\nTotal 512\n"),
        ] {
            host.set_cgroup_item(name, key, content);
        }
    }

    fn config(host: &FakeHost) -> Config {
        let net = host.root.path().join("net");
        std::fs::create_dir_all(&net).unwrap();
        let meminfo = host.root.path().join("meminfo");
        std::fs::write(&meminfo, "MemTotal: 8388608 kB\nMemFree: 1024 kB\n").unwrap();
        Config {
            lxc_path: host.lxc_path(),
            cgroup_root: host.cgroup_root(),
            sys_class_net: net,
            meminfo,
            ..Config::default()
        }
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 2)]
    async fn test_run_reports_every_container() {
        let host = FakeHost::new();
        well_formed(&host, "web1");
        well_formed(&host, "web2");
        well_formed(&host, "db");

        let out = run(config(&host)).await.unwrap();

        let lines: Vec<_> = out.lines().collect();
        assert_eq!(lines.len(), 3);
        assert!(lines[0].starts_with("lxcstats,lxc_host=db "));
        assert!(lines[1].starts_with("lxcstats,lxc_host=web1 "));
        assert!(lines[2].starts_with("lxcstats,lxc_host=web2 "));
        for line in lines {
            assert!(line.contains("mem_usage=1048576"));
            assert!(line.contains("mem_usage_perc=25.000000"));
            assert!(line.contains("memsw_limit=8589934592"));
            assert!(line.contains("cpu_time_percpu=2000000000.000000"));
            assert!(line.contains("blkio_reads=5"));
        }
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 2)]
    async fn test_failed_container_renders_without_fields() {
        let host = FakeHost::new();
        well_formed(&host, "good");
        well_formed(&host, "broken");
        host.set_cgroup_item("broken", "cpuacct.usage", "not a number\n");

        let out = run(config(&host)).await.unwrap();

        let lines: Vec<_> = out.lines().collect();
        assert_eq!(lines.len(), 2);
        assert_eq!(lines[0], "lxcstats,lxc_host=broken ");
        assert!(lines[1].contains("cpu_time=4000000000"));
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 2)]
    async fn test_run_sums_host_interfaces() {
        let host = FakeHost::new();
        well_formed(&host, "web1");
        let config = config(&host);
        std::fs::write(
            host.lxc_path().join("web1/config"),
            "lxc.net.0.type = veth\nlxc.net.0.veth.pair = vethA\n\
             lxc.net.1.type = macvlan\nlxc.net.1.link = eth1\n",
        )
        .unwrap();
        write_interface(&config.sys_class_net, "vethA", "100\n", "10\n");
        write_interface(&config.sys_class_net, "eth1", "50\n", "5\n");

        let out = run(config).await.unwrap();

        assert!(out.contains("bytes_sent=150"));
        assert!(out.contains("bytes_recv=15"));
    }

    #[tokio::test]
    async fn test_run_without_containers() {
        let host = FakeHost::new();
        assert_eq!(run(config(&host)).await.unwrap(), "");
    }
}
