use std::num::NonZeroUsize;
use std::sync::Arc;
use std::time::Duration;

use tokio::sync::Semaphore;

use crate::container::{ContainerName, ContainerRuntime};

use super::collector::Collector;
use super::error::CollectError;
use super::stats::{AggregateReport, MetricSet};

/// The outcome of collecting one container, sent from its task to the monitor.
#[derive(Debug)]
pub struct CollectionMessage {
    pub container: ContainerName,
    pub result: Result<MetricSet, CollectError>,
}

/// Fans collection out over all containers and merges the results into one report.
#[derive(Debug)]
pub struct Monitor<R> {
    runtime: Arc<R>,
    collector: Arc<Collector>,
    max_concurrency: Option<NonZeroUsize>,
    timeout: Option<Duration>,
}

impl<R: ContainerRuntime> Monitor<R> {
    pub fn new(runtime: R, collector: Collector) -> Self {
        Self {
            runtime: Arc::new(runtime),
            collector: Arc::new(collector),
            max_concurrency: None,
            timeout: None,
        }
    }

    /// Limits how many containers are collected at the same time. `None` means unbounded.
    pub fn with_max_concurrency(mut self, max_concurrency: Option<NonZeroUsize>) -> Self {
        self.max_concurrency = max_concurrency;
        self
    }

    /// Gives up on a container after `timeout`, reporting it without metrics.
    pub fn with_timeout(mut self, timeout: Option<Duration>) -> Self {
        self.timeout = timeout;
        self
    }

    /// Collects stats for all given containers concurrently.
    ///
    /// Every container is collected by its own task, which opens the container and reads its
    /// items on the blocking thread pool. The returned report holds exactly one entry per
    /// container; containers whose collection failed are logged and get an empty metric set.
    pub async fn collect_stats(&self, containers: Vec<ContainerName>) -> AggregateReport {
        let mut report = AggregateReport::new();
        let expected = containers.len();
        if expected == 0 {
            return report;
        }

        let (tx, mut rx) = tokio::sync::mpsc::channel::<CollectionMessage>(expected);
        let permits = self
            .max_concurrency
            .map(|limit| Arc::new(Semaphore::new(limit.get())));

        for container in containers {
            // keeps the entry even if the task never reports back
            report.insert(container.clone(), MetricSet::new());

            let tx = tx.clone();
            let runtime = Arc::clone(&self.runtime);
            let collector = Arc::clone(&self.collector);
            let permits = permits.clone();
            let timeout = self.timeout;
            tokio::spawn(async move {
                let _permit = match permits {
                    Some(permits) => permits.acquire_owned().await.ok(),
                    None => None,
                };
                let result =
                    collect_container(runtime, collector, container.clone(), timeout).await;
                if tx.send(CollectionMessage { container, result }).await.is_err() {
                    log::warn!(
                        target: "container monitor",
                        "monitor stopped before the result was sent"
                    );
                }
            });
        }
        drop(tx);

        let mut received = 0;
        while received < expected {
            let Some(CollectionMessage { container, result }) = rx.recv().await else {
                break;
            };
            received += 1;
            match result {
                Ok(metrics) => report.insert(container, metrics),
                Err(err) => {
                    log::error!(
                        target: "container monitor",
                        "failed reading container stats: container={}, error={}",
                        container,
                        err
                    );
                    report.insert(container, MetricSet::new());
                }
            }
        }
        if received < expected {
            log::error!(
                target: "container monitor",
                "only {received} of {expected} containers reported back"
            );
        }

        report
    }
}

async fn collect_container<R: ContainerRuntime>(
    runtime: Arc<R>,
    collector: Arc<Collector>,
    container: ContainerName,
    timeout: Option<Duration>,
) -> Result<MetricSet, CollectError> {
    let task = tokio::task::spawn_blocking(move || {
        let handle = runtime.open(&container)?;
        collector.collect(&handle)
    });

    let joined = match timeout {
        Some(limit) => tokio::time::timeout(limit, task)
            .await
            .map_err(|_| CollectError::Timeout(limit))?,
        None => task.await,
    };
    joined?
}

#[cfg(test)]
mod tests {
    use crate::cgroup::stats::MetricValue;
    use crate::container::fake::{FakeContainer, FakeRuntime};

    use super::*;

    struct Fixture {
        root: tempfile::TempDir,
    }

    impl Fixture {
        fn new() -> Self {
            let root = tempfile::tempdir().unwrap();
            std::fs::write(root.path().join("meminfo"), "MemTotal: 8388608 kB\n").unwrap();
            Self { root }
        }

        fn monitor(&self, runtime: FakeRuntime) -> Monitor<FakeRuntime> {
            let collector = Collector::new(
                self.root.path().join("net"),
                self.root.path().join("meminfo"),
            );
            Monitor::new(runtime, collector)
        }
    }

    fn names(raw: &[&str]) -> Vec<ContainerName> {
        raw.iter().map(|n| ContainerName::new(n).unwrap()).collect()
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 2)]
    async fn test_one_entry_per_container() {
        let fixture = Fixture::new();
        let runtime = FakeRuntime::default()
            .with(FakeContainer::well_formed("web1"))
            .with(FakeContainer::well_formed("web2"))
            .with(FakeContainer::well_formed("db"));
        let monitor = fixture.monitor(runtime);

        let report = monitor.collect_stats(names(&["web1", "web2", "db"])).await;

        assert_eq!(report.len(), 3);
        for name in ["web1", "web2", "db"] {
            let metrics = report.get(name).unwrap();
            assert_eq!(metrics.get_unsigned("mem_usage"), Some(1048576));
            assert_eq!(metrics.get("mem_usage_perc"), Some(MetricValue::Float(25.0)));
        }
    }

    #[tokio::test]
    async fn test_empty_container_list() {
        let fixture = Fixture::new();
        let report = fixture
            .monitor(FakeRuntime::default())
            .collect_stats(Vec::new())
            .await;
        assert!(report.is_empty());
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 2)]
    async fn test_failures_are_scoped_to_their_container() {
        let fixture = Fixture::new();
        let runtime = FakeRuntime::default()
            .with(FakeContainer::well_formed("good"))
            .with(FakeContainer::well_formed("malformed").with_cgroup("cpuacct.usage", "x\n"))
            .with(FakeContainer::well_formed("crashing").panicking_on("cpuset.cpus"));
        let monitor = fixture.monitor(runtime);

        // "vanished" is listed but cannot be opened anymore
        let report = monitor
            .collect_stats(names(&["good", "malformed", "crashing", "vanished"]))
            .await;

        assert_eq!(report.len(), 4);
        assert!(report.get("good").unwrap().contains("cpu_time"));
        for failed in ["malformed", "crashing", "vanished"] {
            assert!(report.get(failed).unwrap().is_empty(), "{failed} should be empty");
        }
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 2)]
    async fn test_timeout_reports_stalled_container_empty() {
        let fixture = Fixture::new();
        let runtime = FakeRuntime::default()
            .with(FakeContainer::well_formed("fast"))
            .with(
                FakeContainer::well_formed("stuck")
                    .stalling_on("memory.usage_in_bytes", Duration::from_secs(1)),
            );
        let monitor = fixture
            .monitor(runtime)
            .with_timeout(Some(Duration::from_millis(200)));

        let report = monitor.collect_stats(names(&["fast", "stuck"])).await;

        assert_eq!(report.len(), 2);
        assert!(!report.get("fast").unwrap().is_empty());
        assert!(report.get("stuck").unwrap().is_empty());
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 2)]
    async fn test_bounded_concurrency_collects_everything() {
        let fixture = Fixture::new();
        let raw: Vec<String> = (0..8).map(|i| format!("c{i}")).collect();
        let runtime = raw.iter().fold(FakeRuntime::default(), |runtime, name| {
            runtime.with(FakeContainer::well_formed(name))
        });
        let monitor = fixture
            .monitor(runtime)
            .with_max_concurrency(NonZeroUsize::new(2));

        let containers = raw.iter().map(|n| ContainerName::new(n).unwrap()).collect();
        let report = monitor.collect_stats(containers).await;

        assert_eq!(report.len(), 8);
        assert!(report.iter().all(|(_, metrics)| metrics.contains("blkio_reads")));
    }
}
