//! In-memory container runtime for tests.
use std::collections::HashMap;
use std::time::Duration;

use super::{ContainerHandle, ContainerName, ContainerRuntime, Error, Result};

#[derive(Debug, Clone)]
pub(crate) struct FakeContainer {
    name: ContainerName,
    cgroup: HashMap<String, Vec<String>>,
    config: HashMap<String, Vec<String>>,
    running: HashMap<String, Vec<String>>,
    stall: Option<(&'static str, Duration)>,
    panic_on: Option<&'static str>,
}

impl FakeContainer {
    pub(crate) fn new(name: &str) -> Self {
        Self {
            name: ContainerName::new(name).unwrap(),
            cgroup: HashMap::new(),
            config: HashMap::new(),
            running: HashMap::new(),
            stall: None,
            panic_on: None,
        }
    }

    pub(crate) fn with_cgroup(mut self, key: &str, content: &str) -> Self {
        self.cgroup
            .insert(key.to_owned(), content.lines().map(str::to_owned).collect());
        self
    }

    pub(crate) fn with_config(mut self, key: &str, values: &[&str]) -> Self {
        self.config
            .insert(key.to_owned(), values.iter().map(|v| v.to_string()).collect());
        self
    }

    pub(crate) fn with_running(mut self, key: &str, values: &[&str]) -> Self {
        self.running
            .insert(key.to_owned(), values.iter().map(|v| v.to_string()).collect());
        self
    }

    /// Reading the cgroup item `key` blocks for `stall`.
    pub(crate) fn stalling_on(mut self, key: &'static str, stall: Duration) -> Self {
        self.stall = Some((key, stall));
        self
    }

    /// Reading the cgroup item `key` panics.
    pub(crate) fn panicking_on(mut self, key: &'static str) -> Self {
        self.panic_on = Some(key);
        self
    }

    /// A container with well-formed values for every cgroup item.
    pub(crate) fn well_formed(name: &str) -> Self {
        Self::new(name)
            .with_cgroup("memory.usage_in_bytes", "1048576\n")
            .with_cgroup("memory.limit_in_bytes", "4194304\n")
            .with_cgroup("memory.memsw.usage_in_bytes", "2097152\n")
            .with_cgroup("memory.memsw.limit_in_bytes", "8388608\n")
            .with_cgroup("cpuacct.usage", "4000000000\n")
            .with_cgroup("cpuset.cpus", "0-3\n")
            .with_cgroup(
                "blkio.throttle.io_serviced",
                "8:0 Read 5\n8:0 Write 3\n8:0 Total 8\nTotal 8\n",
            )
            .with_cgroup(
                "blkio.throttle.io_service_bytes",
                "8:0 Read 20480\n8:0 Write 12288\n8:0 Total 32768\nTotal 32768\n",
            )
    }
}

impl ContainerHandle for FakeContainer {
    fn name(&self) -> &ContainerName {
        &self.name
    }

    fn cgroup_item(&self, key: &str) -> Vec<String> {
        if let Some((stall_key, stall)) = self.stall
            && stall_key == key
        {
            std::thread::sleep(stall);
        }
        if self.panic_on == Some(key) {
            panic!("cgroup read of `{key}` exploded");
        }
        self.cgroup.get(key).cloned().unwrap_or_default()
    }

    fn config_item(&self, key: &str) -> Vec<String> {
        self.config.get(key).cloned().unwrap_or_default()
    }

    fn running_config_item(&self, key: &str) -> Option<Vec<String>> {
        self.running.get(key).cloned()
    }
}

#[derive(Debug, Default)]
pub(crate) struct FakeRuntime {
    containers: HashMap<ContainerName, FakeContainer>,
}

impl FakeRuntime {
    pub(crate) fn with(mut self, container: FakeContainer) -> Self {
        self.containers.insert(container.name.clone(), container);
        self
    }
}

impl ContainerRuntime for FakeRuntime {
    type Handle = FakeContainer;

    fn active_containers(&self) -> Result<Vec<ContainerName>> {
        let mut names: Vec<_> = self.containers.keys().cloned().collect();
        names.sort();
        Ok(names)
    }

    fn open(&self, name: &ContainerName) -> Result<FakeContainer> {
        self.containers
            .get(name)
            .cloned()
            .ok_or_else(|| Error::NotFound {
                name: name.to_string(),
                path: format!("/fake/{name}/config").into(),
            })
    }
}
