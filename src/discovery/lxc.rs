//! Filesystem-backed access to LXC containers on a cgroup v1 host.
//!
//! LXC places every running container into a `<prefix>/<name>` group of each controller
//! hierarchy, e.g. `/sys/fs/cgroup/memory/lxc/web1`. The containers present in the memory
//! hierarchy that also have a configuration file below the LXC path are considered active.
//!
//! Cgroup items are resolved through the controller named by their first component:
//! `cpuacct.usage` is read from `<cgroup_root>/cpuacct/<prefix>/<name>/cpuacct.usage`.
//!
//! LXC 4 and later name the groups `lxc.payload.<name>` directly below each controller.
//! A prefix ending in `.` (e.g. `lxc.payload.`) selects that flat layout.
use std::io;
use std::path::{Path, PathBuf};

use crate::config::Config;
use crate::container::{self, ContainerHandle, ContainerName, ContainerRuntime};
use crate::fsutil;

mod config;

pub use config::LxcConfig;

/// The controller whose hierarchy is scanned for running containers.
const DISCOVERY_CONTROLLER: &str = "memory";

/// Lists and opens LXC containers from the cgroup filesystem and the LXC path.
#[derive(Debug, Clone)]
pub struct LxcRuntime {
    lxc_path: PathBuf,
    cgroup_root: PathBuf,
    cgroup_prefix: String,
}

impl LxcRuntime {
    pub fn new(
        lxc_path: impl Into<PathBuf>,
        cgroup_root: impl Into<PathBuf>,
        cgroup_prefix: impl Into<String>,
    ) -> Self {
        Self {
            lxc_path: lxc_path.into(),
            cgroup_root: cgroup_root.into(),
            cgroup_prefix: cgroup_prefix.into(),
        }
    }

    pub fn from_config(config: &Config) -> Self {
        Self::new(
            &config.lxc_path,
            &config.cgroup_root,
            config.cgroup_prefix.as_str(),
        )
    }

    fn config_path(&self, name: &str) -> PathBuf {
        self.lxc_path.join(name).join("config")
    }
}

impl ContainerRuntime for LxcRuntime {
    type Handle = LxcContainer;

    fn active_containers(&self) -> container::Result<Vec<ContainerName>> {
        let (dir, name_prefix) = match flat_prefix(&self.cgroup_prefix) {
            Some(prefix) => (self.cgroup_root.join(DISCOVERY_CONTROLLER), prefix),
            None => (
                self.cgroup_root
                    .join(DISCOVERY_CONTROLLER)
                    .join(&self.cgroup_prefix),
                "",
            ),
        };
        let entries = match std::fs::read_dir(&dir) {
            Ok(entries) => entries,
            Err(err) if err.kind() == io::ErrorKind::NotFound => {
                log::debug!("no lxc cgroup at `{}`, assuming no running containers", dir.display());
                return Ok(Vec::new());
            }
            Err(source) => return Err(container::Error::List { path: dir, source }),
        };

        let mut names = Vec::new();
        for entry in entries {
            let entry = entry.map_err(|source| container::Error::List {
                path: dir.clone(),
                source,
            })?;
            if !entry.file_type().is_ok_and(|t| t.is_dir()) {
                continue;
            }
            let raw = entry.file_name();
            let Some(raw) = raw.to_str() else {
                log::warn!("skipping non UTF-8 cgroup `{}`", entry.path().display());
                continue;
            };
            let Some(raw) = raw.strip_prefix(name_prefix) else {
                continue;
            };
            let name = match ContainerName::new(raw) {
                Ok(name) => name,
                Err(err) => {
                    log::warn!("skipping cgroup `{}`: {}", entry.path().display(), err);
                    continue;
                }
            };
            if !self.config_path(raw).is_file() {
                log::debug!("skipping cgroup `{raw}` without lxc configuration");
                continue;
            }
            names.push(name);
        }
        names.sort();

        Ok(names)
    }

    fn open(&self, name: &ContainerName) -> container::Result<LxcContainer> {
        let path = self.config_path(name.as_ref());
        let lines = fsutil::read_lines(&path).map_err(|source| {
            if source.is_not_found() {
                container::Error::NotFound {
                    name: name.to_string(),
                    path: path.clone(),
                }
            } else {
                container::Error::ConfigRead {
                    name: name.to_string(),
                    source,
                }
            }
        })?;

        Ok(LxcContainer {
            name: name.clone(),
            cgroup_root: self.cgroup_root.clone(),
            cgroup_prefix: self.cgroup_prefix.clone(),
            config: LxcConfig::parse(lines.iter().map(String::as_str)),
        })
    }
}

/// An opened LXC container.
#[derive(Debug)]
pub struct LxcContainer {
    name: ContainerName,
    cgroup_root: PathBuf,
    cgroup_prefix: String,
    config: LxcConfig,
}

impl LxcContainer {
    /// Returns the path of the cgroup item `key`, or `None` if `key` names no controller.
    fn cgroup_item_path(&self, key: &str) -> Option<PathBuf> {
        let (controller, _) = key.split_once('.')?;
        if controller.is_empty() || key.contains('/') {
            return None;
        }
        Some(cgroup_dir(&self.cgroup_root, controller, &self.cgroup_prefix, &self.name).join(key))
    }
}

fn cgroup_dir(root: &Path, controller: &str, prefix: &str, name: &ContainerName) -> PathBuf {
    match flat_prefix(prefix) {
        Some(prefix) => root.join(controller).join(format!("{prefix}{name}")),
        None => root.join(controller).join(prefix).join(name.as_ref()),
    }
}

/// Returns the group name prefix if `prefix` selects the flat `<prefix><name>` layout.
fn flat_prefix(prefix: &str) -> Option<&str> {
    prefix.ends_with('.').then_some(prefix)
}

impl ContainerHandle for LxcContainer {
    fn name(&self) -> &ContainerName {
        &self.name
    }

    fn cgroup_item(&self, key: &str) -> Vec<String> {
        let Some(path) = self.cgroup_item_path(key) else {
            log::debug!("container={}: `{key}` is not a cgroup item", self.name);
            return Vec::new();
        };
        match fsutil::read_lines(&path) {
            Ok(lines) => lines,
            Err(err) => {
                log::debug!("container={}: {}", self.name, err);
                Vec::new()
            }
        }
    }

    fn config_item(&self, key: &str) -> Vec<String> {
        self.config.item(key)
    }

    fn running_config_item(&self, key: &str) -> Option<Vec<String>> {
        self.config.lookup(key)
    }
}
