//! Container identity and the runtime capabilities the collector relies on.
//!
//! The container runtime is treated as an external collaborator: it lists the active
//! containers and gives read access to each container's cgroup and configuration items.
//! [`ContainerRuntime`] and [`ContainerHandle`] describe exactly that surface, so the
//! collection pipeline can run against LXC on a real host or against fakes in tests.
use std::borrow::Borrow;
use std::fmt;
use std::sync::Arc;

mod error;
#[cfg(test)]
pub(crate) mod fake;

pub use error::{Error, Result};

/// The maximum allowed length for a [`ContainerName`].
const CONTAINER_NAME_MAX_LEN: usize = 255;

/// A validated container name.
///
/// Names are unique within one LXC path and double as the `lxc_host` tag of emitted metrics,
/// so they must be non-empty and must not contain `/` or whitespace.
///
/// # Examples
///
/// ```
/// # use lxc_stats::container::ContainerName;
/// let name = ContainerName::new("web1").unwrap();
/// assert_eq!(name.as_ref(), "web1");
/// assert!(ContainerName::new("web 1").is_err());
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ContainerName(Arc<str>);

impl ContainerName {
    /// Creates a new `ContainerName` from the given raw name.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidContainerName`] if the name is empty, longer than
    /// [`CONTAINER_NAME_MAX_LEN`], or contains `/` or whitespace.
    pub fn new(src: impl AsRef<str>) -> Result<Self> {
        let src = src.as_ref();
        if src.is_empty()
            || src.len() > CONTAINER_NAME_MAX_LEN
            || src.chars().any(|c| c == '/' || c.is_whitespace())
        {
            return Err(Error::InvalidContainerName(src.to_owned()));
        }

        Ok(Self(src.into()))
    }
}

impl AsRef<str> for ContainerName {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl Borrow<str> for ContainerName {
    fn borrow(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ContainerName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Read access to one running container.
///
/// All accessors are infallible in the same way the underlying runtime is: a missing item
/// is reported as an empty list (or `None` for running configuration items), never as an error.
pub trait ContainerHandle: Send + 'static {
    /// Returns the name of the container.
    fn name(&self) -> &ContainerName;

    /// Returns the lines of the cgroup item `key` (e.g. `memory.usage_in_bytes`).
    fn cgroup_item(&self, key: &str) -> Vec<String>;

    /// Returns the values of the configuration item `key`.
    fn config_item(&self, key: &str) -> Vec<String>;

    /// Returns the values of the configuration item `key` of the running container,
    /// or `None` if the item is not set.
    fn running_config_item(&self, key: &str) -> Option<Vec<String>>;
}

/// A container runtime that can enumerate and open running containers.
pub trait ContainerRuntime: Send + Sync + 'static {
    type Handle: ContainerHandle;

    /// Lists the names of all currently active containers.
    ///
    /// # Errors
    ///
    /// Returns an error if the runtime cannot be queried at all.
    fn active_containers(&self) -> Result<Vec<ContainerName>>;

    /// Opens a handle to the container called `name`.
    ///
    /// # Errors
    ///
    /// Returns an error if the container does not exist or cannot be accessed.
    fn open(&self, name: &ContainerName) -> Result<Self::Handle>;
}
