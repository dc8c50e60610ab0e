use std::time::Duration;

use crate::container;

use super::stats::{HostMemoryError, InterfaceStatError, StatParseError};

/// A failure that ends the collection of one container.
///
/// The other containers of the run are not affected; the failed container is
/// reported with an empty metric set.
#[derive(Debug, thiserror::Error)]
pub enum CollectError {
    #[error("failed to open container: {0}")]
    Open(#[from] container::Error),
    #[error("malformed `{item}`: {source}")]
    Parse {
        item: String,
        #[source]
        source: StatParseError,
    },
    #[error("failed to determine host memory: {0}")]
    HostMemory(#[from] HostMemoryError),
    #[error("collection task failed: {0}")]
    Join(#[from] tokio::task::JoinError),
    #[error("collection timed out after {0:?}")]
    Timeout(Duration),
}

/// Why a single metric was left out of a container's metric set.
#[derive(Debug, thiserror::Error)]
pub enum Skip {
    #[error("cgroup item `{0}` is empty")]
    EmptyItem(&'static str),
    #[error("memory limit is zero")]
    ZeroLimit,
    #[error("cpuset `{0}` denotes no cores")]
    NoCores(String),
    #[error("interface name `{0}` is not set")]
    InterfaceName(String),
    #[error("interface `{iface}` is unavailable: {source}")]
    Interface {
        iface: String,
        #[source]
        source: InterfaceStatError,
    },
}
