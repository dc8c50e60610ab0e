//! Host-side network interface counters for container traffic.
//!
//! LXC containers are usually attached through a veth pair whose host end lives in the
//! host's network namespace. Its counters are exposed as single-value files:
//!
//! ```text
//! /sys/class/net/<iface>/statistics/rx_bytes
//! /sys/class/net/<iface>/statistics/tx_bytes
//! ```
//!
//! Counters are measured at the host end, so what the host receives is what the
//! container sent and vice versa. [`InterfaceStat`] keeps the host's point of view;
//! the reversal happens when metrics are emitted.

use std::io::BufRead;
use std::path::{Path, PathBuf};

use crate::fsutil;

use super::StatParseError;
use super::parser::parse_u64;

/// Errors that occur while reading the counters of one host interface.
#[derive(Debug, thiserror::Error)]
pub enum InterfaceStatError {
    #[error(transparent)]
    FileOpen(#[from] fsutil::FileOpenError),
    #[error("failed to read `{path}`: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("failed to parse `{path}`: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: StatParseError,
    },
}

/// Byte counters of a host network interface.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct InterfaceStat {
    /// Bytes received by the host end.
    pub rx_bytes: u64,
    /// Bytes transmitted by the host end.
    pub tx_bytes: u64,
}

impl std::ops::AddAssign for InterfaceStat {
    fn add_assign(&mut self, rhs: Self) {
        self.rx_bytes = self.rx_bytes.saturating_add(rhs.rx_bytes);
        self.tx_bytes = self.tx_bytes.saturating_add(rhs.tx_bytes);
    }
}

impl InterfaceStat {
    /// Reads the `rx_bytes` and `tx_bytes` counters of `iface` below `sys_class_net`.
    ///
    /// # Errors
    ///
    /// Returns [`InterfaceStatError::FileOpen`] or [`InterfaceStatError::Read`] if a counter file
    /// is not readable, and [`InterfaceStatError::Parse`] if it does not hold a decimal number.
    pub fn read(sys_class_net: impl AsRef<Path>, iface: &str) -> Result<Self, InterfaceStatError> {
        let statistics = sys_class_net.as_ref().join(iface).join("statistics");
        Ok(Self {
            rx_bytes: read_counter(statistics.join("rx_bytes"))?,
            tx_bytes: read_counter(statistics.join("tx_bytes"))?,
        })
    }
}

/// Reads the first line of a sysfs counter file and parses it.
fn read_counter(path: PathBuf) -> Result<u64, InterfaceStatError> {
    let mut reader = fsutil::open_file_reader(&path)?;
    let mut line = String::new();
    if let Err(source) = reader.read_line(&mut line) {
        return Err(InterfaceStatError::Read { path, source });
    }
    let value = line.strip_suffix('\n').unwrap_or(&line);
    parse_u64(value).map_err(|source| InterfaceStatError::Parse { path, source })
}
