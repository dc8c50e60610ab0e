//! Host memory information used to clamp container memory limits.
//!
//! An unlimited cgroup v1 memory limit is reported as a huge sentinel value
//! (`9223372036854771712` on 64-bit kernels). Limits are therefore clamped to the
//! host's physical memory, read from the `MemTotal` line of `/proc/meminfo`:
//!
//! ```text
//! MemTotal:       16314680 kB
//! MemFree:         1234567 kB
//! ```
//!
//! # Example
//!
//! ```rust
//! use lxc_stats::cgroup::stats::{KeyValueStat, MemInfo};
//!
//! let data = "MemTotal:       16314680 kB\nMemFree:         1234567 kB\n";
//! let info = MemInfo::from_reader(&mut data.as_bytes()).unwrap();
//! assert_eq!(info.total_bytes(), Some(16314680 * 1024));
//! ```

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::LazyLock;

use crate::fsutil;

use super::StatParseError;
use super::parser::KeyValueStat;

/// Errors that occur while determining the host's total physical memory.
#[derive(Debug, thiserror::Error)]
pub enum HostMemoryError {
    #[error(transparent)]
    FileOpen(#[from] fsutil::FileOpenError),
    #[error("failed to parse `{path}`: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: StatParseError,
    },
    #[error("`{path}` does not report MemTotal")]
    MissingTotal { path: PathBuf },
}

/// The subset of `/proc/meminfo` needed for limit clamping.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct MemInfo {
    /// `MemTotal` in kibibytes, as reported by the kernel.
    pub mem_total_kb: Option<u64>,
}

impl MemInfo {
    fn set_mem_total_kb(&mut self, v: u64) {
        self.mem_total_kb = Some(v);
    }

    /// Returns the total physical memory in bytes.
    pub fn total_bytes(&self) -> Option<u64> {
        self.mem_total_kb.map(|kb| kb.saturating_mul(1024))
    }
}

type Setter = fn(&mut MemInfo, u64);

static SETTERS: LazyLock<HashMap<&'static str, Setter>> = LazyLock::new(|| {
    let mut m: HashMap<&'static str, Setter> = HashMap::with_capacity(1);

    m.insert("MemTotal:", MemInfo::set_mem_total_kb);

    m
});

impl KeyValueStat for MemInfo {
    const SKIP_VALUES: usize = 0;
    const ALLOW_DUPLICATE_KEYS: bool = false;

    fn field_handlers() -> &'static HashMap<&'static str, fn(&mut Self, u64)> {
        &SETTERS
    }
}

/// Reads the host's total physical memory in bytes from a `meminfo` file.
///
/// # Errors
///
/// Returns a [`HostMemoryError`] if the file cannot be opened or parsed, or lacks `MemTotal`.
pub fn host_total_memory(path: impl AsRef<Path>) -> Result<u64, HostMemoryError> {
    let path = path.as_ref();
    let mut reader = fsutil::open_file_reader(path)?;
    let info = MemInfo::from_reader(&mut reader).map_err(|source| HostMemoryError::Parse {
        path: path.to_path_buf(),
        source,
    })?;
    info.total_bytes()
        .ok_or_else(|| HostMemoryError::MissingTotal {
            path: path.to_path_buf(),
        })
}
