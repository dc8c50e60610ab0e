//! Runtime configuration, read from environment variables.
//!
//! | Variable | Default |
//! |---|---|
//! | `LXC_PATH` | `/var/lib/lxc` |
//! | `LXC_CGROUP_ROOT` | `/sys/fs/cgroup` |
//! | `LXC_CGROUP_PREFIX` | `lxc` (a trailing `.` selects `<prefix><name>` groups) |
//! | `LXCSTATS_SYS_CLASS_NET` | `/sys/class/net` |
//! | `LXCSTATS_MEMINFO` | `/proc/meminfo` |
//! | `LXCSTATS_MAX_CONCURRENCY` | unbounded |
//! | `LXCSTATS_TIMEOUT_SECS` | no timeout |
use std::num::NonZeroUsize;
use std::path::PathBuf;
use std::time::Duration;

#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("invalid value for `{var}`: `{value}` ({reason})")]
    InvalidValue {
        var: &'static str,
        value: String,
        reason: &'static str,
    },
}

pub type Result<T> = std::result::Result<T, Error>;

/// Settings of one collection run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Config {
    /// LXC configuration path holding `<name>/config`.
    pub lxc_path: PathBuf,
    /// Mount root of the cgroup v1 controller hierarchies.
    pub cgroup_root: PathBuf,
    /// Group below each controller hierarchy that holds the containers, or with a trailing
    /// `.` the name prefix of per-container groups (`lxc.payload.`).
    pub cgroup_prefix: String,
    /// Root of the host's network interface directories.
    pub sys_class_net: PathBuf,
    /// Source of the host's total physical memory.
    pub meminfo: PathBuf,
    /// Upper bound on concurrently running collectors.
    pub max_concurrency: Option<NonZeroUsize>,
    /// Deadline for collecting a single container.
    pub timeout: Option<Duration>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            lxc_path: PathBuf::from("/var/lib/lxc"),
            cgroup_root: PathBuf::from("/sys/fs/cgroup"),
            cgroup_prefix: "lxc".to_owned(),
            sys_class_net: PathBuf::from("/sys/class/net"),
            meminfo: PathBuf::from("/proc/meminfo"),
            max_concurrency: None,
            timeout: None,
        }
    }
}

impl Config {
    /// Reads the configuration from the process environment.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidValue`] if a numeric variable is not a positive integer.
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|var| std::env::var(var).ok())
    }

    /// Builds the configuration from an arbitrary variable lookup. Empty values count as unset.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidValue`] if a numeric variable is not a positive integer.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self> {
        let get = |var: &str| lookup(var).filter(|value| !value.is_empty());
        let defaults = Self::default();

        let max_concurrency = get("LXCSTATS_MAX_CONCURRENCY")
            .map(|value| parse_positive("LXCSTATS_MAX_CONCURRENCY", value))
            .transpose()?
            .and_then(|n| NonZeroUsize::new(n as usize));
        let timeout = get("LXCSTATS_TIMEOUT_SECS")
            .map(|value| parse_positive("LXCSTATS_TIMEOUT_SECS", value))
            .transpose()?
            .map(Duration::from_secs);

        Ok(Self {
            lxc_path: get("LXC_PATH").map_or(defaults.lxc_path, PathBuf::from),
            cgroup_root: get("LXC_CGROUP_ROOT").map_or(defaults.cgroup_root, PathBuf::from),
            cgroup_prefix: get("LXC_CGROUP_PREFIX").unwrap_or(defaults.cgroup_prefix),
            sys_class_net: get("LXCSTATS_SYS_CLASS_NET")
                .map_or(defaults.sys_class_net, PathBuf::from),
            meminfo: get("LXCSTATS_MEMINFO").map_or(defaults.meminfo, PathBuf::from),
            max_concurrency,
            timeout,
        })
    }
}

fn parse_positive(var: &'static str, value: String) -> Result<u64> {
    match value.parse::<u64>() {
        Ok(0) => Err(Error::InvalidValue {
            var,
            value,
            reason: "must be greater than zero",
        }),
        Ok(n) => Ok(n),
        Err(_) => Err(Error::InvalidValue {
            var,
            value,
            reason: "not a positive integer",
        }),
    }
}
