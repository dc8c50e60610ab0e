//! Unit parsers for raw cgroup item text.
//!
//! This module provides the small parsing building blocks every metric query is built from:
//!
//! - [`parse_u64`]: strict decimal parsing of single-value items such as `memory.usage_in_bytes`.
//! - [`count_cores`]: counts the CPUs denoted by a `cpuset.cpus` range list.
//! - [`KeyValueStat`]: a trait for parsing multi-line, whitespace separated `key value` files
//!   such as `blkio.throttle.io_serviced` or `/proc/meminfo`.
//!
//! # Example: Implementing `KeyValueStat`
//!
//! ```rust
//! use std::collections::HashMap;
//! use std::sync::OnceLock;
//! use lxc_stats::cgroup::stats::KeyValueStat;
//!
//! #[derive(Default)]
//! struct MyStat {
//!     foo: u64,
//! }
//!
//! static HANDLERS: OnceLock<HashMap<&'static str, fn(&mut MyStat, u64)>> = OnceLock::new();
//!
//! impl MyStat {
//!     fn add_foo(&mut self, foo: u64) {
//!         self.foo += foo;
//!     }
//! }
//!
//! impl KeyValueStat for MyStat {
//!     const SKIP_VALUES: usize = 1;
//!     const ALLOW_DUPLICATE_KEYS: bool = true;
//!
//!     fn field_handlers() -> &'static HashMap<&'static str, fn(&mut Self, u64)> {
//!         HANDLERS.get_or_init(|| {
//!             let mut map = HashMap::new();
//!             map.insert("foo", MyStat::add_foo as fn(&mut MyStat, u64));
//!             map
//!         })
//!     }
//! }
//!
//! let stat = MyStat::from_lines(["8:0 foo 2", "8:16 foo 3"]).unwrap();
//! assert_eq!(stat.foo, 5);
//! ```

use std::collections::{HashMap, HashSet};
use std::io::BufRead;
use std::sync::LazyLock;

use regex::Regex;

use super::StatParseError;

static CPU_RANGE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^([0-9]+)-([0-9]+)$").expect("cpu range pattern is valid"));

/// Parses a decimal string into a `u64`.
///
/// No trimming is performed: kernel values are handed over line by line, so anything
/// other than a plain number means the item is not what it claims to be.
///
/// # Errors
///
/// Returns [`StatParseError::InvalidValue`] if `s` is empty, not a number, or out of range.
///
/// # Example
///
/// ```rust
/// use lxc_stats::cgroup::stats::parse_u64;
///
/// assert_eq!(parse_u64("1048576").unwrap(), 1048576);
/// assert!(parse_u64("12ab").is_err());
/// ```
pub fn parse_u64(s: &str) -> Result<u64, StatParseError> {
    s.parse::<u64>()
        .map_err(|source| StatParseError::InvalidValue {
            value: s.to_string(),
            line: 1,
            source,
        })
}

/// Counts the CPUs denoted by a `cpuset.cpus` list, e.g. `"0-3,26"` yields `5`.
///
/// Each comma separated token is either an inclusive `start-stop` range, which counts
/// every index in it, or any other token containing a digit, which counts as one CPU.
/// Tokens without digits (such as the empty token between doubled commas) count nothing.
///
/// # Errors
///
/// Returns a [`StatParseError`] if a range endpoint does not fit into a `u64`.
///
/// # Example
///
/// ```rust
/// use lxc_stats::cgroup::stats::count_cores;
///
/// assert_eq!(count_cores("0-3,26").unwrap(), 5);
/// assert_eq!(count_cores("").unwrap(), 0);
/// ```
pub fn count_cores(cpus: &str) -> Result<u64, StatParseError> {
    let mut count: u64 = 0;
    for token in cpus.split(',') {
        if let Some(caps) = CPU_RANGE.captures(token) {
            let start = parse_u64(&caps[1])?;
            let stop = parse_u64(&caps[2])?;
            if stop >= start {
                count = count.saturating_add((stop - start).saturating_add(1));
            }
        } else if token.bytes().any(|b| b.is_ascii_digit()) {
            count = count.saturating_add(1);
        }
    }
    Ok(count)
}

/// A trait for parsing line-oriented `key value` files such as
/// `blkio.throttle.io_serviced` or `/proc/meminfo`.
///
/// Implementors define a set of known keys and how to apply values for them.
/// Unknown keys are ignored. A known key must be followed by a decimal value.
pub trait KeyValueStat: Default
where
    Self: 'static,
{
    /// The number of whitespace-separated values to skip at the start of *each line*.
    ///
    /// For blkio items this skips the `major:minor` device column.
    const SKIP_VALUES: usize;

    /// If `true`, repeated keys are allowed (e.g., one `Read` line per device).
    /// If `false`, encountering the same key more than once will cause an error,
    /// and parsing stops as soon as every known key has been seen.
    const ALLOW_DUPLICATE_KEYS: bool;

    /// Returns a map of known field names and corresponding handler functions
    /// that apply parsed values (e.g., set or accumulate) to the struct's fields.
    fn field_handlers() -> &'static HashMap<&'static str, fn(&mut Self, u64)>;

    /// Parses already split lines, as returned by a container's cgroup item accessor.
    ///
    /// # Errors
    ///
    /// Returns a [`StatParseError`] if a known key has a missing or invalid value, or if a
    /// duplicate key is found and duplicates are disallowed.
    fn from_lines<'a>(lines: impl IntoIterator<Item = &'a str>) -> Result<Self, StatParseError> {
        let mut stat = Self::default();
        let handlers = Self::field_handlers();
        let field_count = handlers.len();
        let mut seen_keys = HashSet::with_capacity(field_count);

        for (idx, line) in lines.into_iter().enumerate() {
            Self::parse_line(&mut stat, line, idx + 1, handlers, &mut seen_keys)?;
            if !Self::ALLOW_DUPLICATE_KEYS && seen_keys.len() == field_count {
                break;
            }
        }

        Ok(stat)
    }

    /// Parses a `key value` formatted buffer.
    ///
    /// # Errors
    ///
    /// Returns [`StatParseError::Io`] if reading fails, or any error of
    /// [`KeyValueStat::from_lines`].
    fn from_reader<R: BufRead>(buf: &mut R) -> Result<Self, StatParseError> {
        let mut stat = Self::default();
        let handlers = Self::field_handlers();
        let field_count = handlers.len();
        let mut seen_keys = HashSet::with_capacity(field_count);

        let mut line = String::new();
        let mut lineno = 0;
        while buf.read_line(&mut line)? != 0 {
            lineno += 1;
            Self::parse_line(&mut stat, &line, lineno, handlers, &mut seen_keys)?;
            if !Self::ALLOW_DUPLICATE_KEYS && seen_keys.len() == field_count {
                break;
            }
            line.clear();
        }

        Ok(stat)
    }

    /// Parses the first `key value` pair of a single line, after skipping `SKIP_VALUES` tokens.
    ///
    /// Blank lines and lines that run out of tokens before a key are ignored.
    fn parse_line(
        stat: &mut Self,
        line: &str,
        lineno: usize,
        handlers: &HashMap<&'static str, fn(&mut Self, u64)>,
        seen_keys: &mut HashSet<&'static str>,
    ) -> Result<(), StatParseError> {
        let mut parts = line.split_whitespace().skip(Self::SKIP_VALUES);
        let Some(key) = parts.next() else {
            return Ok(());
        };
        let Some((k, handler)) = handlers.get_key_value(key) else {
            return Ok(());
        };

        let val = parts.next().ok_or_else(|| StatParseError::MissingValue {
            key: key.to_string(),
            line: lineno,
        })?;
        let parsed = val
            .parse::<u64>()
            .map_err(|source| StatParseError::InvalidKeyValue {
                key: key.to_string(),
                value: val.to_string(),
                line: lineno,
                source,
            })?;
        if !Self::ALLOW_DUPLICATE_KEYS && !seen_keys.insert(k) {
            return Err(StatParseError::DuplicateField {
                field: key.to_string(),
                line: lineno,
            });
        }
        handler(stat, parsed);
        Ok(())
    }
}
