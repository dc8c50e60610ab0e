//! Parser for LXC container configuration files (`<lxcpath>/<name>/config`).
//!
//! The file is a list of `key = value` lines with `#` comments. Network interfaces use one of
//! two syntaxes, both of which are understood:
//!
//! ```text
//! # LXC < 2.1: every `lxc.network.type` starts a new interface
//! lxc.network.type = veth
//! lxc.network.veth.pair = vethweb1
//! lxc.network.link = lxcbr0
//!
//! # LXC >= 2.1: interfaces are indexed explicitly
//! lxc.net.0.type = veth
//! lxc.net.0.veth.pair = vethweb1
//! lxc.net.0.link = lxcbr0
//! ```
//!
//! Interfaces are numbered densely in the order of their index (or appearance), and addressed
//! with the legacy spelling `lxc.network.<i>.<key>` regardless of the syntax used in the file.

use std::collections::{BTreeMap, HashMap};

const LEGACY_NETWORK_PREFIX: &str = "lxc.network.";
const NETWORK_PREFIX: &str = "lxc.net.";

/// A parsed LXC container configuration.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LxcConfig {
    items: HashMap<String, Vec<String>>,
    networks: Vec<HashMap<String, String>>,
}

impl LxcConfig {
    /// Parses configuration lines. Malformed lines (no `=`) are ignored.
    pub fn parse<'a>(lines: impl IntoIterator<Item = &'a str>) -> Self {
        let mut items: HashMap<String, Vec<String>> = HashMap::new();
        let mut legacy: Vec<HashMap<String, String>> = Vec::new();
        let mut indexed: BTreeMap<usize, HashMap<String, String>> = BTreeMap::new();

        for line in lines {
            let line = line.trim();
            if line.is_empty() || line.starts_with('#') {
                continue;
            }
            let Some((key, value)) = line.split_once('=') else {
                log::debug!("ignoring malformed lxc config line `{line}`");
                continue;
            };
            let (key, value) = (key.trim(), value.trim().to_owned());

            if let Some(sub) = key.strip_prefix(NETWORK_PREFIX)
                && let Some((index, sub)) = split_index(sub)
            {
                indexed.entry(index).or_default().insert(sub.to_owned(), value);
                continue;
            }
            if let Some(sub) = key.strip_prefix(LEGACY_NETWORK_PREFIX) {
                if let Some((index, sub)) = split_index(sub) {
                    indexed.entry(index).or_default().insert(sub.to_owned(), value);
                    continue;
                }
                if sub == "type" {
                    legacy.push(HashMap::new());
                }
                match legacy.last_mut() {
                    Some(network) => {
                        network.insert(sub.to_owned(), value);
                    }
                    None => log::debug!("ignoring `{key}` outside of a network block"),
                }
                continue;
            }

            items.entry(key.to_owned()).or_default().push(value);
        }

        legacy.extend(indexed.into_values());
        Self {
            items,
            networks: legacy,
        }
    }

    /// Returns the values of a configuration item.
    ///
    /// `lxc.network` (or `lxc.net`) yields the type of every configured interface.
    pub fn item(&self, key: &str) -> Vec<String> {
        if key == "lxc.network" || key == "lxc.net" {
            return self
                .networks
                .iter()
                .map(|network| network.get("type").cloned().unwrap_or_default())
                .collect();
        }
        self.lookup(key).unwrap_or_default()
    }

    /// Returns the values of a configuration item, or `None` if it is not set.
    pub fn lookup(&self, key: &str) -> Option<Vec<String>> {
        let network_key = key
            .strip_prefix(LEGACY_NETWORK_PREFIX)
            .or_else(|| key.strip_prefix(NETWORK_PREFIX))
            .and_then(split_index);
        if let Some((index, sub)) = network_key {
            return self
                .networks
                .get(index)
                .and_then(|network| network.get(sub))
                .map(|value| vec![value.clone()]);
        }
        self.items.get(key).cloned()
    }
}

/// Splits `"<index>.<rest>"` into its numeric index and the remaining key.
fn split_index(key: &str) -> Option<(usize, &str)> {
    let (index, rest) = key.split_once('.')?;
    Some((index.parse().ok()?, rest))
}
