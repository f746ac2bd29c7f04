//! Process runtime diagnostics
//!
//! Collects language identifiers and the shared libraries mapped into
//! the current process for the payload's `application_environment`
//! block. Never includes hostname or username.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

/// Runtime identifiers and loaded libraries for the current process.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RuntimeInfo {
    pub language: String,
    pub language_version: String,
    pub os: String,
    pub arch: String,
    /// Library name to version, e.g. `"libssl" -> "3"`. Unversioned
    /// libraries map to an empty string.
    pub loaded_libraries: BTreeMap<String, String>,
}

impl RuntimeInfo {
    /// Collect runtime information from the current process.
    pub fn collect() -> Self {
        Self {
            language: "rust".to_string(),
            language_version: option_env!("CARGO_PKG_RUST_VERSION")
                .unwrap_or("unknown")
                .to_string(),
            os: std::env::consts::OS.to_string(),
            arch: std::env::consts::ARCH.to_string(),
            loaded_libraries: read_loaded_libraries(),
        }
    }
}

fn read_loaded_libraries() -> BTreeMap<String, String> {
    std::fs::read_to_string("/proc/self/maps")
        .map(|maps| parse_loaded_libraries(&maps))
        .unwrap_or_default()
}

/// Extract distinct shared-object names and versions from the mapping
/// table. Lines look like
/// `7f1c.. r-xp 00000000 08:01 131 /usr/lib/libssl.so.3`.
fn parse_loaded_libraries(maps: &str) -> BTreeMap<String, String> {
    let mut libraries = BTreeMap::new();

    for line in maps.lines() {
        let Some(path) = line.split_whitespace().last().filter(|p| p.starts_with('/')) else {
            continue;
        };
        let Some(basename) = path.rsplit('/').next() else {
            continue;
        };
        let Some((name, rest)) = basename.split_once(".so") else {
            continue;
        };

        let version = rest.strip_prefix('.').unwrap_or("").to_string();
        libraries.insert(name.to_string(), version);
    }

    libraries
}
