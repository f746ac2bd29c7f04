//! Transmission target resolution
//!
//! Decides once, from the resolved configuration, where reports go:
//! the production API (compressed), a debug override URL (uncompressed),
//! or nowhere at all. Debug mode without an override URL intentionally
//! drops all events so development noise never reaches the tracking
//! account.

use faultline_core::{ReporterConfig, PROTOCOL_VERSION};

/// Where reports for one reporter instance are sent.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Endpoint {
    /// The production API; payloads are deflate-compressed.
    Production { url: String },
    /// A development override target; payloads are sent uncompressed.
    DebugOverride { url: String },
    /// No transmission at all.
    Disabled,
}

impl Endpoint {
    /// Resolve the endpoint for normal capture operation.
    pub fn resolve(config: &ReporterConfig) -> Self {
        if config.debug {
            match &config.debug_url {
                Some(url) => Self::DebugOverride { url: url.clone() },
                None => Self::Disabled,
            }
        } else {
            match &config.api_key {
                Some(key) => Self::Production {
                    url: production_url(&config.api_url, key),
                },
                None => Self::Disabled,
            }
        }
    }

    /// Resolve the endpoint for the connectivity test, ignoring the
    /// debug flag so the test always attempts transmission.
    pub fn resolve_for_test(config: &ReporterConfig) -> Self {
        match &config.api_key {
            Some(key) => Self::Production {
                url: production_url(&config.api_url, key),
            },
            None => Self::Disabled,
        }
    }

    pub fn is_disabled(&self) -> bool {
        matches!(self, Self::Disabled)
    }

    /// Whether payloads for this target are deflate-compressed.
    pub fn compressed(&self) -> bool {
        matches!(self, Self::Production { .. })
    }

    pub fn url(&self) -> Option<&str> {
        match self {
            Self::Production { url } | Self::DebugOverride { url } => Some(url),
            Self::Disabled => None,
        }
    }
}

fn production_url(api_url: &str, api_key: &str) -> String {
    format!("{api_url}?api_key={api_key}&protocol_version={PROTOCOL_VERSION}")
}
