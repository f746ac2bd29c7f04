//! Configuration resolution for the Faultline reporter.
//!
//! The host application hands over its configuration mapping as a
//! [`Settings`] value (built programmatically or loaded from a YAML
//! file). [`ReporterConfig::resolve`] turns it into an immutable,
//! share-safe configuration once at initialization. Resolution never
//! fails: every problem becomes a [`ValidationError`] that the caller
//! logs as a warning at startup.

use std::collections::BTreeSet;
use std::path::Path;

use serde_json::{Map, Value};
use url::Url;

use crate::filter::{FilterRule, FilterSet};

/// Configuration keys consumed from the host application's settings.
pub mod keys {
    /// API key identifying the tracking account. Missing key produces a
    /// startup warning and reporting becomes a no-op.
    pub const API_KEY: &str = "API_KEY";
    /// Alternate endpoint used while the application runs in debug mode.
    pub const DEBUG_URL: &str = "DEBUG_URL";
    /// Override for the production API base URL (self-hosted deployments).
    pub const API_URL: &str = "API_URL";
    /// Response status codes that trigger reporting without an exception.
    pub const HTTP_CODES: &str = "HTTP_CODES";
    /// Filter list for request parameters.
    pub const PARAMETER_FILTER: &str = "PARAMETER_FILTER";
    /// Filter list for the merged application/process environment.
    pub const ENVIRONMENT_FILTER: &str = "ENVIRONMENT_FILTER";
    /// Filter list for session contents.
    pub const SESSION_FILTER: &str = "SESSION_FILTER";
    /// Filter list for HTTP headers and cookies.
    pub const HEADER_FILTER: &str = "HEADER_FILTER";
    /// Host framework debug flag.
    pub const DEBUG: &str = "DEBUG";
    /// Label for the host framework, reported in the payload.
    pub const FRAMEWORK: &str = "FRAMEWORK";
}

/// Default production endpoint for the Faultline API.
pub const DEFAULT_API_URL: &str = "https://api.faultline.dev/api/errors";

/// Environment keys filtered when no `ENVIRONMENT_FILTER` is configured.
const DEFAULT_ENVIRONMENT_FILTER: &[&str] = &["SECRET_KEY"];

/// Conventional 4xx client-error codes tracked when `HTTP_CODES` is
/// absent.
fn default_http_codes() -> BTreeSet<u16> {
    let mut codes: BTreeSet<u16> = (400..=418).collect();
    codes.extend([421, 422, 423, 424, 425, 426, 428, 429, 431, 451]);
    codes
}

/// A single non-fatal problem found while resolving the configuration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidationError {
    /// The offending configuration key, e.g. `"PARAMETER_FILTER"`.
    pub field: String,
    /// Human-readable explanation.
    pub message: String,
}

impl std::fmt::Display for ValidationError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}: {}", self.field, self.message)
    }
}

// ---------------------------------------------------------------------------
// Settings
// ---------------------------------------------------------------------------

/// The host application's configuration mapping.
///
/// A thin wrapper over a string-keyed JSON object so that hosts with any
/// configuration system can hand their values over without conversion
/// ceremony.
#[derive(Debug, Clone, Default)]
pub struct Settings {
    values: Map<String, Value>,
}

impl Settings {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_map(values: Map<String, Value>) -> Self {
        Self { values }
    }

    /// Builder-style insertion.
    pub fn with(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.values.insert(key.into(), value.into());
        self
    }

    pub fn set(&mut self, key: impl Into<String>, value: impl Into<Value>) {
        self.values.insert(key.into(), value.into());
    }

    pub fn get(&self, key: &str) -> Option<&Value> {
        self.values.get(key)
    }

    pub fn contains(&self, key: &str) -> bool {
        self.values.contains_key(key)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&String, &Value)> {
        self.values.iter()
    }

    /// The host framework debug flag, `false` when absent.
    pub fn debug(&self) -> bool {
        self.get(keys::DEBUG).and_then(Value::as_bool).unwrap_or(false)
    }

    /// Load settings from a YAML mapping at `path`.
    pub fn load(path: &Path) -> anyhow::Result<Self> {
        let content = std::fs::read_to_string(path)?;
        let values: Map<String, Value> = serde_yaml::from_str(&content)?;
        Ok(Self { values })
    }

    /// Try to load from `path`; fall back to empty settings on any error.
    pub fn load_or_default(path: &Path) -> Self {
        Self::load(path).unwrap_or_default()
    }
}

// ---------------------------------------------------------------------------
// ReporterConfig
// ---------------------------------------------------------------------------

/// Immutable reporter configuration, resolved once at initialization.
///
/// Safe for concurrent read access; nothing mutates it after
/// [`ReporterConfig::resolve`] returns.
#[derive(Debug, Clone)]
pub struct ReporterConfig {
    pub api_key: Option<String>,
    pub api_url: String,
    pub debug_url: Option<String>,
    pub debug: bool,
    pub http_codes: BTreeSet<u16>,
    pub parameter_filter: FilterSet,
    pub environment_filter: FilterSet,
    pub session_filter: FilterSet,
    pub header_filter: FilterSet,
    pub framework: String,
}

impl Default for ReporterConfig {
    fn default() -> Self {
        Self {
            api_key: None,
            api_url: DEFAULT_API_URL.to_string(),
            debug_url: None,
            debug: false,
            http_codes: default_http_codes(),
            parameter_filter: FilterSet::empty(),
            environment_filter: default_environment_filter(),
            session_filter: FilterSet::empty(),
            header_filter: FilterSet::empty(),
            framework: "rust".to_string(),
        }
    }
}

fn default_environment_filter() -> FilterSet {
    FilterSet::new(
        DEFAULT_ENVIRONMENT_FILTER
            .iter()
            .map(|name| FilterRule::literal(*name))
            .collect(),
    )
}

impl ReporterConfig {
    /// Resolve the host settings into a reporter configuration.
    ///
    /// Never fails. Problems (missing API key, malformed filter
    /// patterns, invalid URLs or status codes) are returned as
    /// [`ValidationError`]s for the caller to log once at startup;
    /// offending entries are skipped and the rest of the configuration
    /// stands.
    pub fn resolve(settings: &Settings) -> (Self, Vec<ValidationError>) {
        let mut warnings = Vec::new();
        let mut config = Self {
            debug: settings.debug(),
            ..Self::default()
        };

        match settings.get(keys::API_KEY) {
            Some(value) => match value.as_str() {
                Some(key) if !key.is_empty() => config.api_key = Some(key.to_string()),
                _ => warnings.push(ValidationError {
                    field: keys::API_KEY.into(),
                    message: format!("not a usable API key: {value}"),
                }),
            },
            None => warnings.push(ValidationError {
                field: keys::API_KEY.into(),
                message: "missing; error reporting is disabled".into(),
            }),
        }

        if let Some(value) = settings.get(keys::API_URL) {
            match value.as_str().map(|s| (s, Url::parse(s))) {
                Some((s, Ok(_))) => config.api_url = s.to_string(),
                _ => warnings.push(ValidationError {
                    field: keys::API_URL.into(),
                    message: format!("not a valid URL: {value}"),
                }),
            }
        }

        if let Some(value) = settings.get(keys::DEBUG_URL) {
            match value.as_str().map(|s| (s, Url::parse(s))) {
                Some((s, Ok(_))) => config.debug_url = Some(s.to_string()),
                _ => warnings.push(ValidationError {
                    field: keys::DEBUG_URL.into(),
                    message: format!("not a valid URL: {value}"),
                }),
            }
        }

        if let Some(value) = settings.get(keys::HTTP_CODES) {
            config.http_codes = resolve_http_codes(value, &mut warnings);
        }

        if let Some(framework) = settings.get(keys::FRAMEWORK).and_then(Value::as_str) {
            config.framework = framework.to_string();
        }

        config.parameter_filter =
            resolve_filter(settings, keys::PARAMETER_FILTER, FilterSet::empty(), &mut warnings);
        config.environment_filter = resolve_filter(
            settings,
            keys::ENVIRONMENT_FILTER,
            default_environment_filter(),
            &mut warnings,
        );
        config.session_filter =
            resolve_filter(settings, keys::SESSION_FILTER, FilterSet::empty(), &mut warnings);
        config.header_filter =
            resolve_filter(settings, keys::HEADER_FILTER, FilterSet::empty(), &mut warnings);

        (config, warnings)
    }

    /// Whether the given response status code should trigger a report.
    pub fn tracks_code(&self, status: u16) -> bool {
        self.http_codes.contains(&status)
    }
}

/// Parse `HTTP_CODES` as a list of status codes, used verbatim instead of
/// the default set.
fn resolve_http_codes(value: &Value, warnings: &mut Vec<ValidationError>) -> BTreeSet<u16> {
    let mut codes = BTreeSet::new();

    let Some(entries) = value.as_array() else {
        warnings.push(ValidationError {
            field: keys::HTTP_CODES.into(),
            message: format!("expected a list of status codes, got {value}"),
        });
        return default_http_codes();
    };

    for entry in entries {
        match entry.as_u64().and_then(|code| u16::try_from(code).ok()) {
            Some(code) => {
                codes.insert(code);
            }
            None => warnings.push(ValidationError {
                field: keys::HTTP_CODES.into(),
                message: format!("ignoring invalid status code {entry}"),
            }),
        }
    }

    codes
}

/// Parse one filter list. Absent key resolves to `default`; malformed
/// pattern entries are reported and skipped so that filtering can never
/// fail at report time.
fn resolve_filter(
    settings: &Settings,
    key: &str,
    default: FilterSet,
    warnings: &mut Vec<ValidationError>,
) -> FilterSet {
    let Some(value) = settings.get(key) else {
        return default;
    };

    let Some(entries) = value.as_array() else {
        warnings.push(ValidationError {
            field: key.into(),
            message: format!("expected a list of filter entries, got {value}"),
        });
        return default;
    };

    let mut rules = Vec::with_capacity(entries.len());
    for entry in entries {
        let Some(source) = entry.as_str() else {
            warnings.push(ValidationError {
                field: key.into(),
                message: format!("ignoring non-string filter entry {entry}"),
            });
            continue;
        };
        match FilterRule::parse(source) {
            Ok(rule) => rules.push(rule),
            Err(error) => warnings.push(ValidationError {
                field: key.into(),
                message: format!("ignoring malformed pattern {source:?}: {error}"),
            }),
        }
    }

    FilterSet::new(rules)
}
