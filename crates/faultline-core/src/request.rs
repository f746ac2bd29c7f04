//! Per-request context snapshot
//!
//! The host adapter builds a [`RequestSnapshot`] from whatever request
//! type its framework uses and passes it explicitly into the capture
//! hooks. The reporter never reaches into ambient or thread-local
//! request state.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// A snapshot of the request being handled when an error occurred.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RequestSnapshot {
    pub url: String,
    pub method: String,
    pub remote_ip: Option<String>,
    /// Name of the handler that processed the request, if the host
    /// framework exposes one.
    pub action: Option<String>,
    pub headers: BTreeMap<String, String>,
    /// Form fields, multi-valued.
    pub form: BTreeMap<String, Vec<String>>,
    /// Uploaded file names per form field.
    pub files: BTreeMap<String, Vec<String>>,
    pub session: Map<String, Value>,
    /// Raw request body, included in parameters when JSON-typed.
    pub body: Option<Vec<u8>>,
}

impl RequestSnapshot {
    pub fn builder(method: impl Into<String>, url: impl Into<String>) -> RequestSnapshotBuilder {
        RequestSnapshotBuilder {
            snapshot: RequestSnapshot {
                method: method.into(),
                url: url.into(),
                ..Default::default()
            },
        }
    }

    /// Header lookup by case-insensitive name.
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers
            .iter()
            .find(|(key, _)| key.eq_ignore_ascii_case(name))
            .map(|(_, value)| value.as_str())
    }

    /// Cookies parsed out of the `Cookie` header.
    pub fn cookies(&self) -> BTreeMap<String, String> {
        let Some(header) = self.header("cookie") else {
            return BTreeMap::new();
        };

        header
            .split(';')
            .filter_map(|pair| {
                let (name, value) = pair.split_once('=')?;
                let name = name.trim();
                if name.is_empty() {
                    return None;
                }
                Some((name.to_string(), value.trim().to_string()))
            })
            .collect()
    }

    /// Whether the request body declares a JSON content type.
    pub fn is_json(&self) -> bool {
        self.header("content-type")
            .is_some_and(|value| value.to_ascii_lowercase().contains("application/json"))
    }
}

/// Builder for [`RequestSnapshot`], for host adapters assembling the
/// snapshot field by field.
#[derive(Debug, Clone)]
pub struct RequestSnapshotBuilder {
    snapshot: RequestSnapshot,
}

impl RequestSnapshotBuilder {
    pub fn remote_ip(mut self, ip: impl Into<String>) -> Self {
        self.snapshot.remote_ip = Some(ip.into());
        self
    }

    pub fn action(mut self, action: impl Into<String>) -> Self {
        self.snapshot.action = Some(action.into());
        self
    }

    pub fn header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.snapshot.headers.insert(name.into(), value.into());
        self
    }

    pub fn form_field(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.snapshot
            .form
            .entry(name.into())
            .or_default()
            .push(value.into());
        self
    }

    pub fn file(mut self, field: impl Into<String>, filename: impl Into<String>) -> Self {
        self.snapshot
            .files
            .entry(field.into())
            .or_default()
            .push(filename.into());
        self
    }

    pub fn session_value(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.snapshot.session.insert(key.into(), value.into());
        self
    }

    pub fn body(mut self, body: impl Into<Vec<u8>>) -> Self {
        self.snapshot.body = Some(body.into());
        self
    }

    pub fn build(self) -> RequestSnapshot {
        self.snapshot
    }
}
