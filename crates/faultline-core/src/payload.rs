//! Payload construction
//!
//! Pure assembly of the JSON document sent to the tracking service.
//! Filtering is applied independently to each data class here, never
//! earlier, so a snapshot can be captured cheaply and redacted once.
//!
//! Construction never fails outward: if any section cannot be built,
//! the result degrades to a minimal payload carrying only the exception
//! itself.

use std::collections::BTreeMap;

use serde_json::{json, Map, Value};
use thiserror::Error;
use tracing::warn;

use crate::config::{ReporterConfig, Settings};
use crate::event::ErrorEvent;
use crate::request::RequestSnapshot;
use crate::runtime_info::RuntimeInfo;

/// Client name reported in the payload's `client` block.
pub const CLIENT_NAME: &str = "faultline";

/// Wire protocol revision; version 5 introduced deflate compression.
pub const PROTOCOL_VERSION: u32 = 5;

/// Key under which an unparseable JSON body is reported verbatim.
const INVALID_JSON_KEY: &str = "INVALID_JSON";

#[derive(Debug, Error)]
pub enum PayloadError {
    #[error("request body is not valid UTF-8: {0}")]
    BodyEncoding(#[from] std::str::Utf8Error),
}

/// Build the full payload document for an event.
///
/// On failure the error is logged and a [`minimal_payload`] is returned
/// instead; the caller always receives something transmittable.
pub fn build_payload(event: &ErrorEvent, config: &ReporterConfig, settings: &Settings) -> Value {
    match try_build(event, config, settings) {
        Ok(payload) => payload,
        Err(error) => {
            warn!(
                event_id = %event.id,
                error = %error,
                "Payload construction failed, sending minimal report"
            );
            minimal_payload(event)
        }
    }
}

/// The degraded document: exception class, message and backtrace only.
pub fn minimal_payload(event: &ErrorEvent) -> Value {
    json!({
        "client": client_block(),
        "exception": exception_block(event),
    })
}

fn try_build(
    event: &ErrorEvent,
    config: &ReporterConfig,
    settings: &Settings,
) -> Result<Value, PayloadError> {
    let request = event
        .request
        .as_ref()
        .map(|snapshot| request_block(snapshot, config))
        .transpose()?;

    Ok(json!({
        "application_environment": application_environment(config, settings),
        "client": client_block(),
        "request": request,
        "exception": exception_block(event),
        "context": event.context,
    }))
}

fn client_block() -> Value {
    json!({
        "name": CLIENT_NAME,
        "version": env!("CARGO_PKG_VERSION"),
        "protocol_version": PROTOCOL_VERSION,
    })
}

fn exception_block(event: &ErrorEvent) -> Value {
    let backtrace: Vec<String> = event
        .exception
        .frames
        .iter()
        .map(|frame| frame.render())
        .collect();

    json!({
        "occurred_at": event.occurred_at_zulu(),
        "exception_class": event.exception.class,
        "message": event.exception.message,
        "backtrace": backtrace,
    })
}

/// The merged application and process environment.
///
/// Application settings keep their keys; process environment entries are
/// prefixed with `os.`. Every value is coerced to a string because the
/// transport schema mandates a homogeneous string map, then the
/// environment filter is applied.
fn application_environment(config: &ReporterConfig, settings: &Settings) -> Value {
    let mut env: BTreeMap<String, String> = settings
        .iter()
        .map(|(key, value)| (key.clone(), coerce_to_string(value)))
        .collect();

    for (key, value) in std::env::vars() {
        env.insert(format!("os.{key}"), value);
    }

    let env = config.environment_filter.redact_strings(&env);
    let runtime = RuntimeInfo::collect();
    let root_directory = std::env::current_dir()
        .map(|path| path.display().to_string())
        .unwrap_or_default();

    json!({
        "framework": config.framework,
        "env": env,
        "language": runtime.language,
        "language_version": runtime.language_version,
        "os": runtime.os,
        "arch": runtime.arch,
        "application_root_directory": root_directory,
        "loaded_libraries": runtime.loaded_libraries,
    })
}

fn coerce_to_string(value: &Value) -> String {
    match value {
        Value::String(text) => text.clone(),
        other => other.to_string(),
    }
}

fn request_block(
    snapshot: &RequestSnapshot,
    config: &ReporterConfig,
) -> Result<Value, PayloadError> {
    let parameters = request_parameters(snapshot, config)?;

    let cookies = snapshot.cookies();
    let cookies = config.header_filter.redact_strings(&cookies);

    let mut headers = snapshot.headers.clone();
    if !cookies.is_empty() {
        // Re-serialize the redacted cookies into the emitted header so
        // the raw values cannot leak through the Cookie header.
        let cookie_key = headers
            .keys()
            .find(|key| key.eq_ignore_ascii_case("cookie"))
            .cloned();
        if let Some(key) = cookie_key {
            headers.insert(key, render_cookies(&cookies));
        }
    }
    let headers = config.header_filter.redact_strings(&headers);

    let session = config.session_filter.redact(&snapshot.session);

    Ok(json!({
        "url": snapshot.url,
        "request_method": snapshot.method,
        "remote_ip": snapshot.remote_ip,
        "action": snapshot.action,
        "parameters": parameters,
        "headers": headers,
        "cookies": cookies,
        "session": session,
    }))
}

/// Merge the JSON body (top level only), form fields and uploaded file
/// names into one parameter map, then apply the parameter filter.
///
/// Filtering inside nested body structures is deliberately not applied;
/// only top-level keys are matched.
fn request_parameters(
    snapshot: &RequestSnapshot,
    config: &ReporterConfig,
) -> Result<Map<String, Value>, PayloadError> {
    let mut parameters = Map::new();

    if let (Some(body), true) = (&snapshot.body, snapshot.is_json()) {
        let text = std::str::from_utf8(body)?;
        match serde_json::from_str::<Value>(text) {
            Ok(Value::Object(object)) => parameters.extend(object),
            Ok(other) => {
                parameters.insert("body".to_string(), other);
            }
            Err(_) => {
                parameters.insert(INVALID_JSON_KEY.to_string(), Value::String(text.to_string()));
            }
        }
    }

    for (name, values) in &snapshot.form {
        parameters.insert(name.clone(), flatten(values));
    }
    for (field, filenames) in &snapshot.files {
        parameters.insert(field.clone(), flatten(filenames));
    }

    Ok(config.parameter_filter.redact(&parameters))
}

/// Single-valued fields collapse to a string, repeated fields stay a
/// list.
fn flatten(values: &[String]) -> Value {
    match values {
        [single] => Value::String(single.clone()),
        many => json!(many),
    }
}

fn render_cookies(cookies: &BTreeMap<String, String>) -> String {
    cookies
        .iter()
        .map(|(name, value)| format!("{name}={value}"))
        .collect::<Vec<_>>()
        .join("; ")
}
