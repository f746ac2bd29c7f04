//! Captured exception occurrences
//!
//! An [`ErrorEvent`] is assembled inside the capture hook, serialized,
//! transmitted and discarded. Nothing here is ever persisted.

use chrono::{DateTime, SecondsFormat, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use uuid::Uuid;

use crate::request::RequestSnapshot;

/// One backtrace frame, innermost first.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Frame {
    pub file: String,
    pub line: u32,
    pub function: String,
}

impl Frame {
    pub fn new(file: impl Into<String>, line: u32, function: impl Into<String>) -> Self {
        Self {
            file: file.into(),
            line,
            function: function.into(),
        }
    }

    /// Render the frame in the wire format.
    pub fn render(&self) -> String {
        format!("File \"{}\", line {}, in {}", self.file, self.line, self.function)
    }
}

/// The exception half of an event: class name, message and backtrace.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExceptionInfo {
    pub class: String,
    pub message: String,
    pub frames: Vec<Frame>,
}

impl ExceptionInfo {
    pub fn new(class: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            class: class.into(),
            message: message.into(),
            frames: Vec::new(),
        }
    }

    /// Attach backtrace frames, innermost first.
    pub fn with_frames(mut self, frames: Vec<Frame>) -> Self {
        self.frames = frames;
        self
    }

    /// Build exception info from any error value. The class name is the
    /// error's type name with module path segments stripped.
    pub fn from_error<E: std::error::Error>(error: &E) -> Self {
        Self::new(short_type_name(std::any::type_name::<E>()), error.to_string())
    }

    /// Build exception info from panic hook data. The panic location
    /// becomes the innermost frame; `backtrace` is the rendered output
    /// of `std::backtrace::Backtrace`.
    pub fn from_panic(message: &str, location: Option<(&str, u32)>, backtrace: &str) -> Self {
        let mut frames = parse_backtrace(backtrace);
        if let Some((file, line)) = location {
            frames.insert(0, Frame::new(file, line, "panic"));
        }
        Self::new("Panic", message).with_frames(frames)
    }

    /// Build exception info with frames parsed from a captured
    /// `std::backtrace::Backtrace` rendering.
    pub fn with_backtrace(self, backtrace: &str) -> Self {
        let frames = parse_backtrace(backtrace);
        self.with_frames(frames)
    }
}

/// Strip module path segments from a type name. Generic types keep
/// their full rendering since the bracket contents carry meaning.
fn short_type_name(name: &str) -> &str {
    if name.contains('<') {
        return name;
    }
    name.rsplit("::").next().unwrap_or(name)
}

/// Parse the text rendering of `std::backtrace::Backtrace` into frames.
///
/// The renderer emits one `N: symbol` line per frame, optionally
/// followed by an indented `at path:line:column` line. Frames without a
/// source location (no debug info) are dropped.
fn parse_backtrace(backtrace: &str) -> Vec<Frame> {
    let mut frames = Vec::new();
    let mut pending: Option<String> = None;

    for line in backtrace.lines() {
        let trimmed = line.trim();

        if let Some(location) = trimmed.strip_prefix("at ") {
            if let Some(function) = pending.take() {
                if let Some((file, line)) = split_location(location) {
                    frames.push(Frame::new(file, line, function));
                }
            }
            continue;
        }

        pending = trimmed
            .split_once(": ")
            .filter(|(index, _)| index.chars().all(|c| c.is_ascii_digit()))
            .map(|(_, symbol)| symbol.to_string());
    }

    frames
}

/// Split `path:line:column` into path and line, tolerating a missing
/// column.
fn split_location(location: &str) -> Option<(&str, u32)> {
    let mut parts = location.rsplitn(3, ':');
    let last = parts.next()?;
    let middle = parts.next();
    let rest = parts.next();

    match (rest, middle) {
        // path:line:column
        (Some(path), Some(line)) if last.parse::<u32>().is_ok() => {
            Some((path, line.parse().ok()?))
        }
        // path:line
        (None, Some(path)) => Some((path, last.parse().ok()?)),
        _ => None,
    }
}

/// A single captured occurrence plus its context.
///
/// The `id` is a local correlation handle for log lines; it is not part
/// of the transmitted payload.
#[derive(Debug, Clone)]
pub struct ErrorEvent {
    pub id: Uuid,
    pub occurred_at: DateTime<Utc>,
    pub exception: ExceptionInfo,
    pub request: Option<RequestSnapshot>,
    pub context: Option<Value>,
}

impl ErrorEvent {
    pub fn new(exception: ExceptionInfo) -> Self {
        Self {
            id: Uuid::new_v4(),
            occurred_at: Utc::now(),
            exception,
            request: None,
            context: None,
        }
    }

    pub fn with_request(mut self, request: RequestSnapshot) -> Self {
        self.request = Some(request);
        self
    }

    /// Attach extra context data supplied by the host, transmitted
    /// verbatim in the payload's `context` field.
    pub fn with_context(mut self, context: Value) -> Self {
        self.context = Some(context);
        self
    }

    /// The occurrence timestamp as UTC ISO-8601 with a `Z` suffix.
    pub fn occurred_at_zulu(&self) -> String {
        self.occurred_at.to_rfc3339_opts(SecondsFormat::Micros, true)
    }
}
