//! Faultline Core - event model, filtering and payload construction
//!
//! This crate contains the framework-agnostic half of the Faultline error
//! reporter:
//! - **Configuration** - `Settings` (the host application's configuration
//!   mapping) and its resolution into an immutable `ReporterConfig`
//! - **Filtering** - `FilterRule` / `FilterSet` for redacting sensitive
//!   keys before transmission
//! - **Event model** - `ExceptionInfo`, `Frame`, `RequestSnapshot` and
//!   `ErrorEvent`
//! - **Payload construction** - the pure document builder that turns an
//!   event into the JSON body sent over the wire
//!
//! Nothing in this crate performs network I/O. The capture hooks and the
//! HTTP transport live in `faultline-reporter`.

pub mod config;
pub mod event;
pub mod filter;
pub mod payload;
pub mod request;
pub mod runtime_info;

pub use config::{ReporterConfig, Settings, ValidationError};
pub use event::{ErrorEvent, ExceptionInfo, Frame};
pub use filter::{FilterRule, FilterSet, REDACTED};
pub use payload::{build_payload, minimal_payload, CLIENT_NAME, PROTOCOL_VERSION};
pub use request::{RequestSnapshot, RequestSnapshotBuilder};
pub use runtime_info::RuntimeInfo;
