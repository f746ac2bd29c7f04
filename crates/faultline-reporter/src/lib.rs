//! Faultline Reporter - error tracking extension
//!
//! Forwards unhandled application errors to the Faultline tracking
//! service. The host adapter wires three entry points into its
//! framework:
//! - [`Reporter::capture_error`] from the unhandled-exception hook
//! - [`Reporter::capture_response`] from the after-response hook, for
//!   tracked HTTP status codes
//! - [`Reporter::publish`] for errors outside any request context
//!
//! Reporting is strictly best-effort: a failed delivery is logged and
//! dropped, and never surfaces into the host application's error flow.
//! The only exception is [`Reporter::test`], the interactive
//! connectivity check, which returns the transport result.

pub mod endpoint;
pub mod extensions;
pub mod panic_hook;
pub mod reporter;
pub mod transport;

pub use endpoint::Endpoint;
pub use extensions::Extensions;
pub use panic_hook::install_panic_reporter;
pub use reporter::Reporter;
pub use transport::{Transport, TransportError, SEND_TIMEOUT};
