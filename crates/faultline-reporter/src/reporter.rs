//! The Reporter handle and its capture entry points
//!
//! All capture paths are non-fatal: internal functions return `Result`,
//! and failures are converted to `tracing::warn!` logs here at the hook
//! boundary. The original error being reported always continues to
//! propagate through the host framework untouched.

use std::sync::Arc;

use anyhow::Context;
use tracing::{debug, warn};

use faultline_core::config::{ReporterConfig, Settings};
use faultline_core::event::{ErrorEvent, ExceptionInfo};
use faultline_core::payload::build_payload;
use faultline_core::request::RequestSnapshot;

use crate::endpoint::Endpoint;
use crate::extensions::Extensions;
use crate::transport::Transport;

/// Message sent by the connectivity test event.
const TEST_MESSAGE: &str =
    "Congratulations, your application is configured for Faultline error tracking.";

/// One reporter instance, bound to a host application.
///
/// Configuration and endpoint are resolved once at construction and
/// never change; the handle is safe to share across concurrent request
/// handlers.
pub struct Reporter {
    config: Arc<ReporterConfig>,
    settings: Settings,
    endpoint: Endpoint,
    transport: Transport,
}

impl Reporter {
    /// Create a reporter from the host application's settings.
    ///
    /// Configuration problems (including a missing API key) are logged
    /// as warnings here, once, and never fail construction.
    pub fn new(settings: Settings) -> Self {
        let (config, warnings) = ReporterConfig::resolve(&settings);
        for warning in &warnings {
            warn!(%warning, "Reporter configuration problem");
        }

        let endpoint = Endpoint::resolve(&config);
        if endpoint.is_disabled() {
            debug!("Error reporting is disabled for this configuration");
        }

        Self {
            config: Arc::new(config),
            settings,
            endpoint,
            transport: Transport::new(),
        }
    }

    /// Install a reporter into the application's extension storage.
    ///
    /// Installing twice against the same application is not an error:
    /// the repeat attempt logs one warning and the existing instance is
    /// returned unchanged.
    pub fn install(extensions: &mut Extensions, settings: Settings) -> Arc<Reporter> {
        if let Some(existing) = extensions.get::<Arc<Reporter>>() {
            warn!("Repeated reporter initialization attempt, keeping the existing instance");
            return Arc::clone(existing);
        }

        let reporter = Arc::new(Reporter::new(settings));
        extensions.insert(Arc::clone(&reporter));
        reporter
    }

    pub fn config(&self) -> &ReporterConfig {
        &self.config
    }

    pub fn endpoint(&self) -> &Endpoint {
        &self.endpoint
    }

    /// Report an unhandled exception, with the request snapshot when one
    /// exists. Called from the host framework's exception hook; never
    /// fails and never blocks exception propagation.
    pub async fn capture_error(&self, exception: ExceptionInfo, request: Option<RequestSnapshot>) {
        let mut event = ErrorEvent::new(exception);
        if let Some(snapshot) = request {
            event = event.with_request(snapshot);
        }
        self.capture(event).await;
    }

    /// Report a fully assembled event (for hosts attaching context
    /// data).
    pub async fn capture_event(&self, event: ErrorEvent) {
        self.capture(event).await;
    }

    /// Report a response whose status code is in the tracked set.
    /// Untracked codes return immediately. Called from the host
    /// framework's after-response hook.
    pub async fn capture_response(&self, status: u16, request: RequestSnapshot) {
        if !self.config.tracks_code(status) {
            return;
        }

        let reason = reqwest::StatusCode::from_u16(status)
            .ok()
            .and_then(|code| code.canonical_reason())
            .unwrap_or("Unknown Status");
        let exception = ExceptionInfo::new("HttpError", format!("HTTP {status} {reason}"));

        self.capture(ErrorEvent::new(exception).with_request(request)).await;
    }

    /// One-shot reporting for errors outside any request context, e.g.
    /// from a background job. Best-effort, like the capture hooks.
    pub async fn publish(settings: Settings, exception: ExceptionInfo) {
        Reporter::new(settings).capture_error(exception, None).await;
    }

    /// Verify the configuration by sending a synthetic test event.
    ///
    /// Unlike the capture hooks this bypasses the debug-mode skip and
    /// surfaces the transport result, so a caller can check
    /// connectivity interactively.
    pub async fn test(settings: Settings) -> anyhow::Result<()> {
        let (config, warnings) = ReporterConfig::resolve(&settings);
        for warning in &warnings {
            warn!(%warning, "Reporter configuration problem");
        }
        anyhow::ensure!(config.api_key.is_some(), "API_KEY is not configured");

        let endpoint = Endpoint::resolve_for_test(&config);
        let backtrace = std::backtrace::Backtrace::force_capture();
        let exception =
            ExceptionInfo::new("ConfigurationTest", TEST_MESSAGE).with_backtrace(&backtrace.to_string());
        let event = ErrorEvent::new(exception);
        let payload = build_payload(&event, &config, &settings);

        Transport::new()
            .send(&endpoint, &payload)
            .await
            .context("connectivity test failed")?;
        Ok(())
    }

    /// Deliver one event: skip when disabled, otherwise build the
    /// payload and send, discarding any failure with a warning.
    async fn capture(&self, event: ErrorEvent) {
        if self.endpoint.is_disabled() {
            debug!(event_id = %event.id, "Skipping error report, endpoint disabled");
            return;
        }

        let payload = build_payload(&event, &self.config, &self.settings);
        if let Err(error) = self.transport.send(&self.endpoint, &payload).await {
            warn!(
                event_id = %event.id,
                error = %error,
                "Failed to deliver error report"
            );
        }
    }
}
