//! Panic reporting adapter
//!
//! Publishes process panics through the normal publish path. Chains
//! with the previously installed panic hook so default behavior (stderr
//! output) is preserved.

use std::backtrace::Backtrace;

use faultline_core::config::Settings;
use faultline_core::event::ExceptionInfo;

use crate::reporter::Reporter;

/// Install a panic hook that reports panics as error events.
///
/// Delivery runs to completion on a dedicated thread before the
/// previous hook is invoked, so a report is attempted even when the
/// process is about to abort.
pub fn install_panic_reporter(settings: Settings) {
    let previous_hook = std::panic::take_hook();

    std::panic::set_hook(Box::new(move |panic_info| {
        let message = if let Some(text) = panic_info.payload().downcast_ref::<&str>() {
            text.to_string()
        } else if let Some(text) = panic_info.payload().downcast_ref::<String>() {
            text.clone()
        } else {
            "Unknown panic".to_string()
        };

        let location = panic_info
            .location()
            .map(|location| (location.file().to_string(), location.line()));
        let backtrace = Backtrace::force_capture().to_string();
        let exception = ExceptionInfo::from_panic(
            &message,
            location.as_ref().map(|(file, line)| (file.as_str(), *line)),
            &backtrace,
        );

        publish_blocking(settings.clone(), exception);
        previous_hook(panic_info);
    }));
}

/// Run the async publish path to completion from panic context, which
/// is synchronous and may be outside any runtime.
fn publish_blocking(settings: Settings, exception: ExceptionInfo) {
    let handle = std::thread::Builder::new()
        .name("faultline-panic".to_string())
        .spawn(move || {
            match tokio::runtime::Builder::new_current_thread()
                .enable_all()
                .build()
            {
                Ok(runtime) => runtime.block_on(Reporter::publish(settings, exception)),
                Err(error) => eprintln!("Failed to report panic: {error}"),
            }
        });

    match handle {
        Ok(handle) => {
            let _ = handle.join();
        }
        Err(error) => eprintln!("Failed to report panic: {error}"),
    }
}
