/// Diagnostic output capability.
///
/// The engine reports failures and end-of-stream events through this seam
/// instead of logging directly, so embedders decide where driver chatter
/// goes.
pub trait Diagnostics: Send {
    fn log(&self, message: &str);
}

/// `Diagnostics` adapter that forwards to the `log` facade at debug level.
#[derive(Debug, Default, Clone, Copy)]
pub struct LogDiagnostics;

impl Diagnostics for LogDiagnostics {
    fn log(&self, message: &str) {
        log::debug!(target: "wav", "{}", message);
    }
}
