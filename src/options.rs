//! Caller-supplied decode configuration and the injected diagnostics
//! sink that replaces the source's process-wide tracer (§5, §9).
use crate::tree::Severity;

/// Receives a structured notification for every anomaly the decoder
/// recovers from, in addition to that anomaly's [`crate::tree::Message`]
/// node. Unlike the output tree, the sink is fire-and-forget and is
/// useful for wiring into [`log`] or an external metrics pipeline.
pub trait DiagnosticsSink {
    fn report(&self, severity: Severity, message: &str);
}

/// The default sink: discards everything.
pub struct NoopSink;

impl DiagnosticsSink for NoopSink {
    fn report(&self, _severity: Severity, _message: &str) {}
}

/// A sink that forwards to the `log` crate at a level matching severity.
pub struct LogSink;

impl DiagnosticsSink for LogSink {
    fn report(&self, severity: Severity, message: &str) {
        match severity {
            Severity::Err => log::error!("{message}"),
            Severity::Warn => log::warn!("{message}"),
            Severity::Ok => log::trace!("{message}"),
        }
    }
}

static NOOP: NoopSink = NoopSink;

/// Per-invocation configuration. Replaces the source's global verbose /
/// filter flags (§9's "Global mutable state" note).
pub struct DecodeOptions<'a> {
    /// Sanity cap on FSPEC bytes per record (§4.H point 1). Spec-recommended
    /// default is 8.
    pub fspec_byte_cap: u8,
    /// When set, a record that leaves trailing bytes in its block's payload
    /// (§7's `TrailingBytes`) is reported at `Severity::Err` instead of the
    /// default `Severity::Warn`. The decoder still continues with the next
    /// block either way — this only affects the severity a renderer sees.
    pub trailing_bytes_is_error: bool,
    pub sink: &'a dyn DiagnosticsSink,
}

impl<'a> DecodeOptions<'a> {
    pub fn new(sink: &'a dyn DiagnosticsSink) -> Self {
        Self { fspec_byte_cap: 8, trailing_bytes_is_error: false, sink }
    }
}

impl<'a> Default for DecodeOptions<'a> {
    fn default() -> Self {
        Self { fspec_byte_cap: 8, trailing_bytes_is_error: false, sink: &NOOP }
    }
}
