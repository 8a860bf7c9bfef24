//! Diagnostic sink injected into the encoder and decoder.
//!
//! The codec never prints on its own. Callers hand it a [`DebugSink`] and
//! decide where trace text goes; [`NoopSink`] discards everything.

use std::fmt;
use std::sync::Arc;

/// Receives free-form trace text from the codec.
pub trait DebugSink: Send + Sync {
    fn debug(&self, text: &str);

    /// Returning `false` lets callers skip formatting entirely.
    fn enabled(&self) -> bool {
        true
    }
}

/// Discards all trace text.
#[derive(Debug, Default, Clone, Copy)]
pub struct NoopSink;

impl DebugSink for NoopSink {
    #[inline(always)]
    fn debug(&self, _text: &str) {}

    #[inline(always)]
    fn enabled(&self) -> bool {
        false
    }
}

/// Forwards trace text to `tracing` at debug level.
#[derive(Debug, Default, Clone, Copy)]
pub struct TracingSink;

impl DebugSink for TracingSink {
    fn debug(&self, text: &str) {
        tracing::debug!(target: "tlvtree", "{}", text);
    }

    fn enabled(&self) -> bool {
        tracing::enabled!(target: "tlvtree", tracing::Level::DEBUG)
    }
}

impl<F> DebugSink for F
where
    F: Fn(&str) + Send + Sync,
{
    fn debug(&self, text: &str) {
        self(text)
    }
}

/// Shared handle stored by codec types.
pub type SharedSink = Arc<dyn DebugSink>;

pub(crate) fn noop() -> SharedSink {
    Arc::new(NoopSink)
}

/// Static messages are passed through without allocating.
#[inline]
pub(crate) fn emit(sink: &dyn DebugSink, args: fmt::Arguments<'_>) {
    if !sink.enabled() {
        return;
    }
    match args.as_str() {
        Some(s) => sink.debug(s),
        None => sink.debug(&args.to_string()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Mutex;

    #[test]
    fn test_closure_sink_receives_text() {
        let lines = Arc::new(Mutex::new(Vec::<String>::new()));
        let captured = Arc::clone(&lines);
        let sink = move |text: &str| captured.lock().unwrap().push(text.to_owned());

        emit(&sink, format_args!("tag {}", 7));
        emit(&sink, format_args!("static"));

        let lines = lines.lock().unwrap();
        assert_eq!(lines.as_slice(), ["tag 7", "static"]);
    }

    #[test]
    fn test_noop_sink_is_silent() {
        assert!(!NoopSink.enabled());
        NoopSink.debug("ignored");
        emit(&NoopSink, format_args!("{}", 1));
    }
}
