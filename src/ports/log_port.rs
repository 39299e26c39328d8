//! Human-readable log sink port trait.

/// Ordered, timestamped line sink.
///
/// The core pushes one line (or one multi-line block, for trade detail)
/// per significant event. Plain text only; this is a UI/operator feed,
/// not a structured event bus.
pub trait LogSink: Send + Sync {
    fn log(&self, component: &str, message: &str);
}
