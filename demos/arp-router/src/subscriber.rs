use std::fmt::{Debug, Write};
use std::sync::atomic::{AtomicUsize, Ordering};
use tracing::event::Event;
use tracing::field::{Field, Visit};
use tracing::{span, Id, Level, Metadata, Subscriber};

/// Writes one line per event to stderr, leaving stdout for transmitted frames.
pub struct StderrSubscriber {
    ids: AtomicUsize,
    max_level: Level,
}

impl StderrSubscriber {
    pub fn new(max_level: Level) -> Self {
        StderrSubscriber {
            ids: AtomicUsize::new(1),
            max_level,
        }
    }

    /// Maps `-v` occurrences to a level: warnings by default, then info, debug and trace.
    pub fn with_verbosity(verbosity: u64) -> Self {
        let max_level = match verbosity {
            0 => Level::WARN,
            1 => Level::INFO,
            2 => Level::DEBUG,
            _ => Level::TRACE,
        };
        StderrSubscriber::new(max_level)
    }
}

// https://docs.rs/tracing/0.1.7/tracing/subscriber/trait.Subscriber.html
impl Subscriber for StderrSubscriber {
    fn enabled(&self, metadata: &Metadata) -> bool {
        metadata.level() <= &self.max_level
    }

    fn new_span(&self, _span: &span::Attributes) -> Id {
        let id = self.ids.fetch_add(1, Ordering::SeqCst);
        Id::from_u64(id as u64)
    }

    fn record(&self, _span: &Id, _values: &span::Record) {}

    fn record_follows_from(&self, _span: &Id, _follows: &Id) {}

    fn event(&self, event: &Event) {
        let metadata = event.metadata();
        let mut visitor = LineVisitor::default();
        event.record(&mut visitor);
        eprintln!(
            "{:>5} {}: {}{}",
            metadata.level(),
            metadata.target(),
            visitor.message,
            visitor.fields
        );
    }

    fn enter(&self, _span: &Id) {}

    fn exit(&self, _span: &Id) {}
}

#[derive(Default)]
struct LineVisitor {
    message: String,
    fields: String,
}

impl Visit for LineVisitor {
    fn record_debug(&mut self, field: &Field, value: &dyn Debug) {
        if field.name() == "message" {
            let _ = write!(self.message, "{:?}", value);
        } else {
            let _ = write!(self.fields, " {}={:?}", field.name(), value);
        }
    }

    fn record_str(&mut self, field: &Field, value: &str) {
        if field.name() == "message" {
            self.message.push_str(value);
        } else {
            let _ = write!(self.fields, " {}={}", field.name(), value);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn verbosity_levels() {
        let quiet = StderrSubscriber::with_verbosity(0);
        assert_eq!(quiet.max_level, Level::WARN);
        assert_eq!(StderrSubscriber::with_verbosity(2).max_level, Level::DEBUG);
        assert_eq!(StderrSubscriber::with_verbosity(9).max_level, Level::TRACE);
    }
}
