// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Bounded in-memory log capture.
//!
//! The log-export glue wants the recent log lines without owning stdout, so
//! instead of intercepting the console globally the subscriber is composed
//! with an explicit layer that copies each formatted event into a bounded
//! ring buffer. When the buffer is full the oldest line is dropped.

use std::collections::VecDeque;
use std::fmt::Write as _;
use std::sync::{Arc, Mutex};

use tracing::field::{Field, Visit};
use tracing::{Event, Subscriber};
use tracing_subscriber::layer::{Context, Layer};

/// Shared, bounded, ordered buffer of formatted log lines.
#[derive(Debug, Clone)]
pub struct LogBuffer {
    inner: Arc<Mutex<VecDeque<String>>>,
    capacity: usize,
}

impl LogBuffer {
    /// Default number of retained lines.
    pub const DEFAULT_CAPACITY: usize = 2000;

    pub fn new(capacity: usize) -> Self {
        Self {
            inner: Arc::new(Mutex::new(VecDeque::with_capacity(capacity))),
            capacity: capacity.max(1),
        }
    }

    /// Append a line, evicting the oldest when full.
    pub fn push(&self, line: String) {
        let mut buf = self.inner.lock().expect("log buffer poisoned");
        if buf.len() == self.capacity {
            buf.pop_front();
        }
        buf.push_back(line);
    }

    /// Copy out the buffered lines, oldest first.
    pub fn snapshot(&self) -> Vec<String> {
        self.inner
            .lock()
            .expect("log buffer poisoned")
            .iter()
            .cloned()
            .collect()
    }

    pub fn len(&self) -> usize {
        self.inner.lock().expect("log buffer poisoned").len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// A subscriber layer that feeds this buffer.
    pub fn layer(&self) -> LogBufferLayer {
        LogBufferLayer {
            buffer: self.clone(),
        }
    }
}

impl Default for LogBuffer {
    fn default() -> Self {
        Self::new(Self::DEFAULT_CAPACITY)
    }
}

/// `tracing-subscriber` layer that mirrors events into a [`LogBuffer`].
pub struct LogBufferLayer {
    buffer: LogBuffer,
}

impl<S: Subscriber> Layer<S> for LogBufferLayer {
    fn on_event(&self, event: &Event<'_>, _ctx: Context<'_, S>) {
        let mut visitor = LineVisitor::default();
        event.record(&mut visitor);

        let meta = event.metadata();
        let mut line = format!("{} {}: {}", meta.level(), meta.target(), visitor.message);
        line.push_str(&visitor.fields);
        self.buffer.push(line);
    }
}

#[derive(Default)]
struct LineVisitor {
    message: String,
    fields: String,
}

impl Visit for LineVisitor {
    fn record_debug(&mut self, field: &Field, value: &dyn std::fmt::Debug) {
        if field.name() == "message" {
            let _ = write!(self.message, "{:?}", value);
        } else {
            let _ = write!(self.fields, " {}={:?}", field.name(), value);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_push_and_snapshot_preserve_order() {
        let buf = LogBuffer::new(10);
        buf.push("one".to_string());
        buf.push("two".to_string());
        buf.push("three".to_string());
        assert_eq!(buf.snapshot(), vec!["one", "two", "three"]);
    }

    #[test]
    fn test_capacity_evicts_oldest() {
        let buf = LogBuffer::new(2);
        buf.push("one".to_string());
        buf.push("two".to_string());
        buf.push("three".to_string());
        assert_eq!(buf.snapshot(), vec!["two", "three"]);
        assert_eq!(buf.len(), 2);
    }

    #[test]
    fn test_layer_captures_events() {
        use tracing_subscriber::layer::SubscriberExt;

        let buf = LogBuffer::new(16);
        let subscriber = tracing_subscriber::registry().with(buf.layer());

        tracing::subscriber::with_default(subscriber, || {
            tracing::info!(trip_uuid = "t-1", "cached trip detail");
        });

        let lines = buf.snapshot();
        assert_eq!(lines.len(), 1);
        assert!(lines[0].contains("cached trip detail"));
        assert!(lines[0].contains("trip_uuid=\"t-1\""));
    }
}
