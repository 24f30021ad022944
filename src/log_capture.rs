//! Tracing layer that keeps recent log events in memory so the editor screen
//! can show them while the terminal is in raw mode.

use chrono::Local;
use std::{
    collections::VecDeque,
    sync::{Arc, Mutex},
};
use tracing::Level;
use tracing_subscriber::Layer;

pub const MAX_LOG_LINES: usize = 200;

#[derive(Clone)]
pub struct LogEntry {
    pub level: Level,
    pub line: String,
}

pub type LogBuffer = Arc<Mutex<VecDeque<LogEntry>>>;

pub struct CaptureLayer {
    buffer: LogBuffer,
}

/// Build the layer and the buffer handle the UI reads from.
pub fn new() -> (CaptureLayer, LogBuffer) {
    let buffer: LogBuffer = Arc::new(Mutex::new(VecDeque::with_capacity(MAX_LOG_LINES)));
    let layer = CaptureLayer {
        buffer: Arc::clone(&buffer),
    };
    (layer, buffer)
}

impl<S: tracing::Subscriber> Layer<S> for CaptureLayer {
    fn on_event(
        &self,
        event: &tracing::Event<'_>,
        _ctx: tracing_subscriber::layer::Context<'_, S>,
    ) {
        let level = *event.metadata().level();
        let mut fields = FieldCollector::default();
        event.record(&mut fields);

        let mut line = format!("{} {:<5} {}", Local::now().format("%H:%M:%S"), level, fields.message);
        for (name, value) in &fields.extra {
            line.push_str(&format!(" {name}={value}"));
        }

        // A poisoned lock drops the entry; panicking inside a log handler
        // could recurse.
        if let Ok(mut buf) = self.buffer.lock() {
            if buf.len() >= MAX_LOG_LINES {
                buf.pop_front();
            }
            buf.push_back(LogEntry { level, line });
        }
    }
}

/// Collects `message` plus the structured fields (`path`, `session`, ...).
#[derive(Default)]
struct FieldCollector {
    message: String,
    extra: Vec<(&'static str, String)>,
}

impl tracing::field::Visit for FieldCollector {
    fn record_str(&mut self, field: &tracing::field::Field, value: &str) {
        if field.name() == "message" {
            self.message.push_str(value);
        } else {
            self.extra.push((field.name(), value.to_string()));
        }
    }

    fn record_debug(&mut self, field: &tracing::field::Field, value: &dyn std::fmt::Debug) {
        let text = format!("{value:?}");
        // Debug wraps &str values in quotes.
        let text = match text.strip_prefix('"').and_then(|t| t.strip_suffix('"')) {
            Some(inner) => inner.to_string(),
            None => text,
        };
        if field.name() == "message" {
            self.message.push_str(&text);
        } else {
            self.extra.push((field.name(), text));
        }
    }
}
