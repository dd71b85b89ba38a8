use crate::library::logger::interface::{join_namespace, LogResult, Logger};
use std::sync::{Arc, Mutex};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LogLine {
    pub level: &'static str,
    pub namespace: Option<String>,
    pub message: String,
}

/// Keeps every line in memory. Namespaced children share the same sink.
#[derive(Debug, Clone, Default)]
pub struct LoggerFake {
    namespace: Option<String>,
    lines: Arc<Mutex<Vec<LogLine>>>,
}

impl LoggerFake {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn lines(&self) -> Vec<LogLine> {
        match self.lines.lock() {
            Ok(lines) => lines.clone(),
            Err(poisoned) => poisoned.into_inner().clone(),
        }
    }

    pub fn contains(&self, needle: &str) -> bool {
        self.lines().iter().any(|line| line.message.contains(needle))
    }

    fn push(&self, level: &'static str, message: &str) -> LogResult {
        let mut lines = self
            .lines
            .lock()
            .map_err(|e| format!("log sink poisoned: {}", e))?;
        lines.push(LogLine {
            level,
            namespace: self.namespace.clone(),
            message: message.to_string(),
        });
        Ok(())
    }
}

impl Logger for LoggerFake {
    fn info(&self, message: &str) -> LogResult {
        self.push("info", message)
    }

    fn warn(&self, message: &str) -> LogResult {
        self.push("warn", message)
    }

    fn error(&self, message: &str) -> LogResult {
        self.push("error", message)
    }

    fn with_namespace(&self, namespace: &str) -> Arc<dyn Logger + Send + Sync> {
        Arc::new(LoggerFake {
            namespace: Some(join_namespace(self.namespace.as_deref(), namespace)),
            lines: Arc::clone(&self.lines),
        })
    }
}
