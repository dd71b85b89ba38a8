use std::sync::Arc;

pub type LogResult = Result<(), Box<dyn std::error::Error + Send + Sync>>;

pub trait Logger: Send + Sync {
    fn info(&self, message: &str) -> LogResult;
    fn warn(&self, message: &str) -> LogResult;
    fn error(&self, message: &str) -> LogResult;
    fn with_namespace(&self, namespace: &str) -> Arc<dyn Logger + Send + Sync>;
}

pub(crate) fn join_namespace(current: Option<&str>, namespace: &str) -> String {
    match current {
        Some(current) => format!("{}:{}", current, namespace),
        None => namespace.to_string(),
    }
}
