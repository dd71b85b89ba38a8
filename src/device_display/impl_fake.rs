use crate::device_display::interface::DeviceDisplay;
use crate::library::logger::interface::Logger;
use std::error::Error;
use std::sync::{Arc, Mutex};

/// Keeps the last presented screen so tests can read it back.
#[derive(Clone)]
pub struct DeviceDisplayFake {
    logger: Arc<dyn Logger + Send + Sync>,
    lines: Vec<String>,
    presented: Arc<Mutex<Vec<Vec<String>>>>,
}

impl DeviceDisplayFake {
    pub fn new(logger: Arc<dyn Logger + Send + Sync>) -> Self {
        Self {
            logger,
            lines: Vec::new(),
            presented: Arc::new(Mutex::new(Vec::new())),
        }
    }

    /// Every screen presented so far, oldest first.
    pub fn screens(&self) -> Vec<Vec<String>> {
        self.presented
            .lock()
            .map(|presented| presented.clone())
            .unwrap_or_default()
    }

    pub fn last_screen(&self) -> Vec<String> {
        self.screens().pop().unwrap_or_default()
    }
}

impl DeviceDisplay for DeviceDisplayFake {
    fn clear(&mut self) -> Result<(), Box<dyn Error + Send + Sync>> {
        self.lines.clear();
        self.logger.info("DeviceDisplayFake::clear()")?;
        Ok(())
    }

    fn write_line(&mut self, line: usize, text: &str) -> Result<(), Box<dyn Error + Send + Sync>> {
        if self.lines.len() <= line {
            self.lines.resize(line + 1, String::new());
        }
        self.lines[line] = text.to_string();
        self.logger.info(&format!(
            "DeviceDisplayFake::write_line({}, {})",
            line, text
        ))?;
        Ok(())
    }

    fn present(&mut self) -> Result<(), Box<dyn Error + Send + Sync>> {
        self.presented
            .lock()
            .map_err(|e| e.to_string())?
            .push(self.lines.clone());
        Ok(())
    }
}
