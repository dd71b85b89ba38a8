use std::error::Error;

/// A text panel the result is drawn onto, one line at a time.
pub trait DeviceDisplay: Send + Sync {
    /// Blank every line.
    fn clear(&mut self) -> Result<(), Box<dyn Error + Send + Sync>>;

    /// Write text to a specific line (0-based). Lines past the end grow the panel.
    fn write_line(&mut self, line: usize, text: &str) -> Result<(), Box<dyn Error + Send + Sync>>;

    /// Push whatever was written since the last `clear` to the output.
    fn present(&mut self) -> Result<(), Box<dyn Error + Send + Sync>>;
}
