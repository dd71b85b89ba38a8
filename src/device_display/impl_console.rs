use crate::device_display::interface::DeviceDisplay;
use std::error::Error;
use std::io::Write;

pub struct DeviceDisplayConsole<W: Write + Send + Sync> {
    out: W,
    lines: Vec<String>,
    width: usize,
}

impl DeviceDisplayConsole<std::io::Stdout> {
    pub fn stdout(width: usize) -> Self {
        Self::new(std::io::stdout(), width)
    }
}

impl<W: Write + Send + Sync> DeviceDisplayConsole<W> {
    pub fn new(out: W, width: usize) -> Self {
        Self {
            out,
            lines: Vec::new(),
            width: width.max(1),
        }
    }

    pub fn into_inner(self) -> W {
        self.out
    }

    fn frame(&self) -> String {
        let border = "─".repeat(self.width);
        let mut frame = format!("┌{}┐\n", border);
        for line in &self.lines {
            let text: String = line.chars().take(self.width).collect();
            let padding = self.width - text.chars().count();
            frame.push_str(&format!("│{}{}│\n", text, " ".repeat(padding)));
        }
        frame.push_str(&format!("└{}┘\n", border));
        frame
    }
}

impl<W: Write + Send + Sync> DeviceDisplay for DeviceDisplayConsole<W> {
    fn clear(&mut self) -> Result<(), Box<dyn Error + Send + Sync>> {
        self.lines.clear();
        Ok(())
    }

    fn write_line(&mut self, line: usize, text: &str) -> Result<(), Box<dyn Error + Send + Sync>> {
        if self.lines.len() <= line {
            self.lines.resize(line + 1, String::new());
        }
        self.lines[line] = text.to_string();
        Ok(())
    }

    fn present(&mut self) -> Result<(), Box<dyn Error + Send + Sync>> {
        let frame = self.frame();
        self.out.write_all(frame.as_bytes())?;
        self.out.flush()?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_present_draws_framed_lines() {
        let mut display = DeviceDisplayConsole::new(Vec::new(), 10);

        display.write_line(0, "Ready").unwrap();
        display.write_line(1, "Confidence: 97.00%").unwrap();
        display.present().unwrap();

        let out = String::from_utf8(display.into_inner()).unwrap();
        assert_eq!(
            out,
            "┌──────────┐\n│Ready     │\n│Confidence│\n└──────────┘\n"
        );
    }

    #[test]
    fn test_clear_drops_previous_lines() {
        let mut display = DeviceDisplayConsole::new(Vec::new(), 4);

        display.write_line(2, "abc").unwrap();
        display.clear().unwrap();
        display.write_line(0, "x").unwrap();
        display.present().unwrap();

        let out = String::from_utf8(display.into_inner()).unwrap();
        assert_eq!(out, "┌────┐\n│x   │\n└────┘\n");
    }
}
