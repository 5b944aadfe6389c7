//! Two-line text status output.

/// Number of text rows on the status display.
pub const ROWS: usize = 2;

/// A text display the synth writes its status to.
///
/// Implementations decide how a line is shown (an LCD, a terminal row, a
/// log line). Lines longer than the device can show may be truncated by the
/// implementation.
pub trait Display {
    /// Replaces the text of `row` (0 or 1).
    fn write_line(&mut self, row: usize, text: &str);

    /// Pushes pending lines to the device.
    fn flush(&mut self) {}
}

/// In-memory display holding the last line written to each row.
///
/// # Examples
///
/// ```
/// use polyarp::display::{Display, TextBuffer};
///
/// let mut screen = TextBuffer::default();
/// screen.write_line(1, "hello");
/// assert_eq!(screen.line(1), "hello");
/// assert_eq!(screen.line(5), "");
/// ```
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TextBuffer {
    lines: [String; ROWS],
    flushes: usize,
}

impl TextBuffer {
    pub fn line(&self, row: usize) -> &str {
        self.lines.get(row).map_or("", String::as_str)
    }

    /// How many times [`Display::flush`] was called.
    pub fn flushes(&self) -> usize {
        self.flushes
    }
}

impl Display for TextBuffer {
    fn write_line(&mut self, row: usize, text: &str) {
        if let Some(line) = self.lines.get_mut(row) {
            line.clear();
            line.push_str(text);
        }
    }

    fn flush(&mut self) {
        self.flushes += 1;
    }
}
