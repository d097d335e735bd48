// src/monitor/coalesce.rs

//! Stack-trace coalescing.
//!
//! A pure state machine: lines go in one at a time, finished groups come out.
//! Consecutive frame-shaped lines ("at ...", "Caused by ...", "... N more")
//! are appended to the group started by the line before them, so a long
//! exception trace becomes one record instead of hundreds.

const CONTINUATION_MARKERS: [&str; 3] = ["at ", "Caused by", "... "];

/// Whether `line` continues the current stack-trace group.
pub fn is_continuation(line: &str) -> bool {
    let trimmed = line.trim_start();
    CONTINUATION_MARKERS
        .iter()
        .any(|marker| trimmed.starts_with(marker))
}

/// Groups lines into records of at most `max_lines` lines.
///
/// The line that ends a group is never dropped: it becomes the first line of
/// the next group.
#[derive(Debug)]
pub struct LineCoalescer {
    max_lines: usize,
    group: String,
    lines: usize,
}

impl LineCoalescer {
    /// `max_lines` below 1 is treated as 1.
    pub fn new(max_lines: usize) -> Self {
        Self {
            max_lines: max_lines.max(1),
            group: String::new(),
            lines: 0,
        }
    }

    /// Feed one line (without its terminator).
    ///
    /// Returns the previous group when this line closes it.
    pub fn push(&mut self, line: &str) -> Option<String> {
        if is_continuation(line) && self.lines < self.max_lines {
            self.append(line);
            return None;
        }

        let finished = self.take();
        self.append(line);
        finished
    }

    /// Flush whatever is buffered, at end-of-stream.
    pub fn finish(&mut self) -> Option<String> {
        self.take()
    }

    /// Number of lines in the group currently being built.
    pub fn pending_lines(&self) -> usize {
        self.lines
    }

    fn append(&mut self, line: &str) {
        if self.lines > 0 {
            self.group.push('\n');
        }
        self.group.push_str(line);
        self.lines += 1;
    }

    fn take(&mut self) -> Option<String> {
        if self.lines == 0 {
            return None;
        }
        self.lines = 0;
        Some(std::mem::take(&mut self.group))
    }
}
