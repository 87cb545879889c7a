//! Indentation-tracking text buffer for emitting Go source.
//!
//! Go is indented with tabs, so unlike a general purpose writer there is no
//! configurable indent string. Writes go to an owned `String` and cannot fail.
//!
//! ```
//! use protoc_gen_rpcx_generator::go::CodeWriter;
//!
//! let mut w = CodeWriter::new();
//! w.block("func main()", |w| {
//!     w.writeln("fmt.Println(\"hi\")");
//! });
//! assert_eq!(w.as_str(), "func main() {\n\tfmt.Println(\"hi\")\n}\n");
//! ```

use std::cell::Cell;
use std::rc::Rc;

/// Append-only Go source buffer
#[derive(Debug, Default)]
pub struct CodeWriter {
    buf: String,
    indent_level: Rc<Cell<usize>>,
    at_line_start: bool,
}

impl CodeWriter {
    pub fn new() -> Self {
        Self {
            buf: String::new(),
            indent_level: Rc::new(Cell::new(0)),
            at_line_start: true,
        }
    }

    /// Write text without a newline, indenting first if at line start
    pub fn write(&mut self, text: &str) {
        if text.is_empty() {
            return;
        }
        if self.at_line_start {
            for _ in 0..self.indent_level.get() {
                self.buf.push('\t');
            }
            self.at_line_start = false;
        }
        self.buf.push_str(text);
    }

    /// Write text followed by a newline
    pub fn writeln(&mut self, text: &str) {
        self.write(text);
        self.buf.push('\n');
        self.at_line_start = true;
    }

    pub fn blank_line(&mut self) {
        self.buf.push('\n');
        self.at_line_start = true;
    }

    /// Indentation increases while the returned guard is alive
    pub fn indent(&mut self) -> IndentGuard {
        self.indent_level.set(self.indent_level.get() + 1);
        IndentGuard {
            indent_level: Rc::clone(&self.indent_level),
        }
    }

    /// `// text` comment lines; an empty line becomes a bare `//`
    pub fn comment(&mut self, text: &str) {
        for line in text.lines() {
            if line.is_empty() {
                self.writeln("//");
            } else {
                self.writeln(&format!("// {}", line));
            }
        }
    }

    /// Write `header {`, the indented body, then `}`
    pub fn block<F>(&mut self, header: &str, body: F)
    where
        F: FnOnce(&mut Self),
    {
        self.writeln(&format!("{} {{", header));
        {
            let _indent = self.indent();
            body(self);
        }
        self.writeln("}");
    }

    /// Write items separated by `separator` on the current line
    pub fn write_separated<I, F>(&mut self, items: I, separator: &str, mut write_item: F)
    where
        I: IntoIterator,
        F: FnMut(&mut Self, I::Item),
    {
        let mut first = true;
        for item in items {
            if !first {
                self.write(separator);
            }
            write_item(self, item);
            first = false;
        }
    }

    pub fn is_empty(&self) -> bool {
        self.buf.is_empty()
    }

    pub fn as_str(&self) -> &str {
        &self.buf
    }

    pub fn into_string(self) -> String {
        self.buf
    }
}

/// RAII guard that keeps one level of indentation
pub struct IndentGuard {
    indent_level: Rc<Cell<usize>>,
}

impl Drop for IndentGuard {
    fn drop(&mut self) {
        let current = self.indent_level.get();
        self.indent_level.set(current.saturating_sub(1));
    }
}
