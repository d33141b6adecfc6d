//! Operator-facing status output for the command-line tools

use std::io::{self, Stderr, Stdout, Write};

/// Writers for status lines. Binaries use stdout/stderr, tests use buffers.
pub struct Console<O: Write, E: Write> {
    pub out: O,
    pub err: E,
}

impl Console<Stdout, Stderr> {
    pub fn stdio() -> Self {
        Self {
            out: io::stdout(),
            err: io::stderr(),
        }
    }
}

impl Console<Vec<u8>, Vec<u8>> {
    pub fn buffered() -> Self {
        Self {
            out: Vec::new(),
            err: Vec::new(),
        }
    }

    pub fn out_text(&self) -> String {
        String::from_utf8_lossy(&self.out).into_owned()
    }

    pub fn err_text(&self) -> String {
        String::from_utf8_lossy(&self.err).into_owned()
    }
}

// Console write failures are not actionable, so they are dropped.
impl<O: Write, E: Write> Console<O, E> {
    pub fn line(&mut self, text: &str) {
        let _ = writeln!(self.out, "{}", text);
    }

    pub fn error_line(&mut self, text: &str) {
        let _ = writeln!(self.err, "{}", text);
    }

    pub fn info(&mut self, text: &str) {
        self.line(&format!("[INFO] {}", text));
    }

    pub fn ok(&mut self, text: &str) {
        self.line(&format!("[OK] {}", text));
    }

    pub fn warn(&mut self, text: &str) {
        self.line(&format!("[WARN] {}", text));
    }

    pub fn fail(&mut self, text: &str) {
        self.error_line(&format!("[FAIL] {}", text));
    }

    /// Prompt without a trailing newline.
    pub fn prompt(&mut self, text: &str) {
        let _ = write!(self.out, "{}", text);
        let _ = self.out.flush();
    }

    /// Echo captured process output, avoiding a doubled trailing newline.
    pub fn echo(&mut self, text: &str) {
        let _ = writeln!(self.out, "{}", text.trim_end_matches('\n'));
    }

    pub fn echo_err(&mut self, text: &str) {
        let _ = writeln!(self.err, "{}", text.trim_end_matches('\n'));
    }
}
