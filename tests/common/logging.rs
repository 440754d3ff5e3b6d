//! Verbose test logging infrastructure.
//!
//! Buffers log entries per test and dumps them to stderr only when the
//! test panics, so passing runs stay quiet and failing runs show the
//! full trail. Entries capture elapsed time, level, category, and an
//! optional key-value context.
//!
//! # Example
//!
//! ```ignore
//! let logger = TestLogger::new();
//! logger.info("setup", "Building payload");
//! logger.info_ctx("verify", "Checking summary", |ctx| {
//!     ctx.push(("total".into(), "10".into()));
//! });
//! ```

#![allow(dead_code)]

use std::fmt::Write as _;
use std::sync::Mutex;
use std::time::Instant;

/// Log entry severity level.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogLevel {
    /// Detailed debugging information.
    Debug,
    /// General information about test progress.
    Info,
    /// Warnings about unexpected but non-fatal conditions.
    Warn,
    /// Errors that may cause test failure.
    Error,
}

impl LogLevel {
    /// Returns the display string for this log level.
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Debug => "DEBUG",
            Self::Info => "INFO ",
            Self::Warn => "WARN ",
            Self::Error => "ERROR",
        }
    }
}

/// A single captured log entry.
#[derive(Debug, Clone)]
struct LogEntry {
    elapsed_ms: u128,
    level: LogLevel,
    category: String,
    message: String,
    context: Vec<(String, String)>,
}

impl LogEntry {
    fn format(&self) -> String {
        let mut out = String::with_capacity(80);
        let secs = self.elapsed_ms as f64 / 1000.0;
        let _ = writeln!(
            out,
            "[{secs:8.3}s] {} [{}] {}",
            self.level.as_str(),
            self.category,
            self.message
        );
        for (key, value) in &self.context {
            let _ = writeln!(out, "            {key} = {value}");
        }
        out
    }
}

/// Buffered logger for integration tests.
///
/// Dropped while panicking, it dumps every captured entry to stderr.
pub struct TestLogger {
    entries: Mutex<Vec<LogEntry>>,
    start: Instant,
}

impl Default for TestLogger {
    fn default() -> Self {
        Self::new()
    }
}

impl TestLogger {
    /// Create a new test logger.
    #[must_use]
    pub fn new() -> Self {
        Self {
            entries: Mutex::new(Vec::with_capacity(64)),
            start: Instant::now(),
        }
    }

    fn elapsed_ms(&self) -> u128 {
        self.start.elapsed().as_millis()
    }

    /// Log a message at the given level.
    pub fn log(&self, level: LogLevel, category: &str, message: impl Into<String>) {
        let entry = LogEntry {
            elapsed_ms: self.elapsed_ms(),
            level,
            category: category.to_string(),
            message: message.into(),
            context: Vec::new(),
        };
        self.entries.lock().expect("logger lock").push(entry);
    }

    /// Log a debug message.
    pub fn debug(&self, category: &str, message: impl Into<String>) {
        self.log(LogLevel::Debug, category, message);
    }

    /// Log an info message.
    pub fn info(&self, category: &str, message: impl Into<String>) {
        self.log(LogLevel::Info, category, message);
    }

    /// Log a warning message.
    pub fn warn(&self, category: &str, message: impl Into<String>) {
        self.log(LogLevel::Warn, category, message);
    }

    /// Log an error message.
    pub fn error(&self, category: &str, message: impl Into<String>) {
        self.log(LogLevel::Error, category, message);
    }

    /// Log an entry with additional key-value context.
    pub fn with_context<F>(&self, level: LogLevel, category: &str, message: impl Into<String>, f: F)
    where
        F: FnOnce(&mut Vec<(String, String)>),
    {
        let mut context = Vec::new();
        f(&mut context);
        let entry = LogEntry {
            elapsed_ms: self.elapsed_ms(),
            level,
            category: category.to_string(),
            message: message.into(),
            context,
        };
        self.entries.lock().expect("logger lock").push(entry);
    }

    /// Log an info entry with context.
    pub fn info_ctx<F>(&self, category: &str, message: impl Into<String>, f: F)
    where
        F: FnOnce(&mut Vec<(String, String)>),
    {
        self.with_context(LogLevel::Info, category, message, f);
    }

    /// Render every captured entry.
    pub fn dump(&self) -> String {
        let entries = self.entries.lock().expect("logger lock");
        let mut output = String::with_capacity(entries.len() * 100);
        for entry in entries.iter() {
            output.push_str(&entry.format());
        }
        output
    }
}

impl Drop for TestLogger {
    fn drop(&mut self) {
        if std::thread::panicking() {
            eprintln!("\n=== test log ===\n{}", self.dump());
        }
    }
}
