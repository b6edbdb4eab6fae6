use std::io::{self, Write};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Mutex;

use chrono::{DateTime, Local};
use praise_engine::Presenter;

/// Prints worker progress as plain console lines.
pub struct ConsolePresenter {
    running: AtomicBool,
    out: Mutex<Box<dyn Write + Send>>,
}

impl ConsolePresenter {
    pub fn stdout() -> Self {
        Self::with_writer(Box::new(io::stdout()))
    }

    pub fn with_writer(out: Box<dyn Write + Send>) -> Self {
        Self {
            running: AtomicBool::new(true),
            out: Mutex::new(out),
        }
    }

    /// Makes every further `log` call fail, which stops the worker at its
    /// next liveness check.
    pub fn shut_down(&self) {
        self.running.store(false, Ordering::SeqCst);
    }
}

pub fn format_line(now: DateTime<Local>, text: &str, with_timestamp: bool) -> String {
    if with_timestamp {
        format!("[{}] {}", now.format("%H:%M:%S"), text)
    } else {
        text.to_string()
    }
}

impl Presenter for ConsolePresenter {
    fn log(&self, text: &str, with_timestamp: bool) -> bool {
        if !self.is_running() {
            return false;
        }
        let line = format_line(Local::now(), text, with_timestamp);
        let Ok(mut out) = self.out.lock() else {
            return false;
        };
        writeln!(out, "{line}").and_then(|_| out.flush()).is_ok()
    }

    fn is_running(&self) -> bool {
        self.running.load(Ordering::SeqCst)
    }
}
