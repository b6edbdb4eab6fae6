//! The narrow surface shared between the worker and the presentation layer.

use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::Arc;

use scan_logging::{scan_error, scan_info, scan_warn};
use tokio_util::sync::CancellationToken;

use crate::ScanError;

/// Implemented by the presentation layer and injected into the worker.
pub trait Presenter: Send + Sync {
    /// Shows one line of progress. Returns false when the worker should stop
    /// immediately.
    fn log(&self, text: &str, with_timestamp: bool) -> bool;

    /// The presentation liveness flag.
    fn is_running(&self) -> bool;
}

/// The worker's view of the presenter: every line is mirrored into the log
/// facade and every call doubles as a liveness check.
#[derive(Clone)]
pub struct Reporter {
    presenter: Arc<dyn Presenter>,
    cancel: CancellationToken,
}

impl Reporter {
    pub fn new(presenter: Arc<dyn Presenter>, cancel: CancellationToken) -> Self {
        Self { presenter, cancel }
    }

    pub fn is_live(&self) -> bool {
        !self.cancel.is_cancelled() && self.presenter.is_running()
    }

    pub fn ensure_live(&self) -> Result<(), ScanError> {
        if self.is_live() {
            Ok(())
        } else {
            Err(ScanError::Cancelled)
        }
    }

    pub fn info(&self, text: impl AsRef<str>) -> Result<(), ScanError> {
        let text = text.as_ref();
        scan_info!("{}", text);
        self.show(text, true)
    }

    pub fn warn(&self, text: impl AsRef<str>) -> Result<(), ScanError> {
        let text = text.as_ref();
        scan_warn!("{}", text);
        self.show(&format!("WARNING: {text}"), true)
    }

    pub fn error(&self, text: impl AsRef<str>) -> Result<(), ScanError> {
        let text = text.as_ref();
        scan_error!("{}", text);
        self.show(&format!("ERROR: {text}"), true)
    }

    fn show(&self, text: &str, with_timestamp: bool) -> Result<(), ScanError> {
        if self.cancel.is_cancelled() || !self.presenter.log(text, with_timestamp) {
            return Err(ScanError::Cancelled);
        }
        Ok(())
    }
}

/// Seconds until the next pass. Written only by the worker's scheduler.
#[derive(Debug, Default)]
pub struct Countdown(Arc<AtomicU64>);

impl Countdown {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set(&self, seconds: u64) {
        self.0.store(seconds, Ordering::Relaxed);
    }

    pub fn reader(&self) -> CountdownReader {
        CountdownReader(self.0.clone())
    }
}

/// Read-only view of a [`Countdown`].
#[derive(Debug, Clone)]
pub struct CountdownReader(Arc<AtomicU64>);

impl CountdownReader {
    pub fn seconds_remaining(&self) -> u64 {
        self.0.load(Ordering::Relaxed)
    }
}

/// Single-flight guard: at most one pass may be active at a time.
#[derive(Debug, Clone, Default)]
pub struct PassGuard(Arc<AtomicBool>);

impl PassGuard {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn try_begin(&self) -> Option<PassPermit> {
        self.0
            .compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .ok()
            .map(|_| PassPermit(self.0.clone()))
    }

    pub fn is_active(&self) -> bool {
        self.0.load(Ordering::Acquire)
    }
}

/// Held for the duration of a pass; releases the guard on drop.
#[derive(Debug)]
pub struct PassPermit(Arc<AtomicBool>);

impl Drop for PassPermit {
    fn drop(&mut self) {
        self.0.store(false, Ordering::Release);
    }
}
