use std::future::Future;
use std::io;
use std::sync::{mpsc, Arc};
use std::thread::{self, JoinHandle};

use praise_core::RefreshWindow;
use scan_logging::{scan_error, scan_info, scan_warn, set_pass_id};

use crate::{
    Countdown, CountdownReader, DocumentHandle, PassGuard, Presenter, Reporter, ScanController,
    ScanError, ScanSettings, ScheduleControl, Scheduler, Selectors, SyncClient, VerifySettings,
    Wakeup, WorkerEvent,
};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RunMode {
    /// Rescan on the randomized schedule until stopped.
    Continuous,
    /// Run a single pass, then stop.
    Once,
}

#[derive(Debug, Clone)]
pub struct WorkerSettings {
    pub scan: ScanSettings,
    pub verify: VerifySettings,
    pub selectors: Selectors,
    pub refresh_window: RefreshWindow,
    pub mode: RunMode,
}

/// External collaborators a worker drives, built inside the worker thread.
pub struct WorkerSession {
    pub document: Arc<dyn DocumentHandle>,
    pub sync: Arc<dyn SyncClient>,
}

/// Owns the dedicated worker thread for one start/stop lifecycle.
pub struct WorkerHandle {
    control: ScheduleControl,
    guard: PassGuard,
    countdown: CountdownReader,
    event_rx: mpsc::Receiver<WorkerEvent>,
    thread: Option<JoinHandle<()>>,
}

impl WorkerHandle {
    /// Starts the worker. `connect` runs first on the worker's runtime and
    /// provides the document handle and sync client for the lifecycle.
    pub fn spawn<F, Fut>(
        settings: WorkerSettings,
        presenter: Arc<dyn Presenter>,
        connect: F,
    ) -> io::Result<Self>
    where
        F: FnOnce(Reporter) -> Fut + Send + 'static,
        Fut: Future<Output = Result<WorkerSession, ScanError>>,
    {
        let (event_tx, event_rx) = mpsc::channel();
        let control = ScheduleControl::new();
        let guard = PassGuard::new();
        let countdown = Countdown::new();
        let reader = countdown.reader();

        let reporter = Reporter::new(presenter, control.token());
        let worker = Worker {
            settings,
            reporter,
            control: control.clone(),
            guard: guard.clone(),
            event_tx,
        };

        let thread = thread::Builder::new()
            .name("praise-worker".to_string())
            .spawn(move || {
                let runtime = match tokio::runtime::Builder::new_current_thread()
                    .enable_all()
                    .build()
                {
                    Ok(runtime) => runtime,
                    Err(err) => {
                        scan_error!("worker runtime failed to start: {}", err);
                        worker.emit(WorkerEvent::PassAborted {
                            reason: err.to_string(),
                        });
                        worker.emit(WorkerEvent::Stopped);
                        return;
                    }
                };
                runtime.block_on(worker.run(connect, countdown));
            })?;

        Ok(Self {
            control,
            guard,
            countdown: reader,
            event_rx,
            thread: Some(thread),
        })
    }

    /// Stops the worker at the next liveness check.
    pub fn stop(&self) {
        self.control.cancel();
    }

    /// Starts the next pass now. Returns false when no countdown is running,
    /// including while a pass is active.
    pub fn force_refresh(&self) -> bool {
        if self.guard.is_active() {
            return false;
        }
        self.control.force()
    }

    pub fn countdown(&self) -> CountdownReader {
        self.countdown.clone()
    }

    pub fn is_pass_active(&self) -> bool {
        self.guard.is_active()
    }

    pub fn try_recv(&self) -> Option<WorkerEvent> {
        self.event_rx.try_recv().ok()
    }

    pub fn recv(&self) -> Option<WorkerEvent> {
        self.event_rx.recv().ok()
    }

    /// Waits for the worker thread to end.
    pub fn join(mut self) {
        if let Some(thread) = self.thread.take() {
            if thread.join().is_err() {
                scan_error!("worker thread panicked");
            }
        }
    }
}

impl Drop for WorkerHandle {
    fn drop(&mut self) {
        self.control.cancel();
    }
}

struct Worker {
    settings: WorkerSettings,
    reporter: Reporter,
    control: ScheduleControl,
    guard: PassGuard,
    event_tx: mpsc::Sender<WorkerEvent>,
}

impl Worker {
    fn emit(&self, event: WorkerEvent) {
        let _ = self.event_tx.send(event);
    }

    async fn run<F, Fut>(self, connect: F, countdown: Countdown)
    where
        F: FnOnce(Reporter) -> Fut,
        Fut: Future<Output = Result<WorkerSession, ScanError>>,
    {
        let session = match connect(self.reporter.clone()).await {
            Ok(session) => session,
            Err(err) => {
                self.abort(&err);
                self.emit(WorkerEvent::Stopped);
                return;
            }
        };

        let controller = ScanController::new(
            session.document.clone(),
            session.sync.clone(),
            self.settings.selectors.clone(),
            self.settings.scan.clone(),
            self.settings.verify.clone(),
        );
        let mut scheduler = Scheduler::new(self.control.clone(), countdown);

        self.lifecycle(&controller, &mut scheduler).await;

        set_pass_id(0);
        if let Err(err) = session.document.close().await {
            scan_warn!("closing document handle failed: {}", err);
        }
        scan_info!("worker stopped");
        self.emit(WorkerEvent::Stopped);
    }

    async fn lifecycle(&self, controller: &ScanController, scheduler: &mut Scheduler) {
        let mut pass_id = 0;
        while self.reporter.is_live() {
            let Some(permit) = self.guard.try_begin() else {
                scan_warn!("a pass is already active; not starting another");
                return;
            };
            pass_id += 1;
            set_pass_id(pass_id);
            let result = controller.run_pass(&self.reporter).await;
            drop(permit);

            match result {
                Ok(summary) => self.emit(WorkerEvent::PassCompleted(summary)),
                Err(ScanError::Refresh(err)) if !err.is_fatal() => {
                    scan_warn!("pass {} failed: {}", pass_id, err);
                    if self
                        .reporter
                        .warn(format!("Search results unavailable ({err}). Pass abandoned."))
                        .is_err()
                    {
                        return;
                    }
                    self.emit(WorkerEvent::PassFailed {
                        reason: ScanError::Refresh(err).to_string(),
                    });
                }
                Err(err) => {
                    self.abort(&err);
                    return;
                }
            }

            if self.settings.mode == RunMode::Once {
                return;
            }

            let next = scheduler.schedule_next(self.settings.refresh_window);
            if self
                .reporter
                .info(format!("Next refresh in {} seconds", next.seconds_total()))
                .is_err()
            {
                return;
            }
            match scheduler.wait(|| self.reporter.is_live()).await {
                Wakeup::Elapsed => {}
                Wakeup::Forced => {
                    if self.reporter.info("Refresh requested.").is_err() {
                        return;
                    }
                }
                Wakeup::Cancelled => return,
            }
        }
    }

    fn abort(&self, err: &ScanError) {
        if err.is_cancelled() {
            scan_info!("worker cancelled");
            return;
        }
        scan_error!("worker aborted: {}", err);
        let _ = self.reporter.error(format!("{err}. Restart required."));
        self.emit(WorkerEvent::PassAborted {
            reason: err.to_string(),
        });
    }
}
