use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

use praise_core::{schedule_next, RefreshWindow, ScheduleState};
use rand::rngs::StdRng;
use rand::SeedableRng;
use scan_logging::scan_debug;
use tokio::sync::Notify;
use tokio_util::sync::CancellationToken;

use crate::Countdown;

const TICK: Duration = Duration::from_secs(1);

/// Handle used from outside the worker to cut a countdown short or cancel it.
#[derive(Debug, Clone, Default)]
pub struct ScheduleControl {
    cancel: CancellationToken,
    force: Arc<Notify>,
    /// Set while a countdown is being waited on.
    waiting: Arc<AtomicBool>,
}

impl ScheduleControl {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cancel(&self) {
        self.cancel.cancel();
    }

    pub fn is_cancelled(&self) -> bool {
        self.cancel.is_cancelled()
    }

    /// Ends the countdown currently being waited on. Returns false, and has
    /// no effect, when no countdown is running.
    pub fn force(&self) -> bool {
        if !self.waiting.load(Ordering::SeqCst) {
            return false;
        }
        self.force.notify_waiters();
        true
    }

    pub fn token(&self) -> CancellationToken {
        self.cancel.clone()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TickOutcome {
    /// Nothing is scheduled.
    Idle,
    Pending(u64),
    Elapsed,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Wakeup {
    Elapsed,
    Forced,
    Cancelled,
}

/// Holds at most one outstanding countdown and publishes it once per second.
pub struct Scheduler {
    control: ScheduleControl,
    countdown: Countdown,
    state: Option<ScheduleState>,
    rng: StdRng,
}

impl Scheduler {
    pub fn new(control: ScheduleControl, countdown: Countdown) -> Self {
        Self::with_rng(control, countdown, StdRng::from_os_rng())
    }

    pub fn with_rng(control: ScheduleControl, countdown: Countdown, rng: StdRng) -> Self {
        Self {
            control,
            countdown,
            state: None,
            rng,
        }
    }

    pub fn state(&self) -> Option<ScheduleState> {
        self.state
    }

    /// Replaces any outstanding countdown with a freshly drawn one.
    pub fn schedule_next(&mut self, window: RefreshWindow) -> ScheduleState {
        let state = schedule_next(&mut self.rng, window);
        scan_debug!(
            "next pass in {}s (window {}-{} min)",
            state.seconds_total(),
            window.low_minutes(),
            window.high_minutes()
        );
        self.countdown.set(state.seconds_remaining());
        self.state = Some(state);
        state
    }

    /// Advances the countdown by one second. The countdown is consumed when
    /// it elapses, so it fires exactly once.
    pub fn tick(&mut self) -> TickOutcome {
        let Some(state) = self.state.as_mut() else {
            return TickOutcome::Idle;
        };
        let elapsed = state.tick();
        self.countdown.set(state.seconds_remaining());
        if elapsed {
            self.state = None;
            TickOutcome::Elapsed
        } else {
            TickOutcome::Pending(state.seconds_remaining())
        }
    }

    /// Drops the outstanding countdown and cancels every wait on this control.
    pub fn cancel(&mut self) {
        self.clear();
        self.control.cancel();
    }

    fn clear(&mut self) {
        self.state = None;
        self.countdown.set(0);
    }

    /// Ticks once per second until the countdown elapses, is forced, or is
    /// cancelled. `keep_running` is polled on every tick. Returns `Elapsed`
    /// immediately when nothing is scheduled.
    pub async fn wait(&mut self, keep_running: impl Fn() -> bool) -> Wakeup {
        if self.state.is_none() {
            return Wakeup::Elapsed;
        }
        let control = self.control.clone();
        // Registered before the flag is raised so a force cannot slip in between.
        let forced = control.force.notified();
        tokio::pin!(forced);
        let _waiting = WaitingFlag::raise(&control.waiting);
        let mut interval = tokio::time::interval_at(tokio::time::Instant::now() + TICK, TICK);
        loop {
            if control.is_cancelled() || !keep_running() {
                self.clear();
                return Wakeup::Cancelled;
            }
            tokio::select! {
                biased;
                _ = control.cancel.cancelled() => {
                    self.clear();
                    return Wakeup::Cancelled;
                }
                _ = &mut forced => {
                    self.clear();
                    return Wakeup::Forced;
                }
                _ = interval.tick() => {
                    if self.tick() == TickOutcome::Elapsed {
                        return Wakeup::Elapsed;
                    }
                }
            }
        }
    }
}

/// Marks a countdown as awaited for as long as it lives.
struct WaitingFlag<'a>(&'a AtomicBool);

impl<'a> WaitingFlag<'a> {
    fn raise(flag: &'a AtomicBool) -> Self {
        flag.store(true, Ordering::SeqCst);
        Self(flag)
    }
}

impl Drop for WaitingFlag<'_> {
    fn drop(&mut self) {
        self.0.store(false, Ordering::SeqCst);
    }
}
