use rand::Rng;
use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ScheduleError {
    #[error("refresh window is empty: low {low} min must be below high {high} min")]
    EmptyWindow { low: u64, high: u64 },
    #[error("refresh window of {high} min is too long")]
    TooLong { high: u64 },
}

/// Bounds, in minutes, of the randomized delay between two passes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RefreshWindow {
    low_minutes: u64,
    high_minutes: u64,
}

impl RefreshWindow {
    pub fn new(low_minutes: u64, high_minutes: u64) -> Result<Self, ScheduleError> {
        if low_minutes >= high_minutes {
            return Err(ScheduleError::EmptyWindow {
                low: low_minutes,
                high: high_minutes,
            });
        }
        if high_minutes.checked_mul(60).is_none() {
            return Err(ScheduleError::TooLong { high: high_minutes });
        }
        Ok(Self {
            low_minutes,
            high_minutes,
        })
    }

    pub fn low_minutes(&self) -> u64 {
        self.low_minutes
    }

    pub fn high_minutes(&self) -> u64 {
        self.high_minutes
    }

    /// Draws a delay uniformly from `[low * 60, high * 60)` seconds.
    pub fn draw_delay_secs<R: Rng + ?Sized>(&self, rng: &mut R) -> u64 {
        rng.random_range(self.low_minutes * 60..self.high_minutes * 60)
    }
}

/// Countdown to the next pass.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ScheduleState {
    seconds_remaining: u64,
    seconds_total: u64,
}

impl ScheduleState {
    pub fn new(seconds_total: u64) -> Self {
        Self {
            seconds_remaining: seconds_total,
            seconds_total,
        }
    }

    pub fn seconds_remaining(&self) -> u64 {
        self.seconds_remaining
    }

    pub fn seconds_total(&self) -> u64 {
        self.seconds_total
    }

    pub fn is_elapsed(&self) -> bool {
        self.seconds_remaining == 0
    }

    /// One second passes. Returns true once the countdown has reached zero.
    pub fn tick(&mut self) -> bool {
        self.seconds_remaining = self.seconds_remaining.saturating_sub(1);
        self.is_elapsed()
    }

    /// Cuts the countdown short.
    pub fn force(&mut self) {
        self.seconds_remaining = 0;
    }
}

/// Draws the delay before the next pass and starts a countdown for it.
pub fn schedule_next<R: Rng + ?Sized>(rng: &mut R, window: RefreshWindow) -> ScheduleState {
    ScheduleState::new(window.draw_delay_secs(rng))
}
