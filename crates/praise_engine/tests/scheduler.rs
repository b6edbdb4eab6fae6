use std::time::Duration;

use praise_core::RefreshWindow;
use praise_engine::{Countdown, ScheduleControl, Scheduler, TickOutcome, Wakeup};
use rand::rngs::StdRng;
use rand::SeedableRng;
use tokio::time::Instant;

fn scheduler(control: &ScheduleControl) -> (Scheduler, praise_engine::CountdownReader) {
    let countdown = Countdown::new();
    let reader = countdown.reader();
    let scheduler = Scheduler::with_rng(control.clone(), countdown, StdRng::seed_from_u64(7));
    (scheduler, reader)
}

#[tokio::test(start_paused = true)]
async fn countdown_elapses_after_drawn_delay() {
    let control = ScheduleControl::new();
    let (mut scheduler, reader) = scheduler(&control);

    let state = scheduler.schedule_next(RefreshWindow::new(7, 10).unwrap());
    assert!((420..600).contains(&state.seconds_total()));
    assert_eq!(reader.seconds_remaining(), state.seconds_total());

    let start = Instant::now();
    assert_eq!(scheduler.wait(|| true).await, Wakeup::Elapsed);
    assert_eq!(start.elapsed(), Duration::from_secs(state.seconds_total()));
    assert_eq!(reader.seconds_remaining(), 0);
    assert_eq!(scheduler.state(), None);
}

#[tokio::test(start_paused = true)]
async fn force_cuts_countdown_short() {
    let control = ScheduleControl::new();
    let (mut scheduler, reader) = scheduler(&control);
    scheduler.schedule_next(RefreshWindow::new(7, 10).unwrap());

    let forcer = control.clone();
    tokio::spawn(async move {
        tokio::time::sleep(Duration::from_millis(5_500)).await;
        assert!(forcer.force());
    });

    let start = Instant::now();
    assert_eq!(scheduler.wait(|| true).await, Wakeup::Forced);
    assert!(start.elapsed() < Duration::from_secs(6));
    assert_eq!(reader.seconds_remaining(), 0);
    assert_eq!(scheduler.state(), None);
}

#[tokio::test(start_paused = true)]
async fn force_without_running_countdown_is_refused() {
    let control = ScheduleControl::new();
    let (mut scheduler, _reader) = scheduler(&control);
    assert!(!control.force());

    let state = scheduler.schedule_next(RefreshWindow::new(1, 2).unwrap());
    assert!(!control.force());

    let start = Instant::now();
    assert_eq!(scheduler.wait(|| true).await, Wakeup::Elapsed);
    assert_eq!(start.elapsed(), Duration::from_secs(state.seconds_total()));
    assert!(!control.force());
}

#[tokio::test(start_paused = true)]
async fn cancel_discards_outstanding_countdown() {
    let control = ScheduleControl::new();
    let (mut scheduler, reader) = scheduler(&control);
    scheduler.schedule_next(RefreshWindow::new(7, 10).unwrap());

    let canceller = control.clone();
    tokio::spawn(async move {
        tokio::time::sleep(Duration::from_secs(3)).await;
        canceller.cancel();
    });

    assert_eq!(scheduler.wait(|| true).await, Wakeup::Cancelled);
    assert_eq!(scheduler.state(), None);
    assert_eq!(reader.seconds_remaining(), 0);
    assert_eq!(scheduler.tick(), TickOutcome::Idle);
}

#[tokio::test(start_paused = true)]
async fn presenter_shutdown_stops_the_countdown() {
    let control = ScheduleControl::new();
    let (mut scheduler, _reader) = scheduler(&control);
    scheduler.schedule_next(RefreshWindow::new(7, 10).unwrap());

    let start = Instant::now();
    let deadline = start + Duration::from_secs(10);
    let wakeup = scheduler.wait(|| Instant::now() < deadline).await;

    assert_eq!(wakeup, Wakeup::Cancelled);
    assert_eq!(start.elapsed(), Duration::from_secs(10));
}

#[test]
fn ticks_publish_countdown_and_fire_once() {
    let control = ScheduleControl::new();
    let (mut scheduler, reader) = scheduler(&control);
    let total = scheduler
        .schedule_next(RefreshWindow::new(1, 2).unwrap())
        .seconds_total();

    for remaining in (1..total).rev() {
        assert_eq!(scheduler.tick(), TickOutcome::Pending(remaining));
        assert_eq!(reader.seconds_remaining(), remaining);
    }
    assert_eq!(scheduler.tick(), TickOutcome::Elapsed);
    assert_eq!(scheduler.tick(), TickOutcome::Idle);
}
