use praise_core::{Decision, PassSummary, ScanState, SentinelPair, StopReason, SyncOutcome};

fn names(list: &[&str]) -> Vec<String> {
    list.iter().map(|name| name.to_string()).collect()
}

#[test]
fn new_pass_starts_at_first_result() {
    let state = ScanState::new(3);
    assert_eq!(state.index(), 1);
    assert_eq!(state.duplicate_count(), 0);
    assert_eq!(state.max_index(), None);
}

#[test]
fn duplicate_count_resets_on_any_other_outcome() {
    let mut state = ScanState::new(10);
    let outcomes = [
        (SyncOutcome::Duplicate, 1),
        (SyncOutcome::Duplicate, 2),
        (SyncOutcome::Created, 0),
        (SyncOutcome::Duplicate, 1),
        (SyncOutcome::TransportError, 0),
        (SyncOutcome::Duplicate, 1),
        (SyncOutcome::ServerError, 0),
    ];
    for (outcome, expected) in outcomes {
        state.record_outcome(outcome);
        assert_eq!(state.duplicate_count(), expected, "after {outcome}");
    }
}

#[test]
fn pass_stops_at_duplicate_threshold() {
    let mut state = ScanState::new(3);
    let praised = names(&["Amy Lee"]);
    for expected_index in 2..=3 {
        state.record_outcome(SyncOutcome::Duplicate);
        assert_eq!(state.decide(None, "Sam Diaz", &praised), Decision::Continue);
        assert_eq!(state.index(), expected_index);
    }
    state.record_outcome(SyncOutcome::Duplicate);
    assert_eq!(
        state.decide(None, "Sam Diaz", &praised),
        Decision::Done(StopReason::DuplicateThreshold)
    );
    assert_eq!(state.index(), 3);
}

#[test]
fn pass_stops_after_last_rendered_result() {
    let mut state = ScanState::new(3);
    state.set_live_count(Some(2));
    let praised = names(&["Amy Lee"]);

    state.record_outcome(SyncOutcome::Created);
    assert_eq!(state.decide(None, "Sam Diaz", &praised), Decision::Continue);
    state.record_outcome(SyncOutcome::Created);
    assert_eq!(
        state.decide(None, "Sam Diaz", &praised),
        Decision::Done(StopReason::EndOfResults)
    );
}

#[test]
fn unknown_live_count_never_ends_the_pass_by_itself() {
    let mut state = ScanState::new(u32::MAX);
    state.set_live_count(None);
    for _ in 0..100 {
        state.record_outcome(SyncOutcome::Created);
        assert_eq!(state.decide(None, "Sam Diaz", &names(&["A B"])), Decision::Continue);
    }
    assert_eq!(state.index(), 101);
}

#[test]
fn skip_keeps_duplicate_count() {
    let mut state = ScanState::new(3);
    state.set_live_count(Some(3));
    state.record_outcome(SyncOutcome::Duplicate);
    assert_eq!(state.skip(), Decision::Continue);
    assert_eq!(state.skip(), Decision::Continue);
    assert_eq!(state.index(), 3);
    assert_eq!(state.duplicate_count(), 1);
    assert_eq!(state.skip(), Decision::Done(StopReason::EndOfResults));
}

#[test]
fn sentinel_pair_stops_only_when_configured() {
    let sentinel = SentinelPair {
        praiser: "Sam Diaz".to_string(),
        praised: "Bo Chen".to_string(),
    };
    let praised = names(&["Amy Lee", "Bo Chen"]);

    let mut state = ScanState::new(3);
    state.record_outcome(SyncOutcome::Created);
    assert_eq!(state.decide(None, "Sam Diaz", &praised), Decision::Continue);

    state.record_outcome(SyncOutcome::Created);
    assert_eq!(
        state.decide(Some(&sentinel), "Sam Diaz", &praised),
        Decision::Done(StopReason::Sentinel)
    );
    assert_eq!(
        state.decide(Some(&sentinel), "Kim Park", &praised),
        Decision::Continue
    );
}

#[test]
fn summary_counts_outcomes() {
    let mut summary = PassSummary::default();
    for outcome in [
        SyncOutcome::Created,
        SyncOutcome::Duplicate,
        SyncOutcome::Duplicate,
        SyncOutcome::ServerError,
        SyncOutcome::TransportError,
    ] {
        summary.note_outcome(outcome);
    }
    assert_eq!(summary.created, 1);
    assert_eq!(summary.duplicates, 2);
    assert_eq!(summary.errors, 2);
    summary.stop_reason = Some(StopReason::DuplicateThreshold);
    assert_eq!(
        summary.to_string(),
        "visited 0 skipped 0 created 1 duplicates 2 errors 2 (duplicate threshold reached)"
    );
}
