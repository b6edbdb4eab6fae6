use std::fmt;

/// Classification of one `add_record` response.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SyncOutcome {
    Created,
    Duplicate,
    TransportError,
    ServerError,
}

impl SyncOutcome {
    pub fn is_duplicate(self) -> bool {
        matches!(self, SyncOutcome::Duplicate)
    }
}

impl fmt::Display for SyncOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SyncOutcome::Created => write!(f, "created"),
            SyncOutcome::Duplicate => write!(f, "duplicate"),
            SyncOutcome::TransportError => write!(f, "transport error"),
            SyncOutcome::ServerError => write!(f, "server error"),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StopReason {
    /// Enough consecutive records were already known.
    DuplicateThreshold,
    /// The last rendered result was processed.
    EndOfResults,
    /// The configured sentinel pair was observed.
    Sentinel,
    /// The result at the current index stayed unreachable after a refresh.
    ResultsUnavailable,
}

impl fmt::Display for StopReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            StopReason::DuplicateThreshold => write!(f, "duplicate threshold reached"),
            StopReason::EndOfResults => write!(f, "end of results"),
            StopReason::Sentinel => write!(f, "sentinel pair observed"),
            StopReason::ResultsUnavailable => write!(f, "results unavailable"),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Decision {
    Continue,
    Done(StopReason),
}

/// A fixed (praiser, praised) pair that stops a pass when seen.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SentinelPair {
    pub praiser: String,
    pub praised: String,
}

impl SentinelPair {
    pub fn matches(&self, praiser: &str, praised_names: &[String]) -> bool {
        self.praiser == praiser && praised_names.iter().any(|name| *name == self.praised)
    }
}

/// Loop state of one scan pass. `index` is 1-based; `max_index` is one past
/// the last rendered result when the live count is known.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScanState {
    index: usize,
    duplicate_count: u32,
    duplicate_threshold: u32,
    max_index: Option<usize>,
}

impl ScanState {
    pub fn new(duplicate_threshold: u32) -> Self {
        Self {
            index: 1,
            duplicate_count: 0,
            duplicate_threshold,
            max_index: None,
        }
    }

    pub fn index(&self) -> usize {
        self.index
    }

    pub fn duplicate_count(&self) -> u32 {
        self.duplicate_count
    }

    pub fn duplicate_threshold(&self) -> u32 {
        self.duplicate_threshold
    }

    pub fn max_index(&self) -> Option<usize> {
        self.max_index
    }

    /// Updates the end bound from a live count of rendered results.
    /// `None` means the count could not be read and the bound is unknown.
    pub fn set_live_count(&mut self, count: Option<usize>) {
        self.max_index = count.map(|count| count + 1);
    }

    /// Applies the outcome of the last submission in a record's group.
    pub fn record_outcome(&mut self, outcome: SyncOutcome) {
        if outcome.is_duplicate() {
            self.duplicate_count += 1;
        } else {
            self.duplicate_count = 0;
        }
    }

    fn at_last_result(&self) -> bool {
        self.max_index
            .is_some_and(|max_index| self.index + 1 >= max_index)
    }

    /// Decides whether the pass is over after a submitted record. Advances to
    /// the next index when it is not.
    pub fn decide(
        &mut self,
        sentinel: Option<&SentinelPair>,
        praiser: &str,
        praised_names: &[String],
    ) -> Decision {
        if self.duplicate_count >= self.duplicate_threshold {
            return Decision::Done(StopReason::DuplicateThreshold);
        }
        if self.at_last_result() {
            return Decision::Done(StopReason::EndOfResults);
        }
        if sentinel.is_some_and(|pair| pair.matches(praiser, praised_names)) {
            return Decision::Done(StopReason::Sentinel);
        }
        self.index += 1;
        Decision::Continue
    }

    /// Moves past a result that is not a recognition. The duplicate count is
    /// left untouched.
    pub fn skip(&mut self) -> Decision {
        if self.at_last_result() {
            return Decision::Done(StopReason::EndOfResults);
        }
        self.index += 1;
        Decision::Continue
    }
}

/// Counters reported at the end of a pass.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PassSummary {
    pub visited: usize,
    pub skipped: usize,
    pub created: usize,
    pub duplicates: usize,
    pub errors: usize,
    pub stop_reason: Option<StopReason>,
}

impl PassSummary {
    pub fn note_outcome(&mut self, outcome: SyncOutcome) {
        match outcome {
            SyncOutcome::Created => self.created += 1,
            SyncOutcome::Duplicate => self.duplicates += 1,
            SyncOutcome::TransportError | SyncOutcome::ServerError => self.errors += 1,
        }
    }
}

impl fmt::Display for PassSummary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "visited {} skipped {} created {} duplicates {} errors {}",
            self.visited, self.skipped, self.created, self.duplicates, self.errors
        )?;
        if let Some(reason) = self.stop_reason {
            write!(f, " ({reason})")?;
        }
        Ok(())
    }
}
