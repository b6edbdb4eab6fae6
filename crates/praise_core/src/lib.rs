//! Praise counter core: pure parsing, scan bookkeeping and scheduling math.
mod parse;
mod record;
mod scan;
mod schedule;

pub use parse::{
    excerpt_window, normalize_excerpt, parse_message, strip_deletion_marker, MessageFormat,
    ParseError, EXCERPT_MAX, EXCERPT_MIN,
};
pub use record::{
    split_praised_names, ParsedMessage, PraiseRecord, RawMessageBlock, RecordError, SubmissionKey,
};
pub use scan::{Decision, PassSummary, ScanState, SentinelPair, StopReason, SyncOutcome};
pub use schedule::{schedule_next, RefreshWindow, ScheduleError, ScheduleState};
