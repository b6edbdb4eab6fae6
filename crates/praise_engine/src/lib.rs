//! Praise counter engine: document-driven scanning, remote sync and scheduling.
mod control;
mod document;
mod scan;
mod schedule;
mod secret;
mod selectors;
mod sync;
mod types;
mod verify;
mod webdriver;
mod worker;

pub use control::{Countdown, CountdownReader, PassGuard, PassPermit, Presenter, Reporter};
pub use document::{DocumentError, DocumentHandle, ElementRef, Lookup};
pub use scan::{Pass, PhaseKind, ScanController, ScanSettings};
pub use schedule::{ScheduleControl, Scheduler, TickOutcome, Wakeup};
pub use secret::{extract_secret, locate_secret_key, SecretSearch};
pub use selectors::{xpath_literal, Selectors};
pub use sync::{classify_response, ReqwestSyncClient, SyncClient, SyncError, SyncSettings};
pub use types::{ScanError, WorkerEvent};
pub use verify::{Verification, VerifiedMatch, Verifier, VerifySettings};
pub use webdriver::{WebDriverDocument, WebDriverSettings};
pub use worker::{RunMode, WorkerHandle, WorkerSession, WorkerSettings};

pub use praise_core::{PassSummary, RefreshWindow, StopReason, SyncOutcome};
