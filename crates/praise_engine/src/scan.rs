//! One pass over the search results, as an explicit state machine.
//!
//! `Refreshing -> Enumerating -> Parsing -> Verifying -> Submitting -> Deciding
//! -> (Enumerating | Done)`. Each [`Pass::step`] performs one transition and
//! checks the presenter's liveness before and after its blocking calls.

use std::collections::HashSet;
use std::sync::Arc;
use std::time::Duration;

use praise_core::{
    parse_message, Decision, MessageFormat, ParsedMessage, PassSummary, PraiseRecord,
    RawMessageBlock, ScanState, SentinelPair, StopReason, SubmissionKey, SyncOutcome,
};
use scan_logging::{scan_debug, scan_info};

use crate::{
    DocumentError, DocumentHandle, Lookup, Reporter, ScanError, Selectors, SyncClient,
    Verification, Verifier, VerifySettings,
};

#[derive(Debug, Clone)]
pub struct ScanSettings {
    /// Typed into the search box to list recognitions, newest first.
    pub search_query: String,
    pub format: MessageFormat,
    pub duplicate_threshold: u32,
    /// Pause before retrying an unreachable result.
    pub retry_delay: Duration,
    /// Retries of an unreachable result before refreshing the list.
    pub lookup_retries: u32,
    pub sentinel: Option<SentinelPair>,
}

impl Default for ScanSettings {
    fn default() -> Self {
        Self {
            search_query: "got praise!".to_string(),
            format: MessageFormat::default(),
            duplicate_threshold: 3,
            retry_delay: Duration::from_secs(1),
            lookup_retries: 3,
            sentinel: None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PhaseKind {
    Refreshing,
    Enumerating,
    Parsing,
    Verifying,
    Submitting,
    Deciding,
    Done,
    Aborted,
}

enum Phase {
    Refreshing,
    Enumerating,
    Parsing(RawMessageBlock),
    Verifying(ParsedMessage),
    Submitting(PraiseRecord),
    Deciding {
        record: PraiseRecord,
        outcome: SyncOutcome,
    },
    Done(StopReason),
    Aborted,
}

impl Phase {
    fn kind(&self) -> PhaseKind {
        match self {
            Phase::Refreshing => PhaseKind::Refreshing,
            Phase::Enumerating => PhaseKind::Enumerating,
            Phase::Parsing(_) => PhaseKind::Parsing,
            Phase::Verifying(_) => PhaseKind::Verifying,
            Phase::Submitting(_) => PhaseKind::Submitting,
            Phase::Deciding { .. } => PhaseKind::Deciding,
            Phase::Done(_) => PhaseKind::Done,
            Phase::Aborted => PhaseKind::Aborted,
        }
    }
}

pub struct ScanController {
    document: Arc<dyn DocumentHandle>,
    sync: Arc<dyn SyncClient>,
    verifier: Verifier,
    selectors: Selectors,
    settings: ScanSettings,
}

impl ScanController {
    pub fn new(
        document: Arc<dyn DocumentHandle>,
        sync: Arc<dyn SyncClient>,
        selectors: Selectors,
        settings: ScanSettings,
        verify: VerifySettings,
    ) -> Self {
        let verifier = Verifier::new(document.clone(), selectors.clone(), verify);
        Self {
            document,
            sync,
            verifier,
            selectors,
            settings,
        }
    }

    pub fn begin_pass<'a>(&'a self, reporter: &'a Reporter) -> Pass<'a> {
        Pass {
            controller: self,
            reporter,
            state: ScanState::new(self.settings.duplicate_threshold),
            phase: Phase::Refreshing,
            summary: PassSummary::default(),
            submitted: HashSet::new(),
            refreshed_at: None,
        }
    }

    /// Runs a full pass. On success the last-sync time has been touched.
    pub async fn run_pass(&self, reporter: &Reporter) -> Result<PassSummary, ScanError> {
        let mut pass = self.begin_pass(reporter);
        loop {
            if let Some(summary) = pass.step().await? {
                return Ok(summary);
            }
        }
    }

    async fn refresh(&self, reporter: &Reporter) -> Result<(), ScanError> {
        reporter.info("Refreshing search results ...")?;
        let typed = async {
            let input = self.document.find_by_path(&self.selectors.search_input).await?;
            self.document
                .clear_and_type(&input, &self.settings.search_query)
                .await?;
            self.document.submit_key(&input).await
        };
        typed.await.map_err(ScanError::Refresh)?;
        reporter.ensure_live()
    }

    async fn read_result(&self, index: usize) -> Result<RawMessageBlock, DocumentError> {
        let item = self
            .document
            .find_by_path(&self.selectors.result_item(index))
            .await?;
        self.document.scroll_into_view(&item).await?;
        self.document.click(&item).await?;
        let author = self
            .document
            .find_by_path(&self.selectors.result_author(index))
            .await?;
        let praiser_raw_label = self.document.get_text(&author).await?;
        let body = self
            .document
            .find_by_path(&self.selectors.result_body(index))
            .await?;
        let body_text = self.document.get_text(&body).await?;
        Ok(RawMessageBlock {
            praiser_raw_label,
            body_text,
        })
    }

    /// Reads the result at `index`, retrying a bounded number of times.
    async fn open_result(
        &self,
        index: usize,
        reporter: &Reporter,
    ) -> Result<Lookup<RawMessageBlock>, ScanError> {
        let mut attempt = 0;
        loop {
            reporter.ensure_live()?;
            let lookup = Lookup::from(self.read_result(index).await);
            reporter.ensure_live()?;
            match lookup {
                Lookup::Retry(what) if attempt < self.settings.lookup_retries => {
                    attempt += 1;
                    scan_debug!("result {} unreachable: {}", index, what);
                    reporter.warn(format!(
                        "Could not reach result {index}. Retry {attempt}/{} ...",
                        self.settings.lookup_retries
                    ))?;
                    tokio::time::sleep(self.settings.retry_delay).await;
                }
                other => return Ok(other),
            }
        }
    }

    async fn live_count(&self) -> Result<Option<usize>, ScanError> {
        match Lookup::from(
            self.document
                .live_result_count(&self.selectors.result_items())
                .await,
        ) {
            Lookup::Found(0) | Lookup::Retry(_) => Ok(None),
            Lookup::Found(count) => Ok(Some(count)),
            Lookup::Fatal(err) => Err(ScanError::Fatal(err)),
        }
    }
}

/// State of one pass in progress.
pub struct Pass<'a> {
    controller: &'a ScanController,
    reporter: &'a Reporter,
    state: ScanState,
    phase: Phase,
    summary: PassSummary,
    submitted: HashSet<SubmissionKey>,
    /// Index at which the list was last refreshed after a failed lookup.
    refreshed_at: Option<usize>,
}

impl Pass<'_> {
    pub fn state(&self) -> &ScanState {
        &self.state
    }

    pub fn phase(&self) -> PhaseKind {
        self.phase.kind()
    }

    pub fn summary(&self) -> &PassSummary {
        &self.summary
    }

    /// Performs one transition. Returns the summary once the pass is done.
    ///
    /// An error leaves the pass in `Aborted`; the in-flight decision is
    /// dropped and the duplicate count stays as it was.
    pub async fn step(&mut self) -> Result<Option<PassSummary>, ScanError> {
        let phase = std::mem::replace(&mut self.phase, Phase::Aborted);
        self.reporter.ensure_live()?;
        self.phase = match phase {
            Phase::Refreshing => {
                self.controller.refresh(self.reporter).await?;
                Phase::Enumerating
            }
            Phase::Enumerating => self.enumerate().await?,
            Phase::Parsing(block) => self.parse(block)?,
            Phase::Verifying(parsed) => self.verify(parsed).await?,
            Phase::Submitting(record) => self.submit(record).await?,
            Phase::Deciding { record, outcome } => {
                self.state.record_outcome(outcome);
                match self.state.decide(
                    self.controller.settings.sentinel.as_ref(),
                    &record.praiser_name,
                    record.praised_full_names(),
                ) {
                    Decision::Continue => Phase::Enumerating,
                    Decision::Done(reason) => Phase::Done(reason),
                }
            }
            Phase::Done(reason) => {
                let summary = self.finish(reason).await?;
                self.phase = Phase::Done(reason);
                return Ok(Some(summary));
            }
            Phase::Aborted => return Err(ScanError::Cancelled),
        };
        Ok(None)
    }

    async fn enumerate(&mut self) -> Result<Phase, ScanError> {
        let index = self.state.index();
        match self.controller.open_result(index, self.reporter).await? {
            Lookup::Found(block) => {
                self.summary.visited += 1;
                let live_count = self.controller.live_count().await?;
                self.state.set_live_count(live_count);
                Ok(Phase::Parsing(block))
            }
            Lookup::Retry(what) => {
                if self.refreshed_at == Some(index) {
                    self.reporter
                        .warn(format!("Result {index} still unreachable after refresh: {what}"))?;
                    return Ok(Phase::Done(StopReason::ResultsUnavailable));
                }
                self.refreshed_at = Some(index);
                self.reporter
                    .warn(format!("Could not reach result {index}. Refreshing ..."))?;
                Ok(Phase::Refreshing)
            }
            Lookup::Fatal(err) => {
                self.reporter.error(format!("Scan failed: {err}"))?;
                Err(ScanError::Fatal(err))
            }
        }
    }

    fn parse(&mut self, block: RawMessageBlock) -> Result<Phase, ScanError> {
        match parse_message(&block, &self.controller.settings.format) {
            Ok(parsed) => Ok(Phase::Verifying(parsed)),
            Err(err) => {
                self.reporter.info(format!(
                    "Result {} is not a praise ({err}). Moving to next message.",
                    self.state.index()
                ))?;
                Ok(self.skip())
            }
        }
    }

    async fn verify(&mut self, parsed: ParsedMessage) -> Result<Phase, ScanError> {
        let verification = self
            .controller
            .verifier
            .verify(
                &parsed.praiser_name,
                &parsed.praised_first_name,
                &parsed.excerpt,
                self.reporter,
            )
            .await?;
        match verification {
            Verification::Verified(found) => {
                match PraiseRecord::with_names(parsed, found.praised_full_names, found.timestamp_raw)
                {
                    Ok(record) => Ok(Phase::Submitting(record)),
                    Err(err) => {
                        self.reporter.warn(format!("Invalid praise: {err}"))?;
                        Ok(self.skip())
                    }
                }
            }
            Verification::NotFound => {
                self.reporter
                    .info("Invalid praise. Moving to next message.")?;
                Ok(self.skip())
            }
        }
    }

    async fn submit(&mut self, record: PraiseRecord) -> Result<Phase, ScanError> {
        let mut last = None;
        for key in record.submissions() {
            self.reporter.ensure_live()?;
            let outcome = if self.submitted.contains(&key) {
                scan_debug!("{:?} already submitted in this pass", key);
                SyncOutcome::Duplicate
            } else {
                let outcome = self
                    .controller
                    .sync
                    .submit(&key.timestamp, &key.praiser, &key.praised)
                    .await;
                self.submitted.insert(key.clone());
                outcome
            };
            self.summary.note_outcome(outcome);
            self.report_outcome(&key, outcome)?;
            last = Some(outcome);
        }
        // The flag may have dropped during the last submission.
        self.reporter.ensure_live()?;
        match last {
            Some(outcome) => Ok(Phase::Deciding { record, outcome }),
            None => Ok(self.skip()),
        }
    }

    fn report_outcome(&self, key: &SubmissionKey, outcome: SyncOutcome) -> Result<(), ScanError> {
        let reporter = self.reporter;
        match outcome {
            SyncOutcome::Created => reporter.info(format!(
                "New praise from {} to {}. Database has been updated.",
                key.praiser, key.praised
            )),
            SyncOutcome::Duplicate => {
                reporter.info("Duplicate praise. Moving to next message.")
            }
            SyncOutcome::TransportError => reporter.error("Cannot connect to server."),
            SyncOutcome::ServerError => reporter.error("Unexpected response from server."),
        }
    }

    fn skip(&mut self) -> Phase {
        self.summary.skipped += 1;
        match self.state.skip() {
            Decision::Continue => Phase::Enumerating,
            Decision::Done(reason) => Phase::Done(reason),
        }
    }

    async fn finish(&mut self, reason: StopReason) -> Result<PassSummary, ScanError> {
        self.summary.stop_reason = Some(reason);
        scan_info!("pass finished at result {}: {}", self.state.index(), self.summary);
        self.reporter.info(format!("Scan finished: {reason}."))?;
        if self.controller.sync.touch_last_sync().await {
            self.reporter.info("Last sync time updated.")?;
        } else {
            self.reporter.warn("Could not update last sync time.")?;
        }
        Ok(self.summary.clone())
    }
}
