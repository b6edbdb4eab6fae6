#![allow(dead_code)]

use std::collections::{HashMap, VecDeque};
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex, Once};
use std::time::Duration;

use praise_core::{parse_message, MessageFormat, RawMessageBlock, SyncOutcome};
use praise_engine::{
    DocumentError, DocumentHandle, ElementRef, Presenter, Reporter, ScanSettings, Selectors,
    SyncClient, VerifySettings,
};
use tokio_util::sync::CancellationToken;

pub fn init_logging() {
    static INIT: Once = Once::new();
    INIT.call_once(scan_logging::initialize_for_tests);
}

pub struct TestPresenter {
    running: AtomicBool,
    lines: Mutex<Vec<String>>,
}

impl TestPresenter {
    pub fn new() -> Arc<Self> {
        Arc::new(Self {
            running: AtomicBool::new(true),
            lines: Mutex::new(Vec::new()),
        })
    }

    pub fn shut_down(&self) {
        self.running.store(false, Ordering::SeqCst);
    }

    pub fn lines(&self) -> Vec<String> {
        self.lines.lock().unwrap().clone()
    }
}

impl Presenter for TestPresenter {
    fn log(&self, text: &str, _with_timestamp: bool) -> bool {
        if !self.is_running() {
            return false;
        }
        self.lines.lock().unwrap().push(text.to_string());
        true
    }

    fn is_running(&self) -> bool {
        self.running.load(Ordering::SeqCst)
    }
}

pub fn reporter(presenter: &Arc<TestPresenter>) -> Reporter {
    Reporter::new(presenter.clone(), CancellationToken::new())
}

pub fn fast_scan_settings(duplicate_threshold: u32) -> ScanSettings {
    ScanSettings {
        duplicate_threshold,
        retry_delay: Duration::from_millis(1),
        ..ScanSettings::default()
    }
}

pub fn fast_verify_settings() -> VerifySettings {
    VerifySettings {
        retry_delay: Duration::from_millis(1),
        name_render_attempts: 3,
    }
}

/// Card rendered for a search result, keyed by what the parser extracts.
#[derive(Clone)]
pub struct FakeCard {
    praiser: String,
    first_name: String,
    excerpt: String,
    names: String,
    timestamp: String,
}

#[derive(Clone)]
pub struct FakeResult {
    author: String,
    body: String,
    card: Option<FakeCard>,
}

impl FakeResult {
    /// A recognition whose card lists `names` (comma separated) at `timestamp`.
    pub fn praise(author: &str, body: &str, names: &str, timestamp: &str) -> Self {
        let parsed = parse_message(&RawMessageBlock::new(author, body), &MessageFormat::default())
            .expect("fixture parses");
        Self {
            author: author.to_string(),
            body: body.to_string(),
            card: Some(FakeCard {
                praiser: parsed.praiser_name,
                first_name: parsed.praised_first_name,
                excerpt: parsed.excerpt,
                names: names.to_string(),
                timestamp: timestamp.to_string(),
            }),
        }
    }

    /// A message that mentions praise but has no recognition card.
    pub fn without_card(author: &str, body: &str) -> Self {
        Self {
            author: author.to_string(),
            body: body.to_string(),
            card: None,
        }
    }
}

/// Scriptable stand-in for the chat panel.
pub struct FakeDocument {
    selectors: Selectors,
    results: Vec<FakeResult>,
    has_search_input: bool,
    live_count: Option<usize>,
    /// Remaining failures of the result-item lookup per index.
    flaky: Mutex<HashMap<usize, u32>>,
    session_lost: AtomicBool,
    searches: Mutex<Vec<String>>,
    queries: Mutex<Vec<String>>,
    closed: AtomicBool,
}

impl FakeDocument {
    pub fn new(results: Vec<FakeResult>) -> Self {
        let live_count = Some(results.len());
        Self {
            selectors: Selectors::default(),
            results,
            has_search_input: true,
            live_count,
            flaky: Mutex::new(HashMap::new()),
            session_lost: AtomicBool::new(false),
            searches: Mutex::new(Vec::new()),
            queries: Mutex::new(Vec::new()),
            closed: AtomicBool::new(false),
        }
    }

    pub fn with_live_count(mut self, count: Option<usize>) -> Self {
        self.live_count = count;
        self
    }

    pub fn without_search_input(mut self) -> Self {
        self.has_search_input = false;
        self
    }

    /// The result at `index` is unreachable for the next `times` lookups.
    pub fn flaky_at(self, index: usize, times: u32) -> Self {
        self.flaky.lock().unwrap().insert(index, times);
        self
    }

    pub fn lose_session(&self) {
        self.session_lost.store(true, Ordering::SeqCst);
    }

    pub fn searches(&self) -> Vec<String> {
        self.searches.lock().unwrap().clone()
    }

    pub fn queries(&self) -> Vec<String> {
        self.queries.lock().unwrap().clone()
    }

    pub fn is_closed(&self) -> bool {
        self.closed.load(Ordering::SeqCst)
    }

    fn check_session(&self) -> Result<(), DocumentError> {
        if self.session_lost.load(Ordering::SeqCst) {
            return Err(DocumentError::SessionLost("window closed".to_string()));
        }
        Ok(())
    }

    fn locate(&self, query: &str) -> Option<String> {
        if self.has_search_input && query == self.selectors.search_input {
            return Some("search".to_string());
        }
        for (offset, result) in self.results.iter().enumerate() {
            let index = offset + 1;
            if query == self.selectors.result_item(index) {
                let mut flaky = self.flaky.lock().unwrap();
                if let Some(left) = flaky.get_mut(&index) {
                    if *left > 0 {
                        *left -= 1;
                        return None;
                    }
                }
                return Some(format!("item-{index}"));
            }
            if query == self.selectors.result_author(index) {
                return Some(format!("author-{index}"));
            }
            if query == self.selectors.result_body(index) {
                return Some(format!("body-{index}"));
            }
            if let Some(card) = &result.card {
                if query == self.selectors.praise_card(&card.praiser, &card.first_name, &card.excerpt)
                {
                    return Some(format!("card-{index}"));
                }
                if query
                    == self
                        .selectors
                        .praised_names(&card.praiser, &card.first_name, &card.excerpt)
                {
                    return Some(format!("names-{index}"));
                }
            }
        }
        None
    }

    fn result_for<'a>(&'a self, element: &'a ElementRef) -> Option<(&'a str, &'a FakeResult)> {
        let (kind, index) = element.id().split_once('-')?;
        let index: usize = index.parse().ok()?;
        self.results.get(index - 1).map(|result| (kind, result))
    }
}

#[async_trait::async_trait]
impl DocumentHandle for FakeDocument {
    async fn find_by_path(&self, query: &str) -> Result<ElementRef, DocumentError> {
        self.check_session()?;
        self.queries.lock().unwrap().push(query.to_string());
        self.locate(query)
            .map(ElementRef::new)
            .ok_or_else(|| DocumentError::ElementNotFound(query.to_string()))
    }

    async fn find_from(
        &self,
        origin: &ElementRef,
        _query: &str,
    ) -> Result<ElementRef, DocumentError> {
        self.check_session()?;
        match self.result_for(origin) {
            Some(("names", _)) => Ok(ElementRef::new(origin.id().replace("names", "stamp"))),
            _ => Err(DocumentError::ElementNotFound(origin.to_string())),
        }
    }

    async fn click(&self, _element: &ElementRef) -> Result<(), DocumentError> {
        self.check_session()
    }

    async fn scroll_into_view(&self, _element: &ElementRef) -> Result<(), DocumentError> {
        self.check_session()
    }

    async fn clear_and_type(&self, _element: &ElementRef, text: &str) -> Result<(), DocumentError> {
        self.check_session()?;
        self.searches.lock().unwrap().push(text.to_string());
        Ok(())
    }

    async fn submit_key(&self, _element: &ElementRef) -> Result<(), DocumentError> {
        self.check_session()
    }

    async fn get_text(&self, element: &ElementRef) -> Result<String, DocumentError> {
        self.check_session()?;
        match self.result_for(element) {
            Some(("author", result)) => Ok(result.author.clone()),
            Some(("body", result)) => Ok(result.body.clone()),
            Some(("names", result)) => Ok(result
                .card
                .as_ref()
                .map(|card| card.names.clone())
                .unwrap_or_default()),
            _ => Ok(String::new()),
        }
    }

    async fn get_attribute(&self, element: &ElementRef, name: &str) -> Result<String, DocumentError> {
        self.check_session()?;
        match (self.result_for(element), name) {
            (Some(("stamp", result)), "title") => Ok(result
                .card
                .as_ref()
                .map(|card| card.timestamp.clone())
                .unwrap_or_default()),
            _ => Ok(String::new()),
        }
    }

    async fn live_result_count(&self, query: &str) -> Result<usize, DocumentError> {
        self.check_session()?;
        self.live_count
            .ok_or_else(|| DocumentError::ElementNotFound(query.to_string()))
    }

    async fn close(&self) -> Result<(), DocumentError> {
        self.closed.store(true, Ordering::SeqCst);
        Ok(())
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SubmitCall {
    pub timestamp: String,
    pub praiser: String,
    pub praised: String,
}

/// Records submissions and answers with scripted outcomes (`Created` once
/// the script runs out).
pub struct FakeSync {
    outcomes: Mutex<VecDeque<SyncOutcome>>,
    calls: Mutex<Vec<SubmitCall>>,
    touches: AtomicUsize,
    stop_presenter_after: Option<(usize, Arc<TestPresenter>)>,
}

impl FakeSync {
    pub fn new(outcomes: Vec<SyncOutcome>) -> Self {
        Self {
            outcomes: Mutex::new(outcomes.into()),
            calls: Mutex::new(Vec::new()),
            touches: AtomicUsize::new(0),
            stop_presenter_after: None,
        }
    }

    /// Shuts the presenter down while the `calls`-th submission is in flight.
    pub fn stopping_presenter_after(mut self, calls: usize, presenter: Arc<TestPresenter>) -> Self {
        self.stop_presenter_after = Some((calls, presenter));
        self
    }

    pub fn calls(&self) -> Vec<SubmitCall> {
        self.calls.lock().unwrap().clone()
    }

    pub fn touches(&self) -> usize {
        self.touches.load(Ordering::SeqCst)
    }
}

#[async_trait::async_trait]
impl SyncClient for FakeSync {
    async fn submit(&self, timestamp: &str, praiser: &str, praised: &str) -> SyncOutcome {
        let call_count = {
            let mut calls = self.calls.lock().unwrap();
            calls.push(SubmitCall {
                timestamp: timestamp.to_string(),
                praiser: praiser.to_string(),
                praised: praised.to_string(),
            });
            calls.len()
        };
        if let Some((after, presenter)) = &self.stop_presenter_after {
            if call_count == *after {
                presenter.shut_down();
            }
        }
        self.outcomes
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or(SyncOutcome::Created)
    }

    async fn touch_last_sync(&self) -> bool {
        self.touches.fetch_add(1, Ordering::SeqCst);
        true
    }
}
