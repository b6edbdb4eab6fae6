//! RON configuration for the praise counter.
//!
//! Every field is optional; a missing file means "all defaults".

use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use anyhow::{bail, Context, Result};
use praise_core::{MessageFormat, RefreshWindow, SentinelPair};
use praise_engine::{
    RunMode, ScanSettings, SecretSearch, Selectors, SyncSettings, VerifySettings,
    WebDriverSettings, WorkerSettings,
};
use scan_logging::{LevelFilter, LogDestination};
use serde::{Deserialize, Serialize};

pub const DEFAULT_CONFIG_FILE: &str = "praise_counter.ron";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SentinelConfig {
    pub praiser: String,
    pub praised: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    pub webdriver_url: String,
    pub initial_page: Option<String>,
    pub browser_args: Vec<String>,
    pub implicit_wait_secs: u64,
    pub sync_base_url: Option<String>,
    pub add_record_endpoint: String,
    pub touch_endpoint: String,
    pub secret_key: Option<String>,
    pub secret_owner: Option<String>,
    pub secret_query: String,
    pub secret_prefix: String,
    pub search_query: String,
    pub praise_marker: String,
    pub deletion_marker: String,
    pub duplicate_threshold: u32,
    pub refresh_minutes_low: u64,
    pub refresh_minutes_high: u64,
    pub retry_delay_ms: u64,
    pub lookup_retries: u32,
    pub name_render_attempts: u32,
    /// Applies to calls against the sync API.
    pub request_timeout_secs: u64,
    pub sentinel: Option<SentinelConfig>,
    pub log_file: Option<PathBuf>,
}

impl Default for AppConfig {
    fn default() -> Self {
        let format = MessageFormat::default();
        Self {
            webdriver_url: "http://localhost:9515".to_string(),
            initial_page: None,
            browser_args: Vec::new(),
            implicit_wait_secs: 10,
            sync_base_url: None,
            add_record_endpoint: "add_record".to_string(),
            touch_endpoint: "touch_last_sync".to_string(),
            secret_key: None,
            secret_owner: None,
            secret_query: "#secret_key".to_string(),
            secret_prefix: "#secret_key:".to_string(),
            search_query: "got praise!".to_string(),
            praise_marker: format.praise_marker,
            deletion_marker: format.deletion_marker,
            duplicate_threshold: 3,
            refresh_minutes_low: 7,
            refresh_minutes_high: 10,
            retry_delay_ms: 1000,
            lookup_retries: 3,
            name_render_attempts: 10,
            request_timeout_secs: 30,
            sentinel: None,
            log_file: None,
        }
    }
}

/// Where the sync token comes from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TokenSource {
    Configured(String),
    Discover(SecretSearch),
}

impl AppConfig {
    /// Reads and validates the config file. Returns `Ok(None)` when the file
    /// does not exist.
    pub fn load(path: &Path) -> Result<Option<Self>> {
        let content = match fs::read_to_string(path) {
            Ok(text) => text,
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => return Ok(None),
            Err(err) => {
                return Err(err).with_context(|| format!("failed to read config {path:?}"))
            }
        };
        let config: AppConfig =
            ron::from_str(&content).with_context(|| format!("failed to parse config {path:?}"))?;
        config
            .validate()
            .with_context(|| format!("invalid config {path:?}"))?;
        Ok(Some(config))
    }

    pub fn validate(&self) -> Result<()> {
        self.refresh_window()?;
        if self.duplicate_threshold == 0 {
            bail!("duplicate_threshold must be at least 1");
        }
        Ok(())
    }

    pub fn refresh_window(&self) -> Result<RefreshWindow> {
        RefreshWindow::new(self.refresh_minutes_low, self.refresh_minutes_high)
            .context("invalid refresh_minutes_low/refresh_minutes_high")
    }

    /// Logger destination and level. Presenter lines already reach stdout, so
    /// the terminal logger stays at warnings unless `verbose` is set.
    pub fn log_target(&self, verbose: bool) -> (LogDestination, LevelFilter) {
        let level = if verbose {
            LevelFilter::Debug
        } else {
            LevelFilter::Info
        };
        match (&self.log_file, verbose) {
            (Some(_), true) => (LogDestination::Both, level),
            (Some(_), false) => (LogDestination::File, level),
            (None, true) => (LogDestination::Terminal, level),
            (None, false) => (LogDestination::Terminal, LevelFilter::Warn),
        }
    }

    fn retry_delay(&self) -> Duration {
        Duration::from_millis(self.retry_delay_ms)
    }

    pub fn scan_settings(&self) -> ScanSettings {
        ScanSettings {
            search_query: self.search_query.clone(),
            format: MessageFormat {
                praise_marker: self.praise_marker.clone(),
                deletion_marker: self.deletion_marker.clone(),
                ..MessageFormat::default()
            },
            duplicate_threshold: self.duplicate_threshold,
            retry_delay: self.retry_delay(),
            lookup_retries: self.lookup_retries,
            sentinel: self.sentinel.as_ref().map(|pair| SentinelPair {
                praiser: pair.praiser.clone(),
                praised: pair.praised.clone(),
            }),
        }
    }

    pub fn verify_settings(&self) -> VerifySettings {
        VerifySettings {
            retry_delay: self.retry_delay(),
            name_render_attempts: self.name_render_attempts,
        }
    }

    pub fn worker_settings(&self, mode: RunMode) -> Result<WorkerSettings> {
        Ok(WorkerSettings {
            scan: self.scan_settings(),
            verify: self.verify_settings(),
            selectors: Selectors::default(),
            refresh_window: self.refresh_window()?,
            mode,
        })
    }

    pub fn webdriver_settings(&self) -> WebDriverSettings {
        WebDriverSettings {
            server_url: self.webdriver_url.clone(),
            browser_args: self.browser_args.clone(),
            initial_page: self.initial_page.clone(),
            implicit_wait: Duration::from_secs(self.implicit_wait_secs),
            ..WebDriverSettings::default()
        }
    }

    /// Sync settings carrying the configured token, or an empty one when the
    /// token is discovered at startup.
    pub fn sync_settings(&self) -> Result<SyncSettings> {
        let Some(base_url) = self.sync_base_url.as_deref() else {
            bail!("sync_base_url is not configured");
        };
        let mut settings = SyncSettings::new(base_url, self.secret_key.clone().unwrap_or_default());
        settings.add_record_endpoint = self.add_record_endpoint.clone();
        settings.touch_endpoint = self.touch_endpoint.clone();
        settings.request_timeout = Duration::from_secs(self.request_timeout_secs);
        Ok(settings)
    }

    pub fn token_source(&self) -> Result<TokenSource> {
        if let Some(token) = self.secret_key.as_deref().filter(|token| !token.is_empty()) {
            return Ok(TokenSource::Configured(token.to_string()));
        }
        let Some(owner) = self.secret_owner.as_deref() else {
            bail!("neither secret_key nor secret_owner is configured");
        };
        let mut search = SecretSearch::new(owner);
        search.query = self.secret_query.clone();
        search.prefix = self.secret_prefix.clone();
        search.retry_delay = self.retry_delay();
        Ok(TokenSource::Discover(search))
    }
}
