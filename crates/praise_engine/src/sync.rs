use std::time::Duration;

use praise_core::SyncOutcome;
use scan_logging::{scan_debug, scan_warn};
use thiserror::Error;
use url::Url;

#[derive(Debug, Clone)]
pub struct SyncSettings {
    pub base_url: String,
    /// Shared secret sent as `s` on every call.
    pub token: String,
    pub add_record_endpoint: String,
    pub touch_endpoint: String,
    pub request_timeout: Duration,
    pub user_agent: String,
}

impl SyncSettings {
    pub fn new(base_url: impl Into<String>, token: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into(),
            token: token.into(),
            add_record_endpoint: "add_record".to_string(),
            touch_endpoint: "touch_last_sync".to_string(),
            request_timeout: Duration::from_secs(30),
            user_agent: "Chrome".to_string(),
        }
    }
}

#[derive(Debug, Error)]
pub enum SyncError {
    #[error("invalid sync url: {0}")]
    InvalidUrl(#[from] url::ParseError),
    #[error("http client: {0}")]
    Client(#[from] reqwest::Error),
}

/// Remote store of recognitions.
#[async_trait::async_trait]
pub trait SyncClient: Send + Sync {
    /// Submits one (timestamp, praiser, praised) record.
    async fn submit(&self, timestamp: &str, praiser: &str, praised: &str) -> SyncOutcome;

    /// Records server-side that a pass completed. Returns false on failure.
    async fn touch_last_sync(&self) -> bool;
}

/// Interprets an `add_record` response.
pub fn classify_response(status: u16, body: &str) -> SyncOutcome {
    match body.trim() {
        "1" => SyncOutcome::Created,
        "2" => SyncOutcome::Duplicate,
        _ if status != 200 => SyncOutcome::TransportError,
        _ => SyncOutcome::ServerError,
    }
}

#[derive(Debug, Clone)]
pub struct ReqwestSyncClient {
    client: reqwest::Client,
    base: Url,
    settings: SyncSettings,
}

impl ReqwestSyncClient {
    pub fn new(settings: SyncSettings) -> Result<Self, SyncError> {
        let mut base = settings.base_url.clone();
        if !base.ends_with('/') {
            base.push('/');
        }
        let base = Url::parse(&base)?;
        let client = reqwest::Client::builder()
            .timeout(settings.request_timeout)
            .user_agent(settings.user_agent.clone())
            .build()?;
        Ok(Self {
            client,
            base,
            settings,
        })
    }

    fn endpoint(&self, endpoint: &str, params: &[(&str, &str)]) -> Result<Url, url::ParseError> {
        let mut url = self.base.join(endpoint)?;
        url.query_pairs_mut()
            .append_pair("s", &self.settings.token)
            .extend_pairs(params);
        Ok(url)
    }

    async fn get(&self, url: Url) -> Result<(u16, String), reqwest::Error> {
        let response = self.client.get(url).send().await?;
        let status = response.status().as_u16();
        let body = response.text().await?;
        Ok((status, body))
    }
}

#[async_trait::async_trait]
impl SyncClient for ReqwestSyncClient {
    async fn submit(&self, timestamp: &str, praiser: &str, praised: &str) -> SyncOutcome {
        let url = match self.endpoint(
            &self.settings.add_record_endpoint,
            &[("t", timestamp), ("r", praiser), ("d", praised)],
        ) {
            Ok(url) => url,
            Err(err) => {
                scan_warn!("add_record url invalid: {}", err);
                return SyncOutcome::TransportError;
            }
        };

        match self.get(url).await {
            Ok((status, body)) => {
                let outcome = classify_response(status, &body);
                scan_debug!(
                    "add_record {:?} -> {:?}: status {} outcome {}",
                    praiser,
                    praised,
                    status,
                    outcome
                );
                outcome
            }
            Err(err) => {
                scan_warn!("add_record request failed: {}", err);
                SyncOutcome::TransportError
            }
        }
    }

    async fn touch_last_sync(&self) -> bool {
        let url = match self.endpoint(&self.settings.touch_endpoint, &[]) {
            Ok(url) => url,
            Err(err) => {
                scan_warn!("touch_last_sync url invalid: {}", err);
                return false;
            }
        };
        match self.get(url).await {
            Ok((200, _)) => true,
            Ok((status, _)) => {
                scan_warn!("touch_last_sync returned status {}", status);
                false
            }
            Err(err) => {
                scan_warn!("touch_last_sync request failed: {}", err);
                false
            }
        }
    }
}
