use std::sync::Arc;

use praise_engine::{
    locate_secret_key, DocumentHandle, ReqwestSyncClient, Reporter, ScanError, Selectors,
    SyncSettings, WebDriverDocument, WebDriverSettings, WorkerSession,
};
use scan_logging::scan_warn;

use crate::TokenSource;

/// Opens the browser session, resolves the sync token and builds the sync
/// client. The browser session is closed again if a later step fails.
pub async fn connect_session(
    webdriver: WebDriverSettings,
    selectors: Selectors,
    token: TokenSource,
    mut sync: SyncSettings,
    reporter: Reporter,
) -> Result<WorkerSession, ScanError> {
    reporter.info(format!("Connecting to {} ...", webdriver.server_url))?;
    let document: Arc<dyn DocumentHandle> = Arc::new(
        WebDriverDocument::connect(&webdriver)
            .await
            .map_err(ScanError::Fatal)?,
    );

    let resolved = match token {
        TokenSource::Configured(token) => Ok(token),
        TokenSource::Discover(search) => {
            locate_secret_key(document.as_ref(), &selectors, &search, &reporter).await
        }
    };
    let client = resolved.and_then(|token| {
        sync.token = token;
        ReqwestSyncClient::new(sync).map_err(|err| ScanError::SyncSetup(err.to_string()))
    });

    match client {
        Ok(client) => Ok(WorkerSession {
            document,
            sync: Arc::new(client),
        }),
        Err(err) => {
            if let Err(close_err) = document.close().await {
                scan_warn!("closing document handle failed: {}", close_err);
            }
            Err(err)
        }
    }
}
