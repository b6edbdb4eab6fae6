//! Finds the sync token in the chat history when none is configured.
//!
//! The store owner posts a message of the form `#secret_key:<token>`; searching
//! for the keyword brings it up in the result list.

use std::time::Duration;

use scan_logging::scan_debug;

use crate::{DocumentHandle, Lookup, Reporter, ScanError, Selectors};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SecretSearch {
    pub query: String,
    pub owner: String,
    pub prefix: String,
    pub retry_delay: Duration,
    pub max_attempts: u32,
}

impl SecretSearch {
    pub fn new(owner: impl Into<String>) -> Self {
        Self {
            query: "#secret_key".to_string(),
            owner: owner.into(),
            prefix: "#secret_key:".to_string(),
            retry_delay: Duration::from_secs(1),
            max_attempts: 30,
        }
    }
}

/// Returns the token following `prefix` in a message body.
pub fn extract_secret<'a>(body: &'a str, prefix: &str) -> Option<&'a str> {
    let (_, rest) = body.split_once(prefix)?;
    let token = rest.split_whitespace().next()?;
    Some(token)
}

pub async fn locate_secret_key(
    document: &dyn DocumentHandle,
    selectors: &Selectors,
    search: &SecretSearch,
    reporter: &Reporter,
) -> Result<String, ScanError> {
    let mut attempts = 0;
    loop {
        reporter.ensure_live()?;
        attempts += 1;
        let typed = async {
            let input = document.find_by_path(&selectors.search_input).await?;
            document.clear_and_type(&input, &search.query).await?;
            document.submit_key(&input).await
        };
        match Lookup::from(typed.await) {
            Lookup::Found(()) => break,
            Lookup::Retry(what) if attempts < search.max_attempts => {
                reporter.warn(format!(
                    "Search bar not found ({what}). Retrying in {} ms ...",
                    search.retry_delay.as_millis()
                ))?;
                tokio::time::sleep(search.retry_delay).await;
            }
            Lookup::Retry(what) => return Err(ScanError::SecretKey(what)),
            Lookup::Fatal(err) => return Err(ScanError::Fatal(err)),
        }
    }

    reporter.info("Initializing secret key ...")?;
    let body_query = selectors.body_by_author(&search.owner);
    attempts = 0;
    loop {
        reporter.ensure_live()?;
        attempts += 1;
        let read = async {
            let body = document.find_by_path(&body_query).await?;
            document.get_text(&body).await
        };
        let missing = match Lookup::from(read.await) {
            Lookup::Found(text) => match extract_secret(&text, &search.prefix) {
                Some(token) => {
                    reporter.info("Secret key initialized.")?;
                    return Ok(token.to_string());
                }
                None => format!("message from {:?} has no {:?}", search.owner, search.prefix),
            },
            Lookup::Retry(what) => what,
            Lookup::Fatal(err) => return Err(ScanError::Fatal(err)),
        };
        if attempts >= search.max_attempts {
            return Err(ScanError::SecretKey(missing));
        }
        scan_debug!("secret key attempt {} failed: {}", attempts, missing);
        reporter.warn("Secret key not found. Retrying ...")?;
        tokio::time::sleep(search.retry_delay).await;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn token_follows_prefix() {
        assert_eq!(
            extract_secret("#secret_key:abc123", "#secret_key:"),
            Some("abc123")
        );
        assert_eq!(
            extract_secret("note #secret_key: xyz trailing", "#secret_key:"),
            Some("xyz")
        );
        assert_eq!(extract_secret("#secret_key", "#secret_key:"), None);
        assert_eq!(extract_secret("#secret_key:   ", "#secret_key:"), None);
    }
}
