use std::sync::Arc;
use std::time::Duration;

use praise_core::split_praised_names;
use scan_logging::scan_debug;

use crate::{DocumentError, DocumentHandle, Lookup, Reporter, ScanError, Selectors};

#[derive(Debug, Clone)]
pub struct VerifySettings {
    /// Pause between reads of a card that has not finished rendering.
    pub retry_delay: Duration,
    /// Reads of the praised-name paragraph before giving up on a card.
    pub name_render_attempts: u32,
}

impl Default for VerifySettings {
    fn default() -> Self {
        Self {
            retry_delay: Duration::from_secs(1),
            name_render_attempts: 10,
        }
    }
}

/// Data read from a confirmed recognition card.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VerifiedMatch {
    pub praised_full_names: Vec<String>,
    pub timestamp_raw: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Verification {
    Verified(VerifiedMatch),
    NotFound,
}

/// Confirms that a parsed message belongs to a genuine recognition card.
pub struct Verifier {
    document: Arc<dyn DocumentHandle>,
    selectors: Selectors,
    settings: VerifySettings,
}

impl Verifier {
    pub fn new(
        document: Arc<dyn DocumentHandle>,
        selectors: Selectors,
        settings: VerifySettings,
    ) -> Self {
        Self {
            document,
            selectors,
            settings,
        }
    }

    pub async fn verify(
        &self,
        praiser_name: &str,
        praised_first_name: &str,
        excerpt: &str,
        reporter: &Reporter,
    ) -> Result<Verification, ScanError> {
        reporter.ensure_live()?;
        let card = self
            .selectors
            .praise_card(praiser_name, praised_first_name, excerpt);
        match Lookup::from(self.document.find_by_path(&card).await) {
            Lookup::Found(_) => {}
            Lookup::Retry(what) => {
                scan_debug!("no praise card for {:?}: {}", praiser_name, what);
                return Ok(Verification::NotFound);
            }
            Lookup::Fatal(err) => return Err(ScanError::Fatal(err)),
        }

        let names_query = self
            .selectors
            .praised_names(praiser_name, praised_first_name, excerpt);
        let mut rendered = None;
        for attempt in 1..=self.settings.name_render_attempts {
            reporter.ensure_live()?;
            let read = async {
                let element = self.document.find_by_path(&names_query).await?;
                let text = self.document.get_text(&element).await?;
                Ok::<_, DocumentError>((element, text))
            };
            match Lookup::from(read.await) {
                Lookup::Found((element, text)) if !text.trim().is_empty() => {
                    rendered = Some((element, text));
                    break;
                }
                Lookup::Found(_) | Lookup::Retry(_) => {
                    scan_debug!(
                        "praised names not rendered yet (attempt {}/{})",
                        attempt,
                        self.settings.name_render_attempts
                    );
                    tokio::time::sleep(self.settings.retry_delay).await;
                }
                Lookup::Fatal(err) => return Err(ScanError::Fatal(err)),
            }
        }
        reporter.ensure_live()?;
        let Some((names_element, praised_text)) = rendered else {
            reporter.warn("Praise card never showed the praised names.")?;
            return Ok(Verification::NotFound);
        };

        let read_timestamp = async {
            let stamp = self
                .document
                .find_from(&names_element, &self.selectors.message_timestamp())
                .await?;
            self.document
                .get_attribute(&stamp, &self.selectors.timestamp_attribute)
                .await
        };
        let timestamp_raw = match Lookup::from(read_timestamp.await) {
            Lookup::Found(stamp) if !stamp.trim().is_empty() => stamp,
            Lookup::Found(_) | Lookup::Retry(_) => {
                reporter.warn("Praise card has no timestamp.")?;
                return Ok(Verification::NotFound);
            }
            Lookup::Fatal(err) => return Err(ScanError::Fatal(err)),
        };

        let praised_full_names = split_praised_names(&praised_text);
        if praised_full_names.is_empty() {
            return Ok(Verification::NotFound);
        }
        Ok(Verification::Verified(VerifiedMatch {
            praised_full_names,
            timestamp_raw,
        }))
    }
}
