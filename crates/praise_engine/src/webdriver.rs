//! [`DocumentHandle`] over the W3C WebDriver HTTP protocol.
//!
//! Talks to an already running driver (e.g. chromedriver); provisioning the
//! driver binary is out of scope.

use std::time::Duration;

use reqwest::header::CONTENT_TYPE;
use reqwest::Method;
use scan_logging::{scan_info, scan_trace};
use serde_json::{json, Value};

use crate::{DocumentError, DocumentHandle, ElementRef};

/// Key under which W3C drivers return element references.
const ELEMENT_KEY: &str = "element-6066-11e4-a52e-4f735466cecf";
const ENTER_KEY: &str = "\u{E007}";

#[derive(Debug, Clone)]
pub struct WebDriverSettings {
    pub server_url: String,
    pub browser_name: String,
    pub browser_args: Vec<String>,
    pub initial_page: Option<String>,
    /// How long the driver keeps looking for a missing element.
    pub implicit_wait: Duration,
    pub request_timeout: Duration,
}

impl Default for WebDriverSettings {
    fn default() -> Self {
        Self {
            server_url: "http://localhost:9515".to_string(),
            browser_name: "chrome".to_string(),
            browser_args: Vec::new(),
            initial_page: None,
            implicit_wait: Duration::from_secs(10),
            request_timeout: Duration::from_secs(60),
        }
    }
}

#[derive(Debug, Clone)]
pub struct WebDriverDocument {
    client: reqwest::Client,
    session_url: String,
}

impl WebDriverDocument {
    /// Opens a browser session, applies the implicit wait and loads the
    /// initial page.
    pub async fn connect(settings: &WebDriverSettings) -> Result<Self, DocumentError> {
        let client = reqwest::Client::builder()
            .timeout(settings.request_timeout)
            .build()
            .map_err(|err| DocumentError::HandleUnreachable(err.to_string()))?;
        let server = settings.server_url.trim_end_matches('/');

        let capabilities = json!({
            "capabilities": {
                "alwaysMatch": {
                    "browserName": settings.browser_name,
                    "goog:chromeOptions": { "args": settings.browser_args },
                }
            }
        });
        let created = send(
            &client,
            Method::POST,
            &format!("{server}/session"),
            Some(&capabilities),
        )
        .await?;
        let session_id = created
            .get("sessionId")
            .and_then(Value::as_str)
            .ok_or_else(|| {
                DocumentError::SessionLost("driver response carries no session id".to_string())
            })?;
        scan_info!("webdriver session {} opened", session_id);

        let document = Self {
            client,
            session_url: format!("{server}/session/{session_id}"),
        };
        let implicit_ms = settings.implicit_wait.as_millis() as u64;
        document
            .command(Method::POST, "/timeouts", Some(json!({ "implicit": implicit_ms })))
            .await?;
        if let Some(page) = settings.initial_page.as_deref() {
            document
                .command(Method::POST, "/url", Some(json!({ "url": page })))
                .await?;
        }
        Ok(document)
    }

    async fn command(
        &self,
        method: Method,
        path: &str,
        body: Option<Value>,
    ) -> Result<Value, DocumentError> {
        let url = format!("{}{}", self.session_url, path);
        scan_trace!("webdriver {} {}", method, path);
        send(&self.client, method, &url, body.as_ref()).await
    }

    async fn find(&self, path: &str, query: &str) -> Result<ElementRef, DocumentError> {
        let value = self
            .command(
                Method::POST,
                path,
                Some(json!({ "using": "xpath", "value": query })),
            )
            .await?;
        element_ref(&value)
    }

    async fn send_text(&self, element: &ElementRef, text: &str) -> Result<(), DocumentError> {
        self.command(
            Method::POST,
            &format!("/element/{}/value", element.id()),
            Some(json!({ "text": text })),
        )
        .await
        .map(|_| ())
    }
}

#[async_trait::async_trait]
impl DocumentHandle for WebDriverDocument {
    async fn find_by_path(&self, query: &str) -> Result<ElementRef, DocumentError> {
        self.find("/element", query).await
    }

    async fn find_from(
        &self,
        origin: &ElementRef,
        query: &str,
    ) -> Result<ElementRef, DocumentError> {
        self.find(&format!("/element/{}/element", origin.id()), query)
            .await
    }

    async fn click(&self, element: &ElementRef) -> Result<(), DocumentError> {
        self.command(
            Method::POST,
            &format!("/element/{}/click", element.id()),
            Some(json!({})),
        )
        .await
        .map(|_| ())
    }

    async fn scroll_into_view(&self, element: &ElementRef) -> Result<(), DocumentError> {
        self.command(
            Method::POST,
            "/execute/sync",
            Some(json!({
                "script": "arguments[0].scrollIntoView();",
                "args": [{ ELEMENT_KEY: element.id() }],
            })),
        )
        .await
        .map(|_| ())
    }

    async fn clear_and_type(&self, element: &ElementRef, text: &str) -> Result<(), DocumentError> {
        self.command(
            Method::POST,
            &format!("/element/{}/clear", element.id()),
            Some(json!({})),
        )
        .await?;
        self.send_text(element, text).await
    }

    async fn submit_key(&self, element: &ElementRef) -> Result<(), DocumentError> {
        self.send_text(element, ENTER_KEY).await
    }

    async fn get_text(&self, element: &ElementRef) -> Result<String, DocumentError> {
        let value = self
            .command(Method::GET, &format!("/element/{}/text", element.id()), None)
            .await?;
        Ok(value.as_str().unwrap_or_default().to_string())
    }

    async fn get_attribute(&self, element: &ElementRef, name: &str) -> Result<String, DocumentError> {
        let value = self
            .command(
                Method::GET,
                &format!("/element/{}/attribute/{}", element.id(), name),
                None,
            )
            .await?;
        Ok(value.as_str().unwrap_or_default().to_string())
    }

    async fn live_result_count(&self, query: &str) -> Result<usize, DocumentError> {
        let value = self
            .command(
                Method::POST,
                "/elements",
                Some(json!({ "using": "xpath", "value": query })),
            )
            .await?;
        value
            .as_array()
            .map(Vec::len)
            .ok_or_else(|| malformed("element list expected"))
    }

    async fn close(&self) -> Result<(), DocumentError> {
        self.command(Method::DELETE, "", None).await.map(|_| ())
    }
}

async fn send(
    client: &reqwest::Client,
    method: Method,
    url: &str,
    body: Option<&Value>,
) -> Result<Value, DocumentError> {
    let mut request = client.request(method, url);
    if let Some(body) = body {
        request = request
            .header(CONTENT_TYPE, "application/json")
            .body(body.to_string());
    }
    let response = request
        .send()
        .await
        .map_err(|err| DocumentError::HandleUnreachable(err.to_string()))?;
    let status = response.status();
    let bytes = response
        .bytes()
        .await
        .map_err(|err| DocumentError::HandleUnreachable(err.to_string()))?;
    let payload: Value = serde_json::from_slice(&bytes)
        .map_err(|err| malformed(&format!("invalid json ({err})")))?;
    let value = payload.get("value").cloned().unwrap_or(Value::Null);
    if status.is_success() {
        Ok(value)
    } else {
        Err(map_driver_error(&value))
    }
}

fn element_ref(value: &Value) -> Result<ElementRef, DocumentError> {
    value
        .get(ELEMENT_KEY)
        .and_then(Value::as_str)
        .map(ElementRef::new)
        .ok_or_else(|| malformed("element reference expected"))
}

fn malformed(what: &str) -> DocumentError {
    DocumentError::HandleUnreachable(format!("malformed driver response: {what}"))
}

/// Maps a W3C error payload onto the document error taxonomy.
fn map_driver_error(value: &Value) -> DocumentError {
    let code = value
        .get("error")
        .and_then(Value::as_str)
        .unwrap_or("unknown error");
    let message = value
        .get("message")
        .and_then(Value::as_str)
        .unwrap_or_default();
    let detail = format!("{code}: {message}");
    match code {
        "no such element"
        | "stale element reference"
        | "element not interactable"
        | "element click intercepted" => DocumentError::ElementNotFound(detail),
        "invalid session id" | "no such window" | "session not created" => {
            DocumentError::SessionLost(detail)
        }
        _ => DocumentError::HandleUnreachable(detail),
    }
}
