//! Registry session driving a headless browser over the W3C WebDriver
//! protocol.
//!
//! The protocol is plain HTTP+JSON against a chromedriver endpoint, so no
//! browser-automation crate is needed; every command is a single reqwest
//! call. Sessions are single-use: one search, then the session is deleted
//! regardless of outcome.

use std::time::Duration;

use async_trait::async_trait;
use serde_json::{json, Value};
use tokio::time::{sleep, Instant};
use tracing::{debug, info, instrument, warn};

use super::{RegistryConfig, RegistryError, RegistrySession, SearchOutcome};
use crate::model::{ProductMatch, SearchMode};

/// W3C WebDriver element identifier key.
const ELEMENT_KEY: &str = "element-6066-11e4-a52e-4f735466cecf";

/// Poll interval while waiting for elements to appear.
const POLL_INTERVAL: Duration = Duration::from_millis(250);

/// Registry session backed by a chromedriver-compatible WebDriver endpoint.
pub struct WebDriverRegistry {
    client: reqwest::Client,
    config: RegistryConfig,
}

impl std::fmt::Debug for WebDriverRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("WebDriverRegistry")
            .field("webdriver_url", &self.config.webdriver_url)
            .field("page_url", &self.config.page_url)
            .finish()
    }
}

impl WebDriverRegistry {
    pub fn new(config: RegistryConfig) -> Result<Self, RegistryError> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(30))
            .build()
            .map_err(|e| RegistryError::Session(e.to_string()))?;
        Ok(Self { client, config })
    }

    async fn new_session(&self) -> Result<String, RegistryError> {
        let capabilities = json!({
            "capabilities": {
                "alwaysMatch": {
                    "browserName": "chrome",
                    "goog:chromeOptions": {
                        "args": [
                            "--headless=new",
                            "--no-sandbox",
                            "--disable-dev-shm-usage",
                            "--disable-gpu",
                        ]
                    }
                }
            }
        });

        let value = self.post("session", &capabilities).await?;
        value
            .get("sessionId")
            .and_then(Value::as_str)
            .map(str::to_string)
            .ok_or_else(|| RegistryError::Session(format!("no sessionId in response: {value}")))
    }

    async fn end_session(&self, session: &str) {
        let url = format!("{}/session/{session}", self.config.webdriver_url);
        if let Err(e) = self.client.delete(&url).send().await {
            warn!(error = %e, "failed to delete webdriver session");
        }
    }

    async fn navigate(&self, session: &str, url: &str) -> Result<(), RegistryError> {
        self.post(&format!("session/{session}/url"), &json!({ "url": url }))
            .await
            .map_err(|e| RegistryError::Navigation(e.to_string()))?;
        Ok(())
    }

    /// Single element lookup; `Ok(None)` when the element does not exist
    /// yet.
    async fn try_find_element(
        &self,
        session: &str,
        selector: &str,
    ) -> Result<Option<String>, RegistryError> {
        let url = format!("{}/session/{session}/element", self.config.webdriver_url);
        let response = self
            .client
            .post(&url)
            .json(&json!({ "using": "css selector", "value": selector }))
            .send()
            .await?;

        if response.status() == reqwest::StatusCode::NOT_FOUND {
            return Ok(None);
        }
        let value = Self::unwrap_value(response).await?;
        Ok(Some(Self::element_id(&value)?))
    }

    /// Wait for an element to appear, bounded by `timeout`.
    async fn find_element(
        &self,
        session: &str,
        selector: &str,
        timeout: Duration,
    ) -> Result<String, RegistryError> {
        let deadline = Instant::now() + timeout;
        loop {
            if let Some(element) = self.try_find_element(session, selector).await? {
                return Ok(element);
            }
            if Instant::now() >= deadline {
                return Err(RegistryError::ElementNotFound(selector.to_string()));
            }
            sleep(POLL_INTERVAL).await;
        }
    }

    async fn find_elements(
        &self,
        session: &str,
        selector: &str,
    ) -> Result<Vec<String>, RegistryError> {
        let value = self
            .post(
                &format!("session/{session}/elements"),
                &json!({ "using": "css selector", "value": selector }),
            )
            .await?;
        value
            .as_array()
            .ok_or_else(|| RegistryError::Protocol(format!("expected element array: {value}")))?
            .iter()
            .map(Self::element_id)
            .collect()
    }

    async fn child_elements(
        &self,
        session: &str,
        element: &str,
        selector: &str,
    ) -> Result<Vec<String>, RegistryError> {
        let value = self
            .post(
                &format!("session/{session}/element/{element}/elements"),
                &json!({ "using": "css selector", "value": selector }),
            )
            .await?;
        value
            .as_array()
            .ok_or_else(|| RegistryError::Protocol(format!("expected element array: {value}")))?
            .iter()
            .map(Self::element_id)
            .collect()
    }

    async fn clear(&self, session: &str, element: &str) -> Result<(), RegistryError> {
        self.post(
            &format!("session/{session}/element/{element}/clear"),
            &json!({}),
        )
        .await?;
        Ok(())
    }

    async fn send_keys(&self, session: &str, element: &str, text: &str) -> Result<(), RegistryError> {
        self.post(
            &format!("session/{session}/element/{element}/value"),
            &json!({ "text": text }),
        )
        .await?;
        Ok(())
    }

    async fn element_text(&self, session: &str, element: &str) -> Result<String, RegistryError> {
        let url = format!(
            "{}/session/{session}/element/{element}/text",
            self.config.webdriver_url
        );
        let response = self.client.get(&url).send().await?;
        let value = Self::unwrap_value(response).await?;
        value
            .as_str()
            .map(|s| s.trim().to_string())
            .ok_or_else(|| RegistryError::Protocol(format!("expected text value: {value}")))
    }

    async fn post(&self, path: &str, body: &Value) -> Result<Value, RegistryError> {
        let url = format!("{}/{path}", self.config.webdriver_url);
        let response = self.client.post(&url).json(body).send().await?;
        Self::unwrap_value(response).await
    }

    /// Every WebDriver response wraps its payload in a `value` field.
    async fn unwrap_value(response: reqwest::Response) -> Result<Value, RegistryError> {
        let status = response.status();
        let body: Value = response
            .json()
            .await
            .map_err(|e| RegistryError::Protocol(e.to_string()))?;
        if !status.is_success() {
            return Err(RegistryError::Protocol(format!("HTTP {status}: {body}")));
        }
        Ok(body.get("value").cloned().unwrap_or(Value::Null))
    }

    fn element_id(value: &Value) -> Result<String, RegistryError> {
        value
            .get(ELEMENT_KEY)
            .and_then(Value::as_str)
            .map(str::to_string)
            .ok_or_else(|| RegistryError::Protocol(format!("no element id in: {value}")))
    }

    /// Poll for result rows until `results_timeout`; `None` means the table
    /// never appeared.
    async fn wait_for_rows(&self, session: &str) -> Result<Option<Vec<String>>, RegistryError> {
        let deadline = Instant::now() + self.config.results_timeout;
        loop {
            let rows = self
                .find_elements(session, &self.config.results_selector)
                .await?;
            if !rows.is_empty() {
                return Ok(Some(rows));
            }
            if Instant::now() >= deadline {
                return Ok(None);
            }
            sleep(POLL_INTERVAL).await;
        }
    }

    async fn parse_row(
        &self,
        session: &str,
        row: &str,
    ) -> Result<Option<ProductMatch>, RegistryError> {
        let cells = self.child_elements(session, row, "td").await?;
        // Rows with fewer than ten columns (headers, separators) are
        // skipped, not malformed.
        if cells.len() < 10 {
            return Ok(None);
        }
        // Column mapping for the current registry markup: name, active
        // ingredients, category, reference number, ..., status.
        Ok(Some(ProductMatch {
            product_name: self.element_text(session, &cells[0]).await?,
            active_ingredients: self.element_text(session, &cells[1]).await?,
            product_category: self.element_text(session, &cells[2]).await?,
            nrn: self.element_text(session, &cells[3]).await?,
            status: self.element_text(session, &cells[9]).await?,
        }))
    }

    async fn drive(
        &self,
        session: &str,
        term: &str,
        mode: SearchMode,
    ) -> Result<SearchOutcome, RegistryError> {
        self.navigate(session, &self.config.page_url).await?;

        let field_id = match mode {
            SearchMode::RegistrationNumber => &self.config.number_field,
            SearchMode::ProductName => &self.config.name_field,
        };
        let selector = format!("#{field_id}");
        debug!(selector = %selector, "waiting for search field");
        let input = self
            .find_element(session, &selector, self.config.field_timeout)
            .await?;

        self.clear(session, &input).await?;
        self.send_keys(session, &input, term).await?;

        // Fixed settle interval for the page's asynchronous search to run.
        sleep(self.config.settle).await;

        let rows = match self.wait_for_rows(session).await? {
            Some(rows) => rows,
            None => {
                info!(term = %term, "no results table appeared within the wait bound");
                return Ok(SearchOutcome::NoResults);
            }
        };

        let mut matches = Vec::new();
        for row in &rows {
            if let Some(product) = self.parse_row(session, row).await? {
                debug!(product = %product.product_name, "parsed registry row");
                matches.push(product);
            }
        }

        if matches.is_empty() {
            Ok(SearchOutcome::NoResults)
        } else {
            Ok(SearchOutcome::Rows(matches))
        }
    }
}

#[async_trait]
impl RegistrySession for WebDriverRegistry {
    #[instrument(skip(self), fields(mode = %mode))]
    async fn search(&self, term: &str, mode: SearchMode) -> Result<SearchOutcome, RegistryError> {
        let session = self.new_session().await?;
        let outcome = self.drive(&session, term, mode).await;
        // The session is never reused between searches.
        self.end_session(&session).await;
        outcome
    }
}
