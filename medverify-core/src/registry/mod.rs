//! External product registry access.
//!
//! The registry has no API; it is queried through its public search page via
//! a scripted browser session. The session is wrapped behind the narrow
//! [`RegistrySession`] capability so the matching stage can be tested
//! without a browser, and so the page's markup details (field ids, result
//! selectors) stay in configuration rather than in the algorithm.

mod mock;
mod webdriver;

pub use mock::{FailingRegistry, MockRegistry};
pub use webdriver::WebDriverRegistry;

use std::time::Duration;

use async_trait::async_trait;
use thiserror::Error;

use crate::model::{ProductMatch, SearchMode};

/// Outcome of one registry search.
#[derive(Debug, Clone, PartialEq)]
pub enum SearchOutcome {
    /// Matching rows, in page order.
    Rows(Vec<ProductMatch>),
    /// The search completed and the registry showed no results. A bounded
    /// wait that never saw a results table lands here too; it is a
    /// definitive not-found, not an error.
    NoResults,
}

#[derive(Debug, Error)]
pub enum RegistryError {
    #[error("webdriver session error: {0}")]
    Session(String),

    #[error("navigation failed: {0}")]
    Navigation(String),

    #[error("element not found: {0}")]
    ElementNotFound(String),

    #[error("http error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("unexpected webdriver response: {0}")]
    Protocol(String),
}

/// A single-use registry search session.
#[async_trait]
pub trait RegistrySession: Send + Sync {
    async fn search(&self, term: &str, mode: SearchMode) -> Result<SearchOutcome, RegistryError>;
}

/// Registry page configuration. Field ids and selectors describe the current
/// markup of the target registry and are expected to change with it.
#[derive(Debug, Clone)]
pub struct RegistryConfig {
    /// WebDriver endpoint driving the headless browser.
    pub webdriver_url: String,
    /// Registry search page.
    pub page_url: String,
    /// Element id of the registration-number search field.
    pub number_field: String,
    /// Element id of the product-name search field.
    pub name_field: String,
    /// CSS selector matching result rows.
    pub results_selector: String,
    /// Fixed wait after entering the term, for asynchronous results to
    /// render.
    pub settle: Duration,
    /// Bound on waiting for the search field to appear.
    pub field_timeout: Duration,
    /// Bound on waiting for the results table; expiry means not-found.
    pub results_timeout: Duration,
}

impl Default for RegistryConfig {
    fn default() -> Self {
        Self {
            webdriver_url: "http://127.0.0.1:9515".to_string(),
            page_url: "https://greenbook.nafdac.gov.ng/".to_string(),
            number_field: "search_nrn".to_string(),
            name_field: "search_product".to_string(),
            results_selector: "table.data-table tbody tr".to_string(),
            settle: Duration::from_secs(3),
            field_timeout: Duration::from_secs(10),
            results_timeout: Duration::from_secs(10),
        }
    }
}

impl RegistryConfig {
    #[must_use]
    pub fn with_webdriver_url(mut self, url: impl Into<String>) -> Self {
        self.webdriver_url = url.into();
        self
    }

    #[must_use]
    pub fn with_page_url(mut self, url: impl Into<String>) -> Self {
        self.page_url = url.into();
        self
    }

    #[must_use]
    pub fn with_settle(mut self, settle: Duration) -> Self {
        self.settle = settle;
        self
    }

    #[must_use]
    pub fn with_results_timeout(mut self, timeout: Duration) -> Self {
        self.results_timeout = timeout;
        self
    }
}
