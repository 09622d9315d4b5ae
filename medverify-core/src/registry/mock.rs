//! Mock registry sessions for testing.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;

use async_trait::async_trait;

use super::{RegistryError, RegistrySession, SearchOutcome};
use crate::model::{ProductMatch, SearchMode};

/// Registry returning a canned outcome and recording what was searched.
#[derive(Debug, Default)]
pub struct MockRegistry {
    rows: Vec<ProductMatch>,
    calls: AtomicUsize,
    last_search: Mutex<Option<(String, SearchMode)>>,
}

impl MockRegistry {
    /// Registry that matches every search with the given rows.
    pub fn with_rows(rows: Vec<ProductMatch>) -> Self {
        Self {
            rows,
            ..Self::default()
        }
    }

    /// Registry that never finds anything (the results table never
    /// appears).
    pub fn empty() -> Self {
        Self::default()
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    /// Term and mode of the most recent search, if any.
    pub fn last_search(&self) -> Option<(String, SearchMode)> {
        self.last_search.lock().unwrap().clone()
    }
}

#[async_trait]
impl RegistrySession for MockRegistry {
    async fn search(&self, term: &str, mode: SearchMode) -> Result<SearchOutcome, RegistryError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        *self.last_search.lock().unwrap() = Some((term.to_string(), mode));
        if self.rows.is_empty() {
            Ok(SearchOutcome::NoResults)
        } else {
            Ok(SearchOutcome::Rows(self.rows.clone()))
        }
    }
}

/// Registry whose session always fails, for exercising the fallback
/// verdict.
#[derive(Debug, Default)]
pub struct FailingRegistry {
    calls: AtomicUsize,
}

impl FailingRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl RegistrySession for FailingRegistry {
    async fn search(&self, _term: &str, _mode: SearchMode) -> Result<SearchOutcome, RegistryError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        Err(RegistryError::Session("mock session failure".into()))
    }
}
