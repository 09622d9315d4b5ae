//! Mock product namers for testing.

use std::sync::atomic::{AtomicUsize, Ordering};

use async_trait::async_trait;

use super::{NamerError, ProductNamer};

/// Namer returning a fixed reply and counting invocations.
#[derive(Debug)]
pub struct MockNamer {
    reply: String,
    calls: AtomicUsize,
}

impl MockNamer {
    pub fn new(reply: impl Into<String>) -> Self {
        Self {
            reply: reply.into(),
            calls: AtomicUsize::new(0),
        }
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl ProductNamer for MockNamer {
    async fn name_product(
        &self,
        _image: &[u8],
        _text_context: Option<&str>,
    ) -> Result<String, NamerError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        Ok(self.reply.clone())
    }
}

/// Namer that always fails; also the development fallback when no vision
/// endpoint is configured (extraction degrades to a null product name).
#[derive(Debug)]
pub struct FailingNamer {
    reason: String,
    calls: AtomicUsize,
}

impl FailingNamer {
    pub fn new(reason: impl Into<String>) -> Self {
        Self {
            reason: reason.into(),
            calls: AtomicUsize::new(0),
        }
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

impl Default for FailingNamer {
    fn default() -> Self {
        Self::new("mock namer failure")
    }
}

#[async_trait]
impl ProductNamer for FailingNamer {
    async fn name_product(
        &self,
        _image: &[u8],
        _text_context: Option<&str>,
    ) -> Result<String, NamerError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        Err(NamerError::Service(self.reason.clone()))
    }
}
