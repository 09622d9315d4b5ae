//! In-memory record store for tests and development fallback.

use std::sync::Mutex;

use async_trait::async_trait;

use super::{RecordStore, StoreError};
use crate::model::VerificationRecord;

/// Append-only in-memory record store. Records are lost on restart.
#[derive(Debug, Default)]
pub struct MemoryRecordStore {
    records: Mutex<Vec<VerificationRecord>>,
}

impl MemoryRecordStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.records.lock().unwrap().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// All records written for a verification id, in write order.
    pub fn get(&self, verification_id: &str) -> Vec<VerificationRecord> {
        self.records
            .lock()
            .unwrap()
            .iter()
            .filter(|r| r.verification_id == verification_id)
            .cloned()
            .collect()
    }

    /// Records carrying the given registration number, newest-first by
    /// timestamp. The in-memory equivalent of the secondary index, which
    /// naturally skips records without a number.
    pub fn by_registration_number(&self, number: &str) -> Vec<VerificationRecord> {
        let mut records: Vec<_> = self
            .records
            .lock()
            .unwrap()
            .iter()
            .filter(|r| r.registration_number.as_deref() == Some(number))
            .cloned()
            .collect();
        records.sort_by(|a, b| b.timestamp.cmp(&a.timestamp));
        records
    }
}

#[async_trait]
impl RecordStore for MemoryRecordStore {
    async fn put(&self, record: &VerificationRecord) -> Result<(), StoreError> {
        self.records.lock().unwrap().push(record.clone());
        Ok(())
    }
}
