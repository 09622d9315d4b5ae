//! DynamoDB-backed verification record store.
//!
//! Single table with `verificationId` as the partition key, a
//! `(registrationNumber, timestamp)` global secondary index, and native TTL
//! on the `ttl` attribute.

use std::collections::HashMap;

use async_trait::async_trait;
use aws_sdk_dynamodb::types::AttributeValue;
use tracing::{debug, error, info};

use super::{RecordStore, StoreError};
use crate::model::VerificationRecord;

pub struct DynamoRecordStore {
    client: aws_sdk_dynamodb::Client,
    table_name: String,
}

impl std::fmt::Debug for DynamoRecordStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DynamoRecordStore")
            .field("table_name", &self.table_name)
            .field("client", &"<DynamoDbClient>")
            .finish()
    }
}

impl DynamoRecordStore {
    /// Build a store from ambient AWS configuration.
    pub async fn new(table_name: impl Into<String>) -> Self {
        let sdk_config = aws_config::load_from_env().await;
        Self {
            client: aws_sdk_dynamodb::Client::new(&sdk_config),
            table_name: table_name.into(),
        }
    }

    /// Build a store from a pre-built client (for testing).
    pub fn with_client(client: aws_sdk_dynamodb::Client, table_name: impl Into<String>) -> Self {
        Self {
            client,
            table_name: table_name.into(),
        }
    }
}

fn record_to_item(record: &VerificationRecord) -> Result<HashMap<String, AttributeValue>, StoreError> {
    let mut item = HashMap::new();

    item.insert(
        "verificationId".to_owned(),
        AttributeValue::S(record.verification_id.clone()),
    );
    item.insert(
        "timestamp".to_owned(),
        AttributeValue::S(record.timestamp.clone()),
    );
    item.insert(
        "imageKey".to_owned(),
        AttributeValue::S(record.image_key.clone()),
    );

    let validation_json = serde_json::to_string(&record.validation_result)
        .map_err(|e| StoreError::Serialization(e.to_string()))?;
    item.insert(
        "validationResult".to_owned(),
        AttributeValue::S(validation_json),
    );

    item.insert(
        "ttl".to_owned(),
        AttributeValue::N(record.expires_at.to_string()),
    );

    // The GSI cannot index null keys; a record without a number is omitted
    // from the index entirely by leaving the attribute out.
    if let Some(ref number) = record.registration_number {
        item.insert(
            "registrationNumber".to_owned(),
            AttributeValue::S(number.clone()),
        );
    }

    Ok(item)
}

#[async_trait]
impl RecordStore for DynamoRecordStore {
    async fn put(&self, record: &VerificationRecord) -> Result<(), StoreError> {
        debug!(table = %self.table_name, verification_id = %record.verification_id, "writing verification record");

        let item = record_to_item(record)?;
        let mut put = self.client.put_item().table_name(&self.table_name);
        for (k, v) in item {
            put = put.item(k, v);
        }

        put.send().await.map_err(|e| {
            error!(table = %self.table_name, verification_id = %record.verification_id, error = %e, "put_item failed");
            StoreError::Write(e.to_string())
        })?;

        info!(table = %self.table_name, verification_id = %record.verification_id, "verification record stored");
        Ok(())
    }
}
