// Not every test target exercises every helper.
#![allow(dead_code)]

/// Test helpers for the bulk operation tests
///
/// Provides a scripted [`StoreClient`] fake with DynamoDB's
/// partial-fulfilment behavior, and the shared entity fixtures.
pub mod fixtures;

pub use fixtures::*;

use std::collections::HashMap;
use std::future::Future;
use std::sync::Mutex;

use aws_sdk_dynamodb::operation::batch_get_item::BatchGetItemOutput;
use aws_sdk_dynamodb::operation::batch_write_item::BatchWriteItemOutput;
use aws_sdk_dynamodb::types::{AttributeValue, KeysAndAttributes, WriteRequest};
use aws_smithy_runtime_api::client::result::SdkError;

use dynamo_facets::{Error, StoreClient};

/// Store fake that fulfils at most `per_call` entries per call and reports
/// the remainder unprocessed, mimicking DynamoDB throttling
///
/// Calls are recorded as `(table, request size)` so tests can assert call
/// counts, chunk sizes and that acknowledged entries are never resent.
pub struct StagedClient {
    per_call: usize,
    fail_on_call: Option<usize>,
    calls: Mutex<Vec<(String, usize)>>,
}

impl StagedClient {
    /// Fulfil `per_call` entries per call, never fail
    pub fn new(per_call: usize) -> Self {
        Self {
            per_call,
            fail_on_call: None,
            calls: Mutex::new(Vec::new()),
        }
    }

    /// Fulfil `per_call` entries per call, reject the call at `call` (0-based)
    pub fn failing_on_call(per_call: usize, call: usize) -> Self {
        Self {
            fail_on_call: Some(call),
            ..Self::new(per_call)
        }
    }

    pub fn call_count(&self) -> usize {
        self.calls.lock().unwrap().len()
    }

    /// Request sizes in call order
    pub fn call_sizes(&self) -> Vec<usize> {
        self.calls.lock().unwrap().iter().map(|(_, n)| *n).collect()
    }

    /// Table names the calls were addressed to
    pub fn call_tables(&self) -> Vec<String> {
        self.calls
            .lock()
            .unwrap()
            .iter()
            .map(|(table, _)| table.clone())
            .collect()
    }

    /// Record the call; `Some(n)` means proceed serving `n` requested
    /// entries, `None` means this call is scripted to fail
    fn admit(&self, table: &str, requested: usize) -> Option<usize> {
        let mut calls = self.calls.lock().unwrap();
        let call_index = calls.len();
        calls.push((table.to_string(), requested));

        if self.fail_on_call == Some(call_index) {
            None
        } else {
            Some(requested.min(self.per_call))
        }
    }

    fn respond_get(
        &self,
        request_items: HashMap<String, KeysAndAttributes>,
    ) -> Result<BatchGetItemOutput, Error> {
        let (table, keys_and_attributes) = request_items
            .into_iter()
            .next()
            .expect("one table per request");
        let keys = keys_and_attributes.keys;

        let served = self.admit(&table, keys.len()).ok_or_else(|| {
            Error::DynamoBatchGetItemError(SdkError::timeout_error("simulated store outage"))
        })?;

        let mut builder = BatchGetItemOutput::builder();

        if served > 0 {
            let items: Vec<_> = keys[..served]
                .iter()
                .cloned()
                .map(|mut item| {
                    let _ = item.insert(
                        "payload".to_string(),
                        AttributeValue::S("fetched".to_string()),
                    );
                    item
                })
                .collect();
            builder = builder.responses(table.clone(), items);
        }

        if served < keys.len() {
            let rest = KeysAndAttributes::builder()
                .set_keys(Some(keys[served..].to_vec()))
                .build()
                .unwrap();
            builder = builder.unprocessed_keys(table, rest);
        }

        Ok(builder.build())
    }

    fn respond_write(
        &self,
        request_items: HashMap<String, Vec<WriteRequest>>,
    ) -> Result<BatchWriteItemOutput, Error> {
        let (table, requests) = request_items
            .into_iter()
            .next()
            .expect("one table per request");

        let served = self.admit(&table, requests.len()).ok_or_else(|| {
            Error::DynamoBatchWriteItemError(SdkError::timeout_error("simulated store outage"))
        })?;

        let mut builder = BatchWriteItemOutput::builder();
        if served < requests.len() {
            builder = builder.unprocessed_items(table, requests[served..].to_vec());
        }

        Ok(builder.build())
    }
}

impl StoreClient for StagedClient {
    fn batch_get_item(
        &self,
        request_items: HashMap<String, KeysAndAttributes>,
    ) -> impl Future<Output = Result<BatchGetItemOutput, Error>> + Send {
        let response = self.respond_get(request_items);
        async move { response }
    }

    fn batch_write_item(
        &self,
        request_items: HashMap<String, Vec<WriteRequest>>,
    ) -> impl Future<Output = Result<BatchWriteItemOutput, Error>> + Send {
        let response = self.respond_write(request_items);
        async move { response }
    }
}
