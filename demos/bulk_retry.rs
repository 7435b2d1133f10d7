/// Example: bulk put and get with partial-failure retry
///
/// Runs against an in-process store fake that only accepts two entries per
/// call, so the retry loop is visible without an AWS account. Swap the fake
/// for `dynamo_facets::client::connect().await` to run against DynamoDB.
use std::collections::HashMap;
use std::future::Future;
use std::sync::Mutex;

use aws_sdk_dynamodb::operation::batch_get_item::BatchGetItemOutput;
use aws_sdk_dynamodb::operation::batch_write_item::BatchWriteItemOutput;
use aws_sdk_dynamodb::types::{AttributeValue, KeysAndAttributes, WriteRequest};
use serde::{Deserialize, Serialize};

use dynamo_facets::{
    item_payload, AccessPatterns, BatchCoordinator, BulkOptions, EntitySchema, Error, FacetValues,
    IndexDefinition, KeyTemplate, StoreClient,
};

#[derive(Debug, Clone, Serialize, Deserialize)]
struct Order {
    org: String,
    order_id: String,
    status: String,
}

/// Store fake that accepts at most `per_call` entries per call and reports
/// the rest unprocessed, like a throttled DynamoDB table
struct ThrottledStore {
    per_call: usize,
    calls: Mutex<usize>,
}

impl ThrottledStore {
    fn new(per_call: usize) -> Self {
        Self {
            per_call,
            calls: Mutex::new(0),
        }
    }

    fn record_call(&self) -> usize {
        let mut calls = self.calls.lock().unwrap();
        *calls += 1;
        *calls
    }
}

impl StoreClient for ThrottledStore {
    fn batch_get_item(
        &self,
        request_items: HashMap<String, KeysAndAttributes>,
    ) -> impl Future<Output = Result<BatchGetItemOutput, Error>> + Send {
        let call = self.record_call();
        let (table, keys_and_attributes) = request_items.into_iter().next().unwrap();
        let keys = keys_and_attributes.keys;
        let served = keys.len().min(self.per_call);
        println!("  store call {call}: serving {served}/{} keys", keys.len());

        let mut builder = BatchGetItemOutput::builder();
        if served > 0 {
            let items: Vec<_> = keys[..served]
                .iter()
                .cloned()
                .map(|mut item| {
                    let _ = item.insert(
                        "status".to_string(),
                        AttributeValue::S("open".to_string()),
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
        let output = builder.build();
        async move { Ok(output) }
    }

    fn batch_write_item(
        &self,
        request_items: HashMap<String, Vec<WriteRequest>>,
    ) -> impl Future<Output = Result<BatchWriteItemOutput, Error>> + Send {
        let call = self.record_call();
        let (table, requests) = request_items.into_iter().next().unwrap();
        let served = requests.len().min(self.per_call);
        println!(
            "  store call {call}: accepting {served}/{} writes",
            requests.len()
        );

        let mut builder = BatchWriteItemOutput::builder();
        if served < requests.len() {
            builder = builder.unprocessed_items(table, requests[served..].to_vec());
        }
        let output = builder.build();
        async move { Ok(output) }
    }
}

#[tokio::main]
async fn main() -> Result<(), Error> {
    tracing_subscriber::fmt::init();

    let patterns = AccessPatterns::new([EntitySchema::new(
        "ecommerce",
        "order",
        IndexDefinition::new(
            "primary",
            "pk",
            "sk",
            KeyTemplate::new("$ecommerce").facet("org"),
            KeyTemplate::new("$order").facet("order_id"),
        ),
    )]);

    let store = ThrottledStore::new(2);
    let orders = BatchCoordinator::new(&store, &patterns, "order");

    let items: Vec<_> = (1..=5)
        .map(|i| {
            item_payload(&Order {
                org: "acme".to_string(),
                order_id: i.to_string(),
                status: "open".to_string(),
            })
        })
        .collect::<Result<_, _>>()?;

    println!("Writing {} orders with auto_retry = 3:", items.len());
    let put = orders
        .batch_put(items, &BulkOptions::default().auto_retry(3))
        .await?;

    if put.is_complete() {
        println!("✓ all writes accepted after {} retries", put.retry_attempts);
    } else {
        println!(
            "⚠ {} writes still unprocessed after {} retries",
            put.unprocessed.len(),
            put.retry_attempts
        );
    }

    let keys: Vec<FacetValues> = (1..=5)
        .map(|i| {
            [
                ("org".to_string(), "acme".to_string()),
                ("order_id".to_string(), i.to_string()),
            ]
            .into_iter()
            .collect()
        })
        .collect();

    println!("Reading {} orders back:", keys.len());
    let got = orders
        .batch_get(&keys, &BulkOptions::default().auto_retry(3))
        .await?;

    println!(
        "✓ fetched {} orders in {} retries, {} unprocessed",
        got.processed_count(),
        got.retry_attempts,
        got.unprocessed.len()
    );

    Ok(())
}
