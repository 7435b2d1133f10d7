use std::collections::HashMap;
use std::future::Future;

use aws_config::defaults;
use aws_sdk_dynamodb::operation::batch_get_item::BatchGetItemOutput;
use aws_sdk_dynamodb::operation::batch_write_item::BatchWriteItemOutput;
use aws_sdk_dynamodb::types::{KeysAndAttributes, WriteRequest};
use aws_sdk_dynamodb::Client as DynamoDbClient;

use crate::error::Error;

// Re-exported for callers configuring their own client.
pub use aws_config::{BehaviorVersion, Region, SdkConfig};

/// Store capability the batch coordinator depends on
///
/// The handle is injected into [`BatchCoordinator`] and treated as
/// stateless: the core never mutates it and shares nothing else across
/// invocations. The production implementation is the DynamoDB SDK client;
/// tests inject scripted fakes built from the same output types.
///
/// [`BatchCoordinator`]: crate::BatchCoordinator
pub trait StoreClient: Send + Sync {
    /// Dispatch one BatchGetItem call
    ///
    /// `request_items` maps a table name to the physical keys to fetch. The
    /// response carries fetched items per table plus the subset of keys the
    /// store has not yet processed.
    fn batch_get_item(
        &self,
        request_items: HashMap<String, KeysAndAttributes>,
    ) -> impl Future<Output = Result<BatchGetItemOutput, Error>> + Send;

    /// Dispatch one BatchWriteItem call
    ///
    /// `request_items` maps a table name to put/delete request payloads. The
    /// response carries the subset of write requests the store has not yet
    /// processed; successes are not echoed.
    fn batch_write_item(
        &self,
        request_items: HashMap<String, Vec<WriteRequest>>,
    ) -> impl Future<Output = Result<BatchWriteItemOutput, Error>> + Send;
}

impl StoreClient for DynamoDbClient {
    fn batch_get_item(
        &self,
        request_items: HashMap<String, KeysAndAttributes>,
    ) -> impl Future<Output = Result<BatchGetItemOutput, Error>> + Send {
        async move {
            self.batch_get_item()
                .set_request_items(Some(request_items))
                .send()
                .await
                .map_err(Into::into)
        }
    }

    fn batch_write_item(
        &self,
        request_items: HashMap<String, Vec<WriteRequest>>,
    ) -> impl Future<Output = Result<BatchWriteItemOutput, Error>> + Send {
        async move {
            self.batch_write_item()
                .set_request_items(Some(request_items))
                .send()
                .await
                .map_err(Into::into)
        }
    }
}

/// Build a DynamoDB client with sensible defaults
///
/// Configures:
/// - Adaptive retry mode with 3 max attempts
/// - Exponential backoff starting at 1 second
/// - Connect timeout: 3 seconds
/// - Read timeout: 20 seconds
/// - Operation timeout: 60 seconds
/// - LocalStack support via AWS_PROFILE=localstack
///
/// The SDK-level retry config governs transport retries on single calls; it
/// is unrelated to the partial-batch retry budget of the bulk operations.
pub async fn connect() -> DynamoDbClient {
    use aws_types::sdk_config::{RetryConfig, TimeoutConfig};
    use std::time::Duration;

    let timeout_config = TimeoutConfig::builder()
        .connect_timeout(Duration::from_secs(3))
        .read_timeout(Duration::from_secs(20))
        .operation_timeout(Duration::from_secs(60))
        .build();

    let mut loader = defaults(BehaviorVersion::latest())
        .retry_config(
            RetryConfig::adaptive()
                .with_max_attempts(3)
                .with_initial_backoff(Duration::from_secs(1)),
        )
        .timeout_config(timeout_config);

    // Support LocalStack via AWS_PROFILE=localstack
    if std::env::var("AWS_PROFILE").unwrap_or_default() == "localstack" {
        loader = loader.endpoint_url("http://127.0.0.1:4566");
    }

    DynamoDbClient::new(&loader.load().await)
}

/// Build a DynamoDB client from a custom AWS config
pub fn connect_with(config: &SdkConfig) -> DynamoDbClient {
    DynamoDbClient::new(config)
}
