use std::collections::HashMap;
use std::time::Duration;

use aws_sdk_dynamodb::types::AttributeValue;
use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_dynamo::{from_items, to_item};

use crate::batch::retry::RetryBudget;
use crate::error::Error;
use crate::keys::FacetValues;

/// Raw DynamoDB item payload: attribute name to attribute value
pub type Item = HashMap<String, AttributeValue>;

/// Options accepted by every bulk operation
#[derive(Debug, Clone)]
pub struct BulkOptions {
    /// Retry budget beyond the initial call; see [`RetryBudget`] for the
    /// normalization rules
    pub auto_retry: RetryBudget,
    /// Delay before the first retry
    pub initial_delay: Duration,
    /// Cap on the exponentially growing delay between retries
    pub max_delay: Duration,
}

impl Default for BulkOptions {
    fn default() -> Self {
        Self {
            auto_retry: RetryBudget::ZERO,
            initial_delay: Duration::from_millis(100),
            max_delay: Duration::from_millis(2000),
        }
    }
}

impl BulkOptions {
    /// Set the retry budget; any value is accepted and normalized
    pub fn auto_retry(mut self, budget: impl Into<RetryBudget>) -> Self {
        self.auto_retry = budget.into();
        self
    }

    /// Set the backoff delay bounds
    pub fn backoff(mut self, initial_delay: Duration, max_delay: Duration) -> Self {
        self.initial_delay = initial_delay;
        self.max_delay = max_delay;
        self
    }
}

/// Result envelope for one bulk operation
///
/// `data` accumulates everything the store processed across all attempts;
/// its order is not guaranteed to match request order. `unprocessed` holds
/// whatever remained when the retry budget ran out, in the shape the caller
/// supplied it. `retry_attempts` counts attempts after the initial call.
///
/// A bulk call that ends with unprocessed entries still resolves with this
/// envelope; only store/transport and composition errors fail the call.
#[must_use = "bulk results carry unprocessed entries that should be checked"]
#[derive(Debug, Clone)]
pub struct BulkOutput<U> {
    /// Accumulated processed results
    pub data: Vec<Item>,
    /// Entries the store never processed, in caller-supplied shape
    pub unprocessed: Vec<U>,
    /// Retries performed after the initial call
    pub retry_attempts: usize,
}

impl<U> BulkOutput<U> {
    pub(crate) fn empty() -> Self {
        Self {
            data: Vec::new(),
            unprocessed: Vec::new(),
            retry_attempts: 0,
        }
    }

    /// Check if every requested entry was processed
    pub fn is_complete(&self) -> bool {
        self.unprocessed.is_empty()
    }

    /// Number of processed results accumulated
    pub fn processed_count(&self) -> usize {
        self.data.len()
    }
}

/// Envelope of a bulk get: unprocessed keys come back as facet values
pub type BatchGetOutput = BulkOutput<FacetValues>;

/// Envelope of a bulk put: unprocessed items come back as the supplied
/// payloads; `data` stays empty because the store does not echo successful
/// writes
pub type BatchPutOutput = BulkOutput<Item>;

/// Envelope of a bulk delete: unprocessed keys come back as facet values
pub type BatchDeleteOutput = BulkOutput<FacetValues>;

impl BulkOutput<FacetValues> {
    /// Deserialize the accumulated items into a typed collection
    pub fn items<T: DeserializeOwned>(self) -> Result<Vec<T>, Error> {
        Ok(from_items(self.data)?)
    }
}

/// Serialize a value into a raw item payload for [`batch_put`]
///
/// [`batch_put`]: crate::BatchCoordinator::batch_put
pub fn item_payload<T: Serialize>(value: &T) -> Result<Item, Error> {
    Ok(to_item(value)?)
}
