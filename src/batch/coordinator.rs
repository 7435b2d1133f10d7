use std::cmp;
use std::collections::HashMap;

use aws_sdk_dynamodb::types::{DeleteRequest, KeysAndAttributes, PutRequest, WriteRequest};
use futures_util::{StreamExt, TryStreamExt};
use tokio::time::sleep;
use tokio_stream as stream;

use crate::batch::aggregate::ResponseAggregator;
use crate::batch::retry::{BackoffPolicy, Verdict};
use crate::batch::types::{
    BatchDeleteOutput, BatchGetOutput, BatchPutOutput, BulkOptions, BulkOutput, Item,
};
use crate::client::StoreClient;
use crate::error::Error;
use crate::keys::{AccessPatterns, FacetValues, RegisteredIndex};

/// DynamoDB caps one BatchWriteItem call at 25 requests
const BATCH_WRITE_SIZE: usize = 25;

/// DynamoDB caps one BatchGetItem call at 100 keys
const BATCH_GET_SIZE: usize = 100;

/// Outstanding chunk calls per attempt
const DEFAULT_CONCURRENCY: usize = 10;

/// Orchestrates bulk operations for one entity against the shared table
///
/// Each call resolves logical keys/items into physical form through the
/// entity's registered access patterns, splits them into provider-sized
/// chunks, dispatches the chunks through the injected store client, and
/// loops on whatever the store leaves unprocessed until the set drains or
/// the retry budget runs out. Attempts are strictly sequential; the chunks
/// inside one attempt fan out concurrently.
///
/// A store rejection on any attempt fails the whole call and discards the
/// results already aggregated in that invocation, including results from
/// attempts that had completed. Callers who need to keep partial progress
/// across a transient late failure must re-issue the operation themselves.
#[derive(Debug)]
pub struct BatchCoordinator<'a, C> {
    client: &'a C,
    patterns: &'a AccessPatterns,
    entity: &'a str,
}

impl<'a, C> BatchCoordinator<'a, C>
where
    C: StoreClient,
{
    /// Bind a coordinator to a store client, a registry and one entity
    pub fn new(client: &'a C, patterns: &'a AccessPatterns, entity: &'a str) -> Self {
        Self {
            client,
            patterns,
            entity,
        }
    }

    /// Bulk-read items by logical key
    ///
    /// Keys are facet-value maps for the entity's primary index. The
    /// envelope's `data` holds every item fetched across all attempts;
    /// `unprocessed` holds the keys the store never served, decoded back to
    /// facet values.
    pub async fn batch_get(
        &self,
        keys: &[FacetValues],
        options: &BulkOptions,
    ) -> Result<BatchGetOutput, Error> {
        let (table, index) = self.patterns.primary(self.entity)?;

        if keys.is_empty() {
            return Ok(BulkOutput::empty());
        }

        let mut pending = keys
            .iter()
            .map(|facets| index.key_attributes(facets))
            .collect::<Result<Vec<_>, _>>()?;

        let mut aggregator = ResponseAggregator::new();
        let mut policy = BackoffPolicy::new(options);

        loop {
            policy.begin();
            aggregator = self.dispatch_get(table, index, pending, aggregator).await?;
            pending = aggregator.take_unprocessed_keys();

            match policy.observe(pending.len()) {
                Verdict::Complete => break,
                Verdict::Exhausted => {
                    tracing::warn!(
                        entity = self.entity,
                        outstanding = pending.len(),
                        retries = policy.retries(),
                        "retry budget exhausted with unprocessed keys"
                    );
                    break;
                }
                Verdict::Retry(delay) => {
                    tracing::debug!(
                        entity = self.entity,
                        outstanding = pending.len(),
                        delay_ms = delay.as_millis() as u64,
                        "resubmitting unprocessed keys"
                    );
                    sleep(delay).await;
                }
            }
        }

        let unprocessed = pending
            .iter()
            .map(|key| index.decode_key_attributes(key))
            .collect::<Result<Vec<_>, _>>()?;

        Ok(BulkOutput {
            data: aggregator.into_data(),
            unprocessed,
            retry_attempts: policy.retries(),
        })
    }

    /// Bulk-write item payloads
    ///
    /// Every payload must carry the facet attributes its index templates
    /// reference; the physical key attributes are composed and stamped onto
    /// the item before dispatch. `unprocessed` hands back the payloads the
    /// store never accepted, in the shape they were supplied.
    pub async fn batch_put(
        &self,
        items: Vec<Item>,
        options: &BulkOptions,
    ) -> Result<BatchPutOutput, Error> {
        let (table, index) = self.patterns.primary(self.entity)?;

        if items.is_empty() {
            return Ok(BulkOutput::empty());
        }

        let pending = items
            .into_iter()
            .map(|mut item| {
                index.stamp_item(&mut item)?;
                let put = PutRequest::builder().set_item(Some(item)).build()?;
                Ok(WriteRequest::builder().put_request(put).build())
            })
            .collect::<Result<Vec<_>, Error>>()?;

        let (leftovers, retry_attempts) = self.write_attempt_loop(table, pending, options).await?;

        let unprocessed = leftovers
            .into_iter()
            .filter_map(|request| match request.put_request {
                Some(put) => {
                    let mut item = put.item;
                    let _ = item.remove(index.partition_attribute());
                    let _ = item.remove(index.sort_attribute());
                    Some(item)
                }
                None => {
                    tracing::warn!(
                        entity = self.entity,
                        "store echoed a non-put request in a bulk put; dropping it"
                    );
                    None
                }
            })
            .collect();

        Ok(BulkOutput {
            data: Vec::new(),
            unprocessed,
            retry_attempts,
        })
    }

    /// Bulk-delete items by logical key
    pub async fn batch_delete(
        &self,
        keys: &[FacetValues],
        options: &BulkOptions,
    ) -> Result<BatchDeleteOutput, Error> {
        let (table, index) = self.patterns.primary(self.entity)?;

        if keys.is_empty() {
            return Ok(BulkOutput::empty());
        }

        let pending = keys
            .iter()
            .map(|facets| {
                let key = index.key_attributes(facets)?;
                let delete = DeleteRequest::builder().set_key(Some(key)).build()?;
                Ok(WriteRequest::builder().delete_request(delete).build())
            })
            .collect::<Result<Vec<_>, Error>>()?;

        let (leftovers, retry_attempts) = self.write_attempt_loop(table, pending, options).await?;

        let mut unprocessed = Vec::with_capacity(leftovers.len());
        for request in leftovers {
            match request.delete_request {
                Some(delete) => unprocessed.push(index.decode_key_attributes(&delete.key)?),
                None => tracing::warn!(
                    entity = self.entity,
                    "store echoed a non-delete request in a bulk delete; dropping it"
                ),
            }
        }

        Ok(BulkOutput {
            data: Vec::new(),
            unprocessed,
            retry_attempts,
        })
    }

    /// Attempt loop shared by the write verbs
    async fn write_attempt_loop(
        &self,
        table: &str,
        mut pending: Vec<WriteRequest>,
        options: &BulkOptions,
    ) -> Result<(Vec<WriteRequest>, usize), Error> {
        let mut aggregator = ResponseAggregator::new();
        let mut policy = BackoffPolicy::new(options);

        loop {
            policy.begin();
            aggregator = self.dispatch_write(table, pending, aggregator).await?;
            pending = aggregator.take_unprocessed_writes();

            match policy.observe(pending.len()) {
                Verdict::Complete => break,
                Verdict::Exhausted => {
                    tracing::warn!(
                        entity = self.entity,
                        outstanding = pending.len(),
                        retries = policy.retries(),
                        "retry budget exhausted with unprocessed write requests"
                    );
                    break;
                }
                Verdict::Retry(delay) => {
                    tracing::debug!(
                        entity = self.entity,
                        outstanding = pending.len(),
                        delay_ms = delay.as_millis() as u64,
                        "resubmitting unprocessed write requests"
                    );
                    sleep(delay).await;
                }
            }
        }

        Ok((pending, policy.retries()))
    }

    /// Send one attempt's keys as concurrently dispatched chunks
    ///
    /// Chunk boundaries depend only on the pending list's length and the
    /// fixed per-call limit. Aggregation waits for every chunk of the
    /// attempt to settle; a rejection from the client aborts the fold and
    /// propagates.
    async fn dispatch_get(
        &self,
        table: &str,
        index: &RegisteredIndex,
        pending: Vec<Item>,
        aggregator: ResponseAggregator,
    ) -> Result<ResponseAggregator, Error> {
        let chunks: Vec<Vec<Item>> = pending
            .chunks(BATCH_GET_SIZE)
            .map(|chunk| chunk.to_vec())
            .collect();

        let concurrency = cmp::max(1, chunks.len().min(DEFAULT_CONCURRENCY));
        let client = self.client;

        stream::iter(chunks.into_iter().map(|chunk| async move {
            let keys = KeysAndAttributes::builder().set_keys(Some(chunk)).build()?;
            client
                .batch_get_item(HashMap::from([(table.to_string(), keys)]))
                .await
        }))
        .buffer_unordered(concurrency)
        .try_fold(aggregator, |mut aggregator, output| async move {
            aggregator.absorb_get(index, output)?;
            Ok(aggregator)
        })
        .await
    }

    async fn dispatch_write(
        &self,
        table: &str,
        pending: Vec<WriteRequest>,
        aggregator: ResponseAggregator,
    ) -> Result<ResponseAggregator, Error> {
        let chunks: Vec<Vec<WriteRequest>> = pending
            .chunks(BATCH_WRITE_SIZE)
            .map(|chunk| chunk.to_vec())
            .collect();

        let concurrency = cmp::max(1, chunks.len().min(DEFAULT_CONCURRENCY));
        let client = self.client;

        stream::iter(chunks.into_iter().map(|chunk| async move {
            client
                .batch_write_item(HashMap::from([(table.to_string(), chunk)]))
                .await
        }))
        .buffer_unordered(concurrency)
        .try_fold(aggregator, |mut aggregator, output| async move {
            aggregator.absorb_write(output);
            Ok(aggregator)
        })
        .await
    }
}
