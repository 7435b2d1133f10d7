use aws_sdk_dynamodb::operation::batch_get_item::BatchGetItemOutput;
use aws_sdk_dynamodb::operation::batch_write_item::BatchWriteItemOutput;
use aws_sdk_dynamodb::types::WriteRequest;

use crate::batch::types::Item;
use crate::error::Error;
use crate::keys::RegisteredIndex;

/// Accumulator for one bulk invocation across its attempts
///
/// Successful results merge into `data`; whatever the store reports as
/// unprocessed is kept verbatim, already in the physical form required for
/// resubmission. The accumulator is owned by exactly one in-flight
/// invocation and dropped with it.
#[derive(Debug, Default)]
pub(crate) struct ResponseAggregator {
    data: Vec<Item>,
    unprocessed_keys: Vec<Item>,
    unprocessed_writes: Vec<WriteRequest>,
}

impl ResponseAggregator {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    /// Merge one BatchGetItem chunk response
    ///
    /// Every returned item is correlated back to its logical key via the
    /// physical key attributes embedded in it; an item whose keys do not
    /// parse under the index shape is a [`Error::MalformedKey`] failure.
    pub(crate) fn absorb_get(
        &mut self,
        index: &RegisteredIndex,
        output: BatchGetItemOutput,
    ) -> Result<(), Error> {
        if let Some(responses) = output.responses {
            for items in responses.into_values() {
                for item in items {
                    let _ = index.decode_key_attributes(&item)?;
                    self.data.push(item);
                }
            }
        }

        if let Some(unprocessed) = output.unprocessed_keys {
            for keys_and_attributes in unprocessed.into_values() {
                self.unprocessed_keys.extend(keys_and_attributes.keys);
            }
        }

        Ok(())
    }

    /// Merge one BatchWriteItem chunk response
    ///
    /// The store echoes only the write requests it did not process;
    /// everything absent from the echo was processed.
    pub(crate) fn absorb_write(&mut self, output: BatchWriteItemOutput) {
        if let Some(unprocessed) = output.unprocessed_items {
            for requests in unprocessed.into_values() {
                self.unprocessed_writes.extend(requests);
            }
        }
    }

    /// Drain the unprocessed read keys for the next attempt
    pub(crate) fn take_unprocessed_keys(&mut self) -> Vec<Item> {
        std::mem::take(&mut self.unprocessed_keys)
    }

    /// Drain the unprocessed write requests for the next attempt
    pub(crate) fn take_unprocessed_writes(&mut self) -> Vec<WriteRequest> {
        std::mem::take(&mut self.unprocessed_writes)
    }

    pub(crate) fn into_data(self) -> Vec<Item> {
        self.data
    }
}
