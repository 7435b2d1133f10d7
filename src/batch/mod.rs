mod aggregate;
mod coordinator;
mod retry;
mod types;

pub use coordinator::BatchCoordinator;
pub use retry::RetryBudget;
pub use types::{
    item_payload, BatchDeleteOutput, BatchGetOutput, BatchPutOutput, BulkOptions, BulkOutput, Item,
};
