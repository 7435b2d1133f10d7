//! # Facet-Keyed Batch Operations for Single-Table DynamoDB
//!
//! A client-side layer for storing many logically distinct record types
//! ("entities") in one physical DynamoDB table, with bulk read/write
//! operations that tolerate DynamoDB's partial-failure semantics:
//! - Deterministic, lossless composition and parsing of physical composite
//!   keys from ordered, named facet values
//! - A read-only registry of access patterns per (entity, index)
//! - Batch get/put/delete with provider-sized chunking, concurrent chunk
//!   dispatch, and automatic resubmission of unprocessed subsets under a
//!   caller-supplied retry budget
//!
//! ## Features
//!
//! - **Type-safe**: Leverage Rust's type system with `serde` for automatic
//!   serialization at the envelope boundary
//! - **Async-first**: Built on `tokio` and `aws-sdk-dynamodb`
//! - **Injected client**: No global client state; any [`StoreClient`]
//!   implementation can stand in for the SDK client
//! - **Exact accounting**: Chunking is deterministic slicing, so processed
//!   plus unprocessed always accounts for every requested entry
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use dynamo_facets::{
//!     item_payload, AccessPatterns, BatchCoordinator, BulkOptions, EntitySchema,
//!     FacetValues, IndexDefinition, KeyTemplate,
//! };
//! use serde::{Deserialize, Serialize};
//!
//! #[derive(Debug, Clone, Serialize, Deserialize)]
//! struct Order {
//!     org: String,
//!     order_id: String,
//!     status: String,
//! }
//!
//! #[tokio::main]
//! async fn main() -> Result<(), dynamo_facets::Error> {
//!     // One registration per entity; immutable afterward.
//!     let patterns = AccessPatterns::new([EntitySchema::new(
//!         "ecommerce",
//!         "order",
//!         IndexDefinition::new(
//!             "primary",
//!             "pk",
//!             "sk",
//!             KeyTemplate::new("$ecommerce").facet("org"),
//!             KeyTemplate::new("$order").facet("order_id"),
//!         ),
//!     )]);
//!
//!     let client = dynamo_facets::client::connect().await;
//!     let orders = BatchCoordinator::new(&client, &patterns, "order");
//!
//!     // Bulk write with up to 3 resubmissions of unprocessed items.
//!     let order = Order {
//!         org: "acme".to_string(),
//!         order_id: "42".to_string(),
//!         status: "open".to_string(),
//!     };
//!     let put = orders
//!         .batch_put(
//!             vec![item_payload(&order)?],
//!             &BulkOptions::default().auto_retry(3),
//!         )
//!         .await?;
//!     assert!(put.is_complete());
//!
//!     // Bulk read by logical key.
//!     let key: FacetValues = [
//!         ("org".to_string(), "acme".to_string()),
//!         ("order_id".to_string(), "42".to_string()),
//!     ]
//!     .into_iter()
//!     .collect();
//!     let got = orders.batch_get(&[key], &BulkOptions::default()).await?;
//!     let fetched: Vec<Order> = got.items()?;
//!     println!("fetched {} orders", fetched.len());
//!
//!     Ok(())
//! }
//! ```
#![deny(
    warnings,
    bad_style,
    dead_code,
    improper_ctypes,
    non_shorthand_field_patterns,
    no_mangle_generic_items,
    overflowing_literals,
    path_statements,
    patterns_in_fns_without_body,
    unconditional_recursion,
    unused,
    unused_allocation,
    unused_comparisons,
    unused_parens,
    while_true,
    missing_debug_implementations,
    missing_docs,
    trivial_casts,
    trivial_numeric_casts,
    unreachable_pub,
    unused_extern_crates,
    unused_import_braces,
    unused_qualifications,
    unused_results,
    deprecated,
    unknown_lints,
    unreachable_code,
    unused_mut
)]

mod error;
pub use error::Error;

/// Key composition and the access-pattern registry
pub mod keys;

/// Bulk operation coordination: chunking, aggregation and retry
pub mod batch;

/// Store-client capability and client construction helpers
pub mod client;

// Re-export main types for convenience
pub use batch::{
    item_payload, BatchCoordinator, BatchDeleteOutput, BatchGetOutput, BatchPutOutput, BulkOptions,
    BulkOutput, Item, RetryBudget,
};
pub use client::StoreClient;
pub use keys::{
    AccessPatterns, CompositeKey, EntitySchema, FacetValues, IndexDefinition, KeyComposer,
    KeyTemplate,
};
