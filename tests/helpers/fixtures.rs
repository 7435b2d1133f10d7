/// Common test fixtures
///
/// One entity schema shared across the bulk operation tests, plus builders
/// for logical keys and item payloads.
use dynamo_facets::{
    item_payload, AccessPatterns, EntitySchema, FacetValues, IndexDefinition, Item, KeyTemplate,
};
use serde::{Deserialize, Serialize};

/// Test entity stored in the shared `ecommerce` table
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Order {
    pub org: String,
    pub order_id: String,
    pub status: String,
}

/// Shape of the items the staged store fake serves back
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FetchedRecord {
    pub pk: String,
    pub sk: String,
    pub payload: String,
}

/// Registry with the `order` entity on its primary index
pub fn order_patterns() -> AccessPatterns {
    AccessPatterns::new([EntitySchema::new(
        "ecommerce",
        "order",
        IndexDefinition::new(
            "primary",
            "pk",
            "sk",
            KeyTemplate::new("$ecommerce").facet("org"),
            KeyTemplate::new("$order").facet("order_id"),
        ),
    )])
}

/// Logical key for one order
pub fn order_key(org: &str, order_id: &str) -> FacetValues {
    [
        ("org".to_string(), org.to_string()),
        ("order_id".to_string(), order_id.to_string()),
    ]
    .into_iter()
    .collect()
}

/// Item payload for one order
pub fn order_item(org: &str, order_id: &str) -> Item {
    let order = Order {
        org: org.to_string(),
        order_id: order_id.to_string(),
        status: "open".to_string(),
    };
    item_payload(&order).unwrap()
}
