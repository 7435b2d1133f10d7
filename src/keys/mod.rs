mod registry;
mod template;

pub use registry::{AccessPatterns, CompositeKey, EntitySchema, IndexDefinition};
pub use template::{FacetValues, KeyComposer, KeyTemplate};

pub(crate) use registry::RegisteredIndex;
