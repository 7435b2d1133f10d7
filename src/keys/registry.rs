use std::collections::HashMap;

use aws_sdk_dynamodb::types::AttributeValue;

use crate::error::Error;
use crate::keys::template::{FacetValues, KeyComposer, KeyTemplate};

/// One physical key pair produced for an index: the composed partition value
/// and sort value
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CompositeKey {
    /// Composed partition key value
    pub partition: String,
    /// Composed sort key value
    pub sort: String,
}

/// Declaration of one access pattern: the index name, the physical attribute
/// names of its two key parts, and the facet templates that fill them
///
/// Facet order inside each template is fixed at definition time.
#[derive(Debug, Clone)]
pub struct IndexDefinition {
    name: String,
    partition_attribute: String,
    sort_attribute: String,
    partition: KeyTemplate,
    sort: KeyTemplate,
}

impl IndexDefinition {
    /// Declare an index with its physical key attribute names and templates
    pub fn new(
        name: impl Into<String>,
        partition_attribute: impl Into<String>,
        sort_attribute: impl Into<String>,
        partition: KeyTemplate,
        sort: KeyTemplate,
    ) -> Self {
        Self {
            name: name.into(),
            partition_attribute: partition_attribute.into(),
            sort_attribute: sort_attribute.into(),
            partition,
            sort,
        }
    }

    /// Index name used for registry lookups
    pub fn name(&self) -> &str {
        &self.name
    }
}

/// Static schema for one entity stored in the shared table: the table name,
/// the entity name, the primary index and any secondary access patterns
///
/// Supplied once to [`AccessPatterns::new`]; index definitions cannot be
/// changed after registration.
#[derive(Debug, Clone)]
pub struct EntitySchema {
    table: String,
    entity: String,
    primary: IndexDefinition,
    secondary: Vec<IndexDefinition>,
}

impl EntitySchema {
    /// Declare an entity with its table and primary index
    pub fn new(table: impl Into<String>, entity: impl Into<String>, primary: IndexDefinition) -> Self {
        Self {
            table: table.into(),
            entity: entity.into(),
            primary,
            secondary: Vec::new(),
        }
    }

    /// Add a secondary access pattern
    pub fn with_index(mut self, index: IndexDefinition) -> Self {
        self.secondary.push(index);
        self
    }
}

/// A registered index with its composers built once at registration time
#[derive(Debug)]
pub(crate) struct RegisteredIndex {
    name: String,
    partition_attribute: String,
    sort_attribute: String,
    partition: KeyComposer,
    sort: KeyComposer,
}

impl RegisteredIndex {
    fn new(definition: IndexDefinition) -> Self {
        let IndexDefinition {
            name,
            partition_attribute,
            sort_attribute,
            partition,
            sort,
        } = definition;
        Self {
            partition: KeyComposer::new(name.clone(), partition),
            sort: KeyComposer::new(name.clone(), sort),
            name,
            partition_attribute,
            sort_attribute,
        }
    }

    pub(crate) fn partition_attribute(&self) -> &str {
        &self.partition_attribute
    }

    pub(crate) fn sort_attribute(&self) -> &str {
        &self.sort_attribute
    }

    /// Compose both key parts for the given facet values
    pub(crate) fn composite_key(&self, facet_values: &FacetValues) -> Result<CompositeKey, Error> {
        Ok(CompositeKey {
            partition: self.partition.compose(facet_values)?,
            sort: self.sort.compose(facet_values)?,
        })
    }

    /// Build the physical key attribute map sent to the store for get/delete
    pub(crate) fn key_attributes(
        &self,
        facet_values: &FacetValues,
    ) -> Result<HashMap<String, AttributeValue>, Error> {
        let key = self.composite_key(facet_values)?;

        let mut attributes = HashMap::with_capacity(2);
        let _ = attributes.insert(
            self.partition_attribute.clone(),
            AttributeValue::S(key.partition),
        );
        let _ = attributes.insert(self.sort_attribute.clone(), AttributeValue::S(key.sort));
        Ok(attributes)
    }

    /// Recover the logical facet values from a physical key attribute map
    ///
    /// Used to hand unprocessed entries back to the caller in the shape they
    /// supplied them, and to correlate returned items with request keys.
    pub(crate) fn decode_key_attributes(
        &self,
        attributes: &HashMap<String, AttributeValue>,
    ) -> Result<FacetValues, Error> {
        let mut values = self.parse_key_attribute(attributes, &self.partition_attribute, &self.partition)?;
        values.extend(self.parse_key_attribute(attributes, &self.sort_attribute, &self.sort)?);
        Ok(values)
    }

    fn parse_key_attribute(
        &self,
        attributes: &HashMap<String, AttributeValue>,
        attribute: &str,
        composer: &KeyComposer,
    ) -> Result<FacetValues, Error> {
        let physical = attributes
            .get(attribute)
            .and_then(|value| value.as_s().ok())
            .ok_or_else(|| Error::MalformedKey {
                index: self.name.clone(),
                key: attribute.to_string(),
            })?;
        composer.parse(physical)
    }

    /// Compose this index's key attributes from an item payload and stamp
    /// them onto it
    ///
    /// Facets are read from the item's own attributes; string and number
    /// attributes are accepted as facet sources, anything else is treated as
    /// unresolvable.
    pub(crate) fn stamp_item(
        &self,
        item: &mut HashMap<String, AttributeValue>,
    ) -> Result<(), Error> {
        let facets = self.item_facet_values(item)?;
        let key = self.composite_key(&facets)?;

        let _ = item.insert(
            self.partition_attribute.clone(),
            AttributeValue::S(key.partition),
        );
        let _ = item.insert(self.sort_attribute.clone(), AttributeValue::S(key.sort));
        Ok(())
    }

    fn item_facet_values(
        &self,
        item: &HashMap<String, AttributeValue>,
    ) -> Result<FacetValues, Error> {
        let mut values = FacetValues::new();
        for facet in self
            .partition
            .facet_names()
            .iter()
            .chain(self.sort.facet_names())
        {
            let value = item
                .get(facet)
                .and_then(facet_source)
                .ok_or_else(|| Error::MissingFacet {
                    index: self.name.clone(),
                    facet: facet.clone(),
                })?;
            let _ = values.insert(facet.clone(), value);
        }
        Ok(values)
    }
}

fn facet_source(value: &AttributeValue) -> Option<String> {
    match value {
        AttributeValue::S(s) => Some(s.clone()),
        AttributeValue::N(n) => Some(n.clone()),
        _ => None,
    }
}

/// Read-only registry of access patterns, keyed by (entity, index)
///
/// Built once from entity schema records; composers are constructed at
/// registration time and reused for every resolution afterward. Lookup is a
/// plain map access on tagged records, never dynamic dispatch on an entity
/// variant.
#[derive(Debug)]
pub struct AccessPatterns {
    tables: HashMap<String, String>,
    primaries: HashMap<String, String>,
    indexes: HashMap<(String, String), RegisteredIndex>,
}

impl AccessPatterns {
    /// Register the given entity schemas
    pub fn new(schemas: impl IntoIterator<Item = EntitySchema>) -> Self {
        let mut tables = HashMap::new();
        let mut primaries = HashMap::new();
        let mut indexes = HashMap::new();

        for schema in schemas {
            let EntitySchema {
                table,
                entity,
                primary,
                secondary,
            } = schema;

            let _ = tables.insert(entity.clone(), table);
            let _ = primaries.insert(entity.clone(), primary.name.clone());
            let _ = indexes.insert(
                (entity.clone(), primary.name.clone()),
                RegisteredIndex::new(primary),
            );
            for definition in secondary {
                let _ = indexes.insert(
                    (entity.clone(), definition.name.clone()),
                    RegisteredIndex::new(definition),
                );
            }
        }

        Self {
            tables,
            primaries,
            indexes,
        }
    }

    /// Resolve the physical composite key for `(entity, index)` from facet
    /// values
    ///
    /// Fails with [`Error::UnknownIndex`] when no such index is registered
    /// for the entity, or with a composition error from the underlying
    /// [`KeyComposer`].
    pub fn resolve_key(
        &self,
        entity: &str,
        index: &str,
        facet_values: &FacetValues,
    ) -> Result<CompositeKey, Error> {
        self.index(entity, index)?.composite_key(facet_values)
    }

    pub(crate) fn index(&self, entity: &str, index: &str) -> Result<&RegisteredIndex, Error> {
        self.indexes
            .get(&(entity.to_string(), index.to_string()))
            .ok_or_else(|| Error::UnknownIndex {
                entity: entity.to_string(),
                index: index.to_string(),
            })
    }

    /// Table name and primary index for an entity
    pub(crate) fn primary(&self, entity: &str) -> Result<(&str, &RegisteredIndex), Error> {
        let index_name = self
            .primaries
            .get(entity)
            .ok_or_else(|| Error::UnknownIndex {
                entity: entity.to_string(),
                index: "primary".to_string(),
            })?;
        let table = self
            .tables
            .get(entity)
            .map(String::as_str)
            .ok_or_else(|| Error::UnknownIndex {
                entity: entity.to_string(),
                index: index_name.clone(),
            })?;
        Ok((table, self.index(entity, index_name)?))
    }
}
