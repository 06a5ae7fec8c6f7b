//! The knowledge store the parser resolves words against.
//!
//! The parser only ever reads. It asks for single records
//! ([`KnowledgeStore::find_one`]), record sets ([`KnowledgeStore::find`]),
//! and small joins built with [`GraphQuery`]. Absence is always a value: an
//! empty result, never an error.
//!
//! Records are JSON objects so that any backing engine can answer with
//! whatever it has at hand. The tables and the fields the parser relies on:
//!
//! | table                 | fields                        |
//! |-----------------------|-------------------------------|
//! | `entity`              | `entity`                      |
//! | `collection`          | `collection`, `count`         |
//! | `entity eavs`         | `entity`, `attribute`, `value`|
//! | `directionless links` | `entity`, `link`              |
//! | `is a attributes`     | `entity`, `collection`        |
//! | `display name`        | `id`, `name`                  |
//! | `index name`          | `id`, `name`                  |
//! | `collection entities` | `collection`, `entity`        |

mod memory;
mod query;

pub use memory::*;
pub use query::*;

use std::fmt;

use itertools::Itertools;
use serde_json::{Map, Value};

/// A row of a knowledge-store table.
pub type Record = Map<String, Value>;

/// The tables a knowledge store exposes to the parser.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Table {
    Entity,
    Collection,
    /// Entity-attribute-value fact triples
    EntityEavs,
    /// Links between entities, stored in both directions
    DirectionlessLinks,
    /// Collection membership as seen by queries
    IsAAttributes,
    DisplayName,
    /// Lowercase lookup names
    IndexName,
    /// Collection membership as seen by the parser
    CollectionEntities,
}

impl Table {
    pub fn name(&self) -> &'static str {
        match self {
            Table::Entity => "entity",
            Table::Collection => "collection",
            Table::EntityEavs => "entity eavs",
            Table::DirectionlessLinks => "directionless links",
            Table::IsAAttributes => "is a attributes",
            Table::DisplayName => "display name",
            Table::IndexName => "index name",
            Table::CollectionEntities => "collection entities",
        }
    }
}

impl fmt::Display for Table {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.name())
    }
}

/// Read access to a knowledge graph.
pub trait KnowledgeStore {
    /// Every record of `table` whose fields equal all fields of `pattern`.
    fn find(&self, table: Table, pattern: &Record) -> Vec<Record>;

    /// The first record matching `pattern`, if any.
    fn find_one(&self, table: Table, pattern: &Record) -> Option<Record> {
        self.find(table, pattern).into_iter().next()
    }

    /// Starts a join over this store.
    fn query(&self) -> GraphQuery<'_, Self>
    where
        Self: Sized,
    {
        GraphQuery::new(self)
    }
}

impl<S: KnowledgeStore + ?Sized> KnowledgeStore for &S {
    fn find(&self, table: Table, pattern: &Record) -> Vec<Record> {
        (**self).find(table, pattern)
    }
}

/// Builds a pattern from field/value pairs.
pub fn pattern<const N: usize>(fields: [(&str, &str); N]) -> Record {
    fields
        .into_iter()
        .map(|(name, value)| (name.to_string(), Value::from(value)))
        .collect()
}

/// True when every field of `pattern` is present in `record` with an equal
/// value.
pub fn matches(record: &Record, pattern: &Record) -> bool {
    pattern
        .iter()
        .all(|(name, value)| record.get(name) == Some(value))
}

/// Reads a string field of a record.
pub fn text<'a>(record: &'a Record, field: &str) -> Option<&'a str> {
    record.get(field).and_then(Value::as_str)
}

/// An entity or collection located through the name tables.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Named {
    pub id: String,
    pub display_name: String,
}

fn find_named(
    store: &impl KnowledgeStore,
    search: &str,
    table: Table,
    field: &str,
) -> Option<Named> {
    // The index name wins when present, and then it must resolve.
    if let Some(index) = store.find_one(Table::IndexName, &pattern([("name", search)])) {
        let id = text(&index, "id")?;
        let record = store.find_one(table, &pattern([(field, id)]))?;
        return Some(Named {
            id: text(&record, field)?.to_string(),
            display_name: search.to_string(),
        });
    }
    let record = store.find_one(table, &pattern([(field, search)]))?;
    let display = store.find_one(Table::DisplayName, &pattern([("id", search)]));
    Some(Named {
        id: text(&record, field)?.to_string(),
        display_name: display
            .as_ref()
            .and_then(|display| text(display, "name"))
            .unwrap_or(search)
            .to_string(),
    })
}

/// Looks an entity up by lookup name, falling back to its id.
pub fn find_entity(store: &impl KnowledgeStore, search: &str) -> Option<Named> {
    find_named(store, search, Table::Entity, "entity")
}

/// Looks a collection up by lookup name, falling back to its id.
pub fn find_collection(store: &impl KnowledgeStore, search: &str) -> Option<Named> {
    find_named(store, search, Table::Collection, "collection")
}

/// True when some fact uses `name` as its attribute.
pub fn has_attribute(store: &impl KnowledgeStore, name: &str) -> bool {
    store
        .find_one(Table::EntityEavs, &pattern([("attribute", name)]))
        .is_some()
}

/// True when `name` is a lookup name of anything in the store.
pub fn has_index_name(store: &impl KnowledgeStore, name: &str) -> bool {
    store
        .find_one(Table::IndexName, &pattern([("name", name)]))
        .is_some()
}

/// Collections of `entity`.
pub fn collections_of(store: &impl KnowledgeStore, entity: &str) -> Vec<String> {
    store
        .find(Table::CollectionEntities, &pattern([("entity", entity)]))
        .iter()
        .filter_map(|record| text(record, "collection"))
        .map(str::to_string)
        .collect()
}

fn collection_size(store: &impl KnowledgeStore, collection: &str) -> u64 {
    store
        .find_one(Table::Collection, &pattern([("collection", collection)]))
        .and_then(|record| record.get("count").and_then(Value::as_u64))
        .unwrap_or(0)
}

/// Collections shared by every one of `entities`, smallest first.
pub fn common_collections(store: &impl KnowledgeStore, entities: &[String]) -> Vec<String> {
    let mut entities = entities.iter().unique();
    let Some(first) = entities.next() else {
        return Vec::new();
    };
    let mut shared = collections_of(store, first);
    for entity in entities {
        let theirs = collections_of(store, entity);
        shared.retain(|collection| theirs.contains(collection));
    }
    shared.sort();
    shared.dedup();
    shared.sort_by_key(|collection| collection_size(store, collection));
    shared
}
