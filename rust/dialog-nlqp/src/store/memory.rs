use std::collections::{BTreeMap, HashSet};

use serde::Deserialize;
use serde_json::Value;

use super::{KnowledgeStore, Record, Table, matches};
use crate::error::{NlqpError, NlqpResult};

/// A knowledge store held entirely in memory.
///
/// Every table is a plain list of records scanned on lookup. Entity and
/// collection ids share one namespace.
#[derive(Debug, Clone, Default)]
pub struct MemoryStore {
    tables: BTreeMap<Table, Vec<Record>>,
    entities: HashSet<String>,
    collections: HashSet<String>,
}

#[derive(Debug, Deserialize)]
struct Fixture {
    #[serde(default)]
    collections: Vec<FixtureCollection>,
    #[serde(default)]
    entities: Vec<FixtureEntity>,
}

#[derive(Debug, Deserialize)]
struct FixtureCollection {
    id: String,
    name: Option<String>,
}

#[derive(Debug, Deserialize)]
struct FixtureEntity {
    id: String,
    name: Option<String>,
    #[serde(default)]
    collections: Vec<String>,
    #[serde(default)]
    facts: serde_json::Map<String, Value>,
}

fn record<const N: usize>(fields: [(&str, Value); N]) -> Record {
    fields
        .into_iter()
        .map(|(name, value)| (name.to_string(), value))
        .collect()
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Loads a store from a JSON fixture of the form
    /// `{"collections": [{"id", "name"}], "entities": [{"id", "name",
    /// "collections": [..], "facts": {attribute: value}}]}`.
    ///
    /// All entities are declared before any fact is added, so facts may
    /// point at entities declared later in the document.
    pub fn from_json(json: &str) -> NlqpResult<Self> {
        let fixture: Fixture = serde_json::from_str(json).map_err(NlqpError::Fixture)?;
        let mut store = Self::new();
        for collection in &fixture.collections {
            let name = collection.name.as_deref().unwrap_or(&collection.id);
            store.insert_collection(&collection.id, name)?;
        }
        for entity in &fixture.entities {
            let name = entity.name.as_deref().unwrap_or(&entity.id);
            store.insert_entity(&entity.id, name)?;
        }
        for entity in &fixture.entities {
            for collection in &entity.collections {
                store.add_member(collection, &entity.id)?;
            }
            for (attribute, value) in &entity.facts {
                store.add_fact(&entity.id, attribute, value.clone())?;
            }
        }
        tracing::debug!(
            entities = store.entities.len(),
            collections = store.collections.len(),
            "loaded knowledge store fixture"
        );
        Ok(store)
    }

    fn push(&mut self, table: Table, record: Record) {
        self.tables.entry(table).or_default().push(record);
    }

    fn declare(&mut self, id: &str) -> NlqpResult<()> {
        if self.entities.contains(id) || self.collections.contains(id) {
            return Err(NlqpError::DuplicateId { id: id.to_string() });
        }
        Ok(())
    }

    fn name(&mut self, id: &str, name: &str) {
        self.push(
            Table::DisplayName,
            record([("id", id.into()), ("name", name.into())]),
        );
        self.push(
            Table::IndexName,
            record([("id", id.into()), ("name", name.to_lowercase().into())]),
        );
    }

    pub fn insert_collection(&mut self, id: &str, name: &str) -> NlqpResult<()> {
        self.declare(id)?;
        self.collections.insert(id.to_string());
        self.push(
            Table::Collection,
            record([("collection", id.into()), ("count", 0.into())]),
        );
        self.name(id, name);
        Ok(())
    }

    pub fn insert_entity(&mut self, id: &str, name: &str) -> NlqpResult<()> {
        self.declare(id)?;
        self.entities.insert(id.to_string());
        self.push(Table::Entity, record([("entity", id.into())]));
        self.name(id, name);
        Ok(())
    }

    /// Makes `entity` a member of `collection`.
    pub fn add_member(&mut self, collection: &str, entity: &str) -> NlqpResult<()> {
        if !self.collections.contains(collection) {
            return Err(NlqpError::UnknownCollection {
                collection: collection.to_string(),
            });
        }
        if !self.entities.contains(entity) {
            return Err(NlqpError::UnknownEntity {
                entity: entity.to_string(),
            });
        }
        let member = record([("collection", collection.into()), ("entity", entity.into())]);
        self.push(Table::CollectionEntities, member);
        self.push(
            Table::IsAAttributes,
            record([("entity", entity.into()), ("collection", collection.into())]),
        );
        if let Some(row) = self
            .tables
            .get_mut(&Table::Collection)
            .and_then(|rows| {
                rows.iter_mut()
                    .find(|row| row.get("collection") == Some(&Value::from(collection)))
            })
        {
            let count = row.get("count").and_then(Value::as_u64).unwrap_or(0);
            row.insert("count".to_string(), (count + 1).into());
        }
        Ok(())
    }

    /// Records the fact `entity.attribute = value`. A value naming a known
    /// entity also links the two entities in both directions.
    pub fn add_fact(
        &mut self,
        entity: &str,
        attribute: &str,
        value: impl Into<Value>,
    ) -> NlqpResult<()> {
        if !self.entities.contains(entity) {
            return Err(NlqpError::UnknownEntity {
                entity: entity.to_string(),
            });
        }
        let value = value.into();
        if let Some(link) = value.as_str().filter(|link| self.entities.contains(*link)) {
            let link = link.to_string();
            self.push(
                Table::DirectionlessLinks,
                record([("entity", entity.into()), ("link", link.clone().into())]),
            );
            self.push(
                Table::DirectionlessLinks,
                record([("entity", link.into()), ("link", entity.into())]),
            );
        }
        self.push(
            Table::EntityEavs,
            record([
                ("entity", entity.into()),
                ("attribute", attribute.into()),
                ("value", value),
            ]),
        );
        Ok(())
    }
}

impl KnowledgeStore for MemoryStore {
    fn find(&self, table: Table, pattern: &Record) -> Vec<Record> {
        self.tables
            .get(&table)
            .map(|rows| {
                rows.iter()
                    .filter(|row| matches(row, pattern))
                    .cloned()
                    .collect()
            })
            .unwrap_or_default()
    }
}
