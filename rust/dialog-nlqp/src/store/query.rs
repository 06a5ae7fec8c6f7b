use indexmap::IndexMap;
use serde_json::Value;

use super::{KnowledgeStore, Record, Table};

/// Field constraints of one select: constants the record must carry, and
/// fields that must equal a field of a record matched by an earlier select.
#[derive(Debug, Clone, Default)]
pub struct Bindings {
    constants: Record,
    joins: Vec<Join>,
}

#[derive(Debug, Clone)]
struct Join {
    field: String,
    alias: String,
    source: String,
}

impl Bindings {
    pub fn new() -> Self {
        Self::default()
    }

    /// Requires `field` to equal `value`.
    pub fn constant(mut self, field: &str, value: impl Into<Value>) -> Self {
        self.constants.insert(field.to_string(), value.into());
        self
    }

    /// Requires `field` to equal `source` of the record selected as `alias`.
    pub fn join(mut self, field: &str, alias: &str, source: &str) -> Self {
        self.joins.push(Join {
            field: field.to_string(),
            alias: alias.to_string(),
            source: source.to_string(),
        });
        self
    }
}

#[derive(Debug, Clone)]
struct Select {
    table: Table,
    bindings: Bindings,
    alias: String,
}

/// A projected output field, read from `field` of the record selected as
/// `alias`. The aggregate's own name is a valid alias once one is set.
#[derive(Debug, Clone)]
struct Projection {
    name: String,
    alias: String,
    field: String,
}

/// The rows produced by a [`GraphQuery`].
#[derive(Debug, Clone, Default, PartialEq)]
pub struct QueryOutput {
    /// One record per row, or per group when grouped, holding the projected
    /// fields. Empty when nothing was projected.
    pub results: Vec<Record>,
    /// Every matching row, one record per select in select order.
    pub unprojected: Vec<Vec<Record>>,
}

/// A conjunctive join over a [`KnowledgeStore`], evaluated as nested loops
/// over [`KnowledgeStore::find`].
///
/// ```rust
/// use dialog_nlqp::{Bindings, KnowledgeStore, MemoryStore, Table};
///
/// let mut store = MemoryStore::new();
/// store.insert_collection("planet", "planet").unwrap();
/// store.insert_entity("jupiter", "jupiter").unwrap();
/// store.add_member("planet", "jupiter").unwrap();
///
/// let output = store
///     .query()
///     .select(Table::CollectionEntities, Bindings::new().constant("collection", "planet"), "members")
///     .select(Table::Entity, Bindings::new().join("entity", "members", "entity"), "entity")
///     .exec();
/// assert_eq!(output.unprojected.len(), 1);
/// ```
pub struct GraphQuery<'a, S: ?Sized> {
    store: &'a S,
    selects: Vec<Select>,
    group: Vec<(String, String)>,
    aggregate: Option<String>,
    projections: Vec<Projection>,
}

impl<'a, S: KnowledgeStore + ?Sized> GraphQuery<'a, S> {
    pub fn new(store: &'a S) -> Self {
        Self {
            store,
            selects: Vec::new(),
            group: Vec::new(),
            aggregate: None,
            projections: Vec::new(),
        }
    }

    pub fn select(mut self, table: Table, bindings: Bindings, alias: &str) -> Self {
        self.selects.push(Select {
            table,
            bindings,
            alias: alias.to_string(),
        });
        self
    }

    /// Groups rows by the given `(alias, field)` keys.
    pub fn group(mut self, keys: &[(&str, &str)]) -> Self {
        self.group = keys
            .iter()
            .map(|(alias, field)| (alias.to_string(), field.to_string()))
            .collect();
        self
    }

    /// Counts the rows of each group, readable as field `count` of the
    /// alias `name`.
    pub fn aggregate_count(mut self, name: &str) -> Self {
        self.aggregate = Some(name.to_string());
        self
    }

    /// Projects `(name, alias, field)` triples into the results.
    pub fn project(mut self, fields: &[(&str, &str, &str)]) -> Self {
        self.projections = fields
            .iter()
            .map(|(name, alias, field)| Projection {
                name: name.to_string(),
                alias: alias.to_string(),
                field: field.to_string(),
            })
            .collect();
        self
    }

    fn position(&self, alias: &str) -> Option<usize> {
        self.selects.iter().position(|select| select.alias == alias)
    }

    fn lookup<'r>(&self, row: &'r [Record], alias: &str, field: &str) -> Option<&'r Value> {
        row.get(self.position(alias)?)?.get(field)
    }

    pub fn exec(self) -> QueryOutput {
        let mut rows: Vec<Vec<Record>> = vec![Vec::new()];
        for select in &self.selects {
            let mut next = Vec::new();
            for row in &rows {
                let mut pattern = select.bindings.constants.clone();
                let bound = select.bindings.joins.iter().all(|join| {
                    match self.lookup(row, &join.alias, &join.source) {
                        Some(value) => {
                            pattern.insert(join.field.clone(), value.clone());
                            true
                        }
                        None => false,
                    }
                });
                if !bound {
                    continue;
                }
                for record in self.store.find(select.table, &pattern) {
                    let mut extended = row.clone();
                    extended.push(record);
                    next.push(extended);
                }
            }
            rows = next;
        }
        if self.selects.is_empty() {
            rows.clear();
        }

        let results = if self.projections.is_empty() {
            Vec::new()
        } else if self.group.is_empty() && self.aggregate.is_none() {
            rows.iter()
                .map(|row| self.project_row(row, None))
                .collect()
        } else {
            let mut groups: IndexMap<Vec<Value>, Vec<&Vec<Record>>> = IndexMap::new();
            for row in &rows {
                let key = self
                    .group
                    .iter()
                    .map(|(alias, field)| {
                        self.lookup(row, alias, field).cloned().unwrap_or(Value::Null)
                    })
                    .collect();
                groups.entry(key).or_default().push(row);
            }
            groups
                .values()
                .map(|members| self.project_row(members[0], Some(members.len())))
                .collect()
        };

        QueryOutput {
            results,
            unprojected: rows,
        }
    }

    fn project_row(&self, row: &[Record], count: Option<usize>) -> Record {
        let mut record = Record::new();
        for projection in &self.projections {
            let value = match (&self.aggregate, count) {
                (Some(aggregate), Some(count)) if *aggregate == projection.alias => {
                    Some(Value::from(count))
                }
                _ => self.lookup(row, &projection.alias, &projection.field).cloned(),
            };
            if let Some(value) = value {
                record.insert(projection.name.clone(), value);
            }
        }
        record
    }
}
