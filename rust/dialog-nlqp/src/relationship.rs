//! Relationship inference between pairs of resolved nodes.
//!
//! Two nodes are related when the knowledge graph connects what they stand
//! for, either directly (an entity carries the attribute) or through one
//! intermediate link (an employee's department carries the name). Each
//! strategy below handles one canonical pair of node types. On success it
//! rewrites the representations involved so that the query compiler can
//! later join them, and may synthesize implicit nodes standing for the
//! intermediate link.

use crate::builder::Builder;
use crate::lexicon::Lemmatizer;
use crate::node::{NodeId, NodeType};
use crate::representation::{Attribute, Entity, Representation, RepresentationKind};
use crate::store::{self, Bindings, KnowledgeStore, Table, text};
use crate::token::Properties;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum RelationshipType {
    None,
    Direct,
    OneHop,
    /// Two collections that share members
    Intersection,
}

/// An inferred connection between two nodes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Relationship {
    pub kind: RelationshipType,
    pub nodes: Vec<NodeId>,
    /// Nodes synthesized for the intermediate link, placed once the
    /// relationship is recorded
    pub implicit_nodes: Vec<NodeId>,
    /// Synthesized nodes that take part in the relationship besides `nodes`
    pub links: Vec<NodeId>,
}

impl Relationship {
    pub fn none() -> Self {
        Self::new(RelationshipType::None, Vec::new())
    }

    fn new(kind: RelationshipType, nodes: Vec<NodeId>) -> Self {
        Self {
            kind,
            nodes,
            implicit_nodes: Vec::new(),
            links: Vec::new(),
        }
    }

    fn with_implicit(mut self, implicit: NodeId) -> Self {
        self.implicit_nodes.push(implicit);
        self
    }

    fn with_links(mut self, links: &[NodeId]) -> Self {
        self.links.extend_from_slice(links);
        self
    }

    pub fn is_none(&self) -> bool {
        self.kind == RelationshipType::None
    }
}

fn joined(left: &str, right: &str) -> String {
    format!("{left}|{right}").replace(' ', "")
}

fn links_of(rows: &[Vec<store::Record>], select: usize) -> Vec<String> {
    rows.iter()
        .filter_map(|row| row.get(select))
        .filter_map(|record| text(record, "link"))
        .map(str::to_string)
        .collect()
}

impl<S: KnowledgeStore, L: Lemmatizer> Builder<'_, S, L> {
    /// Infers and records the relationship between `a` and `b`.
    ///
    /// When the pair does not relate as resolved, one of them may be
    /// re-resolved as an attribute and the pair tried once more.
    pub(crate) fn find_relationship(&mut self, a: NodeId, b: NodeId) -> Relationship {
        self.relate(a, b, true)
    }

    fn relate(&mut self, a: NodeId, b: NodeId, retry: bool) -> Relationship {
        if a == b
            || self.context.state.insert
            || (self.tree[a].has(Properties::QUANTITY) && self.tree[b].has(Properties::QUANTITY))
        {
            return Relationship::none();
        }

        let key = |node: NodeId| (self.tree[node].properties.type_rank(), self.tree[node].ix, node);
        let (first, second) = if key(a) <= key(b) { (a, b) } else { (b, a) };
        let first_has = self.tree[first].properties;
        let second_has = self.tree[second].properties;

        let relationship = if first_has.contains(Properties::ENTITY)
            && second_has.contains(Properties::ATTRIBUTE)
        {
            self.entity_to_attribute(first, second)
        } else if first_has.contains(Properties::COLLECTION)
            && second_has.contains(Properties::ATTRIBUTE)
        {
            self.collection_to_attribute(first, second)
        } else if first_has.contains(Properties::COLLECTION)
            && second_has.contains(Properties::COLLECTION)
        {
            self.collection_to_collection(first, second)
        } else if first_has.contains(Properties::ATTRIBUTE)
            && second_has.contains(Properties::ATTRIBUTE)
        {
            self.attribute_to_attribute(first, second)
        } else if first_has.contains(Properties::COLLECTION)
            && second_has.contains(Properties::ENTITY)
        {
            self.collection_to_entity(first, second)
        } else {
            None
        };

        if let Some(relationship) = relationship {
            tracing::trace!(
                kind = ?relationship.kind,
                first = %self.tree[first].name,
                second = %self.tree[second].name,
                "related"
            );
            self.record(relationship.clone());
            return relationship;
        }
        if retry && self.swap_representation(a, b) {
            return self.relate(a, b, false);
        }
        Relationship::none()
    }

    /// Re-resolves the later node of an unrelated pair as an attribute when
    /// the earlier one possesses it, or when both are collections.
    fn swap_representation(&mut self, a: NodeId, b: NodeId) -> bool {
        let (earlier, later) = if self.tree[a].ix <= self.tree[b].ix {
            (a, b)
        } else {
            (b, a)
        };
        let later_node = &self.tree[later];
        let possessed = self.tree[earlier].has(Properties::POSSESSIVE)
            && !later_node.has(Properties::ATTRIBUTE);
        let both_collections = self.tree[earlier].has(Properties::COLLECTION)
            && later_node.has(Properties::COLLECTION);
        if (possessed || both_collections) && later_node.has_alternative(RepresentationKind::Attribute)
        {
            return self.change_representation(later, RepresentationKind::Attribute);
        }
        false
    }

    fn record(&mut self, relationship: Relationship) {
        let index = self.context.relationships.len();
        for node in relationship.nodes.iter().chain(&relationship.links) {
            self.tree[*node].relationships.push(index);
        }
        self.context.relationships.push(relationship);
    }

    fn entity_to_attribute(&mut self, entity: NodeId, attribute: NodeId) -> Option<Relationship> {
        let (Some(ent), Some(attr)) = (
            self.tree[entity].entity().cloned(),
            self.tree[attribute].attribute().cloned(),
        ) else {
            return None;
        };

        // An attribute that is already related becomes a filter on the entity.
        if !self.tree[attribute].relationships.is_empty() {
            let under_argument = self.tree[attribute]
                .parent
                .is_some_and(|parent| self.tree[parent].has(Properties::ARGUMENT));
            if under_argument {
                return None;
            }
            if let Some(attr) = self.tree[attribute].attribute_mut() {
                attr.variable = ent.id.clone();
                attr.attribute_var = false;
                attr.project = false;
            }
            if let Some(ent) = self.tree[entity].entity_mut() {
                ent.project = false;
                ent.handled = true;
            }
            return Some(Relationship::new(
                RelationshipType::Direct,
                vec![entity, attribute],
            ));
        }

        let direct = self.store.find_one(
            Table::EntityEavs,
            &store::pattern([("entity", ent.id.as_str()), ("attribute", attr.id.as_str())]),
        );
        if direct.is_some() {
            let variable = joined(&self.tree[entity].name, &self.tree[attribute].name);
            if let Some(attr) = self.tree[attribute].attribute_mut() {
                attr.variable = variable;
                attr.refs = vec![entity];
                attr.project = true;
            }
            if let Some(ent) = self.tree[entity].entity_mut() {
                ent.handled = true;
            }
            return Some(Relationship::new(
                RelationshipType::Direct,
                vec![entity, attribute],
            ));
        }

        let rows = self
            .store
            .query()
            .select(
                Table::DirectionlessLinks,
                Bindings::new().constant("entity", ent.id.as_str()),
                "links",
            )
            .select(
                Table::EntityEavs,
                Bindings::new()
                    .join("entity", "links", "link")
                    .constant("attribute", attr.id.as_str()),
                "eav",
            )
            .exec()
            .unprojected;
        let link_id = store::common_collections(self.store, &links_of(&rows, 0))
            .into_iter()
            .next()?;
        let link = self.link_collection(&link_id)?;

        let variable = joined(&self.tree[link].name, &self.tree[attribute].name);
        if let Some(attr) = self.tree[attribute].attribute_mut() {
            attr.variable = variable;
            attr.refs = vec![link];
        }

        // The attribute through which the link points back at the entity.
        let back = self
            .store
            .query()
            .select(
                Table::DirectionlessLinks,
                Bindings::new().constant("entity", ent.id.as_str()),
                "links",
            )
            .select(
                Table::EntityEavs,
                Bindings::new()
                    .join("entity", "links", "link")
                    .constant("value", ent.id.as_str()),
                "eav",
            )
            .exec()
            .unprojected
            .iter()
            .filter_map(|row| row.get(1))
            .find_map(|record| text(record, "attribute").map(str::to_string));

        let mut relationship = Relationship::new(RelationshipType::OneHop, vec![entity, attribute]);
        if let Some(back) = back {
            let through = self.implicit(&back);
            let mut representation = Attribute::new(&back, &back);
            representation.variable = ent.id.clone();
            representation.attribute_var = false;
            representation.project = false;
            representation.refs = vec![link];
            let node = &mut self.tree[through];
            node.representation = Some(Representation::Attribute(representation));
            node.properties |= Properties::ATTRIBUTE;
            node.kind = Some(NodeType::Attribute);
            node.found = true;
            relationship = relationship.with_implicit(through).with_links(&[through]);
        }

        if let Some(attr) = self.tree[attribute].attribute_mut() {
            attr.project = true;
        }
        if let Some(ent) = self.tree[entity].entity_mut() {
            ent.project = false;
            ent.handled = true;
        }
        Some(relationship)
    }

    fn collection_to_attribute(
        &mut self,
        collection: NodeId,
        attribute: NodeId,
    ) -> Option<Relationship> {
        let (Some(coll), Some(attr)) = (
            self.tree[collection].collection().cloned(),
            self.tree[attribute].attribute().cloned(),
        ) else {
            return None;
        };

        let direct = self
            .store
            .query()
            .select(
                Table::CollectionEntities,
                Bindings::new().constant("collection", coll.id.as_str()),
                "collection",
            )
            .select(
                Table::EntityEavs,
                Bindings::new()
                    .join("entity", "collection", "entity")
                    .constant("attribute", attr.id.as_str()),
                "eav",
            )
            .exec()
            .unprojected;
        if !direct.is_empty() {
            let variable = joined(&self.tree[collection].name, &self.tree[attribute].name);
            if let Some(attr) = self.tree[attribute].attribute_mut() {
                attr.variable = variable;
                attr.refs = vec![collection];
                attr.project = true;
            }
            return Some(Relationship::new(
                RelationshipType::Direct,
                vec![collection, attribute],
            ));
        }

        let rows = self
            .store
            .query()
            .select(
                Table::CollectionEntities,
                Bindings::new().constant("collection", coll.id.as_str()),
                "collection",
            )
            .select(
                Table::DirectionlessLinks,
                Bindings::new().join("entity", "collection", "entity"),
                "links",
            )
            .select(
                Table::EntityEavs,
                Bindings::new()
                    .join("entity", "links", "link")
                    .constant("attribute", attr.id.as_str()),
                "eav",
            )
            .exec()
            .unprojected;
        if rows.is_empty() {
            return None;
        }
        let link_id = store::common_collections(self.store, &links_of(&rows, 1))
            .into_iter()
            .next()?;
        let link = self.link_collection(&link_id)?;

        let variable = joined(&self.tree[link].name, &self.tree[attribute].name);
        if let Some(attr) = self.tree[attribute].attribute_mut() {
            attr.variable = variable;
            attr.refs = vec![link];
            attr.project = true;
        }

        // The link's attribute that names a member of the collection.
        let through = self.implicit(&coll.variable);
        let mut representation = Attribute::new(&coll.display_name, &coll.variable);
        representation.variable = coll.variable.clone();
        representation.project = false;
        representation.refs = vec![link];
        let node = &mut self.tree[through];
        node.representation = Some(Representation::Attribute(representation));
        node.properties |= Properties::ATTRIBUTE;
        node.kind = Some(NodeType::Attribute);
        node.found = true;

        if let Some(link) = self.tree[link].collection_mut() {
            link.project = true;
        }
        if let Some(coll) = self.tree[collection].collection_mut() {
            coll.project = true;
        }
        Some(
            Relationship::new(RelationshipType::OneHop, vec![collection, attribute])
                .with_implicit(through)
                .with_links(&[through, link]),
        )
    }

    fn collection_to_collection(&mut self, a: NodeId, b: NodeId) -> Option<Relationship> {
        let (Some(first), Some(second)) = (
            self.tree[a].collection().cloned(),
            self.tree[b].collection().cloned(),
        ) else {
            return None;
        };

        let intersection = self
            .store
            .query()
            .select(
                Table::CollectionEntities,
                Bindings::new().constant("collection", first.id.as_str()),
                "first",
            )
            .select(
                Table::CollectionEntities,
                Bindings::new()
                    .constant("collection", second.id.as_str())
                    .join("entity", "first", "entity"),
                "second",
            )
            .exec()
            .unprojected
            .len();

        let related = self
            .store
            .query()
            .select(
                Table::CollectionEntities,
                Bindings::new().constant("collection", first.id.as_str()),
                "first",
            )
            .select(
                Table::DirectionlessLinks,
                Bindings::new().join("entity", "first", "entity"),
                "links",
            )
            .select(
                Table::CollectionEntities,
                Bindings::new()
                    .constant("collection", second.id.as_str())
                    .join("entity", "links", "link"),
                "second",
            )
            .group(&[("links", "link")])
            .aggregate_count("count")
            .project(&[("type", "links", "link"), ("count", "count", "count")])
            .exec()
            .results
            .iter()
            .filter_map(|record| record.get("count").and_then(serde_json::Value::as_u64))
            .max()
            .unwrap_or(0) as usize;

        if related > intersection {
            // Members of `a` linked to members of `b`.
            let name = joined(&self.tree[a].name, &self.tree[b].name);
            let link = self.implicit(&name);
            let mut representation = Entity::new(&name, &name);
            representation.variable = second.variable.clone();
            representation.value = Some(first.variable.clone());
            representation.entity_var = true;
            representation.value_var = true;
            representation.project = false;
            let node = &mut self.tree[link];
            node.representation = Some(Representation::Entity(representation));
            node.properties |= Properties::ENTITY;
            node.kind = Some(NodeType::Entity);
            node.found = true;
            self.tree.add_child(b, link);
            return Some(
                Relationship::new(RelationshipType::Direct, vec![a, b]).with_links(&[link]),
            );
        }

        if intersection > 0 {
            if let Some(coll) = self.tree[a].collection_mut() {
                coll.variable = second.variable.clone();
                coll.project = false;
            }
            if let Some(coll) = self.tree[b].collection_mut() {
                coll.project = true;
            }
            return Some(Relationship::new(
                RelationshipType::Intersection,
                vec![a, b],
            ));
        }
        None
    }

    /// An attribute already read elsewhere, compared against a quantity.
    fn attribute_to_attribute(&mut self, a: NodeId, b: NodeId) -> Option<Relationship> {
        let (a, b) = if self.tree[a].has(Properties::QUANTITY) {
            (b, a)
        } else {
            (a, b)
        };
        let node = &self.tree[a];
        let under_argument = node
            .parent
            .is_some_and(|parent| self.tree[parent].has(Properties::ARGUMENT));
        if node.relationships.is_empty() || under_argument || !self.tree[b].has(Properties::QUANTITY)
        {
            return None;
        }
        let quantity = self.tree[b].quantity?;
        if let Some(attr) = self.tree[a].attribute_mut() {
            attr.variable = quantity.to_string();
            attr.attribute_var = false;
            attr.project = false;
        }
        Some(Relationship::new(RelationshipType::Direct, vec![a, b]))
    }

    fn collection_to_entity(&mut self, collection: NodeId, entity: NodeId) -> Option<Relationship> {
        let (Some(coll), Some(ent)) = (
            self.tree[collection].collection().cloned(),
            self.tree[entity].entity().cloned(),
        ) else {
            return None;
        };
        let rows = self
            .store
            .query()
            .select(
                Table::CollectionEntities,
                Bindings::new().constant("collection", coll.id.as_str()),
                "collection",
            )
            .select(
                Table::DirectionlessLinks,
                Bindings::new()
                    .join("entity", "collection", "entity")
                    .constant("link", ent.id.as_str()),
                "links",
            )
            .exec()
            .unprojected;
        if store::common_collections(self.store, &links_of(&rows, 1)).is_empty() {
            return None;
        }
        if let Some(ent) = self.tree[entity].entity_mut() {
            ent.entity_var = true;
            ent.project = false;
            ent.variable = coll.variable.clone();
        }
        Some(Relationship::new(
            RelationshipType::Direct,
            vec![collection, entity],
        ))
    }

    /// Synthesizes and resolves the intermediate collection of a one-hop
    /// relationship.
    fn link_collection(&mut self, id: &str) -> Option<NodeId> {
        let named = store::find_collection(self.store, id)?;
        let link = self.implicit(&named.display_name);
        self.find_collection(link).then_some(link)
    }
}
