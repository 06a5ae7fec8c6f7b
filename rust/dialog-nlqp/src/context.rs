//! The session accumulator.
//!
//! A [`Context`] outlives a single call to the parser: continuing a session
//! hands the previous context back in, and every new word is placed against
//! what has been gathered so far.

use crate::node::{NodeId, Tree};
use crate::relationship::Relationship;
use crate::token::Properties;

/// Modes that, once entered, hold for the rest of the session.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct StateFlags {
    /// A list separator (`,` `;` `:`) has been placed
    pub list: bool,
    /// An insert trigger has been placed, so unresolved words become insert
    /// values instead of speculative nodes
    pub insert: bool,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct Context {
    pub entities: Vec<NodeId>,
    pub collections: Vec<NodeId>,
    pub attributes: Vec<NodeId>,
    /// Functions that emit a query term: filters, aggregates, calculations
    pub fxns: Vec<NodeId>,
    /// Every live function node
    pub internal_fxns: Vec<NodeId>,
    /// Nodes a group function groups by
    pub groupings: Vec<NodeId>,
    /// Argument slots of live functions
    pub arguments: Vec<NodeId>,
    /// Resolved nodes in resolution order
    pub found: Vec<NodeId>,
    /// Every node placed this session, in placement order
    pub nodes: Vec<NodeId>,
    pub maybe_entities: Vec<NodeId>,
    pub maybe_collections: Vec<NodeId>,
    pub maybe_attributes: Vec<NodeId>,
    pub relationships: Vec<Relationship>,
    pub state: StateFlags,
}

impl Context {
    pub fn new() -> Self {
        Self::default()
    }

    pub(crate) fn push_found(&mut self, node: NodeId) {
        if !self.found.contains(&node) {
            self.found.push(node);
        }
    }

    /// Recomputes the resolved buckets from `found` and drops speculative
    /// nodes that have since been resolved or folded into a compound.
    pub(crate) fn settle(&mut self, tree: &Tree) {
        let resolved = |property: Properties| -> Vec<NodeId> {
            self.found
                .iter()
                .copied()
                .filter(|node| {
                    let node = &tree[*node];
                    node.has(property)
                        && !node.has(Properties::SUBSUMED)
                        && !node.has(Properties::IMPLICIT)
                })
                .collect()
        };
        let entities = resolved(Properties::ENTITY);
        let collections = resolved(Properties::COLLECTION);
        let attributes = resolved(Properties::ATTRIBUTE);
        self.entities = entities;
        self.collections = collections;
        self.attributes = attributes;

        let pending = |node: &NodeId| {
            let node = &tree[*node];
            !node.has(Properties::SUBSUMED) && !node.found
        };
        self.maybe_entities.retain(pending);
        self.maybe_collections.retain(pending);
        self.maybe_attributes.retain(pending);
    }

    /// Live functions with at least one unfilled argument.
    pub(crate) fn open_functions(&self, tree: &Tree) -> Vec<NodeId> {
        self.internal_fxns
            .iter()
            .copied()
            .filter(|function| {
                !tree[*function]
                    .children
                    .iter()
                    .all(|argument| tree[*argument].found)
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::lexicon::{EnglishLemmatizer, tag_implicit};

    #[test]
    fn test_settle_buckets_resolved_nodes() {
        let mut tree = Tree::new(tag_implicit("root", &EnglishLemmatizer));
        let mut context = Context::new();

        let moon = tree.create(tag_implicit("moon", &EnglishLemmatizer));
        tree[moon].properties = Properties::COLLECTION;
        tree[moon].found = true;
        let link = tree.create(tag_implicit("employee", &EnglishLemmatizer));
        tree[link].properties |= Properties::COLLECTION;
        tree[link].found = true;
        let test = tree.create(tag_implicit("test", &EnglishLemmatizer));
        tree[test].properties = Properties::SUBSUMED;
        let flurb = tree.create(tag_implicit("flurb", &EnglishLemmatizer));
        tree[flurb].properties = Properties::empty();

        context.push_found(moon);
        context.push_found(moon);
        context.push_found(link);
        context.maybe_attributes = vec![test, flurb, moon];
        context.settle(&tree);

        assert_eq!(context.found, vec![moon, link]);
        assert_eq!(context.collections, vec![moon]);
        assert_eq!(context.maybe_attributes, vec![flurb]);
    }
}
