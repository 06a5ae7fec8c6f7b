//! Incremental construction of the parse tree.
//!
//! [`Builder::form_tree`] places one node at a time. Placing a word goes
//! through four steps:
//!
//! 1. Fold the word and its neighbours into a compound node when a run of
//!    words names something in the knowledge store ("test data", "is a").
//! 2. Resolve the node against the collection, attribute, entity and
//!    function catalogs, in that order.
//! 3. Attach functions to an open argument or the root, then let them pull
//!    already placed nodes into their arguments.
//! 4. Relate everything else to the nodes resolved before it, and attach it
//!    to an open function, the root of a related attribute, or the root.
//!
//! Unresolved words are set aside as speculative entities, collections or
//! attributes and never placed.

use itertools::Itertools;

use crate::config::ParserConfig;
use crate::context::Context;
use crate::function::{BuiltInFunction, FunctionType};
use crate::lexicon::{Lemmatizer, tag_implicit};
use crate::node::{NodeId, NodeType, Tree};
use crate::representation::{Attribute, Collection, Entity, Representation, RepresentationKind};
use crate::store::{self, KnowledgeStore};
use crate::token::{MajorPartOfSpeech, MinorPartOfSpeech, Properties};

/// Mutable view over one session while a word is being placed.
pub(crate) struct Builder<'a, S, L> {
    pub(crate) tree: &'a mut Tree,
    pub(crate) context: &'a mut Context,
    pub(crate) store: &'a S,
    pub(crate) lemmatizer: &'a L,
    pub(crate) config: &'a ParserConfig,
}

fn push_unique(nodes: &mut Vec<NodeId>, node: NodeId) {
    if !nodes.contains(&node) {
        nodes.push(node);
    }
}

impl<'a, S: KnowledgeStore, L: Lemmatizer> Builder<'a, S, L> {
    pub(crate) fn new(
        tree: &'a mut Tree,
        context: &'a mut Context,
        store: &'a S,
        lemmatizer: &'a L,
        config: &'a ParserConfig,
    ) -> Self {
        Self {
            tree,
            context,
            store,
            lemmatizer,
            config,
        }
    }

    /// Creates a detached node for a word the parser made up.
    pub(crate) fn implicit(&mut self, text: &str) -> NodeId {
        self.tree.create(tag_implicit(text, self.lemmatizer))
    }

    pub(crate) fn form_tree(&mut self, node: NodeId) {
        push_unique(&mut self.context.nodes, node);
        if self.tree[node].has(Properties::SUBSUMED) {
            return;
        }
        if self.tree[node].has(Properties::SEPARATOR) && !self.tree[node].has(Properties::QUOTED)
        {
            self.context.state.list = true;
        }
        let Some(node) = self.compound(node) else {
            return;
        };
        if !self.identify(node) {
            return;
        }

        if self.tree[node].has(Properties::COMPOUND) && self.splice_compound(node) {
            return;
        }
        if self.tree[node].has(Properties::FUNCTION) {
            self.place_function(node);
        } else {
            self.place(node);
        }
        self.enter_insert_mode(node);
    }

    fn enter_insert_mode(&mut self, node: NodeId) {
        if self.tree[node]
            .function()
            .is_some_and(|function| function.kind == FunctionType::Insert)
        {
            self.context.state.insert = true;
        }
    }

    fn display_name(&self, gram: &[NodeId]) -> String {
        gram.iter()
            .map(|node| self.tree[*node].name.as_str())
            .join(" ")
            .replace(" '", "'")
    }

    /// Scans the word chain for runs of words that name something, longest
    /// and latest first, and folds each into a compound. Returns the node
    /// to continue with, or `None` when an insert trigger follows a
    /// determiner ("engineers that are employees" asks, it does not assert).
    fn compound(&mut self, node: NodeId) -> Option<NodeId> {
        let words = self.tree.chain().to_vec();
        let window = self.config.span_limit().min(words.len());
        let mut grams = Vec::new();
        for length in 1..=window {
            for start in 0..=words.len() - length {
                grams.push(&words[start..start + length]);
            }
        }

        let mut matched = Vec::new();
        for gram in grams.into_iter().rev() {
            if gram.iter().all(|word| self.tree[*word].found) {
                continue;
            }
            let name = self.display_name(gram);
            let function = if store::has_index_name(self.store, &name)
                || store::has_attribute(self.store, &name)
            {
                None
            } else if let Some(function) = BuiltInFunction::from_trigger(&name) {
                Some(function)
            } else {
                continue;
            };
            for word in gram {
                self.tree[*word].found = true;
            }
            if function.is_some_and(|function| function.kind == FunctionType::Insert)
                && self.follows_determiner(gram[0])
            {
                tracing::trace!(%name, "insert trigger after determiner");
                return None;
            }
            matched.push(gram);
        }

        let mut current = node;
        for gram in matched {
            if let [word] = gram {
                self.tree[*word].found = false;
                continue;
            }
            current = self.fold(gram);
        }
        Some(current)
    }

    fn follows_determiner(&self, word: NodeId) -> bool {
        let Some(previous) = self.tree[self.tree[word].token].prev else {
            return false;
        };
        let previous = &self.tree[previous];
        previous.pos == MinorPartOfSpeech::Determiner
            || previous.major() == MajorPartOfSpeech::WhWord
    }

    fn fold(&mut self, gram: &[NodeId]) -> NodeId {
        let name = self.display_name(gram);
        let first = gram[0];
        let last = gram[gram.len() - 1];

        let mut token = tag_implicit(&name, self.lemmatizer);
        token.ix = self.tree[last].ix;
        token.prev = self.tree[self.tree[first].token].prev;
        let compound = self.tree.create(token);
        for word in gram {
            self.tree[*word].properties |= Properties::SUBSUMED;
        }
        let properties =
            self.tree[last].properties.difference(Properties::SUBSUMED) | Properties::COMPOUND;
        let node = &mut self.tree[compound];
        node.constituents = gram.to_vec();
        node.properties = properties;
        tracing::debug!(%name, "compound");
        compound
    }

    /// Resolves `node`. Returns false when it stays unresolved and must not
    /// be placed.
    fn identify(&mut self, node: NodeId) -> bool {
        if self.tree[node].has(Properties::QUANTITY) {
            let name = self.tree[node].name.clone();
            let mut literal = Attribute::literal(&name);
            literal.handled = true;
            let node = &mut self.tree[node];
            node.quantity = name.parse().ok();
            node.representation = Some(Representation::Attribute(literal));
            node.properties |= Properties::ATTRIBUTE;
            node.kind = Some(NodeType::Number);
            node.found = true;
        } else if !self.tree[node].found {
            let _ = self.find_collection(node)
                || self.find_attribute(node)
                || self.find_entity(node)
                || self.find_function(node);
        }

        if !self.tree[node].found {
            self.hold_unresolved(node);
            return false;
        }
        if self.tree[node].alternatives.is_none() {
            self.find_alternatives(node);
        }
        true
    }

    fn hold_unresolved(&mut self, node: NodeId) {
        if !self.context.state.insert {
            let unresolved = &self.tree[node];
            tracing::trace!(name = %unresolved.name, "unresolved");
            if self.tree[unresolved.token].major() != MajorPartOfSpeech::Noun {
                return;
            }
            let bucket = if unresolved.has(Properties::PROPER) {
                &mut self.context.maybe_entities
            } else if unresolved.has(Properties::PLURAL) {
                &mut self.context.maybe_collections
            } else {
                &mut self.context.maybe_attributes
            };
            push_unique(bucket, node);
            return;
        }

        // While inserting, anything unresolved is a value.
        let slot = self
            .context
            .arguments
            .iter()
            .rev()
            .copied()
            .find(|argument| self.tree[*argument].has(Properties::ROOT));
        if let Some(slot) = slot {
            self.tree[node].found = true;
            if let Some(function) = self.tree[slot].parent {
                self.add_node_to_function(node, function);
            }
        }
        push_unique(&mut self.context.maybe_attributes, node);
    }

    pub(crate) fn find_collection(&mut self, node: NodeId) -> bool {
        let Some(named) = store::find_collection(self.store, &self.tree[node].name) else {
            return false;
        };
        let collection = Collection::new(&named.id, &named.display_name);
        self.resolve(
            node,
            Representation::Collection(collection),
            Properties::COLLECTION,
            NodeType::Collection,
        );
        true
    }

    pub(crate) fn find_entity(&mut self, node: NodeId) -> bool {
        let Some(named) = store::find_entity(self.store, &self.tree[node].name) else {
            return false;
        };
        let entity = Entity::new(&named.id, &named.display_name);
        self.resolve(
            node,
            Representation::Entity(entity),
            Properties::ENTITY,
            NodeType::Entity,
        );
        true
    }

    /// "is a" is never an attribute, even though membership facts are
    /// stored under it.
    pub(crate) fn find_attribute(&mut self, node: NodeId) -> bool {
        let name = self.tree[node].name.clone();
        if name == "is a" || !store::has_attribute(self.store, &name) {
            return false;
        }
        self.resolve(
            node,
            Representation::Attribute(Attribute::new(&name, &name)),
            Properties::ATTRIBUTE,
            NodeType::Attribute,
        );
        true
    }

    fn resolve(
        &mut self,
        node: NodeId,
        representation: Representation,
        property: Properties,
        kind: NodeType,
    ) {
        tracing::trace!(name = %self.tree[node].name, %representation, "resolved");
        let resolved = &mut self.tree[node];
        resolved.representation = Some(representation);
        resolved.properties |= property;
        resolved.kind = Some(kind);
        resolved.found = true;
        self.context.push_found(node);
    }

    /// Turns `node` into a function node with one argument node per field.
    fn find_function(&mut self, node: NodeId) -> bool {
        let Some(function) = BuiltInFunction::from_trigger(&self.tree[node].name) else {
            return false;
        };
        if function.kind == FunctionType::Insert
            && self.config.insert_requires_possessive
            && !self
                .context
                .found
                .iter()
                .any(|found| self.tree[*found].has(Properties::POSSESSIVE))
        {
            return false;
        }

        for (position, field) in function.fields.iter().enumerate() {
            let argument = self.implicit(field.name);
            self.tree[argument].properties |= Properties::ARGUMENT | field.types;
            if function.project && position == 0 {
                let name = format!("output{}", self.context.fxns.len());
                let output = self.implicit(&name);
                let result = &mut self.tree[output];
                result.representation = Some(Representation::Attribute(Attribute::literal(&name)));
                result.properties |= Properties::OUTPUT;
                result.kind = Some(NodeType::Attribute);
                result.found = true;
                self.tree[argument].properties |= Properties::OUTPUT;
                self.tree[argument].found = true;
                self.tree.add_child(argument, output);
            } else {
                self.tree[argument].properties |= Properties::INPUT;
            }
            self.tree.add_child(node, argument);
            self.context.arguments.push(argument);
        }

        tracing::trace!(name = %self.tree[node].name, kind = %function.kind, "function");
        let emits_term = function.emits_term();
        let resolved = &mut self.tree[node];
        resolved.representation = Some(Representation::Function(function));
        resolved.properties |= Properties::FUNCTION;
        resolved.kind = Some(NodeType::Function);
        resolved.found = true;
        if emits_term {
            self.context.fxns.push(node);
        }
        self.context.internal_fxns.push(node);
        true
    }

    fn find_alternatives(&mut self, node: NodeId) {
        let name = self.tree[node].name.clone();
        let mut alternatives = Vec::new();
        if let Some(named) = store::find_collection(self.store, &name) {
            alternatives.push(Representation::Collection(Collection::new(
                &named.id,
                &named.display_name,
            )));
        }
        if let Some(named) = store::find_entity(self.store, &name) {
            alternatives.push(Representation::Entity(Entity::new(
                &named.id,
                &named.display_name,
            )));
        }
        if store::has_attribute(self.store, &name) {
            alternatives.push(Representation::Attribute(Attribute::new(&name, &name)));
        }
        if let Some(function) = BuiltInFunction::from_trigger(&name) {
            alternatives.push(Representation::Function(function));
        }
        self.tree[node].alternatives = Some(alternatives);
    }

    /// Drops the current resolution of `node` and resolves it in the
    /// catalog of `kind` instead, if the name is known there.
    pub(crate) fn change_representation(&mut self, node: NodeId, kind: RepresentationKind) -> bool {
        let changed = &mut self.tree[node];
        changed.found = false;
        if let Some(previous) = changed.representation.take() {
            changed.properties.remove(match previous.kind() {
                RepresentationKind::Collection => Properties::COLLECTION,
                RepresentationKind::Entity => Properties::ENTITY,
                RepresentationKind::Attribute => Properties::ATTRIBUTE,
                RepresentationKind::Function => Properties::FUNCTION,
            });
        }
        if !changed.has_alternative(kind) {
            return false;
        }
        tracing::debug!(name = %changed.name, ?kind, "change representation");
        match kind {
            RepresentationKind::Collection => self.find_collection(node),
            RepresentationKind::Entity => self.find_entity(node),
            RepresentationKind::Attribute => self.find_attribute(node),
            RepresentationKind::Function => self.find_function(node),
        }
    }

    /// Replaces the second to last constituent of a compound in the tree.
    /// Returns false when that constituent was never placed.
    fn splice_compound(&mut self, compound: NodeId) -> bool {
        let constituents = &self.tree[compound].constituents;
        let Some(subsumed) = constituents
            .len()
            .checked_sub(2)
            .map(|position| constituents[position])
        else {
            return false;
        };
        if self.tree[subsumed].parent.is_none() {
            return false;
        }
        tracing::debug!(
            replaced = %self.tree[subsumed].name,
            compound = %self.tree[compound].name,
            "splice compound"
        );
        self.tree.insert_before(compound, subsumed);
        self.tree.remove_branch(subsumed);

        let tree = &*self.tree;
        self.context
            .internal_fxns
            .retain(|function| !tree[*function].has(Properties::SUBSUMED));
        self.context.arguments.retain(|argument| {
            !tree[*argument]
                .parent
                .is_some_and(|function| tree[function].has(Properties::SUBSUMED))
        });

        for child in self.tree[subsumed].children.clone() {
            if self.tree[child].has(Properties::ARGUMENT) {
                for grandchild in self.tree[child].children.clone() {
                    self.tree.remove_branch(grandchild);
                    self.form_tree(grandchild);
                }
            } else {
                self.tree.remove_branch(child);
                self.form_tree(child);
            }
        }

        if self.tree[compound].has(Properties::FUNCTION) {
            self.back_search(compound);
        }
        self.enter_insert_mode(compound);
        true
    }

    fn place_function(&mut self, node: NodeId) {
        let slot = self.context.arguments.iter().rev().copied().find(|argument| {
            let argument = &self.tree[*argument];
            argument.has(Properties::FUNCTION) && argument.parent != Some(node) && !argument.found
        });
        match slot.and_then(|slot| self.tree[slot].parent) {
            Some(function) => {
                self.add_node_to_function(node, function);
            }
            None => {
                let root = self.tree.root();
                self.tree.add_child(root, node);
            }
        }
        self.back_search(node);
    }

    fn all_arguments_found(&self, function: NodeId) -> bool {
        self.tree[function]
            .children
            .iter()
            .all(|argument| self.tree[*argument].found)
    }

    fn is_ancestor(&self, ancestor: NodeId, node: NodeId) -> bool {
        let mut current = self.tree[node].parent;
        while let Some(parent) = current {
            if parent == ancestor {
                return true;
            }
            current = self.tree[parent].parent;
        }
        false
    }

    /// Pulls nodes placed before a function into its arguments.
    fn back_search(&mut self, node: NodeId) {
        let Some(function) = self.tree[node].function().cloned() else {
            return;
        };
        match function.kind {
            FunctionType::Group => self.group_under(node),
            FunctionType::Insert => self.gather_insert(node),
            FunctionType::Filter => self.gather_filter(node, function.attribute),
            FunctionType::Negate => {}
            FunctionType::Calculate => self.gather_calculation(node),
            _ if !function.fields.is_empty() => {
                for found in self.context.found.clone().into_iter().rev() {
                    self.tree.remove_node(found);
                    self.form_tree(found);
                    if self.all_arguments_found(node) {
                        break;
                    }
                }
            }
            _ => {}
        }
    }

    /// Moves everything on the root under the grouping's first argument.
    fn group_under(&mut self, node: NodeId) {
        let Some(&new_root) = self.tree[node].children.first() else {
            return;
        };
        let root = self.tree.root();
        for child in self.tree[root].children.clone() {
            if child == node || self.is_ancestor(child, node) {
                continue;
            }
            self.tree.reroot(child, new_root);
            self.tree[new_root].found = true;
        }
    }

    fn gather_insert(&mut self, node: NodeId) {
        let ix = self.tree[node].ix;
        let mut entity = self
            .context
            .found
            .iter()
            .rev()
            .copied()
            .find(|found| self.tree[*found].has(Properties::ENTITY) && self.tree[*found].ix < ix);
        if entity.is_none() {
            entity = self.promote_entity(ix);
        }
        let Some(entity) = entity else {
            return;
        };
        self.tree.remove_node(entity);
        self.add_node_to_function(entity, node);

        let entity_ix = self.tree[entity].ix;
        if matches!(self.tree[node].name.as_str(), "is a" | "is an") {
            let membership = self.string_node("is a", ix);
            self.add_node_to_function(membership, node);
            return;
        }

        let attribute = self.context.found.iter().rev().copied().find(|found| {
            self.tree[*found].has(Properties::ATTRIBUTE) && self.tree[*found].ix > entity_ix
        });
        if let Some(attribute) = attribute {
            self.tree.remove_node(attribute);
            self.add_node_to_function(attribute, node);
            return;
        }

        // The words between the entity and the trigger name the attribute.
        let mut words: Vec<NodeId> = self
            .context
            .nodes
            .iter()
            .copied()
            .filter(|word| self.tree[*word].ix > entity_ix + 1)
            .collect();
        words.pop();
        if words.is_empty() {
            return;
        }
        for word in &words {
            self.tree.remove_node(*word);
        }
        let name = words
            .iter()
            .map(|word| self.tree[*word].name.as_str())
            .join(" ");
        let attribute = self.string_node(&name, self.tree[words[0]].ix);
        self.add_node_to_function(attribute, node);
    }

    /// A literal string standing in for an attribute.
    fn string_node(&mut self, name: &str, ix: usize) -> NodeId {
        let node = self.implicit(name);
        let string = &mut self.tree[node];
        string.ix = ix;
        string.representation = Some(Representation::Attribute(Attribute::literal(name)));
        string.properties |= Properties::STRING | Properties::ATTRIBUTE;
        string.kind = Some(NodeType::String);
        string.found = true;
        node
    }

    /// Treats the latest unresolved proper noun before `ix` as a new entity.
    fn promote_entity(&mut self, ix: usize) -> Option<NodeId> {
        let candidate = self
            .context
            .maybe_entities
            .iter()
            .rev()
            .copied()
            .find(|maybe| {
                let maybe = &self.tree[*maybe];
                !maybe.has(Properties::SUBSUMED) && !maybe.found && maybe.ix < ix
            })?;
        let name = self.tree[candidate].name.clone();
        let mut entity = Entity::new(&name, &name);
        entity.project = false;
        tracing::debug!(%name, "new entity");
        self.resolve(
            candidate,
            Representation::Entity(entity),
            Properties::ENTITY,
            NodeType::Entity,
        );
        Some(candidate)
    }

    fn gather_filter(&mut self, node: NodeId, attribute: Option<&'static str>) {
        if let Some(attribute) = attribute {
            let left = self.implicit(attribute);
            self.form_tree(left);
            let right = self.implicit(attribute);
            self.find_attribute(right);
            self.add_node_to_function(right, node);
            return;
        }
        let orphans: Vec<NodeId> = self
            .context
            .found
            .iter()
            .copied()
            .filter(|found| self.tree[*found].has(Properties::ATTRIBUTE))
            .collect();
        for orphan in orphans {
            self.tree.remove_node(orphan);
            self.form_tree(orphan);
            if self.all_arguments_found(node) {
                break;
            }
        }
    }

    fn gather_calculation(&mut self, node: NodeId) {
        let operands: Vec<NodeId> = self
            .context
            .nodes
            .iter()
            .copied()
            .filter(|candidate| {
                self.tree[*candidate].properties.intersects(
                    Properties::ATTRIBUTE | Properties::QUANTITY | Properties::FUNCTION,
                )
            })
            .collect();
        for operand in operands {
            let under_argument = self.tree[operand]
                .parent
                .is_some_and(|parent| self.tree[parent].has(Properties::ARGUMENT));
            if under_argument {
                continue;
            }
            match self.tree[operand].function().map(|function| function.kind) {
                Some(FunctionType::Aggregate) => {
                    self.tree.remove_branch(operand);
                }
                Some(_) => continue,
                None => {
                    self.tree.remove_node(operand);
                }
            }
            self.form_tree(operand);
            if self.all_arguments_found(node) {
                break;
            }
        }
    }

    /// Places a resolved, non-function node.
    fn place(&mut self, node: NodeId) {
        let mut implicit_nodes = Vec::new();
        if self.tree[node].relationships.is_empty() {
            for found in self.context.found.clone().into_iter().rev() {
                if found == node {
                    continue;
                }
                if self.tree[node].relationships.is_empty() {
                    self.tree.remove_node(node);
                }
                let relationship = self.find_relationship(node, found);
                if !relationship.is_none() {
                    implicit_nodes = relationship.implicit_nodes;
                    break;
                }
                let placed = &self.tree[node];
                if self.tree[found].has(Properties::POSSESSIVE)
                    && !placed.found
                    && !placed.has(Properties::QUANTITY)
                {
                    push_unique(&mut self.context.maybe_attributes, node);
                }
            }
        }

        for function in self.context.open_functions(self.tree) {
            if self.add_node_to_function(node, function) {
                break;
            }
        }

        if self.tree[node].parent.is_none() {
            let root = self.tree.root();
            let related_attribute = self.tree[node]
                .relationships
                .iter()
                .flat_map(|index| self.context.relationships[*index].nodes.iter())
                .copied()
                .find(|related| self.tree[*related].has(Properties::ATTRIBUTE));
            let parent = related_attribute
                .and_then(|attribute| self.tree.ancestor_with(attribute, Properties::ROOT))
                .unwrap_or(root);
            self.tree.add_child(parent, node);
        }

        for implicit in implicit_nodes {
            self.form_tree(implicit);
        }
    }

    /// Fills the first open argument of `function` that accepts `node`.
    ///
    /// A possessive selection is dissolved instead: the function is removed
    /// and its subject takes its place, marked possessive.
    pub(crate) fn add_node_to_function(&mut self, node: NodeId, function: NodeId) -> bool {
        let properties = self.tree[node].properties;
        let accepted = [
            Properties::ENTITY,
            Properties::COLLECTION,
            Properties::ATTRIBUTE,
            Properties::FUNCTION,
        ]
        .into_iter()
        .find(|property| properties.contains(*property));
        let slot = self.tree[function].children.iter().copied().find(|argument| {
            let argument = &self.tree[*argument];
            match accepted {
                Some(property) => argument.has(property) && !argument.found,
                None => argument.has(Properties::ROOT),
            }
        });
        let Some(slot) = slot else {
            return false;
        };
        let Some(kind) = self.tree[function].function().map(|function| function.kind) else {
            return false;
        };
        tracing::trace!(
            node = %self.tree[node].name,
            function = %self.tree[function].name,
            argument = %self.tree[slot].name,
            "fill argument"
        );

        match kind {
            FunctionType::Group if self.tree[slot].name == "collection" => {
                push_unique(&mut self.context.groupings, node);
                self.tree.add_child(slot, node);
            }
            FunctionType::Select => {
                let root = self
                    .tree
                    .ancestor_with(function, Properties::ROOT)
                    .unwrap_or(self.tree.root());
                self.tree.remove_branch(function);
                let arguments = self.tree[function].children.clone();
                self.context
                    .arguments
                    .retain(|argument| !arguments.contains(argument));
                self.context
                    .internal_fxns
                    .retain(|internal| *internal != function);
                self.tree[node].properties |= Properties::POSSESSIVE;
                self.tree.add_child(root, node);
                return true;
            }
            _ => self.tree.add_child(slot, node),
        }
        self.tree[slot].found = true;
        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::lexicon::{EnglishLemmatizer, NeverSingularize, Word, tag_word};
    use crate::store::MemoryStore;

    struct Session {
        store: MemoryStore,
        lemmatizer: NeverSingularize<EnglishLemmatizer>,
        config: ParserConfig,
        tree: Tree,
        context: Context,
    }

    impl Session {
        fn new(store: MemoryStore) -> Self {
            let lemmatizer = NeverSingularize::new(EnglishLemmatizer);
            let tree = Tree::new(tag_implicit("root", &lemmatizer));
            Self {
                store,
                lemmatizer,
                config: ParserConfig::default(),
                tree,
                context: Context::new(),
            }
        }

        fn words(&mut self, text: &str) {
            for word in text.split(' ') {
                let ix = self.tree.last_token().ix + 1;
                let token = tag_word(
                    &Word {
                        ix,
                        text: word.to_string(),
                    },
                    &self.lemmatizer,
                );
                let node = self.tree.append(token);
                Builder::new(
                    &mut self.tree,
                    &mut self.context,
                    &self.store,
                    &self.lemmatizer,
                    &self.config,
                )
                .form_tree(node);
            }
        }
    }

    fn store() -> MemoryStore {
        let mut store = MemoryStore::new();
        store.insert_collection("test data", "test data").unwrap();
        store.insert_collection("employee", "employee").unwrap();
        store.insert_entity("corey", "Corey").unwrap();
        store.add_member("employee", "corey").unwrap();
        store.add_member("test data", "corey").unwrap();
        store.add_fact("corey", "salary", 10).unwrap();
        store
    }

    #[test]
    fn test_folds_compound() {
        let mut session = Session::new(store());
        session.words("test data");

        let root = session.tree.root();
        let &[compound] = &session.tree[root].children[..] else {
            panic!("expected a single child: {}", session.tree);
        };
        let node = &session.tree[compound];
        assert_eq!(node.name, "test data");
        assert!(node.has(Properties::COMPOUND | Properties::COLLECTION));
        assert!(!node.has(Properties::SUBSUMED));
        assert_eq!(node.ix, 2);
        assert!(
            node.constituents
                .iter()
                .all(|word| session.tree[*word].has(Properties::SUBSUMED))
        );
    }

    #[test]
    fn test_unresolved_words_are_held() {
        let mut session = Session::new(store());
        session.words("Flurbs flurbs flurb");

        assert_eq!(session.context.maybe_entities.len(), 1);
        assert_eq!(session.context.maybe_collections.len(), 1);
        assert_eq!(session.context.maybe_attributes.len(), 1);
        assert!(session.tree[session.tree.root()].children.is_empty());
    }

    #[test]
    fn test_function_creates_arguments() {
        let mut session = Session::new(store());
        session.words("sum");

        let root = session.tree.root();
        let sum = session.tree[root].children[0];
        let names: Vec<_> = session.tree[sum]
            .children
            .iter()
            .map(|argument| session.tree[*argument].name.as_str())
            .collect();
        assert_eq!(names, vec!["sum", "value"]);
        let output = session.tree[sum].children[0];
        assert!(session.tree[output].found);
        assert_eq!(session.tree[session.tree[output].children[0]].name, "output0");
        assert_eq!(session.context.fxns, vec![sum]);
        assert_eq!(session.context.arguments.len(), 2);
    }

    #[test]
    fn test_possessive_selection_dissolves() {
        let mut session = Session::new(store());
        session.words("Corey 's salary");

        let root = session.tree.root();
        assert!(session.context.internal_fxns.is_empty());
        let corey = session.tree[root].children[0];
        assert!(session.tree[corey].has(Properties::POSSESSIVE | Properties::ENTITY));
        let salary = session.tree[root].children[1];
        assert_eq!(
            session.tree[salary].attribute().unwrap().variable,
            "corey|salary"
        );
    }

    #[test]
    fn test_insert_trigger_after_determiner_is_not_placed() {
        let mut session = Session::new(store());
        session.words("employees that is");

        assert!(!session.context.state.insert);
        assert!(session.context.internal_fxns.is_empty());
    }

    #[test]
    fn test_separator_enters_list_mode() {
        let mut session = Session::new(store());
        session.words("employees");
        assert!(!session.context.state.list);

        session.words(", salary");
        assert!(session.context.state.list);
        let salaries = session
            .context
            .found
            .iter()
            .filter(|node| session.tree[**node].name == "salary")
            .count();
        assert_eq!(salaries, 1);
    }

    #[test]
    fn test_compound_span_is_capped() {
        let mut store = store();
        store
            .insert_collection("very old test data", "very old test data")
            .unwrap();
        store
            .insert_collection("very very old test data", "very very old test data")
            .unwrap();
        let mut session = Session::new(store);
        session.config.ngram_window = 10;
        session.words("very very old test data");

        let names: Vec<_> = session
            .context
            .found
            .iter()
            .map(|node| session.tree[*node].name.as_str())
            .collect();
        assert!(names.contains(&"very old test data"), "{names:?}");
        assert!(!names.contains(&"very very old test data"), "{names:?}");
    }
}
