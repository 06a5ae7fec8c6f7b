//! The parse tree.
//!
//! Nodes live in an arena owned by [`Tree`] and refer to each other through
//! [`NodeId`] handles. A node has at most one parent and an ordered list of
//! children, so re-parenting is a matter of rewriting two handle lists.
//! Nodes are never freed during a session: a detached node simply has no
//! parent.
//!
//! The tree also owns every [`Token`] of the session. Word tokens form one
//! chain starting at the synthetic root token; tokens of synthesized nodes
//! (function arguments, compounds, implicit links) stay off that chain.

use std::fmt;
use std::ops::{Index, IndexMut};

use crate::function::BuiltInFunction;
use crate::representation::{Attribute, Collection, Entity, Representation, RepresentationKind};
use crate::token::{MinorPartOfSpeech, Properties, Token, TokenId};

/// Handle of a node inside a [`Tree`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NodeId(pub(crate) usize);

/// The semantic type of a resolved node.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum NodeType {
    Entity,
    Collection,
    Attribute,
    Number,
    String,
    Function,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Node {
    pub token: TokenId,
    /// Session position of the word this node stands for
    pub ix: usize,
    pub name: String,
    pub parent: Option<NodeId>,
    pub children: Vec<NodeId>,
    pub kind: Option<NodeType>,
    pub representation: Option<Representation>,
    /// Every catalog entry the name resolves to, computed once the node is
    /// first found
    pub alternatives: Option<Vec<Representation>>,
    /// Indices into the session's relationship list
    pub relationships: Vec<usize>,
    pub found: bool,
    /// The subsumed nodes of a compound, in word order
    pub constituents: Vec<NodeId>,
    pub properties: Properties,
    pub quantity: Option<f64>,
}

impl Node {
    fn new(token_id: TokenId, token: &Token) -> Self {
        Self {
            token: token_id,
            ix: token.ix,
            name: token.normalized.clone(),
            parent: None,
            children: Vec::new(),
            kind: None,
            representation: None,
            alternatives: None,
            relationships: Vec::new(),
            found: false,
            constituents: Vec::new(),
            properties: token.properties,
            quantity: None,
        }
    }

    pub fn has(&self, property: Properties) -> bool {
        self.properties.contains(property)
    }

    pub fn entity(&self) -> Option<&Entity> {
        match &self.representation {
            Some(Representation::Entity(entity)) => Some(entity),
            _ => None,
        }
    }

    pub fn entity_mut(&mut self) -> Option<&mut Entity> {
        match &mut self.representation {
            Some(Representation::Entity(entity)) => Some(entity),
            _ => None,
        }
    }

    pub fn collection(&self) -> Option<&Collection> {
        match &self.representation {
            Some(Representation::Collection(collection)) => Some(collection),
            _ => None,
        }
    }

    pub fn collection_mut(&mut self) -> Option<&mut Collection> {
        match &mut self.representation {
            Some(Representation::Collection(collection)) => Some(collection),
            _ => None,
        }
    }

    pub fn attribute(&self) -> Option<&Attribute> {
        match &self.representation {
            Some(Representation::Attribute(attribute)) => Some(attribute),
            _ => None,
        }
    }

    pub fn attribute_mut(&mut self) -> Option<&mut Attribute> {
        match &mut self.representation {
            Some(Representation::Attribute(attribute)) => Some(attribute),
            _ => None,
        }
    }

    pub fn function(&self) -> Option<&BuiltInFunction> {
        match &self.representation {
            Some(Representation::Function(function)) => Some(function),
            _ => None,
        }
    }

    /// Whether the name also resolves in the catalog of `kind`.
    pub fn has_alternative(&self, kind: RepresentationKind) -> bool {
        self.alternatives
            .iter()
            .flatten()
            .any(|alternative| alternative.kind() == kind)
    }
}

/// The arena holding a session's tokens and nodes.
#[derive(Debug, Clone, PartialEq)]
pub struct Tree {
    tokens: Vec<Token>,
    nodes: Vec<Node>,
    root: NodeId,
    chain: Vec<NodeId>,
}

impl Tree {
    /// Starts a tree whose root wraps `token`.
    pub(crate) fn new(mut token: Token) -> Self {
        token.pos = MinorPartOfSpeech::Root;
        token.properties |= Properties::ROOT;
        let mut tree = Self {
            tokens: Vec::new(),
            nodes: Vec::new(),
            root: NodeId(0),
            chain: Vec::new(),
        };
        let root = tree.create(token);
        tree[root].found = true;
        tree.root = root;
        tree
    }

    pub fn root(&self) -> NodeId {
        self.root
    }

    /// Word nodes of the session in input order, root excluded.
    pub fn chain(&self) -> &[NodeId] {
        &self.chain
    }

    /// The token the last word was read from, or the root token.
    pub fn last_token(&self) -> &Token {
        let node = self.chain.last().copied().unwrap_or(self.root);
        &self[self[node].token]
    }

    /// Creates a detached node off the word chain.
    pub(crate) fn create(&mut self, token: Token) -> NodeId {
        let token_id = TokenId(self.tokens.len());
        let id = NodeId(self.nodes.len());
        self.nodes.push(Node::new(token_id, &token));
        self.tokens.push(token);
        id
    }

    /// Creates a detached node for the next word, linking its token after
    /// the previous one.
    pub(crate) fn append(&mut self, token: Token) -> NodeId {
        let previous = self[self.chain.last().copied().unwrap_or(self.root)].token;
        let id = self.create(token);
        let token = self[id].token;
        self.tokens[previous.0].next = Some(token);
        self.tokens[token.0].prev = Some(previous);
        self.chain.push(id);
        id
    }

    /// The chain of session tokens, root first.
    pub fn token_chain(&self) -> Vec<TokenId> {
        std::iter::once(self.root)
            .chain(self.chain.iter().copied())
            .map(|node| self[node].token)
            .collect()
    }

    /// Appends `child` to `parent`, detaching it from any previous parent.
    pub(crate) fn add_child(&mut self, parent: NodeId, child: NodeId) {
        if let Some(previous) = self[child].parent {
            self[previous].children.retain(|sibling| *sibling != child);
        }
        self[parent].children.push(child);
        self[child].parent = Some(parent);
    }

    /// Detaches `node` from the tree, handing its children to its parent in
    /// word order. An argument left without children is no longer filled.
    ///
    /// Returns false for the root, for argument slots that accept the root,
    /// and for nodes that are already detached and childless.
    pub(crate) fn remove_node(&mut self, node: NodeId) -> bool {
        if self[node].has(Properties::ROOT) {
            return false;
        }
        if self[node].parent.is_none() && self[node].children.is_empty() {
            return false;
        }
        let children = std::mem::take(&mut self[node].children);
        let parent = self[node].parent.take();
        match parent {
            Some(parent) => {
                let mut siblings = std::mem::take(&mut self[parent].children);
                siblings.extend(children.iter().copied());
                siblings.sort_by_key(|sibling| self[*sibling].ix);
                siblings.retain(|sibling| *sibling != node);
                for child in &children {
                    self[*child].parent = Some(parent);
                }
                if siblings.is_empty() && self[parent].has(Properties::ARGUMENT) {
                    self[parent].found = false;
                }
                self[parent].children = siblings;
            }
            None => {
                for child in &children {
                    self[*child].parent = None;
                }
            }
        }
        true
    }

    /// Detaches `node` together with its subtree.
    pub(crate) fn remove_branch(&mut self, node: NodeId) -> bool {
        let Some(parent) = self[node].parent.take() else {
            return false;
        };
        self[parent].children.retain(|child| *child != node);
        true
    }

    /// Moves `node` and its subtree under `target`.
    pub(crate) fn reroot(&mut self, node: NodeId, target: NodeId) {
        self.remove_branch(node);
        self.add_child(target, node);
    }

    /// Puts `node` in the place of `target` and makes `target` its child.
    pub(crate) fn insert_before(&mut self, node: NodeId, target: NodeId) {
        let Some(parent) = self[target].parent else {
            return;
        };
        self.add_child(parent, node);
        self[parent].children.retain(|child| *child != target);
        self.add_child(node, target);
    }

    /// The nearest proper ancestor carrying `property`.
    pub fn ancestor_with(&self, node: NodeId, property: Properties) -> Option<NodeId> {
        let mut current = self[node].parent;
        while let Some(ancestor) = current {
            if self[ancestor].has(property) {
                return Some(ancestor);
            }
            current = self[ancestor].parent;
        }
        None
    }

    /// Whether `node` and its whole subtree are found.
    pub fn all_found(&self, node: NodeId) -> bool {
        self[node].found
            && self[node]
                .children
                .iter()
                .all(|child| self.all_found(*child))
    }

    /// The childless descendants of `node`, or `node` itself.
    pub fn leaves(&self, node: NodeId) -> Vec<NodeId> {
        if self[node].children.is_empty() {
            return vec![node];
        }
        self[node]
            .children
            .iter()
            .flat_map(|child| self.leaves(*child))
            .collect()
    }

    fn write_node(&self, f: &mut fmt::Formatter<'_>, id: NodeId, depth: usize) -> fmt::Result {
        let node = &self[id];
        let found = if node.found { "*" } else { " " };
        write!(f, "|{found}{}{}: {}", " ".repeat(depth), node.ix, node.name)?;
        if let Some(representation) = &node.representation {
            write!(f, " {representation}")?;
        }
        if !node.properties.is_empty() {
            write!(f, " {}", node.properties)?;
        }
        for child in &node.children {
            writeln!(f)?;
            self.write_node(f, *child, depth + 1)?;
        }
        Ok(())
    }
}

impl Index<NodeId> for Tree {
    type Output = Node;

    fn index(&self, id: NodeId) -> &Node {
        &self.nodes[id.0]
    }
}

impl IndexMut<NodeId> for Tree {
    fn index_mut(&mut self, id: NodeId) -> &mut Node {
        &mut self.nodes[id.0]
    }
}

impl Index<TokenId> for Tree {
    type Output = Token;

    fn index(&self, id: TokenId) -> &Token {
        &self.tokens[id.0]
    }
}

impl fmt::Display for Tree {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.write_node(f, self.root, 0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::lexicon::{EnglishLemmatizer, Word, tag_word};

    fn word(tree: &mut Tree, ix: usize, text: &str) -> NodeId {
        tree.append(tag_word(
            &Word {
                ix,
                text: text.to_string(),
            },
            &EnglishLemmatizer,
        ))
    }

    fn tree() -> Tree {
        Tree::new(tag_word(
            &Word {
                ix: 0,
                text: "root".to_string(),
            },
            &EnglishLemmatizer,
        ))
    }

    #[test]
    fn test_append_links_token_chain() {
        let mut tree = tree();
        let moons = word(&mut tree, 1, "moons");
        let planet = word(&mut tree, 2, "planet");

        let root_token = tree[tree.root()].token;
        assert_eq!(tree[root_token].next, Some(tree[moons].token));
        assert_eq!(tree[tree[planet].token].prev, Some(tree[moons].token));
        assert_eq!(tree.chain(), &[moons, planet]);
        assert_eq!(tree.token_chain().len(), 3);
        assert_eq!(tree.last_token().normalized, "planet");
    }

    #[test]
    fn test_remove_node_promotes_children_in_order() {
        let mut tree = tree();
        let root = tree.root();
        let a = word(&mut tree, 1, "a");
        let b = word(&mut tree, 2, "b");
        let c = word(&mut tree, 3, "c");
        tree.add_child(root, a);
        tree.add_child(root, c);
        tree.add_child(c, b);

        assert!(tree.remove_node(c));
        assert_eq!(tree[root].children, vec![a, b]);
        assert_eq!(tree[b].parent, Some(root));
        assert_eq!(tree[c].parent, None);
        assert!(!tree.remove_node(c));
        assert!(!tree.remove_node(root));
    }

    #[test]
    fn test_emptied_argument_is_unfound() {
        let mut tree = tree();
        let root = tree.root();
        let function = word(&mut tree, 1, "sum");
        let argument = word(&mut tree, 0, "value");
        let salary = word(&mut tree, 2, "salary");
        tree[argument].properties |= Properties::ARGUMENT;
        tree.add_child(root, function);
        tree.add_child(function, argument);
        tree.add_child(argument, salary);
        tree[argument].found = true;

        tree.remove_node(salary);
        assert!(!tree[argument].found);
        assert!(tree[argument].children.is_empty());
    }

    #[test]
    fn test_insert_before_and_ancestors() {
        let mut tree = tree();
        let root = tree.root();
        let test = word(&mut tree, 1, "test");
        let compound = word(&mut tree, 2, "test data");
        tree.add_child(root, test);

        tree.insert_before(compound, test);
        assert_eq!(tree[root].children, vec![compound]);
        assert_eq!(tree[compound].children, vec![test]);
        assert_eq!(tree.ancestor_with(test, Properties::ROOT), Some(root));

        tree.remove_branch(test);
        assert!(tree[compound].children.is_empty());
        assert_eq!(tree.leaves(root), vec![compound]);
    }

    #[test]
    fn test_display_marks_found_nodes() {
        let mut tree = tree();
        let root = tree.root();
        let moons = word(&mut tree, 1, "moons");
        tree.add_child(root, moons);
        tree[moons].found = true;

        assert_eq!(tree.to_string(), "|*0: root (ROOT)\n|* 1: moon (PLURAL)");
    }
}
