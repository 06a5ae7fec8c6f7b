//! Classifying a settled session as a query, an insert or neither.

use std::fmt;

use crate::context::Context;
use crate::function::FunctionType;
use crate::lexicon::{Lemmatizer, tag_implicit};
use crate::node::{Node, NodeId, NodeType, Tree};
use crate::query::{Query, compile};
use crate::token::Properties;

/// What the caller should do with a parse.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Intent {
    /// Run the compiled query
    Query,
    /// Assert the returned facts
    Insert,
    /// Some words did not resolve; ask the user about them
    MoreInfo,
    /// The sentence is incomplete or would only produce a product join
    NoResult,
}

impl fmt::Display for Intent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Intent::Query => "QUERY",
            Intent::Insert => "INSERT",
            Intent::MoreInfo => "MOREINFO",
            Intent::NoResult => "NORESULT",
        };
        write!(f, "{name}")
    }
}

/// A fact to assert, as snapshots of the nodes filling an insert.
#[derive(Debug, Clone, PartialEq)]
pub struct Insert {
    pub entity: Node,
    pub attribute: Node,
    pub value: Node,
}

pub(crate) struct Outcome {
    pub intent: Intent,
    pub query: Query,
    pub inserts: Vec<Insert>,
}

impl Outcome {
    fn no_result() -> Self {
        Self {
            intent: Intent::NoResult,
            query: Query::new(),
            inserts: Vec::new(),
        }
    }
}

/// Decides the intent of a settled session and produces its query or
/// inserts. The session itself is left untouched.
pub(crate) fn decide(tree: &Tree, context: &Context, lemmatizer: &impl Lemmatizer) -> Outcome {
    if !tree.all_found(tree.root()) {
        return Outcome::no_result();
    }

    let inserts: Vec<NodeId> = context
        .internal_fxns
        .iter()
        .copied()
        .filter(|function| {
            tree[*function]
                .function()
                .is_some_and(|function| function.kind == FunctionType::Insert)
        })
        .collect();
    if !inserts.is_empty() {
        let mut snapshot = tree.clone();
        let inserts = inserts
            .into_iter()
            .filter_map(|function| materialize(&mut snapshot, function, lemmatizer))
            .collect();
        return Outcome {
            intent: Intent::Insert,
            query: Query::new(),
            inserts,
        };
    }

    if !context.maybe_attributes.is_empty() {
        return Outcome {
            intent: Intent::MoreInfo,
            ..Outcome::no_result()
        };
    }
    if context.found.len() > 1 && product_join(tree, context) {
        return Outcome::no_result();
    }

    let mut snapshot = tree.clone();
    let query = compile(&mut snapshot);
    if query.projects.is_empty() {
        return Outcome::no_result();
    }
    Outcome {
        intent: Intent::Query,
        query,
        inserts: Vec::new(),
    }
}

/// An attribute read from nothing, or a collection related to nothing,
/// would join every row with every other.
fn product_join(tree: &Tree, context: &Context) -> bool {
    let loose_attribute = context.attributes.iter().any(|attribute| {
        let node = &tree[*attribute];
        let unreferenced = node.attribute().is_some_and(|attribute| attribute.refs.is_empty());
        let under_argument = node
            .parent
            .is_some_and(|parent| tree[parent].has(Properties::ARGUMENT));
        unreferenced && !under_argument
    });
    let loose_collection = context
        .collections
        .iter()
        .any(|collection| tree[*collection].relationships.is_empty());
    loose_attribute || loose_collection
}

/// Reads the filled arguments of an insert. A value spread over several
/// unresolved words is collapsed into one string first.
fn materialize(
    tree: &mut Tree,
    function: NodeId,
    lemmatizer: &impl Lemmatizer,
) -> Option<Insert> {
    let arguments = tree[function].children.clone();
    if !arguments.iter().all(|argument| tree[*argument].found) {
        return None;
    }
    let [entity, attribute, value] = arguments[..] else {
        return None;
    };

    let words = tree[value].children.clone();
    if words.len() > 1 && words.iter().all(|word| tree[*word].children.is_empty()) {
        let name = words
            .iter()
            .map(|word| tree[*word].name.as_str())
            .collect::<Vec<_>>()
            .join(" ");
        let string = tree.create(tag_implicit(&name, lemmatizer));
        tree[string].found = true;
        tree[string].kind = Some(NodeType::String);
        for word in words {
            tree.remove_node(word);
        }
        tree.add_child(value, string);
    }

    let first = |argument: NodeId| tree[argument].children.first().map(|node| tree[*node].clone());
    Some(Insert {
        entity: first(entity)?,
        attribute: first(attribute)?,
        value: first(value)?,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::lexicon::EnglishLemmatizer;
    use crate::representation::{Attribute, Representation};

    fn attribute(tree: &mut Tree, name: &str) -> NodeId {
        let node = tree.create(tag_implicit(name, &EnglishLemmatizer));
        tree[node].representation = Some(Representation::Attribute(Attribute::new(name, name)));
        tree[node].properties = Properties::ATTRIBUTE;
        tree[node].found = true;
        node
    }

    #[test]
    fn test_unplaced_tree_has_no_result() {
        let mut tree = Tree::new(tag_implicit("root", &EnglishLemmatizer));
        let root = tree.root();
        let salary = attribute(&mut tree, "salary");
        tree.add_child(root, salary);
        tree[salary].found = false;

        let outcome = decide(&tree, &Context::new(), &EnglishLemmatizer);
        assert_eq!(outcome.intent, Intent::NoResult);
        assert!(outcome.query.is_empty());
    }

    #[test]
    fn test_unreferenced_attributes_are_a_product_join() {
        let mut tree = Tree::new(tag_implicit("root", &EnglishLemmatizer));
        let root = tree.root();
        let salary = attribute(&mut tree, "salary");
        let age = attribute(&mut tree, "age");
        tree.add_child(root, salary);
        tree.add_child(root, age);
        let mut context = Context::new();
        context.found = vec![salary, age];
        context.attributes = vec![salary, age];

        assert_eq!(
            decide(&tree, &context, &EnglishLemmatizer).intent,
            Intent::NoResult
        );

        context.found.truncate(1);
        let outcome = decide(&tree, &context, &EnglishLemmatizer);
        assert_eq!(outcome.intent, Intent::Query);
        assert_eq!(
            outcome.query.to_string(),
            "(query\n\
             \t(select \"entity eavs\" :attribute \"salary\" :value salary)\n\
             \t(select \"entity eavs\" :attribute \"age\" :value age)\n\
             \t(project! :salary salary :age age)\n\
             )"
        );
        assert!(!tree[salary].attribute().unwrap().handled);
    }

    #[test]
    fn test_pending_words_ask_for_more() {
        let tree = Tree::new(tag_implicit("root", &EnglishLemmatizer));
        let mut context = Context::new();
        context.maybe_attributes.push(tree.root());

        assert_eq!(
            decide(&tree, &context, &EnglishLemmatizer).intent,
            Intent::MoreInfo
        );
    }
}
