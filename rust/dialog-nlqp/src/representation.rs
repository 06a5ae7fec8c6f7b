//! What a resolved node stands for in the knowledge graph.
//!
//! A representation records the store id and display name of the thing a
//! node resolved to, plus the query-compilation state of that node: the
//! variable it binds, whether it is projected, and whether its term has
//! already been emitted.

use std::fmt;

use crate::function::BuiltInFunction;
use crate::node::NodeId;

/// A resolved entity, or a synthesized link between two collections.
#[derive(Debug, Clone, PartialEq)]
pub struct Entity {
    pub id: String,
    pub display_name: String,
    pub variable: String,
    pub project: bool,
    pub handled: bool,
    /// The entity stands for an attribute value rather than a store entity
    pub entity_attr: bool,
    /// The entity position of its term binds `variable` instead of the id
    pub entity_var: bool,
    /// The link position of its term binds `value` instead of the id
    pub value_var: bool,
    pub value: Option<String>,
    pub projected_as: Option<String>,
}

impl Entity {
    pub fn new(id: &str, display_name: &str) -> Self {
        Self {
            id: id.to_string(),
            display_name: display_name.to_string(),
            variable: display_name.replace(' ', ""),
            project: true,
            handled: false,
            entity_attr: false,
            entity_var: false,
            value_var: false,
            value: None,
            projected_as: None,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Collection {
    pub id: String,
    pub display_name: String,
    pub variable: String,
    pub project: bool,
    pub handled: bool,
    pub projected_as: Option<String>,
}

impl Collection {
    pub fn new(id: &str, display_name: &str) -> Self {
        Self {
            id: id.to_string(),
            display_name: display_name.to_string(),
            variable: display_name.replace(' ', ""),
            project: true,
            handled: false,
            projected_as: None,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Attribute {
    pub id: String,
    pub display_name: String,
    pub variable: String,
    pub project: bool,
    pub handled: bool,
    /// Whether `variable` is a query variable rather than a literal
    pub attribute_var: bool,
    /// Nodes whose terms bind the entity this attribute is read from
    pub refs: Vec<NodeId>,
    pub projected_as: Option<String>,
}

impl Attribute {
    pub fn new(id: &str, display_name: &str) -> Self {
        Self {
            id: id.to_string(),
            display_name: display_name.to_string(),
            variable: display_name.replace(' ', ""),
            project: true,
            handled: false,
            attribute_var: true,
            refs: Vec::new(),
            projected_as: None,
        }
    }

    /// A literal value standing in for an attribute: quantities, function
    /// outputs and synthesized strings.
    pub fn literal(name: &str) -> Self {
        Self {
            variable: name.to_string(),
            project: false,
            ..Self::new(name, name)
        }
    }
}

/// Which of the four catalogs a representation came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum RepresentationKind {
    Entity,
    Collection,
    Attribute,
    Function,
}

/// The resolved meaning of a node.
#[derive(Debug, Clone, PartialEq)]
pub enum Representation {
    Entity(Entity),
    Collection(Collection),
    Attribute(Attribute),
    Function(BuiltInFunction),
}

impl Representation {
    pub fn kind(&self) -> RepresentationKind {
        match self {
            Representation::Entity(_) => RepresentationKind::Entity,
            Representation::Collection(_) => RepresentationKind::Collection,
            Representation::Attribute(_) => RepresentationKind::Attribute,
            Representation::Function(_) => RepresentationKind::Function,
        }
    }
}

impl fmt::Display for Representation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Representation::Entity(entity) => write!(f, "[{}]", entity.display_name),
            Representation::Collection(collection) => write!(f, "[{}]", collection.display_name),
            Representation::Attribute(attribute) => write!(f, "[{}]", attribute.variable),
            Representation::Function(function) => write!(f, "[{}]", function.name),
        }
    }
}
