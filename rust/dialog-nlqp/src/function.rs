//! The built-in function catalog.
//!
//! Functions are recognised purely by their trigger word or phrase. Each one
//! declares a list of formal fields; the tree builder materialises every field
//! as an argument node under the function node and fills it with the first
//! node whose type the field accepts.

use std::fmt;

use crate::token::Properties;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FunctionType {
    /// Comparison between two attributes or quantities
    Filter,
    /// Reduction over all rows
    Aggregate,
    Boolean,
    /// Arithmetic between two attributes or quantities
    Calculate,
    /// Assertion of a new fact
    Insert,
    /// Possessive selection, dissolved once its subject attaches
    Select,
    Group,
    Negate,
}

impl fmt::Display for FunctionType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            FunctionType::Filter => "FILTER",
            FunctionType::Aggregate => "AGGREGATE",
            FunctionType::Boolean => "BOOLEAN",
            FunctionType::Calculate => "CALCULATE",
            FunctionType::Insert => "INSERT",
            FunctionType::Select => "SELECT",
            FunctionType::Group => "GROUP",
            FunctionType::Negate => "NEGATE",
        };
        write!(f, "{name}")
    }
}

/// A formal parameter of a built-in function.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FunctionField {
    pub name: &'static str,
    /// Node properties this field accepts
    pub types: Properties,
}

const fn field(name: &'static str, types: Properties) -> FunctionField {
    FunctionField { name, types }
}

const OPERAND: Properties = Properties::ATTRIBUTE.union(Properties::QUANTITY);

/// A catalog entry.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BuiltInFunction {
    /// Name used as the table of the emitted query term
    pub name: &'static str,
    pub kind: FunctionType,
    /// Attribute compared by filters whose trigger implies one, such as
    /// "taller" for height
    pub attribute: Option<&'static str>,
    pub fields: Vec<FunctionField>,
    /// Whether the function's output replaces the projected fields
    pub project: bool,
}

impl BuiltInFunction {
    fn new(name: &'static str, kind: FunctionType, fields: Vec<FunctionField>) -> Self {
        Self {
            name,
            kind,
            attribute: None,
            fields,
            project: false,
        }
    }

    fn filter(name: &'static str) -> Self {
        Self::new(
            name,
            FunctionType::Filter,
            vec![field("a", OPERAND), field("b", OPERAND)],
        )
    }

    fn comparing(mut self, attribute: &'static str) -> Self {
        self.attribute = Some(attribute);
        self
    }

    fn aggregate(name: &'static str, input: FunctionField) -> Self {
        Self {
            project: true,
            ..Self::new(
                name,
                FunctionType::Aggregate,
                vec![field(name, Properties::OUTPUT), input],
            )
        }
    }

    fn calculate(name: &'static str) -> Self {
        Self {
            project: true,
            ..Self::new(
                name,
                FunctionType::Calculate,
                vec![
                    field("result", Properties::OUTPUT),
                    field("a", OPERAND),
                    field("b", OPERAND),
                ],
            )
        }
    }

    /// Looks up the function triggered by `text`, a normalised word or
    /// space-separated phrase.
    pub fn from_trigger(text: &str) -> Option<Self> {
        let function = match text {
            "after" | ">" => Self::filter(">"),
            "before" | "<" => Self::filter("<"),
            ">=" => Self::filter(">="),
            "<=" => Self::filter("<="),
            "=" => Self::filter("="),
            "!=" => Self::filter("!="),
            "taller" => Self::filter(">").comparing("height"),
            "shorter" => Self::filter("<").comparing("length"),
            "longer" => Self::filter(">").comparing("length"),
            "younger" => Self::filter("<").comparing("age"),
            "and" | "&" => Self::new("and", FunctionType::Boolean, vec![]),
            "or" => Self::new("or", FunctionType::Boolean, vec![]),
            "sum" | "total" => Self::aggregate("sum", field("value", Properties::ATTRIBUTE)),
            "count" | "number of" | "count the number of" | "count number of" | "how many" => {
                Self::aggregate("count", field("root", Properties::ANY))
            }
            "average" | "avg" | "mean" => {
                Self::aggregate("average", field("value", Properties::ATTRIBUTE))
            }
            "plus" | "add" | "+" => Self::calculate("+"),
            "minus" | "subtract" | "-" => Self::calculate("-"),
            "times" | "multiply" | "multiplied" | "multiplied by" | "*" => Self::calculate("*"),
            "divide" | "divided" | "divided by" | "/" => Self::calculate("/"),
            "^" => Self::calculate("^"),
            "is" | "is a" | "is an" => Self::new(
                "insert",
                FunctionType::Insert,
                vec![
                    field("entity", Properties::ENTITY),
                    field("attribute", Properties::ATTRIBUTE),
                    field("root", Properties::ANY),
                ],
            ),
            "his" | "hers" | "their" | "its" | "'s" | "'" => Self::new(
                "select",
                FunctionType::Select,
                vec![field(
                    "subject",
                    Properties::ENTITY
                        .union(Properties::COLLECTION)
                        .union(Properties::ATTRIBUTE),
                )],
            ),
            "by" | "grouped by" | "per" => Self::new(
                "group",
                FunctionType::Group,
                vec![
                    field("root", Properties::ANY),
                    field(
                        "collection",
                        Properties::COLLECTION.union(Properties::ATTRIBUTE),
                    ),
                ],
            ),
            "except" | "without" | "not" | "aren't" => Self::new(
                "negate",
                FunctionType::Negate,
                vec![field(
                    "negated",
                    Properties::COLLECTION
                        .union(Properties::FUNCTION)
                        .union(Properties::ATTRIBUTE),
                )],
            ),
            _ => return None,
        };
        Some(function)
    }

    /// Whether the function's term is emitted into the query once all of
    /// its arguments are filled.
    pub fn emits_term(&self) -> bool {
        matches!(
            self.kind,
            FunctionType::Aggregate | FunctionType::Calculate | FunctionType::Filter
        )
    }
}
