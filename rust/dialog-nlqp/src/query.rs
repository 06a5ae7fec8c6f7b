//! The query IR and its compiler.
//!
//! A [`Query`] is a conjunction of select terms over knowledge-store tables,
//! nested subqueries, and projections. [`compile`] walks a parse tree bottom
//! up and emits one term per resolved node that has not already been folded
//! into a neighbour's term.

use std::fmt;

use crate::function::FunctionType;
use crate::node::{NodeId, Tree};
use crate::token::Properties;

/// A named slot of a term, bound either to a query variable or a constant.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Field {
    pub name: String,
    pub value: String,
    /// Whether `value` names a variable rather than a constant
    pub variable: bool,
}

impl Field {
    fn new(name: &str, value: &str, variable: bool) -> Self {
        Self {
            name: name.to_string(),
            value: value.to_string(),
            variable,
        }
    }
}

impl fmt::Display for Field {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.variable {
            write!(f, ":{} {}", self.name, self.value)
        } else {
            write!(f, ":{} \"{}\"", self.name, self.value)
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TermKind {
    Select,
    Project,
}

impl fmt::Display for TermKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TermKind::Select => write!(f, "select"),
            TermKind::Project => write!(f, "project!"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Term {
    pub kind: TermKind,
    /// The table selected from. Projections have none.
    pub table: Option<String>,
    pub fields: Vec<Field>,
}

impl Term {
    pub fn select(table: &str, fields: Vec<Field>) -> Self {
        Self {
            kind: TermKind::Select,
            table: Some(table.to_string()),
            fields,
        }
    }

    pub fn project(fields: Vec<Field>) -> Self {
        Self {
            kind: TermKind::Project,
            table: None,
            fields,
        }
    }

    /// Ordering key of terms within a query: facts, then links, then
    /// membership, then everything else.
    fn rank(&self) -> u8 {
        match self.table.as_deref() {
            Some(EAVS) => 1,
            Some(LINKS) => 2,
            Some(IS_A) => 3,
            _ => 4,
        }
    }

    fn render(&self, depth: usize) -> String {
        let mut rendered = format!("{}({} ", "\t".repeat(depth), self.kind);
        if let Some(table) = &self.table {
            rendered.push_str(&format!("\"{table}\" "));
        }
        let fields: Vec<String> = self.fields.iter().map(Field::to_string).collect();
        rendered.push_str(&fields.join(" "));
        rendered.push(')');
        rendered
    }
}

impl fmt::Display for Term {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.render(0))
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub enum QueryKind {
    #[default]
    Query,
    /// Rows matching the subquery are excluded
    Negate,
}

impl fmt::Display for QueryKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            QueryKind::Query => write!(f, "query"),
            QueryKind::Negate => write!(f, "negate"),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Query {
    pub kind: QueryKind,
    pub terms: Vec<Term>,
    pub subqueries: Vec<Query>,
    pub projects: Vec<Term>,
}

const EAVS: &str = "entity eavs";
const LINKS: &str = "directionless links";
const IS_A: &str = "is a attributes";

impl Query {
    pub fn new() -> Self {
        Self::default()
    }

    /// A query with neither terms nor projections renders as nothing.
    pub fn is_empty(&self) -> bool {
        self.terms.is_empty() && self.projects.is_empty()
    }

    fn render(&self, depth: usize) -> String {
        if self.is_empty() {
            return String::new();
        }
        let indent = "\t".repeat(depth);
        let mut rendered = format!("{indent}({}", self.kind);
        let sections = [
            self.terms
                .iter()
                .map(|term| term.render(depth + 1))
                .collect::<Vec<_>>(),
            self.subqueries
                .iter()
                .map(|query| query.render(depth + 1))
                .collect(),
            self.projects
                .iter()
                .map(|term| term.render(depth + 1))
                .collect(),
        ];
        for section in sections {
            let section = section.join("\n");
            if !section.is_empty() {
                rendered.push('\n');
                rendered.push_str(&section);
            }
        }
        rendered.push('\n');
        rendered.push_str(&indent);
        rendered.push(')');
        rendered
    }
}

impl fmt::Display for Query {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.render(0))
    }
}

fn add_fields(project: &mut Vec<Field>, fields: impl IntoIterator<Item = Field>) {
    for field in fields {
        if !project.iter().any(|existing| existing.name == field.name) {
            project.push(field);
        }
    }
}

/// Wraps `term` in a negated subquery. A negated fact only asks whether the
/// attribute is present, so its value is dropped.
fn negate(mut term: Term) -> Query {
    if term.table.as_deref() == Some(EAVS)
        && term.fields.get(2).is_some_and(|field| field.name == "value")
    {
        term.fields.remove(2);
    }
    Query {
        kind: QueryKind::Negate,
        terms: vec![term],
        ..Query::default()
    }
}

/// Compiles the tree under its root.
///
/// Compilation records on each node whether its term was emitted and what
/// it was projected as, so compile a copy when the tree is still needed.
pub fn compile(tree: &mut Tree) -> Query {
    let root = tree.root();
    form_query(tree, root)
}

fn form_query(tree: &mut Tree, node: NodeId) -> Query {
    let mut query = Query::new();
    let mut project_fields = Vec::new();

    let mut combined = Vec::new();
    for child in tree[node].children.clone() {
        let child_query = form_query(tree, child);
        query.terms.extend(child_query.terms);
        query.subqueries.extend(child_query.subqueries);
        for project in child_query.projects {
            if project.table.is_none() {
                add_fields(&mut combined, project.fields);
            }
        }
    }
    if !combined.is_empty() {
        project_fields = combined;
    }
    query.terms.sort_by_key(Term::rank);

    if tree[node]
        .properties
        .intersects(Properties::ROOT | Properties::ARGUMENT)
    {
        if !project_fields.is_empty() {
            query.projects.push(Term::project(project_fields));
        }
        return query;
    }

    let properties = tree[node].properties;
    if let Some(function) = tree[node].function().cloned() {
        let all_found = tree[node]
            .children
            .iter()
            .all(|argument| tree[*argument].found);
        match function.kind {
            FunctionType::Negate => {
                if let Some(term) = query.terms.pop() {
                    query.subqueries.push(negate(term));
                }
                project_fields.clear();
            }
            FunctionType::Aggregate | FunctionType::Calculate | FunctionType::Filter
                if all_found =>
            {
                let arguments: Vec<(usize, NodeId)> = tree[node]
                    .children
                    .iter()
                    .filter(|argument| tree[**argument].has(Properties::ARGUMENT))
                    .enumerate()
                    .filter_map(|(position, argument)| {
                        tree[*argument]
                            .children
                            .first()
                            .map(|value| (position, *value))
                    })
                    .collect();
                let fields = arguments
                    .iter()
                    .filter_map(|(position, value)| {
                        let slot = tree[*value].parent?;
                        if tree[slot].has(Properties::ROOT) {
                            return None;
                        }
                        let attribute = tree[*value].attribute()?;
                        let field = function.fields.get(*position)?;
                        Some(Field::new(
                            field.name,
                            &attribute.variable,
                            attribute.attribute_var,
                        ))
                    })
                    .collect();
                query.terms.push(Term::select(function.name, fields));

                if function.project {
                    project_fields = arguments
                        .iter()
                        .filter(|(_, value)| {
                            tree[*value]
                                .parent
                                .is_some_and(|slot| tree[slot].has(Properties::OUTPUT))
                        })
                        .filter_map(|(_, value)| tree[*value].attribute())
                        .map(|output| Field::new(function.name, &output.variable, true))
                        .collect();
                    for (_, value) in &arguments {
                        let value = &mut tree[*value];
                        if let Some(attribute) = value.attribute_mut() {
                            attribute.project = false;
                            attribute.projected_as = None;
                        } else if let Some(collection) = value.collection_mut() {
                            collection.project = false;
                            collection.projected_as = None;
                        }
                    }
                    query.projects.clear();
                }
            }
            FunctionType::Group if all_found => {
                let grouped = tree[node]
                    .children
                    .get(1)
                    .and_then(|argument| tree[*argument].children.first().copied());
                if let Some(grouped) = grouped {
                    let regrouped = &mut tree[grouped];
                    if let Some(collection) = regrouped.collection_mut() {
                        collection.handled = false;
                    } else if let Some(attribute) = regrouped.attribute_mut() {
                        attribute.handled = false;
                    }
                    let subquery = std::mem::take(&mut query);
                    let group_query = form_query(tree, grouped);
                    query.subqueries.push(subquery);
                    query.terms.extend(group_query.terms);
                }
            }
            _ => {}
        }
    }

    if let Some(attribute) = tree[node]
        .attribute()
        .filter(|attribute| properties.contains(Properties::ATTRIBUTE) && !attribute.handled)
        .cloned()
    {
        let mut fields = Vec::new();
        for reference in &attribute.refs {
            let entity_field = match (tree[*reference].entity(), tree[*reference].collection()) {
                (Some(entity), _) => Some(Field::new("entity", &entity.id, entity.entity_attr)),
                (None, Some(collection)) => Some(Field::new("entity", &collection.variable, true)),
                (None, None) => None,
            };
            if fields.is_empty() {
                fields.extend(entity_field);
            }
            let reference_query = form_query(tree, *reference);
            query.terms.extend(reference_query.terms);
            if let Some(project) = reference_query.projects.into_iter().next() {
                add_fields(&mut project_fields, project.fields);
            }
        }
        fields.push(Field::new("attribute", &attribute.id, false));
        fields.push(Field::new(
            "value",
            &attribute.variable,
            attribute.attribute_var,
        ));
        query.terms.push(Term::select(EAVS, fields));

        let projected_as = attribute.display_name.replace(' ', "");
        if attribute.project {
            add_fields(
                &mut project_fields,
                [Field::new(&projected_as, &attribute.variable, true)],
            );
        }
        if let Some(compiled) = tree[node].attribute_mut() {
            if compiled.project {
                compiled.projected_as = Some(projected_as);
            }
            compiled.handled = true;
        }
    }

    if let Some(collection) = tree[node]
        .collection()
        .filter(|collection| properties.contains(Properties::COLLECTION) && !collection.handled)
        .cloned()
    {
        query.terms.push(Term::select(
            IS_A,
            vec![
                Field::new("entity", &collection.variable, true),
                Field::new("collection", &collection.id, false),
            ],
        ));
        let projected_as = collection.variable.replace(' ', "");
        if collection.project {
            add_fields(
                &mut project_fields,
                [Field::new(&projected_as, &collection.variable, true)],
            );
        }
        if let Some(compiled) = tree[node].collection_mut() {
            if compiled.project {
                compiled.projected_as = Some(projected_as);
            }
            compiled.handled = true;
        }
    }

    if let Some(entity) = tree[node]
        .entity()
        .filter(|entity| properties.contains(Properties::ENTITY) && !entity.handled)
        .cloned()
    {
        let mut fields = Vec::new();
        if entity.entity_var {
            fields.push(Field::new("entity", &entity.variable, true));
            let link = entity.value.as_deref().filter(|_| entity.value_var);
            fields.push(Field::new(
                "link",
                link.unwrap_or(&entity.id),
                entity.value_var,
            ));
            query.terms.push(Term::select(LINKS, fields));
        } else {
            fields.push(Field::new("entity", &entity.id, false));
            query.terms.push(Term::select(EAVS, fields));
        }
        let projected_as = entity.display_name.replace(' ', "");
        if entity.project {
            add_fields(
                &mut project_fields,
                [Field::new(&projected_as, &entity.id, false)],
            );
        }
        if let Some(compiled) = tree[node].entity_mut() {
            if compiled.project {
                compiled.projected_as = Some(projected_as);
            }
            compiled.handled = true;
        }
    }

    if !project_fields.is_empty() {
        query.projects.push(Term::project(project_fields));
    }
    query
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn fact(entity: &str, attribute: &str, value: &str) -> Term {
        Term::select(
            EAVS,
            vec![
                Field::new("entity", entity, false),
                Field::new("attribute", attribute, false),
                Field::new("value", value, true),
            ],
        )
    }

    #[test]
    fn test_renders_nested_queries() {
        let query = Query {
            terms: vec![fact("corey", "salary", "corey|salary")],
            subqueries: vec![negate(fact("corey", "age", "corey|age")), Query::new()],
            projects: vec![Term::project(vec![Field::new(
                "salary",
                "corey|salary",
                true,
            )])],
            ..Query::default()
        };

        assert_eq!(
            query.to_string(),
            "(query\n\
             \t(select \"entity eavs\" :entity \"corey\" :attribute \"salary\" :value corey|salary)\n\
             \t(negate\n\
             \t\t(select \"entity eavs\" :entity \"corey\" :attribute \"age\")\n\
             \t)\n\
             \n\
             \t(project! :salary corey|salary)\n\
             )"
        );
    }

    #[test]
    fn test_empty_query_renders_nothing() {
        assert_eq!(Query::new().to_string(), "");
        assert!(Query::new().is_empty());
    }

    #[test]
    fn test_negated_membership_keeps_all_fields() {
        let membership = Term::select(
            IS_A,
            vec![
                Field::new("entity", "pet", true),
                Field::new("collection", "exotic", false),
            ],
        );
        let negated = negate(membership.clone());
        assert_eq!(negated.kind, QueryKind::Negate);
        assert_eq!(negated.terms, vec![membership]);
    }

    #[test]
    fn test_terms_rank_facts_first() {
        let mut terms = vec![
            Term::select("sum", vec![]),
            Term::select(IS_A, vec![]),
            fact("corey", "salary", "corey|salary"),
            Term::select(LINKS, vec![]),
        ];
        terms.sort_by_key(Term::rank);
        let tables: Vec<_> = terms.iter().filter_map(|term| term.table.clone()).collect();
        assert_eq!(tables, vec![EAVS, LINKS, IS_A, "sum"]);
    }
}
