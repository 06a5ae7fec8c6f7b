//! Compiled query IR for sentences over the world fixture

mod common;

use dialog_nlqp::{Intent, QueryKind, parse};
use pretty_assertions::assert_eq;

fn compiled(text: &str) -> anyhow::Result<String> {
    let store = common::world()?;
    let result = parse(&store, text, None);
    assert_eq!(result.intent, Intent::Query, "{text:?} parsed as\n{}", result.tree);
    Ok(result.query.to_string())
}

#[test_log::test]
fn it_selects_collection_members() -> anyhow::Result<()> {
    assert_eq!(
        compiled("moons")?,
        "(query
\t(select \"is a attributes\" :entity moon :collection \"moon\")
\t(project! :moon moon)
)"
    );
    Ok(())
}

#[test_log::test]
fn it_reads_a_possessed_attribute() -> anyhow::Result<()> {
    assert_eq!(
        compiled("Corey's salary")?,
        "(query
\t(select \"entity eavs\" :entity \"corey\" :attribute \"salary\" :value corey|salary)
\t(project! :salary corey|salary)
)"
    );
    Ok(())
}

#[test_log::test]
fn it_links_members_to_an_entity() -> anyhow::Result<()> {
    assert_eq!(
        compiled("moons of jupiter")?,
        "(query
\t(select \"directionless links\" :entity moon :link \"jupiter\")
\t(select \"is a attributes\" :entity moon :collection \"moon\")
\t(project! :moon moon)
)"
    );
    Ok(())
}

#[test_log::test]
fn it_aggregates_over_a_collection() -> anyhow::Result<()> {
    assert_eq!(
        compiled("sum of employee salaries")?,
        "(query
\t(select \"entity eavs\" :entity employee :attribute \"salary\" :value employee|salary)
\t(select \"is a attributes\" :entity employee :collection \"employee\")
\t(select \"sum\" :sum output0 :value employee|salary)
\t(project! :sum output0)
)"
    );
    Ok(())
}

#[test_log::test]
fn it_counts_collection_members() -> anyhow::Result<()> {
    assert_eq!(
        compiled("how many moons")?,
        "(query
\t(select \"is a attributes\" :entity moon :collection \"moon\")
\t(select \"count\" :count output0)
\t(project! :count output0)
)"
    );
    Ok(())
}

#[test_log::test]
fn it_calculates_with_a_quantity() -> anyhow::Result<()> {
    assert_eq!(
        compiled("3 - Corey's salary")?,
        "(query
\t(select \"entity eavs\" :entity \"corey\" :attribute \"salary\" :value corey|salary)
\t(select \"-\" :result output0 :a 3 :b corey|salary)
\t(project! :- output0)
)"
    );
    Ok(())
}

#[test_log::test]
fn it_joins_through_an_intermediate_collection() -> anyhow::Result<()> {
    assert_eq!(
        compiled("salaries in engineering")?,
        "(query
\t(select \"entity eavs\" :entity employee :attribute \"salary\" :value employee|salary)
\t(select \"entity eavs\" :entity employee :attribute \"department\" :value \"engineering\")
\t(select \"is a attributes\" :entity employee :collection \"employee\")
\t(project! :employee employee :salary employee|salary)
)"
    );
    Ok(())
}

#[test_log::test]
fn it_intersects_collections() -> anyhow::Result<()> {
    assert_eq!(
        compiled("test data are employees")?,
        "(query
\t(select \"is a attributes\" :entity employee :collection \"test data\")
\t(select \"is a attributes\" :entity employee :collection \"employee\")
\t(project! :employee employee)
)"
    );
    Ok(())
}

#[test_log::test]
fn it_negates_an_attribute_without_its_value() -> anyhow::Result<()> {
    assert_eq!(
        compiled("pets without length")?,
        "(query
\t(select \"is a attributes\" :entity pet :collection \"pet\")
\t(negate
\t\t(select \"entity eavs\" :entity pet :attribute \"length\")
\t)
\t(project! :pet pet)
)"
    );
    Ok(())
}

#[test_log::test]
fn it_filters_members_by_a_quantity() -> anyhow::Result<()> {
    let query = compiled("employees whose salary > 10")?;
    assert!(
        query.contains("\t(select \">\" :a employee|salary :b 10)\n"),
        "{query}"
    );
    assert!(!query.contains("(project! :>"), "{query}");
    Ok(())
}

#[test_log::test]
fn it_compares_through_an_implied_attribute() -> anyhow::Result<()> {
    let query = compiled("pets longer than koala")?;
    assert!(
        query.contains("\t(select \">\" :a pet|length :b koala|length)\n"),
        "{query}"
    );
    assert!(query.contains(":entity \"koala\" :attribute \"length\""), "{query}");
    Ok(())
}

#[test_log::test]
fn it_nests_grouped_rows_under_the_grouping() -> anyhow::Result<()> {
    let store = common::world()?;
    let result = parse(&store, "salaries by department", None);
    assert_eq!(result.intent, Intent::Query, "{}", result.tree);

    let membership = "(select \"is a attributes\" :entity department :collection \"department\")";
    assert!(
        result.query.terms.iter().any(|term| term.to_string() == membership),
        "{}",
        result.query
    );
    let [grouped] = &result.query.subqueries[..] else {
        panic!("expected one subquery:\n{}", result.query);
    };
    assert_eq!(grouped.kind, QueryKind::Query);
    assert!(grouped.to_string().contains(":attribute \"salary\""), "{}", result.query);
    Ok(())
}

#[test_log::test]
fn it_leaves_the_session_tree_uncompiled() -> anyhow::Result<()> {
    let store = common::world()?;
    let result = parse(&store, "Corey's salary", None);

    let salary = result.context.attributes[0];
    let attribute = result.tree[salary].attribute().expect("salary is an attribute");
    assert!(!attribute.handled);
    assert_eq!(attribute.projected_as, None);
    Ok(())
}
