//! # Dialog NLQP Inspect
//!
//! Prints everything a parse produced: the token table, the parse tree, the
//! intent, and the compiled query or the facts to insert.
//!
//! ```bash
//! cargo run --bin nlqp-inspect -- --store world.json "sum of employee salaries"
//! ```
//!
//! Without a sentence, lines are read from stdin. With `--incremental` each
//! line continues the session of the line before, the way a sentence typed
//! word by word would be parsed.

mod cli;

use std::fmt::{self, Write};

use dialog_nlqp::{Intent, Node, ParseResult};

pub use cli::*;

fn describe(node: &Node) -> String {
    match &node.representation {
        Some(representation) => format!("{} {representation}", node.name),
        None => node.name.clone(),
    }
}

/// Writes every section of `result` to `out`.
pub fn write_report(out: &mut impl Write, result: &ParseResult) -> fmt::Result {
    writeln!(out, "{}", result.token_table())?;
    writeln!(out, "{}", result.tree)?;
    writeln!(out, "intent: {}", result.intent)?;
    match result.intent {
        Intent::Query => writeln!(out, "{}", result.query)?,
        Intent::Insert => {
            for insert in &result.inserts {
                writeln!(
                    out,
                    "insert: {} | {} | {}",
                    describe(&insert.entity),
                    describe(&insert.attribute),
                    describe(&insert.value)
                )?;
            }
        }
        Intent::MoreInfo => {
            let pending = result
                .context
                .maybe_attributes
                .iter()
                .map(|node| result.tree[*node].name.as_str())
                .collect::<Vec<_>>();
            writeln!(out, "unknown: {}", pending.join(", "))?;
        }
        Intent::NoResult => {}
    }
    Ok(())
}

/// Renders every section of `result`.
pub fn report(result: &ParseResult) -> Result<String, fmt::Error> {
    let mut report = String::new();
    write_report(&mut report, result)?;
    Ok(report)
}

#[cfg(test)]
mod tests {
    use super::*;
    use dialog_nlqp::{MemoryStore, parse};

    #[test]
    fn test_report_lists_unknown_words() -> anyhow::Result<()> {
        let mut store = MemoryStore::new();
        store.insert_collection("moon", "moon")?;

        let report = report(&parse(&store, "moons flurb", None))?;
        assert!(report.contains("intent: MOREINFO"));
        assert!(report.contains("unknown: flurb"));
        Ok(())
    }

    #[test]
    fn test_report_shows_query() -> anyhow::Result<()> {
        let mut store = MemoryStore::new();
        store.insert_collection("moon", "moon")?;

        let report = report(&parse(&store, "moons", None))?;
        assert!(report.contains("intent: QUERY"));
        assert!(report.contains("(project! :moon moon)"));
        Ok(())
    }

    #[test]
    fn test_write_report_lists_inserts() -> anyhow::Result<()> {
        let mut store = MemoryStore::new();
        store.insert_entity("corey", "Corey")?;
        store.add_fact("corey", "age", 30)?;

        let mut out = String::new();
        write_report(&mut out, &parse(&store, "Corey's age is 10", None))?;
        assert!(out.contains("intent: INSERT"));
        assert!(out.contains("insert: corey"));
        Ok(())
    }
}
