//! Token chains produced by parsing

mod common;

use dialog_nlqp::{MajorPartOfSpeech, MinorPartOfSpeech, Properties, parse};
use pretty_assertions::assert_eq;

#[test_log::test]
fn it_chains_tokens_from_the_root() -> anyhow::Result<()> {
    let store = common::world()?;
    let result = parse(&store, "3-Corey's salary", None);

    let words: Vec<&str> = result
        .tokens
        .iter()
        .map(|token| result.tree[*token].normalized.as_str())
        .collect();
    assert_eq!(words, vec!["root", "3", "-", "corey", "'s", "salary"]);

    let root = &result.tree[result.tokens[0]];
    assert_eq!(root.pos, MinorPartOfSpeech::Root);
    assert!(root.has(Properties::ROOT));
    assert_eq!(root.prev, None);

    for pair in result.tokens.windows(2) {
        assert_eq!(result.tree[pair[0]].next, Some(pair[1]));
        assert_eq!(result.tree[pair[1]].prev, Some(pair[0]));
    }
    Ok(())
}

#[test_log::test]
fn it_tags_each_word_once() -> anyhow::Result<()> {
    let store = common::world()?;
    let result = parse(&store, "3-Corey's salary", None);
    let token = |ix: usize| &result.tree[result.tokens[ix]];

    assert_eq!(token(1).ix, 1);
    assert!(token(1).has(Properties::QUANTITY));
    assert_eq!(token(1).major(), MajorPartOfSpeech::Value);
    assert_eq!(token(2).pos, MinorPartOfSpeech::Minus);
    assert_eq!(token(3).original, "Corey");
    assert!(token(3).has(Properties::PROPER));
    assert_eq!(token(4).pos, MinorPartOfSpeech::Possessive);
    assert_eq!(token(5).ix, 5);
    Ok(())
}

#[test_log::test]
fn it_renders_a_token_table() -> anyhow::Result<()> {
    let store = common::world()?;
    let result = parse(&store, "moons of Jupiter", None);
    let table = result.token_table().to_string();
    let lines: Vec<&str> = table.lines().collect();

    assert_eq!(lines.len(), 6);
    assert!(lines[0].starts_with("-----"));
    assert!(lines[5].starts_with("-----"));
    assert!(lines[1].starts_with("0: root"));
    assert!(lines[2].contains("moons"));
    assert!(lines[2].contains("| moon"));
    assert!(lines[2].contains("NOUN"));
    assert!(lines[2].contains("(PLURAL)"));
    assert!(lines[3].contains("| IN"));
    assert!(lines[4].contains("(PROPER)"));
    Ok(())
}

#[test_log::test]
fn it_drops_decorative_symbols() -> anyhow::Result<()> {
    let store = common::world()?;
    let result = parse(&store, "(moons)?", None);
    assert_eq!(result.tokens.len(), 2);
    assert_eq!(result.tree[result.tokens[1]].normalized, "moon");
    Ok(())
}
