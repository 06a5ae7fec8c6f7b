//! The parser entry point.
//!
//! A session is carried from call to call in its [`ParseResult`]: feeding
//! the previous result back into [`Parser::parse`] appends the new words to
//! the same tree and context, so typing a sentence word by word ends in the
//! same state as parsing it whole.

use crate::builder::Builder;
use crate::config::ParserConfig;
use crate::context::Context;
use crate::intent::{self, Insert, Intent};
use crate::lexicon::{EnglishLemmatizer, Lemmatizer, NeverSingularize, normalize_query, tag_implicit, tag_word};
use crate::node::Tree;
use crate::query::Query;
use crate::store::KnowledgeStore;
use crate::token::{TokenId, TokenTable};

/// The state of a session after a call, and what to do with it.
#[derive(Debug, Clone, PartialEq)]
pub struct ParseResult {
    pub intent: Intent,
    pub context: Context,
    /// The session's tokens in word order, root first
    pub tokens: Vec<TokenId>,
    pub tree: Tree,
    /// The compiled query; empty unless the intent is [`Intent::Query`]
    pub query: Query,
    /// Facts to assert; empty unless the intent is [`Intent::Insert`]
    pub inserts: Vec<Insert>,
}

impl ParseResult {
    pub fn token_table(&self) -> TokenTable<'_> {
        TokenTable(self.tokens.iter().map(|token| &self.tree[*token]).collect())
    }
}

/// Parses sentences against a knowledge store.
pub struct Parser<'a, S, L = EnglishLemmatizer> {
    store: &'a S,
    lemmatizer: NeverSingularize<L>,
    config: ParserConfig,
}

impl<'a, S: KnowledgeStore> Parser<'a, S> {
    pub fn new(store: &'a S) -> Self {
        Self::with_lemmatizer(store, EnglishLemmatizer)
    }
}

impl<'a, S: KnowledgeStore, L: Lemmatizer> Parser<'a, S, L> {
    /// A parser singularising words with `lemmatizer`. Words that only look
    /// plural ("this", "has", ...) are left alone regardless.
    pub fn with_lemmatizer(store: &'a S, lemmatizer: L) -> Self {
        Self {
            store,
            lemmatizer: NeverSingularize::new(lemmatizer),
            config: ParserConfig::default(),
        }
    }

    pub fn with_config(mut self, config: ParserConfig) -> Self {
        self.config = config;
        self
    }

    pub fn config(&self) -> &ParserConfig {
        &self.config
    }

    /// Parses `text`, continuing the session of `previous` when given.
    pub fn parse(&self, text: &str, previous: Option<ParseResult>) -> ParseResult {
        let (mut tree, mut context) = match previous {
            Some(previous) => (previous.tree, previous.context),
            None => (
                Tree::new(tag_implicit("root", &self.lemmatizer)),
                Context::new(),
            ),
        };

        let first_ix = tree.last_token().ix + 1;
        let words = normalize_query(text, first_ix);
        tracing::debug!(words = words.len(), first_ix, "parsing");
        for word in &words {
            let node = tree.append(tag_word(word, &self.lemmatizer));
            Builder::new(
                &mut tree,
                &mut context,
                self.store,
                &self.lemmatizer,
                &self.config,
            )
            .form_tree(node);
        }
        context.settle(&tree);

        let outcome = intent::decide(&tree, &context, &self.lemmatizer);
        tracing::debug!(intent = %outcome.intent, inserts = outcome.inserts.len(), "parsed");
        ParseResult {
            intent: outcome.intent,
            tokens: tree.token_chain(),
            context,
            tree,
            query: outcome.query,
            inserts: outcome.inserts,
        }
    }
}

/// Parses `text` with the default lemmatizer and configuration.
pub fn parse<S: KnowledgeStore>(
    store: &S,
    text: &str,
    previous: Option<ParseResult>,
) -> ParseResult {
    Parser::new(store).parse(text, previous)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::MemoryStore;

    fn store() -> MemoryStore {
        let mut store = MemoryStore::new();
        store.insert_collection("planet", "planet").unwrap();
        store.insert_entity("jupiter", "Jupiter").unwrap();
        store.add_member("planet", "jupiter").unwrap();
        store
    }

    #[test]
    fn test_empty_input_has_no_result() {
        let store = store();
        let result = parse(&store, "", None);
        assert_eq!(result.intent, Intent::NoResult);
        assert_eq!(result.tokens.len(), 1);
        assert!(result.query.is_empty());
    }

    #[test]
    fn test_continuation_numbers_after_previous_words() {
        let store = store();
        let parser = Parser::new(&store);
        let first = parser.parse("planets", None);
        let second = parser.parse("jupiter", Some(first));

        let positions: Vec<usize> = second
            .tokens
            .iter()
            .map(|token| second.tree[*token].ix)
            .collect();
        assert_eq!(positions, vec![0, 1, 2]);
    }

    #[test]
    fn test_collection_query() {
        let store = store();
        let result = parse(&store, "planets", None);
        assert_eq!(result.intent, Intent::Query);
        assert_eq!(
            result.query.to_string(),
            "(query\n\
             \t(select \"is a attributes\" :entity planet :collection \"planet\")\n\
             \t(project! :planet planet)\n\
             )"
        );
    }

    struct Dictionary;

    impl Lemmatizer for Dictionary {
        fn singularize(&self, word: &str) -> String {
            match word {
                "planetae" => "planet".to_string(),
                _ => word.to_string(),
            }
        }
    }

    #[test]
    fn test_lemmatizer_can_be_replaced() {
        let store = store();
        let result = Parser::with_lemmatizer(&store, Dictionary).parse("planetae", None);
        assert_eq!(result.intent, Intent::Query);
        assert!(result.query.to_string().contains(":collection \"planet\""));

        let result = Parser::with_lemmatizer(&store, Dictionary).parse("planets", None);
        assert_eq!(result.intent, Intent::MoreInfo);
    }
}
