//! # Dialog NLQP: Natural Language Query Parsing
//!
//! Turns a sentence typed word by word into either a read query over a
//! knowledge graph or a set of facts to assert.
//!
//! ## Pipeline
//!
//! ```text
//! text → normalize + tag (lexicon) → place each word (builder)
//!   → relate it to earlier words (relationship) → settle (context)
//!     → classify (intent) → compile (query)
//! ```
//!
//! Every word is resolved against a [`KnowledgeStore`]: a word is a
//! collection, an attribute, an entity or a built-in function if the store
//! (or the function catalog) says so, and is otherwise held back as a
//! candidate until more of the sentence arrives.
//!
//! ```rust
//! use dialog_nlqp::{Intent, MemoryStore, parse};
//!
//! let mut store = MemoryStore::new();
//! store.insert_collection("moon", "moon")?;
//!
//! let result = parse(&store, "moons", None);
//! assert_eq!(result.intent, Intent::Query);
//! println!("{}", result.query);
//! # Ok::<(), dialog_nlqp::NlqpError>(())
//! ```

mod builder;
pub mod config;
pub mod context;
pub mod error;
pub mod function;
pub mod intent;
pub mod lexicon;
pub mod node;
pub mod parser;
pub mod query;
pub mod relationship;
pub mod representation;
pub mod store;
pub mod token;

pub use config::ParserConfig;
pub use context::{Context, StateFlags};
pub use error::{NlqpError, NlqpResult};
pub use function::{BuiltInFunction, FunctionField, FunctionType};
pub use intent::{Insert, Intent};
pub use lexicon::{
    EnglishLemmatizer, Lemmatizer, NeverSingularize, Word, normalize_query, normalize_string,
    tag_word,
};
pub use node::{Node, NodeId, NodeType, Tree};
pub use parser::{ParseResult, Parser, parse};
pub use query::{Field, Query, QueryKind, Term, TermKind, compile};
pub use relationship::{Relationship, RelationshipType};
pub use representation::{Attribute, Collection, Entity, Representation, RepresentationKind};
pub use store::{Bindings, GraphQuery, KnowledgeStore, MemoryStore, QueryOutput, Record, Table};
pub use token::{MajorPartOfSpeech, MinorPartOfSpeech, Properties, Token, TokenId, TokenTable};
