//! Tokens, part-of-speech tags, and the semantic property set.
//!
//! Every word of a session becomes a [`Token`]. Tokens are chained into one
//! doubly-linked sequence that starts at a synthetic ROOT token; apart from
//! those links they never change after tagging. Semantic state that evolves
//! during parsing (resolution, subsumption, argument roles) lives on the
//! [`Node`](crate::Node) wrapping the token.

use std::fmt;

use bitflags::bitflags;
use itertools::Itertools;

/// Handle of a token inside a [`Tree`](crate::Tree)'s token arena.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct TokenId(pub(crate) usize);

/// Coarse grammatical category derived from a [`MinorPartOfSpeech`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MajorPartOfSpeech {
    Root,
    Verb,
    Adverb,
    Noun,
    Value,
    Glue,
    WhWord,
    Symbol,
}

impl MajorPartOfSpeech {
    pub fn name(&self) -> &'static str {
        match self {
            MajorPartOfSpeech::Root => "ROOT",
            MajorPartOfSpeech::Verb => "VERB",
            MajorPartOfSpeech::Adverb => "ADVERB",
            MajorPartOfSpeech::Noun => "NOUN",
            MajorPartOfSpeech::Value => "VALUE",
            MajorPartOfSpeech::Glue => "GLUE",
            MajorPartOfSpeech::WhWord => "WHWORD",
            MajorPartOfSpeech::Symbol => "SYMBOL",
        }
    }
}

impl fmt::Display for MajorPartOfSpeech {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.name())
    }
}

/// Fine-grained part-of-speech tag.
///
/// Only the tags the tagger can actually assign are represented. The
/// Penn-style abbreviation of each is available through [`Self::tag`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MinorPartOfSpeech {
    /// The synthetic session root
    Root,
    /// Generic noun, the fallback tag (NN)
    Noun,
    /// Personal or possessive pronoun (PRP)
    Pronoun,
    /// Generic verb (VB)
    Verb,
    /// Copula (CP)
    Copula,
    /// Adverb (RB)
    Adverb,
    /// Preposition (IN)
    Preposition,
    /// Modal verb (MD)
    Modal,
    /// Coordinating conjunction (CC)
    Conjunction,
    /// Predeterminer (PDT)
    Predeterminer,
    /// Determiner (DT)
    Determiner,
    /// Numeric literal (NU)
    Number,
    LessThan,
    GreaterThan,
    LessOrEqual,
    GreaterOrEqual,
    Equal,
    NotEqual,
    Plus,
    Minus,
    Multiply,
    Divide,
    Power,
    /// Separator: `,` `:` `;` `"` (SEP)
    Separator,
    /// Possessive ending: `'s` or `'` (POS)
    Possessive,
    /// Wh-determiner (WDT)
    WhDeterminer,
    /// Wh-pronoun (WP)
    WhPronoun,
    /// Possessive wh-pronoun (WPO)
    WhPossessive,
    /// Wh-adverb (WRB)
    WhAdverb,
}

impl MinorPartOfSpeech {
    /// The Penn-style abbreviation of this tag.
    pub fn tag(&self) -> &'static str {
        use MinorPartOfSpeech::*;
        match self {
            Root => "ROOT",
            Noun => "NN",
            Pronoun => "PRP",
            Verb => "VB",
            Copula => "CP",
            Adverb => "RB",
            Preposition => "IN",
            Modal => "MD",
            Conjunction => "CC",
            Predeterminer => "PDT",
            Determiner => "DT",
            Number => "NU",
            LessThan => "LT",
            GreaterThan => "GT",
            LessOrEqual => "LTE",
            GreaterOrEqual => "GTE",
            Equal => "EQ",
            NotEqual => "NEQ",
            Plus => "PLUS",
            Minus => "MINUS",
            Multiply => "MUL",
            Divide => "DIV",
            Power => "POW",
            Separator => "SEP",
            Possessive => "POS",
            WhDeterminer => "WDT",
            WhPronoun => "WP",
            WhPossessive => "WPO",
            WhAdverb => "WRB",
        }
    }

    /// The coarse category this tag belongs to.
    pub fn major(&self) -> MajorPartOfSpeech {
        use MinorPartOfSpeech::*;
        match self {
            Root => MajorPartOfSpeech::Root,
            Verb => MajorPartOfSpeech::Verb,
            Adverb => MajorPartOfSpeech::Adverb,
            Noun | Pronoun => MajorPartOfSpeech::Noun,
            Number => MajorPartOfSpeech::Value,
            Copula | Preposition | Modal | Conjunction | Predeterminer | Determiner => {
                MajorPartOfSpeech::Glue
            }
            LessThan | GreaterThan | LessOrEqual | GreaterOrEqual | Equal | NotEqual | Plus
            | Minus | Multiply | Divide | Power | Separator | Possessive => {
                MajorPartOfSpeech::Symbol
            }
            WhDeterminer | WhPronoun | WhPossessive | WhAdverb => MajorPartOfSpeech::WhWord,
        }
    }
}

impl fmt::Display for MinorPartOfSpeech {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.tag())
    }
}

bitflags! {
    /// Semantic properties of a token or node.
    ///
    /// The flags are declared in rank order: the first seven are the
    /// knowledge-graph types, and [`Properties::type_rank`] depends on that
    /// order.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
    pub struct Properties: u32 {
        const ROOT = 1 << 0;
        const COLLECTION = 1 << 1;
        const ENTITY = 1 << 2;
        const ATTRIBUTE = 1 << 3;
        const FUNCTION = 1 << 4;
        const QUANTITY = 1 << 5;
        const STRING = 1 << 6;
        const OUTPUT = 1 << 7;
        const INPUT = 1 << 8;
        const ARGUMENT = 1 << 9;
        const OPERATOR = 1 << 10;
        const PROPER = 1 << 11;
        const PLURAL = 1 << 12;
        const POSSESSIVE = 1 << 13;
        const COMPARATIVE = 1 << 14;
        const PRONOUN = 1 << 15;
        const SEPARATOR = 1 << 16;
        const CONJUNCTION = 1 << 17;
        const QUOTED = 1 << 18;
        const SUBSUMED = 1 << 19;
        const COMPOUND = 1 << 20;
        const NEGATES = 1 << 21;
        const GROUPING = 1 << 22;
        const IMPLICIT = 1 << 23;
    }
}

impl Properties {
    /// The set accepted by a function slot that takes anything.
    pub const ANY: Properties = Properties::ENTITY
        .union(Properties::ATTRIBUTE)
        .union(Properties::COLLECTION)
        .union(Properties::FUNCTION)
        .union(Properties::ROOT);

    /// Rank used to put a pair of nodes in canonical order before
    /// relationship inference.
    ///
    /// The rank is the declaration index of the lowest flag present, which
    /// yields COLLECTION < ENTITY < ATTRIBUTE < FUNCTION < QUANTITY < STRING
    /// for resolved nodes. A quantity carries ATTRIBUTE as well, so it ranks
    /// as an attribute. An empty set ranks after everything.
    pub fn type_rank(&self) -> u32 {
        self.bits().trailing_zeros()
    }
}

impl fmt::Display for Properties {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.is_empty() {
            return Ok(());
        }
        write!(f, "({})", self.iter_names().map(|(name, _)| name).join("|"))
    }
}

/// A tagged word.
#[derive(Debug, Clone, PartialEq)]
pub struct Token {
    /// One-based position of the word within the session, zero for
    /// synthesized tokens
    pub ix: usize,
    /// The word as typed
    pub original: String,
    /// Lowercased, singularised form used for all lookups
    pub normalized: String,
    pub pos: MinorPartOfSpeech,
    /// Lexical properties assigned by the tagger
    pub properties: Properties,
    pub prev: Option<TokenId>,
    pub next: Option<TokenId>,
}

impl Token {
    pub fn major(&self) -> MajorPartOfSpeech {
        self.pos.major()
    }

    pub fn has(&self, property: Properties) -> bool {
        self.properties.contains(property)
    }
}

const DIVIDER: &str =
    "--------------------------------------------------------------------------------";

/// Column-aligned rendering of a token sequence, one token per line.
pub struct TokenTable<'a>(pub Vec<&'a Token>);

impl fmt::Display for TokenTable<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let tokens = &self.0;
        let width = |measure: &dyn Fn(&Token) -> usize| {
            tokens.iter().map(|token| measure(*token)).max().unwrap_or(0)
        };
        let ix_width = width(&|t| t.ix.to_string().len());
        let original_width = width(&|t| t.original.chars().count());
        let normalized_width = width(&|t| t.normalized.chars().count());
        let major_width = width(&|t| t.major().name().len());
        let minor_width = width(&|t| t.pos.tag().len());

        writeln!(f, "{DIVIDER}")?;
        for token in tokens {
            let ix = format!("{}:", token.ix);
            writeln!(
                f,
                "{ix:<ix_w$} {original:<original_width$} | {normalized:<normalized_width$} | {major:<major_width$} | {minor:<minor_width$} | {properties}",
                ix_w = ix_width + 1,
                original = token.original,
                normalized = token.normalized,
                major = token.major().name(),
                minor = token.pos.tag(),
                properties = token.properties,
            )?;
        }
        write!(f, "{DIVIDER}")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_type_rank_orders_graph_types() {
        let collection = Properties::COLLECTION | Properties::PLURAL;
        let entity = Properties::ENTITY | Properties::PROPER | Properties::POSSESSIVE;
        let attribute = Properties::ATTRIBUTE;
        let quantity = Properties::QUANTITY | Properties::ATTRIBUTE;

        assert!(collection.type_rank() < entity.type_rank());
        assert!(entity.type_rank() < attribute.type_rank());
        assert_eq!(quantity.type_rank(), attribute.type_rank());
        assert!(attribute.type_rank() < Properties::FUNCTION.type_rank());
        assert!(Properties::STRING.type_rank() < Properties::empty().type_rank());
    }

    #[test]
    fn test_properties_display() {
        assert_eq!(Properties::empty().to_string(), "");
        assert_eq!(
            (Properties::PLURAL | Properties::COLLECTION).to_string(),
            "(COLLECTION|PLURAL)"
        );
    }

    #[test]
    fn test_major_part_of_speech() {
        assert_eq!(MinorPartOfSpeech::Pronoun.major(), MajorPartOfSpeech::Noun);
        assert_eq!(MinorPartOfSpeech::Copula.major(), MajorPartOfSpeech::Glue);
        assert_eq!(MinorPartOfSpeech::Possessive.major(), MajorPartOfSpeech::Symbol);
        assert_eq!(MinorPartOfSpeech::WhAdverb.major(), MajorPartOfSpeech::WhWord);
        assert_eq!(MinorPartOfSpeech::Number.major(), MajorPartOfSpeech::Value);
    }
}
