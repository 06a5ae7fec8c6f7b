//! Query normalisation and the closed-class word tagger.
//!
//! The tagger is deliberately small. Anything that is not a symbol, a number
//! or one of a few hundred function words is a noun, and it is left to the
//! tree builder to find out what kind of noun by asking the knowledge store.
//!
//! ```rust
//! use dialog_nlqp::{EnglishLemmatizer, NeverSingularize, normalize_query, tag_word};
//!
//! let lemmatizer = NeverSingularize::new(EnglishLemmatizer);
//! let words = normalize_query("3-Corey's salary", 1);
//! let texts: Vec<&str> = words.iter().map(|word| word.text.as_str()).collect();
//! assert_eq!(texts, ["3", "-", "Corey", "'s", "salary"]);
//!
//! let token = tag_word(&words[4], &lemmatizer);
//! assert_eq!(token.normalized, "salary");
//! ```

use crate::token::{MajorPartOfSpeech, MinorPartOfSpeech, Properties, Token};

// Word lists below follow NLP Compromise
// (https://github.com/nlp-compromise/nlp_compromise), MIT licensed.

const DETERMINERS: &[&str] = &[
    "this", "any", "enough", "each", "every", "these", "another", "plenty", "whichever",
    "neither", "an", "a", "least", "own", "few", "both", "those", "the", "that", "various",
    "what", "either", "much", "some", "else", "no",
];
const MODALS: &[&str] = &[
    "can", "may", "could", "might", "will", "would", "must", "shall", "should", "ought",
];
const PREDETERMINERS: &[&str] = &["all"];
const COPULAE: &[&str] = &[
    "am", "is", "are", "was", "were", "as", "be", "has", "become", "became", "seemed", "seems",
    "seeming",
];
const PREPOSITIONS: &[&str] = &[
    "with", "until", "onto", "of", "into", "out", "except", "across", "by", "between", "at",
    "down", "as", "from", "around", "among", "upon", "amid", "to", "along", "since", "about",
    "off", "on", "within", "in", "during", "per", "without", "throughout", "through", "than",
    "via", "up", "unlike", "despite", "below", "unless", "towards", "besides", "after",
    "whereas", "amongst", "atop", "barring", "circa", "mid", "midst", "notwithstanding", "sans",
    "thru", "till", "versus",
];
const PERSONAL_PRONOUNS: &[&str] = &[
    "it", "they", "i", "them", "you", "she", "me", "he", "him", "ourselves", "us", "we",
    "yourself",
];
const POSSESSIVE_PRONOUNS: &[&str] = &[
    "mine", "something", "none", "anything", "anyone", "theirs", "himself", "ours", "his", "my",
    "their", "yours", "your", "our", "its", "nothing", "herself", "hers", "themselves",
    "everything", "myself", "itself", "her",
];
const CONJUNCTIONS: &[&str] = &[
    "yet", "therefore", "or", "while", "nor", "whether", "though", "because", "but", "for",
    "and", "if", "before", "although", "plus", "versus", "not",
];
const WH_PRONOUNS: &[&str] = &["who", "what", "whom"];
const WH_DETERMINERS: &[&str] = &["whatever", "which"];
const WH_ADVERBS: &[&str] = &["how", "when", "however", "whenever", "where", "why"];
const WH_POSSESSIVES: &[&str] = &["whose"];
const VERBS: &[&str] = &["have", "do"];
const ADVERBS: &[&str] = &["there"];

const GROUPING_WORDS: &[&str] = &["per", "by"];
const NEGATING_WORDS: &[&str] = &["except", "without", "sans", "not", "nor", "neither", "no"];
const PLURAL_WORDS: &[&str] = &["their"];

/// Words that must keep their surface form even though a lemmatizer would
/// change them.
pub const NEVER_SINGULARIZE: &[&str] = &[
    "his", "times", "has", "downstairs", "its", "'s", "data", "are", "was",
];

/// Characters surrounded by spaces so they become standalone words.
const PADDED: &[char] = &[',', ';', '+', '^', '-', '*', '/', '"'];

/// Characters dropped from the query entirely.
const STRIPPED: &[char] = &[
    '`', '?', ':', '[', ']', '{', '}', '(', ')', '~', '@', '#', '$', '%', '&', '_', '|',
];

/// Reduces a word to its singular form.
pub trait Lemmatizer {
    fn singularize(&self, word: &str) -> String;
}

impl<L: Lemmatizer + ?Sized> Lemmatizer for &L {
    fn singularize(&self, word: &str) -> String {
        (**self).singularize(word)
    }
}

/// Applies the fixed exception set around another lemmatizer and
/// singularises multi-word input one word at a time.
#[derive(Debug, Clone, Default)]
pub struct NeverSingularize<L>(L);

impl<L> NeverSingularize<L> {
    pub fn new(inner: L) -> Self {
        Self(inner)
    }
}

impl<L: Lemmatizer> Lemmatizer for NeverSingularize<L> {
    fn singularize(&self, word: &str) -> String {
        if word.contains(' ') {
            return word
                .split(' ')
                .map(|part| self.singularize(part))
                .collect::<Vec<_>>()
                .join(" ");
        }
        if NEVER_SINGULARIZE.contains(&word) {
            return word.to_string();
        }
        self.0.singularize(word)
    }
}

/// A rule-based English singulariser.
///
/// Covers irregular plurals, words that are their own plural and the regular
/// `-ies`, `-es` and `-s` endings. This is a best-effort default, good
/// enough for naming collections and attributes. A dictionary-backed
/// [`Lemmatizer`] can replace it through [`Parser::with_lemmatizer`].
///
/// [`Parser::with_lemmatizer`]: crate::parser::Parser::with_lemmatizer
#[derive(Debug, Clone, Copy, Default)]
pub struct EnglishLemmatizer;

const IRREGULAR: &[(&str, &str)] = &[
    ("people", "person"),
    ("men", "man"),
    ("women", "woman"),
    ("children", "child"),
    ("mice", "mouse"),
    ("geese", "goose"),
    ("feet", "foot"),
    ("teeth", "tooth"),
    ("oxen", "ox"),
    ("these", "this"),
    ("those", "that"),
    ("were", "was"),
    ("leaves", "leaf"),
    ("lives", "life"),
    ("wives", "wife"),
    ("knives", "knife"),
    ("wolves", "wolf"),
    ("halves", "half"),
    ("selves", "self"),
];

const UNCOUNTABLE: &[&str] = &[
    "sheep", "fish", "deer", "series", "species", "news", "information", "equipment", "money",
    "rice", "police", "sans", "thus", "yes", "less", "bias", "gas", "alias", "chaos", "physics",
    "mathematics", "aircraft", "moose", "whereas", "towards", "besides", "always", "perhaps",
    "afterwards", "does",
];

impl Lemmatizer for EnglishLemmatizer {
    fn singularize(&self, word: &str) -> String {
        if let Some((_, singular)) = IRREGULAR.iter().find(|(plural, _)| *plural == word) {
            return singular.to_string();
        }
        if UNCOUNTABLE.contains(&word) || word.chars().count() <= 3 {
            return word.to_string();
        }
        if !word.ends_with('s')
            || word.ends_with("ss")
            || word.ends_with("us")
            || word.ends_with("is")
            || word.ends_with("'s")
        {
            return word.to_string();
        }
        if let Some(stem) = word.strip_suffix("ies") {
            return format!("{stem}y");
        }
        for suffix in ["sses", "shes", "ches", "xes", "zes", "oes"] {
            if word.ends_with(suffix) {
                return word[..word.len() - 2].to_string();
            }
        }
        word[..word.len() - 1].to_string()
    }
}

/// A word of the normalised query with its session position.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Word {
    pub ix: usize,
    pub text: String,
}

fn normalize(text: &str) -> String {
    let mut spaced = String::with_capacity(text.len() * 2);
    for c in text.chars() {
        if PADDED.contains(&c) {
            spaced.push(' ');
            spaced.push(c);
            spaced.push(' ');
        } else {
            spaced.push(c);
        }
    }
    let spaced = spaced.replace("'s", " 's ").replace("s'", "s ' ");
    spaced
        .chars()
        .map(|c| if STRIPPED.contains(&c) { ' ' } else { c })
        .collect::<String>()
        .split_whitespace()
        .collect::<Vec<_>>()
        .join(" ")
}

/// Splits a raw query into words, numbering them from `first_ix`.
///
/// Separators and operators become standalone words, possessive endings are
/// split off, and decorative symbols are dropped.
pub fn normalize_query(text: &str, first_ix: usize) -> Vec<Word> {
    normalize(text)
        .split(' ')
        .filter(|text| !text.is_empty())
        .enumerate()
        .map(|(offset, text)| Word {
            ix: first_ix + offset,
            text: text.to_string(),
        })
        .collect()
}

/// Normalises a whole string the way lookups see it: separated, lowercased
/// and singularised.
pub fn normalize_string(text: &str, lemmatizer: &impl Lemmatizer) -> String {
    lemmatizer.singularize(&normalize(text).to_lowercase())
}

fn is_numeric(text: &str) -> bool {
    text.starts_with(|c: char| c.is_ascii_digit())
        && text.parse::<f64>().is_ok_and(|value| value.is_finite())
}

fn symbol(text: &str) -> Option<(MinorPartOfSpeech, Properties)> {
    use MinorPartOfSpeech::*;
    let tagged = match text {
        "+" => (Plus, Properties::OPERATOR),
        "-" => (Minus, Properties::OPERATOR),
        "*" => (Multiply, Properties::OPERATOR),
        "/" => (Divide, Properties::OPERATOR),
        "^" => (Power, Properties::OPERATOR),
        ">" => (GreaterThan, Properties::COMPARATIVE),
        ">=" => (GreaterOrEqual, Properties::COMPARATIVE),
        "<" => (LessThan, Properties::COMPARATIVE),
        "<=" => (LessOrEqual, Properties::COMPARATIVE),
        "=" => (Equal, Properties::COMPARATIVE),
        "!=" => (NotEqual, Properties::COMPARATIVE),
        "," | ":" | ";" => (Separator, Properties::SEPARATOR),
        "\"" => (Separator, Properties::SEPARATOR | Properties::QUOTED),
        _ => return None,
    };
    Some(tagged)
}

fn closed_class(word: &str) -> Option<(MinorPartOfSpeech, Properties)> {
    use MinorPartOfSpeech::*;
    let lists: [(&[&str], MinorPartOfSpeech, Properties); 13] = [
        (DETERMINERS, Determiner, Properties::empty()),
        (MODALS, Modal, Properties::empty()),
        (PREDETERMINERS, Predeterminer, Properties::empty()),
        (COPULAE, Copula, Properties::empty()),
        (PREPOSITIONS, Preposition, Properties::empty()),
        (PERSONAL_PRONOUNS, Pronoun, Properties::PRONOUN),
        (
            POSSESSIVE_PRONOUNS,
            Pronoun,
            Properties::PRONOUN.union(Properties::POSSESSIVE),
        ),
        (CONJUNCTIONS, Conjunction, Properties::CONJUNCTION),
        (WH_PRONOUNS, WhPronoun, Properties::empty()),
        (WH_DETERMINERS, WhDeterminer, Properties::empty()),
        (WH_ADVERBS, WhAdverb, Properties::empty()),
        (WH_POSSESSIVES, WhPossessive, Properties::POSSESSIVE),
        (VERBS, Verb, Properties::empty()),
    ];
    lists
        .into_iter()
        .find(|(list, _, _)| list.contains(&word))
        .map(|(_, pos, properties)| (pos, properties))
        .or_else(|| ADVERBS.contains(&word).then_some((Adverb, Properties::empty())))
}

/// Tags one normalised word.
///
/// Resolution order: operator, comparator and separator symbols, then the
/// possessive endings, then numeric literals, then the closed-class lexicon,
/// falling back to a noun.
pub fn tag_word(word: &Word, lemmatizer: &impl Lemmatizer) -> Token {
    let original = word.text.clone();
    let token = |normalized: String, pos, properties| Token {
        ix: word.ix,
        original: original.clone(),
        normalized,
        pos,
        properties,
        prev: None,
        next: None,
    };

    if let Some((pos, properties)) = symbol(&original) {
        return token(original.clone(), pos, properties);
    }
    let mut pos = MinorPartOfSpeech::Noun;
    let mut properties = Properties::empty();
    if original == "'s" || original == "'" {
        pos = MinorPartOfSpeech::Possessive;
        properties |= Properties::POSSESSIVE;
    } else if is_numeric(&original) {
        return token(original.clone(), MinorPartOfSpeech::Number, Properties::QUANTITY);
    }

    let lowered = original.to_lowercase();
    let normalized = lemmatizer.singularize(&lowered);
    if normalized != lowered {
        properties |= Properties::PLURAL;
    }
    if pos == MinorPartOfSpeech::Noun {
        if let Some((closed, extra)) = closed_class(&normalized) {
            pos = closed;
            properties |= extra;
        }
    }

    let word = normalized.as_str();
    if GROUPING_WORDS.contains(&word) {
        properties |= Properties::GROUPING;
    } else if NEGATING_WORDS.contains(&word) {
        properties |= Properties::NEGATES;
    } else if PLURAL_WORDS.contains(&word) {
        properties |= Properties::PLURAL;
    }
    if pos.major() == MajorPartOfSpeech::Noun
        && original.starts_with(|c: char| c.is_ascii_uppercase())
    {
        properties |= Properties::PROPER;
    }
    token(normalized, pos, properties)
}

/// Tags a word synthesized by the parser rather than typed by the user.
pub(crate) fn tag_implicit(text: &str, lemmatizer: &impl Lemmatizer) -> Token {
    let mut token = tag_word(
        &Word {
            ix: 0,
            text: text.to_string(),
        },
        lemmatizer,
    );
    token.properties |= Properties::IMPLICIT;
    token
}

#[cfg(test)]
mod tests {
    use super::*;

    fn lemmatizer() -> NeverSingularize<EnglishLemmatizer> {
        NeverSingularize::new(EnglishLemmatizer)
    }

    fn texts(text: &str) -> Vec<String> {
        normalize_query(text, 1)
            .into_iter()
            .map(|word| word.text)
            .collect()
    }

    fn tag(text: &str) -> Token {
        tag_word(
            &Word {
                ix: 1,
                text: text.to_string(),
            },
            &lemmatizer(),
        )
    }

    #[test]
    fn test_normalize_separates_operators_and_possessives() {
        assert_eq!(texts("3-Corey's salary"), ["3", "-", "Corey", "'s", "salary"]);
        assert_eq!(texts("1+1"), ["1", "+", "1"]);
        assert_eq!(texts("pets' lengths"), ["pets", "'", "lengths"]);
        assert_eq!(texts("  moons,  planets? "), ["moons", ",", "planets"]);
    }

    #[test]
    fn test_normalize_numbers_words_from_offset() {
        let words = normalize_query("of jupiter", 3);
        assert_eq!(words[0].ix, 3);
        assert_eq!(words[1].ix, 4);
        assert!(normalize_query("", 1).is_empty());
    }

    #[test]
    fn test_normalize_string() {
        assert_eq!(normalize_string("Employee Salaries", &lemmatizer()), "employee salary");
        assert_eq!(normalize_string("test data", &lemmatizer()), "test data");
    }

    #[test]
    fn test_english_lemmatizer() {
        let lemmatizer = EnglishLemmatizer;
        assert_eq!(lemmatizer.singularize("moons"), "moon");
        assert_eq!(lemmatizer.singularize("salaries"), "salary");
        assert_eq!(lemmatizer.singularize("employees"), "employee");
        assert_eq!(lemmatizer.singularize("boxes"), "box");
        assert_eq!(lemmatizer.singularize("people"), "person");
        assert_eq!(lemmatizer.singularize("glass"), "glass");
        assert_eq!(lemmatizer.singularize("plus"), "plus");
        assert_eq!(lemmatizer.singularize("is"), "is");
    }

    #[test]
    fn test_exceptions_are_never_singularized() {
        let lemmatizer = lemmatizer();
        for word in NEVER_SINGULARIZE {
            assert_eq!(lemmatizer.singularize(word), *word);
        }
        assert_eq!(lemmatizer.singularize("test data"), "test data");
    }

    #[test]
    fn test_tag_symbols() {
        let minus = tag("-");
        assert_eq!(minus.pos, MinorPartOfSpeech::Minus);
        assert!(minus.has(Properties::OPERATOR));

        let quote = tag("\"");
        assert_eq!(quote.pos, MinorPartOfSpeech::Separator);
        assert!(quote.has(Properties::QUOTED));

        let gte = tag(">=");
        assert_eq!(gte.pos, MinorPartOfSpeech::GreaterOrEqual);
        assert_eq!(gte.major(), MajorPartOfSpeech::Symbol);
    }

    #[test]
    fn test_tag_possessive_and_quantity() {
        let possessive = tag("'s");
        assert_eq!(possessive.pos, MinorPartOfSpeech::Possessive);
        assert!(possessive.has(Properties::POSSESSIVE));
        assert!(!possessive.has(Properties::PROPER));

        let quantity = tag("42.5");
        assert_eq!(quantity.pos, MinorPartOfSpeech::Number);
        assert!(quantity.has(Properties::QUANTITY));
        assert!(!tag("4x4").has(Properties::QUANTITY));
    }

    #[test]
    fn test_tag_nouns() {
        let corey = tag("Corey");
        assert_eq!(corey.normalized, "corey");
        assert!(corey.has(Properties::PROPER));
        assert!(!corey.has(Properties::PLURAL));

        let moons = tag("moons");
        assert_eq!(moons.normalized, "moon");
        assert!(moons.has(Properties::PLURAL));
        assert_eq!(moons.major(), MajorPartOfSpeech::Noun);
    }

    #[test]
    fn test_tag_closed_class() {
        assert_eq!(tag("the").pos, MinorPartOfSpeech::Determiner);
        assert_eq!(tag("is").pos, MinorPartOfSpeech::Copula);
        assert_eq!(tag("are").pos, MinorPartOfSpeech::Copula);
        assert_eq!(tag("whose").pos, MinorPartOfSpeech::WhPossessive);
        assert_eq!(tag("there").pos, MinorPartOfSpeech::Adverb);

        let per = tag("per");
        assert_eq!(per.pos, MinorPartOfSpeech::Preposition);
        assert!(per.has(Properties::GROUPING));

        let without = tag("without");
        assert!(without.has(Properties::NEGATES));

        let their = tag("their");
        assert!(their.has(Properties::POSSESSIVE));
        assert!(their.has(Properties::PLURAL));
        assert!(!their.has(Properties::PROPER));
    }

    #[test]
    fn test_tag_capitalised_pronoun_is_proper() {
        // Pronouns are nouns for the purpose of the proper-noun rule.
        let she = tag("She");
        assert_eq!(she.pos, MinorPartOfSpeech::Pronoun);
        assert!(she.has(Properties::PROPER));
    }
}
