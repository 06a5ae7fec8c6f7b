use serde::{Deserialize, Serialize};

use crate::error::{NlqpError, NlqpResult};

/// Tunables of the tree builder.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ParserConfig {
    /// Longest span of words that may be folded into one compound node,
    /// read through [`ParserConfig::span_limit`].
    pub ngram_window: usize,
    /// Only recognise an insert trigger ("is", "is a") once a possessive
    /// has been resolved, as in "Corey's age is 10". When false, plain
    /// assertions such as "Rover is a pet" are recognised too.
    pub insert_requires_possessive: bool,
}

impl Default for ParserConfig {
    fn default() -> Self {
        Self {
            ngram_window: 4,
            insert_requires_possessive: false,
        }
    }
}

impl ParserConfig {
    pub fn from_json(json: &str) -> NlqpResult<Self> {
        serde_json::from_str(json).map_err(NlqpError::Config)
    }

    /// The compound span actually scanned: `ngram_window` held to 2..=4.
    pub fn span_limit(&self) -> usize {
        self.ngram_window.clamp(2, 4)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_missing_fields_take_defaults() {
        let config = ParserConfig::from_json(r#"{"insert_requires_possessive": true}"#).unwrap();
        assert_eq!(config.ngram_window, 4);
        assert!(config.insert_requires_possessive);
    }

    #[test]
    fn test_span_limit_is_clamped() {
        let config = ParserConfig::from_json(r#"{"ngram_window": 9}"#).unwrap();
        assert_eq!(config.span_limit(), 4);
        let config = ParserConfig::from_json(r#"{"ngram_window": 0}"#).unwrap();
        assert_eq!(config.span_limit(), 2);
        assert_eq!(ParserConfig::default().span_limit(), 4);
    }

    #[test]
    fn test_rejects_malformed_config() {
        assert!(matches!(
            ParserConfig::from_json(r#"{"ngram_window": "four"}"#),
            Err(NlqpError::Config(_))
        ));
    }
}
