//! Title normalization into token sets.

use std::collections::HashSet;

/// Case-folded, punctuation-trimmed tokens of one text.
pub type TokenSet = HashSet<String>;

/// Tokens of this many characters or fewer are discarded.
const MIN_TOKEN_CHARS: usize = 2;

/// Spanish and English function words with no topical signal.
///
/// Only entries longer than [`MIN_TOKEN_CHARS`] have any effect; shorter words
/// are dropped by the length rule anyway.
pub const DEFAULT_STOP_WORDS: &[&str] = &[
    // Spanish
    "ante", "aquel", "bajo", "como", "cómo", "con", "contra", "cuando", "del", "desde",
    "donde", "dónde", "durante", "entre", "era", "esa", "ese", "eso", "esta", "está",
    "están", "estas", "este", "esto", "estos", "fue", "fueron", "hace", "hasta", "hay",
    "las", "les", "los", "más", "mas", "muy", "nos", "otra", "otras", "otro", "otros",
    "para", "pero", "por", "porque", "que", "qué", "quien", "quién", "sea", "según",
    "ser", "será", "sido", "sin", "sobre", "son", "sus", "también", "tiene", "tienen",
    "toda", "todas", "todo", "todos", "tras", "una", "uno", "unos", "unas",
    // English
    "about", "after", "also", "and", "are", "been", "but", "for", "from", "had", "has",
    "have", "her", "his", "into", "its", "not", "our", "out", "over", "than", "that",
    "the", "their", "then", "there", "they", "this", "was", "were", "what", "when",
    "which", "who", "will", "with", "you", "your",
];

/// Splits text into a set of lowercase tokens.
///
/// Each whitespace-delimited word is lowercased and trimmed of leading and
/// trailing non-alphanumeric characters (Unicode-aware, so accented letters
/// and other scripts survive). Tokens of two characters or fewer, and stop
/// words, are dropped. No stemming.
#[derive(Debug, Clone)]
pub struct Tokenizer {
    stop_words: HashSet<String>,
}

impl Default for Tokenizer {
    fn default() -> Self {
        Self::with_stop_words(DEFAULT_STOP_WORDS)
    }
}

impl Tokenizer {
    #[must_use]
    pub fn with_stop_words(words: &[&str]) -> Self {
        Self {
            stop_words: words.iter().map(|w| w.to_lowercase()).collect(),
        }
    }

    /// A tokenizer that applies only the length rule.
    #[must_use]
    pub fn without_stop_words() -> Self {
        Self {
            stop_words: HashSet::new(),
        }
    }

    #[must_use]
    pub fn tokenize(&self, text: &str) -> TokenSet {
        text.split_whitespace()
            .filter_map(|word| {
                let token = word
                    .to_lowercase()
                    .trim_matches(|c: char| !c.is_alphanumeric())
                    .to_string();
                let keep = token.chars().count() > MIN_TOKEN_CHARS
                    && !self.stop_words.contains(&token);
                keep.then_some(token)
            })
            .collect()
    }
}
