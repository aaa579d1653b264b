use lazy_static::lazy_static;
use regex::Regex;
use std::collections::HashSet;
use unicode_normalization::UnicodeNormalization;

use crate::config::StopConfig;
use crate::error::Result;

lazy_static! {
    // Script runs: Han, Hiragana, Katakana, then anything else letter-like.
    static ref RE: Regex = Regex::new(
        r"(?u)\p{Han}+|[\p{Hiragana}ー]+|[\p{Katakana}ー]+|[[\p{L}\p{N}_]--[\p{Han}\p{Hiragana}\p{Katakana}ー]][[\p{L}\p{N}_']--[\p{Han}\p{Hiragana}\p{Katakana}ー]]*"
    )
    .expect("valid regex");
}

/// Splits raw text into token surfaces.
pub trait Tokenizer: Send + Sync {
    fn tokenize(&self, text: &str) -> Vec<String>;

    /// The form a surface takes once tokenized. Stopwords are folded through
    /// this so they compare equal to emitted tokens.
    fn normalize(&self, surface: &str) -> String {
        surface.to_string()
    }
}

/// NFKC-normalizes and lowercases, then splits on script runs.
#[derive(Debug, Default, Clone, Copy)]
pub struct RegexTokenizer;

impl RegexTokenizer {
    pub fn new() -> Self {
        Self
    }
}

impl Tokenizer for RegexTokenizer {
    fn tokenize(&self, text: &str) -> Vec<String> {
        let normalized = self.normalize(text);
        RE.find_iter(&normalized).map(|m| m.as_str().to_string()).collect()
    }

    fn normalize(&self, surface: &str) -> String {
        surface.nfkc().collect::<String>().to_lowercase()
    }
}

/// Splits on Unicode whitespace and leaves surfaces untouched.
#[derive(Debug, Default, Clone, Copy)]
pub struct WhitespaceTokenizer;

impl Tokenizer for WhitespaceTokenizer {
    fn tokenize(&self, text: &str) -> Vec<String> {
        text.split_whitespace().map(str::to_string).collect()
    }
}

/// Rejects tokens that are listed stopwords or fully match the stop pattern.
#[derive(Debug, Clone, Default)]
pub struct StopFilter {
    stopwords: HashSet<String>,
    pattern: Option<Regex>,
}

impl StopFilter {
    /// A filter that accepts every token.
    pub fn none() -> Self {
        Self::default()
    }

    pub fn new<I, S>(stopwords: I, pattern: Option<&str>) -> Result<Self>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let pattern = match pattern {
            Some(p) => Some(Regex::new(&anchored(p))?),
            None => None,
        };
        Ok(Self { stopwords: stopwords.into_iter().map(Into::into).collect(), pattern })
    }

    /// Builds the filter for tokens coming out of `tokenizer`, folding each
    /// stopword the same way.
    pub fn from_config(config: &StopConfig, tokenizer: &dyn Tokenizer) -> Result<Self> {
        let stopwords = config.stopwords.iter().map(|w| tokenizer.normalize(w));
        Self::new(stopwords, config.pattern.as_deref())
    }

    pub fn is_stop_token(&self, surface: &str) -> bool {
        if self.stopwords.contains(surface) {
            return true;
        }
        self.pattern.as_ref().map_or(false, |re| re.is_match(surface))
    }
}

// A stop pattern must match the whole surface, not a substring of it.
fn anchored(pattern: &str) -> String {
    format!("^(?:{pattern})$")
}
