//! Engine configuration.
//!
//! Loaded from a JSON file or built in code. Every field has a default, so an
//! empty object `{}` is a valid config: TF-IDF weighting, the regex tokenizer
//! and the default stop rule.

use serde::{Deserialize, Serialize};
use std::fs::File;
use std::io::BufReader;
use std::path::Path;
use std::sync::Arc;

use crate::error::Result;
use crate::tokenizer::{RegexTokenizer, Tokenizer, WhitespaceTokenizer};
use crate::weighting::Scheme;

/// Rejects a single character from the ideographic space up to the
/// prolonged sound mark (U+3000..=U+30FC), i.e. lone kana and punctuation.
pub const DEFAULT_STOP_PATTERN: &str = "^[　-ー]$";

pub const DEFAULT_STOPWORDS: &[&str] = &["という", "にて"];

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    pub scheme: Scheme,
    pub stop: StopConfig,
    pub tokenizer: TokenizerKind,
}

impl EngineConfig {
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let f = File::open(path)?;
        let config: EngineConfig = serde_json::from_reader(BufReader::new(f))?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<()> {
        self.scheme.validate()
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct StopConfig {
    /// Folded through the tokenizer's normalization before matching, so case
    /// and width follow whatever the tokenizer emits.
    pub stopwords: Vec<String>,
    pub pattern: Option<String>,
}

impl Default for StopConfig {
    fn default() -> Self {
        Self {
            stopwords: DEFAULT_STOPWORDS.iter().map(|s| s.to_string()).collect(),
            pattern: Some(DEFAULT_STOP_PATTERN.to_string()),
        }
    }
}

impl StopConfig {
    /// No stopwords and no pattern.
    pub fn empty() -> Self {
        Self { stopwords: Vec::new(), pattern: None }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TokenizerKind {
    #[default]
    Regex,
    Whitespace,
}

impl TokenizerKind {
    pub fn build(self) -> Arc<dyn Tokenizer> {
        match self {
            TokenizerKind::Regex => Arc::new(RegexTokenizer::new()),
            TokenizerKind::Whitespace => Arc::new(WhitespaceTokenizer),
        }
    }
}
