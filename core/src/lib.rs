//! Term weighting and ranking over a small document collection.
//!
//! Documents are tokenized and counted into an [`InvertedIndex`], corpus
//! statistics are derived from it, and a [`Scheme`] (TF-IDF or Okapi BM25)
//! turns those into a weight table. Queries go through the same counting path
//! as a one-document pseudo corpus and are ranked against a [`Snapshot`].

pub mod config;
pub mod corpus;
pub mod engine;
pub mod error;
pub mod index;
pub mod persist;
pub mod query;
pub mod rank;
pub mod stats;
pub mod tokenizer;
pub mod weighting;

pub use config::{EngineConfig, StopConfig, TokenizerKind};
pub use engine::{Engine, Snapshot};
pub use error::{Error, Result};
pub use index::{Indexer, InvertedIndex};
pub use query::{QueryDoc, QueryVector, QUERY_DOC_ID};
pub use rank::{Hit, Ranking};
pub use stats::CorpusStats;
pub use tokenizer::{RegexTokenizer, StopFilter, Tokenizer, WhitespaceTokenizer};
pub use weighting::{Bm25Params, QueryTermPolicy, Scheme, WeightTable};

/// Opaque document identifier, usually a file name relative to the corpus root.
pub type DocId = String;
