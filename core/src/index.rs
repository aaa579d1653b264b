use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use std::io::BufRead;
use std::sync::Arc;

use crate::error::Result;
use crate::tokenizer::{RegexTokenizer, StopFilter, Tokenizer};
use crate::DocId;

/// term -> doc -> raw occurrence count. A missing pair means zero; counts are
/// never stored as zero. Keys iterate in ascending order.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct InvertedIndex {
    postings: BTreeMap<String, BTreeMap<DocId, u32>>,
}

impl InvertedIndex {
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds `n` occurrences of `term` in `doc_id`. Adding zero is a no-op.
    /// Counts saturate at `u32::MAX`.
    pub fn add(&mut self, term: &str, doc_id: &str, n: u32) {
        if n == 0 {
            return;
        }
        let docs = self.postings.entry(term.to_string()).or_default();
        let count = docs.entry(doc_id.to_string()).or_insert(0);
        *count = count.saturating_add(n);
    }

    pub fn count(&self, term: &str, doc_id: &str) -> u32 {
        self.postings.get(term).and_then(|d| d.get(doc_id)).copied().unwrap_or(0)
    }

    pub fn postings(&self, term: &str) -> Option<&BTreeMap<DocId, u32>> {
        self.postings.get(term)
    }

    pub fn contains_term(&self, term: &str) -> bool {
        self.postings.contains_key(term)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&String, &BTreeMap<DocId, u32>)> {
        self.postings.iter()
    }

    pub fn num_terms(&self) -> usize {
        self.postings.len()
    }

    pub fn is_empty(&self) -> bool {
        self.postings.is_empty()
    }

    /// Counts of every term in one document.
    pub fn doc_terms(&self, doc_id: &str) -> BTreeMap<String, u32> {
        self.postings
            .iter()
            .filter_map(|(term, docs)| docs.get(doc_id).map(|&c| (term.clone(), c)))
            .collect()
    }

    /// Folds another index into this one, summing counts of shared postings.
    /// Lets documents be counted independently and merged afterwards.
    pub fn merge(&mut self, other: InvertedIndex) {
        for (term, docs) in other.postings {
            let into = self.postings.entry(term).or_default();
            for (doc, n) in docs {
                let count = into.entry(doc).or_insert(0);
                *count = count.saturating_add(n);
            }
        }
    }
}

/// Tokenizes text, drops stop tokens, and counts the rest per document.
#[derive(Clone)]
pub struct Indexer {
    tokenizer: Arc<dyn Tokenizer>,
    filter: StopFilter,
}

impl fmt::Debug for Indexer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Indexer").field("filter", &self.filter).finish_non_exhaustive()
    }
}

impl Default for Indexer {
    fn default() -> Self {
        Self::new(Arc::new(RegexTokenizer::new()), StopFilter::none())
    }
}

impl Indexer {
    pub fn new(tokenizer: Arc<dyn Tokenizer>, filter: StopFilter) -> Self {
        Self { tokenizer, filter }
    }

    /// Accepted terms of `text`, in order, after stop filtering.
    pub fn terms(&self, text: &str) -> Vec<String> {
        self.tokenizer
            .tokenize(text)
            .into_iter()
            .filter(|t| !self.filter.is_stop_token(t))
            .collect()
    }

    /// Counts every accepted token of `text` under `doc_id`.
    pub fn add_text(&self, index: &mut InvertedIndex, doc_id: &str, text: &str) {
        for term in self.terms(text) {
            index.add(&term, doc_id, 1);
        }
    }

    /// Line-oriented variant of [`Indexer::add_text`].
    pub fn add_reader<R: BufRead>(&self, index: &mut InvertedIndex, doc_id: &str, reader: R) -> Result<()> {
        for line in reader.lines() {
            self.add_text(index, doc_id, &line?);
        }
        Ok(())
    }

    pub fn index<'a, I>(&self, documents: I) -> InvertedIndex
    where
        I: IntoIterator<Item = (&'a str, &'a str)>,
    {
        let mut index = InvertedIndex::new();
        for (doc_id, text) in documents {
            self.add_text(&mut index, doc_id, text);
            tracing::debug!(doc_id, terms = index.num_terms(), "indexed document");
        }
        index
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tokenizer::WhitespaceTokenizer;

    fn indexer() -> Indexer {
        Indexer::new(Arc::new(WhitespaceTokenizer), StopFilter::none())
    }

    #[test]
    fn counts_per_document() {
        let idx = indexer().index([("doc1", "cat dog cat"), ("doc2", "dog bird")]);
        assert_eq!(idx.count("cat", "doc1"), 2);
        assert_eq!(idx.count("dog", "doc1"), 1);
        assert_eq!(idx.count("dog", "doc2"), 1);
        assert_eq!(idx.count("bird", "doc2"), 1);
        assert_eq!(idx.count("cat", "doc2"), 0);
        assert!(idx.postings("cat").unwrap().get("doc2").is_none());
    }

    #[test]
    fn stop_tokens_are_never_stored() {
        let filter = StopFilter::new(["the"], None).unwrap();
        let idx = Indexer::new(Arc::new(WhitespaceTokenizer), filter).index([("d", "the cat the")]);
        assert!(!idx.contains_term("the"));
        assert_eq!(idx.num_terms(), 1);
    }

    #[test]
    fn line_by_line_matches_whole_text() {
        let text = "cat dog\ndog bird cat\n\ncat";
        let whole = indexer().index([("d", text)]);
        let mut lines = InvertedIndex::new();
        indexer().add_reader(&mut lines, "d", text.as_bytes()).unwrap();
        assert_eq!(whole, lines);
    }

    #[test]
    fn merge_sums_shared_postings() {
        let mut a = indexer().index([("d1", "cat dog")]);
        let b = indexer().index([("d1", "cat"), ("d2", "cat")]);
        a.merge(b);
        assert_eq!(a.count("cat", "d1"), 2);
        assert_eq!(a.count("cat", "d2"), 1);
        assert_eq!(a.count("dog", "d1"), 1);
    }

    #[test]
    fn counts_saturate_instead_of_wrapping() {
        let mut idx = InvertedIndex::new();
        idx.add("cat", "d1", u32::MAX);
        idx.add("cat", "d1", 1);
        assert_eq!(idx.count("cat", "d1"), u32::MAX);

        let mut other = InvertedIndex::new();
        other.add("cat", "d1", 7);
        idx.merge(other);
        assert_eq!(idx.count("cat", "d1"), u32::MAX);
    }

    #[test]
    fn empty_text_adds_nothing() {
        let idx = indexer().index([("d", "")]);
        assert!(idx.is_empty());
    }
}
