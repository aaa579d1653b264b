use serde::Serialize;
use std::collections::BTreeMap;

use crate::index::Indexer;
use crate::stats::CorpusStats;
use crate::weighting::{bm25_weight, Scheme, WeightTable};

/// Identifier of the pseudo-document a query is counted under.
pub const QUERY_DOC_ID: &str = "query";

/// A query counted through the same path as corpus documents. It never joins
/// the corpus registry, so df and idf stay corpus-only.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct QueryDoc {
    counts: BTreeMap<String, u32>,
    len: u64,
}

impl QueryDoc {
    pub fn parse(indexer: &Indexer, text: &str) -> Self {
        let index = indexer.index([(QUERY_DOC_ID, text)]);
        let counts = index.doc_terms(QUERY_DOC_ID);
        let len = counts.values().map(|&c| u64::from(c)).sum();
        Self { counts, len }
    }

    pub fn count(&self, term: &str) -> u32 {
        self.counts.get(term).copied().unwrap_or(0)
    }

    pub fn terms(&self) -> impl Iterator<Item = (&String, u32)> {
        self.counts.iter().map(|(t, &c)| (t, c))
    }

    /// Accepted-token count of the query.
    pub fn len(&self) -> u64 {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.counts.is_empty()
    }
}

/// Query term weights under the active scheme. Only terms known to the corpus
/// appear; anything else is implicitly zero.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct QueryVector {
    weights: BTreeMap<String, f64>,
}

impl QueryVector {
    pub fn compute(query: &QueryDoc, scheme: &Scheme, table: &WeightTable, stats: &CorpusStats) -> Self {
        let mut weights = BTreeMap::new();
        if stats.is_empty() {
            return Self { weights };
        }
        for (term, count) in query.terms() {
            let Some(idf) = table.idf(term) else {
                continue;
            };
            let w = match scheme {
                Scheme::TfIdf => f64::from(count) * idf,
                // The query is its own one-document corpus, so avgdl == dl.
                Scheme::Bm25(params) => bm25_weight(count, query.len(), query.len() as f64, idf, params),
            };
            weights.insert(term.clone(), w);
        }
        Self { weights }
    }

    pub fn get(&self, term: &str) -> f64 {
        self.weights.get(term).copied().unwrap_or(0.0)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&String, f64)> {
        self.weights.iter().map(|(t, &w)| (t, w))
    }

    pub fn norm(&self) -> f64 {
        self.weights.values().map(|w| w * w).sum::<f64>().sqrt()
    }

    pub fn len(&self) -> usize {
        self.weights.len()
    }

    pub fn is_empty(&self) -> bool {
        self.weights.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::index::InvertedIndex;
    use crate::tokenizer::{StopFilter, WhitespaceTokenizer};
    use crate::weighting::{tfidf_idf, Bm25Params};
    use std::sync::Arc;

    fn indexer() -> Indexer {
        Indexer::new(Arc::new(WhitespaceTokenizer), StopFilter::new(["the"], None).unwrap())
    }

    fn corpus() -> (InvertedIndex, CorpusStats) {
        let idx = indexer().index([("doc1", "cat dog cat"), ("doc2", "dog bird"), ("doc3", "fish")]);
        let stats = CorpusStats::compute(&idx);
        (idx, stats)
    }

    #[test]
    fn query_is_counted_like_a_document() {
        let q = QueryDoc::parse(&indexer(), "the cat cat fish");
        assert_eq!(q.count("cat"), 2);
        assert_eq!(q.count("fish"), 1);
        assert_eq!(q.count("the"), 0);
        assert_eq!(q.len(), 3);
    }

    #[test]
    fn tfidf_vector_skips_unknown_terms() {
        let (idx, stats) = corpus();
        let table = WeightTable::tfidf(&idx, &stats);
        let q = QueryDoc::parse(&indexer(), "cat cat unicorn");
        let v = QueryVector::compute(&q, &Scheme::TfIdf, &table, &stats);
        assert_eq!(v.len(), 1);
        assert!((v.get("cat") - 2.0 * tfidf_idf(3, 1)).abs() < 1e-12);
        assert_eq!(v.get("unicorn"), 0.0);
    }

    #[test]
    fn bm25_vector_uses_query_length() {
        let (idx, stats) = corpus();
        let params = Bm25Params::default();
        let table = WeightTable::bm25(&idx, &stats, &params).unwrap();
        let q = QueryDoc::parse(&indexer(), "cat bird");
        let v = QueryVector::compute(&q, &Scheme::Bm25(params), &table, &stats);
        let idf = table.idf("cat").unwrap();
        assert!(idf > 0.0);
        assert!((v.get("cat") - bm25_weight(1, 2, 2.0, idf, &params)).abs() < 1e-12);
    }

    #[test]
    fn empty_corpus_gives_empty_vector() {
        let idx = InvertedIndex::new();
        let stats = CorpusStats::compute(&idx);
        let q = QueryDoc::parse(&indexer(), "cat");
        let v = QueryVector::compute(&q, &Scheme::TfIdf, &WeightTable::default(), &stats);
        assert!(v.is_empty());
        assert_eq!(v.norm(), 0.0);
    }
}
