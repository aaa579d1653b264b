use std::collections::{BTreeMap, BTreeSet};

use crate::error::{Error, Result};
use crate::index::InvertedIndex;
use crate::DocId;

/// Corpus-wide figures derived from an [`InvertedIndex`].
#[derive(Debug, Clone, Default, PartialEq)]
pub struct CorpusStats {
    registry: BTreeSet<DocId>,
    df: BTreeMap<String, usize>,
    dl: BTreeMap<DocId, u64>,
}

impl CorpusStats {
    pub fn compute(index: &InvertedIndex) -> Self {
        let mut stats = Self::default();
        for (term, docs) in index.iter() {
            stats.df.insert(term.clone(), docs.len());
            for (doc, &n) in docs {
                if !stats.registry.contains(doc) {
                    stats.registry.insert(doc.clone());
                }
                *stats.dl.entry(doc.clone()).or_insert(0) += u64::from(n);
            }
        }
        stats
    }

    /// Total document count `N`.
    pub fn num_docs(&self) -> usize {
        self.registry.len()
    }

    pub fn is_empty(&self) -> bool {
        self.registry.is_empty()
    }

    pub fn docs(&self) -> impl Iterator<Item = &DocId> {
        self.registry.iter()
    }

    pub fn contains_doc(&self, doc_id: &str) -> bool {
        self.registry.contains(doc_id)
    }

    /// Number of documents containing `term`; zero for unknown terms.
    pub fn df(&self, term: &str) -> usize {
        self.df.get(term).copied().unwrap_or(0)
    }

    /// Accepted-token count of `doc_id`; zero for unknown documents.
    pub fn dl(&self, doc_id: &str) -> u64 {
        self.dl.get(doc_id).copied().unwrap_or(0)
    }

    pub fn total_len(&self) -> u64 {
        self.dl.values().sum()
    }

    pub fn avgdl(&self) -> Result<f64> {
        if self.registry.is_empty() {
            return Err(Error::EmptyCorpus);
        }
        Ok(self.total_len() as f64 / self.registry.len() as f64)
    }
}
