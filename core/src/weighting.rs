//! TF-IDF and Okapi BM25 term weights.
//!
//! TF-IDF: `tf = count`, `idf = ln(N / df + 1)`.
//!
//! BM25: `tf = count / dl`, `idf = max(0, ln((N - df + 0.5) / (df + 0.5)))` and
//!
//! ```text
//! weight = idf * tf * (k1 + 1) / (tf + k1 * (1 - b + b * dl / avgdl))
//! ```
//!
//! Terms found in at least half the corpus get a BM25 idf of zero and so never
//! contribute to a score.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use crate::error::{Error, Result};
use crate::index::InvertedIndex;
use crate::stats::CorpusStats;
use crate::DocId;

pub const DEFAULT_K1: f64 = 2.0;
pub const DEFAULT_B: f64 = 0.75;

#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
#[serde(tag = "scheme", rename_all = "snake_case")]
pub enum Scheme {
    #[default]
    TfIdf,
    Bm25(Bm25Params),
}

impl Scheme {
    pub fn validate(&self) -> Result<()> {
        match self {
            Scheme::TfIdf => Ok(()),
            Scheme::Bm25(p) => p.validate(),
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            Scheme::TfIdf => "tf_idf",
            Scheme::Bm25(_) => "bm25",
        }
    }
}

/// How repeated terms in a BM25 query are counted.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum QueryTermPolicy {
    /// Each distinct query term contributes once.
    #[default]
    Set,
    /// A term's contribution is multiplied by its count in the query.
    Frequency,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Bm25Params {
    pub k1: f64,
    pub b: f64,
    pub query_terms: QueryTermPolicy,
}

impl Default for Bm25Params {
    fn default() -> Self {
        Self { k1: DEFAULT_K1, b: DEFAULT_B, query_terms: QueryTermPolicy::Set }
    }
}

impl Bm25Params {
    pub fn new(k1: f64, b: f64) -> Result<Self> {
        let p = Self { k1, b, ..Self::default() };
        p.validate()?;
        Ok(p)
    }

    pub fn with_query_terms(mut self, policy: QueryTermPolicy) -> Self {
        self.query_terms = policy;
        self
    }

    pub fn validate(&self) -> Result<()> {
        if !self.k1.is_finite() || self.k1 <= 0.0 {
            return Err(Error::InvalidWeightingConfig(format!("k1 must be > 0, got {}", self.k1)));
        }
        if !(0.0..=1.0).contains(&self.b) {
            return Err(Error::InvalidWeightingConfig(format!("b must be in [0, 1], got {}", self.b)));
        }
        Ok(())
    }
}

/// `ln(N / df + 1)`. Positive whenever `df >= 1`.
pub fn tfidf_idf(num_docs: usize, df: usize) -> f64 {
    if df == 0 {
        return 0.0;
    }
    (num_docs as f64 / df as f64 + 1.0).ln()
}

/// Probabilistic idf, clamped at zero.
pub fn bm25_idf(num_docs: usize, df: usize) -> f64 {
    let n = num_docs as f64;
    let df = df as f64;
    let idf = ((n - df + 0.5) / (df + 0.5)).ln();
    if idf > 0.0 {
        idf
    } else {
        0.0
    }
}

/// BM25 weight of one posting. Returns zero instead of dividing when the
/// document length, `avgdl` or the denominator is not positive.
pub fn bm25_weight(count: u32, dl: u64, avgdl: f64, idf: f64, params: &Bm25Params) -> f64 {
    if count == 0 || dl == 0 || !(avgdl > 0.0) || idf == 0.0 {
        return 0.0;
    }
    let dl = dl as f64;
    let tf = count as f64 / dl;
    let numerator = tf * (params.k1 + 1.0);
    let denominator = tf + params.k1 * (1.0 - params.b + params.b * dl / avgdl);
    if !(denominator > 0.0) {
        return 0.0;
    }
    idf * numerator / denominator
}

/// Weight of every posting in an index, plus the idf used per term.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct WeightTable {
    weights: BTreeMap<String, BTreeMap<DocId, f64>>,
    idf: BTreeMap<String, f64>,
}

impl WeightTable {
    pub fn compute(scheme: &Scheme, index: &InvertedIndex, stats: &CorpusStats) -> Result<Self> {
        match scheme {
            Scheme::TfIdf => Ok(Self::tfidf(index, stats)),
            Scheme::Bm25(params) => Self::bm25(index, stats, params),
        }
    }

    pub fn tfidf(index: &InvertedIndex, stats: &CorpusStats) -> Self {
        let n = stats.num_docs();
        let mut table = Self::default();
        for (term, docs) in index.iter() {
            let idf = tfidf_idf(n, stats.df(term));
            let row = docs.iter().map(|(doc, &c)| (doc.clone(), f64::from(c) * idf)).collect();
            table.idf.insert(term.clone(), idf);
            table.weights.insert(term.clone(), row);
        }
        table
    }

    /// Fails with [`Error::EmptyCorpus`] when there is no document to average over.
    pub fn bm25(index: &InvertedIndex, stats: &CorpusStats, params: &Bm25Params) -> Result<Self> {
        params.validate()?;
        let avgdl = stats.avgdl()?;
        let n = stats.num_docs();
        let mut table = Self::default();
        for (term, docs) in index.iter() {
            let idf = bm25_idf(n, stats.df(term));
            let row = docs
                .iter()
                .map(|(doc, &c)| (doc.clone(), bm25_weight(c, stats.dl(doc), avgdl, idf, params)))
                .collect();
            table.idf.insert(term.clone(), idf);
            table.weights.insert(term.clone(), row);
        }
        Ok(table)
    }

    /// Zero for pairs that are not in the index.
    pub fn get(&self, term: &str, doc_id: &str) -> f64 {
        self.weights.get(term).and_then(|d| d.get(doc_id)).copied().unwrap_or(0.0)
    }

    pub fn idf(&self, term: &str) -> Option<f64> {
        self.idf.get(term).copied()
    }

    pub fn row(&self, term: &str) -> Option<&BTreeMap<DocId, f64>> {
        self.weights.get(term)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&String, &BTreeMap<DocId, f64>)> {
        self.weights.iter()
    }

    pub fn is_empty(&self) -> bool {
        self.weights.is_empty()
    }

    /// Euclidean norm of each document's weight vector.
    pub fn doc_norms(&self) -> BTreeMap<DocId, f64> {
        let mut sums: BTreeMap<DocId, f64> = BTreeMap::new();
        for docs in self.weights.values() {
            for (doc, w) in docs {
                *sums.entry(doc.clone()).or_insert(0.0) += w * w;
            }
        }
        sums.into_iter().map(|(d, s)| (d, s.sqrt())).collect()
    }

    /// Terms that have at least one strictly positive weight, each with only
    /// its positive postings.
    pub fn positive(&self) -> impl Iterator<Item = (&str, Vec<(&str, f64)>)> {
        self.weights.iter().filter_map(|(term, docs)| {
            let kept: Vec<(&str, f64)> =
                docs.iter().filter(|(_, w)| **w > 0.0).map(|(d, w)| (d.as_str(), *w)).collect();
            if kept.is_empty() {
                None
            } else {
                Some((term.as_str(), kept))
            }
        })
    }
}
