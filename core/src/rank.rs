use serde::Serialize;
use std::cmp::Ordering;
use std::collections::{BTreeMap, HashMap};

use crate::query::{QueryDoc, QueryVector};
use crate::stats::CorpusStats;
use crate::weighting::{QueryTermPolicy, WeightTable};
use crate::DocId;

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Hit {
    pub doc_id: DocId,
    pub score: f64,
}

/// Scored documents, highest score first, ties by ascending document id.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(transparent)]
pub struct Ranking {
    hits: Vec<Hit>,
}

impl Ranking {
    pub fn from_scores<I>(scores: I) -> Self
    where
        I: IntoIterator<Item = (DocId, f64)>,
    {
        let mut hits: Vec<Hit> = scores.into_iter().map(|(doc_id, score)| Hit { doc_id, score }).collect();
        hits.sort_by(|a, b| match b.score.total_cmp(&a.score) {
            Ordering::Equal => a.doc_id.cmp(&b.doc_id),
            ord => ord,
        });
        Self { hits }
    }

    pub fn hits(&self) -> &[Hit] {
        &self.hits
    }

    pub fn len(&self) -> usize {
        self.hits.len()
    }

    pub fn is_empty(&self) -> bool {
        self.hits.is_empty()
    }

    pub fn score(&self, doc_id: &str) -> Option<f64> {
        self.hits.iter().find(|h| h.doc_id == doc_id).map(|h| h.score)
    }

    pub fn top(&self, k: usize) -> &[Hit] {
        &self.hits[..k.min(self.hits.len())]
    }

    pub fn to_map(&self) -> BTreeMap<DocId, f64> {
        self.hits.iter().map(|h| (h.doc_id.clone(), h.score)).collect()
    }
}

/// Cosine similarity between the query vector and every document vector.
///
/// Documents sharing a term with the query are scored; the rest of the
/// registry is emitted at exactly zero. A zero norm on either side yields a
/// score of zero.
pub fn cosine(
    query: &QueryVector,
    table: &WeightTable,
    doc_norms: &BTreeMap<DocId, f64>,
    stats: &CorpusStats,
) -> Ranking {
    if stats.is_empty() {
        return Ranking::default();
    }
    let mut dots: HashMap<&str, f64> = HashMap::new();
    for (term, qw) in query.iter() {
        if let Some(row) = table.row(term) {
            for (doc, w) in row {
                *dots.entry(doc.as_str()).or_insert(0.0) += qw * w;
            }
        }
    }
    let qn = query.norm();
    Ranking::from_scores(stats.docs().map(|doc| {
        let dn = doc_norms.get(doc).copied().unwrap_or(0.0);
        let score = match dots.get(doc.as_str()) {
            Some(&dot) if qn > 0.0 && dn > 0.0 => (dot / (qn * dn)).clamp(-1.0, 1.0),
            _ => 0.0,
        };
        (doc.clone(), score)
    }))
}

/// Sum of the BM25 weights of the query terms each document contains.
/// Documents containing no query term are left out.
pub fn additive(query: &QueryDoc, table: &WeightTable, policy: QueryTermPolicy) -> Ranking {
    let mut scores: HashMap<&str, f64> = HashMap::new();
    for (term, count) in query.terms() {
        let Some(row) = table.row(term) else {
            continue;
        };
        let times = match policy {
            QueryTermPolicy::Set => 1.0,
            QueryTermPolicy::Frequency => f64::from(count),
        };
        for (doc, w) in row {
            *scores.entry(doc.as_str()).or_insert(0.0) += times * w;
        }
    }
    Ranking::from_scores(scores.into_iter().map(|(d, s)| (d.to_string(), s)))
}
