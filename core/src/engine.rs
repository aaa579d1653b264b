//! Fitting a corpus into an immutable [`Snapshot`] and querying it.
//!
//! A snapshot is never updated in place. Re-indexing builds a new one, so a
//! reader holding an `Arc<Snapshot>` never sees a half-built index.

use std::collections::BTreeMap;
use std::io::Write;
use std::path::Path;
use std::sync::Arc;

use crate::config::EngineConfig;
use crate::corpus::Document;
use crate::error::Result;
use crate::index::{Indexer, InvertedIndex};
use crate::persist::{self, IndexPaths, MetaFile, FORMAT_VERSION};
use crate::query::{QueryDoc, QueryVector};
use crate::rank::{self, Ranking};
use crate::stats::CorpusStats;
use crate::tokenizer::StopFilter;
use crate::weighting::{Scheme, WeightTable};
use crate::DocId;

/// Validated configuration plus the indexing path shared by documents and queries.
#[derive(Debug, Clone)]
pub struct Engine {
    indexer: Arc<Indexer>,
    scheme: Scheme,
}

impl Engine {
    pub fn new(config: &EngineConfig) -> Result<Self> {
        config.validate()?;
        let tokenizer = config.tokenizer.build();
        let filter = StopFilter::from_config(&config.stop, tokenizer.as_ref())?;
        let indexer = Indexer::new(tokenizer, filter);
        Ok(Self { indexer: Arc::new(indexer), scheme: config.scheme })
    }

    pub fn indexer(&self) -> &Indexer {
        &self.indexer
    }

    pub fn scheme(&self) -> &Scheme {
        &self.scheme
    }

    pub fn fit<'a, I>(&self, documents: I) -> Result<Snapshot>
    where
        I: IntoIterator<Item = (&'a str, &'a str)>,
    {
        self.fit_index(self.indexer.index(documents))
    }

    pub fn fit_documents(&self, documents: &[Document]) -> Result<Snapshot> {
        self.fit(documents.iter().map(|d| (d.id.as_str(), d.text.as_str())))
    }

    pub fn fit_dir<P: AsRef<Path>>(&self, root: P) -> Result<Snapshot> {
        self.fit_index(self.indexer.index_dir(root)?)
    }

    /// Builds a snapshot from already counted postings, e.g. ones read back
    /// from a persisted TF-IDF file.
    pub fn fit_index(&self, index: InvertedIndex) -> Result<Snapshot> {
        let stats = CorpusStats::compute(&index);
        let weights = if stats.is_empty() {
            WeightTable::default()
        } else {
            WeightTable::compute(&self.scheme, &index, &stats)?
        };
        let doc_norms = match self.scheme {
            Scheme::TfIdf => weights.doc_norms(),
            Scheme::Bm25(_) => BTreeMap::new(),
        };
        tracing::info!(
            scheme = self.scheme.name(),
            num_docs = stats.num_docs(),
            num_terms = index.num_terms(),
            "built snapshot"
        );
        Ok(Snapshot { indexer: Arc::clone(&self.indexer), scheme: self.scheme, index, stats, weights, doc_norms })
    }
}

/// An index, its statistics and weights, frozen together.
#[derive(Debug, Clone)]
pub struct Snapshot {
    indexer: Arc<Indexer>,
    scheme: Scheme,
    index: InvertedIndex,
    stats: CorpusStats,
    weights: WeightTable,
    doc_norms: BTreeMap<DocId, f64>,
}

impl Snapshot {
    pub fn scheme(&self) -> &Scheme {
        &self.scheme
    }

    pub fn index(&self) -> &InvertedIndex {
        &self.index
    }

    pub fn stats(&self) -> &CorpusStats {
        &self.stats
    }

    pub fn weights(&self) -> &WeightTable {
        &self.weights
    }

    pub fn query_doc(&self, text: &str) -> QueryDoc {
        QueryDoc::parse(&self.indexer, text)
    }

    pub fn query_vector(&self, text: &str) -> QueryVector {
        QueryVector::compute(&self.query_doc(text), &self.scheme, &self.weights, &self.stats)
    }

    /// Ranks the corpus against `text`. Empty for an empty corpus.
    pub fn search(&self, text: &str) -> Ranking {
        if self.stats.is_empty() {
            return Ranking::default();
        }
        let query = self.query_doc(text);
        match &self.scheme {
            Scheme::TfIdf => {
                let vector = QueryVector::compute(&query, &self.scheme, &self.weights, &self.stats);
                rank::cosine(&vector, &self.weights, &self.doc_norms, &self.stats)
            }
            Scheme::Bm25(params) => rank::additive(&query, &self.weights, params.query_terms),
        }
    }

    /// Writes the persisted form of the weights for this snapshot's scheme.
    pub fn export<W: Write>(&self, w: &mut W) -> Result<()> {
        match self.scheme {
            Scheme::TfIdf => persist::write_tfidf(w, &self.index, &self.weights),
            Scheme::Bm25(_) => persist::write_bm25(w, &self.weights),
        }
    }

    pub fn meta(&self, created_at: String) -> MetaFile {
        MetaFile {
            num_docs: self.stats.num_docs(),
            num_terms: self.index.num_terms(),
            avgdl: self.stats.avgdl().ok(),
            scheme: self.scheme,
            created_at,
            version: FORMAT_VERSION,
        }
    }

    /// Writes the weights file and `meta.json` under `paths`.
    pub fn save(&self, paths: &IndexPaths, created_at: String) -> Result<()> {
        let mut w = persist::create_weights_file(paths, &self.scheme)?;
        self.export(&mut w)?;
        w.flush()?;
        persist::save_meta(paths, &self.meta(created_at))?;
        tracing::info!(root = %paths.root.display(), scheme = self.scheme.name(), "saved index");
        Ok(())
    }
}
