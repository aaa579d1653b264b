use serde::{Deserialize, Serialize};
use std::fs::{create_dir_all, File};
use std::io::{BufRead, BufReader, BufWriter, Read, Write};
use std::path::{Path, PathBuf};

use crate::error::{Error, Result};
use crate::index::InvertedIndex;
use crate::weighting::{Scheme, WeightTable};

pub const FORMAT_VERSION: u32 = 1;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MetaFile {
    pub num_docs: usize,
    pub num_terms: usize,
    pub avgdl: Option<f64>,
    pub scheme: Scheme,
    pub created_at: String,
    pub version: u32,
}

pub struct IndexPaths {
    pub root: PathBuf,
}

impl IndexPaths {
    pub fn new<P: AsRef<Path>>(root: P) -> Self {
        Self { root: root.as_ref().to_path_buf() }
    }
    pub fn tfidf(&self) -> PathBuf { self.root.join("tf_idf.txt") }
    pub fn bm25(&self) -> PathBuf { self.root.join("okapi_bm25.txt") }
    pub fn meta(&self) -> PathBuf { self.root.join("meta.json") }

    /// File holding the weights of `scheme`.
    pub fn weights(&self, scheme: &Scheme) -> PathBuf {
        match scheme {
            Scheme::TfIdf => self.tfidf(),
            Scheme::Bm25(_) => self.bm25(),
        }
    }
}

// Both formats are line and tab delimited with no escaping.
fn check_field(field: &'static str, value: &str) -> Result<()> {
    if value.contains(['\t', '\n', '\r']) {
        return Err(Error::UnwritableField { field, value: value.to_string() });
    }
    Ok(())
}

/// One row per posting, terms then documents ascending:
/// `term \t doc \t count \t idf \t tfidf`.
///
/// Fails with [`Error::UnwritableField`] if a term or document id contains a
/// tab or line break, since the row could not be read back.
pub fn write_tfidf<W: Write>(w: &mut W, index: &InvertedIndex, table: &WeightTable) -> Result<()> {
    for (term, docs) in index.iter() {
        check_field("term", term)?;
        let idf = table.idf(term).unwrap_or(0.0);
        for (doc, count) in docs {
            check_field("document id", doc)?;
            writeln!(w, "{}\t{}\t{}\t{}\t{}", term, doc, count, idf, table.get(term, doc))?;
        }
    }
    Ok(())
}

/// Reads the raw counts back out of a TF-IDF file. Weights are not trusted;
/// they are recomputed from the counts.
pub fn read_tfidf<R: BufRead>(r: R) -> Result<InvertedIndex> {
    let mut index = InvertedIndex::new();
    for (i, line) in r.lines().enumerate() {
        let line = line?;
        if line.trim().is_empty() {
            continue;
        }
        let malformed = |reason: String| Error::MalformedIndex { line: i + 1, reason };
        let cols: Vec<&str> = line.trim_end_matches('\r').split('\t').collect();
        if cols.len() != 5 {
            return Err(malformed(format!("expected 5 columns, found {}", cols.len())));
        }
        let count: u32 = cols[2].parse().map_err(|e| malformed(format!("bad count {:?}: {e}", cols[2])))?;
        if count == 0 {
            return Err(malformed("count must be positive".into()));
        }
        for (name, col) in [("idf", cols[3]), ("tfidf", cols[4])] {
            col.parse::<f64>().map_err(|e| malformed(format!("bad {name} {col:?}: {e}")))?;
        }
        if index.count(cols[0], cols[1]) != 0 {
            return Err(malformed(format!("duplicate posting for {:?} in {:?}", cols[0], cols[1])));
        }
        index.add(cols[0], cols[1], count);
    }
    Ok(index)
}

/// Grouped by term, strictly positive scores only:
///
/// ```text
/// term
///     doc ->  score
/// ```
pub fn write_bm25<W: Write>(w: &mut W, table: &WeightTable) -> Result<()> {
    for (term, docs) in table.positive() {
        check_field("term", term)?;
        writeln!(w, "{term}")?;
        for (doc, score) in docs {
            check_field("document id", doc)?;
            writeln!(w, "    {doc} ->  {score}")?;
        }
    }
    Ok(())
}

pub fn save_meta(paths: &IndexPaths, meta: &MetaFile) -> Result<()> {
    create_dir_all(&paths.root)?;
    let mut f = File::create(paths.meta())?;
    let json = serde_json::to_string_pretty(meta)?;
    f.write_all(json.as_bytes())?;
    Ok(())
}

pub fn load_meta(paths: &IndexPaths) -> Result<MetaFile> {
    let mut f = File::open(paths.meta())?;
    let mut buf = String::new();
    f.read_to_string(&mut buf)?;
    let meta: MetaFile = serde_json::from_str(&buf)?;
    Ok(meta)
}

pub fn load_tfidf(paths: &IndexPaths) -> Result<InvertedIndex> {
    let f = File::open(paths.tfidf())?;
    read_tfidf(BufReader::new(f))
}

pub(crate) fn create_weights_file(paths: &IndexPaths, scheme: &Scheme) -> Result<BufWriter<File>> {
    create_dir_all(&paths.root)?;
    Ok(BufWriter::new(File::create(paths.weights(scheme))?))
}
