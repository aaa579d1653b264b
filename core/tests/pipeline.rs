use search_core::config::{EngineConfig, StopConfig, TokenizerKind};
use search_core::corpus::read_dir;
use search_core::persist::{load_tfidf, IndexPaths};
use search_core::{Bm25Params, CorpusStats, Engine, Error, QueryTermPolicy, Scheme};

fn engine(scheme: Scheme) -> Engine {
    let config = EngineConfig { scheme, stop: StopConfig::empty(), tokenizer: TokenizerKind::Whitespace };
    Engine::new(&config).unwrap()
}

const SMALL: [(&str, &str); 2] = [("doc1", "cat dog cat"), ("doc2", "dog bird")];

#[test]
fn small_corpus_index_and_tfidf() {
    let snap = engine(Scheme::TfIdf).fit(SMALL).unwrap();
    let idx = snap.index();
    assert_eq!(idx.count("cat", "doc1"), 2);
    assert_eq!(idx.count("dog", "doc1"), 1);
    assert_eq!(idx.count("dog", "doc2"), 1);
    assert_eq!(idx.count("bird", "doc2"), 1);
    assert_eq!(idx.num_terms(), 3);

    let stats = snap.stats();
    assert_eq!(stats.num_docs(), 2);
    assert_eq!((stats.df("cat"), stats.df("dog"), stats.df("bird")), (1, 2, 1));

    let w = snap.weights();
    assert!((w.idf("dog").unwrap() - 0.6931471805599453).abs() < 1e-12);
    assert!((w.get("dog", "doc1") - 0.6931471805599453).abs() < 1e-12);
}

#[test]
fn cosine_ranks_matching_document_first() {
    let snap = engine(Scheme::TfIdf).fit(SMALL).unwrap();
    let ranking = snap.search("cat");
    let hits = ranking.hits();
    assert_eq!(hits.len(), 2);
    assert_eq!(hits[0].doc_id, "doc1");
    assert!(hits[0].score > 0.0);
    assert_eq!(hits[1].doc_id, "doc2");
    assert_eq!(hits[1].score, 0.0);
}

#[test]
fn cosine_scores_stay_in_unit_interval() {
    let snap = engine(Scheme::TfIdf)
        .fit([("a", "x y z x"), ("b", "y y y"), ("c", "z w"), ("d", "w w x")])
        .unwrap();
    for q in ["x", "y z", "w w w x", "x y z w", "nothing here"] {
        for hit in snap.search(q).hits() {
            assert!((0.0..=1.0).contains(&hit.score), "{q}: {hit:?}");
        }
    }
    // Identical vectors are maximally similar.
    let top = snap.search("y y y");
    assert_eq!(top.hits()[0].doc_id, "b");
    assert!((top.hits()[0].score - 1.0).abs() < 1e-9);
}

#[test]
fn query_of_only_unknown_terms_scores_zero() {
    let snap = engine(Scheme::TfIdf).fit(SMALL).unwrap();
    let ranking = snap.search("unicorn");
    assert!(ranking.hits().iter().all(|h| h.score == 0.0));
    assert!(snap.query_vector("unicorn").is_empty());
}

#[test]
fn bm25_term_in_every_document_scores_zero() {
    let params = Bm25Params::new(2.0, 0.75).unwrap();
    let snap = engine(Scheme::Bm25(params))
        .fit([("a", "common rare"), ("b", "common common x"), ("c", "common y z")])
        .unwrap();
    for doc in ["a", "b", "c"] {
        assert_eq!(snap.weights().get("common", doc), 0.0);
    }
    let ranking = snap.search("common");
    assert_eq!(ranking.len(), 3);
    assert!(ranking.hits().iter().all(|h| h.score == 0.0));
}

#[test]
fn bm25_excludes_documents_without_query_terms() {
    let snap = engine(Scheme::Bm25(Bm25Params::default()))
        .fit([("a", "pond front"), ("b", "pond"), ("c", "cat"), ("d", "dog"), ("e", "bird")])
        .unwrap();
    let ranking = snap.search("pond unicorn");
    let ids: Vec<&str> = ranking.hits().iter().map(|h| h.doc_id.as_str()).collect();
    assert_eq!(ids.len(), 2);
    assert!(ids.contains(&"a") && ids.contains(&"b"));
    assert!(ranking.hits().iter().all(|h| h.score >= 0.0));
    // Shorter document wins on equal counts.
    assert_eq!(ids[0], "b");
}

#[test]
fn bm25_query_term_policy() {
    let docs = [("a", "pond"), ("b", "cat"), ("c", "dog"), ("d", "bird")];
    let set = engine(Scheme::Bm25(Bm25Params::default())).fit(docs).unwrap();
    let freq = engine(Scheme::Bm25(Bm25Params::default().with_query_terms(QueryTermPolicy::Frequency)))
        .fit(docs)
        .unwrap();
    let once = set.search("pond").score("a").unwrap();
    assert!(once > 0.0);
    assert_eq!(set.search("pond pond").score("a").unwrap(), once);
    assert!((freq.search("pond pond").score("a").unwrap() - 2.0 * once).abs() < 1e-12);
}

#[test]
fn single_document_corpus_is_well_defined() {
    let snap = engine(Scheme::Bm25(Bm25Params::default())).fit([("only", "a b a")]).unwrap();
    assert_eq!(snap.stats().avgdl().unwrap(), 3.0);
    // N = 1, df = 1: idf clamps to zero.
    let ranking = snap.search("a");
    assert_eq!(ranking.len(), 1);
    assert!(ranking.hits()[0].score.is_finite());
}

#[test]
fn empty_corpus_short_circuits() {
    for scheme in [Scheme::TfIdf, Scheme::Bm25(Bm25Params::default())] {
        let snap = engine(scheme).fit([("blank", "")]).unwrap();
        assert!(snap.stats().is_empty());
        assert!(matches!(snap.stats().avgdl(), Err(Error::EmptyCorpus)));
        assert!(snap.search("anything").is_empty());
    }
}

#[test]
fn dl_matches_independent_token_count() {
    let docs = [("a", "x y z x"), ("b", "y")];
    let snap = engine(Scheme::TfIdf).fit(docs).unwrap();
    for (id, text) in docs {
        assert_eq!(snap.stats().dl(id), text.split_whitespace().count() as u64);
    }
}

#[test]
fn reindexing_is_idempotent() {
    let e = engine(Scheme::Bm25(Bm25Params::default()));
    let docs = [("a", "x y z x"), ("b", "y"), ("c", "q r")];
    let first = e.fit(docs).unwrap();
    let second = e.fit(docs).unwrap();
    assert_eq!(first.index(), second.index());
    assert_eq!(first.weights(), second.weights());
    assert_eq!(CorpusStats::compute(first.index()), *second.stats());
}

#[test]
fn invalid_config_is_rejected_before_indexing() {
    let bad = Scheme::Bm25(Bm25Params { k1: 0.0, ..Bm25Params::default() });
    let config = EngineConfig { scheme: bad, ..EngineConfig::default() };
    assert!(matches!(Engine::new(&config), Err(Error::InvalidWeightingConfig(_))));
}

#[test]
fn persisted_tfidf_reloads_to_same_ranking() {
    let dir = tempfile::tempdir().unwrap();
    let paths = IndexPaths::new(dir.path());
    let e = engine(Scheme::TfIdf);
    let snap = e.fit([("a", "x y z x"), ("b", "y"), ("c", "z w")]).unwrap();
    snap.save(&paths, "2024-01-01T00:00:00Z".into()).unwrap();

    let reloaded = e.fit_index(load_tfidf(&paths).unwrap()).unwrap();
    assert_eq!(reloaded.index(), snap.index());
    assert_eq!(reloaded.search("x z").to_map(), snap.search("x z").to_map());
    assert!(paths.meta().exists());
}

#[test]
fn japanese_corpus_with_default_config() {
    let e = Engine::new(&EngineConfig::default()).unwrap();
    let snap = e
        .fit([
            ("doc1.txt", "吾輩は猫である。名前はまだ無い。"),
            ("doc2.txt", "池の前に立っていた。"),
            ("doc3.txt", "猫が池の前で寝ている。"),
        ])
        .unwrap();
    assert!(!snap.index().contains_term("の"));
    let ranking = snap.search("池の前");
    assert_eq!(ranking.hits()[0].doc_id, "doc2.txt");
    assert_eq!(ranking.score("doc1.txt"), Some(0.0));
}

#[test]
fn directory_and_in_memory_paths_agree() {
    let dir = tempfile::tempdir().unwrap();
    std::fs::write(dir.path().join("doc1"), "cat dog\ncat\n").unwrap();
    std::fs::write(dir.path().join("doc2"), "dog bird\n").unwrap();
    let e = engine(Scheme::TfIdf);
    let from_dir = e.fit_dir(dir.path()).unwrap();
    let from_docs = e.fit_documents(&read_dir(dir.path()).unwrap()).unwrap();
    assert_eq!(from_dir.index(), from_docs.index());
    assert_eq!(from_dir.search("cat").to_map(), from_docs.search("cat").to_map());
}
