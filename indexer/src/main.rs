use anyhow::{bail, Result};
use clap::{Args, Parser, Subcommand, ValueEnum};
use search_core::persist::{load_tfidf, IndexPaths};
use search_core::{Bm25Params, Engine, EngineConfig, QueryTermPolicy, Scheme, Snapshot};
use tracing_subscriber::{fmt, EnvFilter};

#[derive(Parser)]
#[command(name = "indexer")]
#[command(about = "Build TF-IDF / Okapi BM25 indexes and rank documents against a query", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Index every file under a directory and write the weights to disk
    Build {
        /// Corpus directory; each file is one document
        #[arg(long)]
        input: String,
        /// Output index directory
        #[arg(long)]
        output: String,
        #[command(flatten)]
        weighting: WeightingArgs,
    },
    /// Rank documents against a query
    Search {
        /// Query text
        #[arg(long)]
        query: String,
        /// Corpus directory to index before searching
        #[arg(long, conflicts_with = "index", required_unless_present = "index")]
        input: Option<String>,
        /// Index directory holding a tf_idf.txt written by `build`
        #[arg(long)]
        index: Option<String>,
        /// Number of results to print
        #[arg(long, default_value_t = 10)]
        k: usize,
        /// Print results as JSON
        #[arg(long, default_value_t = false)]
        json: bool,
        #[command(flatten)]
        weighting: WeightingArgs,
    },
}

#[derive(Args)]
struct WeightingArgs {
    /// JSON engine config file
    #[arg(long)]
    config: Option<String>,
    /// Weighting scheme, overrides the config file
    #[arg(long, value_enum)]
    scheme: Option<SchemeArg>,
    /// BM25 term-frequency saturation
    #[arg(long)]
    k1: Option<f64>,
    /// BM25 length normalization, in [0, 1]
    #[arg(long)]
    b: Option<f64>,
    /// How repeated BM25 query terms count
    #[arg(long, value_enum)]
    query_terms: Option<PolicyArg>,
}

#[derive(Clone, Copy, ValueEnum)]
enum SchemeArg {
    Tfidf,
    Bm25,
}

#[derive(Clone, Copy, ValueEnum)]
enum PolicyArg {
    Set,
    Frequency,
}

impl WeightingArgs {
    fn resolve(&self) -> Result<EngineConfig> {
        let mut config = match &self.config {
            Some(path) => EngineConfig::load(path)?,
            None => EngineConfig::default(),
        };
        match self.scheme {
            Some(SchemeArg::Tfidf) => config.scheme = Scheme::TfIdf,
            Some(SchemeArg::Bm25) if config.scheme == Scheme::TfIdf => {
                config.scheme = Scheme::Bm25(Bm25Params::default())
            }
            _ => {}
        }
        let overrides = self.k1.is_some() || self.b.is_some() || self.query_terms.is_some();
        match &mut config.scheme {
            Scheme::Bm25(params) => {
                if let Some(k1) = self.k1 {
                    params.k1 = k1;
                }
                if let Some(b) = self.b {
                    params.b = b;
                }
                if let Some(policy) = self.query_terms {
                    params.query_terms = match policy {
                        PolicyArg::Set => QueryTermPolicy::Set,
                        PolicyArg::Frequency => QueryTermPolicy::Frequency,
                    };
                }
            }
            Scheme::TfIdf if overrides => bail!("--k1, --b and --query-terms only apply to --scheme bm25"),
            Scheme::TfIdf => {}
        }
        config.validate()?;
        Ok(config)
    }
}

fn main() -> Result<()> {
    fmt().with_env_filter(EnvFilter::from_default_env()).init();
    let cli = Cli::parse();

    match cli.command {
        Commands::Build { input, output, weighting } => build_index(&input, &output, &weighting.resolve()?),
        Commands::Search { query, input, index, k, json, weighting } => {
            let engine = Engine::new(&weighting.resolve()?)?;
            let snapshot = match (input, index) {
                (Some(input), _) => engine.fit_dir(&input)?,
                (None, Some(index)) => engine.fit_index(load_tfidf(&IndexPaths::new(&index))?)?,
                (None, None) => bail!("one of --input or --index is required"),
            };
            print_results(&snapshot, &query, k, json)
        }
    }
}

fn build_index(input: &str, output: &str, config: &EngineConfig) -> Result<()> {
    let engine = Engine::new(config)?;
    let snapshot = engine.fit_dir(input)?;
    if snapshot.stats().is_empty() {
        tracing::warn!(input, "no terms were indexed");
    }
    tracing::info!(
        num_docs = snapshot.stats().num_docs(),
        num_terms = snapshot.index().num_terms(),
        "ingested documents"
    );

    let created_at = time::OffsetDateTime::now_utc()
        .format(&time::format_description::well_known::Rfc3339)
        .unwrap_or_else(|_| "".into());
    let paths = IndexPaths::new(output);
    snapshot.save(&paths, created_at)?;

    tracing::info!(output, "index build complete");
    Ok(())
}

fn print_results(snapshot: &Snapshot, query: &str, k: usize, json: bool) -> Result<()> {
    let ranking = snapshot.search(query);
    let top = ranking.top(k);
    if json {
        println!("{}", serde_json::to_string_pretty(top)?);
    } else {
        for (rank, hit) in top.iter().enumerate() {
            println!("{:>3}. {:<32} {:.6}", rank + 1, hit.doc_id, hit.score);
        }
        if top.is_empty() {
            println!("no results");
        }
    }
    tracing::info!(query, total_hits = ranking.len(), "search complete");
    Ok(())
}
