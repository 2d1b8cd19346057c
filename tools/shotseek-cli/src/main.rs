//! Shotseek command-line tool
//!
//! Builds a shot index from a captioning CSV and runs ad-hoc queries
//! against it.

use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use shotseek::{
    BuildConfig, DEFAULT_SCORE_THRESHOLD, E5Embedder, IndexBuilder, RetrieverConfig,
    SceneRetriever, SearchHit,
};
use tracing::info;
use tracing_subscriber::EnvFilter;

const DEFAULT_MODEL_ID: &str = "intfloat/multilingual-e5-small";

/// Default model directory
fn default_model_dir() -> PathBuf {
    dirs::data_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join("shotseek")
        .join("models")
        .join("multilingual-e5-small")
}

/// CLI arguments
#[derive(Parser)]
#[command(name = "shotseek")]
#[command(about = "Natural-language search over movie shots")]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Directory holding config.json, tokenizer.json and model.safetensors
    #[arg(short, long, global = true, env = "SHOTSEEK_MODEL_DIR")]
    model_dir: Option<PathBuf>,

    /// Model identifier recorded in the build manifest
    #[arg(long, global = true, env = "SHOTSEEK_MODEL_ID", default_value = DEFAULT_MODEL_ID)]
    model_id: String,

    /// Artifact directory (index, metadata, manifest)
    #[arg(short, long, global = true, env = "SHOTSEEK_ARTIFACTS", default_value = "data/artifacts")]
    artifacts: PathBuf,
}

#[derive(Subcommand)]
enum Commands {
    /// Embed every shot of a CSV and write the index artifacts
    Build {
        /// Shot CSV produced by the captioning pipeline
        #[arg(short, long, env = "SHOTSEEK_CSV")]
        csv: PathBuf,

        /// Passages per forward pass
        #[arg(short, long, default_value_t = 32)]
        batch_size: usize,
    },
    /// Search the index with a free-text query
    Query {
        /// Query text
        text: String,

        /// Maximum number of hits
        #[arg(short = 'k', long, default_value_t = 5)]
        top_k: usize,

        /// Minimum similarity for a hit
        #[arg(short, long, default_value_t = DEFAULT_SCORE_THRESHOLD)]
        score_threshold: f32,

        /// Print hits as JSON
        #[arg(long)]
        json: bool,
    },
}

fn load_embedder(cli: &Cli) -> Result<E5Embedder> {
    let model_dir = cli.model_dir.clone().unwrap_or_else(default_model_dir);
    info!(dir = %model_dir.display(), model = %cli.model_id, "loading embedding model");
    E5Embedder::load(&model_dir, cli.model_id.clone())
        .with_context(|| format!("Failed to load model from {}", model_dir.display()))
}

fn print_hits(hits: &[SearchHit]) {
    if hits.is_empty() {
        println!("no matching shots");
        return;
    }
    for hit in hits {
        println!(
            "{:>2}. [{:.3}] {} @ {} ({:.1}s)  {}",
            hit.rank, hit.score, hit.shot_id, hit.start_time, hit.start_sec, hit.title
        );
        if !hit.characters.is_empty() {
            println!("      characters: {}", hit.characters);
        }
    }
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    let embedder = load_embedder(&cli)?;

    match &cli.command {
        Commands::Build { csv, batch_size } => {
            let config = BuildConfig::new(&cli.artifacts).with_batch_size(*batch_size);
            let builder = IndexBuilder::new(embedder, config).context("Invalid build settings")?;
            let report = builder
                .build_from_csv(csv)
                .with_context(|| format!("Failed to build index from {}", csv.display()))?;
            info!(
                rows = report.rows,
                dim = report.dim,
                degenerate = report.degenerate_rows.len(),
                "build complete"
            );
        }
        Commands::Query {
            text,
            top_k,
            score_threshold,
            json,
        } => {
            let config =
                RetrieverConfig::new(&cli.artifacts).with_score_threshold(*score_threshold);
            let retriever = SceneRetriever::open(embedder, config).with_context(|| {
                format!("Failed to load artifacts from {}", cli.artifacts.display())
            })?;
            let hits = retriever.search(text, *top_k).context("Search failed")?;
            if *json {
                println!("{}", serde_json::to_string_pretty(&hits)?);
            } else {
                print_hits(&hits);
            }
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use clap::CommandFactory;

    use super::*;

    #[test]
    fn cli_definition_is_consistent() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_default_model_dir() {
        let dir = default_model_dir();
        assert!(dir.to_string_lossy().contains("shotseek"));
        assert!(dir.ends_with("multilingual-e5-small"));
    }

    #[test]
    fn query_defaults() {
        let cli = Cli::try_parse_from(["shotseek", "query", "rainy alley"]).unwrap();
        match cli.command {
            Commands::Query {
                text,
                top_k,
                score_threshold,
                json,
            } => {
                assert_eq!(text, "rainy alley");
                assert_eq!(top_k, 5);
                assert_eq!(score_threshold, 0.842);
                assert!(!json);
            }
            Commands::Build { .. } => panic!("expected query"),
        }
        assert_eq!(cli.model_id, DEFAULT_MODEL_ID);
    }

    #[test]
    fn build_requires_csv() {
        // Skip when the environment already supplies one.
        if std::env::var_os("SHOTSEEK_CSV").is_some() {
            return;
        }
        assert!(Cli::try_parse_from(["shotseek", "build"]).is_err());

        let cli = Cli::try_parse_from([
            "shotseek", "build", "--csv", "shots.csv", "--batch-size", "8", "-a", "out",
        ])
        .unwrap();
        assert_eq!(cli.artifacts, PathBuf::from("out"));
        match cli.command {
            Commands::Build { csv, batch_size } => {
                assert_eq!(csv, PathBuf::from("shots.csv"));
                assert_eq!(batch_size, 8);
            }
            Commands::Query { .. } => panic!("expected build"),
        }
    }
}
