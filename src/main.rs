use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use clap::{ArgAction, Parser, Subcommand};
use originality::{
    Artifact, ArtifactFingerprints, CorpusSnapshot, Extractor, InMemoryCorpus, OriginalityConfig,
    SourceUnit, fingerprint, generate_report, normalize_detailed,
};
use serde::Serialize;
use tracing::info;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "originality")]
#[command(version)]
#[command(about = "Fingerprint authored work and check it against an archived corpus", long_about = None)]
struct Cli {
    /// YAML pipeline configuration; stage defaults when omitted.
    #[arg(short, long, value_name = "FILE", global = true)]
    config: Option<PathBuf>,

    #[arg(short, long, action = ArgAction::SetTrue, global = true)]
    verbose: bool,

    /// Emit logs as JSON lines on stderr.
    #[arg(long, action = ArgAction::SetTrue, global = true)]
    json_logs: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Print the canonical form of a source file and its placeholder table.
    Normalize {
        file: PathBuf,
        #[arg(short, long)]
        lang: String,
    },

    /// Print the winnowed fingerprint of a source file.
    Fingerprint {
        file: PathBuf,
        #[arg(short, long)]
        lang: String,
    },

    /// Extract the fingerprint blobs of an artifact JSON file.
    Extract {
        artifact: PathBuf,
    },

    /// Compare an artifact against a corpus snapshot.
    Report {
        /// Artifact JSON, or fingerprints previously written by `extract`.
        artifact: PathBuf,
        #[arg(long, value_name = "FILE")]
        corpus: PathBuf,
        /// Write the corpus with this artifact archived to FILE.
        #[arg(long, value_name = "FILE")]
        archive_to: Option<PathBuf>,
    },
}

fn init_logger(verbose: bool, json: bool) {
    let default_level = if verbose { "debug" } else { "info" };
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));

    let builder = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr);
    if json {
        builder.json().init();
    } else {
        builder.compact().init();
    }
}

fn read(path: &Path) -> Result<String> {
    fs::read_to_string(path).with_context(|| format!("failed to read {}", path.display()))
}

fn print_json<T: Serialize>(value: &T) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

/// Accepts either an [`Artifact`] or already extracted fingerprints.
fn load_fingerprints(path: &Path, extractor: &Extractor) -> Result<(ArtifactFingerprints, String)> {
    let raw = read(path)?;
    if let Ok(fingerprints) = serde_json::from_str::<ArtifactFingerprints>(&raw) {
        let title = fingerprints.artifact_id.clone();
        return Ok((fingerprints, title));
    }
    let artifact: Artifact = serde_json::from_str(&raw)
        .with_context(|| format!("{} is neither an artifact nor fingerprints", path.display()))?;
    let fingerprints = extractor.extract(&artifact)?;
    Ok((fingerprints, artifact.title))
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    init_logger(cli.verbose, cli.json_logs);

    let config = match &cli.config {
        Some(path) => OriginalityConfig::from_file(path)
            .with_context(|| format!("failed to load config {}", path.display()))?,
        None => OriginalityConfig::default(),
    };

    match cli.command {
        Commands::Normalize { file, lang } => {
            let source = SourceUnit::new(read(&file)?, lang);
            let normalized = normalize_detailed(&source, &config.to_normalizer_config()?)?;
            print_json(&normalized)?;
        }
        Commands::Fingerprint { file, lang } => {
            let source = SourceUnit::new(read(&file)?, lang);
            let canonical = normalize_detailed(&source, &config.to_normalizer_config()?)?.text;
            let fp = fingerprint(canonical.as_str(), &config.to_perceptual_config())?;
            print_json(&fp)?;
        }
        Commands::Extract { artifact } => {
            let extractor = Extractor::from_config(&config)?;
            let artifact: Artifact = serde_json::from_str(&read(&artifact)?)
                .context("failed to parse artifact JSON")?;
            print_json(&extractor.extract(&artifact)?)?;
        }
        Commands::Report {
            artifact,
            corpus,
            archive_to,
        } => {
            let extractor = Extractor::from_config(&config)?;
            let (fingerprints, title) = load_fingerprints(&artifact, &extractor)?;
            let snapshot = CorpusSnapshot::from_json(&read(&corpus)?)?;
            let corpus = InMemoryCorpus::from_snapshot(snapshot)?;
            info!(artifacts = corpus.len(), "loaded corpus");

            let report = generate_report(&fingerprints, &corpus, &config.to_report_config())?;
            print_json(&report)?;

            if let Some(path) = archive_to {
                corpus.archive(&fingerprints, &title)?;
                fs::write(&path, corpus.snapshot()?.to_json()?)
                    .with_context(|| format!("failed to write {}", path.display()))?;
                info!(path = %path.display(), "archived artifact");
            }
        }
    }

    Ok(())
}
