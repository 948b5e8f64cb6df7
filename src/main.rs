mod cli;

use std::sync::Arc;

use clap::Parser;
use tracing_subscriber::EnvFilter;

use resonance::audio::SymphoniaDecoder;
use resonance::config::Config;
use resonance::identify::Identifier;
use resonance::ingest::Ingestor;
use resonance::store::{FingerprintStore, InMemoryStore, PgStore};
use resonance::types::RecordingMetadata;

use cli::{Cli, Command};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let cli = Cli::parse();
    let config = Config::from_env();

    let store: Arc<dyn FingerprintStore> = match &config.database_url {
        Some(url) => Arc::new(PgStore::connect(url)?),
        None => Arc::new(InMemoryStore::new()),
    };

    match cli.command {
        Command::Add { path, title, artist, album } => {
            let ingestor = Ingestor::new(store.clone(), SymphoniaDecoder::new(), &config);
            let metadata = RecordingMetadata {
                title,
                artist,
                album,
                duration_secs: None,
                source_ref: path.display().to_string(),
            };
            let recording_id = ingestor.add(metadata, &path).await?;
            println!("added recording {recording_id}");
        }
        Command::Identify { path } => {
            let identifier = Identifier::new(store.clone(), SymphoniaDecoder::new(), &config);
            match identifier.identify(&path).await? {
                Some(result) => println!(
                    "recording {} (confidence {:.3}, {} aligned matches, {} ms)",
                    result.recording_id, result.confidence, result.aligned_matches, result.processing_time_ms
                ),
                None => println!("no match"),
            }
        }
        Command::Delete { recording_id } => {
            store.delete(recording_id)?;
            println!("deleted recording {recording_id}");
        }
        Command::Stats => {
            let stats = store.stats()?;
            println!("{stats:#?}");
        }
    }

    Ok(())
}
