use anyhow::Result;
use chrono::Utc;

use okrsnap::snapshot;
use okrsnap::{Config, FileSink, SnapshotSink, TownsquareClient, TraversalEngine};

/// One scrape run: root snapshot -> depth-first traversal -> tabular
/// snapshot -> sink. No flags; configuration comes from config.toml and the
/// environment. Any unrecoverable failure propagates for a non-zero exit.
#[tokio::main]
async fn main() -> Result<()> {
    env_logger::Builder::from_env(
        env_logger::Env::default()
            .filter_or("RUST_LOG", "info")
    ).init();

    log::info!("Starting okrsnap v{}", env!("CARGO_PKG_VERSION"));

    let config = Config::load()?;
    log::info!("Configuration loaded successfully");
    log::info!("Base URL: {}", config.atlassian.base_url);
    log::info!("Output dir: {}", config.storage.output_dir.display());

    let cookies = config.cookies()?;
    let client = TownsquareClient::new(config.atlassian.clone(), cookies, &config.scrape)?;
    let engine = TraversalEngine::new(client).with_max_goals(config.scrape.max_goals);

    let started = std::time::Instant::now();
    let stamp = snapshot::capture_stamp(Utc::now());

    let outcome = engine.run().await?;

    let rendered = snapshot::render(&outcome.goals, &stamp);
    let filename = snapshot::snapshot_filename(&stamp);

    let sink = FileSink::new(&config.storage.output_dir);
    let location = sink.store(rendered.as_bytes(), &filename)?;

    log::info!("=== Run Complete ===");
    log::info!("Goals collected: {}", outcome.goals.len());
    log::info!("Goals failed: {}", outcome.failed.len());
    if !outcome.failed.is_empty() {
        log::warn!(
            "Failed keys: {}",
            outcome.failed.iter().cloned().collect::<Vec<_>>().join(", ")
        );
    }
    log::info!("Snapshot: {}", filename);
    log::info!("Location: {}", location);
    log::info!("Time: {:?}", started.elapsed());

    Ok(())
}
