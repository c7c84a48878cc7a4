mod application;
mod config;
mod infrastructure;
mod model;

use anyhow::Result;
use config::get_config;
use tracing_subscriber::{EnvFilter, FmtSubscriber};

use application::service::BulkLoaderService;
use infrastructure::mysql::MySqlOrderSink;
use model::{GenerationProfile, OrderGenerator};

fn setup_tracing(level: &str) -> Result<()> {
    let filter = EnvFilter::builder()
        .with_default_directive(level.parse()?)
        .from_env_lossy();

    FmtSubscriber::builder()
        .with_env_filter(filter)
        .with_target(false)
        .compact()
        .init();

    Ok(())
}

#[tokio::main]
async fn main() -> Result<()> {
    let config = get_config()?;
    setup_tracing(&config.logging.level)?;
    tracing::info!("Configuration loaded successfully");
    tracing::debug!(?config, "Full application configuration");

    let sink = match MySqlOrderSink::connect(&config.database).await {
        Ok(sink) => sink,
        Err(e) => {
            tracing::error!("Destination database is not usable: {:?}", e);
            std::process::exit(1);
        }
    };
    let pool = sink.pool();

    let profile = GenerationProfile {
        user_ids: config.loader.user_id_range.clone(),
        amounts: config.loader.amount_range.clone(),
        dates: config.loader.date_range.clone(),
    };
    let generator = match config.loader.seed {
        Some(seed) => OrderGenerator::seeded(profile, seed),
        None => OrderGenerator::new(profile),
    };

    let mut service = BulkLoaderService::new(
        generator,
        sink,
        config.loader.target_count,
        config.loader.batch_size,
    );

    let cancel = service.cancellation_token();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            tracing::warn!("Interrupt received, stopping after the current batch");
            cancel.cancel();
        }
    });

    tracing::info!(
        "Loading {} rows into `{}` in batches of {}",
        config.loader.target_count,
        config.database.table,
        config.loader.batch_size
    );

    let outcome = service.run().await;
    pool.close().await;

    match outcome {
        Ok(report) if report.cancelled => {
            tracing::warn!(
                "Run cancelled: {} rows committed in {} batches",
                report.rows_committed,
                report.batches
            );
            std::process::exit(1);
        }
        Ok(report) => {
            tracing::info!(
                "Bulk loading completed successfully: {} rows in {} batches",
                report.rows_committed,
                report.batches
            );
            Ok(())
        }
        Err(e) => {
            tracing::error!("Application finished with an error: {:?}", e);
            std::process::exit(1);
        }
    }
}
