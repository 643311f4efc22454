//! Field Archive - Database Status Binary
//!
//! Connects to the archive database and reports whether it answers, how many
//! recordings it holds, and the first few locations.
//!
//! # Usage
//!
//! ```bash
//! ARCHIVE_DATABASE_URL=postgres://... cargo run --bin archive-status
//! ```
//!
//! # Environment Variables
//!
//! * `ARCHIVE_DATABASE_URL` - PostgreSQL connection string
//! * `ARCHIVE_MAX_CONNECTIONS` - Pool size (default: 10)
//! * `ARCHIVE_CONNECT_TIMEOUT_SECS` - Connection wait in seconds (default: 30)
//! * `ARCHIVE_LOG_LEVEL` - Log level: trace, debug, info, warn, error (default: info)

use std::sync::Arc;
use std::time::Duration;

use anyhow::Context;
use archive_kernel::RequestContext;
use infra_db::{
    ArchiveConfig, LocationRepository, PgDatabase, RecordingRepository, SqlLocationRepository,
    SqlRecordingRepository,
};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

const LOCATION_PREVIEW: i32 = 5;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load .env file if present (useful for local development)
    dotenvy::dotenv().ok();

    let config = ArchiveConfig::from_env().context("invalid ARCHIVE_* configuration")?;
    init_tracing(&config.log_level);

    let db = Arc::new(
        PgDatabase::connect(config.database())
            .await
            .context("unable to open the archive database")?,
    );

    let ctx = RequestContext::new().with_timeout(Duration::from_secs(10));
    db.ping(&ctx).await.context("database did not answer")?;
    tracing::info!("Database reachable");

    let recordings = SqlRecordingRepository::new(db.clone());
    let locations = SqlLocationRepository::new(db.clone());

    let count = recordings.count(&ctx).await?;
    tracing::info!(count, "Recordings in archive");

    for location in locations.list(&ctx, LOCATION_PREVIEW).await? {
        match location.point() {
            Some(point) => tracing::info!(
                id = location.id,
                name = %location.name,
                longitude = point.longitude,
                latitude = point.latitude,
                "Location"
            ),
            None => tracing::warn!(id = location.id, name = %location.name, "Location without a readable point"),
        }
    }

    db.close().await;
    Ok(())
}

/// Initializes the tracing subscriber for structured logging.
///
/// # Arguments
///
/// * `log_level` - The minimum log level to output (trace, debug, info, warn, error)
fn init_tracing(log_level: &str) {
    let filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(log_level))
        .unwrap_or_else(|_| EnvFilter::new("info"));

    tracing_subscriber::registry()
        .with(filter)
        .with(tracing_subscriber::fmt::layer().with_target(true))
        .init();
}
