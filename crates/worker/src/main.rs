use adrotate_core::config::Settings;
use adrotate_db::PgRotationStore;
use anyhow::Result;
use std::sync::Arc;
use std::time::Duration;
use tracing::{error, info};

mod jobs;

#[derive(Clone)]
pub struct WorkerState {
    pub db: sqlx::PgPool,
    pub store: Arc<PgRotationStore>,
    pub lookahead_days: i64,
}

#[tokio::main]
async fn main() -> Result<()> {
    dotenvy::dotenv().ok();
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .json()
        .init();

    let settings = Settings::from_env()?;

    let db = adrotate_db::connect(&settings.database_url, settings.db_max_connections).await?;
    adrotate_db::migrate(&db).await?;

    let state = WorkerState {
        store: Arc::new(PgRotationStore::new(db.clone())),
        db,
        lookahead_days: settings.lookahead_days,
    };

    info!(
        interval_secs = settings.sweep_interval_secs,
        lookahead_days = settings.lookahead_days,
        "worker starting"
    );

    let mut ticker = tokio::time::interval(Duration::from_secs(settings.sweep_interval_secs.max(1)));
    loop {
        tokio::select! {
            _ = ticker.tick() => {
                let today = chrono::Utc::now().date_naive();
                if let Err(err) = jobs::sweep::run_sweep(&state, today).await {
                    error!(error = %err, "sweep failed");
                }
            }
            _ = tokio::signal::ctrl_c() => {
                info!("worker shutting down");
                break;
            }
        }
    }

    Ok(())
}
