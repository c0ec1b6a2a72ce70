//! Bulk-loads scraped movie metadata into the catalog.
//!
//! Input is the scraper's export: one Python-literal list of record dicts
//! per line. Unparseable lines and failed inserts are logged and skipped;
//! the batch always runs to completion.
//!
//! Usage: `load_movies <export-file>`

use std::fs::File;
use std::io::{BufRead, BufReader};

use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use cinerec_api::{config::Config, db, loader};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| "info".into()))
        .with(tracing_subscriber::fmt::layer())
        .init();

    let path = std::env::args()
        .nth(1)
        .ok_or_else(|| anyhow::anyhow!("usage: load_movies <export-file>"))?;

    let config = Config::from_env()?;
    let pool = db::create_pool(&config.database_url).await?;
    sqlx::migrate!("./migrations").run(&pool).await?;

    let file = File::open(&path)?;
    let reader = BufReader::new(file);

    let mut loaded: u64 = 0;
    let mut skipped: u64 = 0;

    for (line_no, line) in reader.lines().enumerate() {
        let line = line?;
        if line.trim().is_empty() {
            continue;
        }

        let records = loader::records_from_line(&line);
        if records.is_empty() {
            tracing::warn!(line = line_no + 1, "Line parsed to no records, skipping");
            skipped += 1;
            continue;
        }

        for record in &records {
            let Some(movie) = loader::movie_from_record(record) else {
                tracing::warn!(line = line_no + 1, "Record without a title, skipping");
                skipped += 1;
                continue;
            };

            match db::movies::upsert(&pool, &movie).await {
                Ok(()) => loaded += 1,
                Err(e) => {
                    tracing::warn!(
                        line = line_no + 1,
                        title = %movie.title,
                        error = %e,
                        "Insert failed, skipping record"
                    );
                    skipped += 1;
                }
            }
        }
    }

    tracing::info!(loaded, skipped, "Bulk load finished");
    Ok(())
}
