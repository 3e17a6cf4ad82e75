use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Parser;
use festival_mind::config::Config;
use festival_mind::db::{RecordStore, SUBMISSIONS, SurrealStore, connect_db};
use festival_mind::festival::export;
use festival_mind::festival::models::Language;
use festival_mind::festival::normalize::normalize_submission;
use tracing_subscriber::EnvFilter;

/// Print the report document for one application; optionally write the
/// crew list as CSV.
#[derive(Debug, Parser)]
#[command(name = "festival-report", version)]
struct Args {
    /// Application document id
    application_id: String,

    /// Report language: en or th
    #[arg(long, default_value = "en")]
    lang: String,

    /// Write the crew-list CSV to this path
    #[arg(long)]
    csv: Option<PathBuf>,
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env().add_directive("warn".parse()?))
        .with_ansi(false)
        .init();

    let args = Args::parse();
    let lang = match args.lang.as_str() {
        "th" => Language::Th,
        _ => Language::En,
    };

    let cfg = Config::load()?;
    let db = connect_db(&cfg).await?;
    let store = SurrealStore::new(db);

    let raw = store
        .fetch_raw(SUBMISSIONS, &args.application_id)
        .await?
        .with_context(|| format!("application {} not found", args.application_id))?;
    let app = normalize_submission(&args.application_id, &raw);

    print!("{}", export::application_report(&app, lang));

    if let Some(path) = &args.csv {
        let csv = export::crew_csv(&app)?;
        std::fs::write(path, csv)
            .with_context(|| format!("failed to write {}", path.display()))?;
        eprintln!("crew list written to {}", path.display());
    }

    Ok(())
}
