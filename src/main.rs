//! Estimate runner - prices a project file against a configuration snapshot

use anyhow::{bail, Context, Result};
use chrono::Utc;
use construction_cost::engine::export::{export_cashflow, export_materials};
use construction_cost::engine::{
    calculate_estimate, CalculationOptions, ConfigurationSnapshot, EstimateError, ProjectInput,
};
use construction_cost::history;
use sqlx::postgres::PgPoolOptions;
use std::env;
use std::path::{Path, PathBuf};
use tracing::{error, info, warn};
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with_target(false)
        .with_level(true)
        .init();

    dotenvy::dotenv().ok();
    let config = Config::from_env()?;
    let args: Vec<String> = env::args().skip(1).collect();

    // `estimate --recent N` lists stored calculations instead of pricing
    if let Some(limit) = recent_limit(&args)? {
        let Some(url) = &config.database_url else {
            bail!("--recent needs DATABASE_URL");
        };
        let db = PgPoolOptions::new()
            .max_connections(1)
            .connect(url)
            .await
            .context("Failed to connect to database")?;
        let rows = history::recent_calculations(&db, limit).await?;
        for row in &rows {
            println!("{}", row);
        }
        info!("Listed {} stored calculations", rows.len());
        return Ok(());
    }

    // Project file from the command line, falling back to the configured path
    let project_path = args
        .first()
        .map(PathBuf::from)
        .unwrap_or_else(|| config.project_path.clone());

    let snapshot = ConfigurationSnapshot::load(&config.snapshot_path)
        .with_context(|| format!("Failed to load snapshot {:?}", config.snapshot_path))?;
    let input = load_project(&project_path)?;

    let options =
        CalculationOptions::new(Utc::now()).with_contingency(config.include_contingency);

    let report = match calculate_estimate(&input, &snapshot, &options) {
        Ok(report) => report,
        Err(EstimateError::Validation(errors)) => {
            // Field errors go to stdout as JSON, same as a successful report
            println!("{}", serde_json::to_string_pretty(&errors)?);
            warn!("Project {:?} failed validation ({} problems)", project_path, errors.len());
            std::process::exit(2);
        }
        Err(e) => {
            error!("Estimate failed: {}", e);
            return Err(e.into());
        }
    };

    println!("{}", serde_json::to_string_pretty(&report)?);

    if let Some(path) = &config.cashflow_csv {
        export_cashflow(path, &report.cash_flow)?;
    }
    if let Some(path) = &config.materials_csv {
        export_materials(path, report.materials())?;
    }

    match &config.database_url {
        Some(url) => {
            let db = PgPoolOptions::new()
                .max_connections(1)
                .connect(url)
                .await
                .context("Failed to connect to database")?;
            let id = history::write_calculation(&db, &input, &report).await?;
            info!("Calculation saved as {}", id);
        }
        None => info!("DATABASE_URL not set, calculation not persisted"),
    }

    Ok(())
}

/// Parses `--recent N`; `None` means price a project as usual
fn recent_limit(args: &[String]) -> Result<Option<i64>> {
    match args {
        [flag, rest @ ..] if flag == "--recent" => {
            let limit: i64 = match rest.first() {
                Some(n) => n
                    .parse()
                    .with_context(|| format!("--recent expects a count, got {:?}", n))?,
                None => 10,
            };
            if limit <= 0 {
                bail!("--recent count must be positive");
            }
            Ok(Some(limit))
        }
        _ => Ok(None),
    }
}

fn load_project(path: &Path) -> Result<ProjectInput> {
    let json = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read project file {:?}", path))?;
    let input = serde_json::from_str(&json)
        .with_context(|| format!("Project file {:?} is not a valid project", path))?;
    Ok(input)
}

/// Configuration loaded from environment variables
#[derive(Debug, Clone)]
struct Config {
    snapshot_path: PathBuf,
    project_path: PathBuf,
    database_url: Option<String>,
    include_contingency: bool,
    cashflow_csv: Option<PathBuf>,
    materials_csv: Option<PathBuf>,
}

impl Config {
    fn from_env() -> Result<Self> {
        Ok(Config {
            snapshot_path: env::var("SNAPSHOT_PATH")
                .unwrap_or_else(|_| "config/snapshot.sample.json".to_string())
                .into(),

            project_path: env::var("PROJECT_PATH")
                .unwrap_or_else(|_| "config/project.sample.json".to_string())
                .into(),

            database_url: env::var("DATABASE_URL").ok().filter(|s| !s.is_empty()),

            include_contingency: env::var("INCLUDE_CONTINGENCY")
                .unwrap_or_else(|_| "false".to_string())
                .parse()
                .context("INCLUDE_CONTINGENCY must be true or false")?,

            cashflow_csv: env::var("CASHFLOW_CSV").ok().map(PathBuf::from),

            materials_csv: env::var("MATERIALS_CSV").ok().map(PathBuf::from),
        })
    }
}
