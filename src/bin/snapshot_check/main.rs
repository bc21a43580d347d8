//! Snapshot audit - checks configuration snapshots for integrity problems
//! before they are published to the engine

use anyhow::{bail, Result};
use construction_cost::engine::ConfigurationSnapshot;
use std::env;
use std::path::{Path, PathBuf};
use tracing::{error, info, warn};

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_target(false)
        .with_thread_ids(false)
        .with_level(true)
        .init();

    dotenvy::dotenv().ok();

    // Snapshot files from the command line, or the configured one
    let args: Vec<String> = env::args().collect();
    let paths: Vec<PathBuf> = if args.len() > 1 {
        args[1..].iter().map(PathBuf::from).collect()
    } else {
        vec![env::var("SNAPSHOT_PATH")
            .unwrap_or_else(|_| "config/snapshot.sample.json".to_string())
            .into()]
    };

    let mut failed = 0;
    for path in &paths {
        match audit(path) {
            Ok(0) => info!("✓ {:?} is clean", path),
            Ok(count) => {
                warn!("✗ {:?} has {} problems", path, count);
                failed += 1;
            }
            Err(e) => {
                error!("✗ {:?} could not be read: {:#}", path, e);
                failed += 1;
            }
        }
    }

    if failed > 0 {
        bail!("{} of {} snapshots failed the audit", failed, paths.len());
    }

    info!("All {} snapshots passed", paths.len());
    Ok(())
}

/// Returns the number of integrity problems found
fn audit(path: &Path) -> Result<usize> {
    let snapshot = ConfigurationSnapshot::load(path)?;
    let issues = snapshot.issues();

    for issue in &issues {
        warn!("{} {}", snapshot.version, issue);
    }

    Ok(issues.len())
}
