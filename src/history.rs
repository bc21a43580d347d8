//! Calculation history - persist (input, report) pairs for audit and retrieval

use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use sqlx::types::Json;
use sqlx::PgPool;
use tracing::{debug, info};
use uuid::Uuid;

use crate::engine::{EstimateReport, ProjectInput};

/// A stored calculation as read back from the database
#[derive(Debug, sqlx::FromRow)]
pub struct CalculationRow {
    pub id: Uuid,
    pub snapshot_version: String,
    pub total_cost: Decimal,
    pub confidence_score: i16,
    pub input: Json<ProjectInput>,
    pub report: Json<EstimateReport>,
    pub created_at: DateTime<Utc>,
}

/// Listing entry without the JSON payloads
#[derive(Debug, Clone, PartialEq, sqlx::FromRow)]
pub struct CalculationSummary {
    pub id: Uuid,
    pub snapshot_version: String,
    pub total_cost: Decimal,
    pub confidence_score: i16,
    pub created_at: DateTime<Utc>,
}

impl std::fmt::Display for CalculationSummary {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "{} total={} confidence={} snapshot={} at {}",
            self.id, self.total_cost, self.confidence_score, self.snapshot_version, self.created_at
        )
    }
}

impl CalculationRow {
    pub fn summary(&self) -> CalculationSummary {
        CalculationSummary {
            id: self.id,
            snapshot_version: self.snapshot_version.clone(),
            total_cost: self.total_cost,
            confidence_score: self.confidence_score,
            created_at: self.created_at,
        }
    }
}

/// Store an input and the report it produced; returns the new record id
pub async fn write_calculation(
    db: &PgPool,
    input: &ProjectInput,
    report: &EstimateReport,
) -> Result<Uuid> {
    let id = Uuid::new_v4();

    sqlx::query(
        r#"
        INSERT INTO calculation_history (
            id, snapshot_version, total_cost, confidence_score,
            input, report, created_at
        )
        VALUES ($1, $2, $3, $4, $5, $6, $7)
        "#,
    )
    .bind(id)
    .bind(&report.snapshot_version)
    .bind(report.total_cost)
    .bind(i16::from(report.confidence.score))
    .bind(Json(input))
    .bind(Json(report))
    .bind(report.calculated_at)
    .execute(db)
    .await
    .context("Failed to insert calculation history")?;

    info!(
        "Stored calculation {} (total {}, snapshot {})",
        id, report.total_cost, report.snapshot_version
    );

    Ok(id)
}

pub async fn fetch_calculation(db: &PgPool, id: Uuid) -> Result<Option<CalculationRow>> {
    let row = sqlx::query_as::<_, CalculationRow>(
        "SELECT id, snapshot_version, total_cost, confidence_score, input, report, created_at \
         FROM calculation_history WHERE id = $1",
    )
    .bind(id)
    .fetch_optional(db)
    .await
    .with_context(|| format!("Failed to fetch calculation {}", id))?;

    debug!("Fetched calculation {}: found={}", id, row.is_some());
    Ok(row)
}

/// Most recent calculations first
pub async fn recent_calculations(db: &PgPool, limit: i64) -> Result<Vec<CalculationSummary>> {
    let rows = sqlx::query_as::<_, CalculationSummary>(
        "SELECT id, snapshot_version, total_cost, confidence_score, created_at \
         FROM calculation_history ORDER BY created_at DESC LIMIT $1",
    )
    .bind(limit)
    .fetch_all(db)
    .await
    .context("Failed to list calculation history")?;

    Ok(rows)
}
