//! CSV export of the cash-flow projection and material lines

use anyhow::{Context, Result};
use rust_decimal::Decimal;
use serde::Serialize;
use std::io::Write;
use std::path::Path;
use tracing::info;

use crate::engine::types::{CashFlowMonth, CostLine};

#[derive(Debug, Serialize)]
struct CashFlowRow<'a> {
    month: u32,
    label: &'a str,
    amount: Decimal,
    cumulative: Decimal,
}

#[derive(Debug, Serialize)]
struct MaterialRow {
    item: String,
    category: String,
    net_quantity: u64,
    billable_quantity: u64,
    unit: String,
    quality: String,
    specification: String,
    unit_price: Decimal,
    amount: Decimal,
}

impl From<&CostLine> for MaterialRow {
    fn from(line: &CostLine) -> Self {
        MaterialRow {
            item: line.item.to_string(),
            category: format!("{:?}", line.category).to_lowercase(),
            net_quantity: line.net_quantity,
            billable_quantity: line.billable_quantity,
            unit: line.unit.clone(),
            quality: line.quality.to_string(),
            specification: line.specification.clone(),
            unit_price: line.unit_price.final_price,
            amount: line.amount,
        }
    }
}

pub fn write_cashflow_csv<W: Write>(writer: W, months: &[CashFlowMonth]) -> Result<()> {
    let mut csv = csv::Writer::from_writer(writer);
    let mut cumulative = Decimal::ZERO;
    for month in months {
        cumulative += month.amount;
        csv.serialize(CashFlowRow {
            month: month.month,
            label: &month.label,
            amount: month.amount,
            cumulative,
        })?;
    }
    csv.flush()?;
    Ok(())
}

pub fn write_materials_csv<W: Write>(writer: W, lines: &[CostLine]) -> Result<()> {
    let mut csv = csv::Writer::from_writer(writer);
    for line in lines {
        csv.serialize(MaterialRow::from(line))?;
    }
    csv.flush()?;
    Ok(())
}

pub fn export_cashflow(path: &Path, months: &[CashFlowMonth]) -> Result<()> {
    let file = std::fs::File::create(path)
        .with_context(|| format!("Failed to create cash-flow export {:?}", path))?;
    write_cashflow_csv(file, months)?;
    info!("Wrote {} cash-flow months to {:?}", months.len(), path);
    Ok(())
}

pub fn export_materials(path: &Path, lines: &[CostLine]) -> Result<()> {
    let file = std::fs::File::create(path)
        .with_context(|| format!("Failed to create materials export {:?}", path))?;
    write_materials_csv(file, lines)?;
    info!("Wrote {} material lines to {:?}", lines.len(), path);
    Ok(())
}
