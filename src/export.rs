// 📤 Export - Tank configuration as JSON or a CSV stock sheet

use crate::catalog::Catalog;
use crate::ledger::Ledger;
use crate::species::Category;
use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::io::Write;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TankExport {
    pub tank_size: f64,
    pub stock: Vec<ExportedEntry>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExportedEntry {
    pub id: String,
    #[serde(rename = "type")]
    pub category: Category,
    pub quantity: u32,
}

/// One row of the stock sheet
#[derive(Debug, Serialize)]
struct StockRow<'a> {
    id: &'a str,
    name: &'a str,
    category: Category,
    quantity: u32,
    load: f64,
}

/// Ledger contents resolved against the catalog, in ledger order
pub fn export_config(ledger: &Ledger, catalog: &Catalog) -> TankExport {
    TankExport {
        tank_size: ledger.volume(),
        stock: ledger
            .resolve(catalog)
            .into_iter()
            .map(|item| ExportedEntry {
                id: item.species.id.clone(),
                category: item.species.category,
                quantity: item.quantity,
            })
            .collect(),
    }
}

impl TankExport {
    pub fn to_json_pretty(&self) -> Result<String> {
        serde_json::to_string_pretty(self).context("Failed to serialize tank export")
    }
}

/// Write `id,name,category,quantity,load` rows, one per stocked species
pub fn write_stock_csv<W: Write>(writer: W, ledger: &Ledger, catalog: &Catalog) -> Result<()> {
    let mut wtr = csv::Writer::from_writer(writer);

    for item in ledger.resolve(catalog) {
        wtr.serialize(StockRow {
            id: &item.species.id,
            name: &item.species.display_name,
            category: item.species.category,
            quantity: item.quantity,
            load: item.load(),
        })
        .with_context(|| format!("Failed to write CSV row for {}", item.species.id))?;
    }

    wtr.flush().context("Failed to flush CSV output")?;
    Ok(())
}

// ============================================================================
// TESTS
// ============================================================================
