// 💾 Session Store - One saved tank in one key-value slot
// Document shape: { tankSize, stock: [{ id, quantity }], savedAt }.
// Every failure here degrades to "no persistence this time": reads fall
// back to no prior state, writes and clears are logged and dropped.

use crate::catalog::Catalog;
use crate::db::KeyValueStore;
use crate::ledger::{Ledger, StockEntry};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

// ============================================================================
// SAVED DOCUMENT
// ============================================================================

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SavedTank {
    pub tank_size: f64,
    pub stock: Vec<SavedEntry>,
    pub saved_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SavedEntry {
    pub id: String,
    pub quantity: u32,
}

impl SavedTank {
    pub fn from_ledger(ledger: &Ledger, saved_at: DateTime<Utc>) -> Self {
        SavedTank {
            tank_size: ledger.volume(),
            stock: ledger
                .entries()
                .iter()
                .map(|e| SavedEntry {
                    id: e.species_id.clone(),
                    quantity: e.quantity,
                })
                .collect(),
            saved_at,
        }
    }
}

/// Lenient read-side shape. Hand-edited or older documents may lack
/// `savedAt` or carry odd quantities; those are tolerated here and
/// filtered during restore.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct StoredTank {
    tank_size: Option<f64>,
    #[serde(default)]
    stock: Vec<StoredEntry>,
    saved_at: Option<DateTime<Utc>>,
}

#[derive(Debug, Deserialize)]
struct StoredEntry {
    id: String,
    quantity: i64,
}

// ============================================================================
// SESSION STORE
// ============================================================================

pub struct SessionStore<S: KeyValueStore> {
    backend: S,
    key: String,
}

impl<S: KeyValueStore> SessionStore<S> {
    pub fn new(backend: S, key: impl Into<String>) -> Self {
        SessionStore {
            backend,
            key: key.into(),
        }
    }

    pub fn key(&self) -> &str {
        &self.key
    }

    pub fn backend(&self) -> &S {
        &self.backend
    }

    /// Write the snapshot. Failures are logged, never returned.
    pub fn save(&self, ledger: &Ledger) {
        let document = SavedTank::from_ledger(ledger, Utc::now());

        let json = match serde_json::to_string(&document) {
            Ok(json) => json,
            Err(e) => {
                warn!(error = %e, "Failed to serialize tank snapshot");
                return;
            }
        };

        match self.backend.set(&self.key, &json) {
            Ok(()) => debug!(key = %self.key, revision = ledger.revision(), "Saved tank snapshot"),
            Err(e) => warn!(key = %self.key, error = %e, "Failed to save tank snapshot"),
        }
    }

    /// Read the slot and rebuild a ledger against `catalog`.
    /// `None` when the slot is empty, unreadable or malformed.
    pub fn load(&self, catalog: &Catalog, default_volume: f64) -> Option<Ledger> {
        let raw = match self.backend.get(&self.key) {
            Ok(Some(raw)) => raw,
            Ok(None) => {
                debug!(key = %self.key, "No saved tank");
                return None;
            }
            Err(e) => {
                warn!(key = %self.key, error = %e, "Failed to read saved tank");
                return None;
            }
        };

        let stored: StoredTank = match serde_json::from_str(&raw) {
            Ok(stored) => stored,
            Err(e) => {
                warn!(key = %self.key, error = %e, "Ignoring malformed saved tank");
                return None;
            }
        };

        let volume = stored
            .tank_size
            .filter(|v| v.is_finite() && *v > 0.0)
            .unwrap_or(default_volume);

        let saved_count = stored.stock.len();
        let entries: Vec<StockEntry> = stored
            .stock
            .into_iter()
            .filter(|e| e.quantity > 0 && catalog.contains(&e.id))
            .map(|e| StockEntry {
                species_id: e.id,
                quantity: u32::try_from(e.quantity).unwrap_or(u32::MAX),
            })
            .collect();

        if entries.len() < saved_count {
            debug!(
                dropped = saved_count - entries.len(),
                "Dropped saved entries with unknown species or empty quantity"
            );
        }

        let ledger = Ledger::restored(volume, entries);
        info!(
            saved_at = ?stored.saved_at,
            volume = ledger.volume(),
            species = ledger.entries().len(),
            "Tank restored from save"
        );
        Some(ledger)
    }

    /// Delete the slot. Failures are logged, never returned.
    pub fn clear(&self) {
        if let Err(e) = self.backend.remove(&self.key) {
            warn!(key = %self.key, error = %e, "Failed to clear saved tank");
        }
    }
}

// ============================================================================
// TESTS
// ============================================================================
