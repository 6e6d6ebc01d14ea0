// Aqua Planner - Core Library
// Stocking evaluation engine: species catalog, stock ledger, compatibility
// rules and the persisted session. Exposed for the CLI and for tests.

pub mod species;       // Species records and husbandry flags
pub mod schema;        // Catalog validation
pub mod error;
pub mod catalog;       // Read-only species registry
pub mod config;        // Planner + rule settings (TOML)
pub mod ledger;        // Stock snapshots and load metrics
pub mod rules;         // Compatibility rule units
pub mod compatibility; // Ranked, deduplicated findings
pub mod db;            // Key-value backends (SQLite, memory)
pub mod store;         // Saved-tank slot
pub mod session;       // Live tank, persistence + notification
pub mod care;          // Care plan recommendations
pub mod export;        // JSON / CSV export

// Re-export commonly used types
pub use species::{
    Behavior, CareLevel, Category, Diet, Position, SpeciesRecord, Temperament, WaterParams,
};
pub use schema::{validate_catalog, validate_species, ValidationError, ValidationResult};
pub use error::{CatalogError, SessionError};
pub use catalog::Catalog;
pub use config::{PlannerConfig, RuleConfig};
pub use ledger::{Ledger, LoadStatus, StockEntry, StockedSpecies};
pub use rules::{CompatibilityRule, RuleCheck, RuleContext, RuleEngine};
pub use compatibility::{
    evaluate, findings_for, has_error_for, summarize, CompatibilityChecker, Finding,
    FindingKind, FindingSubject, Severity,
};
pub use db::{KeyValueStore, MemoryStore, SqliteStore};
pub use store::{SavedEntry, SavedTank, SessionStore};
pub use session::{Listener, Session, Subscription};
pub use care::{care_plan, CarePlan, Feeding, Flow, WaterChange, Window};
pub use export::{export_config, write_stock_csv, ExportedEntry, TankExport};

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
