// ⚙️ Configuration - Planner and rule settings
// Loaded from TOML; every key has a default so partial files are fine.
// The defaults are the stock husbandry rules.

use crate::compatibility::FindingKind;
use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;

// ============================================================================
// PLANNER CONFIG
// ============================================================================

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PlannerConfig {
    /// Volume of a fresh ledger
    pub default_volume: f64,

    /// Persistence slot key
    pub storage_key: String,

    pub rules: RuleConfig,
}

impl Default for PlannerConfig {
    fn default() -> Self {
        PlannerConfig {
            default_volume: 20.0,
            storage_key: "aquaplanner_tank".to_string(),
            rules: RuleConfig::default(),
        }
    }
}

impl PlannerConfig {
    /// Load from a TOML file
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let content = fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {:?}", path))?;

        PlannerConfig::from_toml_str(&content)
            .with_context(|| format!("Failed to parse config file: {:?}", path))
    }

    pub fn from_toml_str(content: &str) -> Result<Self> {
        let config: PlannerConfig = toml::from_str(content)?;
        Ok(config)
    }

    /// Save to a TOML file
    pub fn save<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let content = toml::to_string_pretty(self).context("Failed to serialize config")?;
        fs::write(path.as_ref(), content)
            .with_context(|| format!("Failed to write config file: {:?}", path.as_ref()))
    }
}

// ============================================================================
// RULE CONFIG
// ============================================================================

/// Thresholds and fixed id sets used by the compatibility rules
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RuleConfig {
    /// Unit names used in finding descriptions
    pub volume_unit: String,
    pub temperature_unit: String,

    /// Load capacity per unit of volume
    pub load_factor: f64,

    /// Load percentage above which a warning is raised
    pub load_warning_percent: f64,

    /// Load percentage above which the load is critical
    pub load_critical_percent: f64,

    /// Minimum shared temperature band, in degrees
    pub temp_overlap_min: f64,

    /// Minimum shared pH band
    pub ph_overlap_min: f64,

    /// Adults smaller than this are prey for predatory species
    pub prey_max_size: f64,

    /// Fish at least this large are a risk to listed shrimp
    pub shrimp_risk_min_size: f64,

    /// Species with tempMax at or below this are coldwater
    pub coldwater_temp_max: f64,

    /// Species with tempMin at or above this are tropical
    pub tropical_temp_min: f64,

    /// Targets for fin nippers
    pub long_fin_ids: Vec<String>,

    /// Always coldwater, regardless of water parameters
    pub coldwater_ids: Vec<String>,

    /// Fish exempt from the shrimp-safety sweep
    pub shrimp_safe_ids: Vec<String>,

    /// Finding kinds that are never emitted
    pub disabled: Vec<FindingKind>,
}

impl Default for RuleConfig {
    fn default() -> Self {
        RuleConfig {
            volume_unit: "gallons".to_string(),
            temperature_unit: "°F".to_string(),
            load_factor: 1.5,
            load_warning_percent: 70.0,
            load_critical_percent: 100.0,
            temp_overlap_min: 3.0,
            ph_overlap_min: 0.3,
            prey_max_size: 2.0,
            shrimp_risk_min_size: 3.0,
            coldwater_temp_max: 76.0,
            tropical_temp_min: 75.0,
            long_fin_ids: to_strings(&["betta", "guppy", "angelfish", "fancy-goldfish"]),
            coldwater_ids: to_strings(&["fancy-goldfish", "common-goldfish", "zebra-danio"]),
            shrimp_safe_ids: to_strings(&["otocinclus", "bristlenose-pleco", "clown-pleco"]),
            disabled: Vec::new(),
        }
    }
}

impl RuleConfig {
    pub fn is_enabled(&self, kind: FindingKind) -> bool {
        !self.disabled.contains(&kind)
    }

    pub fn is_long_finned(&self, id: &str) -> bool {
        self.long_fin_ids.iter().any(|x| x == id)
    }

    pub fn is_listed_coldwater(&self, id: &str) -> bool {
        self.coldwater_ids.iter().any(|x| x == id)
    }

    pub fn is_shrimp_safe(&self, id: &str) -> bool {
        self.shrimp_safe_ids.iter().any(|x| x == id)
    }
}

fn to_strings(ids: &[&str]) -> Vec<String> {
    ids.iter().map(|s| s.to_string()).collect()
}

// ============================================================================
// TESTS
// ============================================================================
