// ✅ Compatibility Evaluator - Ranked, deduplicated findings
// Pure function of (stocked species, volume): runs the rule units,
// stable-sorts by severity and drops repeated (kind, description) pairs.
//
// Findings are produced fresh on every call and never persisted.

use crate::config::RuleConfig;
use crate::ledger::StockedSpecies;
use crate::rules::{RuleContext, RuleEngine};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;

// ============================================================================
// SEVERITY
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    Error,   // Do not keep these together / in this tank
    Warning, // Risky, needs attention
    Info,    // Advice
}

impl Severity {
    /// Sort rank: error first
    pub fn rank(&self) -> u8 {
        match self {
            Severity::Error => 0,
            Severity::Warning => 1,
            Severity::Info => 2,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Severity::Error => "error",
            Severity::Warning => "warning",
            Severity::Info => "info",
        }
    }
}

// ============================================================================
// FINDING KIND
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FindingKind {
    BioloadCritical,
    BioloadWarning,
    TankTooSmall,
    SchoolingMin,
    SameSpeciesAggression,
    Incompatible,
    TempMismatch,
    PhMismatch,
    FinNipper,
    PredatorPrey,
    SnailEater,
    ColdwaterTropicalMix,
    TerritorialConflict,
    ShrimpUnsafe,
}

impl FindingKind {
    pub const ALL: [FindingKind; 14] = [
        FindingKind::BioloadCritical,
        FindingKind::BioloadWarning,
        FindingKind::TankTooSmall,
        FindingKind::SchoolingMin,
        FindingKind::SameSpeciesAggression,
        FindingKind::Incompatible,
        FindingKind::TempMismatch,
        FindingKind::PhMismatch,
        FindingKind::FinNipper,
        FindingKind::PredatorPrey,
        FindingKind::SnailEater,
        FindingKind::ColdwaterTropicalMix,
        FindingKind::TerritorialConflict,
        FindingKind::ShrimpUnsafe,
    ];

    pub fn severity(&self) -> Severity {
        match self {
            FindingKind::BioloadCritical
            | FindingKind::TankTooSmall
            | FindingKind::SameSpeciesAggression
            | FindingKind::Incompatible
            | FindingKind::PredatorPrey
            | FindingKind::ColdwaterTropicalMix
            | FindingKind::TerritorialConflict => Severity::Error,

            FindingKind::BioloadWarning
            | FindingKind::TempMismatch
            | FindingKind::PhMismatch
            | FindingKind::FinNipper
            | FindingKind::SnailEater
            | FindingKind::ShrimpUnsafe => Severity::Warning,

            FindingKind::SchoolingMin => Severity::Info,
        }
    }

    pub fn title(&self) -> &'static str {
        match self {
            FindingKind::BioloadCritical => "Critical Bioload",
            FindingKind::BioloadWarning => "High Bioload",
            FindingKind::TankTooSmall => "Tank Too Small",
            FindingKind::SchoolingMin => "Schooling Requirement",
            FindingKind::SameSpeciesAggression => "Same Species Aggression",
            FindingKind::Incompatible => "Incompatible Species",
            FindingKind::TempMismatch => "Temperature Mismatch",
            FindingKind::PhMismatch => "pH Mismatch",
            FindingKind::FinNipper => "Fin Nipping Risk",
            FindingKind::PredatorPrey => "Predator-Prey Risk",
            FindingKind::SnailEater => "Snail-Eating Fish",
            FindingKind::ColdwaterTropicalMix => "Cold/Tropical Mix",
            FindingKind::TerritorialConflict => "Territorial Conflict",
            FindingKind::ShrimpUnsafe => "Shrimp at Risk",
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            FindingKind::BioloadCritical => "bioload_critical",
            FindingKind::BioloadWarning => "bioload_warning",
            FindingKind::TankTooSmall => "tank_too_small",
            FindingKind::SchoolingMin => "schooling_min",
            FindingKind::SameSpeciesAggression => "same_species_aggression",
            FindingKind::Incompatible => "incompatible",
            FindingKind::TempMismatch => "temp_mismatch",
            FindingKind::PhMismatch => "ph_mismatch",
            FindingKind::FinNipper => "fin_nipper",
            FindingKind::PredatorPrey => "predator_prey",
            FindingKind::SnailEater => "snail_eater",
            FindingKind::ColdwaterTropicalMix => "coldwater_tropical_mix",
            FindingKind::TerritorialConflict => "territorial_conflict",
            FindingKind::ShrimpUnsafe => "shrimp_unsafe",
        }
    }
}

// ============================================================================
// FINDING
// ============================================================================

/// What a finding is about
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase", tag = "scope", content = "ids")]
pub enum FindingSubject {
    /// The tank as a whole (load)
    Tank,
    Species(String),
    Pair(String, String),
}

impl FindingSubject {
    pub fn pair(a: &str, b: &str) -> Self {
        FindingSubject::Pair(a.to_string(), b.to_string())
    }

    pub fn involves(&self, id: &str) -> bool {
        match self {
            FindingSubject::Tank => false,
            FindingSubject::Species(s) => s == id,
            FindingSubject::Pair(a, b) => a == id || b == id,
        }
    }

    /// True when this is a pair naming both ids, in either order
    pub fn is_pair_of(&self, x: &str, y: &str) -> bool {
        match self {
            FindingSubject::Pair(a, b) => (a == x && b == y) || (a == y && b == x),
            _ => false,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Finding {
    pub kind: FindingKind,
    pub severity: Severity,
    pub title: String,
    pub description: String,
    pub subject: FindingSubject,
}

impl Finding {
    /// Severity and title follow from the kind
    pub fn new(kind: FindingKind, description: String, subject: FindingSubject) -> Self {
        Finding {
            kind,
            severity: kind.severity(),
            title: kind.title().to_string(),
            description,
            subject,
        }
    }

    pub fn involves(&self, species_id: &str) -> bool {
        self.subject.involves(species_id)
    }
}

/// Findings naming a species, alone or in a pair
pub fn findings_for<'a>(findings: &'a [Finding], species_id: &str) -> Vec<&'a Finding> {
    findings.iter().filter(|f| f.involves(species_id)).collect()
}

/// True when an error-severity finding names this species
pub fn has_error_for(findings: &[Finding], species_id: &str) -> bool {
    findings
        .iter()
        .any(|f| f.severity == Severity::Error && f.involves(species_id))
}

/// "3 finding(s) (1 error, 1 warning, 1 info)"
pub fn summarize(findings: &[Finding]) -> String {
    let count = |severity: Severity| findings.iter().filter(|f| f.severity == severity).count();

    format!(
        "{} finding(s) ({} error, {} warning, {} info)",
        findings.len(),
        count(Severity::Error),
        count(Severity::Warning),
        count(Severity::Info)
    )
}

// ============================================================================
// EVALUATOR
// ============================================================================

/// Stable sort by severity rank, then keep the first finding for each
/// (kind, description). Ties keep their emission order.
pub fn rank_and_dedup(mut findings: Vec<Finding>) -> Vec<Finding> {
    findings.sort_by_key(|f| f.severity.rank());

    let mut seen: HashSet<(FindingKind, String)> = HashSet::new();
    findings.retain(|f| seen.insert((f.kind, f.description.clone())));
    findings
}

pub struct CompatibilityChecker {
    config: RuleConfig,
    engine: RuleEngine,
}

impl CompatibilityChecker {
    /// Standard rule set with default thresholds
    pub fn new() -> Self {
        CompatibilityChecker::with_config(RuleConfig::default())
    }

    pub fn with_config(config: RuleConfig) -> Self {
        CompatibilityChecker {
            config,
            engine: RuleEngine::standard(),
        }
    }

    /// Use a custom rule engine (extra or fewer rule units)
    pub fn with_engine(config: RuleConfig, engine: RuleEngine) -> Self {
        CompatibilityChecker { config, engine }
    }

    pub fn config(&self) -> &RuleConfig {
        &self.config
    }

    /// Evaluate the stock. Empty stock produces no findings at all.
    pub fn check(&self, stock: &[StockedSpecies<'_>], volume: f64) -> Vec<Finding> {
        if stock.is_empty() {
            return Vec::new();
        }

        let ctx = RuleContext {
            stock,
            volume,
            config: &self.config,
        };

        rank_and_dedup(self.engine.run(&ctx))
    }
}

impl Default for CompatibilityChecker {
    fn default() -> Self {
        Self::new()
    }
}

/// Evaluate with the standard rules and default thresholds
pub fn evaluate(stock: &[StockedSpecies<'_>], volume: f64) -> Vec<Finding> {
    CompatibilityChecker::new().check(stock, volume)
}

// ============================================================================
// TESTS
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::species::{Category, SpeciesRecord, WaterParams};

    fn fish(id: &str, name: &str) -> SpeciesRecord {
        let mut s = SpeciesRecord::new(id, name, Category::Fish);
        s.adult_size = 2.5;
        s.load_weight = 1.0;
        s
    }

    fn kinds(findings: &[Finding]) -> Vec<FindingKind> {
        findings.iter().map(|f| f.kind).collect()
    }

    fn assert_severity_ordered(findings: &[Finding]) {
        for pair in findings.windows(2) {
            assert!(
                pair[0].severity.rank() <= pair[1].severity.rank(),
                "{:?} listed before {:?}",
                pair[0].kind,
                pair[1].kind
            );
        }
    }

    #[test]
    fn test_empty_stock_has_no_findings() {
        assert!(evaluate(&[], 1.0).is_empty());
    }

    #[test]
    fn test_tank_too_small_only() {
        let mut oscar = fish("oscar", "Oscar");
        oscar.min_volume = 20.0;
        let stock = [StockedSpecies::new(&oscar, 1)];

        let findings = evaluate(&stock, 10.0);

        assert_eq!(kinds(&findings), vec![FindingKind::TankTooSmall]);
        assert_eq!(findings[0].severity, Severity::Error);
        assert_eq!(
            findings[0].description,
            "Oscar requires at least 20 gallons. Current tank is 10 gallons."
        );
        assert_eq!(findings[0].subject, FindingSubject::Species("oscar".into()));
    }

    #[test]
    fn test_bioload_critical_excludes_warning() {
        let mut pleco = fish("common-pleco", "Common Pleco");
        pleco.load_weight = 9.0;
        let stock = [StockedSpecies::new(&pleco, 2)];

        // 18 / 15 = 120%
        let findings = evaluate(&stock, 10.0);

        assert_eq!(kinds(&findings), vec![FindingKind::BioloadCritical]);
        assert_eq!(
            findings[0].description,
            "Bioload is at 120%. This is dangerous for fish health and water quality."
        );
    }

    #[test]
    fn test_schooling_info_only() {
        let mut neon = fish("neon-tetra", "Neon Tetra");
        neon.load_weight = 0.5;
        neon.behavior.schooling = true;
        neon.behavior.min_school = Some(6);

        let few = evaluate(&[StockedSpecies::new(&neon, 3)], 20.0);
        assert_eq!(kinds(&few), vec![FindingKind::SchoolingMin]);
        assert_eq!(few[0].severity, Severity::Info);

        let enough = evaluate(&[StockedSpecies::new(&neon, 6)], 20.0);
        assert!(enough.is_empty());
    }

    #[test]
    fn test_severity_ordering_and_stability() {
        let mut neon = fish("neon-tetra", "Neon Tetra");
        neon.behavior.schooling = true;
        neon.behavior.min_school = Some(6);
        // tempMax 76 makes it coldwater
        neon.water_params = Some(WaterParams::new(70.0, 76.0, 6.0, 7.0));

        let mut discus = fish("discus", "Discus");
        discus.min_volume = 50.0;
        discus.water_params = Some(WaterParams::new(82.0, 88.0, 6.0, 7.0));

        let mut betta = fish("betta", "Betta");
        betta.min_volume = 50.0;
        betta.behavior.solitary_aggression = true;

        let stock = [
            StockedSpecies::new(&neon, 2),
            StockedSpecies::new(&discus, 1),
            StockedSpecies::new(&betta, 2),
        ];
        let findings = evaluate(&stock, 20.0);

        assert_severity_ordered(&findings);
        // Errors keep emission order: discus size, betta size, betta aggression
        assert_eq!(
            kinds(&findings),
            vec![
                FindingKind::TankTooSmall,
                FindingKind::TankTooSmall,
                FindingKind::SameSpeciesAggression,
                FindingKind::ColdwaterTropicalMix,
                FindingKind::TempMismatch,
                FindingKind::SchoolingMin,
            ]
        );
        assert!(findings[0].involves("discus"));
        assert!(findings[1].involves("betta"));
    }

    #[test]
    fn test_evaluate_is_idempotent() {
        let mut a = fish("tiger-barb", "Tiger Barb");
        a.behavior.fin_nipper = true;
        let b = fish("betta", "Betta");
        let stock = [StockedSpecies::new(&a, 6), StockedSpecies::new(&b, 1)];

        assert_eq!(evaluate(&stock, 20.0), evaluate(&stock, 20.0));
    }

    #[test]
    fn test_dedup_keeps_first_occurrence() {
        let first = Finding::new(
            FindingKind::Incompatible,
            "A and B are not compatible together.".to_string(),
            FindingSubject::pair("a", "b"),
        );
        let mut second = first.clone();
        second.subject = FindingSubject::pair("b", "a");
        let info = Finding::new(
            FindingKind::SchoolingMin,
            "x".to_string(),
            FindingSubject::Species("a".into()),
        );

        let ranked = rank_and_dedup(vec![info.clone(), first.clone(), second]);

        assert_eq!(ranked, vec![first, info]);
    }

    #[test]
    fn test_duplicate_species_in_stock_dedups_findings() {
        // Same record stocked twice through separate slices -> identical descriptions
        let mut oscar = fish("oscar", "Oscar");
        oscar.min_volume = 75.0;
        let stock = [StockedSpecies::new(&oscar, 1), StockedSpecies::new(&oscar, 1)];

        let findings = evaluate(&stock, 20.0);

        let too_small = findings
            .iter()
            .filter(|f| f.kind == FindingKind::TankTooSmall)
            .count();
        assert_eq!(too_small, 1);
    }

    #[test]
    fn test_finding_lookup_helpers() {
        let mut oscar = fish("oscar", "Oscar");
        oscar.behavior.predatory = true;
        oscar.adult_size = 12.0;
        let mut neon = fish("neon-tetra", "Neon Tetra");
        neon.adult_size = 1.5;
        let stock = [StockedSpecies::new(&oscar, 1), StockedSpecies::new(&neon, 1)];

        let findings = evaluate(&stock, 100.0);

        assert!(has_error_for(&findings, "neon-tetra"));
        assert_eq!(findings_for(&findings, "oscar").len(), 1);
        assert!(findings_for(&findings, "betta").is_empty());
        assert_eq!(summarize(&findings), "1 finding(s) (1 error, 0 warning, 0 info)");
    }

    #[test]
    fn test_kind_tables_cover_every_kind() {
        for kind in FindingKind::ALL {
            assert!(!kind.title().is_empty());
            let json = serde_json::to_string(&kind).unwrap();
            assert_eq!(json, format!("\"{}\"", kind.as_str()));
        }
        assert_eq!(FindingKind::TankTooSmall.severity(), Severity::Error);
        assert_eq!(FindingKind::ShrimpUnsafe.severity(), Severity::Warning);
    }
}
