// 🏷️ Compatibility Rules - Rules as Data
// Each husbandry rule is an independent unit with a fixed scope:
// whole tank, one entry, one unordered pair, or a sweep over what
// the earlier stages emitted.
//
// The engine runs scopes in order (tank, entries, pairs, sweeps) and,
// inside a scope, rules by priority. Per entry / per pair all rules run
// before moving on, so emission order is stable for the same stock.

use crate::compatibility::{Finding, FindingKind, FindingSubject};
use crate::config::RuleConfig;
use crate::ledger::{load_capacity, load_ratio_percent, total_load, StockedSpecies};
use crate::species::SpeciesRecord;

// ============================================================================
// RULE CONTEXT
// ============================================================================

/// Everything a rule may look at. Rules never see the session or ledger.
pub struct RuleContext<'a> {
    pub stock: &'a [StockedSpecies<'a>],
    pub volume: f64,
    pub config: &'a RuleConfig,
}

pub type TankCheck = fn(&RuleContext<'_>) -> Vec<Finding>;
pub type EntryCheck = fn(&RuleContext<'_>, &StockedSpecies<'_>) -> Vec<Finding>;
pub type PairCheck = fn(&RuleContext<'_>, &StockedSpecies<'_>, &StockedSpecies<'_>) -> Vec<Finding>;
pub type SweepCheck = fn(&RuleContext<'_>, &[Finding]) -> Vec<Finding>;

#[derive(Clone, Copy)]
pub enum RuleCheck {
    Tank(TankCheck),
    Entry(EntryCheck),
    Pair(PairCheck),
    Sweep(SweepCheck),
}

// ============================================================================
// RULE DEFINITION
// ============================================================================

#[derive(Clone)]
pub struct CompatibilityRule {
    /// Rule ID for tracking
    pub id: &'static str,

    /// Priority within its scope (higher = runs first)
    pub priority: i32,

    pub check: RuleCheck,
}

impl CompatibilityRule {
    pub fn new(id: &'static str, priority: i32, check: RuleCheck) -> Self {
        CompatibilityRule {
            id,
            priority,
            check,
        }
    }
}

impl std::fmt::Debug for CompatibilityRule {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CompatibilityRule")
            .field("id", &self.id)
            .field("priority", &self.priority)
            .finish()
    }
}

// ============================================================================
// RULE ENGINE
// ============================================================================

#[derive(Debug, Clone)]
pub struct RuleEngine {
    rules: Vec<CompatibilityRule>,
}

impl RuleEngine {
    /// Create a new empty rule engine
    pub fn new() -> Self {
        RuleEngine { rules: Vec::new() }
    }

    /// The standard husbandry rule set
    pub fn standard() -> Self {
        RuleEngine::from_rules(vec![
            CompatibilityRule::new("bioload", 100, RuleCheck::Tank(check_bioload)),
            CompatibilityRule::new("min-volume", 100, RuleCheck::Entry(check_min_volume)),
            CompatibilityRule::new("school-size", 90, RuleCheck::Entry(check_school_size)),
            CompatibilityRule::new(
                "same-species-aggression",
                80,
                RuleCheck::Entry(check_same_species_aggression),
            ),
            CompatibilityRule::new("listed-incompatible", 100, RuleCheck::Pair(check_listed_incompatible)),
            CompatibilityRule::new("temperature", 90, RuleCheck::Pair(check_temperature)),
            CompatibilityRule::new("ph", 80, RuleCheck::Pair(check_ph)),
            CompatibilityRule::new("fin-nipping", 70, RuleCheck::Pair(check_fin_nipping)),
            CompatibilityRule::new("predation", 60, RuleCheck::Pair(check_predation)),
            CompatibilityRule::new("snail-eaters", 50, RuleCheck::Pair(check_snail_eaters)),
            CompatibilityRule::new("coldwater-tropical", 40, RuleCheck::Pair(check_coldwater_tropical)),
            CompatibilityRule::new("territory", 30, RuleCheck::Pair(check_territory)),
            CompatibilityRule::new("shrimp-safety", 100, RuleCheck::Sweep(sweep_shrimp_safety)),
        ])
    }

    /// Create engine from a list of rules
    pub fn from_rules(mut rules: Vec<CompatibilityRule>) -> Self {
        // Stable: equal priorities keep insertion order
        rules.sort_by(|a, b| b.priority.cmp(&a.priority));
        RuleEngine { rules }
    }

    /// Add a single rule
    pub fn add_rule(&mut self, rule: CompatibilityRule) {
        self.rules.push(rule);
        self.rules.sort_by(|a, b| b.priority.cmp(&a.priority));
    }

    /// Drop a rule by id; returns whether one was removed
    pub fn remove_rule(&mut self, id: &str) -> bool {
        let before = self.rules.len();
        self.rules.retain(|r| r.id != id);
        self.rules.len() != before
    }

    /// Get number of rules loaded
    pub fn rule_count(&self) -> usize {
        self.rules.len()
    }

    pub fn rule_ids(&self) -> Vec<&'static str> {
        self.rules.iter().map(|r| r.id).collect()
    }

    /// Run every rule and return findings in emission order (unsorted).
    /// Kinds disabled in the config are dropped as they are emitted.
    pub fn run(&self, ctx: &RuleContext<'_>) -> Vec<Finding> {
        let mut emitted: Vec<Finding> = Vec::new();
        let emit = |findings: Vec<Finding>, emitted: &mut Vec<Finding>| {
            emitted.extend(
                findings
                    .into_iter()
                    .filter(|f| ctx.config.is_enabled(f.kind)),
            );
        };

        // 1. Whole tank
        for rule in &self.rules {
            if let RuleCheck::Tank(check) = rule.check {
                emit(check(ctx), &mut emitted);
            }
        }

        // 2. Each entry
        for item in ctx.stock {
            for rule in &self.rules {
                if let RuleCheck::Entry(check) = rule.check {
                    emit(check(ctx, item), &mut emitted);
                }
            }
        }

        // 3. Each unordered pair, i < j
        for i in 0..ctx.stock.len() {
            for j in (i + 1)..ctx.stock.len() {
                for rule in &self.rules {
                    if let RuleCheck::Pair(check) = rule.check {
                        emit(check(ctx, &ctx.stock[i], &ctx.stock[j]), &mut emitted);
                    }
                }
            }
        }

        // 4. Sweeps see everything emitted so far
        for rule in &self.rules {
            if let RuleCheck::Sweep(check) = rule.check {
                let found = check(ctx, &emitted);
                emit(found, &mut emitted);
            }
        }

        emitted
    }
}

impl Default for RuleEngine {
    fn default() -> Self {
        Self::new()
    }
}

/// Slack for threshold comparisons on derived floats (0.3 pH overlap
/// computes as 0.2999999999999998)
pub const THRESHOLD_EPSILON: f64 = 1e-9;

/// `value < min`, where a value within epsilon of `min` counts as `min`
fn below(value: f64, min: f64) -> bool {
    value < min - THRESHOLD_EPSILON
}

/// `value > max`, where a value within epsilon of `max` counts as `max`
fn above(value: f64, max: f64) -> bool {
    value > max + THRESHOLD_EPSILON
}

// ============================================================================
// TANK RULES
// ============================================================================

/// BIOLOAD_CRITICAL above the critical percentage, otherwise
/// BIOLOAD_WARNING above the warning percentage. Never both.
pub fn check_bioload(ctx: &RuleContext<'_>) -> Vec<Finding> {
    let capacity = load_capacity(ctx.volume, ctx.config.load_factor);
    let percent = load_ratio_percent(total_load(ctx.stock), capacity);
    let shown = percent.round() as i64;

    if above(percent, ctx.config.load_critical_percent) {
        vec![Finding::new(
            FindingKind::BioloadCritical,
            format!(
                "Bioload is at {}%. This is dangerous for fish health and water quality.",
                shown
            ),
            FindingSubject::Tank,
        )]
    } else if above(percent, ctx.config.load_warning_percent) {
        vec![Finding::new(
            FindingKind::BioloadWarning,
            format!(
                "Bioload is at {}%. Consider reducing stock or increasing tank size.",
                shown
            ),
            FindingSubject::Tank,
        )]
    } else {
        Vec::new()
    }
}

// ============================================================================
// ENTRY RULES
// ============================================================================

pub fn check_min_volume(ctx: &RuleContext<'_>, item: &StockedSpecies<'_>) -> Vec<Finding> {
    let species = item.species;
    if species.min_volume <= ctx.volume {
        return Vec::new();
    }

    let unit = &ctx.config.volume_unit;
    vec![Finding::new(
        FindingKind::TankTooSmall,
        format!(
            "{} requires at least {} {}. Current tank is {} {}.",
            species.display_name, species.min_volume, unit, ctx.volume, unit
        ),
        FindingSubject::Species(species.id.clone()),
    )]
}

pub fn check_school_size(_ctx: &RuleContext<'_>, item: &StockedSpecies<'_>) -> Vec<Finding> {
    let species = item.species;
    match species.behavior.required_school() {
        Some(min_school) if item.quantity < min_school => vec![Finding::new(
            FindingKind::SchoolingMin,
            format!(
                "{} is a schooling fish and needs at least {} individuals. You have {}.",
                species.display_name, min_school, item.quantity
            ),
            FindingSubject::Species(species.id.clone()),
        )],
        _ => Vec::new(),
    }
}

pub fn check_same_species_aggression(
    _ctx: &RuleContext<'_>,
    item: &StockedSpecies<'_>,
) -> Vec<Finding> {
    let species = item.species;
    if !species.behavior.solitary_aggression || item.quantity <= 1 {
        return Vec::new();
    }

    vec![Finding::new(
        FindingKind::SameSpeciesAggression,
        format!(
            "Multiple {} together will fight. Only keep one, or provide separate tanks.",
            species.display_name
        ),
        FindingSubject::Species(species.id.clone()),
    )]
}

// ============================================================================
// PAIR RULES
// ============================================================================

fn pair_subject(a: &SpeciesRecord, b: &SpeciesRecord) -> FindingSubject {
    FindingSubject::pair(&a.id, &b.id)
}

pub fn check_listed_incompatible(
    _ctx: &RuleContext<'_>,
    a: &StockedSpecies<'_>,
    b: &StockedSpecies<'_>,
) -> Vec<Finding> {
    let (a, b) = (a.species, b.species);
    if !a.lists_incompatible(&b.id) && !b.lists_incompatible(&a.id) {
        return Vec::new();
    }

    vec![Finding::new(
        FindingKind::Incompatible,
        format!(
            "{} and {} are not compatible together.",
            a.display_name, b.display_name
        ),
        pair_subject(a, b),
    )]
}

/// Shared temperature band narrower than the configured minimum.
/// Skipped when either side has no water data.
pub fn check_temperature(
    ctx: &RuleContext<'_>,
    a: &StockedSpecies<'_>,
    b: &StockedSpecies<'_>,
) -> Vec<Finding> {
    let (a, b) = (a.species, b.species);
    let (Some(pa), Some(pb)) = (&a.water_params, &b.water_params) else {
        return Vec::new();
    };
    if !below(pa.temp_overlap(pb), ctx.config.temp_overlap_min) {
        return Vec::new();
    }

    let unit = &ctx.config.temperature_unit;
    vec![Finding::new(
        FindingKind::TempMismatch,
        format!(
            "{} ({}-{}{}) and {} ({}-{}{}) have incompatible temperature needs.",
            a.display_name,
            pa.temp_min,
            pa.temp_max,
            unit,
            b.display_name,
            pb.temp_min,
            pb.temp_max,
            unit
        ),
        pair_subject(a, b),
    )]
}

pub fn check_ph(
    ctx: &RuleContext<'_>,
    a: &StockedSpecies<'_>,
    b: &StockedSpecies<'_>,
) -> Vec<Finding> {
    let (a, b) = (a.species, b.species);
    let (Some(pa), Some(pb)) = (&a.water_params, &b.water_params) else {
        return Vec::new();
    };
    if !below(pa.ph_overlap(pb), ctx.config.ph_overlap_min) {
        return Vec::new();
    }

    vec![Finding::new(
        FindingKind::PhMismatch,
        format!(
            "{} (pH {}-{}) and {} (pH {}-{}) have incompatible pH needs.",
            a.display_name, pa.ph_min, pa.ph_max, b.display_name, pb.ph_min, pb.ph_max
        ),
        pair_subject(a, b),
    )]
}

/// One finding per pair, naming whichever side actually nips
pub fn check_fin_nipping(
    ctx: &RuleContext<'_>,
    a: &StockedSpecies<'_>,
    b: &StockedSpecies<'_>,
) -> Vec<Finding> {
    let (a, b) = (a.species, b.species);
    let nips = |nipper: &SpeciesRecord, victim: &SpeciesRecord| {
        nipper.behavior.fin_nipper && ctx.config.is_long_finned(&victim.id)
    };

    let (nipper, victim) = if nips(a, b) {
        (a, b)
    } else if nips(b, a) {
        (b, a)
    } else {
        return Vec::new();
    };

    vec![Finding::new(
        FindingKind::FinNipper,
        format!(
            "{} may nip the fins of {}.",
            nipper.display_name, victim.display_name
        ),
        pair_subject(a, b),
    )]
}

/// Checked in both directions: either side may be the predator
pub fn check_predation(
    ctx: &RuleContext<'_>,
    a: &StockedSpecies<'_>,
    b: &StockedSpecies<'_>,
) -> Vec<Finding> {
    let (a, b) = (a.species, b.species);
    let is_prey = |prey: &SpeciesRecord| prey.is_shrimp() || prey.adult_size < ctx.config.prey_max_size;

    [(a, b), (b, a)]
        .into_iter()
        .filter(|&(predator, prey)| predator.behavior.predatory && is_prey(prey))
        .map(|(predator, prey)| {
            Finding::new(
                FindingKind::PredatorPrey,
                format!("{} may eat {}.", predator.display_name, prey.display_name),
                pair_subject(a, b),
            )
        })
        .collect()
}

/// Snail eaters against snails, in both directions. A snail eating
/// another snail (assassin snails) gets its own wording.
pub fn check_snail_eaters(
    _ctx: &RuleContext<'_>,
    a: &StockedSpecies<'_>,
    b: &StockedSpecies<'_>,
) -> Vec<Finding> {
    let (a, b) = (a.species, b.species);

    [(a, b), (b, a)]
        .into_iter()
        .filter(|&(eater, snail)| eater.behavior.snail_eater && snail.is_snail())
        .map(|(eater, snail)| {
            let verb = if eater.is_snail() {
                "will hunt and eat"
            } else {
                "will eat"
            };
            Finding::new(
                FindingKind::SnailEater,
                format!("{} {} {}.", eater.display_name, verb, snail.display_name),
                pair_subject(a, b),
            )
        })
        .collect()
}

/// Listed coldwater ids, or tempMax at or below the coldwater ceiling
pub fn is_coldwater(species: &SpeciesRecord, config: &RuleConfig) -> bool {
    config.is_listed_coldwater(&species.id)
        || species
            .water_params
            .map_or(false, |p| p.temp_max <= config.coldwater_temp_max)
}

/// tempMin at or above the tropical floor
pub fn is_tropical(species: &SpeciesRecord, config: &RuleConfig) -> bool {
    species
        .water_params
        .map_or(false, |p| p.temp_min >= config.tropical_temp_min)
}

pub fn check_coldwater_tropical(
    ctx: &RuleContext<'_>,
    a: &StockedSpecies<'_>,
    b: &StockedSpecies<'_>,
) -> Vec<Finding> {
    let (a, b) = (a.species, b.species);
    let mixes = |cold: &SpeciesRecord, warm: &SpeciesRecord| {
        is_coldwater(cold, ctx.config) && is_tropical(warm, ctx.config)
    };

    let (cold, warm) = if mixes(a, b) {
        (a, b)
    } else if mixes(b, a) {
        (b, a)
    } else {
        return Vec::new();
    };

    vec![Finding::new(
        FindingKind::ColdwaterTropicalMix,
        format!(
            "{} is a coldwater fish and {} is tropical. They cannot be kept at the same temperature.",
            cold.display_name, warm.display_name
        ),
        pair_subject(a, b),
    )]
}

pub fn check_territory(
    _ctx: &RuleContext<'_>,
    a: &StockedSpecies<'_>,
    b: &StockedSpecies<'_>,
) -> Vec<Finding> {
    let (a, b) = (a.species, b.species);
    if !(a.behavior.territorial && b.behavior.territorial) {
        return Vec::new();
    }

    vec![Finding::new(
        FindingKind::TerritorialConflict,
        format!(
            "Both {} and {} are territorial and may fight over space.",
            a.display_name, b.display_name
        ),
        pair_subject(a, b),
    )]
}

// ============================================================================
// SWEEPS
// ============================================================================

/// Large fish that a shrimp explicitly lists as incompatible, unless the
/// fish is exempt or the pair was already flagged by a pair rule.
///
/// Only fires for fish the shrimp's own incompatibility list names; large
/// predators missing from that list are not reported here.
pub fn sweep_shrimp_safety(ctx: &RuleContext<'_>, emitted: &[Finding]) -> Vec<Finding> {
    let mut found = Vec::new();

    let shrimp = ctx.stock.iter().filter(|s| s.species.is_shrimp());
    for shrimp_item in shrimp {
        let fish = ctx.stock.iter().filter(|s| s.species.is_fish());
        for fish_item in fish {
            let (shrimp, fish) = (shrimp_item.species, fish_item.species);

            if fish.adult_size < ctx.config.shrimp_risk_min_size
                || ctx.config.is_shrimp_safe(&fish.id)
            {
                continue;
            }

            let already_flagged = emitted
                .iter()
                .chain(found.iter())
                .any(|f: &Finding| f.subject.is_pair_of(&shrimp.id, &fish.id));

            if !already_flagged && shrimp.lists_incompatible(&fish.id) {
                found.push(Finding::new(
                    FindingKind::ShrimpUnsafe,
                    format!(
                        "{} will likely eat {}.",
                        fish.display_name, shrimp.display_name
                    ),
                    FindingSubject::pair(&shrimp.id, &fish.id),
                ));
            }
        }
    }

    found
}

// ============================================================================
// TESTS
// ============================================================================
