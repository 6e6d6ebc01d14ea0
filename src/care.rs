// 🌡️ Care Plan - Husbandry recommendations for the current stock
// Derived on demand from the stocked species and the tank volume.
// Nothing here is persisted; an empty tank has no plan.

use crate::config::RuleConfig;
use crate::ledger::StockedSpecies;
use crate::species::Diet;
use serde::Serialize;
use std::collections::HashSet;

/// Widest water windows a plan starts from before narrowing
pub const TEMPERATURE_WINDOW: (f64, f64) = (50.0, 95.0);
pub const PH_WINDOW: (f64, f64) = (4.0, 9.5);

const HIGH_FLOW_MARKERS: [&str; 2] = ["hillstream", "danio"];
const LOW_FLOW_MARKERS: [&str; 2] = ["betta", "gourami"];

const MAX_SPECIAL_NOTES: usize = 3;

// ============================================================================
// PLAN PARTS
// ============================================================================

/// Shared tolerance window. `min > max` means the stock cannot agree.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Window {
    pub min: f64,
    pub max: f64,
}

impl Window {
    fn narrow(&mut self, min: f64, max: f64) {
        self.min = self.min.max(min);
        self.max = self.max.min(max);
    }

    pub fn conflict(&self) -> bool {
        self.min > self.max
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Flow {
    Moderate,
    High,
    Low,
    Mixed,
}

impl Flow {
    pub fn label(&self) -> &'static str {
        match self {
            Flow::Moderate => "Moderate flow",
            Flow::High => "High flow / high oxygen",
            Flow::Low => "Low, gentle flow",
            Flow::Mixed => "Mixed (create zones)",
        }
    }

    pub fn details(&self) -> &'static str {
        match self {
            Flow::Moderate => "A standard hang-on-back or canister filter is fine.",
            Flow::High => "Add a powerhead or wavemaker. These species need strong current.",
            Flow::Low => "Baffle the filter output or use a sponge filter. Avoid strong currents.",
            Flow::Mixed => "Build high-flow and calm areas. Use plants and decor to break the current.",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Feeding {
    Standard,
    ProteinFocused,
    Grazing,
    Varied,
}

impl Feeding {
    pub fn label(&self) -> &'static str {
        match self {
            Feeding::Standard => "1-2 times daily",
            Feeding::ProteinFocused => "1-2 times daily (protein-focused)",
            Feeding::Grazing => "2-3 times daily (small portions)",
            Feeding::Varied => "Varied diet, 1-2 times daily",
        }
    }

    pub fn details(&self) -> &'static str {
        match self {
            Feeding::Standard => "Small portions that are eaten within 2-3 minutes.",
            Feeding::ProteinFocused => "Frozen or live foods such as bloodworms and brine shrimp. Fast one day a week.",
            Feeding::Grazing => "Algae wafers, blanched vegetables and spirulina.",
            Feeding::Varied => "Mix flakes or pellets with frozen foods and the occasional vegetable.",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum WaterChange {
    Standard,
    Heavy,
}

impl WaterChange {
    /// Weekly share of the volume to replace
    pub fn percent_range(&self) -> &'static str {
        match self {
            WaterChange::Standard => "20-25%",
            WaterChange::Heavy => "30-40%",
        }
    }
}

// ============================================================================
// CARE PLAN
// ============================================================================

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CarePlan {
    pub temperature: Window,
    pub temperature_unit: String,
    pub ph: Window,

    /// Filter turnover, in tank volumes per hour
    pub filter_multiplier: u32,

    /// volume x multiplier
    pub filter_flow: f64,

    pub flow: Flow,
    pub feeding: Feeding,
    pub water_change: WaterChange,

    /// At most three, first-seen order
    pub special_notes: Vec<String>,
}

/// Build the care plan for a stock, or `None` for an empty tank
/// Load for equipment sizing: a species with no load weight still counts 1 each
fn care_load(stock: &[StockedSpecies<'_>]) -> f64 {
    stock.iter().fold(0.0, |acc, item| {
        let weight = if item.species.load_weight > 0.0 {
            item.species.load_weight
        } else {
            1.0
        };
        acc + weight * item.quantity as f64
    })
}

pub fn care_plan(stock: &[StockedSpecies<'_>], volume: f64, config: &RuleConfig) -> Option<CarePlan> {
    if stock.is_empty() {
        return None;
    }

    let mut temperature = Window {
        min: TEMPERATURE_WINDOW.0,
        max: TEMPERATURE_WINDOW.1,
    };
    let mut ph = Window {
        min: PH_WINDOW.0,
        max: PH_WINDOW.1,
    };
    let mut diets: HashSet<Diet> = HashSet::new();
    let mut needs_high_flow = false;
    let mut needs_low_flow = false;
    let mut notes: Vec<String> = Vec::new();

    for item in stock {
        let species = item.species;

        if let Some(params) = &species.water_params {
            temperature.narrow(params.temp_min, params.temp_max);
            ph.narrow(params.ph_min, params.ph_max);
        }

        if species.diet != Diet::Unknown {
            diets.insert(species.diet);
        }

        needs_high_flow |= HIGH_FLOW_MARKERS.iter().any(|m| species.id.contains(m));
        needs_low_flow |= LOW_FLOW_MARKERS.iter().any(|m| species.id.contains(m));

        let species_notes = species.notes.to_lowercase();
        if species_notes.contains("driftwood") {
            push_unique(&mut notes, "Include driftwood (required by some species)");
        }
        if species_notes.contains("plants") || species.diet == Diet::Herbivore {
            push_unique(&mut notes, "Live plants recommended for grazing and cover");
        }
        if species_notes.contains("lid") || species_notes.contains("jump") {
            push_unique(&mut notes, "Tight-fitting lid required (jumpers in tank)");
        }
    }

    let load = care_load(stock);
    let filter_multiplier = if load > volume {
        6
    } else if load > volume * 0.7 {
        5
    } else {
        4
    };

    let flow = match (needs_high_flow, needs_low_flow) {
        (true, false) => Flow::High,
        (false, true) => Flow::Low,
        (true, true) => Flow::Mixed,
        (false, false) => Flow::Moderate,
    };

    let has_carnivores = diets.contains(&Diet::Carnivore);
    let has_herbivores = diets.contains(&Diet::Herbivore);
    let feeding = if has_carnivores && !has_herbivores {
        Feeding::ProteinFocused
    } else if has_herbivores && !has_carnivores {
        Feeding::Grazing
    } else if diets.len() > 1 {
        Feeding::Varied
    } else {
        Feeding::Standard
    };

    let water_change = if load > volume * 0.7 {
        WaterChange::Heavy
    } else {
        WaterChange::Standard
    };

    notes.truncate(MAX_SPECIAL_NOTES);

    Some(CarePlan {
        temperature,
        temperature_unit: config.temperature_unit.clone(),
        ph,
        filter_multiplier,
        filter_flow: volume * filter_multiplier as f64,
        flow,
        feeding,
        water_change,
        special_notes: notes,
    })
}

fn push_unique(notes: &mut Vec<String>, note: &str) {
    if !notes.iter().any(|n| n == note) {
        notes.push(note.to_string());
    }
}

// ============================================================================
// TESTS
// ============================================================================
