// 🧾 Stock Ledger - What is in the tank right now
// A Ledger is an immutable snapshot value. Every mutation produces the
// next snapshot with revision + 1; the session swaps it in wholesale.
//
// Entries reference species by id only. Anything that needs species data
// (load, evaluation) resolves ids against a Catalog at the point of use.

use crate::catalog::Catalog;
use crate::species::SpeciesRecord;
use serde::{Deserialize, Serialize};

// ============================================================================
// STOCK ENTRY
// ============================================================================

/// One stocked species. Quantity is always >= 1 inside a ledger.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StockEntry {
    pub species_id: String,
    pub quantity: u32,
}

/// A stock entry resolved against the catalog
#[derive(Debug, Clone, Copy)]
pub struct StockedSpecies<'a> {
    pub species: &'a SpeciesRecord,
    pub quantity: u32,
}

impl<'a> StockedSpecies<'a> {
    pub fn new(species: &'a SpeciesRecord, quantity: u32) -> Self {
        StockedSpecies { species, quantity }
    }

    /// Load contributed by this entry
    pub fn load(&self) -> f64 {
        self.species.load_weight * self.quantity as f64
    }
}

// ============================================================================
// LOAD STATUS
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LoadStatus {
    Safe,
    Warning,
    Danger,
}

impl LoadStatus {
    /// safe <= 70%, warning <= 100%, danger above
    pub fn from_percent(percent: i64) -> Self {
        LoadStatus::classify(percent, 70.0, 100.0)
    }

    /// Classify against explicit warning/critical percentages (inclusive)
    pub fn classify(percent: i64, warning: f64, critical: f64) -> Self {
        let percent = percent as f64;
        if percent <= warning {
            LoadStatus::Safe
        } else if percent <= critical {
            LoadStatus::Warning
        } else {
            LoadStatus::Danger
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            LoadStatus::Safe => "safe",
            LoadStatus::Warning => "warning",
            LoadStatus::Danger => "danger",
        }
    }
}

/// Sum of load weight x quantity over resolved entries
pub fn total_load(stock: &[StockedSpecies<'_>]) -> f64 {
    // fold from +0.0: an empty f64 sum is -0.0
    stock.iter().fold(0.0, |acc, s| acc + s.load())
}

/// Capacity of a container of `volume` at `load_factor` per unit
pub fn load_capacity(volume: f64, load_factor: f64) -> f64 {
    volume * load_factor
}

/// Load as a share of capacity, unrounded
pub fn load_ratio_percent(load: f64, capacity: f64) -> f64 {
    if capacity <= 0.0 {
        return 0.0;
    }
    load / capacity * 100.0
}

// ============================================================================
// LEDGER
// ============================================================================

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Ledger {
    volume: f64,
    entries: Vec<StockEntry>,
    revision: u64,
}

impl Ledger {
    /// Load capacity per unit of volume
    pub const LOAD_FACTOR: f64 = 1.5;

    /// Smallest allowed container volume
    pub const MIN_VOLUME: f64 = 1.0;

    /// Empty ledger at `volume` (clamped to the minimum)
    pub fn new(volume: f64) -> Self {
        Ledger {
            volume: clamp_volume(volume),
            entries: Vec::new(),
            revision: 0,
        }
    }

    /// Ledger rebuilt from persisted state. Entries with quantity 0 are
    /// skipped and repeated ids are merged.
    pub fn restored(volume: f64, entries: Vec<StockEntry>) -> Self {
        let mut ledger = Ledger::new(volume);
        for entry in entries {
            if entry.quantity > 0 {
                ledger.merge(&entry.species_id, entry.quantity);
            }
        }
        ledger
    }

    pub fn volume(&self) -> f64 {
        self.volume
    }

    pub fn entries(&self) -> &[StockEntry] {
        &self.entries
    }

    /// Bumped on every transition; identifies a snapshot
    pub fn revision(&self) -> u64 {
        self.revision
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    // ------------------------------------------------------------------------
    // Transitions (each returns the next snapshot)
    // ------------------------------------------------------------------------

    pub fn with_volume(&self, volume: f64) -> Ledger {
        let mut next = self.next();
        next.volume = clamp_volume(volume);
        next
    }

    /// Add `quantity` (0 counts as 1) of a species, merging into an
    /// existing entry
    pub fn with_added(&self, species_id: &str, quantity: u32) -> Ledger {
        let mut next = self.next();
        next.merge(species_id, quantity.max(1));
        next
    }

    /// Take `quantity` (0 counts as 1) away; the entry disappears when it
    /// reaches zero. Unknown ids leave the entries untouched.
    pub fn with_removed(&self, species_id: &str, quantity: u32) -> Ledger {
        let quantity = quantity.max(1);
        let mut next = self.next();
        if let Some(index) = next.position(species_id) {
            let entry = &mut next.entries[index];
            if entry.quantity <= quantity {
                next.entries.remove(index);
            } else {
                entry.quantity -= quantity;
            }
        }
        next
    }

    pub fn without_species(&self, species_id: &str) -> Ledger {
        let mut next = self.next();
        next.entries.retain(|e| e.species_id != species_id);
        next
    }

    pub fn cleared(&self) -> Ledger {
        let mut next = self.next();
        next.entries.clear();
        next
    }

    // ------------------------------------------------------------------------
    // Derived reads
    // ------------------------------------------------------------------------

    /// Quantity held for a species (0 if absent)
    pub fn count(&self, species_id: &str) -> u32 {
        self.position(species_id)
            .map(|i| self.entries[i].quantity)
            .unwrap_or(0)
    }

    /// Sum of all quantities
    pub fn total_count(&self) -> u64 {
        self.entries.iter().map(|e| e.quantity as u64).sum()
    }

    /// Resolve entries against the catalog, in ledger order.
    /// Ids the catalog does not know are left out.
    pub fn resolve<'c>(&self, catalog: &'c Catalog) -> Vec<StockedSpecies<'c>> {
        self.entries
            .iter()
            .filter_map(|e| {
                catalog
                    .get(&e.species_id)
                    .map(|species| StockedSpecies::new(species, e.quantity))
            })
            .collect()
    }

    /// Σ load weight x quantity, recomputed on every call
    pub fn total_load(&self, catalog: &Catalog) -> f64 {
        total_load(&self.resolve(catalog))
    }

    pub fn load_capacity(&self) -> f64 {
        load_capacity(self.volume, Self::LOAD_FACTOR)
    }

    /// Rounded load percentage
    pub fn load_percent(&self, catalog: &Catalog) -> i64 {
        load_ratio_percent(self.total_load(catalog), self.load_capacity()).round() as i64
    }

    pub fn load_status(&self, catalog: &Catalog) -> LoadStatus {
        LoadStatus::from_percent(self.load_percent(catalog))
    }

    // ------------------------------------------------------------------------
    // Internals
    // ------------------------------------------------------------------------

    fn next(&self) -> Ledger {
        let mut next = self.clone();
        next.revision += 1;
        next
    }

    fn position(&self, species_id: &str) -> Option<usize> {
        self.entries.iter().position(|e| e.species_id == species_id)
    }

    fn merge(&mut self, species_id: &str, quantity: u32) {
        match self.position(species_id) {
            Some(index) => {
                let entry = &mut self.entries[index];
                entry.quantity = entry.quantity.saturating_add(quantity);
            }
            None => self.entries.push(StockEntry {
                species_id: species_id.to_string(),
                quantity,
            }),
        }
    }
}

impl Default for Ledger {
    fn default() -> Self {
        Ledger::new(20.0)
    }
}

fn clamp_volume(volume: f64) -> f64 {
    if volume.is_nan() {
        Ledger::MIN_VOLUME
    } else {
        volume.max(Ledger::MIN_VOLUME)
    }
}

// ============================================================================
// TESTS
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::species::Category;

    fn create_test_catalog() -> Catalog {
        let mut guppy = SpeciesRecord::new("guppy", "Guppy", Category::Fish);
        guppy.load_weight = 1.0;

        let mut pleco = SpeciesRecord::new("common-pleco", "Common Pleco", Category::Fish);
        pleco.load_weight = 8.0;

        let mut amano = SpeciesRecord::new("amano-shrimp", "Amano Shrimp", Category::Shrimp);
        amano.load_weight = 0.5;

        Catalog::new(vec![guppy, pleco, amano]).unwrap()
    }

    #[test]
    fn test_add_merges_quantities() {
        let ledger = Ledger::new(20.0)
            .with_added("guppy", 2)
            .with_added("amano-shrimp", 1)
            .with_added("guppy", 3);

        assert_eq!(ledger.entries().len(), 2);
        assert_eq!(ledger.count("guppy"), 5);
        assert_eq!(ledger.entries()[0].species_id, "guppy");
        assert_eq!(ledger.total_count(), 6);
    }

    #[test]
    fn test_remove_to_zero_deletes_entry() {
        let ledger = Ledger::new(20.0).with_added("guppy", 2);
        let ledger = ledger.with_removed("guppy", 2);

        assert_eq!(ledger.count("guppy"), 0);
        assert!(ledger.entries().iter().all(|e| e.species_id != "guppy"));
        assert!(ledger.is_empty());
    }

    #[test]
    fn test_remove_more_than_held_deletes_entry() {
        let ledger = Ledger::new(20.0).with_added("guppy", 2).with_removed("guppy", 7);
        assert!(ledger.is_empty());
    }

    #[test]
    fn test_zero_quantity_counts_as_one() {
        let ledger = Ledger::new(20.0).with_added("guppy", 0);

        assert_eq!(ledger.entries(), &[StockEntry { species_id: "guppy".into(), quantity: 1 }]);
        assert_eq!(ledger.count("guppy"), 1);

        let ledger = ledger.with_added("guppy", 2).with_removed("guppy", 0);
        assert_eq!(ledger.count("guppy"), 2);
        assert!(ledger.entries().iter().all(|e| e.quantity > 0));
    }

    #[test]
    fn test_empty_load_is_positive_zero() {
        let catalog = create_test_catalog();
        let ledger = Ledger::new(20.0).with_added("ghost", 3);

        let load = ledger.total_load(&catalog);
        assert_eq!(load, 0.0);
        assert!(load.is_sign_positive());
        assert_eq!(format!("{:.1}", total_load(&[])), "0.0");
    }

    #[test]
    fn test_remove_unknown_is_noop() {
        let before = Ledger::new(20.0).with_added("guppy", 2);
        let after = before.with_removed("oscar", 1);

        assert_eq!(after.entries(), before.entries());
        assert_eq!(after.revision(), before.revision() + 1);
    }

    #[test]
    fn test_remove_all_and_clear() {
        let ledger = Ledger::new(20.0)
            .with_added("guppy", 4)
            .with_added("amano-shrimp", 3)
            .without_species("guppy");

        assert_eq!(ledger.count("guppy"), 0);
        assert_eq!(ledger.count("amano-shrimp"), 3);

        let cleared = ledger.cleared();
        assert!(cleared.is_empty());
        assert_eq!(cleared.volume(), 20.0);
    }

    #[test]
    fn test_volume_clamped_to_minimum() {
        assert_eq!(Ledger::new(0.0).volume(), 1.0);
        assert_eq!(Ledger::new(-5.0).volume(), 1.0);
        assert_eq!(Ledger::new(f64::NAN).volume(), 1.0);
        assert_eq!(Ledger::new(20.0).with_volume(0.5).volume(), 1.0);
        assert_eq!(Ledger::new(20.0).with_volume(75.0).volume(), 75.0);
    }

    #[test]
    fn test_revision_increases_per_transition() {
        let ledger = Ledger::new(10.0);
        assert_eq!(ledger.revision(), 0);

        let ledger = ledger.with_added("guppy", 1).with_volume(30.0).cleared();
        assert_eq!(ledger.revision(), 3);
    }

    #[test]
    fn test_load_metrics() {
        let catalog = create_test_catalog();

        // 2 x 8 + 4 x 0.5 = 18 in a 10-unit tank -> capacity 15, 120%
        let ledger = Ledger::new(10.0)
            .with_added("common-pleco", 2)
            .with_added("amano-shrimp", 4);

        assert_eq!(ledger.total_load(&catalog), 18.0);
        assert_eq!(ledger.load_capacity(), 15.0);
        assert_eq!(ledger.load_percent(&catalog), 120);
        assert_eq!(ledger.load_status(&catalog), LoadStatus::Danger);
    }

    #[test]
    fn test_load_status_boundaries() {
        assert_eq!(LoadStatus::from_percent(0), LoadStatus::Safe);
        assert_eq!(LoadStatus::from_percent(70), LoadStatus::Safe);
        assert_eq!(LoadStatus::from_percent(71), LoadStatus::Warning);
        assert_eq!(LoadStatus::from_percent(100), LoadStatus::Warning);
        assert_eq!(LoadStatus::from_percent(101), LoadStatus::Danger);
    }

    #[test]
    fn test_total_load_tracks_every_change() {
        let catalog = create_test_catalog();
        let mut ledger = Ledger::new(20.0);

        for (id, qty) in [("guppy", 3), ("common-pleco", 1), ("guppy", 2)] {
            ledger = ledger.with_added(id, qty);
            let expected: f64 = ledger
                .entries()
                .iter()
                .map(|e| catalog.get(&e.species_id).unwrap().load_weight * e.quantity as f64)
                .sum();
            assert_eq!(ledger.total_load(&catalog), expected);
        }

        ledger = ledger.with_removed("guppy", 4);
        assert_eq!(ledger.total_load(&catalog), 9.0);
    }

    #[test]
    fn test_restored_skips_zero_and_merges() {
        let ledger = Ledger::restored(
            30.0,
            vec![
                StockEntry { species_id: "guppy".into(), quantity: 2 },
                StockEntry { species_id: "amano-shrimp".into(), quantity: 0 },
                StockEntry { species_id: "guppy".into(), quantity: 1 },
            ],
        );

        assert_eq!(ledger.volume(), 30.0);
        assert_eq!(ledger.entries().len(), 1);
        assert_eq!(ledger.count("guppy"), 3);
    }

    #[test]
    fn test_resolve_drops_unknown_ids() {
        let catalog = create_test_catalog();
        let ledger = Ledger::new(20.0).with_added("guppy", 1).with_added("ghost", 2);

        let stock = ledger.resolve(&catalog);

        assert_eq!(stock.len(), 1);
        assert_eq!(stock[0].species.id, "guppy");
    }
}
