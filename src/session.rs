// 🐠 Session - The live tank
// Owns the current Ledger snapshot, the saved-tank slot and the listeners.
//
// Every mutation: build the next snapshot, persist it, then call each
// listener in subscription order with the new snapshot. No-op mutations
// (removing an absent species) still persist and notify.
//
// Mutations take &mut self and listeners only receive an Arc<Ledger>. A
// listener holding the session behind Rc<RefCell<_>> panics if it mutates.

use crate::care::{care_plan, CarePlan};
use crate::catalog::Catalog;
use crate::compatibility::{CompatibilityChecker, Finding};
use crate::config::PlannerConfig;
use crate::db::KeyValueStore;
use crate::error::SessionError;
use crate::export::{export_config, TankExport};
use crate::ledger::{load_capacity, load_ratio_percent, Ledger, LoadStatus, StockedSpecies};
use crate::species::SpeciesRecord;
use crate::store::SessionStore;
use std::sync::Arc;
use tracing::{debug, warn};

pub type Listener = Box<dyn FnMut(Arc<Ledger>)>;

/// Handle returned by `subscribe`; pass it back to `unsubscribe`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Subscription(u64);

pub struct Session<S: KeyValueStore> {
    catalog: Arc<Catalog>,
    ledger: Arc<Ledger>,
    store: SessionStore<S>,
    config: PlannerConfig,
    checker: CompatibilityChecker,
    listeners: Vec<(Subscription, Listener)>,
    next_subscription: u64,
}

impl<S: KeyValueStore> Session<S> {
    /// Open a session over `backend`. The saved tank, if any, is restored
    /// against `catalog` here and nowhere else.
    pub fn open(catalog: Arc<Catalog>, backend: S, config: PlannerConfig) -> Self {
        let store = SessionStore::new(backend, config.storage_key.clone());
        let ledger = store
            .load(&catalog, config.default_volume)
            .unwrap_or_else(|| Ledger::new(config.default_volume));
        let checker = CompatibilityChecker::with_config(config.rules.clone());

        Session {
            catalog,
            ledger: Arc::new(ledger),
            store,
            config,
            checker,
            listeners: Vec::new(),
            next_subscription: 0,
        }
    }

    // ------------------------------------------------------------------------
    // Subscriptions
    // ------------------------------------------------------------------------

    /// Listeners run inline after every mutation, in subscription order.
    /// A listener must not mutate this session: one that reaches it through
    /// shared ownership (`Rc<RefCell<Session>>`) panics with a borrow error
    /// instead of starting a nested notification cycle.
    pub fn subscribe<F>(&mut self, listener: F) -> Subscription
    where
        F: FnMut(Arc<Ledger>) + 'static,
    {
        let subscription = Subscription(self.next_subscription);
        self.next_subscription += 1;
        self.listeners.push((subscription, Box::new(listener)));
        subscription
    }

    /// Returns false if the subscription was already gone
    pub fn unsubscribe(&mut self, subscription: Subscription) -> bool {
        let before = self.listeners.len();
        self.listeners.retain(|(s, _)| *s != subscription);
        self.listeners.len() != before
    }

    pub fn listener_count(&self) -> usize {
        self.listeners.len()
    }

    // ------------------------------------------------------------------------
    // Mutations
    // ------------------------------------------------------------------------

    pub fn set_volume(&mut self, volume: f64) {
        let next = self.ledger.with_volume(volume);
        debug!(requested = volume, volume = next.volume(), revision = next.revision(), "Set volume");
        self.commit(next);
    }

    /// Add `quantity` (0 counts as 1) of a species. Records the catalog
    /// does not hold are ignored: nothing changes and nobody is notified.
    pub fn add_species(&mut self, species: &SpeciesRecord, quantity: u32) {
        if !self.catalog.contains(&species.id) {
            warn!(species = %species.id, "Ignoring species missing from the catalog");
            return;
        }
        self.add_known(&species.id, quantity);
    }

    pub fn add_species_by_id(&mut self, species_id: &str, quantity: u32) -> Result<(), SessionError> {
        if !self.catalog.contains(species_id) {
            return Err(SessionError::UnknownSpecies(species_id.to_string()));
        }
        self.add_known(species_id, quantity);
        Ok(())
    }

    fn add_known(&mut self, species_id: &str, quantity: u32) {
        let quantity = quantity.max(1);
        let next = self.ledger.with_added(species_id, quantity);
        debug!(species = %species_id, quantity, revision = next.revision(), "Added species");
        self.commit(next);
    }

    /// Take away `quantity` (0 counts as 1); unknown ids are a no-op
    pub fn remove_species(&mut self, species_id: &str, quantity: u32) {
        let quantity = quantity.max(1);
        let next = self.ledger.with_removed(species_id, quantity);
        debug!(species = %species_id, quantity, revision = next.revision(), "Removed species");
        self.commit(next);
    }

    pub fn remove_all_of_species(&mut self, species_id: &str) {
        let next = self.ledger.without_species(species_id);
        debug!(species = %species_id, revision = next.revision(), "Removed all of species");
        self.commit(next);
    }

    pub fn clear(&mut self) {
        let next = self.ledger.cleared();
        debug!(revision = next.revision(), "Cleared tank");
        self.commit(next);
    }

    /// Delete the saved slot. The in-memory tank is untouched.
    pub fn clear_storage(&self) {
        self.store.clear();
    }

    fn commit(&mut self, next: Ledger) {
        self.ledger = Arc::new(next);
        self.store.save(&self.ledger);

        for (_, listener) in self.listeners.iter_mut() {
            listener(Arc::clone(&self.ledger));
        }
    }

    // ------------------------------------------------------------------------
    // Reads
    // ------------------------------------------------------------------------

    /// Current snapshot
    pub fn ledger(&self) -> Arc<Ledger> {
        Arc::clone(&self.ledger)
    }

    pub fn catalog(&self) -> &Catalog {
        &self.catalog
    }

    pub fn config(&self) -> &PlannerConfig {
        &self.config
    }

    pub fn store(&self) -> &SessionStore<S> {
        &self.store
    }

    pub fn volume(&self) -> f64 {
        self.ledger.volume()
    }

    pub fn count(&self, species_id: &str) -> u32 {
        self.ledger.count(species_id)
    }

    pub fn total_count(&self) -> u64 {
        self.ledger.total_count()
    }

    /// Stocked species resolved against the catalog
    pub fn stocked(&self) -> Vec<StockedSpecies<'_>> {
        self.ledger.resolve(&self.catalog)
    }

    pub fn total_load(&self) -> f64 {
        self.ledger.total_load(&self.catalog)
    }

    pub fn load_capacity(&self) -> f64 {
        load_capacity(self.ledger.volume(), self.config.rules.load_factor)
    }

    /// Rounded load percentage
    pub fn load_percent(&self) -> i64 {
        load_ratio_percent(self.total_load(), self.load_capacity()).round() as i64
    }

    pub fn load_status(&self) -> LoadStatus {
        LoadStatus::classify(
            self.load_percent(),
            self.config.rules.load_warning_percent,
            self.config.rules.load_critical_percent,
        )
    }

    /// Evaluate the current stock
    pub fn findings(&self) -> Vec<Finding> {
        self.checker.check(&self.stocked(), self.ledger.volume())
    }

    pub fn care_plan(&self) -> Option<CarePlan> {
        care_plan(&self.stocked(), self.ledger.volume(), &self.config.rules)
    }

    pub fn export(&self) -> TankExport {
        export_config(&self.ledger, &self.catalog)
    }
}

// ============================================================================
// TESTS
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::compatibility::FindingKind;
    use crate::db::{MemoryStore, SqliteStore};
    use crate::species::{Category, WaterParams};
    use std::cell::RefCell;
    use std::rc::Rc;

    fn create_test_catalog() -> Arc<Catalog> {
        let mut neon = SpeciesRecord::new("neon-tetra", "Neon Tetra", Category::Fish);
        neon.load_weight = 0.5;
        neon.min_volume = 10.0;
        neon.behavior.schooling = true;
        neon.behavior.min_school = Some(6);
        neon.water_params = Some(WaterParams::new(70.0, 81.0, 6.0, 7.5));

        let mut pleco = SpeciesRecord::new("common-pleco", "Common Pleco", Category::Fish);
        pleco.load_weight = 9.0;
        pleco.min_volume = 75.0;
        pleco.water_params = Some(WaterParams::new(72.0, 86.0, 6.5, 7.8));

        let mut nerite = SpeciesRecord::new("nerite-snail", "Nerite Snail", Category::Snail);
        nerite.load_weight = 0.5;

        Arc::new(Catalog::new(vec![neon, pleco, nerite]).unwrap())
    }

    fn open_memory_session() -> Session<MemoryStore> {
        Session::open(create_test_catalog(), MemoryStore::new(), PlannerConfig::default())
    }

    #[test]
    fn test_fresh_session_uses_default_volume() {
        let session = open_memory_session();

        assert_eq!(session.volume(), 20.0);
        assert_eq!(session.total_count(), 0);
        assert!(session.findings().is_empty());
        assert!(session.care_plan().is_none());
        assert_eq!(session.load_status(), LoadStatus::Safe);
    }

    #[test]
    fn test_listeners_called_in_order_with_new_state() {
        let mut session = open_memory_session();
        let calls: Rc<RefCell<Vec<(&str, u64, u32)>>> = Rc::new(RefCell::new(Vec::new()));

        let log = Rc::clone(&calls);
        session.subscribe(move |ledger| {
            log.borrow_mut().push(("first", ledger.revision(), ledger.count("neon-tetra")))
        });
        let log = Rc::clone(&calls);
        session.subscribe(move |ledger| {
            log.borrow_mut().push(("second", ledger.revision(), ledger.count("neon-tetra")))
        });

        session.add_species_by_id("neon-tetra", 6).unwrap();

        assert_eq!(*calls.borrow(), vec![("first", 1, 6), ("second", 1, 6)]);
    }

    #[test]
    fn test_every_mutation_notifies_including_noops() {
        let mut session = open_memory_session();
        let hits = Rc::new(RefCell::new(0));
        let counter = Rc::clone(&hits);
        session.subscribe(move |_| *counter.borrow_mut() += 1);

        session.set_volume(30.0);
        session.add_species_by_id("nerite-snail", 1).unwrap();
        session.remove_species("oscar", 1);
        session.remove_all_of_species("nerite-snail");
        session.clear();

        assert_eq!(*hits.borrow(), 5);
    }

    #[test]
    fn test_unsubscribe_stops_notifications() {
        let mut session = open_memory_session();
        let hits = Rc::new(RefCell::new(0));
        let counter = Rc::clone(&hits);
        let subscription = session.subscribe(move |_| *counter.borrow_mut() += 1);

        session.set_volume(25.0);
        assert!(session.unsubscribe(subscription));
        assert!(!session.unsubscribe(subscription));
        session.set_volume(30.0);

        assert_eq!(*hits.borrow(), 1);
        assert_eq!(session.listener_count(), 0);
    }

    #[test]
    fn test_zero_quantity_counts_as_one() {
        let mut session = open_memory_session();

        session.add_species_by_id("neon-tetra", 0).unwrap();
        assert_eq!(session.count("neon-tetra"), 1);

        session.remove_species("neon-tetra", 0);
        assert_eq!(session.count("neon-tetra"), 0);
    }

    #[test]
    fn test_unknown_id_rejected_without_mutation() {
        let mut session = open_memory_session();
        let hits = Rc::new(RefCell::new(0));
        let counter = Rc::clone(&hits);
        session.subscribe(move |_| *counter.borrow_mut() += 1);

        let err = session.add_species_by_id("oscar", 1).unwrap_err();

        assert!(matches!(err, SessionError::UnknownSpecies(ref id) if id == "oscar"));
        assert_eq!(*hits.borrow(), 0);
        assert_eq!(session.ledger().revision(), 0);
    }

    #[test]
    fn test_add_record_missing_from_catalog_is_ignored() {
        let mut session = open_memory_session();
        let hits = Rc::new(RefCell::new(0));
        let counter = Rc::clone(&hits);
        session.subscribe(move |_| *counter.borrow_mut() += 1);

        let mut oscar = SpeciesRecord::new("oscar", "Oscar", Category::Fish);
        oscar.load_weight = 10.0;
        oscar.min_volume = 75.0;
        session.add_species(&oscar, 3);

        assert_eq!(session.count("oscar"), 0);
        assert!(session.ledger().is_empty());
        assert_eq!(session.ledger().revision(), 0);
        assert_eq!(*hits.borrow(), 0);

        // Known records still go through, and every entry carries load
        let neon = session.catalog().get("neon-tetra").unwrap().clone();
        session.add_species(&neon, 6);
        assert_eq!(session.count("neon-tetra"), 6);
        assert_eq!(session.total_load(), 3.0);
        assert_eq!(*hits.borrow(), 1);
    }

    #[test]
    #[should_panic]
    fn test_listener_mutating_shared_session_panics() {
        let shared = Rc::new(RefCell::new(open_memory_session()));
        let inner = Rc::clone(&shared);
        shared
            .borrow_mut()
            .subscribe(move |_| inner.borrow_mut().clear());

        shared.borrow_mut().set_volume(40.0);
    }

    #[test]
    fn test_every_mutation_persists() {
        let mut session = open_memory_session();

        session.add_species_by_id("neon-tetra", 8).unwrap();
        let saved = session.store().load(session.catalog(), 20.0).unwrap();
        assert_eq!(saved.count("neon-tetra"), 8);

        session.set_volume(55.0);
        let saved = session.store().load(session.catalog(), 20.0).unwrap();
        assert_eq!(saved.volume(), 55.0);
    }

    #[test]
    fn test_restore_on_open() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("planner.db");
        let catalog = create_test_catalog();

        {
            let mut session =
                Session::open(Arc::clone(&catalog), SqliteStore::open(&path).unwrap(), PlannerConfig::default());
            session.set_volume(40.0);
            session.add_species_by_id("neon-tetra", 10).unwrap();
            session.add_species_by_id("nerite-snail", 2).unwrap();
            session.remove_species("neon-tetra", 3);
        }

        let session = Session::open(catalog, SqliteStore::open(&path).unwrap(), PlannerConfig::default());

        assert_eq!(session.volume(), 40.0);
        assert_eq!(session.count("neon-tetra"), 7);
        assert_eq!(session.count("nerite-snail"), 2);
        assert_eq!(session.ledger().revision(), 0);
    }

    #[test]
    fn test_restore_drops_species_missing_from_new_catalog() {
        let store = MemoryStore::with_slot(
            "aquaplanner_tank",
            r#"{"tankSize":30,"stock":[{"id":"axolotl","quantity":1},{"id":"nerite-snail","quantity":3}],"savedAt":"2024-05-01T08:30:00Z"}"#,
        );

        let session = Session::open(create_test_catalog(), store, PlannerConfig::default());

        assert_eq!(session.volume(), 30.0);
        assert_eq!(session.ledger().entries().len(), 1);
        assert_eq!(session.count("nerite-snail"), 3);
    }

    #[test]
    fn test_clear_storage_keeps_memory_state() {
        let mut session = open_memory_session();
        session.add_species_by_id("nerite-snail", 2).unwrap();

        session.clear_storage();

        assert_eq!(session.count("nerite-snail"), 2);
        assert!(session.store().load(session.catalog(), 20.0).is_none());
    }

    #[test]
    fn test_derived_reads_and_findings() {
        let mut session = open_memory_session();
        session.set_volume(10.0);
        session.add_species_by_id("common-pleco", 2).unwrap();

        // 18 / 15 = 120%
        assert_eq!(session.total_load(), 18.0);
        assert_eq!(session.load_capacity(), 15.0);
        assert_eq!(session.load_percent(), 120);
        assert_eq!(session.load_status(), LoadStatus::Danger);

        let kinds: Vec<FindingKind> = session.findings().iter().map(|f| f.kind).collect();
        assert_eq!(kinds, vec![FindingKind::BioloadCritical, FindingKind::TankTooSmall]);
    }

    #[test]
    fn test_configured_thresholds_apply() {
        let mut config = PlannerConfig::default();
        config.default_volume = 10.0;
        config.rules.load_factor = 3.0;
        config.rules.disabled = vec![FindingKind::TankTooSmall];

        let mut session = Session::open(create_test_catalog(), MemoryStore::new(), config);
        session.add_species_by_id("common-pleco", 2).unwrap();

        // 18 / 30 = 60%
        assert_eq!(session.load_percent(), 60);
        assert_eq!(session.load_status(), LoadStatus::Safe);
        assert!(session.findings().is_empty());
    }
}
