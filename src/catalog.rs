// 📚 Species Catalog - Read-only registry
// Supplied once by the host. Ordered records plus an id index.
// Nothing in the crate mutates it after construction.

use crate::error::CatalogError;
use crate::schema::validate_catalog;
use crate::species::{Category, SpeciesRecord};
use std::collections::HashMap;
use std::fs;
use std::path::Path;

// ============================================================================
// CATALOG
// ============================================================================

#[derive(Debug, Clone, Default)]
pub struct Catalog {
    records: Vec<SpeciesRecord>,
    index: HashMap<String, usize>,
}

impl Catalog {
    /// Build a catalog from records, validating them once
    pub fn new(records: Vec<SpeciesRecord>) -> Result<Self, CatalogError> {
        validate_catalog(&records).map_err(CatalogError::Invalid)?;

        let index = records
            .iter()
            .enumerate()
            .map(|(i, species)| (species.id.clone(), i))
            .collect();

        Ok(Catalog { records, index })
    }

    /// Parse a JSON array of species records
    pub fn from_json_str(json: &str) -> Result<Self, CatalogError> {
        let records: Vec<SpeciesRecord> = serde_json::from_str(json)?;
        Catalog::new(records)
    }

    /// Load a JSON catalog file
    pub fn from_json_file<P: AsRef<Path>>(path: P) -> Result<Self, CatalogError> {
        let path = path.as_ref();
        let content = fs::read_to_string(path).map_err(|source| CatalogError::Read {
            path: path.display().to_string(),
            source,
        })?;

        Catalog::from_json_str(&content)
    }

    /// Find species by id
    pub fn get(&self, id: &str) -> Option<&SpeciesRecord> {
        self.index.get(id).map(|&i| &self.records[i])
    }

    pub fn contains(&self, id: &str) -> bool {
        self.index.contains_key(id)
    }

    /// All species, in catalog order
    pub fn iter(&self) -> impl Iterator<Item = &SpeciesRecord> {
        self.records.iter()
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Species in one category, in catalog order
    pub fn by_category(&self, category: Category) -> Vec<&SpeciesRecord> {
        self.records
            .iter()
            .filter(|s| s.category == category)
            .collect()
    }

    /// Case-insensitive search over common + scientific name,
    /// optionally restricted to one category
    pub fn search(&self, category: Option<Category>, term: &str) -> Vec<&SpeciesRecord> {
        let term = term.trim().to_lowercase();
        let candidates = match category {
            Some(c) => self.by_category(c),
            None => self.records.iter().collect(),
        };

        candidates
            .into_iter()
            .filter(|s| term.is_empty() || s.searchable_text().contains(&term))
            .collect()
    }
}

// ============================================================================
// TESTS
// ============================================================================
