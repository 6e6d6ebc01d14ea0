// 📐 Shape Layer - Catalog Validation
// Species records are checked once, when the catalog is built.
// Everything downstream (ledger, evaluator) trusts the catalog.

use crate::species::SpeciesRecord;
use std::collections::HashSet;
use thiserror::Error;

// ============================================================================
// VALIDATION RESULT
// ============================================================================

#[derive(Debug, Clone, PartialEq, Error)]
#[error("[{context}] {field}: {message}")]
pub struct ValidationError {
    pub field: String,
    pub message: String,
    /// Species id (or position when the id itself is missing)
    pub context: String,
}

impl ValidationError {
    fn new(context: &str, field: &str, message: impl Into<String>) -> Self {
        ValidationError {
            field: field.to_string(),
            message: message.into(),
            context: context.to_string(),
        }
    }
}

pub type ValidationResult = Result<(), Vec<ValidationError>>;

// ============================================================================
// SPECIES VALIDATION
// ============================================================================

/// Validate a single record. `position` names records with an empty id.
pub fn validate_species(species: &SpeciesRecord, position: usize) -> ValidationResult {
    let mut errors = Vec::new();

    let context = if species.id.trim().is_empty() {
        errors.push(ValidationError::new(
            &format!("#{}", position),
            "id",
            "Required field is empty",
        ));
        format!("#{}", position)
    } else {
        species.id.clone()
    };

    if species.display_name.trim().is_empty() {
        errors.push(ValidationError::new(
            &context,
            "commonName",
            "Required field is empty",
        ));
    }

    let numbers = [
        ("maxSize", species.adult_size),
        ("minTankSize", species.min_volume),
        ("bioload", species.load_weight),
    ];
    for (field, value) in numbers {
        if !value.is_finite() || value < 0.0 {
            errors.push(ValidationError::new(
                &context,
                field,
                format!("Must be a non-negative number, got {}", value),
            ));
        }
    }

    if let Some(params) = &species.water_params {
        let all_finite = [params.temp_min, params.temp_max, params.ph_min, params.ph_max]
            .iter()
            .all(|v| v.is_finite());

        if !all_finite {
            errors.push(ValidationError::new(
                &context,
                "waterParams",
                "Ranges must be finite numbers",
            ));
        } else {
            if params.temp_min > params.temp_max {
                errors.push(ValidationError::new(
                    &context,
                    "waterParams.temp",
                    format!(
                        "tempMin {} is above tempMax {}",
                        params.temp_min, params.temp_max
                    ),
                ));
            }
            if params.ph_min > params.ph_max {
                errors.push(ValidationError::new(
                    &context,
                    "waterParams.ph",
                    format!("phMin {} is above phMax {}", params.ph_min, params.ph_max),
                ));
            }
        }
    }

    if species.lists_incompatible(&species.id) {
        errors.push(ValidationError::new(
            &context,
            "incompatibleWith",
            "Species lists itself as incompatible",
        ));
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}

// ============================================================================
// CATALOG VALIDATION
// ============================================================================

/// Validate every record plus cross-record constraints (unique ids).
/// All problems are collected; nothing short-circuits.
pub fn validate_catalog(records: &[SpeciesRecord]) -> ValidationResult {
    let mut errors = Vec::new();
    let mut seen: HashSet<&str> = HashSet::new();

    for (position, species) in records.iter().enumerate() {
        if let Err(mut species_errors) = validate_species(species, position) {
            errors.append(&mut species_errors);
        }

        if !species.id.is_empty() && !seen.insert(species.id.as_str()) {
            errors.push(ValidationError::new(
                &species.id,
                "id",
                "Duplicate id in catalog",
            ));
        }
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}

// ============================================================================
// TESTS
// ============================================================================
