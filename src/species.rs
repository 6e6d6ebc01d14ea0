// 🐠 Species Records - Immutable catalog entries
// One record per species, keyed by a stable string id.
//
// Field names on the wire follow the host catalog document
// (commonName, minTankSize, bioload, ...), Rust names follow what they mean.

use serde::{Deserialize, Serialize};

// ============================================================================
// CATEGORY
// ============================================================================

/// Primary animal group. Closed set: anything else fails to parse.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Category {
    Fish,
    Snail,
    Shrimp,
}

impl Category {
    pub fn as_str(&self) -> &'static str {
        match self {
            Category::Fish => "fish",
            Category::Snail => "snail",
            Category::Shrimp => "shrimp",
        }
    }

    /// Parse a category name (case-insensitive)
    pub fn parse(s: &str) -> Option<Category> {
        match s.trim().to_lowercase().as_str() {
            "fish" => Some(Category::Fish),
            "snail" | "snails" => Some(Category::Snail),
            "shrimp" => Some(Category::Shrimp),
            _ => None,
        }
    }
}

impl std::fmt::Display for Category {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.pad(self.as_str())
    }
}

// ============================================================================
// DESCRIPTORS
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Temperament {
    Peaceful,
    #[serde(alias = "semi_aggressive", alias = "semi aggressive")]
    SemiAggressive,
    Aggressive,
    #[default]
    #[serde(other)]
    Unknown,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CareLevel {
    #[serde(alias = "beginner")]
    Easy,
    #[serde(alias = "intermediate")]
    Moderate,
    #[serde(alias = "expert", alias = "advanced")]
    Difficult,
    #[default]
    #[serde(other)]
    Unknown,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Diet {
    Omnivore,
    Carnivore,
    Herbivore,
    #[default]
    #[serde(other)]
    Unknown,
}

/// Preferred swimming level in the tank
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Position {
    Top,
    #[serde(alias = "mid")]
    Middle,
    Bottom,
    #[serde(alias = "any")]
    All,
    #[default]
    #[serde(other)]
    Unknown,
}

// ============================================================================
// WATER PARAMETERS
// ============================================================================

/// Tolerated water ranges. Validated so that min <= max.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WaterParams {
    pub temp_min: f64,
    pub temp_max: f64,
    pub ph_min: f64,
    pub ph_max: f64,
}

impl WaterParams {
    pub fn new(temp_min: f64, temp_max: f64, ph_min: f64, ph_max: f64) -> Self {
        WaterParams {
            temp_min,
            temp_max,
            ph_min,
            ph_max,
        }
    }

    /// Width of the shared temperature band (negative when disjoint)
    pub fn temp_overlap(&self, other: &WaterParams) -> f64 {
        self.temp_max.min(other.temp_max) - self.temp_min.max(other.temp_min)
    }

    /// Width of the shared pH band (negative when disjoint)
    pub fn ph_overlap(&self, other: &WaterParams) -> f64 {
        self.ph_max.min(other.ph_max) - self.ph_min.max(other.ph_min)
    }
}

// ============================================================================
// BEHAVIOR FLAGS
// ============================================================================

/// Husbandry flags carried by a species. All default to "not set".
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Behavior {
    /// Needs to be kept in a group
    pub schooling: bool,

    /// Smallest comfortable group when `schooling` is set
    #[serde(skip_serializing_if = "Option::is_none")]
    pub min_school: Option<u32>,

    /// Fights with its own kind
    #[serde(rename = "sameSpeciesAggression")]
    pub solitary_aggression: bool,

    pub territorial: bool,

    #[serde(rename = "predator")]
    pub predatory: bool,

    pub fin_nipper: bool,

    #[serde(rename = "eatsSnails")]
    pub snail_eater: bool,

    #[serde(rename = "isPest")]
    pub pest: bool,
}

impl Behavior {
    /// Minimum group size, only meaningful for schooling species
    pub fn required_school(&self) -> Option<u32> {
        if self.schooling {
            self.min_school.filter(|n| *n > 0)
        } else {
            None
        }
    }
}

// ============================================================================
// SPECIES RECORD
// ============================================================================

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SpeciesRecord {
    /// Unique across the catalog
    pub id: String,

    #[serde(rename = "commonName")]
    pub display_name: String,

    #[serde(default)]
    pub scientific_name: String,

    #[serde(rename = "type")]
    pub category: Category,

    /// Adult length
    #[serde(rename = "maxSize", default)]
    pub adult_size: f64,

    /// Smallest container this species should live in
    #[serde(rename = "minTankSize", default)]
    pub min_volume: f64,

    /// Per-individual contribution to the tank load
    #[serde(rename = "bioload", default)]
    pub load_weight: f64,

    #[serde(default)]
    pub temperament: Temperament,

    #[serde(default)]
    pub care_level: CareLevel,

    #[serde(default)]
    pub diet: Diet,

    #[serde(default)]
    pub position: Position,

    #[serde(flatten)]
    pub behavior: Behavior,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub water_params: Option<WaterParams>,

    /// Ids this species must never share a tank with
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub incompatible_with: Vec<String>,

    #[serde(default)]
    pub notes: String,
}

impl SpeciesRecord {
    /// Create a record with neutral defaults; callers fill in the rest
    pub fn new(id: &str, display_name: &str, category: Category) -> Self {
        SpeciesRecord {
            id: id.to_string(),
            display_name: display_name.to_string(),
            scientific_name: String::new(),
            category,
            adult_size: 0.0,
            min_volume: 0.0,
            load_weight: 0.0,
            temperament: Temperament::default(),
            care_level: CareLevel::default(),
            diet: Diet::default(),
            position: Position::default(),
            behavior: Behavior::default(),
            water_params: None,
            incompatible_with: Vec::new(),
            notes: String::new(),
        }
    }

    pub fn is_fish(&self) -> bool {
        self.category == Category::Fish
    }

    pub fn is_snail(&self) -> bool {
        self.category == Category::Snail
    }

    pub fn is_shrimp(&self) -> bool {
        self.category == Category::Shrimp
    }

    /// True when this record explicitly names `other_id` as incompatible
    pub fn lists_incompatible(&self, other_id: &str) -> bool {
        self.incompatible_with.iter().any(|id| id == other_id)
    }

    /// Text used by catalog search
    pub fn searchable_text(&self) -> String {
        format!("{} {}", self.display_name, self.scientific_name).to_lowercase()
    }
}

// ============================================================================
// TESTS
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_host_document() {
        let json = r#"{
            "id": "neon-tetra",
            "commonName": "Neon Tetra",
            "scientificName": "Paracheirodon innesi",
            "type": "fish",
            "maxSize": 1.5,
            "minTankSize": 10,
            "bioload": 1,
            "temperament": "peaceful",
            "careLevel": "easy",
            "diet": "omnivore",
            "schooling": true,
            "minSchool": 6,
            "waterParams": { "tempMin": 70, "tempMax": 81, "phMin": 6.0, "phMax": 7.0 },
            "incompatibleWith": ["oscar"],
            "notes": "Prefers dim lighting and plants"
        }"#;

        let species: SpeciesRecord = serde_json::from_str(json).unwrap();

        assert_eq!(species.id, "neon-tetra");
        assert_eq!(species.display_name, "Neon Tetra");
        assert_eq!(species.category, Category::Fish);
        assert_eq!(species.min_volume, 10.0);
        assert_eq!(species.behavior.required_school(), Some(6));
        assert!(!species.behavior.territorial);
        assert!(species.lists_incompatible("oscar"));
        assert_eq!(species.water_params.unwrap().temp_max, 81.0);
        assert_eq!(species.position, Position::Unknown);
    }

    #[test]
    fn test_unknown_descriptor_falls_back() {
        let json = r#"{
            "id": "x", "commonName": "X", "type": "snail",
            "temperament": "grumpy", "diet": "detritivore"
        }"#;

        let species: SpeciesRecord = serde_json::from_str(json).unwrap();

        assert_eq!(species.temperament, Temperament::Unknown);
        assert_eq!(species.diet, Diet::Unknown);
        assert!(species.is_snail());
    }

    #[test]
    fn test_unknown_category_rejected() {
        let json = r#"{ "id": "x", "commonName": "X", "type": "crab" }"#;
        assert!(serde_json::from_str::<SpeciesRecord>(json).is_err());
    }

    #[test]
    fn test_school_size_requires_schooling_flag() {
        let mut behavior = Behavior {
            min_school: Some(6),
            ..Behavior::default()
        };
        assert_eq!(behavior.required_school(), None);

        behavior.schooling = true;
        assert_eq!(behavior.required_school(), Some(6));

        behavior.min_school = Some(0);
        assert_eq!(behavior.required_school(), None);
    }

    #[test]
    fn test_overlap_widths() {
        let a = WaterParams::new(72.0, 82.0, 6.5, 7.5);
        let b = WaterParams::new(79.0, 88.0, 7.0, 8.0);

        assert_eq!(a.temp_overlap(&b), 3.0);
        assert_eq!(a.ph_overlap(&b), 0.5);

        let c = WaterParams::new(82.0, 88.0, 8.0, 8.5);
        assert_eq!(a.temp_overlap(&c), 0.0);
        assert_eq!(a.ph_overlap(&c), -0.5);
    }

    #[test]
    fn test_category_parse() {
        assert_eq!(Category::parse("Shrimp"), Some(Category::Shrimp));
        assert_eq!(Category::parse("snails"), Some(Category::Snail));
        assert_eq!(Category::parse("crab"), None);
    }
}
