use std::collections::HashSet;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::ConfigError;

/// Built-in roster used when no brands file is configured.
pub const DEFAULT_BRANDS: &[&str] = &[
    // Electronics / smart home
    "Atomberg",
    "Havells",
    "Orient",
    "Crompton",
    "Bajaj",
    "Usha",
    "Luminous",
    // Technology
    "Apple",
    "Samsung",
    "Google",
    "Microsoft",
    "Sony",
    "LG",
    "OnePlus",
    // Apparel
    "Nike",
    "Adidas",
    "Puma",
    "Reebok",
    "Under Armour",
    "New Balance",
    // Automotive
    "Toyota",
    "Honda",
    "Ford",
    "BMW",
    "Mercedes",
    "Audi",
    "Hyundai",
    // General consumer
    "Amazon",
    "Flipkart",
    "Reliance",
    "Tata",
    "Godrej",
    "ITC",
    "HUL",
];

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BrandConfig {
    pub name: String,
    pub notes: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct BrandsFile {
    pub brands: Vec<BrandConfig>,
}

/// The set of competitor brands mention detection looks for.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BrandRoster {
    names: Vec<String>,
}

impl Default for BrandRoster {
    fn default() -> Self {
        Self {
            names: DEFAULT_BRANDS.iter().map(|b| (*b).to_string()).collect(),
        }
    }
}

impl BrandRoster {
    /// Build a roster from arbitrary names, dropping blanks and
    /// case-insensitive duplicates (first spelling wins).
    #[must_use]
    pub fn from_names<I, S>(names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let mut seen = HashSet::new();
        let names = names
            .into_iter()
            .map(|n| n.as_ref().trim().to_string())
            .filter(|n| !n.is_empty())
            .filter(|n| seen.insert(n.to_lowercase()))
            .collect();
        Self { names }
    }

    #[must_use]
    pub fn names(&self) -> &[String] {
        &self.names
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.names.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.names.is_empty()
    }

    /// The roster for one run: the target brand first, then every other
    /// roster brand whose name differs from the target case-insensitively.
    #[must_use]
    pub fn for_target(&self, target_brand: &str) -> Vec<String> {
        let target = target_brand.trim();
        let target_lower = target.to_lowercase();
        std::iter::once(target.to_string())
            .chain(
                self.names
                    .iter()
                    .filter(|n| n.to_lowercase() != target_lower)
                    .cloned(),
            )
            .collect()
    }
}

/// Load the roster from `path` when given, otherwise return the built-in one.
///
/// # Errors
///
/// Returns `ConfigError` if the file cannot be read, parsed, or fails validation.
pub fn load_roster(path: Option<&Path>) -> Result<BrandRoster, ConfigError> {
    let Some(path) = path else {
        return Ok(BrandRoster::default());
    };

    let content = std::fs::read_to_string(path).map_err(|e| ConfigError::BrandsFileIo {
        path: path.display().to_string(),
        source: e,
    })?;

    parse_roster(&content)
}

fn parse_roster(content: &str) -> Result<BrandRoster, ConfigError> {
    let brands_file: BrandsFile =
        serde_yaml::from_str(content).map_err(ConfigError::BrandsFileParse)?;

    validate_brands(&brands_file)?;

    Ok(BrandRoster::from_names(
        brands_file.brands.iter().map(|b| b.name.as_str()),
    ))
}

fn validate_brands(brands_file: &BrandsFile) -> Result<(), ConfigError> {
    if brands_file.brands.is_empty() {
        return Err(ConfigError::Validation(
            "brands file must list at least one brand".to_string(),
        ));
    }

    let mut seen_names = HashSet::new();

    for brand in &brands_file.brands {
        if brand.name.trim().is_empty() {
            return Err(ConfigError::Validation(
                "brand name must be non-empty".to_string(),
            ));
        }

        let lower_name = brand.name.trim().to_lowercase();
        if !seen_names.insert(lower_name) {
            return Err(ConfigError::Validation(format!(
                "duplicate brand name: '{}'",
                brand.name
            )));
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_roster_has_every_builtin_brand() {
        let roster = BrandRoster::default();
        assert_eq!(roster.len(), DEFAULT_BRANDS.len());
        assert_eq!(roster.names()[0], "Atomberg");
    }

    #[test]
    fn for_target_puts_target_first_without_duplicate() {
        let roster = BrandRoster::from_names(["Atomberg", "Havells", "Orient"]);
        let run = roster.for_target("atomberg");
        assert_eq!(run, vec!["atomberg", "Havells", "Orient"]);
    }

    #[test]
    fn for_target_adds_unknown_target() {
        let roster = BrandRoster::from_names(["Havells", "Orient"]);
        let run = roster.for_target(" Polycab ");
        assert_eq!(run, vec!["Polycab", "Havells", "Orient"]);
    }

    #[test]
    fn from_names_drops_blank_and_duplicate_names() {
        let roster = BrandRoster::from_names(["LG", " ", "lg", "Sony"]);
        assert_eq!(roster.names(), &["LG".to_string(), "Sony".to_string()]);
    }

    #[test]
    fn parse_roster_accepts_valid_yaml() {
        let yaml = "brands:\n  - name: Atomberg\n    notes: target\n  - name: Havells\n";
        let roster = parse_roster(yaml).unwrap();
        assert_eq!(roster.names(), &["Atomberg".to_string(), "Havells".to_string()]);
    }

    #[test]
    fn parse_roster_rejects_duplicate_names() {
        let yaml = "brands:\n  - name: Orient\n  - name: ORIENT\n";
        let result = parse_roster(yaml);
        assert!(
            matches!(result, Err(ConfigError::Validation(ref msg)) if msg.contains("duplicate")),
            "expected duplicate validation error, got: {result:?}"
        );
    }

    #[test]
    fn parse_roster_rejects_empty_list() {
        let result = parse_roster("brands: []\n");
        assert!(matches!(result, Err(ConfigError::Validation(_))));
    }

    #[test]
    fn parse_roster_rejects_malformed_yaml() {
        let result = parse_roster("brands: [unterminated");
        assert!(matches!(result, Err(ConfigError::BrandsFileParse(_))));
    }

    #[test]
    fn load_roster_without_path_uses_defaults() {
        let roster = load_roster(None).unwrap();
        assert_eq!(roster, BrandRoster::default());
    }

    #[test]
    fn load_roster_reports_missing_file() {
        let result = load_roster(Some(Path::new("/nonexistent/brands.yaml")));
        assert!(matches!(result, Err(ConfigError::BrandsFileIo { .. })));
    }
}
