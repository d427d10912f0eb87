//! District name aliases
//!
//! Source datasets spell the same district differently: administrative
//! renames (`MYSORE` → `MYSURU`), abbreviations of urban/rural splits
//! (`BENGALURU (U)`), and plain typos (`UDUDPI`). An [`AliasTable`] maps every
//! known variant onto one canonical spelling and leaves everything else as-is.
//!
//! The table is kept closed under resolution: a canonical spelling is never
//! itself registered as a variant, so resolving a name twice gives the same
//! result as resolving it once.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::normalize::canonical_key;

/// Mapping from upper-cased district spelling variants to canonical names.
///
/// # Examples
///
/// ```
/// use civicscope_data::alias::AliasTable;
///
/// let aliases = AliasTable::karnataka();
/// assert_eq!(aliases.resolve("BELLARY"), "BALLARI");
/// assert_eq!(aliases.resolve("bellary"), "BALLARI");
/// assert_eq!(aliases.resolve("DHARWAD"), "DHARWAD");
/// ```
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "BTreeMap<String, String>", into = "BTreeMap<String, String>")]
pub struct AliasTable {
    aliases: BTreeMap<String, String>,
}

impl AliasTable {
    /// An empty table: every name resolves to itself.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Variants seen in the Karnataka PM-KISAN, MGNREGA and census exports.
    #[must_use]
    pub fn karnataka() -> Self {
        Self::new()
            .with_alias("BENGALURU (U)", "BENGALURU URBAN")
            .with_alias("BENGALURU (R)", "BENGALURU RURAL")
            .with_alias("MYSORE", "MYSURU")
            .with_alias("UDUDPI", "UDUPI")
            .with_alias("KALBURGI", "KALABURAGI")
            .with_alias("BELLARY", "BALLARI")
    }

    /// Registers `variant` as another spelling of `canonical`.
    ///
    /// Both names are canonicalized as keys first. If `canonical` is already a
    /// known variant, the new alias points at its target instead; existing
    /// aliases that pointed at `variant` are redirected to the new target.
    #[must_use]
    pub fn with_alias(mut self, variant: &str, canonical: &str) -> Self {
        let variant = canonical_key(variant);
        let target = self.resolve(canonical);
        if variant == target {
            return self;
        }
        for existing in self.aliases.values_mut() {
            if *existing == variant {
                existing.clone_from(&target);
            }
        }
        self.aliases.insert(variant, target);
        self
    }

    /// Resolves a district name to its canonical spelling.
    ///
    /// The lookup is done on the canonical key form of `name`, and the
    /// canonical key is returned when no alias matches.
    #[must_use]
    pub fn resolve(&self, name: &str) -> String {
        let key = canonical_key(name);
        match self.aliases.get(&key) {
            Some(canonical) => canonical.clone(),
            None => key,
        }
    }

    /// Returns `true` if `name` is a registered non-canonical spelling.
    #[must_use]
    pub fn is_variant(&self, name: &str) -> bool {
        self.aliases.contains_key(&canonical_key(name))
    }

    /// Iterates `(variant, canonical)` pairs in variant order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> + '_ {
        self.aliases.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.aliases.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.aliases.is_empty()
    }
}

impl From<BTreeMap<String, String>> for AliasTable {
    fn from(map: BTreeMap<String, String>) -> Self {
        map.iter()
            .fold(Self::new(), |table, (variant, canonical)| {
                table.with_alias(variant, canonical)
            })
    }
}

impl From<AliasTable> for BTreeMap<String, String> {
    fn from(table: AliasTable) -> Self {
        table.aliases
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_identity_for_unknown_names() {
        let aliases = AliasTable::new();
        assert_eq!(aliases.resolve("Kodagu"), "KODAGU");
        assert!(!aliases.is_variant("KODAGU"));
    }

    #[test]
    fn test_karnataka_variants() {
        let aliases = AliasTable::karnataka();
        assert_eq!(aliases.len(), 6);
        assert_eq!(aliases.resolve("Bengaluru (U)"), "BENGALURU URBAN");
        assert_eq!(aliases.resolve("BENGALURU (R)"), "BENGALURU RURAL");
        assert_eq!(aliases.resolve("Kalburgi"), "KALABURAGI");
        assert_eq!(aliases.resolve("UDUDPI"), "UDUPI");
    }

    #[test]
    fn test_resolution_is_idempotent() {
        let aliases = AliasTable::karnataka();
        for (variant, _) in aliases.iter() {
            let once = aliases.resolve(variant);
            assert_eq!(aliases.resolve(&once), once);
            assert!(!aliases.is_variant(&once));
        }
    }

    #[test]
    fn test_chained_aliases_collapse() {
        let aliases = AliasTable::new()
            .with_alias("GULBARGA", "KALBURGI")
            .with_alias("KALBURGI", "KALABURAGI");
        assert_eq!(aliases.resolve("GULBARGA"), "KALABURAGI");
        assert_eq!(aliases.resolve("KALBURGI"), "KALABURAGI");

        let reversed = AliasTable::new()
            .with_alias("KALBURGI", "KALABURAGI")
            .with_alias("GULBARGA", "KALBURGI");
        assert_eq!(reversed.resolve("GULBARGA"), "KALABURAGI");
    }

    #[test]
    fn test_self_alias_is_ignored() {
        let aliases = AliasTable::new().with_alias("udupi", "UDUPI");
        assert!(aliases.is_empty());
    }

    #[test]
    fn test_json_roundtrip_keeps_mapping() {
        let json = serde_json::to_string(&AliasTable::karnataka()).unwrap();
        let parsed: AliasTable = serde_json::from_str(&json).unwrap();
        assert_eq!(parsed, AliasTable::karnataka());
    }
}
