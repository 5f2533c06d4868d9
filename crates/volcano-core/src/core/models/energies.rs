use std::collections::{BTreeMap, HashMap};

/// Marks a correction entry as referring to the adsorbed state of a species.
pub const ADSORBED_CORRECTION_PREFIX: &str = "*";

/// Standalone free energies (eV) of species, keyed by name without phase suffix.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct FreeEnergies {
    energies: BTreeMap<String, f64>,
}

impl FreeEnergies {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, name: impl Into<String>, energy: f64) {
        self.energies.insert(name.into(), energy);
    }

    pub fn get(&self, name: &str) -> Option<f64> {
        self.energies.get(name).copied()
    }

    pub fn len(&self) -> usize {
        self.energies.len()
    }

    pub fn is_empty(&self) -> bool {
        self.energies.is_empty()
    }
}

impl<S: Into<String>> FromIterator<(S, f64)> for FreeEnergies {
    fn from_iter<T: IntoIterator<Item = (S, f64)>>(iter: T) -> Self {
        Self {
            energies: iter
                .into_iter()
                .map(|(name, energy)| (name.into(), energy))
                .collect(),
        }
    }
}

/// Additive thermal corrections (eV) converting adsorption energies to free energies.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ThermalCorrections {
    corrections: HashMap<String, f64>,
}

impl ThermalCorrections {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, species: impl Into<String>, correction: f64) {
        self.corrections.insert(species.into(), correction);
    }

    /// Correction for a species label exactly as written in the correction table.
    pub fn get(&self, species: &str) -> Option<f64> {
        self.corrections.get(species).copied()
    }

    /// Correction for the adsorbed state of `adsorbate`, stored under `*<adsorbate>`.
    pub fn adsorbed(&self, adsorbate: &str) -> Option<f64> {
        self.get(&format!("{}{}", ADSORBED_CORRECTION_PREFIX, adsorbate))
    }
}

impl<S: Into<String>> FromIterator<(S, f64)> for ThermalCorrections {
    fn from_iter<T: IntoIterator<Item = (S, f64)>>(iter: T) -> Self {
        Self {
            corrections: iter
                .into_iter()
                .map(|(species, correction)| (species.into(), correction))
                .collect(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn free_energies_lookup_by_name() {
        let energies: FreeEnergies = [("H2", -6.8), ("CO2", -23.0)].into_iter().collect();
        assert_eq!(energies.get("H2"), Some(-6.8));
        assert_eq!(energies.get("CO"), None);
        assert_eq!(energies.len(), 2);
    }

    #[test]
    fn adsorbed_correction_uses_prefixed_key() {
        let corrections: ThermalCorrections =
            [("*CO", 0.12), ("CO", 0.5)].into_iter().collect();
        assert_eq!(corrections.adsorbed("CO"), Some(0.12));
        assert_eq!(corrections.get("CO"), Some(0.5));
        assert_eq!(corrections.adsorbed("OH"), None);
    }
}
