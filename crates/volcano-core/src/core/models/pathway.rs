use super::species::{Species, SpeciesParseError};
use std::collections::BTreeMap;
use thiserror::Error;

/// Species of one half-reaction with their stoichiometric counts.
pub type Stoichiometry = BTreeMap<Species, f64>;

#[derive(Debug, Error, Clone, PartialEq)]
pub enum PathwayError {
    #[error("Reaction '{reaction}' defines step {step} more than once")]
    DuplicateStep { reaction: String, step: usize },
    #[error("Reaction '{reaction}' has no steps")]
    NoSteps { reaction: String },
    #[error("Invalid species in reaction '{reaction}', step {step}: {source}")]
    Species {
        reaction: String,
        step: usize,
        #[source]
        source: SpeciesParseError,
    },
}

/// One elementary step: `reactants -> products`.
#[derive(Debug, Clone, PartialEq)]
pub struct ReactionStep {
    pub index: usize,
    pub reactants: Stoichiometry,
    pub products: Stoichiometry,
}

impl ReactionStep {
    pub fn new(index: usize, reactants: Stoichiometry, products: Stoichiometry) -> Self {
        Self {
            index,
            reactants,
            products,
        }
    }

    /// Builds a step from raw species labels. Labels that resolve to the same species
    /// (e.g. `H2O_l` and `H2O_g`) have their counts summed.
    pub fn from_labels<'a, R, P>(
        reaction: &str,
        index: usize,
        reactants: R,
        products: P,
    ) -> Result<Self, PathwayError>
    where
        R: IntoIterator<Item = (&'a str, f64)>,
        P: IntoIterator<Item = (&'a str, f64)>,
    {
        let parse_half = |half: Vec<(&str, f64)>| -> Result<Stoichiometry, PathwayError> {
            let mut stoichiometry = Stoichiometry::new();
            for (label, count) in half {
                let species = Species::parse(label).map_err(|source| PathwayError::Species {
                    reaction: reaction.to_string(),
                    step: index,
                    source,
                })?;
                *stoichiometry.entry(species).or_insert(0.0) += count;
            }
            Ok(stoichiometry)
        };

        Ok(Self {
            index,
            reactants: parse_half(reactants.into_iter().collect())?,
            products: parse_half(products.into_iter().collect())?,
        })
    }
}

/// A named reaction with its steps in ascending index order.
#[derive(Debug, Clone, PartialEq)]
pub struct ReactionPathway {
    name: String,
    comment: Option<String>,
    steps: Vec<ReactionStep>,
}

impl ReactionPathway {
    pub fn new(
        name: impl Into<String>,
        comment: Option<String>,
        mut steps: Vec<ReactionStep>,
    ) -> Result<Self, PathwayError> {
        let name = name.into();
        if steps.is_empty() {
            return Err(PathwayError::NoSteps { reaction: name });
        }
        steps.sort_by_key(|step| step.index);
        if let Some(pair) = steps.windows(2).find(|pair| pair[0].index == pair[1].index) {
            return Err(PathwayError::DuplicateStep {
                reaction: name,
                step: pair[0].index,
            });
        }
        Ok(Self {
            name,
            comment,
            steps,
        })
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Free-text metadata carried alongside the steps; never part of the chemistry.
    pub fn comment(&self) -> Option<&str> {
        self.comment.as_deref()
    }

    pub fn steps(&self) -> &[ReactionStep] {
        &self.steps
    }

    pub fn step_indices(&self) -> Vec<usize> {
        self.steps.iter().map(|step| step.index).collect()
    }
}

/// All reaction pathways of a study, keyed by reaction name.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ReactionNetwork {
    reactions: BTreeMap<String, ReactionPathway>,
}

impl ReactionNetwork {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, pathway: ReactionPathway) {
        self.reactions.insert(pathway.name.clone(), pathway);
    }

    pub fn get(&self, name: &str) -> Option<&ReactionPathway> {
        self.reactions.get(name)
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.reactions.keys().map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.reactions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.reactions.is_empty()
    }
}

impl FromIterator<ReactionPathway> for ReactionNetwork {
    fn from_iter<T: IntoIterator<Item = ReactionPathway>>(iter: T) -> Self {
        let mut network = Self::new();
        for pathway in iter {
            network.insert(pathway);
        }
        network
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn from_labels_parses_and_merges_equivalent_species() {
        let step = ReactionStep::from_labels(
            "HER",
            1,
            [("*", 1.0), ("PEP", 1.0)],
            [("*H", 1.0), ("H2O_l", 1.0), ("H2O_g", 2.0)],
        )
        .unwrap();

        assert_eq!(step.reactants.get(&Species::CleanSite), Some(&1.0));
        assert_eq!(step.reactants.get(&Species::ProtonElectronPair), Some(&1.0));
        assert_eq!(step.products.get(&Species::Adsorbed("H".to_string())), Some(&1.0));
        assert_eq!(step.products.get(&Species::Free("H2O".to_string())), Some(&3.0));
    }

    #[test]
    fn from_labels_reports_step_of_invalid_species() {
        let result = ReactionStep::from_labels("HER", 2, [("", 1.0)], Vec::<(&str, f64)>::new());
        assert!(matches!(
            result,
            Err(PathwayError::Species { step: 2, .. })
        ));
    }

    #[test]
    fn pathway_sorts_steps_by_index() {
        let steps = vec![
            ReactionStep::new(2, Stoichiometry::new(), Stoichiometry::new()),
            ReactionStep::new(1, Stoichiometry::new(), Stoichiometry::new()),
        ];
        let pathway = ReactionPathway::new("CO2RR", None, steps).unwrap();
        assert_eq!(pathway.step_indices(), vec![1, 2]);
    }

    #[test]
    fn pathway_rejects_duplicate_and_missing_steps() {
        let steps = vec![
            ReactionStep::new(1, Stoichiometry::new(), Stoichiometry::new()),
            ReactionStep::new(1, Stoichiometry::new(), Stoichiometry::new()),
        ];
        assert!(matches!(
            ReactionPathway::new("CO2RR", None, steps),
            Err(PathwayError::DuplicateStep { step: 1, .. })
        ));
        assert!(matches!(
            ReactionPathway::new("CO2RR", None, vec![]),
            Err(PathwayError::NoSteps { .. })
        ));
    }

    #[test]
    fn network_collects_pathways_by_name() {
        let step = || ReactionStep::new(1, Stoichiometry::new(), Stoichiometry::new());
        let network: ReactionNetwork = [
            ReactionPathway::new("HER", None, vec![step()]).unwrap(),
            ReactionPathway::new("CO2RR", Some("to CO".to_string()), vec![step()]).unwrap(),
        ]
        .into_iter()
        .collect();

        assert_eq!(network.len(), 2);
        assert_eq!(network.names().collect::<Vec<_>>(), vec!["CO2RR", "HER"]);
        assert_eq!(network.get("CO2RR").unwrap().comment(), Some("to CO"));
        assert!(network.get("ORR").is_none());
    }
}
