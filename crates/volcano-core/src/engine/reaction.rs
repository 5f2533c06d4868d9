use crate::core::diagnostics::{Diagnostics, Warning};
use crate::core::models::energies::FreeEnergies;
use crate::core::models::pathway::{ReactionNetwork, ReactionPathway, ReactionStep, Stoichiometry};
use crate::core::models::species::Species;
use crate::core::models::table::EnergyTable;
use crate::core::scaling::fitter::ScalingRelations;
use crate::core::scaling::term::{LinearTerm, StepLinearFunction};
use std::collections::BTreeMap;
use thiserror::Error;
use tracing::{debug, instrument};

/// Free species whose half energy sets the computational hydrogen electrode reference.
pub const HYDROGEN: &str = "H2";

const UNIT_COUNT_TOLERANCE: f64 = 1e-12;

#[derive(Debug, Error, Clone, PartialEq)]
pub enum ReactionError {
    #[error("Reaction '{reaction}' is not defined in the reaction pathway")]
    UnknownReaction { reaction: String },
    #[error("No standalone free energy for species '{species}'")]
    UnknownFreeEnergy { species: String },
    #[error("No scaling relation for adsorbed species '{species}'")]
    UnknownScalingRelation { species: String },
    #[error("Sample '{sample}' has no adsorption free energy for '{species}'")]
    UnknownAdsorptionEnergy { sample: String, species: String },
}

/// Source of the adsorption free energy of an adsorbed species, expressed over the descriptors.
pub trait AdsorptionModel {
    fn adsorption_term(&self, adsorbate: &str) -> Result<LinearTerm, ReactionError>;
}

impl AdsorptionModel for ScalingRelations {
    fn adsorption_term(&self, adsorbate: &str) -> Result<LinearTerm, ReactionError> {
        self.get(adsorbate)
            .copied()
            .ok_or_else(|| ReactionError::UnknownScalingRelation {
                species: adsorbate.to_string(),
            })
    }
}

/// Actual adsorption free energies of one table row, as constant terms.
#[derive(Debug, Clone, Copy)]
pub struct SampleAdsorption<'a> {
    table: &'a EnergyTable,
    row: usize,
}

impl<'a> SampleAdsorption<'a> {
    pub fn new(table: &'a EnergyTable, row: usize) -> Self {
        Self { table, row }
    }

    pub fn sample(&self) -> &str {
        self.table
            .samples()
            .get(self.row)
            .map(String::as_str)
            .unwrap_or_default()
    }
}

impl AdsorptionModel for SampleAdsorption<'_> {
    fn adsorption_term(&self, adsorbate: &str) -> Result<LinearTerm, ReactionError> {
        self.table
            .value(self.row, adsorbate)
            .map(LinearTerm::constant)
            .ok_or_else(|| ReactionError::UnknownAdsorptionEnergy {
                sample: self.sample().to_string(),
                species: adsorbate.to_string(),
            })
    }
}

/// Step functions of one reaction in ascending step order.
#[derive(Debug, Clone, PartialEq)]
pub struct ReactionScaling {
    reaction: String,
    steps: BTreeMap<usize, StepLinearFunction>,
    diagnostics: Diagnostics,
}

impl ReactionScaling {
    pub fn reaction(&self) -> &str {
        &self.reaction
    }

    pub fn steps(&self) -> &BTreeMap<usize, StepLinearFunction> {
        &self.steps
    }

    /// Step keys in the order rate-determining-step indices refer to.
    pub fn step_indices(&self) -> Vec<usize> {
        self.steps.keys().copied().collect()
    }

    pub fn step_functions(&self) -> Vec<(usize, StepLinearFunction)> {
        self.steps.iter().map(|(k, f)| (*k, *f)).collect()
    }

    pub fn diagnostics(&self) -> &Diagnostics {
        &self.diagnostics
    }
}

/// Translates reaction pathways into linear functions of the two descriptors.
///
/// Each half of a step sums its species' contributions; the step function is
/// `products - reactants`:
///
/// | species | contribution |
/// |---------|--------------|
/// | `*`     | 0 |
/// | `*X`    | `n · (G(X) + adsorption term of X)` |
/// | `PEP`   | `n · (½·G(H2) − U)` |
/// | `X`     | `n · G(X)` |
pub struct ReactionScalingCalculator<'a, M: AdsorptionModel> {
    model: &'a M,
    network: &'a ReactionNetwork,
    free_energies: &'a FreeEnergies,
    external_potential: f64,
}

impl<'a, M: AdsorptionModel> ReactionScalingCalculator<'a, M> {
    pub fn new(
        model: &'a M,
        network: &'a ReactionNetwork,
        free_energies: &'a FreeEnergies,
        external_potential: f64,
    ) -> Self {
        Self {
            model,
            network,
            free_energies,
            external_potential,
        }
    }

    #[instrument(skip_all, name = "reaction_scaling", fields(reaction = reaction))]
    pub fn calculate(&self, reaction: &str) -> Result<ReactionScaling, ReactionError> {
        let pathway = self.pathway(reaction)?;
        let steps = self.evaluate_pathway(pathway)?;
        for (index, function) in &steps {
            debug!(
                "Step {}: ΔG = {:.4}·x + {:.4}·y + {:.4}",
                index, function.a, function.b, function.c
            );
        }
        Ok(ReactionScaling {
            reaction: reaction.to_string(),
            steps,
            diagnostics: stoichiometry_warnings(pathway),
        })
    }

    /// Step functions without collecting diagnostics, for repeated per-sample evaluation.
    pub fn step_functions(
        &self,
        reaction: &str,
    ) -> Result<BTreeMap<usize, StepLinearFunction>, ReactionError> {
        self.evaluate_pathway(self.pathway(reaction)?)
    }

    fn pathway(&self, reaction: &str) -> Result<&'a ReactionPathway, ReactionError> {
        self.network
            .get(reaction)
            .ok_or_else(|| ReactionError::UnknownReaction {
                reaction: reaction.to_string(),
            })
    }

    fn evaluate_pathway(
        &self,
        pathway: &ReactionPathway,
    ) -> Result<BTreeMap<usize, StepLinearFunction>, ReactionError> {
        pathway
            .steps()
            .iter()
            .map(|step| -> Result<(usize, StepLinearFunction), ReactionError> {
                Ok((step.index, self.evaluate_step(step)?))
            })
            .collect()
    }

    fn evaluate_step(&self, step: &ReactionStep) -> Result<StepLinearFunction, ReactionError> {
        Ok(self.half_reaction(&step.products)? - self.half_reaction(&step.reactants)?)
    }

    fn half_reaction(&self, half: &Stoichiometry) -> Result<LinearTerm, ReactionError> {
        half.iter()
            .map(|(species, &count)| -> Result<LinearTerm, ReactionError> {
                Ok(self.contribution(species)? * count)
            })
            .sum()
    }

    fn contribution(&self, species: &Species) -> Result<LinearTerm, ReactionError> {
        Ok(match species {
            Species::CleanSite => LinearTerm::default(),
            Species::Adsorbed(name) => {
                LinearTerm::constant(self.free_energy(name)?) + self.model.adsorption_term(name)?
            }
            Species::ProtonElectronPair => LinearTerm::constant(
                0.5 * self.free_energy(HYDROGEN)? - self.external_potential,
            ),
            Species::Free(name) => LinearTerm::constant(self.free_energy(name)?),
        })
    }

    fn free_energy(&self, species: &str) -> Result<f64, ReactionError> {
        self.free_energies
            .get(species)
            .ok_or_else(|| ReactionError::UnknownFreeEnergy {
                species: species.to_string(),
            })
    }
}

/// Flags adsorbed species that appear with a count other than one. Such counts scale the
/// species' contribution linearly.
pub fn stoichiometry_warnings(pathway: &ReactionPathway) -> Diagnostics {
    let mut diagnostics = Diagnostics::new();
    for step in pathway.steps() {
        for (species, &count) in step.reactants.iter().chain(step.products.iter()) {
            if matches!(species, Species::Adsorbed(_)) && (count - 1.0).abs() > UNIT_COUNT_TOLERANCE
            {
                diagnostics.push(Warning::NonUnitStoichiometry {
                    reaction: pathway.name().to_string(),
                    step: step.index,
                    species: species.to_string(),
                    count,
                });
            }
        }
    }
    diagnostics
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::io::pathway::parse_reaction_pathway;
    use crate::core::models::descriptor::DescriptorPair;
    use crate::core::scaling::fitter::{FitMode, ScalingRelationFitter};

    const TOLERANCE: f64 = 1e-9;

    fn assert_term(actual: &LinearTerm, expected: (f64, f64, f64)) {
        assert!(
            (actual.a - expected.0).abs() < TOLERANCE
                && (actual.b - expected.1).abs() < TOLERANCE
                && (actual.c - expected.2).abs() < TOLERANCE,
            "expected {:?}, got {:?}",
            expected,
            actual
        );
    }

    /// Scaling relations with `*COOH = 0.5·x + 0.5·y + 0.1` and `*CO = x` (descriptor).
    fn relations() -> ScalingRelations {
        let xs = [-1.0, 0.0, 1.0, 2.0];
        let ys = [0.5, -0.5, 1.5, 0.0];
        let rows: Vec<Vec<f64>> = xs
            .iter()
            .zip(&ys)
            .map(|(&x, &y)| vec![x, y, 0.5 * x + 0.5 * y + 0.1])
            .collect();
        let table = EnergyTable::from_rows(
            (0..4).map(|i| format!("s{}", i)).collect(),
            vec!["CO".into(), "OH".into(), "COOH".into()],
            &rows,
        )
        .unwrap();
        let pair = DescriptorPair::new("CO", "OH").unwrap();
        ScalingRelationFitter::new(&table, &pair, FitMode::Auto)
            .fit()
            .unwrap()
    }

    fn free_energies() -> FreeEnergies {
        [
            ("H2", -6.8),
            ("CO2", -23.0),
            ("H2O", -14.2),
            ("COOH", -26.5),
            ("CO", -14.8),
        ]
        .into_iter()
        .collect()
    }

    const TOY_PATHWAY: &str = r#"{
        "CO2RR": {
            "comment": "toy pathway",
            "1": {"reactants": {"*": 1, "CO2_g": 1, "PEP": 1}, "products": {"*COOH": 1}},
            "2": {"reactants": {"*COOH": 1, "PEp": 1}, "products": {"*CO": 1, "H2O_l": 1}}
        }
    }"#;

    #[test]
    fn toy_pathway_matches_hand_computed_step_functions() {
        let relations = relations();
        let network = parse_reaction_pathway(TOY_PATHWAY).unwrap();
        let energies = free_energies();
        let potential = 0.2;
        let calculator = ReactionScalingCalculator::new(&relations, &network, &energies, potential);

        let result = calculator.calculate("CO2RR").unwrap();
        assert_eq!(result.step_indices(), vec![1, 2]);

        let pep = 0.5 * -6.8 - potential;
        // step 1: [G(COOH) + (0.5, 0.5, 0.1)] - [G(CO2) + PEP]
        let step1 = result.steps()[&1];
        assert_term(&step1, (0.5, 0.5, -26.5 + 0.1 - (-23.0 + pep)));
        // step 2: [G(CO) + (1, 0, 0) + G(H2O)] - [G(COOH) + (0.5, 0.5, 0.1) + PEP]
        let step2 = result.steps()[&2];
        assert_term(
            &step2,
            (0.5, -0.5, (-14.8 + -14.2) - (-26.5 + 0.1 + pep)),
        );
        assert!(result.diagnostics().is_empty());
    }

    #[test]
    fn unknown_reaction_is_named_in_error() {
        let relations = relations();
        let network = parse_reaction_pathway(TOY_PATHWAY).unwrap();
        let energies = free_energies();
        let calculator = ReactionScalingCalculator::new(&relations, &network, &energies, 0.0);
        assert_eq!(
            calculator.calculate("HER"),
            Err(ReactionError::UnknownReaction {
                reaction: "HER".to_string()
            })
        );
    }

    #[test]
    fn missing_free_energy_fails_instead_of_defaulting() {
        let relations = relations();
        let network = parse_reaction_pathway(TOY_PATHWAY).unwrap();
        let energies: FreeEnergies = [("H2", -6.8), ("CO2", -23.0)].into_iter().collect();
        let calculator = ReactionScalingCalculator::new(&relations, &network, &energies, 0.0);
        assert_eq!(
            calculator.calculate("CO2RR"),
            Err(ReactionError::UnknownFreeEnergy {
                species: "COOH".to_string()
            })
        );
    }

    #[test]
    fn adsorbate_without_scaling_relation_is_rejected() {
        let relations = relations();
        let network = parse_reaction_pathway(
            r#"{"ORR": {"1": {"reactants": {"*": 1, "O2_g": 1}, "products": {"*O2": 1}}}}"#,
        )
        .unwrap();
        let energies: FreeEnergies = [("O2", -9.9)].into_iter().collect();
        let calculator = ReactionScalingCalculator::new(&relations, &network, &energies, 0.0);
        assert_eq!(
            calculator.calculate("ORR"),
            Err(ReactionError::UnknownScalingRelation {
                species: "O2".to_string()
            })
        );
    }

    #[test]
    fn non_unit_adsorbate_count_scales_linearly_and_warns() {
        let relations = relations();
        let network = parse_reaction_pathway(
            r#"{"dimer": {"1": {"reactants": {"*": 2, "CO_g": 2}, "products": {"*CO": 2}}}}"#,
        )
        .unwrap();
        let energies = free_energies();
        let calculator = ReactionScalingCalculator::new(&relations, &network, &energies, 0.0);

        let result = calculator.calculate("dimer").unwrap();
        assert_term(&result.steps()[&1], (2.0, 0.0, 0.0));
        assert_eq!(
            result.diagnostics().warnings(),
            &[Warning::NonUnitStoichiometry {
                reaction: "dimer".to_string(),
                step: 1,
                species: "*CO".to_string(),
                count: 2.0,
            }]
        );
    }

    #[test]
    fn sample_adsorption_uses_actual_table_values() {
        let table = EnergyTable::from_rows(
            vec!["Cu".into(), "Ag".into()],
            vec!["CO".into()],
            &[vec![-0.5], vec![0.3]],
        )
        .unwrap();
        let network = parse_reaction_pathway(
            r#"{"ads": {"1": {"reactants": {"*": 1, "CO_g": 1}, "products": {"*CO": 1}}}}"#,
        )
        .unwrap();
        let energies = free_energies();

        let silver = SampleAdsorption::new(&table, 1);
        let calculator = ReactionScalingCalculator::new(&silver, &network, &energies, 0.0);
        let steps = calculator.step_functions("ads").unwrap();
        assert_term(&steps[&1], (0.0, 0.0, 0.3));

        let missing = SampleAdsorption::new(&table, 0);
        assert!(matches!(
            missing.adsorption_term("OH"),
            Err(ReactionError::UnknownAdsorptionEnergy { ref sample, .. }) if sample == "Cu"
        ));
    }
}
