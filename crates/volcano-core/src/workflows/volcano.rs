use super::scaling::{self, ScalingResult};
use crate::core::diagnostics::Diagnostics;
use crate::core::io::pathway::load_reaction_pathway;
use crate::core::io::tables::load_adsorbate_free_energy;
use crate::core::models::energies::FreeEnergies;
use crate::core::models::pathway::ReactionNetwork;
use crate::core::scaling::fitter::ScalingRelations;
use crate::core::scaling::term::StepLinearFunction;
use crate::engine::config::{EvaluationConfig, MeshConfig, VolcanoConfig};
use crate::engine::error::EngineError;
use crate::engine::mesh::{
    DescriptorGrid, LimitingPotentialMesh, RdsMesh, SelectivityMesh, VolcanoMeshEvaluator,
    evaluate_selectivity,
};
use crate::engine::progress::ProgressReporter;
use crate::engine::reaction::{ReactionError, ReactionScaling, ReactionScalingCalculator};
use crate::engine::sample::{SampleCoordinates, SampleEvaluator, SampleResult, sample_coordinates};
use std::collections::BTreeMap;
use tracing::{info, instrument};

/// Everything computed for one reaction.
#[derive(Debug, Clone)]
pub struct ReactionVolcano {
    pub scaling: ReactionScaling,
    pub limiting_potential: LimitingPotentialMesh,
    pub rds: RdsMesh,
    /// Limiting potentials of the real samples, from their own free energies.
    pub samples: Vec<SampleResult>,
}

#[derive(Debug, Clone)]
pub struct SelectivityMap {
    pub primary: String,
    pub competing: String,
    pub mesh: SelectivityMesh,
}

#[derive(Debug, Clone)]
pub struct VolcanoResult {
    pub relations: ScalingRelations,
    pub grid: DescriptorGrid,
    pub reactions: BTreeMap<String, ReactionVolcano>,
    pub selectivity: Vec<SelectivityMap>,
    /// Descriptor coordinates of every stacked sample.
    pub samples: Vec<SampleCoordinates>,
    pub diagnostics: Diagnostics,
}

/// Fits scaling relations, then maps every requested reaction over the descriptor grid.
#[instrument(skip_all, name = "volcano_workflow")]
pub fn run(config: &VolcanoConfig, reporter: &ProgressReporter) -> Result<VolcanoResult, EngineError> {
    let scaling = scaling::run(&config.fit, reporter)?;

    let (free_energies, network) =
        reporter.phase("Loading Reaction Data", || -> Result<_, EngineError> {
            let free_energies =
                load_adsorbate_free_energy(&config.reaction_data.free_energy_path)?;
            let network = load_reaction_pathway(&config.reaction_data.reaction_pathway_path)?;
            info!(
                "Loaded {} free energies and {} reaction(s).",
                free_energies.len(),
                network.len()
            );
            Ok((free_energies, network))
        })?;

    evaluate(
        scaling,
        &network,
        &free_energies,
        &config.mesh,
        &config.evaluation,
        reporter,
    )
}

/// Maps reactions over the grid using already-fitted scaling relations.
#[instrument(skip_all, name = "volcano_evaluation")]
pub fn evaluate(
    scaling: ScalingResult,
    network: &ReactionNetwork,
    free_energies: &FreeEnergies,
    mesh: &MeshConfig,
    evaluation: &EvaluationConfig,
    reporter: &ProgressReporter,
) -> Result<VolcanoResult, EngineError> {
    let reactions = reactions_to_evaluate(network, evaluation);
    let evaluator =
        VolcanoMeshEvaluator::new(DescriptorGrid::new(mesh.x_range, mesh.y_range, mesh.density)?);
    let calculator = ReactionScalingCalculator::new(
        &scaling.relations,
        network,
        free_energies,
        evaluation.external_potential,
    );
    let sample_evaluator = SampleEvaluator::new(
        &scaling.stacked,
        network,
        free_energies,
        evaluation.external_potential,
    );

    let volcanoes = reporter.phase("Evaluating Reactions", || {
        reporter.task(reactions.len() as u64, |tick| -> Result<_, EngineError> {
            let mut volcanoes = BTreeMap::new();
            for name in &reactions {
                let reaction_scaling = calculator.calculate(name)?;
                let steps: Vec<StepLinearFunction> =
                    reaction_scaling.steps().values().copied().collect();
                let limiting = evaluator.evaluate_limiting_potential(&steps)?;
                let samples = sample_evaluator.evaluate(name)?;
                info!(
                    "Reaction '{}': {} step(s), limiting potential in [{:.3}, {:.3}] eV over the grid.",
                    name,
                    steps.len(),
                    limiting.potential.min(),
                    limiting.potential.max()
                );
                volcanoes.insert(
                    name.clone(),
                    ReactionVolcano {
                        scaling: reaction_scaling,
                        limiting_potential: limiting.potential,
                        rds: limiting.rds,
                        samples,
                    },
                );
                tick();
            }
            Ok(volcanoes)
        })
    })?;

    let mut selectivity = Vec::with_capacity(evaluation.selectivity.len());
    for pair in &evaluation.selectivity {
        let primary = lookup(&volcanoes, &pair.primary)?;
        let competing = lookup(&volcanoes, &pair.competing)?;
        selectivity.push(SelectivityMap {
            primary: pair.primary.clone(),
            competing: pair.competing.clone(),
            mesh: evaluate_selectivity(&primary.limiting_potential, &competing.limiting_potential)?,
        });
    }

    let mut diagnostics = scaling.diagnostics;
    for volcano in volcanoes.values() {
        diagnostics.merge(volcano.scaling.diagnostics().clone());
    }
    let samples = sample_coordinates(&scaling.stacked, scaling.relations.descriptors());

    Ok(VolcanoResult {
        relations: scaling.relations,
        grid: evaluator.grid().clone(),
        reactions: volcanoes,
        selectivity,
        samples,
        diagnostics,
    })
}

/// Requested reactions (or all of them), followed by any reaction only named in a
/// selectivity pair.
fn reactions_to_evaluate(network: &ReactionNetwork, evaluation: &EvaluationConfig) -> Vec<String> {
    let mut reactions: Vec<String> = if evaluation.reactions.is_empty() {
        network.names().map(str::to_string).collect()
    } else {
        evaluation.reactions.clone()
    };
    for pair in &evaluation.selectivity {
        for name in [&pair.primary, &pair.competing] {
            if !reactions.contains(name) {
                reactions.push(name.clone());
            }
        }
    }
    reactions
}

fn lookup<'a>(
    volcanoes: &'a BTreeMap<String, ReactionVolcano>,
    name: &str,
) -> Result<&'a ReactionVolcano, ReactionError> {
    volcanoes
        .get(name)
        .ok_or_else(|| ReactionError::UnknownReaction {
            reaction: name.to_string(),
        })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::diagnostics::Warning;
    use crate::core::io::pathway::parse_reaction_pathway;
    use crate::core::models::descriptor::DescriptorPair;
    use crate::core::models::table::EnergyTable;
    use crate::core::scaling::fitter::FitMode;
    use crate::engine::config::{ScalingConfig, SelectivityPair};

    fn scaling_result() -> ScalingResult {
        let rows: Vec<Vec<f64>> = (0..6)
            .map(|i| {
                let x = -1.0 + 0.4 * i as f64;
                let y = (i as f64).cos();
                vec![x, y, 0.5 * x + 0.5 * y + 0.2, 0.3 * y - 0.1]
            })
            .collect();
        let table = EnergyTable::from_rows(
            (0..6).map(|i| format!("m{}", i)).collect(),
            vec!["CO".into(), "OH".into(), "COOH".into(), "H".into()],
            &rows,
        )
        .unwrap();
        let tables = [("graphene".to_string(), table)].into_iter().collect();
        let config = ScalingConfig {
            descriptors: DescriptorPair::new("CO", "OH").unwrap(),
            mode: FitMode::Auto,
        };
        scaling::fit_tables(tables, &config, &ProgressReporter::new()).unwrap()
    }

    fn free_energies() -> FreeEnergies {
        [
            ("H2", -6.8),
            ("H", -3.4),
            ("CO2", -23.0),
            ("CO", -14.8),
            ("COOH", -26.5),
            ("H2O", -14.2),
        ]
        .into_iter()
        .collect()
    }

    const NETWORK: &str = r#"{
        "CO2RR": {
            "comment": "CO2 to CO",
            "1": {"reactants": {"*": 1, "CO2_g": 1, "PEP": 1}, "products": {"*COOH": 1}},
            "2": {"reactants": {"*COOH": 1, "PEP": 1}, "products": {"*CO": 1, "H2O_l": 1}}
        },
        "HER": {
            "1": {"reactants": {"*": 1, "PEP": 1}, "products": {"*H": 1}},
            "2": {"reactants": {"*H": 1, "PEP": 1}, "products": {"*": 1, "H2_g": 1}}
        }
    }"#;

    fn evaluation(reactions: &[&str], selectivity: &[(&str, &str)]) -> EvaluationConfig {
        EvaluationConfig {
            external_potential: 0.0,
            reactions: reactions.iter().map(|s| s.to_string()).collect(),
            selectivity: selectivity
                .iter()
                .map(|(p, c)| SelectivityPair {
                    primary: p.to_string(),
                    competing: c.to_string(),
                })
                .collect(),
        }
    }

    fn small_mesh() -> MeshConfig {
        MeshConfig {
            x_range: (-1.0, 1.0),
            y_range: (-1.0, 1.0),
            density: (4, 3),
        }
    }

    #[test]
    fn maps_every_reaction_when_none_requested() {
        let network = parse_reaction_pathway(NETWORK).unwrap();
        let result = evaluate(
            scaling_result(),
            &network,
            &free_energies(),
            &small_mesh(),
            &evaluation(&[], &[]),
            &ProgressReporter::new(),
        )
        .unwrap();

        assert_eq!(
            result.reactions.keys().collect::<Vec<_>>(),
            vec!["CO2RR", "HER"]
        );
        let co2rr = &result.reactions["CO2RR"];
        assert_eq!(co2rr.limiting_potential.shape(), (3, 4));
        assert!(co2rr.rds.iter().all(|&k| k < 2));
        assert_eq!(co2rr.samples.len(), 6);
        assert_eq!(result.samples.len(), 6);
        assert_eq!(result.grid.x().len(), 4);
    }

    #[test]
    fn selectivity_pulls_in_unrequested_reactions() {
        let network = parse_reaction_pathway(NETWORK).unwrap();
        let result = evaluate(
            scaling_result(),
            &network,
            &free_energies(),
            &small_mesh(),
            &evaluation(&["CO2RR"], &[("CO2RR", "HER")]),
            &ProgressReporter::new(),
        )
        .unwrap();

        assert!(result.reactions.contains_key("HER"));
        let map = &result.selectivity[0];
        let expected = &result.reactions["CO2RR"].limiting_potential
            - &result.reactions["HER"].limiting_potential;
        assert_eq!(map.mesh, expected);
    }

    #[test]
    fn unknown_reaction_fails() {
        let network = parse_reaction_pathway(NETWORK).unwrap();
        let result = evaluate(
            scaling_result(),
            &network,
            &free_energies(),
            &small_mesh(),
            &evaluation(&["ORR"], &[]),
            &ProgressReporter::new(),
        );
        assert!(matches!(
            result,
            Err(EngineError::Reaction {
                source: ReactionError::UnknownReaction { .. }
            })
        ));
    }

    #[test]
    fn diagnostics_merge_fit_and_reaction_warnings() {
        let network = parse_reaction_pathway(
            r#"{"dimer": {"1": {"reactants": {"*": 2, "CO_g": 2}, "products": {"*CO": 2}}}}"#,
        )
        .unwrap();
        let result = evaluate(
            scaling_result(),
            &network,
            &free_energies(),
            &small_mesh(),
            &evaluation(&[], &[]),
            &ProgressReporter::new(),
        )
        .unwrap();
        assert!(result.diagnostics.warnings().iter().any(|w| matches!(
            w,
            Warning::NonUnitStoichiometry { reaction, .. } if reaction == "dimer"
        )));
    }
}
