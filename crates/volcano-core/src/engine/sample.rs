use super::error::EngineError;
use super::mesh::reduce_step_values;
use super::reaction::{ReactionScalingCalculator, SampleAdsorption};
use crate::core::models::descriptor::DescriptorPair;
use crate::core::models::energies::FreeEnergies;
use crate::core::models::pathway::ReactionNetwork;
use crate::core::io::export::ExportError;
use crate::core::models::table::StackedFreeEnergyTable;
use serde::Serialize;
use std::io::Write;
use tracing::{debug, instrument};

/// Reaction energetics of one real catalyst sample.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SampleResult {
    pub sample: String,
    /// Step free-energy changes in ascending step order.
    pub step_energies: Vec<f64>,
    pub limiting_potential: f64,
    /// Position of the rate-determining step in `step_energies`.
    pub rds: usize,
}

/// Where a sample sits on the descriptor plane.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SampleCoordinates {
    pub sample: String,
    pub x: f64,
    pub y: f64,
}

/// Evaluates reactions with each sample's own adsorption free energies instead of the
/// fitted scaling relations.
pub struct SampleEvaluator<'a> {
    table: &'a StackedFreeEnergyTable,
    network: &'a ReactionNetwork,
    free_energies: &'a FreeEnergies,
    external_potential: f64,
}

impl<'a> SampleEvaluator<'a> {
    pub fn new(
        table: &'a StackedFreeEnergyTable,
        network: &'a ReactionNetwork,
        free_energies: &'a FreeEnergies,
        external_potential: f64,
    ) -> Self {
        Self {
            table,
            network,
            free_energies,
            external_potential,
        }
    }

    #[instrument(skip_all, name = "sample_evaluation", fields(reaction = reaction))]
    pub fn evaluate(&self, reaction: &str) -> Result<Vec<SampleResult>, EngineError> {
        let num_samples = self.table.num_samples();
        let mut step_values: Vec<Vec<f64>> = Vec::new();

        for row in 0..num_samples {
            let model = SampleAdsorption::new(self.table, row);
            let calculator = ReactionScalingCalculator::new(
                &model,
                self.network,
                self.free_energies,
                self.external_potential,
            );
            let steps = calculator.step_functions(reaction)?;
            if step_values.is_empty() {
                step_values = vec![Vec::with_capacity(num_samples); steps.len()];
            }
            for (values, function) in step_values.iter_mut().zip(steps.values()) {
                values.push(function.c);
            }
        }

        if num_samples == 0 {
            return Ok(Vec::new());
        }
        let (potentials, rds) = reduce_step_values(&step_values)?;

        let results: Vec<SampleResult> = self
            .table
            .samples()
            .iter()
            .enumerate()
            .map(|(row, sample)| SampleResult {
                sample: sample.clone(),
                step_energies: step_values.iter().map(|values| values[row]).collect(),
                limiting_potential: potentials[row],
                rds: rds[row],
            })
            .collect();
        debug!("Evaluated {} sample(s)", results.len());
        Ok(results)
    }
}

/// `(G_x, G_y)` of every stacked sample.
pub fn sample_coordinates(
    table: &StackedFreeEnergyTable,
    descriptors: &DescriptorPair,
) -> Vec<SampleCoordinates> {
    table
        .samples()
        .iter()
        .enumerate()
        .filter_map(|(row, sample)| {
            Some(SampleCoordinates {
                sample: sample.clone(),
                x: table.value(row, descriptors.x())?,
                y: table.value(row, descriptors.y())?,
            })
        })
        .collect()
}

/// Writes `sample,limiting_potential,rds_position,rds_step` followed by one `dG_<step>` column
/// per step.
///
/// `step_indices` labels the positions of `step_energies`. `rds_position` uses the same
/// 0-based convention as rate-determining-step meshes; `rds_step` is the step key.
pub fn write_sample_results_csv<W: Write>(
    writer: W,
    step_indices: &[usize],
    results: &[SampleResult],
) -> Result<(), ExportError> {
    let mut csv_writer = csv::Writer::from_writer(writer);
    let mut header = vec![
        "sample".to_string(),
        "limiting_potential".to_string(),
        "rds_position".to_string(),
        "rds_step".to_string(),
    ];
    header.extend(step_indices.iter().map(|step| format!("dG_{}", step)));
    csv_writer.write_record(&header)?;

    for result in results {
        let rds_step = step_indices.get(result.rds).copied().unwrap_or(result.rds);
        let mut record = vec![
            result.sample.clone(),
            result.limiting_potential.to_string(),
            result.rds.to_string(),
            rds_step.to_string(),
        ];
        record.extend(result.step_energies.iter().map(f64::to_string));
        csv_writer.write_record(&record)?;
    }
    csv_writer.flush().map_err(|e| ExportError::Csv(e.into()))?;
    Ok(())
}
