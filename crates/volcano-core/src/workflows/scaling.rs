use crate::core::diagnostics::{Diagnostics, SMALL_SAMPLE_THRESHOLD, Warning};
use crate::core::io::tables::{
    apply_thermal_correction, load_adsorption_energy, load_thermal_correction,
};
use crate::core::models::table::{FreeEnergyTable, StackedFreeEnergyTable, stack_tables};
use crate::core::scaling::fitter::{ScalingRelationFitter, ScalingRelations};
use crate::engine::config::{FitConfig, ScalingConfig};
use crate::engine::error::EngineError;
use crate::engine::progress::ProgressReporter;
use std::collections::BTreeMap;
use tracing::{info, instrument};

#[derive(Debug, Clone)]
pub struct ScalingResult {
    /// Free-energy table of each substrate.
    pub tables: BTreeMap<String, FreeEnergyTable>,
    pub stacked: StackedFreeEnergyTable,
    pub relations: ScalingRelations,
    pub diagnostics: Diagnostics,
}

/// Loads the substrate tables, applies thermal corrections and fits scaling relations.
#[instrument(skip_all, name = "scaling_workflow")]
pub fn run(config: &FitConfig, reporter: &ProgressReporter) -> Result<ScalingResult, EngineError> {
    let tables = reporter.phase("Loading Energy Tables", || -> Result<_, EngineError> {
        info!(
            "Loading {} substrate table(s) from {:?}.",
            config.data.substrates.len(),
            config.data.adsorption_energy_dir
        );
        let raw = load_adsorption_energy(
            &config.data.adsorption_energy_dir,
            &config.data.substrates,
            &config.data.adsorbates,
        )?;
        let corrections = load_thermal_correction(&config.data.thermal_correction_path)?;
        Ok(apply_thermal_correction(&raw, &corrections)?)
    })?;

    fit_tables(tables, &config.scaling, reporter)
}

/// Fits scaling relations over already-corrected free-energy tables.
#[instrument(skip_all, name = "scaling_fit_workflow", fields(descriptors = %scaling.descriptors))]
pub fn fit_tables(
    tables: BTreeMap<String, FreeEnergyTable>,
    scaling: &ScalingConfig,
    reporter: &ProgressReporter,
) -> Result<ScalingResult, EngineError> {
    let mut diagnostics = Diagnostics::new();
    for (substrate, table) in &tables {
        if table.num_samples() < SMALL_SAMPLE_THRESHOLD {
            diagnostics.push(Warning::SmallSampleCount {
                table: substrate.clone(),
                samples: table.num_samples(),
            });
        }
    }

    let stacked = stack_tables(tables.iter().map(|(name, table)| (name.as_str(), table)))?;
    info!(
        "Stacked {} substrate(s) into {} sample(s) over {} adsorbate(s).",
        tables.len(),
        stacked.num_samples(),
        stacked.adsorbates().len()
    );

    let targets = stacked
        .adsorbates()
        .iter()
        .filter(|ads| !scaling.descriptors.contains(ads))
        .count() as u64;
    let relations = reporter.phase("Fitting Scaling Relations", || {
        reporter.task(targets, |tick| -> Result<_, EngineError> {
            let fitter = ScalingRelationFitter::new(&stacked, &scaling.descriptors, scaling.mode);
            Ok(fitter.fit_with_progress(&|_| tick())?)
        })
    })?;
    diagnostics.merge(relations.diagnostics().clone());

    info!(
        "Fitted {} scaling relation(s) with {} warning(s).",
        relations.records().len(),
        diagnostics.len()
    );
    Ok(ScalingResult {
        tables,
        stacked,
        relations,
        diagnostics,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::models::descriptor::{DescriptorPair, MixingRatio};
    use crate::core::models::table::EnergyTable;
    use crate::core::scaling::fitter::FitMode;
    use crate::core::scaling::term::LinearTerm;
    use crate::engine::progress::Progress;
    use std::sync::{Arc, Mutex};

    fn substrate_table(offset: f64, rows: usize) -> FreeEnergyTable {
        let values: Vec<Vec<f64>> = (0..rows)
            .map(|i| {
                let x = offset + i as f64 * 0.3;
                let y = (i as f64 * 1.7 + offset).sin();
                vec![x, y, 0.4 * x + 0.6 * y - 0.3]
            })
            .collect();
        EnergyTable::from_rows(
            (0..rows).map(|i| format!("m{}", i)).collect(),
            vec!["CO".into(), "OH".into(), "COOH".into()],
            &values,
        )
        .unwrap()
    }

    fn scaling_config(mode: FitMode) -> ScalingConfig {
        ScalingConfig {
            descriptors: DescriptorPair::new("CO", "OH").unwrap(),
            mode,
        }
    }

    #[test]
    fn small_tables_are_flagged_and_fit_proceeds() {
        let tables: BTreeMap<_, _> = [
            ("graphene".to_string(), substrate_table(0.0, 3)),
            ("g-C3N4".to_string(), substrate_table(1.0, 6)),
        ]
        .into_iter()
        .collect();

        let result =
            fit_tables(tables, &scaling_config(FitMode::Auto), &ProgressReporter::new()).unwrap();

        assert_eq!(result.stacked.num_samples(), 9);
        assert_eq!(
            result.diagnostics.warnings(),
            &[Warning::SmallSampleCount {
                table: "graphene".to_string(),
                samples: 3
            }]
        );
        assert_eq!(
            result.relations.records()["COOH"].ratio,
            MixingRatio::new(40).unwrap()
        );
        assert_eq!(result.relations.get("OH"), Some(&LinearTerm::y_identity()));
    }

    #[test]
    fn fitting_reports_one_increment_per_target() {
        let events = Arc::new(Mutex::new(Vec::new()));
        let sink = Arc::clone(&events);
        let reporter = ProgressReporter::with_callback(Box::new(move |event| {
            sink.lock().unwrap().push(event);
        }));
        let tables: BTreeMap<_, _> = [("graphene".to_string(), substrate_table(0.0, 6))]
            .into_iter()
            .collect();

        fit_tables(tables, &scaling_config(FitMode::Auto), &reporter).unwrap();

        let events = events.lock().unwrap();
        assert_eq!(events[0], Progress::PhaseStart {
            name: "Fitting Scaling Relations"
        });
        assert_eq!(events[1], Progress::TaskStart { total_steps: 1 });
        assert_eq!(
            events
                .iter()
                .filter(|e| **e == Progress::TaskIncrement)
                .count(),
            1
        );
        assert_eq!(events.last(), Some(&Progress::PhaseFinish));
    }

    #[test]
    fn inconsistent_substrate_columns_are_rejected() {
        let other = EnergyTable::from_rows(
            vec!["m0".into(), "m1".into()],
            vec!["CO".into(), "OH".into()],
            &[vec![0.0, 1.0], vec![1.0, 0.0]],
        )
        .unwrap();
        let tables: BTreeMap<_, _> = [
            ("graphene".to_string(), substrate_table(0.0, 6)),
            ("g-C3N4".to_string(), other),
        ]
        .into_iter()
        .collect();

        let result = fit_tables(tables, &scaling_config(FitMode::Auto), &ProgressReporter::new());
        assert!(matches!(result, Err(EngineError::Table { .. })));
    }
}
