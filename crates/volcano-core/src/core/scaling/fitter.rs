use super::regression::{LinearFit, linear_regression};
use super::term::{LinearTerm, ScalingRelationParams};
use crate::core::diagnostics::{Diagnostics, LOW_R_SQUARED_THRESHOLD, Warning};
use crate::core::models::descriptor::{DescriptorPair, MixingRatio};
use crate::core::models::table::StackedFreeEnergyTable;
use serde::Serialize;
use std::collections::BTreeMap;
use thiserror::Error;
use tracing::{debug, info, instrument, trace};

#[cfg(feature = "parallel")]
use rayon::prelude::*;

/// How the weight between the two descriptors is chosen.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum FitMode {
    /// Scan every integer ratio and keep the best R² per adsorbate.
    #[default]
    Auto,
    /// Apply one ratio to every adsorbate.
    Fixed(MixingRatio),
}

#[derive(Debug, Error, Clone, PartialEq)]
pub enum FitError {
    #[error("Descriptor column '{column}' is missing from the stacked table")]
    MissingDescriptor { column: String },
    #[error("At least 2 samples are needed to fit scaling relations, found {samples}")]
    InsufficientSamples { samples: usize },
    #[error("No usable regression for adsorbate '{adsorbate}': the hybrid descriptor has no variance")]
    DegenerateRegression { adsorbate: String },
}

/// Winning ratio and regression statistics for one fitted adsorbate.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct FitRecord {
    pub ratio: MixingRatio,
    pub fit: LinearFit,
}

impl FitRecord {
    /// `a = slope·w`, `b = slope·(1 - w)`, `c = intercept`.
    pub fn params(&self) -> ScalingRelationParams {
        LinearTerm::new(
            self.fit.slope * self.ratio.x_weight(),
            self.fit.slope * self.ratio.y_weight(),
            self.fit.intercept,
        )
    }
}

/// Fitted scaling relations of every adsorbate column over one descriptor pair.
#[derive(Debug, Clone, PartialEq)]
pub struct ScalingRelations {
    descriptors: DescriptorPair,
    params: BTreeMap<String, ScalingRelationParams>,
    records: BTreeMap<String, FitRecord>,
    diagnostics: Diagnostics,
}

impl ScalingRelations {
    pub fn descriptors(&self) -> &DescriptorPair {
        &self.descriptors
    }

    /// Parameters of one adsorbate; descriptors map to their identity projections.
    pub fn get(&self, adsorbate: &str) -> Option<&ScalingRelationParams> {
        self.params.get(adsorbate)
    }

    pub fn params(&self) -> &BTreeMap<String, ScalingRelationParams> {
        &self.params
    }

    /// Regression records of the non-descriptor adsorbates.
    pub fn records(&self) -> &BTreeMap<String, FitRecord> {
        &self.records
    }

    pub fn diagnostics(&self) -> &Diagnostics {
        &self.diagnostics
    }
}

/// Fits `G(ads) ≈ a·G_x + b·G_y + c` for every adsorbate column of a stacked table.
pub struct ScalingRelationFitter<'a> {
    table: &'a StackedFreeEnergyTable,
    descriptors: &'a DescriptorPair,
    mode: FitMode,
}

impl<'a> ScalingRelationFitter<'a> {
    pub fn new(
        table: &'a StackedFreeEnergyTable,
        descriptors: &'a DescriptorPair,
        mode: FitMode,
    ) -> Self {
        Self {
            table,
            descriptors,
            mode,
        }
    }

    pub fn fit(&self) -> Result<ScalingRelations, FitError> {
        self.fit_with_progress(&|_| {})
    }

    /// Same as [`fit`](Self::fit), calling `on_fitted` once per non-descriptor adsorbate.
    #[instrument(skip_all, name = "scaling_fit", fields(descriptors = %self.descriptors))]
    pub fn fit_with_progress(
        &self,
        on_fitted: &(dyn Fn(&str) + Sync),
    ) -> Result<ScalingRelations, FitError> {
        let g_x = self.descriptor_column(self.descriptors.x())?;
        let g_y = self.descriptor_column(self.descriptors.y())?;
        if self.table.num_samples() < 2 {
            return Err(FitError::InsufficientSamples {
                samples: self.table.num_samples(),
            });
        }

        let targets: Vec<&String> = self
            .table
            .adsorbates()
            .iter()
            .filter(|ads| !self.descriptors.contains(ads))
            .collect();
        info!(
            "Fitting scaling relations for {} adsorbate(s) over {} sample(s) ({:?} mode).",
            targets.len(),
            self.table.num_samples(),
            self.mode
        );

        #[cfg(not(feature = "parallel"))]
        let iterator = targets.iter();

        #[cfg(feature = "parallel")]
        let iterator = targets.par_iter();

        let fitted: Vec<(String, FitRecord)> = iterator
            .map(|ads| -> Result<(String, FitRecord), FitError> {
                let column: Vec<f64> = self
                    .table
                    .column(ads)
                    .map(|c| c.as_slice().to_vec())
                    .unwrap_or_default();
                let record = match self.mode {
                    FitMode::Auto => search_best_ratio(ads, &g_x, &g_y, &column)?,
                    FitMode::Fixed(ratio) => fit_at_ratio(&g_x, &g_y, &column, ratio)
                        .ok_or_else(|| FitError::DegenerateRegression {
                            adsorbate: ads.to_string(),
                        })?,
                };
                on_fitted(ads.as_str());
                Ok(((*ads).clone(), record))
            })
            .collect::<Result<_, FitError>>()?;

        let mut diagnostics = Diagnostics::new();
        let mut params = BTreeMap::new();
        let mut records = BTreeMap::new();
        params.insert(self.descriptors.x().to_string(), LinearTerm::x_identity());
        params.insert(self.descriptors.y().to_string(), LinearTerm::y_identity());

        for (ads, record) in fitted {
            debug!(
                "'{}': ratio {}, slope {:.4}, intercept {:.4}, R² {:.4}",
                ads, record.ratio, record.fit.slope, record.fit.intercept, record.fit.r_squared
            );
            if record.fit.r_squared < LOW_R_SQUARED_THRESHOLD {
                diagnostics.push(Warning::LowRSquared {
                    adsorbate: ads.clone(),
                    ratio: record.ratio.x_percent(),
                    r_squared: record.fit.r_squared,
                });
            }
            params.insert(ads.clone(), record.params());
            records.insert(ads, record);
        }

        Ok(ScalingRelations {
            descriptors: self.descriptors.clone(),
            params,
            records,
            diagnostics,
        })
    }

    fn descriptor_column(&self, name: &str) -> Result<Vec<f64>, FitError> {
        self.table
            .column(name)
            .map(|column| column.as_slice().to_vec())
            .ok_or_else(|| FitError::MissingDescriptor {
                column: name.to_string(),
            })
    }
}

fn fit_at_ratio(g_x: &[f64], g_y: &[f64], target: &[f64], ratio: MixingRatio) -> Option<FitRecord> {
    let hybrid: Vec<f64> = g_x
        .iter()
        .zip(g_y)
        .map(|(&x, &y)| ratio.blend(x, y))
        .collect();
    linear_regression(&hybrid, target)
        .filter(|fit| {
            fit.slope.is_finite() && fit.intercept.is_finite() && fit.r_squared.is_finite()
        })
        .map(|fit| FitRecord { ratio, fit })
}

/// Scans ratios 0..=100 in ascending order; only a strictly better R² replaces the current
/// best, so ties keep the lowest ratio. Candidates with non-finite statistics never win.
fn search_best_ratio(
    adsorbate: &str,
    g_x: &[f64],
    g_y: &[f64],
    target: &[f64],
) -> Result<FitRecord, FitError> {
    let mut best: Option<FitRecord> = None;
    for ratio in MixingRatio::all() {
        let Some(candidate) = fit_at_ratio(g_x, g_y, target, ratio) else {
            trace!("'{}' at ratio {}: degenerate hybrid descriptor", adsorbate, ratio);
            continue;
        };
        trace!(
            "'{}' at ratio {}: R² {:.6}",
            adsorbate, ratio, candidate.fit.r_squared
        );
        if best.is_none_or(|b| candidate.fit.r_squared > b.fit.r_squared) {
            best = Some(candidate);
        }
    }
    best.ok_or_else(|| FitError::DegenerateRegression {
        adsorbate: adsorbate.to_string(),
    })
}
