use crate::core::scaling::term::StepLinearFunction;
use nalgebra::DMatrix;
use thiserror::Error;
use tracing::{debug, instrument};

#[cfg(feature = "parallel")]
use rayon::prelude::*;

/// Value of one step function over the grid, `ny` rows by `nx` columns.
pub type StepValueMesh = DMatrix<f64>;
pub type LimitingPotentialMesh = DMatrix<f64>;
/// Positional index of the rate-determining step at every grid point.
pub type RdsMesh = DMatrix<usize>;
pub type SelectivityMesh = DMatrix<f64>;

pub const MIN_DENSITY: usize = 2;

#[derive(Debug, Error, Clone, PartialEq)]
pub enum MeshError {
    #[error("Invalid {axis} range ({low}, {high}): bounds must be finite and increasing")]
    InvalidRange {
        axis: &'static str,
        low: f64,
        high: f64,
    },
    #[error("Invalid {axis} density {points}: at least 2 points are required")]
    InvalidDensity { axis: &'static str, points: usize },
    #[error("Cannot reduce an empty set of steps")]
    EmptyStepSet,
    #[error("Shape mismatch: expected {expected:?}, found {found:?}")]
    ShapeMismatch {
        expected: (usize, usize),
        found: (usize, usize),
    },
}

/// `n` evenly spaced points from `start` to `end`, both included.
pub fn linspace(start: f64, end: f64, n: usize) -> Vec<f64> {
    match n {
        0 => Vec::new(),
        1 => vec![start],
        _ => {
            let step = (end - start) / (n - 1) as f64;
            (0..n)
                .map(|k| if k == n - 1 { end } else { start + step * k as f64 })
                .collect()
        }
    }
}

/// Regular grid over the descriptor plane.
#[derive(Debug, Clone, PartialEq)]
pub struct DescriptorGrid {
    x: Vec<f64>,
    y: Vec<f64>,
}

impl DescriptorGrid {
    pub fn new(
        x_range: (f64, f64),
        y_range: (f64, f64),
        density: (usize, usize),
    ) -> Result<Self, MeshError> {
        validate_range("x", x_range)?;
        validate_range("y", y_range)?;
        validate_density("x", density.0)?;
        validate_density("y", density.1)?;
        Ok(Self {
            x: linspace(x_range.0, x_range.1, density.0),
            y: linspace(y_range.0, y_range.1, density.1),
        })
    }

    pub fn x(&self) -> &[f64] {
        &self.x
    }

    pub fn y(&self) -> &[f64] {
        &self.y
    }

    pub fn nx(&self) -> usize {
        self.x.len()
    }

    pub fn ny(&self) -> usize {
        self.y.len()
    }

    /// `(rows, columns)` of every mesh over this grid.
    pub fn shape(&self) -> (usize, usize) {
        (self.ny(), self.nx())
    }
}

pub(crate) fn validate_range(axis: &'static str, range: (f64, f64)) -> Result<(), MeshError> {
    let (low, high) = range;
    if low.is_finite() && high.is_finite() && low < high {
        Ok(())
    } else {
        Err(MeshError::InvalidRange { axis, low, high })
    }
}

pub(crate) fn validate_density(axis: &'static str, points: usize) -> Result<(), MeshError> {
    if points >= MIN_DENSITY {
        Ok(())
    } else {
        Err(MeshError::InvalidDensity { axis, points })
    }
}

/// Index and value of the largest element; the first one wins a tie.
fn first_max(values: impl IntoIterator<Item = f64>) -> Option<(usize, f64)> {
    let mut best: Option<(usize, f64)> = None;
    for (index, value) in values.into_iter().enumerate() {
        if best.is_none_or(|(_, b)| value > b) {
            best = Some((index, value));
        }
    }
    best
}

/// Limiting potential and rate-determining step over a grid.
#[derive(Debug, Clone, PartialEq)]
pub struct LimitingPotential {
    pub potential: LimitingPotentialMesh,
    pub rds: RdsMesh,
}

/// Evaluates step functions over a [`DescriptorGrid`].
#[derive(Debug, Clone)]
pub struct VolcanoMeshEvaluator {
    grid: DescriptorGrid,
}

impl VolcanoMeshEvaluator {
    pub fn new(grid: DescriptorGrid) -> Self {
        Self { grid }
    }

    pub fn grid(&self) -> &DescriptorGrid {
        &self.grid
    }

    pub fn evaluate_step(&self, function: &StepLinearFunction) -> StepValueMesh {
        DMatrix::from_fn(self.grid.ny(), self.grid.nx(), |j, i| {
            function.evaluate(self.grid.x[i], self.grid.y[j])
        })
    }

    /// Maximum over steps at every grid point, with the position of the maximizing step.
    #[instrument(skip_all, name = "limiting_potential", fields(steps = steps.len()))]
    pub fn evaluate_limiting_potential(
        &self,
        steps: &[StepLinearFunction],
    ) -> Result<LimitingPotential, MeshError> {
        if steps.is_empty() {
            return Err(MeshError::EmptyStepSet);
        }
        let (ny, nx) = self.grid.shape();

        #[cfg(not(feature = "parallel"))]
        let iterator = self.grid.y.iter();

        #[cfg(feature = "parallel")]
        let iterator = self.grid.y.par_iter();

        let rows: Vec<Vec<(usize, f64)>> = iterator
            .map(|&y| {
                self.grid
                    .x
                    .iter()
                    .map(|&x| {
                        first_max(steps.iter().map(|f| f.evaluate(x, y))).unwrap_or((0, f64::NAN))
                    })
                    .collect()
            })
            .collect();

        debug!("Evaluated {} step(s) over a {}x{} grid", steps.len(), ny, nx);
        Ok(LimitingPotential {
            potential: DMatrix::from_fn(ny, nx, |j, i| rows[j][i].1),
            rds: DMatrix::from_fn(ny, nx, |j, i| rows[j][i].0),
        })
    }
}

/// Builds the grid and reduces `step_functions` over it in one call.
pub fn evaluate_limiting_potential(
    step_functions: &[StepLinearFunction],
    x_range: (f64, f64),
    y_range: (f64, f64),
    density: (usize, usize),
) -> Result<(LimitingPotentialMesh, RdsMesh), MeshError> {
    let grid = DescriptorGrid::new(x_range, y_range, density)?;
    let result = VolcanoMeshEvaluator::new(grid).evaluate_limiting_potential(step_functions)?;
    Ok((result.potential, result.rds))
}

/// `primary - competing`; negative values favour the primary reaction.
pub fn evaluate_selectivity(
    primary: &LimitingPotentialMesh,
    competing: &LimitingPotentialMesh,
) -> Result<SelectivityMesh, MeshError> {
    if primary.shape() != competing.shape() {
        return Err(MeshError::ShapeMismatch {
            expected: primary.shape(),
            found: competing.shape(),
        });
    }
    Ok(primary - competing)
}

/// Reduces per-step value vectors (one entry per sample) to the limiting value and the
/// position of the maximizing step for each sample.
pub fn reduce_step_values(step_values: &[Vec<f64>]) -> Result<(Vec<f64>, Vec<usize>), MeshError> {
    let Some(first) = step_values.first() else {
        return Err(MeshError::EmptyStepSet);
    };
    let len = first.len();
    if let Some(other) = step_values.iter().find(|values| values.len() != len) {
        return Err(MeshError::ShapeMismatch {
            expected: (len, 1),
            found: (other.len(), 1),
        });
    }

    let (potential, rds): (Vec<f64>, Vec<usize>) = (0..len)
        .map(|k| {
            first_max(step_values.iter().map(|values| values[k]))
                .map(|(index, value)| (value, index))
                .unwrap_or((f64::NAN, 0))
        })
        .unzip();
    Ok((potential, rds))
}
