use serde::Serialize;
use std::fmt;
use tracing::warn;

/// Fitted relations with an R² below this value are flagged.
pub const LOW_R_SQUARED_THRESHOLD: f64 = 0.75;

/// Substrate tables with fewer rows than this are flagged.
pub const SMALL_SAMPLE_THRESHOLD: usize = 5;

/// A non-fatal data-quality signal raised while fitting or translating reactions.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "kind", rename_all = "kebab-case")]
pub enum Warning {
    LowRSquared {
        adsorbate: String,
        ratio: u8,
        r_squared: f64,
    },
    NonUnitStoichiometry {
        reaction: String,
        step: usize,
        species: String,
        count: f64,
    },
    SmallSampleCount {
        table: String,
        samples: usize,
    },
}

impl fmt::Display for Warning {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::LowRSquared {
                adsorbate,
                ratio,
                r_squared,
            } => write!(
                f,
                "Scaling relation for '{}' has a low R² of {:.4} (best mixing ratio {}%)",
                adsorbate, r_squared, ratio
            ),
            Self::NonUnitStoichiometry {
                reaction,
                step,
                species,
                count,
            } => write!(
                f,
                "Adsorbed species '{}' appears with count {} in reaction '{}', step {}",
                species, count, reaction, step
            ),
            Self::SmallSampleCount { table, samples } => write!(
                f,
                "Table '{}' has only {} sample(s); fitted relations may be unreliable",
                table, samples
            ),
        }
    }
}

/// Ordered collection of warnings that accompanies a computed result.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct Diagnostics {
    warnings: Vec<Warning>,
}

impl Diagnostics {
    pub fn new() -> Self {
        Self::default()
    }

    /// Records a warning and logs it.
    pub fn push(&mut self, warning: Warning) {
        warn!("{}", warning);
        self.warnings.push(warning);
    }

    /// Appends warnings that were already logged when first recorded.
    pub fn merge(&mut self, other: Diagnostics) {
        self.warnings.extend(other.warnings);
    }

    pub fn warnings(&self) -> &[Warning] {
        &self.warnings
    }

    pub fn is_empty(&self) -> bool {
        self.warnings.is_empty()
    }

    pub fn len(&self) -> usize {
        self.warnings.len()
    }
}
