use super::mesh::{MeshError, validate_density, validate_range};
use crate::core::models::descriptor::DescriptorPair;
use crate::core::scaling::fitter::FitMode;
use std::path::PathBuf;
use thiserror::Error;

pub const DEFAULT_RANGE: (f64, f64) = (-2.0, 2.0);
pub const DEFAULT_DENSITY: (usize, usize) = (200, 200);
pub const DEFAULT_EXTERNAL_POTENTIAL: f64 = 0.0;

#[derive(Debug, Error, PartialEq, Eq, Clone)]
pub enum ConfigError {
    #[error("Missing required parameter: {0}")]
    MissingParameter(&'static str),
    #[error("Invalid value for '{parameter}': {reason}")]
    InvalidValue {
        parameter: &'static str,
        reason: String,
    },
}

/// Where the energy tables come from and which rows/columns to use.
#[derive(Debug, Clone, PartialEq)]
pub struct DataConfig {
    pub adsorption_energy_dir: PathBuf,
    pub thermal_correction_path: PathBuf,
    pub substrates: Vec<String>,
    pub adsorbates: Vec<String>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ScalingConfig {
    pub descriptors: DescriptorPair,
    pub mode: FitMode,
}

#[derive(Debug, Clone, PartialEq)]
pub struct MeshConfig {
    pub x_range: (f64, f64),
    pub y_range: (f64, f64),
    pub density: (usize, usize),
}

impl Default for MeshConfig {
    fn default() -> Self {
        Self {
            x_range: DEFAULT_RANGE,
            y_range: DEFAULT_RANGE,
            density: DEFAULT_DENSITY,
        }
    }
}

/// Pathway and standalone free-energy files consumed when translating reactions.
#[derive(Debug, Clone, PartialEq)]
pub struct ReactionDataConfig {
    pub free_energy_path: PathBuf,
    pub reaction_pathway_path: PathBuf,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SelectivityPair {
    pub primary: String,
    pub competing: String,
}

#[derive(Debug, Clone, PartialEq)]
pub struct EvaluationConfig {
    pub external_potential: f64,
    /// Reactions to map; empty means every reaction in the pathway file.
    pub reactions: Vec<String>,
    pub selectivity: Vec<SelectivityPair>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct FitConfig {
    pub data: DataConfig,
    pub scaling: ScalingConfig,
}

#[derive(Debug, Clone, PartialEq)]
pub struct VolcanoConfig {
    pub fit: FitConfig,
    pub reaction_data: ReactionDataConfig,
    pub mesh: MeshConfig,
    pub evaluation: EvaluationConfig,
}

#[derive(Default)]
pub struct FitConfigBuilder {
    adsorption_energy_dir: Option<PathBuf>,
    thermal_correction_path: Option<PathBuf>,
    substrates: Option<Vec<String>>,
    adsorbates: Option<Vec<String>>,
    descriptors: Option<DescriptorPair>,
    mode: Option<FitMode>,
}

impl FitConfigBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn adsorption_energy_dir(mut self, path: PathBuf) -> Self {
        self.adsorption_energy_dir = Some(path);
        self
    }
    pub fn thermal_correction_path(mut self, path: PathBuf) -> Self {
        self.thermal_correction_path = Some(path);
        self
    }
    pub fn substrates(mut self, substrates: Vec<String>) -> Self {
        self.substrates = Some(substrates);
        self
    }
    pub fn adsorbates(mut self, adsorbates: Vec<String>) -> Self {
        self.adsorbates = Some(adsorbates);
        self
    }
    pub fn descriptors(mut self, descriptors: DescriptorPair) -> Self {
        self.descriptors = Some(descriptors);
        self
    }
    pub fn mode(mut self, mode: FitMode) -> Self {
        self.mode = Some(mode);
        self
    }

    pub fn build(self) -> Result<FitConfig, ConfigError> {
        let data = DataConfig {
            adsorption_energy_dir: self
                .adsorption_energy_dir
                .ok_or(ConfigError::MissingParameter("adsorption_energy_dir"))?,
            thermal_correction_path: self
                .thermal_correction_path
                .ok_or(ConfigError::MissingParameter("thermal_correction_path"))?,
            substrates: self
                .substrates
                .ok_or(ConfigError::MissingParameter("substrates"))?,
            adsorbates: self
                .adsorbates
                .ok_or(ConfigError::MissingParameter("adsorbates"))?,
        };
        let scaling = ScalingConfig {
            descriptors: self
                .descriptors
                .ok_or(ConfigError::MissingParameter("descriptors"))?,
            mode: self.mode.unwrap_or_default(),
        };

        if data.substrates.is_empty() {
            return Err(ConfigError::InvalidValue {
                parameter: "substrates",
                reason: "at least one substrate is required".to_string(),
            });
        }
        for descriptor in [scaling.descriptors.x(), scaling.descriptors.y()] {
            if !data.adsorbates.iter().any(|a| a == descriptor) {
                return Err(ConfigError::InvalidValue {
                    parameter: "descriptors",
                    reason: format!("descriptor '{}' is not among the adsorbates", descriptor),
                });
            }
        }
        Ok(FitConfig { data, scaling })
    }
}

#[derive(Default)]
pub struct VolcanoConfigBuilder {
    fit: FitConfigBuilder,
    free_energy_path: Option<PathBuf>,
    reaction_pathway_path: Option<PathBuf>,
    x_range: Option<(f64, f64)>,
    y_range: Option<(f64, f64)>,
    density: Option<(usize, usize)>,
    external_potential: Option<f64>,
    reactions: Vec<String>,
    selectivity: Vec<SelectivityPair>,
}

impl VolcanoConfigBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Replaces every fitting parameter set so far.
    pub fn with_fit(mut self, fit: FitConfigBuilder) -> Self {
        self.fit = fit;
        self
    }

    pub fn adsorption_energy_dir(mut self, path: PathBuf) -> Self {
        self.fit = self.fit.adsorption_energy_dir(path);
        self
    }
    pub fn thermal_correction_path(mut self, path: PathBuf) -> Self {
        self.fit = self.fit.thermal_correction_path(path);
        self
    }
    pub fn substrates(mut self, substrates: Vec<String>) -> Self {
        self.fit = self.fit.substrates(substrates);
        self
    }
    pub fn adsorbates(mut self, adsorbates: Vec<String>) -> Self {
        self.fit = self.fit.adsorbates(adsorbates);
        self
    }
    pub fn descriptors(mut self, descriptors: DescriptorPair) -> Self {
        self.fit = self.fit.descriptors(descriptors);
        self
    }
    pub fn mode(mut self, mode: FitMode) -> Self {
        self.fit = self.fit.mode(mode);
        self
    }
    pub fn free_energy_path(mut self, path: PathBuf) -> Self {
        self.free_energy_path = Some(path);
        self
    }
    pub fn reaction_pathway_path(mut self, path: PathBuf) -> Self {
        self.reaction_pathway_path = Some(path);
        self
    }
    pub fn x_range(mut self, range: (f64, f64)) -> Self {
        self.x_range = Some(range);
        self
    }
    pub fn y_range(mut self, range: (f64, f64)) -> Self {
        self.y_range = Some(range);
        self
    }
    pub fn density(mut self, density: (usize, usize)) -> Self {
        self.density = Some(density);
        self
    }
    pub fn external_potential(mut self, potential: f64) -> Self {
        self.external_potential = Some(potential);
        self
    }
    pub fn reaction(mut self, name: impl Into<String>) -> Self {
        self.reactions.push(name.into());
        self
    }
    pub fn selectivity(mut self, primary: impl Into<String>, competing: impl Into<String>) -> Self {
        self.selectivity.push(SelectivityPair {
            primary: primary.into(),
            competing: competing.into(),
        });
        self
    }

    pub fn build(self) -> Result<VolcanoConfig, ConfigError> {
        let fit = self.fit.build()?;
        let reaction_data = ReactionDataConfig {
            free_energy_path: self
                .free_energy_path
                .ok_or(ConfigError::MissingParameter("free_energy_path"))?,
            reaction_pathway_path: self
                .reaction_pathway_path
                .ok_or(ConfigError::MissingParameter("reaction_pathway_path"))?,
        };

        let mesh = MeshConfig {
            x_range: self.x_range.unwrap_or(DEFAULT_RANGE),
            y_range: self.y_range.unwrap_or(DEFAULT_RANGE),
            density: self.density.unwrap_or(DEFAULT_DENSITY),
        };
        let invalid = |parameter: &'static str| {
            move |e: MeshError| ConfigError::InvalidValue {
                parameter,
                reason: e.to_string(),
            }
        };
        validate_range("x", mesh.x_range).map_err(invalid("x_range"))?;
        validate_range("y", mesh.y_range).map_err(invalid("y_range"))?;
        validate_density("x", mesh.density.0).map_err(invalid("density"))?;
        validate_density("y", mesh.density.1).map_err(invalid("density"))?;

        let external_potential = self
            .external_potential
            .unwrap_or(DEFAULT_EXTERNAL_POTENTIAL);
        if !external_potential.is_finite() {
            return Err(ConfigError::InvalidValue {
                parameter: "external_potential",
                reason: format!("{} is not a finite number", external_potential),
            });
        }

        Ok(VolcanoConfig {
            fit,
            reaction_data,
            mesh,
            evaluation: EvaluationConfig {
                external_potential,
                reactions: self.reactions,
                selectivity: self.selectivity,
            },
        })
    }
}
