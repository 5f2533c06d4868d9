use crate::cli::{FitArgs, MapArgs};
use crate::error::{CliError, Result};
use serde::Deserialize;
use std::path::{Path, PathBuf};
use tracing::debug;
use volcano::core::models::descriptor::{DescriptorPair, MixingRatio};
use volcano::core::scaling::fitter::FitMode;
use volcano::engine::config as core_config;

const AUTO_MODE: &str = "auto";

#[derive(Deserialize, Debug, Default, Clone)]
#[serde(deny_unknown_fields, rename_all = "kebab-case")]
struct PartialDataConfig {
    adsorption_energy_dir: Option<PathBuf>,
    thermal_correction: Option<PathBuf>,
    free_energy: Option<PathBuf>,
    reaction_pathway: Option<PathBuf>,
    substrates: Option<Vec<String>>,
    adsorbates: Option<Vec<String>>,
}

#[derive(Deserialize, Debug, Default, Clone)]
#[serde(deny_unknown_fields, rename_all = "kebab-case")]
struct PartialScalingConfig {
    descriptors: Option<[String; 2]>,
    mode: Option<String>,
}

#[derive(Deserialize, Debug, Default, Clone)]
#[serde(deny_unknown_fields, rename_all = "kebab-case")]
struct PartialMeshConfig {
    x_range: Option<[f64; 2]>,
    y_range: Option<[f64; 2]>,
    density: Option<[usize; 2]>,
}

#[derive(Deserialize, Debug, Clone)]
#[serde(deny_unknown_fields)]
struct PartialSelectivityPair {
    primary: String,
    competing: String,
}

#[derive(Deserialize, Debug, Default, Clone)]
#[serde(deny_unknown_fields, rename_all = "kebab-case")]
struct PartialEvaluationConfig {
    external_potential: Option<f64>,
    reactions: Option<Vec<String>>,
    selectivity: Option<Vec<PartialSelectivityPair>>,
}

#[derive(Deserialize, Debug, Default)]
#[serde(deny_unknown_fields)]
pub struct PartialVolcanoConfig {
    data: Option<PartialDataConfig>,
    scaling: Option<PartialScalingConfig>,
    mesh: Option<PartialMeshConfig>,
    evaluation: Option<PartialEvaluationConfig>,
    /// Directory relative paths in the file are resolved against.
    #[serde(skip)]
    base_dir: PathBuf,
}

impl PartialVolcanoConfig {
    pub fn from_file(path: &Path) -> Result<Self> {
        debug!("Loading configuration from file: {:?}", path);
        let content = std::fs::read_to_string(path)?;
        let mut config: Self = toml::from_str(&content).map_err(|e| CliError::FileParsing {
            path: path.to_path_buf(),
            source: e.into(),
        })?;
        config.base_dir = path
            .parent()
            .map(Path::to_path_buf)
            .unwrap_or_default();
        Ok(config)
    }

    pub fn merge_with_fit_cli(mut self, args: &FitArgs) -> Result<core_config::FitConfig> {
        self.apply_set_values(&args.set_values)?;
        self.fit_builder(args.mode.as_deref())?
            .build()
            .map_err(|e| CliError::Config(e.to_string()))
    }

    pub fn merge_with_map_cli(mut self, args: &MapArgs) -> Result<core_config::VolcanoConfig> {
        self.apply_set_values(&args.set_values)?;

        let fit = self.fit_builder(args.mode.as_deref())?;
        let data = self.data.take().unwrap_or_default();
        let mesh = self.mesh.take().unwrap_or_default();
        let evaluation = self.evaluation.take().unwrap_or_default();

        let mut builder = core_config::VolcanoConfigBuilder::new().with_fit(fit);
        if let Some(path) = data.free_energy {
            builder = builder.free_energy_path(self.resolve(path));
        }
        if let Some(path) = data.reaction_pathway {
            builder = builder.reaction_pathway_path(self.resolve(path));
        }

        if let Some([low, high]) = mesh.x_range {
            builder = builder.x_range((low, high));
        }
        if let Some([low, high]) = mesh.y_range {
            builder = builder.y_range((low, high));
        }
        let density = match &args.density {
            Some(text) => Some(parse_density(text)?),
            None => mesh.density.map(|[nx, ny]| (nx, ny)),
        };
        if let Some(density) = density {
            builder = builder.density(density);
        }

        if let Some(potential) = args.potential.or(evaluation.external_potential) {
            builder = builder.external_potential(potential);
        }
        let reactions = if args.reactions.is_empty() {
            evaluation.reactions.unwrap_or_default()
        } else {
            args.reactions.clone()
        };
        for reaction in reactions {
            builder = builder.reaction(reaction);
        }
        for pair in evaluation.selectivity.unwrap_or_default() {
            builder = builder.selectivity(pair.primary, pair.competing);
        }

        builder.build().map_err(|e| CliError::Config(e.to_string()))
    }

    fn fit_builder(&mut self, mode_override: Option<&str>) -> Result<core_config::FitConfigBuilder> {
        let data = self.data.clone().unwrap_or_default();
        let scaling = self.scaling.take().unwrap_or_default();

        let [x, y] = scaling.descriptors.ok_or_else(|| {
            CliError::Config("`scaling.descriptors` is required.".to_string())
        })?;
        let descriptors =
            DescriptorPair::new(x, y).map_err(|e| CliError::Config(e.to_string()))?;
        let mode = match mode_override.or(scaling.mode.as_deref()) {
            Some(text) => parse_fit_mode(text)?,
            None => FitMode::Auto,
        };

        let mut builder = core_config::FitConfigBuilder::new()
            .descriptors(descriptors)
            .mode(mode);
        if let Some(path) = data.adsorption_energy_dir {
            builder = builder.adsorption_energy_dir(self.resolve(path));
        }
        if let Some(path) = data.thermal_correction {
            builder = builder.thermal_correction_path(self.resolve(path));
        }
        if let Some(substrates) = data.substrates {
            builder = builder.substrates(substrates);
        }
        if let Some(adsorbates) = data.adsorbates {
            builder = builder.adsorbates(adsorbates);
        }
        Ok(builder)
    }

    fn resolve(&self, path: PathBuf) -> PathBuf {
        if path.is_absolute() {
            path
        } else {
            self.base_dir.join(path)
        }
    }

    fn apply_set_values(&mut self, set_values: &[String]) -> Result<()> {
        for kv_pair in set_values {
            let Some((key, value_str)) = kv_pair.split_once('=') else {
                return Err(CliError::Config(format!(
                    "Invalid --set format: '{}'. Expected KEY=VALUE.",
                    kv_pair
                )));
            };
            let value_str = value_str.trim();

            match key.trim() {
                "data.substrates" => {
                    self.data.get_or_insert_with(Default::default).substrates =
                        Some(parse_list(value_str));
                }
                "data.adsorbates" => {
                    self.data.get_or_insert_with(Default::default).adsorbates =
                        Some(parse_list(value_str));
                }
                "scaling.descriptors" => {
                    let [x, y]: [String; 2] = parse_list(value_str).try_into().map_err(|_| {
                        CliError::Config(format!(
                            "Expected two comma-separated descriptors for {}: {}",
                            key, value_str
                        ))
                    })?;
                    self.scaling.get_or_insert_with(Default::default).descriptors = Some([x, y]);
                }
                "scaling.mode" => {
                    parse_fit_mode(value_str)?;
                    self.scaling.get_or_insert_with(Default::default).mode =
                        Some(value_str.to_string());
                }
                "mesh.x-range" => {
                    self.mesh.get_or_insert_with(Default::default).x_range =
                        Some(parse_range(key, value_str)?);
                }
                "mesh.y-range" => {
                    self.mesh.get_or_insert_with(Default::default).y_range =
                        Some(parse_range(key, value_str)?);
                }
                "mesh.density" => {
                    let (nx, ny) = parse_density(value_str)?;
                    self.mesh.get_or_insert_with(Default::default).density = Some([nx, ny]);
                }
                "evaluation.external-potential" => {
                    self.evaluation
                        .get_or_insert_with(Default::default)
                        .external_potential = Some(value_str.parse().map_err(|_| {
                        CliError::Config(format!("Invalid float value for {}: {}", key, value_str))
                    })?);
                }
                "evaluation.reactions" => {
                    self.evaluation.get_or_insert_with(Default::default).reactions =
                        Some(parse_list(value_str));
                }
                _ => {
                    return Err(CliError::Config(format!(
                        "Unsupported configuration key for --set: '{}'",
                        key
                    )));
                }
            }
        }
        Ok(())
    }
}

/// Parses `auto` or a fixed ratio pair such as `70:30` (also `70,30`).
pub fn parse_fit_mode(text: &str) -> Result<FitMode> {
    let text = text.trim();
    if text.eq_ignore_ascii_case(AUTO_MODE) {
        return Ok(FitMode::Auto);
    }
    let invalid = || {
        CliError::Argument(format!(
            "Invalid mixing-ratio mode '{}': expected 'auto' or a pair like '70:30'",
            text
        ))
    };
    let (x, y) = text.split_once([':', ',']).ok_or_else(invalid)?;
    let x: u8 = x.trim().parse().map_err(|_| invalid())?;
    let y: u8 = y.trim().parse().map_err(|_| invalid())?;
    let ratio = MixingRatio::from_pair(x, y).map_err(|e| CliError::Argument(e.to_string()))?;
    Ok(FitMode::Fixed(ratio))
}

/// Parses `NXxNY`, or a single number for a square grid.
pub fn parse_density(text: &str) -> Result<(usize, usize)> {
    let invalid = || {
        CliError::Argument(format!(
            "Invalid grid density '{}': expected 'NXxNY' or a single number",
            text
        ))
    };
    let parse = |s: &str| s.trim().parse::<usize>().map_err(|_| invalid());
    match text.split_once(['x', 'X']) {
        Some((nx, ny)) => Ok((parse(nx)?, parse(ny)?)),
        None => {
            let n = parse(text)?;
            Ok((n, n))
        }
    }
}

fn parse_range(key: &str, text: &str) -> Result<[f64; 2]> {
    let invalid = || {
        CliError::Config(format!(
            "Invalid range for {}: '{}'. Expected LOW,HIGH.",
            key, text
        ))
    };
    let (low, high) = text.split_once(',').ok_or_else(invalid)?;
    Ok([
        low.trim().parse().map_err(|_| invalid())?,
        high.trim().parse().map_err(|_| invalid())?,
    ])
}

fn parse_list(text: &str) -> Vec<String> {
    text.split(',')
        .map(str::trim)
        .filter(|item| !item.is_empty())
        .map(str::to_string)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cli::{Cli, Commands};
    use clap::Parser;
    use std::fs;
    use tempfile::{TempDir, tempdir};

    const BASE_CONFIG: &str = r#"
        [data]
        adsorption-energy-dir = "adsorption"
        thermal-correction = "corrections.csv"
        free-energy = "free_energy.csv"
        reaction-pathway = "reactions.json"
        substrates = ["graphene", "g-C3N4"]
        adsorbates = ["CO", "OH", "COOH", "H"]

        [scaling]
        descriptors = ["CO", "OH"]
    "#;

    fn write_config(dir: &TempDir, name: &str, content: &str) -> PathBuf {
        let path = dir.path().join(name);
        fs::write(&path, content).unwrap();
        path
    }

    fn map_args(config_path: &Path, extra: &[&str]) -> MapArgs {
        let mut args = vec![
            "volcano".to_string(),
            "map".to_string(),
            "-c".to_string(),
            config_path.to_str().unwrap().to_string(),
            "-o".to_string(),
            "out".to_string(),
        ];
        args.extend(extra.iter().map(|s| s.to_string()));
        match Cli::parse_from(args).command {
            Commands::Map(args) => args,
            _ => panic!("Expected 'map' subcommand"),
        }
    }

    fn fit_args(config_path: &Path, extra: &[&str]) -> FitArgs {
        let mut args = vec![
            "volcano".to_string(),
            "fit".to_string(),
            "-c".to_string(),
            config_path.to_str().unwrap().to_string(),
        ];
        args.extend(extra.iter().map(|s| s.to_string()));
        match Cli::parse_from(args).command {
            Commands::Fit(args) => args,
            _ => panic!("Expected 'fit' subcommand"),
        }
    }

    #[test]
    fn file_values_merge_with_defaults_and_resolve_relative_paths() {
        let dir = tempdir().unwrap();
        let path = write_config(&dir, "study.toml", BASE_CONFIG);

        let config = PartialVolcanoConfig::from_file(&path)
            .unwrap()
            .merge_with_map_cli(&map_args(&path, &[]))
            .unwrap();

        assert_eq!(
            config.fit.data.adsorption_energy_dir,
            dir.path().join("adsorption")
        );
        assert_eq!(
            config.reaction_data.reaction_pathway_path,
            dir.path().join("reactions.json")
        );
        assert_eq!(config.fit.scaling.mode, FitMode::Auto);
        assert_eq!(config.mesh, core_config::MeshConfig::default());
        assert_eq!(config.evaluation.external_potential, 0.0);
    }

    #[test]
    fn cli_args_override_file_values() {
        let dir = tempdir().unwrap();
        let content = format!(
            "{}\nmode = \"50:50\"\n\n[mesh]\ndensity = [10, 10]\n\n[evaluation]\nexternal-potential = -0.3\nreactions = [\"HER\"]\n",
            BASE_CONFIG
        );
        let path = write_config(&dir, "study.toml", &content);

        let args = map_args(
            &path,
            &["--mode", "auto", "-U", "-0.1", "--density", "20x30", "-r", "CO2RR"],
        );
        let config = PartialVolcanoConfig::from_file(&path)
            .unwrap()
            .merge_with_map_cli(&args)
            .unwrap();

        assert_eq!(config.fit.scaling.mode, FitMode::Auto);
        assert_eq!(config.evaluation.external_potential, -0.1);
        assert_eq!(config.mesh.density, (20, 30));
        assert_eq!(config.evaluation.reactions, vec!["CO2RR".to_string()]);
    }

    #[test]
    fn set_values_override_file() {
        let dir = tempdir().unwrap();
        let path = write_config(&dir, "study.toml", BASE_CONFIG);

        let args = map_args(
            &path,
            &[
                "-S",
                "scaling.mode=30:70",
                "-S",
                "mesh.x-range=-1.5,0.5",
                "-S",
                "evaluation.external-potential=0.25",
            ],
        );
        let config = PartialVolcanoConfig::from_file(&path)
            .unwrap()
            .merge_with_map_cli(&args)
            .unwrap();

        assert_eq!(
            config.fit.scaling.mode,
            FitMode::Fixed(MixingRatio::new(30).unwrap())
        );
        assert_eq!(config.mesh.x_range, (-1.5, 0.5));
        assert_eq!(config.evaluation.external_potential, 0.25);
    }

    #[test]
    fn fit_command_does_not_need_reaction_files() {
        let dir = tempdir().unwrap();
        let path = write_config(
            &dir,
            "fit.toml",
            r#"
            [data]
            adsorption-energy-dir = "/data/adsorption"
            thermal-correction = "corrections.csv"
            substrates = ["graphene"]
            adsorbates = ["CO", "OH"]

            [scaling]
            descriptors = ["CO", "OH"]
            "#,
        );

        let config = PartialVolcanoConfig::from_file(&path)
            .unwrap()
            .merge_with_fit_cli(&fit_args(&path, &["-m", "100:0"]))
            .unwrap();
        assert_eq!(
            config.data.adsorption_energy_dir,
            PathBuf::from("/data/adsorption")
        );
        assert_eq!(
            config.scaling.mode,
            FitMode::Fixed(MixingRatio::new(100).unwrap())
        );
    }

    #[test]
    fn missing_descriptors_returns_config_error() {
        let dir = tempdir().unwrap();
        let path = write_config(
            &dir,
            "study.toml",
            "[data]\nsubstrates = [\"graphene\"]\n",
        );
        let result = PartialVolcanoConfig::from_file(&path)
            .unwrap()
            .merge_with_fit_cli(&fit_args(&path, &[]));
        assert!(matches!(result, Err(CliError::Config(ref msg)) if msg.contains("descriptors")));
    }

    #[test]
    fn missing_reaction_file_is_reported_by_name() {
        let dir = tempdir().unwrap();
        let content = BASE_CONFIG.replace("reaction-pathway = \"reactions.json\"", "");
        let path = write_config(&dir, "study.toml", &content);
        let result = PartialVolcanoConfig::from_file(&path)
            .unwrap()
            .merge_with_map_cli(&map_args(&path, &[]));
        assert!(
            matches!(result, Err(CliError::Config(ref msg)) if msg.contains("reaction_pathway_path"))
        );
    }

    #[test]
    fn unknown_keys_are_rejected() {
        let dir = tempdir().unwrap();
        let path = write_config(&dir, "study.toml", "[scaling]\nratio = 5\n");
        assert!(matches!(
            PartialVolcanoConfig::from_file(&path),
            Err(CliError::FileParsing { .. })
        ));
    }

    #[test]
    fn unsupported_set_key_is_rejected() {
        let dir = tempdir().unwrap();
        let path = write_config(&dir, "study.toml", BASE_CONFIG);
        let result = PartialVolcanoConfig::from_file(&path)
            .unwrap()
            .merge_with_map_cli(&map_args(&path, &["-S", "mesh.colour=red"]));
        assert!(matches!(result, Err(CliError::Config(_))));
    }

    #[test]
    fn mode_and_density_parsers() {
        assert_eq!(parse_fit_mode("AUTO").unwrap(), FitMode::Auto);
        assert_eq!(
            parse_fit_mode("25, 75").unwrap(),
            FitMode::Fixed(MixingRatio::new(25).unwrap())
        );
        assert!(matches!(parse_fit_mode("60:60"), Err(CliError::Argument(_))));
        assert!(matches!(parse_fit_mode("half"), Err(CliError::Argument(_))));

        assert_eq!(parse_density("120x80").unwrap(), (120, 80));
        assert_eq!(parse_density("64").unwrap(), (64, 64));
        assert!(parse_density("ax3").is_err());
    }
}
