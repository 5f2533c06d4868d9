use crate::core::models::energies::{FreeEnergies, ThermalCorrections};
use crate::core::models::table::{EnergyTable, FreeEnergyTable, TableError};
use serde::Deserialize;
use std::collections::BTreeMap;
use std::path::Path;
use thiserror::Error;
use tracing::debug;

const TABLE_EXTENSION: &str = "csv";

#[derive(Debug, Error)]
pub enum TableLoadError {
    #[error("CSV parsing error for '{path}': {source}")]
    Csv { path: String, source: csv::Error },
    #[error("No adsorption-energy file for substrate '{substrate}' (expected '{path}')")]
    MissingSubstrateFile { substrate: String, path: String },
    #[error("Table '{path}' has no sample-identifier column")]
    MissingHeader { path: String },
    #[error("Invalid value '{value}' in '{path}' at sample '{sample}', column '{column}'")]
    InvalidValue {
        path: String,
        sample: String,
        column: String,
        value: String,
    },
    #[error("'{name}' is listed more than once in '{path}'")]
    DuplicateEntry { path: String, name: String },
    #[error("No thermal correction entry for adsorbate '{adsorbate}'")]
    MissingCorrection { adsorbate: String },
    #[error("Invalid table '{table}': {source}")]
    Table {
        table: String,
        #[source]
        source: TableError,
    },
}

#[derive(Debug, Deserialize)]
struct CorrectionRecord {
    #[serde(rename = "Species")]
    species: String,
    #[serde(rename = "Correction")]
    correction: f64,
}

#[derive(Debug, Deserialize)]
struct FreeEnergyRecord {
    name: String,
    free_energy: f64,
}

fn check_entry(path: &str, name: &str, column: &str, value: f64) -> Result<(), TableLoadError> {
    if value.is_finite() {
        Ok(())
    } else {
        Err(TableLoadError::InvalidValue {
            path: path.to_string(),
            sample: name.to_string(),
            column: column.to_string(),
            value: value.to_string(),
        })
    }
}

/// Reads one adsorption-energy table: the first column holds sample identifiers, every
/// further column is an adsorbate.
pub fn read_energy_table(path: &Path) -> Result<EnergyTable, TableLoadError> {
    let path_str = path.to_string_lossy().to_string();
    let csv_err = |source| TableLoadError::Csv {
        path: path_str.clone(),
        source,
    };

    let mut reader = csv::ReaderBuilder::new()
        .trim(csv::Trim::All)
        .from_path(path)
        .map_err(csv_err)?;

    let headers = reader.headers().map_err(csv_err)?.clone();
    if headers.is_empty() {
        return Err(TableLoadError::MissingHeader {
            path: path_str.clone(),
        });
    }
    let adsorbates: Vec<String> = headers.iter().skip(1).map(str::to_string).collect();

    let mut samples = Vec::new();
    let mut rows = Vec::new();
    for record in reader.records() {
        let record = record.map_err(csv_err)?;
        let sample = record.get(0).unwrap_or_default().to_string();
        let row = adsorbates
            .iter()
            .enumerate()
            .map(|(j, column)| {
                let raw = record.get(j + 1).unwrap_or_default();
                raw.parse::<f64>()
                    .ok()
                    .filter(|value| value.is_finite())
                    .ok_or_else(|| TableLoadError::InvalidValue {
                        path: path_str.clone(),
                        sample: sample.clone(),
                        column: column.clone(),
                        value: raw.to_string(),
                    })
            })
            .collect::<Result<Vec<_>, _>>()?;
        samples.push(sample);
        rows.push(row);
    }

    EnergyTable::from_rows(samples, adsorbates, &rows).map_err(|source| TableLoadError::Table {
        table: path_str.clone(),
        source,
    })
}

/// Loads `<dir>/<substrate>.csv` for every substrate, keeping only the requested adsorbate
/// columns in the requested order.
///
/// # Errors
///
/// Fails with [`TableLoadError::MissingSubstrateFile`] if a substrate file does not exist and
/// with [`TableLoadError::Table`] wrapping [`TableError::MissingColumn`] if an adsorbate
/// column is absent.
pub fn load_adsorption_energy(
    dir: &Path,
    substrates: &[String],
    adsorbates: &[String],
) -> Result<BTreeMap<String, EnergyTable>, TableLoadError> {
    let mut tables = BTreeMap::new();
    for substrate in substrates {
        let path = dir.join(format!("{}.{}", substrate, TABLE_EXTENSION));
        if !path.is_file() {
            return Err(TableLoadError::MissingSubstrateFile {
                substrate: substrate.clone(),
                path: path.to_string_lossy().to_string(),
            });
        }
        let table = read_energy_table(&path)?
            .select_columns(substrate, adsorbates)
            .map_err(|source| TableLoadError::Table {
                table: substrate.clone(),
                source,
            })?;
        debug!(
            "Loaded {} sample(s) for substrate '{}' from {:?}",
            table.num_samples(),
            substrate,
            path
        );
        tables.insert(substrate.clone(), table);
    }
    Ok(tables)
}

/// Reads the `Species,Correction` table.
pub fn load_thermal_correction(path: &Path) -> Result<ThermalCorrections, TableLoadError> {
    let path_str = path.to_string_lossy().to_string();
    let mut reader = csv::ReaderBuilder::new()
        .trim(csv::Trim::All)
        .from_path(path)
        .map_err(|source| TableLoadError::Csv {
            path: path_str.clone(),
            source,
        })?;

    let mut corrections = ThermalCorrections::new();
    for result in reader.deserialize::<CorrectionRecord>() {
        let record = result.map_err(|source| TableLoadError::Csv {
            path: path_str.clone(),
            source,
        })?;
        check_entry(&path_str, &record.species, "Correction", record.correction)?;
        if corrections.get(&record.species).is_some() {
            return Err(TableLoadError::DuplicateEntry {
                path: path_str,
                name: record.species,
            });
        }
        corrections.insert(record.species, record.correction);
    }
    Ok(corrections)
}

/// Converts adsorption-energy tables into free-energy tables by adding each adsorbate's
/// adsorbed-state correction. The input tables are not modified.
///
/// # Errors
///
/// Returns [`TableLoadError::MissingCorrection`] naming the first adsorbate without an entry.
pub fn apply_thermal_correction(
    tables: &BTreeMap<String, EnergyTable>,
    corrections: &ThermalCorrections,
) -> Result<BTreeMap<String, FreeEnergyTable>, TableLoadError> {
    tables
        .iter()
        .map(|(substrate, table)| {
            let offsets = table
                .adsorbates()
                .iter()
                .map(|ads| {
                    corrections
                        .adsorbed(ads)
                        .ok_or_else(|| TableLoadError::MissingCorrection {
                            adsorbate: ads.clone(),
                        })
                })
                .collect::<Result<Vec<_>, _>>()?;
            let corrected =
                table
                    .with_column_offsets(&offsets)
                    .map_err(|source| TableLoadError::Table {
                        table: substrate.clone(),
                        source,
                    })?;
            Ok((substrate.clone(), corrected))
        })
        .collect()
}

/// Reads the `name,free_energy` table of standalone species free energies.
pub fn load_adsorbate_free_energy(path: &Path) -> Result<FreeEnergies, TableLoadError> {
    let path_str = path.to_string_lossy().to_string();
    let mut reader = csv::ReaderBuilder::new()
        .trim(csv::Trim::All)
        .from_path(path)
        .map_err(|source| TableLoadError::Csv {
            path: path_str.clone(),
            source,
        })?;

    let mut energies = FreeEnergies::new();
    for result in reader.deserialize::<FreeEnergyRecord>() {
        let record = result.map_err(|source| TableLoadError::Csv {
            path: path_str.clone(),
            source,
        })?;
        check_entry(&path_str, &record.name, "free_energy", record.free_energy)?;
        if energies.get(&record.name).is_some() {
            return Err(TableLoadError::DuplicateEntry {
                path: path_str,
                name: record.name,
            });
        }
        energies.insert(record.name, record.free_energy);
    }
    Ok(energies)
}
