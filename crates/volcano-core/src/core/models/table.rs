use nalgebra::{DMatrix, DVector};
use std::collections::HashSet;
use thiserror::Error;

#[derive(Debug, Error, Clone, PartialEq)]
pub enum TableError {
    #[error(
        "Table shape mismatch: {samples} sample(s) x {adsorbates} adsorbate(s) requires a matrix of the same shape, got {rows}x{cols}"
    )]
    ShapeMismatch {
        samples: usize,
        adsorbates: usize,
        rows: usize,
        cols: usize,
    },
    #[error("Duplicate {kind} label '{label}' in table")]
    DuplicateLabel { kind: &'static str, label: String },
    #[error("Column '{column}' is missing from table '{table}'")]
    MissingColumn { table: String, column: String },
    #[error(
        "Table '{table}' has adsorbate columns {found:?}, which differ from {expected:?} in the other tables"
    )]
    InconsistentColumns {
        table: String,
        expected: Vec<String>,
        found: Vec<String>,
    },
    #[error("Cannot stack an empty set of tables")]
    EmptyStack,
}

/// A table of energies with one row per sample and one column per adsorbate.
///
/// The same layout holds raw adsorption energies, thermally corrected free energies and the
/// stacked union of several substrates. Instances are immutable once built; every
/// transformation returns a new table.
#[derive(Debug, Clone, PartialEq)]
pub struct EnergyTable {
    /// Sample identifiers, one per row.
    samples: Vec<String>,
    /// Adsorbate identifiers, one per column.
    adsorbates: Vec<String>,
    /// Energies in eV, `samples.len()` rows by `adsorbates.len()` columns.
    values: DMatrix<f64>,
}

/// Adsorption free energies (eV) of one substrate.
pub type FreeEnergyTable = EnergyTable;

/// Rows of every substrate's free-energy table, prefixed by the substrate name.
pub type StackedFreeEnergyTable = EnergyTable;

impl EnergyTable {
    /// Creates a table from its labels and a matching value matrix.
    ///
    /// # Arguments
    ///
    /// * `samples` - Row labels.
    /// * `adsorbates` - Column labels.
    /// * `values` - Energies with one row per sample and one column per adsorbate.
    ///
    /// # Errors
    ///
    /// Returns [`TableError::ShapeMismatch`] if the matrix does not match the label counts and
    /// [`TableError::DuplicateLabel`] if a row or column label repeats.
    pub fn new(
        samples: Vec<String>,
        adsorbates: Vec<String>,
        values: DMatrix<f64>,
    ) -> Result<Self, TableError> {
        if values.nrows() != samples.len() || values.ncols() != adsorbates.len() {
            return Err(TableError::ShapeMismatch {
                samples: samples.len(),
                adsorbates: adsorbates.len(),
                rows: values.nrows(),
                cols: values.ncols(),
            });
        }
        check_unique("sample", &samples)?;
        check_unique("adsorbate", &adsorbates)?;
        Ok(Self {
            samples,
            adsorbates,
            values,
        })
    }

    /// Builds a table from row-major records, as produced by a tabular reader.
    pub fn from_rows(
        samples: Vec<String>,
        adsorbates: Vec<String>,
        rows: &[Vec<f64>],
    ) -> Result<Self, TableError> {
        let ncols = adsorbates.len();
        if rows.len() != samples.len() || rows.iter().any(|row| row.len() != ncols) {
            return Err(TableError::ShapeMismatch {
                samples: samples.len(),
                adsorbates: ncols,
                rows: rows.len(),
                cols: rows.iter().map(Vec::len).find(|&len| len != ncols).unwrap_or(ncols),
            });
        }
        let values = DMatrix::from_fn(rows.len(), ncols, |i, j| rows[i][j]);
        Self::new(samples, adsorbates, values)
    }

    pub fn samples(&self) -> &[String] {
        &self.samples
    }

    pub fn adsorbates(&self) -> &[String] {
        &self.adsorbates
    }

    pub fn values(&self) -> &DMatrix<f64> {
        &self.values
    }

    pub fn num_samples(&self) -> usize {
        self.samples.len()
    }

    pub fn is_empty(&self) -> bool {
        self.samples.is_empty()
    }

    /// Returns the column position of an adsorbate, if present.
    pub fn column_index(&self, adsorbate: &str) -> Option<usize> {
        self.adsorbates.iter().position(|a| a == adsorbate)
    }

    /// Returns a copy of one adsorbate column, if present.
    pub fn column(&self, adsorbate: &str) -> Option<DVector<f64>> {
        self.column_index(adsorbate)
            .map(|j| self.values.column(j).into_owned())
    }

    /// Retrieves a single cell by sample position and adsorbate name.
    pub fn value(&self, sample_index: usize, adsorbate: &str) -> Option<f64> {
        let j = self.column_index(adsorbate)?;
        self.values.get((sample_index, j)).copied()
    }

    /// Returns a new table restricted to the requested columns, in the requested order.
    ///
    /// # Arguments
    ///
    /// * `table_name` - Name used in the error if a column is missing.
    /// * `adsorbates` - Columns to keep.
    ///
    /// # Errors
    ///
    /// Returns [`TableError::MissingColumn`] naming the first absent adsorbate.
    pub fn select_columns(
        &self,
        table_name: &str,
        adsorbates: &[String],
    ) -> Result<Self, TableError> {
        let indices = adsorbates
            .iter()
            .map(|ads| {
                self.column_index(ads).ok_or_else(|| TableError::MissingColumn {
                    table: table_name.to_string(),
                    column: ads.clone(),
                })
            })
            .collect::<Result<Vec<_>, _>>()?;
        let values = self.values.select_columns(indices.iter());
        Self::new(self.samples.clone(), adsorbates.to_vec(), values)
    }

    /// Returns a new table with `offsets[j]` added to every cell of column `j`.
    pub fn with_column_offsets(&self, offsets: &[f64]) -> Result<Self, TableError> {
        if offsets.len() != self.adsorbates.len() {
            return Err(TableError::ShapeMismatch {
                samples: self.samples.len(),
                adsorbates: self.adsorbates.len(),
                rows: self.values.nrows(),
                cols: offsets.len(),
            });
        }
        let mut values = self.values.clone();
        for (mut column, offset) in values.column_iter_mut().zip(offsets) {
            column.add_scalar_mut(*offset);
        }
        Ok(Self {
            samples: self.samples.clone(),
            adsorbates: self.adsorbates.clone(),
            values,
        })
    }
}

/// Concatenates the rows of several substrate tables into one stacked table.
///
/// Row labels become `<substrate>_<sample>` so samples of different substrates never
/// collide. The input tables are left untouched.
///
/// # Arguments
///
/// * `tables` - `(substrate name, table)` pairs in the order their rows should appear.
///
/// # Errors
///
/// Returns [`TableError::EmptyStack`] for no input and [`TableError::InconsistentColumns`] if
/// any table's adsorbate columns differ from the first table's.
pub fn stack_tables<'a, I>(tables: I) -> Result<StackedFreeEnergyTable, TableError>
where
    I: IntoIterator<Item = (&'a str, &'a EnergyTable)>,
{
    let tables: Vec<_> = tables.into_iter().collect();
    let (_, first) = tables.first().ok_or(TableError::EmptyStack)?;
    let columns = first.adsorbates.clone();

    let mut samples = Vec::new();
    let mut rows = Vec::new();
    for (substrate, table) in &tables {
        if table.adsorbates != columns {
            return Err(TableError::InconsistentColumns {
                table: substrate.to_string(),
                expected: columns,
                found: table.adsorbates.clone(),
            });
        }
        for (i, sample) in table.samples.iter().enumerate() {
            samples.push(format!("{}_{}", substrate, sample));
            rows.push(table.values.row(i).iter().copied().collect::<Vec<_>>());
        }
    }

    EnergyTable::from_rows(samples, columns, &rows)
}

fn check_unique(kind: &'static str, labels: &[String]) -> Result<(), TableError> {
    let mut seen = HashSet::with_capacity(labels.len());
    for label in labels {
        if !seen.insert(label.as_str()) {
            return Err(TableError::DuplicateLabel {
                kind,
                label: label.clone(),
            });
        }
    }
    Ok(())
}
