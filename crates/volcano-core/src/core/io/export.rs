use crate::core::scaling::fitter::ScalingRelations;
use crate::core::scaling::term::StepLinearFunction;
use nalgebra::{DMatrix, Scalar};
use serde::Serialize;
use std::fmt::Display;
use std::fs::File;
use std::io::Write;
use std::path::Path;
use thiserror::Error;

const MESH_CORNER_LABEL: &str = "y\\x";

#[derive(Debug, Error)]
pub enum ExportError {
    #[error("File I/O error for '{path}': {source}")]
    Io {
        path: String,
        source: std::io::Error,
    },
    #[error("CSV writing error: {0}")]
    Csv(#[from] csv::Error),
    #[error("Mesh is {rows}x{cols} but the axes provide {ny} y and {nx} x coordinate(s)")]
    AxisMismatch {
        rows: usize,
        cols: usize,
        nx: usize,
        ny: usize,
    },
}

#[derive(Debug, Serialize)]
struct ScalingRelationRow<'a> {
    adsorbate: &'a str,
    ratio: Option<u8>,
    a: f64,
    b: f64,
    c: f64,
    slope: Option<f64>,
    intercept: Option<f64>,
    r_squared: Option<f64>,
}

#[derive(Debug, Serialize)]
struct StepRow {
    position: usize,
    step: usize,
    a: f64,
    b: f64,
    c: f64,
}

fn create_file(path: &Path) -> Result<File, ExportError> {
    File::create(path).map_err(|e| ExportError::Io {
        path: path.to_string_lossy().to_string(),
        source: e,
    })
}

/// Writes a mesh with a header row of x coordinates and a leading column of y coordinates.
///
/// Row `j` of the mesh is written against `y[j]`, column `i` against `x[i]`.
pub fn write_mesh_csv<T, W>(
    writer: W,
    x: &[f64],
    y: &[f64],
    mesh: &DMatrix<T>,
) -> Result<(), ExportError>
where
    T: Scalar + Display,
    W: Write,
{
    if mesh.nrows() != y.len() || mesh.ncols() != x.len() {
        return Err(ExportError::AxisMismatch {
            rows: mesh.nrows(),
            cols: mesh.ncols(),
            nx: x.len(),
            ny: y.len(),
        });
    }

    let mut csv_writer = csv::Writer::from_writer(writer);
    let header: Vec<String> = std::iter::once(MESH_CORNER_LABEL.to_string())
        .chain(x.iter().map(|v| v.to_string()))
        .collect();
    csv_writer.write_record(&header)?;

    for (j, y_value) in y.iter().enumerate() {
        let record: Vec<String> = std::iter::once(y_value.to_string())
            .chain(mesh.row(j).iter().map(|v| v.to_string()))
            .collect();
        csv_writer.write_record(&record)?;
    }
    csv_writer.flush().map_err(|e| ExportError::Csv(e.into()))?;
    Ok(())
}

pub fn write_mesh_file<T>(
    path: &Path,
    x: &[f64],
    y: &[f64],
    mesh: &DMatrix<T>,
) -> Result<(), ExportError>
where
    T: Scalar + Display,
{
    write_mesh_csv(create_file(path)?, x, y, mesh)
}

/// Writes one row per adsorbate: `adsorbate,ratio,a,b,c,slope,intercept,r_squared`.
/// Descriptor rows leave the regression columns empty.
pub fn write_scaling_relations_csv<W: Write>(
    writer: W,
    relations: &ScalingRelations,
) -> Result<(), ExportError> {
    let mut csv_writer = csv::Writer::from_writer(writer);
    for (adsorbate, params) in relations.params() {
        let record = relations.records().get(adsorbate);
        csv_writer.serialize(ScalingRelationRow {
            adsorbate,
            ratio: record.map(|r| r.ratio.x_percent()),
            a: params.a,
            b: params.b,
            c: params.c,
            slope: record.map(|r| r.fit.slope),
            intercept: record.map(|r| r.fit.intercept),
            r_squared: record.map(|r| r.fit.r_squared),
        })?;
    }
    csv_writer.flush().map_err(|e| ExportError::Csv(e.into()))?;
    Ok(())
}

pub fn write_scaling_relations_file(
    path: &Path,
    relations: &ScalingRelations,
) -> Result<(), ExportError> {
    write_scaling_relations_csv(create_file(path)?, relations)
}

/// Writes `position,step,a,b,c` for each step function in order.
///
/// `position` is the 0-based index stored in rate-determining-step meshes; `step` is the
/// step key from the pathway file.
pub fn write_step_functions_csv<W: Write>(
    writer: W,
    steps: &[(usize, StepLinearFunction)],
) -> Result<(), ExportError> {
    let mut csv_writer = csv::Writer::from_writer(writer);
    for (position, (step, function)) in steps.iter().enumerate() {
        csv_writer.serialize(StepRow {
            position,
            step: *step,
            a: function.a,
            b: function.b,
            c: function.c,
        })?;
    }
    csv_writer.flush().map_err(|e| ExportError::Csv(e.into()))?;
    Ok(())
}

pub fn write_step_functions_file(
    path: &Path,
    steps: &[(usize, StepLinearFunction)],
) -> Result<(), ExportError> {
    write_step_functions_csv(create_file(path)?, steps)
}
