use crate::cli::MapArgs;
use crate::config::PartialVolcanoConfig;
use crate::error::Result;
use crate::utils::progress::CliProgressHandler;
use crate::utils::report::{file_stem, format_diagnostics, format_relations};
use std::fs::{self, File};
use std::path::{Path, PathBuf};
use tracing::{info, warn};
use volcano::core::io::export::{
    ExportError, write_mesh_file, write_scaling_relations_file, write_step_functions_file,
};
use volcano::engine::error::EngineError;
use volcano::engine::sample::write_sample_results_csv;
use volcano::workflows::{self, volcano::VolcanoResult};

pub fn run(args: MapArgs) -> Result<()> {
    let partial_config = PartialVolcanoConfig::from_file(&args.config)?;
    info!("Merging configuration from file and CLI arguments...");
    let config = partial_config.merge_with_map_cli(&args)?;

    let progress_handler = CliProgressHandler::new();
    let reporter = progress_handler.reporter();

    println!(
        "Mapping volcanoes at U = {} V on a {}x{} grid...",
        config.evaluation.external_potential, config.mesh.density.0, config.mesh.density.1
    );
    let result = workflows::volcano::run(&config, &reporter)?;

    print!("{}", format_relations(&result.relations));
    if !result.diagnostics.is_empty() {
        warn!("Workflow produced {} warning(s).", result.diagnostics.len());
        println!("Warnings:");
        print!("{}", format_diagnostics(&result.diagnostics));
    }

    fs::create_dir_all(&args.output)?;
    let written = write_outputs(&args.output, &result).map_err(EngineError::from)?;
    info!("Wrote {} file(s) to {:?}", written.len(), &args.output);
    println!(
        "✓ {} file(s) written to: {}",
        written.len(),
        args.output.display()
    );
    Ok(())
}

fn write_outputs(dir: &Path, result: &VolcanoResult) -> std::result::Result<Vec<PathBuf>, ExportError> {
    let mut written = Vec::new();
    let x = result.grid.x();
    let y = result.grid.y();

    let relations_path = dir.join("scaling_relations.csv");
    write_scaling_relations_file(&relations_path, &result.relations)?;
    written.push(relations_path);

    for (name, volcano) in &result.reactions {
        let stem = file_stem(name);

        let path = dir.join(format!("{}_limiting_potential.csv", stem));
        write_mesh_file(&path, x, y, &volcano.limiting_potential)?;
        written.push(path);

        let path = dir.join(format!("{}_rds.csv", stem));
        write_mesh_file(&path, x, y, &volcano.rds)?;
        written.push(path);

        let path = dir.join(format!("{}_steps.csv", stem));
        write_step_functions_file(&path, &volcano.scaling.step_functions())?;
        written.push(path);

        if !volcano.samples.is_empty() {
            let path = dir.join(format!("{}_samples.csv", stem));
            let file = File::create(&path).map_err(|e| ExportError::Io {
                path: path.to_string_lossy().to_string(),
                source: e,
            })?;
            write_sample_results_csv(file, &volcano.scaling.step_indices(), &volcano.samples)?;
            written.push(path);
        }
    }

    for map in &result.selectivity {
        let path = dir.join(format!(
            "{}_vs_{}_selectivity.csv",
            file_stem(&map.primary),
            file_stem(&map.competing)
        ));
        write_mesh_file(&path, x, y, &map.mesh)?;
        written.push(path);
    }

    Ok(written)
}
