use crate::cli::FitArgs;
use crate::config::PartialVolcanoConfig;
use crate::error::Result;
use crate::utils::progress::CliProgressHandler;
use crate::utils::report::{format_diagnostics, format_relations};
use tracing::{info, warn};
use volcano::core::io::export::write_scaling_relations_file;
use volcano::engine::error::EngineError;
use volcano::workflows;

pub fn run(args: FitArgs) -> Result<()> {
    let partial_config = PartialVolcanoConfig::from_file(&args.config)?;
    info!("Merging configuration from file and CLI arguments...");
    let config = partial_config.merge_with_fit_cli(&args)?;

    let progress_handler = CliProgressHandler::new();
    let reporter = progress_handler.reporter();

    println!("Fitting scaling relations...");
    let result = workflows::scaling::run(&config, &reporter)?;
    info!(
        "Fitted {} adsorbate(s) over {} sample(s).",
        result.relations.params().len(),
        result.stacked.num_samples()
    );

    print!("{}", format_relations(&result.relations));
    if !result.diagnostics.is_empty() {
        warn!("Fit produced {} warning(s).", result.diagnostics.len());
        println!("Warnings:");
        print!("{}", format_diagnostics(&result.diagnostics));
    }

    if let Some(output) = &args.output {
        write_scaling_relations_file(output, &result.relations).map_err(EngineError::from)?;
        println!("✓ Scaling relations written to: {}", output.display());
    }

    Ok(())
}
