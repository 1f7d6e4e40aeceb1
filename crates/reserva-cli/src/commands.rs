//! Subcommand implementations.

use reserva_model::{PipelineError, Result, load_config};

use crate::cli::ShowConfigArgs;

/// Load, validate, and print the configuration as YAML.
pub fn run_show_config(args: &ShowConfigArgs) -> Result<()> {
    let config = load_config(&args.config)?;
    let rendered = serde_yaml::to_string(&config).map_err(|err| {
        PipelineError::configuration("cannot render configuration").with_source(err)
    })?;
    print!("{rendered}");
    Ok(())
}
