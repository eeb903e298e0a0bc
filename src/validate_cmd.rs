//! Validate command: check models without estimating components.

use anyhow::{Result, bail};
use tracing::{info, info_span};

use seats_decompose::{ModelDecomposer, ModelValidator};

use crate::cli::ValidateArgs;
use crate::convert;
use crate::job;

/// Run validation and decomposition of every model in the job file.
pub fn run(args: ValidateArgs) -> Result<()> {
    let _cmd = info_span!("validate").entered();
    let job = job::load(&args.config)?;
    let options = &job.config.options;
    let validator = ModelValidator::new(convert::build_validator_config(options))?;
    let decomposer = ModelDecomposer::new(convert::build_decomposer_config(options))?;

    let mut not_decomposable = Vec::new();
    for series in &job.config.series {
        let model = if series.needs_fit() {
            let values = job.values(series)?;
            job::resolve_model(series, &values)?
        } else {
            convert::build_model(series)?
        };
        let validation = validator.validate(&model)?;
        let status = if validation.is_valid() {
            "valid"
        } else {
            "parameters cut off"
        };
        info!(series = %series.name, spec = %model.spec(), status, "model validated");

        match decomposer.decompose(validation.model()) {
            Some(ucm) => {
                println!("{}: {} {status}, decomposable", series.name, model.spec());
                for c in ucm.components() {
                    println!(
                        "  {:<10} sigma2 = {:.6}",
                        c.kind().to_string(),
                        c.model().innovation_variance()
                    );
                }
                if ucm.is_noisy() {
                    println!("  noisy model, added variance {:.6}", ucm.noise());
                }
            }
            None => {
                println!("{}: {} {status}, not decomposable", series.name, model.spec());
                not_decomposable.push(series.name.clone());
            }
        }
    }

    if !not_decomposable.is_empty() {
        bail!(
            "models without canonical decomposition: {}",
            not_decomposable.join(", ")
        );
    }
    Ok(())
}
