//! Decompose command: run the kernel on every series of a job file.

use anyhow::{Context, Result, bail};
use rayon::prelude::*;
use tracing::{info, info_span, warn};

use seats_kernel::{Kernel, SeatsResults, SeriesKind};

use crate::cli::DecomposeArgs;
use crate::config::{OptionsToml, SeriesToml};
use crate::convert;
use crate::job::{self, Job};
use crate::report::SeriesReport;

/// Run the decomposition of every series.
pub fn run(args: DecomposeArgs) -> Result<()> {
    let _cmd = info_span!("decompose").entered();
    // 1. Load job file
    let job = job::load(&args.config)?;
    let options = &job.config.options;
    if let Some(ref name) = args.estimator {
        convert::parse_estimation_method(name)?;
    }
    info!(
        n_series = job.config.series.len(),
        path = %args.config.display(),
        "job loaded"
    );

    // 2. Decompose independent series in parallel
    let reports: Vec<SeriesReport> = job
        .config
        .series
        .par_iter()
        .map(|series| {
            match decompose_series(&job, options, series, args.estimator.as_deref()) {
                Ok(results) => {
                    print_summary(&series.name, &results);
                    SeriesReport::success(&series.name, &results)
                }
                Err(e) => {
                    warn!(series = %series.name, error = %format!("{e:#}"), "decomposition failed");
                    println!("{}: failed: {e:#}", series.name);
                    SeriesReport::failure(&series.name, &e)
                }
            }
        })
        .collect();

    // 3. Write results JSON
    if let Some(ref path) = args.output {
        let json = serde_json::to_string_pretty(&reports).context("failed to serialize results")?;
        std::fs::write(path, json)
            .with_context(|| format!("failed to write results: {}", path.display()))?;
        info!(path = %path.display(), "results written");
    }

    let failed = reports.iter().filter(|r| r.error.is_some()).count();
    if failed > 0 {
        bail!("{failed} of {} series failed to decompose", reports.len());
    }
    Ok(())
}

fn decompose_series(
    job: &Job,
    options: &OptionsToml,
    series: &SeriesToml,
    estimator: Option<&str>,
) -> Result<SeatsResults> {
    let _span = info_span!("series", name = %series.name).entered();
    let values = job.values(series)?;
    let model = job::resolve_model(series, &values)?;
    let config = convert::build_kernel_config(options, series, estimator)?;
    let kernel = Kernel::new(config)?;
    let results = kernel.process(&model, &values)?;
    for note in results.notes() {
        info!(%note, "diagnostic");
    }
    Ok(results)
}

fn print_summary(name: &str, results: &SeatsResults) {
    let kinds: Vec<String> = results
        .ucarima()
        .components()
        .iter()
        .map(|c| c.kind().to_string())
        .collect();
    let last_sa = results
        .decomposition()
        .get(SeriesKind::SeasonallyAdjusted)
        .and_then(|sa| sa.values().last().copied());
    info!(
        series = name,
        model = %results.model().spec(),
        components = ?kinds,
        rounds = results.rounds(),
        "series decomposed"
    );
    println!(
        "{name}: {} [{}] rounds={} notes={} last_sa={}",
        results.model().spec(),
        kinds.join(", "),
        results.rounds(),
        results.notes().len(),
        last_sa.map_or_else(|| "-".to_string(), |x| format!("{x:.4}")),
    );
}
