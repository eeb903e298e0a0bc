//! Loading of job files, series values and models.

use std::path::{Path, PathBuf};

use anyhow::{Context, Result, bail};
use tracing::info;

use seats_arima::{MaximumLikelihood, ModelEstimator, SarimaModel};

use crate::config::{JobConfig, SeriesToml};
use crate::convert;

/// A parsed job file and the directory relative paths resolve against.
#[derive(Debug)]
pub struct Job {
    pub config: JobConfig,
    base: PathBuf,
}

/// Reads and parses a job file.
pub fn load(path: &Path) -> Result<Job> {
    let toml_str = std::fs::read_to_string(path)
        .with_context(|| format!("failed to read config file: {}", path.display()))?;
    let config: JobConfig = toml::from_str(&toml_str).context("failed to parse TOML config")?;
    if config.series.is_empty() {
        bail!("no [[series]] entries in {}", path.display());
    }
    let base = path
        .parent()
        .map(Path::to_path_buf)
        .unwrap_or_default();
    Ok(Job { config, base })
}

impl Job {
    /// Returns the observations of a series, inline or from its file.
    pub fn values(&self, series: &SeriesToml) -> Result<Vec<f64>> {
        match (&series.values, &series.file) {
            (Some(values), None) => Ok(values.clone()),
            (None, Some(file)) => {
                let path = self.base.join(file);
                let text = std::fs::read_to_string(&path)
                    .with_context(|| format!("failed to read series file: {}", path.display()))?;
                parse_values(&text)
                    .with_context(|| format!("invalid series file: {}", path.display()))
            }
            (Some(_), Some(_)) => {
                bail!("series {:?} has both values and file", series.name)
            }
            (None, None) => bail!("series {:?} has neither values nor file", series.name),
        }
    }
}

/// Parses one value per line; blank lines and `#` comments are skipped.
pub fn parse_values(text: &str) -> Result<Vec<f64>> {
    text.lines()
        .enumerate()
        .map(|(i, line)| (i, line.trim()))
        .filter(|(_, line)| !line.is_empty() && !line.starts_with('#'))
        .map(|(i, line)| {
            line.parse::<f64>()
                .with_context(|| format!("line {}: not a number: {line:?}", i + 1))
        })
        .collect()
}

/// Returns the model of a series, fitting it to `values` when the job file
/// gives orders only.
pub fn resolve_model(series: &SeriesToml, values: &[f64]) -> Result<SarimaModel> {
    let spec = convert::build_spec(series);
    if !series.needs_fit() || spec.parameter_count() == 0 {
        return convert::build_model(series);
    }
    let transformed = convert::build_transformation(series).apply(values)?;
    let model = MaximumLikelihood
        .estimate(spec, series.mean, &transformed, None)
        .with_context(|| format!("failed to fit {spec} to series {:?}", series.name))?;
    info!(series = %series.name, %spec, sigma2 = model.innovation_variance(), "model fitted");
    Ok(model)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn values_skip_comments_and_blanks() {
        let values = parse_values("# header\n1.5\n\n  2.0 \n-3e1\n").unwrap();
        assert_eq!(values, vec![1.5, 2.0, -30.0]);
    }

    #[test]
    fn bad_value_reports_line() {
        let err = parse_values("1.0\nabc\n").unwrap_err();
        assert!(format!("{err:#}").contains("line 2"));
    }

    #[test]
    fn series_file_resolves_relative_to_job() {
        let dir = tempfile::tempdir().expect("create temp dir");
        let mut data = std::fs::File::create(dir.path().join("data.txt")).unwrap();
        writeln!(data, "10.0\n11.0\n12.5").unwrap();
        let job_path = dir.path().join("job.toml");
        std::fs::write(
            &job_path,
            "[[series]]\nname = \"x\"\nfile = \"data.txt\"\ntheta = [-0.4]\nbtheta = [-0.6]\n",
        )
        .unwrap();

        let job = load(&job_path).unwrap();
        let values = job.values(&job.config.series[0]).unwrap();
        assert_eq!(values, vec![10.0, 11.0, 12.5]);
    }

    #[test]
    fn values_and_file_are_exclusive() {
        let dir = tempfile::tempdir().expect("create temp dir");
        let job_path = dir.path().join("job.toml");
        std::fs::write(
            &job_path,
            "[[series]]\nname = \"x\"\nfile = \"data.txt\"\nvalues = [1.0]\n",
        )
        .unwrap();
        let job = load(&job_path).unwrap();
        assert!(job.values(&job.config.series[0]).is_err());
    }

    #[test]
    fn empty_job_rejected() {
        let dir = tempfile::tempdir().expect("create temp dir");
        let job_path = dir.path().join("job.toml");
        std::fs::write(&job_path, "[options]\nnoisy = true\n").unwrap();
        assert!(load(&job_path).is_err());
    }

    #[test]
    fn explicit_coefficients_are_not_refitted() {
        let job: JobConfig = toml::from_str(
            "[[series]]\nname = \"x\"\ntheta = [-0.4]\nbtheta = [-0.6]\nvalues = [1.0]\n",
        )
        .unwrap();
        let model = resolve_model(&job.series[0], &[1.0]).unwrap();
        assert_eq!(model, SarimaModel::airline(12, -0.4, -0.6));
    }
}
