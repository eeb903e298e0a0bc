//! Pure conversion functions: TOML job structs -> crate API types.

use anyhow::{Context, Result, bail};

use seats_arima::{SarimaModel, SarimaSpec};
use seats_kernel::{
    ApproximationMode, ApproximatorConfig, BiasCorrection, DecomposerConfig, EstimationMethod,
    KernelConfig, Transformation, ValidatorConfig,
};

use crate::config::{OptionsToml, SeriesToml};

/// Parses an approximation mode name into the corresponding enum variant.
pub fn parse_approximation_mode(s: &str) -> Result<ApproximationMode> {
    match s.to_lowercase().as_str() {
        "none" => Ok(ApproximationMode::None),
        "legacy" => Ok(ApproximationMode::Legacy),
        other => bail!("unknown approximation mode: {other:?}"),
    }
}

/// Parses a components estimator name into the corresponding enum variant.
pub fn parse_estimation_method(s: &str) -> Result<EstimationMethod> {
    match s.to_lowercase().as_str() {
        "burman" | "wk" => Ok(EstimationMethod::Burman),
        "kalman" => Ok(EstimationMethod::Kalman),
        other => bail!("unknown estimator: {other:?}"),
    }
}

/// Parses a bias correction name into the corresponding enum variant.
pub fn parse_bias_correction(s: &str) -> Result<BiasCorrection> {
    match s.to_lowercase().as_str() {
        "none" => Ok(BiasCorrection::None),
        "legacy" => Ok(BiasCorrection::Legacy),
        other => bail!("unknown bias correction: {other:?}"),
    }
}

/// Builds a [`ValidatorConfig`] from the TOML options.
pub fn build_validator_config(options: &OptionsToml) -> ValidatorConfig {
    ValidatorConfig::new()
        .with_xl(options.xl)
        .with_eps(options.eps)
}

/// Builds a [`DecomposerConfig`] from the TOML options.
pub fn build_decomposer_config(options: &OptionsToml) -> DecomposerConfig {
    DecomposerConfig::new()
        .with_rmod(options.rmod)
        .with_epsphi(options.epsphi)
        .with_smod(options.smod)
        .with_noisy(options.noisy)
}

/// Builds the [`KernelConfig`] of one series.
///
/// `estimator` overrides the estimator named in the options.
pub fn build_kernel_config(
    options: &OptionsToml,
    series: &SeriesToml,
    estimator: Option<&str>,
) -> Result<KernelConfig> {
    let approximator = ApproximatorConfig::new()
        .with_mode(parse_approximation_mode(&options.approximation)?)
        .with_max_rounds(options.max_rounds);
    let estimation = parse_estimation_method(estimator.unwrap_or(&options.estimator))?;
    let mut cfg = KernelConfig::new()
        .with_validator(build_validator_config(options))
        .with_decomposer(build_decomposer_config(options))
        .with_approximator(approximator)
        .with_estimation(estimation)
        .with_bias_correction(parse_bias_correction(&options.bias_correction)?)
        .with_transformation(build_transformation(series));
    if let Some(n) = options.forecasts {
        cfg = cfg.with_forecasts(n);
    }
    if let Some(n) = options.backcasts {
        cfg = cfg.with_backcasts(n);
    }
    Ok(cfg)
}

/// Returns the transformation requested for a series.
pub fn build_transformation(series: &SeriesToml) -> Transformation {
    if series.log {
        Transformation::Log
    } else {
        Transformation::Level
    }
}

/// Builds the model orders of a series.
pub fn build_spec(series: &SeriesToml) -> SarimaSpec {
    let [p, d, q] = series.orders;
    let [bp, bd, bq] = series.seasonal_orders;
    SarimaSpec::new(series.period)
        .with_regular(p, d, q)
        .with_seasonal(bp, bd, bq)
}

/// Builds the model of a series from its explicit coefficients.
pub fn build_model(series: &SeriesToml) -> Result<SarimaModel> {
    let model = SarimaModel::from_parameters(
        build_spec(series),
        series.phi.clone(),
        series.theta.clone(),
        series.bphi.clone(),
        series.btheta.clone(),
        series.innovation_variance,
    )
    .with_context(|| format!("invalid model for series {:?}", series.name))?;
    Ok(model.with_mean(series.mean))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::JobConfig;

    fn job(toml_str: &str) -> JobConfig {
        toml::from_str(toml_str).unwrap()
    }

    #[test]
    fn enum_names_parse() {
        assert_eq!(
            parse_approximation_mode("None").unwrap(),
            ApproximationMode::None
        );
        assert_eq!(
            parse_estimation_method("KALMAN").unwrap(),
            EstimationMethod::Kalman
        );
        assert_eq!(
            parse_bias_correction("legacy").unwrap(),
            BiasCorrection::Legacy
        );
    }

    #[test]
    fn unknown_enum_names_rejected() {
        assert!(parse_approximation_mode("noisy").is_err());
        assert!(parse_estimation_method("hp").is_err());
        assert!(parse_bias_correction("full").is_err());
    }

    #[test]
    fn kernel_config_follows_options() {
        let job = job(r#"
            [options]
            forecasts = 6
            estimator = "kalman"
            approximation = "none"

            [[series]]
            name = "x"
            period = 4
            log = true
            "#);
        let series = &job.series[0];
        let cfg = build_kernel_config(&job.options, series, None).unwrap();
        assert_eq!(cfg.estimation(), EstimationMethod::Kalman);
        assert_eq!(cfg.transformation(), Transformation::Log);
        assert_eq!(cfg.approximator().mode(), ApproximationMode::None);
        assert_eq!(cfg.horizons(4).forecasts, 6);
        assert_eq!(cfg.horizons(4).backcasts, 12);

        let cfg = build_kernel_config(&job.options, series, Some("burman")).unwrap();
        assert_eq!(cfg.estimation(), EstimationMethod::Burman);
    }

    #[test]
    fn model_from_coefficients() {
        let job = job(r#"
            [[series]]
            name = "airline"
            theta = [-0.4]
            btheta = [-0.6]
            mean = true
            "#);
        let model = build_model(&job.series[0]).unwrap();
        assert_eq!(model, SarimaModel::airline(12, -0.4, -0.6).with_mean(true));
    }

    #[test]
    fn coefficient_count_mismatch_rejected() {
        let job = job(r#"
            [[series]]
            name = "broken"
            theta = [-0.4, 0.1]
            btheta = [-0.6]
            "#);
        let err = build_model(&job.series[0]).unwrap_err();
        assert!(format!("{err:#}").contains("broken"));
    }
}
