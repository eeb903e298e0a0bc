use std::path::PathBuf;

use serde::Deserialize;

/// Top-level job file.
#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct JobConfig {
    /// Decomposition options shared by every series.
    #[serde(default)]
    pub options: OptionsToml,

    /// Series to decompose.
    #[serde(default)]
    pub series: Vec<SeriesToml>,
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct OptionsToml {
    #[serde(default = "default_xl")]
    pub xl: f64,
    #[serde(default = "default_eps")]
    pub eps: f64,
    #[serde(default = "default_rmod")]
    pub rmod: f64,
    #[serde(default = "default_epsphi")]
    pub epsphi: f64,
    #[serde(default = "default_smod")]
    pub smod: f64,
    #[serde(default)]
    pub noisy: bool,
    #[serde(default = "default_approximation")]
    pub approximation: String,
    #[serde(default = "default_max_rounds")]
    pub max_rounds: usize,
    #[serde(default)]
    pub forecasts: Option<usize>,
    #[serde(default)]
    pub backcasts: Option<usize>,
    #[serde(default = "default_estimator")]
    pub estimator: String,
    #[serde(default = "default_bias_correction")]
    pub bias_correction: String,
}

impl Default for OptionsToml {
    fn default() -> Self {
        Self {
            xl: default_xl(),
            eps: default_eps(),
            rmod: default_rmod(),
            epsphi: default_epsphi(),
            smod: default_smod(),
            noisy: false,
            approximation: default_approximation(),
            max_rounds: default_max_rounds(),
            forecasts: None,
            backcasts: None,
            estimator: default_estimator(),
            bias_correction: default_bias_correction(),
        }
    }
}

fn default_xl() -> f64 {
    0.99
}
fn default_eps() -> f64 {
    1e-4
}
fn default_rmod() -> f64 {
    0.5
}
fn default_epsphi() -> f64 {
    2.0
}
fn default_smod() -> f64 {
    0.8
}
fn default_approximation() -> String {
    "legacy".to_string()
}
fn default_max_rounds() -> usize {
    10
}
fn default_estimator() -> String {
    "burman".to_string()
}
fn default_bias_correction() -> String {
    "legacy".to_string()
}

/// One series with its model.
///
/// Coefficients follow `φ(B) = 1 + φ1 B + …`. When every coefficient list is
/// omitted the model is fitted to the series.
#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct SeriesToml {
    pub name: String,
    #[serde(default = "default_period")]
    pub period: usize,
    #[serde(default)]
    pub log: bool,
    #[serde(default)]
    pub mean: bool,
    /// Regular orders `[p, d, q]`.
    #[serde(default = "default_orders")]
    pub orders: [usize; 3],
    /// Seasonal orders `[P, D, Q]`.
    #[serde(default = "default_orders")]
    pub seasonal_orders: [usize; 3],
    #[serde(default)]
    pub phi: Vec<f64>,
    #[serde(default)]
    pub theta: Vec<f64>,
    #[serde(default)]
    pub bphi: Vec<f64>,
    #[serde(default)]
    pub btheta: Vec<f64>,
    #[serde(default = "default_innovation_variance")]
    pub innovation_variance: f64,
    #[serde(default)]
    pub values: Option<Vec<f64>>,
    /// File with one value per line, relative to the job file.
    #[serde(default)]
    pub file: Option<PathBuf>,
}

fn default_period() -> usize {
    12
}
fn default_orders() -> [usize; 3] {
    [0, 1, 1]
}
fn default_innovation_variance() -> f64 {
    1.0
}

impl SeriesToml {
    /// Returns `true` when no coefficient list is given.
    pub fn needs_fit(&self) -> bool {
        self.phi.is_empty() && self.theta.is_empty() && self.bphi.is_empty() && self.btheta.is_empty()
    }
}
