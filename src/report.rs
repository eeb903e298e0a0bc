//! JSON shapes of the decomposition results.

use std::collections::BTreeMap;

use serde::Serialize;

use seats_arima::{ArimaModel, SarimaModel};
use seats_kernel::{ComponentDecomposition, SeatsResults, SeriesEstimate, UcarimaModel};

/// Outcome for one series of the job file.
#[derive(Debug, Serialize)]
pub struct SeriesReport {
    pub name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub results: Option<ResultsJson>,
}

#[derive(Debug, Serialize)]
pub struct ResultsJson {
    original_model: ModelJson,
    model: ModelJson,
    mean_correction: bool,
    mean_effect: Option<f64>,
    innovation_variance: f64,
    parameters_cut_off: bool,
    model_changed: bool,
    rounds: usize,
    seasonality_significant: bool,
    notes: Vec<String>,
    ucarima: UcarimaJson,
    initial: DecompositionJson,
    decomposition: DecompositionJson,
}

#[derive(Debug, Serialize)]
struct ModelJson {
    orders: String,
    phi: Vec<f64>,
    theta: Vec<f64>,
    bphi: Vec<f64>,
    btheta: Vec<f64>,
    innovation_variance: f64,
    mean: bool,
}

#[derive(Debug, Serialize)]
struct UcarimaJson {
    noise: f64,
    components: Vec<ComponentJson>,
}

/// An ARIMA component as coefficient lists of `1 + c1 B + …`.
#[derive(Debug, Serialize)]
struct ComponentJson {
    kind: String,
    ar: Vec<f64>,
    delta: Vec<f64>,
    ma: Vec<f64>,
    innovation_variance: f64,
}

#[derive(Debug, Serialize)]
struct DecompositionJson {
    mode: String,
    series: BTreeMap<String, EstimateJson>,
}

#[derive(Debug, Serialize)]
struct EstimateJson {
    values: Vec<f64>,
    stdev: Vec<f64>,
    forecasts: Vec<f64>,
    forecast_stdev: Vec<f64>,
    backcasts: Vec<f64>,
    backcast_stdev: Vec<f64>,
}

impl SeriesReport {
    /// A successful decomposition.
    pub fn success(name: &str, results: &SeatsResults) -> Self {
        Self {
            name: name.to_string(),
            error: None,
            results: Some(ResultsJson::from(results)),
        }
    }

    /// A failed decomposition.
    pub fn failure(name: &str, error: &anyhow::Error) -> Self {
        Self {
            name: name.to_string(),
            error: Some(format!("{error:#}")),
            results: None,
        }
    }
}

impl From<&SeatsResults> for ResultsJson {
    fn from(results: &SeatsResults) -> Self {
        Self {
            original_model: ModelJson::from(results.original_model()),
            model: ModelJson::from(results.model()),
            mean_correction: results.mean_correction(),
            mean_effect: results.mean_effect(),
            innovation_variance: results.innovation_variance(),
            parameters_cut_off: results.parameters_cut_off(),
            model_changed: results.model_changed(),
            rounds: results.rounds(),
            seasonality_significant: results.seasonality_significant(),
            notes: results.notes().iter().map(ToString::to_string).collect(),
            ucarima: UcarimaJson::from(results.ucarima()),
            initial: DecompositionJson::from(results.initial()),
            decomposition: DecompositionJson::from(results.decomposition()),
        }
    }
}

impl From<&SarimaModel> for ModelJson {
    fn from(model: &SarimaModel) -> Self {
        Self {
            orders: model.spec().to_string(),
            phi: model.phi().to_vec(),
            theta: model.theta().to_vec(),
            bphi: model.bphi().to_vec(),
            btheta: model.btheta().to_vec(),
            innovation_variance: model.innovation_variance(),
            mean: model.mean(),
        }
    }
}

impl From<&UcarimaModel> for UcarimaJson {
    fn from(ucm: &UcarimaModel) -> Self {
        Self {
            noise: ucm.noise(),
            components: ucm
                .components()
                .iter()
                .map(|c| component_json(&c.kind().to_string(), c.model()))
                .collect(),
        }
    }
}

fn component_json(kind: &str, model: &ArimaModel) -> ComponentJson {
    ComponentJson {
        kind: kind.to_string(),
        ar: model.ar().lags().to_vec(),
        delta: model.delta().lags().to_vec(),
        ma: model.ma().lags().to_vec(),
        innovation_variance: model.innovation_variance(),
    }
}

impl From<&ComponentDecomposition> for DecompositionJson {
    fn from(decomposition: &ComponentDecomposition) -> Self {
        Self {
            mode: format!("{:?}", decomposition.mode()).to_lowercase(),
            series: decomposition
                .iter()
                .map(|(kind, estimate)| (kind.to_string(), EstimateJson::from(estimate)))
                .collect(),
        }
    }
}

impl From<&SeriesEstimate> for EstimateJson {
    fn from(estimate: &SeriesEstimate) -> Self {
        Self {
            values: estimate.values().to_vec(),
            stdev: estimate.stdev().to_vec(),
            forecasts: estimate.forecasts().to_vec(),
            forecast_stdev: estimate.forecast_stdev().to_vec(),
            backcasts: estimate.backcasts().to_vec(),
            backcast_stdev: estimate.backcast_stdev().to_vec(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn model_json_lists_coefficients() {
        let json = serde_json::to_value(ModelJson::from(&SarimaModel::airline(4, -0.3, -0.5)))
            .unwrap();
        assert_eq!(json["orders"], "(0,1,1)(0,1,1)_4");
        assert_eq!(json["theta"][0], -0.3);
        assert_eq!(json["btheta"][0], -0.5);
        assert_eq!(json["mean"], false);
    }

    #[test]
    fn failure_skips_results() {
        let report = SeriesReport::failure("x", &anyhow::anyhow!("model is not decomposable"));
        let json = serde_json::to_value(&report).unwrap();
        assert_eq!(json["error"], "model is not decomposable");
        assert!(json.get("results").is_none());
    }
}
