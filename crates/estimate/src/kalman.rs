//! Component estimation with a Kalman smoother on the composite state-space
//! form.
//!
//! Each component contributes its Harvey state-space block; the observation
//! picks the first state of every block, so `y_t = Σ_i α_{i,t}` with no
//! measurement noise. Forecasts and backcasts are missing observations
//! appended to either side of the sample.
//!
//! The filter starts with the exact diffuse initialization (separate `P*`
//! and `P∞` recursions) and switches to a square-root form, which
//! propagates a Cholesky factor of `P` with LQ decompositions, once `deg δ`
//! informative diffuse updates have absorbed the diffuse part. Missing
//! backcasts before the sample inflate `P∞` polynomially, so the rank count
//! decides the switch and `F∞` is compared against the current size of
//! `P∞`. The backward pass is the matching fixed-interval state smoother.

use ndarray::{Array1, Array2, Axis, s};
use seats_arima::{ArimaModel, StateSpace, cholesky_psd, lq_lower};
use seats_decompose::{ComponentType, UcarimaModel};
use tracing::{debug, warn};

use crate::components::{ComponentEstimates, Horizons, SeriesEstimate};
use crate::error::EstimateError;
use crate::estimator::{ComponentsEstimator, check_input, checked_stdev, sum_non_seasonal};

/// `F∞` is treated as zero below this fraction of `max|P∞|`.
const DIFFUSE_TOLERANCE: f64 = 1e-9;

/// Prediction variances below this fraction of the state noise scale are
/// treated as zero.
const VARIANCE_FLOOR: f64 = 1e-12;

/// Square-root Kalman smoother estimator.
#[derive(Clone, Copy, Debug, Default)]
pub struct KalmanEstimator;

/// Block-diagonal state-space form of a sum of independent ARIMA models.
struct Composite {
    t: Array2<f64>,
    rqr: Array2<f64>,
    loading: Array2<f64>,
    p_star: Array2<f64>,
    p_inf: Array2<f64>,
    z: Array1<f64>,
    offsets: Vec<usize>,
    diffuse: usize,
    scale: f64,
    floor: f64,
}

impl Composite {
    fn new(models: &[&ArimaModel]) -> Result<Self, EstimateError> {
        let blocks = models
            .iter()
            .map(|m| StateSpace::from_arima(m))
            .collect::<Result<Vec<_>, _>>()?;
        let m: usize = blocks.iter().map(StateSpace::r).sum();
        let k = blocks.len();

        let mut t = Array2::zeros((m, m));
        let mut rqr = Array2::zeros((m, m));
        let mut p_star = Array2::zeros((m, m));
        let mut p_inf = Array2::zeros((m, m));
        let mut loading = Array2::zeros((m, k));
        let mut z = Array1::zeros(m);
        let mut offsets = Vec::with_capacity(k);
        let mut off = 0;
        for (i, b) in blocks.iter().enumerate() {
            let r = b.r();
            t.slice_mut(s![off..off + r, off..off + r]).assign(b.t());
            rqr.slice_mut(s![off..off + r, off..off + r]).assign(b.rrt());
            p_star.slice_mut(s![off..off + r, off..off + r]).assign(b.p_star());
            p_inf.slice_mut(s![off..off + r, off..off + r]).assign(b.p_inf());
            let sd = b.innovation_variance().sqrt();
            loading
                .slice_mut(s![off..off + r, i])
                .assign(&(b.r_vec() * sd));
            z[off] = 1.0;
            offsets.push(off);
            off += r;
        }
        let scale = rqr
            .diag()
            .iter()
            .fold(0.0_f64, |acc, x| acc.max(*x))
            .max(f64::MIN_POSITIVE);
        let diffuse = blocks.iter().map(StateSpace::diffuse_dim).sum();
        debug!(states = m, blocks = k, diffuse, "composite state space");
        Ok(Self {
            t,
            rqr,
            loading,
            p_star,
            p_inf,
            z,
            offsets,
            diffuse,
            scale,
            floor: VARIANCE_FLOOR * scale,
        })
    }

    fn dim(&self) -> usize {
        self.t.nrows()
    }

    /// `[T S | σR]`, the factor of `T P Tᵀ + σ² R Rᵀ`.
    fn predicted_factor(&self, ts: &Array2<f64>, top: usize) -> Array2<f64> {
        let (m, k) = (self.dim(), self.loading.ncols());
        let mut u = Array2::zeros((m + top, m + k));
        u.slice_mut(s![top.., ..m]).assign(ts);
        u.slice_mut(s![top.., m..]).assign(&self.loading);
        u
    }

    /// Forward pass over `y`; returns one record per time point.
    fn filter(&self, y: &[Option<f64>]) -> Vec<Step> {
        let t = &self.t;
        let z = &self.z;
        let mut a = Array1::zeros(self.dim());
        let mut p_star = self.p_star.clone();
        let mut p_inf = self.p_inf.clone();
        let mut factor: Option<Array2<f64>> = None;
        let mut remaining = self.diffuse;
        let mut steps = Vec::with_capacity(y.len());

        for obs in y.iter().copied() {
            if factor.is_none() && remaining == 0 {
                factor = Some(cholesky_psd(&p_star));
            }

            if let Some(sf) = factor.as_mut() {
                let p = sf.dot(&sf.t());
                let ts = t.dot(&*sf);
                let observed = obs.and_then(|value| {
                    let mut u = self.predicted_factor(&ts, 1);
                    u.slice_mut(s![0, ..self.dim()]).assign(&z.dot(&*sf));
                    let mut l = lq_lower(&u);
                    if l[[0, 0]] < 0.0 {
                        l.column_mut(0).mapv_inplace(|x| -x);
                    }
                    let f = l[[0, 0]];
                    (f * f > self.floor).then_some((value, l, f))
                });
                match observed {
                    Some((value, l, f)) => {
                        let k = l.slice(s![1.., 0]).mapv(|x| x / f);
                        let v = value - z.dot(&a);
                        let next = t.dot(&a) + &k * v;
                        steps.push(Step::Observed {
                            a: std::mem::replace(&mut a, next),
                            p,
                            v,
                            f: f * f,
                            k,
                        });
                        *sf = l.slice(s![1.., 1..]).to_owned();
                    }
                    None => {
                        let next = t.dot(&a);
                        steps.push(Step::Missing {
                            a: std::mem::replace(&mut a, next),
                            p,
                        });
                        *sf = lq_lower(&self.predicted_factor(&ts, 0));
                    }
                }
                continue;
            }

            let m_inf = p_inf.dot(z);
            let m_star = p_star.dot(z);
            let f_inf = z.dot(&m_inf);
            let f_star = z.dot(&m_star);
            match obs {
                Some(value) if f_inf > DIFFUSE_TOLERANCE * max_abs(&p_inf) => {
                    remaining = remaining.saturating_sub(1);
                    let v = value - z.dot(&a);
                    let k0 = t.dot(&m_inf) / f_inf;
                    let k1 = t.dot(&(&m_star - &(&m_inf * (f_star / f_inf)))) / f_inf;
                    let l0 = t - &outer(&k0, z);
                    let l1 = -outer(&k1, z);
                    let next_inf = t.dot(&p_inf).dot(&l0.t());
                    let next_star =
                        t.dot(&p_inf).dot(&l1.t()) + t.dot(&p_star).dot(&l0.t()) + &self.rqr;
                    let next = t.dot(&a) + &k0 * v;
                    steps.push(Step::Diffuse {
                        a: std::mem::replace(&mut a, next),
                        p_star: std::mem::replace(&mut p_star, next_star),
                        p_inf: std::mem::replace(&mut p_inf, next_inf),
                        v,
                        f_inf,
                        f_star,
                        l0,
                        l1,
                    });
                }
                Some(value) if f_star > self.floor => {
                    let v = value - z.dot(&a);
                    let k = t.dot(&m_star) / f_star;
                    let l = t - &outer(&k, z);
                    let next_inf = t.dot(&p_inf).dot(&t.t());
                    let next_star = t.dot(&p_star).dot(&l.t()) + &self.rqr;
                    let next = t.dot(&a) + &k * v;
                    steps.push(Step::DiffuseRegular {
                        a: std::mem::replace(&mut a, next),
                        p_star: std::mem::replace(&mut p_star, next_star),
                        p_inf: std::mem::replace(&mut p_inf, next_inf),
                        v,
                        f: f_star,
                        l,
                    });
                }
                _ => {
                    let next_inf = t.dot(&p_inf).dot(&t.t());
                    let next_star = t.dot(&p_star).dot(&t.t()) + &self.rqr;
                    let next = t.dot(&a);
                    steps.push(Step::DiffuseMissing {
                        a: std::mem::replace(&mut a, next),
                        p_star: std::mem::replace(&mut p_star, next_star),
                        p_inf: std::mem::replace(&mut p_inf, next_inf),
                    });
                }
            }
        }
        steps
    }

    /// Backward pass; returns the smoothed states and their covariances.
    fn smooth(&self, steps: &[Step]) -> Vec<(Array1<f64>, Array2<f64>)> {
        let m = self.dim();
        let t = &self.t;
        let z = &self.z;
        let zz = outer(z, z);
        let mut r0 = Array1::<f64>::zeros(m);
        let mut r1 = Array1::<f64>::zeros(m);
        let mut n0 = Array2::<f64>::zeros((m, m));
        let mut n1 = Array2::<f64>::zeros((m, m));
        let mut n2 = Array2::<f64>::zeros((m, m));
        let mut out = Vec::with_capacity(steps.len());

        for step in steps.iter().rev() {
            match step {
                Step::Missing { a, p } => {
                    r0 = t.t().dot(&r0);
                    n0 = t.t().dot(&n0).dot(t);
                    out.push(regular_moments(a, p, &r0, &n0));
                }
                Step::Observed { a, p, v, f, k } => {
                    let l = t - &outer(k, z);
                    r0 = z * (v / f) + l.t().dot(&r0);
                    n0 = l.t().dot(&n0).dot(&l) + &zz / *f;
                    out.push(regular_moments(a, p, &r0, &n0));
                }
                Step::DiffuseMissing { a, p_star, p_inf } => {
                    r0 = t.t().dot(&r0);
                    r1 = t.t().dot(&r1);
                    n0 = t.t().dot(&n0).dot(t);
                    n1 = t.t().dot(&n1).dot(t);
                    n2 = t.t().dot(&n2).dot(t);
                    out.push(diffuse_moments(a, p_star, p_inf, [&r0, &r1], [&n0, &n1, &n2]));
                }
                Step::DiffuseRegular {
                    a,
                    p_star,
                    p_inf,
                    v,
                    f,
                    l,
                } => {
                    r0 = z * (v / f) + l.t().dot(&r0);
                    r1 = t.t().dot(&r1);
                    n0 = l.t().dot(&n0).dot(l) + &zz / *f;
                    n1 = t.t().dot(&n1).dot(l);
                    n2 = t.t().dot(&n2).dot(t);
                    out.push(diffuse_moments(a, p_star, p_inf, [&r0, &r1], [&n0, &n1, &n2]));
                }
                Step::Diffuse {
                    a,
                    p_star,
                    p_inf,
                    v,
                    f_inf,
                    f_star,
                    l0,
                    l1,
                } => {
                    let next_r1 = z * (v / f_inf) + l0.t().dot(&r1) + l1.t().dot(&r0);
                    r0 = l0.t().dot(&r0);
                    r1 = next_r1;
                    let f1 = 1.0 / f_inf;
                    let f2 = -f_star / (f_inf * f_inf);
                    let next_n2 = l0.t().dot(&n2).dot(l0)
                        + l0.t().dot(&n1).dot(l1)
                        + l1.t().dot(&n1).dot(l0)
                        + l1.t().dot(&n0).dot(l1)
                        + &zz * f2;
                    let next_n1 = l0.t().dot(&n1).dot(l0)
                        + l1.t().dot(&n0).dot(l0)
                        + l0.t().dot(&n0).dot(l1)
                        + &zz * f1;
                    n0 = l0.t().dot(&n0).dot(l0);
                    n1 = next_n1;
                    n2 = next_n2;
                    out.push(diffuse_moments(a, p_star, p_inf, [&r0, &r1], [&n0, &n1, &n2]));
                }
            }
        }
        out.reverse();
        out
    }
}

/// Filter record of one time point, with the predicted state `a`.
enum Step {
    DiffuseMissing {
        a: Array1<f64>,
        p_star: Array2<f64>,
        p_inf: Array2<f64>,
    },
    Diffuse {
        a: Array1<f64>,
        p_star: Array2<f64>,
        p_inf: Array2<f64>,
        v: f64,
        f_inf: f64,
        f_star: f64,
        l0: Array2<f64>,
        l1: Array2<f64>,
    },
    DiffuseRegular {
        a: Array1<f64>,
        p_star: Array2<f64>,
        p_inf: Array2<f64>,
        v: f64,
        f: f64,
        l: Array2<f64>,
    },
    Missing {
        a: Array1<f64>,
        p: Array2<f64>,
    },
    Observed {
        a: Array1<f64>,
        p: Array2<f64>,
        v: f64,
        f: f64,
        k: Array1<f64>,
    },
}

fn outer(a: &Array1<f64>, b: &Array1<f64>) -> Array2<f64> {
    a.view()
        .insert_axis(Axis(1))
        .dot(&b.view().insert_axis(Axis(0)))
}

fn max_abs(m: &Array2<f64>) -> f64 {
    m.iter().fold(0.0_f64, |acc, x| acc.max(x.abs()))
}

fn regular_moments(
    a: &Array1<f64>,
    p: &Array2<f64>,
    r0: &Array1<f64>,
    n0: &Array2<f64>,
) -> (Array1<f64>, Array2<f64>) {
    let state = a + &p.dot(r0);
    let variance = p - &p.dot(n0).dot(p);
    (state, variance)
}

fn diffuse_moments(
    a: &Array1<f64>,
    p_star: &Array2<f64>,
    p_inf: &Array2<f64>,
    [r0, r1]: [&Array1<f64>; 2],
    [n0, n1, n2]: [&Array2<f64>; 3],
) -> (Array1<f64>, Array2<f64>) {
    let state = a + &p_star.dot(r0) + &p_inf.dot(r1);
    let cross = p_inf.dot(n1).dot(p_star);
    let variance = p_star
        - &p_star.dot(n0).dot(p_star)
        - &cross
        - &cross.t()
        - &p_inf.dot(n2).dot(p_inf);
    (state, variance)
}

impl ComponentsEstimator for KalmanEstimator {
    #[tracing::instrument(
        skip(self, ucm, series),
        fields(n = series.len(), components = ucm.components().len())
    )]
    fn estimate(
        &self,
        ucm: &UcarimaModel,
        series: &[f64],
        horizons: Horizons,
    ) -> Result<ComponentEstimates, EstimateError> {
        check_input(ucm, series)?;
        let n = series.len();
        let kinds = ucm.kinds();
        let models: Vec<&ArimaModel> = ucm.components().iter().map(|c| c.model()).collect();

        let composite = match Composite::new(&models) {
            Ok(c) => c,
            Err(e) => {
                warn!(error = %e, "state-space form unavailable, using zeros");
                let components = kinds
                    .iter()
                    .map(|k| (*k, SeriesEstimate::zeros(n, horizons)))
                    .collect();
                let sa = SeriesEstimate::zeros(n, horizons);
                return Ok(ComponentEstimates::new(horizons, components, sa, kinds));
            }
        };

        let y: Vec<Option<f64>> = std::iter::repeat_n(None, horizons.backcasts)
            .chain(series.iter().map(|x| Some(*x)))
            .chain(std::iter::repeat_n(None, horizons.forecasts))
            .collect();
        let smoothed = composite.smooth(&composite.filter(&y));

        let mut fallbacks = Vec::new();
        let mut components = Vec::with_capacity(kinds.len());
        for (kind, off) in kinds.iter().zip(&composite.offsets) {
            let values: Vec<f64> = smoothed.iter().map(|(s, _)| s[*off]).collect();
            let variances: Vec<f64> = smoothed.iter().map(|(_, v)| v[[*off, *off]]).collect();
            let estimate = checked_estimate(
                *kind,
                &values,
                &variances,
                composite.scale,
                horizons,
                &mut fallbacks,
            );
            components.push((*kind, estimate));
        }

        let mut z_sa = Array1::<f64>::zeros(composite.dim());
        for (kind, off) in kinds.iter().zip(&composite.offsets) {
            if *kind != ComponentType::Seasonal {
                z_sa[*off] = 1.0;
            }
        }
        let values: Vec<f64> = smoothed.iter().map(|(s, _)| z_sa.dot(s)).collect();
        let variances: Vec<f64> = smoothed
            .iter()
            .map(|(_, v)| z_sa.dot(&v.dot(&z_sa)))
            .collect();
        let sa = match checked_stdev(&variances, composite.scale) {
            Ok(stdev) if values.iter().all(|x| x.is_finite()) => {
                SeriesEstimate::from_extended(&values, &stdev, horizons)
            }
            Ok(_) => {
                warn!("non-finite seasonally adjusted state, summing components");
                sum_non_seasonal(&components, n, horizons)
            }
            Err(e) => {
                warn!(error = %e, "seasonally adjusted estimation failed, summing components");
                sum_non_seasonal(&components, n, horizons)
            }
        };
        Ok(ComponentEstimates::new(horizons, components, sa, fallbacks))
    }
}

/// Builds the estimate of one component, or zeros when the smoother broke
/// down for it.
fn checked_estimate(
    kind: ComponentType,
    values: &[f64],
    variances: &[f64],
    scale: f64,
    horizons: Horizons,
    fallbacks: &mut Vec<ComponentType>,
) -> SeriesEstimate {
    let n = values.len() - horizons.backcasts - horizons.forecasts;
    if !values.iter().chain(variances).all(|x| x.is_finite()) {
        warn!(component = %kind, "non-finite smoothed state, using zeros");
        fallbacks.push(kind);
        return SeriesEstimate::zeros(n, horizons);
    }
    match checked_stdev(variances, scale) {
        Ok(stdev) => SeriesEstimate::from_extended(values, &stdev, horizons),
        Err(e) => {
            warn!(component = %kind, error = %e, "component estimation failed, using zeros");
            fallbacks.push(kind);
            SeriesEstimate::zeros(n, horizons)
        }
    }
}
