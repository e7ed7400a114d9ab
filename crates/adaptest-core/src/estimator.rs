//! Bayesian MAP ability estimation over the 3PL model.
//!
//! The estimator maximizes the log-posterior of a normal prior and the 3PL
//! likelihood with a bounded golden-section search. The search only uses
//! function evaluations in a fixed order, so identical inputs always produce
//! bit-identical estimates.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::error::{CatError, CatResult};
use crate::item::Item;

/// Golden-section ratio `(sqrt(5) - 1) / 2`.
const INV_PHI: f64 = 0.618_033_988_749_894_9;

/// Step used for the finite-difference second derivative.
const CURVATURE_STEP: f64 = 1e-4;

/// Floor applied to the observed information before inverting it.
const MIN_CURVATURE: f64 = 1e-6;

/// Smallest standard error the estimator reports.
pub const MIN_STANDARD_ERROR: f64 = 1e-3;

/// Normal prior on theta.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct NormalPrior {
    /// Prior mean.
    pub mu: f64,
    /// Prior variance.
    pub sigma2: f64,
}

impl NormalPrior {
    /// Create a prior, rejecting non-finite means and non-positive variances.
    pub fn new(mu: f64, sigma2: f64) -> CatResult<Self> {
        if !mu.is_finite() {
            return Err(CatError::InvalidPrior(format!("mean {mu} is not finite")));
        }
        if !sigma2.is_finite() || sigma2 <= 0.0 {
            return Err(CatError::InvalidPrior(format!(
                "variance {sigma2} must be positive and finite"
            )));
        }
        Ok(Self { mu, sigma2 })
    }

    /// Standard deviation of the prior.
    pub fn sd(&self) -> f64 {
        self.sigma2.sqrt()
    }

    fn log_density(&self, theta: f64) -> f64 {
        let diff = theta - self.mu;
        -(diff * diff) / (2.0 * self.sigma2)
    }
}

impl Default for NormalPrior {
    fn default() -> Self {
        Self {
            mu: 0.0,
            sigma2: 1.0,
        }
    }
}

/// Closed search interval for theta.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ThetaBounds {
    pub lower: f64,
    pub upper: f64,
}

impl ThetaBounds {
    pub fn new(lower: f64, upper: f64) -> CatResult<Self> {
        if !lower.is_finite() || !upper.is_finite() || lower >= upper {
            return Err(CatError::InvalidPrior(format!(
                "theta bounds [{lower}, {upper}] must be finite with lower < upper"
            )));
        }
        Ok(Self { lower, upper })
    }

    pub fn contains(&self, theta: f64) -> bool {
        (self.lower..=self.upper).contains(&theta)
    }
}

impl Default for ThetaBounds {
    fn default() -> Self {
        Self {
            lower: -4.0,
            upper: 4.0,
        }
    }
}

/// One administered item together with the observed outcome.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Observation {
    pub item: Item,
    pub correct: bool,
}

/// A point estimate of theta and its standard error.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Estimate {
    pub theta: f64,
    pub standard_error: f64,
}

/// Strategy for turning a response history into an ability estimate.
pub trait AbilityEstimator: Send + Sync + fmt::Debug {
    /// Estimate theta from the full response history.
    fn estimate(&self, observations: &[Observation], prior: &NormalPrior) -> CatResult<Estimate>;
}

/// Log-posterior of theta, additive constants dropped.
pub fn log_posterior(theta: f64, observations: &[Observation], prior: &NormalPrior) -> f64 {
    observations
        .iter()
        .map(|o| o.item.log_likelihood(theta, o.correct))
        .sum::<f64>()
        + prior.log_density(theta)
}

/// MAP estimator using a bounded golden-section search.
#[derive(Debug, Clone)]
pub struct MapEstimator {
    bounds: ThetaBounds,
    tolerance: f64,
    max_iterations: u32,
}

impl Default for MapEstimator {
    fn default() -> Self {
        Self {
            bounds: ThetaBounds::default(),
            tolerance: 1e-6,
            max_iterations: 200,
        }
    }
}

impl MapEstimator {
    pub fn new(bounds: ThetaBounds) -> Self {
        Self {
            bounds,
            ..Self::default()
        }
    }

    /// Override the bracket-width tolerance.
    pub fn with_tolerance(mut self, tolerance: f64) -> Self {
        self.tolerance = tolerance;
        self
    }

    /// Override the iteration budget.
    pub fn with_max_iterations(mut self, max_iterations: u32) -> Self {
        self.max_iterations = max_iterations;
        self
    }

    pub fn bounds(&self) -> ThetaBounds {
        self.bounds
    }

    fn maximize(&self, f: impl Fn(f64) -> f64) -> CatResult<f64> {
        let (mut lo, mut hi) = (self.bounds.lower, self.bounds.upper);
        let mut x1 = hi - INV_PHI * (hi - lo);
        let mut x2 = lo + INV_PHI * (hi - lo);
        let mut f1 = f(x1);
        let mut f2 = f(x2);
        let mut iterations = 0u32;

        while hi - lo > self.tolerance {
            if iterations >= self.max_iterations || !f1.is_finite() || !f2.is_finite() {
                return Err(CatError::NonConvergence {
                    iterations,
                    width: hi - lo,
                });
            }
            iterations += 1;
            if f1 < f2 {
                lo = x1;
                x1 = x2;
                f1 = f2;
                x2 = lo + INV_PHI * (hi - lo);
                f2 = f(x2);
            } else {
                hi = x2;
                x2 = x1;
                f2 = f1;
                x1 = hi - INV_PHI * (hi - lo);
                f1 = f(x1);
            }
        }

        Ok(((lo + hi) / 2.0).clamp(self.bounds.lower, self.bounds.upper))
    }
}

impl AbilityEstimator for MapEstimator {
    fn estimate(&self, observations: &[Observation], prior: &NormalPrior) -> CatResult<Estimate> {
        if observations.is_empty() {
            return Ok(Estimate {
                theta: prior.mu,
                standard_error: prior.sd(),
            });
        }

        let f = |theta: f64| log_posterior(theta, observations, prior);
        let theta = self.maximize(f)?;

        let h = CURVATURE_STEP;
        let second = (f(theta + h) - 2.0 * f(theta) + f(theta - h)) / (h * h);
        let curvature = (-second).max(MIN_CURVATURE);
        let standard_error = (1.0 / curvature.sqrt()).max(MIN_STANDARD_ERROR);

        tracing::debug!(
            responses = observations.len(),
            theta,
            standard_error,
            "MAP estimate"
        );

        Ok(Estimate {
            theta,
            standard_error,
        })
    }
}
