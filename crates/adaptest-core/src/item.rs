//! Items and the three-parameter logistic (3PL) response model.

use serde::{Deserialize, Serialize};

use crate::error::{CatError, CatResult};

/// Identifier of an item within its pool.
pub type ItemId = u64;

/// Distance kept between a clipped probability and its asymptotes.
pub const PROBABILITY_EPSILON: f64 = 1e-9;

/// A single calibrated question.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Item {
    /// Unique identifier within the pool.
    pub id: ItemId,
    /// Discrimination.
    pub a: f64,
    /// Difficulty.
    pub b: f64,
    /// Guessing (lower asymptote).
    pub c: f64,
    /// Upper asymptote, fixed at 1.0 for the 3PL model.
    #[serde(default = "default_upper")]
    pub d: f64,
}

fn default_upper() -> f64 {
    1.0
}

impl Item {
    /// Create a 3PL item with the upper asymptote fixed at 1.0.
    pub fn new(id: ItemId, a: f64, b: f64, c: f64) -> Self {
        Self {
            id,
            a,
            b,
            c,
            d: 1.0,
        }
    }

    /// Check that the parameters describe a valid 3PL item.
    pub fn validate(&self) -> CatResult<()> {
        let invalid = |reason: String| CatError::InvalidParameter {
            item_id: self.id,
            reason,
        };
        if !self.a.is_finite() || self.a <= 0.0 {
            return Err(invalid(format!("discrimination a={} must be > 0", self.a)));
        }
        if !self.b.is_finite() {
            return Err(invalid(format!("difficulty b={} must be finite", self.b)));
        }
        if !(0.0..1.0).contains(&self.c) {
            return Err(invalid(format!("guessing c={} must be in [0, 1)", self.c)));
        }
        if self.d != 1.0 {
            return Err(invalid(format!("upper asymptote d={} must be 1.0", self.d)));
        }
        Ok(())
    }

    /// Probability of a correct response at `theta`.
    pub fn probability(&self, theta: f64) -> f64 {
        self.c + (1.0 - self.c) / (1.0 + (-self.a * (theta - self.b)).exp())
    }

    /// [`Item::probability`] clipped into `[c + ε, 1 - ε]` so that logs and
    /// ratios stay finite.
    pub fn clipped_probability(&self, theta: f64) -> f64 {
        self.probability(theta)
            .clamp(self.c + PROBABILITY_EPSILON, 1.0 - PROBABILITY_EPSILON)
    }

    /// Fisher information of this item at `theta`.
    pub fn information(&self, theta: f64) -> f64 {
        let p = self.clipped_probability(theta);
        let above_guess = p - self.c;
        self.a * self.a * above_guess * above_guess * (1.0 - p)
            / ((1.0 - self.c) * (1.0 - self.c) * p)
    }

    /// Log-likelihood contribution of one observed response at `theta`.
    pub fn log_likelihood(&self, theta: f64, correct: bool) -> f64 {
        let p = self.clipped_probability(theta);
        if correct {
            p.ln()
        } else {
            (1.0 - p).ln()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn probability_at_difficulty_is_midpoint_above_guessing() {
        let item = Item::new(1, 1.3, 0.7, 0.2);
        let p = item.probability(0.7);
        assert!((p - 0.6).abs() < 1e-12, "got {p}");
    }

    #[test]
    fn validate_rejects_bad_parameters() {
        assert!(Item::new(1, 0.0, 0.0, 0.1).validate().is_err());
        assert!(Item::new(1, -1.0, 0.0, 0.1).validate().is_err());
        assert!(Item::new(1, 1.0, 0.0, 1.0).validate().is_err());
        assert!(Item::new(1, 1.0, 0.0, -0.1).validate().is_err());
        assert!(Item::new(1, 1.0, f64::NAN, 0.1).validate().is_err());
        assert!(Item::new(1, 1.0, 0.0, 0.0).validate().is_ok());
    }

    #[test]
    fn information_peaks_near_difficulty_for_2pl() {
        let item = Item::new(1, 1.5, 0.5, 0.0);
        let at_b = item.information(0.5);
        assert!((at_b - 1.5 * 1.5 * 0.25).abs() < 1e-9);
        assert!(item.information(-1.0) < at_b);
        assert!(item.information(2.0) < at_b);
    }

    #[test]
    fn clipped_probability_stays_inside_asymptotes() {
        let item = Item::new(1, 3.0, 0.0, 0.25);
        assert!(item.clipped_probability(-40.0) > 0.25);
        assert!(item.clipped_probability(40.0) < 1.0);
        assert!(item.log_likelihood(40.0, false).is_finite());
    }

    #[test]
    fn upper_asymptote_defaults_when_deserialized() {
        let item: Item = serde_json::from_str(r#"{"id":7,"a":1.0,"b":0.0,"c":0.2}"#).unwrap();
        assert_eq!(item.d, 1.0);
    }

    #[test]
    fn upper_asymptote_other_than_one_is_rejected() {
        let item: Item =
            serde_json::from_str(r#"{"id":7,"a":1.0,"b":0.0,"c":0.2,"d":0.9}"#).unwrap();
        let err = item.validate().unwrap_err();
        assert!(err.to_string().contains("upper asymptote"), "{err}");
        assert!(crate::pool::ItemPool::load([item]).is_err());
    }
}
