//! Single-skill adaptive model.

use std::sync::Arc;

use serde::{Deserialize, Serialize};

use crate::error::{CatError, CatResult};
use crate::estimator::{AbilityEstimator, MapEstimator, NormalPrior, Observation};
use crate::item::{Item, ItemId};
use crate::pool::ItemPool;
use crate::selector::{ItemSelector, MaximumInformation};

/// One administered item and whether it was answered correctly.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResponseRecord {
    pub item_id: ItemId,
    pub correct: bool,
}

/// Serializable snapshot of a skill's state.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SkillState {
    pub skill: String,
    pub theta: f64,
    /// `None` until the first response has been recorded.
    pub standard_error: Option<f64>,
    pub mastery_threshold: f64,
    pub mastery_reached: bool,
    pub exhausted: bool,
    pub responses: Vec<ResponseRecord>,
    pub prior: NormalPrior,
    /// Items still available in the pool.
    pub remaining_items: usize,
}

/// A skill's pool, estimation and selection strategies, and its mutable state.
#[derive(Debug, Clone)]
pub struct SkillModel {
    name: String,
    pool: ItemPool,
    prior: NormalPrior,
    mastery_threshold: f64,
    estimator: Arc<dyn AbilityEstimator>,
    selector: Arc<dyn ItemSelector>,
    history: Vec<Observation>,
    theta: f64,
    standard_error: Option<f64>,
    mastery_reached: bool,
    exhausted: bool,
}

impl SkillModel {
    /// Create a skill using the MAP estimator and maximum-information selection.
    pub fn new(
        name: impl Into<String>,
        pool: ItemPool,
        mastery_threshold: f64,
        prior: NormalPrior,
    ) -> Self {
        Self::with_strategies(
            name,
            pool,
            mastery_threshold,
            prior,
            Arc::new(MapEstimator::default()),
            Arc::new(MaximumInformation),
        )
    }

    /// Create a skill with explicit estimation and selection strategies.
    pub fn with_strategies(
        name: impl Into<String>,
        pool: ItemPool,
        mastery_threshold: f64,
        prior: NormalPrior,
        estimator: Arc<dyn AbilityEstimator>,
        selector: Arc<dyn ItemSelector>,
    ) -> Self {
        let exhausted = pool.is_empty();
        Self {
            name: name.into(),
            pool,
            prior,
            mastery_threshold,
            estimator,
            selector,
            history: Vec::new(),
            theta: prior.mu,
            standard_error: None,
            mastery_reached: false,
            exhausted,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn theta(&self) -> f64 {
        self.theta
    }

    pub fn standard_error(&self) -> Option<f64> {
        self.standard_error
    }

    pub fn mastery_reached(&self) -> bool {
        self.mastery_reached
    }

    pub fn exhausted(&self) -> bool {
        self.exhausted
    }

    /// Whether this skill can still receive items.
    pub fn is_eligible(&self) -> bool {
        !self.mastery_reached && !self.exhausted
    }

    pub fn pool(&self) -> &ItemPool {
        &self.pool
    }

    /// Response history in administration order.
    pub fn responses(&self) -> impl Iterator<Item = ResponseRecord> + '_ {
        self.history.iter().map(|o| ResponseRecord {
            item_id: o.item.id,
            correct: o.correct,
        })
    }

    /// Record a response and re-estimate theta from the full history.
    ///
    /// Leaves the skill untouched on error.
    pub fn apply_response(&mut self, item_id: ItemId, correct: bool) -> CatResult<()> {
        let item = *self
            .pool
            .get(item_id)
            .ok_or(CatError::UnknownItem(item_id))?;

        let mut history = self.history.clone();
        history.push(Observation { item, correct });
        let estimate = self.estimator.estimate(&history, &self.prior)?;

        self.pool.remove(item_id)?;
        self.history = history;
        self.theta = estimate.theta;
        self.standard_error = Some(estimate.standard_error);
        self.mastery_reached = self.mastery_reached || estimate.theta >= self.mastery_threshold;
        self.exhausted = self.exhausted || self.pool.is_empty();

        tracing::debug!(
            skill = %self.name,
            item = item_id,
            correct,
            theta = self.theta,
            mastery = self.mastery_reached,
            exhausted = self.exhausted,
            "applied response"
        );
        Ok(())
    }

    /// The most informative remaining item, or `None` once mastered or exhausted.
    pub fn next_item(&self) -> Option<Item> {
        if !self.is_eligible() {
            return None;
        }
        self.selector
            .select(&self.pool.remaining(), self.theta)
            .copied()
    }

    pub fn state(&self) -> SkillState {
        SkillState {
            skill: self.name.clone(),
            theta: self.theta,
            standard_error: self.standard_error,
            mastery_threshold: self.mastery_threshold,
            mastery_reached: self.mastery_reached,
            exhausted: self.exhausted,
            responses: self.responses().collect(),
            prior: self.prior,
            remaining_items: self.pool.len(),
        }
    }
}
