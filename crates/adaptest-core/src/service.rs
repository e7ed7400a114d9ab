//! Session service: INIT / STEP / STATE over a bank and a session store.
//!
//! Each session id gets its own async mutex, taken on first use and dropped
//! once the session finishes, so writes to one session are serialized while
//! different sessions proceed independently. The store alone decides whether
//! a session exists. Every step works on a copy of the stored session and is
//! only written back once it has fully succeeded.

use std::collections::{BTreeMap, HashMap};
use std::sync::{Arc, Mutex};

use serde::{Deserialize, Serialize};
use tokio::sync::Mutex as AsyncMutex;
use uuid::Uuid;

use crate::bank::{ItemBank, Scope};
use crate::error::{CatError, CatResult};
use crate::estimator::{AbilityEstimator, MapEstimator, NormalPrior, ThetaBounds};
use crate::item::Item;
use crate::multi::{MultiSkillModel, NextItem};
use crate::pool::ItemPool;
use crate::selector::{ItemSelector, MaximumInformation};
use crate::session::{Answer, NextAction, Session, SessionId, SessionSnapshot, StepOutcome};
use crate::skill::SkillModel;
use crate::store::SessionStore;

/// Configuration for the session service.
#[derive(Debug, Clone)]
pub struct EngineConfig {
    /// Prior used when a session does not override it.
    pub prior: NormalPrior,
    /// Mastery threshold for skills without an explicit one.
    pub default_mastery_threshold: f64,
    /// Per-skill mastery thresholds.
    pub mastery_thresholds: HashMap<String, f64>,
    /// Item cap when a session does not request one.
    pub default_max_items: usize,
    /// Largest item cap a session may request.
    pub max_items_cap: usize,
    /// Search interval for theta.
    pub bounds: ThetaBounds,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            prior: NormalPrior::default(),
            default_mastery_threshold: 1.0,
            mastery_thresholds: HashMap::new(),
            default_max_items: 20,
            max_items_cap: 100,
            bounds: ThetaBounds::default(),
        }
    }
}

impl EngineConfig {
    pub fn mastery_threshold(&self, skill: &str) -> f64 {
        self.mastery_thresholds
            .get(skill)
            .copied()
            .unwrap_or(self.default_mastery_threshold)
    }
}

/// Optional per-session prior overrides.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct PriorOverrides {
    #[serde(default)]
    pub mu: Option<f64>,
    #[serde(default)]
    pub sigma2: Option<f64>,
}

/// Parameters for starting a session.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct InitRequest {
    #[serde(default)]
    pub scope: Scope,
    #[serde(default)]
    pub prior: PriorOverrides,
    #[serde(default)]
    pub max_items: Option<usize>,
}

/// Result of starting a session.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InitResponse {
    pub session_id: SessionId,
    pub thetas: BTreeMap<String, f64>,
    pub first_item: Option<NextItem>,
    pub finished: bool,
}

/// Front door to the engine.
pub struct CatService {
    bank: Arc<dyn ItemBank>,
    store: Arc<dyn SessionStore>,
    config: EngineConfig,
    estimator: Arc<dyn AbilityEstimator>,
    selector: Arc<dyn ItemSelector>,
    locks: Mutex<HashMap<SessionId, Arc<AsyncMutex<()>>>>,
}

impl CatService {
    pub fn new(
        bank: Arc<dyn ItemBank>,
        store: Arc<dyn SessionStore>,
        config: EngineConfig,
    ) -> Self {
        let estimator = Arc::new(MapEstimator::new(config.bounds));
        Self {
            bank,
            store,
            config,
            estimator,
            selector: Arc::new(MaximumInformation),
            locks: Mutex::new(HashMap::new()),
        }
    }

    /// Replace the estimation strategy used for new sessions.
    pub fn with_estimator(mut self, estimator: Arc<dyn AbilityEstimator>) -> Self {
        self.estimator = estimator;
        self
    }

    /// Replace the selection strategy used for new sessions.
    pub fn with_selector(mut self, selector: Arc<dyn ItemSelector>) -> Self {
        self.selector = selector;
        self
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    /// Start a new session.
    pub async fn init(&self, request: InitRequest) -> CatResult<InitResponse> {
        let max_items = request.max_items.unwrap_or(self.config.default_max_items);
        if max_items == 0 || max_items > self.config.max_items_cap {
            return Err(CatError::InvalidItemCap {
                requested: max_items,
                cap: self.config.max_items_cap,
            });
        }

        let prior = NormalPrior::new(
            request.prior.mu.unwrap_or(self.config.prior.mu),
            request.prior.sigma2.unwrap_or(self.config.prior.sigma2),
        )?;
        if !self.config.bounds.contains(prior.mu) {
            return Err(CatError::InvalidPrior(format!(
                "mean {} lies outside theta bounds [{}, {}]",
                prior.mu, self.config.bounds.lower, self.config.bounds.upper
            )));
        }

        let skills = request.scope.resolve(&self.bank.skills())?;
        let model = self.build_model(&skills, &request.scope, prior)?;

        let session_id = Uuid::new_v4().to_string();
        let session = Session::start(session_id.clone(), model, max_items);
        let response = InitResponse {
            session_id: session_id.clone(),
            thetas: session.model().theta_snapshot(),
            first_item: session.pending().cloned(),
            finished: session.is_finished(),
        };

        self.store.create(session).await?;

        tracing::info!(
            session = %session_id,
            skills = ?skills,
            max_items,
            prior_mu = prior.mu,
            prior_sigma2 = prior.sigma2,
            "session started"
        );
        Ok(response)
    }

    /// Submit an optional answer and advance the session.
    pub async fn step(&self, session_id: &str, answer: Option<Answer>) -> CatResult<StepOutcome> {
        let lock = self.lock_for(session_id);
        let _guard = lock.lock().await;

        let result = self.step_locked(session_id, answer).await;
        match &result {
            Ok(outcome) if outcome.action == NextAction::Finish => self.release_lock(session_id),
            Err(CatError::SessionNotFound(_) | CatError::AlreadyFinished(_)) => {
                self.release_lock(session_id)
            }
            _ => {}
        }
        result
    }

    async fn step_locked(&self, session_id: &str, answer: Option<Answer>) -> CatResult<StepOutcome> {
        let mut session = self.store.get(session_id).await?;
        let outcome = session.step(answer)?;
        self.store.update(session).await?;

        tracing::debug!(
            session = %session_id,
            action = %outcome.action,
            next = ?outcome.next_item.as_ref().map(|n| n.item.id),
            "step"
        );
        Ok(outcome)
    }

    /// Read-only view of a session.
    pub async fn state(&self, session_id: &str) -> CatResult<SessionSnapshot> {
        Ok(self.store.get(session_id).await?.snapshot())
    }

    /// Full copy of a session, for reporting.
    pub async fn session(&self, session_id: &str) -> CatResult<Session> {
        self.store.get(session_id).await
    }

    fn lock_for(&self, session_id: &str) -> Arc<AsyncMutex<()>> {
        self.locks
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .entry(session_id.to_string())
            .or_default()
            .clone()
    }

    /// Forget the lock of a session that can no longer change.
    fn release_lock(&self, session_id: &str) {
        self.locks
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .remove(session_id);
    }

    fn build_model(
        &self,
        skills: &[String],
        scope: &Scope,
        prior: NormalPrior,
    ) -> CatResult<MultiSkillModel> {
        let mut by_skill: BTreeMap<&str, Vec<Item>> =
            skills.iter().map(|s| (s.as_str(), Vec::new())).collect();
        for entry in self.bank.items(skills, scope)? {
            if let Some(items) = by_skill.get_mut(entry.skill.as_str()) {
                items.push(entry.item);
            }
        }

        let mut model = MultiSkillModel::new();
        for (skill, items) in by_skill {
            let pool = ItemPool::load(items)?;
            model.add_skill_model(SkillModel::with_strategies(
                skill,
                pool,
                self.config.mastery_threshold(skill),
                prior,
                Arc::clone(&self.estimator),
                Arc::clone(&self.selector),
            ))?;
        }
        Ok(model)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::bank::InMemoryBank;
    use crate::store::InMemorySessionStore;

    fn service() -> CatService {
        let bank = InMemoryBank::from_tuples([
            ("algebra", 1, 1.0, -1.0, 0.2),
            ("algebra", 2, 1.2, 0.0, 0.2),
            ("algebra", 3, 0.9, 1.0, 0.2),
            ("geometry", 11, 1.0, -0.5, 0.25),
            ("geometry", 12, 1.4, 0.5, 0.25),
        ]);
        CatService::new(
            Arc::new(bank),
            Arc::new(InMemorySessionStore::new()),
            EngineConfig::default(),
        )
    }

    #[tokio::test]
    async fn init_returns_prior_thetas_and_first_item() {
        let service = service();
        let response = service
            .init(InitRequest {
                prior: PriorOverrides {
                    mu: Some(-0.5),
                    sigma2: None,
                },
                ..Default::default()
            })
            .await
            .unwrap();
        assert_eq!(response.thetas.len(), 2);
        assert!(response.thetas.values().all(|&t| t == -0.5));
        assert!(response.first_item.is_some());
        assert!(!response.finished);
    }

    #[tokio::test]
    async fn init_validates_inputs() {
        let service = service();
        let bad_cap = service
            .init(InitRequest {
                max_items: Some(0),
                ..Default::default()
            })
            .await
            .unwrap_err();
        assert!(matches!(bad_cap, CatError::InvalidItemCap { .. }));

        let bad_prior = service
            .init(InitRequest {
                prior: PriorOverrides {
                    mu: None,
                    sigma2: Some(0.0),
                },
                ..Default::default()
            })
            .await
            .unwrap_err();
        assert!(matches!(bad_prior, CatError::InvalidPrior(_)));

        let bad_scope = service
            .init(InitRequest {
                scope: Scope::skills(["calculus"]),
                ..Default::default()
            })
            .await
            .unwrap_err();
        assert!(matches!(bad_scope, CatError::InvalidScope(_)));
    }

    #[tokio::test]
    async fn unknown_session_is_reported() {
        let service = service();
        assert_eq!(
            service.step("missing", None).await.unwrap_err(),
            CatError::SessionNotFound("missing".into())
        );
        assert!(matches!(
            service.state("missing").await,
            Err(CatError::SessionNotFound(_))
        ));
    }

    #[tokio::test]
    async fn scoped_session_only_sees_its_skills() {
        let service = service();
        let response = service
            .init(InitRequest {
                scope: Scope::skills(["geometry"]),
                ..Default::default()
            })
            .await
            .unwrap();
        assert_eq!(response.first_item.as_ref().unwrap().skill, "geometry");

        let mut next = response.first_item;
        let mut steps = 0;
        while let Some(item) = next {
            let outcome = service
                .step(&response.session_id, Some(Answer::new(item.item.id, false)))
                .await
                .unwrap();
            next = outcome.next_item;
            steps += 1;
        }
        assert_eq!(steps, 2);
        let state = service.state(&response.session_id).await.unwrap();
        assert!(state.finished);
        assert_eq!(state.asked_items.len(), 2);
    }

    #[tokio::test]
    async fn failed_step_leaves_stored_session_unchanged() {
        let service = service();
        let response = service.init(InitRequest::default()).await.unwrap();
        let before = service.state(&response.session_id).await.unwrap();
        let err = service
            .step(&response.session_id, Some(Answer::new(999, true)))
            .await
            .unwrap_err();
        assert!(matches!(err, CatError::Sequencing(_)));
        assert_eq!(service.state(&response.session_id).await.unwrap(), before);
    }

    #[tokio::test]
    async fn cap_of_one_finishes_after_first_answer() {
        let service = service();
        let response = service
            .init(InitRequest {
                max_items: Some(1),
                ..Default::default()
            })
            .await
            .unwrap();
        let first = response.first_item.unwrap();
        let outcome = service
            .step(&response.session_id, Some(Answer::new(first.item.id, true)))
            .await
            .unwrap();
        assert_eq!(outcome.action, NextAction::Finish);
        assert!(outcome.next_item.is_none());
        assert!(matches!(
            service.step(&response.session_id, None).await,
            Err(CatError::AlreadyFinished(_))
        ));
    }

    fn tracked_locks(service: &CatService) -> usize {
        service.locks.lock().unwrap().len()
    }

    #[tokio::test]
    async fn services_sharing_a_store_see_each_others_sessions() {
        let bank: Arc<dyn ItemBank> = Arc::new(InMemoryBank::from_tuples([
            ("algebra", 1, 1.0, -1.0, 0.2),
            ("algebra", 2, 1.2, 0.0, 0.2),
        ]));
        let store: Arc<dyn SessionStore> = Arc::new(InMemorySessionStore::new());
        let first = CatService::new(Arc::clone(&bank), Arc::clone(&store), EngineConfig::default());
        let second = CatService::new(bank, store, EngineConfig::default());

        let response = first.init(InitRequest::default()).await.unwrap();
        let item = response.first_item.unwrap().item.id;

        assert!(second.state(&response.session_id).await.is_ok());
        let outcome = second
            .step(&response.session_id, Some(Answer::new(item, true)))
            .await
            .unwrap();
        assert_eq!(outcome.session_id, response.session_id);

        let state = first.state(&response.session_id).await.unwrap();
        assert_eq!(state.asked_items, vec![item]);
    }

    #[tokio::test]
    async fn session_locks_are_released() {
        let service = service();
        assert!(service.step("missing", None).await.is_err());
        assert_eq!(tracked_locks(&service), 0);

        let response = service
            .init(InitRequest {
                max_items: Some(1),
                ..Default::default()
            })
            .await
            .unwrap();
        assert_eq!(tracked_locks(&service), 0);

        service.step(&response.session_id, None).await.unwrap();
        assert_eq!(tracked_locks(&service), 1);

        let item = response.first_item.unwrap().item.id;
        let outcome = service
            .step(&response.session_id, Some(Answer::new(item, false)))
            .await
            .unwrap();
        assert_eq!(outcome.action, NextAction::Finish);
        assert_eq!(tracked_locks(&service), 0);
    }
}
