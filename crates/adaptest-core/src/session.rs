//! Per-test-taker session state machine.
//!
//! A session moves `ACTIVE -> FINISHED`; construction plays the role of
//! `INIT`. While active it always holds exactly one pending item, and an
//! answer is only accepted for that item.

use std::collections::BTreeMap;
use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::{CatError, CatResult};
use crate::item::ItemId;
use crate::multi::{MultiSkillModel, NextItem};
use crate::skill::SkillState;

/// Identifier of a session.
pub type SessionId = String;

/// Lifecycle state of a session.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum SessionStatus {
    Active,
    Finished,
}

/// What the caller should do after a step.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum NextAction {
    Continue,
    Finish,
}

impl fmt::Display for NextAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            NextAction::Continue => write!(f, "CONTINUE"),
            NextAction::Finish => write!(f, "FINISH"),
        }
    }
}

/// A submitted answer to the pending item.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Answer {
    pub item_id: ItemId,
    pub correct: bool,
    /// Skill the caller believes the item belongs to; checked when present.
    #[serde(default)]
    pub skill: Option<String>,
}

impl Answer {
    pub fn new(item_id: ItemId, correct: bool) -> Self {
        Self {
            item_id,
            correct,
            skill: None,
        }
    }
}

/// One answered item with the estimate that followed it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TranscriptEntry {
    pub skill: String,
    pub item_id: ItemId,
    pub correct: bool,
    pub theta: f64,
    pub standard_error: Option<f64>,
}

/// Result of a step.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StepOutcome {
    pub session_id: SessionId,
    pub thetas: BTreeMap<String, f64>,
    pub mastery: BTreeMap<String, bool>,
    pub action: NextAction,
    pub next_item: Option<NextItem>,
}

/// Read-only view of a session.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SessionSnapshot {
    pub session_id: SessionId,
    pub thetas: BTreeMap<String, f64>,
    pub asked_items: Vec<ItemId>,
    pub remaining_capacity: usize,
    pub mastery: BTreeMap<String, bool>,
    pub finished: bool,
    pub pending: Option<NextItem>,
    pub skills: Vec<SkillState>,
}

/// A single adaptive test run.
#[derive(Debug, Clone)]
pub struct Session {
    id: SessionId,
    created_at: DateTime<Utc>,
    model: MultiSkillModel,
    max_items: usize,
    asked: Vec<ItemId>,
    transcript: Vec<TranscriptEntry>,
    pending: Option<NextItem>,
    status: SessionStatus,
}

impl Session {
    /// Start a session and pick its first item.
    ///
    /// The session is finished from the outset when no skill can supply an
    /// item or the cap is zero.
    pub fn start(id: impl Into<SessionId>, model: MultiSkillModel, max_items: usize) -> Self {
        let mut session = Self {
            id: id.into(),
            created_at: Utc::now(),
            model,
            max_items,
            asked: Vec::new(),
            transcript: Vec::new(),
            pending: None,
            status: SessionStatus::Active,
        };
        session.advance();
        session
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }

    pub fn status(&self) -> SessionStatus {
        self.status
    }

    pub fn is_finished(&self) -> bool {
        self.status == SessionStatus::Finished
    }

    pub fn max_items(&self) -> usize {
        self.max_items
    }

    pub fn asked(&self) -> &[ItemId] {
        &self.asked
    }

    pub fn pending(&self) -> Option<&NextItem> {
        self.pending.as_ref()
    }

    pub fn transcript(&self) -> &[TranscriptEntry] {
        &self.transcript
    }

    pub fn model(&self) -> &MultiSkillModel {
        &self.model
    }

    /// Items that may still be asked before the cap is hit.
    pub fn remaining_capacity(&self) -> usize {
        self.max_items.saturating_sub(self.asked.len())
    }

    /// Apply an optional answer to the pending item and move on.
    ///
    /// Without an answer the step only re-evaluates the stop rule and
    /// returns the pending item again.
    pub fn step(&mut self, answer: Option<Answer>) -> CatResult<StepOutcome> {
        if self.is_finished() {
            return Err(CatError::AlreadyFinished(self.id.clone()));
        }

        if let Some(answer) = answer {
            let pending = self
                .pending
                .as_ref()
                .ok_or_else(|| CatError::Sequencing("no item is pending".into()))?;
            if answer.item_id != pending.item.id {
                return Err(CatError::Sequencing(format!(
                    "expected an answer to item {}, got item {}",
                    pending.item.id, answer.item_id
                )));
            }
            if let Some(skill) = &answer.skill {
                if skill != &pending.skill {
                    return Err(CatError::Sequencing(format!(
                        "item {} belongs to skill '{}', not '{}'",
                        pending.item.id, pending.skill, skill
                    )));
                }
            }

            let skill = pending.skill.clone();
            self.model
                .apply_response(&skill, answer.item_id, answer.correct)?;
            self.asked.push(answer.item_id);

            let updated = self.model.skill(&skill);
            self.transcript.push(TranscriptEntry {
                skill,
                item_id: answer.item_id,
                correct: answer.correct,
                theta: updated.map(|s| s.theta()).unwrap_or_default(),
                standard_error: updated.and_then(|s| s.standard_error()),
            });
        }

        self.advance();
        Ok(self.outcome())
    }

    /// Re-evaluate the stop rule and record the next pending item.
    fn advance(&mut self) {
        let next = if self.asked.len() >= self.max_items {
            None
        } else {
            self.model.next_item()
        };

        match next {
            Some(next) => {
                self.pending = Some(next);
            }
            None => {
                self.pending = None;
                self.status = SessionStatus::Finished;
                tracing::info!(
                    session = %self.id,
                    asked = self.asked.len(),
                    max_items = self.max_items,
                    "session finished"
                );
            }
        }
    }

    fn action(&self) -> NextAction {
        if self.is_finished() {
            NextAction::Finish
        } else {
            NextAction::Continue
        }
    }

    fn outcome(&self) -> StepOutcome {
        StepOutcome {
            session_id: self.id.clone(),
            thetas: self.model.theta_snapshot(),
            mastery: self.model.mastery_snapshot(),
            action: self.action(),
            next_item: self.pending.clone(),
        }
    }

    pub fn snapshot(&self) -> SessionSnapshot {
        SessionSnapshot {
            session_id: self.id.clone(),
            thetas: self.model.theta_snapshot(),
            asked_items: self.asked.clone(),
            remaining_capacity: self.remaining_capacity(),
            mastery: self.model.mastery_snapshot(),
            finished: self.is_finished(),
            pending: self.pending.clone(),
            skills: self.model.states(),
        }
    }
}
