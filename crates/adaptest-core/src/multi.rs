//! Between-item multidimensional model composed of independent skills.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::error::{CatError, CatResult};
use crate::estimator::NormalPrior;
use crate::item::{Item, ItemId};
use crate::pool::ItemPool;
use crate::skill::{SkillModel, SkillState};

/// An item chosen for presentation, tagged with the skill it belongs to.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NextItem {
    pub skill: String,
    pub item: Item,
}

/// A set of skill models keyed by skill name.
#[derive(Debug, Clone, Default)]
pub struct MultiSkillModel {
    skills: BTreeMap<String, SkillModel>,
}

impl MultiSkillModel {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a skill with the default estimator and selector.
    pub fn add_skill(
        &mut self,
        name: impl Into<String>,
        pool: ItemPool,
        mastery_threshold: f64,
        prior: NormalPrior,
    ) -> CatResult<()> {
        self.add_skill_model(SkillModel::new(name, pool, mastery_threshold, prior))
    }

    /// Add a fully configured skill model.
    pub fn add_skill_model(&mut self, model: SkillModel) -> CatResult<()> {
        if self.skills.contains_key(model.name()) {
            return Err(CatError::DuplicateSkill(model.name().to_string()));
        }
        self.skills.insert(model.name().to_string(), model);
        Ok(())
    }

    pub fn skill(&self, name: &str) -> Option<&SkillModel> {
        self.skills.get(name)
    }

    /// Skill names in ascending order.
    pub fn skill_names(&self) -> impl Iterator<Item = &str> {
        self.skills.keys().map(String::as_str)
    }

    pub fn theta_snapshot(&self) -> BTreeMap<String, f64> {
        self.skills
            .iter()
            .map(|(name, model)| (name.clone(), model.theta()))
            .collect()
    }

    pub fn mastery_snapshot(&self) -> BTreeMap<String, bool> {
        self.skills
            .iter()
            .map(|(name, model)| (name.clone(), model.mastery_reached()))
            .collect()
    }

    pub fn states(&self) -> Vec<SkillState> {
        self.skills.values().map(SkillModel::state).collect()
    }

    /// Total items still available across all skills.
    pub fn remaining_items(&self) -> usize {
        self.skills.values().map(|m| m.pool().len()).sum()
    }

    pub fn apply_response(&mut self, skill: &str, item_id: ItemId, correct: bool) -> CatResult<()> {
        self.skills
            .get_mut(skill)
            .ok_or_else(|| CatError::UnknownSkill(skill.to_string()))?
            .apply_response(item_id, correct)
    }

    /// Next item from the weakest eligible skill.
    ///
    /// Eligible skills are visited by ascending theta, ties by name; a skill
    /// whose selector yields nothing is skipped.
    pub fn next_item(&self) -> Option<NextItem> {
        let mut eligible: Vec<&SkillModel> =
            self.skills.values().filter(|m| m.is_eligible()).collect();
        eligible.sort_by(|a, b| {
            a.theta()
                .total_cmp(&b.theta())
                .then_with(|| a.name().cmp(b.name()))
        });

        eligible.into_iter().find_map(|model| {
            model.next_item().map(|item| NextItem {
                skill: model.name().to_string(),
                item,
            })
        })
    }

    /// Whether no skill can receive further items.
    pub fn is_complete(&self) -> bool {
        self.next_item().is_none()
    }
}
