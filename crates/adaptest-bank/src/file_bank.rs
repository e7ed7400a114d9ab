//! [`ItemBank`] backed by parsed bank files.

use std::collections::{BTreeMap, BTreeSet};
use std::path::Path;

use anyhow::Result;
use serde::Serialize;

use adaptest_core::bank::{BankItem, ItemBank, Scope};
use adaptest_core::item::ItemId;
use adaptest_core::CatResult;

use crate::error::BankError;
use crate::model::{ItemBankFile, Question};
use crate::parser::load_banks;

/// Per-skill question counts.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SkillSummary {
    pub skill: String,
    pub total: usize,
    pub active: usize,
    pub categories: BTreeSet<String>,
}

/// Questions from one or more bank files, indexed by id.
#[derive(Debug, Clone, Default)]
pub struct FileBank {
    questions: BTreeMap<ItemId, Question>,
    sources: BTreeMap<ItemId, String>,
}

impl FileBank {
    /// Merge parsed banks, rejecting question ids that appear twice.
    pub fn new(banks: Vec<ItemBankFile>) -> Result<Self, BankError> {
        let mut bank = Self::default();
        for file in banks {
            for question in file.questions {
                if let Some(first) = bank.sources.get(&question.id) {
                    return Err(BankError::DuplicateQuestion {
                        id: question.id,
                        first: first.clone(),
                        second: file.id.clone(),
                    });
                }
                bank.sources.insert(question.id, file.id.clone());
                bank.questions.insert(question.id, question);
            }
        }
        Ok(bank)
    }

    /// Load a bank file or directory of bank files.
    pub fn load(path: &Path) -> Result<Self> {
        let banks = load_banks(path)?;
        let bank = Self::new(banks)?;
        tracing::info!(
            path = %path.display(),
            questions = bank.len(),
            "loaded item bank"
        );
        Ok(bank)
    }

    pub fn question(&self, id: ItemId) -> Result<&Question, BankError> {
        self.questions
            .get(&id)
            .ok_or(BankError::UnknownQuestion(id))
    }

    pub fn len(&self) -> usize {
        self.questions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.questions.is_empty()
    }

    /// Question counts per skill, sorted by skill.
    pub fn summary(&self) -> Vec<SkillSummary> {
        let mut by_skill: BTreeMap<&str, SkillSummary> = BTreeMap::new();
        for q in self.questions.values() {
            let entry = by_skill
                .entry(q.skill.as_str())
                .or_insert_with(|| SkillSummary {
                    skill: q.skill.clone(),
                    total: 0,
                    active: 0,
                    categories: BTreeSet::new(),
                });
            entry.total += 1;
            if q.active {
                entry.active += 1;
            }
            if let Some(cat) = &q.category {
                entry.categories.insert(cat.clone());
            }
        }
        by_skill.into_values().collect()
    }
}

impl ItemBank for FileBank {
    fn skills(&self) -> BTreeSet<String> {
        self.questions
            .values()
            .filter(|q| q.active)
            .map(|q| q.skill.clone())
            .collect()
    }

    fn items(&self, skills: &[String], scope: &Scope) -> CatResult<Vec<BankItem>> {
        Ok(self
            .questions
            .values()
            .filter(|q| q.active && skills.contains(&q.skill))
            .filter(|q| match &scope.category {
                Some(cat) => q.category.as_ref() == Some(cat),
                None => true,
            })
            .map(|q| BankItem {
                skill: q.skill.clone(),
                item: q.item(),
                category: q.category.clone(),
            })
            .collect())
    }
}
