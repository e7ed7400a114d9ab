//! Item-bank collaborator interface.
//!
//! The engine never reads bank files itself; it asks an [`ItemBank`] for the
//! calibrated items in a session's scope once, at session init.

use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};

use crate::error::{CatError, CatResult};
use crate::item::Item;

/// Which part of the bank a session draws from.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Scope {
    /// Skills to test; empty means every skill in the bank.
    #[serde(default)]
    pub skills: Vec<String>,
    /// Optional category filter (e.g. a Bloom level).
    #[serde(default)]
    pub category: Option<String>,
}

impl Scope {
    pub fn all() -> Self {
        Self::default()
    }

    pub fn skills<I, S>(skills: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            skills: skills.into_iter().map(Into::into).collect(),
            category: None,
        }
    }

    pub fn with_category(mut self, category: impl Into<String>) -> Self {
        self.category = Some(category.into());
        self
    }

    /// Resolve the requested skills against those the bank offers.
    ///
    /// Returns the sorted, de-duplicated skill list.
    pub fn resolve(&self, available: &BTreeSet<String>) -> CatResult<Vec<String>> {
        if self.skills.is_empty() {
            return Ok(available.iter().cloned().collect());
        }
        let mut resolved = BTreeSet::new();
        for skill in &self.skills {
            let skill = skill.trim();
            if skill.is_empty() {
                return Err(CatError::InvalidScope("empty skill name".into()));
            }
            if !available.contains(skill) {
                return Err(CatError::InvalidScope(format!(
                    "skill '{skill}' is not in the item bank"
                )));
            }
            resolved.insert(skill.to_string());
        }
        Ok(resolved.into_iter().collect())
    }
}

/// One calibrated item as handed over by the bank.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BankItem {
    pub skill: String,
    pub item: Item,
    #[serde(default)]
    pub category: Option<String>,
}

impl BankItem {
    pub fn new(skill: impl Into<String>, item: Item) -> Self {
        Self {
            skill: skill.into(),
            item,
            category: None,
        }
    }

    fn in_category(&self, category: Option<&str>) -> bool {
        match category {
            None => true,
            Some(wanted) => self.category.as_deref() == Some(wanted),
        }
    }
}

/// Source of calibrated items for new sessions.
pub trait ItemBank: Send + Sync {
    /// Every skill the bank can serve, ascending.
    fn skills(&self) -> BTreeSet<String>;

    /// Items belonging to `skills`, filtered by the scope's category.
    fn items(&self, skills: &[String], scope: &Scope) -> CatResult<Vec<BankItem>>;
}

/// A bank held entirely in memory.
#[derive(Debug, Clone, Default)]
pub struct InMemoryBank {
    items: Vec<BankItem>,
}

impl InMemoryBank {
    pub fn new(items: Vec<BankItem>) -> Self {
        Self { items }
    }

    /// Build a bank from `(skill, id, a, b, c)` tuples.
    pub fn from_tuples<'a>(tuples: impl IntoIterator<Item = (&'a str, u64, f64, f64, f64)>) -> Self {
        Self::new(
            tuples
                .into_iter()
                .map(|(skill, id, a, b, c)| BankItem::new(skill, Item::new(id, a, b, c)))
                .collect(),
        )
    }
}

impl ItemBank for InMemoryBank {
    fn skills(&self) -> BTreeSet<String> {
        self.items.iter().map(|i| i.skill.clone()).collect()
    }

    fn items(&self, skills: &[String], scope: &Scope) -> CatResult<Vec<BankItem>> {
        Ok(self
            .items
            .iter()
            .filter(|i| skills.contains(&i.skill))
            .filter(|i| i.in_category(scope.category.as_deref()))
            .cloned()
            .collect())
    }
}
