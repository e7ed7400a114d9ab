//! Question and bank types.
//!
//! A [`Question`] carries the presentation data (stem, options, key) next to
//! the calibrated 3PL parameters. The engine only ever sees the parameters;
//! the rest stays on this side of the bank boundary.

use serde::{Deserialize, Serialize};

use adaptest_core::item::{Item, ItemId};

use crate::error::BankError;

/// A calibrated multiple-choice question.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Question {
    /// Unique question id.
    pub id: ItemId,
    /// Skill (module / concept) this question measures.
    pub skill: String,
    /// Discrimination.
    pub a: f64,
    /// Difficulty.
    pub b: f64,
    /// Guessing.
    pub c: f64,
    /// Question text.
    pub stem: String,
    /// Answer options in presentation order.
    pub options: Vec<String>,
    /// Index of the correct option.
    pub correct: usize,
    /// Optional category, e.g. a Bloom level.
    pub category: Option<String>,
    /// Optional source reference.
    pub reference: Option<String>,
    /// Inactive questions are never served.
    pub active: bool,
}

impl Question {
    /// The 3PL item the engine works with.
    pub fn item(&self) -> Item {
        Item::new(self.id, self.a, self.b, self.c)
    }

    /// Letter shown for option `index` ("A", "B", ...).
    pub fn option_label(index: usize) -> String {
        char::from_u32('A' as u32 + index as u32)
            .map(|c| c.to_string())
            .unwrap_or_else(|| (index + 1).to_string())
    }

    /// Whether `answer_index` is the keyed option.
    pub fn grade(&self, answer_index: usize) -> Result<bool, BankError> {
        if answer_index >= self.options.len() {
            return Err(BankError::AnswerOutOfRange {
                id: self.id,
                index: answer_index,
                options: self.options.len(),
            });
        }
        Ok(answer_index == self.correct)
    }

    /// Parse a typed option label ("b", "B", "2") into an index.
    pub fn parse_option(&self, input: &str) -> Option<usize> {
        let input = input.trim();
        if let Ok(n) = input.parse::<usize>() {
            return match n {
                0 => None,
                n if n <= self.options.len() => Some(n - 1),
                _ => None,
            };
        }
        let mut chars = input.chars();
        let ch = chars.next()?.to_ascii_uppercase();
        if chars.next().is_some() || !ch.is_ascii_uppercase() {
            return None;
        }
        let index = (ch as u8 - b'A') as usize;
        (index < self.options.len()).then_some(index)
    }
}

/// One parsed bank file.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ItemBankFile {
    /// Unique identifier for this bank.
    pub id: String,
    /// Human-readable name.
    pub name: String,
    /// Description of this bank.
    #[serde(default)]
    pub description: String,
    /// The questions in this bank.
    #[serde(default)]
    pub questions: Vec<Question>,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn question() -> Question {
        Question {
            id: 7,
            skill: "cells".into(),
            a: 1.0,
            b: 0.0,
            c: 0.25,
            stem: "Which organelle makes ATP?".into(),
            options: vec![
                "Nucleus".into(),
                "Mitochondrion".into(),
                "Ribosome".into(),
                "Golgi".into(),
            ],
            correct: 1,
            category: None,
            reference: None,
            active: true,
        }
    }

    #[test]
    fn grade_checks_key_and_range() {
        let q = question();
        assert!(q.grade(1).unwrap());
        assert!(!q.grade(0).unwrap());
        assert!(matches!(
            q.grade(4),
            Err(BankError::AnswerOutOfRange { index: 4, .. })
        ));
    }

    #[test]
    fn parse_option_accepts_letters_and_numbers() {
        let q = question();
        assert_eq!(q.parse_option("b"), Some(1));
        assert_eq!(q.parse_option(" D "), Some(3));
        assert_eq!(q.parse_option("2"), Some(1));
        assert_eq!(q.parse_option("E"), None);
        assert_eq!(q.parse_option("0"), None);
        assert_eq!(q.parse_option("ab"), None);
        assert_eq!(q.parse_option(""), None);
    }

    #[test]
    fn option_labels() {
        assert_eq!(Question::option_label(0), "A");
        assert_eq!(Question::option_label(3), "D");
    }
}
