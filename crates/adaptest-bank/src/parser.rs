//! TOML item-bank parser.
//!
//! Loads item banks from TOML files and directories, and validates them.

use std::collections::HashSet;
use std::path::Path;

use anyhow::{Context, Result};
use serde::Deserialize;

use crate::model::{ItemBankFile, Question};

/// Intermediate TOML structure for parsing bank files.
#[derive(Debug, Deserialize)]
struct TomlBankFile {
    bank: TomlBankHeader,
    #[serde(default)]
    items: Vec<TomlQuestion>,
}

#[derive(Debug, Deserialize)]
struct TomlBankHeader {
    id: String,
    name: String,
    #[serde(default)]
    description: String,
    /// Skill assigned to items that do not name one.
    #[serde(default)]
    default_skill: Option<String>,
}

#[derive(Debug, Deserialize)]
struct TomlQuestion {
    id: u64,
    #[serde(default)]
    skill: Option<String>,
    a: f64,
    b: f64,
    #[serde(default)]
    c: f64,
    #[serde(default)]
    stem: String,
    #[serde(default)]
    options: Vec<String>,
    #[serde(default)]
    correct: usize,
    #[serde(default)]
    category: Option<String>,
    #[serde(default)]
    reference: Option<String>,
    #[serde(default = "default_true")]
    active: bool,
}

fn default_true() -> bool {
    true
}

/// Skill used when neither the item nor the header names one.
pub const FALLBACK_SKILL: &str = "general";

/// Parse a single TOML file into an [`ItemBankFile`].
pub fn parse_item_bank(path: &Path) -> Result<ItemBankFile> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("failed to read item bank file: {}", path.display()))?;

    parse_item_bank_str(&content, path)
}

/// Parse a TOML string into an [`ItemBankFile`] (useful for testing).
pub fn parse_item_bank_str(content: &str, source_path: &Path) -> Result<ItemBankFile> {
    let parsed: TomlBankFile = toml::from_str(content)
        .with_context(|| format!("failed to parse TOML: {}", source_path.display()))?;

    let default_skill = parsed
        .bank
        .default_skill
        .unwrap_or_else(|| FALLBACK_SKILL.to_string());

    let questions = parsed
        .items
        .into_iter()
        .map(|q| Question {
            id: q.id,
            skill: q
                .skill
                .map(|s| s.trim().to_string())
                .filter(|s| !s.is_empty())
                .unwrap_or_else(|| default_skill.clone()),
            a: q.a,
            b: q.b,
            c: q.c,
            stem: q.stem,
            options: q.options,
            correct: q.correct,
            category: q.category,
            reference: q.reference,
            active: q.active,
        })
        .collect();

    Ok(ItemBankFile {
        id: parsed.bank.id,
        name: parsed.bank.name,
        description: parsed.bank.description,
        questions,
    })
}

/// Recursively load all `.toml` bank files from a directory.
pub fn load_bank_directory(dir: &Path) -> Result<Vec<ItemBankFile>> {
    let mut banks = Vec::new();

    if !dir.is_dir() {
        anyhow::bail!("not a directory: {}", dir.display());
    }

    let mut entries = std::fs::read_dir(dir)
        .with_context(|| format!("failed to read directory: {}", dir.display()))?
        .collect::<std::io::Result<Vec<_>>>()?;
    entries.sort_by_key(|e| e.path());

    for entry in entries {
        let path = entry.path();

        if path.is_dir() {
            banks.extend(load_bank_directory(&path)?);
        } else if path.extension().is_some_and(|ext| ext == "toml") {
            match parse_item_bank(&path) {
                Ok(bank) => banks.push(bank),
                Err(e) => {
                    tracing::warn!("skipping {}: {}", path.display(), e);
                }
            }
        }
    }

    Ok(banks)
}

/// Load a single bank file, or every bank under a directory.
pub fn load_banks(path: &Path) -> Result<Vec<ItemBankFile>> {
    if path.is_dir() {
        load_bank_directory(path)
    } else {
        Ok(vec![parse_item_bank(path)?])
    }
}

/// A warning from bank validation.
#[derive(Debug, Clone)]
pub struct ValidationWarning {
    /// The question id (if applicable).
    pub question_id: Option<u64>,
    /// Warning message.
    pub message: String,
}

/// Validate a bank for common issues.
pub fn validate_item_bank(bank: &ItemBankFile) -> Vec<ValidationWarning> {
    let mut warnings = Vec::new();

    // Check for duplicate question IDs
    let mut seen_ids = HashSet::new();
    for q in &bank.questions {
        if !seen_ids.insert(q.id) {
            warnings.push(ValidationWarning {
                question_id: Some(q.id),
                message: format!("duplicate question ID: {}", q.id),
            });
        }
    }

    for q in &bank.questions {
        let warn = |message: String| ValidationWarning {
            question_id: Some(q.id),
            message,
        };

        if let Err(e) = q.item().validate() {
            warnings.push(warn(e.to_string()));
        }
        if q.stem.trim().is_empty() {
            warnings.push(warn("stem is empty".into()));
        }
        if q.options.len() < 2 {
            warnings.push(warn(format!(
                "only {} option(s); at least 2 expected",
                q.options.len()
            )));
        }
        if q.correct >= q.options.len() {
            warnings.push(warn(format!(
                "correct index {} is out of range for {} option(s)",
                q.correct,
                q.options.len()
            )));
        }
        if !q.active {
            warnings.push(warn("question is inactive and will not be served".into()));
        }
    }

    if bank.questions.iter().all(|q| !q.active) {
        warnings.push(ValidationWarning {
            question_id: None,
            message: "bank has no active questions".into(),
        });
    }

    warnings
}
