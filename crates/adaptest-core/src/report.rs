//! Session reports with JSON persistence.

use std::path::Path;

use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::item::ItemId;
use crate::session::{Session, SessionId, TranscriptEntry};
use crate::skill::SkillState;

/// A complete record of one session.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SessionReport {
    /// Session identifier.
    pub session_id: SessionId,
    /// When the session was started.
    pub created_at: DateTime<Utc>,
    /// When the report was produced.
    pub generated_at: DateTime<Utc>,
    /// Whether the session reached FINISHED.
    pub finished: bool,
    /// Item cap for the session.
    pub max_items: usize,
    /// Items asked, in order.
    pub asked: Vec<ItemId>,
    /// Final state of every skill.
    pub skills: Vec<SkillState>,
    /// Answer-by-answer trace.
    pub transcript: Vec<TranscriptEntry>,
}

impl SessionReport {
    pub fn from_session(session: &Session) -> Self {
        Self {
            session_id: session.id().to_string(),
            created_at: session.created_at(),
            generated_at: Utc::now(),
            finished: session.is_finished(),
            max_items: session.max_items(),
            asked: session.asked().to_vec(),
            skills: session.model().states(),
            transcript: session.transcript().to_vec(),
        }
    }

    /// Save the report as JSON to a file.
    pub fn save_json(&self, path: &Path) -> Result<()> {
        let json = serde_json::to_string_pretty(self).context("failed to serialize report")?;
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        std::fs::write(path, json)
            .with_context(|| format!("failed to write report to {}", path.display()))?;
        Ok(())
    }

    /// Load a report from a JSON file.
    pub fn load_json(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("failed to read report from {}", path.display()))?;
        let report: SessionReport =
            serde_json::from_str(&content).context("failed to parse report JSON")?;
        Ok(report)
    }

    /// Fraction of answers that were correct, or `None` with no answers.
    pub fn accuracy(&self) -> Option<f64> {
        if self.transcript.is_empty() {
            return None;
        }
        let correct = self.transcript.iter().filter(|t| t.correct).count();
        Some(correct as f64 / self.transcript.len() as f64)
    }

    /// Render a Markdown summary.
    pub fn to_markdown(&self) -> String {
        let mut md = String::new();
        md.push_str(&format!("# Session {}\n\n", self.session_id));
        md.push_str(&format!(
            "- Started: {}\n- Items asked: {} / {}\n- Finished: {}\n",
            self.created_at.format("%Y-%m-%d %H:%M:%S UTC"),
            self.asked.len(),
            self.max_items,
            if self.finished { "yes" } else { "no" }
        ));
        if let Some(acc) = self.accuracy() {
            md.push_str(&format!("- Accuracy: {:.1}%\n", acc * 100.0));
        }

        md.push_str("\n| Skill | Theta | SE | Answered | Mastered | Exhausted |\n");
        md.push_str("|-------|-------|----|----------|----------|-----------|\n");
        for s in &self.skills {
            let se = s
                .standard_error
                .map(|se| format!("{se:.3}"))
                .unwrap_or_else(|| "-".into());
            md.push_str(&format!(
                "| {} | {:.3} | {} | {} | {} | {} |\n",
                s.skill,
                s.theta,
                se,
                s.responses.len(),
                if s.mastery_reached { "yes" } else { "no" },
                if s.exhausted { "yes" } else { "no" },
            ));
        }
        md
    }
}
