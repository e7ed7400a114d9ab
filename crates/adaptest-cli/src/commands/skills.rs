//! The `adaptest skills` command.

use std::path::PathBuf;

use anyhow::Result;
use comfy_table::{Cell, Table};

use adaptest_bank::FileBank;

pub fn execute(bank_path: PathBuf) -> Result<()> {
    let bank = FileBank::load(&bank_path)?;
    let summary = bank.summary();

    if summary.is_empty() {
        println!("No questions found in {}.", bank_path.display());
        return Ok(());
    }

    let mut table = Table::new();
    table.set_header(vec!["Skill", "Active", "Total", "Categories"]);
    for s in &summary {
        let categories = s.categories.iter().cloned().collect::<Vec<_>>().join(", ");
        table.add_row(vec![
            Cell::new(&s.skill),
            Cell::new(s.active),
            Cell::new(s.total),
            Cell::new(if categories.is_empty() { "-".into() } else { categories }),
        ]);
    }

    println!("{table}");
    println!("{} skill(s), {} question(s)", summary.len(), bank.len());
    Ok(())
}
