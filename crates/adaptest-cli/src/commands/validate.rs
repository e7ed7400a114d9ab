//! The `adaptest validate` command.

use std::path::PathBuf;

use anyhow::Result;

use adaptest_bank::parser;
use adaptest_bank::FileBank;

pub fn execute(bank_path: PathBuf) -> Result<()> {
    let banks = parser::load_banks(&bank_path)?;

    let mut total_warnings = 0;

    for bank in &banks {
        println!("Item bank: {} ({} questions)", bank.name, bank.questions.len());

        let warnings = parser::validate_item_bank(bank);
        for w in &warnings {
            let prefix = w
                .question_id
                .map(|id| format!("  [{id}]"))
                .unwrap_or_else(|| "  ".to_string());
            println!("{prefix} WARNING: {}", w.message);
        }
        total_warnings += warnings.len();
    }

    // Ids must also be unique across files.
    if let Err(e) = FileBank::new(banks) {
        println!("  ERROR: {e}");
        anyhow::bail!("item banks cannot be combined: {e}");
    }

    if total_warnings == 0 {
        println!("All item banks valid.");
    } else {
        println!("\n{total_warnings} warning(s) found.");
    }

    Ok(())
}
