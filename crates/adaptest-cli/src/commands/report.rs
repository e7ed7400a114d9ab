//! The `adaptest report` command.

use std::path::PathBuf;

use anyhow::Result;

use adaptest_core::report::SessionReport;

pub fn execute(input: PathBuf, format: String) -> Result<()> {
    let report = SessionReport::load_json(&input)?;

    match format.as_str() {
        "markdown" | "md" => {
            println!("{}", report.to_markdown());
        }
        "json" => {
            println!("{}", serde_json::to_string_pretty(&report)?);
        }
        _ => {
            println!(
                "Session {}: {} item(s) asked, {}",
                report.session_id,
                report.asked.len(),
                if report.finished { "finished" } else { "unfinished" }
            );
            if let Some(acc) = report.accuracy() {
                println!("Accuracy: {:.1}%", acc * 100.0);
            }
            println!("{}", super::run::summary_table(&report));
        }
    }

    Ok(())
}
