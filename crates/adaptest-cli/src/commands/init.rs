//! The `adaptest init` command.

use anyhow::Result;

pub fn execute() -> Result<()> {
    if std::path::Path::new("adaptest.toml").exists() {
        println!("adaptest.toml already exists, skipping.");
    } else {
        std::fs::write("adaptest.toml", SAMPLE_CONFIG)?;
        println!("Created adaptest.toml");
    }

    std::fs::create_dir_all("banks")?;
    let example_path = std::path::Path::new("banks/example.toml");
    if example_path.exists() {
        println!("banks/example.toml already exists, skipping.");
    } else {
        std::fs::write(example_path, EXAMPLE_BANK)?;
        println!("Created banks/example.toml");
    }

    println!("\nNext steps:");
    println!("  1. Run: adaptest validate --bank banks/example.toml");
    println!("  2. Run: adaptest skills --bank banks/example.toml");
    println!("  3. Run: adaptest run");

    Ok(())
}

const SAMPLE_CONFIG: &str = r#"# adaptest configuration

bank_path = "banks/example.toml"

prior_mu = 0.0
prior_sigma2 = 1.0
default_mastery_threshold = 1.0
default_max_items = 20
max_items_cap = 100
theta_bounds = [-4.0, 4.0]

[mastery_thresholds]
# arithmetic = 1.2
"#;

const EXAMPLE_BANK: &str = r#"[bank]
id = "example"
name = "Example Bank"
description = "A small calibrated bank to get started"

[[items]]
id = 1
skill = "arithmetic"
a = 1.0
b = -1.0
c = 0.25
stem = "What is 7 + 5?"
options = ["11", "12", "13", "14"]
correct = 1

[[items]]
id = 2
skill = "arithmetic"
a = 1.2
b = 0.0
c = 0.25
stem = "What is 6 x 7?"
options = ["36", "42", "48", "56"]
correct = 1

[[items]]
id = 3
skill = "arithmetic"
a = 1.4
b = 1.0
c = 0.25
stem = "What is 144 / 12?"
options = ["10", "11", "12", "14"]
correct = 2

[[items]]
id = 11
skill = "geometry"
a = 0.9
b = -0.5
c = 0.25
stem = "How many degrees are in the interior angles of a triangle?"
options = ["90", "180", "270", "360"]
correct = 1

[[items]]
id = 12
skill = "geometry"
a = 1.3
b = 0.8
c = 0.25
stem = "What is the area of a circle with radius 3, to the nearest whole number?"
options = ["9", "19", "28", "36"]
correct = 2
"#;

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::Path;

    #[test]
    fn starter_files_parse() {
        let config = adaptest_bank::config::parse_config_str(SAMPLE_CONFIG).unwrap();
        assert!(config.to_engine_config().is_ok());

        let bank =
            adaptest_bank::parser::parse_item_bank_str(EXAMPLE_BANK, Path::new("example.toml"))
                .unwrap();
        assert_eq!(bank.questions.len(), 5);
        assert!(adaptest_bank::parser::validate_item_bank(&bank).is_empty());
    }
}
