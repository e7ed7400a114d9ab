//! adaptest-bank — Item banks on disk and engine configuration.
//!
//! Parses TOML item-bank files into questions, validates them, and serves
//! their calibrated parameters to the engine through [`FileBank`].

pub mod config;
pub mod error;
pub mod file_bank;
pub mod model;
pub mod parser;

pub use config::{load_config, load_config_from, AdaptestConfig};
pub use error::BankError;
pub use file_bank::{FileBank, SkillSummary};
pub use model::{ItemBankFile, Question};
