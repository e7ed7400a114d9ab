//! adaptest-core — Adaptive-testing engine.
//!
//! Ability estimation, item selection, per-skill and multi-skill models, and
//! the session state machine that sequences them. Item banks and session
//! persistence are collaborators behind the [`bank::ItemBank`] and
//! [`store::SessionStore`] traits.

pub mod bank;
pub mod error;
pub mod estimator;
pub mod item;
pub mod multi;
pub mod pool;
pub mod report;
pub mod selector;
pub mod service;
pub mod session;
pub mod skill;
pub mod store;

pub use error::{CatError, CatResult, ErrorKind};
