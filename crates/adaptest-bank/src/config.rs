//! Engine configuration file.

use std::collections::HashMap;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

use adaptest_core::estimator::{NormalPrior, ThetaBounds};
use adaptest_core::service::EngineConfig;

/// Top-level adaptest configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AdaptestConfig {
    /// Bank file or directory used when `--bank` is not given.
    #[serde(default)]
    pub bank_path: Option<PathBuf>,
    /// Prior mean for every skill.
    #[serde(default)]
    pub prior_mu: f64,
    /// Prior variance for every skill.
    #[serde(default = "default_prior_sigma2")]
    pub prior_sigma2: f64,
    /// Mastery threshold for skills not listed in `mastery_thresholds`.
    #[serde(default = "default_mastery_threshold")]
    pub default_mastery_threshold: f64,
    /// Per-skill mastery thresholds.
    #[serde(default)]
    pub mastery_thresholds: HashMap<String, f64>,
    /// Item cap when a session does not request one.
    #[serde(default = "default_max_items")]
    pub default_max_items: usize,
    /// Largest item cap a session may request.
    #[serde(default = "default_max_items_cap")]
    pub max_items_cap: usize,
    /// Lower and upper bound of the theta search.
    #[serde(default = "default_theta_bounds")]
    pub theta_bounds: [f64; 2],
}

fn default_prior_sigma2() -> f64 {
    1.0
}
fn default_mastery_threshold() -> f64 {
    1.0
}
fn default_max_items() -> usize {
    20
}
fn default_max_items_cap() -> usize {
    100
}
fn default_theta_bounds() -> [f64; 2] {
    [-4.0, 4.0]
}

impl Default for AdaptestConfig {
    fn default() -> Self {
        Self {
            bank_path: None,
            prior_mu: 0.0,
            prior_sigma2: default_prior_sigma2(),
            default_mastery_threshold: default_mastery_threshold(),
            mastery_thresholds: HashMap::new(),
            default_max_items: default_max_items(),
            max_items_cap: default_max_items_cap(),
            theta_bounds: default_theta_bounds(),
        }
    }
}

impl AdaptestConfig {
    /// Check the values and build the engine configuration.
    pub fn to_engine_config(&self) -> Result<EngineConfig> {
        let prior = NormalPrior::new(self.prior_mu, self.prior_sigma2)
            .context("invalid prior in config")?;
        let bounds = ThetaBounds::new(self.theta_bounds[0], self.theta_bounds[1])
            .context("invalid theta_bounds in config")?;
        if !bounds.contains(prior.mu) {
            anyhow::bail!(
                "prior_mu {} lies outside theta_bounds [{}, {}]",
                prior.mu,
                bounds.lower,
                bounds.upper
            );
        }
        if self.max_items_cap == 0 {
            anyhow::bail!("max_items_cap must be at least 1");
        }
        if self.default_max_items == 0 || self.default_max_items > self.max_items_cap {
            anyhow::bail!(
                "default_max_items {} must be between 1 and max_items_cap {}",
                self.default_max_items,
                self.max_items_cap
            );
        }
        for (skill, threshold) in &self.mastery_thresholds {
            if !threshold.is_finite() {
                anyhow::bail!("mastery threshold for '{skill}' is not finite");
            }
        }
        if !self.default_mastery_threshold.is_finite() {
            anyhow::bail!("default_mastery_threshold is not finite");
        }

        Ok(EngineConfig {
            prior,
            default_mastery_threshold: self.default_mastery_threshold,
            mastery_thresholds: self.mastery_thresholds.clone(),
            default_max_items: self.default_max_items,
            max_items_cap: self.max_items_cap,
            bounds,
        })
    }
}

/// Resolve environment variable references like `${VAR_NAME}` in a string.
///
/// Substituted values are not scanned again.
fn resolve_env_vars(s: &str) -> String {
    let mut result = String::with_capacity(s.len());
    let mut rest = s;
    while let Some(start) = rest.find("${") {
        let Some(end) = rest[start..].find('}') else {
            break;
        };
        let var_name = &rest[start + 2..start + end];
        result.push_str(&rest[..start]);
        result.push_str(&std::env::var(var_name).unwrap_or_default());
        rest = &rest[start + end + 1..];
    }
    result.push_str(rest);
    result
}

/// Apply `ADAPTEST_BANK` and `ADAPTEST_MAX_ITEMS` style overrides.
fn apply_overrides(
    config: &mut AdaptestConfig,
    lookup: impl Fn(&str) -> Option<String>,
) -> Result<()> {
    if let Some(bank) = lookup("ADAPTEST_BANK") {
        config.bank_path = Some(PathBuf::from(bank));
    }
    if let Some(max) = lookup("ADAPTEST_MAX_ITEMS") {
        config.default_max_items = max
            .trim()
            .parse()
            .with_context(|| format!("ADAPTEST_MAX_ITEMS is not a number: {max}"))?;
    }
    Ok(())
}

/// Load configuration from well-known paths.
///
/// Search order:
/// 1. `adaptest.toml` in the current directory
/// 2. `~/.config/adaptest/config.toml`
///
/// Environment variable overrides: `ADAPTEST_BANK`, `ADAPTEST_MAX_ITEMS`.
pub fn load_config() -> Result<AdaptestConfig> {
    load_config_from(None)
}

/// Load config from an explicit path, or search the default locations.
pub fn load_config_from(path: Option<&Path>) -> Result<AdaptestConfig> {
    let config_path = if let Some(p) = path {
        if p.exists() {
            Some(p.to_path_buf())
        } else {
            anyhow::bail!("config file not found: {}", p.display());
        }
    } else {
        let local = PathBuf::from("adaptest.toml");
        if local.exists() {
            Some(local)
        } else {
            dirs_path()
                .map(|home| home.join("config.toml"))
                .filter(|global| global.exists())
        }
    };

    let mut config = match config_path {
        Some(path) => {
            let content = std::fs::read_to_string(&path)
                .with_context(|| format!("failed to read config: {}", path.display()))?;
            tracing::debug!(path = %path.display(), "loading config");
            parse_config_str(&content)
                .with_context(|| format!("failed to parse config: {}", path.display()))?
        }
        None => AdaptestConfig::default(),
    };

    apply_overrides(&mut config, |key| std::env::var(key).ok())?;
    Ok(config)
}

/// Parse config TOML, resolving `${VAR}` references in the bank path.
pub fn parse_config_str(content: &str) -> Result<AdaptestConfig> {
    let mut config: AdaptestConfig = toml::from_str(content)?;
    if let Some(bank) = &config.bank_path {
        config.bank_path = Some(PathBuf::from(resolve_env_vars(&bank.to_string_lossy())));
    }
    Ok(config)
}

fn dirs_path() -> Option<PathBuf> {
    std::env::var("HOME")
        .ok()
        .map(|h| PathBuf::from(h).join(".config").join("adaptest"))
}
