//! Run configuration, environment switches and logging setup.

use std::path::PathBuf;

use log::LevelFilter;
use serde::{Deserialize, Serialize};

use crate::error::{SimError, SimResult};
use crate::rules::TableRules;

/// Enables per-decision tracing when set to `1` or `true`.
pub const DEBUG_ENV: &str = "BJSIM_DEBUG";
/// Overrides the default statistics file location.
pub const DATA_ENV: &str = "BJSIM_DATA";

pub const DEFAULT_DATA_FILE: &str = "bj_sim_data.json";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RunConfig {
    /// Hands to simulate.
    pub hands: u64,
    /// Hands between persistence checkpoints.
    pub checkpoint_every: u64,
    /// Parallel workers; 1 runs strictly sequentially.
    pub workers: usize,
    /// Seed for a reproducible run.
    pub seed: Option<u64>,
    pub rules: TableRules,
}

impl Default for RunConfig {
    fn default() -> Self {
        RunConfig {
            hands: 100_000,
            checkpoint_every: 10_000,
            workers: 1,
            seed: None,
            rules: TableRules::default(),
        }
    }
}

impl RunConfig {
    pub fn validate(&self) -> SimResult<()> {
        if self.hands == 0 {
            return Err(SimError::InvalidConfig("hand count must be positive".to_string()));
        }
        if self.checkpoint_every == 0 {
            return Err(SimError::InvalidConfig(
                "checkpoint interval must be positive".to_string(),
            ));
        }
        if self.workers == 0 {
            return Err(SimError::InvalidConfig("need at least one worker".to_string()));
        }
        self.rules.validate()
    }
}

fn truthy(value: &str) -> bool {
    matches!(value.trim().to_ascii_lowercase().as_str(), "1" | "true")
}

/// Read `BJSIM_DEBUG`.
pub fn debug_from_env() -> bool {
    std::env::var(DEBUG_ENV).map(|v| truthy(&v)).unwrap_or(false)
}

/// Read `BJSIM_DATA` (default `bj_sim_data.json` in the working directory).
pub fn default_data_path() -> PathBuf {
    std::env::var(DATA_ENV)
        .map(PathBuf::from)
        .unwrap_or_else(|_| PathBuf::from(DEFAULT_DATA_FILE))
}

/// Install the console log sink. Debug mode forces `trace`, otherwise
/// `RUST_LOG` applies with an `info` default.
pub fn init_logging(debug: bool) {
    let mut builder =
        env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info"));
    if debug {
        builder.filter_level(LevelFilter::Trace);
    }
    // A second init (tests, embedding) keeps the first sink.
    let _ = builder.try_init();
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn truthy_values() {
        assert!(truthy("1"));
        assert!(truthy("TRUE"));
        assert!(!truthy("0"));
        assert!(!truthy("yes"));
    }

    #[test]
    fn default_config_is_valid() {
        assert!(RunConfig::default().validate().is_ok());
    }

    #[test]
    fn rejects_zero_checkpoint() {
        let cfg = RunConfig {
            checkpoint_every: 0,
            ..RunConfig::default()
        };
        assert!(matches!(cfg.validate(), Err(SimError::InvalidConfig(_))));
    }
}
