//! TOML configuration.
//!
//! ```toml
//! # tt1.toml
//! [plot]
//! colors = ["k", "r", "#1f77b4"]
//! t_init = 200.0
//! t_final = 450.0
//! resample_period = 0.1
//! save = true
//!
//! [physics]
//! current_threshold_fraction = 0.05
//!
//! [summary]
//! format = "csv"
//! ```

use std::path::Path;

use anyhow::{Context, Result};
use serde::Deserialize;

use crate::discharge::{PhysicsConstants, PlotConfig, SummaryFormat};

#[derive(Debug, Default, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub plot: PlotConfig,
    #[serde(default)]
    pub physics: PhysicsConstants,
    #[serde(default)]
    pub summary: SummaryConfig,
}

#[derive(Debug, Default, Deserialize)]
pub struct SummaryConfig {
    #[serde(default)]
    pub format: SummaryFormat,
}

impl Config {
    pub fn from_file(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;
        Self::from_str(&content)
    }

    #[allow(clippy::should_implement_trait)]
    pub fn from_str(content: &str) -> Result<Self> {
        toml::from_str(content).context("Failed to parse TOML configuration")
    }
}
