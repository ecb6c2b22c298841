//! Engine configuration, grouped per subsystem.

pub mod defaults;

mod reasoning_config;
mod stats_config;

pub use reasoning_config::ReasoningConfig;
pub use stats_config::StatsConfig;

use serde::{Deserialize, Serialize};

/// Top-level configuration injected into the engine.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct RetainConfig {
    pub stats: StatsConfig,
    pub reasoning: ReasoningConfig,
}
