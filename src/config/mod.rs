//! Configuration loading and management.
//!
//! This module is split into logical submodules:
//! - [`types`]: Top-level config struct, store, worker, metrics and notice sections
//! - [`timers`]: Background timer cadences and per-purpose destruct intervals
//! - [`limits`]: Rule validation limits
//! - [`validation`]: Startup validation returning every problem at once

mod limits;
mod timers;
mod types;
pub mod validation;

pub use limits::LimitsConfig;
pub use timers::TimersConfig;
pub use types::{
    Config, ConfigError, MEMORY_STORE, MetricsConfig, NoticesConfig, StoreConfig, WorkersConfig,
};
pub use validation::validate;
