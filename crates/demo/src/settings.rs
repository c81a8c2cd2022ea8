//! Layered queue configuration
//!
//! Precedence, lowest first: built-in defaults, optional config file,
//! `TASKGATE_*` environment, command-line flags.

use anyhow::{Context, Result};
use config::{Config, Environment, File};
use std::path::Path;
use taskgate_core::QueueConfig;
use tracing::debug;

const ENV_PREFIX: &str = "TASKGATE";

/// Limits passed on the command line; `None` leaves lower layers in place
#[derive(Debug, Default, Clone)]
pub struct Overrides {
    pub max_concurrent: Option<i64>,
    pub max_queued: Option<i64>,
    pub timeout_ms: Option<i64>,
    pub throttle_rate: Option<i64>,
    pub throttle_interval_ms: Option<i64>,
}

pub fn load(file: Option<&Path>, overrides: &Overrides) -> Result<QueueConfig> {
    let mut builder = Config::builder();

    if let Some(path) = file {
        builder = builder.add_source(File::from(path).required(true));
    }

    builder = builder
        .add_source(
            Environment::with_prefix(ENV_PREFIX)
                .prefix_separator("_")
                .separator("__")
                .try_parsing(true),
        )
        .set_override_option("max_concurrent", overrides.max_concurrent)?
        .set_override_option("max_queued", overrides.max_queued)?
        .set_override_option("timeout", overrides.timeout_ms)?
        .set_override_option("throttle.rate", overrides.throttle_rate)?
        .set_override_option("throttle.interval", overrides.throttle_interval_ms)?;

    let queue_config: QueueConfig = builder
        .build()
        .context("Failed to assemble configuration")?
        .try_deserialize()
        .context("Failed to read queue configuration")?;

    debug!(?queue_config, "Configuration loaded");
    Ok(queue_config)
}
