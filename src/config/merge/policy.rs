//! Base layer: the built-in defaults every other source overrides.

use crate::config::CompilerConfig;
use config::builder::DefaultState;
use config::{Config, ConfigBuilder, ConfigError};

/// Builder seeded with `CompilerConfig::default()`.
pub fn builder_with_defaults() -> Result<ConfigBuilder<DefaultState>, ConfigError> {
    let defaults = Config::try_from(&CompilerConfig::default())?;
    Ok(Config::builder().add_source(defaults))
}
