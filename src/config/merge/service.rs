//! MergeService: stacks the sources in precedence order and deserializes.

use crate::config::sources::{environment, explicit_file, global_file};
use crate::config::CompilerConfig;
use config::ConfigError;
use std::path::Path;

use super::policy;

pub struct MergeService;

impl MergeService {
    /// Precedence: defaults (lowest) -> global file -> explicit file -> environment (highest).
    pub fn load(explicit: Option<&Path>) -> Result<CompilerConfig, ConfigError> {
        let builder = policy::builder_with_defaults()?;
        let builder = global_file::add_to_builder(builder)?;
        let builder = match explicit {
            Some(path) => explicit_file::add_to_builder(builder, path)?,
            None => builder,
        };
        let builder = environment::add_to_builder(builder)?;

        builder.build()?.try_deserialize()
    }

    /// Load one file over the defaults, without the global file or environment.
    pub fn load_file_only(path: &Path) -> Result<CompilerConfig, ConfigError> {
        let builder = policy::builder_with_defaults()?;
        let builder = explicit_file::add_to_builder(builder, path)?;
        builder.build()?.try_deserialize()
    }
}
