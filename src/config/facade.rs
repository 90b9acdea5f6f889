//! ConfigLoader facade delegating to the merge service.

use super::merge::service::MergeService;
use super::CompilerConfig;
use crate::error::CompileError;
use std::path::Path;

pub struct ConfigLoader;

impl ConfigLoader {
    /// Load every layer; `explicit` is the `--config` file if given.
    pub fn load(explicit: Option<&Path>) -> Result<CompilerConfig, CompileError> {
        let config = MergeService::load(explicit)?;
        config.validate()?;
        Ok(config)
    }

    /// Load a single file over the defaults.
    pub fn load_from_file(path: &Path) -> Result<CompilerConfig, CompileError> {
        let config = MergeService::load_file_only(path)?;
        config.validate()?;
        Ok(config)
    }
}
