//! Error types for compilation passes.
//!
//! Errors are split by blast radius: fragment-scoped errors are recorded on the
//! offending object and never abort a pass, pass-scoped errors abort only the
//! current agent's pass.

use crate::types::ObjectRef;
use thiserror::Error;

/// Errors raised by the object store collaborator.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum StoreError {
    /// Store temporarily unavailable (timeout, connection reset, ...).
    #[error("object store unavailable: {0}")]
    Transient(String),

    /// The requested kind or object does not exist.
    #[error("not found: {0}")]
    NotFound(String),
}

/// Compilation error taxonomy.
#[derive(Debug, Error)]
pub enum CompileError {
    #[error("invalid selector on {owner}: {reason}")]
    Selector { owner: ObjectRef, reason: String },

    #[error("the current configuration already exists: {label} ({owner} conflicts with {claimed_by})")]
    DuplicateLabel {
        label: String,
        owner: ObjectRef,
        claimed_by: ObjectRef,
    },

    #[error("aggregation failed for {owner}: {reason}")]
    Aggregation { owner: ObjectRef, reason: String },

    #[error("transient listing failure: {0}")]
    ListTransient(String),

    /// A lookup the caller did not downgrade to an empty result.
    #[error("not found: {0}")]
    NotFound(String),

    #[error("render invariant violated: {0}")]
    RenderInvariant(String),

    #[error("failed to materialize artifact: {0}")]
    Materialize(String),

    #[error("configuration error: {0}")]
    Config(String),

    #[error("manifest error: {0}")]
    Manifest(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl CompileError {
    /// Whether the error belongs to a single fragment rather than the whole pass.
    pub fn is_fragment_scoped(&self) -> bool {
        matches!(
            self,
            CompileError::Selector { .. }
                | CompileError::DuplicateLabel { .. }
                | CompileError::Aggregation { .. }
        )
    }

    /// Whether the caller should retry the pass after a backoff.
    pub fn is_retryable(&self) -> bool {
        matches!(self, CompileError::ListTransient(_))
    }

    /// Object the error should be reported against, if fragment-scoped.
    pub fn owner(&self) -> Option<&ObjectRef> {
        match self {
            CompileError::Selector { owner, .. }
            | CompileError::DuplicateLabel { owner, .. }
            | CompileError::Aggregation { owner, .. } => Some(owner),
            _ => None,
        }
    }
}

impl From<StoreError> for CompileError {
    fn from(err: StoreError) -> Self {
        match err {
            StoreError::Transient(msg) => CompileError::ListTransient(msg),
            StoreError::NotFound(msg) => CompileError::NotFound(msg),
        }
    }
}

impl From<config::ConfigError> for CompileError {
    fn from(err: config::ConfigError) -> Self {
        CompileError::Config(err.to_string())
    }
}

impl From<serde_yaml::Error> for CompileError {
    fn from(err: serde_yaml::Error) -> Self {
        CompileError::Manifest(err.to_string())
    }
}
