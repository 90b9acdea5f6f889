//! Routing Label Registry
//!
//! Every fragment compiles into one labelled section of the pipeline. The
//! label is derived from the fragment's config id (or set explicitly) and
//! must be unique among all fragments of one agent in one pass.

use crate::error::CompileError;
use crate::model::ConfigFragment;
use crate::types::{ObjectRef, RoutingLabel};
use std::collections::BTreeMap;

/// Digest bytes kept in a derived label (hex-encoded, so twice as many chars).
const LABEL_DIGEST_LEN: usize = 16;

/// Routing label for `fragment`: the explicit override, or `@` followed by a
/// truncated BLAKE3 digest of the config id.
pub fn routing_label(fragment: &ConfigFragment) -> RoutingLabel {
    if let Some(label) = fragment.route_label.as_deref().filter(|l| !l.is_empty()) {
        return if label.starts_with('@') {
            label.to_string()
        } else {
            format!("@{}", label)
        };
    }
    let digest = blake3::hash(fragment.cfg_id().as_bytes());
    format!("@{}", hex::encode(&digest.as_bytes()[..LABEL_DIGEST_LEN]))
}

/// Labels claimed so far in the current pass.
#[derive(Debug, Default)]
pub struct RouteRegistry {
    claimed: BTreeMap<RoutingLabel, ObjectRef>,
}

impl RouteRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Claim `label` for `owner`. The first claimant wins.
    pub fn register(&mut self, label: &str, owner: &ObjectRef) -> Result<(), CompileError> {
        if let Some(claimed_by) = self.claimed.get(label) {
            return Err(CompileError::DuplicateLabel {
                label: label.to_string(),
                owner: owner.clone(),
                claimed_by: claimed_by.clone(),
            });
        }
        self.claimed.insert(label.to_string(), owner.clone());
        Ok(())
    }

    pub fn owner_of(&self, label: &str) -> Option<&ObjectRef> {
        self.claimed.get(label)
    }

    pub fn len(&self) -> usize {
        self.claimed.len()
    }

    pub fn is_empty(&self) -> bool {
        self.claimed.is_empty()
    }
}
