//! Status reporting: fragment-scoped errors travel back to their source objects.

use crate::error::StoreError;
use crate::model::{Agent, ConfigFragment};
use crate::types::ObjectRef;

/// Narrow capability for objects carrying an error status field.
pub trait HasErrorStatus {
    fn object_ref(&self) -> ObjectRef;
    fn set_error(&mut self, message: &str);
    fn clear_error(&mut self);
    fn error(&self) -> Option<&str>;
}

impl HasErrorStatus for ConfigFragment {
    fn object_ref(&self) -> ObjectRef {
        ConfigFragment::object_ref(self)
    }

    fn set_error(&mut self, message: &str) {
        self.status.errors = Some(message.to_string());
    }

    fn clear_error(&mut self) {
        self.status.errors = None;
    }

    fn error(&self) -> Option<&str> {
        self.status.errors.as_deref()
    }
}

impl HasErrorStatus for Agent {
    fn object_ref(&self) -> ObjectRef {
        Agent::object_ref(self)
    }

    fn set_error(&mut self, message: &str) {
        self.status.errors = Some(message.to_string());
    }

    fn clear_error(&mut self) {
        self.status.errors = None;
    }

    fn error(&self) -> Option<&str> {
        self.status.errors.as_deref()
    }
}

/// Best-effort status sink. Failures are logged by the caller, never escalated.
pub trait StatusReporter {
    fn patch_error(&self, object: &ObjectRef, message: &str) -> Result<(), StoreError>;

    /// Remove any error previously patched onto `object`.
    fn clear_error(&self, object: &ObjectRef) -> Result<(), StoreError>;
}

/// Record `errors` on `object` and forward them to the reporter.
///
/// Messages are joined with `,`. Returns the joined message when any error was
/// recorded.
pub fn record_errors<T: HasErrorStatus + ?Sized>(
    object: &mut T,
    errors: &[String],
    reporter: &dyn StatusReporter,
) -> Option<String> {
    if errors.is_empty() {
        object.clear_error();
        if let Err(e) = reporter.clear_error(&object.object_ref()) {
            tracing::warn!(object = %object.object_ref(), error = %e, "Failed to clear object status");
        }
        return None;
    }
    let message = errors.join(",");
    object.set_error(&message);
    if let Err(e) = reporter.patch_error(&object.object_ref(), &message) {
        tracing::warn!(object = %object.object_ref(), error = %e, "Failed to patch object status");
    }
    Some(message)
}
