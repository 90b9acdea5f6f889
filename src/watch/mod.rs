//! Watch mode: level-triggered recompilation on manifest changes.

pub mod events;
pub mod runtime;

pub use events::{ChangeEvent, WatchConfig};
pub use runtime::{WatchDaemon, WatchHandle};
