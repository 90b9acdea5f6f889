//! fluentconf: deterministic fluentd configuration compiler
//!
//! Compiles label-selected configuration fragments, scattered across
//! cluster-wide and namespaced objects, into one byte-reproducible fluentd
//! configuration artifact per agent.
//!
//! Pipeline per agent: [`selector`] → [`scope`] → [`aggregate`] →
//! [`global`] → [`render`] → [`materialize`], orchestrated by [`driver`].

pub mod aggregate;
pub mod config;
pub mod driver;
pub mod error;
pub mod global;
pub mod logging;
pub mod materialize;
pub mod model;
pub mod render;
pub mod routing;
pub mod scope;
pub mod selector;
pub mod status;
pub mod store;
pub mod tooling;
pub mod types;
pub mod watch;

pub use driver::{AgentReport, Compiler, PassReport};
pub use error::{CompileError, StoreError};
pub use render::{render, RenderedConfig};
