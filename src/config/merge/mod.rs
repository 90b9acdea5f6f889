//! Source composition for [`CompilerConfig`](super::CompilerConfig).

pub mod policy;
pub mod service;
