//! Integration tests for the fluentconf compiler

mod support;

mod cli_contracts;
mod end_to_end;
mod idempotence;
mod partial_failure;
mod precedence;
mod scoping;
mod uniqueness;
mod workers;
