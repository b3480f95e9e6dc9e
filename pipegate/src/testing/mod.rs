//! Test doubles for the collaborator ports.
//!
//! Exposed as a regular module so downstream crates embedding the
//! protocol can reuse them in their own tests.

mod mocks;

pub use mocks::{FakePipelineStarter, InMemoryFlagProvider, RecordingReporter, StaticSecretSource};
