//! Testing utilities for the Compass workspace
//!
//! Provides [`FakeHost`], an in-memory implementation of the host
//! capability traits with scriptable transient failures, plus registry
//! and document fixtures shared by unit tests, integration tests, and
//! the simulator.

#![allow(missing_docs)]

mod fake_host;
mod fixtures;

pub use fake_host::{FakeHost, SubInstanceSpec, VariantSpec};
pub use fixtures::{
    action_set_key, button_fixture, button_set_key, sample_registry, ButtonSpec, Fixture,
};
