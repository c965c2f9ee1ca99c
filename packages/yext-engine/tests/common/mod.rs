//! Common test utilities for yext-engine
//!
//! Shared fixtures for integration tests: document trees written into a
//! temporary sandbox.

#![allow(dead_code)]

mod fixtures;

pub use fixtures::*;
