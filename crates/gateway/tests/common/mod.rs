//! Shared test infrastructure for the gateway integration tests.

#![allow(dead_code)]

pub mod faulty;
pub mod fixtures;

pub use faulty::*;
pub use fixtures::*;
