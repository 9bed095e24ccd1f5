//! Unit tests for nomad-deploy
//!
//! These tests drive the workflows through fake adapters and run fast without
//! SSH, network access, or the product binaries.

mod architecture;
mod fakes;
mod orchestrator_remove;
