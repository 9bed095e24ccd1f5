//! Integration tests for nomad-deploy
//!
//! These tests spawn the actual binary and test end-to-end behavior that does
//! not need reachable hosts.

mod config_command;
