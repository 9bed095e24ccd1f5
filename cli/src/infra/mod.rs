//! Infrastructure layer — concrete implementations of application port traits.
//!
//! This module contains all I/O-performing code: process execution, SSH and
//! SCP, release downloads, embedded templates, and the topology file.
//!
//! Imports from `crate::domain` and `crate::application::ports` are allowed.
//! Imports from `crate::commands` or `crate::output` are forbidden.

pub mod cert_tool;
pub mod command_runner;
pub mod fetcher;
pub mod ssh;
pub mod templates;
pub mod topology_store;
