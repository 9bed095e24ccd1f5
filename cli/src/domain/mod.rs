//! Domain layer — pure business logic, types, and validation.
//!
//! This module has zero imports from `crate::infra`, `crate::commands`,
//! `crate::application`, `tokio`, `std::fs`, `std::process`, or `std::net`.
//! All functions are synchronous and take data in, returning data out.

pub mod certs;
pub mod checksum;
pub mod error;
pub mod layout;
pub mod outcome;
pub mod params;
pub mod topology;

pub use error::{
    Cancelled, CertificateToolError, CommandTimeout, ConfigValidationError, DownloadError,
    ExtractError, PhaseError, TemplateError, TransportError,
};
pub use layout::RemoteLayout;
pub use outcome::PhaseOutcome;
pub use params::Params;
pub use topology::validate_topology;
