//! The agents this tool knows how to deploy.

use std::fmt;

use serde::{Deserialize, Serialize};

/// Agent product deployed by a run.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "lowercase")]
pub enum Product {
    /// Service-mesh / consensus agent.
    Consul,
    /// Workload scheduler agent.
    Nomad,
}

impl Product {
    /// Name of the executable inside the release archive and on the hosts.
    #[must_use]
    pub fn binary(self) -> &'static str {
        match self {
            Self::Consul => "consul",
            Self::Nomad => "nomad",
        }
    }

    /// Topology file looked up in the working directory when none is given.
    #[must_use]
    pub fn topology_file(self) -> &'static str {
        match self {
            Self::Consul => "consul.yaml",
            Self::Nomad => "nomad.yaml",
        }
    }

    /// Release version offered as the default by the survey.
    #[must_use]
    pub fn default_version(self) -> &'static str {
        match self {
            Self::Consul => "1.10.0",
            Self::Nomad => "1.1.2",
        }
    }
}

impl fmt::Display for Product {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.binary())
    }
}
