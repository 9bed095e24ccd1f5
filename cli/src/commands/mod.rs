//! Command implementations

pub mod config;
pub mod remove;
pub mod up;
pub mod version;

use std::path::PathBuf;

use clap::Args;
use deploy_common::Product;

use crate::infra::ssh::DEFAULT_SSH_TIMEOUT;
use crate::infra::topology_store::YamlTopologyStore;

/// Location of the topology file, shared by every product command.
#[derive(Args, Debug, Clone, Default)]
pub struct TopologyArgs {
    /// Topology file (defaults to consul.yaml / nomad.yaml in the current directory)
    #[arg(short, long, env = "NOMAD_DEPLOY_FILE")]
    pub file: Option<PathBuf>,
}

impl TopologyArgs {
    #[must_use]
    pub fn store(&self, product: Product) -> YamlTopologyStore {
        YamlTopologyStore::for_product(product, self.file.clone())
    }
}

/// Options controlling how hosts are reached.
#[derive(Args, Debug, Clone)]
pub struct ConnectionArgs {
    /// Hosts worked on concurrently within a phase
    #[arg(long, env = "NOMAD_DEPLOY_PARALLEL", default_value_t = 1)]
    pub parallel: usize,

    /// Seconds before a single remote command or copy is abandoned
    #[arg(long, env = "NOMAD_DEPLOY_SSH_TIMEOUT", default_value_t = DEFAULT_SSH_TIMEOUT.as_secs())]
    pub ssh_timeout: u64,
}
