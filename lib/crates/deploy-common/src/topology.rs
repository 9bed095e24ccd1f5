//! Cluster topology: the hosts of a deployment and its feature flags.
//!
//! A `Topology` is built once (survey or YAML file) and then only read while a
//! deployment runs. Host ordering for every phase is defined here so callers
//! never concatenate the server and client lists themselves.

use std::collections::HashSet;
use std::fmt;

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Role of a host within the cluster.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    Server,
    Client,
}

impl Role {
    /// Lowercase token used in file names, agent names and CLI flags.
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Server => "server",
            Self::Client => "client",
        }
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A remote machine reachable over SSH.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct Host {
    /// Resolvable network endpoint.
    pub address: String,
    /// SSH port.
    #[serde(default = "default_ssh_port")]
    pub ssh_port: u16,
    /// Remote login user.
    #[serde(default = "default_user")]
    pub user: String,
    /// Ordinal within the host's role group, starting at 0.
    pub number: u32,
}

fn default_ssh_port() -> u16 {
    22
}

fn default_user() -> String {
    "root".to_string()
}

impl fmt::Display for Host {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}@{}:{}", self.user, self.address, self.ssh_port)
    }
}

/// A host together with the role it plays in the topology.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Member<'a> {
    pub role: Role,
    pub host: &'a Host,
}

impl Member<'_> {
    /// Agent name derived from role and ordinal, e.g. `server-0`.
    #[must_use]
    pub fn agent_name(&self) -> String {
        format!("{}-{}", self.role, self.host.number)
    }
}

impl fmt::Display for Member<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} ({})", self.host, self.agent_name())
    }
}

/// Validated cluster description driving a deployment run.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct Topology {
    /// Datacenter name.
    pub dc_name: String,
    /// Release version of the agent binary, e.g. `1.10.0`.
    #[serde(rename = "version")]
    pub binary_version: String,
    #[serde(default)]
    pub gossip_enabled: bool,
    #[serde(default)]
    pub tls_enabled: bool,
    #[serde(default)]
    pub acl_enabled: bool,
    #[serde(default)]
    pub servers: Vec<Host>,
    #[serde(default)]
    pub clients: Vec<Host>,
    /// Path to the SSH private key accepted by every host.
    pub ssh_key: String,
}

/// Structural problems in a topology.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum TopologyError {
    #[error("topology has no server hosts; at least one server is required")]
    NoServers,

    #[error("duplicate {role} number {number}")]
    DuplicateNumber { role: Role, number: u32 },

    #[error("{role} #{number} has an empty address")]
    EmptyAddress { role: Role, number: u32 },

    #[error("{role} #{number} has an empty remote user")]
    EmptyUser { role: Role, number: u32 },

    #[error("{role} #{number} has SSH port 0")]
    InvalidPort { role: Role, number: u32 },
}

impl Topology {
    /// Hosts of one role, in list order.
    #[must_use]
    pub fn members(&self, role: Role) -> Vec<Member<'_>> {
        let hosts = match role {
            Role::Server => &self.servers,
            Role::Client => &self.clients,
        };
        hosts.iter().map(|host| Member { role, host }).collect()
    }

    /// Every host, servers first then clients.
    ///
    /// This is the order of every provisioning phase so that servers exist
    /// before clients try to join them.
    #[must_use]
    pub fn all_hosts(&self) -> Vec<Member<'_>> {
        let mut all = self.members(Role::Server);
        all.extend(self.members(Role::Client));
        all
    }

    /// Every host, clients first then servers. Used by teardown so servers
    /// stop last.
    #[must_use]
    pub fn teardown_hosts(&self) -> Vec<Member<'_>> {
        let mut all = self.members(Role::Client);
        all.extend(self.members(Role::Server));
        all
    }

    /// The first server, target of one-off cluster operations.
    #[must_use]
    pub fn first_server(&self) -> Option<Member<'_>> {
        self.servers.first().map(|host| Member {
            role: Role::Server,
            host,
        })
    }

    /// Check the structural invariants: at least one server, unique numbers
    /// within each role, and usable connection details on every host.
    ///
    /// # Errors
    ///
    /// Returns the first violated invariant.
    pub fn validate(&self) -> Result<(), TopologyError> {
        if self.servers.is_empty() {
            return Err(TopologyError::NoServers);
        }
        for role in [Role::Server, Role::Client] {
            let mut seen = HashSet::new();
            for Member { host, .. } in self.members(role) {
                let number = host.number;
                if !seen.insert(number) {
                    return Err(TopologyError::DuplicateNumber { role, number });
                }
                if host.address.trim().is_empty() {
                    return Err(TopologyError::EmptyAddress { role, number });
                }
                if host.user.trim().is_empty() {
                    return Err(TopologyError::EmptyUser { role, number });
                }
                if host.ssh_port == 0 {
                    return Err(TopologyError::InvalidPort { role, number });
                }
            }
        }
        Ok(())
    }
}
