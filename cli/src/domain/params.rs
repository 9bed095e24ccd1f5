//! Template parameter assembly.
//!
//! A shared base map is built once per run; each host then gets its own copy
//! with host-bound overrides. Maps are ordered so rendering is reproducible.

use std::collections::BTreeMap;

use deploy_common::{Member, Product, Role, Topology};

use crate::domain::certs;

/// Template parameters, keyed by template variable name.
pub type Params = BTreeMap<String, String>;

pub const DC_NAME: &str = "DCName";
pub const GOSSIP_KEY: &str = "GossipKey";
pub const ACL_ENABLED: &str = "ACLEnabled";
pub const CA_CERT_FILE: &str = "CACertFile";
pub const ADDRESS: &str = "Address";
pub const AGENT_NAME: &str = "AgentName";
pub const CERT_FILE: &str = "CertFile";
pub const KEY_FILE: &str = "KeyFile";
pub const SERVER_COUNT: &str = "ServerCount";
pub const SERVERS: &str = "Servers";
pub const CONFIG_DIR: &str = "ConfigDir";
pub const DATA_DIR: &str = "DataDir";

/// Parameters shared by every host of the run.
#[must_use]
pub fn base_params(
    topology: &Topology,
    product: Product,
    gossip_key: Option<&str>,
    config_dir: &str,
    data_dir: &str,
) -> Params {
    let mut params = Params::new();
    params.insert(DC_NAME.into(), topology.dc_name.clone());
    params.insert(CONFIG_DIR.into(), config_dir.to_string());
    params.insert(DATA_DIR.into(), data_dir.to_string());
    if let Some(key) = gossip_key {
        params.insert(GOSSIP_KEY.into(), key.to_string());
    }
    if topology.acl_enabled {
        params.insert(ACL_ENABLED.into(), "true".into());
    }
    if topology.tls_enabled {
        params.insert(CA_CERT_FILE.into(), certs::ca_file(product));
    }
    params
}

/// Base parameters plus the overrides bound to one host.
#[must_use]
pub fn host_params(base: &Params, topology: &Topology, member: Member<'_>, product: Product) -> Params {
    let mut params = base.clone();
    params.insert(ADDRESS.into(), member.host.address.clone());
    params.insert(AGENT_NAME.into(), member.agent_name());
    if topology.tls_enabled {
        let n = member.host.number;
        params.insert(
            CERT_FILE.into(),
            certs::cert_file(&topology.dc_name, member.role, product, n),
        );
        params.insert(
            KEY_FILE.into(),
            certs::key_file(&topology.dc_name, member.role, product, n),
        );
    }
    params
}

/// Host parameters plus what the role-specific template needs: the join list
/// for every role, and the expected server count for servers.
#[must_use]
pub fn role_params(host: &Params, topology: &Topology, role: Role) -> Params {
    let mut params = host.clone();
    params.insert(SERVERS.into(), server_join_list(topology));
    if role == Role::Server {
        params.insert(SERVER_COUNT.into(), topology.servers.len().to_string());
    }
    params
}

/// Parameters of the service unit template.
#[must_use]
pub fn unit_params(member: Member<'_>, binary_path: &str, config_dir: &str) -> Params {
    let mut params = Params::new();
    params.insert(AGENT_NAME.into(), member.agent_name());
    params.insert("BinaryPath".into(), binary_path.to_string());
    params.insert(CONFIG_DIR.into(), config_dir.to_string());
    params
}

/// Server addresses as an HCL list literal, e.g. `["10.0.0.1","10.0.0.3"]`.
#[must_use]
pub fn server_join_list(topology: &Topology) -> String {
    let quoted: Vec<String> = topology
        .servers
        .iter()
        .map(|s| format!("\"{}\"", s.address))
        .collect();
    format!("[{}]", quoted.join(","))
}
