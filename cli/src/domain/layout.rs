//! Remote filesystem layout and remote command lines for each product.
//!
//! Pure functions only. Every path and shell command the deployment sends to
//! a host is built here so the services never format them inline.

use deploy_common::{Product, Role};

use crate::domain::certs;

/// Directory on the hosts holding agent executables.
pub const REMOTE_BIN_DIR: &str = "/usr/local/bin";

/// Directory on the hosts holding systemd unit files.
pub const REMOTE_UNIT_DIR: &str = "/etc/systemd/system";

/// Remote paths and commands for one product.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RemoteLayout {
    product: Product,
}

impl RemoteLayout {
    #[must_use]
    pub fn new(product: Product) -> Self {
        Self { product }
    }

    #[must_use]
    pub fn product(&self) -> Product {
        self.product
    }

    /// `/usr/local/bin/<bin>`
    #[must_use]
    pub fn binary_path(&self) -> String {
        format!("{REMOTE_BIN_DIR}/{}", self.product.binary())
    }

    /// `<bin>.service`
    #[must_use]
    pub fn unit_name(&self) -> String {
        format!("{}.service", self.product.binary())
    }

    /// `/etc/systemd/system/<bin>.service`
    #[must_use]
    pub fn unit_path(&self) -> String {
        format!("{REMOTE_UNIT_DIR}/{}", self.unit_name())
    }

    /// `/etc/<bin>.d/` (trailing slash kept so `scp` treats it as a directory).
    #[must_use]
    pub fn config_dir(&self) -> String {
        format!("/etc/{}.d/", self.product.binary())
    }

    /// `/opt/<bin>/`
    #[must_use]
    pub fn data_dir(&self) -> String {
        format!("/opt/{}/", self.product.binary())
    }

    /// Remote path of a file inside the config directory.
    #[must_use]
    pub fn config_file(&self, file_name: &str) -> String {
        format!("{}{file_name}", self.config_dir())
    }

    // ── Template names ───────────────────────────────────────────────────────

    /// Shared agent configuration, e.g. `consul.hcl`.
    #[must_use]
    pub fn base_template(&self) -> String {
        format!("{}.hcl", self.product.binary())
    }

    /// Role-only configuration, e.g. `consul-server.hcl`.
    #[must_use]
    pub fn role_template(&self, role: Role) -> String {
        format!("{}-{role}.hcl", self.product.binary())
    }

    /// Service unit template, e.g. `consul.service`.
    #[must_use]
    pub fn unit_template(&self) -> String {
        self.unit_name()
    }

    // ── Commands ─────────────────────────────────────────────────────────────

    #[must_use]
    pub fn list_bin_dir(&self) -> String {
        format!("ls {REMOTE_BIN_DIR}/")
    }

    #[must_use]
    pub fn mkdir(dir: &str) -> String {
        format!("mkdir -p {dir}")
    }

    #[must_use]
    pub fn remove_dir(dir: &str) -> String {
        format!("bash -c \"rm -rf {dir}\"")
    }

    #[must_use]
    pub fn enable(&self) -> String {
        format!("systemctl enable {}", self.unit_name())
    }

    #[must_use]
    pub fn start(&self) -> String {
        format!("systemctl start {}", self.unit_name())
    }

    /// Stop, disable and delete the unit in one remote invocation. Each step
    /// runs even if the previous one fails (unit may already be gone).
    #[must_use]
    pub fn stop_disable_remove(&self) -> String {
        let unit = self.unit_name();
        format!(
            "bash -c \"systemctl stop {unit}; systemctl disable {unit}; rm -f {}\"",
            self.unit_path()
        )
    }

    /// Remote ACL bootstrap, run on the first server once agents are up.
    ///
    /// Nomad serves its HTTP API over TLS only once TLS is on, so the command
    /// must target the HTTPS address and trust the deployed CA. Consul keeps
    /// its plain HTTP port open locally.
    #[must_use]
    pub fn acl_bootstrap(&self, tls_enabled: bool) -> String {
        match self.product {
            Product::Nomad if tls_enabled => format!(
                "{} acl bootstrap -address=https://127.0.0.1:4646 -ca-cert={}",
                self.binary_path(),
                self.config_file(&certs::ca_file(self.product))
            ),
            _ => format!("{} acl bootstrap", self.binary_path()),
        }
    }

    // ── Local tooling arguments ──────────────────────────────────────────────

    /// Arguments of the gossip key generator.
    #[must_use]
    pub fn keygen_args(&self) -> &'static [&'static str] {
        match self.product {
            Product::Consul => &["keygen"],
            Product::Nomad => &["operator", "keygen"],
        }
    }

    #[must_use]
    pub fn ca_create_args(&self) -> &'static [&'static str] {
        &["tls", "ca", "create"]
    }

    #[must_use]
    pub fn cert_create_args(&self, role: Role, dc_name: &str) -> Vec<String> {
        vec![
            "tls".to_string(),
            "cert".to_string(),
            "create".to_string(),
            format!("-{role}"),
            format!("-dc={dc_name}"),
        ]
    }
}

/// Whether a remote `ls` listing contains `binary` as an entry.
///
/// Presence only: the version of whatever is installed is not inspected.
#[must_use]
pub fn listing_contains(listing: &str, binary: &str) -> bool {
    listing.split_whitespace().any(|entry| entry == binary)
}
