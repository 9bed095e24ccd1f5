//! Fake adapters for orchestration tests.
//!
//! `FakeTransport` records every remote call and keeps a tiny model of each
//! host's binary directory so `ls` reflects earlier copies.

#![allow(clippy::expect_used, clippy::unwrap_used)]

use std::borrow::Cow;
use std::collections::{HashMap, HashSet};
use std::path::Path;
use std::sync::Mutex;
use std::sync::atomic::{AtomicUsize, Ordering};

use anyhow::Result;
use deploy_common::{Host, Product, Role, Topology};
use nomad_deploy::application::ports::{
    Artifact, ArtifactFetcher, CertificateToolInvoker, ProgressReporter, RemoteTransport,
    TemplateStore,
};
use nomad_deploy::domain::{TemplateError, TransportError};

// ── Topology helpers ──────────────────────────────────────────────────────────

pub fn host(address: &str, number: u32) -> Host {
    Host {
        address: address.to_string(),
        ssh_port: 22,
        user: "root".to_string(),
        number,
    }
}

/// Servers at `10.0.1.<n>`, clients at `10.0.2.<n>`.
pub fn topology(servers: u32, clients: u32) -> Topology {
    Topology {
        dc_name: "dc1".to_string(),
        binary_version: "1.10.0".to_string(),
        gossip_enabled: false,
        tls_enabled: false,
        acl_enabled: false,
        servers: (0..servers).map(|n| host(&format!("10.0.1.{n}"), n)).collect(),
        clients: (0..clients).map(|n| host(&format!("10.0.2.{n}"), n)).collect(),
        ssh_key: "/keys/id_ed25519".to_string(),
    }
}

// ── Transport ─────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Event {
    Run { host: String, command: String },
    Copy { host: String, remote: String, content: Vec<u8> },
}

impl Event {
    pub fn host(&self) -> &str {
        match self {
            Self::Run { host, .. } | Self::Copy { host, .. } => host,
        }
    }
}

pub const ACL_OUTPUT: &str = "AccessorID: 6a1253d2\nSecretID:   e95bd4ab\n";

#[derive(Default)]
pub struct FakeTransport {
    events: Mutex<Vec<Event>>,
    binaries: Mutex<HashMap<String, HashSet<String>>>,
    fail_on: Option<(String, String)>,
    acl_failures: AtomicUsize,
    timeout_acl: bool,
}

impl FakeTransport {
    pub fn new() -> Self {
        Self::default()
    }

    /// Fail any call on `address` whose command or remote path contains `needle`.
    pub fn failing_on(address: &str, needle: &str) -> Self {
        Self {
            fail_on: Some((address.to_string(), needle.to_string())),
            ..Self::default()
        }
    }

    /// The ACL bootstrap fails `n` times before succeeding.
    pub fn with_acl_failures(n: usize) -> Self {
        Self {
            acl_failures: AtomicUsize::new(n),
            ..Self::default()
        }
    }

    /// The ACL bootstrap always times out.
    pub fn with_acl_timeout() -> Self {
        Self {
            timeout_acl: true,
            ..Self::default()
        }
    }

    /// Pretend `binary` is already installed on `address`.
    pub fn preinstall(&self, address: &str, binary: &str) {
        self.binaries
            .lock()
            .unwrap()
            .entry(address.to_string())
            .or_default()
            .insert(binary.to_string());
    }

    pub fn events(&self) -> Vec<Event> {
        self.events.lock().unwrap().clone()
    }

    pub fn commands(&self) -> Vec<(String, String)> {
        self.events()
            .into_iter()
            .filter_map(|e| match e {
                Event::Run { host, command } => Some((host, command)),
                Event::Copy { .. } => None,
            })
            .collect()
    }

    /// `(host, remote path, content)` of every copy, in order.
    pub fn copies(&self) -> Vec<(String, String, Vec<u8>)> {
        self.events()
            .into_iter()
            .filter_map(|e| match e {
                Event::Copy {
                    host,
                    remote,
                    content,
                } => Some((host, remote, content)),
                Event::Run { .. } => None,
            })
            .collect()
    }

    pub fn copies_to(&self, remote: &str) -> usize {
        self.copies().iter().filter(|(_, r, _)| r == remote).count()
    }

    /// Content of the last copy of `remote` to `address`.
    pub fn file(&self, address: &str, remote: &str) -> String {
        let (_, _, content) = self
            .copies()
            .into_iter()
            .rev()
            .find(|(h, r, _)| h == address && r == remote)
            .unwrap_or_else(|| panic!("{remote} was never copied to {address}"));
        String::from_utf8(content).expect("utf-8")
    }

    fn check(&self, host: &Host, what: &str) -> Result<()> {
        if let Some((address, needle)) = &self.fail_on {
            if *address == host.address && what.contains(needle.as_str()) {
                return Err(TransportError::NonZeroExit {
                    host: host.to_string(),
                    action: what.to_string(),
                    code: 1,
                    stderr: "permission denied".to_string(),
                }
                .into());
            }
        }
        Ok(())
    }
}

impl RemoteTransport for FakeTransport {
    async fn run(&self, host: &Host, command: &str) -> Result<String> {
        self.events.lock().unwrap().push(Event::Run {
            host: host.address.clone(),
            command: command.to_string(),
        });
        self.check(host, command)?;

        if command.starts_with("ls ") {
            let binaries = self.binaries.lock().unwrap();
            let mut listing = String::from("bash\n");
            if let Some(names) = binaries.get(&host.address) {
                for name in names {
                    listing.push_str(name);
                    listing.push('\n');
                }
            }
            return Ok(listing);
        }
        if command.contains(" acl bootstrap") {
            if self.timeout_acl {
                return Err(TransportError::Timeout {
                    host: host.to_string(),
                    action: command.to_string(),
                    secs: 1,
                }
                .into());
            }
            let remaining = self.acl_failures.load(Ordering::SeqCst);
            if remaining > 0 {
                self.acl_failures.store(remaining - 1, Ordering::SeqCst);
                return Err(TransportError::NonZeroExit {
                    host: host.to_string(),
                    action: command.to_string(),
                    code: 1,
                    stderr: "The ACL system is currently in legacy mode.".to_string(),
                }
                .into());
            }
            return Ok(ACL_OUTPUT.to_string());
        }
        Ok(String::new())
    }

    async fn copy(&self, host: &Host, local: &Path, remote: &str) -> Result<()> {
        let content = std::fs::read(local)?;
        self.events.lock().unwrap().push(Event::Copy {
            host: host.address.clone(),
            remote: remote.to_string(),
            content,
        });
        self.check(host, remote)?;
        if let Some(name) = remote.strip_prefix("/usr/local/bin/") {
            self.preinstall(&host.address, name);
        }
        Ok(())
    }
}

// ── Fetcher ───────────────────────────────────────────────────────────────────

pub const BINARY_BYTES: &[u8] = b"\x7fELF fake agent";

#[derive(Default)]
pub struct FakeFetcher {
    pub calls: AtomicUsize,
}

impl ArtifactFetcher for FakeFetcher {
    async fn fetch(&self, product: Product, _version: &str) -> Result<Artifact> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        let dir = tempfile::tempdir()?;
        let path = dir.path().join(product.binary());
        std::fs::write(&path, BINARY_BYTES)?;
        Ok(Artifact::new(path, product, Some(Box::new(dir))))
    }
}

/// A download that never completes.
pub struct StallingFetcher;

impl ArtifactFetcher for StallingFetcher {
    async fn fetch(&self, _product: Product, _version: &str) -> Result<Artifact> {
        std::future::pending().await
    }
}

// ── Certificate tool ──────────────────────────────────────────────────────────

pub const GOSSIP_KEY: &str = "pUqJrVyVRj5jsiYEkM/tFQYfWyJIv4s3XkvDwy7Cu5s=";

/// Writes files named like the product tooling does, numbering leaf
/// certificates per role in creation order.
#[derive(Default)]
pub struct FakeCertTool {
    pub calls: Mutex<Vec<String>>,
}

impl FakeCertTool {
    pub fn calls(&self) -> Vec<String> {
        self.calls.lock().unwrap().clone()
    }
}

impl CertificateToolInvoker for FakeCertTool {
    async fn keygen(&self, _binary: &Path, _product: Product) -> Result<String> {
        self.calls.lock().unwrap().push("keygen".to_string());
        Ok(format!("{GOSSIP_KEY}\n"))
    }

    async fn create_ca(&self, _binary: &Path, product: Product, dir: &Path) -> Result<()> {
        self.calls.lock().unwrap().push("ca".to_string());
        let bin = product.binary();
        std::fs::write(dir.join(format!("{bin}-agent-ca.pem")), "CA")?;
        std::fs::write(dir.join(format!("{bin}-agent-ca-key.pem")), "CA KEY")?;
        Ok(())
    }

    async fn create_cert(
        &self,
        _binary: &Path,
        product: Product,
        dir: &Path,
        role: Role,
        dc_name: &str,
    ) -> Result<()> {
        self.calls.lock().unwrap().push(role.to_string());
        let prefix = format!("{dc_name}-{role}-{}-", product.binary());
        let existing = std::fs::read_dir(dir)?
            .filter_map(Result::ok)
            .map(|e| e.file_name().to_string_lossy().into_owned())
            .filter(|name| name.starts_with(&prefix) && !name.ends_with("-key.pem"))
            .count();
        std::fs::write(dir.join(format!("{prefix}{existing}.pem")), "CERT")?;
        std::fs::write(dir.join(format!("{prefix}{existing}-key.pem")), "KEY")?;
        Ok(())
    }
}

// ── Templates ─────────────────────────────────────────────────────────────────

/// Templates held in memory.
#[derive(Default)]
pub struct MemTemplates(pub HashMap<String, String>);

impl MemTemplates {
    pub fn with(mut self, name: &str, body: &str) -> Self {
        self.0.insert(name.to_string(), body.to_string());
        self
    }
}

impl TemplateStore for MemTemplates {
    fn open(&self, name: &str) -> Result<Cow<'static, [u8]>> {
        self.0
            .get(name)
            .map(|body| Cow::Owned(body.clone().into_bytes()))
            .ok_or_else(|| TemplateError::NotFound(name.to_string()).into())
    }
}

// ── Reporter ──────────────────────────────────────────────────────────────────

#[derive(Default)]
pub struct RecordingReporter {
    pub messages: Mutex<Vec<String>>,
}

impl ProgressReporter for RecordingReporter {
    fn step(&self, message: &str) {
        self.messages.lock().unwrap().push(message.to_string());
    }
    fn success(&self, message: &str) {
        self.messages.lock().unwrap().push(message.to_string());
    }
    fn warn(&self, message: &str) {
        self.messages.lock().unwrap().push(message.to_string());
    }
}
