//! Port trait definitions for the Application layer.
//!
//! Ports are the interfaces (contracts) that infrastructure must fulfill.
//! This file imports only from `crate::domain` and the shared topology types,
//! never from `crate::infra`, `crate::commands`, or `crate::output`.

use std::any::Any;
use std::borrow::Cow;
use std::path::{Path, PathBuf};
use std::process::Output;
use std::time::Duration;

use anyhow::Result;
use deploy_common::{Host, Product, Role, Topology};

// ── Value Types ───────────────────────────────────────────────────────────────

/// The extracted agent executable, ready to be copied to every host.
///
/// The local file lives as long as the artifact; dropping it removes the
/// temporary directory holding the download and the extracted binary.
pub struct Artifact {
    /// Local path of the executable.
    pub path: PathBuf,
    /// Product the executable belongs to.
    pub product: Product,
    _guard: Option<Box<dyn Any + Send>>,
}

impl Artifact {
    /// Wrap an executable path together with the guard owning its storage.
    #[must_use]
    pub fn new(path: PathBuf, product: Product, guard: Option<Box<dyn Any + Send>>) -> Self {
        Self {
            path,
            product,
            _guard: guard,
        }
    }
}

impl std::fmt::Debug for Artifact {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Artifact")
            .field("path", &self.path)
            .field("product", &self.product)
            .finish_non_exhaustive()
    }
}

// ── Command Runner Port ───────────────────────────────────────────────────────

/// Abstracts process execution so infrastructure can be swapped or mocked.
#[allow(async_fn_in_trait)]
pub trait CommandRunner {
    /// Run a program with the instance's default timeout and capture its output.
    async fn run(&self, program: &str, args: &[&str]) -> Result<Output>;
    /// Run a program with a custom timeout override.
    ///
    /// # Errors
    ///
    /// Returns an error if the process cannot be spawned. On timeout the child
    /// is killed and a [`crate::domain::CommandTimeout`] is returned.
    async fn run_with_timeout(
        &self,
        program: &str,
        args: &[&str],
        timeout: Duration,
    ) -> Result<Output>;
    /// Run a program with `dir` as its working directory. The caller's own
    /// working directory is left untouched.
    async fn run_in_dir(&self, program: &str, args: &[&str], dir: &Path) -> Result<Output>;
}

// ── Remote Transport Port ─────────────────────────────────────────────────────

/// Run a command on, or copy a file to, one remote host.
///
/// Non-zero remote exit status, connection failures and timeouts are errors
/// tagged with the host. No retry happens at this layer.
#[allow(async_fn_in_trait)]
pub trait RemoteTransport {
    /// Execute `command` on `host`, returning its standard output.
    async fn run(&self, host: &Host, command: &str) -> Result<String>;
    /// Copy the local file at `local` to `remote` on `host`.
    async fn copy(&self, host: &Host, local: &Path, remote: &str) -> Result<()>;
}

// ── Artifact Port ─────────────────────────────────────────────────────────────

/// Download a release and extract the product's executable.
#[allow(async_fn_in_trait)]
pub trait ArtifactFetcher {
    async fn fetch(&self, product: Product, version: &str) -> Result<Artifact>;
}

// ── Template Port ─────────────────────────────────────────────────────────────

/// Named-template lookup keyed by file name.
#[cfg_attr(test, mockall::automock)]
pub trait TemplateStore {
    /// Raw template bytes.
    ///
    /// # Errors
    ///
    /// Returns [`crate::domain::TemplateError::NotFound`] for unknown names.
    fn open(&self, name: &str) -> Result<Cow<'static, [u8]>>;
}

// ── Certificate Tooling Port ──────────────────────────────────────────────────

/// The product binary's own key and certificate tooling.
///
/// `binary` is the freshly fetched executable; a test double may ignore it.
#[allow(async_fn_in_trait)]
pub trait CertificateToolInvoker {
    /// Generate a gossip encryption key and return it trimmed.
    async fn keygen(&self, binary: &Path, product: Product) -> Result<String>;
    /// Create the CA certificate and key inside `dir`.
    async fn create_ca(&self, binary: &Path, product: Product, dir: &Path) -> Result<()>;
    /// Create the next leaf certificate pair for `role` inside `dir`.
    async fn create_cert(
        &self,
        binary: &Path,
        product: Product,
        dir: &Path,
        role: Role,
        dc_name: &str,
    ) -> Result<()>;
}

// ── Progress Reporting Port ───────────────────────────────────────────────────

/// Abstracts progress reporting so services can emit events without
/// depending on the Presentation layer. Sync trait.
pub trait ProgressReporter {
    /// Emit an in-progress step message.
    fn step(&self, message: &str);
    /// Emit a success message.
    fn success(&self, message: &str);
    /// Emit a warning message.
    fn warn(&self, message: &str);
}

// ── Topology Persistence Port ─────────────────────────────────────────────────

/// Load and save the topology document.
pub trait TopologyStore {
    /// Location of the topology file.
    fn path(&self) -> &Path;
    /// Read and parse the topology file.
    ///
    /// # Errors
    ///
    /// Returns an error if the file is missing or malformed.
    fn load(&self) -> Result<Topology>;
    /// Write the topology file.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be written.
    fn save(&self, topology: &Topology) -> Result<()>;
}
