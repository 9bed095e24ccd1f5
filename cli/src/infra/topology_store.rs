//! Infrastructure implementation of the `TopologyStore` port.

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use deploy_common::{Product, Topology};

use crate::application::ports::TopologyStore;

/// Topology kept as a YAML file on disk.
#[derive(Debug, Clone)]
pub struct YamlTopologyStore {
    path: PathBuf,
}

impl YamlTopologyStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// `consul.yaml` / `nomad.yaml` in the current directory unless
    /// `override_path` is given.
    #[must_use]
    pub fn for_product(product: Product, override_path: Option<PathBuf>) -> Self {
        Self::new(override_path.unwrap_or_else(|| PathBuf::from(product.topology_file())))
    }
}

/// Expand a leading `~/` to the home directory.
#[must_use]
pub fn expand_home(path: &str) -> PathBuf {
    if let Some(rest) = path.strip_prefix("~/") {
        if let Some(home) = dirs::home_dir() {
            return home.join(rest);
        }
    }
    PathBuf::from(path)
}

impl TopologyStore for YamlTopologyStore {
    fn path(&self) -> &Path {
        &self.path
    }

    fn load(&self) -> Result<Topology> {
        let content = std::fs::read_to_string(&self.path).with_context(|| {
            format!(
                "cannot read {} (run the `config` command to create it)",
                self.path.display()
            )
        })?;
        serde_yaml::from_str(&content)
            .with_context(|| format!("cannot parse {}", self.path.display()))
    }

    fn save(&self, topology: &Topology) -> Result<()> {
        if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent)
                .with_context(|| format!("cannot create {}", parent.display()))?;
        }
        let content = serde_yaml::to_string(topology).context("cannot serialize topology")?;
        std::fs::write(&self.path, content)
            .with_context(|| format!("cannot write {}", self.path.display()))?;

        #[cfg(unix)]
        {
            use std::os::unix::fs::PermissionsExt;
            std::fs::set_permissions(&self.path, std::fs::Permissions::from_mode(0o600))
                .with_context(|| format!("cannot set permissions on {}", self.path.display()))?;
        }
        Ok(())
    }
}
