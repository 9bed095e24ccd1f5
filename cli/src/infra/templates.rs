//! `TemplateStore` implementations.
//!
//! The default template set of each product is compiled into the binary with
//! `include_dir!` from `cli/templates/<binary>/`. An operator may point at a
//! directory of their own templates instead; it must use the same file names.

use std::borrow::Cow;
use std::path::PathBuf;

use anyhow::{Context, Result};
use deploy_common::Product;
use include_dir::{Dir, include_dir};

use crate::application::ports::TemplateStore;
use crate::domain::TemplateError;

static EMBEDDED_TEMPLATES: Dir<'_> = include_dir!("$CARGO_MANIFEST_DIR/templates");

/// Templates compiled into the binary, scoped to one product.
#[derive(Debug, Clone, Copy)]
pub struct EmbeddedTemplates {
    product: Product,
}

impl EmbeddedTemplates {
    #[must_use]
    pub fn new(product: Product) -> Self {
        Self { product }
    }

    /// Names of the embedded templates of this product, sorted.
    #[must_use]
    pub fn names(&self) -> Vec<String> {
        let mut names: Vec<String> = EMBEDDED_TEMPLATES
            .get_dir(self.product.binary())
            .map(|dir| {
                dir.files()
                    .filter_map(|f| f.path().file_name())
                    .map(|n| n.to_string_lossy().into_owned())
                    .collect()
            })
            .unwrap_or_default();
        names.sort();
        names
    }
}

impl TemplateStore for EmbeddedTemplates {
    fn open(&self, name: &str) -> Result<Cow<'static, [u8]>> {
        let path = format!("{}/{name}", self.product.binary());
        EMBEDDED_TEMPLATES
            .get_file(&path)
            .map(|f| Cow::Borrowed(f.contents()))
            .ok_or_else(|| TemplateError::NotFound(name.to_string()).into())
    }
}

/// Templates read from a local directory at render time.
#[derive(Debug, Clone)]
pub struct DirTemplates {
    root: PathBuf,
}

impl DirTemplates {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }
}

impl TemplateStore for DirTemplates {
    fn open(&self, name: &str) -> Result<Cow<'static, [u8]>> {
        let path = self.root.join(name);
        if !path.is_file() {
            return Err(TemplateError::NotFound(path.display().to_string()).into());
        }
        let bytes = std::fs::read(&path).with_context(|| format!("cannot read {}", path.display()))?;
        Ok(Cow::Owned(bytes))
    }
}
