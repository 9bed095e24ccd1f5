//! Configuration rendering.
//!
//! Templates use Handlebars syntax (`{{Address}}`, `{{#if GossipKey}}`) with
//! HTML escaping disabled, since the output is HCL and systemd unit text.

use anyhow::Result;
use handlebars::Handlebars;

use crate::application::ports::TemplateStore;
use crate::domain::{Params, TemplateError};

/// A rendered file and where it goes on the host.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RenderedConfig {
    pub template: String,
    pub params: Params,
    pub bytes: Vec<u8>,
    pub remote_path: String,
}

/// Renders named templates from a [`TemplateStore`].
pub struct ConfigRenderer<'a, S: TemplateStore> {
    store: &'a S,
}

impl<'a, S: TemplateStore> ConfigRenderer<'a, S> {
    #[must_use]
    pub fn new(store: &'a S) -> Self {
        Self { store }
    }

    /// Render `name` with `params`. Pure: identical arguments give identical
    /// bytes.
    ///
    /// # Errors
    ///
    /// Returns a [`TemplateError`] if the template is missing, not UTF-8, does
    /// not parse, or fails to render.
    pub fn render(&self, name: &str, params: &Params) -> Result<Vec<u8>> {
        let raw = self.store.open(name)?;
        let text = std::str::from_utf8(&raw).map_err(|e| TemplateError::Parse {
            name: name.to_string(),
            reason: e.to_string(),
        })?;

        let mut registry = Handlebars::new();
        registry.register_escape_fn(handlebars::no_escape);
        registry
            .register_template_string(name, text)
            .map_err(|e| TemplateError::Parse {
                name: name.to_string(),
                reason: e.to_string(),
            })?;
        let rendered = registry
            .render(name, params)
            .map_err(|e| TemplateError::Render {
                name: name.to_string(),
                reason: e.to_string(),
            })?;
        Ok(rendered.into_bytes())
    }

    /// Render `name` and bind the result to its destination on the host.
    ///
    /// # Errors
    ///
    /// See [`ConfigRenderer::render`].
    pub fn render_to(&self, name: &str, params: Params, remote_path: String) -> Result<RenderedConfig> {
        let bytes = self.render(name, &params)?;
        Ok(RenderedConfig {
            template: name.to_string(),
            params,
            bytes,
            remote_path,
        })
    }
}
