//! What every deployment phase needs to know about the run.

use deploy_common::{Product, Topology};

use crate::application::services::fan_out::FanOut;
use crate::domain::RemoteLayout;

/// The topology being deployed, the product's remote layout, and how hosts
/// are fanned out.
#[derive(Debug, Clone, Copy)]
pub struct Deployment<'a> {
    pub topology: &'a Topology,
    pub layout: RemoteLayout,
    pub fan_out: FanOut<'a>,
}

impl<'a> Deployment<'a> {
    #[must_use]
    pub fn new(topology: &'a Topology, product: Product, fan_out: FanOut<'a>) -> Self {
        Self {
            topology,
            layout: RemoteLayout::new(product),
            fan_out,
        }
    }

    #[must_use]
    pub fn product(&self) -> Product {
        self.layout.product()
    }
}
