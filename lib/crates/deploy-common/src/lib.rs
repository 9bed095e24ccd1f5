pub mod product;
pub mod topology;

pub use product::Product;
pub use topology::{Host, Member, Role, Topology, TopologyError};
