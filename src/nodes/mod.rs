//! Node implementations.
//!
//! Nodes are the building blocks of workflows. The `crownpeak` node calls the
//! Crownpeak DQM CMS API once per input item.

mod crownpeak;
mod registry;
mod types;

pub use crownpeak::CrownpeakNode;
pub use registry::NodeRegistry;
pub use types::{Node, NodeContext, NodeResult};
