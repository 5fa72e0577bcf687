//! Node registry - manages available node types.

use std::collections::HashMap;
use std::sync::Arc;

use serde_json::Value;

use super::types::{Node, NodeContext, NodeResult};
use super::CrownpeakNode;
use crate::config::DqmConfig;
use crate::error::{Error, Result};

/// Registry of available node types.
#[derive(Clone)]
pub struct NodeRegistry {
    nodes: HashMap<String, Arc<dyn Node>>,
}

impl NodeRegistry {
    /// Create a new registry with default nodes.
    pub fn new() -> Self {
        Self::with_config(DqmConfig::default())
    }

    /// Create a registry whose built-in nodes use `config`.
    pub fn with_config(config: DqmConfig) -> Self {
        let mut registry = Self::empty();
        registry.register(Arc::new(CrownpeakNode::new(config)));
        registry
    }

    /// Create an empty registry (for testing).
    pub fn empty() -> Self {
        Self {
            nodes: HashMap::new(),
        }
    }

    /// Register a node type.
    pub fn register(&mut self, node: Arc<dyn Node>) {
        self.nodes.insert(node.node_type().to_string(), node);
    }

    /// Get a node by type name.
    pub fn get(&self, node_type: &str) -> Option<Arc<dyn Node>> {
        self.nodes.get(node_type).cloned()
    }

    /// Check if a node type is registered.
    pub fn has(&self, node_type: &str) -> bool {
        self.nodes.contains_key(node_type)
    }

    /// Execute a node by type.
    pub async fn execute(
        &self,
        node_type: &str,
        config: &Value,
        ctx: &NodeContext,
    ) -> Result<NodeResult> {
        let node = self
            .get(node_type)
            .ok_or_else(|| Error::Node(format!("Unknown node type: {}", node_type)))?;

        node.execute(config, ctx).await
    }

    /// List all registered node types.
    pub fn list(&self) -> Vec<&str> {
        self.nodes.keys().map(|s| s.as_str()).collect()
    }

    /// Get descriptions of all registered nodes.
    pub fn descriptions(&self) -> Vec<(&str, &str)> {
        self.nodes
            .iter()
            .map(|(name, node)| (name.as_str(), node.description()))
            .collect()
    }
}

impl Default for NodeRegistry {
    fn default() -> Self {
        Self::new()
    }
}
