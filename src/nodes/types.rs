//! Node trait and context types.

use std::collections::HashMap;

use async_trait::async_trait;
use serde_json::Value;

use crate::error::Result;

/// Result of node execution.
#[derive(Debug, Clone)]
pub struct NodeResult {
    /// Output data from the node
    pub data: Value,
    /// Metadata (timing, debug info, etc.)
    pub metadata: Value,
}

impl NodeResult {
    /// Create a new result with just data.
    pub fn new(data: Value) -> Self {
        Self {
            data,
            metadata: serde_json::json!({}),
        }
    }

    /// Create a result with data and metadata.
    pub fn with_metadata(data: Value, metadata: Value) -> Self {
        Self { data, metadata }
    }

    /// Get data as array if it is one.
    pub fn as_array(&self) -> Option<&Vec<Value>> {
        self.data.as_array()
    }
}

/// Context passed to a node during execution.
#[derive(Clone)]
pub struct NodeContext {
    /// Input data: an array is a batch of items, anything else one item
    pub input: Value,

    /// Resolved credentials, keyed by profile name (profile JSON as value)
    pub credentials: HashMap<String, String>,

    /// Execution ID
    pub execution_id: String,
}

impl std::fmt::Debug for NodeContext {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("NodeContext")
            .field("input", &self.input)
            .field("credentials", &self.credentials.keys().collect::<Vec<_>>())
            .field("execution_id", &self.execution_id)
            .finish()
    }
}

impl NodeContext {
    /// Create a new context.
    pub fn new(execution_id: &str) -> Self {
        Self {
            input: Value::Null,
            credentials: HashMap::new(),
            execution_id: execution_id.to_string(),
        }
    }

    /// Set the input data.
    pub fn with_input(mut self, input: Value) -> Self {
        self.input = input;
        self
    }

    /// Set resolved credentials.
    pub fn with_credentials(mut self, credentials: HashMap<String, String>) -> Self {
        self.credentials = credentials;
        self
    }

    /// Input as a list of items.
    ///
    /// `null` is a single empty item so parameterless operations still run once.
    pub fn items(&self) -> Vec<Value> {
        match &self.input {
            Value::Array(items) => items.clone(),
            Value::Null => vec![serde_json::json!({})],
            other => vec![other.clone()],
        }
    }
}

/// Trait that all node types must implement.
#[async_trait]
pub trait Node: Send + Sync {
    /// Get the node type name (e.g., "crownpeak").
    fn node_type(&self) -> &str;

    /// Execute the node with the given configuration and context.
    ///
    /// # Arguments
    /// * `config` - Node-specific configuration from the workflow definition
    /// * `ctx` - Execution context with input items and resolved credentials
    ///
    /// # Returns
    /// The node's output data wrapped in NodeResult
    async fn execute(&self, config: &Value, ctx: &NodeContext) -> Result<NodeResult>;

    /// Get a description of this node type.
    fn description(&self) -> &str {
        "A workflow node"
    }
}
