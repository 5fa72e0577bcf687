//! Crownpeak node - call the Crownpeak DQM CMS API.

use std::sync::Arc;
use std::time::Instant;

use async_trait::async_trait;
use serde::Deserialize;
use serde_json::{json, Value};
use tracing::info;

use super::types::{Node, NodeContext, NodeResult};
use crate::config::DqmConfig;
use crate::dqm::{
    ContextCredentials, DispatchOptions, Dispatcher, HttpTransport, NodeParameters,
    ReqwestTransport,
};
use crate::error::{Error, Result};

/// Crownpeak DQM node.
///
/// Runs one API operation per input item, in order, and emits the responses
/// as a single array.
pub struct CrownpeakNode {
    transport: Arc<dyn HttpTransport>,
    config: DqmConfig,
}

impl CrownpeakNode {
    pub fn new(config: DqmConfig) -> Self {
        let transport = Arc::new(ReqwestTransport::new(&config));
        Self { transport, config }
    }

    pub fn with_transport(config: DqmConfig, transport: Arc<dyn HttpTransport>) -> Self {
        Self { transport, config }
    }
}

impl Default for CrownpeakNode {
    fn default() -> Self {
        Self::new(DqmConfig::default())
    }
}

/// Host-level settings. Operation parameters (`assetId`, `limit`, ...) are
/// read per item from the same config object.
#[derive(Debug, Deserialize)]
struct CrownpeakConfig {
    /// Operation tag or template (e.g. "listAssets"); read per item
    #[serde(default)]
    operation: Option<String>,

    /// Credential profile name
    #[serde(default)]
    credential: Option<String>,

    /// Record failed items as errors instead of failing the node
    #[serde(default)]
    continue_on_fail: bool,
}

#[async_trait]
impl Node for CrownpeakNode {
    fn node_type(&self) -> &str {
        "crownpeak"
    }

    fn description(&self) -> &str {
        "Manage assets, websites and quality checks in Crownpeak DQM"
    }

    async fn execute(&self, config: &Value, ctx: &NodeContext) -> Result<NodeResult> {
        let node_config: CrownpeakConfig = serde_json::from_value(config.clone())
            .map_err(|e| Error::Node(format!("Invalid crownpeak config: {}", e)))?;

        let profile = node_config
            .credential
            .unwrap_or_else(|| self.config.default_credential.clone());
        let options =
            DispatchOptions::new(profile).continue_on_fail(node_config.continue_on_fail);

        let items = ctx.items();
        let params = NodeParameters::new(config, &items);
        let credentials = ContextCredentials::new(&ctx.credentials);
        let dispatcher = Dispatcher::new(self.transport.as_ref(), &credentials, &self.config);

        let start = Instant::now();
        let responses = dispatcher.run(&params, &options).await?;
        let duration_ms = start.elapsed().as_millis() as u64;

        info!(
            execution_id = %ctx.execution_id,
            operation = node_config.operation.as_deref().unwrap_or_default(),
            items = responses.len(),
            duration_ms,
            "Crownpeak node completed"
        );

        Ok(NodeResult::with_metadata(
            json!(responses),
            json!({
                "operation": node_config.operation,
                "items": items.len(),
                "duration_ms": duration_ms,
            }),
        ))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dqm::RequestDescriptor;
    use std::collections::HashMap;
    use std::sync::Mutex;

    #[derive(Default)]
    struct FakeTransport {
        urls: Mutex<Vec<String>>,
    }

    #[async_trait]
    impl HttpTransport for FakeTransport {
        async fn execute(&self, request: &RequestDescriptor) -> Result<Value> {
            self.urls.lock().unwrap().push(request.url.clone());
            if request.url.contains("/assets/missing") {
                return Err(Error::Api {
                    status: 404,
                    body: r#"{"message":"not found"}"#.to_string(),
                });
            }
            Ok(json!({"ok": true, "method": request.method.as_str()}))
        }
    }

    fn context(input: Value) -> NodeContext {
        let mut credentials = HashMap::new();
        credentials.insert(
            "crownpeak".to_string(),
            r#"{"apiKey":"k","websiteId":"w","baseUrl":"https://api.example.com"}"#.to_string(),
        );
        NodeContext::new("exec-1")
            .with_input(input)
            .with_credentials(credentials)
    }

    fn node(transport: Arc<FakeTransport>) -> CrownpeakNode {
        CrownpeakNode::with_transport(DqmConfig::default(), transport)
    }

    #[test]
    fn test_node_type() {
        let node = CrownpeakNode::default();
        assert_eq!(node.node_type(), "crownpeak");
    }

    #[tokio::test]
    async fn test_single_item_input() {
        let transport = Arc::new(FakeTransport::default());
        let result = node(transport.clone())
            .execute(
                &json!({"operation": "listAssets", "limit": 50}),
                &context(Value::Null),
            )
            .await
            .unwrap();

        assert_eq!(result.as_array().unwrap().len(), 1);
        assert_eq!(result.metadata["operation"], "listAssets");
        assert_eq!(result.metadata["items"], 1);
        assert_eq!(
            transport.urls.lock().unwrap()[0],
            "https://api.example.com/assets?apiKey=k&websiteId=w&limit=50"
        );
    }

    #[tokio::test]
    async fn test_batch_input_renders_templates() {
        let transport = Arc::new(FakeTransport::default());
        let config = json!({
            "operation": "getAssetErrorsByCheckpoint",
            "assetId": "{{ input.asset }}",
            "checkpointId": "{{ input.checkpoint }}"
        });
        let input = json!([
            {"asset": "A1", "checkpoint": "C1"},
            {"asset": "A 2", "checkpoint": "C/2"}
        ]);

        let result = node(transport.clone())
            .execute(&config, &context(input))
            .await
            .unwrap();

        assert_eq!(result.as_array().unwrap().len(), 2);
        let urls = transport.urls.lock().unwrap();
        assert_eq!(
            urls[0],
            "https://api.example.com/assets/A1/errors/C1?apiKey=k&websiteId=w"
        );
        assert_eq!(
            urls[1],
            "https://api.example.com/assets/A%202/errors/C%2F2?apiKey=k&websiteId=w"
        );
    }

    #[tokio::test]
    async fn test_missing_credential_profile() {
        let transport = Arc::new(FakeTransport::default());
        let err = node(transport.clone())
            .execute(
                &json!({"operation": "listWebsites", "credential": "other"}),
                &context(Value::Null),
            )
            .await
            .unwrap_err();

        assert_eq!(err.code(), "CREDENTIAL_ERROR");
        assert!(transport.urls.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_api_error_fails_node() {
        let transport = Arc::new(FakeTransport::default());
        let err = node(transport)
            .execute(
                &json!({"operation": "getAssetDetails", "assetId": "missing"}),
                &context(Value::Null),
            )
            .await
            .unwrap_err();

        assert!(matches!(err, Error::Api { status: 404, .. }));
    }

    #[tokio::test]
    async fn test_continue_on_fail() {
        let transport = Arc::new(FakeTransport::default());
        let config = json!({
            "operation": "getAssetDetails",
            "assetId": "{{ input.id }}",
            "continue_on_fail": true
        });
        let input = json!([{"id": "missing"}, {"id": "A2"}]);

        let result = node(transport)
            .execute(&config, &context(input))
            .await
            .unwrap();

        let responses = result.as_array().unwrap();
        assert_eq!(responses[0]["error"]["status"], 404);
        assert_eq!(responses[1]["ok"], true);
    }

    #[tokio::test]
    async fn test_missing_operation() {
        let transport = Arc::new(FakeTransport::default());
        let err = node(transport.clone())
            .execute(&json!({"assetId": "A1"}), &context(Value::Null))
            .await
            .unwrap_err();
        match err {
            Error::MissingParameter { field, .. } => assert_eq!(field, "operation"),
            other => panic!("expected missing parameter, got {:?}", other),
        }
        assert!(transport.urls.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_invalid_config() {
        let transport = Arc::new(FakeTransport::default());
        let err = node(transport)
            .execute(&json!({"operation": 5}), &context(Value::Null))
            .await
            .unwrap_err();
        assert_eq!(err.code(), "NODE_ERROR");
    }
}
