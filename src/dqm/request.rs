//! Typed per-operation requests.
//!
//! Parameters are read once per item into a [`DqmCall`] variant that carries
//! exactly the fields its operation needs. A request that exists is complete:
//! required identifiers are non-empty and `limit` is at least 1.

use crate::config::DqmConfig;
use crate::error::{Error, Result};

use super::operation::Operation;
use super::parameters::ParameterReader;

/// One operation call with its validated arguments.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DqmCall {
    ListAssets { limit: u32 },
    ListWebsites,
    ListCheckpoints,
    GetWebsiteDetails,
    GetWebsiteCheckpoints,
    GetAssetDetails { asset_id: String },
    GetAssetContent { asset_id: String },
    GetAssetStatus { asset_id: String },
    GetSpellcheckIssues { asset_id: String },
    GetAssetErrorsByCheckpoint { asset_id: String, checkpoint_id: String },
    GetAssetPageHighlights { asset_id: String },
    GetCheckpointDetails { checkpoint_id: String },
    CreateAsset { content: String, content_type: String },
    UpdateAsset { asset_id: String, content: String },
    DeleteAsset { asset_id: String },
}

impl DqmCall {
    pub fn operation(&self) -> Operation {
        match self {
            DqmCall::ListAssets { .. } => Operation::ListAssets,
            DqmCall::ListWebsites => Operation::ListWebsites,
            DqmCall::ListCheckpoints => Operation::ListCheckpoints,
            DqmCall::GetWebsiteDetails => Operation::GetWebsiteDetails,
            DqmCall::GetWebsiteCheckpoints => Operation::GetWebsiteCheckpoints,
            DqmCall::GetAssetDetails { .. } => Operation::GetAssetDetails,
            DqmCall::GetAssetContent { .. } => Operation::GetAssetContent,
            DqmCall::GetAssetStatus { .. } => Operation::GetAssetStatus,
            DqmCall::GetSpellcheckIssues { .. } => Operation::GetSpellcheckIssues,
            DqmCall::GetAssetErrorsByCheckpoint { .. } => Operation::GetAssetErrorsByCheckpoint,
            DqmCall::GetAssetPageHighlights { .. } => Operation::GetAssetPageHighlights,
            DqmCall::GetCheckpointDetails { .. } => Operation::GetCheckpointDetails,
            DqmCall::CreateAsset { .. } => Operation::CreateAsset,
            DqmCall::UpdateAsset { .. } => Operation::UpdateAsset,
            DqmCall::DeleteAsset { .. } => Operation::DeleteAsset,
        }
    }

    pub fn asset_id(&self) -> Option<&str> {
        match self {
            DqmCall::GetAssetDetails { asset_id }
            | DqmCall::GetAssetContent { asset_id }
            | DqmCall::GetAssetStatus { asset_id }
            | DqmCall::GetSpellcheckIssues { asset_id }
            | DqmCall::GetAssetErrorsByCheckpoint { asset_id, .. }
            | DqmCall::GetAssetPageHighlights { asset_id }
            | DqmCall::UpdateAsset { asset_id, .. }
            | DqmCall::DeleteAsset { asset_id } => Some(asset_id),
            _ => None,
        }
    }

    pub fn checkpoint_id(&self) -> Option<&str> {
        match self {
            DqmCall::GetAssetErrorsByCheckpoint { checkpoint_id, .. }
            | DqmCall::GetCheckpointDetails { checkpoint_id } => Some(checkpoint_id),
            _ => None,
        }
    }
}

/// A call plus the optional per-item website override.
///
/// When `website_id` is `None` the credential's website ID is used.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DqmRequest {
    pub call: DqmCall,
    pub website_id: Option<String>,
}

impl DqmRequest {
    pub fn operation(&self) -> Operation {
        self.call.operation()
    }

    /// Read and validate the parameters `operation` needs for item `item`.
    pub fn read(
        operation: Operation,
        params: &dyn ParameterReader,
        item: usize,
        config: &DqmConfig,
    ) -> Result<Self> {
        let required = |field: &str| -> Result<String> {
            params
                .string(field, item)
                .filter(|v| !v.trim().is_empty())
                .ok_or_else(|| Error::missing(operation.as_str(), field))
        };

        let call = match operation {
            Operation::ListAssets => DqmCall::ListAssets {
                limit: read_limit(params, item, config)?,
            },
            Operation::ListWebsites => DqmCall::ListWebsites,
            Operation::ListCheckpoints => DqmCall::ListCheckpoints,
            Operation::GetWebsiteDetails => DqmCall::GetWebsiteDetails,
            Operation::GetWebsiteCheckpoints => DqmCall::GetWebsiteCheckpoints,
            Operation::GetAssetDetails => DqmCall::GetAssetDetails {
                asset_id: required("assetId")?,
            },
            Operation::GetAssetContent => DqmCall::GetAssetContent {
                asset_id: required("assetId")?,
            },
            Operation::GetAssetStatus => DqmCall::GetAssetStatus {
                asset_id: required("assetId")?,
            },
            Operation::GetSpellcheckIssues => DqmCall::GetSpellcheckIssues {
                asset_id: required("assetId")?,
            },
            Operation::GetAssetErrorsByCheckpoint => DqmCall::GetAssetErrorsByCheckpoint {
                asset_id: required("assetId")?,
                checkpoint_id: required("checkpointId")?,
            },
            Operation::GetAssetPageHighlights => DqmCall::GetAssetPageHighlights {
                asset_id: required("assetId")?,
            },
            Operation::GetCheckpointDetails => DqmCall::GetCheckpointDetails {
                checkpoint_id: required("checkpointId")?,
            },
            Operation::CreateAsset => DqmCall::CreateAsset {
                content: required("content")?,
                content_type: params
                    .string("contentType", item)
                    .filter(|v| !v.trim().is_empty())
                    .unwrap_or_else(|| config.default_content_type.clone()),
            },
            Operation::UpdateAsset => DqmCall::UpdateAsset {
                asset_id: required("assetId")?,
                content: required("content")?,
            },
            Operation::DeleteAsset => DqmCall::DeleteAsset {
                asset_id: required("assetId")?,
            },
        };

        let website_id = params
            .string("websiteId", item)
            .filter(|v| !v.trim().is_empty());

        Ok(Self { call, website_id })
    }
}

fn read_limit(params: &dyn ParameterReader, item: usize, config: &DqmConfig) -> Result<u32> {
    match params.integer("limit", item)? {
        None => Ok(config.default_limit.max(1)),
        Some(limit) if limit < 1 => Err(Error::invalid(
            "limit",
            format!("must be at least 1, got {}", limit),
        )),
        Some(limit) => u32::try_from(limit)
            .map_err(|_| Error::invalid("limit", format!("{} is too large", limit))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn read(op: Operation, params: serde_json::Value) -> Result<DqmRequest> {
        DqmRequest::read(op, &params, 0, &DqmConfig::default())
    }

    #[test]
    fn test_asset_operations_require_asset_id() {
        for op in Operation::ALL.iter().filter(|op| op.requires_asset_id()) {
            let params = json!({"checkpointId": "C1", "content": "x"});
            let err = read(*op, params).unwrap_err();
            match err {
                Error::MissingParameter { field, operation } => {
                    assert_eq!(field, "assetId");
                    assert_eq!(operation, op.as_str());
                }
                other => panic!("expected missing parameter, got {:?}", other),
            }
        }
    }

    #[test]
    fn test_empty_asset_id_is_missing() {
        let err = read(Operation::DeleteAsset, json!({"assetId": "  "})).unwrap_err();
        assert_eq!(err.code(), "MISSING_PARAMETER");
    }

    #[test]
    fn test_checkpoint_operations_require_checkpoint_id() {
        let ops: Vec<Operation> = Operation::ALL
            .iter()
            .copied()
            .filter(|op| op.requires_checkpoint_id())
            .collect();
        assert_eq!(
            ops,
            vec![
                Operation::GetAssetErrorsByCheckpoint,
                Operation::GetCheckpointDetails
            ]
        );

        for op in ops {
            match read(op, json!({"assetId": "A1"})).unwrap_err() {
                Error::MissingParameter { field, operation } => {
                    assert_eq!(field, "checkpointId");
                    assert_eq!(operation, op.as_str());
                }
                other => panic!("expected missing parameter, got {:?}", other),
            }
        }
    }

    #[test]
    fn test_checkpoint_required() {
        let err = read(Operation::GetCheckpointDetails, json!({})).unwrap_err();
        assert!(err.to_string().contains("checkpointId"));

        let err = read(Operation::GetAssetErrorsByCheckpoint, json!({"assetId": "A1"}))
            .unwrap_err();
        assert!(err.to_string().contains("checkpointId"));
    }

    #[test]
    fn test_limit_default_and_bounds() {
        let request = read(Operation::ListAssets, json!({})).unwrap();
        assert_eq!(request.call, DqmCall::ListAssets { limit: 20 });

        let request = read(Operation::ListAssets, json!({"limit": 50})).unwrap();
        assert_eq!(request.call, DqmCall::ListAssets { limit: 50 });

        let err = read(Operation::ListAssets, json!({"limit": 0})).unwrap_err();
        assert_eq!(err.code(), "INVALID_PARAMETER");
        assert!(read(Operation::ListAssets, json!({"limit": -5})).is_err());
    }

    #[test]
    fn test_create_asset_content_type_default() {
        let request = read(Operation::CreateAsset, json!({"content": "<p>hi</p>"})).unwrap();
        assert_eq!(
            request.call,
            DqmCall::CreateAsset {
                content: "<p>hi</p>".to_string(),
                content_type: "text/html; charset=UTF-8".to_string(),
            }
        );

        let err = read(Operation::CreateAsset, json!({})).unwrap_err();
        assert!(err.to_string().contains("content"));
    }

    #[test]
    fn test_website_override() {
        let request = read(Operation::GetWebsiteDetails, json!({"websiteId": "site-2"})).unwrap();
        assert_eq!(request.website_id.as_deref(), Some("site-2"));

        let request = read(Operation::GetWebsiteDetails, json!({"websiteId": ""})).unwrap();
        assert_eq!(request.website_id, None);
    }

    #[test]
    fn test_call_accessors() {
        let call = DqmCall::GetAssetErrorsByCheckpoint {
            asset_id: "A1".into(),
            checkpoint_id: "C9".into(),
        };
        assert_eq!(call.asset_id(), Some("A1"));
        assert_eq!(call.checkpoint_id(), Some("C9"));
        assert_eq!(call.operation(), Operation::GetAssetErrorsByCheckpoint);
        assert_eq!(DqmCall::ListWebsites.asset_id(), None);
    }
}
