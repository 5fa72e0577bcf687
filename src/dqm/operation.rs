//! The closed set of DQM API operations.

use std::fmt;
use std::str::FromStr;

use serde::Serialize;

use crate::error::Error;

/// HTTP method used by an operation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum HttpMethod {
    Get,
    Post,
    Put,
    Delete,
}

impl HttpMethod {
    pub fn as_str(&self) -> &'static str {
        match self {
            HttpMethod::Get => "GET",
            HttpMethod::Post => "POST",
            HttpMethod::Put => "PUT",
            HttpMethod::Delete => "DELETE",
        }
    }
}

impl fmt::Display for HttpMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.pad(self.as_str())
    }
}

/// A Crownpeak DQM CMS API operation.
///
/// Each operation has a fixed method and a path template relative to the
/// credential's base URL. Placeholders in the template (`{assetId}`,
/// `{checkpointId}`, `{websiteId}`) are filled by the request builder.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "camelCase")]
pub enum Operation {
    ListAssets,
    ListWebsites,
    ListCheckpoints,
    GetWebsiteDetails,
    GetWebsiteCheckpoints,
    GetAssetDetails,
    GetAssetContent,
    GetAssetStatus,
    GetSpellcheckIssues,
    GetAssetErrorsByCheckpoint,
    GetAssetPageHighlights,
    GetCheckpointDetails,
    CreateAsset,
    UpdateAsset,
    DeleteAsset,
}

impl Operation {
    pub const ALL: [Operation; 15] = [
        Operation::ListAssets,
        Operation::ListWebsites,
        Operation::ListCheckpoints,
        Operation::GetWebsiteDetails,
        Operation::GetWebsiteCheckpoints,
        Operation::GetAssetDetails,
        Operation::GetAssetContent,
        Operation::GetAssetStatus,
        Operation::GetSpellcheckIssues,
        Operation::GetAssetErrorsByCheckpoint,
        Operation::GetAssetPageHighlights,
        Operation::GetCheckpointDetails,
        Operation::CreateAsset,
        Operation::UpdateAsset,
        Operation::DeleteAsset,
    ];

    /// The operation tag as it appears in node configuration.
    pub fn as_str(&self) -> &'static str {
        match self {
            Operation::ListAssets => "listAssets",
            Operation::ListWebsites => "listWebsites",
            Operation::ListCheckpoints => "listCheckpoints",
            Operation::GetWebsiteDetails => "getWebsiteDetails",
            Operation::GetWebsiteCheckpoints => "getWebsiteCheckpoints",
            Operation::GetAssetDetails => "getAssetDetails",
            Operation::GetAssetContent => "getAssetContent",
            Operation::GetAssetStatus => "getAssetStatus",
            Operation::GetSpellcheckIssues => "getSpellcheckIssues",
            Operation::GetAssetErrorsByCheckpoint => "getAssetErrorsByCheckpoint",
            Operation::GetAssetPageHighlights => "getAssetPageHighlights",
            Operation::GetCheckpointDetails => "getCheckpointDetails",
            Operation::CreateAsset => "createAsset",
            Operation::UpdateAsset => "updateAsset",
            Operation::DeleteAsset => "deleteAsset",
        }
    }

    pub fn method(&self) -> HttpMethod {
        match self {
            Operation::CreateAsset => HttpMethod::Post,
            Operation::UpdateAsset => HttpMethod::Put,
            Operation::DeleteAsset => HttpMethod::Delete,
            _ => HttpMethod::Get,
        }
    }

    pub fn path_template(&self) -> &'static str {
        match self {
            Operation::ListAssets | Operation::CreateAsset => "/assets",
            Operation::ListWebsites => "/websites",
            Operation::ListCheckpoints => "/checkpoints",
            Operation::GetWebsiteDetails => "/websites/{websiteId}",
            Operation::GetWebsiteCheckpoints => "/websites/{websiteId}/checkpoints",
            Operation::GetAssetDetails | Operation::UpdateAsset | Operation::DeleteAsset => {
                "/assets/{assetId}"
            }
            Operation::GetAssetContent => "/assets/{assetId}/content",
            Operation::GetAssetStatus => "/assets/{assetId}/status",
            Operation::GetSpellcheckIssues => "/assets/{assetId}/spellcheck",
            Operation::GetAssetErrorsByCheckpoint => "/assets/{assetId}/errors/{checkpointId}",
            Operation::GetAssetPageHighlights => "/assets/{assetId}/pagehighlight/all",
            Operation::GetCheckpointDetails => "/checkpoints/{checkpointId}",
        }
    }

    pub fn display_name(&self) -> &'static str {
        match self {
            Operation::ListAssets => "List Assets",
            Operation::ListWebsites => "List Websites",
            Operation::ListCheckpoints => "List Checkpoints",
            Operation::GetWebsiteDetails => "Get Website Details",
            Operation::GetWebsiteCheckpoints => "Get Website Checkpoints",
            Operation::GetAssetDetails => "Get Asset Details",
            Operation::GetAssetContent => "Get Asset Content",
            Operation::GetAssetStatus => "Get Asset Status",
            Operation::GetSpellcheckIssues => "Get Spellcheck Issues",
            Operation::GetAssetErrorsByCheckpoint => "Get Asset Errors by Checkpoint",
            Operation::GetAssetPageHighlights => "Get Asset Page Highlights",
            Operation::GetCheckpointDetails => "Get Checkpoint Details",
            Operation::CreateAsset => "Create Asset",
            Operation::UpdateAsset => "Update Asset",
            Operation::DeleteAsset => "Delete Asset",
        }
    }

    pub fn description(&self) -> &'static str {
        match self {
            Operation::ListAssets => "Retrieve all available assets for this website",
            Operation::ListWebsites => "Retrieve all available websites you have access to",
            Operation::ListCheckpoints => "Retrieve all available quality check checkpoints",
            Operation::GetWebsiteDetails => "Get detailed information for a specific website",
            Operation::GetWebsiteCheckpoints => {
                "Get all checkpoints available for a specific website"
            }
            Operation::GetAssetDetails => "Get detailed information for a specific asset",
            Operation::GetAssetContent => {
                "Get the actual content (HTML/text) for a specific asset"
            }
            Operation::GetAssetStatus => "Check the current quality status of an asset",
            Operation::GetSpellcheckIssues => "Fetch spelling issues identified in the asset",
            Operation::GetAssetErrorsByCheckpoint => {
                "Get asset content highlighting issues for a specific checkpoint"
            }
            Operation::GetAssetPageHighlights => {
                "Get asset content with all page highlightable issues (beta)"
            }
            Operation::GetCheckpointDetails => {
                "Get detailed information for a specific checkpoint"
            }
            Operation::CreateAsset => "Submit new content to be analyzed",
            Operation::UpdateAsset => "Update an existing content asset for processing",
            Operation::DeleteAsset => "Delete an existing asset",
        }
    }

    /// Whether the operation addresses a single asset.
    pub fn requires_asset_id(&self) -> bool {
        self.path_template().contains("{assetId}")
    }

    /// Whether the operation addresses a single checkpoint.
    pub fn requires_checkpoint_id(&self) -> bool {
        self.path_template().contains("{checkpointId}")
    }
}

impl fmt::Display for Operation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.pad(self.as_str())
    }
}

impl FromStr for Operation {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Operation::ALL
            .iter()
            .copied()
            .find(|op| op.as_str() == s)
            .ok_or_else(|| Error::UnsupportedOperation(s.to_string()))
    }
}
