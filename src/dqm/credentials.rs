//! DQM credential profile and the providers that supply it.

use std::collections::HashMap;
use std::fmt;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};

/// Production endpoint of the DQM CMS API.
pub const DEFAULT_BASE_URL: &str = "https://api.crownpeak.net/dqm-cms/v1";

/// The credential tuple every DQM request is built from.
///
/// Stored as `{"apiKey": ..., "websiteId": ..., "baseUrl": ...}`.
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DqmCredentials {
    pub api_key: String,
    #[serde(default)]
    pub website_id: String,
    #[serde(default = "default_base_url")]
    pub base_url: String,
}

fn default_base_url() -> String {
    DEFAULT_BASE_URL.to_string()
}

impl fmt::Debug for DqmCredentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DqmCredentials")
            .field("api_key", &"[REDACTED]")
            .field("website_id", &self.website_id)
            .field("base_url", &self.base_url)
            .finish()
    }
}

impl DqmCredentials {
    pub fn new(
        api_key: impl Into<String>,
        website_id: impl Into<String>,
        base_url: impl Into<String>,
    ) -> Self {
        Self {
            api_key: api_key.into(),
            website_id: website_id.into(),
            base_url: base_url.into(),
        }
    }

    /// Parse a stored profile and check it is usable.
    pub fn from_json(raw: &str) -> Result<Self> {
        let credentials: Self = serde_json::from_str(raw)
            .map_err(|e| Error::Credential(format!("Invalid DQM credential profile: {}", e)))?;
        credentials.validate()?;
        Ok(credentials)
    }

    pub fn validate(&self) -> Result<()> {
        if self.api_key.trim().is_empty() {
            return Err(Error::Credential("DQM API key is empty".to_string()));
        }
        if self.base_url.trim().is_empty() {
            return Err(Error::Credential("DQM base URL is empty".to_string()));
        }
        Ok(())
    }

    /// Base URL without a trailing slash.
    pub fn base_url(&self) -> &str {
        self.base_url.trim_end_matches('/')
    }
}

/// Supplies credentials for a named profile.
///
/// Implementations are read-only; profiles are validated on the way out.
#[async_trait]
pub trait CredentialProvider: Send + Sync {
    async fn credentials(&self, profile: &str) -> Result<DqmCredentials>;
}

/// A single fixed profile, returned whatever name is asked for.
#[derive(Debug, Clone)]
pub struct StaticCredentials(DqmCredentials);

impl StaticCredentials {
    pub fn new(credentials: DqmCredentials) -> Self {
        Self(credentials)
    }
}

#[async_trait]
impl CredentialProvider for StaticCredentials {
    async fn credentials(&self, _profile: &str) -> Result<DqmCredentials> {
        self.0.validate()?;
        Ok(self.0.clone())
    }
}

/// Credentials already resolved by the workflow executor, keyed by profile
/// name with the profile JSON as value.
pub struct ContextCredentials<'a>(&'a HashMap<String, String>);

impl<'a> ContextCredentials<'a> {
    pub fn new(resolved: &'a HashMap<String, String>) -> Self {
        Self(resolved)
    }
}

#[async_trait]
impl CredentialProvider for ContextCredentials<'_> {
    async fn credentials(&self, profile: &str) -> Result<DqmCredentials> {
        let raw = self.0.get(profile).ok_or_else(|| {
            Error::Credential(format!(
                "Credential '{}' not found. Add it with: crownpeak-dqm credentials set {}",
                profile, profile
            ))
        })?;
        DqmCredentials::from_json(raw)
    }
}
