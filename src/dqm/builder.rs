//! Request construction: typed request + credentials -> wire request.

use std::fmt;

use serde_json::Value;

use crate::config::DqmConfig;
use crate::error::{Error, Result};

use super::credentials::DqmCredentials;
use super::operation::{HttpMethod, Operation};
use super::parameters::ParameterReader;
use super::request::{DqmCall, DqmRequest};

pub const API_KEY_HEADER: &str = "x-api-key";
pub const FORM_CONTENT_TYPE: &str = "application/x-www-form-urlencoded";

/// A fully determined outbound call.
#[derive(Clone, PartialEq, Eq)]
pub struct RequestDescriptor {
    pub method: HttpMethod,
    pub url: String,
    pub headers: Vec<(String, String)>,
    pub body: Option<String>,
}

impl RequestDescriptor {
    /// Case-insensitive header lookup.
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers
            .iter()
            .find(|(k, _)| k.eq_ignore_ascii_case(name))
            .map(|(_, v)| v.as_str())
    }

    /// URL with the `apiKey` query value masked, for logs.
    pub fn redacted_url(&self) -> String {
        let Some((path, query)) = self.url.split_once('?') else {
            return self.url.clone();
        };
        let query = query
            .split('&')
            .map(|pair| {
                if pair.starts_with("apiKey=") {
                    "apiKey=[REDACTED]"
                } else {
                    pair
                }
            })
            .collect::<Vec<_>>()
            .join("&");
        format!("{}?{}", path, query)
    }
}

impl fmt::Debug for RequestDescriptor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let headers: Vec<(&str, &str)> = self
            .headers
            .iter()
            .map(|(k, v)| {
                if k.eq_ignore_ascii_case(API_KEY_HEADER) {
                    (k.as_str(), "[REDACTED]")
                } else {
                    (k.as_str(), v.as_str())
                }
            })
            .collect();
        f.debug_struct("RequestDescriptor")
            .field("method", &self.method)
            .field("url", &self.redacted_url())
            .field("headers", &headers)
            .field("body", &self.body)
            .finish()
    }
}

/// Build a request from an operation tag and plain JSON parameters, using
/// default configuration.
pub fn build(operation: &str, params: &Value, credentials: &DqmCredentials) -> Result<RequestDescriptor> {
    build_with_config(operation, params, credentials, &DqmConfig::default())
}

pub fn build_with_config(
    operation: &str,
    params: &dyn ParameterReader,
    credentials: &DqmCredentials,
    config: &DqmConfig,
) -> Result<RequestDescriptor> {
    let operation: Operation = operation.parse()?;
    let request = DqmRequest::read(operation, params, 0, config)?;
    build_request(&request, credentials)
}

/// Turn a validated request into the wire request.
///
/// Query parameters follow a fixed order per operation: `apiKey`, then
/// `websiteId`, then `limit`.
pub fn build_request(request: &DqmRequest, credentials: &DqmCredentials) -> Result<RequestDescriptor> {
    let operation = request.operation();
    let api_key = credentials.api_key.as_str();

    let website_id = || resolve_website(request, credentials);

    let path = expand_path(operation, |placeholder| match placeholder {
        "assetId" => request
            .call
            .asset_id()
            .ok_or_else(|| Error::missing(operation.as_str(), "assetId")),
        "checkpointId" => request
            .call
            .checkpoint_id()
            .ok_or_else(|| Error::missing(operation.as_str(), "checkpointId")),
        "websiteId" => website_id(),
        other => Err(Error::Node(format!("Unknown path placeholder '{}'", other))),
    })?;

    let mut query: Vec<(&str, String)> = vec![("apiKey", api_key.to_string())];
    let mut form: Option<Vec<(&str, String)>> = None;

    match &request.call {
        DqmCall::ListAssets { limit } => {
            query.push(("websiteId", website_id()?.to_string()));
            query.push(("limit", limit.to_string()));
        }
        DqmCall::ListWebsites
        | DqmCall::ListCheckpoints
        | DqmCall::GetWebsiteDetails
        | DqmCall::GetWebsiteCheckpoints
        | DqmCall::GetCheckpointDetails { .. } => {}
        DqmCall::GetAssetDetails { .. }
        | DqmCall::GetAssetContent { .. }
        | DqmCall::GetAssetStatus { .. }
        | DqmCall::GetSpellcheckIssues { .. }
        | DqmCall::GetAssetErrorsByCheckpoint { .. }
        | DqmCall::GetAssetPageHighlights { .. }
        | DqmCall::DeleteAsset { .. } => {
            query.push(("websiteId", website_id()?.to_string()));
        }
        DqmCall::CreateAsset {
            content,
            content_type,
        } => {
            form = Some(vec![
                ("websiteId", website_id()?.to_string()),
                ("content", content.clone()),
                ("contentType", content_type.clone()),
            ]);
        }
        DqmCall::UpdateAsset { content, .. } => {
            form = Some(vec![
                ("websiteId", website_id()?.to_string()),
                ("content", content.clone()),
            ]);
        }
    }

    let url = format!("{}{}?{}", credentials.base_url(), path, encode_pairs(&query));

    let mut headers = vec![(API_KEY_HEADER.to_string(), api_key.to_string())];
    let body = form.map(|pairs| {
        headers.push(("Content-Type".to_string(), FORM_CONTENT_TYPE.to_string()));
        encode_pairs(&pairs)
    });

    Ok(RequestDescriptor {
        method: operation.method(),
        url,
        headers,
        body,
    })
}

/// The per-item override wins over the credential's website ID.
fn resolve_website<'a>(request: &'a DqmRequest, credentials: &'a DqmCredentials) -> Result<&'a str> {
    request
        .website_id
        .as_deref()
        .filter(|w| !w.trim().is_empty())
        .or_else(|| Some(credentials.website_id.as_str()).filter(|w| !w.trim().is_empty()))
        .ok_or_else(|| Error::missing(request.operation().as_str(), "websiteId"))
}

/// Fill `{placeholder}` segments of the operation's path template with
/// percent-encoded values.
fn expand_path<'a, F>(operation: Operation, mut resolve: F) -> Result<String>
where
    F: FnMut(&str) -> Result<&'a str>,
{
    let mut path = String::new();
    for segment in operation.path_template().split('/').filter(|s| !s.is_empty()) {
        path.push('/');
        match segment.strip_prefix('{').and_then(|s| s.strip_suffix('}')) {
            Some(placeholder) => path.push_str(&urlencoding::encode(resolve(placeholder)?)),
            None => path.push_str(segment),
        }
    }
    Ok(path)
}

fn encode_pairs(pairs: &[(&str, String)]) -> String {
    pairs
        .iter()
        .map(|(k, v)| format!("{}={}", k, urlencoding::encode(v)))
        .collect::<Vec<_>>()
        .join("&")
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn creds() -> DqmCredentials {
        DqmCredentials::new("k", "w", "https://api.example.com")
    }

    fn full_params() -> Value {
        json!({
            "assetId": "A1",
            "checkpointId": "C1",
            "content": "body",
            "contentType": "text/plain",
        })
    }

    fn decode_pairs(encoded: &str) -> Vec<(String, String)> {
        encoded
            .split('&')
            .map(|pair| {
                let (k, v) = pair.split_once('=').unwrap();
                (k.to_string(), urlencoding::decode(v).unwrap().into_owned())
            })
            .collect()
    }

    #[test]
    fn test_create_asset_example() {
        let request = build(
            "createAsset",
            &json!({"content": "<p>hi</p>", "contentType": "text/html"}),
            &creds(),
        )
        .unwrap();

        assert_eq!(request.method, HttpMethod::Post);
        assert_eq!(request.url, "https://api.example.com/assets?apiKey=k");
        assert_eq!(request.header("content-type"), Some(FORM_CONTENT_TYPE));
        assert_eq!(request.header("x-api-key"), Some("k"));
        assert_eq!(
            request.body.as_deref(),
            Some("websiteId=w&content=%3Cp%3Ehi%3C%2Fp%3E&contentType=text%2Fhtml")
        );
    }

    #[test]
    fn test_list_assets_example() {
        let request = build("listAssets", &json!({"limit": 50}), &creds()).unwrap();
        assert_eq!(request.method, HttpMethod::Get);
        assert_eq!(
            request.url,
            "https://api.example.com/assets?apiKey=k&websiteId=w&limit=50"
        );
        assert_eq!(request.body, None);
        assert_eq!(request.header("content-type"), None);
    }

    #[test]
    fn test_every_operation_url_and_method() {
        let expected = [
            ("listAssets", "GET", "/assets?apiKey=k&websiteId=w&limit=20"),
            ("listWebsites", "GET", "/websites?apiKey=k"),
            ("listCheckpoints", "GET", "/checkpoints?apiKey=k"),
            ("getWebsiteDetails", "GET", "/websites/w?apiKey=k"),
            ("getWebsiteCheckpoints", "GET", "/websites/w/checkpoints?apiKey=k"),
            ("getAssetDetails", "GET", "/assets/A1?apiKey=k&websiteId=w"),
            ("getAssetContent", "GET", "/assets/A1/content?apiKey=k&websiteId=w"),
            ("getAssetStatus", "GET", "/assets/A1/status?apiKey=k&websiteId=w"),
            ("getSpellcheckIssues", "GET", "/assets/A1/spellcheck?apiKey=k&websiteId=w"),
            (
                "getAssetErrorsByCheckpoint",
                "GET",
                "/assets/A1/errors/C1?apiKey=k&websiteId=w",
            ),
            (
                "getAssetPageHighlights",
                "GET",
                "/assets/A1/pagehighlight/all?apiKey=k&websiteId=w",
            ),
            ("getCheckpointDetails", "GET", "/checkpoints/C1?apiKey=k"),
            ("createAsset", "POST", "/assets?apiKey=k"),
            ("updateAsset", "PUT", "/assets/A1?apiKey=k"),
            ("deleteAsset", "DELETE", "/assets/A1?apiKey=k&websiteId=w"),
        ];
        assert_eq!(expected.len(), Operation::ALL.len());

        for (op, method, path) in expected {
            let request = build(op, &full_params(), &creds()).unwrap();
            assert_eq!(request.method.as_str(), method, "method for {}", op);
            assert_eq!(
                request.url,
                format!("https://api.example.com{}", path),
                "url for {}",
                op
            );
            assert_eq!(request.header(API_KEY_HEADER), Some("k"));
            assert_eq!(
                request.body.is_some(),
                matches!(op, "createAsset" | "updateAsset"),
                "body presence for {}",
                op
            );
        }
    }

    #[test]
    fn test_update_asset_body() {
        let request = build("updateAsset", &full_params(), &creds()).unwrap();
        assert_eq!(request.body.as_deref(), Some("websiteId=w&content=body"));
        assert_eq!(request.header("Content-Type"), Some(FORM_CONTENT_TYPE));
    }

    #[test]
    fn test_unsupported_operation() {
        let err = build("unsupportedOp", &json!({}), &creds()).unwrap_err();
        assert!(matches!(err, Error::UnsupportedOperation(ref op) if op == "unsupportedOp"));
    }

    #[test]
    fn test_missing_asset_id_produces_no_request() {
        for op in ["getAssetDetails", "updateAsset", "deleteAsset", "getAssetPageHighlights"] {
            let err = build(op, &json!({"content": "x", "checkpointId": "C1"}), &creds())
                .unwrap_err();
            assert_eq!(err.code(), "MISSING_PARAMETER", "{}", op);
        }
    }

    #[test]
    fn test_encoding_is_reversible() {
        let content = "a&b=c / d ünïcödé 日本 100%";
        let request = build(
            "createAsset",
            &json!({"content": content, "contentType": "text/x; q=1&r=2"}),
            &DqmCredentials::new("k&=", "w/1", "https://api.example.com"),
        )
        .unwrap();

        let body = decode_pairs(request.body.as_deref().unwrap());
        assert_eq!(
            body,
            vec![
                ("websiteId".to_string(), "w/1".to_string()),
                ("content".to_string(), content.to_string()),
                ("contentType".to_string(), "text/x; q=1&r=2".to_string()),
            ]
        );

        let (_, query) = request.url.split_once('?').unwrap();
        assert_eq!(
            decode_pairs(query),
            vec![("apiKey".to_string(), "k&=".to_string())]
        );
    }

    #[test]
    fn test_query_website_override_is_reversible() {
        let website = "site & co=1/2 ünï 日本";
        for op in ["listAssets", "getAssetDetails"] {
            let request = build(
                op,
                &json!({"assetId": "A1", "websiteId": website}),
                &creds(),
            )
            .unwrap();

            let (_, query) = request.url.split_once('?').unwrap();
            let pairs = decode_pairs(query);
            assert_eq!(pairs[0], ("apiKey".to_string(), "k".to_string()));
            assert_eq!(pairs[1], ("websiteId".to_string(), website.to_string()), "{}", op);
        }
    }

    #[test]
    fn test_empty_limit_uses_default() {
        let request = build("listAssets", &json!({"limit": ""}), &creds()).unwrap();
        assert_eq!(
            request.url,
            "https://api.example.com/assets?apiKey=k&websiteId=w&limit=20"
        );
    }

    #[test]
    fn test_path_segments_are_encoded() {
        let request = build(
            "getAssetErrorsByCheckpoint",
            &json!({"assetId": "a/b?c", "checkpointId": "c d"}),
            &creds(),
        )
        .unwrap();
        assert_eq!(
            request.url,
            "https://api.example.com/assets/a%2Fb%3Fc/errors/c%20d?apiKey=k&websiteId=w"
        );
    }

    #[test]
    fn test_website_override_and_missing_website() {
        let request = build("getWebsiteDetails", &json!({"websiteId": "other"}), &creds()).unwrap();
        assert_eq!(request.url, "https://api.example.com/websites/other?apiKey=k");

        let no_site = DqmCredentials::new("k", "", "https://api.example.com");
        let err = build("listAssets", &json!({}), &no_site).unwrap_err();
        assert!(err.to_string().contains("websiteId"));
        // Operations that never use a website ID still build
        assert!(build("listWebsites", &json!({}), &no_site).is_ok());
    }

    #[test]
    fn test_trailing_slash_base_url() {
        let creds = DqmCredentials::new("k", "w", "https://api.example.com/v1/");
        let request = build("listCheckpoints", &json!({}), &creds).unwrap();
        assert_eq!(request.url, "https://api.example.com/v1/checkpoints?apiKey=k");
    }

    #[test]
    fn test_api_key_redacted_in_debug() {
        let creds = DqmCredentials::new("secret-key-123", "w", "https://api.example.com");
        let request = build("getAssetDetails", &json!({"assetId": "A1"}), &creds).unwrap();

        let rendered = format!("{:?}", request);
        assert!(!rendered.contains("secret-key-123"));
        assert_eq!(
            request.redacted_url(),
            "https://api.example.com/assets/A1?apiKey=[REDACTED]&websiteId=w"
        );
    }
}
