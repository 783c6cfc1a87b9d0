//! Off-chain metadata upload.
//!
//! Uploads an image and a JSON metadata document to an NFT.Storage-compatible
//! service and returns the document's URI. Failures are returned as-is; there
//! is no retry here.

use std::path::Path;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::error::UploadError;

/// Default NFT.Storage API endpoint.
pub const DEFAULT_STORAGE_ENDPOINT: &str = "https://api.nft.storage";

/// Default IPFS gateway used to build returned URIs.
pub const DEFAULT_GATEWAY: &str = "https://nftstorage.link/ipfs";

/// An image plus the descriptive fields that go into its metadata document.
#[derive(Clone, Debug)]
pub struct AssetUpload {
    pub name: String,
    pub symbol: String,
    pub description: String,
    pub image: Vec<u8>,
    pub content_type: String,
}

impl AssetUpload {
    /// Read an image from disk, inferring the content type from its extension.
    pub fn from_file(
        path: impl AsRef<Path>,
        name: impl Into<String>,
        symbol: impl Into<String>,
        description: impl Into<String>,
    ) -> Result<Self, UploadError> {
        let path = path.as_ref();
        let image = std::fs::read(path).map_err(|source| UploadError::Io {
            path: path.display().to_string(),
            source,
        })?;
        Ok(Self {
            name: name.into(),
            symbol: symbol.into(),
            description: description.into(),
            image,
            content_type: content_type_for(path).to_string(),
        })
    }
}

/// Best-effort MIME type from a file extension.
pub fn content_type_for(path: &Path) -> &'static str {
    let ext = path
        .extension()
        .and_then(|e| e.to_str())
        .map(|e| e.to_ascii_lowercase());
    match ext.as_deref() {
        Some("png") => "image/png",
        Some("jpg") | Some("jpeg") => "image/jpeg",
        Some("gif") => "image/gif",
        Some("webp") => "image/webp",
        Some("svg") => "image/svg+xml",
        _ => "application/octet-stream",
    }
}

/// Storage collaborator: turns an asset into a content URI.
#[async_trait]
pub trait MetadataUploader: Send + Sync {
    async fn upload(&self, asset: &AssetUpload) -> Result<String, UploadError>;
}

/// JSON document the metadata URI points at.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct OffchainMetadata {
    pub name: String,
    pub symbol: String,
    pub description: String,
    pub image: String,
    pub properties: OffchainProperties,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct OffchainProperties {
    pub files: Vec<OffchainFile>,
    pub category: String,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct OffchainFile {
    pub uri: String,
    #[serde(rename = "type")]
    pub content_type: String,
}

impl OffchainMetadata {
    pub fn new(asset: &AssetUpload, image_uri: String) -> Self {
        Self {
            name: asset.name.clone(),
            symbol: asset.symbol.clone(),
            description: asset.description.clone(),
            image: image_uri.clone(),
            properties: OffchainProperties {
                files: vec![OffchainFile {
                    uri: image_uri,
                    content_type: asset.content_type.clone(),
                }],
                category: "image".to_string(),
            },
        }
    }
}

#[derive(Debug, Deserialize)]
struct StoreResponse {
    ok: bool,
    value: Option<StoreValue>,
    error: Option<StoreError>,
}

#[derive(Debug, Deserialize)]
struct StoreValue {
    cid: String,
}

#[derive(Debug, Deserialize)]
struct StoreError {
    #[serde(default)]
    name: Option<String>,
    #[serde(default)]
    message: Option<String>,
}

/// Uploader for the NFT.Storage HTTP API (`POST /upload`).
#[derive(Clone, Debug)]
pub struct NftStorageUploader {
    http: reqwest::Client,
    endpoint: String,
    api_key: String,
    gateway: String,
}

impl NftStorageUploader {
    pub fn new(endpoint: impl Into<String>, api_key: impl Into<String>) -> Self {
        Self {
            http: reqwest::Client::new(),
            endpoint: endpoint.into().trim_end_matches('/').to_string(),
            api_key: api_key.into(),
            gateway: DEFAULT_GATEWAY.to_string(),
        }
    }

    /// Override the gateway prefix of returned URIs.
    pub fn with_gateway(mut self, gateway: impl Into<String>) -> Self {
        self.gateway = gateway.into().trim_end_matches('/').to_string();
        self
    }

    /// URI for a stored CID.
    pub fn gateway_uri(&self, cid: &str) -> String {
        format!("{}/{}", self.gateway, cid)
    }

    async fn store(&self, body: Vec<u8>, content_type: &str) -> Result<String, UploadError> {
        let url = format!("{}/upload", self.endpoint);
        debug!(%url, bytes = body.len(), content_type, "storage upload");
        let resp = self
            .http
            .post(&url)
            .bearer_auth(&self.api_key)
            .header(reqwest::header::CONTENT_TYPE, content_type)
            .body(body)
            .send()
            .await?;

        let status = resp.status();
        let text = resp.text().await?;
        parse_store_response(status.as_u16(), &text)
    }
}

fn parse_store_response(status: u16, body: &str) -> Result<String, UploadError> {
    let parsed: Result<StoreResponse, _> = serde_json::from_str(body);
    match parsed {
        Ok(StoreResponse {
            ok: true,
            value: Some(StoreValue { cid }),
            ..
        }) if (200..300).contains(&status) => Ok(cid),
        Ok(StoreResponse { error, .. }) if !(200..300).contains(&status) || error.is_some() => {
            let message = error
                .and_then(|e| e.message.or(e.name))
                .unwrap_or_else(|| body.to_string());
            Err(UploadError::Rejected { status, message })
        }
        Ok(other) => Err(UploadError::MalformedResponse(format!(
            "missing cid in {other:?}"
        ))),
        Err(_) if !(200..300).contains(&status) => Err(UploadError::Rejected {
            status,
            message: body.to_string(),
        }),
        Err(e) => Err(UploadError::MalformedResponse(e.to_string())),
    }
}

#[async_trait]
impl MetadataUploader for NftStorageUploader {
    async fn upload(&self, asset: &AssetUpload) -> Result<String, UploadError> {
        let image_cid = self
            .store(asset.image.clone(), &asset.content_type)
            .await?;
        let image_uri = self.gateway_uri(&image_cid);

        let document = OffchainMetadata::new(asset, image_uri);
        let json = serde_json::to_vec(&document)
            .map_err(|e| UploadError::MalformedResponse(e.to_string()))?;
        let metadata_cid = self.store(json, "application/json").await?;
        let uri = self.gateway_uri(&metadata_cid);
        info!(%uri, name = %asset.name, "metadata uploaded");
        Ok(uri)
    }
}
