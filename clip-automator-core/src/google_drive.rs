//! Google Drive v3 client authenticated as a service account.
//!
//! Authentication follows the OAuth 2.0 JWT-bearer flow: the service-account
//! key signs an RS256 assertion which is exchanged at the key's `token_uri`
//! for a bearer token. The token is fetched once per client; a client lives
//! for a single upload so it never outlives the token's hour.
//!
//! Uploads use the resumable protocol. The session is opened with the file
//! metadata, then the staged file is sent in chunks; a `308` reply carries
//! the byte range the server holds and the next chunk starts after it.
//! A `308` that does not move past the chunk just sent ends the upload with
//! an error.
//!
//! No request timeouts are configured and nothing is retried.

use std::io::SeekFrom;
use std::path::Path;

use async_trait::async_trait;
use jsonwebtoken::{Algorithm, EncodingKey, Header};
use reqwest::header::{HeaderValue, CONTENT_LENGTH, CONTENT_RANGE, LOCATION, RANGE};
use reqwest::{redirect, Response, StatusCode};
use serde::{Deserialize, Serialize};
use tokio::io::{AsyncReadExt, AsyncSeekExt};
use tracing::{debug, error, info};

use crate::contract::{DriveClient, DriveError, DriveFile, NewDriveFile};

pub const DRIVE_SCOPE: &str = "https://www.googleapis.com/auth/drive";
pub const DEFAULT_TOKEN_URI: &str = "https://oauth2.googleapis.com/token";
pub const DEFAULT_API_BASE: &str = "https://www.googleapis.com";

const JWT_BEARER_GRANT: &str = "urn:ietf:params:oauth:grant-type:jwt-bearer";
const FILE_FIELDS: &str = "id,name,mimeType,parents";
const LIST_FIELDS: &str = "files(id,name,mimeType,parents)";
const TOKEN_LIFETIME_SECS: i64 = 3600;

/// Resumable chunks must be a multiple of this.
pub const UPLOAD_CHUNK_GRANULARITY: usize = 256 * 1024;
pub const DEFAULT_UPLOAD_CHUNK_SIZE: usize = 32 * UPLOAD_CHUNK_GRANULARITY;

/// The fields of a Google service-account JSON key this client needs.
#[derive(Debug, Clone, Deserialize)]
pub struct ServiceAccountKey {
    #[serde(rename = "type")]
    pub key_type: String,
    pub client_email: String,
    pub private_key: String,
    #[serde(default)]
    pub private_key_id: Option<String>,
    #[serde(default = "default_token_uri")]
    pub token_uri: String,
}

fn default_token_uri() -> String {
    DEFAULT_TOKEN_URI.to_string()
}

impl ServiceAccountKey {
    pub fn from_file(path: &Path) -> Result<Self, DriveError> {
        let raw = std::fs::read_to_string(path).map_err(|e| {
            error!(error = ?e, path = %path.display(), "Failed to read service-account key");
            DriveError::Auth(format!(
                "cannot read service-account key {}: {e}",
                path.display()
            ))
        })?;
        Self::from_json(&raw)
    }

    pub fn from_json(raw: &str) -> Result<Self, DriveError> {
        let key: ServiceAccountKey = serde_json::from_str(raw)
            .map_err(|e| DriveError::Auth(format!("invalid service-account key: {e}")))?;
        if key.key_type != "service_account" {
            return Err(DriveError::Auth(format!(
                "expected a service_account key, found type {:?}",
                key.key_type
            )));
        }
        if key.client_email.is_empty() || key.private_key.is_empty() {
            return Err(DriveError::Auth(
                "service-account key is missing client_email or private_key".to_string(),
            ));
        }
        Ok(key)
    }
}

#[derive(Debug, Serialize, Deserialize, PartialEq)]
struct AssertionClaims {
    iss: String,
    scope: String,
    aud: String,
    iat: i64,
    exp: i64,
}

impl AssertionClaims {
    fn new(key: &ServiceAccountKey, issued_at: i64) -> Self {
        Self {
            iss: key.client_email.clone(),
            scope: DRIVE_SCOPE.to_string(),
            aud: key.token_uri.clone(),
            iat: issued_at,
            exp: issued_at + TOKEN_LIFETIME_SECS,
        }
    }
}

#[derive(Debug, Deserialize)]
struct TokenResponse {
    access_token: String,
    #[serde(default)]
    expires_in: Option<i64>,
}

#[derive(Debug, Deserialize)]
struct FileList {
    #[serde(default)]
    files: Vec<DriveFile>,
}

/// Sign the JWT-bearer assertion for `key`.
fn sign_assertion(key: &ServiceAccountKey, issued_at: i64) -> Result<String, DriveError> {
    let mut header = Header::new(Algorithm::RS256);
    header.kid = key.private_key_id.clone();
    let encoding_key = EncodingKey::from_rsa_pem(key.private_key.as_bytes())
        .map_err(|e| DriveError::Auth(format!("invalid service-account private key: {e}")))?;
    jsonwebtoken::encode(&header, &AssertionClaims::new(key, issued_at), &encoding_key)
        .map_err(|e| DriveError::Auth(format!("failed to sign token assertion: {e}")))
}

pub struct GoogleDriveClient {
    http: reqwest::Client,
    access_token: String,
    api_base: String,
    upload_base: String,
    chunk_size: usize,
}

impl GoogleDriveClient {
    /// Build a client around an already-issued bearer token.
    pub fn new(access_token: impl Into<String>) -> Result<Self, DriveError> {
        let http = reqwest::Client::builder()
            .redirect(redirect::Policy::none())
            .build()?;
        Ok(Self {
            http,
            access_token: access_token.into(),
            api_base: DEFAULT_API_BASE.to_string(),
            upload_base: DEFAULT_API_BASE.to_string(),
            chunk_size: DEFAULT_UPLOAD_CHUNK_SIZE,
        })
    }

    /// Read the service-account key at `key_path` and exchange it for a token.
    pub async fn connect(key_path: &Path) -> Result<Self, DriveError> {
        let key = ServiceAccountKey::from_file(key_path)?;
        let assertion = sign_assertion(&key, chrono::Utc::now().timestamp())?;

        let http = reqwest::Client::new();
        let response = http
            .post(&key.token_uri)
            .form(&[("grant_type", JWT_BEARER_GRANT), ("assertion", assertion.as_str())])
            .send()
            .await
            .map_err(|e| {
                error!(error = ?e, token_uri = %key.token_uri, "Token endpoint unreachable");
                DriveError::Transport(format!("token request failed: {e}"))
            })?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            error!(%status, client_email = %key.client_email, "Token exchange refused");
            return Err(DriveError::Auth(format!(
                "token exchange returned {status}: {body}"
            )));
        }
        let token: TokenResponse = response
            .json()
            .await
            .map_err(|e| DriveError::Auth(format!("malformed token response: {e}")))?;

        info!(
            client_email = %key.client_email,
            expires_in = token.expires_in,
            "Authenticated as service account"
        );
        Self::new(token.access_token)
    }

    /// Point the client at different API and upload hosts.
    pub fn with_endpoints(mut self, api_base: &str, upload_base: &str) -> Self {
        self.api_base = api_base.trim_end_matches('/').to_string();
        self.upload_base = upload_base.trim_end_matches('/').to_string();
        self
    }

    /// Set the resumable chunk size, rounded up to the 256 KiB granularity.
    pub fn with_chunk_size(mut self, chunk_size: usize) -> Self {
        self.chunk_size = round_chunk_size(chunk_size);
        self
    }

    pub fn chunk_size(&self) -> usize {
        self.chunk_size
    }

    async fn open_upload_session(
        &self,
        metadata: &NewDriveFile,
        total: u64,
    ) -> Result<String, DriveError> {
        let response = self
            .http
            .post(format!("{}/upload/drive/v3/files", self.upload_base))
            .bearer_auth(&self.access_token)
            .query(&[
                ("uploadType", "resumable"),
                ("supportsAllDrives", "true"),
                ("fields", FILE_FIELDS),
            ])
            .header("X-Upload-Content-Length", total.to_string())
            .json(metadata)
            .send()
            .await?;
        let response = ensure_success(response, "resumable upload initiation").await?;

        response
            .headers()
            .get(LOCATION)
            .and_then(|v| v.to_str().ok())
            .map(str::to_string)
            .ok_or_else(|| {
                DriveError::Transport("resumable upload session has no Location header".into())
            })
    }
}

#[async_trait]
impl DriveClient for GoogleDriveClient {
    async fn list_files(&self, query: &str) -> Result<Vec<DriveFile>, DriveError> {
        let response = self
            .http
            .get(format!("{}/drive/v3/files", self.api_base))
            .bearer_auth(&self.access_token)
            .query(&[
                ("q", query),
                ("fields", LIST_FIELDS),
                ("spaces", "drive"),
                ("supportsAllDrives", "true"),
                ("includeItemsFromAllDrives", "true"),
            ])
            .send()
            .await?;
        let response = ensure_success(response, "files.list").await?;
        let list: FileList = response.json().await?;
        debug!(count = list.files.len(), "files.list returned");
        Ok(list.files)
    }

    async fn create_folder(&self, metadata: &NewDriveFile) -> Result<DriveFile, DriveError> {
        let response = self
            .http
            .post(format!("{}/drive/v3/files", self.api_base))
            .bearer_auth(&self.access_token)
            .query(&[("fields", FILE_FIELDS), ("supportsAllDrives", "true")])
            .json(metadata)
            .send()
            .await?;
        let response = ensure_success(response, "files.create (folder)").await?;
        Ok(response.json().await?)
    }

    async fn upload_file(
        &self,
        local_path: &Path,
        metadata: &NewDriveFile,
    ) -> Result<DriveFile, DriveError> {
        let total = tokio::fs::metadata(local_path).await?.len();
        let session_uri = self.open_upload_session(metadata, total).await?;
        debug!(total, name = %metadata.name, "Opened resumable upload session");

        if total == 0 {
            let response = self
                .http
                .put(&session_uri)
                .bearer_auth(&self.access_token)
                .header(CONTENT_RANGE, "bytes */0")
                .header(CONTENT_LENGTH, 0_u64)
                .body(Vec::new())
                .send()
                .await?;
            let response = ensure_success(response, "resumable upload").await?;
            return Ok(response.json().await?);
        }

        let mut file = tokio::fs::File::open(local_path).await?;
        let mut buffer = vec![0u8; self.chunk_size];
        let mut offset: u64 = 0;

        loop {
            if offset >= total {
                return Err(DriveError::Transport(format!(
                    "server holds all {total} bytes but did not finalise the upload"
                )));
            }
            let len = (self.chunk_size as u64).min(total - offset) as usize;
            file.seek(SeekFrom::Start(offset)).await?;
            file.read_exact(&mut buffer[..len]).await?;

            let response = self
                .http
                .put(&session_uri)
                .bearer_auth(&self.access_token)
                .header(CONTENT_RANGE, content_range(offset, len, total))
                .header(CONTENT_LENGTH, len)
                .body(buffer[..len].to_vec())
                .send()
                .await?;

            if response.status() == StatusCode::PERMANENT_REDIRECT {
                let acknowledged = next_offset(response.headers().get(RANGE));
                if acknowledged <= offset {
                    error!(offset, acknowledged, total, "Resumable upload stalled");
                    return Err(DriveError::Transport(format!(
                        "resumable upload made no progress: server holds {acknowledged} of \
                         {total} bytes after a chunk starting at {offset}"
                    )));
                }
                offset = acknowledged;
                debug!(offset, total, "Chunk accepted, resuming");
                continue;
            }

            let response = ensure_success(response, "resumable upload").await?;
            let uploaded: DriveFile = response.json().await?;
            info!(file_id = %uploaded.id, bytes = total, "Resumable upload finished");
            return Ok(uploaded);
        }
    }
}

async fn ensure_success(response: Response, operation: &str) -> Result<Response, DriveError> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }
    let body = response.text().await.unwrap_or_default();
    error!(%status, operation, body = %body, "Drive API returned an error");
    Err(DriveError::Transport(format!(
        "{operation} returned {status}: {body}"
    )))
}

fn round_chunk_size(requested: usize) -> usize {
    let units = requested.div_ceil(UPLOAD_CHUNK_GRANULARITY).max(1);
    units * UPLOAD_CHUNK_GRANULARITY
}

fn content_range(offset: u64, len: usize, total: u64) -> String {
    format!("bytes {}-{}/{}", offset, offset + len as u64 - 1, total)
}

/// Offset of the next byte to send given a `308` reply's `Range` header
/// (`bytes=0-N`). No header means the server holds nothing yet.
fn next_offset(range: Option<&HeaderValue>) -> u64 {
    range
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.strip_prefix("bytes="))
        .and_then(|v| v.split_once('-'))
        .and_then(|(_, last)| last.trim().parse::<u64>().ok())
        .map(|last| last + 1)
        .unwrap_or(0)
}
