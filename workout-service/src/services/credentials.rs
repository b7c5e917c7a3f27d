//! OAuth bearer tokens for Vertex AI calls.
//!
//! Resolution follows Google's application default credentials order:
//! an explicit token, the `GOOGLE_APPLICATION_CREDENTIALS` key file, the gcloud
//! well-known file, then the metadata server. Tokens are fetched per call.

use super::providers::ProviderError;
use chrono::{Duration, Utc};
use jsonwebtoken::{encode, Algorithm, EncodingKey, Header};
use reqwest::Client;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Token endpoint of the GCE / Cloud Run metadata server.
pub const METADATA_TOKEN_URL: &str =
    "http://metadata.google.internal/computeMetadata/v1/instance/service-accounts/default/token";

const GOOGLE_TOKEN_URL: &str = "https://oauth2.googleapis.com/token";
const CLOUD_PLATFORM_SCOPE: &str = "https://www.googleapis.com/auth/cloud-platform";
const JWT_BEARER_GRANT: &str = "urn:ietf:params:oauth:grant-type:jwt-bearer";

/// Where the bearer token for each model call comes from.
#[derive(Clone)]
pub enum TokenSource {
    /// Token supplied through configuration.
    Static(String),
    /// Service account key: a signed JWT exchanged at `token_uri`.
    ServiceAccount {
        client: Client,
        client_email: String,
        key_id: Option<String>,
        key: EncodingKey,
        token_uri: String,
    },
    /// gcloud user credentials: a refresh token exchanged at `token_uri`.
    AuthorizedUser {
        client: Client,
        client_id: String,
        client_secret: String,
        refresh_token: String,
        token_uri: String,
    },
    /// Token fetched from the metadata server.
    MetadataServer { client: Client, url: String },
}

/// On-disk credential file, as written by the IAM console or `gcloud auth
/// application-default login`.
#[derive(Debug, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
enum CredentialsFile {
    ServiceAccount {
        client_email: String,
        private_key: String,
        #[serde(default)]
        private_key_id: Option<String>,
        #[serde(default)]
        token_uri: Option<String>,
    },
    AuthorizedUser {
        client_id: String,
        client_secret: String,
        refresh_token: String,
    },
}

#[derive(Debug, Serialize)]
struct AssertionClaims<'a> {
    iss: &'a str,
    scope: &'a str,
    aud: &'a str,
    iat: i64,
    exp: i64,
}

#[derive(Debug, Deserialize)]
struct TokenResponse {
    access_token: String,
}

impl TokenSource {
    /// Pick the first available credential.
    ///
    /// An explicitly configured key file that cannot be loaded is an error;
    /// a missing well-known file just moves on to the metadata server.
    pub fn discover(
        access_token: Option<&str>,
        credentials_file: Option<&Path>,
        well_known_file: Option<PathBuf>,
        client: Client,
    ) -> Result<Self, ProviderError> {
        if let Some(token) = access_token {
            return Ok(TokenSource::Static(token.to_string()));
        }

        if let Some(path) = credentials_file {
            return Self::from_file(path, client);
        }

        if let Some(path) = well_known_file.filter(|p| p.is_file()) {
            return Self::from_file(&path, client);
        }

        Ok(TokenSource::MetadataServer {
            client,
            url: METADATA_TOKEN_URL.to_string(),
        })
    }

    pub fn from_file(path: &Path, client: Client) -> Result<Self, ProviderError> {
        let raw = std::fs::read_to_string(path).map_err(|e| {
            ProviderError::Credentials(format!("cannot read {}: {}", path.display(), e))
        })?;
        let parsed: CredentialsFile = serde_json::from_str(&raw).map_err(|e| {
            ProviderError::Credentials(format!("invalid credentials in {}: {}", path.display(), e))
        })?;

        tracing::info!(path = %path.display(), "Loaded Google credentials file");

        match parsed {
            CredentialsFile::ServiceAccount {
                client_email,
                private_key,
                private_key_id,
                token_uri,
            } => {
                let key = EncodingKey::from_rsa_pem(private_key.as_bytes()).map_err(|e| {
                    ProviderError::Credentials(format!("invalid service account key: {}", e))
                })?;

                Ok(TokenSource::ServiceAccount {
                    client,
                    client_email,
                    key_id: private_key_id,
                    key,
                    token_uri: token_uri.unwrap_or_else(|| GOOGLE_TOKEN_URL.to_string()),
                })
            }
            CredentialsFile::AuthorizedUser {
                client_id,
                client_secret,
                refresh_token,
            } => Ok(TokenSource::AuthorizedUser {
                client,
                client_id,
                client_secret,
                refresh_token,
                token_uri: GOOGLE_TOKEN_URL.to_string(),
            }),
        }
    }

    pub async fn token(&self) -> Result<String, ProviderError> {
        match self {
            TokenSource::Static(token) => Ok(token.clone()),
            TokenSource::ServiceAccount {
                client,
                client_email,
                key_id,
                key,
                token_uri,
            } => {
                let now = Utc::now();
                let claims = AssertionClaims {
                    iss: client_email,
                    scope: CLOUD_PLATFORM_SCOPE,
                    aud: token_uri,
                    iat: now.timestamp(),
                    exp: (now + Duration::hours(1)).timestamp(),
                };
                let header = Header {
                    kid: key_id.clone(),
                    ..Header::new(Algorithm::RS256)
                };
                let assertion = encode(&header, &claims, key).map_err(|e| {
                    ProviderError::Credentials(format!("failed to sign assertion: {}", e))
                })?;

                let request = client
                    .post(token_uri)
                    .form(&[("grant_type", JWT_BEARER_GRANT), ("assertion", assertion.as_str())]);
                exchange(request, "token endpoint").await
            }
            TokenSource::AuthorizedUser {
                client,
                client_id,
                client_secret,
                refresh_token,
                token_uri,
            } => {
                let request = client.post(token_uri).form(&[
                    ("grant_type", "refresh_token"),
                    ("client_id", client_id.as_str()),
                    ("client_secret", client_secret.as_str()),
                    ("refresh_token", refresh_token.as_str()),
                ]);
                exchange(request, "token endpoint").await
            }
            TokenSource::MetadataServer { client, url } => {
                let request = client.get(url).header("Metadata-Flavor", "Google");
                exchange(request, "metadata server").await
            }
        }
    }
}

/// `$HOME/.config/gcloud/application_default_credentials.json`, or the
/// `%APPDATA%` equivalent on Windows.
pub fn well_known_credentials_file() -> Option<PathBuf> {
    let base = if cfg!(windows) {
        PathBuf::from(std::env::var_os("APPDATA")?)
    } else {
        PathBuf::from(std::env::var_os("HOME")?).join(".config")
    };
    Some(base.join("gcloud").join("application_default_credentials.json"))
}

async fn exchange(request: reqwest::RequestBuilder, source: &str) -> Result<String, ProviderError> {
    let response = request
        .send()
        .await
        .map_err(|e| ProviderError::Credentials(format!("{} unreachable: {}", source, e)))?;

    if !response.status().is_success() {
        let status = response.status();
        let body = response
            .text()
            .await
            .unwrap_or_else(|_| "<unable to read response body>".to_string());
        return Err(ProviderError::Credentials(format!(
            "{} returned {}: {}",
            source, status, body
        )));
    }

    let token: TokenResponse = response.json().await.map_err(|e| {
        ProviderError::Credentials(format!("invalid {} token response: {}", source, e))
    })?;

    Ok(token.access_token)
}
