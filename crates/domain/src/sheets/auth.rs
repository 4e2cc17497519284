use std::path::Path;

use chrono::{DateTime, Duration, Utc};
use jsonwebtoken::{encode, Algorithm, EncodingKey, Header};
use serde::{Deserialize, Serialize};
use tokio::sync::Mutex;

use crate::errors::Error;

pub const SCOPES: [&str; 4] = [
    "https://spreadsheets.google.com/feeds",
    "https://www.googleapis.com/auth/spreadsheets",
    "https://www.googleapis.com/auth/drive.file",
    "https://www.googleapis.com/auth/drive",
];

const DEFAULT_TOKEN_URI: &str = "https://oauth2.googleapis.com/token";
const ASSERTION_LIFETIME_MINUTES: i64 = 60;
const EXPIRY_MARGIN_SECONDS: i64 = 60;

/// The fields of a service-account key file this client needs
#[derive(Clone, Debug, Deserialize)]
pub struct ServiceAccountKey {
    pub client_email: String,
    pub private_key: String,
    #[serde(default = "default_token_uri")]
    pub token_uri: String,
}

fn default_token_uri() -> String {
    DEFAULT_TOKEN_URI.to_string()
}

impl ServiceAccountKey {
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self, Error> {
        let path = path.as_ref();
        let raw = std::fs::read_to_string(path)?;
        serde_json::from_str(&raw).map_err(|e| Error::Auth {
            message: format!("Invalid service account key {}: {}", path.display(), e),
        })
    }
}

#[derive(Debug, Serialize, PartialEq)]
struct Claims {
    iss: String,
    scope: String,
    aud: String,
    iat: i64,
    exp: i64,
}

impl Claims {
    fn new(key: &ServiceAccountKey, now: DateTime<Utc>) -> Self {
        Self {
            iss: key.client_email.clone(),
            scope: SCOPES.join(" "),
            aud: key.token_uri.clone(),
            iat: now.timestamp(),
            exp: (now + Duration::minutes(ASSERTION_LIFETIME_MINUTES)).timestamp(),
        }
    }
}

#[derive(Debug, Deserialize)]
struct TokenResponse {
    access_token: String,
    expires_in: i64,
}

#[derive(Clone, Debug)]
struct AccessToken {
    value: String,
    expires_at: DateTime<Utc>,
}

impl AccessToken {
    fn is_fresh(&self, now: DateTime<Utc>) -> bool {
        now + Duration::seconds(EXPIRY_MARGIN_SECONDS) < self.expires_at
    }
}

/// Bearer tokens for a service account, exchanged from signed JWT
/// assertions and reused until shortly before they expire.
pub struct TokenSource {
    key: ServiceAccountKey,
    http: reqwest::Client,
    cached: Mutex<Option<AccessToken>>,
}

impl TokenSource {
    pub fn new(key: ServiceAccountKey, http: reqwest::Client) -> Self {
        Self {
            key,
            http,
            cached: Mutex::new(None),
        }
    }

    pub fn client_email(&self) -> &str {
        &self.key.client_email
    }

    pub async fn token(&self) -> Result<String, Error> {
        let mut cached = self.cached.lock().await;
        let now = Utc::now();

        if let Some(token) = cached.as_ref().filter(|t| t.is_fresh(now)) {
            return Ok(token.value.clone());
        }

        let fresh = self.fetch(now).await?;
        let value = fresh.value.clone();
        *cached = Some(fresh);
        Ok(value)
    }

    fn assertion(&self, now: DateTime<Utc>) -> Result<String, Error> {
        let key = EncodingKey::from_rsa_pem(self.key.private_key.as_bytes()).map_err(|e| Error::Auth {
            message: format!("Invalid private key for {}: {}", self.key.client_email, e),
        })?;

        encode(&Header::new(Algorithm::RS256), &Claims::new(&self.key, now), &key).map_err(|e| Error::Auth {
            message: format!("Failed to sign assertion: {}", e),
        })
    }

    async fn fetch(&self, now: DateTime<Utc>) -> Result<AccessToken, Error> {
        let assertion = self.assertion(now)?;

        let response = self
            .http
            .post(&self.key.token_uri)
            .form(&[
                ("grant_type", "urn:ietf:params:oauth:grant-type:jwt-bearer"),
                ("assertion", assertion.as_str()),
            ])
            .send()
            .await
            .map_err(|e| Error::Auth {
                message: format!("Token request failed: {}", e),
            })?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(Error::Auth {
                message: format!("Token request failed with status {}: {}", status, body),
            });
        }

        let token: TokenResponse = response.json().await.map_err(|e| Error::Auth {
            message: format!("Invalid token response: {}", e),
        })?;

        tracing::debug!("Obtained access token for {}", self.key.client_email);
        Ok(AccessToken {
            value: token.access_token,
            expires_at: now + Duration::seconds(token.expires_in),
        })
    }
}
