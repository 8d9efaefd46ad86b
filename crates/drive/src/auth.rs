//! Service-account authentication.
//!
//! A service-account key arrives as a base64-encoded JSON blob. It is turned
//! into an access token with the OAuth2 JWT-bearer grant: a short-lived RS256
//! assertion signed with the key is exchanged at the key's `token_uri`.
//!
//! Key material and tokens never appear in `Debug` output or logs.

use std::fmt;
use std::sync::{Mutex, PoisonError};

use base64::Engine;
use base64::engine::general_purpose::STANDARD;
use jsonwebtoken::{Algorithm, EncodingKey, Header};
use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};

/// Full read/write access to the principal's files.
pub const DRIVE_SCOPE: &str = "https://www.googleapis.com/auth/drive";

const DEFAULT_TOKEN_URI: &str = "https://oauth2.googleapis.com/token";
const JWT_BEARER_GRANT: &str = "urn:ietf:params:oauth:grant-type:jwt-bearer";

/// Lifetime requested for each assertion (the maximum Google accepts).
const ASSERTION_LIFETIME_SECS: i64 = 3600;

/// Tokens are refreshed this long before they actually expire.
const REFRESH_MARGIN_SECS: i64 = 60;

/// The subset of a Google service-account key file that we need.
#[derive(Clone, Deserialize)]
pub struct ServiceAccountKey {
    /// Service account identity, used as the JWT issuer
    pub client_email: String,
    /// PEM-encoded RSA private key
    pub private_key: String,
    /// Key identifier, sent as the JWT `kid`
    #[serde(default)]
    pub private_key_id: Option<String>,
    /// OAuth2 token endpoint
    #[serde(default = "default_token_uri")]
    pub token_uri: String,
}

fn default_token_uri() -> String {
    DEFAULT_TOKEN_URI.to_string()
}

impl fmt::Debug for ServiceAccountKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ServiceAccountKey")
            .field("client_email", &self.client_email)
            .field("private_key", &"<redacted>")
            .field("private_key_id", &self.private_key_id.as_ref().map(|_| "<redacted>"))
            .field("token_uri", &self.token_uri)
            .finish()
    }
}

impl ServiceAccountKey {
    /// Decode a base64-encoded key file.
    ///
    /// # Errors
    ///
    /// - `MissingCredentials`: the input is blank
    /// - `InvalidCredentials`: not base64, or not a service-account key
    pub fn from_base64(encoded: &str) -> Result<Self> {
        let encoded = encoded.trim();
        if encoded.is_empty() {
            return Err(Error::MissingCredentials);
        }

        let decoded = STANDARD
            .decode(encoded)
            .map_err(|e| Error::InvalidCredentials(format!("base64 decoding failed: {e}")))?;
        let json = String::from_utf8(decoded)
            .map_err(|_| Error::InvalidCredentials("decoded key is not UTF-8".to_string()))?;

        Self::from_json(json.trim_end_matches('\n'))
    }

    /// Parse a key file's JSON.
    pub fn from_json(json: &str) -> Result<Self> {
        let key: Self = serde_json::from_str(json)
            .map_err(|e| Error::InvalidCredentials(format!("not a service-account key: {e}")))?;

        if key.client_email.is_empty() || key.private_key.is_empty() {
            return Err(Error::InvalidCredentials(
                "key is missing client_email or private_key".to_string(),
            ));
        }

        Ok(key)
    }

    /// Build the claim set for an assertion issued at `now` (unix seconds).
    fn claims<'a>(&'a self, scope: &'a str, now: i64) -> Claims<'a> {
        Claims {
            iss: &self.client_email,
            scope,
            aud: &self.token_uri,
            iat: now,
            exp: now + ASSERTION_LIFETIME_SECS,
        }
    }

    /// Sign an RS256 assertion for `scope`.
    pub fn assertion(&self, scope: &str, now: i64) -> Result<String> {
        let mut header = Header::new(Algorithm::RS256);
        header.kid = self.private_key_id.clone();

        let key = EncodingKey::from_rsa_pem(self.private_key.as_bytes())
            .map_err(|e| Error::InvalidCredentials(format!("unusable private key: {e}")))?;

        jsonwebtoken::encode(&header, &self.claims(scope, now), &key)
            .map_err(|e| Error::InvalidCredentials(format!("signing assertion failed: {e}")))
    }
}

#[derive(Debug, Serialize)]
struct Claims<'a> {
    iss: &'a str,
    scope: &'a str,
    aud: &'a str,
    iat: i64,
    exp: i64,
}

/// An OAuth2 bearer token and the time it stops being valid.
#[derive(Clone)]
pub struct AccessToken {
    value: String,
    expires_at: i64,
}

impl AccessToken {
    /// Create a token valid until `expires_at` (unix seconds).
    pub fn new(value: impl Into<String>, expires_at: i64) -> Self {
        Self {
            value: value.into(),
            expires_at,
        }
    }

    /// The raw token, for the `Authorization` header only.
    pub fn secret(&self) -> &str {
        &self.value
    }

    /// Whether the token is still usable at `now`, keeping a refresh margin.
    pub fn is_fresh(&self, now: i64) -> bool {
        now + REFRESH_MARGIN_SECS < self.expires_at
    }
}

impl fmt::Debug for AccessToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AccessToken")
            .field("value", &"<redacted>")
            .field("expires_at", &self.expires_at)
            .finish()
    }
}

#[derive(Debug, Deserialize)]
struct TokenResponse {
    access_token: String,
    #[serde(default = "default_expires_in")]
    expires_in: i64,
}

fn default_expires_in() -> i64 {
    ASSERTION_LIFETIME_SECS
}

#[derive(Debug, Default, Deserialize)]
struct TokenError {
    #[serde(default)]
    error: String,
    #[serde(default)]
    error_description: String,
}

impl TokenError {
    fn message(&self) -> String {
        match (self.error.is_empty(), self.error_description.is_empty()) {
            (false, false) => format!("{}: {}", self.error, self.error_description),
            (false, true) => self.error.clone(),
            (true, false) => self.error_description.clone(),
            (true, true) => "token endpoint rejected the assertion".to_string(),
        }
    }
}

/// Exchanges a service-account key for access tokens, caching the current one.
pub struct Authenticator {
    key: ServiceAccountKey,
    scope: String,
    agent: ureq::Agent,
    cached: Mutex<Option<AccessToken>>,
}

impl Authenticator {
    /// Create an authenticator for `scope`.
    pub fn new(key: ServiceAccountKey, scope: impl Into<String>, agent: ureq::Agent) -> Self {
        Self {
            key,
            scope: scope.into(),
            agent,
            cached: Mutex::new(None),
        }
    }

    /// The service account this authenticator signs as.
    pub fn client_email(&self) -> &str {
        &self.key.client_email
    }

    /// Return a valid access token, exchanging a new assertion when needed.
    pub fn token(&self) -> Result<String> {
        let now = chrono::Utc::now().timestamp();
        let mut cached = self.cached.lock().unwrap_or_else(PoisonError::into_inner);

        if let Some(token) = cached.as_ref().filter(|t| t.is_fresh(now)) {
            return Ok(token.secret().to_string());
        }

        log::debug!("Requesting access token for {}", self.key.client_email);
        let token = self.exchange(now)?;
        let secret = token.secret().to_string();
        *cached = Some(token);
        Ok(secret)
    }

    fn exchange(&self, now: i64) -> Result<AccessToken> {
        let assertion = self.key.assertion(&self.scope, now)?;

        let mut response = self
            .agent
            .post(&self.key.token_uri)
            .send_form([
                ("grant_type", JWT_BEARER_GRANT),
                ("assertion", assertion.as_str()),
            ])?;

        let status = response.status().as_u16();
        if status >= 400 {
            let body = response.body_mut().read_to_string().unwrap_or_default();
            let detail: TokenError = serde_json::from_str(&body).unwrap_or_default();
            return Err(if status >= 500 {
                Error::Unavailable {
                    status,
                    message: detail.message(),
                }
            } else {
                Error::Auth {
                    message: detail.message(),
                }
            });
        }

        let parsed: TokenResponse = response.body_mut().read_json()?;
        Ok(AccessToken::new(parsed.access_token, now + parsed.expires_in))
    }
}
