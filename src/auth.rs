use async_trait::async_trait;
use axum_extra::extract::cookie::{Cookie, CookieJar, SameSite};
use jsonwebtoken::{DecodingKey, Validation, decode, errors::ErrorKind};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use uuid::Uuid;

use crate::config::AppConfig;

// Cookie names set by the auth provider's browser client. Both applications
// read the session from this pair.
pub const ACCESS_COOKIE: &str = "sb-access-token";
pub const REFRESH_COOKIE: &str = "sb-refresh-token";

/// Claims
///
/// The payload structure expected inside a provider-issued access token.
/// Signed by the provider's secret and validated on every protected request.
#[derive(Debug, Serialize, Deserialize)]
pub struct Claims {
    /// Subject (sub): the user's UUID. This is the identity key used for the
    /// admin-role lookup.
    pub sub: Uuid,
    /// The email address the provider holds for this user.
    pub email: String,
    /// Expiration Time (exp): timestamp after which the token must not be
    /// accepted.
    pub exp: usize,
    /// Issued At (iat): timestamp when the token was issued.
    pub iat: usize,
}

/// SessionCredentials
///
/// The raw session material carried by a request: the access token plus the
/// optional refresh token that lets an expired session be renewed in place.
#[derive(Debug, Clone, PartialEq)]
pub struct SessionCredentials {
    pub access_token: String,
    pub refresh_token: Option<String>,
}

impl SessionCredentials {
    /// Reads the session cookie pair from a request's cookie jar. Returns
    /// None when no access token is present (anonymous request).
    pub fn from_jar(jar: &CookieJar) -> Option<Self> {
        let access = jar.get(ACCESS_COOKIE)?.value().trim().to_string();
        if access.is_empty() {
            return None;
        }
        let refresh = jar
            .get(REFRESH_COOKIE)
            .map(|c| c.value().trim().to_string())
            .filter(|v| !v.is_empty());
        Some(Self {
            access_token: access,
            refresh_token: refresh,
        })
    }

    /// Builds the Set-Cookie values that push these credentials back to the
    /// client, used when the provider rotated the session mid-request.
    pub fn to_cookies(&self) -> Vec<Cookie<'static>> {
        let mut cookies = vec![
            Cookie::build((ACCESS_COOKIE, self.access_token.clone()))
                .path("/")
                .http_only(true)
                .same_site(SameSite::Lax)
                .build(),
        ];
        if let Some(refresh) = &self.refresh_token {
            cookies.push(
                Cookie::build((REFRESH_COOKIE, refresh.clone()))
                    .path("/")
                    .http_only(true)
                    .same_site(SameSite::Lax)
                    .build(),
            );
        }
        cookies
    }
}

/// ResolvedIdentity
///
/// The authenticated principal behind a request: the stable identity key and
/// email, plus any replacement credentials the provider issued while
/// resolving (an expired access token renewed through the refresh grant).
/// Callers sitting on the HTTP boundary must propagate `rotated` onto the
/// outgoing response so the client's stored session stays valid.
#[derive(Debug, Clone)]
pub struct ResolvedIdentity {
    pub user_id: Uuid,
    pub email: String,
    pub rotated: Option<SessionCredentials>,
}

/// ProviderError
///
/// The identity lookup itself failed (transport error against the provider),
/// as opposed to the credentials simply being invalid. Callers treat this the
/// same as "no session" so an outage can never open the door.
#[derive(Debug)]
pub struct ProviderError(pub String);

/// IdentityProvider
///
/// Contract for resolving request credentials to an identity. The production
/// implementation talks to the external auth provider; tests substitute a
/// scripted mock.
///
/// `Ok(None)` means the credentials did not resolve (missing, malformed,
/// expired beyond renewal). `Err` means the lookup could not be completed.
#[async_trait]
pub trait IdentityProvider: Send + Sync {
    async fn resolve(
        &self,
        credentials: &SessionCredentials,
    ) -> Result<Option<ResolvedIdentity>, ProviderError>;
}

/// IdentityState
///
/// The concrete type used to share the identity provider across the
/// application state.
pub type IdentityState = Arc<dyn IdentityProvider>;

/// RefreshGrant
///
/// Minimal deserialization target for the provider's refresh-token response.
#[derive(Deserialize)]
struct RefreshGrant {
    access_token: String,
    refresh_token: Option<String>,
}

/// GoTrueClient
///
/// The production `IdentityProvider`. Validates access tokens locally against
/// the provider's signing secret, and renews expired sessions through the
/// provider's refresh-token grant.
pub struct GoTrueClient {
    jwt_secret: String,
    token_url: String,
    anon_key: String,
    http: reqwest::Client,
}

impl GoTrueClient {
    pub fn new(config: &AppConfig) -> Self {
        Self {
            jwt_secret: config.jwt_secret.clone(),
            token_url: format!("{}/auth/v1/token?grant_type=refresh_token", config.auth_url),
            anon_key: config.auth_anon_key.clone(),
            http: reqwest::Client::new(),
        }
    }

    fn decode_claims(&self, token: &str) -> Result<Claims, jsonwebtoken::errors::Error> {
        let decoding_key = DecodingKey::from_secret(self.jwt_secret.as_bytes());

        let mut validation = Validation::default();
        // Expiration validation is always active.
        validation.validate_exp = true;
        // Provider tokens carry an `aud` claim we have no fixed value for.
        validation.validate_aud = false;

        decode::<Claims>(token, &decoding_key, &validation).map(|data| data.claims)
    }

    /// Exchanges a refresh token for a new session at the provider.
    ///
    /// A transport failure is a `ProviderError`; a rejected refresh token
    /// (revoked, already used) is `Ok(None)`.
    async fn refresh(&self, refresh_token: &str) -> Result<Option<RefreshGrant>, ProviderError> {
        let response = self
            .http
            .post(&self.token_url)
            .header("apikey", &self.anon_key)
            .header("Content-Type", "application/json")
            .json(&serde_json::json!({ "refresh_token": refresh_token }))
            .send()
            .await
            .map_err(|e| ProviderError(format!("refresh transport: {e}")))?;

        if !response.status().is_success() {
            return Ok(None);
        }

        let grant = response
            .json::<RefreshGrant>()
            .await
            .map_err(|e| ProviderError(format!("refresh payload: {e}")))?;

        Ok(Some(grant))
    }
}

#[async_trait]
impl IdentityProvider for GoTrueClient {
    /// resolve
    ///
    /// 1. Decode and validate the access token against the signing secret.
    /// 2. If the only problem is expiry and a refresh token is available,
    ///    renew the session at the provider and resolve the new token,
    ///    reporting the replacement credentials as `rotated`.
    /// 3. Any other validation failure resolves to no identity.
    async fn resolve(
        &self,
        credentials: &SessionCredentials,
    ) -> Result<Option<ResolvedIdentity>, ProviderError> {
        match self.decode_claims(&credentials.access_token) {
            Ok(claims) => Ok(Some(ResolvedIdentity {
                user_id: claims.sub,
                email: claims.email,
                rotated: None,
            })),
            Err(e) => match e.kind() {
                ErrorKind::ExpiredSignature => {
                    let Some(refresh_token) = credentials.refresh_token.as_deref() else {
                        // Expired with nothing to renew it with.
                        return Ok(None);
                    };
                    let Some(grant) = self.refresh(refresh_token).await? else {
                        return Ok(None);
                    };
                    match self.decode_claims(&grant.access_token) {
                        Ok(claims) => {
                            let rotated = SessionCredentials {
                                access_token: grant.access_token,
                                refresh_token: grant.refresh_token,
                            };
                            Ok(Some(ResolvedIdentity {
                                user_id: claims.sub,
                                email: claims.email,
                                rotated: Some(rotated),
                            }))
                        }
                        // The provider handed back a token we cannot validate.
                        Err(_) => Ok(None),
                    }
                }
                // Bad signature, malformed token, wrong algorithm.
                _ => Ok(None),
            },
        }
    }
}
