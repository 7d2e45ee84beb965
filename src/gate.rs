use axum::{
    extract::{Request, State},
    http::{HeaderValue, StatusCode, header::SET_COOKIE},
    middleware::Next,
    response::{IntoResponse, Redirect, Response},
};
use axum_extra::extract::cookie::CookieJar;
use uuid::Uuid;

use crate::{
    AppState,
    auth::{IdentityProvider, SessionCredentials},
    models::AdminRole,
    repository::{Repository, RoleChannel},
};

// Fixed reject targets of the admin console.
pub const LOGIN_PATH: &str = "/login";
pub const ACCESS_DENIED_PATH: &str = "/access-denied";

// Paths exempt from the admission check entirely. Entries ending in '/' are
// prefixes (static assets); the rest match exactly.
pub const ADMIN_PUBLIC_PATHS: &[&str] = &[LOGIN_PATH, ACCESS_DENIED_PATH, "/assets/"];

fn is_public_path(path: &str) -> bool {
    ADMIN_PUBLIC_PATHS
        .iter()
        .any(|p| if p.ends_with('/') { path.starts_with(p) } else { path == *p })
}

/// AdminIdentity
///
/// The payload of a successful admission check: the resolved identity key and
/// email plus the admin-role row that authorized it. The `role` classification
/// is carried for auditing; nothing branches on its value.
#[derive(Debug, Clone)]
pub struct AdminIdentity {
    pub user_id: Uuid,
    pub email: String,
    pub role: AdminRole,
}

/// AccessDecision
///
/// Outcome of the two-step admission check. The two reject variants are
/// deliberately distinct: a missing session and a session without an
/// admin-role row lead to different user-visible outcomes (login redirect
/// versus access-denied page, 401 versus 403).
#[derive(Debug)]
pub enum AccessDecision {
    /// No valid session resolved from the request credentials.
    Unauthenticated,
    /// A session resolved, but no admin-role row exists for its identity.
    Unauthorized,
    /// Both checks passed.
    Authorized {
        admin: AdminIdentity,
        /// Credentials the provider rotated during resolution. Whoever sits
        /// on the HTTP boundary must attach these to the outgoing response.
        rotated: Option<SessionCredentials>,
    },
}

/// check_admin_access
///
/// The single admission check both enforcement points run: the edge
/// middleware wrapping the admin application, and the per-operation guard
/// inside mutating handlers. Keeping one implementation prevents the two
/// copies from drifting apart.
///
/// Step 1 resolves the session credentials to an identity; step 2 looks up
/// the admin-role row for that identity on the given channel. The role
/// lookup is never attempted without a resolved identity, and neither step
/// is retried.
///
/// **Fail-closed**: an error from either lookup is classified as the reject
/// outcome of that step, never allowed to propagate as a fault that might
/// let the request through.
pub async fn check_admin_access(
    provider: &dyn IdentityProvider,
    repo: &dyn Repository,
    credentials: Option<&SessionCredentials>,
    channel: RoleChannel,
) -> AccessDecision {
    let Some(credentials) = credentials else {
        return AccessDecision::Unauthenticated;
    };

    let identity = match provider.resolve(credentials).await {
        Ok(Some(identity)) => identity,
        Ok(None) => return AccessDecision::Unauthenticated,
        Err(e) => {
            tracing::warn!("identity resolution failed, rejecting: {:?}", e);
            return AccessDecision::Unauthenticated;
        }
    };

    let role = match repo.find_admin_role(identity.user_id, channel).await {
        Ok(Some(role)) => role,
        Ok(None) => return AccessDecision::Unauthorized,
        Err(e) => {
            tracing::warn!(user_id = %identity.user_id, "role lookup failed, rejecting: {:?}", e);
            return AccessDecision::Unauthorized;
        }
    };

    AccessDecision::Authorized {
        admin: AdminIdentity {
            user_id: identity.user_id,
            email: identity.email,
            role,
        },
        rotated: identity.rotated,
    }
}

/// GateError
///
/// The named failures raised by the per-operation guard. Handlers surface
/// these as generic status responses; lookup details stay in the logs.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GateError {
    NotAuthenticated,
    NotAuthorized,
}

impl From<GateError> for StatusCode {
    fn from(e: GateError) -> Self {
        match e {
            GateError::NotAuthenticated => StatusCode::UNAUTHORIZED,
            GateError::NotAuthorized => StatusCode::FORBIDDEN,
        }
    }
}

impl IntoResponse for GateError {
    fn into_response(self) -> Response {
        match self {
            GateError::NotAuthenticated => {
                (StatusCode::UNAUTHORIZED, "authentication required").into_response()
            }
            GateError::NotAuthorized => (StatusCode::FORBIDDEN, "access denied").into_response(),
        }
    }
}

/// require_admin
///
/// The per-operation guard. Called at the top of every mutating admin
/// operation so a privileged write stays protected even if a route were ever
/// registered outside the gated router. Re-runs the full admission check
/// against current state; nothing is shared with the edge middleware's
/// earlier decision.
///
/// The request context is passed in explicitly (state and cookie jar); there
/// is no ambient session to consult.
pub async fn require_admin(
    state: &AppState,
    jar: &CookieJar,
) -> Result<AdminIdentity, GateError> {
    let credentials = SessionCredentials::from_jar(jar);
    match check_admin_access(
        state.identity.as_ref(),
        state.repo.as_ref(),
        credentials.as_ref(),
        RoleChannel::Elevated,
    )
    .await
    {
        AccessDecision::Authorized { admin, .. } => Ok(admin),
        AccessDecision::Unauthenticated => Err(GateError::NotAuthenticated),
        AccessDecision::Unauthorized => Err(GateError::NotAuthorized),
    }
}

/// admin_gate
///
/// Middleware wrapping the entire admin application. Requests to the fixed
/// public paths pass through untouched (no identity or role lookup at all).
/// Everything else runs the admission check:
///
/// * no session: redirect to the login page, carrying the originally
///   requested path in the `redirect` parameter so the client can return
///   after signing in;
/// * session without an admin role: redirect to the access-denied page;
/// * authorized: forward the request, then append any rotated session
///   cookies onto the response.
pub async fn admin_gate(
    State(state): State<AppState>,
    jar: CookieJar,
    request: Request,
    next: Next,
) -> Response {
    let path = request.uri().path().to_string();

    if is_public_path(&path) {
        return next.run(request).await;
    }

    let credentials = SessionCredentials::from_jar(&jar);
    match check_admin_access(
        state.identity.as_ref(),
        state.repo.as_ref(),
        credentials.as_ref(),
        RoleChannel::Elevated,
    )
    .await
    {
        AccessDecision::Unauthenticated => {
            let target = format!("{}?redirect={}", LOGIN_PATH, urlencoding::encode(&path));
            Redirect::to(&target).into_response()
        }
        AccessDecision::Unauthorized => Redirect::to(ACCESS_DENIED_PATH).into_response(),
        AccessDecision::Authorized { rotated, .. } => {
            let mut response = next.run(request).await;
            if let Some(rotated) = rotated {
                for cookie in rotated.to_cookies() {
                    match HeaderValue::from_str(&cookie.to_string()) {
                        Ok(value) => {
                            response.headers_mut().append(SET_COOKIE, value);
                        }
                        Err(e) => {
                            tracing::error!("invalid rotated session cookie: {:?}", e);
                        }
                    }
                }
            }
            response
        }
    }
}
