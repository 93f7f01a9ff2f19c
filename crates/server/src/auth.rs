//! Bearer token authentication and request tracing context.

use crate::error::{ApiError, ApiResult};
use crate::state::AppState;
use axum::extract::{Request, State};
use axum::http::header::AUTHORIZATION;
use axum::middleware::Next;
use axum::response::Response;
use folio_core::OwnerId;
use folio_core::config::AuthConfig;
use jsonwebtoken::errors::ErrorKind;
use jsonwebtoken::{Algorithm, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use time::{Duration, OffsetDateTime};
use tracing::Instrument;
use uuid::Uuid;

/// Maximum length for trace IDs.
/// Longer trace IDs are truncated to prevent log bloat and potential log injection.
const MAX_TRACE_ID_LEN: usize = 128;

/// Trace ID for request correlation.
#[derive(Clone, Debug)]
pub struct TraceId(pub String);

impl TraceId {
    /// Generate a new random trace ID.
    pub fn new() -> Self {
        Self(Uuid::new_v4().to_string())
    }

    /// Create a trace ID from a client-provided value.
    /// The value is truncated to MAX_TRACE_ID_LEN characters and stripped of
    /// anything but printable ASCII.
    pub fn from_client(value: &str) -> Self {
        let sanitized: String = value
            .chars()
            .take(MAX_TRACE_ID_LEN)
            .filter(|c| c.is_ascii_graphic() || *c == ' ')
            .collect();

        if sanitized.is_empty() {
            Self::new()
        } else {
            Self(sanitized)
        }
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl Default for TraceId {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Display for TraceId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// JWT claims carried by access tokens.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Claims {
    /// Owning user id.
    pub sub: String,
    /// Expiry, seconds since the Unix epoch.
    pub exp: i64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub iat: Option<i64>,
}

/// HS256 verifier built once from [`AuthConfig`].
#[derive(Clone)]
pub struct TokenVerifier {
    key: DecodingKey,
    validation: Validation,
    leeway_secs: i64,
}

impl TokenVerifier {
    pub fn new(config: &AuthConfig) -> Self {
        // Signature only; expiry is checked below against our own clock.
        let mut validation = Validation::new(Algorithm::HS256);
        validation.validate_exp = false;
        validation.validate_nbf = false;
        validation.required_spec_claims = HashSet::from(["exp".to_string()]);
        Self {
            key: DecodingKey::from_secret(config.jwt_secret.as_bytes()),
            validation,
            leeway_secs: i64::try_from(config.leeway_secs).unwrap_or(i64::MAX),
        }
    }

    /// Verify signature and expiry, returning the owner named by `sub`.
    pub fn verify(&self, token: &str) -> ApiResult<OwnerId> {
        let data = jsonwebtoken::decode::<Claims>(token, &self.key, &self.validation).map_err(
            |e| match e.kind() {
                ErrorKind::InvalidSignature => {
                    ApiError::Unauthorized("token signature is invalid".to_string())
                }
                _ => ApiError::Unauthorized(format!("invalid token: {e}")),
            },
        )?;

        let now = OffsetDateTime::now_utc().unix_timestamp();
        if data.claims.exp < now.saturating_sub(self.leeway_secs) {
            return Err(ApiError::Unauthorized("token expired".to_string()));
        }

        OwnerId::parse(&data.claims.sub)
            .map_err(|_| ApiError::Unauthorized("token subject is empty".to_string()))
    }
}

/// Sign an HS256 access token for `owner`, valid for `ttl`.
///
/// Tokens are normally minted by the identity provider; this exists for
/// local development and tests.
pub fn issue_token(config: &AuthConfig, owner: &OwnerId, ttl: Duration) -> ApiResult<String> {
    let now = OffsetDateTime::now_utc();
    let claims = Claims {
        sub: owner.to_string(),
        exp: (now + ttl).unix_timestamp(),
        iat: Some(now.unix_timestamp()),
    };
    jsonwebtoken::encode(
        &Header::new(Algorithm::HS256),
        &claims,
        &EncodingKey::from_secret(config.jwt_secret.as_bytes()),
    )
    .map_err(|e| ApiError::Internal(format!("failed to sign token: {e}")))
}

/// Authenticated request extension.
#[derive(Clone, Debug)]
pub struct AuthenticatedUser {
    pub owner: OwnerId,
}

/// Extract bearer token from Authorization header.
/// Per RFC 6750, the "Bearer" scheme is case-insensitive.
fn extract_bearer_token(req: &Request) -> Option<&str> {
    req.headers()
        .get(AUTHORIZATION)
        .and_then(|v| v.to_str().ok())
        .and_then(|v| {
            if v.len() >= 7 && v[..7].eq_ignore_ascii_case("bearer ") {
                Some(v[7..].trim())
            } else {
                None
            }
        })
}

/// Extract trace ID from X-Trace-Id header or generate a new one.
fn extract_or_generate_trace_id(req: &Request) -> TraceId {
    req.headers()
        .get("x-trace-id")
        .and_then(|v| v.to_str().ok())
        .map(TraceId::from_client)
        .unwrap_or_else(TraceId::new)
}

/// Authentication middleware that validates tokens and sets up trace context.
///
/// A missing token leaves the request anonymous (handlers decide via
/// [`require_auth`]); a present but invalid token is rejected outright.
pub async fn auth_middleware(
    State(state): State<AppState>,
    mut req: Request,
    next: Next,
) -> Result<Response, ApiError> {
    let trace_id = extract_or_generate_trace_id(&req);
    let trace_id_str = trace_id.0.clone();
    req.extensions_mut().insert(trace_id);

    let owner = match extract_bearer_token(&req) {
        Some(token) => match state.verifier.verify(token) {
            Ok(owner) => Some(owner),
            Err(e) => {
                tracing::debug!(trace_id = %trace_id_str, error = %e, "Rejected bearer token");
                return Err(e);
            }
        },
        None => None,
    };

    let span = match &owner {
        Some(owner) => tracing::info_span!("request", trace_id = %trace_id_str, owner_id = %owner),
        None => tracing::info_span!("request", trace_id = %trace_id_str),
    };

    if let Some(owner) = owner {
        req.extensions_mut().insert(AuthenticatedUser { owner });
    }

    Ok(next.run(req).instrument(span).await)
}

/// Require authentication (token must be present).
pub fn require_auth(req: &Request) -> ApiResult<&AuthenticatedUser> {
    req.extensions()
        .get::<AuthenticatedUser>()
        .ok_or_else(|| ApiError::Unauthorized("authentication required".to_string()))
}

/// Get the trace ID from request extensions.
pub fn get_trace_id(req: &Request) -> Option<&TraceId> {
    req.extensions().get::<TraceId>()
}
