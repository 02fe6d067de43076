//! Authentication middleware
//!
//! Bearer tokens are optional. A request without a token runs as the
//! anonymous operator when anonymous access is enabled; a token that is
//! present but invalid is always rejected.

use axum::{
    extract::{Request, State},
    http::{header::AUTHORIZATION, StatusCode},
    middleware::Next,
    response::{IntoResponse, Response},
    Json,
};
use shared::{ApiErrorBody, ApiErrorDetail};

use crate::AppState;

/// Operator the request runs as
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct AuthUser {
    /// Token subject, or `anonymous`
    pub user_id: String,
    /// Name recorded on ledger entries
    pub display_name: String,
}

impl AuthUser {
    pub fn anonymous() -> Self {
        Self {
            user_id: "anonymous".to_string(),
            display_name: "anonymous".to_string(),
        }
    }

    pub fn is_anonymous(&self) -> bool {
        self.user_id == "anonymous"
    }
}

/// JWT claims structure
#[derive(Debug, serde::Serialize, serde::Deserialize)]
pub struct Claims {
    pub sub: String,
    #[serde(default)]
    pub name: Option<String>,
    pub exp: i64,
    pub iat: i64,
}

/// Resolve the operator for every request under `/api/v1`
pub async fn auth_middleware(State(state): State<AppState>, mut request: Request, next: Next) -> Response {
    let auth_header = request
        .headers()
        .get(AUTHORIZATION)
        .and_then(|h| h.to_str().ok());

    let user = match auth_header {
        Some(header) => {
            let Some(token) = header.strip_prefix("Bearer ") else {
                return unauthorized_response("Malformed Authorization header");
            };
            match decode_jwt(token, &state.config.jwt.secret) {
                Ok(claims) => AuthUser {
                    display_name: claims.name.unwrap_or_else(|| claims.sub.clone()),
                    user_id: claims.sub,
                },
                Err(msg) => {
                    tracing::warn!("Rejected bearer token: {}", msg);
                    return unauthorized_response("Invalid token");
                }
            }
        }
        None if state.config.auth.allow_anonymous => AuthUser::anonymous(),
        None => return unauthorized_response("Missing Authorization header"),
    };

    request.extensions_mut().insert(user);

    next.run(request).await
}

/// Decode and validate JWT token
pub fn decode_jwt(token: &str, secret: &str) -> Result<Claims, String> {
    use jsonwebtoken::{decode, DecodingKey, Validation};

    decode::<Claims>(
        token,
        &DecodingKey::from_secret(secret.as_bytes()),
        &Validation::default(),
    )
    .map(|data| data.claims)
    .map_err(|e| format!("Invalid token: {}", e))
}

fn unauthorized_body(message: &str) -> Json<ApiErrorBody> {
    Json(ApiErrorBody {
        success: false,
        error: ApiErrorDetail {
            code: "UNAUTHORIZED".to_string(),
            message: message.to_string(),
            field: None,
        },
    })
}

/// Create unauthorized response
fn unauthorized_response(message: &str) -> Response {
    (StatusCode::UNAUTHORIZED, unauthorized_body(message)).into_response()
}

/// Extractor for the operator resolved by [`auth_middleware`]
#[derive(Clone, Debug)]
pub struct CurrentUser(pub AuthUser);

#[axum::async_trait]
impl<S> axum::extract::FromRequestParts<S> for CurrentUser
where
    S: Send + Sync,
{
    type Rejection = (StatusCode, Json<ApiErrorBody>);

    async fn from_request_parts(
        parts: &mut axum::http::request::Parts,
        _state: &S,
    ) -> Result<Self, Self::Rejection> {
        parts
            .extensions
            .get::<AuthUser>()
            .cloned()
            .map(CurrentUser)
            .ok_or_else(|| (StatusCode::UNAUTHORIZED, unauthorized_body("Authentication required")))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use jsonwebtoken::{encode, EncodingKey, Header};

    fn token(secret: &str, exp_offset: i64) -> String {
        let now = chrono::Utc::now().timestamp();
        let claims = Claims {
            sub: "user-7".to_string(),
            name: Some("Dana".to_string()),
            exp: now + exp_offset,
            iat: now,
        };
        encode(&Header::default(), &claims, &EncodingKey::from_secret(secret.as_bytes())).unwrap()
    }

    #[test]
    fn test_decode_valid_token() {
        let claims = decode_jwt(&token("s3cret", 3600), "s3cret").unwrap();
        assert_eq!(claims.sub, "user-7");
        assert_eq!(claims.name.as_deref(), Some("Dana"));
    }

    #[test]
    fn test_decode_rejects_wrong_secret() {
        assert!(decode_jwt(&token("s3cret", 3600), "other").is_err());
    }

    #[test]
    fn test_decode_rejects_expired_token() {
        assert!(decode_jwt(&token("s3cret", -3600), "s3cret").is_err());
    }
}
