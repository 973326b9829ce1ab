//! Middleware module.
//!
//! Provides authentication and other request processing middleware.

use axum::{
    body::Body,
    extract::Request,
    http::{header, Method},
    middleware::Next,
    response::Response,
};
use axum_extra::extract::CookieJar;

use crate::error::AppError;
use crate::utils::{parse_token, Claims};

/// Extension type for storing authenticated user claims.
/// Can be extracted in handlers via axum's Extension extractor.
#[derive(Clone)]
#[allow(dead_code)]
pub struct AuthUser(pub Claims);

/// JWT Authentication Middleware.
///
/// Validates the Authorization header or cookie token to verify JWT
/// validity, and enforces the token role on mutating requests.
///
/// # Authentication Header Format
///
/// `Authorization: Bearer <token>`
///
/// # Process
///
/// 1. Check for Authorization header with Bearer schema
/// 2. If not found, check for token in cookies
/// 3. Parse and validate the JWT token
/// 4. Reject mutating methods for viewer tokens
/// 5. Store user claims in request extensions
///
/// # Error Responses
///
/// - 401 Unauthorized: When no token is provided or token is invalid
/// - 403 Forbidden: When a viewer token attempts a mutation
pub async fn jwt_auth(
    jar: CookieJar,
    mut request: Request<Body>,
    next: Next,
) -> Result<Response, AppError> {
    let token = extract_token(&request, &jar);

    let Some(token) = token else {
        return Err(AppError::Unauthorized("No token provided".to_string()));
    };

    let claims = parse_token(&token).map_err(|e| AppError::Unauthorized(e.to_string()))?;

    if is_mutation(request.method()) && !claims.can_write() {
        return Err(AppError::Forbidden(
            "This token does not permit write operations".to_string(),
        ));
    }

    request.extensions_mut().insert(AuthUser(claims));
    Ok(next.run(request).await)
}

/// Methods that mutate resources and therefore require a writable role.
fn is_mutation(method: &Method) -> bool {
    *method != Method::GET && *method != Method::HEAD && *method != Method::OPTIONS
}

/// Extracts the JWT token from the request.
///
/// First checks the Authorization header for a Bearer token,
/// then falls back to checking cookies.
fn extract_token(request: &Request<Body>, jar: &CookieJar) -> Option<String> {
    // Try Authorization header first
    if let Some(auth_header) = request.headers().get(header::AUTHORIZATION) {
        if let Ok(auth_str) = auth_header.to_str() {
            if let Some(token) = auth_str.strip_prefix("Bearer ") {
                return Some(token.to_string());
            }
        }
    }

    // Fall back to cookie
    jar.get("token").map(|c| c.value().to_string())
}
