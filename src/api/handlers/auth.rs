//! Authentication handlers.

use axum::{response::IntoResponse, Json};
use axum_extra::extract::CookieJar;
use cookie::Cookie;
use validator::Validate;

use crate::api::schemas::{ApiResponse, AuthTokenRequest, AuthTokenResponse};
use crate::config::APP_CONFIG;
use crate::error::{AppError, AppResult, ValidationErrorExt};
use crate::utils::{gen_token, ROLE_ADMIN, ROLE_VIEWER};

/// Exchanges a configured API key for a bearer JWT.
///
/// The key grants `admin` by default; callers may request a `viewer`
/// token for read-only integrations. The token is also set as a session
/// cookie so browser consoles can open the WebSocket relay without
/// custom headers.
///
/// # Route
///
/// `POST /auth/token`
pub async fn auth_token_handler(
    jar: CookieJar,
    Json(req_body): Json<AuthTokenRequest>,
) -> AppResult<impl IntoResponse> {
    // 1. Validation
    req_body.validate().map_err(|e| e.to_validation_error())?;

    // 2. Key check against the configured key set
    if !APP_CONFIG
        .api_key_list()
        .iter()
        .any(|k| *k == req_body.api_key)
    {
        return Err(AppError::Unauthorized("Unknown API key".to_string()));
    }

    // 3. Resolve the requested role
    let role = resolve_role(req_body.role.as_deref())?;

    // 4. Mint the token
    let token = gen_token("console", role)?;

    let mut cookie_builder = Cookie::build(("token", token.clone()))
        .path("/")
        .http_only(true)
        .same_site(cookie::SameSite::Lax);

    // Enable Secure flag in production (HTTPS only)
    if APP_CONFIG.is_production {
        cookie_builder = cookie_builder.secure(true);
    }

    let updated_jar = jar.add(cookie_builder.build());

    Ok((
        updated_jar,
        Json(ApiResponse::record(AuthTokenResponse {
            token,
            role: role.to_string(),
            expires_in: APP_CONFIG.jwt_expiration_hours * 3600,
        })),
    ))
}

/// Maps the optional requested role onto the supported set.
fn resolve_role(requested: Option<&str>) -> AppResult<&'static str> {
    match requested {
        None => Ok(ROLE_ADMIN),
        Some(r) if r == ROLE_ADMIN => Ok(ROLE_ADMIN),
        Some(r) if r == ROLE_VIEWER => Ok(ROLE_VIEWER),
        Some(other) => Err(AppError::validation(format!(
            "'{other}' is not a valid role"
        ))),
    }
}
