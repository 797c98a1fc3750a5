use axum::http::{HeaderMap, header};
use axum::{extract::FromRequestParts, http::request::Parts};
use axum_extra::extract::CookieJar;

use crate::error::AppError;
use crate::state::AppState;
use crate::utils::jwt::{self, JwtKeys};

/// Cookies checked for a token when no `Authorization` header is present.
pub const TOKEN_COOKIES: [&str; 2] = ["spm_token", "access_token"];

/// Verified caller identity.
///
/// Add this as a handler parameter to require authentication. It is listed
/// first in handlers so an unauthenticated request never reaches the body.
#[derive(Debug, Clone)]
pub struct AuthUser {
    pub identity: String,
    pub roles: Vec<String>,
}

impl AuthUser {
    pub fn has_role(&self, role: &str) -> bool {
        self.roles.iter().any(|r| r == role)
    }
}

/// Outcome of checking a request's credentials.
#[derive(Debug)]
pub enum Authorization {
    Authorized(AuthUser),
    /// No credential, or one that does not verify.
    Unauthorized,
    /// A valid credential lacking a required role.
    Forbidden,
}

/// Resolve the caller from a bearer token or one of [`TOKEN_COOKIES`], then
/// require every role in `required_roles`.
pub fn authorize(headers: &HeaderMap, keys: &JwtKeys, required_roles: &[&str]) -> Authorization {
    let Some(token) = bearer_token(headers).or_else(|| cookie_token(headers)) else {
        return Authorization::Unauthorized;
    };

    let claims = match jwt::verify(keys, &token) {
        Ok(claims) => claims,
        Err(e) => {
            tracing::debug!("Rejected token: {}", e);
            return Authorization::Unauthorized;
        }
    };
    if claims.sub.trim().is_empty() {
        return Authorization::Unauthorized;
    }

    let user = AuthUser {
        identity: claims.sub,
        roles: claims.roles,
    };
    if required_roles.iter().all(|role| user.has_role(role)) {
        Authorization::Authorized(user)
    } else {
        Authorization::Forbidden
    }
}

fn bearer_token(headers: &HeaderMap) -> Option<String> {
    let value = headers.get(header::AUTHORIZATION)?.to_str().ok()?;
    let (scheme, token) = value.trim().split_once(' ')?;
    let token = token.trim();
    (scheme.eq_ignore_ascii_case("bearer") && !token.is_empty()).then(|| token.to_string())
}

fn cookie_token(headers: &HeaderMap) -> Option<String> {
    let jar = CookieJar::from_headers(headers);
    TOKEN_COOKIES
        .iter()
        .filter_map(|name| jar.get(name))
        .map(|cookie| cookie.value().trim())
        .find(|value| !value.is_empty())
        .map(String::from)
}

impl FromRequestParts<AppState> for AuthUser {
    type Rejection = AppError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        match authorize(&parts.headers, &state.jwt, &[]) {
            Authorization::Authorized(user) => Ok(user),
            Authorization::Unauthorized => Err(AppError::Unauthorized),
            Authorization::Forbidden => Err(AppError::Forbidden),
        }
    }
}
