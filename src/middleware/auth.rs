// src/middleware/auth.rs
use axum::http::Request;
use axum::http::StatusCode;
use axum::middleware::Next;
use axum::response::{IntoResponse, Response};
use serde::Serialize;
use uuid::Uuid;

use crate::auth::jwt::verify_token;

/// Typed tenant context attached to every authenticated request.
///
/// Every query downstream is scoped by `org_id`; handlers never read claims
/// or headers directly.
#[derive(Clone)]
pub struct OrgContext {
    pub user_id: Uuid,
    pub org_id: Uuid,
    pub role: String,
    pub is_primary: bool,
}

#[derive(Serialize)]
struct ErrorBody {
    error: String,
    code: &'static str,
}

pub async fn require_auth(mut req: Request<axum::body::Body>, next: Next) -> Response {
    let auth_header = match req.headers().get("Authorization").and_then(|v| v.to_str().ok()) {
        Some(h) => h,
        None => return unauthorized("Missing Authorization header"),
    };

    // Expect "Bearer <token>"
    let token = match auth_header.strip_prefix("Bearer ") {
        Some(t) => t,
        None => return unauthorized("Invalid Authorization format"),
    };

    let secret = match std::env::var("JWT_SECRET") {
        Ok(s) => s,
        Err(_) => return unauthorized("Server auth misconfiguration"),
    };

    let claims = match verify_token(token, &secret) {
        Ok(c) => c,
        Err(_) => return unauthorized("Invalid or expired token"),
    };

    req.extensions_mut().insert(OrgContext {
        user_id: claims.sub,
        org_id: claims.org_id,
        role: claims.role,
        is_primary: claims.is_primary,
    });

    next.run(req).await
}

fn unauthorized(msg: &str) -> Response {
    let body = axum::Json(ErrorBody {
        error: msg.to_string(),
        code: "unauthorized",
    });
    (StatusCode::UNAUTHORIZED, body).into_response()
}
