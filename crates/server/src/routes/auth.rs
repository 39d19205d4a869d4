use axum::{
    extract::{FromRef, FromRequestParts},
    http::request::Parts,
};
use chrono::Utc;

use valuequest_api::crypto::verify_id_token;
use valuequest_api::{Role, db};

use crate::config::AppConfig;
use crate::error::ApiErr;
use crate::storage::{Db, sq_execute};

// ---------------------------------------------------------------------------
// Auth extractor
// ---------------------------------------------------------------------------

/// Authenticated user extracted from the `Authorization: Bearer <id token>` header.
///
/// The first request for a subject creates its `users` row; later requests
/// refresh email and role from the token claims.
#[derive(Debug, Clone)]
pub struct AuthUser {
    pub user_id: String,
    pub role: Role,
}

impl AuthUser {
    pub fn is_teacher(&self) -> bool {
        self.role == Role::Teacher
    }

    pub fn require_teacher(&self) -> Result<(), ApiErr> {
        if self.is_teacher() {
            Ok(())
        } else {
            Err(ApiErr::forbidden("teacher role required"))
        }
    }
}

impl<S> FromRequestParts<S> for AuthUser
where
    S: Send + Sync,
    Db: FromRef<S>,
    AppConfig: FromRef<S>,
{
    type Rejection = ApiErr;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let config = AppConfig::from_ref(state);
        if !config.auth_enabled() {
            return Err(ApiErr::unauthorized("authentication is not configured"));
        }

        let token = parts
            .headers
            .get("authorization")
            .and_then(|v| v.to_str().ok())
            .and_then(|v| v.strip_prefix("Bearer "))
            .ok_or_else(|| ApiErr::unauthorized("missing or invalid Authorization header"))?;

        let now = u64::try_from(Utc::now().timestamp()).unwrap_or(0);
        let claims = verify_id_token(
            token,
            &config.token_secret,
            config.project_id.as_deref(),
            now,
        )?;

        let role = match claims.role.as_deref() {
            Some("teacher") => Role::Teacher,
            _ => Role::Student,
        };

        let db = Db::from_ref(state);
        let conn = db.conn();
        sq_execute(
            &conn,
            db::users::upsert_from_token(
                &claims.sub,
                claims.email.as_deref(),
                claims.name.as_deref(),
                role.as_str(),
            ),
        )
        .map_err(ApiErr::from_db("upsert user"))?;

        Ok(AuthUser {
            user_id: claims.sub,
            role,
        })
    }
}
