// Identity resolution: session cookie -> session record -> user row
// Decision: Resolution is a pure read; it never touches the session or the
// store beyond lookups, and a vanished account resolves to anonymous

use axum::{extract::FromRequestParts, http::request::Parts};
use axum_extra::extract::CookieJar;

use super::config::AuthConfig;
use super::error::AuthError;
use crate::mail::Mailer;
use crate::session::SessionStore;
use crate::storage::{StorageBackend, UserRow};

/// Auth state shared across routes: the dependency-injected service handles
/// every flow works through.
#[derive(Clone)]
pub struct AuthState {
    pub config: AuthConfig,
    pub db: StorageBackend,
    pub sessions: SessionStore,
    pub mailer: Mailer,
}

impl AuthState {
    pub fn new(
        config: AuthConfig,
        db: StorageBackend,
        sessions: SessionStore,
        mailer: Mailer,
    ) -> Self {
        Self {
            config,
            db,
            sessions,
            mailer,
        }
    }
}

/// Helper trait for extracting AuthState from application state
pub trait FromRef<T> {
    fn from_ref(input: &T) -> Self;
}

impl FromRef<AuthState> for AuthState {
    fn from_ref(input: &AuthState) -> Self {
        input.clone()
    }
}

/// The authenticated user for the current session.
/// This is required - rejects with 401 if the session resolves to nobody.
#[derive(Debug, Clone)]
pub struct CurrentUser(pub UserRow);

#[axum::async_trait]
impl<S> FromRequestParts<S> for CurrentUser
where
    S: Send + Sync,
    AuthState: FromRef<S>,
{
    type Rejection = AuthError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let auth_state = AuthState::from_ref(state);
        resolve_current_user(parts, &auth_state)
            .await?
            .map(CurrentUser)
            .ok_or(AuthError::Unauthenticated)
    }
}

/// Optional variant: resolves to None instead of rejecting when the request
/// carries no usable session. Store failures still surface.
#[derive(Debug, Clone)]
pub struct OptionalCurrentUser(pub Option<UserRow>);

#[axum::async_trait]
impl<S> FromRequestParts<S> for OptionalCurrentUser
where
    S: Send + Sync,
    AuthState: FromRef<S>,
{
    type Rejection = AuthError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let auth_state = AuthState::from_ref(state);
        Ok(OptionalCurrentUser(
            resolve_current_user(parts, &auth_state).await?,
        ))
    }
}

/// Resolve the request's session cookie to a user row.
///
/// None when the cookie is absent, the session record is gone or expired, or
/// the referenced account no longer exists.
async fn resolve_current_user(
    parts: &Parts,
    auth_state: &AuthState,
) -> Result<Option<UserRow>, AuthError> {
    let jar = CookieJar::from_headers(&parts.headers);
    let Some(cookie) = jar.get(&auth_state.config.cookie_name) else {
        return Ok(None);
    };

    let Some(user_id) = auth_state.sessions.user_id_for(cookie.value()).await? else {
        return Ok(None);
    };

    let user = auth_state.db.get_user(user_id).await?;
    if user.is_none() {
        tracing::debug!(%user_id, "session references a deleted account");
    }
    Ok(user)
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::{header, Request, StatusCode};
    use axum::routing::get;
    use axum::{body::Body, Router};
    use tower::ServiceExt;
    use uuid::Uuid;

    use crate::storage::CreateUserRow;

    fn test_state() -> AuthState {
        let config = AuthConfig::default();
        let sessions = SessionStore::in_memory(config.session_ttl);
        AuthState::new(
            config,
            StorageBackend::in_memory(),
            sessions,
            Mailer::console(),
        )
    }

    async fn whoami(CurrentUser(user): CurrentUser) -> String {
        user.id.to_string()
    }

    fn protected_app(state: AuthState) -> Router {
        Router::new()
            .route("/whoami", get(whoami))
            .with_state(state)
    }

    #[tokio::test]
    async fn test_current_user_rejects_anonymous() {
        let app = protected_app(test_state());

        let response = app
            .oneshot(Request::builder().uri("/whoami").body(Body::empty()).unwrap())
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    }

    #[tokio::test]
    async fn test_current_user_resolves_session_cookie() {
        let state = test_state();
        let user = state
            .db
            .create_user(CreateUserRow {
                email: Some("ivan@example.com".to_string()),
                password_hash: Some("$argon2id$fake".to_string()),
                confirmed: true,
                twitter_id: None,
            })
            .await
            .unwrap();
        let token = state.sessions.create_session(user.id).await.unwrap();
        let app = protected_app(state);

        let response = app
            .oneshot(
                Request::builder()
                    .uri("/whoami")
                    .header(header::COOKIE, format!("sid={token}"))
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
    }

    #[tokio::test]
    async fn test_session_for_vanished_account_rejects() {
        let state = test_state();
        // the session exists but the account it names does not
        let token = state.sessions.create_session(Uuid::now_v7()).await.unwrap();
        let app = protected_app(state);

        let response = app
            .oneshot(
                Request::builder()
                    .uri("/whoami")
                    .header(header::COOKIE, format!("sid={token}"))
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    }
}
