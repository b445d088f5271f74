// Authentication HTTP routes
// Decision: JSON API under /v1/auth/*; the confirmation link and the OAuth
// redirect/callback keep their classic top-level paths since they are typed
// into browsers / registered with the provider
// Decision: Login never reveals which credential check failed

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    response::Redirect,
    routing::{get, post},
    Json, Router,
};
use axum_extra::extract::cookie::{Cookie, CookieJar, SameSite};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;

use super::{
    error::{AuthError, ErrorResponse},
    middleware::{AuthState, OptionalCurrentUser},
    oauth::TwitterOAuthService,
    pkce,
    reconcile::resolve_twitter_identity,
};
use crate::storage::{password, CreateUserRow, UserRow};

/// Register request
#[derive(Debug, Deserialize, ToSchema)]
pub struct RegisterRequest {
    pub email: String,
    pub password: String,
}

/// Login request
#[derive(Debug, Deserialize, ToSchema)]
pub struct LoginRequest {
    pub email: String,
    pub password: String,
}

/// Public view of a user account
#[derive(Debug, Serialize, ToSchema)]
pub struct UserResponse {
    pub id: Uuid,
    pub email: Option<String>,
}

impl From<UserRow> for UserResponse {
    fn from(row: UserRow) -> Self {
        Self {
            id: row.id,
            email: row.email,
        }
    }
}

/// Current-user response
#[derive(Debug, Serialize, ToSchema)]
pub struct MeResponse {
    pub me: Option<UserResponse>,
}

/// OAuth callback query parameters
#[derive(Debug, Deserialize)]
pub struct OAuthCallbackQuery {
    pub code: Option<String>,
    pub state: Option<String>,
    /// Set by the provider when the user denies the grant
    pub error: Option<String>,
}

/// Create auth routes
pub fn routes(state: AuthState) -> Router {
    Router::new()
        .route("/v1/auth/register", post(register))
        .route("/v1/auth/login", post(login))
        .route("/v1/auth/logout", post(logout))
        .route("/v1/auth/me", get(me))
        // Side-channel routes (browser-facing, not part of the JSON API)
        .route("/confirm/:id", get(confirm_email))
        .route("/auth/twitter", get(twitter_redirect))
        .route("/auth/twitter/callback", get(twitter_callback))
        .with_state(state)
}

const EMAIL_MIN: usize = 3;
const EMAIL_MAX: usize = 255;
const PASSWORD_MIN: usize = 3;
const PASSWORD_MAX: usize = 255;

fn validate_credentials(email: &str, password: &str) -> Result<(), AuthError> {
    if email.len() < EMAIL_MIN {
        return Err(AuthError::ValidationFailed(
            "email must be at least 3 characters".to_string(),
        ));
    }
    if email.len() > EMAIL_MAX {
        return Err(AuthError::ValidationFailed(
            "email must be at most 255 characters".to_string(),
        ));
    }
    if !email.contains('@') {
        return Err(AuthError::ValidationFailed(
            "email must be a valid email".to_string(),
        ));
    }
    if password.len() < PASSWORD_MIN {
        return Err(AuthError::ValidationFailed(
            "password must be at least 3 characters".to_string(),
        ));
    }
    if password.len() > PASSWORD_MAX {
        return Err(AuthError::ValidationFailed(
            "password must be at most 255 characters".to_string(),
        ));
    }
    Ok(())
}

/// Build the session cookie carrying an opaque token.
fn session_cookie(state: &AuthState, token: String) -> Cookie<'static> {
    Cookie::build((state.config.cookie_name.clone(), token))
        .path("/")
        .http_only(true)
        .secure(state.config.cookie_secure)
        .same_site(SameSite::Lax)
        .max_age(time::Duration::seconds(
            state.config.session_ttl.as_secs() as i64
        ))
        .build()
}

/// Log a resolved user in: create a fresh session record and set the cookie.
async fn start_session(
    state: &AuthState,
    jar: CookieJar,
    user_id: Uuid,
) -> Result<CookieJar, AuthError> {
    let token = state.sessions.create_session(user_id).await?;
    Ok(jar.add(session_cookie(state, token)))
}

/// POST /v1/auth/register - Create an account with email and password
#[utoipa::path(
    post,
    path = "/v1/auth/register",
    request_body = RegisterRequest,
    responses(
        (status = 201, description = "Account created", body = UserResponse),
        (status = 400, description = "Validation failure or duplicate email", body = ErrorResponse)
    ),
    tag = "auth"
)]
pub async fn register(
    State(state): State<AuthState>,
    Json(req): Json<RegisterRequest>,
) -> Result<(StatusCode, Json<UserResponse>), AuthError> {
    validate_credentials(&req.email, &req.password)?;

    // Uniqueness is enforced here, by lookup-before-insert - the email
    // column itself carries no constraint
    if state.db.get_user_by_email(&req.email).await?.is_some() {
        return Err(AuthError::DuplicateEmail);
    }

    let password_hash = password::hash_password(&req.password)?;

    let user = state
        .db
        .create_user(CreateUserRow {
            email: Some(req.email.clone()),
            password_hash: Some(password_hash),
            confirmed: false,
            twitter_id: None,
        })
        .await?;

    let token = state.sessions.create_confirmation(user.id).await?;
    let link = state.config.confirmation_link(&token);
    state.mailer.send_confirmation(&req.email, &link).await;

    tracing::info!(user_id = %user.id, "registered new account");
    Ok((StatusCode::CREATED, Json(user.into())))
}

/// POST /v1/auth/login - Log in with email and password
#[utoipa::path(
    post,
    path = "/v1/auth/login",
    request_body = LoginRequest,
    responses(
        (status = 200, description = "Logged in; session cookie set", body = UserResponse),
        (status = 401, description = "Invalid credentials", body = ErrorResponse)
    ),
    tag = "auth"
)]
pub async fn login(
    State(state): State<AuthState>,
    jar: CookieJar,
    Json(req): Json<LoginRequest>,
) -> Result<(CookieJar, Json<UserResponse>), AuthError> {
    let user = state
        .db
        .get_user_by_email(&req.email)
        .await?
        .ok_or(AuthError::InvalidCredentials)?;

    // OAuth-only accounts have no password and cannot log in this way;
    // the error is indistinguishable from a wrong password
    let password_hash = user
        .password_hash
        .as_deref()
        .ok_or(AuthError::InvalidCredentials)?;

    if !password::verify_password(&req.password, password_hash) {
        return Err(AuthError::InvalidCredentials);
    }

    let jar = start_session(&state, jar, user.id).await?;
    Ok((jar, Json(user.into())))
}

/// POST /v1/auth/logout - End the current session
///
/// Destroys only the session named by the caller's cookie; other sessions
/// for the same account stay logged in. Idempotent.
#[utoipa::path(
    post,
    path = "/v1/auth/logout",
    responses(
        (status = 200, description = "Session ended (or there was none)")
    ),
    tag = "auth"
)]
pub async fn logout(
    State(state): State<AuthState>,
    jar: CookieJar,
) -> Result<CookieJar, AuthError> {
    if let Some(cookie) = jar.get(&state.config.cookie_name) {
        state.sessions.destroy_session(cookie.value()).await?;
    }

    Ok(jar.remove(
        Cookie::build(state.config.cookie_name.clone())
            .path("/")
            .build(),
    ))
}

/// GET /v1/auth/me - The current user, or null
#[utoipa::path(
    get,
    path = "/v1/auth/me",
    responses(
        (status = 200, description = "Current user view; me is null when anonymous", body = MeResponse)
    ),
    tag = "auth"
)]
pub async fn me(OptionalCurrentUser(user): OptionalCurrentUser) -> Json<MeResponse> {
    Json(MeResponse {
        me: user.map(UserResponse::from),
    })
}

/// GET /confirm/:id - Email confirmation link target
///
/// Marks the account confirmed. The token is not consumed, so following the
/// link twice succeeds both times. An unknown token yields a detail-free 404
/// rather than confirming account existence to probers.
#[utoipa::path(
    get,
    path = "/confirm/{id}",
    params(("id" = String, Path, description = "Confirmation token from the email link")),
    responses(
        (status = 200, description = "Account confirmed"),
        (status = 404, description = "Unknown or expired token", body = ErrorResponse)
    ),
    tag = "auth"
)]
pub async fn confirm_email(
    State(state): State<AuthState>,
    Path(id): Path<String>,
) -> Result<&'static str, AuthError> {
    let user_id = state
        .sessions
        .confirmation_user(&id)
        .await?
        .ok_or(AuthError::NotFound)?;

    state
        .db
        .set_user_confirmed(user_id)
        .await?
        .ok_or(AuthError::NotFound)?;

    Ok("ok")
}

/// GET /auth/twitter - Redirect to the provider's authorization page
pub async fn twitter_redirect(State(state): State<AuthState>) -> Result<Redirect, AuthError> {
    let Some(config) = state.config.twitter.as_ref() else {
        tracing::warn!("twitter login requested but no provider is configured");
        return Err(AuthError::ProviderAuthFailed);
    };
    let service = TwitterOAuthService::new(config);

    let oauth_state = pkce::generate_state();
    let verifier = pkce::generate_code_verifier();
    let challenge = pkce::compute_code_challenge(&verifier);

    // The verifier is stashed server-side under the state parameter and
    // recovered on the callback; a forged or expired state finds nothing
    state.sessions.stash_oauth_state(&oauth_state, &verifier).await?;

    Ok(Redirect::to(&service.authorization_url(&oauth_state, &challenge)))
}

/// GET /auth/twitter/callback - Provider redirect target
///
/// On success the reconciled account is logged in (session cookie set) and
/// the browser is sent to the front-end root. A failed round-trip mutates
/// neither store.
pub async fn twitter_callback(
    State(state): State<AuthState>,
    Query(query): Query<OAuthCallbackQuery>,
    jar: CookieJar,
) -> Result<(CookieJar, Redirect), AuthError> {
    let Some(config) = state.config.twitter.as_ref() else {
        return Err(AuthError::ProviderAuthFailed);
    };
    let service = TwitterOAuthService::new(config);

    if let Some(error) = query.error {
        tracing::debug!(%error, "provider denied the authorization request");
        return Err(AuthError::ProviderAuthFailed);
    }
    let (Some(code), Some(oauth_state)) = (query.code, query.state) else {
        return Err(AuthError::ProviderAuthFailed);
    };

    let verifier = state
        .sessions
        .take_oauth_state(&oauth_state)
        .await?
        .ok_or(AuthError::ProviderAuthFailed)?;

    let profile = service.exchange_code(&code, &verifier).await.map_err(|e| {
        tracing::error!("OAuth exchange failed: {e:#}");
        AuthError::ProviderAuthFailed
    })?;

    let user =
        resolve_twitter_identity(&state.db, &profile.external_id, &profile.candidate_emails)
            .await?;

    let jar = start_session(&state, jar, user.id).await?;
    Ok((jar, Redirect::to(&state.config.front_end_url)))
}
