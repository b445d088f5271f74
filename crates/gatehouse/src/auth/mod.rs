// Authentication module
// Decision: Session-backed auth - opaque cookie tokens resolved server-side,
// so logout and expiry are store operations, not token properties

pub mod config;
pub mod error;
pub mod middleware;
pub mod oauth;
pub mod pkce;
pub mod reconcile;
pub mod routes;

pub use config::AuthConfig;
pub use error::AuthError;
pub use middleware::{AuthState, CurrentUser, OptionalCurrentUser};
pub use routes::routes;
