// Authentication configuration loaded from environment variables.
// Decision: Optional provider blocks are gated on both credentials being set
// Decision: Missing DATABASE_URL / REDIS_URL select the in-memory dev backends

use std::time::Duration;

/// Twitter OAuth configuration
#[derive(Debug, Clone)]
pub struct TwitterOAuthConfig {
    pub client_id: String,
    pub client_secret: String,
    pub redirect_uri: String,
}

/// Complete authentication configuration
#[derive(Debug, Clone)]
pub struct AuthConfig {
    /// Base URL this server is reachable at (confirmation links, OAuth callback)
    pub base_url: String,
    /// Front-end URL the OAuth callback redirects to on success
    pub front_end_url: String,
    /// Session lifetime (default: 7 days)
    pub session_ttl: Duration,
    /// Session cookie name
    pub cookie_name: String,
    /// Mark the session cookie Secure (HTTPS-only)
    pub cookie_secure: bool,
    /// Twitter OAuth configuration
    pub twitter: Option<TwitterOAuthConfig>,
}

impl Default for AuthConfig {
    fn default() -> Self {
        Self {
            base_url: "http://localhost:4000".to_string(),
            front_end_url: "/".to_string(),
            session_ttl: Duration::from_secs(7 * 24 * 60 * 60), // 7 days
            cookie_name: "sid".to_string(),
            cookie_secure: false,
            twitter: None,
        }
    }
}

impl AuthConfig {
    /// Load configuration from environment variables
    pub fn from_env() -> Self {
        let base_url =
            std::env::var("BASE_URL").unwrap_or_else(|_| "http://localhost:4000".to_string());

        let front_end_url = std::env::var("FRONT_END_URL").unwrap_or_else(|_| "/".to_string());

        let session_ttl = std::env::var("SESSION_TTL_DAYS")
            .ok()
            .and_then(|s| s.parse().ok())
            .map(|days: u64| Duration::from_secs(days * 24 * 60 * 60))
            .unwrap_or_else(|| Duration::from_secs(7 * 24 * 60 * 60));

        let cookie_name = std::env::var("COOKIE_NAME").unwrap_or_else(|_| "sid".to_string());

        let cookie_secure = std::env::var("COOKIE_SECURE")
            .map(|s| s.to_lowercase() == "true" || s == "1")
            .unwrap_or(false);

        let twitter = match (
            std::env::var("TWITTER_CLIENT_ID"),
            std::env::var("TWITTER_CLIENT_SECRET"),
        ) {
            (Ok(client_id), Ok(client_secret))
                if !client_id.is_empty() && !client_secret.is_empty() =>
            {
                let redirect_uri = std::env::var("TWITTER_REDIRECT_URI")
                    .unwrap_or_else(|_| format!("{}/auth/twitter/callback", base_url));
                Some(TwitterOAuthConfig {
                    client_id,
                    client_secret,
                    redirect_uri,
                })
            }
            _ => None,
        };

        Self {
            base_url,
            front_end_url,
            session_ttl,
            cookie_name,
            cookie_secure,
            twitter,
        }
    }

    /// Check if OAuth login is available
    pub fn oauth_enabled(&self) -> bool {
        self.twitter.is_some()
    }

    /// Confirmation link for a token, as placed in the registration email.
    pub fn confirmation_link(&self, token: &str) -> String {
        format!("{}/confirm/{}", self.base_url, token)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = AuthConfig::default();
        assert_eq!(config.session_ttl, Duration::from_secs(7 * 24 * 60 * 60));
        assert_eq!(config.cookie_name, "sid");
        assert!(!config.cookie_secure);
        assert!(!config.oauth_enabled());
    }

    #[test]
    fn test_confirmation_link() {
        let config = AuthConfig::default();
        assert_eq!(
            config.confirmation_link("abc123"),
            "http://localhost:4000/confirm/abc123"
        );
    }

    #[test]
    fn test_oauth_enabled_with_twitter() {
        let config = AuthConfig {
            twitter: Some(TwitterOAuthConfig {
                client_id: "id".to_string(),
                client_secret: "secret".to_string(),
                redirect_uri: "http://localhost:4000/auth/twitter/callback".to_string(),
            }),
            ..Default::default()
        };
        assert!(config.oauth_enabled());
    }
}
