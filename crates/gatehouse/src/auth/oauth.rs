// OAuth service for Twitter (X API v2) authentication
// Decision: Manual OAuth2 implementation (authorization code + PKCE S256)
// Decision: Candidate emails come from the confirmed_email user field and
// may be absent - reconciliation must cope with an empty email set

use anyhow::{Context, Result};

use super::config::TwitterOAuthConfig;

/// Identity yielded by a successful provider round-trip.
#[derive(Debug, Clone)]
pub struct OAuthProfile {
    /// Provider user ID (opaque, stable)
    pub external_id: String,
    /// Emails the provider vouches for, best first. Often empty.
    pub candidate_emails: Vec<String>,
}

/// Twitter OAuth service
#[derive(Clone)]
pub struct TwitterOAuthService {
    client_id: String,
    client_secret: String,
    redirect_uri: String,
}

impl TwitterOAuthService {
    pub fn new(config: &TwitterOAuthConfig) -> Self {
        Self {
            client_id: config.client_id.clone(),
            client_secret: config.client_secret.clone(),
            redirect_uri: config.redirect_uri.clone(),
        }
    }

    /// Generate authorization URL for the OAuth flow
    pub fn authorization_url(&self, state: &str, code_challenge: &str) -> String {
        let params = [
            ("response_type", "code"),
            ("client_id", self.client_id.as_str()),
            ("redirect_uri", self.redirect_uri.as_str()),
            ("scope", "users.read tweet.read users.email"),
            ("state", state),
            ("code_challenge", code_challenge),
            ("code_challenge_method", "S256"),
        ];

        let query = params
            .iter()
            .map(|(k, v)| format!("{}={}", k, urlencoding::encode(v)))
            .collect::<Vec<_>>()
            .join("&");

        format!("https://twitter.com/i/oauth2/authorize?{}", query)
    }

    /// Exchange authorization code for the provider profile
    pub async fn exchange_code(&self, code: &str, code_verifier: &str) -> Result<OAuthProfile> {
        let client = reqwest::Client::new();

        // Exchange code for token
        let token_response: TwitterTokenResponse = client
            .post("https://api.twitter.com/2/oauth2/token")
            .basic_auth(&self.client_id, Some(&self.client_secret))
            .form(&[
                ("code", code),
                ("grant_type", "authorization_code"),
                ("redirect_uri", self.redirect_uri.as_str()),
                ("code_verifier", code_verifier),
            ])
            .send()
            .await
            .context("Failed to exchange code")?
            .json()
            .await
            .context("Failed to parse token response")?;

        // Fetch the profile; confirmed_email requires the users.email scope
        // and is absent when the grant does not include it
        let me_response: TwitterUsersMeResponse = client
            .get("https://api.twitter.com/2/users/me")
            .query(&[("user.fields", "confirmed_email")])
            .bearer_auth(&token_response.access_token)
            .send()
            .await
            .context("Failed to fetch user info")?
            .json()
            .await
            .context("Failed to parse user info")?;

        let user = me_response.data;
        Ok(OAuthProfile {
            external_id: user.id,
            candidate_emails: user.confirmed_email.into_iter().collect(),
        })
    }
}

#[derive(Debug, serde::Deserialize)]
struct TwitterTokenResponse {
    access_token: String,
    #[allow(dead_code)]
    token_type: String,
}

#[derive(Debug, serde::Deserialize)]
struct TwitterUsersMeResponse {
    data: TwitterUserData,
}

#[derive(Debug, serde::Deserialize)]
struct TwitterUserData {
    id: String,
    confirmed_email: Option<String>,
}

/// URL encoding helper
mod urlencoding {
    pub fn encode(s: &str) -> String {
        let mut result = String::new();
        for c in s.chars() {
            match c {
                'A'..='Z' | 'a'..='z' | '0'..='9' | '-' | '_' | '.' | '~' => result.push(c),
                ' ' => result.push_str("%20"),
                _ => {
                    for byte in c.to_string().as_bytes() {
                        result.push_str(&format!("%{:02X}", byte));
                    }
                }
            }
        }
        result
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn service() -> TwitterOAuthService {
        TwitterOAuthService::new(&TwitterOAuthConfig {
            client_id: "client-id".to_string(),
            client_secret: "client-secret".to_string(),
            redirect_uri: "http://localhost:4000/auth/twitter/callback".to_string(),
        })
    }

    #[test]
    fn test_authorization_url() {
        let url = service().authorization_url("state-123", "challenge-abc");

        assert!(url.starts_with("https://twitter.com/i/oauth2/authorize?"));
        assert!(url.contains("response_type=code"));
        assert!(url.contains("client_id=client-id"));
        assert!(url.contains("state=state-123"));
        assert!(url.contains("code_challenge=challenge-abc"));
        assert!(url.contains("code_challenge_method=S256"));
        assert!(url.contains("scope=users.read%20tweet.read%20users.email"));
        assert!(url.contains(
            "redirect_uri=http%3A%2F%2Flocalhost%3A4000%2Fauth%2Ftwitter%2Fcallback"
        ));
    }

    #[test]
    fn test_users_me_parsing() {
        let with_email: TwitterUsersMeResponse = serde_json::from_str(
            r#"{"data":{"id":"2244994945","username":"bob","confirmed_email":"bob@bob.com"}}"#,
        )
        .unwrap();
        assert_eq!(with_email.data.id, "2244994945");
        assert_eq!(with_email.data.confirmed_email.as_deref(), Some("bob@bob.com"));

        let without_email: TwitterUsersMeResponse =
            serde_json::from_str(r#"{"data":{"id":"2244994945","username":"bob"}}"#).unwrap();
        assert_eq!(without_email.data.confirmed_email, None);
    }

    #[test]
    fn test_url_encoding() {
        assert_eq!(urlencoding::encode("hello world"), "hello%20world");
        assert_eq!(
            urlencoding::encode("test@example.com"),
            "test%40example.com"
        );
    }
}
