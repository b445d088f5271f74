// Session store backed by Redis (production) or memory (dev mode)
// Decision: Same enum-dispatch shape as the storage backend
// Decision: Opaque random tokens held in an HttpOnly cookie; the server-side
// record is the only place the user id lives
//
// Three keyspaces share the store:
// - sess:{token}    -> user id, session TTL (default 7 days), one per login
// - confirm:{token} -> user id, 24h TTL, NOT consumed on read so the
//                      confirmation link stays valid until it expires
// - oauth:{state}   -> PKCE code verifier, 10min TTL, consumed on callback

use anyhow::Result;
use bb8_redis::{bb8, redis::AsyncCommands, RedisConnectionManager};
use chrono::{DateTime, Duration, Utc};
use parking_lot::RwLock;
use rand::Rng;
use std::collections::HashMap;
use std::sync::Arc;
use uuid::Uuid;

const SESSION_PREFIX: &str = "sess:";
const CONFIRM_PREFIX: &str = "confirm:";
const OAUTH_STATE_PREFIX: &str = "oauth:";

const CONFIRMATION_TTL_SECS: u64 = 60 * 60 * 24;
const OAUTH_STATE_TTL_SECS: u64 = 60 * 10;

/// Generate an opaque session token (64 hex characters).
fn generate_token() -> String {
    let mut rng = rand::thread_rng();
    let bytes: [u8; 32] = rng.gen();
    hex::encode(bytes)
}

/// Key-value store for sessions and short-lived auth tokens.
#[derive(Clone)]
pub struct SessionStore {
    kv: Kv,
    session_ttl_secs: u64,
}

#[derive(Clone)]
enum Kv {
    /// Redis pool (production)
    Redis(bb8::Pool<RedisConnectionManager>),
    /// In-memory map (dev mode)
    InMemory(Arc<InMemoryKv>),
}

impl SessionStore {
    /// Connect a Redis-backed store.
    pub async fn redis(redis_url: &str, session_ttl: std::time::Duration) -> Result<Self> {
        let manager = RedisConnectionManager::new(redis_url)?;
        let pool = bb8::Pool::builder().build(manager).await?;
        Ok(Self {
            kv: Kv::Redis(pool),
            session_ttl_secs: session_ttl.as_secs(),
        })
    }

    /// Create an in-memory store (dev mode, tests).
    pub fn in_memory(session_ttl: std::time::Duration) -> Self {
        Self {
            kv: Kv::InMemory(Arc::new(InMemoryKv::default())),
            session_ttl_secs: session_ttl.as_secs(),
        }
    }

    /// Create a fresh session record for a user and return its token.
    /// Every login gets its own record; sessions never share tokens.
    pub async fn create_session(&self, user_id: Uuid) -> Result<String> {
        let token = generate_token();
        self.set(
            format!("{SESSION_PREFIX}{token}"),
            user_id.to_string(),
            self.session_ttl_secs,
        )
        .await?;
        Ok(token)
    }

    /// Resolve a session token to the user id it carries, if the session
    /// still exists and has not expired.
    pub async fn user_id_for(&self, token: &str) -> Result<Option<Uuid>> {
        let value = self.get(&format!("{SESSION_PREFIX}{token}")).await?;
        Ok(value.and_then(|v| Uuid::parse_str(&v).ok()))
    }

    /// Destroy one session record. Idempotent: destroying a token that does
    /// not exist succeeds silently. Sibling sessions are untouched.
    pub async fn destroy_session(&self, token: &str) -> Result<()> {
        self.del(&format!("{SESSION_PREFIX}{token}")).await
    }

    /// Create an email-confirmation token for a user.
    pub async fn create_confirmation(&self, user_id: Uuid) -> Result<String> {
        let token = generate_token();
        self.set(
            format!("{CONFIRM_PREFIX}{token}"),
            user_id.to_string(),
            CONFIRMATION_TTL_SECS,
        )
        .await?;
        Ok(token)
    }

    /// Resolve a confirmation token. The token is left in place so that
    /// following the link twice succeeds both times.
    pub async fn confirmation_user(&self, token: &str) -> Result<Option<Uuid>> {
        let value = self.get(&format!("{CONFIRM_PREFIX}{token}")).await?;
        Ok(value.and_then(|v| Uuid::parse_str(&v).ok()))
    }

    /// Stash the PKCE verifier under the OAuth state parameter before
    /// redirecting to the provider.
    pub async fn stash_oauth_state(&self, state: &str, verifier: &str) -> Result<()> {
        self.set(
            format!("{OAUTH_STATE_PREFIX}{state}"),
            verifier.to_string(),
            OAUTH_STATE_TTL_SECS,
        )
        .await
    }

    /// Consume an OAuth state, returning its verifier. Single-use: a replayed
    /// state comes back as None.
    pub async fn take_oauth_state(&self, state: &str) -> Result<Option<String>> {
        let key = format!("{OAUTH_STATE_PREFIX}{state}");
        let value = self.get(&key).await?;
        if value.is_some() {
            self.del(&key).await?;
        }
        Ok(value)
    }

    async fn set(&self, key: String, value: String, ttl_secs: u64) -> Result<()> {
        match &self.kv {
            Kv::Redis(pool) => {
                let mut conn = pool.get().await?;
                conn.set_ex::<_, _, ()>(key, value, ttl_secs).await?;
                Ok(())
            }
            Kv::InMemory(kv) => {
                kv.set(key, value, ttl_secs);
                Ok(())
            }
        }
    }

    async fn get(&self, key: &str) -> Result<Option<String>> {
        match &self.kv {
            Kv::Redis(pool) => {
                let mut conn = pool.get().await?;
                let value: Option<String> = conn.get(key).await?;
                Ok(value)
            }
            Kv::InMemory(kv) => Ok(kv.get(key)),
        }
    }

    async fn del(&self, key: &str) -> Result<()> {
        match &self.kv {
            Kv::Redis(pool) => {
                let mut conn = pool.get().await?;
                conn.del::<_, ()>(key).await?;
                Ok(())
            }
            Kv::InMemory(kv) => {
                kv.del(key);
                Ok(())
            }
        }
    }
}

/// In-memory twin of the Redis keyspace. Entries carry their expiry and are
/// dropped lazily on read.
#[derive(Default)]
struct InMemoryKv {
    entries: RwLock<HashMap<String, (String, DateTime<Utc>)>>,
}

impl InMemoryKv {
    fn set(&self, key: String, value: String, ttl_secs: u64) {
        let expires_at = Utc::now() + Duration::seconds(ttl_secs as i64);
        self.entries.write().insert(key, (value, expires_at));
    }

    fn get(&self, key: &str) -> Option<String> {
        let expired = {
            let entries = self.entries.read();
            match entries.get(key) {
                Some((value, expires_at)) if *expires_at > Utc::now() => {
                    return Some(value.clone());
                }
                Some(_) => true,
                None => false,
            }
        };
        if expired {
            self.entries.write().remove(key);
        }
        None
    }

    fn del(&self, key: &str) {
        self.entries.write().remove(key);
    }
}
