// In-memory storage implementation for dev mode
// Decision: Use parking_lot for thread-safe access
// Decision: UUIDs generated via uuid v7 (time-ordered)
//
// This implementation provides a PostgreSQL-compatible API backed by an
// in-memory HashMap, allowing the server to run without a database for
// development and letting the flow tests stay hermetic.

use anyhow::Result;
use chrono::{DateTime, Utc};
use parking_lot::RwLock;
use std::collections::HashMap;
use uuid::Uuid;

use super::models::{CreateUserRow, UserRow};

/// In-memory user store for dev mode.
/// All data is stored in memory and lost on restart.
#[derive(Default)]
pub struct InMemoryDatabase {
    users: RwLock<HashMap<Uuid, UserRow>>,
}

impl InMemoryDatabase {
    pub fn new() -> Self {
        Self::default()
    }

    fn now() -> DateTime<Utc> {
        Utc::now()
    }

    pub async fn create_user(&self, input: CreateUserRow) -> Result<UserRow> {
        let now = Self::now();
        let id = Uuid::now_v7();
        let row = UserRow {
            id,
            email: input.email,
            password_hash: input.password_hash,
            confirmed: input.confirmed,
            forgot_password_locked: false,
            twitter_id: input.twitter_id,
            created_at: now,
            updated_at: now,
        };
        self.users.write().insert(id, row.clone());
        Ok(row)
    }

    pub async fn get_user(&self, id: Uuid) -> Result<Option<UserRow>> {
        Ok(self.users.read().get(&id).cloned())
    }

    /// Oldest matching row wins, mirroring the Postgres query's ordering.
    pub async fn get_user_by_email(&self, email: &str) -> Result<Option<UserRow>> {
        let users = self.users.read();
        let mut matches: Vec<_> = users
            .values()
            .filter(|u| u.email.as_deref() == Some(email))
            .collect();
        matches.sort_by(|a, b| a.created_at.cmp(&b.created_at));
        Ok(matches.first().map(|u| (*u).clone()))
    }

    pub async fn get_user_by_twitter_id(&self, twitter_id: &str) -> Result<Option<UserRow>> {
        let users = self.users.read();
        let mut matches: Vec<_> = users
            .values()
            .filter(|u| u.twitter_id.as_deref() == Some(twitter_id))
            .collect();
        matches.sort_by(|a, b| a.created_at.cmp(&b.created_at));
        Ok(matches.first().map(|u| (*u).clone()))
    }

    pub async fn list_users(&self) -> Result<Vec<UserRow>> {
        let users = self.users.read();
        let mut result: Vec<_> = users.values().cloned().collect();
        result.sort_by(|a, b| a.created_at.cmp(&b.created_at));
        Ok(result)
    }

    pub async fn set_user_twitter_id(
        &self,
        id: Uuid,
        twitter_id: &str,
    ) -> Result<Option<UserRow>> {
        let mut users = self.users.write();
        if let Some(user) = users.get_mut(&id) {
            user.twitter_id = Some(twitter_id.to_string());
            user.updated_at = Self::now();
            return Ok(Some(user.clone()));
        }
        Ok(None)
    }

    pub async fn set_user_confirmed(&self, id: Uuid) -> Result<Option<UserRow>> {
        let mut users = self.users.write();
        if let Some(user) = users.get_mut(&id) {
            user.confirmed = true;
            user.updated_at = Self::now();
            return Ok(Some(user.clone()));
        }
        Ok(None)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_create_and_get_user() {
        let db = InMemoryDatabase::new();
        let row = db
            .create_user(CreateUserRow {
                email: Some("a@b.com".to_string()),
                password_hash: Some("$argon2id$fake".to_string()),
                confirmed: false,
                twitter_id: None,
            })
            .await
            .unwrap();

        let fetched = db.get_user(row.id).await.unwrap().unwrap();
        assert_eq!(fetched.email.as_deref(), Some("a@b.com"));
        assert!(!fetched.confirmed);

        let by_email = db.get_user_by_email("a@b.com").await.unwrap().unwrap();
        assert_eq!(by_email.id, row.id);

        assert!(db.get_user_by_email("missing@b.com").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_set_twitter_id_and_confirmed() {
        let db = InMemoryDatabase::new();
        let row = db
            .create_user(CreateUserRow {
                email: Some("c@d.com".to_string()),
                password_hash: None,
                confirmed: false,
                twitter_id: None,
            })
            .await
            .unwrap();

        let merged = db.set_user_twitter_id(row.id, "tw-123").await.unwrap().unwrap();
        assert_eq!(merged.twitter_id.as_deref(), Some("tw-123"));

        let by_twitter = db.get_user_by_twitter_id("tw-123").await.unwrap().unwrap();
        assert_eq!(by_twitter.id, row.id);

        let confirmed = db.set_user_confirmed(row.id).await.unwrap().unwrap();
        assert!(confirmed.confirmed);

        // unknown ids are a no-op
        assert!(db.set_user_confirmed(Uuid::now_v7()).await.unwrap().is_none());
    }
}
