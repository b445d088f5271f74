// OAuth identity reconciliation: find, create, or merge a local account
// Decision: The twitter-id and email lookups are two explicit queries with
// twitter-id first, so the precedence stays visible and testable
// Decision: find-then-create is not transactionally guarded - two concurrent
// first-time callbacks for one new external id can both reach the create arm
// and leave duplicate rows; single-row creates/updates are atomic, the
// composition is not

use anyhow::Result;

use crate::storage::{CreateUserRow, StorageBackend, UserRow};

/// Reconcile a provider identity against the account store.
///
/// Precedence:
/// 1. an account already linked to `external_id` - returning login, no write
/// 2. an account matching the FIRST candidate email:
///    - provider id unset: merge - link `external_id` to that account
///    - provider id set (to some other id): returning login of that account,
///      the existing link is never overwritten
/// 3. neither: create a fresh account with no password
pub async fn resolve_twitter_identity(
    db: &StorageBackend,
    external_id: &str,
    candidate_emails: &[String],
) -> Result<UserRow> {
    if let Some(user) = db.get_user_by_twitter_id(external_id).await? {
        return Ok(user);
    }

    let by_email = match candidate_emails.first() {
        Some(email) => db.get_user_by_email(email).await?,
        None => None,
    };

    match by_email {
        None => {
            let user = db
                .create_user(CreateUserRow {
                    email: candidate_emails.first().cloned(),
                    password_hash: None,
                    confirmed: false,
                    twitter_id: Some(external_id.to_string()),
                })
                .await?;
            tracing::info!(user_id = %user.id, "created account from provider identity");
            Ok(user)
        }
        Some(user) if user.twitter_id.is_none() => {
            let merged = db
                .set_user_twitter_id(user.id, external_id)
                .await?
                .ok_or_else(|| anyhow::anyhow!("account disappeared during merge"))?;
            tracing::info!(user_id = %merged.id, "linked provider identity to existing account");
            Ok(merged)
        }
        Some(user) => Ok(user),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn mem() -> StorageBackend {
        StorageBackend::in_memory()
    }

    async fn seed_local_user(db: &StorageBackend, email: &str) -> UserRow {
        db.create_user(CreateUserRow {
            email: Some(email.to_string()),
            password_hash: Some("$argon2id$fake".to_string()),
            confirmed: true,
            twitter_id: None,
        })
        .await
        .unwrap()
    }

    #[tokio::test]
    async fn test_creates_account_when_nothing_matches() {
        let db = mem();

        let user = resolve_twitter_identity(&db, "tw-1", &[]).await.unwrap();
        assert_eq!(user.twitter_id.as_deref(), Some("tw-1"));
        assert_eq!(user.email, None);
        assert_eq!(user.password_hash, None);
        assert!(!user.confirmed);
        assert_eq!(db.list_users().await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_created_account_carries_first_email() {
        let db = mem();
        let emails = vec!["first@x.com".to_string(), "second@x.com".to_string()];

        let user = resolve_twitter_identity(&db, "tw-2", &emails).await.unwrap();
        assert_eq!(user.email.as_deref(), Some("first@x.com"));
    }

    #[tokio::test]
    async fn test_relogin_resolves_same_account_without_duplicate() {
        let db = mem();

        let first = resolve_twitter_identity(&db, "tw-3", &[]).await.unwrap();
        let second = resolve_twitter_identity(&db, "tw-3", &[]).await.unwrap();

        assert_eq!(first.id, second.id);
        assert_eq!(db.list_users().await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_merge_links_existing_account_by_email() {
        let db = mem();
        let existing = seed_local_user(&db, "bob@bob.com").await;

        let resolved =
            resolve_twitter_identity(&db, "tw-4", &["bob@bob.com".to_string()])
                .await
                .unwrap();

        assert_eq!(resolved.id, existing.id);
        assert_eq!(resolved.twitter_id.as_deref(), Some("tw-4"));
        assert_eq!(resolved.email.as_deref(), Some("bob@bob.com"));
        // password survives the merge: the account stays reachable both ways
        assert!(resolved.password_hash.is_some());
        assert_eq!(db.list_users().await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_twitter_match_wins_over_email_match() {
        let db = mem();
        let linked = resolve_twitter_identity(&db, "tw-5", &["a@x.com".to_string()])
            .await
            .unwrap();
        let other = seed_local_user(&db, "b@x.com").await;

        // both predicates would match different rows; twitter id must win
        let resolved = resolve_twitter_identity(&db, "tw-5", &["b@x.com".to_string()])
            .await
            .unwrap();

        assert_eq!(resolved.id, linked.id);
        let other_after = db.get_user(other.id).await.unwrap().unwrap();
        assert_eq!(other_after.twitter_id, None);
    }

    #[tokio::test]
    async fn test_email_row_with_foreign_link_is_not_rewritten() {
        let db = mem();
        let existing = resolve_twitter_identity(&db, "tw-6", &["c@x.com".to_string()])
            .await
            .unwrap();

        // a different external id arrives carrying the same email
        let resolved = resolve_twitter_identity(&db, "tw-7", &["c@x.com".to_string()])
            .await
            .unwrap();

        assert_eq!(resolved.id, existing.id);
        assert_eq!(resolved.twitter_id.as_deref(), Some("tw-6"));
        assert_eq!(db.list_users().await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_only_first_candidate_email_is_considered() {
        let db = mem();
        let existing = seed_local_user(&db, "second@x.com").await;

        let emails = vec!["first@x.com".to_string(), "second@x.com".to_string()];
        let resolved = resolve_twitter_identity(&db, "tw-8", &emails).await.unwrap();

        // second@x.com would have matched, but only the first email counts
        assert_ne!(resolved.id, existing.id);
        assert_eq!(resolved.email.as_deref(), Some("first@x.com"));
        assert_eq!(db.list_users().await.unwrap().len(), 2);
    }
}
