use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::sqlite::SqliteRow;
use sqlx::{Pool, Row, Sqlite};

use crate::core::credentials::{AccessToken, CredentialError, CredentialStore, UserCredentials};

pub struct SqliteCredentialStore {
    pool: Pool<Sqlite>,
}

impl SqliteCredentialStore {
    pub fn new(pool: Pool<Sqlite>) -> Self {
        Self { pool }
    }

    pub async fn migrate(&self) -> anyhow::Result<()> {
        sqlx::query(
            r#"
            CREATE TABLE IF NOT EXISTS ads_credentials (
                user_id TEXT PRIMARY KEY,
                use_shared_credentials BOOLEAN NOT NULL DEFAULT 0,
                developer_token TEXT,
                client_id TEXT,
                client_secret TEXT,
                refresh_token TEXT,
                access_token TEXT,
                token_expires_at TEXT,
                customer_id TEXT,
                is_configured BOOLEAN NOT NULL DEFAULT 0,
                updated_at TEXT NOT NULL
            );
            "#,
        )
        .execute(&self.pool)
        .await?;
        Ok(())
    }
}

fn storage_error(e: sqlx::Error) -> CredentialError {
    CredentialError::Storage(e.to_string())
}

fn row_to_credentials(row: &SqliteRow) -> Result<UserCredentials, sqlx::Error> {
    Ok(UserCredentials {
        user_id: row.try_get("user_id")?,
        use_shared_credentials: row.try_get("use_shared_credentials")?,
        developer_token: row.try_get("developer_token")?,
        client_id: row.try_get("client_id")?,
        client_secret: row.try_get("client_secret")?,
        refresh_token: row.try_get("refresh_token")?,
        access_token: row.try_get("access_token")?,
        token_expires_at: row.try_get::<Option<DateTime<Utc>>, _>("token_expires_at")?,
        customer_id: row.try_get("customer_id")?,
        is_configured: row.try_get("is_configured")?,
        updated_at: row.try_get("updated_at")?,
    })
}

#[async_trait]
impl CredentialStore for SqliteCredentialStore {
    async fn get(&self, user_id: &str) -> Result<Option<UserCredentials>, CredentialError> {
        let row = sqlx::query("SELECT * FROM ads_credentials WHERE user_id = ?")
            .bind(user_id)
            .fetch_optional(&self.pool)
            .await
            .map_err(storage_error)?;

        row.as_ref()
            .map(row_to_credentials)
            .transpose()
            .map_err(storage_error)
    }

    async fn save(&self, credentials: &UserCredentials) -> Result<(), CredentialError> {
        sqlx::query(
            r#"
            INSERT INTO ads_credentials (
                user_id, use_shared_credentials, developer_token, client_id, client_secret,
                refresh_token, access_token, token_expires_at, customer_id, is_configured, updated_at
            )
            VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)
            ON CONFLICT(user_id) DO UPDATE SET
                use_shared_credentials = excluded.use_shared_credentials,
                developer_token = excluded.developer_token,
                client_id = excluded.client_id,
                client_secret = excluded.client_secret,
                refresh_token = excluded.refresh_token,
                access_token = excluded.access_token,
                token_expires_at = excluded.token_expires_at,
                customer_id = excluded.customer_id,
                is_configured = excluded.is_configured,
                updated_at = excluded.updated_at
            "#,
        )
        .bind(&credentials.user_id)
        .bind(credentials.use_shared_credentials)
        .bind(&credentials.developer_token)
        .bind(&credentials.client_id)
        .bind(&credentials.client_secret)
        .bind(&credentials.refresh_token)
        .bind(&credentials.access_token)
        .bind(credentials.token_expires_at)
        .bind(&credentials.customer_id)
        .bind(credentials.is_configured)
        .bind(credentials.updated_at)
        .execute(&self.pool)
        .await
        .map_err(storage_error)?;
        Ok(())
    }

    async fn update_access_token(
        &self,
        user_id: &str,
        token: &AccessToken,
    ) -> Result<(), CredentialError> {
        sqlx::query(
            r#"
            UPDATE ads_credentials
            SET access_token = ?, token_expires_at = ?, updated_at = ?
            WHERE user_id = ?
            "#,
        )
        .bind(&token.token)
        .bind(token.expires_at)
        .bind(Utc::now())
        .bind(user_id)
        .execute(&self.pool)
        .await
        .map_err(storage_error)?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::infra::storage::connect_sqlite;
    use chrono::Duration;

    async fn store() -> SqliteCredentialStore {
        let pool = connect_sqlite("sqlite::memory:").await.unwrap();
        let store = SqliteCredentialStore::new(pool);
        store.migrate().await.unwrap();
        store
    }

    fn record() -> UserCredentials {
        UserCredentials {
            user_id: "user-1".to_string(),
            use_shared_credentials: false,
            developer_token: Some("dev".to_string()),
            client_id: Some("cid".to_string()),
            client_secret: Some("secret".to_string()),
            refresh_token: Some("refresh".to_string()),
            access_token: None,
            token_expires_at: None,
            customer_id: Some("1234567890".to_string()),
            is_configured: true,
            updated_at: Utc::now(),
        }
    }

    #[tokio::test]
    async fn missing_user_is_none() {
        assert!(store().await.get("nobody").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn save_then_get_and_overwrite() {
        let store = store().await;
        store.save(&record()).await.unwrap();

        let loaded = store.get("user-1").await.unwrap().unwrap();
        assert_eq!(loaded.developer_token.as_deref(), Some("dev"));
        assert!(loaded.is_configured);

        let mut shared = record();
        shared.use_shared_credentials = true;
        shared.developer_token = None;
        store.save(&shared).await.unwrap();

        let loaded = store.get("user-1").await.unwrap().unwrap();
        assert!(loaded.use_shared_credentials);
        assert_eq!(loaded.developer_token, None);
    }

    #[tokio::test]
    async fn access_token_update_persists_expiry() {
        let store = store().await;
        store.save(&record()).await.unwrap();
        let expires_at = Utc::now() + Duration::hours(1);

        store
            .update_access_token(
                "user-1",
                &AccessToken {
                    token: "fresh".to_string(),
                    expires_at,
                },
            )
            .await
            .unwrap();

        let loaded = store.get("user-1").await.unwrap().unwrap();
        assert_eq!(loaded.access_token.as_deref(), Some("fresh"));
        assert_eq!(
            loaded.token_expires_at.map(|t| t.timestamp()),
            Some(expires_at.timestamp())
        );
        assert!(loaded.usable_access_token(Utc::now()).is_some());
    }
}
