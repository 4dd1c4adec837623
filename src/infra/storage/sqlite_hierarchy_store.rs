use async_trait::async_trait;
use sqlx::sqlite::SqliteRow;
use sqlx::{Pool, Row, Sqlite};

use crate::core::hierarchy::{HierarchyError, HierarchyRecord, HierarchyStore};

pub struct SqliteHierarchyStore {
    pool: Pool<Sqlite>,
}

impl SqliteHierarchyStore {
    pub fn new(pool: Pool<Sqlite>) -> Self {
        Self { pool }
    }

    pub async fn migrate(&self) -> anyhow::Result<()> {
        sqlx::query(
            r#"
            CREATE TABLE IF NOT EXISTS mcc_hierarchy (
                owner_id TEXT NOT NULL,
                customer_id TEXT NOT NULL,
                manager_customer_id TEXT,
                is_manager BOOLEAN NOT NULL DEFAULT 0,
                level INTEGER NOT NULL DEFAULT 0,
                account_name TEXT,
                updated_at TEXT NOT NULL DEFAULT CURRENT_TIMESTAMP,
                PRIMARY KEY (owner_id, customer_id)
            );
            "#,
        )
        .execute(&self.pool)
        .await?;
        Ok(())
    }
}

fn storage_error(e: sqlx::Error) -> HierarchyError {
    HierarchyError::Storage(e.to_string())
}

fn row_to_record(row: &SqliteRow) -> Result<HierarchyRecord, sqlx::Error> {
    Ok(HierarchyRecord {
        customer_id: row.try_get("customer_id")?,
        manager_customer_id: row.try_get("manager_customer_id")?,
        is_manager: row.try_get("is_manager")?,
        level: row.try_get::<i64, _>("level")? as u32,
        account_name: row.try_get("account_name")?,
    })
}

const UPSERT_SQL: &str = r#"
    INSERT INTO mcc_hierarchy (owner_id, customer_id, manager_customer_id, is_manager, level, account_name, updated_at)
    VALUES (?, ?, ?, ?, ?, ?, CURRENT_TIMESTAMP)
    ON CONFLICT(owner_id, customer_id) DO UPDATE SET
        manager_customer_id = excluded.manager_customer_id,
        is_manager = excluded.is_manager,
        level = excluded.level,
        account_name = COALESCE(excluded.account_name, mcc_hierarchy.account_name),
        updated_at = CURRENT_TIMESTAMP
"#;

#[async_trait]
impl HierarchyStore for SqliteHierarchyStore {
    async fn get(
        &self,
        owner: &str,
        customer_id: &str,
    ) -> Result<Option<HierarchyRecord>, HierarchyError> {
        let row = sqlx::query("SELECT * FROM mcc_hierarchy WHERE owner_id = ? AND customer_id = ?")
            .bind(owner)
            .bind(customer_id)
            .fetch_optional(&self.pool)
            .await
            .map_err(storage_error)?;

        row.as_ref().map(row_to_record).transpose().map_err(storage_error)
    }

    async fn upsert(&self, owner: &str, record: &HierarchyRecord) -> Result<(), HierarchyError> {
        sqlx::query(UPSERT_SQL)
            .bind(owner)
            .bind(&record.customer_id)
            .bind(&record.manager_customer_id)
            .bind(record.is_manager)
            .bind(record.level as i64)
            .bind(&record.account_name)
            .execute(&self.pool)
            .await
            .map_err(storage_error)?;
        Ok(())
    }

    async fn replace_all(
        &self,
        owner: &str,
        records: &[HierarchyRecord],
    ) -> Result<(), HierarchyError> {
        let mut tx = self.pool.begin().await.map_err(storage_error)?;

        sqlx::query("DELETE FROM mcc_hierarchy WHERE owner_id = ?")
            .bind(owner)
            .execute(&mut *tx)
            .await
            .map_err(storage_error)?;

        for record in records {
            sqlx::query(UPSERT_SQL)
                .bind(owner)
                .bind(&record.customer_id)
                .bind(&record.manager_customer_id)
                .bind(record.is_manager)
                .bind(record.level as i64)
                .bind(&record.account_name)
                .execute(&mut *tx)
                .await
                .map_err(storage_error)?;
        }

        tx.commit().await.map_err(storage_error)?;
        Ok(())
    }

    async fn list(&self, owner: &str) -> Result<Vec<HierarchyRecord>, HierarchyError> {
        let rows = sqlx::query(
            "SELECT * FROM mcc_hierarchy WHERE owner_id = ? ORDER BY level, customer_id",
        )
        .bind(owner)
        .fetch_all(&self.pool)
        .await
        .map_err(storage_error)?;

        rows.iter()
            .map(row_to_record)
            .collect::<Result<Vec<_>, _>>()
            .map_err(storage_error)
    }
}
