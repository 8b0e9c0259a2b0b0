//! Key/value persistence on top of the `kv_store` table.
//!
//! Values are whole JSON documents replaced on every write. There is no
//! schema versioning: readers deserialize into whatever shape they expect.

use serde::{de::DeserializeOwned, Serialize};
use sqlx::SqlitePool;

use crate::error::AppResult;

pub async fn get_json<T: DeserializeOwned>(db: &SqlitePool, key: &str) -> AppResult<Option<T>> {
    let raw = sqlx::query_scalar::<_, String>("SELECT value FROM kv_store WHERE key = ?1")
        .bind(key)
        .fetch_optional(db)
        .await?;

    match raw {
        Some(raw) => {
            let value = serde_json::from_str(&raw).map_err(anyhow::Error::from)?;
            Ok(Some(value))
        }
        None => Ok(None),
    }
}

pub async fn put_json<T: Serialize + ?Sized>(db: &SqlitePool, key: &str, value: &T) -> AppResult<()> {
    let raw = serde_json::to_string(value).map_err(anyhow::Error::from)?;

    sqlx::query(
        r#"
        INSERT INTO kv_store (key, value, updated_at)
        VALUES (?1, ?2, CURRENT_TIMESTAMP)
        ON CONFLICT (key) DO UPDATE SET
            value = excluded.value,
            updated_at = CURRENT_TIMESTAMP
        "#,
    )
    .bind(key)
    .bind(raw)
    .execute(db)
    .await?;

    Ok(())
}
