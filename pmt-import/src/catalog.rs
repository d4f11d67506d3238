//! Catalog name resolution
//!
//! Lookup-or-create for the flat reference entities the hierarchy importer
//! leans on: areas anchor equipment trees, asset categories classify nodes.
//! Names are immutable once created through this path; duplicate prevention
//! under concurrent writers is left to the UNIQUE constraints.

use pmt_common::Result;
use sqlx::SqliteConnection;

/// Return the id for an area name, inserting the area if missing.
pub async fn resolve_area(conn: &mut SqliteConnection, name: &str) -> Result<i64> {
    if let Some(id) = sqlx::query_scalar::<_, i64>("SELECT id FROM areas WHERE name = ?")
        .bind(name)
        .fetch_optional(&mut *conn)
        .await?
    {
        return Ok(id);
    }

    let result = sqlx::query("INSERT INTO areas (name) VALUES (?)")
        .bind(name)
        .execute(&mut *conn)
        .await?;

    Ok(result.last_insert_rowid())
}

/// Return the id for an asset category name, inserting it if missing.
pub async fn resolve_category(conn: &mut SqliteConnection, name: &str) -> Result<i64> {
    if let Some(id) = sqlx::query_scalar::<_, i64>("SELECT id FROM asset_categories WHERE name = ?")
        .bind(name)
        .fetch_optional(&mut *conn)
        .await?
    {
        return Ok(id);
    }

    let result = sqlx::query("INSERT INTO asset_categories (name) VALUES (?)")
        .bind(name)
        .execute(&mut *conn)
        .await?;

    Ok(result.last_insert_rowid())
}

#[cfg(test)]
mod tests {
    use super::*;
    use sqlx::sqlite::SqlitePoolOptions;
    use sqlx::SqlitePool;

    async fn test_pool() -> SqlitePool {
        // Single connection so every query sees the same in-memory database
        let pool = SqlitePoolOptions::new()
            .max_connections(1)
            .connect("sqlite::memory:")
            .await
            .expect("Failed to create in-memory database");
        pmt_common::db::create_schema(&pool).await.unwrap();
        pool
    }

    #[tokio::test]
    async fn resolve_area_is_idempotent_per_name() {
        let pool = test_pool().await;
        let mut conn = pool.acquire().await.unwrap();

        let first = resolve_area(&mut *conn, "Packaging").await.unwrap();
        let second = resolve_area(&mut *conn, "Packaging").await.unwrap();
        assert_eq!(first, second);

        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM areas")
            .fetch_one(&mut *conn)
            .await
            .unwrap();
        assert_eq!(count, 1);
    }

    #[tokio::test]
    async fn distinct_names_get_distinct_ids() {
        let pool = test_pool().await;
        let mut conn = pool.acquire().await.unwrap();

        let pumps = resolve_category(&mut *conn, "Pumps").await.unwrap();
        let motors = resolve_category(&mut *conn, "Motors").await.unwrap();
        assert_ne!(pumps, motors);
    }
}
