//! Database initialization
//!
//! Opens (or creates) the SQLite database and brings the schema up to date.
//! Table creation is idempotent and safe to run on every startup.

use crate::Result;
use sqlx::SqlitePool;
use std::path::Path;
use tracing::info;

/// Initialize database connection and create tables if needed
pub async fn init_database(db_path: &Path) -> Result<SqlitePool> {
    let newly_created = !db_path.exists();

    // Create parent directory if it doesn't exist
    if let Some(parent) = db_path.parent() {
        std::fs::create_dir_all(parent)?;
    }

    // Use sqlite options to create database if it doesn't exist
    let db_url = format!("sqlite://{}?mode=rwc", db_path.display());
    let pool = SqlitePool::connect(&db_url).await?;

    if newly_created {
        info!("Initialized new database: {}", db_path.display());
    } else {
        info!("Opened existing database: {}", db_path.display());
    }

    // Enable foreign keys
    sqlx::query("PRAGMA foreign_keys = ON").execute(&pool).await?;

    // Set busy timeout so a stray reader cannot wedge an import run
    sqlx::query("PRAGMA busy_timeout = 5000").execute(&pool).await?;

    create_schema(&pool).await?;

    Ok(pool)
}

/// Create all tables (idempotent - safe to call multiple times)
pub async fn create_schema(pool: &SqlitePool) -> Result<()> {
    create_areas_table(pool).await?;
    create_asset_categories_table(pool).await?;
    create_equipment_table(pool).await?;

    // Catalog tables for the generic record importer
    create_user_roles_table(pool).await?;
    create_warehouses_table(pool).await?;
    create_inventory_categories_table(pool).await?;
    create_inventory_items_table(pool).await?;
    create_users_table(pool).await?;
    create_maintenance_tasks_table(pool).await?;
    create_shifts_table(pool).await?;

    Ok(())
}

/// Create the areas table
///
/// Areas are the top-level plant locations anchoring equipment trees.
pub async fn create_areas_table(pool: &SqlitePool) -> Result<()> {
    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS areas (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            name TEXT NOT NULL UNIQUE
        )
        "#,
    )
    .execute(pool)
    .await?;

    Ok(())
}

pub async fn create_asset_categories_table(pool: &SqlitePool) -> Result<()> {
    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS asset_categories (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            name TEXT NOT NULL UNIQUE
        )
        "#,
    )
    .execute(pool)
    .await?;

    Ok(())
}

/// Create the equipment table
///
/// Every row is one node of an area's tree. Exactly one of `area_id` and
/// `parent_id` is set: `area_id` marks a root directly under an area,
/// `parent_id` marks a child of another equipment node.
pub async fn create_equipment_table(pool: &SqlitePool) -> Result<()> {
    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS equipment (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            name TEXT NOT NULL,
            model TEXT,
            serial_number TEXT,
            category_id INTEGER REFERENCES asset_categories(id),
            area_id INTEGER REFERENCES areas(id),
            parent_id INTEGER REFERENCES equipment(id) ON DELETE CASCADE,
            status TEXT NOT NULL DEFAULT 'ACTIVE',
            created_at TIMESTAMP NOT NULL DEFAULT CURRENT_TIMESTAMP,
            updated_at TIMESTAMP NOT NULL DEFAULT CURRENT_TIMESTAMP,
            CHECK ((area_id IS NULL) <> (parent_id IS NULL)),
            CHECK (status IN ('ACTIVE', 'MAINTENANCE', 'RETIRED'))
        )
        "#,
    )
    .execute(pool)
    .await?;

    // Sibling lookup indexes: (name, area) identifies a root, (name, parent)
    // identifies a child.
    sqlx::query("CREATE INDEX IF NOT EXISTS idx_equipment_root ON equipment(name, area_id)")
        .execute(pool)
        .await?;
    sqlx::query("CREATE INDEX IF NOT EXISTS idx_equipment_child ON equipment(name, parent_id)")
        .execute(pool)
        .await?;

    Ok(())
}

pub async fn create_user_roles_table(pool: &SqlitePool) -> Result<()> {
    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS user_roles (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            name TEXT NOT NULL UNIQUE
        )
        "#,
    )
    .execute(pool)
    .await?;

    Ok(())
}

pub async fn create_warehouses_table(pool: &SqlitePool) -> Result<()> {
    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS warehouses (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            name TEXT NOT NULL UNIQUE,
            location TEXT
        )
        "#,
    )
    .execute(pool)
    .await?;

    Ok(())
}

pub async fn create_inventory_categories_table(pool: &SqlitePool) -> Result<()> {
    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS inventory_categories (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            name TEXT NOT NULL UNIQUE
        )
        "#,
    )
    .execute(pool)
    .await?;

    Ok(())
}

/// Create the inventory items table
///
/// Spare parts and consumables, keyed by SKU.
pub async fn create_inventory_items_table(pool: &SqlitePool) -> Result<()> {
    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS inventory_items (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            sku TEXT NOT NULL UNIQUE,
            name TEXT NOT NULL,
            quantity INTEGER NOT NULL DEFAULT 0,
            unit_cost REAL NOT NULL DEFAULT 0,
            category_id INTEGER REFERENCES inventory_categories(id),
            warehouse_id INTEGER REFERENCES warehouses(id),
            CHECK (quantity >= 0),
            CHECK (unit_cost >= 0)
        )
        "#,
    )
    .execute(pool)
    .await?;

    sqlx::query("CREATE INDEX IF NOT EXISTS idx_inventory_items_sku ON inventory_items(sku)")
        .execute(pool)
        .await?;

    Ok(())
}

pub async fn create_users_table(pool: &SqlitePool) -> Result<()> {
    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS users (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            name TEXT NOT NULL,
            email TEXT NOT NULL UNIQUE,
            role_id INTEGER REFERENCES user_roles(id)
        )
        "#,
    )
    .execute(pool)
    .await?;

    Ok(())
}

pub async fn create_maintenance_tasks_table(pool: &SqlitePool) -> Result<()> {
    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS maintenance_tasks (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            title TEXT NOT NULL,
            description TEXT,
            equipment_id INTEGER REFERENCES equipment(id),
            frequency_days INTEGER NOT NULL DEFAULT 0,
            CHECK (frequency_days >= 0)
        )
        "#,
    )
    .execute(pool)
    .await?;

    Ok(())
}

pub async fn create_shifts_table(pool: &SqlitePool) -> Result<()> {
    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS shifts (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            name TEXT NOT NULL UNIQUE,
            starts_at TEXT NOT NULL,
            ends_at TEXT NOT NULL
        )
        "#,
    )
    .execute(pool)
    .await?;

    Ok(())
}
