//! Catalog record kinds and per-row handlers
//!
//! The generic catalog importer is dispatched by a record-type tag. Each
//! kind supplies the same two operations: a destructive pre-import reset and
//! a uniform per-row insert handler whose failures are isolated by the batch
//! loop. Referenced names (areas, roles, warehouses, ...) must already
//! exist; an unresolved lookup is a row error, not a create.

use crate::reader::RowMap;
use crate::reconcile::{self, FindScope, TargetAttrs};
use clap::ValueEnum;
use pmt_common::{Error, EquipmentStatus, Result};
use sqlx::SqliteConnection;

/// Record-type tag selecting the catalog table a CSV file populates.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum CatalogKind {
    Roles,
    Areas,
    Warehouses,
    AssetCategories,
    InventoryCategories,
    Assets,
    InventoryItems,
    Users,
    MaintenanceTasks,
    Shifts,
}

impl CatalogKind {
    fn table(self) -> &'static str {
        match self {
            CatalogKind::Roles => "user_roles",
            CatalogKind::Areas => "areas",
            CatalogKind::Warehouses => "warehouses",
            CatalogKind::AssetCategories => "asset_categories",
            CatalogKind::InventoryCategories => "inventory_categories",
            CatalogKind::Assets => "equipment",
            CatalogKind::InventoryItems => "inventory_items",
            CatalogKind::Users => "users",
            CatalogKind::MaintenanceTasks => "maintenance_tasks",
            CatalogKind::Shifts => "shifts",
        }
    }

    /// Destructive pre-import reset.
    ///
    /// Flat tables are emptied and their id sequence restarted. Assets are
    /// reset selectively: child subtrees are deleted (CASCADE clears each
    /// one) while area-anchored roots survive so asset rows can re-attach
    /// to them by parent name.
    pub async fn reset(self, conn: &mut SqliteConnection) -> Result<()> {
        if self == CatalogKind::Assets {
            sqlx::query("DELETE FROM equipment WHERE parent_id IS NOT NULL")
                .execute(conn)
                .await?;
            return Ok(());
        }

        let table = self.table();
        sqlx::query(&format!("DELETE FROM {}", table))
            .execute(&mut *conn)
            .await?;
        sqlx::query("DELETE FROM sqlite_sequence WHERE name = ?")
            .bind(table)
            .execute(&mut *conn)
            .await?;

        Ok(())
    }

    /// Insert one CSV row into this kind's table.
    ///
    /// Uniform handler signature across kinds; every failure path (missing
    /// required column, bad number, unresolved lookup, constraint
    /// violation) surfaces as an error for the caller to isolate.
    pub async fn insert_row(self, conn: &mut SqliteConnection, row: &RowMap) -> Result<()> {
        match self {
            CatalogKind::Roles => insert_named(conn, "user_roles", row).await,
            CatalogKind::Areas => insert_named(conn, "areas", row).await,
            CatalogKind::Warehouses => insert_warehouse(conn, row).await,
            CatalogKind::AssetCategories => insert_named(conn, "asset_categories", row).await,
            CatalogKind::InventoryCategories => {
                insert_named(conn, "inventory_categories", row).await
            }
            CatalogKind::Assets => insert_asset(conn, row).await,
            CatalogKind::InventoryItems => insert_inventory_item(conn, row).await,
            CatalogKind::Users => insert_user(conn, row).await,
            CatalogKind::MaintenanceTasks => insert_maintenance_task(conn, row).await,
            CatalogKind::Shifts => insert_shift(conn, row).await,
        }
    }
}

fn required<'a>(row: &'a RowMap, key: &str) -> Result<&'a str> {
    row.get_opt(key)
        .ok_or_else(|| Error::InvalidInput(format!("missing required column '{}'", key)))
}

fn int_or_default(row: &RowMap, key: &str) -> Result<i64> {
    match row.get_opt(key) {
        None => Ok(0),
        Some(value) => value
            .parse()
            .map_err(|_| Error::InvalidInput(format!("invalid integer '{}' in column '{}'", value, key))),
    }
}

fn real_or_default(row: &RowMap, key: &str) -> Result<f64> {
    match row.get_opt(key) {
        None => Ok(0.0),
        Some(value) => value
            .parse()
            .map_err(|_| Error::InvalidInput(format!("invalid number '{}' in column '{}'", value, key))),
    }
}

fn status_or_default(row: &RowMap) -> Result<EquipmentStatus> {
    match row.get_opt("status") {
        None => Ok(EquipmentStatus::default()),
        Some(value) => value.parse(),
    }
}

/// Look up an id by name in a reference table; missing names are row errors.
async fn lookup_id(conn: &mut SqliteConnection, table: &str, name: &str) -> Result<i64> {
    sqlx::query_scalar::<_, i64>(&format!("SELECT id FROM {} WHERE name = ?", table))
        .bind(name)
        .fetch_optional(conn)
        .await?
        .ok_or_else(|| Error::NotFound(format!("{} '{}'", table, name)))
}

/// Optional lookup: absent column means NULL, named-but-unknown is an error.
async fn lookup_optional(
    conn: &mut SqliteConnection,
    table: &str,
    row: &RowMap,
    key: &str,
) -> Result<Option<i64>> {
    match row.get_opt(key) {
        None => Ok(None),
        Some(name) => Ok(Some(lookup_id(conn, table, name).await?)),
    }
}

/// Single-column reference tables share one insert shape.
async fn insert_named(conn: &mut SqliteConnection, table: &str, row: &RowMap) -> Result<()> {
    let name = required(row, "name")?;
    sqlx::query(&format!("INSERT INTO {} (name) VALUES (?)", table))
        .bind(name)
        .execute(conn)
        .await?;
    Ok(())
}

async fn insert_warehouse(conn: &mut SqliteConnection, row: &RowMap) -> Result<()> {
    let name = required(row, "name")?;
    sqlx::query("INSERT INTO warehouses (name, location) VALUES (?, ?)")
        .bind(name)
        .bind(row.get_opt("location"))
        .execute(conn)
        .await?;
    Ok(())
}

/// Flat asset record: attaches under a parent node resolved by name, or as
/// a root under a named area. One of the two must resolve.
async fn insert_asset(conn: &mut SqliteConnection, row: &RowMap) -> Result<()> {
    let name = required(row, "name")?;

    let scope = match row.get_opt("parent") {
        Some(parent_name) => {
            let parent_id = sqlx::query_scalar::<_, i64>(
                "SELECT id FROM equipment WHERE name = ? LIMIT 1",
            )
            .bind(parent_name)
            .fetch_optional(&mut *conn)
            .await?
            .ok_or_else(|| Error::NotFound(format!("parent equipment '{}'", parent_name)))?;
            FindScope::Child { parent_id }
        }
        None => {
            let area_name = required(row, "area")?;
            let area_id = lookup_id(&mut *conn, "areas", area_name).await?;
            FindScope::Root { area_id }
        }
    };

    let attrs = TargetAttrs {
        model: row.get_opt("model").map(str::to_string),
        serial_number: row.get_opt("serial_number").map(str::to_string),
        category_id: lookup_optional(&mut *conn, "asset_categories", row, "category").await?,
        status: status_or_default(row)?,
    };

    reconcile::find_or_create(conn, name, scope, Some(&attrs)).await?;
    Ok(())
}

async fn insert_inventory_item(conn: &mut SqliteConnection, row: &RowMap) -> Result<()> {
    let sku = required(row, "sku")?;
    let name = required(row, "name")?;
    let quantity = int_or_default(row, "quantity")?;
    let unit_cost = real_or_default(row, "unit_cost")?;
    let category_id = lookup_optional(&mut *conn, "inventory_categories", row, "category").await?;
    let warehouse_id = lookup_optional(&mut *conn, "warehouses", row, "warehouse").await?;

    sqlx::query(
        r#"
        INSERT INTO inventory_items (sku, name, quantity, unit_cost, category_id, warehouse_id)
        VALUES (?, ?, ?, ?, ?, ?)
        "#,
    )
    .bind(sku)
    .bind(name)
    .bind(quantity)
    .bind(unit_cost)
    .bind(category_id)
    .bind(warehouse_id)
    .execute(conn)
    .await?;

    Ok(())
}

async fn insert_user(conn: &mut SqliteConnection, row: &RowMap) -> Result<()> {
    let name = required(row, "name")?;
    let email = required(row, "email")?;
    let role_id = lookup_optional(&mut *conn, "user_roles", row, "role").await?;

    sqlx::query("INSERT INTO users (name, email, role_id) VALUES (?, ?, ?)")
        .bind(name)
        .bind(email)
        .bind(role_id)
        .execute(conn)
        .await?;

    Ok(())
}

async fn insert_maintenance_task(conn: &mut SqliteConnection, row: &RowMap) -> Result<()> {
    let title = required(row, "title")?;
    let frequency_days = int_or_default(row, "frequency_days")?;
    let equipment_id = lookup_optional(&mut *conn, "equipment", row, "equipment").await?;

    sqlx::query(
        r#"
        INSERT INTO maintenance_tasks (title, description, equipment_id, frequency_days)
        VALUES (?, ?, ?, ?)
        "#,
    )
    .bind(title)
    .bind(row.get_opt("description"))
    .bind(equipment_id)
    .bind(frequency_days)
    .execute(conn)
    .await?;

    Ok(())
}

async fn insert_shift(conn: &mut SqliteConnection, row: &RowMap) -> Result<()> {
    let name = required(row, "name")?;
    let starts_at = required(row, "starts_at")?;
    let ends_at = required(row, "ends_at")?;

    sqlx::query("INSERT INTO shifts (name, starts_at, ends_at) VALUES (?, ?, ?)")
        .bind(name)
        .bind(starts_at)
        .bind(ends_at)
        .execute(conn)
        .await?;

    Ok(())
}
