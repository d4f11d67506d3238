//! Equipment tree reconciliation
//!
//! Walks one resolved hierarchy path level by level against an area, reusing
//! the node that already occupies each tree position and creating the ones
//! that do not. Only the deepest (target) node receives the row's
//! attributes; intermediate levels are structural grouping nodes.
//!
//! The walk is incremental across rows: two rows sharing a path prefix land
//! on the same intermediate nodes because the lookup matches on the sibling
//! identity `(name, area)` for roots and `(name, parent)` for children.
//! Rows must therefore be processed in file order.

use crate::hierarchy::LevelPath;
use pmt_common::{Error, EquipmentStatus, Result};
use sqlx::SqliteConnection;

/// Where a node lookup is anchored: directly under an area (tree root) or
/// under a parent equipment node.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FindScope {
    Root { area_id: i64 },
    Child { parent_id: i64 },
}

/// Attributes the row assigns to its target node.
#[derive(Debug, Clone, Default)]
pub struct TargetAttrs {
    pub model: Option<String>,
    pub serial_number: Option<String>,
    pub category_id: Option<i64>,
    pub status: EquipmentStatus,
}

/// Find an existing node by sibling identity within the scope.
pub async fn find_node(
    conn: &mut SqliteConnection,
    name: &str,
    scope: FindScope,
) -> Result<Option<i64>> {
    let id = match scope {
        FindScope::Root { area_id } => {
            sqlx::query_scalar::<_, i64>(
                "SELECT id FROM equipment WHERE name = ? AND area_id = ? AND parent_id IS NULL",
            )
            .bind(name)
            .bind(area_id)
            .fetch_optional(conn)
            .await?
        }
        FindScope::Child { parent_id } => {
            sqlx::query_scalar::<_, i64>(
                "SELECT id FROM equipment WHERE name = ? AND parent_id = ?",
            )
            .bind(name)
            .bind(parent_id)
            .fetch_optional(conn)
            .await?
        }
    };

    Ok(id)
}

/// Insert a new node at the scope's tree position.
///
/// Intermediate nodes get NULL model/serial/category and `ACTIVE` status;
/// target nodes take the row's attributes.
async fn insert_node(
    conn: &mut SqliteConnection,
    name: &str,
    scope: FindScope,
    attrs: Option<&TargetAttrs>,
) -> Result<i64> {
    let (area_id, parent_id) = match scope {
        FindScope::Root { area_id } => (Some(area_id), None),
        FindScope::Child { parent_id } => (None, Some(parent_id)),
    };

    let (model, serial_number, category_id, status) = match attrs {
        Some(attrs) => (
            attrs.model.as_deref(),
            attrs.serial_number.as_deref(),
            attrs.category_id,
            attrs.status,
        ),
        None => (None, None, None, EquipmentStatus::Active),
    };

    let result = sqlx::query(
        r#"
        INSERT INTO equipment (name, model, serial_number, category_id, area_id, parent_id, status)
        VALUES (?, ?, ?, ?, ?, ?, ?)
        "#,
    )
    .bind(name)
    .bind(model)
    .bind(serial_number)
    .bind(category_id)
    .bind(area_id)
    .bind(parent_id)
    .bind(status.as_str())
    .execute(conn)
    .await?;

    Ok(result.last_insert_rowid())
}

/// Refresh the attribute fields of an existing target node.
async fn update_target(conn: &mut SqliteConnection, id: i64, attrs: &TargetAttrs) -> Result<()> {
    sqlx::query(
        r#"
        UPDATE equipment
        SET model = ?, serial_number = ?, category_id = ?, status = ?,
            updated_at = CURRENT_TIMESTAMP
        WHERE id = ?
        "#,
    )
    .bind(attrs.model.as_deref())
    .bind(attrs.serial_number.as_deref())
    .bind(attrs.category_id)
    .bind(attrs.status.as_str())
    .bind(id)
    .execute(conn)
    .await?;

    Ok(())
}

/// Find the node at a scope or create it there.
///
/// `attrs` marks a row's target position: a found node has its attribute
/// fields refreshed, a created node is born with them. With `attrs` absent
/// the node is (or stays) a bare structural entry.
pub async fn find_or_create(
    conn: &mut SqliteConnection,
    name: &str,
    scope: FindScope,
    attrs: Option<&TargetAttrs>,
) -> Result<i64> {
    match find_node(&mut *conn, name, scope).await? {
        Some(id) => {
            if let Some(attrs) = attrs {
                update_target(&mut *conn, id, attrs).await?;
            }
            Ok(id)
        }
        None => insert_node(conn, name, scope, attrs).await,
    }
}

/// Walk one resolved path against an area and return the target node id.
///
/// Each level is a find-or-create on the current scope; the found or created
/// id becomes the scope for the next level. The last level additionally
/// receives the row's attributes, whether reused or freshly inserted.
pub async fn reconcile_path(
    conn: &mut SqliteConnection,
    area_id: i64,
    path: &LevelPath,
    attrs: &TargetAttrs,
) -> Result<i64> {
    let last = path
        .len()
        .checked_sub(1)
        .ok_or_else(|| Error::InvalidInput("empty hierarchy path".to_string()))?;

    let mut scope = FindScope::Root { area_id };
    let mut node_id = 0;

    for (index, (_, name)) in path.iter().enumerate() {
        let is_target = index == last;
        node_id = find_or_create(&mut *conn, name, scope, is_target.then_some(attrs)).await?;
        scope = FindScope::Child { parent_id: node_id };
    }

    Ok(node_id)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog;
    use pmt_common::db::load_equipment_node;
    use sqlx::sqlite::SqlitePoolOptions;
    use sqlx::SqlitePool;

    async fn test_pool() -> SqlitePool {
        let pool = SqlitePoolOptions::new()
            .max_connections(1)
            .connect("sqlite::memory:")
            .await
            .expect("Failed to create in-memory database");
        sqlx::query("PRAGMA foreign_keys = ON")
            .execute(&pool)
            .await
            .unwrap();
        pmt_common::db::create_schema(&pool).await.unwrap();
        pool
    }

    fn path(names: &[&str]) -> LevelPath {
        names
            .iter()
            .enumerate()
            .map(|(level, name)| (level, name.to_string()))
            .collect()
    }

    #[tokio::test]
    async fn creates_every_level_and_sets_target_attrs_only() {
        let pool = test_pool().await;
        let mut conn = pool.acquire().await.unwrap();
        let area_id = catalog::resolve_area(&mut *conn, "Plant").await.unwrap();

        let attrs = TargetAttrs {
            model: Some("X123".to_string()),
            serial_number: Some("SN-9".to_string()),
            category_id: None,
            status: EquipmentStatus::Maintenance,
        };
        let leaf = reconcile_path(&mut *conn, area_id, &path(&["A", "B", "C"]), &attrs)
            .await
            .unwrap();

        let target = load_equipment_node(&mut *conn, leaf).await.unwrap().unwrap();
        assert_eq!(target.name, "C");
        assert_eq!(target.model.as_deref(), Some("X123"));
        assert_eq!(target.status, EquipmentStatus::Maintenance);
        assert!(target.parent_id.is_some());
        assert!(target.area_id.is_none());

        // A and B are structural: no model, default status
        let intermediate_models: Vec<Option<String>> =
            sqlx::query_scalar("SELECT model FROM equipment WHERE name IN ('A', 'B')")
                .fetch_all(&mut *conn)
                .await
                .unwrap();
        assert_eq!(intermediate_models, vec![None, None]);

        let root = load_equipment_node(&mut *conn, 1).await.unwrap().unwrap();
        assert_eq!(root.name, "A");
        assert!(root.is_root());
        assert_eq!(root.status, EquipmentStatus::Active);
    }

    #[tokio::test]
    async fn shared_prefix_reuses_intermediate_nodes() {
        let pool = test_pool().await;
        let mut conn = pool.acquire().await.unwrap();
        let area_id = catalog::resolve_area(&mut *conn, "Plant").await.unwrap();

        let attrs = TargetAttrs::default();
        reconcile_path(&mut *conn, area_id, &path(&["Extruder", "Drive", "Motor"]), &attrs)
            .await
            .unwrap();
        reconcile_path(&mut *conn, area_id, &path(&["Extruder", "Drive", "Gearbox"]), &attrs)
            .await
            .unwrap();

        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM equipment")
            .fetch_one(&mut *conn)
            .await
            .unwrap();
        // Extruder, Drive, Motor, Gearbox - Drive is not duplicated
        assert_eq!(count, 4);

        let roots: i64 =
            sqlx::query_scalar("SELECT COUNT(*) FROM equipment WHERE parent_id IS NULL")
                .fetch_one(&mut *conn)
                .await
                .unwrap();
        assert_eq!(roots, 1);
    }

    #[tokio::test]
    async fn rerun_is_idempotent_and_refreshes_target() {
        let pool = test_pool().await;
        let mut conn = pool.acquire().await.unwrap();
        let area_id = catalog::resolve_area(&mut *conn, "Plant").await.unwrap();

        let first_attrs = TargetAttrs {
            model: Some("old".to_string()),
            ..TargetAttrs::default()
        };
        let first = reconcile_path(&mut *conn, area_id, &path(&["A", "B"]), &first_attrs)
            .await
            .unwrap();

        let second_attrs = TargetAttrs {
            model: Some("new".to_string()),
            ..TargetAttrs::default()
        };
        let second = reconcile_path(&mut *conn, area_id, &path(&["A", "B"]), &second_attrs)
            .await
            .unwrap();

        assert_eq!(first, second);

        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM equipment")
            .fetch_one(&mut *conn)
            .await
            .unwrap();
        assert_eq!(count, 2);

        let node = load_equipment_node(&mut *conn, second).await.unwrap().unwrap();
        assert_eq!(node.model.as_deref(), Some("new"));
    }

    #[tokio::test]
    async fn same_name_in_different_areas_stays_separate() {
        let pool = test_pool().await;
        let mut conn = pool.acquire().await.unwrap();
        let plant = catalog::resolve_area(&mut *conn, "Plant").await.unwrap();
        let annex = catalog::resolve_area(&mut *conn, "Annex").await.unwrap();

        let attrs = TargetAttrs::default();
        let a = reconcile_path(&mut *conn, plant, &path(&["Boiler"]), &attrs)
            .await
            .unwrap();
        let b = reconcile_path(&mut *conn, annex, &path(&["Boiler"]), &attrs)
            .await
            .unwrap();

        assert_ne!(a, b);
    }

    #[tokio::test]
    async fn empty_path_is_rejected() {
        let pool = test_pool().await;
        let mut conn = pool.acquire().await.unwrap();
        let area_id = catalog::resolve_area(&mut *conn, "Plant").await.unwrap();

        let result = reconcile_path(&mut *conn, area_id, &Vec::new(), &TargetAttrs::default()).await;
        assert!(result.is_err());
    }
}
