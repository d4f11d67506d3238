//! Shared row models

use crate::{Error, Result};
use chrono::NaiveDateTime;
use sqlx::{Row, SqliteConnection};

/// Lifecycle status of an equipment node.
///
/// Structural nodes created as intermediate tree levels are always `Active`;
/// target nodes carry whatever the imported row says.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum EquipmentStatus {
    #[default]
    Active,
    Maintenance,
    Retired,
}

impl EquipmentStatus {
    pub fn as_str(self) -> &'static str {
        match self {
            EquipmentStatus::Active => "ACTIVE",
            EquipmentStatus::Maintenance => "MAINTENANCE",
            EquipmentStatus::Retired => "RETIRED",
        }
    }
}

impl std::str::FromStr for EquipmentStatus {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_uppercase().as_str() {
            "ACTIVE" => Ok(EquipmentStatus::Active),
            "MAINTENANCE" => Ok(EquipmentStatus::Maintenance),
            "RETIRED" => Ok(EquipmentStatus::Retired),
            other => Err(Error::InvalidInput(format!(
                "unknown equipment status '{}'",
                other
            ))),
        }
    }
}

/// One node of an area's equipment tree
#[derive(Debug, Clone)]
pub struct EquipmentNode {
    pub id: i64,
    pub name: String,
    pub model: Option<String>,
    pub serial_number: Option<String>,
    pub category_id: Option<i64>,
    pub area_id: Option<i64>,
    pub parent_id: Option<i64>,
    pub status: EquipmentStatus,
    pub created_at: NaiveDateTime,
    pub updated_at: NaiveDateTime,
}

impl EquipmentNode {
    /// True for nodes anchored directly under an area.
    pub fn is_root(&self) -> bool {
        self.area_id.is_some()
    }
}

/// Load one equipment node by id
pub async fn load_equipment_node(
    conn: &mut SqliteConnection,
    id: i64,
) -> Result<Option<EquipmentNode>> {
    let row = sqlx::query(
        r#"
        SELECT id, name, model, serial_number, category_id, area_id, parent_id,
               status, created_at, updated_at
        FROM equipment
        WHERE id = ?
        "#,
    )
    .bind(id)
    .fetch_optional(conn)
    .await?;

    match row {
        Some(row) => {
            let status: String = row.get("status");
            Ok(Some(EquipmentNode {
                id: row.get("id"),
                name: row.get("name"),
                model: row.get("model"),
                serial_number: row.get("serial_number"),
                category_id: row.get("category_id"),
                area_id: row.get("area_id"),
                parent_id: row.get("parent_id"),
                status: status.parse()?,
                created_at: row.get("created_at"),
                updated_at: row.get("updated_at"),
            }))
        }
        None => Ok(None),
    }
}
