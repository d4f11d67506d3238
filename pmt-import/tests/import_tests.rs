//! Integration tests for the two import pipelines
//!
//! Each test writes a real CSV file, reads it through the row source and
//! runs it against an in-memory database, exercising the same path the
//! binary takes.

use pmt_import::records::CatalogKind;
use pmt_import::{batch, reader};
use sqlx::sqlite::SqlitePoolOptions;
use sqlx::SqlitePool;
use std::io::Write;
use tempfile::NamedTempFile;

async fn test_pool() -> SqlitePool {
    // Single connection so every query sees the same in-memory database
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

fn csv_file(content: &str) -> NamedTempFile {
    let mut file = NamedTempFile::new().unwrap();
    file.write_all(content.as_bytes()).unwrap();
    file
}

const EQUIPMENT_HEADER: &str =
    "equipment,system,assembly,sub_assembly,component,part,area,category,model,serial_number,status";

#[tokio::test]
async fn equipment_import_builds_the_tree_and_sets_target_attrs_only() {
    let pool = test_pool().await;
    let file = csv_file(&format!(
        "{EQUIPMENT_HEADER}\n\
         Extruder,,,,,,Plant,Extruders,EX-200,SN-1,ACTIVE\n\
         Extruder,Drive,Motor,,,,Plant,Motors,M-90,SN-2,MAINTENANCE\n"
    ));

    let rows = reader::read_rows(file.path()).unwrap();
    let summary = batch::run_equipment_import(&pool, &rows).await.unwrap();

    assert_eq!(summary.imported, 2);
    assert_eq!(summary.skipped, 0);
    assert!(summary.errors.is_empty());

    let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM equipment")
        .fetch_one(&pool)
        .await
        .unwrap();
    // Extruder, Drive, Motor
    assert_eq!(count, 3);

    // Drive is structural: created by the second row's walk, no attributes
    let (model, status): (Option<String>, String) =
        sqlx::query_as("SELECT model, status FROM equipment WHERE name = 'Drive'")
            .fetch_one(&pool)
            .await
            .unwrap();
    assert_eq!(model, None);
    assert_eq!(status, "ACTIVE");

    let (model, status): (Option<String>, String) =
        sqlx::query_as("SELECT model, status FROM equipment WHERE name = 'Motor'")
            .fetch_one(&pool)
            .await
            .unwrap();
    assert_eq!(model.as_deref(), Some("M-90"));
    assert_eq!(status, "MAINTENANCE");
}

#[tokio::test]
async fn rows_sharing_a_root_create_exactly_one_root_node() {
    let pool = test_pool().await;
    let file = csv_file(&format!(
        "{EQUIPMENT_HEADER}\n\
         Extruder,Drive,,,,,Plant,,,,\n\
         Extruder,Barrel,,,,,Plant,,,,\n\
         Extruder,,,,,,Plant,,EX-200,,\n"
    ));

    let rows = reader::read_rows(file.path()).unwrap();
    batch::run_equipment_import(&pool, &rows).await.unwrap();

    let roots: i64 = sqlx::query_scalar(
        "SELECT COUNT(*) FROM equipment WHERE name = 'Extruder' AND parent_id IS NULL",
    )
    .fetch_one(&pool)
    .await
    .unwrap();
    assert_eq!(roots, 1);
}

#[tokio::test]
async fn all_empty_hierarchy_rows_are_skipped_silently() {
    let pool = test_pool().await;
    let file = csv_file(&format!(
        "{EQUIPMENT_HEADER}\n\
         Extruder,,,,,,Plant,,,,\n\
         ,,,,,,Plant,,ignored,,\n"
    ));

    let rows = reader::read_rows(file.path()).unwrap();
    let summary = batch::run_equipment_import(&pool, &rows).await.unwrap();

    assert_eq!(summary.imported, 1);
    assert_eq!(summary.skipped, 1);
    assert!(summary.errors.is_empty());

    let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM equipment")
        .fetch_one(&pool)
        .await
        .unwrap();
    assert_eq!(count, 1);
}

#[tokio::test]
async fn rerunning_the_same_file_changes_nothing_but_target_attrs() {
    let pool = test_pool().await;
    let file = csv_file(&format!(
        "{EQUIPMENT_HEADER}\n\
         Extruder,Drive,Motor,,,,Plant,,M-90,,\n\
         Extruder,Barrel,,,,,Plant,,B-1,,\n"
    ));

    let rows = reader::read_rows(file.path()).unwrap();
    batch::run_equipment_import(&pool, &rows).await.unwrap();

    let before: Vec<(i64, String)> =
        sqlx::query_as("SELECT id, name FROM equipment ORDER BY id")
            .fetch_all(&pool)
            .await
            .unwrap();

    batch::run_equipment_import(&pool, &rows).await.unwrap();

    let after: Vec<(i64, String)> =
        sqlx::query_as("SELECT id, name FROM equipment ORDER BY id")
            .fetch_all(&pool)
            .await
            .unwrap();

    assert_eq!(before, after);
}

#[tokio::test]
async fn a_failing_row_aborts_the_whole_equipment_import() {
    let pool = test_pool().await;

    let good = csv_file(&format!(
        "{EQUIPMENT_HEADER}\n\
         Extruder,Drive,,,,,Plant,,,,\n"
    ));
    let rows = reader::read_rows(good.path()).unwrap();
    batch::run_equipment_import(&pool, &rows).await.unwrap();

    let before: Vec<(i64, String)> =
        sqlx::query_as("SELECT id, name FROM equipment ORDER BY id")
            .fetch_all(&pool)
            .await
            .unwrap();
    assert_eq!(before.len(), 2);

    // Second file fails on its second row: unknown status value
    let bad = csv_file(&format!(
        "{EQUIPMENT_HEADER}\n\
         Press,,,,,,Plant,,,,\n\
         Press,Ram,,,,,Plant,,,,BROKEN\n"
    ));
    let rows = reader::read_rows(bad.path()).unwrap();
    let result = batch::run_equipment_import(&pool, &rows).await;
    assert!(result.is_err());

    // The whole transaction rolled back, including the pre-import truncate:
    // the table is exactly as the first run left it.
    let after: Vec<(i64, String)> =
        sqlx::query_as("SELECT id, name FROM equipment ORDER BY id")
            .fetch_all(&pool)
            .await
            .unwrap();
    assert_eq!(before, after);
}

#[tokio::test]
async fn catalog_import_isolates_failing_rows_with_savepoints() {
    let pool = test_pool().await;

    // Row 4 (line 5) reuses SKU-1 and violates the unique constraint
    let mut content = String::from("sku,name,quantity,unit_cost\n");
    for i in 1..=3 {
        content.push_str(&format!("SKU-{i},Part {i},{i},1.5\n"));
    }
    content.push_str("SKU-1,Duplicate,9,9.9\n");
    for i in 5..=10 {
        content.push_str(&format!("SKU-{i},Part {i},{i},1.5\n"));
    }
    let file = csv_file(&content);

    let rows = reader::read_rows(file.path()).unwrap();
    let summary = batch::run_catalog_import(&pool, CatalogKind::InventoryItems, &rows)
        .await
        .unwrap();

    assert_eq!(summary.imported, 9);
    assert_eq!(summary.errors.len(), 1);
    assert_eq!(summary.errors[0].line, 5);

    // The outer transaction committed the nine good rows
    let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM inventory_items")
        .fetch_one(&pool)
        .await
        .unwrap();
    assert_eq!(count, 9);

    // The failed row left nothing behind and can be retried on its own
    let dup_names: Vec<String> =
        sqlx::query_scalar("SELECT name FROM inventory_items WHERE sku = 'SKU-1'")
            .fetch_all(&pool)
            .await
            .unwrap();
    assert_eq!(dup_names, vec!["Part 1".to_string()]);
}

#[tokio::test]
async fn catalog_import_resolves_references_by_name() {
    let pool = test_pool().await;

    let roles = csv_file("name\ntechnician\nsupervisor\n");
    let rows = reader::read_rows(roles.path()).unwrap();
    batch::run_catalog_import(&pool, CatalogKind::Roles, &rows)
        .await
        .unwrap();

    let users = csv_file(
        "name,email,role\n\
         Ada,ada@plant.example,technician\n\
         Grace,grace@plant.example,missing-role\n",
    );
    let rows = reader::read_rows(users.path()).unwrap();
    let summary = batch::run_catalog_import(&pool, CatalogKind::Users, &rows)
        .await
        .unwrap();

    assert_eq!(summary.imported, 1);
    assert_eq!(summary.errors.len(), 1);

    let role_id: Option<i64> =
        sqlx::query_scalar("SELECT role_id FROM users WHERE email = 'ada@plant.example'")
            .fetch_one(&pool)
            .await
            .unwrap();
    assert!(role_id.is_some());
}
