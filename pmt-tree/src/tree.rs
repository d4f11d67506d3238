//! Recursive hierarchy listing
//!
//! Walks the persisted equipment tree from its area-anchored roots, one
//! query per node, accumulating a depth counter and the rendered path of
//! ancestor names. The collected entries are sorted lexicographically by
//! path string, not by traversal order.

use pmt_common::Result;
use sqlx::SqlitePool;
use std::future::Future;
use std::pin::Pin;

/// Separator between path elements.
const PATH_SEPARATOR: &str = " -> ";

/// One rendered tree entry: depth below the root (root = 0) and the full
/// area-to-node path.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TreeEntry {
    pub level: usize,
    pub path: String,
}

/// Collect every equipment node as `(level, path)`, sorted by path.
pub async fn list_hierarchy(pool: &SqlitePool) -> Result<Vec<TreeEntry>> {
    let roots = sqlx::query_as::<_, (i64, String, String)>(
        r#"
        SELECT e.id, e.name, a.name
        FROM equipment e
        JOIN areas a ON a.id = e.area_id
        WHERE e.parent_id IS NULL AND e.area_id IS NOT NULL
        "#,
    )
    .fetch_all(pool)
    .await?;

    let mut entries = Vec::new();
    for (id, name, area_name) in roots {
        let path = format!("{}{}{}", area_name, PATH_SEPARATOR, name);
        entries.push(TreeEntry {
            level: 0,
            path: path.clone(),
        });
        walk_children(pool, id, 1, path, &mut entries).await?;
    }

    entries.sort_by(|a, b| a.path.cmp(&b.path));
    Ok(entries)
}

/// Depth-first walk below one node. Boxed because the future recurses.
fn walk_children<'a>(
    pool: &'a SqlitePool,
    parent_id: i64,
    level: usize,
    prefix: String,
    entries: &'a mut Vec<TreeEntry>,
) -> Pin<Box<dyn Future<Output = Result<()>> + Send + 'a>> {
    Box::pin(async move {
        let children = sqlx::query_as::<_, (i64, String)>(
            "SELECT id, name FROM equipment WHERE parent_id = ? ORDER BY name",
        )
        .bind(parent_id)
        .fetch_all(pool)
        .await?;

        for (id, name) in children {
            let path = format!("{}{}{}", prefix, PATH_SEPARATOR, name);
            entries.push(TreeEntry {
                level,
                path: path.clone(),
            });
            walk_children(pool, id, level + 1, path, entries).await?;
        }

        Ok(())
    })
}
