//! Queue item queries.

use sqlx::SqlitePool;

use crate::error::DbResult;
use crate::models::Item;

/// Append an item and return its assigned key.
pub async fn insert_item(pool: &SqlitePool, data: &[u8]) -> DbResult<i64> {
    let result = sqlx::query("INSERT INTO queue (data) VALUES (?)")
        .bind(data)
        .execute(pool)
        .await?;
    Ok(result.last_insert_rowid())
}

/// Get up to `limit` of the oldest items, ascending by id.
///
/// Read-only: repeated calls return the same leading items until they are deleted.
pub async fn get_oldest_items(pool: &SqlitePool, limit: i64) -> DbResult<Vec<Item>> {
    if limit <= 0 {
        // SQLite treats a negative LIMIT as "no limit"
        return Ok(Vec::new());
    }

    let items = sqlx::query_as::<_, Item>(
        r#"
        SELECT id, data
        FROM queue
        ORDER BY id ASC
        LIMIT ?
        "#,
    )
    .bind(limit)
    .fetch_all(pool)
    .await?;
    Ok(items)
}

/// Delete an item by key.
///
/// Returns whether a row was removed. Deleting an absent key is not an error.
pub async fn delete_item(pool: &SqlitePool, id: i64) -> DbResult<bool> {
    let result = sqlx::query("DELETE FROM queue WHERE id = ?")
        .bind(id)
        .execute(pool)
        .await?;
    Ok(result.rows_affected() > 0)
}

/// Count items still in the queue.
pub async fn count_items(pool: &SqlitePool) -> DbResult<i64> {
    let count: (i64,) = sqlx::query_as("SELECT COUNT(*) FROM queue")
        .fetch_one(pool)
        .await?;
    Ok(count.0)
}

/// Key the next insert will receive.
pub async fn next_item_id(pool: &SqlitePool) -> DbResult<i64> {
    let seq: Option<(i64,)> = sqlx::query_as("SELECT seq FROM sqlite_sequence WHERE name = 'queue'")
        .fetch_optional(pool)
        .await?;
    Ok(seq.map_or(1, |(seq,)| seq + 1))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::QueueDb;
    use pretty_assertions::assert_eq;

    async fn setup_test_db() -> QueueDb {
        QueueDb::open_in_memory().await.unwrap()
    }

    #[tokio::test]
    async fn test_insert_assigns_increasing_ids() {
        let db = setup_test_db().await;
        let pool = db.pool();

        let first = insert_item(pool, b"a").await.unwrap();
        let second = insert_item(pool, b"b").await.unwrap();
        let third = insert_item(pool, b"c").await.unwrap();

        assert!(first < second && second < third);
        assert_eq!(count_items(pool).await.unwrap(), 3);
    }

    #[tokio::test]
    async fn test_get_oldest_is_ordered_and_limited() {
        let db = setup_test_db().await;
        let pool = db.pool();

        for payload in ["A", "B", "C"] {
            insert_item(pool, payload.as_bytes()).await.unwrap();
        }

        let items = get_oldest_items(pool, 2).await.unwrap();
        assert_eq!(
            items,
            vec![
                Item {
                    id: 1,
                    data: b"A".to_vec()
                },
                Item {
                    id: 2,
                    data: b"B".to_vec()
                },
            ]
        );

        // Peek, not pop
        assert_eq!(get_oldest_items(pool, 2).await.unwrap(), items);
    }

    #[tokio::test]
    async fn test_get_with_non_positive_limit_is_empty() {
        let db = setup_test_db().await;
        let pool = db.pool();
        insert_item(pool, b"x").await.unwrap();

        assert!(get_oldest_items(pool, 0).await.unwrap().is_empty());
        assert!(get_oldest_items(pool, -1).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_delete_is_idempotent() {
        let db = setup_test_db().await;
        let pool = db.pool();
        let id = insert_item(pool, b"x").await.unwrap();

        assert!(delete_item(pool, id).await.unwrap());
        assert!(!delete_item(pool, id).await.unwrap());
        assert!(!delete_item(pool, 9_999).await.unwrap());
        assert_eq!(count_items(pool).await.unwrap(), 0);
    }

    #[tokio::test]
    async fn test_ids_not_reused_after_deleting_tail() {
        let db = setup_test_db().await;
        let pool = db.pool();

        let first = insert_item(pool, b"same").await.unwrap();
        delete_item(pool, first).await.unwrap();
        assert_eq!(next_item_id(pool).await.unwrap(), first + 1);

        let second = insert_item(pool, b"same").await.unwrap();
        assert!(second > first);

        let items = get_oldest_items(pool, 10).await.unwrap();
        assert_eq!(items.len(), 1);
        assert_eq!(items[0].id, second);
    }

    #[tokio::test]
    async fn test_next_item_id_on_empty_queue() {
        let db = setup_test_db().await;
        assert_eq!(next_item_id(db.pool()).await.unwrap(), 1);
    }
}
