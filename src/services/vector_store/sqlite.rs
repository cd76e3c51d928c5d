//! Embedded SQLite vector store.
//!
//! Vectors are stored as little-endian f32 blobs and scored with an exact
//! cosine scan; ties keep insertion order.

use std::path::{Path, PathBuf};
use std::sync::{Mutex, MutexGuard};

use async_trait::async_trait;
use rusqlite::{Connection, OptionalExtension, params};
use tracing::{debug, info};

use super::{CollectionInfo, VectorStore, cosine_similarity};
use crate::error::VectorStoreError;
use crate::models::{ChunkMetadata, DocumentChunk, SearchResult};

/// Database file created inside the persist directory.
pub const DATABASE_FILE: &str = "mindshift.sqlite3";

const SCHEMA: &str = r#"
CREATE TABLE IF NOT EXISTS collections (
    name TEXT PRIMARY KEY,
    dimension INTEGER,
    created_at TEXT NOT NULL
);

CREATE TABLE IF NOT EXISTS records (
    seq INTEGER PRIMARY KEY AUTOINCREMENT,
    collection TEXT NOT NULL,
    id TEXT NOT NULL,
    content TEXT NOT NULL,
    embedding BLOB NOT NULL,
    metadata TEXT NOT NULL,
    UNIQUE(collection, id)
);

CREATE INDEX IF NOT EXISTS idx_records_collection ON records(collection);
"#;

pub struct SqliteStore {
    conn: Mutex<Connection>,
    path: Option<PathBuf>,
}

impl SqliteStore {
    /// Open (or create) the store under `persist_directory`.
    pub fn open(persist_directory: &Path) -> Result<Self, VectorStoreError> {
        std::fs::create_dir_all(persist_directory).map_err(|e| {
            VectorStoreError::ConnectionError(format!(
                "cannot create {}: {}",
                persist_directory.display(),
                e
            ))
        })?;

        let path = persist_directory.join(DATABASE_FILE);
        let conn = Connection::open(&path)?;
        conn.pragma_update(None, "journal_mode", "WAL")?;
        conn.execute_batch(SCHEMA)?;

        debug!(path = %path.display(), "opened vector store");
        Ok(Self {
            conn: Mutex::new(conn),
            path: Some(path),
        })
    }

    /// Non-persistent store, for tests and one-off runs.
    pub fn open_in_memory() -> Result<Self, VectorStoreError> {
        let conn = Connection::open_in_memory()?;
        conn.execute_batch(SCHEMA)?;
        Ok(Self {
            conn: Mutex::new(conn),
            path: None,
        })
    }

    /// Path of the database file, if file-backed.
    pub fn path(&self) -> Option<&Path> {
        self.path.as_deref()
    }

    fn lock(&self) -> Result<MutexGuard<'_, Connection>, VectorStoreError> {
        self.conn.lock().map_err(|_| VectorStoreError::LockPoisoned)
    }
}

/// `None` if the collection is missing, `Some(None)` if it has no dimension yet.
fn collection_dimension(
    conn: &Connection,
    collection: &str,
) -> Result<Option<Option<usize>>, VectorStoreError> {
    let dimension = conn
        .query_row(
            "SELECT dimension FROM collections WHERE name = ?1",
            params![collection],
            |row| row.get::<_, Option<i64>>(0),
        )
        .optional()?;
    Ok(dimension.map(|d| d.map(|d| d as usize)))
}

fn encode_vector(vector: &[f32]) -> Vec<u8> {
    vector.iter().flat_map(|v| v.to_le_bytes()).collect()
}

fn decode_vector(bytes: &[u8]) -> Vec<f32> {
    bytes
        .chunks_exact(4)
        .map(|b| f32::from_le_bytes([b[0], b[1], b[2], b[3]]))
        .collect()
}

fn delete_rows(conn: &Connection, collection: &str) -> Result<bool, rusqlite::Error> {
    conn.execute(
        "DELETE FROM records WHERE collection = ?1",
        params![collection],
    )?;
    let removed = conn.execute(
        "DELETE FROM collections WHERE name = ?1",
        params![collection],
    )?;
    Ok(removed > 0)
}

fn insert_collection(conn: &Connection, collection: &str) -> Result<(), rusqlite::Error> {
    conn.execute(
        "INSERT OR IGNORE INTO collections (name, dimension, created_at) VALUES (?1, NULL, ?2)",
        params![collection, chrono::Utc::now().to_rfc3339()],
    )?;
    Ok(())
}

struct ScoredRow {
    seq: i64,
    score: f32,
    result: SearchResult,
}

#[async_trait]
impl VectorStore for SqliteStore {
    async fn create_collection(&self, collection: &str) -> Result<(), VectorStoreError> {
        let conn = self.lock()?;
        insert_collection(&conn, collection)
            .map_err(|e| VectorStoreError::CollectionError(e.to_string()))
    }

    async fn delete_collection(&self, collection: &str) -> Result<bool, VectorStoreError> {
        let mut conn = self.lock()?;
        let tx = conn.transaction()?;
        let existed =
            delete_rows(&tx, collection).map_err(|e| VectorStoreError::DeleteError(e.to_string()))?;
        tx.commit()?;

        if existed {
            info!(collection, "deleted collection");
        }
        Ok(existed)
    }

    async fn reset_collection(&self, collection: &str) -> Result<(), VectorStoreError> {
        let mut conn = self.lock()?;
        let tx = conn.transaction()?;
        delete_rows(&tx, collection).map_err(|e| VectorStoreError::DeleteError(e.to_string()))?;
        insert_collection(&tx, collection)
            .map_err(|e| VectorStoreError::CollectionError(e.to_string()))?;
        tx.commit()?;

        info!(collection, "reset collection");
        Ok(())
    }

    async fn replace_collection(
        &self,
        source: &str,
        target: &str,
    ) -> Result<(), VectorStoreError> {
        let mut conn = self.lock()?;
        let tx = conn.transaction()?;

        if collection_dimension(&tx, source)?.is_none() {
            return Err(VectorStoreError::CollectionNotFound(source.to_string()));
        }
        if source == target {
            return Ok(());
        }

        delete_rows(&tx, target).map_err(|e| VectorStoreError::DeleteError(e.to_string()))?;
        tx.execute(
            "UPDATE collections SET name = ?1 WHERE name = ?2",
            params![target, source],
        )
        .map_err(|e| VectorStoreError::CollectionError(e.to_string()))?;
        tx.execute(
            "UPDATE records SET collection = ?1 WHERE collection = ?2",
            params![target, source],
        )
        .map_err(|e| VectorStoreError::CollectionError(e.to_string()))?;
        tx.commit()?;

        info!(source, target, "replaced collection");
        Ok(())
    }

    async fn upsert(
        &self,
        collection: &str,
        chunks: &[DocumentChunk],
    ) -> Result<(), VectorStoreError> {
        if chunks.is_empty() {
            return Ok(());
        }

        let mut conn = self.lock()?;
        let tx = conn.transaction()?;

        let stored = collection_dimension(&tx, collection)?
            .ok_or_else(|| VectorStoreError::CollectionNotFound(collection.to_string()))?;
        let expected = stored.unwrap_or(chunks[0].embedding.len());
        if expected == 0 {
            return Err(VectorStoreError::UpsertError(format!(
                "chunk {} has no embedding",
                chunks[0].id
            )));
        }

        {
            let mut stmt = tx.prepare(
                "INSERT INTO records (collection, id, content, embedding, metadata)
                 VALUES (?1, ?2, ?3, ?4, ?5)
                 ON CONFLICT(collection, id) DO UPDATE SET
                     content = excluded.content,
                     embedding = excluded.embedding,
                     metadata = excluded.metadata",
            )?;

            for chunk in chunks {
                if chunk.embedding.len() != expected {
                    return Err(VectorStoreError::DimensionMismatch {
                        expected,
                        actual: chunk.embedding.len(),
                    });
                }
                let metadata = serde_json::to_string(&chunk.metadata)
                    .map_err(|e| VectorStoreError::UpsertError(e.to_string()))?;
                stmt.execute(params![
                    collection,
                    chunk.id,
                    chunk.content,
                    encode_vector(&chunk.embedding),
                    metadata
                ])?;
            }
        }

        if stored.is_none() {
            tx.execute(
                "UPDATE collections SET dimension = ?1 WHERE name = ?2",
                params![expected as i64, collection],
            )?;
        }
        tx.commit()?;

        debug!(collection, records = chunks.len(), "upserted records");
        Ok(())
    }

    async fn query(
        &self,
        collection: &str,
        vector: &[f32],
        top_k: usize,
    ) -> Result<Vec<SearchResult>, VectorStoreError> {
        let conn = self.lock()?;

        let dimension = collection_dimension(&conn, collection)?
            .ok_or_else(|| VectorStoreError::CollectionNotFound(collection.to_string()))?;
        if let Some(expected) = dimension {
            if expected != vector.len() {
                return Err(VectorStoreError::DimensionMismatch {
                    expected,
                    actual: vector.len(),
                });
            }
        }
        if top_k == 0 {
            return Ok(Vec::new());
        }

        let mut stmt = conn.prepare(
            "SELECT seq, id, content, embedding, metadata FROM records
             WHERE collection = ?1 ORDER BY seq",
        )?;
        let rows = stmt.query_map(params![collection], |row| {
            Ok((
                row.get::<_, i64>(0)?,
                row.get::<_, String>(1)?,
                row.get::<_, String>(2)?,
                row.get::<_, Vec<u8>>(3)?,
                row.get::<_, String>(4)?,
            ))
        })?;

        let mut scored = Vec::new();
        for row in rows {
            let (seq, id, content, embedding, metadata) = row?;
            let metadata: ChunkMetadata = serde_json::from_str(&metadata)
                .map_err(|e| VectorStoreError::SearchError(format!("corrupt metadata: {e}")))?;
            let score = cosine_similarity(vector, &decode_vector(&embedding));
            scored.push(ScoredRow {
                seq,
                score,
                result: SearchResult {
                    chunk_id: id,
                    score,
                    content,
                    metadata,
                },
            });
        }

        scored.sort_by(|a, b| b.score.total_cmp(&a.score).then(a.seq.cmp(&b.seq)));
        scored.truncate(top_k);

        Ok(scored.into_iter().map(|s| s.result).collect())
    }

    async fn count(&self, collection: &str) -> Result<u64, VectorStoreError> {
        let conn = self.lock()?;
        let count: i64 = conn.query_row(
            "SELECT COUNT(*) FROM records WHERE collection = ?1",
            params![collection],
            |row| row.get(0),
        )?;
        Ok(count as u64)
    }

    async fn collection_info(
        &self,
        collection: &str,
    ) -> Result<Option<CollectionInfo>, VectorStoreError> {
        let conn = self.lock()?;
        let row = conn
            .query_row(
                "SELECT c.dimension, c.created_at,
                        (SELECT COUNT(*) FROM records r WHERE r.collection = c.name)
                 FROM collections c WHERE c.name = ?1",
                params![collection],
                |row| {
                    Ok((
                        row.get::<_, Option<i64>>(0)?,
                        row.get::<_, String>(1)?,
                        row.get::<_, i64>(2)?,
                    ))
                },
            )
            .optional()?;

        Ok(row.map(|(dimension, created_at, count)| CollectionInfo {
            name: collection.to_string(),
            points_count: count as u64,
            dimension: dimension.map(|d| d as usize),
            created_at,
        }))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{Document, FileType};

    const COLLECTION: &str = "som_mindshift";

    fn chunk(name: &str, content: &str, embedding: Vec<f32>) -> DocumentChunk {
        let doc = Document::new(
            content.to_string(),
            Path::new(name),
            FileType::Txt,
            "checksum".to_string(),
        );
        let mut chunk = DocumentChunk::from_document(
            &doc,
            content.to_string(),
            0,
            1,
            0,
            content.chars().count() as u64,
        );
        chunk.embedding = embedding;
        chunk
    }

    fn sample_chunks() -> Vec<DocumentChunk> {
        vec![
            chunk("a.txt", "intent", vec![1.0, 0.0, 0.0]),
            chunk("b.txt", "redefine", vec![0.0, 1.0, 0.0]),
            chunk("c.txt", "consequence", vec![0.7, 0.7, 0.0]),
        ]
    }

    #[tokio::test]
    async fn test_upsert_count_and_query() {
        let store = SqliteStore::open_in_memory().unwrap();
        store.create_collection(COLLECTION).await.unwrap();
        store.upsert(COLLECTION, &sample_chunks()).await.unwrap();

        assert_eq!(store.count(COLLECTION).await.unwrap(), 3);

        let results = store.query(COLLECTION, &[1.0, 0.1, 0.0], 2).await.unwrap();
        assert_eq!(results.len(), 2);
        assert_eq!(results[0].content, "intent");
        assert_eq!(results[1].content, "consequence");
        assert!(results[0].score >= results[1].score);
        assert_eq!(results[0].metadata.filename, "a.txt");
    }

    #[tokio::test]
    async fn test_query_returns_all_when_k_exceeds_size() {
        let store = SqliteStore::open_in_memory().unwrap();
        store.create_collection(COLLECTION).await.unwrap();
        store.upsert(COLLECTION, &sample_chunks()).await.unwrap();

        let results = store.query(COLLECTION, &[0.0, 0.0, 1.0], 10).await.unwrap();
        assert_eq!(results.len(), 3);
        assert!(store.query(COLLECTION, &[0.0, 0.0, 1.0], 0).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_ties_keep_insertion_order() {
        let store = SqliteStore::open_in_memory().unwrap();
        store.create_collection(COLLECTION).await.unwrap();
        let chunks = vec![
            chunk("first.txt", "first", vec![1.0, 0.0]),
            chunk("second.txt", "second", vec![2.0, 0.0]),
            chunk("third.txt", "third", vec![3.0, 0.0]),
        ];
        store.upsert(COLLECTION, &chunks).await.unwrap();

        let results = store.query(COLLECTION, &[1.0, 0.0], 3).await.unwrap();
        let order: Vec<_> = results.iter().map(|r| r.content.as_str()).collect();
        assert_eq!(order, vec!["first", "second", "third"]);
    }

    #[tokio::test]
    async fn test_upsert_replaces_same_id() {
        let store = SqliteStore::open_in_memory().unwrap();
        store.create_collection(COLLECTION).await.unwrap();
        store.upsert(COLLECTION, &sample_chunks()).await.unwrap();

        let mut updated = sample_chunks();
        updated[0].content = "positive intention".to_string();
        store.upsert(COLLECTION, &updated[..1]).await.unwrap();

        assert_eq!(store.count(COLLECTION).await.unwrap(), 3);
        let results = store.query(COLLECTION, &[1.0, 0.0, 0.0], 1).await.unwrap();
        assert_eq!(results[0].content, "positive intention");
    }

    #[tokio::test]
    async fn test_dimension_mismatch() {
        let store = SqliteStore::open_in_memory().unwrap();
        store.create_collection(COLLECTION).await.unwrap();
        store.upsert(COLLECTION, &sample_chunks()).await.unwrap();

        let bad = vec![chunk("d.txt", "short", vec![1.0, 0.0])];
        let err = store.upsert(COLLECTION, &bad).await.unwrap_err();
        assert!(matches!(
            err,
            VectorStoreError::DimensionMismatch {
                expected: 3,
                actual: 2
            }
        ));

        let err = store.query(COLLECTION, &[1.0], 1).await.unwrap_err();
        assert!(matches!(err, VectorStoreError::DimensionMismatch { .. }));
    }

    #[tokio::test]
    async fn test_missing_collection() {
        let store = SqliteStore::open_in_memory().unwrap();

        assert_eq!(store.count("nope").await.unwrap(), 0);
        assert!(store.collection_info("nope").await.unwrap().is_none());
        assert!(matches!(
            store.query("nope", &[1.0], 1).await.unwrap_err(),
            VectorStoreError::CollectionNotFound(_)
        ));
        assert!(matches!(
            store.upsert("nope", &sample_chunks()).await.unwrap_err(),
            VectorStoreError::CollectionNotFound(_)
        ));
        assert!(!store.delete_collection("nope").await.unwrap());
    }

    #[tokio::test]
    async fn test_reset_and_delete() {
        let store = SqliteStore::open_in_memory().unwrap();
        store.create_collection(COLLECTION).await.unwrap();
        store.upsert(COLLECTION, &sample_chunks()).await.unwrap();

        store.reset_collection(COLLECTION).await.unwrap();
        assert_eq!(store.count(COLLECTION).await.unwrap(), 0);
        let info = store.collection_info(COLLECTION).await.unwrap().unwrap();
        assert_eq!(info.dimension, None);

        // A fresh collection accepts a new dimension.
        let small = vec![chunk("d.txt", "two dims", vec![1.0, 0.0])];
        store.upsert(COLLECTION, &small).await.unwrap();
        assert_eq!(store.count(COLLECTION).await.unwrap(), 1);

        assert!(store.delete_collection(COLLECTION).await.unwrap());
        assert!(store.collection_info(COLLECTION).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_replace_collection_swaps_in_new_records() {
        let store = SqliteStore::open_in_memory().unwrap();
        store.create_collection(COLLECTION).await.unwrap();
        store.upsert(COLLECTION, &sample_chunks()).await.unwrap();

        let staging = "som_mindshift.building";
        store.reset_collection(staging).await.unwrap();
        let rebuilt = vec![
            chunk("x.txt", "reframe", vec![1.0, 0.0]),
            chunk("y.txt", "outcome", vec![0.0, 1.0]),
        ];
        store.upsert(staging, &rebuilt).await.unwrap();

        // The live collection is untouched until the swap.
        assert_eq!(store.count(COLLECTION).await.unwrap(), 3);

        store.replace_collection(staging, COLLECTION).await.unwrap();
        assert!(store.collection_info(staging).await.unwrap().is_none());
        let info = store.collection_info(COLLECTION).await.unwrap().unwrap();
        assert_eq!(info.points_count, 2);
        assert_eq!(info.dimension, Some(2));

        let results = store.query(COLLECTION, &[1.0, 0.0], 2).await.unwrap();
        let order: Vec<_> = results.iter().map(|r| r.content.as_str()).collect();
        assert_eq!(order, vec!["reframe", "outcome"]);
    }

    #[tokio::test]
    async fn test_replace_collection_requires_source() {
        let store = SqliteStore::open_in_memory().unwrap();
        store.create_collection(COLLECTION).await.unwrap();
        store.upsert(COLLECTION, &sample_chunks()).await.unwrap();

        let err = store
            .replace_collection("missing", COLLECTION)
            .await
            .unwrap_err();
        assert!(matches!(err, VectorStoreError::CollectionNotFound(_)));
        assert_eq!(store.count(COLLECTION).await.unwrap(), 3);

        store.replace_collection(COLLECTION, COLLECTION).await.unwrap();
        assert_eq!(store.count(COLLECTION).await.unwrap(), 3);
    }

    #[tokio::test]
    async fn test_collections_are_isolated() {
        let store = SqliteStore::open_in_memory().unwrap();
        store.create_collection("one").await.unwrap();
        store.create_collection("two").await.unwrap();
        store.upsert("one", &sample_chunks()).await.unwrap();

        assert_eq!(store.count("one").await.unwrap(), 3);
        assert_eq!(store.count("two").await.unwrap(), 0);
        assert!(store.query("two", &[1.0, 0.0, 0.0], 5).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_persists_across_reopen() {
        let dir = tempfile::tempdir().unwrap();
        let persist = dir.path().join("db");

        {
            let store = SqliteStore::open(&persist).unwrap();
            store.create_collection(COLLECTION).await.unwrap();
            store.upsert(COLLECTION, &sample_chunks()).await.unwrap();
            assert_eq!(store.count(COLLECTION).await.unwrap(), 3);
        }

        let reopened = SqliteStore::open(&persist).unwrap();
        assert_eq!(reopened.count(COLLECTION).await.unwrap(), 3);
        assert!(reopened.path().unwrap().ends_with(DATABASE_FILE));

        let info = reopened.collection_info(COLLECTION).await.unwrap().unwrap();
        assert_eq!(info.points_count, 3);
        assert_eq!(info.dimension, Some(3));
    }

    #[test]
    fn test_vector_blob_encoding() {
        let vector = vec![0.25f32, -1.5, 3.0];
        assert_eq!(decode_vector(&encode_vector(&vector)), vector);
    }
}
