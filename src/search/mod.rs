//! Corpus search module - read-only search over pre-built author indexes
//! / 语料检索模块：对预构建译者索引的只读检索
//!
//! Layering / 分层：
//! - `store`: one read-only SQLite handle per (language, author) artifact
//! - `engine`: lazy handle cache + the degraded public search surface
//! - `schema`: record and hit types shared by both
//!
//! Search pipeline / 检索管线：
//! - keyword: FTS AND-token match, grouped and ranked by combined score
//! - phrase: keyword candidates (already truncated) filtered by substring -
//!   a true phrase match ranked below the keyword cutoff never surfaces,
//!   a known limitation kept for behavior compatibility
//! - regexp: streamed full scan, no FTS pre-filter
//!
//! This module never writes: the artifacts are produced by an external build
//! step and are immutable for the process lifetime. / 本模块绝不写入，索引由
//! 外部构建产生，进程生命周期内不可变。

pub mod engine;
pub mod schema;
pub mod store;

pub use engine::SuttaIndex;
pub use schema::{AuthorMeta, IndexStats, SearchHit, SegmentRow, SuttaDocument};
pub use store::AuthorDb;

/// Test fixture: build a small author artifact the way the external build
/// step would / 测试夹具：按外部构建步骤的方式生成小型译者索引
#[cfg(test)]
pub(crate) mod testutil {
    use sqlx::sqlite::SqlitePoolOptions;
    use std::path::Path;

    pub(crate) async fn build_artifact(
        path: &Path,
        language: &str,
        author: &str,
        docs: &[(&str, &[(&str, &str)])],
    ) {
        let db_url = format!("sqlite:{}?mode=rwc", path.to_string_lossy());
        let db = SqlitePoolOptions::new()
            .max_connections(1)
            .connect(&db_url)
            .await
            .expect("create artifact");

        sqlx::query(
            r#"
            CREATE TABLE suttas (
                sutta_key TEXT PRIMARY KEY,
                total_segments INTEGER NOT NULL
            )
            "#,
        )
        .execute(&db)
        .await
        .unwrap();

        sqlx::query(
            r#"
            CREATE TABLE segments (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                sutta_key TEXT NOT NULL,
                segment_id TEXT NOT NULL,
                segment_text TEXT NOT NULL,
                UNIQUE(sutta_key, segment_id)
            )
            "#,
        )
        .execute(&db)
        .await
        .unwrap();

        sqlx::query(
            r#"
            CREATE VIRTUAL TABLE segments_fts USING fts5(
                segment_text,
                content='segments',
                content_rowid='id',
                tokenize = 'unicode61'
            )
            "#,
        )
        .execute(&db)
        .await
        .unwrap();

        // 插入触发器保证 FTS 与基表同步
        sqlx::query(
            r#"
            CREATE TRIGGER segments_ai AFTER INSERT ON segments BEGIN
                INSERT INTO segments_fts(rowid, segment_text)
                VALUES (new.id, new.segment_text);
            END
            "#,
        )
        .execute(&db)
        .await
        .unwrap();

        sqlx::query("CREATE TABLE meta (language TEXT NOT NULL, author TEXT NOT NULL)")
            .execute(&db)
            .await
            .unwrap();
        sqlx::query("INSERT INTO meta (language, author) VALUES (?, ?)")
            .bind(language)
            .bind(author)
            .execute(&db)
            .await
            .unwrap();

        for &(uid, segments) in docs {
            let sutta_key = format!("{}/{}/{}", language, author, uid);
            sqlx::query("INSERT INTO suttas (sutta_key, total_segments) VALUES (?, ?)")
                .bind(&sutta_key)
                .bind(segments.len() as i64)
                .execute(&db)
                .await
                .unwrap();
            for &(segment_id, segment_text) in segments {
                sqlx::query(
                    "INSERT INTO segments (sutta_key, segment_id, segment_text) VALUES (?, ?, ?)",
                )
                .bind(&sutta_key)
                .bind(segment_id)
                .bind(segment_text)
                .execute(&db)
                .await
                .unwrap();
            }
        }

        db.close().await;
    }
}
