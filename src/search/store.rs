//! Per-author read-only store / 单译者只读存储
//!
//! One SQLite artifact per (language, author) pair, opened read-only and
//! never mutated: `suttas` + `segments` + `segments_fts` (FTS5, kept in sync
//! by the build step) + optional one-row `meta`. / 每个(语言,译者)一个只读
//! SQLite 索引文件，进程内绝不写入。
//!
//! The regexp path is a streamed full scan: no token pre-filter can serve
//! arbitrary regular expressions, and streaming keeps the scan cancellable
//! at row boundaries when the caller abandons the task. / 正则路径是流式全表
//! 扫描，调用方放弃任务时可在行边界取消。

use futures::TryStreamExt;
use sqlx::{sqlite::SqlitePoolOptions, Pool, Row, Sqlite};
use std::collections::HashMap;
use std::path::{Path, PathBuf};

use crate::error::{CorpusError, Result};

use super::schema::{AuthorMeta, SearchHit};

/// Read-only handle over one author artifact / 单译者索引的只读句柄
pub struct AuthorDb {
    db: Pool<Sqlite>,
    path: PathBuf,
}

impl AuthorDb {
    /// Open an artifact read-only. A missing file is `ArtifactNotFound`
    /// (expected absence); `Open` means the file exists but cannot be
    /// connected. / 只读打开索引文件；文件缺失与打开失败分属不同错误。
    pub async fn open(path: &Path) -> Result<Self> {
        if !path.exists() {
            let stem = path.file_stem().and_then(|s| s.to_str()).unwrap_or("");
            let (language, author) = stem.split_once('-').unwrap_or((stem, ""));
            return Err(CorpusError::ArtifactNotFound {
                language: language.to_string(),
                author: author.to_string(),
            });
        }

        let db_url = format!("sqlite:{}?mode=ro", path.to_string_lossy());

        let db = SqlitePoolOptions::new()
            .max_connections(4)
            .connect(&db_url)
            .await
            .map_err(|e| CorpusError::Open {
                path: path.to_path_buf(),
                detail: e.to_string(),
            })?;

        tracing::info!("Author index opened read-only: {:?}", path);

        Ok(Self { db, path: path.to_path_buf() })
    }

    /// Artifact path / 索引文件路径
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Close the connection pool / 关闭连接池
    pub async fn close(&self) {
        self.db.close().await;
        tracing::info!("Author index closed: {:?}", self.path);
    }

    /// All segments of one document, keyed by segment_id in plain string
    /// order (not numeric scid order - a long-standing quirk callers rely
    /// on). `None` when no segment matches. / 单篇经文的全部段，按 segment_id
    /// 的字符串序排列（历史行为），无匹配时返回 `None`。
    pub async fn translation(
        &self,
        sutta_key: &str,
    ) -> Result<Option<serde_json::Map<String, serde_json::Value>>> {
        let rows = sqlx::query(
            "SELECT segment_id, segment_text FROM segments WHERE sutta_key = ? ORDER BY segment_id",
        )
        .bind(sutta_key)
        .fetch_all(&self.db)
        .await
        .map_err(|e| CorpusError::Query(e.to_string()))?;

        if rows.is_empty() {
            return Ok(None);
        }

        let mut map = serde_json::Map::new();
        for row in &rows {
            let segment_id: String = row.get("segment_id");
            let segment_text: String = row.get("segment_text");
            map.insert(segment_id, serde_json::Value::String(segment_text));
        }
        Ok(Some(map))
    }

    /// AND-token full-text search, grouped per document and ranked by
    /// `match_count + match_count/total_segments` descending / 关键词检索，
    /// 按文档聚合并以综合得分降序排列
    pub async fn search_keywords(&self, query: &str, limit: usize) -> Result<Vec<SearchHit>> {
        let match_expr = fts_and_query(query);
        if match_expr.is_empty() {
            return Ok(Vec::new());
        }

        let rows = sqlx::query(
            r#"
            SELECT s.sutta_key AS sutta_key,
                   COUNT(*) AS match_count,
                   d.total_segments AS total_segments
            FROM segments_fts
            JOIN segments s ON s.id = segments_fts.rowid
            JOIN suttas d ON d.sutta_key = s.sutta_key
            WHERE segments_fts MATCH ?
            GROUP BY s.sutta_key
            "#,
        )
        .bind(&match_expr)
        .fetch_all(&self.db)
        .await
        .map_err(|e| CorpusError::Query(e.to_string()))?;

        let mut hits: Vec<SearchHit> = rows
            .iter()
            .map(|row| {
                SearchHit::new(
                    row.get("sutta_key"),
                    row.get("match_count"),
                    row.get("total_segments"),
                )
            })
            .collect();

        sort_and_truncate(&mut hits, limit);
        Ok(hits)
    }

    /// Phrase search: keyword candidates first (already truncated), then a
    /// case-insensitive substring filter. A document ranked below the
    /// keyword cutoff never surfaces even if it contains the phrase - the
    /// candidate set is limited before filtering. / 短语检索：先取关键词候选
    /// （已截断），再做大小写不敏感的子串过滤；截断发生在过滤之前。
    pub async fn search_phrase(&self, phrase: &str, limit: usize) -> Result<Vec<SearchHit>> {
        let candidates = self.search_keywords(phrase, limit).await?;
        let phrase_lower = phrase.trim().to_lowercase();
        if phrase_lower.is_empty() {
            return Ok(Vec::new());
        }

        let mut hits = Vec::with_capacity(candidates.len());
        for hit in candidates {
            let rows = sqlx::query("SELECT segment_text FROM segments WHERE sutta_key = ?")
                .bind(&hit.sutta_key)
                .fetch_all(&self.db)
                .await
                .map_err(|e| CorpusError::Query(e.to_string()))?;

            let contains = rows.iter().any(|row| {
                let text: String = row.get("segment_text");
                text.to_lowercase().contains(&phrase_lower)
            });
            if contains {
                hits.push(hit);
            }
        }
        Ok(hits)
    }

    /// Regular-expression search over every segment. An invalid pattern
    /// yields an empty result, not an error. O(total segment rows). / 正则
    /// 检索，全段扫描；非法正则返回空结果而非报错。
    pub async fn search_regexp(&self, pattern: &str, limit: usize) -> Result<Vec<SearchHit>> {
        let re = match regex::Regex::new(pattern) {
            Ok(re) => re,
            Err(e) => {
                tracing::debug!("Invalid regexp pattern `{}`: {}", pattern, e);
                return Ok(Vec::new());
            }
        };

        // 流式读取，放弃任务时在行边界取消
        let mut counts: HashMap<String, i64> = HashMap::new();
        let mut rows = sqlx::query("SELECT sutta_key, segment_text FROM segments").fetch(&self.db);
        while let Some(row) = rows
            .try_next()
            .await
            .map_err(|e| CorpusError::Query(e.to_string()))?
        {
            let text: String = row.get("segment_text");
            if re.is_match(&text) {
                let key: String = row.get("sutta_key");
                *counts.entry(key).or_default() += 1;
            }
        }
        drop(rows);

        if counts.is_empty() {
            return Ok(Vec::new());
        }

        let totals = sqlx::query("SELECT sutta_key, total_segments FROM suttas")
            .fetch_all(&self.db)
            .await
            .map_err(|e| CorpusError::Query(e.to_string()))?;

        let mut hits: Vec<SearchHit> = totals
            .iter()
            .filter_map(|row| {
                let key: String = row.get("sutta_key");
                let match_count = *counts.get(&key)?;
                Some(SearchHit::new(key, match_count, row.get("total_segments")))
            })
            .collect();

        sort_and_truncate(&mut hits, limit);
        Ok(hits)
    }

    /// One-row metadata record, `None` when the artifact carries none
    /// / 单行元数据，文件未携带时返回 `None`
    pub async fn metadata(&self) -> Option<AuthorMeta> {
        let row = sqlx::query("SELECT language, author FROM meta LIMIT 1")
            .fetch_optional(&self.db)
            .await
            .ok()
            .flatten()?;

        Some(AuthorMeta {
            language: row.get("language"),
            author: row.get("author"),
        })
    }
}

/// Quote each whitespace token for FTS5 and join with AND / 按空白切词，
/// 逐个加引号后用 AND 连接
fn fts_and_query(query: &str) -> String {
    query
        .split_whitespace()
        .map(|token| format!("\"{}\"", token.replace('"', "")))
        .collect::<Vec<_>>()
        .join(" AND ")
}

/// Score-descending order, truncated to `limit` / 按得分降序并截断
fn sort_and_truncate(hits: &mut Vec<SearchHit>, limit: usize) {
    hits.sort_by(|a, b| b.score.partial_cmp(&a.score).unwrap_or(std::cmp::Ordering::Equal));
    hits.truncate(limit);
}

#[cfg(test)]
mod tests {
    use super::super::testutil::build_artifact;
    use super::*;

    async fn fixture() -> (tempfile::TempDir, AuthorDb) {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("en-sujato.db");
        build_artifact(
            &path,
            "en",
            "sujato",
            &[
                (
                    "mn1",
                    &[
                        ("1.1", "The root of suffering is craving"),
                        ("1.2", "Craving for becoming and non-becoming"),
                        ("2.1", "What is the root of all this"),
                        ("2.2", "A mendicant reflects on the root"),
                        ("3.1", "Thus it was said"),
                    ],
                ),
                (
                    "mn2",
                    &[
                        ("1.1", "All defilements come from attention"),
                        ("1.2", "Proper attention to the root"),
                        ("2.1", "This concludes the discourse"),
                    ],
                ),
            ],
        )
        .await;
        let db = AuthorDb::open(&path).await.unwrap();
        (dir, db)
    }

    #[tokio::test]
    async fn test_translation_string_order() {
        let (_dir, db) = fixture().await;

        let map = db.translation("en/sujato/mn1").await.unwrap().unwrap();
        assert_eq!(map.len(), 5);
        assert_eq!(
            map.get("1.1").unwrap(),
            &serde_json::Value::String("The root of suffering is craving".to_string())
        );
        // 字符串序而非数字序
        let keys: Vec<&String> = map.keys().collect();
        let mut sorted = keys.clone();
        sorted.sort();
        assert_eq!(keys, sorted);

        assert!(db.translation("en/sujato/mn999").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_search_keywords_ranking() {
        let (_dir, db) = fixture().await;

        let hits = db.search_keywords("root", 10).await.unwrap();
        assert_eq!(hits.len(), 2);
        // mn1: 3/5 命中，得分 3.6；mn2: 1/3 命中，得分 1.33
        assert_eq!(hits[0].sutta_key, "en/sujato/mn1");
        assert_eq!(hits[0].match_count, 3);
        assert_eq!(hits[0].total_segments, 5);
        assert!((hits[0].score - 3.6).abs() < 1e-9);
        assert_eq!(hits[1].sutta_key, "en/sujato/mn2");
        assert!(hits[0].score > hits[1].score);
    }

    #[tokio::test]
    async fn test_search_keywords_limit_law() {
        let (_dir, db) = fixture().await;

        for limit in 0..3 {
            let hits = db.search_keywords("root", limit).await.unwrap();
            assert!(hits.len() <= limit);
        }
    }

    #[tokio::test]
    async fn test_search_keywords_idempotent() {
        let (_dir, db) = fixture().await;

        let first = db.search_keywords("root of suffering", 10).await.unwrap();
        let second = db.search_keywords("root of suffering", 10).await.unwrap();
        let first_keys: Vec<&str> = first.iter().map(|h| h.sutta_key.as_str()).collect();
        let second_keys: Vec<&str> = second.iter().map(|h| h.sutta_key.as_str()).collect();
        assert_eq!(first_keys, second_keys);
        assert_eq!(first_keys, vec!["en/sujato/mn1"]);
    }

    #[tokio::test]
    async fn test_search_phrase_subset_of_keywords() {
        let (_dir, db) = fixture().await;

        let keyword_hits = db.search_keywords("the root", 10).await.unwrap();
        let phrase_hits = db.search_phrase("the root", 10).await.unwrap();
        for hit in &phrase_hits {
            assert!(keyword_hits.iter().any(|k| k.sutta_key == hit.sutta_key));
        }
        // "the root" 子串只出现在 mn1 与 mn2 的段里，大小写不敏感
        assert!(phrase_hits.iter().any(|h| h.sutta_key == "en/sujato/mn1"));
    }

    #[tokio::test]
    async fn test_search_phrase_filters_non_matches() {
        let (_dir, db) = fixture().await;

        // 两个词都出现但不相邻，短语过滤应剔除
        let hits = db.search_phrase("craving root", 10).await.unwrap();
        assert!(hits.is_empty());
    }

    #[tokio::test]
    async fn test_search_regexp() {
        let (_dir, db) = fixture().await;

        let hits = db.search_regexp(r"root of (suffering|all)", 10).await.unwrap();
        assert_eq!(hits.len(), 1);
        assert_eq!(hits[0].sutta_key, "en/sujato/mn1");
        assert_eq!(hits[0].match_count, 2);

        // 非法正则返回空结果
        let empty = db.search_regexp(r"[unclosed", 10).await.unwrap();
        assert!(empty.is_empty());
    }

    #[tokio::test]
    async fn test_metadata() {
        let (_dir, db) = fixture().await;

        let meta = db.metadata().await.unwrap();
        assert_eq!(meta.language, "en");
        assert_eq!(meta.author, "sujato");
    }

    #[tokio::test]
    async fn test_open_missing_file() {
        let dir = tempfile::tempdir().unwrap();
        let missing = dir.path().join("xx-nobody.db");
        match AuthorDb::open(&missing).await {
            Err(CorpusError::ArtifactNotFound { language, author }) => {
                assert_eq!(language, "xx");
                assert_eq!(author, "nobody");
            }
            other => panic!("expected ArtifactNotFound, got {:?}", other.map(|db| db.path().to_path_buf())),
        }
    }
}
