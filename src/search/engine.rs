//! Corpus index engine / 语料索引引擎
//!
//! Owns one lazily-opened read-only handle per (language, author) pair and
//! exposes the search/lookup surface over them. Opens are linearized through
//! a double-checked `tokio::sync::RwLock` so concurrent callers for one key
//! observe a single physical open; queries run concurrently across keys and
//! within a key. / 每个(语言,译者)懒加载一个只读句柄，打开经双重检查锁串行化，
//! 查询可跨键并发。
//!
//! Search methods deliberately collapse internal trouble (missing artifact,
//! query failure) into an empty result list; only `get_translation` and
//! `metadata` distinguish absence via `None`. / 检索方法把内部故障折叠为空
//! 结果，仅查经文与元数据区分 `None`。

use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::RwLock;

use crate::config::CorpusConfig;
use crate::error::{CorpusError, Result};

use super::schema::{AuthorMeta, IndexStats, SearchHit};
use super::store::AuthorDb;

/// Cached state of one (language, author) key / 单键的缓存状态
enum HandleState {
    Open(Arc<AuthorDb>),
    /// Open failed once; subsequent queries fail fast, no retry / 打开失败后
    /// 不再重试
    Failed(String),
}

/// Open entries only; failed entries stay cached but are not handles
/// / 仅统计已打开句柄，失败缓存不计入
fn open_count(handles: &HashMap<String, HandleState>) -> usize {
    handles
        .values()
        .filter(|s| matches!(s, HandleState::Open(_)))
        .count()
}

/// Read-only corpus index over per-author artifacts / 面向多译者索引的只读引擎
pub struct SuttaIndex {
    config: CorpusConfig,
    handles: RwLock<HashMap<String, HandleState>>,
    stats: parking_lot::Mutex<IndexStats>,
}

impl SuttaIndex {
    /// Explicit construction, no global singleton / 显式构造，无全局单例
    pub fn new(config: CorpusConfig) -> Self {
        Self {
            config,
            handles: RwLock::new(HashMap::new()),
            stats: parking_lot::Mutex::new(IndexStats::default()),
        }
    }

    pub fn config(&self) -> &CorpusConfig {
        &self.config
    }

    /// Handle cache statistics / 句柄缓存统计
    pub fn stats(&self) -> IndexStats {
        self.stats.lock().clone()
    }

    fn cache_key(language: &str, author: &str) -> String {
        format!("{}-{}", language, author)
    }

    /// Get or open the handle for a (language, author) pair. Idempotent per
    /// key: repeat and concurrent calls observe the same handle. / 获取或打开
    /// 指定键的句柄，重复与并发调用得到同一句柄。
    pub async fn open(&self, language: &str, author: &str) -> Result<Arc<AuthorDb>> {
        let key = Self::cache_key(language, author);

        // 先检查是否已存在
        {
            let guard = self.handles.read().await;
            match guard.get(&key) {
                Some(HandleState::Open(db)) => {
                    tracing::debug!("Author index cache hit: {}", key);
                    return Ok(db.clone());
                }
                Some(HandleState::Failed(detail)) => {
                    return Err(CorpusError::Open {
                        path: self.config.author_db_path(language, author),
                        detail: detail.clone(),
                    });
                }
                None => {}
            }
        }

        // 不存在则打开
        let mut guard = self.handles.write().await;
        // 双重检查
        match guard.get(&key) {
            Some(HandleState::Open(db)) => return Ok(db.clone()),
            Some(HandleState::Failed(detail)) => {
                return Err(CorpusError::Open {
                    path: self.config.author_db_path(language, author),
                    detail: detail.clone(),
                });
            }
            None => {}
        }

        let path = self.config.author_db_path(language, author);
        match AuthorDb::open(&path).await {
            Ok(db) => {
                let db = Arc::new(db);
                guard.insert(key, HandleState::Open(db.clone()));
                let mut stats = self.stats.lock();
                stats.open_handles = open_count(&guard);
                stats.last_opened = Some(chrono::Utc::now().timestamp());
                Ok(db)
            }
            // 缺失是常态而非故障，不计入失败缓存
            Err(e @ CorpusError::ArtifactNotFound { .. }) => Err(e),
            Err(e) => {
                tracing::warn!("Author index open failed for {}: {}", key, e);
                guard.insert(key, HandleState::Failed(e.to_string()));
                Err(e)
            }
        }
    }

    /// Exact per-document lookup; `None` covers both "no such document" and
    /// "no such index" / 精确查经文；无此文档与无此索引都返回 `None`
    pub async fn get_translation(
        &self,
        language: &str,
        author: &str,
        sutta_uid: &str,
    ) -> Option<serde_json::Map<String, serde_json::Value>> {
        let db = match self.open(language, author).await {
            Ok(db) => db,
            Err(e) => {
                tracing::debug!("get_translation: no index for {}/{}: {}", language, author, e);
                return None;
            }
        };
        let key = format!("{}/{}/{}", language, author, sutta_uid);
        match db.translation(&key).await {
            Ok(map) => map,
            Err(e) => {
                tracing::warn!("get_translation degraded to None: {}", e);
                None
            }
        }
    }

    /// Combined-key convenience form, `"{lang}/{author}/{sutta_uid}"`
    /// / 组合键形式的便捷查询
    pub async fn translation_by_key(
        &self,
        key: &str,
    ) -> Option<serde_json::Map<String, serde_json::Value>> {
        let mut parts = key.splitn(3, '/');
        let language = parts.next()?;
        let author = parts.next()?;
        let sutta_uid = parts.next()?;
        self.get_translation(language, author, sutta_uid).await
    }

    /// Keyword search returning ranked document keys. `None` limit means the
    /// configured default; `Some(0)` is honored and yields nothing. / 关键词
    /// 检索，返回排序后的文档键；未指定上限时取配置默认值，显式0返回空。
    pub async fn search_keywords(
        &self,
        language: &str,
        author: &str,
        query: &str,
        limit: Option<usize>,
    ) -> Vec<String> {
        self.search_keywords_with_scores(language, author, query, limit)
            .await
            .into_iter()
            .map(|hit| hit.sutta_key)
            .collect()
    }

    /// Keyword search with full scoring detail / 关键词检索，带完整评分明细
    pub async fn search_keywords_with_scores(
        &self,
        language: &str,
        author: &str,
        query: &str,
        limit: Option<usize>,
    ) -> Vec<SearchHit> {
        let limit = self.config.effective_limit(limit);
        let result = match self.open(language, author).await {
            Ok(db) => db.search_keywords(query, limit).await,
            Err(e) => Err(e),
        };
        match result {
            Ok(hits) => hits,
            Err(e) => {
                tracing::warn!("search_keywords degraded to empty: {}", e);
                Vec::new()
            }
        }
    }

    /// Phrase search: keyword candidates filtered by substring / 短语检索
    pub async fn search_phrase(
        &self,
        language: &str,
        author: &str,
        phrase: &str,
        limit: Option<usize>,
    ) -> Vec<String> {
        let limit = self.config.effective_limit(limit);
        let result = match self.open(language, author).await {
            Ok(db) => db.search_phrase(phrase, limit).await,
            Err(e) => Err(e),
        };
        match result {
            Ok(hits) => hits.into_iter().map(|hit| hit.sutta_key).collect(),
            Err(e) => {
                tracing::warn!("search_phrase degraded to empty: {}", e);
                Vec::new()
            }
        }
    }

    /// Regexp search over a full segment scan / 正则检索（全段扫描）
    pub async fn search_regexp(
        &self,
        language: &str,
        author: &str,
        pattern: &str,
        limit: Option<usize>,
    ) -> Vec<String> {
        let limit = self.config.effective_limit(limit);
        let result = match self.open(language, author).await {
            Ok(db) => db.search_regexp(pattern, limit).await,
            Err(e) => Err(e),
        };
        match result {
            Ok(hits) => hits.into_iter().map(|hit| hit.sutta_key).collect(),
            Err(e) => {
                tracing::warn!("search_regexp degraded to empty: {}", e);
                Vec::new()
            }
        }
    }

    /// Discover installed artifacts by the `{lang}-{author}.db` naming
    /// convention / 按命名约定扫描已安装的索引
    pub fn available_authors(&self) -> Vec<(String, String)> {
        let dir = self.config.db_dir();
        let mut pairs = Vec::new();
        if let Ok(entries) = std::fs::read_dir(&dir) {
            for entry in entries.flatten() {
                let path = entry.path();
                if let Some(name) = path.file_name().and_then(|n| n.to_str()) {
                    if let Some(stem) = name.strip_suffix(".db") {
                        if let Some((language, author)) = stem.split_once('-') {
                            if !language.is_empty() && !author.is_empty() {
                                pairs.push((language.to_string(), author.to_string()));
                            }
                        }
                    }
                }
            }
        }
        pairs.sort();
        pairs
    }

    /// Artifact metadata, `None` when absent / 索引元数据，缺失时返回 `None`
    pub async fn metadata(&self, language: &str, author: &str) -> Option<AuthorMeta> {
        let db = self.open(language, author).await.ok()?;
        db.metadata().await
    }

    /// Close every cached handle. Call once at teardown; in-flight queries
    /// holding an `Arc` finish safely first. / 关闭所有缓存句柄，仅在停机时
    /// 调用一次；持有 `Arc` 的在途查询先安全完成。
    pub async fn close_all(&self) {
        let mut guard = self.handles.write().await;
        for (key, state) in guard.drain() {
            if let HandleState::Open(db) = state {
                db.close().await;
                tracing::info!("Author index handle closed: {}", key);
            }
        }
        let mut stats = self.stats.lock();
        stats.open_handles = 0;
    }
}
