//! Error taxonomy / 错误分类
//!
//! Parse failures are always surfaced to the caller; "no data" outcomes are
//! `None`/empty at the API layer, not errors. / 解析失败总是上报给调用方，
//! "无数据"在 API 层用 `None`/空结果表示，不算错误。

use std::path::PathBuf;

#[derive(Debug, thiserror::Error)]
pub enum CorpusError {
    /// Malformed sutta id or reference string / 格式错误的经文ID或引用串
    #[error("invalid sutta id `{id}`: {reason}")]
    Parse { id: String, reason: String },

    /// A numeric level that parses to neither `n`, `na` nor `n^a` / 非法数字层级
    #[error("part number `{0}` is not numeric")]
    PartNumber(String),

    /// No pre-built index for this (language, author) pair / 该语言/译者无索引
    #[error("no index found for {language}/{author}")]
    ArtifactNotFound { language: String, author: String },

    /// The artifact file exists but cannot be opened / 索引文件存在但无法打开
    #[error("failed to open index {path:?}: {detail}")]
    Open { path: PathBuf, detail: String },

    /// Adapter-level query failure (malformed SQL, closed pool) / 查询失败
    #[error("query failed: {0}")]
    Query(String),

    /// Reference did not resolve against the canonical id table / 未找到经文
    #[error("sutta not found: {0}")]
    SuttaNotFound(String),

    /// Input is neither a reference string nor a recognized object / 非法输入
    #[error("invalid reference input: {0}")]
    InvalidInput(String),
}

impl CorpusError {
    pub(crate) fn parse(id: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::Parse { id: id.into(), reason: reason.into() }
    }
}

pub type Result<T> = std::result::Result<T, CorpusError>;
