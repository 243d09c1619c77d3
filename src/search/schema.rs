//! Corpus index schema definition / 语料索引的 Schema 定义
//!
//! Record shapes of the pre-built artifact: one `suttas` row per document,
//! one `segments` row per addressable sub-unit, an FTS index kept in sync by
//! the build step. / 预构建索引的记录结构。

use serde::{Deserialize, Serialize};

/// Document record - one per corpus document / 文档记录，每篇经文一条
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SuttaDocument {
    /// Document key `"{lang}/{author}/{sutta_uid}"` / 文档键
    pub sutta_key: String,
    /// Total addressable segments / 可寻址段总数
    pub total_segments: i64,
}

/// Segment record - smallest addressable text unit / 段记录，最小可寻址文本单元
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SegmentRow {
    /// Owning document key / 所属文档键
    pub sutta_key: String,
    /// Segment id, itself a scid segment path / 段ID
    pub segment_id: String,
    /// Segment text / 段文本
    pub segment_text: String,
}

/// One ranked search hit / 单条检索命中
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SearchHit {
    /// Document key / 文档键
    pub sutta_key: String,
    /// Matching segment rows in this document / 命中的段数
    pub match_count: i64,
    /// Total segments in this document / 文档段总数
    pub total_segments: i64,
    /// match_count / total_segments / 相关度
    pub relevance_percent: f64,
    /// match_count + relevance_percent, the ranking key / 综合得分，排序依据
    pub score: f64,
}

impl SearchHit {
    /// Build a hit from raw counts, deriving relevance and score
    /// / 由原始计数构造命中并计算相关度与得分
    pub fn new(sutta_key: String, match_count: i64, total_segments: i64) -> Self {
        let relevance_percent = if total_segments > 0 {
            match_count as f64 / total_segments as f64
        } else {
            0.0
        };
        Self {
            sutta_key,
            match_count,
            total_segments,
            relevance_percent,
            score: match_count as f64 + relevance_percent,
        }
    }
}

/// One-row artifact metadata / 索引元数据（单行）
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AuthorMeta {
    pub language: String,
    pub author: String,
}

/// Handle cache statistics / 句柄缓存统计
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct IndexStats {
    /// Open (language, author) handles / 已打开的句柄数
    pub open_handles: usize,
    /// Unix timestamp of the most recent open / 最近一次打开的时间戳
    pub last_opened: Option<i64>,
}
