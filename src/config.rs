//! Corpus configuration module / 语料库配置模块
//!
//! Loads configuration from config.json, creates a default file on first
//! run / 从 config.json 加载配置，首次运行时创建默认配置文件。
//!
//! No global singleton: the config is passed explicitly to `SuttaIndex::new`
//! so result limits and paths are fixed at construction time. / 无全局单例，
//! 配置在构造时显式传入。

use anyhow::Result;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Corpus configuration / 语料库配置
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CorpusConfig {
    /// Corpus data configuration / 语料数据配置
    pub corpus: CorpusSection,
    /// Search configuration / 搜索配置
    pub search: SearchSection,
    /// Reference resolver configuration / 引用解析配置
    pub resolver: ResolverSection,
}

/// Corpus data configuration / 语料数据配置
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CorpusSection {
    /// Data directory path / 数据目录路径
    pub data_dir: String,
}

/// Search configuration / 搜索配置
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SearchSection {
    /// Author index directory (relative to data_dir) / 译者索引目录
    pub db_dir: String,
    /// Result limit used when a caller passes no limit / 调用方未指定时的结果上限
    pub default_limit: usize,
}

/// Reference resolver configuration / 引用解析配置
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ResolverSection {
    /// Default language for bare references / 裸引用的默认语言
    pub default_lang: String,
    /// Default author for root-language references / 根语言引用的默认译者
    pub root_author: String,
}

impl Default for CorpusConfig {
    fn default() -> Self {
        Self {
            corpus: CorpusSection::default(),
            search: SearchSection::default(),
            resolver: ResolverSection::default(),
        }
    }
}

impl Default for CorpusSection {
    fn default() -> Self {
        Self { data_dir: "data".to_string() }
    }
}

impl Default for SearchSection {
    fn default() -> Self {
        Self {
            db_dir: "ebt".to_string(),
            default_limit: 50,
        }
    }
}

impl Default for ResolverSection {
    fn default() -> Self {
        Self {
            default_lang: "pli".to_string(),
            root_author: "ms".to_string(),
        }
    }
}

impl CorpusConfig {
    /// Get the full data directory path / 获取完整的数据目录路径
    pub fn data_dir(&self) -> PathBuf {
        PathBuf::from(&self.corpus.data_dir)
    }

    /// Get the author index directory / 获取译者索引目录
    pub fn db_dir(&self) -> PathBuf {
        let data_dir = self.data_dir();
        if self.search.db_dir.is_empty() {
            data_dir
        } else {
            data_dir.join(&self.search.db_dir)
        }
    }

    /// Get the index path for a (language, author) pair, naming convention
    /// `{language}-{author}.db` / 获取指定语言/译者的索引路径
    pub fn author_db_path(&self, language: &str, author: &str) -> PathBuf {
        self.db_dir().join(format!("{}-{}.db", language, author))
    }

    /// Effective result limit: `None` means the configured default; an
    /// explicit limit (including 0) is honored as given / 有效结果上限，
    /// 未指定时取配置默认值，显式值（含0）原样生效
    pub fn effective_limit(&self, limit: Option<usize>) -> usize {
        limit.unwrap_or(self.search.default_limit)
    }
}

/// Get the config file path / 获取配置文件路径
fn get_config_path() -> PathBuf {
    std::env::current_dir()
        .unwrap_or_else(|_| PathBuf::from("."))
        .join("config.json")
}

/// Load configuration from file, or create default if not exists / 加载配置文件，不存在则创建默认配置
pub fn load_config() -> Result<CorpusConfig> {
    load_config_from(&get_config_path())
}

/// Load configuration from a specific path / 从指定路径加载配置
pub fn load_config_from(config_path: &Path) -> Result<CorpusConfig> {
    if config_path.exists() {
        let content = std::fs::read_to_string(config_path)
            .map_err(|e| anyhow::anyhow!("Failed to read config file: {}", e))?;

        let config: CorpusConfig = serde_json::from_str(&content)
            .map_err(|e| anyhow::anyhow!("Failed to parse config file: {}", e))?;

        tracing::info!("Loaded configuration from {:?}", config_path);
        Ok(config)
    } else {
        let config = CorpusConfig::default();
        save_config_to(&config, config_path)?;
        tracing::info!("Created default configuration at {:?}", config_path);
        Ok(config)
    }
}

/// Save configuration to file / 保存配置到文件
pub fn save_config_to(config: &CorpusConfig, config_path: &Path) -> Result<()> {
    let content = serde_json::to_string_pretty(config)
        .map_err(|e| anyhow::anyhow!("Failed to serialize config: {}", e))?;

    std::fs::write(config_path, content)
        .map_err(|e| anyhow::anyhow!("Failed to write config file: {}", e))?;

    Ok(())
}
