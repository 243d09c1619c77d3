//! suttasearch - read-only sutta corpus search and reference resolution
//! / 经文语料只读检索与引用解析
//!
//! Library surface only: no network, no CLI, no write path. The corpus
//! artifacts are produced by an external build step. / 仅提供库接口，无网络、
//! 无命令行、无写路径；语料索引由外部构建产生。

pub mod config;
pub mod error;
pub mod resolver;
pub mod scid;
pub mod search;

pub use config::CorpusConfig;
pub use error::{CorpusError, Result};
pub use resolver::SuttaRef;
pub use scid::SuttaCentralId;
pub use search::{AuthorDb, AuthorMeta, IndexStats, SearchHit, SuttaIndex};
