//! Reference resolver / 引用解析器
//!
//! Turns loosely-formatted reference strings and legacy JSON objects into a
//! structured `SuttaRef`, validating existence against a sorted canonical id
//! table by binary search over ranges: an abbreviated `mn5` resolves against
//! a canonical ranged entry `mn3-10`. / 把松散格式的引用串或旧式 JSON 对象
//! 解析为结构化引用，并通过区间二分在规范ID表中定位；缩写形式也能命中区间条目。

use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use std::collections::HashMap;
use std::fmt;

use crate::config::ResolverSection;
use crate::error::{CorpusError, Result};
use crate::scid::SuttaCentralId;

/// Trailing segment number, e.g. `:1.1` in `mn1/en/sujato:1.1` / 尾部段号
static SEGNUM_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r":([0-9][-0-9.]*)$").expect("segnum regex"));

/// A resolved reference: document id plus language/author/segment context
/// / 解析后的引用：文档ID加语言、译者、段号上下文
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SuttaRef {
    /// Document id as given (may be abbreviated or ranged) / 给定的文档ID
    pub sutta_uid: String,
    /// Language code / 语言代码
    pub lang: String,
    /// Author/translator, optional / 译者，可选
    pub author: Option<String>,
    /// Segment number within the document, optional / 文档内段号，可选
    pub segnum: Option<String>,
    /// Canonical id the document resolved to / 解析命中的规范ID
    pub canonical: String,
}

impl SuttaRef {
    /// Direct construction; rejects ids that need the parsing entry point
    /// / 直接构造；含斜杠的ID应走解析入口
    pub fn new(
        sutta_uid: impl Into<String>,
        lang: impl Into<String>,
        author: Option<String>,
        segnum: Option<String>,
    ) -> Result<Self> {
        let sutta_uid = sutta_uid.into();
        if sutta_uid.is_empty() {
            return Err(CorpusError::InvalidInput("empty sutta_uid".to_string()));
        }
        if sutta_uid.contains('/') {
            return Err(CorpusError::InvalidInput(format!(
                "sutta_uid `{}` contains `/`; use SuttaRef::parse",
                sutta_uid
            )));
        }
        let canonical = sutta_uid.clone();
        Ok(Self { sutta_uid, lang: lang.into(), author, segnum, canonical })
    }

    /// Parse `documentId[:segnum]/language[/author]` (every suffix component
    /// optional, segment number also accepted trailing). Language and author
    /// defaults come from the resolver config section. / 解析引用串，各后缀
    /// 部分均可省略，段号也接受放在末尾；语言与译者缺省值取自配置。
    pub fn parse(
        input: &str,
        defaults: &ResolverSection,
        known_ids: Option<&[SuttaCentralId]>,
    ) -> Result<Self> {
        let input = input.trim().to_lowercase();
        if input.is_empty() {
            return Err(CorpusError::InvalidInput("empty reference".to_string()));
        }

        // 先剥离尾部段号
        let (body, mut segnum) = match SEGNUM_RE.captures(&input) {
            Some(caps) => {
                let m = caps.get(0).expect("full match");
                (&input[..m.start()], Some(caps[1].to_string()))
            }
            None => (input.as_str(), None),
        };

        let mut parts = body.split('/');
        let mut uid = parts.next().unwrap_or("").to_string();
        let lang = parts
            .next()
            .filter(|s| !s.is_empty())
            .unwrap_or(&defaults.default_lang)
            .to_string();
        let author = parts.next().filter(|s| !s.is_empty()).map(|s| s.to_string());

        // 尾部无段号时，文档ID里的冒号部分充当段号
        if segnum.is_none() {
            if let Some(colon) = uid.find(':') {
                let seg = uid[colon + 1..].to_string();
                if !seg.is_empty() {
                    uid.truncate(colon);
                    segnum = Some(seg);
                }
            }
        }

        Self::finish(uid, lang, author, segnum, defaults, known_ids)
    }

    /// Parse a JSON input: either a reference string or an object with the
    /// legacy field aliases `{sutta_uid|suid, lang, author|translator|
    /// author_uid, segnum, scid}` (later aliases take precedence). / 解析
    /// JSON 输入：引用串或带旧字段别名的对象，靠后的别名优先。
    pub fn from_value(
        value: &serde_json::Value,
        defaults: &ResolverSection,
        known_ids: Option<&[SuttaCentralId]>,
    ) -> Result<Self> {
        match value {
            serde_json::Value::String(s) => Self::parse(s, defaults, known_ids),
            serde_json::Value::Object(obj) => {
                let field = |name: &str| -> Option<String> {
                    obj.get(name)
                        .and_then(|v| v.as_str())
                        .filter(|s| !s.is_empty())
                        .map(|s| s.trim().to_lowercase())
                };

                let mut uid = field("sutta_uid");
                if let Some(suid) = field("suid") {
                    uid = Some(suid);
                }
                let mut segnum = field("segnum");
                // scid 最靠后，覆盖文档ID与段号
                if let Some(scid) = field("scid") {
                    match scid.split_once(':') {
                        Some((doc, seg)) => {
                            uid = Some(doc.to_string());
                            if !seg.is_empty() {
                                segnum = Some(seg.to_string());
                            }
                        }
                        None => uid = Some(scid),
                    }
                }
                let uid = uid.ok_or_else(|| {
                    CorpusError::InvalidInput("object carries no sutta_uid/suid/scid".to_string())
                })?;

                let lang = field("lang").unwrap_or_else(|| defaults.default_lang.clone());
                let mut author = field("author");
                if let Some(translator) = field("translator") {
                    author = Some(translator);
                }
                if let Some(author_uid) = field("author_uid") {
                    author = Some(author_uid);
                }

                Self::finish(uid, lang, author, segnum, defaults, known_ids)
            }
            _ => Err(CorpusError::InvalidInput(
                "reference must be a string or an object".to_string(),
            )),
        }
    }

    /// Shared tail of both parse paths: defaults + existence validation
    /// / 两条解析路径共用的收尾：默认值与存在性校验
    fn finish(
        uid: String,
        lang: String,
        author: Option<String>,
        segnum: Option<String>,
        defaults: &ResolverSection,
        known_ids: Option<&[SuttaCentralId]>,
    ) -> Result<Self> {
        if uid.is_empty() {
            return Err(CorpusError::InvalidInput("empty sutta_uid".to_string()));
        }

        // 根语言引用缺省译者取自配置
        let author = match author {
            Some(a) => Some(a),
            None if lang == defaults.default_lang => Some(defaults.root_author.clone()),
            None => None,
        };

        let id = SuttaCentralId::new(&uid)?;
        let canonical = match known_ids {
            Some(ids) => bisect(&id, ids)
                .ok_or_else(|| CorpusError::SuttaNotFound(uid.clone()))?
                .scid()
                .to_string(),
            // 无规范表时仅做格式校验
            None => id.scid().to_string(),
        };

        Ok(Self { sutta_uid: id.scid().to_string(), lang, author, segnum, canonical })
    }

    /// Membership check against a pre-loaded corpus manifest mapping
    /// `sutta_uid -> ["root|translation/lang/author", ...]` / 对预加载清单的
    /// 成员检查
    pub fn exists(&self, manifest: &HashMap<String, Vec<String>>) -> bool {
        let entries = match manifest
            .get(&self.sutta_uid)
            .or_else(|| manifest.get(&self.canonical))
        {
            Some(entries) => entries,
            None => return false,
        };
        entries.iter().any(|entry| {
            let mut parts = entry.split('/');
            let _kind = parts.next();
            let lang = parts.next().unwrap_or("");
            let author = parts.next();
            lang == self.lang
                && match &self.author {
                    Some(a) => author == Some(a.as_str()),
                    None => true,
                }
        })
    }
}

impl fmt::Display for SuttaRef {
    /// `documentId[:segmentNumber]/language[/author]` / 规范化渲染
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.sutta_uid)?;
        if let Some(segnum) = &self.segnum {
            write!(f, ":{}", segnum)?;
        }
        write!(f, "/{}", self.lang)?;
        if let Some(author) = &self.author {
            write!(f, "/{}", author)?;
        }
        Ok(())
    }
}

impl PartialEq for SuttaRef {
    /// Equality ignores the canonical match / 相等性不考虑规范命中
    fn eq(&self, other: &Self) -> bool {
        self.sutta_uid == other.sutta_uid
            && self.lang == other.lang
            && self.author == other.author
            && self.segnum == other.segnum
    }
}

impl Eq for SuttaRef {}

impl std::hash::Hash for SuttaRef {
    fn hash<H: std::hash::Hasher>(&self, state: &mut H) {
        self.sutta_uid.hash(state);
        self.lang.hash(state);
        self.author.hash(state);
        self.segnum.hash(state);
    }
}

/// Binary search over ranges: the table is sorted by low-bound order and its
/// entries do not overlap; at each midpoint test closed-interval overlap
/// rather than string equality. / 区间二分：表按下界排序且条目互不重叠，
/// 中点处做闭区间重叠判定而非字符串相等。
fn bisect<'a>(query: &SuttaCentralId, ids: &'a [SuttaCentralId]) -> Option<&'a SuttaCentralId> {
    let query_low = query.range_low();
    let query_high = query.range_high();
    let mut lo = 0usize;
    let mut hi = ids.len();
    while lo < hi {
        let mid = (lo + hi) / 2;
        let cand = &ids[mid];
        if query_high.cmp_high(&cand.range_low()) == Ordering::Less {
            hi = mid;
        } else if query_low.cmp_low(&cand.range_high()) == Ordering::Greater {
            lo = mid + 1;
        } else {
            return Some(cand);
        }
    }
    None
}
