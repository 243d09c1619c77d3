//! SuttaCentral identifier algebra / 经文ID代数
//!
//! A scid is a hierarchical identifier such as `mn1.1:2.3` or `mn1-5`:
//! collection prefix, dot-separated document path, optional `:` segment path,
//! optional `/lang/author` suffix. / scid 是层级化经文标识符：集合前缀 +
//! 点分文档路径 + 可选的 `:` 段路径 + 可选的 `/语言/译者` 后缀。
//!
//! Every id denotes a closed interval `[range_low, range_high]`; a non-range
//! id is the degenerate interval. Ordering rules (including the asymmetric
//! missing-level rule in `cmp_levels`) are inherited from the corpus and must
//! not be re-derived. / 每个ID表示一个闭区间，排序规则继承自既有语料，
//! 不得重新推导。

use once_cell::sync::Lazy;
use regex::Regex;
use std::cmp::Ordering;
use std::collections::HashMap;
use std::fmt;
use std::str::FromStr;

use crate::error::{CorpusError, Result};

/// Format validator / 格式校验正则
static SCID_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^[-a-z]+ ?[0-9]+[-0-9a-z.:/]*$").expect("scid regex")
});

/// Canonical capitalization for known collection prefixes / 已知集合前缀的标准大小写
static NIKAYA_FORMS: Lazy<HashMap<&'static str, &'static str>> = Lazy::new(|| {
    let mut m = HashMap::new();
    for (lower, standard) in [
        ("an", "AN"),
        ("bv", "Bv"),
        ("cnd", "Cnd"),
        ("cp", "Cp"),
        ("dhp", "Dhp"),
        ("dn", "DN"),
        ("iti", "Iti"),
        ("ja", "Ja"),
        ("khp", "Khp"),
        ("kn", "KN"),
        ("kp", "Kp"),
        ("mil", "Mil"),
        ("mn", "MN"),
        ("mnd", "Mnd"),
        ("ne", "Ne"),
        ("pe", "Pe"),
        ("ps", "Ps"),
        ("pv", "Pv"),
        ("sn", "SN"),
        ("snp", "Snp"),
        ("tha-ap", "Tha-ap"),
        ("thag", "Thag"),
        ("thi-ap", "Thi-ap"),
        ("thig", "Thig"),
        ("ud", "Ud"),
        ("vv", "Vv"),
    ] {
        m.insert(lower, standard);
    }
    m
});

/// A parsed, normalized SuttaCentral identifier / 解析并规范化后的经文ID
#[derive(Debug, Clone)]
pub struct SuttaCentralId {
    /// Normalized id string / 规范化的ID字符串
    scid: String,
    /// Prefix before the first digit of the whole string / 整串首个数字前的前缀
    low_prefix: String,
    /// Prefix of the last `/`-basename (used by high-bound compare) / 末段前缀
    high_prefix: String,
    /// Flattened low-bound level values / 展平的下界层级值
    low: Vec<i64>,
    /// Flattened high-bound level values / 展平的上界层级值
    high: Vec<i64>,
    /// Low-bound projection string / 下界投影
    range_low: String,
    /// High-bound projection string / 上界投影
    range_high: String,
}

impl SuttaCentralId {
    /// Parse and normalize an identifier. Hard error on malformed input,
    /// never a silent default. / 解析并规范化，格式错误直接报错，绝不静默取0。
    pub fn new(id: &str) -> Result<Self> {
        let scid = normalize(id);
        if scid.is_empty() {
            return Err(CorpusError::parse(id, "empty identifier"));
        }
        if scid.contains(',') {
            return Err(CorpusError::parse(id, "comma lists are only valid in test/match"));
        }
        if !SCID_RE.is_match(&scid) {
            return Err(CorpusError::parse(id, "does not match scid grammar"));
        }

        let range_low = project_low(&scid);
        let range_high = project_high(&scid);
        let low = level_numbers(&range_low)?;
        let high = level_numbers(&range_high)?;
        let low_prefix = prefix_of(&scid).to_string();
        let high_prefix = prefix_of(basename(&range_high)).to_string();

        Ok(Self { scid, low_prefix, high_prefix, low, high, range_low, range_high })
    }

    /// Normalized id string / 规范化的ID字符串
    pub fn scid(&self) -> &str {
        &self.scid
    }

    /// Collection prefix (non-numeric lead) / 集合前缀
    pub fn prefix(&self) -> &str {
        &self.low_prefix
    }

    /// Trailing `/suffix` (language/author), verbatim / 原样保留的尾部后缀
    pub fn suffix(&self) -> Option<&str> {
        match first_digit(&self.scid) {
            Some(ix) => self.scid[ix..].find('/').map(|s| &self.scid[ix + s + 1..]),
            None => None,
        }
    }

    /// Lower bound of the interval this id denotes / 该ID区间的下界
    pub fn range_low(&self) -> SuttaCentralId {
        Self::bound(self.range_low.clone(), self.low.clone())
    }

    /// Upper bound; ranges with a segment path are pinned with `.9999` / 区间上界
    pub fn range_high(&self) -> SuttaCentralId {
        Self::bound(self.range_high.clone(), self.high.clone())
    }

    /// Bound ids are non-range by construction, no re-validation needed
    /// / 边界ID必然非区间形式，无需重新校验
    fn bound(scid: String, nums: Vec<i64>) -> SuttaCentralId {
        let low_prefix = prefix_of(&scid).to_string();
        let high_prefix = prefix_of(basename(&scid)).to_string();
        SuttaCentralId {
            range_low: scid.clone(),
            range_high: scid.clone(),
            low: nums.clone(),
            high: nums,
            low_prefix,
            high_prefix,
            scid,
        }
    }

    /// Low-bound total order: full-string prefix, then flattened levels
    /// / 下界全序：整串前缀优先，再逐层比较
    pub fn cmp_low(&self, other: &Self) -> Ordering {
        match self.low_prefix.cmp(&other.low_prefix) {
            Ordering::Equal => cmp_levels(&self.low, &other.low),
            other_ord => other_ord,
        }
    }

    /// High-bound order: basename prefix, then flattened levels
    /// / 上界排序：末段前缀优先，再逐层比较
    pub fn cmp_high(&self, other: &Self) -> Ordering {
        match self.high_prefix.cmp(&other.high_prefix) {
            Ordering::Equal => cmp_levels(&self.high, &other.high),
            other_ord => other_ord,
        }
    }

    /// Closed-interval overlap against a (possibly comma-separated) pattern
    /// / 与（可含逗号列表的）模式做闭区间重叠判定
    pub fn matches(&self, pattern: &str) -> bool {
        pattern.split(',').any(|item| match SuttaCentralId::new(item) {
            Ok(pat) => self.overlaps(&pat),
            Err(_) => false,
        })
    }

    /// `[low(self), high(self)]` overlaps `[low(pat), high(pat)]` / 区间重叠
    fn overlaps(&self, pat: &Self) -> bool {
        let self_high = self.range_high();
        let self_low = self.range_low();
        let pat_low = pat.range_low();
        let pat_high = pat.range_high();
        self_high.cmp_high(&pat_low) != Ordering::Less
            && self_low.cmp_low(&pat_high) != Ordering::Greater
    }

    /// Format validator; accepts comma-separated lists / 格式校验，支持逗号列表
    pub fn test(text: &str) -> bool {
        let text = normalize(text);
        if text.is_empty() {
            return false;
        }
        text.split(',').all(|item| SCID_RE.is_match(item.trim()))
    }

    /// `/lang` components in first-occurrence order, de-duplicated; empty
    /// when the text fails `test` / 各项的语言后缀，按首次出现排序并去重
    pub fn languages(text: &str) -> Vec<String> {
        if !Self::test(text) {
            return Vec::new();
        }
        let text = normalize(text);
        let mut langs: Vec<String> = Vec::new();
        for item in text.split(',') {
            let item = item.trim();
            let mut parts = item.split('/');
            let _id = parts.next();
            if let Some(lang) = parts.next() {
                if !lang.is_empty() && !langs.iter().any(|l| l == lang) {
                    langs.push(lang.to_string());
                }
            }
        }
        langs
    }

    /// Map a known prefix to its canonical capitalization; unknown prefixes
    /// pass through unchanged / 已知前缀标准化大小写，未知前缀原样返回
    pub fn standard_form(&self) -> String {
        let prefix = self.low_prefix.trim_end();
        match NIKAYA_FORMS.get(prefix) {
            Some(standard) => format!("{}{}", standard, &self.scid[self.low_prefix.len()..]),
            None => self.scid.clone(),
        }
    }

    /// Drop the last segment-path level (a trailing empty level from a
    /// trailing dot counts); `None` without a segment path / 去掉段路径末级
    pub fn parent(&self) -> Option<SuttaCentralId> {
        let colon = self.scid.find(':')?;
        let doc = &self.scid[..colon];
        let rest = &self.scid[colon + 1..];
        let (seg, tail) = match rest.find('/') {
            Some(slash) => (&rest[..slash], &rest[slash..]),
            None => (rest, ""),
        };
        let mut levels: Vec<&str> = seg.split('.').collect();
        levels.pop();
        let parent = format!("{}:{}{}", doc, levels.join("."), tail);
        SuttaCentralId::new(&parent).ok()
    }

    /// Add per-level increments to the segment path if present, to the
    /// document path otherwise / 有段路径时逐层加到段路径，否则加到文档路径
    pub fn add(&self, increments: &[i64]) -> Result<SuttaCentralId> {
        if self.low_prefix.trim().is_empty() {
            return Err(CorpusError::parse(&self.scid, "cannot determine prefix"));
        }
        let (doc, seg, tail) = split_paths(&self.scid);
        let target = match &seg {
            Some(seg) => seg.clone(),
            // document path without its prefix
            None => doc[self.low_prefix.len()..].to_string(),
        };

        let mut levels: Vec<i64> = Vec::new();
        for part in target.split('.') {
            if part.is_empty() {
                continue;
            }
            levels.push(
                part.parse::<i64>()
                    .map_err(|_| CorpusError::PartNumber(part.to_string()))?,
            );
        }
        for (i, inc) in increments.iter().enumerate() {
            if i < levels.len() {
                levels[i] += inc;
            } else {
                levels.push(*inc);
            }
        }
        let joined: Vec<String> = levels.iter().map(|v| v.to_string()).collect();
        let rebuilt = if seg.is_some() {
            format!("{}:{}{}", doc, joined.join("."), tail)
        } else {
            format!("{}{}{}", self.low_prefix, joined.join("."), tail)
        };
        SuttaCentralId::new(&rebuilt)
    }
}

impl fmt::Display for SuttaCentralId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.scid)
    }
}

impl FromStr for SuttaCentralId {
    type Err = CorpusError;

    fn from_str(s: &str) -> Result<Self> {
        Self::new(s)
    }
}

impl PartialEq for SuttaCentralId {
    fn eq(&self, other: &Self) -> bool {
        self.scid == other.scid
    }
}

impl Eq for SuttaCentralId {}

impl std::hash::Hash for SuttaCentralId {
    fn hash<H: std::hash::Hasher>(&self, state: &mut H) {
        self.scid.hash(state);
    }
}

/// Trim, lowercase, normalize `". "` to `"."` / 规范化输入
fn normalize(id: &str) -> String {
    id.trim().to_lowercase().replace(". ", ".")
}

/// Byte index of the first ascii digit / 首个数字的字节位置
fn first_digit(s: &str) -> Option<usize> {
    s.find(|c: char| c.is_ascii_digit())
}

/// Substring before the first digit, the whole string if none / 首个数字前的子串
fn prefix_of(s: &str) -> &str {
    match first_digit(s) {
        Some(ix) => &s[..ix],
        None => s,
    }
}

/// Last `/`-separated component / 最后一个斜杠分段
fn basename(s: &str) -> &str {
    s.rsplit('/').next().unwrap_or(s)
}

/// Split into (head, numeric path, verbatim tail). The numeric path runs
/// from the first digit to the first `/` after it. / 拆为前缀、数字路径和
/// 原样尾部；数字路径从首个数字起至其后的首个斜杠止。
fn split3(s: &str) -> (&str, &str, &str) {
    let start = match first_digit(s) {
        Some(ix) => ix,
        None => return (s, "", ""),
    };
    let (head, rest) = s.split_at(start);
    match rest.find('/') {
        Some(slash) => (head, &rest[..slash], &rest[slash..]),
        None => (head, rest, ""),
    }
}

/// Split into (document path incl. prefix, segment path, verbatim tail)
/// / 拆为文档路径（含前缀）、段路径和原样尾部
fn split_paths(s: &str) -> (String, Option<String>, String) {
    let (head, num, tail) = split3(s);
    match num.find(':') {
        Some(colon) => (
            format!("{}{}", head, &num[..colon]),
            Some(num[colon + 1..].to_string()),
            tail.to_string(),
        ),
        None => (format!("{}{}", head, num), None, tail.to_string()),
    }
}

/// Apply a per-level rewrite across the numeric path, preserving the `.` and
/// `:` separators / 对数字路径逐层改写，保留分隔符
fn map_levels(num: &str, f: impl Fn(&str) -> String) -> String {
    let mut out = String::with_capacity(num.len());
    let mut level = String::new();
    for c in num.chars() {
        if c == '.' || c == ':' {
            out.push_str(&f(&level));
            level.clear();
            out.push(c);
        } else {
            level.push(c);
        }
    }
    out.push_str(&f(&level));
    out
}

/// Low-bound projection: drop the later half of `--` extended ranges and the
/// right side of each in-level hyphen / 下界投影
fn project_low(scid: &str) -> String {
    let (head, num, tail) = split3(scid);
    let num = match num.split_once("--") {
        Some((early, _)) => early,
        None => num,
    };
    let low = map_levels(num, |level| {
        level.split('-').next().unwrap_or(level).to_string()
    });
    format!("{}{}{}", head, low, tail)
}

/// High-bound projection: take later halves; range forms with a segment path
/// are pinned with the `.9999` sentinel / 上界投影，带段路径的区间以 .9999 封顶
fn project_high(scid: &str) -> String {
    let (head, num, tail) = split3(scid);
    let ranged = num.contains('-');
    let (base, extended) = match num.split_once("--") {
        Some((_, later)) => (later, true),
        None => (num, false),
    };
    if extended && !base.starts_with(|c: char| c.is_ascii_digit()) {
        // later half carries its own prefix, use it as a complete id
        return format!("{}{}", base, tail);
    }
    let mut high = map_levels(base, |level| {
        level.rsplit('-').next().unwrap_or(level).to_string()
    });
    if ranged && high.contains(':') {
        high.push_str(".9999");
    }
    format!("{}{}{}", head, high, tail)
}

/// Parse one numeric level into one or two integers: `1` ⇒ [1], `1a` ⇒
/// [1, rank(a)], `1^z` ⇒ [1, −rank(z)] / 解析单个层级
fn part_number(part: &str) -> Result<Vec<i64>> {
    if let Ok(n) = part.parse::<i64>() {
        return Ok(vec![n]);
    }
    if let Some((num, letter)) = part.split_once('^') {
        let n = num
            .parse::<i64>()
            .map_err(|_| CorpusError::PartNumber(part.to_string()))?;
        let rank = letter_rank(letter).ok_or_else(|| CorpusError::PartNumber(part.to_string()))?;
        return Ok(vec![n, -rank]);
    }
    let letter_at = part.len().saturating_sub(1);
    let (num, letter) = part.split_at(letter_at);
    if let (Ok(n), Some(rank)) = (num.parse::<i64>(), letter_rank(letter)) {
        return Ok(vec![n, rank]);
    }
    Err(CorpusError::PartNumber(part.to_string()))
}

/// Rank of a single lowercase letter, `a` ⇒ 1 / 单个小写字母的序号
fn letter_rank(letter: &str) -> Option<i64> {
    let mut chars = letter.chars();
    match (chars.next(), chars.next()) {
        (Some(c), None) if c.is_ascii_lowercase() => Some(c as i64 - 'a' as i64 + 1),
        _ => None,
    }
}

/// Flatten a bound projection into its ordered level values / 展平层级值
fn level_numbers(scid: &str) -> Result<Vec<i64>> {
    let (_, num, _) = split3(scid);
    let mut out = Vec::new();
    for part in num.split(|c| c == '.' || c == ':') {
        if part.is_empty() {
            continue;
        }
        out.extend(part_number(part)?);
    }
    Ok(out)
}

/// Element-wise level compare with the corpus's asymmetric absence rule:
/// a missing level equals an opposing 0 and loses to any other opposing
/// value. / 逐层比较；缺失层级与对侧的0相等，对侧非0时缺失侧较小。
fn cmp_levels(a: &[i64], b: &[i64]) -> Ordering {
    for i in 0..a.len().max(b.len()) {
        match (a.get(i), b.get(i)) {
            (Some(x), Some(y)) => {
                if x != y {
                    return x.cmp(y);
                }
            }
            (Some(&x), None) => {
                if x != 0 {
                    return Ordering::Greater;
                }
            }
            (None, Some(&y)) => {
                if y != 0 {
                    return Ordering::Less;
                }
            }
            (None, None) => break,
        }
    }
    Ordering::Equal
}

#[cfg(test)]
mod tests {
    use super::*;

    fn scid(s: &str) -> SuttaCentralId {
        SuttaCentralId::new(s).unwrap()
    }

    #[test]
    fn test_parse_normalizes() {
        assert_eq!(scid(" MN1.1:2.3 ").scid(), "mn1.1:2.3");
        assert_eq!(scid("mn1. 1").scid(), "mn1.1");
        assert_eq!(scid("mn1-5/en/sujato").suffix(), Some("en/sujato"));
        assert_eq!(scid("mn1").suffix(), None);
        assert_eq!(scid("tha-ap3").prefix(), "tha-ap");
    }

    #[test]
    fn test_parse_rejects_malformed() {
        assert!(SuttaCentralId::new("").is_err());
        assert!(SuttaCentralId::new("123").is_err());
        assert!(SuttaCentralId::new("mn").is_err());
        assert!(SuttaCentralId::new("mn1,mn2").is_err());
        assert!(SuttaCentralId::new("MN_1").is_err());
    }

    #[test]
    fn test_part_number() {
        assert_eq!(part_number("12").unwrap(), vec![12]);
        assert_eq!(part_number("1a").unwrap(), vec![1, 1]);
        assert_eq!(part_number("2c").unwrap(), vec![2, 3]);
        assert_eq!(part_number("1^z").unwrap(), vec![1, -26]);
        assert!(part_number("").is_err());
        assert!(part_number("^^").is_err());
        assert!(part_number("ab").is_err());
    }

    #[test]
    fn test_range_bounds() {
        assert_eq!(scid("mn1-5").range_low().scid(), "mn1");
        assert_eq!(scid("mn1-5").range_high().scid(), "mn5");
        assert_eq!(scid("mn1-5:1").range_high().scid(), "mn5:1.9999");
        assert_eq!(scid("mn1-5:1").range_low().scid(), "mn1:1");
        assert_eq!(scid("mn1").range_low().scid(), "mn1");
        assert_eq!(scid("mn1").range_high().scid(), "mn1");
        // 扩展区间
        assert_eq!(scid("sn1.1--1.10").range_low().scid(), "sn1.1");
        assert_eq!(scid("sn1.1--1.10").range_high().scid(), "sn1.10");
    }

    #[test]
    fn test_compare_reflexive() {
        for s in ["mn1", "mn1.1:2.3", "thig1.1", "mn1-5", "tha-ap3"] {
            let id = scid(s);
            assert_eq!(id.cmp_low(&id), Ordering::Equal, "{}", s);
            assert_eq!(id.cmp_high(&id), Ordering::Equal, "{}", s);
        }
    }

    #[test]
    fn test_compare_ordering() {
        assert_eq!(scid("mn1").cmp_low(&scid("mn2")), Ordering::Less);
        assert_eq!(scid("mn2").cmp_low(&scid("mn1")), Ordering::Greater);
        assert_eq!(scid("mn1.1").cmp_low(&scid("mn1.2")), Ordering::Less);
        assert_eq!(scid("an1.1").cmp_low(&scid("mn1.1")), Ordering::Less);
    }

    #[test]
    fn test_compare_absence_rule() {
        // 缺失层级与0相等
        assert_eq!(scid("mn1").cmp_low(&scid("mn1.0")), Ordering::Equal);
        assert_eq!(scid("mn1.0").cmp_low(&scid("mn1")), Ordering::Equal);
        // 对侧非0时缺失侧较小
        assert_eq!(scid("mn1").cmp_low(&scid("mn1.1")), Ordering::Less);
        assert_eq!(scid("mn1.1").cmp_low(&scid("mn1")), Ordering::Greater);
        // 0后仍继续比较
        assert_eq!(scid("mn1.0.2").cmp_low(&scid("mn1")), Ordering::Greater);
    }

    #[test]
    fn test_letter_suffix_ordering() {
        assert_eq!(scid("sn1.1a").cmp_low(&scid("sn1.1b")), Ordering::Less);
        // 插入符字母排在普通字母之前
        assert_eq!(scid("sn1.1^z").cmp_low(&scid("sn1.1a")), Ordering::Less);
    }

    #[test]
    fn test_matches() {
        assert!(scid("mn1.3").matches("mn1.1-5"));
        assert!(!scid("mn1.6").matches("mn1.1-5"));
        assert!(scid("mn1").matches("mn1"));
        assert!(scid("mn5").matches("mn3-10"));
        // 逗号列表按或处理
        assert!(scid("mn1.6").matches("mn1.1-5, mn1.6"));
        assert!(!scid("dn1").matches("mn1, sn1.1"));
    }

    #[test]
    fn test_test_validator() {
        assert!(SuttaCentralId::test("mn1"));
        assert!(SuttaCentralId::test("MN1.1:2.3"));
        assert!(SuttaCentralId::test("mn1-5, sn1.1"));
        assert!(SuttaCentralId::test("mn1/en/sujato"));
        assert!(SuttaCentralId::test("tha-ap3"));
        assert!(!SuttaCentralId::test(""));
        assert!(!SuttaCentralId::test("1mn"));
        assert!(!SuttaCentralId::test("hello world"));
    }

    #[test]
    fn test_languages() {
        assert_eq!(
            SuttaCentralId::languages("mn1/en/sujato, sn1.1/de, mn2/en"),
            vec!["en", "de"]
        );
        assert_eq!(SuttaCentralId::languages("mn1"), Vec::<String>::new());
        assert_eq!(SuttaCentralId::languages("not an id"), Vec::<String>::new());
    }

    #[test]
    fn test_standard_form() {
        assert_eq!(scid("mn1.1").standard_form(), "MN1.1");
        assert_eq!(scid("thig1.1").standard_form(), "Thig1.1");
        assert_eq!(scid("tha-ap3").standard_form(), "Tha-ap3");
        // 未知前缀原样返回
        assert_eq!(scid("xyz1.1").standard_form(), "xyz1.1");
    }

    #[test]
    fn test_parent() {
        assert_eq!(scid("mn1:2.3").parent().unwrap().scid(), "mn1:2");
        assert_eq!(scid("mn1.1:2.3.4").parent().unwrap().scid(), "mn1.1:2.3");
        assert!(scid("mn1.1").parent().is_none());
        // 尾部点号产生的空层级同样被去掉
        assert_eq!(scid("mn1:2.3.").parent().unwrap().scid(), "mn1:2.3");
    }

    #[test]
    fn test_add() {
        assert_eq!(scid("mn1:2.3").add(&[0, 1]).unwrap().scid(), "mn1:2.4");
        assert_eq!(scid("mn1:2.3").add(&[1]).unwrap().scid(), "mn1:3.3");
        assert_eq!(scid("mn1").add(&[1]).unwrap().scid(), "mn2");
        assert_eq!(scid("mn1.1").add(&[0, 2]).unwrap().scid(), "mn1.3");
    }

    #[test]
    fn test_sort_by_low_bound() {
        let mut ids = vec![scid("mn3-10"), scid("mn1"), scid("an1.1"), scid("mn2")];
        ids.sort_by(|a, b| a.cmp_low(b));
        let sorted: Vec<&str> = ids.iter().map(|i| i.scid()).collect();
        assert_eq!(sorted, vec!["an1.1", "mn1", "mn2", "mn3-10"]);
    }
}
