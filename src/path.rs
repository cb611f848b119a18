//! # 属性路径表达式模块
//!
//! 将 `user.addresses[home].city` 形式的表达式解析为段序列。
//! 每段由属性名加可选的索引/键构成；一个段最多一个方括号组，
//! 第二个方括号组即多维数组形式，在解析期就以形状错误拒绝。
//!
//! 解析结果无状态且与表达式一一对应，可按表达式字符串缓存复用。

use std::num::NonZeroUsize;
use std::sync::{Arc, Mutex};

use log::warn;
use lru::LruCache;

use crate::exception::Exception;

/// 方括号内的索引或键。
///
/// 未加引号的纯数字按序列下标处理，其余文本按映射键处理；
/// 单引号或双引号内的文本总是键（可借此表达数字形状的键）。
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Key {
    /// 序列下标
    Index(usize),
    /// 映射键或索引 bean 属性的键
    Name(String),
}

/// 路径中的一段：属性名与可选的索引/键。
#[derive(Debug, Clone, PartialEq)]
pub struct Segment {
    pub name: String,
    pub key: Option<Key>,
}

/// 解析完成的不可变路径表达式。
#[derive(Debug, Clone, PartialEq)]
pub struct PropertyPath {
    segments: Vec<Segment>,
}

impl PropertyPath {
    /// 解析表达式文本。
    ///
    /// 语法：段之间以 `.` 分隔；段名后可跟一个 `[...]`；
    /// 方括号内支持未加引号的文本/数字或引号包裹的键。
    pub fn parse(expression: &str) -> Result<Self, Exception> {
        if expression.is_empty() {
            return Err(invalid(expression, "expression is empty"));
        }

        let mut segments = Vec::new();
        let mut name = String::new();
        let mut key: Option<Key> = None;
        let mut chars = expression.chars();

        while let Some(c) = chars.next() {
            match c {
                '.' => {
                    push_segment(expression, &mut segments, &mut name, &mut key)?;
                }
                '[' => {
                    if name.is_empty() {
                        return Err(invalid(expression, "segment name missing before '['"));
                    }
                    if key.is_some() {
                        // 第二个方括号组就是多维数组写法
                        return Err(Exception::UnsupportedShape {
                            expression: expression.to_string(),
                            reason: "multi-dimensional indexing is not supported".to_string(),
                        });
                    }
                    let mut key_text = String::new();
                    let mut closed = false;
                    for k in chars.by_ref() {
                        if k == ']' {
                            closed = true;
                            break;
                        }
                        key_text.push(k);
                    }
                    if !closed {
                        return Err(invalid(expression, "unterminated '['"));
                    }
                    key = Some(parse_key(expression, &key_text)?);
                }
                ']' => {
                    return Err(invalid(expression, "unbalanced ']'"));
                }
                other => {
                    if key.is_some() {
                        return Err(invalid(expression, "characters after ']'"));
                    }
                    name.push(other);
                }
            }
        }
        push_segment(expression, &mut segments, &mut name, &mut key)?;

        Ok(Self { segments })
    }

    pub fn segments(&self) -> &[Segment] {
        &self.segments
    }
}

fn invalid(expression: &str, reason: &str) -> Exception {
    Exception::InvalidExpression {
        expression: expression.to_string(),
        reason: reason.to_string(),
    }
}

fn push_segment(
    expression: &str,
    segments: &mut Vec<Segment>,
    name: &mut String,
    key: &mut Option<Key>,
) -> Result<(), Exception> {
    if name.is_empty() {
        return Err(invalid(expression, "empty segment"));
    }
    segments.push(Segment {
        name: std::mem::take(name),
        key: key.take(),
    });
    Ok(())
}

fn parse_key(expression: &str, text: &str) -> Result<Key, Exception> {
    if text.is_empty() {
        return Err(invalid(expression, "empty index"));
    }
    // 引号包裹的文本总是键
    for quote in ['\'', '"'] {
        if text.len() >= 2 && text.starts_with(quote) && text.ends_with(quote) {
            let inner = &text[1..text.len() - 1];
            if inner.is_empty() {
                return Err(invalid(expression, "empty quoted key"));
            }
            return Ok(Key::Name(inner.to_string()));
        }
    }
    if text.chars().all(|c| c.is_ascii_digit()) {
        return text
            .parse::<usize>()
            .map(Key::Index)
            .map_err(|_| invalid(expression, "index out of range"));
    }
    Ok(Key::Name(text.to_string()))
}

/// 解析结果的有界缓存。
///
/// 表达式到段结构的映射是全函数且确定的，两个线程竞争填充同一表达式
/// 会收敛到等价结果，放入顺序无关紧要。
pub struct PathCache {
    cache: Mutex<LruCache<String, Arc<PropertyPath>>>,
}

impl PathCache {
    // 根据容量构造
    pub fn from_capacity(capacity: usize) -> Self {
        if capacity == 0 {
            panic!("调用from_capacity时指定的大小是0。如果需要自动设置大小，请在调用处进行处理，而不是传入0");
        }
        Self {
            cache: Mutex::new(LruCache::new(NonZeroUsize::new(capacity).unwrap())),
        }
    }

    // 查缓存，未命中时解析并放入
    pub fn parse(&self, expression: &str) -> Result<Arc<PropertyPath>, Exception> {
        let mut lock = match self.cache.lock() {
            Ok(lock) => lock,
            Err(poisoned) => {
                warn!("表达式缓存锁被污染，恢复并继续");
                poisoned.into_inner()
            }
        };
        if let Some(found) = lock.get(expression) {
            return Ok(found.clone());
        }
        let parsed = Arc::new(PropertyPath::parse(expression)?);
        lock.put(expression.to_string(), parsed.clone());
        Ok(parsed)
    }

    // 测试
    #[cfg(test)]
    pub fn len(&self) -> usize {
        self.cache.lock().unwrap().len()
    }

    #[cfg(test)]
    pub fn capacity(&self) -> usize {
        self.cache.lock().unwrap().cap().get()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    /// 简单点分路径
    #[test]
    fn test_parse_simple() {
        let path = PropertyPath::parse("user.name").unwrap();
        assert_eq!(path.segments().len(), 2);
        assert_eq!(path.segments()[0].name, "user");
        assert_eq!(path.segments()[0].key, None);
        assert_eq!(path.segments()[1].name, "name");
    }

    /// 数字下标与文本键
    #[test]
    fn test_parse_keys() {
        let path = PropertyPath::parse("user.addresses[home].city").unwrap();
        assert_eq!(path.segments()[1].key, Some(Key::Name("home".to_string())));

        let path = PropertyPath::parse("list[5]").unwrap();
        assert_eq!(path.segments()[0].key, Some(Key::Index(5)));
    }

    /// 引号包裹的键总是名字，可包含点号
    #[test]
    fn test_parse_quoted_keys() {
        let path = PropertyPath::parse("labels['a.b']").unwrap();
        assert_eq!(path.segments()[0].key, Some(Key::Name("a.b".to_string())));

        let path = PropertyPath::parse("labels[\"42\"]").unwrap();
        assert_eq!(path.segments()[0].key, Some(Key::Name("42".to_string())));
    }

    /// 各类非法表达式
    #[test]
    fn test_parse_errors() {
        assert!(PropertyPath::parse("").is_err());
        assert!(PropertyPath::parse("user.").is_err());
        assert!(PropertyPath::parse(".name").is_err());
        assert!(PropertyPath::parse("user..name").is_err());
        assert!(PropertyPath::parse("[3]").is_err());
        assert!(PropertyPath::parse("list[3").is_err());
        assert!(PropertyPath::parse("list]3[").is_err());
        assert!(PropertyPath::parse("list[]").is_err());
        assert!(PropertyPath::parse("list[3]x").is_err());
    }

    /// 多维数组写法在解析期按形状错误拒绝
    #[test]
    fn test_multi_dimensional_rejected() {
        let result = PropertyPath::parse("matrix[1][2]");
        assert!(matches!(result, Err(Exception::UnsupportedShape { .. })));
    }

    #[test]
    fn test_cache_creation() {
        let cache = PathCache::from_capacity(10);
        assert_eq!(cache.capacity(), 10);
        assert_eq!(cache.len(), 0);
    }

    #[test]
    #[should_panic(expected = "调用from_capacity时指定的大小是0")]
    fn test_cache_zero_capacity_panics() {
        PathCache::from_capacity(0);
    }

    /// 命中缓存返回同一份解析结果
    #[test]
    fn test_cache_hit() {
        let cache = PathCache::from_capacity(4);
        let first = cache.parse("user.name").unwrap();
        let second = cache.parse("user.name").unwrap();
        assert!(Arc::ptr_eq(&first, &second));
        assert_eq!(cache.len(), 1);
    }

    /// 超出容量时按 LRU 逐出
    #[test]
    fn test_cache_lru_eviction() {
        let cache = PathCache::from_capacity(2);
        cache.parse("a").unwrap();
        cache.parse("b").unwrap();
        cache.parse("a").unwrap();
        cache.parse("c").unwrap();
        assert_eq!(cache.len(), 2);
    }

    /// 非法表达式不进入缓存
    #[test]
    fn test_cache_rejects_invalid() {
        let cache = PathCache::from_capacity(4);
        assert!(cache.parse("user..name").is_err());
        assert_eq!(cache.len(), 0);
    }
}
