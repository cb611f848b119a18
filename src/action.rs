//! # 动作描述符模块
//!
//! 定义 URI 到处理器映射所需的数据结构：
//! - `ActionDescriptor`：一条可映射动作的注册记录，携带规范 URI、
//!   尾部段占位符模式（编译为锚定正则）与覆盖优先级。
//! - `ActionRegistry`：规范 URI 到描述符的查找表，带覆盖策略。
//! - `ResolvedAction`：一次 URI 解析的结果，随请求创建、用毕即弃。
//! - `ActionFactory`：处理器实例化的外部接缝（依赖注入容器在此接入）。

use std::collections::HashMap;
use std::sync::Arc;

use log::warn;
use regex::Regex;

use crate::bindable::Bindable;
use crate::exception::Exception;

/// 一条已注册动作的不可变描述。
///
/// 占位符模式描述该动作接受哪些额外的尾部 URI 段：
/// `{id}` 匹配任意单段，`*` 作为末项匹配任意剩余段，
/// 字面量段按原文匹配；占位符自左向右可以缺省。
/// 模式在构造时编译为针对完整原始 URI 的锚定正则。
#[derive(Debug, Clone)]
pub struct ActionDescriptor {
    uri: String,
    pattern: Option<String>,
    acceptance: Regex,
    parameter_names: Vec<String>,
    priority: i32,
}

impl ActionDescriptor {
    /// 注册一个不接受额外尾部段的动作
    pub fn new(uri: &str) -> Self {
        Self::build(uri, None)
    }

    /// 注册一个带尾部段模式的动作
    pub fn with_pattern(uri: &str, pattern: &str) -> Self {
        Self::build(uri, Some(pattern))
    }

    fn build(uri: &str, pattern: Option<&str>) -> Self {
        let mut tail = String::new();
        let mut parameter_names = Vec::new();
        if let Some(pattern) = pattern {
            let parts: Vec<&str> = pattern.split('/').filter(|p| !p.is_empty()).collect();
            // 自右向左构造，使占位符逐层可缺省
            for part in parts.iter().rev() {
                if *part == "*" {
                    tail = format!("(/.+)?{}", tail);
                } else if part.starts_with('{') && part.ends_with('}') && part.len() > 2 {
                    parameter_names.insert(0, part[1..part.len() - 1].to_string());
                    tail = format!("(/[^/]+{})?", tail);
                } else {
                    tail = format!("/{}{}", regex::escape(part), tail);
                }
            }
        }
        let source = format!("^{}{}$", regex::escape(uri), tail);
        let acceptance = match Regex::new(&source) {
            Ok(regex) => regex,
            // 注册发生在应用启动期，非法模式属于装配缺陷
            Err(e) => panic!("URI[{}]的模式无法编译为正则：{}", uri, e),
        };
        Self {
            uri: uri.to_string(),
            pattern: pattern.map(str::to_string),
            acceptance,
            parameter_names,
            priority: 0,
        }
    }

    /// 设置覆盖优先级（默认 0，数值大者生效）
    pub fn with_priority(mut self, priority: i32) -> Self {
        self.priority = priority;
        self
    }

    /// 判断该描述符是否接受完整的原始 URI（含尾部段）
    pub fn accepts(&self, full_uri: &str) -> bool {
        self.acceptance.is_match(full_uri)
    }

    pub fn uri(&self) -> &str {
        &self.uri
    }

    pub fn pattern(&self) -> Option<&str> {
        self.pattern.as_deref()
    }

    /// 占位符名列表，与剩余 URI 段按位置配对
    pub fn parameter_names(&self) -> &[String] {
        &self.parameter_names
    }

    pub fn priority(&self) -> i32 {
        self.priority
    }
}

/// 规范 URI 到动作描述符的查找表。
///
/// 同一 URI 允许注册多个描述符，任一时刻只有一个"生效"：
/// 优先级高者胜出，同优先级按注册顺序取先注册者（并记录警告）。
/// 启动期填充一次，此后只读。
#[derive(Default)]
pub struct ActionRegistry {
    table: HashMap<String, Vec<Arc<ActionDescriptor>>>,
}

impl ActionRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// 注册一条描述符
    pub fn register(&mut self, descriptor: ActionDescriptor) {
        let entry = self.table.entry(descriptor.uri().to_string()).or_default();
        if entry.iter().any(|d| d.priority() == descriptor.priority()) {
            warn!(
                "URI[{}]上注册了多个优先级为{}的动作描述符，将按注册顺序取先注册者",
                descriptor.uri(),
                descriptor.priority()
            );
        }
        entry.push(Arc::new(descriptor));
        // 稳定排序：高优先级在前，同优先级保持注册顺序
        entry.sort_by(|a, b| b.priority().cmp(&a.priority()));
    }

    /// 查询某 URI 上当前生效的描述符
    pub fn active(&self, uri: &str) -> Option<&Arc<ActionDescriptor>> {
        self.table.get(uri).and_then(|entry| entry.first())
    }

    pub fn contains(&self, uri: &str) -> bool {
        self.table.contains_key(uri)
    }

    pub fn len(&self) -> usize {
        self.table.len()
    }

    pub fn is_empty(&self) -> bool {
        self.table.is_empty()
    }
}

/// 一次 URI 解析的结果。
///
/// `action` 为 `None` 时表示未命中（或重定向信号），由调用方决定
/// 后续处理（404、静态文件回退、发送重定向等）；解析本身从不因
/// 未命中而报错。
pub struct ResolvedAction {
    action: Option<Box<dyn Bindable>>,
    uri: String,
    extension: Option<String>,
    uri_parameters: Vec<String>,
    descriptor: Option<Arc<ActionDescriptor>>,
}

impl ResolvedAction {
    pub(crate) fn new(
        action: Option<Box<dyn Bindable>>,
        uri: String,
        extension: Option<String>,
        uri_parameters: Vec<String>,
        descriptor: Option<Arc<ActionDescriptor>>,
    ) -> Self {
        Self {
            action,
            uri,
            extension,
            uri_parameters,
            descriptor,
        }
    }

    /// 是否绑定了处理器实例
    pub fn has_action(&self) -> bool {
        self.action.is_some()
    }

    /// 可变访问处理器实例（绑定层据此写入请求参数）
    pub fn action_mut(&mut self) -> Option<&mut dyn Bindable> {
        self.action.as_deref_mut()
    }

    /// 取走处理器实例的所有权
    pub fn take_action(&mut self) -> Option<Box<dyn Bindable>> {
        self.action.take()
    }

    /// 解析得到的规范 URI（重定向信号时为补全斜杠后的 URI）
    pub fn uri(&self) -> &str {
        &self.uri
    }

    /// 被剥离的文件扩展名
    pub fn extension(&self) -> Option<&str> {
        self.extension.as_deref()
    }

    /// 按原始从左到右顺序排列的剩余 URI 段
    pub fn uri_parameters(&self) -> &[String] {
        &self.uri_parameters
    }

    /// 命中的描述符
    pub fn descriptor(&self) -> Option<&Arc<ActionDescriptor>> {
        self.descriptor.as_ref()
    }
}

/// 处理器实例化的外部接缝。
///
/// 由依赖注入容器或测试桩实现；实现必须线程安全，
/// 因为解析器会在任意请求线程上调用它。
pub trait ActionFactory: Send + Sync {
    fn create(&self, descriptor: &ActionDescriptor) -> Result<Box<dyn Bindable>, Exception>;
}

/// 闭包即工厂，便于测试与简单装配
impl<F> ActionFactory for F
where
    F: Fn(&ActionDescriptor) -> Result<Box<dyn Bindable>, Exception> + Send + Sync,
{
    fn create(&self, descriptor: &ActionDescriptor) -> Result<Box<dyn Bindable>, Exception> {
        self(descriptor)
    }
}
