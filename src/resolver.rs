// Copyright (c) 2026 shaneyale (shaneyale86@gmail.com)
// All rights reserved.

//! # URI 动作解析模块
//!
//! 该模块是绑定核心的路由引擎，将抽象的请求 URI 映射到已注册的动作。
//!
//! ## 解析规则
//! 1. 剥离文件名风格的扩展名（仅当最后一个点之后全部是字母；
//!    `-1.0` 这类版本号形状的点不算扩展名）。
//! 2. 以剥离后的 URI 直接查表。
//! 3. 目录型 URI（以 `/` 结尾）补全索引动作名后重试；
//!    非目录型 URI 若存在 `/index` 变体，则返回"重定向到规范索引 URI"
//!    的信号：不绑定处理器，规范 URI 为原 URI 加斜杠。
//! 4. 自右向左逐段剥离并在每个缩短的 URI 上重试，剥下的段按原始
//!    从左到右顺序构成"URI 参数"；候选命中还须接受完整的原始 URI，
//!    拒绝则继续剥段（天然保持最长前缀优先）。
//!
//! 未命中从不报错：返回空处理器的结果，由调用方决定 404、
//! 静态文件回退或其他处理。

use std::sync::Arc;

use log::debug;

use crate::action::{ActionDescriptor, ActionFactory, ActionRegistry, ResolvedAction};
use crate::config::Config;
use crate::convert::Attributes;
use crate::evaluator::ExpressionEvaluator;
use crate::exception::Exception;

/// URI 动作解析器。
///
/// 持有描述符表与处理器工厂，构造后只读，可被任意多请求线程共享。
pub struct ActionResolver {
    registry: ActionRegistry,
    factory: Arc<dyn ActionFactory>,
    index_action: String,
}

impl ActionResolver {
    pub fn new(registry: ActionRegistry, factory: Arc<dyn ActionFactory>, config: &Config) -> Self {
        Self {
            registry,
            factory,
            index_action: config.index_action().to_string(),
        }
    }

    /// 访问底层描述符表
    pub fn registry(&self) -> &ActionRegistry {
        &self.registry
    }

    /// # 解析入口
    ///
    /// 未命中以 `Ok`（空处理器）表达；唯一的 `Err` 来自处理器工厂
    /// 实例化失败——那是装配缺陷，不是未命中。
    pub fn resolve(&self, uri: &str) -> Result<ResolvedAction, Exception> {
        // 1. 剥离扩展名
        let (base, extension) = strip_extension(uri);
        debug!(
            "URI解析开始: 原始='{}'，剥离后='{}'，扩展名={:?}",
            uri, base, extension
        );

        // 2. 直接查表
        if let Some(descriptor) = self.registry.active(base) {
            debug!("URI[{}]直接命中", base);
            return self.finish(descriptor.clone(), base.to_string(), extension, Vec::new());
        }

        if base.ends_with('/') {
            // 3a. 目录型 URI：补全索引动作名后重试
            let with_index = format!("{}{}", base, self.index_action);
            if let Some(descriptor) = self.registry.active(&with_index) {
                debug!("目录型URI[{}]命中索引动作[{}]", base, with_index);
                return self.finish(descriptor.clone(), with_index, extension, Vec::new());
            }
        } else {
            // 3b. 非目录型 URI：存在索引变体时返回重定向信号，不绑定处理器
            let with_index = format!("{}/{}", base, self.index_action);
            if self.registry.active(&with_index).is_some() {
                debug!("URI[{}]存在索引动作变体，返回规范化重定向信号", base);
                return Ok(ResolvedAction::new(
                    None,
                    format!("{}/", base),
                    extension,
                    Vec::new(),
                    None,
                ));
            }

            // 4. 自右向左剥段重试
            let mut shortened = base.to_string();
            let mut parameters: Vec<String> = Vec::new();
            loop {
                let position = match shortened.rfind('/') {
                    Some(p) if p > 0 => p,
                    // 剥到根即告穷尽
                    _ => break,
                };
                parameters.insert(0, shortened[position + 1..].to_string());
                shortened.truncate(position);
                if let Some(descriptor) = self.registry.active(&shortened) {
                    // 候选还须接受完整的原始 URI，拒绝则继续剥段
                    if descriptor.accepts(base) {
                        debug!(
                            "URI[{}]经剥段命中[{}]，剩余段{:?}",
                            base, shortened, parameters
                        );
                        return self.finish(
                            descriptor.clone(),
                            shortened,
                            extension,
                            parameters,
                        );
                    }
                    debug!("候选[{}]拒绝了完整URI[{}]，继续剥段", shortened, base);
                }
            }
        }

        // 未命中：剩余段丢弃，由调用方决定后续处理
        debug!("URI[{}]未命中任何动作", base);
        Ok(ResolvedAction::new(
            None,
            base.to_string(),
            extension,
            Vec::new(),
            None,
        ))
    }

    fn finish(
        &self,
        descriptor: Arc<ActionDescriptor>,
        uri: String,
        extension: Option<String>,
        parameters: Vec<String>,
    ) -> Result<ResolvedAction, Exception> {
        // 实例化交给外部工厂（依赖注入接缝）
        let action = self.factory.create(&descriptor)?;
        Ok(ResolvedAction::new(
            Some(action),
            uri,
            extension,
            parameters,
            Some(descriptor),
        ))
    }
}

/// 把剩余 URI 段按位置绑定到处理器属性。
///
/// 描述符的占位符名与剩余段逐对配对，每一对都经由求值器的常规
/// 转换管线写入——URI 参数与查询/表单参数走完全相同的通道。
/// 超出占位符数量的剩余段被忽略。
pub fn bind_uri_parameters(
    evaluator: &ExpressionEvaluator,
    resolution: &mut ResolvedAction,
    attributes: &Attributes,
) -> Result<(), Exception> {
    let descriptor = match resolution.descriptor() {
        Some(descriptor) => descriptor.clone(),
        None => return Ok(()),
    };
    let parameters: Vec<String> = resolution.uri_parameters().to_vec();
    let action = match resolution.action_mut() {
        Some(action) => action,
        None => return Ok(()),
    };
    for (name, value) in descriptor.parameter_names().iter().zip(parameters.iter()) {
        evaluator.set(name, action, &[value.as_str()], attributes)?;
    }
    Ok(())
}

/// 剥离文件名风格的扩展名。
///
/// 仅当最后一个 `/` 之后的段包含点、且最后一个点之后的字符
/// 非空且全部是 ASCII 字母时才剥离；`-1.0` 之类的版本号不受影响。
fn strip_extension(uri: &str) -> (&str, Option<String>) {
    let segment_start = uri.rfind('/').map(|i| i + 1).unwrap_or(0);
    let last_segment = &uri[segment_start..];
    if let Some(dot) = last_segment.rfind('.') {
        let suffix = &last_segment[dot + 1..];
        if !suffix.is_empty() && suffix.chars().all(|c| c.is_ascii_alphabetic()) {
            return (&uri[..segment_start + dot], Some(suffix.to_string()));
        }
    }
    (uri, None)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::bindable::Bindable;
    use crate::impl_bindable;

    #[derive(Default)]
    struct EditAction {
        id: Option<i64>,
        mode: Option<String>,
    }

    impl_bindable! {
        EditAction {
            scalar id: i64;
            scalar mode: String;
        }
    }

    fn factory() -> Arc<dyn ActionFactory> {
        Arc::new(|_d: &ActionDescriptor| -> Result<Box<dyn Bindable>, Exception> {
            Ok(Box::new(EditAction::default()))
        })
    }

    fn resolver(descriptors: Vec<ActionDescriptor>) -> ActionResolver {
        let mut registry = ActionRegistry::new();
        for d in descriptors {
            registry.register(d);
        }
        ActionResolver::new(registry, factory(), &Config::new())
    }

    /// 扩展名剥离：字母后缀剥离，版本号形状保留
    #[test]
    fn test_strip_extension() {
        assert_eq!(strip_extension("/foo.json"), ("/foo", Some("json".to_string())));
        assert_eq!(strip_extension("/foo.xml"), ("/foo", Some("xml".to_string())));
        assert_eq!(strip_extension("/foo-1.0"), ("/foo-1.0", None));
        assert_eq!(strip_extension("/foo"), ("/foo", None));
        assert_eq!(strip_extension("/foo."), ("/foo.", None));
        assert_eq!(strip_extension("/a.b/foo"), ("/a.b/foo", None));
    }

    /// 注册的规范 URI 直接命中
    #[test]
    fn test_resolve_direct() {
        let r = resolver(vec![ActionDescriptor::new("/user/edit")]);
        let resolution = r.resolve("/user/edit").unwrap();
        assert!(resolution.has_action());
        assert_eq!(resolution.uri(), "/user/edit");
        assert!(resolution.uri_parameters().is_empty());
    }

    /// 未命中不是错误
    #[test]
    fn test_resolve_miss() {
        let r = resolver(vec![ActionDescriptor::new("/user/edit")]);
        let resolution = r.resolve("/nothing/here").unwrap();
        assert!(!resolution.has_action());
        assert!(resolution.descriptor().is_none());
    }

    /// 目录型 URI 补全索引动作
    #[test]
    fn test_resolve_directory_index() {
        let r = resolver(vec![ActionDescriptor::new("/admin/index")]);
        let resolution = r.resolve("/admin/").unwrap();
        assert!(resolution.has_action());
        assert_eq!(resolution.uri(), "/admin/index");
    }

    /// 非目录型 URI 的索引变体产生重定向信号
    #[test]
    fn test_resolve_index_redirect_signal() {
        let r = resolver(vec![ActionDescriptor::new("/admin/index")]);
        let resolution = r.resolve("/admin").unwrap();
        assert!(!resolution.has_action());
        assert!(resolution.descriptor().is_none());
        assert_eq!(resolution.uri(), "/admin/");
    }

    /// 剥段恢复 RESTful 位置参数
    #[test]
    fn test_resolve_peeling() {
        let r = resolver(vec![ActionDescriptor::with_pattern(
            "/user/edit",
            "{id}/{mode}",
        )]);
        let resolution = r.resolve("/user/edit/42/profile").unwrap();
        assert!(resolution.has_action());
        assert_eq!(resolution.uri(), "/user/edit");
        assert_eq!(resolution.uri_parameters(), &["42", "profile"]);
    }

    /// 候选拒绝完整 URI 时继续剥段
    #[test]
    fn test_resolve_peeling_rejection_continues() {
        // "/user/edit" 只接受一个尾段，三个尾段被拒绝后继续剥到 "/user"
        let r = resolver(vec![
            ActionDescriptor::with_pattern("/user/edit", "{id}"),
            ActionDescriptor::with_pattern("/user", "*"),
        ]);
        let resolution = r.resolve("/user/edit/42/profile/extra").unwrap();
        assert!(resolution.has_action());
        assert_eq!(resolution.uri(), "/user");
        assert_eq!(resolution.uri_parameters(), &["edit", "42", "profile", "extra"]);
    }

    /// 扩展名剥离参与解析，扩展名随结果返回
    #[test]
    fn test_resolve_with_extension() {
        let r = resolver(vec![ActionDescriptor::new("/api/list")]);
        let resolution = r.resolve("/api/list.json").unwrap();
        assert!(resolution.has_action());
        assert_eq!(resolution.uri(), "/api/list");
        assert_eq!(resolution.extension(), Some("json"));
    }

    /// 位置参数经常规转换管线写入处理器
    #[test]
    fn test_bind_uri_parameters() {
        let r = resolver(vec![ActionDescriptor::with_pattern(
            "/user/edit",
            "{id}/{mode}",
        )]);
        let mut resolution = r.resolve("/user/edit/42/profile").unwrap();

        let evaluator = ExpressionEvaluator::new(&Config::new());
        bind_uri_parameters(&evaluator, &mut resolution, &Attributes::new()).unwrap();

        let action = resolution.take_action().unwrap();
        let action = action.as_any().downcast_ref::<EditAction>().unwrap();
        assert_eq!(action.id, Some(42));
        assert_eq!(action.mode, Some("profile".to_string()));
    }

    /// 工厂失败以装配缺陷传播，区别于未命中
    #[test]
    fn test_factory_failure() {
        let mut registry = ActionRegistry::new();
        registry.register(ActionDescriptor::new("/broken"));
        let failing: Arc<dyn ActionFactory> =
            Arc::new(|d: &ActionDescriptor| -> Result<Box<dyn Bindable>, Exception> {
                Err(Exception::ActionCreation {
                    uri: d.uri().to_string(),
                    reason: "no binding".to_string(),
                })
            });
        let r = ActionResolver::new(registry, failing, &Config::new());
        let result = r.resolve("/broken");
        assert!(matches!(result, Err(Exception::ActionCreation { .. })));
    }
}
