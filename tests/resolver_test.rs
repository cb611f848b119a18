use std::sync::Arc;

use mvcbind::bindable::Bindable;
use mvcbind::{
    impl_bindable, ActionDescriptor, ActionFactory, ActionRegistry, ActionResolver, Config,
    Exception,
};

#[derive(Default)]
struct UserEditAction {
    id: Option<i64>,
}

impl_bindable! {
    UserEditAction {
        scalar id: i64;
    }
}

mockall::mock! {
    Factory {}

    impl ActionFactory for Factory {
        fn create(&self, descriptor: &ActionDescriptor) -> Result<Box<dyn Bindable>, Exception>;
    }
}

fn stub_factory() -> Arc<dyn ActionFactory> {
    Arc::new(|_d: &ActionDescriptor| -> Result<Box<dyn Bindable>, Exception> {
        Ok(Box::new(UserEditAction::default()))
    })
}

fn build_resolver(descriptors: Vec<ActionDescriptor>) -> ActionResolver {
    let mut registry = ActionRegistry::new();
    for descriptor in descriptors {
        registry.register(descriptor);
    }
    ActionResolver::new(registry, stub_factory(), &Config::new())
}

#[cfg(test)]
mod resolver_tests {
    use super::*;

    /// 所有已注册的规范 URI 都能解析回其描述符
    #[test]
    fn test_registered_uris_resolve_to_their_descriptor() {
        let uris = ["/user/edit", "/user/list", "/admin/index", "/api/status"];
        let r = build_resolver(uris.iter().map(|u| ActionDescriptor::new(u)).collect());

        for uri in uris {
            let resolution = r.resolve(uri).unwrap();
            assert!(resolution.has_action(), "URI {} 应当命中", uri);
            assert_eq!(resolution.descriptor().unwrap().uri(), uri);
            assert_eq!(resolution.uri(), uri);
        }
    }

    /// 注册了 U + "/index" 时，resolve(U) 返回空处理器的重定向信号
    #[test]
    fn test_index_redirect_signal() {
        let r = build_resolver(vec![ActionDescriptor::new("/shop/index")]);

        let resolution = r.resolve("/shop").unwrap();
        assert!(!resolution.has_action());
        assert!(resolution.descriptor().is_none());
        assert_eq!(resolution.uri(), "/shop/");

        // 目录形式直接命中索引动作
        let resolution = r.resolve("/shop/").unwrap();
        assert!(resolution.has_action());
        assert_eq!(resolution.uri(), "/shop/index");
    }

    /// 连字符加数字的后缀不会被当作扩展名剥离
    #[test]
    fn test_version_suffix_not_stripped() {
        let r = build_resolver(vec![ActionDescriptor::new("/release/foo-1.0")]);

        let resolution = r.resolve("/release/foo-1.0").unwrap();
        assert!(resolution.has_action());
        assert_eq!(resolution.uri(), "/release/foo-1.0");
        assert_eq!(resolution.extension(), None);
    }

    /// 字母扩展名被剥离并随结果返回
    #[test]
    fn test_extension_stripping() {
        let r = build_resolver(vec![ActionDescriptor::new("/api/status")]);

        for ext in ["json", "xml", "html"] {
            let resolution = r.resolve(&format!("/api/status.{}", ext)).unwrap();
            assert!(resolution.has_action());
            assert_eq!(resolution.uri(), "/api/status");
            assert_eq!(resolution.extension(), Some(ext));
        }
    }

    /// 规格场景：/user/edit/42/profile 剥段命中 /user/edit
    #[test]
    fn test_peeling_scenario() {
        let r = build_resolver(vec![
            ActionDescriptor::with_pattern("/user/edit", "{id}/{mode}"),
            ActionDescriptor::new("/user/list"),
        ]);

        let resolution = r.resolve("/user/edit/42/profile").unwrap();
        assert!(resolution.has_action());
        assert_eq!(resolution.uri(), "/user/edit");
        assert_eq!(resolution.uri_parameters(), &["42", "profile"]);
    }

    /// 候选拒绝完整 URI 后剥段继续，保持最长前缀优先
    #[test]
    fn test_peeling_prefers_longest_accepting_prefix() {
        let r = build_resolver(vec![
            ActionDescriptor::with_pattern("/files/download", "{name}"),
            ActionDescriptor::with_pattern("/files", "*"),
        ]);

        // 一个尾段：最长前缀 /files/download 接受
        let resolution = r.resolve("/files/download/report").unwrap();
        assert_eq!(resolution.uri(), "/files/download");
        assert_eq!(resolution.uri_parameters(), &["report"]);

        // 两个尾段：/files/download 拒绝，回退到 /files
        let resolution = r.resolve("/files/download/2026/report").unwrap();
        assert_eq!(resolution.uri(), "/files");
        assert_eq!(
            resolution.uri_parameters(),
            &["download", "2026", "report"]
        );
    }

    /// 未命中返回空处理器结果而不是错误，剩余段被丢弃
    #[test]
    fn test_miss_is_not_an_error() {
        let r = build_resolver(vec![ActionDescriptor::new("/user/edit")]);

        let resolution = r.resolve("/ghost/path/deep").unwrap();
        assert!(!resolution.has_action());
        assert!(resolution.descriptor().is_none());
        assert!(resolution.uri_parameters().is_empty());
    }

    /// 同一 URI 上高优先级描述符胜出
    #[test]
    fn test_override_priority() {
        let r = build_resolver(vec![
            ActionDescriptor::new("/dup"),
            ActionDescriptor::with_pattern("/dup", "{id}").with_priority(5),
        ]);

        let resolution = r.resolve("/dup").unwrap();
        assert_eq!(resolution.descriptor().unwrap().priority(), 5);
    }

    /// mockall 工厂：实例化只在命中时发生一次，且拿到命中的描述符
    #[test]
    fn test_factory_invoked_once_with_descriptor() {
        let mut registry = ActionRegistry::new();
        registry.register(ActionDescriptor::new("/user/edit"));

        let mut mock = MockFactory::new();
        mock.expect_create()
            .withf(|d| d.uri() == "/user/edit")
            .times(1)
            .returning(|_| Ok(Box::new(UserEditAction::default())));

        let r = ActionResolver::new(registry, Arc::new(mock), &Config::new());
        let resolution = r.resolve("/user/edit").unwrap();
        assert!(resolution.has_action());
    }

    /// mockall 工厂：未命中时不实例化
    #[test]
    fn test_factory_not_invoked_on_miss() {
        let mut registry = ActionRegistry::new();
        registry.register(ActionDescriptor::new("/user/edit"));

        let mut mock = MockFactory::new();
        mock.expect_create().times(0);

        let r = ActionResolver::new(registry, Arc::new(mock), &Config::new());
        let resolution = r.resolve("/missing").unwrap();
        assert!(!resolution.has_action());
    }

    /// 工厂失败作为装配缺陷传播
    #[test]
    fn test_factory_failure_propagates() {
        let mut registry = ActionRegistry::new();
        registry.register(ActionDescriptor::new("/user/edit"));

        let mut mock = MockFactory::new();
        mock.expect_create().returning(|d| {
            Err(Exception::ActionCreation {
                uri: d.uri().to_string(),
                reason: "container refused".to_string(),
            })
        });

        let r = ActionResolver::new(registry, Arc::new(mock), &Config::new());
        let result = r.resolve("/user/edit");
        assert!(matches!(result, Err(Exception::ActionCreation { .. })));
    }
}
