// Copyright (c) 2026 shaneyale (shaneyale86@gmail.com)
// All rights reserved.

#[cfg(test)]
mod binding_tests {
    //! # 请求绑定回归测试套件
    //!
    //! 该模块以完整的请求视角驱动绑定管线：解析 URI、绑定位置参数、
    //! 逐字段应用查询/表单参数并校验错误累积策略。覆盖范围包括：
    //! - 深路径写入与中间节点按需实例化
    //! - 数组/列表/映射/索引 bean 属性的各自语义
    //! - 货币金额的动态属性契约
    //! - 表单回显（值到字符串的反向管线）

    use std::collections::BTreeMap;
    use std::sync::Arc;

    use mvcbind::bindable::Bindable;
    use mvcbind::path::Key;
    use mvcbind::value::{Money, Value};
    use mvcbind::{
        bind_uri_parameters, impl_bindable, scalar_enum, ActionDescriptor, ActionFactory,
        ActionRegistry, ActionResolver, Attributes, Config, Exception, ExpressionEvaluator,
    };

    scalar_enum! {
        pub enum Role { Guest, Member, Admin }
    }

    #[derive(Default)]
    struct Address {
        city: Option<String>,
        zip: Option<String>,
    }

    impl_bindable! {
        Address {
            scalar city: String;
            scalar zip: String;
        }
    }

    #[derive(Default)]
    struct OrderAction {
        id: Option<i64>,
        role: Option<Role>,
        salary: Option<Money>,
        tags: Vec<String>,
        quantities: Vec<Option<i32>>,
        labels: BTreeMap<String, String>,
        shipping: Option<Address>,
        addresses: BTreeMap<String, Address>,
        attributes: BTreeMap<String, String>,
    }

    impl OrderAction {
        fn attribute_at(&self, key: &Key) -> Option<String> {
            self.attributes.get(&key_text(key)).cloned()
        }

        fn set_attribute_at(&mut self, key: &Key, value: Option<String>) {
            match value {
                Some(v) => {
                    self.attributes.insert(key_text(key), v);
                }
                None => {
                    self.attributes.remove(&key_text(key));
                }
            }
        }
    }

    fn key_text(key: &Key) -> String {
        match key {
            Key::Index(i) => i.to_string(),
            Key::Name(name) => name.clone(),
        }
    }

    impl_bindable! {
        OrderAction {
            scalar id: i64;
            scalar role: Role;
            scalar salary: Money;
            array tags: String;
            list quantities: i32;
            map labels: String;
            object shipping: Address;
            object_map addresses: Address;
            indexed attributes: String => attribute_at, set_attribute_at;
        }
    }

    fn evaluator() -> ExpressionEvaluator {
        ExpressionEvaluator::new(&Config::new())
    }

    fn no_attrs() -> Attributes {
        Attributes::new()
    }

    fn attrs(pairs: &[(&str, &str)]) -> Attributes {
        pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect()
    }

    /// 深路径写入按需实例化中间对象
    #[test]
    fn test_deep_write_instantiates_intermediates() {
        let e = evaluator();
        let mut action = OrderAction::default();

        e.set("shipping.city", &mut action, &["Wuhan"], &no_attrs())
            .unwrap();
        e.set("addresses[work].zip", &mut action, &["430000"], &no_attrs())
            .unwrap();

        assert_eq!(action.shipping.unwrap().city, Some("Wuhan".to_string()));
        assert_eq!(
            action.addresses.get("work").unwrap().zip,
            Some("430000".to_string())
        );
    }

    /// 读取缺失的深路径得到 None 且不改变对象图
    #[test]
    fn test_read_never_mutates() {
        let e = evaluator();
        let action = OrderAction::default();

        assert_eq!(e.get("shipping.city", &action).unwrap(), None);
        assert!(action.shipping.is_none());
        assert!(action.addresses.is_empty());
    }

    /// 规格性质：["a,b,c"] 与 ["a","b","c"] 产生相同的数组元素
    #[test]
    fn test_array_split_equivalence() {
        let e = evaluator();

        let mut split = OrderAction::default();
        e.set("tags", &mut split, &["a,b,c"], &no_attrs()).unwrap();

        let mut multi = OrderAction::default();
        e.set("tags", &mut multi, &["a", "b", "c"], &no_attrs())
            .unwrap();

        assert_eq!(split.tags, vec!["a", "b", "c"]);
        assert_eq!(split.tags, multi.tags);
    }

    /// 规格性质：对空列表写 list[5] 增长到 6，0-4 为空洞
    #[test]
    fn test_list_gap_growth() {
        let e = evaluator();
        let mut action = OrderAction::default();

        e.set("quantities[5]", &mut action, &["7"], &no_attrs())
            .unwrap();

        assert_eq!(action.quantities.len(), 6);
        assert!(action.quantities[..5].iter().all(Option::is_none));
        assert_eq!(action.quantities[5], Some(7));
    }

    /// 规格性质：索引 bean 属性经设值方法写入转换后的值
    #[test]
    fn test_indexed_bean_property_write() {
        let e = evaluator();
        let mut action = OrderAction::default();

        e.set("attributes[theme]", &mut action, &["dark"], &no_attrs())
            .unwrap();

        assert_eq!(action.attributes.get("theme"), Some(&"dark".to_string()));
        assert_eq!(
            e.get("attributes[theme]", &action).unwrap(),
            Some(Value::Text("dark".to_string()))
        );
    }

    /// 枚举按变体名绑定
    #[test]
    fn test_enum_binding() {
        let e = evaluator();
        let mut action = OrderAction::default();

        e.set("role", &mut action, &["Admin"], &no_attrs()).unwrap();
        assert_eq!(action.role, Some(Role::Admin));

        let result = e.set("role", &mut action, &["root"], &no_attrs());
        assert!(matches!(result, Err(Exception::Conversion { .. })));
    }

    /// 规格场景：货币绑定缺少 currencyCode 是转换器状态错误
    #[test]
    fn test_money_requires_currency_attribute() {
        let e = evaluator();
        let mut action = OrderAction::default();

        let result = e.set("salary", &mut action, &["1000.00"], &no_attrs());
        assert!(matches!(result, Err(Exception::ConverterState { .. })));

        e.set(
            "salary",
            &mut action,
            &["1000.00"],
            &attrs(&[("currencyCode", "USD")]),
        )
        .unwrap();
        assert_eq!(action.salary, Some(Money::from_minor(100000, "USD")));
    }

    /// 表单回显：写入后读回的字符串与原始输入一致
    #[test]
    fn test_form_redisplay_pipeline() {
        let e = evaluator();
        let mut action = OrderAction::default();
        let usd = attrs(&[("currencyCode", "USD")]);

        e.set("id", &mut action, &["42"], &no_attrs()).unwrap();
        e.set("tags", &mut action, &["x,y"], &no_attrs()).unwrap();
        e.set("salary", &mut action, &["99.50"], &usd).unwrap();

        assert_eq!(
            e.get_string("id", &action, &no_attrs()).unwrap(),
            Some("42".to_string())
        );
        assert_eq!(
            e.get_string("tags", &action, &no_attrs()).unwrap(),
            Some("x,y".to_string())
        );
        assert_eq!(
            e.get_string("salary", &action, &usd).unwrap(),
            Some("99.50".to_string())
        );
        // 未设置的字段回显为 None
        assert_eq!(e.get_string("role", &action, &no_attrs()).unwrap(), None);
    }

    /// 绑定编排：转换错误逐字段累积，同级字段继续绑定
    #[test]
    fn test_bind_all_accumulates_conversion_errors() {
        let e = evaluator();
        let mut action = OrderAction::default();

        let parameters = vec![
            ("id".to_string(), vec!["42".to_string()]),
            ("role".to_string(), vec!["nobody".to_string()]),
            ("shipping.city".to_string(), vec!["Hefei".to_string()]),
            ("quantities[2]".to_string(), vec!["oops".to_string()]),
        ];

        let report = e.bind_all(&mut action, &parameters, &no_attrs()).unwrap();

        assert_eq!(report.errors().len(), 2);
        assert_eq!(report.errors()[0].expression(), "role");
        assert_eq!(report.errors()[1].expression(), "quantities[2]");
        // 出错字段不影响同级字段
        assert_eq!(action.id, Some(42));
        assert_eq!(action.shipping.unwrap().city, Some("Hefei".to_string()));
    }

    /// 绑定编排：配置缺陷立即中止而不是累积
    #[test]
    fn test_bind_all_propagates_configuration_defects() {
        let e = evaluator();
        let mut action = OrderAction::default();

        let parameters = vec![
            ("id".to_string(), vec!["42".to_string()]),
            ("salary".to_string(), vec!["100.00".to_string()]),
        ];
        // 缺少 currencyCode
        let result = e.bind_all(&mut action, &parameters, &no_attrs());
        assert!(matches!(result, Err(Exception::ConverterState { .. })));
    }

    /// 完整请求视角：URI 参数与表单参数走同一条转换管线
    #[test]
    fn test_uri_parameters_flow_through_binding() {
        let mut registry = ActionRegistry::new();
        registry.register(ActionDescriptor::with_pattern("/order/edit", "{id}"));

        let factory: Arc<dyn ActionFactory> =
            Arc::new(|_d: &ActionDescriptor| -> Result<Box<dyn Bindable>, Exception> {
                Ok(Box::new(OrderAction::default()))
            });
        let resolver = ActionResolver::new(registry, factory, &Config::new());
        let e = evaluator();

        let mut resolution = resolver.resolve("/order/edit/42").unwrap();
        bind_uri_parameters(&e, &mut resolution, &no_attrs()).unwrap();

        // 随后的表单参数继续落在同一个处理器上
        let action = resolution.action_mut().unwrap();
        e.set("labels[source]", action, &["uri"], &no_attrs())
            .unwrap();

        let action = resolution.take_action().unwrap();
        let action = action.as_any().downcast_ref::<OrderAction>().unwrap();
        assert_eq!(action.id, Some(42));
        assert_eq!(action.labels.get("source"), Some(&"uri".to_string()));
    }

    /// 多维数组写法始终被拒绝
    #[test]
    fn test_multi_dimensional_rejected() {
        let e = evaluator();
        let mut action = OrderAction::default();

        let result = e.set("tags[0][1]", &mut action, &["x"], &no_attrs());
        assert!(matches!(result, Err(Exception::UnsupportedShape { .. })));
    }
}
