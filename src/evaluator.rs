// Copyright (c) 2026 shaneyale (shaneyale86@gmail.com)
// All rights reserved.

//! # 属性路径求值模块
//!
//! 该模块是绑定引擎的核心组件之一，负责沿解析后的路径表达式遍历对象图，
//! 完成读取（`get` / `get_string`）与写入（`set`）。它涵盖了：
//! 1. 中间段导航：嵌套对象与对象容器元素，写路径按需实例化缺失节点。
//! 2. 终端段分发：按属性的访问器种类选择整体写入、元素写入或
//!    索引 bean 写入，并向转换器注册表请求正确的目标转换。
//! 3. 绑定编排（`bind_all`）：逐字段应用请求参数，按异常分类决定
//!    累积还是立即中止。
//!
//! ## 读写不对称
//! 读取从不触发对象图变更：路径上任何缺失的中间值都让整个表达式
//! 得到 `None`；写入则以默认值补全缺失的中间节点，使深路径无需
//! 调用方预先填充即可落位。

use log::debug;

use crate::bindable::{unknown_property, Bindable, PropertyKind, TypeInfo};
use crate::config::Config;
use crate::convert::{Attributes, BindTarget, ConverterRegistry};
use crate::exception::Exception;
use crate::path::{PathCache, Segment};
use crate::value::Value;

/// 单个字段的绑定失败记录。
#[derive(Debug, Clone)]
pub struct FieldError {
    expression: String,
    values: Vec<String>,
    error: Exception,
}

impl FieldError {
    pub fn expression(&self) -> &str {
        &self.expression
    }

    pub fn values(&self) -> &[String] {
        &self.values
    }

    pub fn error(&self) -> &Exception {
        &self.error
    }
}

/// 一次完整绑定的结果：逐字段累积的用户输入错误。
///
/// 只有转换错误会被累积；配置类缺陷在 `bind_all` 中直接以 `Err` 传播。
#[derive(Debug, Clone, Default)]
pub struct BindReport {
    errors: Vec<FieldError>,
}

impl BindReport {
    /// 没有任何字段出错
    pub fn is_clean(&self) -> bool {
        self.errors.is_empty()
    }

    pub fn errors(&self) -> &[FieldError] {
        &self.errors
    }
}

/// 路径表达式求值器。
///
/// 持有转换器注册表与表达式解析缓存，二者在构造后只读，
/// 可被任意多请求线程共享。
pub struct ExpressionEvaluator {
    converters: ConverterRegistry,
    paths: PathCache,
}

impl ExpressionEvaluator {
    /// 以内置转换器构造求值器
    pub fn new(config: &Config) -> Self {
        Self {
            converters: ConverterRegistry::with_builtins(config),
            paths: PathCache::from_capacity(config.path_cache_size()),
        }
    }

    /// 以调用方自备的转换器注册表构造求值器
    pub fn with_registry(registry: ConverterRegistry, config: &Config) -> Self {
        Self {
            converters: registry,
            paths: PathCache::from_capacity(config.path_cache_size()),
        }
    }

    /// 暴露转换器注册表，供渲染层独立使用转换管线
    pub fn converters(&self) -> &ConverterRegistry {
        &self.converters
    }

    /// 读取表达式指向的值。
    ///
    /// 路径上任何缺失的中间值（未实例化的对象、不存在的映射键、
    /// 越界下标）都使整个表达式得到 `Ok(None)`；
    /// 引用不存在的属性名才是错误。
    pub fn get(&self, expression: &str, root: &dyn Bindable) -> Result<Option<Value>, Exception> {
        let path = self.paths.parse(expression)?;
        let (terminal, intermediate) = split_path(path.segments());

        let mut current = root;
        for segment in intermediate {
            match self.step(expression, current, segment)? {
                Some(next) => current = next,
                None => return Ok(None),
            }
        }
        self.read_terminal(expression, current, terminal)
    }

    /// 读取表达式指向的值并转换回字符串（表单回显管线）。
    pub fn get_string(
        &self,
        expression: &str,
        root: &dyn Bindable,
        attributes: &Attributes,
    ) -> Result<Option<String>, Exception> {
        let path = self.paths.parse(expression)?;
        let (terminal, intermediate) = split_path(path.segments());

        let mut current = root;
        for segment in intermediate {
            match self.step(expression, current, segment)? {
                Some(next) => current = next,
                None => return Ok(None),
            }
        }

        let target = self.terminal_target(expression, current.type_info(), terminal)?;
        let value = match self.read_terminal(expression, current, terminal)? {
            Some(value) => value,
            None => return Ok(None),
        };
        self.converters
            .convert_to_string(&target, attributes, expression, &value)
    }

    /// 把原始字符串值写入表达式指向的位置。
    ///
    /// 中间节点缺失时按声明类型实例化默认值；终端值经转换器注册表
    /// 得到类型化结果后写入。转换错误与配置缺陷都原样向调用方传播，
    /// 是否累积由绑定编排器决定。
    pub fn set(
        &self,
        expression: &str,
        root: &mut dyn Bindable,
        values: &[&str],
        attributes: &Attributes,
    ) -> Result<(), Exception> {
        debug!("写入表达式[{}]，原始值{}个", expression, values.len());
        let path = self.paths.parse(expression)?;
        let (terminal, intermediate) = split_path(path.segments());

        let mut current = root;
        for segment in intermediate {
            let info = current.type_info();
            let kind = info
                .property(&segment.name)
                .ok_or_else(|| unknown_property(info, &segment.name))?
                .kind;
            let next = match (kind, &segment.key) {
                (PropertyKind::Object, None) => {
                    Bindable::child_mut(current, &segment.name, true)?
                }
                (PropertyKind::ObjectList, Some(key))
                | (PropertyKind::ObjectMap, Some(key))
                | (PropertyKind::IndexedObject, Some(key)) => {
                    Bindable::child_element_mut(current, &segment.name, key, true)?
                }
                _ => return Err(navigation_error(expression, info, segment)),
            };
            current = next.ok_or_else(|| Exception::ConverterState {
                expression: expression.to_string(),
                reason: format!(
                    "intermediate segment [{}] could not be instantiated",
                    segment.name
                ),
            })?;
        }

        let info = current.type_info();
        let kind = info
            .property(&terminal.name)
            .ok_or_else(|| unknown_property(info, &terminal.name))?
            .kind;
        match (kind, &terminal.key) {
            (PropertyKind::Scalar(scalar), None) => {
                let value = self.converters.convert_from_strings(
                    &BindTarget::Scalar(scalar),
                    attributes,
                    expression,
                    values,
                )?;
                current.write(&terminal.name, value)
            }
            (PropertyKind::Array(scalar), None) | (PropertyKind::List(scalar), None) => {
                let value = self.converters.convert_from_strings(
                    &BindTarget::Sequence(scalar),
                    attributes,
                    expression,
                    values,
                )?;
                current.write(&terminal.name, value)
            }
            (PropertyKind::Array(scalar), Some(key))
            | (PropertyKind::List(scalar), Some(key))
            | (PropertyKind::Map(scalar), Some(key)) => {
                let value = self.converters.convert_from_strings(
                    &BindTarget::Scalar(scalar),
                    attributes,
                    expression,
                    values,
                )?;
                current.write_element(&terminal.name, key, value)
            }
            (PropertyKind::Indexed(scalar), Some(key)) => {
                // 先转换、后经索引设值方法写入，绝不透过取值结果改写
                let value = self.converters.convert_from_strings(
                    &BindTarget::Scalar(scalar),
                    attributes,
                    expression,
                    values,
                )?;
                current.write_indexed(&terminal.name, key, value)
            }
            (PropertyKind::Map(_), None) => Err(shape_error(
                expression,
                "a whole map cannot be bound; supply a key",
            )),
            (PropertyKind::Indexed(_), None) => Err(shape_error(
                expression,
                "indexed property requires a key",
            )),
            (PropertyKind::Scalar(_), Some(_)) => {
                Err(shape_error(expression, "property is not indexable"))
            }
            _ => Err(shape_error(
                expression,
                "an object cannot be bound directly; bind its leaf properties",
            )),
        }
    }

    /// 绑定编排：把整组请求参数应用到对象图。
    ///
    /// 转换错误逐字段累积进报告，不影响同级字段继续绑定；
    /// 配置类缺陷（转换器状态错误、形状错误、属性不存在等）
    /// 立即以 `Err` 中止。
    pub fn bind_all(
        &self,
        root: &mut dyn Bindable,
        parameters: &[(String, Vec<String>)],
        attributes: &Attributes,
    ) -> Result<BindReport, Exception> {
        let mut report = BindReport::default();
        for (expression, values) in parameters {
            let value_refs: Vec<&str> = values.iter().map(String::as_str).collect();
            match self.set(expression, root, &value_refs, attributes) {
                Ok(()) => {}
                Err(error) if error.is_user_error() => {
                    debug!("字段[{}]转换失败，记入校验报告：{}", expression, error);
                    report.errors.push(FieldError {
                        expression: expression.clone(),
                        values: values.clone(),
                        error,
                    });
                }
                Err(fatal) => return Err(fatal),
            }
        }
        Ok(report)
    }

    /// 只读导航一步；缺失返回 `None`
    fn step<'a>(
        &self,
        expression: &str,
        current: &'a dyn Bindable,
        segment: &Segment,
    ) -> Result<Option<&'a dyn Bindable>, Exception> {
        let info = current.type_info();
        let kind = info
            .property(&segment.name)
            .ok_or_else(|| unknown_property(info, &segment.name))?
            .kind;
        match (kind, &segment.key) {
            (PropertyKind::Object, None) => current.child(&segment.name),
            (PropertyKind::ObjectList, Some(key))
            | (PropertyKind::ObjectMap, Some(key))
            | (PropertyKind::IndexedObject, Some(key)) => {
                current.child_element(&segment.name, key)
            }
            _ => Err(navigation_error(expression, info, segment)),
        }
    }

    /// 终端段的读取分发
    fn read_terminal(
        &self,
        expression: &str,
        current: &dyn Bindable,
        terminal: &Segment,
    ) -> Result<Option<Value>, Exception> {
        let info = current.type_info();
        let kind = info
            .property(&terminal.name)
            .ok_or_else(|| unknown_property(info, &terminal.name))?
            .kind;
        match (kind, &terminal.key) {
            (PropertyKind::Scalar(_), None)
            | (PropertyKind::Array(_), None)
            | (PropertyKind::List(_), None)
            | (PropertyKind::Map(_), None) => current.read(&terminal.name),
            (PropertyKind::Array(_), Some(key))
            | (PropertyKind::List(_), Some(key))
            | (PropertyKind::Map(_), Some(key)) => current.read_element(&terminal.name, key),
            (PropertyKind::Indexed(_), Some(key)) => current.read_indexed(&terminal.name, key),
            (PropertyKind::Indexed(_), None) => Err(shape_error(
                expression,
                "indexed property requires a key",
            )),
            (PropertyKind::Scalar(_), Some(_)) => {
                Err(shape_error(expression, "property is not indexable"))
            }
            _ => Err(shape_error(
                expression,
                "an object cannot be read as a value; read its leaf properties",
            )),
        }
    }

    /// 终端段的转换目标（用于字符串回显）
    fn terminal_target(
        &self,
        expression: &str,
        info: &TypeInfo,
        terminal: &Segment,
    ) -> Result<BindTarget, Exception> {
        let kind = info
            .property(&terminal.name)
            .ok_or_else(|| unknown_property(info, &terminal.name))?
            .kind;
        match (kind, &terminal.key) {
            (PropertyKind::Scalar(scalar), None) => Ok(BindTarget::Scalar(scalar)),
            (PropertyKind::Array(scalar), None) | (PropertyKind::List(scalar), None) => {
                Ok(BindTarget::Sequence(scalar))
            }
            (PropertyKind::Array(scalar), Some(_))
            | (PropertyKind::List(scalar), Some(_))
            | (PropertyKind::Map(scalar), Some(_))
            | (PropertyKind::Indexed(scalar), Some(_)) => Ok(BindTarget::Scalar(scalar)),
            _ => Err(shape_error(
                expression,
                "expression does not address a convertible value",
            )),
        }
    }
}

fn split_path(segments: &[Segment]) -> (&Segment, &[Segment]) {
    // 解析器保证路径至少一段
    let (terminal, intermediate) = segments.split_last().unwrap();
    (terminal, intermediate)
}

fn shape_error(expression: &str, reason: &str) -> Exception {
    Exception::UnsupportedShape {
        expression: expression.to_string(),
        reason: reason.to_string(),
    }
}

fn navigation_error(expression: &str, info: &TypeInfo, segment: &Segment) -> Exception {
    let reason = match segment.key {
        Some(_) => format!(
            "segment [{}] on type [{}] is not navigable with an index",
            segment.name, info.name
        ),
        None => format!(
            "segment [{}] on type [{}] cannot be navigated through",
            segment.name, info.name
        ),
    };
    shape_error(expression, &reason)
}
