//! # 类型转换模块
//!
//! 该模块实现字符串参数与强类型值之间的双向转换：
//! 1. 转换器注册表（按目标类型分发）。
//! 2. 单值/多值与标量/序列之间的分发规则（单值按分隔符拆分到序列，
//!    多值逐个转换；多值合并进标量默认是配置错误）。
//! 3. 内置转换器家族：布尔、字符、数值（区域感知）、文本、枚举、
//!    日期/时间、区域、文件路径、货币金额。
//!
//! 所有转换器无状态且可被任意多线程并发使用。

use std::collections::{BTreeMap, HashMap};
use std::fmt::Write as _;
use std::path::PathBuf;
use std::sync::Arc;

use chrono::{NaiveDate, NaiveDateTime};

use crate::config::Config;
use crate::exception::Exception;
use crate::param::{
    locale_symbols, ATTR_CURRENCY_CODE, ATTR_DATE_TIME_FORMAT, ATTR_DELIMITER, ATTR_LOCALE,
    ATTR_PARENT_DIR, CURRENCY_DIGITS,
};
use crate::value::{LocaleId, Money, ScalarType, TypeKey, Value};

/// 随单次转换请求传入的动态属性（按键有序）。
pub type Attributes = BTreeMap<String, String>;

/// 描述一次转换的目标形状：标量或标量序列。
///
/// 数组与可增长列表在转换层共用 `Sequence`，二者的差异
/// （空洞填充与否）由求值器在写入层处理。
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BindTarget {
    Scalar(ScalarType),
    Sequence(ScalarType),
}

/// 单一目标类型的无状态转换策略。
///
/// 空缺值（空字符串、零个原始值）由注册表统一归一化为 `Value::Null`，
/// 转换器自身只处理非空文本；畸形文本必须以 `Exception::Conversion`
/// 失败而不是恐慌。
pub trait Converter: Send + Sync {
    /// 单个非空字符串到类型化值
    fn from_str(
        &self,
        target: &ScalarType,
        attributes: &Attributes,
        expression: &str,
        value: &str,
    ) -> Result<Value, Exception>;

    /// 多个原始字符串到单个标量。
    ///
    /// 多数类型不支持该形式，默认实现报告转换器状态错误
    /// （配置缺陷而非用户输入问题），绝不静默截断。
    fn from_strs(
        &self,
        target: &ScalarType,
        attributes: &Attributes,
        expression: &str,
        values: &[&str],
    ) -> Result<Value, Exception> {
        let _ = (target, attributes, values);
        Err(Exception::ConverterState {
            expression: expression.to_string(),
            reason: "multiple raw values cannot be combined into one scalar".to_string(),
        })
    }

    /// 类型化值到字符串（用于表单回显）。传入值保证非 Null。
    fn to_str(
        &self,
        target: &ScalarType,
        attributes: &Attributes,
        expression: &str,
        value: &Value,
    ) -> Result<String, Exception>;
}

/// 目标类型到转换器的注册表。
///
/// 启动时注册一次，此后只读，可被任意多请求线程共享。
pub struct ConverterRegistry {
    table: HashMap<TypeKey, Arc<dyn Converter>>,
    delimiter: String,
}

impl ConverterRegistry {
    /// 构造空注册表，`delimiter` 为序列转换的默认分隔符
    pub fn new(delimiter: &str) -> Self {
        Self {
            table: HashMap::new(),
            delimiter: delimiter.to_string(),
        }
    }

    /// 构造携带全部内置转换器的注册表，默认值取自配置
    pub fn with_builtins(config: &Config) -> Self {
        let mut registry = Self::new(config.array_delimiter());

        let number = Arc::new(NumberConverter {
            default_locale: config.default_locale().to_string(),
        });
        let datetime = Arc::new(DateTimeConverter {
            date_format: config.date_format().to_string(),
            datetime_format: config.datetime_format().to_string(),
        });

        registry.register(TypeKey::Bool, Arc::new(BoolConverter));
        registry.register(TypeKey::Char, Arc::new(CharConverter));
        registry.register(TypeKey::Int, number.clone());
        registry.register(TypeKey::Long, number.clone());
        registry.register(TypeKey::Float, number.clone());
        registry.register(TypeKey::Double, number);
        registry.register(TypeKey::Text, Arc::new(TextConverter));
        registry.register(TypeKey::Enum, Arc::new(EnumConverter));
        registry.register(TypeKey::Date, datetime.clone());
        registry.register(TypeKey::DateTime, datetime);
        registry.register(TypeKey::Locale, Arc::new(LocaleConverter));
        registry.register(TypeKey::File, Arc::new(FileConverter));
        registry.register(TypeKey::Money, Arc::new(MoneyConverter));
        registry
    }

    /// 注册或覆盖某个目标类型的转换器
    pub fn register(&mut self, key: TypeKey, converter: Arc<dyn Converter>) {
        self.table.insert(key, converter);
    }

    /// 查询目标类型对应的转换器
    pub fn converter_for(&self, target: &ScalarType) -> Option<&Arc<dyn Converter>> {
        self.table.get(&target.key())
    }

    fn required(
        &self,
        target: &ScalarType,
        expression: &str,
    ) -> Result<&Arc<dyn Converter>, Exception> {
        self.table
            .get(&target.key())
            .ok_or_else(|| Exception::UnsupportedShape {
                expression: expression.to_string(),
                reason: format!("no converter registered for type [{}]", target.name()),
            })
    }

    /// 原始字符串值到类型化值的统一入口。
    ///
    /// 分发规则：
    /// - 标量目标：零值 -> Null；单值走单值转换；多值走（罕见的）
    ///   多值合并转换。
    /// - 序列目标：单值按分隔符拆分后逐个转换；多值逐个转换、不再拆分；
    ///   零值得到空序列。
    /// - 空字符串一律视为缺失。
    pub fn convert_from_strings(
        &self,
        target: &BindTarget,
        attributes: &Attributes,
        expression: &str,
        values: &[&str],
    ) -> Result<Value, Exception> {
        match target {
            BindTarget::Scalar(scalar) => {
                let converter = self.required(scalar, expression)?;
                match values {
                    [] => Ok(Value::Null),
                    [single] => {
                        if single.is_empty() {
                            Ok(Value::Null)
                        } else {
                            converter.from_str(scalar, attributes, expression, single)
                        }
                    }
                    many => converter.from_strs(scalar, attributes, expression, many),
                }
            }
            BindTarget::Sequence(scalar) => {
                let converter = self.required(scalar, expression)?;
                let delimiter = attributes
                    .get(ATTR_DELIMITER)
                    .map(String::as_str)
                    .unwrap_or(&self.delimiter);
                let mut elements = Vec::new();
                match values {
                    [] => {}
                    [single] => {
                        // 单值拆分：空字符串产生空序列而不是单个空元素
                        if !single.is_empty() {
                            for part in single.split(delimiter) {
                                elements.push(self.component(
                                    converter, scalar, attributes, expression, part,
                                )?);
                            }
                        }
                    }
                    many => {
                        for part in many {
                            elements.push(self.component(
                                converter, scalar, attributes, expression, part,
                            )?);
                        }
                    }
                }
                Ok(Value::Seq(elements))
            }
        }
    }

    fn component(
        &self,
        converter: &Arc<dyn Converter>,
        scalar: &ScalarType,
        attributes: &Attributes,
        expression: &str,
        part: &str,
    ) -> Result<Value, Exception> {
        if part.is_empty() {
            Ok(Value::Null)
        } else {
            converter.from_str(scalar, attributes, expression, part)
        }
    }

    /// 类型化值到字符串的统一入口（`convert_from_strings` 的镜像）。
    ///
    /// Null 得到 `None`；序列按分隔符连接各分量的字符串形式。
    pub fn convert_to_string(
        &self,
        target: &BindTarget,
        attributes: &Attributes,
        expression: &str,
        value: &Value,
    ) -> Result<Option<String>, Exception> {
        if value.is_null() {
            return Ok(None);
        }
        match target {
            BindTarget::Scalar(scalar) => {
                let converter = self.required(scalar, expression)?;
                converter
                    .to_str(scalar, attributes, expression, value)
                    .map(Some)
            }
            BindTarget::Sequence(scalar) => {
                let converter = self.required(scalar, expression)?;
                let items = match value {
                    Value::Seq(items) => items,
                    other => {
                        return Err(Exception::ConverterState {
                            expression: expression.to_string(),
                            reason: format!(
                                "expected a sequence value, got [{}]",
                                other.kind_name()
                            ),
                        })
                    }
                };
                let delimiter = attributes
                    .get(ATTR_DELIMITER)
                    .map(String::as_str)
                    .unwrap_or(&self.delimiter);
                let mut parts = Vec::with_capacity(items.len());
                for item in items {
                    if item.is_null() {
                        parts.push(String::new());
                    } else {
                        parts.push(converter.to_str(scalar, attributes, expression, item)?);
                    }
                }
                Ok(Some(parts.join(delimiter)))
            }
        }
    }

    /// 当前生效的默认分隔符
    pub fn delimiter(&self) -> &str {
        &self.delimiter
    }
}

fn conversion(expression: &str, value: &str, reason: String) -> Exception {
    Exception::Conversion {
        expression: expression.to_string(),
        value: value.to_string(),
        reason,
    }
}

fn mismatch(expression: &str, expected: &str, value: &Value) -> Exception {
    Exception::ConverterState {
        expression: expression.to_string(),
        reason: format!(
            "expected a {} value, got [{}]",
            expected,
            value.kind_name()
        ),
    }
}

// --- 内置转换器实现 ---

/// 布尔转换器：只接受大小写不敏感的 true/false
pub struct BoolConverter;

impl Converter for BoolConverter {
    fn from_str(
        &self,
        _target: &ScalarType,
        _attributes: &Attributes,
        expression: &str,
        value: &str,
    ) -> Result<Value, Exception> {
        match value.to_ascii_lowercase().as_str() {
            "true" => Ok(Value::Bool(true)),
            "false" => Ok(Value::Bool(false)),
            _ => Err(conversion(
                expression,
                value,
                "expected true or false".to_string(),
            )),
        }
    }

    fn to_str(
        &self,
        _target: &ScalarType,
        _attributes: &Attributes,
        expression: &str,
        value: &Value,
    ) -> Result<String, Exception> {
        match value {
            Value::Bool(v) => Ok(v.to_string()),
            other => Err(mismatch(expression, "bool", other)),
        }
    }
}

/// 字符转换器：恰好一个字符的文本
pub struct CharConverter;

impl Converter for CharConverter {
    fn from_str(
        &self,
        _target: &ScalarType,
        _attributes: &Attributes,
        expression: &str,
        value: &str,
    ) -> Result<Value, Exception> {
        let mut chars = value.chars();
        match (chars.next(), chars.next()) {
            (Some(c), None) => Ok(Value::Char(c)),
            _ => Err(conversion(
                expression,
                value,
                "expected exactly one character".to_string(),
            )),
        }
    }

    fn to_str(
        &self,
        _target: &ScalarType,
        _attributes: &Attributes,
        expression: &str,
        value: &Value,
    ) -> Result<String, Exception> {
        match value {
            Value::Char(c) => Ok(c.to_string()),
            other => Err(mismatch(expression, "char", other)),
        }
    }
}

/// 数值转换器，按 `locale` 动态属性感知区域符号。
///
/// 解析前移除分组符号并把区域小数点归一化为 `.`；
/// 格式化时按同一区域输出小数点符号，保证往返一致。
pub struct NumberConverter {
    default_locale: String,
}

impl NumberConverter {
    fn symbols(&self, attributes: &Attributes) -> (char, char) {
        let tag = attributes
            .get(ATTR_LOCALE)
            .map(String::as_str)
            .unwrap_or(&self.default_locale);
        locale_symbols(tag)
    }

    fn normalize(&self, attributes: &Attributes, raw: &str) -> String {
        let (decimal, group) = self.symbols(attributes);
        raw.chars()
            .filter(|c| *c != group)
            .map(|c| if c == decimal { '.' } else { c })
            .collect()
    }

    fn localize(&self, attributes: &Attributes, plain: String) -> String {
        let (decimal, _) = self.symbols(attributes);
        if decimal == '.' {
            plain
        } else {
            plain.replace('.', &decimal.to_string())
        }
    }
}

impl Converter for NumberConverter {
    fn from_str(
        &self,
        target: &ScalarType,
        attributes: &Attributes,
        expression: &str,
        value: &str,
    ) -> Result<Value, Exception> {
        let text = self.normalize(attributes, value);
        match target {
            ScalarType::Int => text
                .parse::<i32>()
                .map(Value::Int)
                .map_err(|e| conversion(expression, value, e.to_string())),
            ScalarType::Long => text
                .parse::<i64>()
                .map(Value::Long)
                .map_err(|e| conversion(expression, value, e.to_string())),
            ScalarType::Float => text
                .parse::<f32>()
                .map(Value::Float)
                .map_err(|e| conversion(expression, value, e.to_string())),
            ScalarType::Double => text
                .parse::<f64>()
                .map(Value::Double)
                .map_err(|e| conversion(expression, value, e.to_string())),
            other => Err(Exception::ConverterState {
                expression: expression.to_string(),
                reason: format!(
                    "number converter invoked for non-numeric type [{}]",
                    other.name()
                ),
            }),
        }
    }

    fn to_str(
        &self,
        _target: &ScalarType,
        attributes: &Attributes,
        expression: &str,
        value: &Value,
    ) -> Result<String, Exception> {
        let plain = match value {
            Value::Int(v) => v.to_string(),
            Value::Long(v) => v.to_string(),
            Value::Float(v) => v.to_string(),
            Value::Double(v) => v.to_string(),
            other => return Err(mismatch(expression, "numeric", other)),
        };
        Ok(self.localize(attributes, plain))
    }
}

/// 文本转换器：恒等转换
pub struct TextConverter;

impl Converter for TextConverter {
    fn from_str(
        &self,
        _target: &ScalarType,
        _attributes: &Attributes,
        _expression: &str,
        value: &str,
    ) -> Result<Value, Exception> {
        Ok(Value::Text(value.to_string()))
    }

    fn to_str(
        &self,
        _target: &ScalarType,
        _attributes: &Attributes,
        expression: &str,
        value: &Value,
    ) -> Result<String, Exception> {
        match value {
            Value::Text(v) => Ok(v.clone()),
            other => Err(mismatch(expression, "text", other)),
        }
    }
}

/// 枚举转换器：按变体名精确匹配，服务所有 `scalar_enum!` 枚举
pub struct EnumConverter;

impl Converter for EnumConverter {
    fn from_str(
        &self,
        target: &ScalarType,
        _attributes: &Attributes,
        expression: &str,
        value: &str,
    ) -> Result<Value, Exception> {
        let info = match target {
            ScalarType::Enum(info) => *info,
            other => {
                return Err(Exception::ConverterState {
                    expression: expression.to_string(),
                    reason: format!(
                        "enum converter invoked for non-enum type [{}]",
                        other.name()
                    ),
                })
            }
        };
        match info.variants.iter().position(|v| *v == value) {
            Some(ordinal) => Ok(Value::Enum(info, ordinal)),
            None => Err(conversion(
                expression,
                value,
                format!("no variant named [{}] on enum [{}]", value, info.name),
            )),
        }
    }

    fn to_str(
        &self,
        _target: &ScalarType,
        _attributes: &Attributes,
        expression: &str,
        value: &Value,
    ) -> Result<String, Exception> {
        match value {
            Value::Enum(info, ordinal) => {
                info.variants
                    .get(*ordinal)
                    .map(|v| v.to_string())
                    .ok_or_else(|| Exception::ConverterState {
                        expression: expression.to_string(),
                        reason: format!(
                            "ordinal [{}] out of range for enum [{}]",
                            ordinal, info.name
                        ),
                    })
            }
            other => Err(mismatch(expression, "enum", other)),
        }
    }
}

/// 日期/时间转换器，格式串可被 `dateTimeFormat` 动态属性覆盖
pub struct DateTimeConverter {
    date_format: String,
    datetime_format: String,
}

impl DateTimeConverter {
    fn format_for<'a>(&'a self, target: &ScalarType, attributes: &'a Attributes) -> &'a str {
        if let Some(custom) = attributes.get(ATTR_DATE_TIME_FORMAT) {
            return custom;
        }
        match target {
            ScalarType::DateTime => &self.datetime_format,
            _ => &self.date_format,
        }
    }
}

impl Converter for DateTimeConverter {
    fn from_str(
        &self,
        target: &ScalarType,
        attributes: &Attributes,
        expression: &str,
        value: &str,
    ) -> Result<Value, Exception> {
        let format = self.format_for(target, attributes);
        match target {
            ScalarType::Date => NaiveDate::parse_from_str(value, format)
                .map(Value::Date)
                .map_err(|e| conversion(expression, value, e.to_string())),
            ScalarType::DateTime => NaiveDateTime::parse_from_str(value, format)
                .map(Value::DateTime)
                .map_err(|e| conversion(expression, value, e.to_string())),
            other => Err(Exception::ConverterState {
                expression: expression.to_string(),
                reason: format!(
                    "date converter invoked for non-date type [{}]",
                    other.name()
                ),
            }),
        }
    }

    fn to_str(
        &self,
        target: &ScalarType,
        attributes: &Attributes,
        expression: &str,
        value: &Value,
    ) -> Result<String, Exception> {
        let format = self.format_for(target, attributes);
        let mut out = String::new();
        let result = match value {
            Value::Date(d) => write!(out, "{}", d.format(format)),
            Value::DateTime(d) => write!(out, "{}", d.format(format)),
            other => return Err(mismatch(expression, "date", other)),
        };
        // 非法格式串在渲染时才会暴露，按配置缺陷处理
        result.map_err(|_| Exception::ConverterState {
            expression: expression.to_string(),
            reason: format!("invalid date format [{}]", format),
        })?;
        Ok(out)
    }
}

/// 区域转换器：`en` / `en_US` 形式的标签
pub struct LocaleConverter;

impl Converter for LocaleConverter {
    fn from_str(
        &self,
        _target: &ScalarType,
        _attributes: &Attributes,
        expression: &str,
        value: &str,
    ) -> Result<Value, Exception> {
        LocaleId::parse(value)
            .map(Value::Locale)
            .map_err(|reason| conversion(expression, value, reason))
    }

    fn to_str(
        &self,
        _target: &ScalarType,
        _attributes: &Attributes,
        expression: &str,
        value: &Value,
    ) -> Result<String, Exception> {
        match value {
            Value::Locale(l) => Ok(l.tag()),
            other => Err(mismatch(expression, "locale", other)),
        }
    }
}

/// 文件路径转换器，相对路径可由 `parentDir` 动态属性补全父目录
pub struct FileConverter;

impl Converter for FileConverter {
    fn from_str(
        &self,
        _target: &ScalarType,
        attributes: &Attributes,
        _expression: &str,
        value: &str,
    ) -> Result<Value, Exception> {
        let path = PathBuf::from(value);
        let resolved = match attributes.get(ATTR_PARENT_DIR) {
            Some(parent) if path.is_relative() => PathBuf::from(parent).join(path),
            _ => path,
        };
        Ok(Value::File(resolved))
    }

    fn to_str(
        &self,
        _target: &ScalarType,
        _attributes: &Attributes,
        expression: &str,
        value: &Value,
    ) -> Result<String, Exception> {
        match value {
            Value::File(p) => Ok(p.to_string_lossy().into_owned()),
            other => Err(mismatch(expression, "file", other)),
        }
    }
}

/// 货币转换器。
///
/// `currencyCode` 动态属性缺失或不在货币表中都属于转换器状态错误
/// （调用方缺陷）；金额文本本身畸形才是转换错误（用户输入）。
pub struct MoneyConverter;

impl MoneyConverter {
    fn currency<'a>(
        attributes: &'a Attributes,
        expression: &str,
    ) -> Result<(&'a str, u32), Exception> {
        let code = attributes
            .get(ATTR_CURRENCY_CODE)
            .ok_or_else(|| Exception::ConverterState {
                expression: expression.to_string(),
                reason: format!(
                    "money conversion requires the [{}] dynamic attribute",
                    ATTR_CURRENCY_CODE
                ),
            })?;
        let digits = CURRENCY_DIGITS
            .get(code.as_str())
            .ok_or_else(|| Exception::ConverterState {
                expression: expression.to_string(),
                reason: format!("unknown currency code [{}]", code),
            })?;
        Ok((code, *digits))
    }
}

impl Converter for MoneyConverter {
    fn from_str(
        &self,
        _target: &ScalarType,
        attributes: &Attributes,
        expression: &str,
        value: &str,
    ) -> Result<Value, Exception> {
        let (code, digits) = Self::currency(attributes, expression)?;
        Money::parse(value, code, digits)
            .map(Value::Money)
            .map_err(|reason| conversion(expression, value, reason))
    }

    fn to_str(
        &self,
        _target: &ScalarType,
        _attributes: &Attributes,
        expression: &str,
        value: &Value,
    ) -> Result<String, Exception> {
        match value {
            Value::Money(m) => Ok(m.format()),
            other => Err(mismatch(expression, "money", other)),
        }
    }
}
