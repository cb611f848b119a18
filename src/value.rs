//! # 动态值模型模块
//!
//! 该模块定义了绑定引擎内部流转的动态值 `Value`，以及描述目标叶子类型的
//! `ScalarType` 元数据。字符串参数经转换器注册表解析为 `Value`，再经
//! `Bindable` 能力接口写入强类型字段；读取方向则相反。
//!
//! 领域类型 `Money`（货币金额）与 `LocaleId`(区域标签）也定义于此。

use std::collections::BTreeMap;
use std::fmt;
use std::path::PathBuf;

use chrono::{NaiveDate, NaiveDateTime};

use crate::param::CURRENCY_DIGITS;

/// 用户自定义枚举的静态描述：类型名与按序排列的变体名。
///
/// 由 `scalar_enum!` 宏在编译期生成，枚举按名称参与字符串转换。
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EnumInfo {
    /// 枚举类型名
    pub name: &'static str,
    /// 变体名列表，下标即序数
    pub variants: &'static [&'static str],
}

/// 描述一个叶子目标类型。
///
/// 转换器注册表按该描述选择转换器；枚举变体携带其 `EnumInfo`，
/// 使单个枚举转换器可以服务任意枚举类型。
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScalarType {
    Bool,
    Char,
    Int,
    Long,
    Float,
    Double,
    Text,
    Date,
    DateTime,
    Locale,
    File,
    Money,
    Enum(&'static EnumInfo),
}

impl ScalarType {
    /// 返回无载荷的注册表键
    pub fn key(&self) -> TypeKey {
        match self {
            ScalarType::Bool => TypeKey::Bool,
            ScalarType::Char => TypeKey::Char,
            ScalarType::Int => TypeKey::Int,
            ScalarType::Long => TypeKey::Long,
            ScalarType::Float => TypeKey::Float,
            ScalarType::Double => TypeKey::Double,
            ScalarType::Text => TypeKey::Text,
            ScalarType::Date => TypeKey::Date,
            ScalarType::DateTime => TypeKey::DateTime,
            ScalarType::Locale => TypeKey::Locale,
            ScalarType::File => TypeKey::File,
            ScalarType::Money => TypeKey::Money,
            ScalarType::Enum(_) => TypeKey::Enum,
        }
    }

    /// 返回用于错误信息的类型名
    pub fn name(&self) -> &'static str {
        match self {
            ScalarType::Bool => "bool",
            ScalarType::Char => "char",
            ScalarType::Int => "i32",
            ScalarType::Long => "i64",
            ScalarType::Float => "f32",
            ScalarType::Double => "f64",
            ScalarType::Text => "String",
            ScalarType::Date => "NaiveDate",
            ScalarType::DateTime => "NaiveDateTime",
            ScalarType::Locale => "LocaleId",
            ScalarType::File => "PathBuf",
            ScalarType::Money => "Money",
            ScalarType::Enum(info) => info.name,
        }
    }
}

/// `ScalarType` 去掉载荷后的判别值，作为转换器注册表的键。
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TypeKey {
    Bool,
    Char,
    Int,
    Long,
    Float,
    Double,
    Text,
    Date,
    DateTime,
    Locale,
    File,
    Money,
    Enum,
}

/// 绑定引擎内部流转的动态值。
///
/// 标量变体与 `ScalarType` 一一对应；`Seq` 与 `Map` 承载直接可索引容器
/// 的整体读写。`Null` 表示缺失值（有序序列中的空洞也用它表示）。
#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    Null,
    Bool(bool),
    Char(char),
    Int(i32),
    Long(i64),
    Float(f32),
    Double(f64),
    Text(String),
    Date(NaiveDate),
    DateTime(NaiveDateTime),
    Locale(LocaleId),
    File(PathBuf),
    Money(Money),
    Enum(&'static EnumInfo, usize),
    Seq(Vec<Value>),
    Map(BTreeMap<String, Value>),
}

impl Value {
    /// 判断是否为缺失值
    pub fn is_null(&self) -> bool {
        matches!(self, Value::Null)
    }

    /// 返回用于错误信息的变体名
    pub fn kind_name(&self) -> &'static str {
        match self {
            Value::Null => "null",
            Value::Bool(_) => "bool",
            Value::Char(_) => "char",
            Value::Int(_) => "i32",
            Value::Long(_) => "i64",
            Value::Float(_) => "f32",
            Value::Double(_) => "f64",
            Value::Text(_) => "String",
            Value::Date(_) => "NaiveDate",
            Value::DateTime(_) => "NaiveDateTime",
            Value::Locale(_) => "LocaleId",
            Value::File(_) => "PathBuf",
            Value::Money(_) => "Money",
            Value::Enum(info, _) => info.name,
            Value::Seq(_) => "Seq",
            Value::Map(_) => "Map",
        }
    }
}

/// 货币金额，以最小货币单位（minor unit）的整数存储。
///
/// 小数位数由 `param::CURRENCY_DIGITS` 表按货币代码决定，
/// 避免二进制浮点数在金额上的精度问题。
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Money {
    minor: i64,
    currency: String,
}

impl Money {
    /// 以最小货币单位直接构造
    pub fn from_minor(minor: i64, currency: &str) -> Self {
        Self {
            minor,
            currency: currency.to_string(),
        }
    }

    /// 解析十进制金额文本（如 `12.34`），`digits` 为该货币的小数位数。
    ///
    /// 小数位超出货币精度、非数字字符或数值溢出均返回错误描述。
    pub fn parse(text: &str, currency: &str, digits: u32) -> Result<Self, String> {
        let trimmed = text.trim();
        let (negative, body) = match trimmed.strip_prefix('-') {
            Some(rest) => (true, rest),
            None => (false, trimmed),
        };
        let (int_part, frac_part) = match body.split_once('.') {
            Some((i, f)) => (i, f),
            None => (body, ""),
        };
        if int_part.is_empty() && frac_part.is_empty() {
            return Err("empty amount".to_string());
        }
        if !int_part.chars().all(|c| c.is_ascii_digit())
            || !frac_part.chars().all(|c| c.is_ascii_digit())
        {
            return Err("amount contains non-digit characters".to_string());
        }
        if frac_part.len() > digits as usize {
            return Err(format!(
                "more than {} fraction digits for currency {}",
                digits, currency
            ));
        }

        let mut units: i64 = 0;
        for c in int_part.chars() {
            units = units
                .checked_mul(10)
                .and_then(|u| u.checked_add((c as u8 - b'0') as i64))
                .ok_or_else(|| "amount out of range".to_string())?;
        }
        let mut frac: i64 = 0;
        for c in frac_part.chars() {
            frac = frac * 10 + (c as u8 - b'0') as i64;
        }
        // 不足的小数位补零到货币精度
        frac *= 10_i64.pow(digits - frac_part.len() as u32);

        let mut minor = units
            .checked_mul(10_i64.pow(digits))
            .and_then(|u| u.checked_add(frac))
            .ok_or_else(|| "amount out of range".to_string())?;
        if negative {
            minor = -minor;
        }
        Ok(Self {
            minor,
            currency: currency.to_string(),
        })
    }

    /// 格式化为十进制金额文本，与 `parse` 互逆
    pub fn format(&self) -> String {
        let digits = CURRENCY_DIGITS
            .get(self.currency.as_str())
            .copied()
            .unwrap_or(2);
        if digits == 0 {
            return self.minor.to_string();
        }
        let scale = 10_u64.pow(digits);
        let sign = if self.minor < 0 { "-" } else { "" };
        let abs = self.minor.unsigned_abs();
        format!(
            "{}{}.{:0width$}",
            sign,
            abs / scale,
            abs % scale,
            width = digits as usize
        )
    }

    pub fn minor(&self) -> i64 {
        self.minor
    }

    pub fn currency(&self) -> &str {
        &self.currency
    }
}

impl fmt::Display for Money {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {}", self.format(), self.currency)
    }
}

/// 区域标签：语言代码加可选的国家代码（`en`、`en_US`）。
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct LocaleId {
    language: String,
    country: Option<String>,
}

impl LocaleId {
    /// 解析 `en` 或 `en_US` 形式的区域标签
    pub fn parse(tag: &str) -> Result<Self, String> {
        let mut parts = tag.split('_');
        let language = parts.next().unwrap_or("");
        if language.len() < 2
            || language.len() > 3
            || !language.chars().all(|c| c.is_ascii_lowercase())
        {
            return Err(format!("invalid language code [{}]", language));
        }
        let country = match parts.next() {
            Some(c) => {
                if c.len() != 2 || !c.chars().all(|ch| ch.is_ascii_uppercase()) {
                    return Err(format!("invalid country code [{}]", c));
                }
                Some(c.to_string())
            }
            None => None,
        };
        if parts.next().is_some() {
            return Err(format!("too many components in locale tag [{}]", tag));
        }
        Ok(Self {
            language: language.to_string(),
            country,
        })
    }

    /// 返回 `en_US` 形式的标签文本
    pub fn tag(&self) -> String {
        match &self.country {
            Some(country) => format!("{}_{}", self.language, country),
            None => self.language.clone(),
        }
    }

    pub fn language(&self) -> &str {
        &self.language
    }

    pub fn country(&self) -> Option<&str> {
        self.country.as_deref()
    }
}

impl fmt::Display for LocaleId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.tag())
    }
}

/// 强类型字段与 `Value` 之间的双向转换能力。
///
/// `impl_bindable!` 宏生成的访问器通过该特性在字段类型与动态值之间转换；
/// 关联常量 `TYPE` 同时提供属性元数据中的声明类型。
pub trait Scalar: Sized + Clone {
    /// 该 Rust 类型对应的声明类型描述
    const TYPE: ScalarType;

    fn into_value(self) -> Value;

    fn from_value(value: &Value) -> Option<Self>;
}

impl Scalar for bool {
    const TYPE: ScalarType = ScalarType::Bool;

    fn into_value(self) -> Value {
        Value::Bool(self)
    }

    fn from_value(value: &Value) -> Option<Self> {
        match value {
            Value::Bool(v) => Some(*v),
            _ => None,
        }
    }
}

impl Scalar for char {
    const TYPE: ScalarType = ScalarType::Char;

    fn into_value(self) -> Value {
        Value::Char(self)
    }

    fn from_value(value: &Value) -> Option<Self> {
        match value {
            Value::Char(v) => Some(*v),
            _ => None,
        }
    }
}

impl Scalar for i32 {
    const TYPE: ScalarType = ScalarType::Int;

    fn into_value(self) -> Value {
        Value::Int(self)
    }

    fn from_value(value: &Value) -> Option<Self> {
        match value {
            Value::Int(v) => Some(*v),
            _ => None,
        }
    }
}

impl Scalar for i64 {
    const TYPE: ScalarType = ScalarType::Long;

    fn into_value(self) -> Value {
        Value::Long(self)
    }

    fn from_value(value: &Value) -> Option<Self> {
        match value {
            Value::Long(v) => Some(*v),
            _ => None,
        }
    }
}

impl Scalar for f32 {
    const TYPE: ScalarType = ScalarType::Float;

    fn into_value(self) -> Value {
        Value::Float(self)
    }

    fn from_value(value: &Value) -> Option<Self> {
        match value {
            Value::Float(v) => Some(*v),
            _ => None,
        }
    }
}

impl Scalar for f64 {
    const TYPE: ScalarType = ScalarType::Double;

    fn into_value(self) -> Value {
        Value::Double(self)
    }

    fn from_value(value: &Value) -> Option<Self> {
        match value {
            Value::Double(v) => Some(*v),
            _ => None,
        }
    }
}

impl Scalar for String {
    const TYPE: ScalarType = ScalarType::Text;

    fn into_value(self) -> Value {
        Value::Text(self)
    }

    fn from_value(value: &Value) -> Option<Self> {
        match value {
            Value::Text(v) => Some(v.clone()),
            _ => None,
        }
    }
}

impl Scalar for NaiveDate {
    const TYPE: ScalarType = ScalarType::Date;

    fn into_value(self) -> Value {
        Value::Date(self)
    }

    fn from_value(value: &Value) -> Option<Self> {
        match value {
            Value::Date(v) => Some(*v),
            _ => None,
        }
    }
}

impl Scalar for NaiveDateTime {
    const TYPE: ScalarType = ScalarType::DateTime;

    fn into_value(self) -> Value {
        Value::DateTime(self)
    }

    fn from_value(value: &Value) -> Option<Self> {
        match value {
            Value::DateTime(v) => Some(*v),
            _ => None,
        }
    }
}

impl Scalar for LocaleId {
    const TYPE: ScalarType = ScalarType::Locale;

    fn into_value(self) -> Value {
        Value::Locale(self)
    }

    fn from_value(value: &Value) -> Option<Self> {
        match value {
            Value::Locale(v) => Some(v.clone()),
            _ => None,
        }
    }
}

impl Scalar for PathBuf {
    const TYPE: ScalarType = ScalarType::File;

    fn into_value(self) -> Value {
        Value::File(self)
    }

    fn from_value(value: &Value) -> Option<Self> {
        match value {
            Value::File(v) => Some(v.clone()),
            _ => None,
        }
    }
}

impl Scalar for Money {
    const TYPE: ScalarType = ScalarType::Money;

    fn into_value(self) -> Value {
        Value::Money(self)
    }

    fn from_value(value: &Value) -> Option<Self> {
        match value {
            Value::Money(v) => Some(v.clone()),
            _ => None,
        }
    }
}

/// 定义一个按名称参与字符串转换的 C 风格枚举。
///
/// 生成枚举本体、静态 `EnumInfo` 描述以及 `Scalar` 实现，
/// 使其可以直接作为可绑定属性的声明类型使用。
#[macro_export]
macro_rules! scalar_enum {
    ($(#[$meta:meta])* $vis:vis enum $name:ident { $($variant:ident),+ $(,)? }) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq)]
        $vis enum $name {
            $($variant),+
        }

        impl $name {
            /// 编译期生成的枚举描述
            pub const INFO: $crate::value::EnumInfo = $crate::value::EnumInfo {
                name: stringify!($name),
                variants: &[$(stringify!($variant)),+],
            };

            /// 变体在声明顺序中的序数
            pub fn ordinal(&self) -> usize {
                *self as usize
            }

            /// 按序数还原变体
            pub fn from_ordinal(ordinal: usize) -> Option<Self> {
                [$($name::$variant),+].get(ordinal).copied()
            }
        }

        impl $crate::value::Scalar for $name {
            const TYPE: $crate::value::ScalarType =
                $crate::value::ScalarType::Enum(&$name::INFO);

            fn into_value(self) -> $crate::value::Value {
                $crate::value::Value::Enum(&$name::INFO, self as usize)
            }

            fn from_value(value: &$crate::value::Value) -> Option<Self> {
                match value {
                    $crate::value::Value::Enum(info, ordinal) if **info == $name::INFO => {
                        $name::from_ordinal(*ordinal)
                    }
                    _ => None,
                }
            }
        }
    };
}
