// Copyright (c) 2026 shaneyale (shaneyale86@gmail.com)
// All rights reserved.

//! # 可绑定能力接口模块
//!
//! 该模块是绑定引擎与强类型对象图之间的接缝，定义了：
//! 1. `Bindable` 能力接口：按属性名读写叶子值、按索引/键访问容器元素、
//!    沿对象图向下导航（带按需实例化）。
//! 2. `TypeInfo` / `PropertyInfo` / `PropertyKind` 编译期元数据：
//!    每个属性的访问器种类在派生时确定一次，运行期绝不重新探测。
//! 3. `impl_bindable!` 宏：从字段清单派生完整的 `Bindable` 实现，
//!    代替逐类型手写访问器。
//!
//! ## 访问器种类
//! - `scalar`：`Option<T>` 字段，整体读写。
//! - `array`：`Vec<T>` 字段，整体转换绑定，按界内索引读写，不补洞。
//! - `list`：`Vec<Option<T>>` 字段，索引写越界时以 `None` 补洞增长。
//! - `map`：`BTreeMap<String, T>` 字段，按键读写，写入时按需建项。
//! - `object` / `object_list` / `object_map`：嵌套对象及其容器，
//!   写路径上按需以 `Default` 实例化。
//! - `indexed` / `indexed_object`：索引 bean 属性——不通过容器类型而是
//!   通过带键的取值/设值方法对暴露的属性。

use std::any::Any;

use crate::exception::Exception;
use crate::path::Key;
use crate::value::{Scalar, ScalarType, Value};

/// 一个可绑定类型的静态描述：类型名与属性表。
///
/// 由 `impl_bindable!` 在编译期生成，进程生命周期内只读，
/// 可被任意多请求线程并发查询。
#[derive(Debug)]
pub struct TypeInfo {
    /// 类型名，用于错误信息
    pub name: &'static str,
    /// 按声明顺序排列的属性表
    pub properties: &'static [PropertyInfo],
}

impl TypeInfo {
    /// 按名称查找属性元数据
    pub fn property(&self, name: &str) -> Option<&PropertyInfo> {
        self.properties.iter().find(|p| p.name == name)
    }
}

/// 单个命名属性的元数据：名称与访问器种类。
#[derive(Debug)]
pub struct PropertyInfo {
    pub name: &'static str,
    pub kind: PropertyKind,
}

/// 属性的访问器种类，派生时确定一次。
///
/// 标量载荷记录声明的叶子类型（容器记录元素类型），
/// 求值器据此向转换器注册表请求正确的目标转换。
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PropertyKind {
    /// 普通标量属性
    Scalar(ScalarType),
    /// 定长语义的标量数组（整体绑定，不补洞）
    Array(ScalarType),
    /// 可增长的标量序列（索引写入时以空洞补齐）
    List(ScalarType),
    /// 键值映射，值为标量
    Map(ScalarType),
    /// 索引 bean 属性，元素为标量
    Indexed(ScalarType),
    /// 嵌套对象
    Object,
    /// 嵌套对象的可增长序列
    ObjectList,
    /// 嵌套对象的键值映射
    ObjectMap,
    /// 索引 bean 属性，元素为嵌套对象
    IndexedObject,
}

/// 对象图节点的能力接口。
///
/// 求值器完全通过该接口操作对象图：它不了解任何具体类型，
/// 依据 `TypeInfo` 元数据选择正确的方法族。实现通常由
/// `impl_bindable!` 派生。
pub trait Bindable: Any {
    /// 该类型的静态元数据
    fn type_info(&self) -> &'static TypeInfo;

    fn as_any(&self) -> &dyn Any;

    fn as_any_mut(&mut self) -> &mut dyn Any;

    /// 整体读取一个标量或标量容器属性；未设置的值返回 `None`
    fn read(&self, property: &str) -> Result<Option<Value>, Exception>;

    /// 整体写入一个标量或标量容器属性；`Value::Null` 清空标量
    fn write(&mut self, property: &str, value: Value) -> Result<(), Exception>;

    /// 读取直接可索引容器的单个元素
    fn read_element(&self, property: &str, key: &Key) -> Result<Option<Value>, Exception>;

    /// 写入直接可索引容器的单个元素
    fn write_element(&mut self, property: &str, key: &Key, value: Value)
        -> Result<(), Exception>;

    /// 经索引取值方法读取索引 bean 属性的元素
    fn read_indexed(&self, property: &str, key: &Key) -> Result<Option<Value>, Exception>;

    /// 经索引设值方法写入索引 bean 属性的元素（值已完成转换）
    fn write_indexed(&mut self, property: &str, key: &Key, value: Value)
        -> Result<(), Exception>;

    /// 导航到嵌套对象；缺失时返回 `None`，从不实例化
    fn child(&self, property: &str) -> Result<Option<&dyn Bindable>, Exception>;

    /// 可变导航到嵌套对象；`create` 为真时按需以默认值实例化
    fn child_mut(
        &mut self,
        property: &str,
        create: bool,
    ) -> Result<Option<&mut dyn Bindable>, Exception>;

    /// 导航到对象容器或索引对象属性中的某个元素
    fn child_element(&self, property: &str, key: &Key) -> Result<Option<&dyn Bindable>, Exception>;

    /// 可变导航到对象容器或索引对象属性中的某个元素，
    /// `create` 为真时按需建项/补洞并实例化
    fn child_element_mut(
        &mut self,
        property: &str,
        key: &Key,
        create: bool,
    ) -> Result<Option<&mut dyn Bindable>, Exception>;
}

// --- 宏展开使用的辅助函数 ---

/// 构造"属性不存在"错误
pub fn unknown_property(info: &TypeInfo, property: &str) -> Exception {
    Exception::NoSuchProperty {
        type_name: info.name.to_string(),
        property: property.to_string(),
    }
}

/// 构造"属性不支持该访问方式"错误
pub fn wrong_shape(info: &TypeInfo, property: &str, operation: &str) -> Exception {
    Exception::UnsupportedShape {
        expression: format!("{}.{}", info.name, property),
        reason: format!("property does not support {}", operation),
    }
}

/// 将动态值还原为字段类型；种类不符说明求值器与元数据脱节，按配置缺陷处理
pub fn expect_scalar<T: Scalar>(
    info: &TypeInfo,
    property: &str,
    value: Value,
) -> Result<T, Exception> {
    T::from_value(&value).ok_or_else(|| Exception::ConverterState {
        expression: format!("{}.{}", info.name, property),
        reason: format!(
            "expected a [{}] value, got [{}]",
            T::TYPE.name(),
            value.kind_name()
        ),
    })
}

/// 期望一个序列值
pub fn expect_seq(info: &TypeInfo, property: &str, value: Value) -> Result<Vec<Value>, Exception> {
    match value {
        Value::Seq(items) => Ok(items),
        other => Err(Exception::ConverterState {
            expression: format!("{}.{}", info.name, property),
            reason: format!("expected a sequence value, got [{}]", other.kind_name()),
        }),
    }
}

/// 序列/数组的键必须是数字索引
pub fn expect_index(info: &TypeInfo, property: &str, key: &Key) -> Result<usize, Exception> {
    match key {
        Key::Index(i) => Ok(*i),
        Key::Name(name) => Err(Exception::Conversion {
            expression: format!("{}.{}", info.name, property),
            value: name.clone(),
            reason: "sequence index must be numeric".to_string(),
        }),
    }
}

/// 映射键：名字直接使用，数字索引转为其十进制文本
pub fn map_key(key: &Key) -> String {
    match key {
        Key::Index(i) => i.to_string(),
        Key::Name(name) => name.clone(),
    }
}

/// 数组（非增长序列）的越界写入
pub fn index_out_of_range(
    info: &TypeInfo,
    property: &str,
    index: usize,
    len: usize,
) -> Exception {
    Exception::Conversion {
        expression: format!("{}.{}", info.name, property),
        value: index.to_string(),
        reason: format!("index out of range for array of length {}", len),
    }
}

/// 数组元素不允许为空洞
pub fn null_element(info: &TypeInfo, property: &str) -> Exception {
    Exception::ConverterState {
        expression: format!("{}.{}", info.name, property),
        reason: "array elements cannot be null".to_string(),
    }
}

/// 从字段清单派生 `Bindable` 实现。
///
/// 字段种类与期望的字段类型：
///
/// ```text
/// impl_bindable! {
///     UserForm {
///         scalar name: String;                     // Option<String>
///         scalar age: i32;                         // Option<i32>
///         array tags: String;                      // Vec<String>
///         list scores: i64;                        // Vec<Option<i64>>
///         map labels: String;                      // BTreeMap<String, String>
///         object address: Address;                 // Option<Address>
///         object_list lines: LineItem;             // Vec<Option<LineItem>>
///         object_map addresses: Address;           // BTreeMap<String, Address>
///         indexed pref: String => pref_at, set_pref_at;
///         indexed_object room: Room => room_at, room_at_mut;
///     }
/// }
/// ```
///
/// `indexed` 要求类型上存在
/// `fn pref_at(&self, key: &Key) -> Option<String>` 与
/// `fn set_pref_at(&mut self, key: &Key, value: Option<String>)`；
/// `indexed_object` 要求
/// `fn room_at(&self, key: &Key) -> Option<&Room>` 与
/// `fn room_at_mut(&mut self, key: &Key, create: bool) -> Option<&mut Room>`。
#[macro_export]
macro_rules! impl_bindable {
    ($ty:ident { $( $kind:ident $field:ident : $ftype:ty $(=> $acc1:ident, $acc2:ident)? ; )* }) => {
        impl $crate::bindable::Bindable for $ty {
            fn type_info(&self) -> &'static $crate::bindable::TypeInfo {
                static INFO: $crate::bindable::TypeInfo = $crate::bindable::TypeInfo {
                    name: stringify!($ty),
                    properties: &[
                        $($crate::impl_bindable!(@info $kind $field : $ftype)),*
                    ],
                };
                &INFO
            }

            fn as_any(&self) -> &dyn ::std::any::Any {
                self
            }

            fn as_any_mut(&mut self) -> &mut dyn ::std::any::Any {
                self
            }

            fn read(
                &self,
                property: &str,
            ) -> Result<Option<$crate::value::Value>, $crate::exception::Exception> {
                $($crate::impl_bindable!(@read self, property, $kind $field : $ftype $(=> $acc1, $acc2)?);)*
                Err($crate::bindable::unknown_property(self.type_info(), property))
            }

            fn write(
                &mut self,
                property: &str,
                value: $crate::value::Value,
            ) -> Result<(), $crate::exception::Exception> {
                $($crate::impl_bindable!(@write self, property, value, $kind $field : $ftype $(=> $acc1, $acc2)?);)*
                Err($crate::bindable::unknown_property(self.type_info(), property))
            }

            fn read_element(
                &self,
                property: &str,
                key: &$crate::path::Key,
            ) -> Result<Option<$crate::value::Value>, $crate::exception::Exception> {
                $($crate::impl_bindable!(@read_element self, property, key, $kind $field : $ftype $(=> $acc1, $acc2)?);)*
                Err($crate::bindable::unknown_property(self.type_info(), property))
            }

            fn write_element(
                &mut self,
                property: &str,
                key: &$crate::path::Key,
                value: $crate::value::Value,
            ) -> Result<(), $crate::exception::Exception> {
                $($crate::impl_bindable!(@write_element self, property, key, value, $kind $field : $ftype $(=> $acc1, $acc2)?);)*
                Err($crate::bindable::unknown_property(self.type_info(), property))
            }

            fn read_indexed(
                &self,
                property: &str,
                key: &$crate::path::Key,
            ) -> Result<Option<$crate::value::Value>, $crate::exception::Exception> {
                $($crate::impl_bindable!(@read_indexed self, property, key, $kind $field : $ftype $(=> $acc1, $acc2)?);)*
                Err($crate::bindable::unknown_property(self.type_info(), property))
            }

            fn write_indexed(
                &mut self,
                property: &str,
                key: &$crate::path::Key,
                value: $crate::value::Value,
            ) -> Result<(), $crate::exception::Exception> {
                $($crate::impl_bindable!(@write_indexed self, property, key, value, $kind $field : $ftype $(=> $acc1, $acc2)?);)*
                Err($crate::bindable::unknown_property(self.type_info(), property))
            }

            fn child(
                &self,
                property: &str,
            ) -> Result<Option<&dyn $crate::bindable::Bindable>, $crate::exception::Exception> {
                $($crate::impl_bindable!(@child self, property, $kind $field : $ftype $(=> $acc1, $acc2)?);)*
                Err($crate::bindable::unknown_property(self.type_info(), property))
            }

            fn child_mut(
                &mut self,
                property: &str,
                create: bool,
            ) -> Result<Option<&mut dyn $crate::bindable::Bindable>, $crate::exception::Exception>
            {
                $($crate::impl_bindable!(@child_mut self, property, create, $kind $field : $ftype $(=> $acc1, $acc2)?);)*
                Err($crate::bindable::unknown_property(self.type_info(), property))
            }

            fn child_element(
                &self,
                property: &str,
                key: &$crate::path::Key,
            ) -> Result<Option<&dyn $crate::bindable::Bindable>, $crate::exception::Exception> {
                $($crate::impl_bindable!(@child_element self, property, key, $kind $field : $ftype $(=> $acc1, $acc2)?);)*
                Err($crate::bindable::unknown_property(self.type_info(), property))
            }

            fn child_element_mut(
                &mut self,
                property: &str,
                key: &$crate::path::Key,
                create: bool,
            ) -> Result<Option<&mut dyn $crate::bindable::Bindable>, $crate::exception::Exception>
            {
                $($crate::impl_bindable!(@child_element_mut self, property, key, create, $kind $field : $ftype $(=> $acc1, $acc2)?);)*
                Err($crate::bindable::unknown_property(self.type_info(), property))
            }
        }
    };

    // --- 属性元数据 ---

    (@info scalar $field:ident : $ftype:ty) => {
        $crate::bindable::PropertyInfo {
            name: stringify!($field),
            kind: $crate::bindable::PropertyKind::Scalar(
                <$ftype as $crate::value::Scalar>::TYPE,
            ),
        }
    };
    (@info array $field:ident : $ftype:ty) => {
        $crate::bindable::PropertyInfo {
            name: stringify!($field),
            kind: $crate::bindable::PropertyKind::Array(
                <$ftype as $crate::value::Scalar>::TYPE,
            ),
        }
    };
    (@info list $field:ident : $ftype:ty) => {
        $crate::bindable::PropertyInfo {
            name: stringify!($field),
            kind: $crate::bindable::PropertyKind::List(
                <$ftype as $crate::value::Scalar>::TYPE,
            ),
        }
    };
    (@info map $field:ident : $ftype:ty) => {
        $crate::bindable::PropertyInfo {
            name: stringify!($field),
            kind: $crate::bindable::PropertyKind::Map(
                <$ftype as $crate::value::Scalar>::TYPE,
            ),
        }
    };
    (@info indexed $field:ident : $ftype:ty) => {
        $crate::bindable::PropertyInfo {
            name: stringify!($field),
            kind: $crate::bindable::PropertyKind::Indexed(
                <$ftype as $crate::value::Scalar>::TYPE,
            ),
        }
    };
    (@info object $field:ident : $ftype:ty) => {
        $crate::bindable::PropertyInfo {
            name: stringify!($field),
            kind: $crate::bindable::PropertyKind::Object,
        }
    };
    (@info object_list $field:ident : $ftype:ty) => {
        $crate::bindable::PropertyInfo {
            name: stringify!($field),
            kind: $crate::bindable::PropertyKind::ObjectList,
        }
    };
    (@info object_map $field:ident : $ftype:ty) => {
        $crate::bindable::PropertyInfo {
            name: stringify!($field),
            kind: $crate::bindable::PropertyKind::ObjectMap,
        }
    };
    (@info indexed_object $field:ident : $ftype:ty) => {
        $crate::bindable::PropertyInfo {
            name: stringify!($field),
            kind: $crate::bindable::PropertyKind::IndexedObject,
        }
    };

    // --- 整体读取 ---

    (@read $self:ident, $prop:ident, scalar $field:ident : $ftype:ty) => {
        if $prop == stringify!($field) {
            return Ok($self
                .$field
                .clone()
                .map(|v| $crate::value::Scalar::into_value(v)));
        }
    };
    (@read $self:ident, $prop:ident, array $field:ident : $ftype:ty) => {
        if $prop == stringify!($field) {
            return Ok(Some($crate::value::Value::Seq(
                $self
                    .$field
                    .iter()
                    .map(|v| $crate::value::Scalar::into_value(v.clone()))
                    .collect(),
            )));
        }
    };
    (@read $self:ident, $prop:ident, list $field:ident : $ftype:ty) => {
        if $prop == stringify!($field) {
            return Ok(Some($crate::value::Value::Seq(
                $self
                    .$field
                    .iter()
                    .map(|slot| match slot {
                        Some(v) => $crate::value::Scalar::into_value(v.clone()),
                        None => $crate::value::Value::Null,
                    })
                    .collect(),
            )));
        }
    };
    (@read $self:ident, $prop:ident, map $field:ident : $ftype:ty) => {
        if $prop == stringify!($field) {
            return Ok(Some($crate::value::Value::Map(
                $self
                    .$field
                    .iter()
                    .map(|(k, v)| (k.clone(), $crate::value::Scalar::into_value(v.clone())))
                    .collect(),
            )));
        }
    };
    (@read $self:ident, $prop:ident, $other:ident $field:ident : $ftype:ty $(=> $a:ident, $b:ident)?) => {
        if $prop == stringify!($field) {
            return Err($crate::bindable::wrong_shape(
                $self.type_info(),
                $prop,
                "whole-value read",
            ));
        }
    };

    // --- 整体写入 ---

    (@write $self:ident, $prop:ident, $value:ident, scalar $field:ident : $ftype:ty) => {
        if $prop == stringify!($field) {
            $self.$field = match $value {
                $crate::value::Value::Null => None,
                other => Some($crate::bindable::expect_scalar::<$ftype>(
                    $self.type_info(),
                    $prop,
                    other,
                )?),
            };
            return Ok(());
        }
    };
    (@write $self:ident, $prop:ident, $value:ident, array $field:ident : $ftype:ty) => {
        if $prop == stringify!($field) {
            let items = $crate::bindable::expect_seq($self.type_info(), $prop, $value)?;
            let mut elements: Vec<$ftype> = Vec::with_capacity(items.len());
            for item in items {
                match item {
                    $crate::value::Value::Null => {
                        return Err($crate::bindable::null_element($self.type_info(), $prop))
                    }
                    other => elements.push($crate::bindable::expect_scalar::<$ftype>(
                        $self.type_info(),
                        $prop,
                        other,
                    )?),
                }
            }
            $self.$field = elements;
            return Ok(());
        }
    };
    (@write $self:ident, $prop:ident, $value:ident, list $field:ident : $ftype:ty) => {
        if $prop == stringify!($field) {
            let items = $crate::bindable::expect_seq($self.type_info(), $prop, $value)?;
            let mut elements: Vec<Option<$ftype>> = Vec::with_capacity(items.len());
            for item in items {
                match item {
                    $crate::value::Value::Null => elements.push(None),
                    other => elements.push(Some($crate::bindable::expect_scalar::<$ftype>(
                        $self.type_info(),
                        $prop,
                        other,
                    )?)),
                }
            }
            $self.$field = elements;
            return Ok(());
        }
    };
    (@write $self:ident, $prop:ident, $value:ident, $other:ident $field:ident : $ftype:ty $(=> $a:ident, $b:ident)?) => {
        if $prop == stringify!($field) {
            return Err($crate::bindable::wrong_shape(
                $self.type_info(),
                $prop,
                "whole-value write",
            ));
        }
    };

    // --- 容器元素读取 ---

    (@read_element $self:ident, $prop:ident, $key:ident, array $field:ident : $ftype:ty) => {
        if $prop == stringify!($field) {
            let index = $crate::bindable::expect_index($self.type_info(), $prop, $key)?;
            return Ok($self
                .$field
                .get(index)
                .cloned()
                .map(|v| $crate::value::Scalar::into_value(v)));
        }
    };
    (@read_element $self:ident, $prop:ident, $key:ident, list $field:ident : $ftype:ty) => {
        if $prop == stringify!($field) {
            let index = $crate::bindable::expect_index($self.type_info(), $prop, $key)?;
            return Ok($self
                .$field
                .get(index)
                .cloned()
                .flatten()
                .map(|v| $crate::value::Scalar::into_value(v)));
        }
    };
    (@read_element $self:ident, $prop:ident, $key:ident, map $field:ident : $ftype:ty) => {
        if $prop == stringify!($field) {
            let map_key = $crate::bindable::map_key($key);
            return Ok($self
                .$field
                .get(&map_key)
                .cloned()
                .map(|v| $crate::value::Scalar::into_value(v)));
        }
    };
    (@read_element $self:ident, $prop:ident, $key:ident, $other:ident $field:ident : $ftype:ty $(=> $a:ident, $b:ident)?) => {
        if $prop == stringify!($field) {
            return Err($crate::bindable::wrong_shape(
                $self.type_info(),
                $prop,
                "element read",
            ));
        }
    };

    // --- 容器元素写入 ---

    (@write_element $self:ident, $prop:ident, $key:ident, $value:ident, array $field:ident : $ftype:ty) => {
        if $prop == stringify!($field) {
            let index = $crate::bindable::expect_index($self.type_info(), $prop, $key)?;
            if index >= $self.$field.len() {
                return Err($crate::bindable::index_out_of_range(
                    $self.type_info(),
                    $prop,
                    index,
                    $self.$field.len(),
                ));
            }
            match $value {
                $crate::value::Value::Null => {
                    return Err($crate::bindable::null_element($self.type_info(), $prop))
                }
                other => {
                    $self.$field[index] = $crate::bindable::expect_scalar::<$ftype>(
                        $self.type_info(),
                        $prop,
                        other,
                    )?;
                }
            }
            return Ok(());
        }
    };
    (@write_element $self:ident, $prop:ident, $key:ident, $value:ident, list $field:ident : $ftype:ty) => {
        if $prop == stringify!($field) {
            let index = $crate::bindable::expect_index($self.type_info(), $prop, $key)?;
            // 以空洞补齐到目标下标
            while $self.$field.len() <= index {
                $self.$field.push(None);
            }
            $self.$field[index] = match $value {
                $crate::value::Value::Null => None,
                other => Some($crate::bindable::expect_scalar::<$ftype>(
                    $self.type_info(),
                    $prop,
                    other,
                )?),
            };
            return Ok(());
        }
    };
    (@write_element $self:ident, $prop:ident, $key:ident, $value:ident, map $field:ident : $ftype:ty) => {
        if $prop == stringify!($field) {
            let map_key = $crate::bindable::map_key($key);
            match $value {
                $crate::value::Value::Null => {
                    $self.$field.remove(&map_key);
                }
                other => {
                    let converted = $crate::bindable::expect_scalar::<$ftype>(
                        $self.type_info(),
                        $prop,
                        other,
                    )?;
                    $self.$field.insert(map_key, converted);
                }
            }
            return Ok(());
        }
    };
    (@write_element $self:ident, $prop:ident, $key:ident, $value:ident, $other:ident $field:ident : $ftype:ty $(=> $a:ident, $b:ident)?) => {
        if $prop == stringify!($field) {
            return Err($crate::bindable::wrong_shape(
                $self.type_info(),
                $prop,
                "element write",
            ));
        }
    };

    // --- 索引 bean 属性 ---

    (@read_indexed $self:ident, $prop:ident, $key:ident, indexed $field:ident : $ftype:ty => $get:ident, $set:ident) => {
        if $prop == stringify!($field) {
            return Ok($self
                .$get($key)
                .map(|v| $crate::value::Scalar::into_value(v)));
        }
    };
    (@read_indexed $self:ident, $prop:ident, $key:ident, $other:ident $field:ident : $ftype:ty $(=> $a:ident, $b:ident)?) => {
        if $prop == stringify!($field) {
            return Err($crate::bindable::wrong_shape(
                $self.type_info(),
                $prop,
                "indexed read",
            ));
        }
    };

    (@write_indexed $self:ident, $prop:ident, $key:ident, $value:ident, indexed $field:ident : $ftype:ty => $get:ident, $set:ident) => {
        if $prop == stringify!($field) {
            let converted = match $value {
                $crate::value::Value::Null => None,
                other => Some($crate::bindable::expect_scalar::<$ftype>(
                    $self.type_info(),
                    $prop,
                    other,
                )?),
            };
            $self.$set($key, converted);
            return Ok(());
        }
    };
    (@write_indexed $self:ident, $prop:ident, $key:ident, $value:ident, $other:ident $field:ident : $ftype:ty $(=> $a:ident, $b:ident)?) => {
        if $prop == stringify!($field) {
            return Err($crate::bindable::wrong_shape(
                $self.type_info(),
                $prop,
                "indexed write",
            ));
        }
    };

    // --- 嵌套对象导航 ---

    (@child $self:ident, $prop:ident, object $field:ident : $ftype:ty) => {
        if $prop == stringify!($field) {
            return Ok($self
                .$field
                .as_ref()
                .map(|v| v as &dyn $crate::bindable::Bindable));
        }
    };
    (@child $self:ident, $prop:ident, $other:ident $field:ident : $ftype:ty $(=> $a:ident, $b:ident)?) => {
        if $prop == stringify!($field) {
            return Err($crate::bindable::wrong_shape(
                $self.type_info(),
                $prop,
                "nested navigation",
            ));
        }
    };

    (@child_mut $self:ident, $prop:ident, $create:ident, object $field:ident : $ftype:ty) => {
        if $prop == stringify!($field) {
            if $create && $self.$field.is_none() {
                $self.$field = Some(<$ftype as ::std::default::Default>::default());
            }
            return Ok($self
                .$field
                .as_mut()
                .map(|v| v as &mut dyn $crate::bindable::Bindable));
        }
    };
    (@child_mut $self:ident, $prop:ident, $create:ident, $other:ident $field:ident : $ftype:ty $(=> $a:ident, $b:ident)?) => {
        if $prop == stringify!($field) {
            return Err($crate::bindable::wrong_shape(
                $self.type_info(),
                $prop,
                "nested navigation",
            ));
        }
    };

    // --- 对象容器元素导航 ---

    (@child_element $self:ident, $prop:ident, $key:ident, object_list $field:ident : $ftype:ty) => {
        if $prop == stringify!($field) {
            let index = $crate::bindable::expect_index($self.type_info(), $prop, $key)?;
            return Ok($self
                .$field
                .get(index)
                .and_then(|slot| slot.as_ref())
                .map(|v| v as &dyn $crate::bindable::Bindable));
        }
    };
    (@child_element $self:ident, $prop:ident, $key:ident, object_map $field:ident : $ftype:ty) => {
        if $prop == stringify!($field) {
            let map_key = $crate::bindable::map_key($key);
            return Ok($self
                .$field
                .get(&map_key)
                .map(|v| v as &dyn $crate::bindable::Bindable));
        }
    };
    (@child_element $self:ident, $prop:ident, $key:ident, indexed_object $field:ident : $ftype:ty => $get:ident, $set:ident) => {
        if $prop == stringify!($field) {
            return Ok($self
                .$get($key)
                .map(|v| v as &dyn $crate::bindable::Bindable));
        }
    };
    (@child_element $self:ident, $prop:ident, $key:ident, $other:ident $field:ident : $ftype:ty $(=> $a:ident, $b:ident)?) => {
        if $prop == stringify!($field) {
            return Err($crate::bindable::wrong_shape(
                $self.type_info(),
                $prop,
                "element navigation",
            ));
        }
    };

    (@child_element_mut $self:ident, $prop:ident, $key:ident, $create:ident, object_list $field:ident : $ftype:ty) => {
        if $prop == stringify!($field) {
            let index = $crate::bindable::expect_index($self.type_info(), $prop, $key)?;
            if $create {
                while $self.$field.len() <= index {
                    $self.$field.push(None);
                }
                let slot = &mut $self.$field[index];
                if slot.is_none() {
                    *slot = Some(<$ftype as ::std::default::Default>::default());
                }
            }
            return Ok($self
                .$field
                .get_mut(index)
                .and_then(|slot| slot.as_mut())
                .map(|v| v as &mut dyn $crate::bindable::Bindable));
        }
    };
    (@child_element_mut $self:ident, $prop:ident, $key:ident, $create:ident, object_map $field:ident : $ftype:ty) => {
        if $prop == stringify!($field) {
            let map_key = $crate::bindable::map_key($key);
            if $create {
                $self
                    .$field
                    .entry(map_key.clone())
                    .or_insert_with(<$ftype as ::std::default::Default>::default);
            }
            return Ok($self
                .$field
                .get_mut(&map_key)
                .map(|v| v as &mut dyn $crate::bindable::Bindable));
        }
    };
    (@child_element_mut $self:ident, $prop:ident, $key:ident, $create:ident, indexed_object $field:ident : $ftype:ty => $get:ident, $set:ident) => {
        if $prop == stringify!($field) {
            return Ok($self
                .$set($key, $create)
                .map(|v| v as &mut dyn $crate::bindable::Bindable));
        }
    };
    (@child_element_mut $self:ident, $prop:ident, $key:ident, $create:ident, $other:ident $field:ident : $ftype:ty $(=> $a:ident, $b:ident)?) => {
        if $prop == stringify!($field) {
            return Err($crate::bindable::wrong_shape(
                $self.type_info(),
                $prop,
                "element navigation",
            ));
        }
    };
}
