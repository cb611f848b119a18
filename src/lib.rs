// --- 模块定义 ---
pub mod action;     // 动作描述符、注册表与工厂接缝
pub mod bindable;   // 可绑定能力接口与派生宏
pub mod config;     // 配置解析与管理
pub mod convert;    // 转换器注册表与内置转换器
pub mod evaluator;  // 属性路径求值与绑定编排
pub mod exception;  // 自定义异常与错误处理
pub mod param;      // 全局常量与静态参数
pub mod path;       // 路径表达式解析与缓存
pub mod resolver;   // URI 动作解析引擎
pub mod value;      // 动态值模型与领域类型

pub use action::{ActionDescriptor, ActionFactory, ActionRegistry, ResolvedAction};
pub use bindable::{Bindable, PropertyInfo, PropertyKind, TypeInfo};
pub use config::Config;
pub use convert::{Attributes, BindTarget, Converter, ConverterRegistry};
pub use evaluator::{BindReport, ExpressionEvaluator, FieldError};
pub use exception::Exception;
pub use path::{Key, PathCache, PropertyPath, Segment};
pub use resolver::{bind_uri_parameters, ActionResolver};
pub use value::{EnumInfo, LocaleId, Money, Scalar, ScalarType, TypeKey, Value};
