// Copyright (c) 2026 shaneyale (shaneyale86@gmail.com)
// All rights reserved.

//! # Exception 模块
//!
//! 该模块定义了绑定核心在请求处理生命周期中可能抛出的各类异常情况。
//!
//! ## 设计意图
//! - **错误分类**：区分"用户输入错误"（转换失败）与"调用方配置错误"
//!   （转换器状态错误、不支持的形状），前者应逐字段累积后呈现给用户，
//!   后者属于程序缺陷，应立即中止当前绑定。
//! - **缺失不是错误**：URI 解析未命中与读取路径上的空值均以结果类型表达，
//!   不占用任何异常变体。
//! - **用户友好**：通过实现 `std::fmt::Display`，确保错误信息可以被安全地
//!   记录到日志或呈现到校验报告中。

use std::fmt;

/// 绑定核心处理请求过程中发生的异常类型。
///
/// 该枚举通常作为 `Result` 的 `Err` 部分返回，用于指示处理失败的具体原因。
#[derive(Debug, Clone)]
pub enum Exception {
    /// 路径表达式本身无法解析（空段、未闭合的方括号等）。
    /// 表达式来自请求参数名，属于协议层缺陷而非用户数据错误。
    InvalidExpression {
        /// 原始表达式文本
        expression: String,
        /// 无法解析的具体原因
        reason: String,
    },
    /// 表达式引用了目标类型上不存在的属性名。
    NoSuchProperty {
        /// 声明类型的名称
        type_name: String,
        /// 未找到的属性名
        property: String,
    },
    /// 字符串值无法解析为目标类型（如非数字文本写入数值字段）。
    /// 反映用户输入错误，由绑定编排器逐字段累积，不中断同级字段的绑定。
    Conversion {
        /// 发生错误的表达式
        expression: String,
        /// 无法转换的原始值
        value: String,
        /// 解析失败的具体原因
        reason: String,
    },
    /// 转换器缺少完成工作所需的动态属性或配置（如货币代码缺失）。
    /// 反映调用方的配置缺陷而非用户输入问题，必须与 `Conversion` 区分。
    ConverterState {
        /// 发生错误的表达式
        expression: String,
        /// 缺陷的具体描述
        reason: String,
    },
    /// 目标形状不受支持：多维数组、未注册转换器的类型、
    /// 穿越标量继续导航等。对该次绑定操作总是致命的，从不静默纠正。
    UnsupportedShape {
        /// 发生错误的表达式
        expression: String,
        /// 不支持的具体原因
        reason: String,
    },
    /// 动作工厂在实例化已解析的处理器时失败。
    /// 区别于"未命中"：未命中不是错误，工厂失败是装配缺陷。
    ActionCreation {
        /// 已匹配的规范 URI
        uri: String,
        /// 工厂报告的失败原因
        reason: String,
    },
}

impl Exception {
    /// 判断该异常是否代表用户输入错误（可累积进校验报告）。
    ///
    /// 其余变体均为调用方或配置缺陷，应当立即向上传播。
    pub fn is_user_error(&self) -> bool {
        matches!(self, Exception::Conversion { .. })
    }
}

/// 为 `Exception` 实现 `Display` 特性，使其支持字符串格式化输出。
///
/// 工业实践中，这些描述信息常用于系统日志（Logging）以及校验报告的构建。
impl fmt::Display for Exception {
    /// 根据错误类型写入人类可读的描述文本。
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Exception::InvalidExpression { expression, reason } => {
                write!(f, "Invalid property expression [{}]: {}", expression, reason)
            }
            Exception::NoSuchProperty { type_name, property } => {
                write!(f, "No property named [{}] on type [{}]", property, type_name)
            }
            Exception::Conversion { expression, value, reason } => {
                write!(
                    f,
                    "Conversion failed for [{}] with value [{}]: {}",
                    expression, value, reason
                )
            }
            Exception::ConverterState { expression, reason } => {
                write!(f, "Converter misconfigured for [{}]: {}", expression, reason)
            }
            Exception::UnsupportedShape { expression, reason } => {
                write!(f, "Unsupported binding shape for [{}]: {}", expression, reason)
            }
            Exception::ActionCreation { uri, reason } => {
                write!(f, "Couldn't create action for URI [{}]: {}", uri, reason)
            }
        }
    }
}

impl std::error::Error for Exception {}

#[cfg(test)]
mod tests {
    use super::*;

    /// 验证用户错误与配置缺陷的分类
    #[test]
    fn test_user_error_classification() {
        let conversion = Exception::Conversion {
            expression: "user.age".to_string(),
            value: "abc".to_string(),
            reason: "not a number".to_string(),
        };
        assert!(conversion.is_user_error());

        let state = Exception::ConverterState {
            expression: "user.salary".to_string(),
            reason: "missing currencyCode".to_string(),
        };
        assert!(!state.is_user_error());
    }

    /// 验证 Display 文本包含表达式与原因
    #[test]
    fn test_display_contains_context() {
        let e = Exception::Conversion {
            expression: "user.age".to_string(),
            value: "abc".to_string(),
            reason: "not a number".to_string(),
        };
        let text = e.to_string();
        assert!(text.contains("user.age"));
        assert!(text.contains("abc"));
        assert!(text.contains("not a number"));
    }
}
