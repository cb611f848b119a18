// Copyright (c) 2026 shaneyale (shaneyale86@gmail.com)
// All rights reserved.

//! # 绑定引擎参数与常量模块
//!
//! 该模块定义了 `mvcbind` 绑定核心使用的协议常量和静态查找表，包括：
//! - 动态属性（Dynamic Attribute）的标准键名。
//! - ISO 4217 货币代码到小数位数的映射表。
//! - 区域（Locale）到数字格式符号的映射表。
//! - 默认的日期格式、分隔符与索引动作名。

use lazy_static::lazy_static;
use std::collections::HashMap;

/// 目录型 URI 规范化时采用的默认动作名（`/foo/` -> `/foo/index`）
pub const INDEX_ACTION: &str = "index";

/// 单值绑定到数组时使用的默认分隔符
pub const ARRAY_DELIMITER: &str = ",";

/// 路径表达式解析缓存的默认容量
pub const DEFAULT_PATH_CACHE_SIZE: usize = 128;

/// 货币转换器要求的动态属性键：货币代码（如 `USD`）
pub const ATTR_CURRENCY_CODE: &str = "currencyCode";

/// 日期/时间转换器可选的动态属性键：格式串（chrono 语法）
pub const ATTR_DATE_TIME_FORMAT: &str = "dateTimeFormat";

/// 数值转换器可选的动态属性键：区域标签（如 `de_DE`）
pub const ATTR_LOCALE: &str = "locale";

/// 文件转换器可选的动态属性键：相对路径的父目录
pub const ATTR_PARENT_DIR: &str = "parentDir";

/// 数组转换可选的动态属性键：覆盖默认分隔符
pub const ATTR_DELIMITER: &str = "delimiter";

/// 默认的日期格式（chrono 格式语法）
pub const DATE_FORMAT: &str = "%Y-%m-%d";

/// 默认的日期时间格式（chrono 格式语法）
pub const DATETIME_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

/// 默认区域标签，用于数值解析的符号选择
pub const DEFAULT_LOCALE: &str = "en_US";

lazy_static! {
    /// ISO 4217 货币代码与其小数位数（minor unit digits）的映射表。
    ///
    /// 货币金额在内部以最小货币单位的整数存储，解析与格式化时
    /// 需要根据该表确定小数点的位置。
    pub static ref CURRENCY_DIGITS: HashMap<&'static str, u32> = {
        let mut map = HashMap::new();
        // 常见的两位小数货币
        map.insert("USD", 2);
        map.insert("EUR", 2);
        map.insert("GBP", 2);
        map.insert("CNY", 2);
        map.insert("HKD", 2);
        map.insert("TWD", 2);
        map.insert("SGD", 2);
        map.insert("AUD", 2);
        map.insert("NZD", 2);
        map.insert("CAD", 2);
        map.insert("CHF", 2);
        map.insert("SEK", 2);
        map.insert("NOK", 2);
        map.insert("DKK", 2);
        map.insert("PLN", 2);
        map.insert("CZK", 2);
        map.insert("RUB", 2);
        map.insert("INR", 2);
        map.insert("BRL", 2);
        map.insert("MXN", 2);
        map.insert("ZAR", 2);
        map.insert("TRY", 2);
        map.insert("THB", 2);
        map.insert("MYR", 2);
        map.insert("PHP", 2);
        map.insert("IDR", 2);
        map.insert("SAR", 2);
        map.insert("AED", 2);
        map.insert("ILS", 2);
        map.insert("ARS", 2);

        // 无小数位货币
        map.insert("JPY", 0);
        map.insert("KRW", 0);
        map.insert("VND", 0);
        map.insert("CLP", 0);
        map.insert("ISK", 0);

        // 三位小数货币（中东部分国家）
        map.insert("KWD", 3);
        map.insert("BHD", 3);
        map.insert("OMR", 3);
        map.insert("JOD", 3);
        map.insert("TND", 3);
        map
    };
}

lazy_static! {
    /// 区域标签到数字格式符号的映射表：`(小数点符号, 分组符号)`。
    ///
    /// 查找顺序：先查完整标签（`de_DE`），未命中时退化到语言前缀（`de`）。
    /// 表中未收录的区域按 `en` 处理。
    pub static ref LOCALE_FORMATS: HashMap<&'static str, (char, char)> = {
        let mut map = HashMap::new();
        // 点号小数、逗号分组
        map.insert("en", ('.', ','));
        map.insert("en_US", ('.', ','));
        map.insert("en_GB", ('.', ','));
        map.insert("zh", ('.', ','));
        map.insert("zh_CN", ('.', ','));
        map.insert("ja", ('.', ','));
        map.insert("ja_JP", ('.', ','));
        map.insert("ko", ('.', ','));
        map.insert("hi", ('.', ','));
        map.insert("th", ('.', ','));
        map.insert("he", ('.', ','));

        // 逗号小数、点号分组（欧陆习惯）
        map.insert("de", (',', '.'));
        map.insert("de_DE", (',', '.'));
        map.insert("it", (',', '.'));
        map.insert("it_IT", (',', '.'));
        map.insert("es", (',', '.'));
        map.insert("es_ES", (',', '.'));
        map.insert("pt", (',', '.'));
        map.insert("pt_BR", (',', '.'));
        map.insert("nl", (',', '.'));
        map.insert("tr", (',', '.'));
        map.insert("id", (',', '.'));
        map.insert("vi", (',', '.'));

        // 逗号小数、空格分组
        map.insert("fr", (',', ' '));
        map.insert("fr_FR", (',', ' '));
        map.insert("ru", (',', ' '));
        map.insert("pl", (',', ' '));
        map.insert("sv", (',', ' '));
        map.insert("fi", (',', ' '));
        map.insert("nb", (',', ' '));
        map.insert("cs", (',', ' '));
        map
    };
}

/// 按"完整标签 -> 语言前缀 -> en"的顺序查找区域的数字格式符号
pub fn locale_symbols(tag: &str) -> (char, char) {
    if let Some(symbols) = LOCALE_FORMATS.get(tag) {
        return *symbols;
    }
    if let Some(language) = tag.split('_').next() {
        if let Some(symbols) = LOCALE_FORMATS.get(language) {
            return *symbols;
        }
    }
    ('.', ',')
}
