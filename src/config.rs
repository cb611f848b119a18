use serde_derive::Deserialize;
use serde_derive::Serialize;

use core::str;
use log::{error, warn};
use std::fs::File;
use std::io::prelude::*;

use crate::param;

#[derive(Serialize, Deserialize, Debug, Clone)]
pub struct Config {
    index_action: String,
    array_delimiter: String,
    path_cache_size: usize,
    #[serde(default = "default_date_format")]
    date_format: String,
    #[serde(default = "default_datetime_format")]
    datetime_format: String,
    #[serde(default = "default_locale")]
    default_locale: String,
}

fn default_date_format() -> String {
    param::DATE_FORMAT.to_string()
}

fn default_datetime_format() -> String {
    param::DATETIME_FORMAT.to_string()
}

fn default_locale() -> String {
    param::DEFAULT_LOCALE.to_string()
}

impl Config {
    pub fn new() -> Self {
        Self {
            index_action: param::INDEX_ACTION.to_string(),
            array_delimiter: param::ARRAY_DELIMITER.to_string(),
            path_cache_size: param::DEFAULT_PATH_CACHE_SIZE,
            date_format: default_date_format(),
            datetime_format: default_datetime_format(),
            default_locale: default_locale(),
        }
    }

    pub fn from_toml(filename: &str) -> Self {
        let mut file = match File::open(filename) {
            Ok(f) => f,
            Err(e) => panic!("no such file {} exception:{}", filename, e),
        };
        let mut str_val = String::new();
        match file.read_to_string(&mut str_val) {
            Ok(s) => s,
            Err(e) => panic!("Error Reading file: {}", e),
        };

        let mut raw_config: Config = match toml::from_str(&str_val) {
            Ok(t) => t,
            Err(_) => {
                error!("无法成功从配置文件构建配置对象，使用默认配置");
                Config::new()
            }
        };
        if raw_config.path_cache_size == 0 {
            warn!(
                "path_cache_size被设置为0，但目前尚不支持禁用表达式缓存，因此该值将被改为{}。",
                param::DEFAULT_PATH_CACHE_SIZE
            );
            raw_config.path_cache_size = param::DEFAULT_PATH_CACHE_SIZE;
        }
        raw_config
    }
}

impl Default for Config {
    fn default() -> Self {
        Self::new()
    }
}

impl Config {
    pub fn index_action(&self) -> &str {
        &self.index_action
    }

    pub fn array_delimiter(&self) -> &str {
        &self.array_delimiter
    }

    pub fn path_cache_size(&self) -> usize {
        self.path_cache_size
    }

    pub fn date_format(&self) -> &str {
        &self.date_format
    }

    pub fn datetime_format(&self) -> &str {
        &self.datetime_format
    }

    pub fn default_locale(&self) -> &str {
        &self.default_locale
    }
}
