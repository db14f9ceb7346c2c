//! 宿主配置文件。
//!
//! 配置以 TOML 书写，只描述“启用哪些压缩协议、各自使用目录中的哪个构造器”，
//! 构造器本身由代码登记到 [`ConstructorCatalog`](crate::ConstructorCatalog)：
//!
//! ```toml
//! [compression]
//! enabled = true
//!
//! [[compression.transports]]
//! id = "/snappy/1.0.0"
//! constructor = "snappy"
//! ```

use std::{
    fs,
    path::{Path, PathBuf},
};

use serde::Deserialize;
use thiserror::Error;

/// 读取或解析配置文件时的错误。
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read host configuration `{}`", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("invalid host configuration")]
    Parse(#[from] toml::de::Error),
}

/// 宿主配置根节点。
#[derive(Clone, Debug, Default, Deserialize, PartialEq, Eq)]
#[serde(deny_unknown_fields)]
pub struct HostConfig {
    #[serde(default)]
    pub compression: CompressionSection,
}

/// `[compression]` 配置段。
///
/// - `enabled = false` 等价于显式关闭压缩，此时 `transports` 必须为空；
/// - `transports` 的书写顺序即聚合时的构造顺序与协议优先级。
#[derive(Clone, Debug, Deserialize, PartialEq, Eq)]
#[serde(deny_unknown_fields)]
pub struct CompressionSection {
    #[serde(default = "enabled_by_default")]
    pub enabled: bool,
    #[serde(default)]
    pub transports: Vec<TransportEntry>,
}

impl Default for CompressionSection {
    fn default() -> Self {
        Self {
            enabled: true,
            transports: Vec::new(),
        }
    }
}

fn enabled_by_default() -> bool {
    true
}

/// 单个压缩协议条目。
#[derive(Clone, Debug, Deserialize, PartialEq, Eq)]
#[serde(deny_unknown_fields)]
pub struct TransportEntry {
    /// 协议标识。
    pub id: String,
    /// 构造器目录中的名称。
    pub constructor: String,
}

impl HostConfig {
    /// 从 TOML 文本解析。
    pub fn from_toml_str(source: &str) -> Result<Self, ConfigError> {
        Ok(toml::from_str(source)?)
    }

    /// 从文件加载。
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let source = fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_toml_str(&source)
    }
}
