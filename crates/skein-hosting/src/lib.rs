#![deny(unsafe_code)]
#![doc = "skein-hosting: 为宿主装配流程提供压缩传输选项、配置文件加载与日志安装。"]

pub mod builder;
mod catalog;
pub mod config;
pub mod telemetry;

pub use builder::{AssembledHost, HostBuildError, HostBuilder, HostBuilderError};
pub use catalog::{CatalogError, ConstructorCatalog};
pub use config::{CompressionSection, ConfigError, HostConfig, TransportEntry};
