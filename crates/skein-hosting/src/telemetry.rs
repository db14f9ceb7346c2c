//! 进程级日志安装。
//!
//! 宿主进程在启动时调用一次 [`install`]：组装 `fmt + EnvFilter` 的 `tracing-subscriber`
//! 并设为全局 Subscriber。过滤规则读取环境变量 [`LOG_FILTER_ENV`]，未设置时使用默认指令。

use std::{env::VarError, sync::OnceLock};

use thiserror::Error;
use tracing_subscriber::{EnvFilter, filter::ParseError, layer::SubscriberExt};

/// 日志过滤规则的环境变量名，语法同 `RUST_LOG`。
pub const LOG_FILTER_ENV: &str = "SKEIN_LOG";

/// 未设置环境变量时的默认过滤指令。
pub const DEFAULT_DIRECTIVE: &str = "info";

static INSTALLED: OnceLock<()> = OnceLock::new();

/// 日志安装过程可能出现的错误。
#[derive(Debug, Error)]
pub enum TelemetryError {
    /// [`install`] 已成功执行过。
    #[error("skein telemetry is already installed")]
    AlreadyInstalled,

    /// 环境变量存在但不是合法的 Unicode 字符串。
    #[error("log filter variable `{env}` is not valid unicode")]
    NonUnicodeFilter { env: &'static str },

    /// 过滤指令无法解析。
    #[error("invalid log filter directive")]
    InvalidFilter(#[from] ParseError),

    /// 外部已设置全局 Subscriber。
    #[error("failed to set the global tracing subscriber")]
    SetGlobalSubscriber(#[source] tracing::subscriber::SetGlobalDefaultError),
}

/// 以 [`DEFAULT_DIRECTIVE`] 为默认规则安装日志。
pub fn install() -> Result<(), TelemetryError> {
    install_with_default(DEFAULT_DIRECTIVE)
}

/// 安装日志，`directive` 仅在 [`LOG_FILTER_ENV`] 未设置时生效。
///
/// # 教案级注释
/// - **执行逻辑 (How)**
///   1. 已安装则直接返回 [`TelemetryError::AlreadyInstalled`]；
///   2. 解析过滤规则，环境变量非 Unicode 或指令非法时不安装任何 Subscriber；
///   3. 设置全局 Subscriber，成功后记录安装状态。
/// - **契约 (What)**：进程内至多成功一次；外部已设置全局 Subscriber 时返回
///   [`TelemetryError::SetGlobalSubscriber`]。
pub fn install_with_default(directive: &str) -> Result<(), TelemetryError> {
    if INSTALLED.get().is_some() {
        return Err(TelemetryError::AlreadyInstalled);
    }

    let filter = filter_from(std::env::var(LOG_FILTER_ENV), directive)?;
    let subscriber = tracing_subscriber::registry()
        .with(filter)
        .with(tracing_subscriber::fmt::layer());
    tracing::subscriber::set_global_default(subscriber)
        .map_err(TelemetryError::SetGlobalSubscriber)?;

    let _ = INSTALLED.set(());
    tracing::debug!(env = LOG_FILTER_ENV, "skein telemetry installed");
    Ok(())
}

/// 只有变量缺失时才回落到默认指令。
fn filter_from(
    from_env: Result<String, VarError>,
    directive: &str,
) -> Result<EnvFilter, TelemetryError> {
    let filter = match from_env {
        Ok(from_env) => EnvFilter::try_new(from_env)?,
        Err(VarError::NotPresent) => EnvFilter::try_new(directive)?,
        Err(VarError::NotUnicode(_)) => {
            return Err(TelemetryError::NonUnicodeFilter {
                env: LOG_FILTER_ENV,
            });
        }
    };
    Ok(filter)
}
