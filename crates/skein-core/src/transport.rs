//! # transport 模块说明
//!
//! ## 角色定位（Why）
//! - 压缩传输是宿主与对端协商后、在连接上启用的负载变换能力；
//! - 本模块只定义能力契约，具体算法由外部实现 crate 提供。
//!
//! ## 设计要求（What）
//! - 实现必须满足 `Send + Sync + 'static`，以便以 `Arc<dyn CompressedTransport>` 在宿主组件间共享；
//! - `compress` 与 `decompress` 互为逆操作，失败时返回 [`TransportError`]，不得 panic。

use core::fmt;

use thiserror::Error;

use crate::BoxError;

/// 压缩传输运行期错误。
#[derive(Debug, Error)]
pub enum TransportError {
    /// 多协议传输未注册任何协议，无法选出首选实现。
    #[error("no compression protocol registered")]
    NoProtocols,

    /// 输入负载无法还原，例如帧被截断或校验失败。
    #[error("corrupted compressed payload: {reason}")]
    Corrupted { reason: String },

    /// 实现自身的其他失败，原样保留错误链。
    #[error(transparent)]
    Other(BoxError),
}

/// 压缩传输能力契约。
///
/// # 教案级注释
/// - **意图 (Why)**：宿主装配流程把各类压缩实现（或聚合后的多协议实现）一律视为该 trait 对象，
///   下游协商层无需关心具体类型。
/// - **契约 (What)**
///   - 对任意输入 `p`，若 `compress(p)` 成功，则 `decompress` 其结果必须得到 `p`；
///   - [`transport_name`](Self::transport_name) 仅用于诊断与测试比较，不参与协商。
/// - **风险提示 (Trade-offs)**：接口按整段负载同步变换，流式压缩需由实现自行分帧。
pub trait CompressedTransport: Send + Sync + 'static {
    /// 压缩出站负载。
    fn compress(&self, payload: &[u8]) -> Result<Vec<u8>, TransportError>;

    /// 还原入站负载。
    fn decompress(&self, payload: &[u8]) -> Result<Vec<u8>, TransportError>;

    /// 实现的诊断名称，默认使用具体类型名。
    fn transport_name(&self) -> &'static str {
        core::any::type_name::<Self>()
    }
}

impl fmt::Debug for dyn CompressedTransport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("CompressedTransport")
            .field(&self.transport_name())
            .finish()
    }
}
