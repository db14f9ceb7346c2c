use core::fmt;
use std::sync::Arc;

use skein_compression::{
    AggregateError, CompressionMultistream, CompressionSpec, ConstructorError,
    MsCompressionFactory, Resolver, build_compression_transport,
};
use skein_core::{CompressedTransport, DependencyContext, Host, PeerId};
use thiserror::Error;
use tracing::debug;

use crate::{catalog::ConstructorCatalog, config::HostConfig};

/// 配置宿主选项时出现的错误。
#[derive(Debug, Error)]
pub enum HostBuilderError {
    /// 构造器签名不被压缩传输解析器认可。
    #[error("invalid compression constructor for `{id}`")]
    Constructor {
        id: String,
        #[source]
        source: ConstructorError,
    },

    /// 配置文件引用了目录中不存在的构造器。
    #[error("compression constructor `{constructor}` referenced by `{id}` is not registered")]
    UnknownConstructor { id: String, constructor: String },

    /// 同时声明了“关闭压缩”与具体压缩协议。
    #[error("compression transports cannot be combined with a compression-disabled host")]
    ConflictingOptions,
}

/// 构建宿主最终失败时的错误。
#[derive(Debug, Error)]
pub enum HostBuildError {
    /// 压缩传输聚合失败：重复标识或某个构造器失败。
    #[error("compression transport assembly failed")]
    Compression(#[from] AggregateError),
}

/// `HostBuilder` 聚合宿主压缩传输相关的装配步骤。
///
/// # 教案级注释
/// - **设计目标 (Why)**
///   - 用户以“协议标识 + 实例或构造器”的形式逐项声明压缩传输，装配时再统一注入宿主依赖；
///   - 选项阶段即解析构造器签名，签名错误在宿主启动之前暴露。
/// - **关键流程 (How)**
///   1. [`compression`](Self::compression)：解析描述并按声明顺序追加带标识的工厂；
///   2. [`apply_config`](Self::apply_config)：按配置文件条目从 [`ConstructorCatalog`] 取出描述后追加；
///   3. [`build`](Self::build)：由宿主派生依赖上下文，调用聚合器生成 [`CompressionMultistream`]。
/// - **契约说明 (What)**
///   - 选项方法返回 `Result<&mut Self, HostBuilderError>`，失败时 Builder 保持调用前的状态；
///   - 重复的协议标识不在选项阶段拦截，而由 `build` 统一报告；
///   - 未声明任何压缩协议时，`build` 产出空的多协议传输。
/// - **风险提示 (Trade-offs)**
///   - 构造器在 `build` 中同步执行，若其内部执行 I/O，会直接阻塞装配流程。
#[derive(Clone, Default)]
pub struct HostBuilder {
    resolver: Resolver,
    compression: Vec<MsCompressionFactory>,
    compression_disabled: bool,
}

impl fmt::Debug for HostBuilder {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("HostBuilder")
            .field("compression", &self.compression_ids().collect::<Vec<_>>())
            .field("compression_disabled", &self.compression_disabled)
            .finish()
    }
}

impl HostBuilder {
    /// 创建空的 Builder，使用压缩传输默认的依赖集合。
    pub fn new() -> Self {
        Self::default()
    }

    /// 追加一个压缩协议。
    ///
    /// # 教案级注释
    /// - **输入参数**：`id` 为协议标识；`spec` 为已构造实例或构造器；
    /// - **执行逻辑 (How)**：立即解析 `spec`，签名越界时返回 [`HostBuilderError::Constructor`]；
    /// - **前置条件**：此前未调用 [`no_compression`](Self::no_compression)，否则返回
    ///   [`HostBuilderError::ConflictingOptions`]。
    pub fn compression(
        &mut self,
        id: impl Into<String>,
        spec: impl Into<CompressionSpec>,
    ) -> Result<&mut Self, HostBuilderError> {
        if self.compression_disabled {
            return Err(HostBuilderError::ConflictingOptions);
        }
        let id = id.into();
        let factory = self
            .resolver
            .resolve(spec)
            .map_err(|source| HostBuilderError::Constructor {
                id: id.clone(),
                source,
            })?;
        debug!(protocol = %id, "compression transport configured");
        self.compression.push(MsCompressionFactory::new(id, factory));
        Ok(self)
    }

    /// 显式关闭压缩。已声明压缩协议时返回 [`HostBuilderError::ConflictingOptions`]。
    pub fn no_compression(&mut self) -> Result<&mut Self, HostBuilderError> {
        if !self.compression.is_empty() {
            return Err(HostBuilderError::ConflictingOptions);
        }
        self.compression_disabled = true;
        Ok(self)
    }

    /// 按配置文件追加压缩协议。
    ///
    /// # 教案级注释
    /// - **执行逻辑 (How)**：在副本上逐条应用，全部成功后才提交，任一条目失败时 Builder 不变；
    /// - **契约 (What)**：`enabled = false` 等价于 [`no_compression`](Self::no_compression)，
    ///   此时若仍列出协议则返回 [`HostBuilderError::ConflictingOptions`]；
    ///   目录中不存在的构造器名返回 [`HostBuilderError::UnknownConstructor`]。
    pub fn apply_config(
        &mut self,
        config: &HostConfig,
        catalog: &ConstructorCatalog,
    ) -> Result<&mut Self, HostBuilderError> {
        let section = &config.compression;
        let mut staged = self.clone();
        if !section.enabled {
            if !section.transports.is_empty() {
                return Err(HostBuilderError::ConflictingOptions);
            }
            staged.no_compression()?;
        }
        for entry in &section.transports {
            let spec = catalog.get(&entry.constructor).cloned().ok_or_else(|| {
                HostBuilderError::UnknownConstructor {
                    id: entry.id.clone(),
                    constructor: entry.constructor.clone(),
                }
            })?;
            staged.compression(entry.id.clone(), spec)?;
        }
        *self = staged;
        Ok(self)
    }

    /// 已声明的协议标识，按声明顺序。
    pub fn compression_ids(&self) -> impl Iterator<Item = &str> {
        self.compression.iter().map(|item| item.id.as_str())
    }

    pub fn is_compression_disabled(&self) -> bool {
        self.compression_disabled
    }

    /// 装配宿主的压缩传输。
    ///
    /// # 教案级注释
    /// - **执行步骤**
    ///   1. 由宿主派生依赖上下文（宿主、网络、身份、地址簿）；
    ///   2. 调用 [`build_compression_transport`]，重复标识或构造失败映射为
    ///      [`HostBuildError::Compression`]；
    ///   3. 将宿主与多协议传输打包为 [`AssembledHost`]。
    /// - **后置条件**：失败时不返回任何部分装配的结果。
    pub fn build(self, host: Arc<dyn Host>) -> Result<AssembledHost, HostBuildError> {
        let context = DependencyContext::from_host(Arc::clone(&host));
        let multistream = build_compression_transport(&context, &self.compression)?;
        debug!(
            peer = %host.id(),
            protocols = multistream.len(),
            "host compression assembled"
        );
        Ok(AssembledHost {
            host,
            compression: Arc::new(multistream),
        })
    }
}

/// 装配完成的宿主：宿主对象与其压缩能力。
#[derive(Clone)]
pub struct AssembledHost {
    host: Arc<dyn Host>,
    compression: Arc<CompressionMultistream>,
}

impl AssembledHost {
    pub fn host(&self) -> &Arc<dyn Host> {
        &self.host
    }

    pub fn peer_id(&self) -> PeerId {
        self.host.id()
    }

    /// 按协议标识分派的多协议传输。
    pub fn compression(&self) -> &Arc<CompressionMultistream> {
        &self.compression
    }

    /// 以单一能力对象的形式交给下游协商层。
    pub fn compressed_transport(&self) -> Arc<dyn CompressedTransport> {
        self.compression.clone()
    }
}

impl fmt::Debug for AssembledHost {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AssembledHost")
            .field("peer_id", &self.host.id())
            .field("compression", &self.compression)
            .finish()
    }
}
