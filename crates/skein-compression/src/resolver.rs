use core::fmt;
use std::sync::Arc;

use skein_core::{ArgTypeSet, CompressedTransport, DependencyContext, DependencyKind};

use crate::{
    constructor::{Arguments, CompressionSpec, DeferredConstructor},
    error::ConstructorError,
};

/// 压缩传输构造器可以声明的依赖：宿主、网络、身份与地址簿。
pub const COMPRESSION_ARG_TYPES: ArgTypeSet = ArgTypeSet::empty()
    .with(DependencyKind::Host)
    .with(DependencyKind::Network)
    .with(DependencyKind::PeerId)
    .with(DependencyKind::Peerstore);

type FactoryFn =
    dyn Fn(&DependencyContext) -> Result<Arc<dyn CompressedTransport>, ConstructorError>
        + Send
        + Sync;

/// 解析后的统一工厂：`(依赖上下文) -> 压缩传输实例`。
///
/// # 教案级注释
/// - **意图 (Why)**：让“已构造实例”与“待构造的构造器”对下游完全不可区分；
/// - **契约 (What)**
///   - 只闭包捕获原始描述，不持有其他外部状态；
///   - 克隆共享同一闭包，调用可重复进行，每次调用是否产生新实例由构造器自身决定。
#[derive(Clone)]
pub struct CompressionFactory {
    call: Arc<FactoryFn>,
}

impl CompressionFactory {
    fn new<F>(call: F) -> Self
    where
        F: Fn(&DependencyContext) -> Result<Arc<dyn CompressedTransport>, ConstructorError>
            + Send
            + Sync
            + 'static,
    {
        Self {
            call: Arc::new(call),
        }
    }

    /// 以给定上下文构造实例。
    pub fn create(
        &self,
        context: &DependencyContext,
    ) -> Result<Arc<dyn CompressedTransport>, ConstructorError> {
        (self.call)(context)
    }
}

impl fmt::Debug for CompressionFactory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CompressionFactory").finish_non_exhaustive()
    }
}

/// 构造器解析器。
///
/// # 教案级注释
/// - **意图 (Why)**
///   - 各压缩实现对宿主依赖的需求不同，解析器把“实现需要什么”与“宿主能提供什么”解耦，
///     调用方无需为每种签名编写特判；
/// - **关键流程 (How)**
///   1. `Prebuilt`：包装为忽略上下文、恒返回同一实例的工厂；
///   2. `Deferred`：逐个检查声明的标签是否属于 `arg_types`，越界即返回
///      [`ConstructorError::Signature`]，此时构造器不会被调用；
///   3. 生成的工厂在调用时按声明顺序从上下文取出依赖并调用构造器，构造器的错误原样透传。
/// - **契约 (What)**
///   - 解析阶段不检查返回类型；动态构造器的返回值在调用时校验；
///   - 解析器本身为 `Copy`，可作为常量共享。
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Resolver {
    arg_types: ArgTypeSet,
}

impl Resolver {
    /// 以认可的依赖集合创建解析器。
    pub const fn new(arg_types: ArgTypeSet) -> Self {
        Self { arg_types }
    }

    /// 压缩传输专用解析器，认可 [`COMPRESSION_ARG_TYPES`]。
    pub const fn compression() -> Self {
        Self::new(COMPRESSION_ARG_TYPES)
    }

    pub fn arg_types(&self) -> ArgTypeSet {
        self.arg_types
    }

    /// 检查声明的依赖是否全部被认可，返回首个越界位置。
    pub fn check_signature(&self, params: &[DependencyKind]) -> Result<(), ConstructorError> {
        match params
            .iter()
            .enumerate()
            .find(|(_, kind)| !self.arg_types.contains(**kind))
        {
            Some((position, kind)) => Err(ConstructorError::Signature {
                position,
                kind: *kind,
            }),
            None => Ok(()),
        }
    }

    /// 把描述归一为工厂。
    pub fn resolve(
        &self,
        spec: impl Into<CompressionSpec>,
    ) -> Result<CompressionFactory, ConstructorError> {
        match spec.into() {
            CompressionSpec::Prebuilt(transport) => Ok(CompressionFactory::new(move |_| {
                Ok(Arc::clone(&transport))
            })),
            CompressionSpec::Deferred(constructor) => {
                self.check_signature(constructor.params())?;
                Ok(CompressionFactory::new(move |context| {
                    invoke_with_context(&constructor, context)
                }))
            }
        }
    }
}

impl Default for Resolver {
    fn default() -> Self {
        Self::compression()
    }
}

/// 以压缩传输解析器解析描述。
pub fn resolve_compression(
    spec: impl Into<CompressionSpec>,
) -> Result<CompressionFactory, ConstructorError> {
    Resolver::compression().resolve(spec)
}

fn invoke_with_context(
    constructor: &DeferredConstructor,
    context: &DependencyContext,
) -> Result<Arc<dyn CompressedTransport>, ConstructorError> {
    let values = constructor
        .params()
        .iter()
        .enumerate()
        .map(|(position, kind)| {
            context
                .get(*kind)
                .ok_or(ConstructorError::MissingDependency {
                    position,
                    kind: *kind,
                })
        })
        .collect::<Result<Vec<_>, _>>()?;
    constructor.invoke(Arguments::new(values))
}
