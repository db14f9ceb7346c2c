#![deny(unsafe_code)]
#![doc = "skein-core: 宿主装配流程中可注入依赖与压缩传输能力的统一契约。"]
#![doc = ""]
#![doc = "== 使命概述 =="]
#![doc = "- **Why**：压缩传输的实现各自需要不同的宿主依赖（身份、网络、地址簿），契约层需要给出一份封闭、可枚举的依赖清单。"]
#![doc = "- **What**：定义 [`DependencyKind`]/[`DependencyContext`] 依赖模型、[`Injectable`] 注入契约以及 [`CompressedTransport`] 能力 trait。"]
#![doc = "- **How**：依赖以枚举标签描述，构造器以数据形式声明所需子集，解析层据此查表注入，无需运行期反射。"]

/// 外部协作方（构造器、传输实现）返回的不透明错误。
///
/// 调用方只负责沿错误链原样传播，不对其内容做分类。
pub type BoxError = Box<dyn std::error::Error + Send + Sync + 'static>;

pub mod dependency;
pub mod memory;
pub mod transport;

#[cfg(any(test, feature = "test-util"))]
pub mod test_stubs;

pub use dependency::{
    ArgTypeSet, Dependency, DependencyContext, DependencyKind, Host, Injectable, Network, PeerId,
    Peerstore, PrivateKey,
};
pub use transport::{CompressedTransport, TransportError};
