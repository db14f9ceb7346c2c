#![deny(unsafe_code)]
#![doc = r#"
# skein-compression

## 设计动机（Why）
- 宿主配置允许用户以两种形态提供压缩传输：已经构造好的实例，或是一个只声明部分宿主依赖的构造器；
- 装配流程需要把两种形态统一为同一种工厂，再把多个带协议标识的工厂聚合为一个可按标识分派的多协议传输。

## 核心契约（What）
- [`Resolver::resolve`]：把 [`CompressionSpec`] 归一为 [`CompressionFactory`]；越界签名在任何构造之前被拒绝；
- [`build_compression_transport`]：先整体校验协议标识唯一，再按输入顺序逐个调用工厂，首个失败即整体失败；
- [`CompressionMultistream`]：聚合结果，构建完成后不可再增删协议。

## 实现策略（How）
- 依赖以 [`DependencyKind`](skein_core::DependencyKind) 标签声明，解析器按标签查表注入，替代运行期反射；
- 类型化构造器（普通闭包）在编译期确定参数与返回类型；动态构造器的返回值在调用时校验。

## 风险与考量（Trade-offs）
- 全流程同步执行，不提供取消与超时；需要超时的调用方应在外层包裹整个聚合调用。
"#]

mod aggregate;
mod constructor;
mod error;
mod multistream;
mod resolver;

pub use aggregate::{MsCompressionFactory, build_compression_transport};
pub use constructor::{Arguments, CompressionSpec, DeferredConstructor, DynamicValue, IntoConstructor};
pub use error::{AggregateError, ConstructorError};
pub use multistream::CompressionMultistream;
pub use resolver::{COMPRESSION_ARG_TYPES, CompressionFactory, Resolver, resolve_compression};
