use core::fmt;
use std::{any::Any, sync::Arc};

use skein_core::{BoxError, CompressedTransport, Dependency, DependencyKind, Injectable};

use crate::error::ConstructorError;

/// 动态构造器返回值需要满足的契约名称。
const TRANSPORT_CONTRACT: &str = "dyn CompressedTransport";

/// 注入给构造器的实参，顺序与构造器声明的依赖顺序一致。
///
/// # 教案级注释
/// - **意图 (Why)**：构造器只拿到自己声明的那部分依赖，不感知上下文中其他对象；
/// - **契约 (What)**：[`take`](Self::take) 按声明顺序逐个消费，类型与实际依赖不符时返回
///   [`ConstructorError::ArgumentMismatch`]，不会 panic。
#[derive(Debug)]
pub struct Arguments {
    values: std::vec::IntoIter<Dependency>,
    position: usize,
}

impl Arguments {
    pub(crate) fn new(values: Vec<Dependency>) -> Self {
        Self {
            values: values.into_iter(),
            position: 0,
        }
    }

    /// 尚未消费的实参数量。
    pub fn remaining(&self) -> usize {
        self.values.len()
    }

    /// 按类型取出下一个实参。
    pub fn take<T: Injectable>(&mut self) -> Result<T, ConstructorError> {
        let position = self.position;
        let dependency = self
            .values
            .next()
            .ok_or(ConstructorError::ArgumentMismatch {
                position,
                expected: T::KIND,
                found: None,
            })?;
        self.position += 1;
        let found = dependency.kind();
        T::extract(dependency).ok_or(ConstructorError::ArgumentMismatch {
            position,
            expected: T::KIND,
            found: Some(found),
        })
    }

    /// 不做类型转换，直接取出下一个依赖值。
    pub fn next_dependency(&mut self) -> Option<Dependency> {
        let next = self.values.next();
        if next.is_some() {
            self.position += 1;
        }
        next
    }
}

/// 动态构造器的返回值：类型在调用时才校验。
///
/// # 教案级注释
/// - **契约 (What)**：以下三种形式在调用期被视为压缩传输，其余一律返回
///   [`ConstructorError::TypeMismatch`]，`found` 字段为构造时记录的类型名：
///   1. [`transport`](Self::transport) 包装的任意具体实现；
///   2. [`new`](Self::new) 包装的 `Arc<dyn CompressedTransport>`；
///   3. [`new`](Self::new) 包装的 `Box<dyn CompressedTransport>`。
/// - **风险提示 (Trade-offs)**：`new` 只知道 `T: Any`，无法得知具体类型是否实现了
///   [`CompressedTransport`]，因此具体实现应走 `transport`。
pub struct DynamicValue {
    value: Box<dyn Any + Send + Sync>,
    type_name: &'static str,
    as_transport: Option<IntoTransport>,
}

type IntoTransport = fn(Box<dyn Any + Send + Sync>) -> Option<Arc<dyn CompressedTransport>>;

fn concrete_transport<T: CompressedTransport>(
    value: Box<dyn Any + Send + Sync>,
) -> Option<Arc<dyn CompressedTransport>> {
    value
        .downcast::<T>()
        .ok()
        .map(|transport| Arc::new(*transport) as Arc<dyn CompressedTransport>)
}

impl DynamicValue {
    /// 包装任意值。
    pub fn new<T: Any + Send + Sync>(value: T) -> Self {
        Self {
            value: Box::new(value),
            type_name: core::any::type_name::<T>(),
            as_transport: None,
        }
    }

    /// 包装一个具体的压缩传输实现，保证通过调用期校验。
    pub fn transport<T: CompressedTransport>(transport: T) -> Self {
        Self {
            value: Box::new(transport),
            type_name: core::any::type_name::<T>(),
            as_transport: Some(concrete_transport::<T>),
        }
    }

    pub fn type_name(&self) -> &'static str {
        self.type_name
    }

    fn into_transport(self) -> Result<Arc<dyn CompressedTransport>, ConstructorError> {
        let Self {
            value,
            type_name: found,
            as_transport,
        } = self;
        let mismatch = || ConstructorError::TypeMismatch {
            expected: TRANSPORT_CONTRACT,
            found,
        };

        if let Some(convert) = as_transport {
            return convert(value).ok_or_else(mismatch);
        }
        let value = match value.downcast::<Arc<dyn CompressedTransport>>() {
            Ok(shared) => return Ok(*shared),
            Err(value) => value,
        };
        value
            .downcast::<Box<dyn CompressedTransport>>()
            .map(|boxed| Arc::<dyn CompressedTransport>::from(*boxed))
            .map_err(|_| mismatch())
    }
}

impl fmt::Debug for DynamicValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DynamicValue")
            .field("type_name", &self.type_name)
            .finish_non_exhaustive()
    }
}

type TypedCall =
    dyn Fn(Arguments) -> Result<Arc<dyn CompressedTransport>, ConstructorError> + Send + Sync;
type DynamicCall = dyn Fn(Arguments) -> Result<DynamicValue, BoxError> + Send + Sync;

#[derive(Clone)]
enum Invoke {
    Typed(Arc<TypedCall>),
    Dynamic(Arc<DynamicCall>),
}

/// 尚未调用的构造器：声明的依赖标签 + 可调用体。
///
/// # 教案级注释
/// - **意图 (Why)**
///   - 以数据形式声明“我需要哪些依赖、按什么顺序”，解析器据此查表注入，不依赖运行期反射；
///   - 既支持编译期类型化的普通闭包，也支持返回值晚绑定的动态构造器（例如来自插件目录）。
/// - **关键设计 (How)**
///   - [`from_fn`](Self::from_fn)：闭包参数类型即依赖声明，返回类型在编译期受
///     [`CompressedTransport`] 约束；
///   - [`new`](Self::new)：显式给出标签列表，闭包返回 [`DynamicValue`]，返回类型在调用时校验。
/// - **契约 (What)**
///   - 标签列表可以是任意子集、任意顺序，也允许重复；
///   - 克隆只增加引用计数，多个工厂可共享同一构造器。
#[derive(Clone)]
pub struct DeferredConstructor {
    params: Arc<[DependencyKind]>,
    invoke: Invoke,
}

impl DeferredConstructor {
    /// 以显式标签列表创建动态构造器。
    pub fn new<I, F>(params: I, constructor: F) -> Self
    where
        I: IntoIterator<Item = DependencyKind>,
        F: Fn(Arguments) -> Result<DynamicValue, BoxError> + Send + Sync + 'static,
    {
        Self {
            params: params.into_iter().collect(),
            invoke: Invoke::Dynamic(Arc::new(constructor)),
        }
    }

    /// 由类型化闭包创建构造器，参数类型需实现 [`Injectable`]。
    pub fn from_fn<F, Args>(constructor: F) -> Self
    where
        F: IntoConstructor<Args>,
    {
        constructor.into_constructor()
    }

    fn typed<F>(params: Vec<DependencyKind>, call: F) -> Self
    where
        F: Fn(Arguments) -> Result<Arc<dyn CompressedTransport>, ConstructorError>
            + Send
            + Sync
            + 'static,
    {
        Self {
            params: params.into(),
            invoke: Invoke::Typed(Arc::new(call)),
        }
    }

    /// 声明的依赖标签，按声明顺序。
    pub fn params(&self) -> &[DependencyKind] {
        &self.params
    }

    /// 返回值是否需要调用期校验。
    pub fn is_dynamic(&self) -> bool {
        matches!(self.invoke, Invoke::Dynamic(_))
    }

    pub(crate) fn invoke(
        &self,
        args: Arguments,
    ) -> Result<Arc<dyn CompressedTransport>, ConstructorError> {
        match &self.invoke {
            Invoke::Typed(call) => call(args),
            Invoke::Dynamic(call) => call(args)
                .map_err(|error| match error.downcast::<ConstructorError>() {
                    Ok(resolution) => *resolution,
                    Err(error) => ConstructorError::Construction(error),
                })?
                .into_transport(),
        }
    }
}

impl fmt::Debug for DeferredConstructor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DeferredConstructor")
            .field("params", &self.params)
            .field("dynamic", &self.is_dynamic())
            .finish()
    }
}

/// 可转换为 [`DeferredConstructor`] 的类型化闭包。
///
/// 为 0 到 4 个参数的闭包实现；每个参数类型须实现 [`Injectable`]，返回
/// `Result<T, E>`，其中 `T: CompressedTransport`、`E: Into<BoxError>`。
/// `Args` 仅用于区分不同参数个数的实现。
pub trait IntoConstructor<Args>: Send + Sync + 'static {
    fn into_constructor(self) -> DeferredConstructor;
}

macro_rules! impl_into_constructor {
    ($($arg:ident),*) => {
        impl<Func, T, E, $($arg,)*> IntoConstructor<($($arg,)*)> for Func
        where
            Func: Fn($($arg),*) -> Result<T, E> + Send + Sync + 'static,
            T: CompressedTransport,
            E: Into<BoxError>,
            $($arg: Injectable,)*
        {
            #[allow(non_snake_case, unused_mut, unused_variables)]
            fn into_constructor(self) -> DeferredConstructor {
                let params = vec![$(<$arg as Injectable>::KIND),*];
                let constructor = self;
                DeferredConstructor::typed(params, move |mut args: Arguments| {
                    $(let $arg = args.take::<$arg>()?;)*
                    let transport = constructor($($arg),*)
                        .map_err(|error| ConstructorError::Construction(error.into()))?;
                    Ok(Arc::new(transport) as Arc<dyn CompressedTransport>)
                })
            }
        }
    };
}

impl_into_constructor!();
impl_into_constructor!(A1);
impl_into_constructor!(A1, A2);
impl_into_constructor!(A1, A2, A3);
impl_into_constructor!(A1, A2, A3, A4);

/// 用户提供的压缩传输描述：已构造实例，或待调用的构造器。
#[derive(Clone)]
pub enum CompressionSpec {
    /// 立即可用的实例，解析后原样复用。
    Prebuilt(Arc<dyn CompressedTransport>),
    /// 延迟到聚合阶段调用的构造器。
    Deferred(DeferredConstructor),
}

impl CompressionSpec {
    /// 以具体实例构造。
    pub fn prebuilt<T: CompressedTransport>(transport: T) -> Self {
        Self::Prebuilt(Arc::new(transport))
    }

    /// 以类型化闭包构造。
    pub fn constructor<F, Args>(constructor: F) -> Self
    where
        F: IntoConstructor<Args>,
    {
        Self::Deferred(constructor.into_constructor())
    }
}

impl From<Arc<dyn CompressedTransport>> for CompressionSpec {
    fn from(value: Arc<dyn CompressedTransport>) -> Self {
        Self::Prebuilt(value)
    }
}

impl From<DeferredConstructor> for CompressionSpec {
    fn from(value: DeferredConstructor) -> Self {
        Self::Deferred(value)
    }
}

impl fmt::Debug for CompressionSpec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CompressionSpec::Prebuilt(transport) => f
                .debug_tuple("CompressionSpec::Prebuilt")
                .field(&transport.transport_name())
                .finish(),
            CompressionSpec::Deferred(constructor) => f
                .debug_tuple("CompressionSpec::Deferred")
                .field(constructor)
                .finish(),
        }
    }
}
