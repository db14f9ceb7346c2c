//! # error 模块说明
//!
//! ## 角色定位（Why）
//! - 为解析与聚合两个阶段提供集中定义的错误语义，调用方可据此区分“配置写错了”与“构造时失败了”；
//! - 所有错误都同步返回给直接调用方，本 crate 内部不记录、不重试、不吞掉任何错误。
//!
//! ## 设计要求（What）
//! - 错误类型派生 `thiserror::Error`，外部协作方的错误通过 `#[source]` 原样保留；
//! - 聚合阶段的构造失败总是附带失败的协议标识，便于排障。

use skein_core::{BoxError, DependencyKind};
use thiserror::Error;

/// 解析或调用构造器时的错误。
#[derive(Debug, Error)]
pub enum ConstructorError {
    /// 构造器声明了解析器不认可的依赖。
    ///
    /// - **时机**：解析阶段，构造器一次都不会被调用；
    /// - **契约**：`position` 为参数在声明顺序中的下标（从 0 开始），`kind` 为越界标签。
    #[error("constructor parameter #{position} requests unsupported dependency `{kind}`")]
    Signature {
        position: usize,
        kind: DependencyKind,
    },

    /// 动态构造器返回的值不满足压缩传输契约。
    ///
    /// - **时机**：调用阶段；解析阶段不检查返回类型。
    #[error("constructor returned `{found}`, expected `{expected}`")]
    TypeMismatch {
        expected: &'static str,
        found: &'static str,
    },

    /// 构造器声明的依赖在本次上下文中未提供。
    #[error("dependency `{kind}` for constructor parameter #{position} is not available")]
    MissingDependency {
        position: usize,
        kind: DependencyKind,
    },

    /// 从 [`Arguments`](crate::Arguments) 按类型取参时与实际依赖不符。
    #[error("argument #{position} expected `{expected}`, found {found:?}")]
    ArgumentMismatch {
        position: usize,
        expected: DependencyKind,
        found: Option<DependencyKind>,
    },

    /// 构造器自身报告失败，错误原样透传。
    #[error("compression transport constructor failed")]
    Construction(#[source] BoxError),
}

/// 聚合多个压缩传输时的错误。
#[derive(Debug, Error)]
pub enum AggregateError {
    /// 同一次聚合中出现重复的协议标识；此时尚未调用任何工厂。
    #[error("duplicate compression transport: {id}")]
    DuplicateTransport { id: String },

    /// 某个协议的工厂调用失败，聚合整体中止。
    #[error("failed to construct compression transport `{id}`")]
    Transport {
        id: String,
        #[source]
        source: ConstructorError,
    },
}

impl AggregateError {
    /// 失败关联的协议标识。
    pub fn id(&self) -> &str {
        match self {
            AggregateError::DuplicateTransport { id } | AggregateError::Transport { id, .. } => id,
        }
    }
}
