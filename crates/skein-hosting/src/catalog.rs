use std::collections::BTreeMap;

use skein_compression::CompressionSpec;
use thiserror::Error;

/// 登记构造器时可能遇到的错误。
#[derive(Debug, Error, PartialEq, Eq)]
pub enum CatalogError {
    /// 名称已被占用，禁止重复登记。
    #[error("compression constructor `{name}` already registered")]
    Duplicate { name: String },
}

/// `ConstructorCatalog` 维护配置文件可引用的压缩传输构造器目录。
///
/// # 教案级注释
/// - **目标 (Why)**
///   - 配置文件只能写字符串，需要一个“名称 → 描述”的目录把 `constructor = "snappy"` 翻译成
///     真正的 [`CompressionSpec`]；
///   - 命名冲突在登记时即被捕获，而不是等到装配阶段才发现。
/// - **设计要点 (How)**
///   - 内部使用 `BTreeMap<String, CompressionSpec>`，遍历顺序稳定，便于输出诊断信息；
///   - 值既可以是已构造实例，也可以是构造器，与宿主选项接受的形态一致。
/// - **契约 (What)**
///   - 名称区分大小写；
///   - 重复登记返回 [`CatalogError::Duplicate`]，目录保持登记前的状态。
#[derive(Debug, Default, Clone)]
pub struct ConstructorCatalog {
    entries: BTreeMap<String, CompressionSpec>,
}

impl ConstructorCatalog {
    /// 创建空目录。
    pub fn new() -> Self {
        Self::default()
    }

    /// 登记构造器或实例。
    pub fn register(
        &mut self,
        name: impl Into<String>,
        spec: impl Into<CompressionSpec>,
    ) -> Result<&mut Self, CatalogError> {
        let name = name.into();
        if self.entries.contains_key(&name) {
            return Err(CatalogError::Duplicate { name });
        }
        self.entries.insert(name, spec.into());
        Ok(self)
    }

    /// 按名称读取登记项，未命中返回 `None`。
    pub fn get(&self, name: &str) -> Option<&CompressionSpec> {
        self.entries.get(name)
    }

    /// 已登记的名称，按字典序。
    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.entries.keys().map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
