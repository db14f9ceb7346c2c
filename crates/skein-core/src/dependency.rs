//! # dependency 模块说明
//!
//! ## 角色定位（Why）
//! - 宿主装配流程中，不同的压缩传输实现需要的依赖各不相同：有的只关心本地身份，有的需要完整的网络视图；
//! - 本模块把“可注入的依赖”收敛为一份封闭的枚举清单，构造器只需声明自己需要其中哪些标签。
//!
//! ## 设计要求（What）
//! - [`DependencyKind`] 是唯一的类型标签来源，新增依赖种类必须同时扩展 [`Dependency`] 与 [`DependencyContext`]；
//! - [`ArgTypeSet`] 在解析器构造时即固定，运行期不可修改；
//! - [`DependencyContext`] 中每个槽位可选，缺失的依赖由调用方在注入时报告。
//!
//! ## 扩展建议（How）
//! - 为新的依赖实现 [`Injectable`] 后，即可出现在类型化构造器的参数列表中。

use core::fmt;
use std::sync::Arc;

/// 可注入依赖的类型标签。
///
/// 标签顺序即 [`DependencyContext::kinds`] 的遍历顺序。
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum DependencyKind {
    /// 宿主对象本身。
    Host,
    /// 宿主持有的网络视图。
    Network,
    /// 本地节点身份。
    PeerId,
    /// 节点地址簿。
    Peerstore,
    /// 本地节点私钥。压缩传输不允许注入该依赖。
    PrivateKey,
}

impl DependencyKind {
    /// 全部标签，按声明顺序排列。
    pub const ALL: [DependencyKind; 5] = [
        DependencyKind::Host,
        DependencyKind::Network,
        DependencyKind::PeerId,
        DependencyKind::Peerstore,
        DependencyKind::PrivateKey,
    ];

    /// 标签的稳定名称，用于日志与错误信息。
    pub const fn as_str(self) -> &'static str {
        match self {
            DependencyKind::Host => "host",
            DependencyKind::Network => "network",
            DependencyKind::PeerId => "peer-id",
            DependencyKind::Peerstore => "peerstore",
            DependencyKind::PrivateKey => "private-key",
        }
    }

    const fn bit(self) -> u8 {
        1 << (self as u8)
    }
}

impl fmt::Display for DependencyKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// 解析器认可的依赖标签集合。
///
/// # 教案级注释
/// - **意图 (Why)**：不同能力对可注入依赖的约束不同，例如压缩传输不应拿到私钥；
///   集合在解析器构造时固定，用于在任何构造尝试之前拒绝越界签名。
/// - **关键设计 (How)**：以位图表示，`const fn` 构造，便于声明为常量。
/// - **契约 (What)**：`contains` 为纯查询，集合本身为 `Copy`，可在多线程间自由传递。
#[derive(Clone, Copy, Default, PartialEq, Eq, Hash)]
pub struct ArgTypeSet {
    bits: u8,
}

impl ArgTypeSet {
    /// 空集合。
    pub const fn empty() -> Self {
        Self { bits: 0 }
    }

    /// 返回追加 `kind` 后的新集合。
    pub const fn with(self, kind: DependencyKind) -> Self {
        Self {
            bits: self.bits | kind.bit(),
        }
    }

    /// 由标签切片构造集合，重复标签会被合并。
    pub const fn of(kinds: &[DependencyKind]) -> Self {
        let mut set = Self::empty();
        let mut index = 0;
        while index < kinds.len() {
            set = set.with(kinds[index]);
            index += 1;
        }
        set
    }

    /// 判断 `kind` 是否被认可。
    pub const fn contains(&self, kind: DependencyKind) -> bool {
        self.bits & kind.bit() != 0
    }

    /// 按声明顺序遍历集合内的标签。
    pub fn iter(&self) -> impl Iterator<Item = DependencyKind> + '_ {
        DependencyKind::ALL
            .into_iter()
            .filter(move |kind| self.contains(*kind))
    }
}

impl fmt::Debug for ArgTypeSet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_set().entries(self.iter()).finish()
    }
}

/// 节点身份。
///
/// 内部以共享字符串保存编码后的标识，克隆开销为一次引用计数。
#[derive(Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct PeerId(Arc<str>);

impl PeerId {
    /// 以编码后的身份字符串构造。
    pub fn new(encoded: impl Into<Arc<str>>) -> Self {
        Self(encoded.into())
    }

    /// 读取编码后的身份字符串。
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for PeerId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// 节点私钥材料。`Debug` 输出不会泄露字节内容。
#[derive(Clone, PartialEq, Eq)]
pub struct PrivateKey(Arc<[u8]>);

impl PrivateKey {
    /// 以原始字节构造。
    pub fn from_bytes(bytes: impl Into<Arc<[u8]>>) -> Self {
        Self(bytes.into())
    }

    /// 访问原始字节。
    pub fn as_bytes(&self) -> &[u8] {
        &self.0
    }
}

impl fmt::Debug for PrivateKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PrivateKey")
            .field("len", &self.0.len())
            .finish_non_exhaustive()
    }
}

/// 宿主网络视图。
pub trait Network: Send + Sync + 'static {
    /// 本地节点身份。
    fn local_peer(&self) -> PeerId;

    /// 当前监听的地址列表。
    fn listen_addresses(&self) -> Vec<String>;
}

/// 节点地址簿。实现需自行保证并发读写安全。
pub trait Peerstore: Send + Sync + 'static {
    /// 已知节点列表。
    fn peers(&self) -> Vec<PeerId>;

    /// 查询某节点的已知地址，未知节点返回空列表。
    fn addresses(&self, peer: &PeerId) -> Vec<String>;

    /// 为节点追加地址，重复地址应被忽略。
    fn add_address(&self, peer: PeerId, address: String);
}

/// 宿主对象。
///
/// # 教案级注释
/// - **意图 (Why)**：装配流程拿到宿主后，即可派生出网络、身份与地址簿三类依赖；
/// - **契约 (What)**：三个访问器须返回同一宿主生命周期内稳定的对象，多次调用结果应一致。
pub trait Host: Send + Sync + 'static {
    /// 本地节点身份。
    fn id(&self) -> PeerId;

    /// 宿主持有的网络视图。
    fn network(&self) -> Arc<dyn Network>;

    /// 宿主持有的地址簿。
    fn peerstore(&self) -> Arc<dyn Peerstore>;
}

impl fmt::Debug for dyn Host {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Host").field("id", &self.id()).finish_non_exhaustive()
    }
}

/// 一个已就绪的依赖值。
#[derive(Clone)]
pub enum Dependency {
    Host(Arc<dyn Host>),
    Network(Arc<dyn Network>),
    PeerId(PeerId),
    Peerstore(Arc<dyn Peerstore>),
    PrivateKey(PrivateKey),
}

impl Dependency {
    /// 值对应的类型标签。
    pub fn kind(&self) -> DependencyKind {
        match self {
            Dependency::Host(_) => DependencyKind::Host,
            Dependency::Network(_) => DependencyKind::Network,
            Dependency::PeerId(_) => DependencyKind::PeerId,
            Dependency::Peerstore(_) => DependencyKind::Peerstore,
            Dependency::PrivateKey(_) => DependencyKind::PrivateKey,
        }
    }
}

impl fmt::Debug for Dependency {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Dependency::PeerId(id) => f.debug_tuple("Dependency::PeerId").field(id).finish(),
            Dependency::PrivateKey(key) => {
                f.debug_tuple("Dependency::PrivateKey").field(key).finish()
            }
            other => f
                .debug_tuple("Dependency")
                .field(&other.kind().as_str())
                .finish(),
        }
    }
}

/// 可出现在类型化构造器参数列表中的依赖类型。
///
/// # 教案级注释
/// - **意图 (Why)**：以编译期关联常量替代运行期反射，构造器的参数类型即其依赖声明；
/// - **契约 (What)**：`KIND` 必须与 `extract` 接受的 [`Dependency`] 变体一致；
///   `extract` 在变体不符时返回 `None`，由调用方转换为结构化错误。
pub trait Injectable: Sized + Send + 'static {
    /// 类型对应的依赖标签。
    const KIND: DependencyKind;

    /// 从依赖值中取出具体类型。
    fn extract(dependency: Dependency) -> Option<Self>;
}

impl Injectable for Arc<dyn Host> {
    const KIND: DependencyKind = DependencyKind::Host;

    fn extract(dependency: Dependency) -> Option<Self> {
        match dependency {
            Dependency::Host(host) => Some(host),
            _ => None,
        }
    }
}

impl Injectable for Arc<dyn Network> {
    const KIND: DependencyKind = DependencyKind::Network;

    fn extract(dependency: Dependency) -> Option<Self> {
        match dependency {
            Dependency::Network(network) => Some(network),
            _ => None,
        }
    }
}

impl Injectable for PeerId {
    const KIND: DependencyKind = DependencyKind::PeerId;

    fn extract(dependency: Dependency) -> Option<Self> {
        match dependency {
            Dependency::PeerId(id) => Some(id),
            _ => None,
        }
    }
}

impl Injectable for Arc<dyn Peerstore> {
    const KIND: DependencyKind = DependencyKind::Peerstore;

    fn extract(dependency: Dependency) -> Option<Self> {
        match dependency {
            Dependency::Peerstore(store) => Some(store),
            _ => None,
        }
    }
}

impl Injectable for PrivateKey {
    const KIND: DependencyKind = DependencyKind::PrivateKey;

    fn extract(dependency: Dependency) -> Option<Self> {
        match dependency {
            Dependency::PrivateKey(key) => Some(key),
            _ => None,
        }
    }
}

/// 一次装配调用可供注入的依赖集合。
///
/// # 教案级注释
/// - **目标 (Why)**
///   - 由外部协作方（宿主装配流程）提供，本 crate 只读取，不管理其中对象的生命周期；
///   - 每个槽位可选，以便测试或轻量场景只提供部分依赖。
/// - **设计要点 (How)**
///   - [`DependencyContext::from_host`] 与宿主装配流程一致：由宿主派生网络、身份与地址簿；
///   - `with_*` 系列方法以值语义逐项填充，适合在测试中构造部分上下文。
/// - **契约 (What)**
///   - [`get`](Self::get) 返回值为克隆，调用方可自由转移所有权；
///   - 上下文本身可克隆，克隆仅增加引用计数。
#[derive(Clone, Default)]
pub struct DependencyContext {
    host: Option<Arc<dyn Host>>,
    network: Option<Arc<dyn Network>>,
    peer_id: Option<PeerId>,
    peerstore: Option<Arc<dyn Peerstore>>,
    private_key: Option<PrivateKey>,
}

impl DependencyContext {
    /// 创建不含任何依赖的上下文。
    pub fn empty() -> Self {
        Self::default()
    }

    /// 从宿主派生完整上下文（私钥除外）。
    pub fn from_host(host: Arc<dyn Host>) -> Self {
        let network = host.network();
        let peer_id = host.id();
        let peerstore = host.peerstore();
        Self {
            host: Some(host),
            network: Some(network),
            peer_id: Some(peer_id),
            peerstore: Some(peerstore),
            private_key: None,
        }
    }

    pub fn with_host(mut self, host: Arc<dyn Host>) -> Self {
        self.host = Some(host);
        self
    }

    pub fn with_network(mut self, network: Arc<dyn Network>) -> Self {
        self.network = Some(network);
        self
    }

    pub fn with_peer_id(mut self, peer_id: PeerId) -> Self {
        self.peer_id = Some(peer_id);
        self
    }

    pub fn with_peerstore(mut self, peerstore: Arc<dyn Peerstore>) -> Self {
        self.peerstore = Some(peerstore);
        self
    }

    pub fn with_private_key(mut self, key: PrivateKey) -> Self {
        self.private_key = Some(key);
        self
    }

    /// 按标签读取依赖；未提供时返回 `None`。
    pub fn get(&self, kind: DependencyKind) -> Option<Dependency> {
        match kind {
            DependencyKind::Host => self.host.clone().map(Dependency::Host),
            DependencyKind::Network => self.network.clone().map(Dependency::Network),
            DependencyKind::PeerId => self.peer_id.clone().map(Dependency::PeerId),
            DependencyKind::Peerstore => self.peerstore.clone().map(Dependency::Peerstore),
            DependencyKind::PrivateKey => self.private_key.clone().map(Dependency::PrivateKey),
        }
    }

    pub fn contains(&self, kind: DependencyKind) -> bool {
        match kind {
            DependencyKind::Host => self.host.is_some(),
            DependencyKind::Network => self.network.is_some(),
            DependencyKind::PeerId => self.peer_id.is_some(),
            DependencyKind::Peerstore => self.peerstore.is_some(),
            DependencyKind::PrivateKey => self.private_key.is_some(),
        }
    }

    /// 已提供的依赖标签，按 [`DependencyKind::ALL`] 顺序。
    pub fn kinds(&self) -> impl Iterator<Item = DependencyKind> + '_ {
        DependencyKind::ALL
            .into_iter()
            .filter(move |kind| self.contains(*kind))
    }
}

impl fmt::Debug for DependencyContext {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DependencyContext")
            .field("provided", &self.kinds().collect::<Vec<_>>())
            .field("peer_id", &self.peer_id)
            .finish()
    }
}
