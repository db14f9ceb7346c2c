//! 进程内的最小宿主实现。
//!
//! 适用于单进程装配、示例与测试：网络视图与地址簿均保存在内存中，不涉及任何 I/O。

use std::{collections::BTreeMap, sync::Arc};

use parking_lot::RwLock;

use crate::dependency::{Host, Network, PeerId, Peerstore};

/// 固定监听地址的网络视图。
#[derive(Clone, Debug)]
pub struct StaticNetwork {
    local: PeerId,
    listen: Vec<String>,
}

impl StaticNetwork {
    pub fn new(local: PeerId) -> Self {
        Self {
            local,
            listen: Vec::new(),
        }
    }

    /// 追加监听地址。
    pub fn with_listen_address(mut self, address: impl Into<String>) -> Self {
        self.listen.push(address.into());
        self
    }
}

impl Network for StaticNetwork {
    fn local_peer(&self) -> PeerId {
        self.local.clone()
    }

    fn listen_addresses(&self) -> Vec<String> {
        self.listen.clone()
    }
}

/// 基于读写锁的内存地址簿。
///
/// 节点按 [`PeerId`] 排序保存，`peers` 的输出顺序稳定。
#[derive(Debug, Default)]
pub struct MemoryPeerstore {
    entries: RwLock<BTreeMap<PeerId, Vec<String>>>,
}

impl MemoryPeerstore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl Peerstore for MemoryPeerstore {
    fn peers(&self) -> Vec<PeerId> {
        self.entries.read().keys().cloned().collect()
    }

    fn addresses(&self, peer: &PeerId) -> Vec<String> {
        self.entries.read().get(peer).cloned().unwrap_or_default()
    }

    fn add_address(&self, peer: PeerId, address: String) {
        let mut entries = self.entries.write();
        let known = entries.entry(peer).or_default();
        if !known.contains(&address) {
            known.push(address);
        }
    }
}

/// 由固定身份、[`StaticNetwork`] 与 [`MemoryPeerstore`] 组成的宿主。
#[derive(Clone)]
pub struct StaticHost {
    id: PeerId,
    network: Arc<StaticNetwork>,
    peerstore: Arc<MemoryPeerstore>,
}

impl StaticHost {
    /// 以身份构造，网络视图无监听地址，地址簿为空。
    pub fn new(id: PeerId) -> Self {
        let network = Arc::new(StaticNetwork::new(id.clone()));
        Self {
            id,
            network,
            peerstore: Arc::new(MemoryPeerstore::new()),
        }
    }

    /// 替换网络视图。
    pub fn with_network(mut self, network: StaticNetwork) -> Self {
        self.network = Arc::new(network);
        self
    }

    /// 直接访问具体类型的地址簿，便于预置数据。
    pub fn memory_peerstore(&self) -> &Arc<MemoryPeerstore> {
        &self.peerstore
    }
}

impl Host for StaticHost {
    fn id(&self) -> PeerId {
        self.id.clone()
    }

    fn network(&self) -> Arc<dyn Network> {
        self.network.clone()
    }

    fn peerstore(&self) -> Arc<dyn Peerstore> {
        self.peerstore.clone()
    }
}

impl core::fmt::Debug for StaticHost {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("StaticHost")
            .field("id", &self.id)
            .field("network", &self.network)
            .finish_non_exhaustive()
    }
}
