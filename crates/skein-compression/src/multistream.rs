use core::fmt;
use std::{collections::BTreeMap, sync::Arc};

use skein_core::{CompressedTransport, TransportError};

/// 按协议标识分派的多协议压缩传输。
///
/// # 教案级注释
/// - **意图 (Why)**
///   - 宿主只持有一个压缩能力对象，下游协商层再按协商出的协议标识取出具体实现；
/// - **架构位置 (Where)**
///   - 由 [`build_compression_transport`](crate::build_compression_transport) 一次性构建，
///     构建完成后交由宿主装配流程持有；
/// - **设计要点 (How)**
///   - `entries` 保存注册顺序，`index` 提供按标识查找；
///   - 作为单一 [`CompressedTransport`] 使用时，委托给注册顺序首位（首选）协议；
/// - **契约 (What)**
///   - 对外不提供增删接口，构建后不可变；
///   - 未注册的标识查找返回 `None`。
#[derive(Clone, Default)]
pub struct CompressionMultistream {
    entries: Vec<(String, Arc<dyn CompressedTransport>)>,
    index: BTreeMap<String, usize>,
}

impl CompressionMultistream {
    /// 注册协议。重复标识由聚合器在此之前拦截。
    pub(crate) fn add_transport(&mut self, id: String, transport: Arc<dyn CompressedTransport>) {
        debug_assert!(!self.index.contains_key(&id), "duplicate protocol `{id}`");
        self.index.insert(id.clone(), self.entries.len());
        self.entries.push((id, transport));
    }

    /// 按协议标识查找实现。
    pub fn get(&self, id: &str) -> Option<&Arc<dyn CompressedTransport>> {
        self.index.get(id).map(|&slot| &self.entries[slot].1)
    }

    pub fn contains(&self, id: &str) -> bool {
        self.index.contains_key(id)
    }

    /// 协议标识，按注册顺序。
    pub fn protocols(&self) -> impl Iterator<Item = &str> {
        self.entries.iter().map(|(id, _)| id.as_str())
    }

    /// 全部条目，按注册顺序。
    pub fn iter(&self) -> impl Iterator<Item = (&str, &Arc<dyn CompressedTransport>)> {
        self.entries
            .iter()
            .map(|(id, transport)| (id.as_str(), transport))
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// 首选协议：注册顺序首位。
    pub fn preferred(&self) -> Option<(&str, &Arc<dyn CompressedTransport>)> {
        self.iter().next()
    }

    /// 在对端提议的标识中选出第一个本地已注册的协议。
    ///
    /// 只完成本地匹配；提议的收发与确认由协商层负责。
    pub fn select<I, S>(&self, proposals: I) -> Option<(&str, &Arc<dyn CompressedTransport>)>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        proposals.into_iter().find_map(|proposal| {
            self.index.get(proposal.as_ref()).map(|&slot| {
                let (id, transport) = &self.entries[slot];
                (id.as_str(), transport)
            })
        })
    }

    fn preferred_transport(&self) -> Result<&Arc<dyn CompressedTransport>, TransportError> {
        self.preferred()
            .map(|(_, transport)| transport)
            .ok_or(TransportError::NoProtocols)
    }
}

impl CompressedTransport for CompressionMultistream {
    fn compress(&self, payload: &[u8]) -> Result<Vec<u8>, TransportError> {
        self.preferred_transport()?.compress(payload)
    }

    fn decompress(&self, payload: &[u8]) -> Result<Vec<u8>, TransportError> {
        self.preferred_transport()?.decompress(payload)
    }
}

impl fmt::Debug for CompressionMultistream {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_map()
            .entries(
                self.entries
                    .iter()
                    .map(|(id, transport)| (id, transport.transport_name())),
            )
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use skein_core::test_stubs::{IdentityTransport, XorTransport};

    fn sample() -> CompressionMultistream {
        let mut mux = CompressionMultistream::default();
        mux.add_transport("/xor/1.0.0".into(), Arc::new(XorTransport::new(0x0f)));
        mux.add_transport("/identity/1.0.0".into(), Arc::new(IdentityTransport));
        mux
    }

    #[test]
    fn select_prefers_proposal_order_over_registration_order() {
        let mux = sample();
        let (id, _) = mux
            .select(["/lz4/1.0.0", "/identity/1.0.0", "/xor/1.0.0"])
            .expect("one proposal is supported");
        assert_eq!(id, "/identity/1.0.0");
        assert!(mux.select(["/zstd/1.0.0"]).is_none());
    }

    #[test]
    fn acts_as_single_transport_through_preferred_protocol() {
        let mux = sample();
        let packed = mux.compress(b"abc").expect("compress");
        assert_eq!(packed, XorTransport::new(0x0f).compress(b"abc").expect("xor"));
        assert_eq!(mux.decompress(&packed).expect("decompress"), b"abc");
    }

    #[test]
    fn empty_multistream_has_no_preferred_protocol() {
        let mux = CompressionMultistream::default();
        assert!(matches!(mux.compress(b"x"), Err(TransportError::NoProtocols)));
        assert_eq!(format!("{mux:?}"), "{}");
    }
}
