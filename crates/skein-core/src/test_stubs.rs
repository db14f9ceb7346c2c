//! 压缩传输的测试桩集合。
//!
//! # 设计定位（Why）
//! - 解析器、聚合器与宿主装配的测试只关心“拿到的是哪个实例”，不关心压缩算法本身；
//! - 集中定义可逆的简单变换，避免各测试文件重复声明 `struct Dummy;`。
//!
//! # 契约说明（What）
//! - 所有桩均满足 [`CompressedTransport`] 的往返契约；
//! - 仅供测试使用，通过 `test-util` 特性对外暴露。

use crate::transport::{CompressedTransport, TransportError};

/// 原样返回负载。
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct IdentityTransport;

impl CompressedTransport for IdentityTransport {
    fn compress(&self, payload: &[u8]) -> Result<Vec<u8>, TransportError> {
        Ok(payload.to_vec())
    }

    fn decompress(&self, payload: &[u8]) -> Result<Vec<u8>, TransportError> {
        Ok(payload.to_vec())
    }
}

/// 逐字节异或固定密钥，空负载压缩与解压后仍为空。
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct XorTransport {
    pub key: u8,
}

impl XorTransport {
    pub const fn new(key: u8) -> Self {
        Self { key }
    }
}

impl CompressedTransport for XorTransport {
    fn compress(&self, payload: &[u8]) -> Result<Vec<u8>, TransportError> {
        Ok(payload.iter().map(|byte| byte ^ self.key).collect())
    }

    fn decompress(&self, payload: &[u8]) -> Result<Vec<u8>, TransportError> {
        Ok(payload.iter().map(|byte| byte ^ self.key).collect())
    }
}
