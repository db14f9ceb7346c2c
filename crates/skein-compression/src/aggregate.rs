use std::collections::HashSet;

use skein_core::DependencyContext;
use tracing::{debug, trace};

use crate::{
    error::AggregateError, multistream::CompressionMultistream, resolver::CompressionFactory,
};

/// 带协议标识的工厂。
#[derive(Clone, Debug)]
pub struct MsCompressionFactory {
    /// 协议标识，例如 `/snappy/1.0.0`。
    pub id: String,
    pub factory: CompressionFactory,
}

impl MsCompressionFactory {
    pub fn new(id: impl Into<String>, factory: CompressionFactory) -> Self {
        Self {
            id: id.into(),
            factory,
        }
    }
}

/// 把多个带标识的工厂聚合为一个 [`CompressionMultistream`]。
///
/// # 教案级注释
/// - **执行步骤 (How)**
///   1. 预扫描全部标识，出现重复即返回 [`AggregateError::DuplicateTransport`]，此时不调用任何工厂；
///   2. 按输入顺序以 `context` 逐个调用工厂，首个失败立即返回 [`AggregateError::Transport`]，
///      剩余工厂不再调用；
///   3. 全部成功后按输入顺序注册到多协议传输并返回。
/// - **契约 (What)**
///   - 全有或全无：失败时调用方拿不到任何部分构建的结果；
///   - 工厂调用顺序严格等于输入顺序，工厂自身的副作用按此顺序发生；
///   - 不重试、不记录错误，错误同步返回给调用方。
/// - **并发 (Where)**：同步执行，不共享可变状态；不同上下文的并发调用互不影响。
#[tracing::instrument(level = "debug", skip_all, fields(transports = items.len()))]
pub fn build_compression_transport(
    context: &DependencyContext,
    items: &[MsCompressionFactory],
) -> Result<CompressionMultistream, AggregateError> {
    let mut seen = HashSet::with_capacity(items.len());
    for item in items {
        if !seen.insert(item.id.as_str()) {
            return Err(AggregateError::DuplicateTransport {
                id: item.id.clone(),
            });
        }
    }

    let mut constructed = Vec::with_capacity(items.len());
    for item in items {
        trace!(protocol = %item.id, "constructing compression transport");
        let transport = item
            .factory
            .create(context)
            .map_err(|source| AggregateError::Transport {
                id: item.id.clone(),
                source,
            })?;
        debug!(
            protocol = %item.id,
            transport = transport.transport_name(),
            "compression transport constructed"
        );
        constructed.push((item.id.clone(), transport));
    }

    let mut multistream = CompressionMultistream::default();
    for (id, transport) in constructed {
        multistream.add_transport(id, transport);
    }
    Ok(multistream)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        constructor::{CompressionSpec, DeferredConstructor, DynamicValue},
        error::ConstructorError,
        resolver::resolve_compression,
    };
    use skein_core::{
        BoxError, CompressedTransport, DependencyKind, Network, PeerId,
        memory::StaticHost,
        test_stubs::{IdentityTransport, XorTransport},
    };
    use std::sync::{
        Arc, Mutex,
        atomic::{AtomicUsize, Ordering},
    };
    use tracing_test::traced_test;

    fn context() -> DependencyContext {
        DependencyContext::from_host(Arc::new(StaticHost::new(PeerId::new("local"))))
    }

    fn counting(id: &str, calls: &Arc<AtomicUsize>) -> MsCompressionFactory {
        let counter = Arc::clone(calls);
        let factory = resolve_compression(CompressionSpec::constructor(move || {
            counter.fetch_add(1, Ordering::SeqCst);
            Ok::<_, BoxError>(IdentityTransport)
        }))
        .expect("resolve");
        MsCompressionFactory::new(id, factory)
    }

    fn failing(id: &str) -> MsCompressionFactory {
        let factory = resolve_compression(CompressionSpec::constructor(|_id: PeerId| {
            Err::<IdentityTransport, _>("socket unavailable")
        }))
        .expect("resolve");
        MsCompressionFactory::new(id, factory)
    }

    #[test]
    fn duplicate_identifier_is_rejected_before_any_construction() {
        let calls = Arc::new(AtomicUsize::new(0));
        let items = [
            counting("a", &calls),
            counting("b", &calls),
            counting("a", &calls),
        ];

        let error = build_compression_transport(&context(), &items).expect_err("duplicate");
        assert!(matches!(&error, AggregateError::DuplicateTransport { id } if id == "a"));
        assert_eq!(error.to_string(), "duplicate compression transport: a");
        assert_eq!(calls.load(Ordering::SeqCst), 0);
    }

    #[test]
    fn first_failure_aborts_and_names_the_protocol() {
        let calls = Arc::new(AtomicUsize::new(0));
        let items = [
            counting("x", &calls),
            failing("y"),
            counting("z", &calls),
        ];

        let error = build_compression_transport(&context(), &items).expect_err("y fails");
        match &error {
            AggregateError::Transport {
                id,
                source: ConstructorError::Construction(inner),
            } => {
                assert_eq!(id, "y");
                assert_eq!(inner.to_string(), "socket unavailable");
            }
            other => panic!("unexpected error: {other:?}"),
        }
        assert_eq!(error.id(), "y");
        assert_eq!(calls.load(Ordering::SeqCst), 1, "z must not be constructed");
    }

    #[test]
    fn successful_build_dispatches_by_identifier() {
        let xor: Arc<dyn CompressedTransport> = Arc::new(XorTransport::new(3));
        let items = [
            MsCompressionFactory::new("x", resolve_compression(Arc::clone(&xor)).expect("x")),
            MsCompressionFactory::new(
                "y",
                resolve_compression(CompressionSpec::prebuilt(IdentityTransport)).expect("y"),
            ),
        ];

        let mux = build_compression_transport(&context(), &items).expect("build");
        assert!(Arc::ptr_eq(mux.get("x").expect("x"), &xor));
        assert!(
            mux.get("y")
                .expect("y")
                .transport_name()
                .ends_with("IdentityTransport")
        );
        assert!(mux.get("z").is_none());
        assert_eq!(mux.protocols().collect::<Vec<_>>(), vec!["x", "y"]);
    }

    #[test]
    fn factories_run_in_input_order() {
        let order = Arc::new(Mutex::new(Vec::new()));
        let items: Vec<_> = ["/c", "/a", "/b"]
            .into_iter()
            .map(|id| {
                let log = Arc::clone(&order);
                let name = id.to_owned();
                let factory = resolve_compression(CompressionSpec::constructor(move || {
                    log.lock().expect("order log").push(name.clone());
                    Ok::<_, BoxError>(IdentityTransport)
                }))
                .expect("resolve");
                MsCompressionFactory::new(id, factory)
            })
            .collect();

        build_compression_transport(&context(), &items).expect("build");
        assert_eq!(*order.lock().expect("order log"), vec!["/c", "/a", "/b"]);
    }

    #[test]
    fn dynamic_constructor_type_errors_name_the_protocol() {
        let non_transport = DeferredConstructor::new([], |_| Ok(DynamicValue::new("plain text")));
        let wrong_argument = DeferredConstructor::new([DependencyKind::PeerId], |mut args| {
            let network: Arc<dyn Network> = args.take()?;
            Ok(DynamicValue::new(network))
        });

        let items = [
            MsCompressionFactory::new(
                "/identity/1.0.0",
                resolve_compression(CompressionSpec::prebuilt(IdentityTransport)).expect("resolve"),
            ),
            MsCompressionFactory::new(
                "/plugin/1.0.0",
                resolve_compression(non_transport).expect("resolve"),
            ),
        ];
        let error = build_compression_transport(&context(), &items).expect_err("not a transport");
        match &error {
            AggregateError::Transport {
                id,
                source: ConstructorError::TypeMismatch { found, .. },
            } => {
                assert_eq!(id, "/plugin/1.0.0");
                assert_eq!(*found, "&str");
            }
            other => panic!("unexpected error: {other:?}"),
        }

        let items = [MsCompressionFactory::new(
            "/plugin/2.0.0",
            resolve_compression(wrong_argument).expect("resolve"),
        )];
        let error = build_compression_transport(&context(), &items).expect_err("wrong argument");
        assert!(matches!(
            &error,
            AggregateError::Transport {
                id,
                source: ConstructorError::ArgumentMismatch {
                    position: 0,
                    expected: DependencyKind::Network,
                    found: Some(DependencyKind::PeerId),
                },
            } if id == "/plugin/2.0.0"
        ));
    }

    #[traced_test]
    #[test]
    fn construction_progress_is_traced() {
        let items = [MsCompressionFactory::new(
            "/identity/1.0.0",
            resolve_compression(CompressionSpec::prebuilt(IdentityTransport)).expect("resolve"),
        )];
        build_compression_transport(&context(), &items).expect("build");
        assert!(logs_contain("compression transport constructed"));
        assert!(logs_contain("/identity/1.0.0"));
    }
}
