//! `resolution_properties` 集成测试：以公开 API 验证解析与聚合的性质。
//!
//! # 测试目标（Why）
//! - 依赖子集与声明顺序是任意的，逐个手写用例难以覆盖，使用 `proptest` 生成排列组合；
//! - 重复标识、越界签名两类失败必须发生在任何构造之前，以调用计数器验证。

use std::{
    collections::HashSet,
    sync::{
        Arc, Mutex,
        atomic::{AtomicUsize, Ordering},
    },
};

use proptest::prelude::*;
use skein_compression::{
    AggregateError, CompressionSpec, ConstructorError, DeferredConstructor, DynamicValue,
    MsCompressionFactory, build_compression_transport, resolve_compression,
};
use skein_core::{
    BoxError, CompressedTransport, Dependency, DependencyContext, DependencyKind, PeerId,
    PrivateKey,
    memory::StaticHost,
    test_stubs::{IdentityTransport, XorTransport},
};

const INJECTABLE: [DependencyKind; 4] = [
    DependencyKind::Host,
    DependencyKind::Network,
    DependencyKind::PeerId,
    DependencyKind::Peerstore,
];

fn full_context() -> DependencyContext {
    DependencyContext::from_host(Arc::new(StaticHost::new(PeerId::new("12D3KooWprop"))))
}

/// 按掩码保留上下文中的部分依赖，用于生成“任意上下文（含空上下文）”。
fn partial_context(mask: [bool; 4]) -> DependencyContext {
    let full = full_context();
    let mut context = DependencyContext::empty();
    for (kind, keep) in INJECTABLE.into_iter().zip(mask) {
        if !keep {
            continue;
        }
        context = match full.get(kind) {
            Some(Dependency::Host(host)) => context.with_host(host),
            Some(Dependency::Network(network)) => context.with_network(network),
            Some(Dependency::PeerId(id)) => context.with_peer_id(id),
            Some(Dependency::Peerstore(store)) => context.with_peerstore(store),
            _ => context,
        };
    }
    context
}

fn same_object(expected: &Dependency, actual: &Dependency) -> bool {
    match (expected, actual) {
        (Dependency::Host(a), Dependency::Host(b)) => {
            Arc::as_ptr(a) as *const () == Arc::as_ptr(b) as *const ()
        }
        (Dependency::Network(a), Dependency::Network(b)) => {
            Arc::as_ptr(a) as *const () == Arc::as_ptr(b) as *const ()
        }
        (Dependency::Peerstore(a), Dependency::Peerstore(b)) => {
            Arc::as_ptr(a) as *const () == Arc::as_ptr(b) as *const ()
        }
        (Dependency::PeerId(a), Dependency::PeerId(b)) => a == b,
        _ => false,
    }
}

fn injectable_permutation() -> impl Strategy<Value = Vec<DependencyKind>> {
    prop::sample::subsequence(INJECTABLE.to_vec(), 0..=INJECTABLE.len()).prop_shuffle()
}

proptest! {
    /// 已构造实例在任意上下文下都返回同一个对象。
    #[test]
    fn prebuilt_instance_is_returned_for_any_context(mask in prop::array::uniform4(any::<bool>())) {
        let transport: Arc<dyn CompressedTransport> = Arc::new(XorTransport::new(9));
        let factory = resolve_compression(Arc::clone(&transport)).expect("resolve");
        let produced = factory.create(&partial_context(mask)).expect("prebuilt never fails");
        prop_assert!(Arc::ptr_eq(&produced, &transport));
    }

    /// 任意子集、任意顺序的声明都能按类型拿到正确的依赖。
    #[test]
    fn constructor_receives_declared_kinds_in_declared_order(kinds in injectable_permutation()) {
        let received = Arc::new(Mutex::new(Vec::new()));
        let sink = Arc::clone(&received);
        let constructor = DeferredConstructor::new(kinds.clone(), move |mut args| {
            let mut values = Vec::new();
            while let Some(value) = args.next_dependency() {
                values.push(value);
            }
            *sink.lock().expect("sink") = values;
            Ok(DynamicValue::transport(IdentityTransport))
        });

        let context = full_context();
        let factory = resolve_compression(constructor).expect("subset is accepted");
        factory.create(&context).expect("all dependencies available");

        let received = received.lock().expect("sink");
        prop_assert_eq!(received.len(), kinds.len());
        for (kind, value) in kinds.iter().zip(received.iter()) {
            prop_assert_eq!(value.kind(), *kind);
            let expected = context.get(*kind).expect("context is full");
            prop_assert!(same_object(&expected, value));
        }
    }

    /// 任意位置出现越界依赖都会在解析阶段失败，且构造器从未被调用。
    #[test]
    fn unsupported_kind_is_rejected_without_invocation(
        kinds in injectable_permutation(),
        slot in any::<prop::sample::Index>(),
    ) {
        let mut declared = kinds;
        let position = slot.index(declared.len() + 1);
        declared.insert(position, DependencyKind::PrivateKey);

        let calls = Arc::new(AtomicUsize::new(0));
        let counter = Arc::clone(&calls);
        let constructor = DeferredConstructor::new(declared, move |_| {
            counter.fetch_add(1, Ordering::SeqCst);
            Ok(DynamicValue::transport(IdentityTransport))
        });

        match resolve_compression(constructor) {
            Err(ConstructorError::Signature { position: reported, kind }) => {
                prop_assert_eq!(reported, position);
                prop_assert_eq!(kind, DependencyKind::PrivateKey);
            }
            other => prop_assert!(false, "unexpected resolution: {:?}", other.map(|_| ())),
        }
        prop_assert_eq!(calls.load(Ordering::SeqCst), 0);
    }

    /// 出现重复标识时，报告第一个重复项且不调用任何工厂。
    #[test]
    fn duplicates_are_detected_before_construction(
        ids in prop::collection::vec(prop::sample::select(vec!["/a", "/b", "/c", "/d"]), 5..10),
    ) {
        let calls = Arc::new(AtomicUsize::new(0));
        let items: Vec<_> = ids
            .iter()
            .map(|id| {
                let counter = Arc::clone(&calls);
                let factory = resolve_compression(CompressionSpec::constructor(move || {
                    counter.fetch_add(1, Ordering::SeqCst);
                    Ok::<_, BoxError>(IdentityTransport)
                }))
                .expect("resolve");
                MsCompressionFactory::new(*id, factory)
            })
            .collect();

        let mut seen = HashSet::new();
        let first_repeat = ids.iter().find(|id| !seen.insert(**id)).expect("pigeonhole");

        match build_compression_transport(&full_context(), &items) {
            Err(AggregateError::DuplicateTransport { id }) => prop_assert_eq!(id.as_str(), *first_repeat),
            other => prop_assert!(false, "unexpected outcome: {:?}", other.map(|mux| mux.len())),
        }
        prop_assert_eq!(calls.load(Ordering::SeqCst), 0);
    }
}

#[test]
fn rebuilding_yields_identical_protocol_mapping() {
    let items = vec![
        MsCompressionFactory::new(
            "/xor/1.0.0",
            resolve_compression(CompressionSpec::constructor(|id: PeerId| {
                Ok::<_, BoxError>(XorTransport::new(id.as_str().len() as u8))
            }))
            .expect("resolve"),
        ),
        MsCompressionFactory::new(
            "/identity/1.0.0",
            resolve_compression(CompressionSpec::prebuilt(IdentityTransport)).expect("resolve"),
        ),
    ];
    let context = full_context();

    let first = build_compression_transport(&context, &items).expect("first build");
    let second = build_compression_transport(&context, &items).expect("second build");

    let mapping = |mux: &skein_compression::CompressionMultistream| {
        mux.iter()
            .map(|(id, transport)| (id.to_owned(), transport.transport_name()))
            .collect::<Vec<_>>()
    };
    assert_eq!(mapping(&first), mapping(&second));
    assert!(!Arc::ptr_eq(
        first.get("/xor/1.0.0").expect("xor"),
        second.get("/xor/1.0.0").expect("xor")
    ));
}

#[test]
fn private_key_in_context_is_still_not_injectable() {
    let context = full_context().with_private_key(PrivateKey::from_bytes(vec![1, 2, 3]));
    assert!(context.contains(DependencyKind::PrivateKey));

    let error = resolve_compression(CompressionSpec::constructor(|_key: PrivateKey| {
        Ok::<_, BoxError>(IdentityTransport)
    }))
    .expect_err("signature rejected regardless of context");
    assert_eq!(
        error.to_string(),
        "constructor parameter #0 requests unsupported dependency `private-key`"
    );
}
