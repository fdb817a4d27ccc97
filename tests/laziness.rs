//! One-shot lazy computation of the mapping snapshot and the stub table.

mod common;

use std::sync::{
    atomic::{AtomicUsize, Ordering},
    Arc,
};

use aotmeta::prelude::*;
use common::{IlEmitter, Universe};

/// [`IlProvider`] decorator counting how many bodies were handed out.
struct CountingIlProvider {
    inner: StoredIlProvider,
    calls: AtomicUsize,
}

impl CountingIlProvider {
    fn new() -> Arc<Self> {
        Arc::new(CountingIlProvider {
            inner: StoredIlProvider,
            calls: AtomicUsize::new(0),
        })
    }

    fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

impl IlProvider for CountingIlProvider {
    fn method_il(&self, method: &MethodRc) -> aotmeta::Result<Vec<u8>> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.inner.method_il(method)
    }
}

fn manager_with_provider(
    universe: &Universe,
    modules: Vec<ModuleRc>,
    provider: Arc<CountingIlProvider>,
) -> MetadataManager {
    MetadataManager::new(
        universe.describing_module.clone(),
        modules,
        Vec::new(),
        provider,
        universe.registry.clone(),
    )
}

#[test]
fn snapshot_is_computed_exactly_once() {
    let universe = Universe::new();
    let module = Module::new("App");
    universe.define_type(&module, "App", "A", 0x02000010);

    let mut strong = IlEmitter::new();
    strong.record(Token::new(0x02000010), 1).ret();
    universe.attach_procedure("Metadata", 0x06000001, strong.into_body());

    let mut weak = IlEmitter::new();
    weak.ret();
    universe.attach_procedure("WeakMetadata", 0x06000002, weak.into_body());

    let provider = CountingIlProvider::new();
    let manager = manager_with_provider(&universe, vec![module], provider.clone());

    // Two different facade operations that both require the snapshot
    manager.compilation_modules_with_metadata().unwrap();
    manager.metadata().unwrap();
    manager.loaded_info().unwrap();

    // One decode pass: both table bodies fetched once, never again
    assert_eq!(provider.calls(), 2);
}

#[test]
fn failed_load_is_memoized() {
    let universe = Universe::new();
    let module = Module::new("App");

    // Unterminated table
    let mut emitter = IlEmitter::new();
    emitter.dead_record(0);
    universe.attach_procedure("Metadata", 0x06000001, emitter.into_body());

    let provider = CountingIlProvider::new();
    let manager = manager_with_provider(&universe, vec![module], provider.clone());

    assert!(manager.metadata().is_err());
    assert!(manager.metadata().is_err());
    assert!(manager.compilation_modules_with_metadata().is_err());

    // The failing decode ran once; the error is handed out from the cache afterwards
    assert_eq!(provider.calls(), 1);
}

#[test]
fn stub_table_is_computed_exactly_once() {
    let universe = Universe::new();
    let module = Module::new("App");
    let holder = universe.define_type(&module, "App", "Holder", 0x02000010);
    let method = universe.define_method(&holder, "Foo", 0x06000010, 0);
    universe.define_method(&holder, "Stub", 0x06000011, 0);

    let mut emitter = IlEmitter::new();
    emitter
        .stub_record(Token::new(0x06000010), Token::new(0x06000011))
        .ret();
    universe.attach_procedure("DynamicInvokeStubs", 0x06000001, emitter.into_body());

    let provider = CountingIlProvider::new();
    let manager = manager_with_provider(&universe, vec![module], provider.clone());

    assert!(manager.has_reflection_invoke_stub(&method).unwrap());
    assert!(manager.reflection_invoke_stub(&method).unwrap().is_some());
    assert_eq!(provider.calls(), 1);
}

#[test]
fn stub_queries_do_not_force_the_snapshot() {
    let universe = Universe::new();
    let module = Module::new("App");
    let holder = universe.define_type(&module, "App", "Holder", 0x02000010);
    let method = universe.define_method(&holder, "Foo", 0x06000010, 0);

    let mut metadata = IlEmitter::new();
    metadata.ret();
    universe.attach_procedure("Metadata", 0x06000001, metadata.into_body());

    let mut stubs = IlEmitter::new();
    stubs.ret();
    universe.attach_procedure("DynamicInvokeStubs", 0x06000002, stubs.into_body());

    let provider = CountingIlProvider::new();
    let manager = manager_with_provider(&universe, vec![module], provider.clone());

    manager.reflection_invoke_stub(&method).unwrap();
    // Only the stub table body was fetched
    assert_eq!(provider.calls(), 1);

    manager.metadata().unwrap();
    assert_eq!(provider.calls(), 2);
}

#[test]
fn concurrent_queries_share_one_computation() {
    let universe = Universe::new();
    let module = Module::new("App");
    for index in 0..32u32 {
        universe.define_type(&module, "App", &format!("T{index}"), 0x02000100 + index);
    }

    let mut emitter = IlEmitter::new();
    for index in 0..32u32 {
        emitter.record(Token::new(0x02000100 + index), index as i32);
    }
    emitter.ret();
    universe.attach_procedure("Metadata", 0x06000001, emitter.into_body());

    let provider = CountingIlProvider::new();
    let manager = Arc::new(manager_with_provider(
        &universe,
        vec![module],
        provider.clone(),
    ));

    let threads: Vec<_> = (0..8)
        .map(|_| {
            let manager = manager.clone();
            std::thread::spawn(move || {
                let metadata = manager.metadata().unwrap();
                metadata.type_mappings.len()
            })
        })
        .collect();

    for thread in threads {
        assert_eq!(thread.join().unwrap(), 32);
    }

    // All racers observed the same completed snapshot
    assert_eq!(provider.calls(), 1);
}
