//! 导航场景集成测试
//!
//! 视图之间来回切换时，共享的控制器及其服务只有在最后一个持有者释放后才被释放。

use di_abstractions::ProviderDescriptor;
use di_common::ProviderKey;
use di_impl::{Graph, ScopeCacheHandle};
use di_impl_integration_tests::{
    navigation_module, Controller, FixedService, MockFreedListener, Service, View,
};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

struct Navigation {
    graph: Graph,
    cache: ScopeCacheHandle,
    service: Arc<dyn Service>,
    controller_freed: Arc<AtomicUsize>,
    service_freed: Arc<AtomicUsize>,
}

impl Navigation {
    /// 注册导航模块；每个提供者的监听器期望被调用 `expected_frees` 次
    fn set_up(expected_frees: usize) -> Self {
        let service: Arc<dyn Service> = Arc::new(FixedService(7));
        let graph = Graph::new();
        let cache = graph.register(&navigation_module(Arc::clone(&service))).unwrap();

        let controller_freed = Arc::new(AtomicUsize::new(0));
        let service_freed = Arc::new(AtomicUsize::new(0));
        {
            let controller_freed = Arc::clone(&controller_freed);
            let service_freed = Arc::clone(&service_freed);
            graph.register_provider_freed_listener(move |provider: &ProviderDescriptor| {
                if provider.key.is::<dyn Service>() {
                    service_freed.fetch_add(1, Ordering::SeqCst);
                } else if provider.key.is::<dyn Controller>() {
                    controller_freed.fetch_add(1, Ordering::SeqCst);
                }
            });
        }

        let mut controller_listener = MockFreedListener::new();
        controller_listener
            .expect_on_freed()
            .withf(|provider| provider.key.is::<dyn Controller>() && provider.reference_count == 0)
            .times(expected_frees)
            .return_const(());
        graph
            .add_on_freed_listener::<dyn Controller, _>(None, controller_listener)
            .unwrap();

        let mut service_listener = MockFreedListener::new();
        service_listener
            .expect_on_freed()
            .withf(|provider| provider.key.is::<dyn Service>())
            .times(expected_frees)
            .return_const(());
        graph
            .add_on_freed_listener::<dyn Service, _>(None, service_listener)
            .unwrap();

        Self {
            graph,
            cache,
            service,
            controller_freed,
            service_freed,
        }
    }

    fn counts(&self) -> (usize, usize) {
        (
            self.graph
                .get_provider::<dyn Controller>(None)
                .unwrap()
                .reference_count(),
            self.graph
                .get_provider::<dyn Service>(None)
                .unwrap()
                .reference_count(),
        )
    }

    fn frees(&self) -> (usize, usize) {
        (
            self.controller_freed.load(Ordering::SeqCst),
            self.service_freed.load(Ordering::SeqCst),
        )
    }

    fn live_controller(&self) -> Arc<dyn Controller> {
        self.graph
            .get_provider::<dyn Controller>(None)
            .unwrap()
            .instance()
            .unwrap()
    }

    fn live_service(&self) -> Arc<dyn Service> {
        self.graph
            .get_provider::<dyn Service>(None)
            .unwrap()
            .instance()
            .unwrap()
    }

    fn is_cached(&self) -> (bool, bool) {
        (
            self.cache.contains(&ProviderKey::of::<dyn Controller>(None)),
            self.cache.contains(&ProviderKey::of::<dyn Service>(None)),
        )
    }

    /// 控制器与服务仍然存活，且就是给定的实例
    fn assert_still_alive(&self, controller: &Arc<dyn Controller>, service: &Arc<dyn Service>) {
        assert_eq!(self.frees(), (0, 0));
        assert_eq!(self.is_cached(), (true, true));
        assert!(Arc::ptr_eq(&self.live_controller(), controller));
        assert!(Arc::ptr_eq(&self.live_service(), service));
        assert_eq!(self.counts(), (1, 1));
    }

    fn assert_all_freed(&self) {
        assert_eq!(self.frees(), (1, 1));
        assert_eq!(self.is_cached(), (false, false));
        assert_eq!(self.counts(), (0, 0));
        assert_eq!(self.graph.stats().live_providers, 0);
    }
}

#[test]
fn test_nested_instance_lives_until_all_holders_are_released_by_injection() {
    let nav = Navigation::set_up(1);
    let mut view_a = View::default();
    let mut view_b = View::default();
    let mut view_c = View::default();

    // 进入 A
    nav.graph.inject(&mut view_a).unwrap();
    let controller_in_a = view_a.controller().unwrap();
    let service_in_a = view_a.service().unwrap();
    assert!(Arc::ptr_eq(&service_in_a, &nav.service));
    assert_eq!(nav.frees(), (0, 0));

    // A -> B
    nav.graph.inject(&mut view_b).unwrap();
    let controller_in_b = view_b.controller().unwrap();
    let service_in_b = view_b.service().unwrap();
    nav.graph.release(&mut view_a).unwrap();
    nav.assert_still_alive(&controller_in_a, &service_in_a);
    nav.assert_still_alive(&controller_in_b, &service_in_b);

    // B -> C
    nav.graph.inject(&mut view_c).unwrap();
    let controller_in_c = view_c.controller().unwrap();
    let service_in_c = view_c.service().unwrap();
    nav.graph.release(&mut view_b).unwrap();
    nav.assert_still_alive(&controller_in_c, &service_in_c);
    assert!(Arc::ptr_eq(&controller_in_a, &controller_in_b));
    assert!(Arc::ptr_eq(&controller_in_b, &controller_in_c));

    // 返回 B
    nav.graph.inject(&mut view_b).unwrap();
    assert!(Arc::ptr_eq(&controller_in_c, &view_b.controller().unwrap()));
    assert!(Arc::ptr_eq(&service_in_c, &service_in_b));
    nav.graph.release(&mut view_c).unwrap();
    nav.assert_still_alive(&controller_in_b, &service_in_b);

    // 返回 A
    nav.graph.inject(&mut view_a).unwrap();
    assert!(Arc::ptr_eq(&controller_in_b, &view_a.controller().unwrap()));
    nav.graph.release(&mut view_b).unwrap();
    nav.assert_still_alive(&controller_in_a, &service_in_a);

    // 退出
    nav.graph.release(&mut view_a).unwrap();
    nav.assert_all_freed();
}

#[test]
fn test_reference_and_dereference_count_like_injection() {
    let nav = Navigation::set_up(0);
    let mut view_a = View::default();
    let mut view_b = View::default();

    let _held = nav.graph.reference::<dyn Controller>(None).unwrap();
    assert_eq!(nav.counts(), (1, 1));

    nav.graph.inject(&mut view_a).unwrap();
    assert_eq!(nav.counts(), (2, 2));

    nav.graph
        .dereference(&view_a.controller().unwrap(), None)
        .unwrap();
    assert_eq!(nav.counts(), (1, 1));
    assert_eq!(nav.frees(), (0, 0));

    let _held_again = nav.graph.reference::<dyn Controller>(None).unwrap();
    assert_eq!(nav.counts(), (2, 2));

    nav.graph.inject(&mut view_b).unwrap();
    assert_eq!(nav.counts(), (3, 3));

    nav.graph.release(&mut view_a).unwrap();
    assert_eq!(nav.counts(), (2, 2));

    nav.graph
        .dereference(&view_b.controller().unwrap(), None)
        .unwrap();
    assert_eq!(nav.counts(), (1, 1));
    assert_eq!(nav.frees(), (0, 0));
}

#[test]
fn test_nested_instance_lives_until_all_holders_are_released_by_reference() {
    let nav = Navigation::set_up(1);
    let mut view_a = View::default();
    let mut view_b = View::default();
    let mut view_c = View::default();

    // 进入 A
    nav.graph.reference::<dyn Controller>(None).unwrap();
    nav.graph.inject(&mut view_a).unwrap();
    let controller_in_a = view_a.controller().unwrap();
    let service_in_a = view_a.service().unwrap();
    nav.graph.dereference(&controller_in_a, None).unwrap();
    assert_eq!(nav.frees(), (0, 0));

    // A -> B
    nav.graph.reference::<dyn Controller>(None).unwrap();
    nav.graph.inject(&mut view_b).unwrap();
    let controller_in_b = view_b.controller().unwrap();
    let service_in_b = view_b.service().unwrap();
    nav.graph.release(&mut view_a).unwrap();
    nav.graph.dereference(&controller_in_b, None).unwrap();
    nav.assert_still_alive(&controller_in_a, &service_in_a);
    nav.assert_still_alive(&controller_in_b, &service_in_b);

    // B -> C
    nav.graph.reference::<dyn Controller>(None).unwrap();
    nav.graph.inject(&mut view_c).unwrap();
    let controller_in_c = view_c.controller().unwrap();
    let service_in_c = view_c.service().unwrap();
    nav.graph.release(&mut view_b).unwrap();
    nav.graph.dereference(&controller_in_c, None).unwrap();
    nav.assert_still_alive(&controller_in_c, &service_in_c);
    assert!(Arc::ptr_eq(&controller_in_a, &controller_in_c));

    // 返回 B
    nav.graph.reference::<dyn Controller>(None).unwrap();
    nav.graph.inject(&mut view_b).unwrap();
    assert!(Arc::ptr_eq(&controller_in_c, &view_b.controller().unwrap()));
    nav.graph.release(&mut view_c).unwrap();
    nav.graph
        .dereference(&view_b.controller().unwrap(), None)
        .unwrap();
    nav.assert_still_alive(&controller_in_b, &service_in_b);

    // 返回 A
    nav.graph.reference::<dyn Controller>(None).unwrap();
    nav.graph.inject(&mut view_a).unwrap();
    assert!(Arc::ptr_eq(&controller_in_b, &view_a.controller().unwrap()));
    nav.graph.release(&mut view_b).unwrap();
    nav.graph
        .dereference(&view_a.controller().unwrap(), None)
        .unwrap();
    nav.assert_still_alive(&controller_in_a, &service_in_a);

    // 退出
    nav.graph.release(&mut view_a).unwrap();
    nav.assert_all_freed();
}

#[test]
fn test_release_of_empty_view_changes_nothing() -> anyhow::Result<()> {
    let nav = Navigation::set_up(1);
    let mut view = View::default();

    nav.graph.release(&mut view)?;
    assert_eq!(nav.counts(), (0, 0));

    nav.graph.inject(&mut view)?;
    nav.graph.release(&mut view)?;
    nav.graph.release(&mut view)?;
    assert_eq!(nav.counts(), (0, 0));
    assert_eq!(nav.frees(), (1, 1));
    Ok(())
}
