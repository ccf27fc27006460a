//! 依赖图集成测试夹具
//!
//! 导航场景：多个视图共享同一个控制器，控制器持有一个服务。

use di_abstractions::{
    DeclaredModule, Inject, Injectable, InjectionPoint, ModuleBuilder, OnFreedListener,
    ProviderDescriptor,
};
use di_common::Lifetime;
use mockall::mock;
use std::sync::Arc;

/// 服务契约
pub trait Service: Send + Sync {
    /// 服务编号
    fn id(&self) -> u32;
}

/// 固定编号的服务
#[derive(Debug)]
pub struct FixedService(pub u32);

impl Service for FixedService {
    fn id(&self) -> u32 {
        self.0
    }
}

/// 控制器契约
pub trait Controller: Send + Sync {
    /// 控制器持有的服务
    fn service(&self) -> Option<Arc<dyn Service>>;
}

/// 通过注入点获取服务的控制器
#[derive(Default)]
pub struct ControllerImpl {
    service: Inject<dyn Service>,
}

impl Injectable for ControllerImpl {
    fn injection_points(&mut self) -> Vec<&mut dyn InjectionPoint> {
        vec![&mut self.service as &mut dyn InjectionPoint]
    }
}

impl Controller for ControllerImpl {
    fn service(&self) -> Option<Arc<dyn Service>> {
        self.service.cloned()
    }
}

/// 需要控制器的视图
#[derive(Debug, Default)]
pub struct View {
    /// 控制器注入点
    pub controller: Inject<dyn Controller>,
}

impl View {
    /// 已注入的控制器
    pub fn controller(&self) -> Option<Arc<dyn Controller>> {
        self.controller.cloned()
    }

    /// 已注入控制器持有的服务
    pub fn service(&self) -> Option<Arc<dyn Service>> {
        self.controller()?.service()
    }
}

impl Injectable for View {
    fn injection_points(&mut self) -> Vec<&mut dyn InjectionPoint> {
        vec![&mut self.controller as &mut dyn InjectionPoint]
    }
}

mock! {
    /// 释放监听器
    pub FreedListener {}

    impl OnFreedListener for FreedListener {
        fn on_freed(&self, provider: &ProviderDescriptor);
    }
}

/// 导航模块：控制器与服务都是模块内单例
///
/// 服务工厂总是交出同一个服务对象，便于比较实例。
pub fn navigation_module(service: Arc<dyn Service>) -> DeclaredModule {
    ModuleBuilder::new("navigation")
        .provide_injected::<dyn Controller, ControllerImpl>(Lifetime::Singleton, |c| {
            Arc::new(c) as Arc<dyn Controller>
        })
        .provide::<dyn Service, _>(Lifetime::Singleton, move |_| Ok(Arc::clone(&service)))
        .build()
}
