//! # 导航场景演示
//!
//! 三个页面共享同一个控制器，控制器持有一个服务。
//! 页面来回切换时观察引用计数变化，最后一个页面关闭后两者依次被释放。

use di_abstractions::{Inject, Injectable, InjectionPoint, ModuleBuilder, ProviderDescriptor};
use di_common::{init_logging, GraphConfig, Lifetime, LoggingConfig};
use di_impl::Graph;
use std::sync::Arc;
use tracing::info;

trait Service: Send + Sync {
    fn fetch(&self) -> String;
}

struct InventoryService;

impl Service for InventoryService {
    fn fetch(&self) -> String {
        "3 件商品".to_string()
    }
}

trait Controller: Send + Sync {
    fn render(&self) -> String;
}

#[derive(Default)]
struct PageController {
    service: Inject<dyn Service>,
}

impl Injectable for PageController {
    fn injection_points(&mut self) -> Vec<&mut dyn InjectionPoint> {
        vec![&mut self.service as &mut dyn InjectionPoint]
    }
}

impl Controller for PageController {
    fn render(&self) -> String {
        self.service
            .get()
            .map_or_else(|| "未就绪".to_string(), |service| service.fetch())
    }
}

#[derive(Default)]
struct Page {
    name: &'static str,
    controller: Inject<dyn Controller>,
}

impl Page {
    fn new(name: &'static str) -> Self {
        Self {
            name,
            ..Self::default()
        }
    }
}

impl Injectable for Page {
    fn injection_points(&mut self) -> Vec<&mut dyn InjectionPoint> {
        vec![&mut self.controller as &mut dyn InjectionPoint]
    }
}

fn report(graph: &Graph, step: &str) -> anyhow::Result<()> {
    let controller = graph.get_provider::<dyn Controller>(None)?;
    let service = graph.get_provider::<dyn Service>(None)?;
    info!(
        "{}: 控制器引用 {}, 服务引用 {}",
        step,
        controller.reference_count(),
        service.reference_count()
    );
    Ok(())
}

fn open(graph: &Graph, page: &mut Page) -> anyhow::Result<()> {
    graph.inject(page)?;
    if let Some(controller) = page.controller.get() {
        info!("打开页面 {}: {}", page.name, controller.render());
    }
    report(graph, &format!("打开 {}", page.name))
}

fn close(graph: &Graph, page: &mut Page) -> anyhow::Result<()> {
    graph.release(page)?;
    report(graph, &format!("关闭 {}", page.name))
}

fn main() -> anyhow::Result<()> {
    init_logging(&LoggingConfig::development())?;

    let config = GraphConfig::load()?;
    let graph = Graph::with_config(config);

    let module = ModuleBuilder::new("navigation")
        .provide::<dyn Service, _>(Lifetime::Singleton, |_| {
            Ok(Arc::new(InventoryService) as Arc<dyn Service>)
        })
        .provide_injected::<dyn Controller, PageController>(Lifetime::Singleton, |c| {
            Arc::new(c) as Arc<dyn Controller>
        })
        .build();
    let cache = graph.register(&module)?;

    graph.register_provider_freed_listener(|provider: &ProviderDescriptor| {
        info!("已释放: {} ({})", provider.key, provider.implementation);
    });

    let mut home = Page::new("首页");
    let mut list = Page::new("列表");
    let mut detail = Page::new("详情");

    open(&graph, &mut home)?;
    open(&graph, &mut list)?;
    close(&graph, &mut home)?;
    open(&graph, &mut detail)?;
    close(&graph, &mut list)?;

    // 返回
    open(&graph, &mut list)?;
    close(&graph, &mut detail)?;
    open(&graph, &mut home)?;
    close(&graph, &mut list)?;

    info!("缓存项: {}", cache.len());
    close(&graph, &mut home)?;
    info!("退出后缓存项: {}, 统计: {:?}", cache.len(), graph.stats());

    Ok(())
}
