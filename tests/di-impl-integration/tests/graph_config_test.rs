//! 配置文件驱动的依赖图行为

use di_common::{DependencyError, GraphConfig};
use di_impl::Graph;
use di_impl_integration_tests::{navigation_module, Controller, FixedService, Service};
use std::io::Write;
use std::sync::Arc;

fn graph_from_toml(content: &str) -> anyhow::Result<Graph> {
    let mut file = tempfile::Builder::new().suffix(".toml").tempfile()?;
    file.write_all(content.as_bytes())?;

    let config = GraphConfig::from_file(file.path())?;
    Ok(Graph::with_config(config))
}

#[test]
fn test_depth_limit_from_config_file() -> anyhow::Result<()> {
    let graph = graph_from_toml("max_resolution_depth = 1\n")?;
    assert_eq!(graph.config().max_resolution_depth, 1);
    graph.register(&navigation_module(Arc::new(FixedService(1))))?;

    let result = graph.reference::<dyn Controller>(None);
    assert!(matches!(result, Err(DependencyError::ResolutionTooDeep { .. })));
    assert_eq!(graph.stats().live_providers, 0);
    Ok(())
}

#[test]
fn test_reregistered_module_keeps_first_factory() -> anyhow::Result<()> {
    let graph = graph_from_toml("log_reference_changes = false\n")?;
    assert!(!graph.config().log_reference_changes);
    graph.register(&navigation_module(Arc::new(FixedService(1))))?;

    // 工厂闭包类型相同，视为同一提供者，保留先注册的
    graph.register(&navigation_module(Arc::new(FixedService(2))))?;
    let service = graph.reference::<dyn Service>(None)?;
    assert_eq!(service.id(), 1);
    Ok(())
}

#[test]
fn test_missing_config_file_is_reported() {
    let result = GraphConfig::from_file("does/not/exist.toml");
    assert!(result.is_err());
}
