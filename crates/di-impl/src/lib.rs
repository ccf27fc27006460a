//! # 依赖图引擎
//!
//! 引用计数的依赖注入图：提供者注册表、作用域缓存、引用计数与级联释放、
//! 构造过程中的循环依赖检测。
//!
//! ## 使用示例
//!
//! ```ignore
//! let graph = Graph::new();
//! graph.register(&module)?;
//!
//! let mut view = View::default();
//! graph.inject(&mut view)?;
//! // ...
//! graph.release(&mut view)?;
//! ```

mod graph;
mod provider;
mod registry;
mod resolution;
mod scope_cache;
mod state;

pub use graph::{Graph, GraphStats, ProviderHandle, ScopeCacheHandle};
pub use scope_cache::CacheItem;
