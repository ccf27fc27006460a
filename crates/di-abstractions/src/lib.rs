//! # Dependency Injection Abstractions
//!
//! 依赖图抽象层，定义引擎依赖但不实现的外部协作接口。
//!
//! ## 核心接口
//!
//! - [`ProviderFactory`] - 按提供者键创建新实例
//! - [`DependencyResolver`] - 工厂在构造过程中解析嵌套依赖
//! - [`Injectable`] / [`InjectionPoint`] - 枚举消费者的注入点
//! - [`Module`] - 模块声明，列出其贡献的绑定
//! - [`OnFreedListener`] - 提供者实例被释放时的回调

pub mod factory;
pub mod injection;
pub mod listener;
pub mod module;
pub mod resolver;

pub use factory::*;
pub use injection::*;
pub use listener::*;
pub use module::*;
pub use resolver::*;
