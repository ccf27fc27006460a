//! # DI Common
//!
//! 依赖注入图的公共基础设施：提供者键、生命周期、错误类型、配置与日志。
//!
//! ## 核心类型
//!
//! - [`ProviderKey`] - 提供者键（契约类型 + 限定符）
//! - [`Qualifier`] - 限定符，用于区分同一契约类型的多个提供者
//! - [`Lifetime`] - 提供者生命周期策略
//! - [`DependencyError`] - 依赖图错误
//! - [`GraphConfig`] - 依赖图配置
//! - [`LoggingConfig`] - 日志配置

pub mod configuration;
pub mod errors;
pub mod key;
pub mod lifecycle;
pub mod logging;

pub use configuration::*;
pub use errors::*;
pub use key::*;
pub use lifecycle::*;
pub use logging::*;
