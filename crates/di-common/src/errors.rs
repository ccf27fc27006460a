//! 错误类型定义

use crate::key::ProviderKey;
use crate::lifecycle::ScopeId;
use thiserror::Error;

/// 依赖图错误类型
#[derive(Error, Debug)]
pub enum DependencyError {
    #[error("提供者未注册: {key}")]
    ProviderMissing { key: ProviderKey },

    #[error("提供者冲突: {key}, 已注册实现: {existing}, 新实现: {incoming}")]
    ProviderConflict {
        key: ProviderKey,
        existing: &'static str,
        incoming: &'static str,
    },

    #[error("检测到循环依赖: {chain}")]
    CircularDependency { key: ProviderKey, chain: String },

    #[error("提供实例失败: {key}, 原因: {message}")]
    Provide {
        key: ProviderKey,
        message: String,
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
    },

    #[error("引用计数下溢: {key} 的引用计数已经为 0")]
    ReferenceUnderflow { key: ProviderKey },

    #[error("解析深度超过上限 {max_depth}: {key}")]
    ResolutionTooDeep { key: ProviderKey, max_depth: usize },

    #[error("作用域不存在: {scope}")]
    ScopeNotFound { scope: ScopeId },
}

impl DependencyError {
    /// 创建提供实例失败错误
    pub fn provide(key: ProviderKey, message: impl Into<String>) -> Self {
        Self::Provide {
            key,
            message: message.into(),
            source: None,
        }
    }

    /// 创建带底层原因的提供实例失败错误
    pub fn provide_with_source(
        key: ProviderKey,
        source: impl Into<Box<dyn std::error::Error + Send + Sync>>,
    ) -> Self {
        let source = source.into();
        Self::Provide {
            key,
            message: source.to_string(),
            source: Some(source),
        }
    }

    /// 出错的提供者键
    pub fn key(&self) -> Option<&ProviderKey> {
        match self {
            Self::ProviderMissing { key }
            | Self::ProviderConflict { key, .. }
            | Self::CircularDependency { key, .. }
            | Self::Provide { key, .. }
            | Self::ReferenceUnderflow { key }
            | Self::ResolutionTooDeep { key, .. } => Some(key),
            Self::ScopeNotFound { .. } => None,
        }
    }
}

/// 配置错误类型
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("配置文件不存在: {path}")]
    FileNotFound { path: String },

    #[error("配置解析失败: {source}")]
    ParseError {
        source: Box<dyn std::error::Error + Send + Sync>,
    },

    #[error("配置验证失败: {message}")]
    ValidationError { message: String },

    #[error("日志初始化失败: {message}")]
    LoggingInitFailed { message: String },
}

/// 结果类型别名
pub type DependencyResult<T> = Result<T, DependencyError>;
pub type ConfigResult<T> = Result<T, ConfigError>;
