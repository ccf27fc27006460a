//! 日志初始化
//!
//! 引用计数变化走 `di_impl` 目标的 `debug!`，排查泄漏时只需放开这一个目标。

use crate::errors::{ConfigError, ConfigResult};
use serde::Deserialize;
use tracing_subscriber::EnvFilter;

/// 输出格式
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    /// 多行可读格式
    Pretty,
    /// 单行紧凑格式
    Compact,
    /// 结构化 JSON
    Json,
}

/// 日志配置
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// `EnvFilter` 过滤指令；设置了 `RUST_LOG` 时以环境变量为准
    pub directives: String,
    pub format: LogFormat,
    /// 在每条日志上标注线程，排查并发引用时有用
    pub thread_ids: bool,
    pub source_location: bool,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            directives: "info".to_string(),
            format: LogFormat::Compact,
            thread_ids: false,
            source_location: false,
        }
    }
}

impl LoggingConfig {
    /// 开发环境：打开依赖图引擎的引用计数日志
    pub fn development() -> Self {
        Self {
            directives: "info,di_impl=debug".to_string(),
            format: LogFormat::Pretty,
            thread_ids: true,
            source_location: true,
        }
    }

    /// 生产环境：只保留注册与释放事件，输出 JSON
    pub fn production() -> Self {
        Self {
            directives: "warn,di_impl=info".to_string(),
            format: LogFormat::Json,
            ..Self::default()
        }
    }

    /// 构造过滤器
    pub fn filter(&self) -> ConfigResult<EnvFilter> {
        if let Ok(filter) = EnvFilter::try_from_default_env() {
            return Ok(filter);
        }
        EnvFilter::try_new(&self.directives).map_err(|e| ConfigError::ValidationError {
            message: format!("无效的日志过滤指令 `{}`: {}", self.directives, e),
        })
    }
}

/// 初始化全局日志订阅者
///
/// 重复初始化返回错误而不是 panic，测试中可以放心调用。
pub fn init_logging(config: &LoggingConfig) -> ConfigResult<()> {
    let builder = tracing_subscriber::fmt()
        .with_env_filter(config.filter()?)
        .with_thread_ids(config.thread_ids)
        .with_file(config.source_location)
        .with_line_number(config.source_location);

    let result = match config.format {
        LogFormat::Pretty => builder.pretty().try_init(),
        LogFormat::Compact => builder.compact().try_init(),
        LogFormat::Json => builder.json().try_init(),
    };
    result.map_err(|e| ConfigError::LoggingInitFailed {
        message: e.to_string(),
    })?;

    tracing::debug!("日志系统初始化完成: {:?}", config.format);
    Ok(())
}
