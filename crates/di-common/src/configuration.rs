//! 依赖图配置

use crate::errors::{ConfigError, ConfigResult};
use serde::{Deserialize, Serialize};
use std::path::Path;
use tracing::{debug, error};

/// 依赖图配置
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct GraphConfig {
    /// 最大解析深度
    pub max_resolution_depth: usize,
    /// 是否允许覆盖已注册但当前没有存活实例的提供者
    pub allow_override: bool,
    /// 是否记录每次引用计数变化
    pub log_reference_changes: bool,
}

impl Default for GraphConfig {
    fn default() -> Self {
        Self {
            max_resolution_depth: 64,
            allow_override: false,
            log_reference_changes: true,
        }
    }
}

impl GraphConfig {
    /// 环境变量前缀
    pub const ENV_PREFIX: &'static str = "DI_GRAPH";

    /// 从默认配置源加载
    ///
    /// 依次叠加 `config/graph`、`config/graph.local`（均可缺省）与 `DI_GRAPH_*` 环境变量。
    pub fn load() -> ConfigResult<Self> {
        let builder = config::Config::builder()
            .add_source(config::File::with_name("config/graph").required(false))
            .add_source(config::File::with_name("config/graph.local").required(false))
            .add_source(config::Environment::with_prefix(Self::ENV_PREFIX).try_parsing(true));

        Self::build(builder)
    }

    /// 从指定配置文件加载，格式由扩展名决定
    pub fn from_file<P: AsRef<Path>>(path: P) -> ConfigResult<Self> {
        let path = path.as_ref();
        if !path.exists() {
            return Err(ConfigError::FileNotFound {
                path: path.display().to_string(),
            });
        }

        debug!("加载依赖图配置文件: {}", path.display());
        let builder = config::Config::builder().add_source(config::File::from(path));
        Self::build(builder)
    }

    /// 验证配置
    pub fn validate(&self) -> ConfigResult<()> {
        if self.max_resolution_depth == 0 {
            return Err(ConfigError::ValidationError {
                message: "max_resolution_depth 必须大于 0".to_string(),
            });
        }
        Ok(())
    }

    fn build(
        builder: config::ConfigBuilder<config::builder::DefaultState>,
    ) -> ConfigResult<Self> {
        let settings = builder.build().map_err(|e| {
            error!("配置构建失败: {}", e);
            ConfigError::ParseError {
                source: Box::new(e),
            }
        })?;

        let config: Self = settings.try_deserialize().map_err(|e| {
            error!("配置绑定失败: {}", e);
            ConfigError::ParseError {
                source: Box::new(e),
            }
        })?;

        config.validate()?;
        Ok(config)
    }
}
