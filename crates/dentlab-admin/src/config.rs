//! 配置管理
//!
//! 配置按 内置默认值 → TOML文件 → `DENTLAB__*` 环境变量 的顺序叠加，加载后统一校验

use anyhow::{bail, Context, Result};
use config::{Config, Environment, File};
use serde::{Deserialize, Serialize};
use crate::logging::{is_valid_level, LogFormat};

/// 系统完整配置
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct LabConfig {
    /// 服务器配置
    pub server: ServerConfig,
    /// 数据库配置
    pub database: DatabaseConfig,
    /// 日志配置
    pub logging: LoggingConfig,
}

/// 服务器配置
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ServerConfig {
    /// 监听主机
    pub host: String,
    /// 监听端口
    pub port: u16,
    /// 允许任意来源跨域（前端开发服务器）
    pub cors_permissive: bool,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "127.0.0.1".to_string(),
            port: 3000,
            cors_permissive: true,
        }
    }
}

/// 存储后端
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum DatabaseBackend {
    Memory,
    Postgres,
}

/// 数据库配置
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct DatabaseConfig {
    pub backend: DatabaseBackend,
    /// 连接字符串，postgres后端必填
    pub url: Option<String>,
    /// 最大连接数
    pub max_connections: u32,
    /// 启动时自动建表
    pub auto_create_tables: bool,
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            backend: DatabaseBackend::Memory,
            url: None,
            max_connections: 10,
            auto_create_tables: true,
        }
    }
}

/// 日志配置
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct LoggingConfig {
    /// 日志级别
    pub level: String,
    /// 日志格式
    pub format: LogFormat,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            format: LogFormat::Text,
        }
    }
}

/// 配置验证器
#[derive(Debug)]
pub struct ConfigValidator {
    /// 验证规则
    validation_rules: Vec<ValidationRule>,
}

/// 验证规则
#[derive(Debug)]
struct ValidationRule {
    /// 字段路径
    field_path: &'static str,
    /// 验证函数
    validator: fn(&LabConfig) -> bool,
    /// 错误消息
    error_message: &'static str,
}

impl ConfigValidator {
    pub fn new() -> Self {
        let validation_rules = vec![
            ValidationRule {
                field_path: "server.port",
                validator: |c| c.server.port != 0,
                error_message: "port must be between 1 and 65535",
            },
            ValidationRule {
                field_path: "server.host",
                validator: |c| !c.server.host.trim().is_empty(),
                error_message: "host must not be empty",
            },
            ValidationRule {
                field_path: "database.url",
                validator: |c| {
                    c.database.backend != DatabaseBackend::Postgres
                        || c.database.url.as_deref().map_or(false, |u| !u.trim().is_empty())
                },
                error_message: "postgres backend requires a connection url",
            },
            ValidationRule {
                field_path: "database.max_connections",
                validator: |c| c.database.max_connections > 0,
                error_message: "max_connections must be positive",
            },
            ValidationRule {
                field_path: "logging.level",
                validator: |c| is_valid_level(&c.logging.level),
                error_message: "level must be one of trace, debug, info, warn, error",
            },
        ];

        Self { validation_rules }
    }

    /// 返回第一条未通过的规则
    pub fn validate(&self, config: &LabConfig) -> Result<()> {
        for rule in &self.validation_rules {
            if !(rule.validator)(config) {
                bail!("invalid configuration `{}`: {}", rule.field_path, rule.error_message);
            }
        }
        Ok(())
    }
}

impl Default for ConfigValidator {
    fn default() -> Self {
        Self::new()
    }
}

impl LabConfig {
    /// 加载配置；未指定路径时读取可选的 `dentlab.toml`
    pub fn load(config_path: Option<&str>) -> Result<Self> {
        let defaults = Config::try_from(&LabConfig::default())
            .context("Failed to build default configuration")?;

        let file = match config_path {
            Some(path) => File::with_name(path),
            None => File::with_name("dentlab").required(false),
        };

        let settings = Config::builder()
            .add_source(defaults)
            .add_source(file)
            .add_source(
                Environment::with_prefix("DENTLAB")
                    .separator("__")
                    .try_parsing(true),
            )
            .build()
            .context("Failed to read configuration sources")?;

        let config: LabConfig = settings
            .try_deserialize()
            .context("Failed to deserialize configuration")?;

        ConfigValidator::new().validate(&config)?;
        Ok(config)
    }

    /// 应用命令行覆盖项后重新校验
    pub fn apply_overrides(
        &mut self,
        host: Option<String>,
        port: Option<u16>,
        log_level: Option<String>,
    ) -> Result<()> {
        if let Some(host) = host {
            self.server.host = host;
        }
        if let Some(port) = port {
            self.server.port = port;
        }
        if let Some(level) = log_level {
            self.logging.level = level;
        }
        ConfigValidator::new().validate(self)
    }

    /// 序列化为TOML，用于生成配置文件模板
    pub fn to_toml(&self) -> Result<String> {
        toml::to_string_pretty(self).context("Failed to serialize configuration")
    }
}
