/// 粒子特效配置
///
/// 提供TOML/JSON配置文件、环境变量覆盖和验证
use serde::{Deserialize, Serialize};
use std::env;
use std::fs;
use std::path::Path;
use thiserror::Error;

/// 单个世界中同时存活的粒子特效实例上限
pub const MAX_COMPONENT_COUNT: usize = 64;

/// 配置错误
#[derive(Error, Debug)]
pub enum ConfigError {
    /// 文件读取错误
    #[error("Config file error: {0}")]
    FileError(#[from] std::io::Error),
    /// 解析错误
    #[error("Config parse error: {0}")]
    ParseError(String),
    /// 验证错误
    #[error("Config validation error: {0}")]
    ValidationError(String),
}

pub type ConfigResult<T> = Result<T, ConfigError>;

/// 粒子特效世界配置（创建世界时读取，之后不再变化）
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ParticleFxConfig {
    /// 同时存活的特效实例数
    pub max_instance_count: usize,

    /// 同时存活的粒子数（决定顶点暂存缓冲区大小）
    pub max_particle_count: usize,

    /// 是否绘制调试线
    #[serde(default)]
    pub debug: bool,

    /// 日志配置
    #[serde(default)]
    pub logging: LoggingConfig,
}

impl_default!(ParticleFxConfig {
    max_instance_count: MAX_COMPONENT_COUNT,
    max_particle_count: 1024,
    debug: false,
    logging: LoggingConfig::default(),
});

impl ParticleFxConfig {
    /// 创建默认配置
    pub fn new() -> Self {
        Self::default()
    }

    /// 从TOML文件加载配置
    pub fn from_toml_file<P: AsRef<Path>>(path: P) -> ConfigResult<Self> {
        let content = fs::read_to_string(path).map_err(ConfigError::FileError)?;
        Self::from_toml_str(&content)
    }

    /// 从TOML字符串解析配置
    pub fn from_toml_str(content: &str) -> ConfigResult<Self> {
        toml::from_str(content).map_err(|e| ConfigError::ParseError(e.to_string()))
    }

    /// 从JSON文件加载配置
    pub fn from_json_file<P: AsRef<Path>>(path: P) -> ConfigResult<Self> {
        let content = fs::read_to_string(path).map_err(ConfigError::FileError)?;
        Self::from_json_str(&content)
    }

    /// 从JSON字符串解析配置
    pub fn from_json_str(content: &str) -> ConfigResult<Self> {
        serde_json::from_str(content).map_err(|e| ConfigError::ParseError(e.to_string()))
    }

    /// 保存为TOML文件
    pub fn save_toml<P: AsRef<Path>>(&self, path: P) -> ConfigResult<()> {
        let content =
            toml::to_string_pretty(self).map_err(|e| ConfigError::ParseError(e.to_string()))?;
        fs::write(path, content).map_err(ConfigError::FileError)
    }

    /// 从环境变量覆盖配置
    pub fn apply_env_overrides(&mut self) {
        if let Ok(val) = env::var("PARTICLEFX_MAX_INSTANCES") {
            if let Ok(count) = val.parse() {
                self.max_instance_count = count;
            }
        }
        if let Ok(val) = env::var("PARTICLEFX_MAX_PARTICLES") {
            if let Ok(count) = val.parse() {
                self.max_particle_count = count;
            }
        }
        if let Ok(val) = env::var("PARTICLEFX_DEBUG") {
            self.debug = val.parse().unwrap_or(self.debug);
        }
    }

    /// 验证配置
    pub fn validate(&self) -> ConfigResult<()> {
        if self.max_instance_count == 0 {
            return Err(ConfigError::ValidationError(
                "max_instance_count must be greater than zero".to_string(),
            ));
        }
        if self.max_particle_count == 0 {
            return Err(ConfigError::ValidationError(
                "max_particle_count must be greater than zero".to_string(),
            ));
        }
        Ok(())
    }

    /// 实际生效的实例池容量
    pub fn instance_capacity(&self) -> usize {
        self.max_instance_count.min(MAX_COMPONENT_COUNT)
    }
}

/// 日志配置
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    /// 日志级别
    pub level: LogLevel,

    /// 是否输出到控制台
    pub log_to_console: bool,
}

impl_default!(LoggingConfig {
    level: LogLevel::Info,
    log_to_console: true,
});

/// 日志级别
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum LogLevel {
    /// 跟踪
    Trace,
    /// 调试
    Debug,
    /// 信息
    Info,
    /// 警告
    Warn,
    /// 错误
    Error,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = ParticleFxConfig::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.instance_capacity(), MAX_COMPONENT_COUNT);
        assert!(!config.debug);
    }

    #[test]
    fn test_toml_serialization() {
        let config = ParticleFxConfig {
            max_particle_count: 4096,
            debug: true,
            ..Default::default()
        };
        let toml_str = toml::to_string(&config).unwrap();
        let parsed = ParticleFxConfig::from_toml_str(&toml_str).unwrap();
        assert_eq!(parsed.max_particle_count, 4096);
        assert!(parsed.debug);
    }

    #[test]
    fn test_json_defaults_for_optional_fields() {
        let parsed = ParticleFxConfig::from_json_str(
            r#"{ "max_instance_count": 8, "max_particle_count": 256 }"#,
        )
        .unwrap();
        assert_eq!(parsed.max_instance_count, 8);
        assert!(!parsed.debug);
        assert_eq!(parsed.logging.level, LogLevel::Info);
    }

    #[test]
    fn test_toml_file_roundtrip() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("particlefx.toml");
        let config = ParticleFxConfig {
            max_instance_count: 12,
            ..Default::default()
        };
        config.save_toml(&path).unwrap();
        let loaded = ParticleFxConfig::from_toml_file(&path).unwrap();
        assert_eq!(loaded.max_instance_count, 12);
    }

    #[test]
    fn test_validation_rejects_zero_counts() {
        let config = ParticleFxConfig {
            max_particle_count: 0,
            ..Default::default()
        };
        assert!(matches!(
            config.validate(),
            Err(ConfigError::ValidationError(_))
        ));
    }

    #[test]
    fn test_capacity_clamped_to_component_limit() {
        let config = ParticleFxConfig {
            max_instance_count: 1000,
            ..Default::default()
        };
        assert_eq!(config.instance_capacity(), MAX_COMPONENT_COUNT);
    }

    #[test]
    fn test_parse_error() {
        let result = ParticleFxConfig::from_toml_str("max_instance_count = \"lots\"");
        assert!(matches!(result, Err(ConfigError::ParseError(_))));
    }
}
