//! 日志初始化
//!
//! 配置tracing日志框架。`RUST_LOG`环境变量优先，否则使用配置中的级别。

use tracing_subscriber::EnvFilter;

use crate::config::{LogLevel, LoggingConfig};

impl LogLevel {
    /// 对应的过滤指令
    pub fn as_directive(&self) -> &'static str {
        match self {
            LogLevel::Trace => "trace",
            LogLevel::Debug => "debug",
            LogLevel::Info => "info",
            LogLevel::Warn => "warn",
            LogLevel::Error => "error",
        }
    }
}

/// 安装全局 fmt 订阅者
///
/// 重复调用无副作用（已安装时返回`false`）。
pub fn init_logging(config: &LoggingConfig) -> bool {
    if !config.log_to_console {
        return false;
    }

    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(config.level.as_directive()));

    let installed = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(true)
        .try_init()
        .is_ok();
    if installed {
        tracing::debug!(target: "particlefx", "Logging initialized at {:?}", config.level);
    }
    installed
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_level_directive() {
        assert_eq!(LogLevel::Warn.as_directive(), "warn");
        assert_eq!(LogLevel::Trace.as_directive(), "trace");
    }

    #[test]
    fn test_console_disabled_skips_install() {
        let config = LoggingConfig {
            log_to_console: false,
            ..Default::default()
        };
        assert!(!init_logging(&config));
    }
}
