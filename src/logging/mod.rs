use crate::container::{Factory, ModuleDescriptor, MODULE};
use crate::errors::{invalid_value, ConfigError};
use std::fmt;
use std::str::FromStr;
use tracing::Level;
use tracing_subscriber::filter::LevelFilter;
use tracing_subscriber::{fmt as tracing_fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

/// 日志环境配置
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoggingEnvironment {
    /// 开发环境
    Development,
    /// 测试环境
    Testing,
    /// 生产环境
    Production,
}

/// 日志格式配置
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogFormat {
    /// 人类可读格式
    Pretty,
    /// 紧凑格式
    Compact,
}

impl FromStr for LogFormat {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "pretty" => Ok(LogFormat::Pretty),
            "compact" => Ok(LogFormat::Compact),
            _ => Err(invalid_value("log format", s)),
        }
    }
}

/// 日志配置
#[derive(Debug, Clone)]
pub struct LoggingConfig {
    /// 环境
    pub environment: LoggingEnvironment,
    /// 默认日志级别，设置了 `RUST_LOG` 时以其为准
    pub level: Level,
    /// 输出格式
    pub format: LogFormat,
    /// 是否显示目标模块
    pub show_target: bool,
    /// 是否显示线程ID
    pub show_thread_ids: bool,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            environment: LoggingEnvironment::Development,
            level: Level::INFO,
            format: LogFormat::Pretty,
            show_target: true,
            show_thread_ids: false,
        }
    }
}

impl LoggingConfig {
    /// 创建开发环境配置
    pub fn development() -> Self {
        Self {
            environment: LoggingEnvironment::Development,
            level: Level::DEBUG,
            format: LogFormat::Pretty,
            show_target: true,
            show_thread_ids: true,
        }
    }

    /// 创建生产环境配置
    pub fn production() -> Self {
        Self {
            environment: LoggingEnvironment::Production,
            level: Level::INFO,
            format: LogFormat::Compact,
            show_target: false,
            show_thread_ids: false,
        }
    }

    /// 创建测试环境配置
    pub fn testing() -> Self {
        Self {
            environment: LoggingEnvironment::Testing,
            level: Level::ERROR,
            format: LogFormat::Compact,
            show_target: false,
            show_thread_ids: false,
        }
    }
}

/// 初始化日志系统
///
/// 全局 subscriber 已存在时返回错误
pub fn init_logging(config: LoggingConfig) -> Result<(), ConfigError> {
    let filter = EnvFilter::builder()
        .with_default_directive(LevelFilter::from_level(config.level).into())
        .from_env_lossy();
    let ansi = config.environment != LoggingEnvironment::Production;

    let result = match config.format {
        LogFormat::Pretty => {
            let fmt_layer = tracing_fmt::layer()
                .pretty()
                .with_target(config.show_target)
                .with_thread_ids(config.show_thread_ids)
                .with_ansi(ansi);

            tracing_subscriber::registry().with(filter).with(fmt_layer).try_init()
        }
        LogFormat::Compact => {
            let fmt_layer = tracing_fmt::layer()
                .compact()
                .with_target(config.show_target)
                .with_thread_ids(config.show_thread_ids)
                .with_ansi(ansi);

            tracing_subscriber::registry().with(filter).with(fmt_layer).try_init()
        }
    };
    result.map_err(|e| ConfigError::Logging(e.to_string()))?;

    tracing::debug!(
        environment = ?config.environment,
        level = ?config.level,
        format = ?config.format,
        "Logging system initialized"
    );

    Ok(())
}

/// 带模块名的日志记录器
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ModuleLogger {
    module: String,
}

impl ModuleLogger {
    pub fn new(module: impl Into<String>) -> Self {
        Self {
            module: module.into(),
        }
    }

    pub fn module(&self) -> &str {
        &self.module
    }

    pub fn debug(&self, message: impl fmt::Display) {
        tracing::debug!(module = %self.module, "{}", message);
    }

    pub fn info(&self, message: impl fmt::Display) {
        tracing::info!(module = %self.module, "{}", message);
    }

    pub fn warn(&self, message: impl fmt::Display) {
        tracing::warn!(module = %self.module, "{}", message);
    }

    pub fn error(&self, message: impl fmt::Display) {
        tracing::error!(module = %self.module, "{}", message);
    }
}

/// Transient factory for a [`ModuleLogger`] named after whoever requests it.
///
/// Register it as `log` and every service declaring `log` gets its own logger.
pub fn logger_factory() -> Factory {
    Factory::value(|args, _| {
        let module = args.get::<ModuleDescriptor>(0)?;
        Ok(ModuleLogger::new(module.name()))
    })
    .param(MODULE)
    .transient()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_logging_config_creation() {
        let dev_config = LoggingConfig::development();
        assert_eq!(dev_config.environment, LoggingEnvironment::Development);
        assert_eq!(dev_config.level, Level::DEBUG);
        assert_eq!(dev_config.format, LogFormat::Pretty);

        let prod_config = LoggingConfig::production();
        assert_eq!(prod_config.environment, LoggingEnvironment::Production);
        assert_eq!(prod_config.level, Level::INFO);
        assert_eq!(prod_config.format, LogFormat::Compact);

        let test_config = LoggingConfig::testing();
        assert_eq!(test_config.environment, LoggingEnvironment::Testing);
        assert_eq!(test_config.level, Level::ERROR);
    }

    #[test]
    fn test_log_format_from_str() {
        assert_eq!("Pretty".parse::<LogFormat>().unwrap(), LogFormat::Pretty);
        assert_eq!("compact".parse::<LogFormat>().unwrap(), LogFormat::Compact);
        assert!("json".parse::<LogFormat>().is_err());
    }

    #[test]
    fn test_logger_factory_is_transient_and_asks_for_module() {
        let factory = logger_factory();
        assert!(factory.is_transient());
        assert_eq!(factory.param_specs().len(), 1);
    }

    #[test]
    fn test_logger_factory_names_logger_after_consumer() {
        let consumer = Factory::value(|args, _| Ok(args.get::<ModuleLogger>(0)?.module().to_string()));
        let container = crate::create_container(
            crate::Factories::new()
                .register("log", logger_factory())
                .register("demo", consumer.clone().param("log"))
                .register("report", consumer.param("log")),
        )
        .unwrap();

        assert_eq!(*container.get::<String>("demo").unwrap(), "demo");
        assert_eq!(*container.get::<String>("report").unwrap(), "report");
        assert_eq!(container.get::<ModuleLogger>("log").unwrap().module(), "(root)");
        assert!(!container.is_resolved("log"));
    }

    #[test]
    fn test_module_logger_keeps_name() {
        let logger = ModuleLogger::new("demo");
        assert_eq!(logger.module(), "demo");
        logger.info("Example = 6");
    }
}
