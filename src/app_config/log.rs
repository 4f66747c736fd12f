use std::env;
use std::sync::OnceLock;

use tracing::info;
use tracing_appender::non_blocking::WorkerGuard;
use tracing_appender::rolling::{RollingFileAppender, Rotation};
use tracing_subscriber::fmt::MakeWriter;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::{fmt, EnvFilter, Layer, Registry};

use crate::app_config::env::{env_is_true, env_or_default};

// 全局变量用于保持日志文件句柄
static INFO_GUARD: OnceLock<WorkerGuard> = OnceLock::new();
static ERROR_GUARD: OnceLock<WorkerGuard> = OnceLock::new();

type BoxedLayer = Box<dyn Layer<Registry> + Send + Sync + 'static>;

// 日志配置结构体
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LogConfig {
    pub app_env: String,
    pub log_level: String,
    pub log_dir: String,
    pub log_rotation: String,
    pub json: bool,
    pub enable_console_logging: bool,
}

impl LogConfig {
    pub fn from_lookup<F>(lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        Self {
            app_env: env_or_default(&lookup, "APP_ENV", "local").to_lowercase(),
            log_level: env_or_default(&lookup, "LOG_LEVEL", "info"),
            log_dir: env_or_default(&lookup, "LOG_DIR", "log_files"),
            log_rotation: env_or_default(&lookup, "LOG_ROTATION", "daily"),
            json: env_or_default(&lookup, "LOG_FORMAT", "text").eq_ignore_ascii_case("json"),
            enable_console_logging: env_is_true(&lookup, "ENABLE_CONSOLE_LOGGING", true),
        }
    }

    pub fn from_env() -> Self {
        Self::from_lookup(|key| env::var(key).ok())
    }
}

// 解析时间轮转策略
fn parse_rotation(s: &str) -> Rotation {
    match s.to_lowercase().as_str() {
        "minutely" | "minute" | "min" => Rotation::MINUTELY,
        "hourly" | "hour" | "hr" => Rotation::HOURLY,
        "never" => Rotation::NEVER,
        _ => Rotation::DAILY,
    }
}

fn level_filter(level: &str) -> EnvFilter {
    EnvFilter::try_new(level).unwrap_or_else(|_| EnvFilter::new("info"))
}

fn fmt_layer<W>(writer: W, ansi: bool, json: bool, filter: EnvFilter) -> BoxedLayer
where
    W: for<'w> MakeWriter<'w> + Send + Sync + 'static,
{
    let layer = fmt::layer()
        .with_ansi(ansi)
        .with_target(false)
        .with_thread_ids(true)
        .with_file(true)
        .with_line_number(true)
        .with_level(true)
        .with_writer(writer);
    if json {
        layer.json().with_filter(filter).boxed()
    } else {
        layer.with_filter(filter).boxed()
    }
}

// 设置日志
pub fn setup_logging(config: &LogConfig) -> anyhow::Result<()> {
    // 本地环境：仅控制台输出
    if config.app_env == "local" {
        let layers = vec![fmt_layer(
            std::io::stdout,
            true,
            config.json,
            level_filter(&config.log_level),
        )];
        tracing::subscriber::set_global_default(Registry::default().with(layers))?;
        info!(log_level = %config.log_level, "Log configuration setup successfully!");
        return Ok(());
    }

    // 非本地环境：文件输出（可选控制台）
    std::fs::create_dir_all(&config.log_dir).map_err(|e| {
        anyhow::anyhow!("Failed to create log directory '{}': {}", config.log_dir, e)
    })?;

    let info_file =
        RollingFileAppender::new(parse_rotation(&config.log_rotation), &config.log_dir, "info.log");
    let error_file = RollingFileAppender::new(
        parse_rotation(&config.log_rotation),
        &config.log_dir,
        "error.log",
    );
    let (info_non_blocking, info_guard) = tracing_appender::non_blocking(info_file);
    let (error_non_blocking, error_guard) = tracing_appender::non_blocking(error_file);

    // 保存guard到全局，防止被丢弃
    INFO_GUARD
        .set(info_guard)
        .map_err(|_| anyhow::anyhow!("Failed to set INFO_GUARD"))?;
    ERROR_GUARD
        .set(error_guard)
        .map_err(|_| anyhow::anyhow!("Failed to set ERROR_GUARD"))?;

    let mut layers = vec![
        fmt_layer(
            info_non_blocking,
            false,
            config.json,
            level_filter(&config.log_level),
        ),
        fmt_layer(error_non_blocking, false, config.json, EnvFilter::new("error")),
    ];
    if config.enable_console_logging {
        layers.push(fmt_layer(
            std::io::stdout,
            false,
            config.json,
            level_filter(&config.log_level),
        ));
    }
    tracing::subscriber::set_global_default(Registry::default().with(layers))?;

    info!(
        app_env = %config.app_env,
        log_level = %config.log_level,
        log_dir = %config.log_dir,
        console = config.enable_console_logging,
        "Log configuration setup successfully!"
    );
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_log_config_defaults() {
        let config = LogConfig::from_lookup(|_| None);
        assert_eq!(config.app_env, "local");
        assert_eq!(config.log_level, "info");
        assert!(!config.json);
        assert!(config.enable_console_logging);
    }

    #[test]
    fn test_log_config_overrides() {
        let config = LogConfig::from_lookup(|key| match key {
            "APP_ENV" => Some("PROD".to_string()),
            "LOG_FORMAT" => Some("JSON".to_string()),
            "ENABLE_CONSOLE_LOGGING" => Some("false".to_string()),
            _ => None,
        });
        assert_eq!(config.app_env, "prod");
        assert!(config.json);
        assert!(!config.enable_console_logging);
    }

    #[test]
    fn test_parse_rotation() {
        assert_eq!(parse_rotation("HOURLY"), Rotation::HOURLY);
        assert_eq!(parse_rotation("bogus"), Rotation::DAILY);
    }
}
