//! 설정 관리.
//!
//! 기본값 → TOML 파일 → 환경 변수(`SDUI__API__BASE_URL` 형식) 순으로 덮어씁니다.

use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::Duration;

use crate::logging::{LogConfig, LogFormat};

/// 환경 변수 접두사.
pub const ENV_PREFIX: &str = "SDUI";

/// SDUI 클라이언트 설정.
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct SduiConfig {
    /// 스키마 API 설정
    #[serde(default)]
    pub api: ApiConfig,
    /// 캐시 설정
    #[serde(default)]
    pub cache: CacheConfig,
    /// 로깅 설정
    #[serde(default)]
    pub logging: LoggingConfig,
}

/// 스키마 API 설정.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ApiConfig {
    /// API 기본 URL (예: "http://127.0.0.1:3000/api/v1")
    pub base_url: String,
    /// 요청 타임아웃 (초)
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
    /// 일시적 에러 재시도 횟수 (첫 요청 제외)
    #[serde(default = "default_max_retries")]
    pub max_retries: u32,
    /// 재시도 대기 단위 (밀리초, 시도 횟수에 비례)
    #[serde(default = "default_retry_backoff_ms")]
    pub retry_backoff_ms: u64,
}

fn default_timeout_secs() -> u64 {
    10
}
fn default_max_retries() -> u32 {
    2
}
fn default_retry_backoff_ms() -> u64 {
    300
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            base_url: "http://127.0.0.1:3000/api/v1".to_string(),
            timeout_secs: default_timeout_secs(),
            max_retries: default_max_retries(),
            retry_backoff_ms: default_retry_backoff_ms(),
        }
    }
}

impl ApiConfig {
    /// 지정한 기본 URL로 설정을 생성합니다.
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into(),
            ..Default::default()
        }
    }

    /// 요청 타임아웃.
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }

    /// `attempt`번째 재시도 전 대기 시간.
    pub fn backoff(&self, attempt: u32) -> Duration {
        Duration::from_millis(self.retry_backoff_ms * attempt as u64)
    }
}

/// 캐시 설정.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct CacheConfig {
    /// 스키마/Fragment 캐시 TTL (초)
    pub ttl_secs: u64,
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self { ttl_secs: 300 }
    }
}

impl CacheConfig {
    /// 캐시 TTL.
    pub fn ttl(&self) -> Duration {
        Duration::from_secs(self.ttl_secs)
    }
}

/// 로깅 설정.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// 로그 레벨
    pub level: String,
    /// 로그 형식 (pretty, json, compact)
    pub format: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            format: "pretty".to_string(),
        }
    }
}

impl LoggingConfig {
    /// 로깅 초기화용 설정으로 변환합니다. 알 수 없는 형식은 pretty로 처리합니다.
    pub fn to_log_config(&self) -> LogConfig {
        LogConfig::new(self.level.clone())
            .with_format(self.format.parse().unwrap_or(LogFormat::Pretty))
    }
}

impl SduiConfig {
    /// 파일(옵션)과 환경 변수에서 설정을 로드합니다.
    pub fn load<P: AsRef<Path>>(path: Option<P>) -> Result<Self, config::ConfigError> {
        let defaults = ApiConfig::default();
        let mut builder = config::Config::builder()
            // 기본값으로 시작
            .set_default("api.base_url", defaults.base_url)?
            .set_default("cache.ttl_secs", CacheConfig::default().ttl_secs)?;

        // 파일에서 로드
        if let Some(path) = path {
            builder = builder.add_source(config::File::from(path.as_ref()));
        }

        // 환경 변수로 오버라이드
        let config = builder
            .add_source(
                config::Environment::with_prefix(ENV_PREFIX)
                    .separator("__")
                    .try_parsing(true),
            )
            .build()?;

        config.try_deserialize()
    }

    /// 기본 경로(`config/sdui.toml`)가 있으면 읽고, 없으면 환경 변수만 사용합니다.
    pub fn load_default() -> Result<Self, config::ConfigError> {
        let path = Path::new("config/sdui.toml");
        if path.exists() {
            Self::load(Some(path))
        } else {
            Self::load(None::<&Path>)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_defaults() {
        let config = SduiConfig::default();
        assert_eq!(config.cache.ttl(), Duration::from_secs(300));
        assert_eq!(config.api.max_retries, 2);
        assert_eq!(config.api.backoff(2), Duration::from_millis(600));
    }

    #[test]
    fn test_load_from_file() {
        let mut file = tempfile::Builder::new().suffix(".toml").tempfile().unwrap();
        writeln!(
            file,
            r#"
[api]
base_url = "http://trader.local/api/v1"
max_retries = 0

[cache]
ttl_secs = 60
"#
        )
        .unwrap();

        let config = SduiConfig::load(Some(file.path())).unwrap();
        assert_eq!(config.api.base_url, "http://trader.local/api/v1");
        assert_eq!(config.api.max_retries, 0);
        assert_eq!(config.api.timeout_secs, 10);
        assert_eq!(config.cache.ttl_secs, 60);
        assert_eq!(config.logging.level, "info");
    }

    #[test]
    fn test_partial_tables_use_defaults() {
        let mut file = tempfile::Builder::new().suffix(".toml").tempfile().unwrap();
        writeln!(
            file,
            r#"
[logging]
level = "debug"

[cache]
"#
        )
        .unwrap();

        let config = SduiConfig::load(Some(file.path())).unwrap();
        assert_eq!(config.logging.level, "debug");
        assert_eq!(config.logging.format, "pretty");
        assert_eq!(config.cache.ttl_secs, 300);
        assert_eq!(config.api.max_retries, 2);
    }

    #[test]
    fn test_partial_api_table_keeps_field_defaults() {
        let api: ApiConfig = serde_json::from_str(r#"{"max_retries": 5}"#).unwrap();
        assert_eq!(api.max_retries, 5);
        assert_eq!(api.base_url, ApiConfig::default().base_url);
        assert_eq!(api.retry_backoff_ms, 300);
    }

    #[test]
    fn test_logging_config_conversion() {
        let logging = LoggingConfig {
            level: "debug".to_string(),
            format: "json".to_string(),
        };
        let log_config = logging.to_log_config();
        assert_eq!(log_config.level, "debug");
        assert_eq!(log_config.format, LogFormat::Json);
    }
}
