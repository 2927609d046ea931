//! SDUI 클라이언트 에러 타입.

use thiserror::Error;

/// 스키마 조회/해석 에러.
#[derive(Debug, Clone, Error)]
pub enum SduiError {
    /// 설정 에러
    #[error("설정 에러: {0}")]
    Config(String),

    /// 네트워크 에러 (연결 실패, 타임아웃)
    #[error("네트워크 에러: {0}")]
    Network(String),

    /// HTTP 상태 코드 에러
    #[error("HTTP {status} 에러: {message}")]
    Http { status: u16, message: String },

    /// 찾을 수 없음 (404)
    #[error("찾을 수 없음: {0}")]
    NotFound(String),

    /// 응답 본문 해석 실패
    #[error("응답 해석 에러: {0}")]
    Decode(String),
}

/// SDUI 작업을 위한 Result 타입.
pub type SduiResult<T> = Result<T, SduiError>;

impl SduiError {
    /// 재시도 가능한 에러인지 확인합니다.
    ///
    /// 네트워크 에러, 429, 5xx만 일시적 에러로 봅니다.
    pub fn is_retryable(&self) -> bool {
        match self {
            SduiError::Network(_) => true,
            SduiError::Http { status, .. } => *status == 429 || *status >= 500,
            _ => false,
        }
    }

    /// 리소스가 존재하지 않는 에러인지 확인합니다.
    pub fn is_not_found(&self) -> bool {
        matches!(self, SduiError::NotFound(_))
    }
}

impl From<serde_json::Error> for SduiError {
    fn from(err: serde_json::Error) -> Self {
        SduiError::Decode(err.to_string())
    }
}

impl From<reqwest::Error> for SduiError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_decode() {
            SduiError::Decode(err.to_string())
        } else if let Some(status) = err.status() {
            SduiError::Http {
                status: status.as_u16(),
                message: err.to_string(),
            }
        } else {
            SduiError::Network(err.to_string())
        }
    }
}

impl From<config::ConfigError> for SduiError {
    fn from(err: config::ConfigError) -> Self {
        SduiError::Config(err.to_string())
    }
}
