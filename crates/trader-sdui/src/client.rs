//! 스키마 API 클라이언트.
//!
//! 트레이딩 API의 SDUI 엔드포인트를 호출합니다.
//!
//! - `GET /strategies/{id}/schema`
//! - `GET /schema/fragments/{id}/detail`
//! - `GET /schema/fragments`, `GET /schema/fragments/{category}`
//! - `GET /strategies/meta`
//!
//! 일시적 에러(네트워크, 429, 5xx)는 설정된 횟수만큼 재시도하고,
//! 404를 포함한 나머지 에러는 즉시 반환합니다.

use async_trait::async_trait;
use reqwest::{StatusCode, Url};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};
use trader_core::{ApiConfig, FragmentCategory, SchemaFragment, SduiError, SduiResult, StrategyUISchema};

/// 스키마와 Fragment를 제공하는 원천.
///
/// HTTP 클라이언트 외에 테스트용 구현을 주입할 수 있도록 분리합니다.
#[async_trait]
pub trait SchemaSource: Send + Sync {
    /// 전략 UI 스키마를 조회합니다.
    async fn fetch_schema(&self, strategy_id: &str) -> SduiResult<StrategyUISchema>;

    /// Fragment 하나를 조회합니다.
    async fn fetch_fragment(&self, fragment_id: &str) -> SduiResult<SchemaFragment>;
}

/// 전략 메타데이터 (`/strategies/meta`).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StrategyMeta {
    pub id: String,
    #[serde(default)]
    pub aliases: Vec<String>,
    pub name: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub default_timeframe: Option<String>,
    #[serde(default)]
    pub secondary_timeframes: Vec<String>,
    #[serde(default)]
    pub is_multi_timeframe: bool,
    #[serde(default)]
    pub category: Option<String>,
    #[serde(default)]
    pub supported_markets: Vec<String>,
}

#[derive(Debug, Deserialize)]
struct StrategyMetaList {
    #[serde(default)]
    strategies: Vec<StrategyMeta>,
}

#[derive(Debug, Deserialize)]
struct FragmentList {
    #[serde(default)]
    fragments: Vec<SchemaFragment>,
}

/// API 에러 응답 본문 (`{"code": ..., "message": ...}`).
#[derive(Debug, Deserialize)]
struct ApiErrorBody {
    #[serde(default)]
    code: Option<String>,
    message: String,
}

/// HTTP 스키마 클라이언트.
#[derive(Clone)]
pub struct HttpSchemaClient {
    client: reqwest::Client,
    config: ApiConfig,
    base_url: Url,
}

impl HttpSchemaClient {
    /// 새로운 클라이언트를 생성합니다.
    pub fn new(config: ApiConfig) -> SduiResult<Self> {
        if config.base_url.trim().is_empty() {
            return Err(SduiError::Config("api.base_url is empty".to_string()));
        }
        let base_url = Url::parse(config.base_url.trim())
            .map_err(|e| SduiError::Config(format!("잘못된 api.base_url: {}", e)))?;
        if base_url.cannot_be_a_base() {
            return Err(SduiError::Config(format!(
                "api.base_url은 경로를 가질 수 없습니다: {}",
                config.base_url
            )));
        }

        let client = reqwest::Client::builder()
            .timeout(config.timeout())
            .build()
            .map_err(|e| SduiError::Config(format!("HTTP 클라이언트 생성 실패: {}", e)))?;

        Ok(Self {
            client,
            config,
            base_url,
        })
    }

    /// 기본 URL만 지정해 클라이언트를 생성합니다.
    pub fn with_base_url(base_url: impl Into<String>) -> SduiResult<Self> {
        Self::new(ApiConfig::new(base_url))
    }

    /// 현재 API 설정.
    pub fn config(&self) -> &ApiConfig {
        &self.config
    }

    /// 기본 URL 뒤에 경로 세그먼트를 붙입니다. ID 세그먼트는 퍼센트 인코딩됩니다.
    fn url(&self, segments: &[&str]) -> Url {
        let mut url = self.base_url.clone();
        if let Ok(mut path) = url.path_segments_mut() {
            path.pop_if_empty().extend(segments);
        }
        url
    }

    /// 사용 가능한 모든 Fragment 카탈로그를 조회합니다.
    pub async fn list_fragments(&self) -> SduiResult<Vec<SchemaFragment>> {
        let list: FragmentList = self.get_json(self.url(&["schema", "fragments"])).await?;
        Ok(list.fragments)
    }

    /// 카테고리별 Fragment 목록을 조회합니다.
    pub async fn list_fragments_by_category(
        &self,
        category: FragmentCategory,
    ) -> SduiResult<Vec<SchemaFragment>> {
        let url = self.url(&["schema", "fragments", category.as_path()]);
        let list: FragmentList = self.get_json(url).await?;
        Ok(list.fragments)
    }

    /// 전략 메타데이터 목록을 조회합니다.
    pub async fn list_strategies(&self) -> SduiResult<Vec<StrategyMeta>> {
        let list: StrategyMetaList = self.get_json(self.url(&["strategies", "meta"])).await?;
        Ok(list.strategies)
    }

    /// GET 요청 (재시도 포함).
    async fn get_json<T: DeserializeOwned>(&self, url: Url) -> SduiResult<T> {
        let mut attempt = 0;

        loop {
            match self.get_once(&url).await {
                Ok(value) => return Ok(value),
                Err(e) if e.is_retryable() && attempt < self.config.max_retries => {
                    attempt += 1;
                    debug!(
                        url = %url,
                        attempt = attempt,
                        max_retries = self.config.max_retries,
                        error = %e,
                        "Schema API 재시도 예정"
                    );
                    tokio::time::sleep(self.config.backoff(attempt)).await;
                }
                Err(e) => {
                    if e.is_retryable() {
                        warn!(url = %url, attempts = attempt + 1, error = %e, "Schema API 최종 실패");
                    }
                    return Err(e);
                }
            }
        }
    }

    async fn get_once<T: DeserializeOwned>(&self, url: &Url) -> SduiResult<T> {
        debug!(url = %url, "Schema API 요청");

        let response = self
            .client
            .get(url.clone())
            .header("Accept", "application/json")
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(status_error(status, &body));
        }

        Ok(response.json::<T>().await?)
    }
}

/// 실패 응답을 에러로 변환합니다. 본문이 API 에러 형식이면 메시지를 사용합니다.
fn status_error(status: StatusCode, body: &str) -> SduiError {
    let message = match serde_json::from_str::<ApiErrorBody>(body) {
        Ok(err) => match err.code {
            Some(code) => format!("{}: {}", code, err.message),
            None => err.message,
        },
        Err(_) if body.trim().is_empty() => status
            .canonical_reason()
            .unwrap_or("unknown error")
            .to_string(),
        Err(_) => body.trim().to_string(),
    };

    if status == StatusCode::NOT_FOUND {
        SduiError::NotFound(message)
    } else {
        SduiError::Http {
            status: status.as_u16(),
            message,
        }
    }
}

#[async_trait]
impl SchemaSource for HttpSchemaClient {
    async fn fetch_schema(&self, strategy_id: &str) -> SduiResult<StrategyUISchema> {
        self.get_json(self.url(&["strategies", strategy_id, "schema"]))
            .await
    }

    async fn fetch_fragment(&self, fragment_id: &str) -> SduiResult<SchemaFragment> {
        self.get_json(self.url(&["schema", "fragments", fragment_id, "detail"]))
            .await
    }
}
