//! 스키마 해석기.
//!
//! 스키마 원천과 캐시를 묶어 "캐시 확인 → 스키마 조회 → 섹션 생성"을 수행합니다.

use std::sync::Arc;
use tracing::{debug, info};
use trader_core::{RenderableSection, SduiResult, StrategyUISchema};

use crate::builder::resolve_sections;
use crate::cache::SchemaCache;
use crate::client::SchemaSource;

/// 해석 완료된 스키마.
#[derive(Debug, Clone)]
pub struct ResolvedSchema {
    pub schema: Arc<StrategyUISchema>,
    pub sections: Vec<RenderableSection>,
    /// 스키마를 캐시에서 가져왔는지 여부
    pub from_cache: bool,
}

/// 스키마 해석기.
#[derive(Clone)]
pub struct SchemaResolver {
    source: Arc<dyn SchemaSource>,
    cache: Arc<SchemaCache>,
}

impl SchemaResolver {
    /// 새로운 해석기를 생성합니다.
    pub fn new(source: Arc<dyn SchemaSource>, cache: Arc<SchemaCache>) -> Self {
        Self { source, cache }
    }

    /// 공유 캐시.
    pub fn cache(&self) -> &Arc<SchemaCache> {
        &self.cache
    }

    /// TTL 이내의 캐시된 스키마.
    pub async fn cached_schema(&self, strategy_id: &str) -> Option<Arc<StrategyUISchema>> {
        self.cache.get_schema(strategy_id).await
    }

    /// 네트워크에서 스키마를 조회하고 캐시에 저장합니다.
    pub async fn fetch_schema(&self, strategy_id: &str) -> SduiResult<Arc<StrategyUISchema>> {
        let mut schema = self.source.fetch_schema(strategy_id).await?;
        info!(
            strategy_id = strategy_id,
            fragments = schema.fragments.len(),
            custom_fields = schema.custom_fields.len(),
            "전략 스키마 조회 완료"
        );
        // 요청한 ID로 조회되도록 키를 맞춤
        if schema.id != strategy_id {
            debug!(strategy_id = strategy_id, schema_id = %schema.id, "스키마 ID가 요청과 다릅니다");
            schema.id = strategy_id.to_string();
        }
        Ok(self.cache.put_schema(schema).await)
    }

    /// 스키마의 Fragment를 해석해 섹션 목록을 만듭니다.
    pub async fn build_sections(&self, schema: &StrategyUISchema) -> Vec<RenderableSection> {
        resolve_sections(self.source.as_ref(), &self.cache, schema).await
    }

    /// 스키마를 한 번 해석합니다 (캐시 우선).
    pub async fn resolve(&self, strategy_id: &str) -> SduiResult<ResolvedSchema> {
        let (schema, from_cache) = match self.cached_schema(strategy_id).await {
            Some(schema) => {
                debug!(strategy_id = strategy_id, "스키마 캐시 적중");
                (schema, true)
            }
            None => (self.fetch_schema(strategy_id).await?, false),
        };

        let sections = self.build_sections(&schema).await;
        Ok(ResolvedSchema {
            schema,
            sections,
            from_cache,
        })
    }

    /// 캐시를 무시하고 스키마를 다시 해석합니다.
    pub async fn refresh(&self, strategy_id: &str) -> SduiResult<ResolvedSchema> {
        self.cache.invalidate_schema(strategy_id).await;
        self.resolve(strategy_id).await
    }
}
