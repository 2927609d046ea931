//! 섹션 빌더.
//!
//! 스키마의 Fragment 참조를 해석하고, 커스텀 필드와 합쳐 렌더링 섹션 목록을 만듭니다.
//!
//! 1. 캐시 적중/미적중으로 Fragment ID를 분리
//! 2. 미적중분을 동시에 조회 (개별 실패 허용)
//! 3. 조회 결과(`FragmentOutcome`)를 `build_sections`로 접어 섹션 생성

use futures::future::join_all;
use std::collections::HashMap;
use std::sync::Arc;
use tracing::{debug, warn};
use trader_core::{RenderableSection, SchemaFragment, SduiError, StrategyUISchema};

use crate::cache::SchemaCache;
use crate::client::SchemaSource;

/// Fragment 하나의 조회 결과.
#[derive(Debug, Clone)]
pub enum FragmentOutcome {
    /// 조회 성공 (캐시 또는 네트워크)
    Resolved(Arc<SchemaFragment>),
    /// 서버에 존재하지 않음
    NotFound,
    /// 조회 실패 (재시도 후에도 실패한 일시적 에러 포함)
    Failed(SduiError),
}

impl FragmentOutcome {
    fn from_result(result: Result<Arc<SchemaFragment>, SduiError>) -> Self {
        match result {
            Ok(fragment) => FragmentOutcome::Resolved(fragment),
            Err(e) if e.is_not_found() => FragmentOutcome::NotFound,
            Err(e) => FragmentOutcome::Failed(e),
        }
    }

    pub fn is_resolved(&self) -> bool {
        matches!(self, FragmentOutcome::Resolved(_))
    }
}

/// 스키마가 참조하는 모든 Fragment를 조회합니다.
///
/// 캐시에 없는 Fragment는 ID마다 요청 하나씩 동시에 보내고 모두 끝날 때까지 기다립니다.
/// 성공한 Fragment는 캐시에 저장됩니다.
pub async fn fetch_fragments(
    source: &dyn SchemaSource,
    cache: &SchemaCache,
    schema: &StrategyUISchema,
) -> HashMap<String, FragmentOutcome> {
    let ids = schema.fragment_ids();
    let (cached, missing) = cache.partition_fragments(&ids).await;

    debug!(
        strategy_id = %schema.id,
        cached = cached.len(),
        missing = missing.len(),
        "Fragment 캐시 확인"
    );

    let mut outcomes: HashMap<String, FragmentOutcome> = cached
        .into_iter()
        .map(|(id, fragment)| (id, FragmentOutcome::Resolved(fragment)))
        .collect();

    let futures = missing.into_iter().map(|id| async move {
        let result = match source.fetch_fragment(&id).await {
            Ok(fragment) => Ok(cache.put_fragment(&id, fragment).await),
            Err(e) => Err(e),
        };
        (id, FragmentOutcome::from_result(result))
    });

    outcomes.extend(join_all(futures).await);
    outcomes
}

/// 조회 결과를 섹션 목록으로 접습니다.
///
/// - 참조 순서대로 해석된 Fragment마다 섹션 하나를 만듭니다.
/// - 순서값은 Fragment의 `order`, 참조의 `order`, 참조 위치 순으로 결정합니다.
/// - 커스텀 필드가 있으면 모든 Fragment 섹션 뒤에 `custom` 섹션을 추가합니다.
/// - 결과는 `order` 오름차순으로 안정 정렬됩니다.
pub fn build_sections(
    schema: &StrategyUISchema,
    outcomes: &HashMap<String, FragmentOutcome>,
) -> Vec<RenderableSection> {
    let mut sections = Vec::with_capacity(schema.fragments.len() + 1);

    for (index, fragment_ref) in schema.fragments.iter().enumerate() {
        match outcomes.get(&fragment_ref.id) {
            Some(FragmentOutcome::Resolved(fragment)) => {
                let order = fragment
                    .order
                    .or(fragment_ref.order)
                    .unwrap_or(index as i64);
                sections.push(RenderableSection::from_fragment(
                    fragment,
                    fragment_ref.required,
                    order,
                ));
            }
            Some(FragmentOutcome::NotFound) => {
                warn!(
                    strategy_id = %schema.id,
                    fragment_id = %fragment_ref.id,
                    "Fragment를 찾을 수 없어 건너뜁니다"
                );
            }
            Some(FragmentOutcome::Failed(e)) => {
                warn!(
                    strategy_id = %schema.id,
                    fragment_id = %fragment_ref.id,
                    error = %e,
                    "Fragment 조회 실패로 건너뜁니다"
                );
            }
            None => {
                warn!(
                    strategy_id = %schema.id,
                    fragment_id = %fragment_ref.id,
                    "Fragment 조회 결과가 없어 건너뜁니다"
                );
            }
        }
    }

    if !schema.custom_fields.is_empty() {
        // 커스텀 섹션은 항상 마지막
        let order = sections
            .iter()
            .map(|s| s.order.saturating_add(1))
            .max()
            .unwrap_or(0)
            .max(schema.fragments.len() as i64);
        sections.push(RenderableSection::custom(schema, order));
    }

    sections.sort_by_key(|s| s.order);
    sections
}

/// Fragment 조회와 섹션 생성을 한 번에 수행합니다.
pub async fn resolve_sections(
    source: &dyn SchemaSource,
    cache: &SchemaCache,
    schema: &StrategyUISchema,
) -> Vec<RenderableSection> {
    let outcomes = fetch_fragments(source, cache, schema).await;
    build_sections(schema, &outcomes)
}
