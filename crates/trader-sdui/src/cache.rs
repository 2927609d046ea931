//! 스키마/Fragment 메모리 캐시.
//!
//! 스키마 ID와 Fragment ID를 키로 하는 두 개의 TTL 캐시입니다.
//! 만료된 항목은 읽을 때 무시될 뿐 삭제하지 않으며, 다음 조회 성공 시 덮어씁니다.
//! 시간은 `tokio::time::Instant`로 측정합니다 (테스트에서 시간 정지/이동 가능).

use serde::Serialize;
use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::RwLock;
use tokio::time::Instant;
use trader_core::{CacheConfig, SchemaFragment, StrategyUISchema};

/// 캐시 통계.
#[derive(Debug, Default, Clone, PartialEq, Serialize)]
pub struct CacheStats {
    pub hits: u64,
    pub misses: u64,
    pub hit_rate: f64,
}

struct CacheEntry<V> {
    value: Arc<V>,
    stored_at: Instant,
}

/// 키 → (값, 저장 시각) 맵.
struct TtlMap<V> {
    entries: RwLock<HashMap<String, CacheEntry<V>>>,
}

impl<V> TtlMap<V> {
    fn new() -> Self {
        Self {
            entries: RwLock::new(HashMap::new()),
        }
    }

    async fn get_valid(&self, key: &str, ttl: Duration) -> Option<Arc<V>> {
        let entries = self.entries.read().await;
        entries
            .get(key)
            .filter(|entry| entry.stored_at.elapsed() < ttl)
            .map(|entry| Arc::clone(&entry.value))
    }

    async fn insert(&self, key: String, value: Arc<V>) {
        let mut entries = self.entries.write().await;
        entries.insert(
            key,
            CacheEntry {
                value,
                stored_at: Instant::now(),
            },
        );
    }

    async fn remove(&self, key: &str) -> bool {
        self.entries.write().await.remove(key).is_some()
    }

    async fn clear(&self) {
        self.entries.write().await.clear();
    }

    async fn len(&self) -> usize {
        self.entries.read().await.len()
    }
}

/// 세션 범위 스키마 캐시.
///
/// 여러 소비자가 `Arc<SchemaCache>`로 같은 인스턴스를 공유합니다.
pub struct SchemaCache {
    ttl: Duration,
    schemas: TtlMap<StrategyUISchema>,
    fragments: TtlMap<SchemaFragment>,
    hits: AtomicU64,
    misses: AtomicU64,
}

impl SchemaCache {
    /// 기본 TTL (5분).
    pub const DEFAULT_TTL: Duration = Duration::from_secs(300);

    /// 주어진 TTL로 캐시를 생성합니다.
    pub fn new(ttl: Duration) -> Self {
        Self {
            ttl,
            schemas: TtlMap::new(),
            fragments: TtlMap::new(),
            hits: AtomicU64::new(0),
            misses: AtomicU64::new(0),
        }
    }

    /// 설정에서 캐시를 생성합니다.
    pub fn from_config(config: &CacheConfig) -> Self {
        Self::new(config.ttl())
    }

    pub fn ttl(&self) -> Duration {
        self.ttl
    }

    fn record(&self, hit: bool) {
        if hit {
            self.hits.fetch_add(1, Ordering::Relaxed);
        } else {
            self.misses.fetch_add(1, Ordering::Relaxed);
        }
    }

    /// 유효한 스키마를 조회합니다.
    pub async fn get_schema(&self, strategy_id: &str) -> Option<Arc<StrategyUISchema>> {
        let result = self.schemas.get_valid(strategy_id, self.ttl).await;
        self.record(result.is_some());
        result
    }

    /// 스키마를 저장하고 공유 참조를 반환합니다. 저장 시각은 항상 갱신됩니다.
    pub async fn put_schema(&self, schema: StrategyUISchema) -> Arc<StrategyUISchema> {
        let schema = Arc::new(schema);
        self.schemas
            .insert(schema.id.clone(), Arc::clone(&schema))
            .await;
        schema
    }

    /// 스키마 항목이 있고 TTL 이내인지 확인합니다.
    pub async fn is_schema_valid(&self, strategy_id: &str) -> bool {
        self.schemas.get_valid(strategy_id, self.ttl).await.is_some()
    }

    /// 스키마 항목을 삭제합니다.
    pub async fn invalidate_schema(&self, strategy_id: &str) -> bool {
        self.schemas.remove(strategy_id).await
    }

    /// 유효한 Fragment를 조회합니다.
    pub async fn get_fragment(&self, fragment_id: &str) -> Option<Arc<SchemaFragment>> {
        let result = self.fragments.get_valid(fragment_id, self.ttl).await;
        self.record(result.is_some());
        result
    }

    /// 요청한 ID를 키로 Fragment를 저장합니다.
    pub async fn put_fragment(
        &self,
        fragment_id: &str,
        fragment: SchemaFragment,
    ) -> Arc<SchemaFragment> {
        let fragment = Arc::new(fragment);
        self.fragments
            .insert(fragment_id.to_string(), Arc::clone(&fragment))
            .await;
        fragment
    }

    /// Fragment 항목이 있고 TTL 이내인지 확인합니다.
    pub async fn is_fragment_valid(&self, fragment_id: &str) -> bool {
        self.fragments
            .get_valid(fragment_id, self.ttl)
            .await
            .is_some()
    }

    /// Fragment 항목을 삭제합니다.
    pub async fn invalidate_fragment(&self, fragment_id: &str) -> bool {
        self.fragments.remove(fragment_id).await
    }

    /// Fragment ID 목록을 캐시 적중분과 미적중분으로 나눕니다.
    ///
    /// 미적중 ID는 중복 없이 입력 순서를 유지합니다.
    pub async fn partition_fragments(
        &self,
        fragment_ids: &[&str],
    ) -> (HashMap<String, Arc<SchemaFragment>>, Vec<String>) {
        let mut cached = HashMap::new();
        let mut missing: Vec<String> = Vec::new();

        for &id in fragment_ids {
            if cached.contains_key(id) || missing.iter().any(|m| m == id) {
                continue;
            }
            match self.get_fragment(id).await {
                Some(fragment) => {
                    cached.insert(id.to_string(), fragment);
                }
                None => missing.push(id.to_string()),
            }
        }

        (cached, missing)
    }

    /// 모든 항목을 삭제합니다.
    pub async fn clear(&self) {
        self.schemas.clear().await;
        self.fragments.clear().await;
    }

    /// (스키마 항목 수, Fragment 항목 수). 만료 항목 포함.
    pub async fn len(&self) -> (usize, usize) {
        (self.schemas.len().await, self.fragments.len().await)
    }

    /// 캐시 통계를 가져옵니다.
    pub fn stats(&self) -> CacheStats {
        let hits = self.hits.load(Ordering::Relaxed);
        let misses = self.misses.load(Ordering::Relaxed);
        let total = hits + misses;
        let hit_rate = if total > 0 {
            hits as f64 / total as f64
        } else {
            0.0
        };

        CacheStats {
            hits,
            misses,
            hit_rate,
        }
    }

    /// 통계를 초기화합니다.
    pub fn reset_stats(&self) {
        self.hits.store(0, Ordering::Relaxed);
        self.misses.store(0, Ordering::Relaxed);
    }
}

impl Default for SchemaCache {
    fn default() -> Self {
        Self::new(Self::DEFAULT_TTL)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn schema(id: &str) -> StrategyUISchema {
        StrategyUISchema::new(id, id.to_uppercase())
    }

    #[tokio::test(start_paused = true)]
    async fn test_schema_valid_within_ttl() {
        let cache = SchemaCache::default();
        cache.put_schema(schema("grid")).await;

        assert!(cache.is_schema_valid("grid").await);
        tokio::time::advance(Duration::from_secs(299)).await;
        assert!(cache.is_schema_valid("grid").await);
        tokio::time::advance(Duration::from_secs(1)).await;
        assert!(!cache.is_schema_valid("grid").await);

        // 만료 항목은 삭제되지 않음
        assert_eq!(cache.len().await, (1, 0));
    }

    #[tokio::test(start_paused = true)]
    async fn test_write_refreshes_timestamp() {
        let cache = SchemaCache::new(Duration::from_secs(10));
        cache.put_schema(schema("grid")).await;
        tokio::time::advance(Duration::from_secs(8)).await;
        cache.put_schema(schema("grid")).await;
        tokio::time::advance(Duration::from_secs(8)).await;

        assert!(cache.get_schema("grid").await.is_some());
    }

    #[tokio::test]
    async fn test_invalidate_schema_only() {
        let cache = SchemaCache::default();
        cache.put_schema(schema("grid")).await;
        cache
            .put_fragment("indicator.rsi", SchemaFragment::new("indicator.rsi", "RSI 설정"))
            .await;

        assert!(cache.invalidate_schema("grid").await);
        assert!(!cache.invalidate_schema("grid").await);
        assert!(!cache.is_schema_valid("grid").await);
        assert!(cache.is_fragment_valid("indicator.rsi").await);
    }

    #[tokio::test]
    async fn test_partition_fragments_dedups_and_keeps_order() {
        let cache = SchemaCache::default();
        cache
            .put_fragment("b", SchemaFragment::new("b", "B"))
            .await;

        let (cached, missing) = cache.partition_fragments(&["c", "b", "a", "c"]).await;
        assert_eq!(cached.len(), 1);
        assert!(cached.contains_key("b"));
        assert_eq!(missing, vec!["c".to_string(), "a".to_string()]);
    }

    #[tokio::test]
    async fn test_stats() {
        let cache = SchemaCache::default();
        assert!(cache.get_schema("grid").await.is_none());
        cache.put_schema(schema("grid")).await;
        assert!(cache.get_schema("grid").await.is_some());

        let stats = cache.stats();
        assert_eq!(stats.hits, 1);
        assert_eq!(stats.misses, 1);
        assert!((stats.hit_rate - 0.5).abs() < f64::EPSILON);

        cache.reset_stats();
        assert_eq!(cache.stats(), CacheStats::default());
    }
}
