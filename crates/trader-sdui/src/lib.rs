//! # Trader SDUI
//!
//! 전략 설정 폼을 위한 SDUI(Server-Driven UI) 스키마 클라이언트입니다.
//!
//! - [`client`]: 트레이딩 API 스키마 엔드포인트 호출 (재시도 포함)
//! - [`cache`]: 스키마/Fragment TTL 메모리 캐시
//! - [`builder`]: Fragment 해석 및 렌더링 섹션 생성
//! - [`resolver`]: 캐시 + 원천 + 빌더 조합
//! - [`binding`]: 전략 ID 변경에 반응하는 상태 게시, 오래된 실행 무시
//!
//! # 사용 예제
//!
//! ```rust,ignore
//! use std::sync::Arc;
//! use trader_sdui::{HttpSchemaClient, SchemaBinding, SchemaCache, SchemaResolver};
//!
//! let client = HttpSchemaClient::with_base_url("http://127.0.0.1:3000/api/v1")?;
//! let cache = Arc::new(SchemaCache::default());
//! let binding = SchemaBinding::new(SchemaResolver::new(Arc::new(client), cache));
//!
//! binding.set_strategy(Some("grid_trading")).await;
//! let state = binding.wait_settled().await;
//! for section in &state.sections {
//!     println!("{} ({} fields)", section.name, section.fields.len());
//! }
//! ```

pub mod binding;
pub mod builder;
pub mod cache;
pub mod client;
pub mod resolver;

pub use binding::{SchemaBinding, SchemaState};
pub use builder::{build_sections, fetch_fragments, resolve_sections, FragmentOutcome};
pub use cache::{CacheStats, SchemaCache};
pub use client::{HttpSchemaClient, SchemaSource, StrategyMeta};
pub use resolver::{ResolvedSchema, SchemaResolver};
