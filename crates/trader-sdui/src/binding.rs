//! 반응형 스키마 바인딩.
//!
//! 요청된 전략 ID가 바뀔 때마다 스키마를 다시 해석하고, 결과를
//! `tokio::sync::watch` 채널로 게시합니다.
//!
//! # 오래된 실행 무시
//!
//! 해석 실행마다 세대 번호와 `CancellationToken`을 부여합니다. 새 실행이 시작되거나
//! 바인딩이 종료되면 이전 토큰이 취소됩니다. 상태를 쓰기 직전에 세대와 토큰을
//! 확인하므로, 늦게 끝난 이전 요청이 최신 상태를 덮어쓰지 않습니다.

use chrono::{DateTime, Utc};
use std::sync::Arc;
use tokio::sync::{watch, Mutex};
use tokio_util::sync::CancellationToken;
use tracing::{debug, warn, Instrument};
use trader_core::{schema_span, RenderableSection, StrategyUISchema};

use crate::resolver::SchemaResolver;

/// 바인딩이 게시하는 상태.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SchemaState {
    /// 이 상태를 게시한 실행의 세대 번호
    pub generation: u64,
    /// 해석 대상 전략 ID
    pub strategy_id: Option<String>,
    pub schema: Option<Arc<StrategyUISchema>>,
    pub sections: Vec<RenderableSection>,
    pub loading: bool,
    /// 스키마 조회 실패 메시지
    pub error: Option<String>,
    /// 마지막으로 해석을 완료한 시각
    pub resolved_at: Option<DateTime<Utc>>,
}

impl SchemaState {
    /// 로딩 중이 아니고 스키마 또는 에러가 확정되었는지 확인합니다.
    pub fn is_settled(&self) -> bool {
        !self.loading
    }
}

/// 현재 진행 중인 실행.
struct ActiveRun {
    generation: u64,
    strategy_id: Option<String>,
    token: CancellationToken,
}

/// 실행 하나가 상태를 게시할 때 사용하는 컨텍스트.
struct RunContext {
    generation: u64,
    token: CancellationToken,
    active: Arc<Mutex<ActiveRun>>,
    state_tx: Arc<watch::Sender<SchemaState>>,
}

impl RunContext {
    /// 최신 실행일 때만 상태를 수정합니다. 게시 여부를 반환합니다.
    async fn publish(&self, update: impl FnOnce(&mut SchemaState)) -> bool {
        let active = self.active.lock().await;
        if self.token.is_cancelled() || active.generation != self.generation {
            debug!(generation = self.generation, "오래된 실행 결과를 버립니다");
            return false;
        }

        let generation = self.generation;
        self.state_tx.send_modify(|state| {
            update(state);
            state.generation = generation;
        });
        true
    }
}

/// 전략 ID에 바인딩된 스키마 상태.
///
/// ```rust,ignore
/// let binding = SchemaBinding::new(resolver);
/// let mut rx = binding.subscribe();
///
/// binding.set_strategy(Some("grid_trading")).await;
/// let state = binding.wait_settled().await;
/// ```
pub struct SchemaBinding {
    resolver: SchemaResolver,
    state_tx: Arc<watch::Sender<SchemaState>>,
    active: Arc<Mutex<ActiveRun>>,
    shutdown: CancellationToken,
}

impl SchemaBinding {
    /// 새로운 바인딩을 생성합니다. 초기 상태는 전략 없음입니다.
    pub fn new(resolver: SchemaResolver) -> Self {
        let shutdown = CancellationToken::new();
        let (state_tx, _) = watch::channel(SchemaState::default());

        Self {
            resolver,
            state_tx: Arc::new(state_tx),
            active: Arc::new(Mutex::new(ActiveRun {
                generation: 0,
                strategy_id: None,
                token: shutdown.child_token(),
            })),
            shutdown,
        }
    }

    /// 상태 변경 구독.
    pub fn subscribe(&self) -> watch::Receiver<SchemaState> {
        self.state_tx.subscribe()
    }

    /// 현재 상태 스냅샷.
    pub fn state(&self) -> SchemaState {
        self.state_tx.borrow().clone()
    }

    /// 현재 요청된 전략 ID.
    pub async fn strategy_id(&self) -> Option<String> {
        self.active.lock().await.strategy_id.clone()
    }

    /// 요청 전략 ID를 변경합니다.
    ///
    /// ID가 실제로 바뀐 경우에만 새 실행을 시작하고 `true`를 반환합니다.
    pub async fn set_strategy(&self, strategy_id: Option<impl Into<String>>) -> bool {
        let strategy_id = strategy_id.map(Into::into);
        let mut active = self.active.lock().await;
        if active.generation > 0 && active.strategy_id == strategy_id {
            return false;
        }
        active.strategy_id = strategy_id;
        self.start_run(&mut active);
        true
    }

    /// 현재 ID의 스키마 캐시를 삭제하고 즉시 다시 해석합니다.
    pub async fn refetch(&self) {
        let mut active = self.active.lock().await;
        if let Some(id) = &active.strategy_id {
            self.resolver.cache().invalidate_schema(id).await;
        }
        self.start_run(&mut active);
    }

    /// 현재 ID의 스키마 캐시만 삭제합니다. 다음 해석 때 다시 조회합니다.
    pub async fn invalidate_cache(&self) {
        if let Some(id) = self.strategy_id().await {
            self.resolver.cache().invalidate_schema(&id).await;
        }
    }

    /// 최신 실행이 끝날 때까지 기다린 뒤 상태를 반환합니다.
    ///
    /// 바인딩이 종료되면 취소된 실행은 게시하지 않으므로 즉시 현재 상태를 반환합니다.
    pub async fn wait_settled(&self) -> SchemaState {
        let target = self.active.lock().await.generation;
        let mut rx = self.state_tx.subscribe();

        tokio::select! {
            _ = self.shutdown.cancelled() => self.state(),
            settled = rx.wait_for(|state| state.generation >= target && state.is_settled()) => {
                settled
                    .map(|state| state.clone())
                    .unwrap_or_else(|_| self.state())
            }
        }
    }

    /// 바인딩이 종료되었는지 확인합니다.
    pub fn is_shutdown(&self) -> bool {
        self.shutdown.is_cancelled()
    }

    /// 진행 중인 실행을 모두 취소합니다. 이후 결과는 게시되지 않습니다.
    pub fn shutdown(&self) {
        self.shutdown.cancel();
    }

    fn start_run(&self, active: &mut ActiveRun) {
        active.token.cancel();
        active.generation += 1;
        active.token = self.shutdown.child_token();

        let ctx = RunContext {
            generation: active.generation,
            token: active.token.clone(),
            active: Arc::clone(&self.active),
            state_tx: Arc::clone(&self.state_tx),
        };
        let resolver = self.resolver.clone();
        let strategy_id = active.strategy_id.clone();

        tokio::spawn(run(ctx, resolver, strategy_id));
    }
}

impl Drop for SchemaBinding {
    fn drop(&mut self) {
        self.shutdown.cancel();
    }
}

/// 해석 실행 하나.
async fn run(ctx: RunContext, resolver: SchemaResolver, strategy_id: Option<String>) {
    let Some(strategy_id) = strategy_id else {
        ctx.publish(|state| {
            state.strategy_id = None;
            state.schema = None;
            state.sections.clear();
            state.loading = false;
            state.error = None;
        })
        .await;
        return;
    };

    let span = schema_span!("schema_resolve", strategy_id, ctx.generation);
    resolve_into(&ctx, &resolver, strategy_id)
        .instrument(span)
        .await;
}

async fn resolve_into(ctx: &RunContext, resolver: &SchemaResolver, strategy_id: String) {
    let schema = match resolver.cached_schema(&strategy_id).await {
        Some(schema) => {
            debug!("스키마 캐시 적중");
            schema
        }
        None => {
            let started = ctx
                .publish(|state| {
                    state.strategy_id = Some(strategy_id.clone());
                    state.loading = true;
                    state.error = None;
                })
                .await;
            if !started {
                return;
            }

            let fetched = tokio::select! {
                _ = ctx.token.cancelled() => return,
                result = resolver.fetch_schema(&strategy_id) => result,
            };

            match fetched {
                Ok(schema) => schema,
                Err(e) => {
                    warn!(error = %e, "전략 스키마 조회 실패");
                    ctx.publish(|state| {
                        state.strategy_id = Some(strategy_id.clone());
                        state.schema = None;
                        state.sections.clear();
                        state.loading = false;
                        state.error = Some(e.to_string());
                    })
                    .await;
                    return;
                }
            }
        }
    };

    let sections = tokio::select! {
        _ = ctx.token.cancelled() => return,
        sections = resolver.build_sections(&schema) => sections,
    };

    debug!(sections = sections.len(), "섹션 생성 완료");
    ctx.publish(|state| {
        state.strategy_id = Some(strategy_id.clone());
        state.schema = Some(schema);
        state.sections = sections;
        state.loading = false;
        state.error = None;
        state.resolved_at = Some(Utc::now());
    })
    .await;
}
