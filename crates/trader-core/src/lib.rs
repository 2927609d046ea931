//! # Trader Core
//!
//! 전략 설정 폼(SDUI) 클라이언트의 핵심 도메인 모델 및 공통 인프라를 제공합니다.
//!
//! - SDUI 스키마, Fragment, 필드 타입
//! - 렌더링 섹션 및 폼 값 검증
//! - 에러 타입
//! - 설정 관리
//! - 로깅 인프라

pub mod config;
pub mod domain;
pub mod error;
pub mod logging;

pub use config::*;
pub use domain::*;
pub use error::*;
pub use logging::*;
