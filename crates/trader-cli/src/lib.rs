//! CLI 도구 모음.
//!
//! 이 crate는 다음 기능을 제공합니다:
//! - 전략 스키마 해석 결과 조회
//! - Fragment 카탈로그 조회
//! - 전략 메타데이터 조회
//! - 설정 값 검증

pub mod commands;

pub use commands::*;
