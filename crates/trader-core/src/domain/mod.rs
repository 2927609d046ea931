//! SDUI 스키마 도메인 모델.

mod form;
mod schema;

pub use form::*;
pub use schema::*;
