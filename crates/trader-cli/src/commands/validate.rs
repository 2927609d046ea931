//! 전략 설정 값 검증 기능.
//!
//! 스키마 기본값 위에 입력 파일(JSON 객체)의 값을 덮어쓴 뒤 필드 제약 조건으로 검증합니다.

use anyhow::{Context, Result};
use std::path::Path;
use tracing::info;
use trader_core::{initial_values, validate_values, FieldViolation, FormValues};
use trader_sdui::SchemaResolver;

use super::output::OutputFormat;

/// 값 파일을 읽습니다. 최상위가 JSON 객체여야 합니다.
pub fn read_values(path: &Path) -> Result<FormValues> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read values file: {}", path.display()))?;
    parse_values(&content)
}

fn parse_values(content: &str) -> Result<FormValues> {
    match serde_json::from_str::<serde_json::Value>(content).context("Failed to parse values JSON")? {
        serde_json::Value::Object(map) => Ok(map),
        other => Err(anyhow::anyhow!("Values must be a JSON object, got: {}", other)),
    }
}

/// 기본값과 입력값을 합칩니다. 입력값이 우선합니다.
pub fn merge_values(mut base: FormValues, input: FormValues) -> FormValues {
    base.extend(input);
    base
}

/// 전략 설정 값을 검증하고 위반 목록을 출력합니다. 위반 수를 반환합니다.
pub async fn validate_strategy_values(
    resolver: &SchemaResolver,
    strategy_id: &str,
    values_path: &Path,
    format: OutputFormat,
) -> Result<usize> {
    let input = read_values(values_path)?;
    let resolved = resolver
        .resolve(strategy_id)
        .await
        .with_context(|| format!("Failed to resolve schema: {}", strategy_id))?;

    let values = merge_values(initial_values(&resolved.schema, &resolved.sections), input);
    let violations = validate_values(&resolved.sections, &values);

    info!(
        strategy_id = strategy_id,
        fields = values.len(),
        violations = violations.len(),
        "Values validated"
    );

    let content = match format {
        OutputFormat::Table => format_report(&violations),
        OutputFormat::Json => {
            serde_json::to_string_pretty(&violations).context("Failed to serialize to JSON")?
        }
    };
    println!("{}", content);

    Ok(violations.len())
}

fn format_report(violations: &[FieldViolation]) -> String {
    if violations.is_empty() {
        return "✅ 모든 값이 유효합니다".to_string();
    }

    let mut output = String::new();
    for violation in violations {
        output.push_str(&format!("✗ {}\n", violation));
    }
    output.push_str(&format!("\nTotal: {} violations", violations.len()));
    output
}
