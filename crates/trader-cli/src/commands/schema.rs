//! 전략 스키마 조회 기능.

use anyhow::{Context, Result};
use serde::Serialize;
use tracing::info;
use trader_core::{FieldSchema, RenderableSection, StrategyUISchema};
use trader_sdui::{ResolvedSchema, SchemaResolver};

use super::output::{display_value, truncate, OutputFormat};

/// 스키마 조회 설정.
#[derive(Debug)]
pub struct ShowSchemaConfig {
    /// 전략 ID
    pub strategy_id: String,
    /// 출력 형식
    pub format: OutputFormat,
    /// 캐시 무시
    pub refresh: bool,
}

#[derive(Serialize)]
struct SchemaOutput<'a> {
    schema: &'a StrategyUISchema,
    sections: &'a [RenderableSection],
}

/// 전략 스키마를 해석해 섹션 목록을 출력합니다. 섹션 수를 반환합니다.
pub async fn show_schema(resolver: &SchemaResolver, config: ShowSchemaConfig) -> Result<usize> {
    let resolved = if config.refresh {
        resolver.refresh(&config.strategy_id).await
    } else {
        resolver.resolve(&config.strategy_id).await
    }
    .with_context(|| format!("Failed to resolve schema: {}", config.strategy_id))?;

    info!(
        strategy_id = %config.strategy_id,
        sections = resolved.sections.len(),
        from_cache = resolved.from_cache,
        "Schema resolved"
    );

    let content = match config.format {
        OutputFormat::Table => format_table(&resolved),
        OutputFormat::Json => format_json(&resolved)?,
    };
    println!("{}", content);

    Ok(resolved.sections.len())
}

/// 테이블 형식 출력.
pub(crate) fn format_table(resolved: &ResolvedSchema) -> String {
    let schema = &resolved.schema;
    let mut output = String::new();

    output.push_str(&format!("{} ({})\n", schema.name, schema.id));
    if let Some(description) = &schema.description {
        output.push_str(&format!("{}\n", description));
    }

    for section in &resolved.sections {
        let flag = if section.required { "필수" } else { "선택" };
        output.push_str(&format!(
            "\n[{}] {} ({}, order {})\n",
            section.id, section.name, flag, section.order
        ));
        output.push_str(&format_fields(&section.fields));
    }

    output.push('\n');
    output.push_str(&format!(
        "Total: {} sections, {} fields",
        resolved.sections.len(),
        resolved
            .sections
            .iter()
            .map(|s| s.fields.len())
            .sum::<usize>()
    ));

    output
}

/// 필드 목록 테이블.
pub(crate) fn format_fields(fields: &[FieldSchema]) -> String {
    let mut output = String::new();

    output.push_str(&format!(
        "  {:<24} {:<12} {:<4} {:<14} {:<16} {:<30}\n",
        "NAME", "TYPE", "REQ", "DEFAULT", "RANGE", "CONDITION"
    ));
    output.push_str(&format!("  {}\n", "-".repeat(104)));

    for field in fields {
        let range = match (field.min, field.max) {
            (None, None) => "-".to_string(),
            (min, max) => format!(
                "{}..{}",
                min.map(|v| v.to_string()).unwrap_or_default(),
                max.map(|v| v.to_string()).unwrap_or_default()
            ),
        };

        output.push_str(&format!(
            "  {:<24} {:<12} {:<4} {:<14} {:<16} {:<30}\n",
            truncate(&field.name, 24),
            field.field_type.as_str(),
            if field.required { "✓" } else { "" },
            truncate(&display_value(field.default.as_ref()), 14),
            range,
            truncate(field.condition.as_deref().unwrap_or("-"), 30),
        ));
    }

    output
}

/// JSON 형식 출력.
pub(crate) fn format_json(resolved: &ResolvedSchema) -> Result<String> {
    let output = SchemaOutput {
        schema: resolved.schema.as_ref(),
        sections: &resolved.sections,
    };
    serde_json::to_string_pretty(&output).context("Failed to serialize to JSON")
}
