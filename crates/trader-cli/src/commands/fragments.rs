//! Fragment 카탈로그 조회 기능.

use anyhow::{Context, Result};
use tracing::info;
use trader_core::{FragmentCategory, SchemaFragment};
use trader_sdui::{HttpSchemaClient, SchemaSource};

use super::output::{truncate, OutputFormat};
use super::schema::format_fields;

/// Fragment 목록을 출력합니다. 카테고리를 지정하면 해당 카테고리만 조회합니다.
pub async fn list_fragments(
    client: &HttpSchemaClient,
    category: Option<FragmentCategory>,
    format: OutputFormat,
) -> Result<usize> {
    let fragments = match category {
        Some(category) => client.list_fragments_by_category(category).await,
        None => client.list_fragments().await,
    }
    .context("Failed to list fragments")?;

    info!("Found {} fragments", fragments.len());

    let content = match format {
        OutputFormat::Table => format_table(&fragments),
        OutputFormat::Json => {
            serde_json::to_string_pretty(&fragments).context("Failed to serialize to JSON")?
        }
    };
    println!("{}", content);

    Ok(fragments.len())
}

/// Fragment 하나의 필드 상세를 출력합니다.
pub async fn show_fragment(
    client: &HttpSchemaClient,
    fragment_id: &str,
    format: OutputFormat,
) -> Result<()> {
    let fragment = client
        .fetch_fragment(fragment_id)
        .await
        .with_context(|| format!("Failed to fetch fragment: {}", fragment_id))?;

    let content = match format {
        OutputFormat::Table => format_detail(&fragment),
        OutputFormat::Json => {
            serde_json::to_string_pretty(&fragment).context("Failed to serialize to JSON")?
        }
    };
    println!("{}", content);

    Ok(())
}

fn category_label(category: Option<FragmentCategory>) -> &'static str {
    category.map(|c| c.as_path()).unwrap_or("-")
}

/// 테이블 형식 출력.
fn format_table(fragments: &[SchemaFragment]) -> String {
    let mut output = String::new();

    output.push_str(&format!(
        "{:<28} {:<30} {:<16} {:<6}\n",
        "ID", "NAME", "CATEGORY", "FIELDS"
    ));
    output.push_str(&"-".repeat(83));
    output.push('\n');

    for fragment in fragments {
        output.push_str(&format!(
            "{:<28} {:<30} {:<16} {:<6}\n",
            truncate(&fragment.id, 28),
            truncate(&fragment.name, 30),
            category_label(fragment.category),
            fragment.fields.len()
        ));
    }

    output.push('\n');
    output.push_str(&format!("Total: {} fragments", fragments.len()));
    output
}

fn format_detail(fragment: &SchemaFragment) -> String {
    let mut output = format!(
        "{} ({}) [{}]\n",
        fragment.name,
        fragment.id,
        category_label(fragment.category)
    );
    if let Some(description) = &fragment.description {
        output.push_str(&format!("{}\n", description));
    }
    if !fragment.dependencies.is_empty() {
        output.push_str(&format!("Depends on: {}\n", fragment.dependencies.join(", ")));
    }
    output.push('\n');
    output.push_str(&format_fields(&fragment.fields));
    output
}

#[cfg(test)]
mod tests {
    use super::*;
    use trader_core::{FieldSchema, FieldType};

    #[test]
    fn test_format_table() {
        let fragments = vec![
            SchemaFragment::new("indicator.rsi", "RSI")
                .with_category(FragmentCategory::Indicator)
                .with_field(FieldSchema::new("period", FieldType::Integer)),
            SchemaFragment::new("custom.misc", "기타"),
        ];

        let table = format_table(&fragments);
        assert!(table.contains("indicator.rsi"));
        assert!(table.contains("indicator "));
        assert!(table.ends_with("Total: 2 fragments"));
    }

    #[test]
    fn test_format_detail() {
        let mut fragment = SchemaFragment::new("risk.trailing_stop", "트레일링 스탑")
            .with_category(FragmentCategory::RiskManagement)
            .with_description("고점 대비 하락 시 청산")
            .with_field(FieldSchema::new("trail_pct", FieldType::Number).with_range(0.1, 20.0));
        fragment.dependencies.push("risk.stop_loss".to_string());

        let detail = format_detail(&fragment);
        assert!(detail.starts_with("트레일링 스탑 (risk.trailing_stop) [risk_management]"));
        assert!(detail.contains("Depends on: risk.stop_loss"));
        assert!(detail.contains("trail_pct"));
    }
}
