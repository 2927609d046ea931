//! 전략 메타데이터 목록 조회 기능.

use anyhow::{Context, Result};
use tracing::info;
use trader_sdui::{HttpSchemaClient, StrategyMeta};

use super::output::{truncate, OutputFormat};

/// 전략 목록을 출력합니다.
pub async fn list_strategies(client: &HttpSchemaClient, format: OutputFormat) -> Result<usize> {
    let strategies = client
        .list_strategies()
        .await
        .context("Failed to list strategies")?;

    info!("Found {} strategies", strategies.len());

    let content = match format {
        OutputFormat::Table => format_table(&strategies),
        OutputFormat::Json => {
            serde_json::to_string_pretty(&strategies).context("Failed to serialize to JSON")?
        }
    };
    println!("{}", content);

    Ok(strategies.len())
}

/// 테이블 형식 출력.
fn format_table(strategies: &[StrategyMeta]) -> String {
    let mut output = String::new();

    output.push_str(&format!(
        "{:<28} {:<30} {:<10} {:<20} {:<12}\n",
        "ID", "NAME", "TIMEFRAME", "MARKETS", "CATEGORY"
    ));
    output.push_str(&"-".repeat(104));
    output.push('\n');

    for strategy in strategies {
        let timeframe = match (&strategy.default_timeframe, strategy.is_multi_timeframe) {
            (Some(tf), true) => format!("{}+", tf),
            (Some(tf), false) => tf.clone(),
            (None, _) => "-".to_string(),
        };

        output.push_str(&format!(
            "{:<28} {:<30} {:<10} {:<20} {:<12}\n",
            truncate(&strategy.id, 28),
            truncate(&strategy.name, 30),
            timeframe,
            truncate(&strategy.supported_markets.join(","), 20),
            strategy.category.as_deref().unwrap_or("-"),
        ));
    }

    output.push('\n');
    output.push_str(&format!("Total: {} strategies", strategies.len()));
    output
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_format_table_marks_multi_timeframe() {
        let strategies = vec![StrategyMeta {
            id: "rsi_mean_reversion".to_string(),
            aliases: vec!["rsi".to_string()],
            name: "RSI 평균회귀".to_string(),
            description: String::new(),
            default_timeframe: Some("15m".to_string()),
            secondary_timeframes: vec!["1h".to_string()],
            is_multi_timeframe: true,
            category: Some("Realtime".to_string()),
            supported_markets: vec!["KR".to_string(), "US".to_string()],
        }];

        let table = format_table(&strategies);
        assert!(table.contains("15m+"));
        assert!(table.contains("KR,US"));
        assert!(table.ends_with("Total: 1 strategies"));
    }
}
