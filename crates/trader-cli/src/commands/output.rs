//! 명령 결과 출력 형식.

use anyhow::Result;
use serde_json::Value;

/// 출력 형식.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputFormat {
    Table,
    Json,
}

impl OutputFormat {
    pub fn parse(s: &str) -> Result<Self> {
        match s.to_lowercase().as_str() {
            "table" => Ok(Self::Table),
            "json" => Ok(Self::Json),
            _ => Err(anyhow::anyhow!("Invalid format: {}. Use: table, json", s)),
        }
    }
}

/// 문자열 자르기 (UTF-8 안전).
pub(crate) fn truncate(s: &str, max_len: usize) -> String {
    // 문자 수로 계산 (바이트가 아님)
    let char_count = s.chars().count();

    if char_count <= max_len {
        s.to_string()
    } else {
        let truncated: String = s.chars().take(max_len.saturating_sub(3)).collect();
        format!("{}...", truncated)
    }
}

/// JSON 값을 한 줄로 표시합니다. 없으면 "-".
pub(crate) fn display_value(value: Option<&Value>) -> String {
    match value {
        None | Some(Value::Null) => "-".to_string(),
        Some(Value::String(s)) => s.clone(),
        Some(other) => other.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_output_format_parse() {
        assert_eq!(OutputFormat::parse("TABLE").unwrap(), OutputFormat::Table);
        assert_eq!(OutputFormat::parse("json").unwrap(), OutputFormat::Json);
        assert!(OutputFormat::parse("csv").is_err());
    }

    #[test]
    fn test_truncate_multibyte() {
        assert_eq!(truncate("손절 설정", 10), "손절 설정");
        assert_eq!(truncate("트레일링 스탑 설정", 6), "트레일...");
    }

    #[test]
    fn test_display_value() {
        assert_eq!(display_value(None), "-");
        assert_eq!(display_value(Some(&json!("1d"))), "1d");
        assert_eq!(display_value(Some(&json!(0.5))), "0.5");
        assert_eq!(display_value(Some(&json!(["KR", "US"]))), r#"["KR","US"]"#);
    }
}
