//! SDUI 폼 값 처리.
//!
//! 섹션 목록을 기준으로 초기 폼 값을 만들고, 조건부 표시(`condition`)를
//! 평가하며, 사용자가 입력한 값을 필드 제약 조건으로 검증합니다.

use serde::Serialize;
use serde_json::{Map, Value};
use std::fmt;

use super::schema::{FieldSchema, FieldType, RenderableSection, StrategyUISchema};

/// 폼 값 맵 (필드 이름 → JSON 값).
pub type FormValues = Map<String, Value>;

/// 조건식 비교 연산자.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum ConditionOp {
    Eq,
    Ne,
}

/// 파싱된 조건식 (`name == literal`, `name != literal`).
#[derive(Debug, Clone, PartialEq)]
struct Condition {
    field: String,
    op: ConditionOp,
    expected: Value,
}

impl Condition {
    fn parse(expr: &str) -> Option<Self> {
        let (idx, op) = match (expr.find("=="), expr.find("!=")) {
            (Some(i), _) => (i, ConditionOp::Eq),
            (None, Some(i)) => (i, ConditionOp::Ne),
            (None, None) => return None,
        };

        let field = expr[..idx].trim();
        let literal = expr[idx + 2..].trim();
        if field.is_empty() || literal.is_empty() {
            return None;
        }

        let expected = serde_json::from_str(literal).unwrap_or_else(|_| {
            Value::String(literal.trim_matches('\'').to_string())
        });

        Some(Self {
            field: field.to_string(),
            op,
            expected,
        })
    }

    fn evaluate(&self, values: &FormValues) -> bool {
        let actual = values.get(&self.field).unwrap_or(&Value::Null);
        let equal = json_eq(actual, &self.expected);
        match self.op {
            ConditionOp::Eq => equal,
            ConditionOp::Ne => !equal,
        }
    }
}

/// 숫자는 표현(정수/실수)과 관계없이 값으로 비교합니다.
fn json_eq(a: &Value, b: &Value) -> bool {
    match (a.as_f64(), b.as_f64()) {
        (Some(x), Some(y)) => x == y,
        _ => a == b,
    }
}

impl FieldSchema {
    /// 현재 폼 값에서 이 필드가 표시되는지 확인합니다.
    ///
    /// 조건식이 없거나 해석할 수 없으면 항상 표시합니다.
    pub fn is_visible(&self, values: &FormValues) -> bool {
        match self.condition.as_deref().and_then(Condition::parse) {
            Some(condition) => condition.evaluate(values),
            None => true,
        }
    }
}

/// 초기 폼 값을 생성합니다.
///
/// 섹션 순서대로 필드 기본값을 채운 뒤, 스키마의 `defaults`로 덮어씁니다.
pub fn initial_values(schema: &StrategyUISchema, sections: &[RenderableSection]) -> FormValues {
    let mut values = Map::new();

    for field in sections.iter().flat_map(|s| s.fields.iter()) {
        if let Some(default) = &field.default {
            values.insert(field.name.clone(), default.clone());
        }
    }

    if let Some(defaults) = &schema.defaults {
        for (name, value) in defaults {
            values.insert(name.clone(), value.clone());
        }
    }

    values
}

/// 필드 검증 위반 유형.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum ViolationKind {
    /// 필수 값 누락
    Missing,
    /// 타입 불일치
    TypeMismatch { expected: FieldType },
    /// 최소값 미만
    BelowMin { min: f64, actual: f64 },
    /// 최대값 초과
    AboveMax { max: f64, actual: f64 },
    /// 허용되지 않은 선택지
    InvalidOption { value: String },
}

/// 필드 하나의 검증 위반.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FieldViolation {
    pub section: String,
    pub field: String,
    #[serde(flatten)]
    pub kind: ViolationKind,
}

impl fmt::Display for FieldViolation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{}] {}: ", self.section, self.field)?;
        match &self.kind {
            ViolationKind::Missing => write!(f, "필수 값이 없습니다"),
            ViolationKind::TypeMismatch { expected } => {
                write!(f, "{:?} 타입이어야 합니다", expected)
            }
            ViolationKind::BelowMin { min, actual } => {
                write!(f, "{} 은(는) 최소값 {} 보다 작습니다", actual, min)
            }
            ViolationKind::AboveMax { max, actual } => {
                write!(f, "{} 은(는) 최대값 {} 보다 큽니다", actual, max)
            }
            ViolationKind::InvalidOption { value } => {
                write!(f, "허용되지 않은 선택지: {}", value)
            }
        }
    }
}

/// 폼 값을 섹션의 필드 제약 조건으로 검증합니다.
///
/// 숨겨진 필드(조건식이 거짓)는 검증하지 않습니다.
pub fn validate_values(sections: &[RenderableSection], values: &FormValues) -> Vec<FieldViolation> {
    let mut violations = Vec::new();

    for section in sections {
        for field in &section.fields {
            if !field.is_visible(values) {
                continue;
            }

            let kind = match values.get(&field.name) {
                None | Some(Value::Null) => field.required.then_some(ViolationKind::Missing),
                Some(value) => check_field(field, value),
            };

            if let Some(kind) = kind {
                violations.push(FieldViolation {
                    section: section.id.clone(),
                    field: field.name.clone(),
                    kind,
                });
            }
        }
    }

    violations
}

fn check_field(field: &FieldSchema, value: &Value) -> Option<ViolationKind> {
    let mismatch = || {
        Some(ViolationKind::TypeMismatch {
            expected: field.field_type.clone(),
        })
    };

    match field.field_type {
        FieldType::Integer => match value.as_f64() {
            Some(n) if n.fract() == 0.0 => check_range(field, n),
            _ => mismatch(),
        },
        FieldType::Number => match value.as_f64() {
            Some(n) => check_range(field, n),
            None => mismatch(),
        },
        FieldType::Boolean if value.is_boolean() => None,
        FieldType::String | FieldType::Symbol if value.is_string() => None,
        FieldType::Boolean | FieldType::String | FieldType::Symbol => mismatch(),
        FieldType::Symbols => match value.as_array() {
            Some(items) if items.iter().all(Value::is_string) => None,
            _ => mismatch(),
        },
        FieldType::Select => match value.as_str() {
            Some(s) => check_option(field, s),
            None => mismatch(),
        },
        FieldType::MultiSelect => match value.as_array() {
            Some(items) => {
                for item in items {
                    match item.as_str() {
                        Some(s) => {
                            if let Some(violation) = check_option(field, s) {
                                return Some(violation);
                            }
                        }
                        None => return mismatch(),
                    }
                }
                None
            }
            None => mismatch(),
        },
    }
}

fn check_range(field: &FieldSchema, actual: f64) -> Option<ViolationKind> {
    if let Some(min) = field.min {
        if actual < min {
            return Some(ViolationKind::BelowMin { min, actual });
        }
    }
    if let Some(max) = field.max {
        if actual > max {
            return Some(ViolationKind::AboveMax { max, actual });
        }
    }
    None
}

fn check_option(field: &FieldSchema, value: &str) -> Option<ViolationKind> {
    if field.options.is_empty() || field.options.iter().any(|o| o == value) {
        None
    } else {
        Some(ViolationKind::InvalidOption {
            value: value.to_string(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;
    use serde_json::json;
    use std::collections::HashMap;

    fn values(v: Value) -> FormValues {
        v.as_object().cloned().unwrap()
    }

    fn section(fields: Vec<FieldSchema>) -> RenderableSection {
        RenderableSection {
            id: "risk.stop_loss".to_string(),
            name: "손절 설정".to_string(),
            description: None,
            required: true,
            collapsible: false,
            fields,
            order: 0,
        }
    }

    #[test]
    fn test_condition_visibility() {
        let field = FieldSchema {
            condition: Some("stop_loss_enabled == true".to_string()),
            ..FieldSchema::new("stop_loss_pct", FieldType::Number)
        };

        assert!(field.is_visible(&values(json!({"stop_loss_enabled": true}))));
        assert!(!field.is_visible(&values(json!({"stop_loss_enabled": false}))));
        assert!(!field.is_visible(&values(json!({}))));
    }

    #[test]
    fn test_condition_not_equal_and_strings() {
        let field = FieldSchema {
            condition: Some("mode != 'fixed'".to_string()),
            ..FieldSchema::new("atr_multiplier", FieldType::Number)
        };
        assert!(field.is_visible(&values(json!({"mode": "atr"}))));
        assert!(!field.is_visible(&values(json!({"mode": "fixed"}))));
    }

    #[test]
    fn test_condition_numeric_equality_ignores_representation() {
        let field = FieldSchema {
            condition: Some("level == 2".to_string()),
            ..FieldSchema::new("extra", FieldType::Integer)
        };
        assert!(field.is_visible(&values(json!({"level": 2.0}))));
    }

    #[test]
    fn test_unparsable_condition_is_visible() {
        let field = FieldSchema {
            condition: Some("enabled".to_string()),
            ..FieldSchema::new("x", FieldType::Boolean)
        };
        assert!(field.is_visible(&values(json!({}))));
    }

    #[test]
    fn test_initial_values_schema_defaults_override() {
        let schema = StrategyUISchema::new("grid", "Grid")
            .with_defaults(HashMap::from([("spacing".to_string(), json!(1.0))]));
        let sections = vec![section(vec![
            FieldSchema::new("spacing", FieldType::Number).with_default(json!(0.5)),
            FieldSchema::new("levels", FieldType::Integer).with_default(json!(10)),
            FieldSchema::new("symbol", FieldType::Symbol),
        ])];

        let initial = initial_values(&schema, &sections);
        assert_eq!(initial.get("spacing"), Some(&json!(1.0)));
        assert_eq!(initial.get("levels"), Some(&json!(10)));
        assert!(!initial.contains_key("symbol"));
    }

    #[test]
    fn test_validate_required_and_range() {
        let sections = vec![section(vec![
            FieldSchema {
                required: true,
                ..FieldSchema::new("period", FieldType::Integer).with_range(2.0, 100.0)
            },
            FieldSchema::new("ratio", FieldType::Number).with_range(0.0, 1.0),
            FieldSchema {
                required: true,
                ..FieldSchema::new("symbol", FieldType::Symbol)
            },
        ])];

        let violations = validate_values(&sections, &values(json!({"period": 1, "ratio": 1.5})));
        assert_eq!(violations.len(), 3);
        assert_eq!(
            violations[0].kind,
            ViolationKind::BelowMin {
                min: 2.0,
                actual: 1.0
            }
        );
        assert_eq!(
            violations[1].kind,
            ViolationKind::AboveMax {
                max: 1.0,
                actual: 1.5
            }
        );
        assert_eq!(violations[2].kind, ViolationKind::Missing);
    }

    #[test]
    fn test_validate_integer_rejects_fraction() {
        let sections = vec![section(vec![FieldSchema::new("period", FieldType::Integer)])];
        let violations = validate_values(&sections, &values(json!({"period": 14.5})));
        assert_eq!(
            violations[0].kind,
            ViolationKind::TypeMismatch {
                expected: FieldType::Integer
            }
        );
    }

    #[test]
    fn test_validate_options() {
        let sections = vec![section(vec![
            FieldSchema {
                options: vec!["daily".to_string(), "weekly".to_string()],
                ..FieldSchema::new("rebalance", FieldType::Select)
            },
            FieldSchema {
                options: vec!["KR".to_string(), "US".to_string()],
                ..FieldSchema::new("markets", FieldType::MultiSelect)
            },
        ])];

        let ok = validate_values(
            &sections,
            &values(json!({"rebalance": "weekly", "markets": ["KR"]})),
        );
        assert!(ok.is_empty());

        let bad = validate_values(
            &sections,
            &values(json!({"rebalance": "hourly", "markets": ["KR", "JP"]})),
        );
        assert_eq!(bad.len(), 2);
        assert_eq!(
            bad[1].kind,
            ViolationKind::InvalidOption {
                value: "JP".to_string()
            }
        );
    }

    #[test]
    fn test_hidden_fields_are_not_validated() {
        let sections = vec![section(vec![
            FieldSchema::new("stop_loss_enabled", FieldType::Boolean),
            FieldSchema {
                required: true,
                condition: Some("stop_loss_enabled == true".to_string()),
                ..FieldSchema::new("stop_loss_pct", FieldType::Number)
            },
        ])];

        let hidden = validate_values(&sections, &values(json!({"stop_loss_enabled": false})));
        assert!(hidden.is_empty());

        let shown = validate_values(&sections, &values(json!({"stop_loss_enabled": true})));
        assert_eq!(shown.len(), 1);
        assert_eq!(shown[0].field, "stop_loss_pct");
    }

    #[test]
    fn test_violation_display() {
        let violation = FieldViolation {
            section: "custom".to_string(),
            field: "spacing".to_string(),
            kind: ViolationKind::Missing,
        };
        assert_eq!(violation.to_string(), "[custom] spacing: 필수 값이 없습니다");
    }

    proptest! {
        #[test]
        fn prop_number_range_check(min in -1000.0f64..0.0, max in 0.0f64..1000.0, actual in -2000.0f64..2000.0) {
            let sections = vec![section(vec![
                FieldSchema::new("ratio", FieldType::Number).with_range(min, max),
            ])];
            let violations = validate_values(&sections, &values(json!({ "ratio": actual })));

            if actual < min {
                prop_assert_eq!(violations.len(), 1);
                prop_assert_eq!(&violations[0].kind, &ViolationKind::BelowMin { min, actual });
            } else if actual > max {
                prop_assert_eq!(violations.len(), 1);
                prop_assert_eq!(&violations[0].kind, &ViolationKind::AboveMax { max, actual });
            } else {
                prop_assert!(violations.is_empty());
            }
        }
    }
}
