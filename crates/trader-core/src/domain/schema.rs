//! SDUI (Server-Driven UI) 스키마 정의.
//!
//! 트레이딩 API가 내려주는 전략 설정 UI 스키마와 Fragment를 역직렬화하고,
//! 클라이언트에서 렌더링할 섹션 타입을 제공합니다.
//!
//! 서버는 카테고리를 `snake_case`와 Debug 표기(`"RiskManagement"`) 두 가지로
//! 내려주므로 두 표기를 모두 허용합니다.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Fragment 카테고리.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FragmentCategory {
    /// 기술적 지표 (RSI, MACD, Bollinger Bands 등)
    #[serde(alias = "Indicator")]
    Indicator,
    /// 필터 조건 (RouteState, MarketRegime, Volume 등)
    #[serde(alias = "Filter")]
    Filter,
    /// 리스크 관리 (손절, 익절, 트레일링 스탑)
    #[serde(alias = "RiskManagement", alias = "riskmanagement")]
    RiskManagement,
    /// 포지션 크기 결정 (고정 비율, Kelly, ATR 기반)
    #[serde(alias = "PositionSizing", alias = "positionsizing")]
    PositionSizing,
    /// 타이밍 설정 (리밸런싱 주기, 거래 시간)
    #[serde(alias = "Timing")]
    Timing,
    /// 자산 선택 (단일 심볼, 유니버스)
    #[serde(alias = "Asset")]
    Asset,
}

impl FragmentCategory {
    /// API 경로에 사용하는 카테고리 문자열.
    pub fn as_path(&self) -> &'static str {
        match self {
            FragmentCategory::Indicator => "indicator",
            FragmentCategory::Filter => "filter",
            FragmentCategory::RiskManagement => "risk_management",
            FragmentCategory::PositionSizing => "position_sizing",
            FragmentCategory::Timing => "timing",
            FragmentCategory::Asset => "asset",
        }
    }
}

impl std::str::FromStr for FragmentCategory {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "indicator" => Ok(Self::Indicator),
            "filter" => Ok(Self::Filter),
            "risk_management" | "riskmanagement" => Ok(Self::RiskManagement),
            "position_sizing" | "positionsizing" => Ok(Self::PositionSizing),
            "timing" => Ok(Self::Timing),
            "asset" => Ok(Self::Asset),
            _ => Err(format!(
                "Invalid category: {}. Supported: indicator, filter, risk_management, position_sizing, timing, asset",
                s
            )),
        }
    }
}

/// 필드 타입.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FieldType {
    /// 정수형
    Integer,
    /// 실수형
    Number,
    /// 불리언
    Boolean,
    /// 문자열
    String,
    /// 단일 선택 (드롭다운)
    Select,
    /// 다중 선택 (체크박스)
    #[serde(alias = "multi_select")]
    MultiSelect,
    /// 심볼 입력 (자동완성)
    Symbol,
    /// 심볼 배열
    Symbols,
}

impl FieldType {
    /// 직렬화 표기와 같은 문자열.
    pub fn as_str(&self) -> &'static str {
        match self {
            FieldType::Integer => "integer",
            FieldType::Number => "number",
            FieldType::Boolean => "boolean",
            FieldType::String => "string",
            FieldType::Select => "select",
            FieldType::MultiSelect => "multiselect",
            FieldType::Symbol => "symbol",
            FieldType::Symbols => "symbols",
        }
    }
}

/// 필드 스키마.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FieldSchema {
    /// 필드 이름 (snake_case)
    pub name: String,

    /// 필드 타입
    #[serde(rename = "type", alias = "field_type")]
    pub field_type: FieldType,

    /// 표시 라벨
    #[serde(default)]
    pub label: String,

    /// 설명 (옵션)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,

    /// 기본값 (JSON 값)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub default: Option<serde_json::Value>,

    /// 최소값 (number/integer 타입)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub min: Option<f64>,

    /// 최대값 (number/integer 타입)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max: Option<f64>,

    /// 선택 옵션 (select/multiselect 타입)
    #[serde(skip_serializing_if = "Vec::is_empty", default)]
    pub options: Vec<String>,

    /// 조건부 표시 (예: "enabled == true")
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub condition: Option<String>,

    /// 필수 여부
    #[serde(default)]
    pub required: bool,
}

impl Default for FieldSchema {
    fn default() -> Self {
        Self {
            name: String::new(),
            field_type: FieldType::String,
            label: String::new(),
            description: None,
            default: None,
            min: None,
            max: None,
            options: Vec::new(),
            condition: None,
            required: false,
        }
    }
}

impl FieldSchema {
    /// 이름과 타입만 지정한 필드를 생성합니다.
    pub fn new(name: impl Into<String>, field_type: FieldType) -> Self {
        Self {
            name: name.into(),
            field_type,
            ..Default::default()
        }
    }

    /// 기본값을 설정합니다.
    pub fn with_default(mut self, value: serde_json::Value) -> Self {
        self.default = Some(value);
        self
    }

    /// 최소/최대값을 설정합니다.
    pub fn with_range(mut self, min: f64, max: f64) -> Self {
        self.min = Some(min);
        self.max = Some(max);
        self
    }
}

/// 재사용 가능한 UI 스키마 조각 (Fragment).
///
/// 서버의 `/schema/fragments/{id}/detail` 응답 형태입니다.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SchemaFragment {
    /// Fragment ID (예: "indicator.rsi", "risk.trailing_stop")
    pub id: String,

    /// Fragment 이름
    pub name: String,

    /// 설명
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,

    /// 카테고리
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub category: Option<FragmentCategory>,

    /// 표시 순서 (없으면 스키마 내 위치를 사용)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub order: Option<i64>,

    /// 필드 목록
    #[serde(default)]
    pub fields: Vec<FieldSchema>,

    /// 다른 Fragment에 대한 의존성
    #[serde(skip_serializing_if = "Vec::is_empty", default)]
    pub dependencies: Vec<String>,
}

impl SchemaFragment {
    /// 새로운 Fragment를 생성합니다.
    pub fn new(id: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            description: None,
            category: None,
            order: None,
            fields: Vec::new(),
            dependencies: Vec::new(),
        }
    }

    /// 카테고리를 설정합니다.
    pub fn with_category(mut self, category: FragmentCategory) -> Self {
        self.category = Some(category);
        self
    }

    /// 설명을 설정합니다.
    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    /// 표시 순서를 설정합니다.
    pub fn with_order(mut self, order: i64) -> Self {
        self.order = Some(order);
        self
    }

    /// 필드를 추가합니다.
    pub fn with_field(mut self, field: FieldSchema) -> Self {
        self.fields.push(field);
        self
    }
}

/// Fragment 참조.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FragmentRef {
    /// Fragment ID
    pub id: String,

    /// 필수 여부
    #[serde(default)]
    pub required: bool,

    /// 스키마가 지정한 표시 순서
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub order: Option<i64>,
}

impl FragmentRef {
    /// 필수 Fragment 참조를 생성합니다.
    pub fn required(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            required: true,
            order: None,
        }
    }

    /// 선택적 Fragment 참조를 생성합니다.
    pub fn optional(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            required: false,
            order: None,
        }
    }

    /// 표시 순서를 설정합니다.
    pub fn with_order(mut self, order: i64) -> Self {
        self.order = Some(order);
        self
    }
}

/// 전략 UI 스키마.
///
/// `/strategies/{id}/schema` 응답. Fragment 참조 + 커스텀 필드로 구성됩니다.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StrategyUISchema {
    /// 전략 ID
    pub id: String,

    /// 전략 이름
    pub name: String,

    /// 설명
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,

    /// 전략 카테고리
    #[serde(default)]
    pub category: String,

    /// 사용하는 Fragment 목록 (선언 순서 유지)
    #[serde(default)]
    pub fragments: Vec<FragmentRef>,

    /// 전략 고유 커스텀 필드
    #[serde(default)]
    pub custom_fields: Vec<FieldSchema>,

    /// 기본 설정값 (옵션)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub defaults: Option<HashMap<String, serde_json::Value>>,
}

impl StrategyUISchema {
    /// 새로운 전략 UI 스키마를 생성합니다.
    pub fn new(id: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            description: None,
            category: String::new(),
            fragments: Vec::new(),
            custom_fields: Vec::new(),
            defaults: None,
        }
    }

    /// 설명을 설정합니다.
    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    /// Fragment를 추가합니다.
    pub fn with_fragment(mut self, fragment_ref: FragmentRef) -> Self {
        self.fragments.push(fragment_ref);
        self
    }

    /// 커스텀 필드를 추가합니다.
    pub fn with_custom_field(mut self, field: FieldSchema) -> Self {
        self.custom_fields.push(field);
        self
    }

    /// 기본 설정값을 설정합니다.
    pub fn with_defaults(mut self, defaults: HashMap<String, serde_json::Value>) -> Self {
        self.defaults = Some(defaults);
        self
    }

    /// 참조 중인 Fragment ID 목록 (선언 순서).
    pub fn fragment_ids(&self) -> Vec<&str> {
        self.fragments.iter().map(|f| f.id.as_str()).collect()
    }
}

/// 커스텀 필드 섹션 ID.
pub const CUSTOM_SECTION_ID: &str = "custom";

/// 렌더링 가능한 폼 섹션.
///
/// Fragment 하나 또는 커스텀 필드 블록을 같은 모양으로 변환한 결과입니다.
/// 스키마를 해석할 때마다 새로 만들어지며 저장되지 않습니다.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RenderableSection {
    pub id: String,
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    pub required: bool,
    pub collapsible: bool,
    pub fields: Vec<FieldSchema>,
    pub order: i64,
}

impl RenderableSection {
    /// Fragment 참조와 Fragment 본문으로 섹션을 만듭니다.
    pub fn from_fragment(fragment: &SchemaFragment, required: bool, order: i64) -> Self {
        Self {
            id: fragment.id.clone(),
            name: fragment.name.clone(),
            description: fragment.description.clone(),
            required,
            collapsible: !required,
            fields: fragment.fields.clone(),
            order,
        }
    }

    /// 스키마의 커스텀 필드로 섹션을 만듭니다. 항상 필수이며 접을 수 없습니다.
    pub fn custom(schema: &StrategyUISchema, order: i64) -> Self {
        Self {
            id: CUSTOM_SECTION_ID.to_string(),
            name: format!("{} 설정", schema.name),
            description: Some("전략별 고유 설정".to_string()),
            required: true,
            collapsible: false,
            fields: schema.custom_fields.clone(),
            order,
        }
    }

    /// 커스텀 필드 섹션인지 확인합니다.
    pub fn is_custom(&self) -> bool {
        self.id == CUSTOM_SECTION_ID
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_fragment_detail_deserialization() {
        // 서버의 fragment detail 응답 형태 (Debug 표기 카테고리)
        let body = json!({
            "id": "risk.stop_loss",
            "name": "손절 설정",
            "description": null,
            "category": "RiskManagement",
            "dependencies": [],
            "fields": [{
                "name": "stop_loss_pct",
                "type": "number",
                "label": "손절 비율",
                "description": null,
                "default": 2.0,
                "min": 0.1,
                "max": 50.0,
                "options": [],
                "condition": "stop_loss_enabled == true",
                "required": false
            }]
        });

        let fragment: SchemaFragment = serde_json::from_value(body).unwrap();
        assert_eq!(fragment.category, Some(FragmentCategory::RiskManagement));
        assert_eq!(fragment.fields.len(), 1);
        assert_eq!(fragment.fields[0].field_type, FieldType::Number);
        assert_eq!(fragment.order, None);
    }

    #[test]
    fn test_field_type_aliases() {
        let a: FieldType = serde_json::from_value(json!("multiselect")).unwrap();
        let b: FieldType = serde_json::from_value(json!("multi_select")).unwrap();
        assert_eq!(a, FieldType::MultiSelect);
        assert_eq!(a, b);
        assert_eq!(serde_json::to_value(&a).unwrap(), json!(a.as_str()));
    }

    #[test]
    fn test_strategy_schema_from_composer_output() {
        let body = json!({
            "id": "grid",
            "name": "Grid",
            "description": null,
            "category": "single_asset",
            "fragments": [{"id": "base_config", "required": true, "order": 0}],
            "custom_fields": [{"name": "spacing", "type": "number", "default": 0.5}],
            "defaults": {"spacing": 0.5}
        });

        let schema: StrategyUISchema = serde_json::from_value(body).unwrap();
        assert_eq!(schema.fragment_ids(), vec!["base_config"]);
        assert_eq!(schema.fragments[0].order, Some(0));
        assert_eq!(schema.custom_fields[0].default, Some(json!(0.5)));
        assert!(schema.custom_fields[0].label.is_empty());
    }

    #[test]
    fn test_minimal_schema_defaults() {
        let schema: StrategyUISchema =
            serde_json::from_value(json!({"id": "rsi", "name": "RSI"})).unwrap();
        assert!(schema.fragments.is_empty());
        assert!(schema.custom_fields.is_empty());
        assert!(schema.defaults.is_none());
    }

    #[test]
    fn test_custom_section_shape() {
        let schema = StrategyUISchema::new("grid", "Grid")
            .with_custom_field(FieldSchema::new("spacing", FieldType::Number));
        let section = RenderableSection::custom(&schema, 3);

        assert!(section.is_custom());
        assert_eq!(section.name, "Grid 설정");
        assert!(section.required);
        assert!(!section.collapsible);
        assert_eq!(section.order, 3);
    }

    #[test]
    fn test_fragment_section_collapsible_when_optional() {
        let fragment = SchemaFragment::new("filter.volume", "거래량 필터");
        let section = RenderableSection::from_fragment(&fragment, false, 1);
        assert!(section.collapsible);
        assert!(!section.required);
    }

    #[test]
    fn test_category_from_str() {
        assert_eq!(
            "RiskManagement".parse::<FragmentCategory>().unwrap(),
            FragmentCategory::RiskManagement
        );
        assert_eq!(FragmentCategory::PositionSizing.as_path(), "position_sizing");
        assert!("unknown".parse::<FragmentCategory>().is_err());
    }
}
