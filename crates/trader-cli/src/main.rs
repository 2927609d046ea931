//! 전략 설정 스키마(SDUI) CLI.
//!
//! # 사용 예시
//!
//! ```bash
//! # 그리드 전략의 폼 섹션 보기
//! trader schema grid_trading
//!
//! # 캐시 무시, JSON 출력
//! trader schema rsi_mean_reversion --refresh -f json
//!
//! # 리스크 관리 Fragment 목록
//! trader fragments -C risk_management
//!
//! # 설정 값 검증
//! trader validate grid_trading values.json
//!
//! # 다른 서버 지정
//! trader --base-url http://10.0.0.5:3000/api/v1 strategies
//! ```

use anyhow::Context;
use clap::{Parser, Subcommand};
use std::path::PathBuf;
use std::sync::Arc;
use tracing::{error, info};
use trader_core::{init_logging, FragmentCategory, SduiConfig};
use trader_sdui::{HttpSchemaClient, SchemaCache, SchemaResolver};

mod commands;

use commands::output::OutputFormat;

#[derive(Parser)]
#[command(name = "trader")]
#[command(about = "Strategy form schema CLI - 전략 설정 UI 스키마 조회/검증", long_about = None)]
#[command(version)]
struct Cli {
    /// 설정 파일 (기본: config/sdui.toml, 없으면 환경 변수만 사용)
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    /// API 기본 URL (설정보다 우선)
    #[arg(long, global = true)]
    base_url: Option<String>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// 전략 스키마를 해석해 폼 섹션 출력
    Schema {
        /// 전략 ID (예: grid_trading)
        strategy_id: String,

        /// 출력 형식 (table, json)
        #[arg(short, long, default_value = "table")]
        format: String,

        /// 캐시 무시하고 다시 조회
        #[arg(long, default_value = "false")]
        refresh: bool,
    },

    /// Fragment 카탈로그 조회
    Fragments {
        /// 카테고리 필터 (indicator, filter, risk_management, position_sizing, timing, asset)
        #[arg(short = 'C', long)]
        category: Option<String>,

        /// 출력 형식 (table, json)
        #[arg(short, long, default_value = "table")]
        format: String,
    },

    /// Fragment 상세 조회
    Fragment {
        /// Fragment ID (예: indicator.rsi)
        fragment_id: String,

        /// 출력 형식 (table, json)
        #[arg(short, long, default_value = "table")]
        format: String,
    },

    /// 전략 메타데이터 목록
    Strategies {
        /// 출력 형식 (table, json)
        #[arg(short, long, default_value = "table")]
        format: String,
    },

    /// 설정 값 파일(JSON)을 스키마로 검증
    Validate {
        /// 전략 ID
        strategy_id: String,

        /// 값 파일 경로 (JSON 객체)
        values: PathBuf,

        /// 출력 형식 (table, json)
        #[arg(short, long, default_value = "table")]
        format: String,
    },
}

fn load_config(cli: &Cli) -> anyhow::Result<SduiConfig> {
    let mut config = match &cli.config {
        Some(path) => SduiConfig::load(Some(path)),
        None => SduiConfig::load_default(),
    }
    .context("Failed to load configuration")?;

    if let Some(base_url) = &cli.base_url {
        config.api.base_url = base_url.clone();
    }
    Ok(config)
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    let cli = Cli::parse();
    let config = load_config(&cli)?;

    init_logging(config.logging.to_log_config())
        .map_err(|e| anyhow::anyhow!("Failed to initialize logging: {}", e))?;

    info!(base_url = %config.api.base_url, "Schema API");

    let client = HttpSchemaClient::new(config.api.clone())?;
    let cache = Arc::new(SchemaCache::from_config(&config.cache));
    let resolver = SchemaResolver::new(Arc::new(client.clone()), cache);

    match cli.command {
        Commands::Schema {
            strategy_id,
            format,
            refresh,
        } => {
            use commands::schema::{show_schema, ShowSchemaConfig};

            let config = ShowSchemaConfig {
                strategy_id,
                format: OutputFormat::parse(&format)?,
                refresh,
            };

            if let Err(e) = show_schema(&resolver, config).await {
                error!("Schema lookup failed: {:#}", e);
                return Err(e);
            }
        }

        Commands::Fragments { category, format } => {
            let category = category
                .map(|c| c.parse::<FragmentCategory>())
                .transpose()
                .map_err(|e| anyhow::anyhow!(e))?;

            commands::fragments::list_fragments(&client, category, OutputFormat::parse(&format)?)
                .await?;
        }

        Commands::Fragment {
            fragment_id,
            format,
        } => {
            commands::fragments::show_fragment(&client, &fragment_id, OutputFormat::parse(&format)?)
                .await?;
        }

        Commands::Strategies { format } => {
            commands::strategies::list_strategies(&client, OutputFormat::parse(&format)?).await?;
        }

        Commands::Validate {
            strategy_id,
            values,
            format,
        } => {
            let violations = commands::validate::validate_strategy_values(
                &resolver,
                &strategy_id,
                &values,
                OutputFormat::parse(&format)?,
            )
            .await?;

            if violations > 0 {
                std::process::exit(1);
            }
        }
    }

    Ok(())
}
