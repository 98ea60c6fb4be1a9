// ==========================================
// 品质保证监控看板 - 终端入口
// ==========================================
// 用法:
//   extrusion-qa [--config <path>] [--json-log] batch <file.csv|file.json> [start end]
//   extrusion-qa [--config <path>] [--json-log] stream <file.csv>
//   extrusion-qa [--config <path>] health
//   extrusion-qa [--config <path>] login | logout
// 输出: 结果以 JSON 打印到 stdout，日志写 stderr
// ==========================================

use std::path::PathBuf;
use std::time::Duration;

use anyhow::{bail, Context, Result};
use chrono::NaiveDate;
use extrusion_qa::api::{map_api_error, ApiError, DashboardApi, Notice};
use extrusion_qa::domain::StreamStatus;
use extrusion_qa::{logging, AppState, DashboardConfig};

#[tokio::main]
async fn main() -> Result<()> {
    let mut args: Vec<String> = std::env::args().skip(1).collect();

    let config_path = take_option(&mut args, "--config").map(PathBuf::from);
    if take_flag(&mut args, "--json-log") {
        logging::init_json();
    } else {
        logging::init();
    }

    tracing::info!("==================================================");
    tracing::info!("{} v{}", extrusion_qa::APP_NAME, extrusion_qa::VERSION);
    tracing::info!("==================================================");

    let config = DashboardConfig::load(config_path.as_deref()).context("配置加载失败")?;
    let state = AppState::new(config);

    let mut args = args.into_iter();
    let command = args.next().unwrap_or_default();

    match command.as_str() {
        "login" => {
            state.session.sign_in()?;
            println!("{}", state.session.flag_path().display());
        }
        "logout" => state.session.sign_out()?,
        "health" => {
            let api = open(&state)?;
            let ok = api.health().await.map_err(report)?;
            println!("{}", serde_json::json!({ "healthy": ok }));
        }
        "batch" => {
            let file = args.next().context("缺少文件参数")?;
            let api = open(&state)?;
            let mut response = api.load_file(&file).map_err(report)?;

            if let (Some(start), Some(end)) = (args.next(), args.next()) {
                response = api
                    .query(parse_date(&start)?, parse_date(&end)?)
                    .map_err(report)?;
            }
            print_notice(response.notice.as_ref());
            println!("{}", serde_json::to_string_pretty(&response.data)?);
        }
        "stream" => {
            let file = args.next().context("缺少文件参数")?;
            let api = open(&state)?;
            run_stream(&api, &file, state.config.tick_interval_ms).await?;
        }
        other => bail!(
            "未知命令: '{}'（可用: batch / stream / health / login / logout）",
            other
        ),
    }

    Ok(())
}

/// 回放并逐拍打印面板快照
async fn run_stream(api: &DashboardApi, file: &str, tick_ms: u64) -> Result<()> {
    let content = std::fs::read(file).with_context(|| format!("无法读取文件: {}", file))?;
    let file_name = std::path::Path::new(file)
        .file_name()
        .map(|n| n.to_string_lossy().to_string())
        .unwrap_or_else(|| file.to_string());

    let response = api.start_stream(&file_name, content).map_err(report)?;
    print_notice(response.notice.as_ref());
    let session = response.data;

    let mut ticker = tokio::time::interval(Duration::from_millis(tick_ms.max(1)));
    loop {
        ticker.tick().await;
        let board = api.live_board();
        println!("{}", serde_json::to_string(&board.data)?);
        if board.data.status != StreamStatus::Streaming {
            print_notice(board.notice.as_ref());
            break;
        }
    }

    let outcome = session.join().await;
    tracing::info!(?outcome, "回放结束");
    Ok(())
}

fn open(state: &AppState) -> Result<std::sync::Arc<DashboardApi>> {
    state.open_dashboard().map_err(report)
}

/// 打印提示与错误响应后转为 anyhow 错误
fn report(err: ApiError) -> anyhow::Error {
    print_notice(Some(&Notice::from_error(&err)));
    eprintln!("{}", map_api_error(&err));
    anyhow::Error::new(err)
}

fn print_notice(notice: Option<&Notice>) {
    if let Some(n) = notice {
        eprintln!("[{:?}] {}", n.level, n.message);
    }
}

fn parse_date(text: &str) -> Result<NaiveDate> {
    NaiveDate::parse_from_str(text, "%Y-%m-%d")
        .with_context(|| format!("日期格式错误（应为YYYY-MM-DD）: {}", text))
}

fn take_option(args: &mut Vec<String>, name: &str) -> Option<String> {
    let pos = args.iter().position(|a| a == name)?;
    args.remove(pos);
    (pos < args.len()).then(|| args.remove(pos))
}

fn take_flag(args: &mut Vec<String>, name: &str) -> bool {
    match args.iter().position(|a| a == name) {
        Some(pos) => {
            args.remove(pos);
            true
        }
        None => false,
    }
}
