// ==========================================
// 品质保证监控看板 - 看板 API
// ==========================================
// 职责: 上传（JSON/CSV）→ 归一化 → 期间过滤 → 聚合；实时回放启停与面板快照
// 架构: API 层 → Importer（解析/归一化）→ Engine（过滤/聚合/回放）
// 约束: 上传失败不改变当前视图
// ==========================================

use std::path::Path;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use chrono::NaiveDate;
use tracing::{info, warn};

use crate::api::error::{ApiError, ApiResult};
use crate::api::notice::{DashboardResponse, Notice};
use crate::config::DashboardConfig;
use crate::domain::{demo_view, DashboardView, InspectionRow, LiveBoard, StreamStatus};
use crate::engine::{filter_by_date, Aggregator, ReplaySession, ReplaySettings, StreamingReplayer};
use crate::i18n::{t, t_with_args};
use crate::importer::{
    CsvParser, ImportError, JsonReader, NormalizedPayload, ParsedFile, RecordNormalizer,
    UniversalFileParser,
};
use crate::predictor::PredictionService;

// ==========================================
// 批量路径状态
// ==========================================

/// 最近一次上传的数据
#[derive(Debug, Clone)]
enum UploadedSource {
    Rows(Vec<InspectionRow>),
    FeatureImportance(DashboardView),
}

struct ViewState {
    start: NaiveDate,
    end: NaiveDate,
    source: Option<UploadedSource>,
    view: DashboardView,
}

// ==========================================
// DashboardApi
// ==========================================
pub struct DashboardApi {
    normalizer: RecordNormalizer,
    service: Arc<dyn PredictionService>,
    replayer: StreamingReplayer,
    state: Mutex<ViewState>,
}

impl DashboardApi {
    /// 创建看板 API（初始视图为内置演示数据）
    pub fn new(config: &DashboardConfig, service: Arc<dyn PredictionService>) -> Self {
        let replayer = StreamingReplayer::new(Arc::clone(&service), ReplaySettings::from(config));
        Self {
            normalizer: RecordNormalizer::new(),
            service,
            replayer,
            state: Mutex::new(ViewState {
                start: config.default_start_date,
                end: config.default_end_date,
                source: None,
                view: demo_view(),
            }),
        }
    }

    /// 替换归一化器（固定时钟等）
    pub fn with_normalizer(mut self, normalizer: RecordNormalizer) -> Self {
        self.normalizer = normalizer;
        self
    }

    fn state(&self) -> MutexGuard<'_, ViewState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    // ==========================================
    // 批量路径
    // ==========================================

    /// 当前视图
    pub fn current_view(&self) -> DashboardView {
        self.state().view.clone()
    }

    /// 当前查询期间
    pub fn period(&self) -> (NaiveDate, NaiveDate) {
        let state = self.state();
        (state.start, state.end)
    }

    /// 上传 JSON（数组 / {data|rows} / 树模型 dump）
    ///
    /// # 错误
    /// - Import(JsonParseError): JSON 格式损坏
    /// - Import(NoArrayFound / NoUsableRecords): 结构无法识别
    pub fn upload_json(&self, content: &str) -> ApiResult<DashboardResponse<DashboardView>> {
        let json = JsonReader.parse_str(content).map_err(log_rejected)?;
        let payload = self.normalizer.normalize_json(&json).map_err(log_rejected)?;
        Ok(self.apply_payload(payload, "upload.json_complete"))
    }

    /// 上传 CSV（批量路径，按表头解析）
    pub fn upload_csv(&self, content: &str) -> ApiResult<DashboardResponse<DashboardView>> {
        let records = CsvParser.parse_str(content).map_err(log_rejected)?;
        if records.is_empty() {
            return Err(log_rejected(ImportError::EmptyFile));
        }
        let rows = self.normalizer.normalize_csv(&records).map_err(log_rejected)?;
        Ok(self.apply_payload(NormalizedPayload::Rows(rows), "upload.csv_complete"))
    }

    /// 按扩展名加载本地文件（.csv / .json）
    pub fn load_file<P: AsRef<Path>>(&self, path: P) -> ApiResult<DashboardResponse<DashboardView>> {
        match UniversalFileParser.parse(path.as_ref()).map_err(log_rejected)? {
            ParsedFile::Csv(records) => {
                if records.is_empty() {
                    return Err(log_rejected(ImportError::EmptyFile));
                }
                let rows = self.normalizer.normalize_csv(&records).map_err(log_rejected)?;
                Ok(self.apply_payload(NormalizedPayload::Rows(rows), "upload.csv_complete"))
            }
            ParsedFile::Json(json) => {
                let payload = self.normalizer.normalize_json(&json).map_err(log_rejected)?;
                Ok(self.apply_payload(payload, "upload.json_complete"))
            }
        }
    }

    /// 按新期间重新应用最近一次上传
    ///
    /// # 错误
    /// - NoData: 尚未上传
    pub fn query(
        &self,
        start: NaiveDate,
        end: NaiveDate,
    ) -> ApiResult<DashboardResponse<DashboardView>> {
        let mut state = self.state();
        let view = match &state.source {
            None => return Err(ApiError::NoData),
            Some(UploadedSource::FeatureImportance(view)) => view.clone(),
            Some(UploadedSource::Rows(rows)) => Aggregator::aggregate(&filter_by_date(rows, start, end)),
        };

        state.start = start;
        state.end = end;
        state.view = view.clone();
        info!(%start, %end, total = view.kpis.total_inspections, "期间重新查询");

        let notice = Notice::info(t_with_args(
            "query.reapplied",
            &[("start", &start.to_string()), ("end", &end.to_string())],
        ));
        Ok(DashboardResponse::new(view, notice))
    }

    fn apply_payload(
        &self,
        payload: NormalizedPayload,
        complete_key: &str,
    ) -> DashboardResponse<DashboardView> {
        let mut state = self.state();
        let (start, end) = (state.start, state.end);

        let (source, view, notice) = match payload {
            NormalizedPayload::FeatureImportance(importance) => {
                let features = importance.len().to_string();
                let view = DashboardView::from_feature_importance(importance);
                let notice = Notice::success(t_with_args(
                    "upload.model_complete",
                    &[("features", &features)],
                ));
                (UploadedSource::FeatureImportance(view.clone()), view, notice)
            }
            NormalizedPayload::Rows(rows) => {
                let view = Aggregator::aggregate(&filter_by_date(&rows, start, end));
                let notice = Notice::success(t_with_args(
                    complete_key,
                    &[
                        ("rows", &rows.len().to_string()),
                        ("start", &start.to_string()),
                        ("end", &end.to_string()),
                    ],
                ));
                info!(rows = rows.len(), in_period = view.kpis.total_inspections, "上传已应用");
                (UploadedSource::Rows(rows), view, notice)
            }
        };

        state.source = Some(source);
        state.view = view.clone();
        DashboardResponse::new(view, notice)
    }

    // ==========================================
    // 实时回放路径
    // ==========================================

    /// 选择 CSV 开始实时回放（替换进行中的会话）
    ///
    /// 同时派发一次整文件聚合请求
    pub fn start_stream(
        &self,
        file_name: &str,
        content: Vec<u8>,
    ) -> ApiResult<DashboardResponse<ReplaySession>> {
        // 整文件聚合请求以文件名作为 multipart 文件名
        if file_name.trim().is_empty() {
            warn!("实时回放缺少文件名");
            return Err(ApiError::InvalidInput("文件名为空".to_string()));
        }
        let records = CsvParser.parse_reader(content.as_slice()).map_err(log_rejected)?;
        if records.is_empty() {
            return Err(log_rejected(ImportError::EmptyFile));
        }

        let rows = records.len();
        let session = self.replayer.start(file_name, records, Some(content));
        let notice = Notice::info(t_with_args(
            "stream.started",
            &[("file", file_name), ("rows", &rows.to_string())],
        ));
        Ok(DashboardResponse::new(session, notice))
    }

    /// 停止实时回放
    pub fn stop_stream(&self) -> Notice {
        self.replayer.stop();
        Notice::info(t("stream.stopped"))
    }

    /// 实时面板快照（附带当前状态提示）
    pub fn live_board(&self) -> DashboardResponse<LiveBoard> {
        let board = self.replayer.snapshot();
        let notice = board_notice(&board);
        DashboardResponse { data: board, notice }
    }

    /// 远程服务健康检查
    pub async fn health(&self) -> ApiResult<bool> {
        Ok(self.service.health().await?)
    }
}

/// 面板状态 → 提示
fn board_notice(board: &LiveBoard) -> Option<Notice> {
    if board.status == StreamStatus::Failed {
        let reason = board.last_error.clone().unwrap_or_default();
        return Some(Notice::error(t_with_args(
            "stream.remote_failure",
            &[("reason", &reason)],
        )));
    }
    if board.risk_mode {
        return Some(Notice::warning(t_with_args(
            "stream.risk_mode",
            &[("count", &board.cumulative_defects.to_string())],
        )));
    }
    if board.status == StreamStatus::Idle && board.session_id.is_some() {
        return Some(Notice::info(t_with_args(
            "stream.finished",
            &[("rows", &board.processed_rows.to_string())],
        )));
    }
    None
}

fn log_rejected(err: ImportError) -> ApiError {
    warn!("上传被拒绝: {}", err);
    ApiError::Import(err)
}
