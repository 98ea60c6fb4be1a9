// ==========================================
// 品质保证监控看板 - 实时回放引擎
// ==========================================
// 状态机: Idle → Streaming → (Idle | Failed)
// 流程:
//   1. 新文件上传 → 代次(generation)+1，清空全部滚动缓冲，状态置 Streaming
//   2. 整文件聚合请求独立派发一次；失败则终止回放并上报
//   3. 固定节拍逐行回放：数值化 → 远程预测 → 写入折线/工艺区缓冲 → 告警
//   4. 远程失败立即停止（Failed），全部行处理完回到 Idle
// 并发约束:
//   - 同一时刻只有一个有效会话；旧会话的回调在写共享面板前校验代次
//   - 每个节拍等待本行响应后才推进下一行（慢响应时节拍顺延）
//   - 进行中的请求不强制中断，结果在代次失效后丢弃
// ==========================================

use crate::config::DashboardConfig;
use crate::domain::{BatchSummary, LiveBoard, StreamPoint, StreamStatus, ZoneSnapshot};
use crate::engine::alert_tracker::{alarm_segments, AlertTracker};
use crate::engine::rolling_buffer::RollingBuffer;
use crate::importer::field_mapper::{value_to_f64, PRODUCT_ID};
use crate::importer::RawRecord;
use crate::predictor::{PredictionService, RemoteError};
use serde_json::{Map, Number, Value};
use std::collections::BTreeMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Duration;
use tokio::task::JoinHandle;
use tokio::time::{interval_at, Instant, MissedTickBehavior};
use tracing::{debug, error, info, warn};
use uuid::Uuid;

/// 产品标签前缀
pub const PRODUCT_LABEL_PREFIX: &str = "PRD_";

// ==========================================
// ReplaySettings - 回放参数
// ==========================================
#[derive(Debug, Clone)]
pub struct ReplaySettings {
    pub tick_interval: Duration,
    pub view_capacity: usize,
    pub alert_capacity: usize,
    pub risk_mode_threshold: u64,
    pub head_keys: Vec<String>,
    pub screw_keys: Vec<String>,
    pub required_fields: Vec<String>,
}

impl From<&DashboardConfig> for ReplaySettings {
    fn from(config: &DashboardConfig) -> Self {
        Self {
            tick_interval: Duration::from_millis(config.tick_interval_ms),
            view_capacity: config.view_capacity,
            alert_capacity: config.alert_capacity,
            risk_mode_threshold: config.risk_mode_threshold,
            head_keys: config.head_keys.clone(),
            screw_keys: config.screw_keys.clone(),
            required_fields: config.required_fields.clone(),
        }
    }
}

impl Default for ReplaySettings {
    fn default() -> Self {
        Self::from(&DashboardConfig::default())
    }
}

/// 会话结束原因
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ReplayOutcome {
    /// 全部行处理完毕
    Completed,
    /// 远程失败或整文件聚合失败导致停止
    Failed(String),
    /// 被新会话替换或被手动停止
    Cancelled,
}

/// 单个节拍的处理结果
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum TickOutcome {
    Applied,
    Skipped,
    Discarded,
}

// ==========================================
// 面板状态（受互斥锁保护）
// ==========================================
struct BoardState {
    generation: u64,
    session_id: Option<Uuid>,
    source_name: String,
    status: StreamStatus,
    last_error: Option<String>,
    processed_rows: usize,
    skipped_rows: usize,
    total_rows: usize,
    cumulative_defects: u64,
    stream: RollingBuffer<StreamPoint>,
    head: RollingBuffer<ZoneSnapshot>,
    screw: RollingBuffer<ZoneSnapshot>,
    alerts: AlertTracker,
    batch_summary: Option<BatchSummary>,
}

impl BoardState {
    fn new(settings: &ReplaySettings) -> Self {
        Self {
            generation: 0,
            session_id: None,
            source_name: String::new(),
            status: StreamStatus::Idle,
            last_error: None,
            processed_rows: 0,
            skipped_rows: 0,
            total_rows: 0,
            cumulative_defects: 0,
            stream: RollingBuffer::new(settings.view_capacity),
            head: RollingBuffer::new(settings.view_capacity),
            screw: RollingBuffer::new(settings.view_capacity),
            alerts: AlertTracker::new(settings.alert_capacity),
            batch_summary: None,
        }
    }

    /// 当前代次仍在回放中
    fn accepts(&self, generation: u64) -> bool {
        self.generation == generation && self.status.is_streaming()
    }
}

struct ReplayShared {
    service: Arc<dyn PredictionService>,
    settings: ReplaySettings,
    generation: AtomicU64,
    board: Mutex<BoardState>,
}

impl ReplayShared {
    fn board(&self) -> MutexGuard<'_, BoardState> {
        self.board.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn is_current(&self, generation: u64) -> bool {
        self.generation.load(Ordering::SeqCst) == generation
    }
}

// ==========================================
// ReplaySession - 会话句柄
// ==========================================
#[derive(Debug)]
pub struct ReplaySession {
    pub session_id: Uuid,
    pub generation: u64,
    replay: JoinHandle<ReplayOutcome>,
    batch: Option<JoinHandle<()>>,
}

impl ReplaySession {
    /// 等待会话结束（回放循环与整文件聚合请求都完成）
    pub async fn join(self) -> ReplayOutcome {
        if let Some(batch) = self.batch {
            if let Err(e) = batch.await {
                warn!("整文件聚合任务异常结束: {}", e);
            }
        }
        match self.replay.await {
            Ok(outcome) => outcome,
            Err(e) => ReplayOutcome::Failed(format!("回放任务异常结束: {}", e)),
        }
    }
}

// ==========================================
// StreamingReplayer
// ==========================================
#[derive(Clone)]
pub struct StreamingReplayer {
    shared: Arc<ReplayShared>,
}

impl StreamingReplayer {
    pub fn new(service: Arc<dyn PredictionService>, settings: ReplaySettings) -> Self {
        let board = BoardState::new(&settings);
        Self {
            shared: Arc::new(ReplayShared {
                service,
                settings,
                generation: AtomicU64::new(0),
                board: Mutex::new(board),
            }),
        }
    }

    pub fn settings(&self) -> &ReplaySettings {
        &self.shared.settings
    }

    /// 启动新回放会话（替换旧会话）
    ///
    /// # 参数
    /// - source_name: 上传文件名
    /// - rows: CSV 解析后的原始行（按文件顺序）
    /// - file_content: 整文件内容；Some 时额外派发一次整文件聚合请求
    ///
    /// 必须在 tokio 运行时内调用
    pub fn start(
        &self,
        source_name: &str,
        rows: Vec<RawRecord>,
        file_content: Option<Vec<u8>>,
    ) -> ReplaySession {
        let generation = self.shared.generation.fetch_add(1, Ordering::SeqCst) + 1;
        let session_id = Uuid::new_v4();

        {
            let mut board = self.shared.board();
            if board.status.is_streaming() {
                info!("新上传替换进行中的回放: {}", board.source_name);
            }
            *board = BoardState::new(&self.shared.settings);
            board.generation = generation;
            board.session_id = Some(session_id);
            board.source_name = source_name.to_string();
            board.status = StreamStatus::Streaming;
            board.total_rows = rows.len();
        }

        info!(
            session_id = %session_id,
            generation,
            rows = rows.len(),
            "开始实时回放: {}",
            source_name
        );

        let batch = file_content.map(|content| {
            let shared = Arc::clone(&self.shared);
            let file_name = source_name.to_string();
            tokio::spawn(async move {
                run_batch_aggregation(shared, generation, file_name, content).await;
            })
        });

        let shared = Arc::clone(&self.shared);
        let replay = tokio::spawn(async move { run_session(shared, generation, rows).await });

        ReplaySession {
            session_id,
            generation,
            replay,
            batch,
        }
    }

    /// 停止当前回放（保留已展示的数据）
    pub fn stop(&self) {
        self.shared.generation.fetch_add(1, Ordering::SeqCst);
        let mut board = self.shared.board();
        if board.status.is_streaming() {
            info!("手动停止回放: {}", board.source_name);
            board.status = StreamStatus::Idle;
        }
    }

    pub fn status(&self) -> StreamStatus {
        self.shared.board().status
    }

    /// 当前面板快照
    pub fn snapshot(&self) -> LiveBoard {
        let board = self.shared.board();
        let stream_series = board.stream.to_vec();
        let segments = alarm_segments(&stream_series);

        LiveBoard {
            session_id: board.session_id.map(|id| id.to_string()),
            source_name: board.source_name.clone(),
            status: board.status,
            last_error: board.last_error.clone(),
            processed_rows: board.processed_rows,
            skipped_rows: board.skipped_rows,
            total_rows: board.total_rows,
            cumulative_defects: board.cumulative_defects,
            risk_mode: board.cumulative_defects >= self.shared.settings.risk_mode_threshold,
            stream_series,
            head_series: board.head.to_vec(),
            screw_series: board.screw.to_vec(),
            alerts: board.alerts.events(),
            alarm_segments: segments,
            batch_summary: board.batch_summary.clone(),
        }
    }
}

// ==========================================
// 会话任务
// ==========================================

async fn run_session(shared: Arc<ReplayShared>, generation: u64, rows: Vec<RawRecord>) -> ReplayOutcome {
    let period = shared.settings.tick_interval;
    let mut ticker = interval_at(Instant::now() + period, period);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

    for (idx, raw) in rows.iter().enumerate() {
        ticker.tick().await;

        {
            let board = shared.board();
            if !shared.is_current(generation) || !board.accepts(generation) {
                debug!(generation, "回放会话已失效, 退出");
                return early_exit(&board, generation);
            }
        }

        match process_row(&shared, generation, idx, raw).await {
            Ok(TickOutcome::Applied) | Ok(TickOutcome::Skipped) => {}
            Ok(TickOutcome::Discarded) => return early_exit(&shared.board(), generation),
            Err(e) => {
                let message = e.to_string();
                error!(generation, row = idx + 1, "实时预测失败, 停止回放: {}", message);
                let mut board = shared.board();
                if board.accepts(generation) {
                    board.status = StreamStatus::Failed;
                    board.last_error = Some(message.clone());
                }
                return ReplayOutcome::Failed(message);
            }
        }
    }

    let mut board = shared.board();
    if !board.accepts(generation) {
        return early_exit(&board, generation);
    }
    board.status = StreamStatus::Idle;
    info!(
        generation,
        processed = board.processed_rows,
        skipped = board.skipped_rows,
        defects = board.cumulative_defects,
        "回放完成: {}",
        board.source_name
    );
    ReplayOutcome::Completed
}

/// 提前退出：本会话已被标记失败时带回错误，否则视为取消
fn early_exit(board: &BoardState, generation: u64) -> ReplayOutcome {
    if board.generation == generation && board.status == StreamStatus::Failed {
        ReplayOutcome::Failed(board.last_error.clone().unwrap_or_default())
    } else {
        ReplayOutcome::Cancelled
    }
}

async fn process_row(
    shared: &ReplayShared,
    generation: u64,
    idx: usize,
    raw: &RawRecord,
) -> Result<TickOutcome, RemoteError> {
    let settings = &shared.settings;

    if let Some(field) = first_missing_field(raw, &settings.required_fields) {
        debug!(row = idx + 1, field = %field, "缺少必需字段, 跳过该行");
        let mut board = shared.board();
        if !board.accepts(generation) {
            return Ok(TickOutcome::Discarded);
        }
        board.skipped_rows += 1;
        return Ok(TickOutcome::Skipped);
    }

    let coerced = coerce_row(raw);
    let prediction = shared.service.predict_row(&coerced).await?;

    let mut board = shared.board();
    if !shared.is_current(generation) || !board.accepts(generation) {
        debug!(row = idx + 1, "会话已失效, 丢弃预测结果");
        return Ok(TickOutcome::Discarded);
    }

    let label = product_label(raw, idx);
    board
        .stream
        .push(StreamPoint::new(label.clone(), prediction.prediction));
    board.head.push(zone_snapshot(&label, &coerced, &settings.head_keys));
    board.screw.push(zone_snapshot(&label, &coerced, &settings.screw_keys));

    if prediction.is_positive() {
        board.cumulative_defects += 1;
        let now_ms = chrono::Utc::now().timestamp_millis();
        if let Some(event) = board.alerts.record(&label, now_ms) {
            warn!(
                product = %event.product_id,
                occurrence = event.occurrence_index,
                severity = %event.severity,
                "不良告警"
            );
        }
    }

    board.processed_rows += 1;
    debug!(
        row = idx + 1,
        product = %label,
        prediction = prediction.prediction,
        probability = prediction.probability,
        "节拍处理完成"
    );
    Ok(TickOutcome::Applied)
}

async fn run_batch_aggregation(
    shared: Arc<ReplayShared>,
    generation: u64,
    file_name: String,
    content: Vec<u8>,
) {
    let result = shared.service.aggregate_file(&file_name, content).await;

    let mut board = shared.board();
    if board.generation != generation {
        debug!(generation, "整文件聚合结果已过期, 丢弃");
        return;
    }

    match result {
        Ok(summary) => {
            info!(
                total = summary.total_inspects,
                defect = summary.defect_total,
                "整文件聚合完成"
            );
            board.batch_summary = Some(summary);
        }
        Err(e) => {
            // 已停止或被新上传替换
            if !shared.is_current(generation) {
                debug!(generation, "会话已停止, 忽略整文件聚合失败: {}", e);
                return;
            }
            // 回放已结束时同样置为失败
            error!("整文件聚合失败, 停止回放: {}", e);
            board.status = StreamStatus::Failed;
            board.last_error = Some(e.to_string());
        }
    }
}

// ==========================================
// 行处理辅助函数
// ==========================================

/// 数值化：空值 → null，可解析为有限数 → 数值，否则保留原字符串
pub fn coerce_row(raw: &RawRecord) -> Map<String, Value> {
    raw.iter()
        .map(|(key, value)| (key.clone(), coerce_value(value)))
        .collect()
}

fn coerce_value(value: &Value) -> Value {
    match value {
        Value::String(s) if s.trim().is_empty() => Value::Null,
        Value::String(s) => match s.trim().parse::<f64>() {
            Ok(n) if n.is_finite() => number_value(n),
            _ => value.clone(),
        },
        other => other.clone(),
    }
}

fn number_value(n: f64) -> Value {
    const MAX_SAFE_INT: f64 = 9_007_199_254_740_991.0;
    if n.fract() == 0.0 && n.abs() <= MAX_SAFE_INT {
        Value::from(n as i64)
    } else {
        Number::from_f64(n).map(Value::Number).unwrap_or(Value::Null)
    }
}

/// 产品标签: "PRD_" + 标识（标识缺失时用 1 起的行号）
pub fn product_label(raw: &RawRecord, idx: usize) -> String {
    let id = PRODUCT_ID
        .first_text(raw)
        .unwrap_or_else(|| (idx + 1).to_string());
    format!("{}{}", PRODUCT_LABEL_PREFIX, id)
}

fn zone_snapshot(label: &str, coerced: &Map<String, Value>, keys: &[String]) -> ZoneSnapshot {
    let values: BTreeMap<String, Option<f64>> = keys
        .iter()
        .map(|k| (k.clone(), coerced.get(k).and_then(value_to_f64)))
        .collect();
    ZoneSnapshot {
        time: label.to_string(),
        values,
    }
}

fn first_missing_field<'a>(raw: &RawRecord, required: &'a [String]) -> Option<&'a String> {
    required.iter().find(|field| match raw.get(field.as_str()) {
        None | Some(Value::Null) => true,
        Some(Value::String(s)) => s.trim().is_empty(),
        Some(_) => false,
    })
}

#[cfg(test)]
mod tests;
