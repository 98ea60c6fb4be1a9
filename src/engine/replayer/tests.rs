use super::*;
use crate::domain::{BatchSummary, Severity};
use crate::predictor::{Prediction, RemoteResult};
use async_trait::async_trait;
use serde_json::json;
use std::collections::VecDeque;
use std::sync::atomic::AtomicUsize;

// ==========================================
// 测试辅助
// ==========================================

#[derive(Debug, Clone, Copy)]
enum Step {
    Positive,
    Negative,
    HttpError(u16),
}

/// 按脚本依次返回预测结果的远程服务
struct ScriptedService {
    steps: Mutex<VecDeque<Step>>,
    fallback: Step,
    calls: AtomicUsize,
    seen_rows: Mutex<Vec<Map<String, Value>>>,
    batch_fails: bool,
    batch_delay: Duration,
    delay: Duration,
}

impl ScriptedService {
    fn new(steps: Vec<Step>, fallback: Step) -> Self {
        Self {
            steps: Mutex::new(steps.into()),
            fallback,
            calls: AtomicUsize::new(0),
            seen_rows: Mutex::new(Vec::new()),
            batch_fails: false,
            batch_delay: Duration::ZERO,
            delay: Duration::ZERO,
        }
    }

    fn always(step: Step) -> Self {
        Self::new(Vec::new(), step)
    }

    fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl PredictionService for ScriptedService {
    async fn predict_row(&self, row: &Map<String, Value>) -> RemoteResult<Prediction> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.seen_rows.lock().unwrap().push(row.clone());
        if !self.delay.is_zero() {
            tokio::time::sleep(self.delay).await;
        }

        let step = self
            .steps
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or(self.fallback);
        match step {
            Step::Positive => Ok(Prediction {
                prediction: 1,
                label: "defect".to_string(),
                probability: 0.9,
            }),
            Step::Negative => Ok(Prediction {
                prediction: 0,
                label: "normal".to_string(),
                probability: 0.1,
            }),
            Step::HttpError(status) => Err(RemoteError::Status {
                endpoint: "/predict".to_string(),
                status,
                body: "internal error".to_string(),
            }),
        }
    }

    async fn aggregate_file(&self, _file_name: &str, _content: Vec<u8>) -> RemoteResult<BatchSummary> {
        if !self.batch_delay.is_zero() {
            tokio::time::sleep(self.batch_delay).await;
        }
        if self.batch_fails {
            return Err(RemoteError::Rejected {
                error: "missing columns".to_string(),
                missing: vec!["EX1.MELT_TEMP".to_string()],
            });
        }
        Ok(BatchSummary {
            total_inspects: 3,
            normal_count: 1,
            defect_total: 2,
            ..BatchSummary::default()
        })
    }

    async fn health(&self) -> RemoteResult<bool> {
        Ok(true)
    }
}

fn fast_settings() -> ReplaySettings {
    ReplaySettings {
        tick_interval: Duration::from_millis(2),
        ..ReplaySettings::default()
    }
}

fn record(value: Value) -> RawRecord {
    match value {
        Value::Object(map) => map,
        _ => panic!("测试数据必须是对象"),
    }
}

fn numbered_rows(n: usize) -> Vec<RawRecord> {
    (1..=n)
        .map(|i| record(json!({ "PRODUCT_ID": format!("{:03}", i), "EX1.MELT_TEMP": "210.5" })))
        .collect()
}

// ==========================================
// 会话流程
// ==========================================

#[tokio::test]
async fn test_all_positive_rows_fill_line_and_alert_log() {
    let service = Arc::new(ScriptedService::always(Step::Positive));
    let replayer = StreamingReplayer::new(service.clone(), fast_settings());

    let rows = vec![
        record(json!({"id": "1", "x": "10"})),
        record(json!({"id": "2", "x": "20"})),
        record(json!({"id": "3", "x": "bad"})),
    ];
    let outcome = replayer.start("line.csv", rows, None).join().await;
    assert_eq!(outcome, ReplayOutcome::Completed);

    let board = replayer.snapshot();
    assert_eq!(board.status, StreamStatus::Idle);
    assert_eq!(board.stream_series.len(), 3);
    assert!(board.stream_series.iter().all(|p| p.predicted_value == 1));
    assert_eq!(board.cumulative_defects, 3);

    let indexes: Vec<usize> = board.alerts.iter().map(|a| a.occurrence_index).collect();
    assert_eq!(indexes, vec![1, 2, 3]);
    let severities: Vec<Severity> = board.alerts.iter().map(|a| a.severity).collect();
    assert_eq!(severities, vec![Severity::Low, Severity::Low, Severity::Medium]);

    // "id" 不是标识别名，回退到行号
    let labels: Vec<&str> = board.stream_series.iter().map(|p| p.name.as_str()).collect();
    assert_eq!(labels, vec!["PRD_1", "PRD_2", "PRD_3"]);

    // 非数值保留原字符串
    let seen = service.seen_rows.lock().unwrap();
    assert_eq!(seen[0]["x"], json!(10));
    assert_eq!(seen[2]["x"], json!("bad"));
}

#[tokio::test]
async fn test_remote_failure_halts_replay() {
    let service = Arc::new(ScriptedService::new(
        vec![Step::Positive, Step::HttpError(500)],
        Step::Positive,
    ));
    let replayer = StreamingReplayer::new(service.clone(), fast_settings());

    let outcome = replayer.start("line.csv", numbered_rows(5), None).join().await;
    assert!(matches!(outcome, ReplayOutcome::Failed(_)));

    let board = replayer.snapshot();
    assert_eq!(board.status, StreamStatus::Failed);
    assert!(board.last_error.as_deref().unwrap_or("").contains("500"));
    assert_eq!(board.stream_series.len(), 1);
    assert_eq!(board.head_series.len(), 1);
    assert_eq!(board.processed_rows, 1);
    // 第 3~5 行从未请求
    assert_eq!(service.calls(), 2);
}

#[tokio::test]
async fn test_buffers_keep_latest_ten() {
    let service = Arc::new(ScriptedService::always(Step::Negative));
    let replayer = StreamingReplayer::new(service, fast_settings());

    replayer.start("long.csv", numbered_rows(14), None).join().await;

    let board = replayer.snapshot();
    assert_eq!(board.processed_rows, 14);
    assert_eq!(board.stream_series.len(), 10);
    assert_eq!(board.screw_series.len(), 10);
    assert_eq!(board.stream_series[0].name, "PRD_005");
    assert_eq!(board.stream_series[9].name, "PRD_014");
    assert_eq!(board.head_series[9].time, "PRD_014");
    assert_eq!(board.head_series[9].values["EX1.MELT_TEMP"], Some(210.5));
    assert_eq!(board.head_series[9].values["EX1.MELT_P_PV"], None);
    assert!(board.alerts.is_empty());
    assert!(board.alarm_segments.is_empty());
}

#[tokio::test]
async fn test_repeated_product_alerts_once() {
    let service = Arc::new(ScriptedService::always(Step::Positive));
    let replayer = StreamingReplayer::new(service, fast_settings());

    let rows = vec![
        record(json!({"PRODUCT_ID": "A7"})),
        record(json!({"PRODUCT_ID": "A7"})),
        record(json!({"PRODUCT_ID": " B2 "})),
    ];
    replayer.start("dup.csv", rows, None).join().await;

    let board = replayer.snapshot();
    assert_eq!(board.cumulative_defects, 3);
    assert_eq!(board.alerts.len(), 2);
    assert_eq!(board.alerts[0].product_id, "PRD_A7");
    assert_eq!(board.alerts[1].product_id, "PRD_B2");
    assert_eq!(board.alarm_segments.len(), 1);
    assert_eq!(board.alarm_segments[0].from, "PRD_A7");
    assert_eq!(board.alarm_segments[0].to, "PRD_B2");
}

#[tokio::test]
async fn test_risk_mode_after_threshold() {
    let service = Arc::new(ScriptedService::always(Step::Positive));
    let replayer = StreamingReplayer::new(service, fast_settings());

    replayer.start("risk.csv", numbered_rows(4), None).join().await;
    assert!(!replayer.snapshot().risk_mode);

    replayer.start("risk.csv", numbered_rows(5), None).join().await;
    let board = replayer.snapshot();
    assert!(board.risk_mode);
    assert_eq!(board.alerts[4].severity, Severity::High);
}

#[tokio::test]
async fn test_rows_missing_required_fields_are_skipped() {
    let service = Arc::new(ScriptedService::always(Step::Positive));
    let settings = ReplaySettings {
        required_fields: vec!["EX1.MELT_TEMP".to_string()],
        ..fast_settings()
    };
    let replayer = StreamingReplayer::new(service.clone(), settings);

    let rows = vec![
        record(json!({"PRODUCT_ID": "1", "EX1.MELT_TEMP": "200"})),
        record(json!({"PRODUCT_ID": "2", "EX1.MELT_TEMP": "  "})),
        record(json!({"PRODUCT_ID": "3"})),
        record(json!({"PRODUCT_ID": "4", "EX1.MELT_TEMP": "201"})),
    ];
    let outcome = replayer.start("gaps.csv", rows, None).join().await;
    assert_eq!(outcome, ReplayOutcome::Completed);

    let board = replayer.snapshot();
    assert_eq!(board.skipped_rows, 2);
    assert_eq!(board.processed_rows, 2);
    assert_eq!(board.alerts.len(), 2);
    assert_eq!(service.calls(), 2);
}

// ==========================================
// 取消与整文件聚合
// ==========================================

#[tokio::test]
async fn test_new_session_replaces_previous() {
    let mut slow = ScriptedService::always(Step::Positive);
    slow.delay = Duration::from_millis(20);
    let service = Arc::new(slow);
    let replayer = StreamingReplayer::new(service, fast_settings());

    let first = replayer.start("first.csv", numbered_rows(50), None);
    tokio::time::sleep(Duration::from_millis(30)).await;

    let rows = vec![record(json!({"PRODUCT_ID": "NEW"}))];
    let second = replayer.start("second.csv", rows, None);
    assert_ne!(first.session_id, second.session_id);

    assert_eq!(first.join().await, ReplayOutcome::Cancelled);
    assert_eq!(second.join().await, ReplayOutcome::Completed);

    let board = replayer.snapshot();
    assert_eq!(board.source_name, "second.csv");
    assert_eq!(board.stream_series.len(), 1);
    assert_eq!(board.stream_series[0].name, "PRD_NEW");
    assert_eq!(board.alerts.len(), 1);
    assert_eq!(board.cumulative_defects, 1);
}

#[tokio::test]
async fn test_stop_keeps_displayed_data() {
    let service = Arc::new(ScriptedService::always(Step::Negative));
    let settings = ReplaySettings {
        tick_interval: Duration::from_millis(10),
        ..ReplaySettings::default()
    };
    let replayer = StreamingReplayer::new(service, settings);

    let session = replayer.start("stop.csv", numbered_rows(100), None);
    tokio::time::sleep(Duration::from_millis(45)).await;
    replayer.stop();
    assert_eq!(session.join().await, ReplayOutcome::Cancelled);

    let board = replayer.snapshot();
    assert_eq!(board.status, StreamStatus::Idle);
    assert!(board.processed_rows < 100);
    assert_eq!(board.stream_series.len(), board.processed_rows.min(10));
}

#[tokio::test]
async fn test_batch_summary_attached_to_board() {
    let service = Arc::new(ScriptedService::always(Step::Negative));
    let replayer = StreamingReplayer::new(service, fast_settings());

    replayer
        .start("line.csv", numbered_rows(2), Some(b"a,b\n1,2\n".to_vec()))
        .join()
        .await;

    let board = replayer.snapshot();
    let summary = board.batch_summary.expect("应有整文件聚合结果");
    assert_eq!(summary.defect_total, 2);
    assert_eq!(board.status, StreamStatus::Idle);
}

#[tokio::test]
async fn test_batch_failure_stops_replay() {
    let mut failing = ScriptedService::always(Step::Negative);
    failing.batch_fails = true;
    let service = Arc::new(failing);
    let settings = ReplaySettings {
        tick_interval: Duration::from_millis(20),
        ..ReplaySettings::default()
    };
    let replayer = StreamingReplayer::new(service, settings);

    let outcome = replayer
        .start("line.csv", numbered_rows(20), Some(Vec::new()))
        .join()
        .await;
    match outcome {
        ReplayOutcome::Failed(message) => assert!(message.contains("EX1.MELT_TEMP")),
        other => panic!("应为失败结果: {:?}", other),
    }

    let board = replayer.snapshot();
    assert_eq!(board.status, StreamStatus::Failed);
    assert!(board.last_error.unwrap().contains("EX1.MELT_TEMP"));
    assert!(board.processed_rows < 20);
}

#[tokio::test]
async fn test_batch_failure_after_replay_finished_marks_failed() {
    let mut failing = ScriptedService::always(Step::Negative);
    failing.batch_fails = true;
    failing.batch_delay = Duration::from_millis(50);
    let replayer = StreamingReplayer::new(Arc::new(failing), fast_settings());

    let outcome = replayer
        .start("short.csv", numbered_rows(1), Some(Vec::new()))
        .join()
        .await;
    // 回放先于整文件聚合结束
    assert_eq!(outcome, ReplayOutcome::Completed);

    let board = replayer.snapshot();
    assert_eq!(board.status, StreamStatus::Failed);
    assert_eq!(board.processed_rows, 1);
    assert!(board.last_error.unwrap().contains("EX1.MELT_TEMP"));
}

#[tokio::test]
async fn test_batch_failure_after_stop_is_ignored() {
    let mut failing = ScriptedService::always(Step::Negative);
    failing.batch_fails = true;
    failing.batch_delay = Duration::from_millis(30);
    let settings = ReplaySettings {
        tick_interval: Duration::from_millis(10),
        ..ReplaySettings::default()
    };
    let replayer = StreamingReplayer::new(Arc::new(failing), settings);

    let session = replayer.start("stopped.csv", numbered_rows(50), Some(Vec::new()));
    replayer.stop();
    assert_eq!(session.join().await, ReplayOutcome::Cancelled);

    let board = replayer.snapshot();
    assert_eq!(board.status, StreamStatus::Idle);
    assert!(board.last_error.is_none());
}

// ==========================================
// 行处理辅助函数
// ==========================================

#[test]
fn test_coerce_row() {
    let raw = record(json!({
        "a": "10",
        "b": " 2.5 ",
        "c": "",
        "d": "N/A",
        "e": 7,
        "f": "1e3"
    }));
    let coerced = coerce_row(&raw);
    assert_eq!(coerced["a"], json!(10));
    assert_eq!(coerced["b"], json!(2.5));
    assert_eq!(coerced["c"], Value::Null);
    assert_eq!(coerced["d"], json!("N/A"));
    assert_eq!(coerced["e"], json!(7));
    assert_eq!(coerced["f"], json!(1000));
}

#[test]
fn test_product_label_aliases() {
    assert_eq!(product_label(&record(json!({" PRODUCT_ID": " 77 "})), 0), "PRD_77");
    assert_eq!(product_label(&record(json!({"num": 12})), 0), "PRD_12");
    assert_eq!(product_label(&record(json!({"PRODUCT_ID": ""})), 4), "PRD_5");
    assert_eq!(product_label(&record(json!({})), 0), "PRD_1");
}
