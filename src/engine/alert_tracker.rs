// ==========================================
// 品质保证监控看板 - 告警跟踪器
// ==========================================
// 规则:
//   - 同一产品标签在一次回放会话中至多记录一次告警
//   - 发生序号 = 插入前日志长度 + 1，插入时定级且不再变化
//   - 日志定容，溢出淘汰最旧（与回放缓冲一致）
//   - 告警区间: 折线缓冲中连续正类预测的首尾标签
// ==========================================

use crate::domain::{AlarmSegment, AlertEvent, StreamPoint};
use crate::engine::rolling_buffer::RollingBuffer;
use std::collections::HashSet;

#[derive(Debug, Clone)]
pub struct AlertTracker {
    events: RollingBuffer<AlertEvent>,
    seen: HashSet<String>,
}

impl AlertTracker {
    pub fn new(capacity: usize) -> Self {
        Self {
            events: RollingBuffer::new(capacity),
            seen: HashSet::new(),
        }
    }

    /// 记录一次正类预测
    ///
    /// # 返回
    /// - Some(event): 新产品，已写入日志
    /// - None: 该产品本会话已告警过，忽略
    pub fn record(&mut self, product_id: &str, timestamp_ms: i64) -> Option<AlertEvent> {
        if !self.seen.insert(product_id.to_string()) {
            tracing::debug!("重复告警忽略: {}", product_id);
            return None;
        }

        let event = AlertEvent::new(product_id, self.events.len() + 1, timestamp_ms);
        if let Some(evicted) = self.events.push(event.clone()) {
            tracing::debug!("告警日志溢出, 淘汰: {}", evicted.product_id);
        }
        Some(event)
    }

    pub fn has_alerted(&self, product_id: &str) -> bool {
        self.seen.contains(product_id)
    }

    pub fn events(&self) -> Vec<AlertEvent> {
        self.events.to_vec()
    }

    pub fn len(&self) -> usize {
        self.events.len()
    }

    pub fn is_empty(&self) -> bool {
        self.events.is_empty()
    }

    pub fn clear(&mut self) {
        self.events.clear();
        self.seen.clear();
    }
}

/// 计算告警区间（连续正类预测）
pub fn alarm_segments(points: &[StreamPoint]) -> Vec<AlarmSegment> {
    let mut segments = Vec::new();
    let mut start: Option<usize> = None;

    for (i, point) in points.iter().enumerate() {
        match (point.is_alarm(), start) {
            (true, None) => start = Some(i),
            (false, Some(s)) => {
                segments.push(AlarmSegment {
                    from: points[s].name.clone(),
                    to: points[i - 1].name.clone(),
                });
                start = None;
            }
            _ => {}
        }
    }

    if let (Some(s), Some(last)) = (start, points.last()) {
        segments.push(AlarmSegment {
            from: points[s].name.clone(),
            to: last.name.clone(),
        });
    }

    segments
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::Severity;

    #[test]
    fn test_dedup_per_product() {
        let mut tracker = AlertTracker::new(10);
        assert!(tracker.record("PRD_1", 0).is_some());
        assert!(tracker.record("PRD_1", 1).is_none());
        assert!(tracker.record("PRD_2", 2).is_some());
        assert_eq!(tracker.len(), 2);
        assert!(tracker.has_alerted("PRD_1"));
    }

    #[test]
    fn test_occurrence_and_severity() {
        let mut tracker = AlertTracker::new(10);
        let severities: Vec<Severity> = (1..=6)
            .map(|i| tracker.record(&format!("PRD_{}", i), 0).unwrap().severity)
            .collect();
        assert_eq!(
            severities,
            vec![
                Severity::Low,
                Severity::Low,
                Severity::Medium,
                Severity::Medium,
                Severity::High,
                Severity::High
            ]
        );
    }

    #[test]
    fn test_capacity_fifo_and_fixed_severity() {
        let mut tracker = AlertTracker::new(10);
        for i in 1..=12 {
            tracker.record(&format!("PRD_{}", i), i as i64);
        }

        let events = tracker.events();
        assert_eq!(events.len(), 10);
        assert_eq!(events[0].product_id, "PRD_3");
        assert_eq!(events[9].product_id, "PRD_12");
        // 已入日志事件的序号与等级保持插入时的值
        assert_eq!(events[0].occurrence_index, 3);
        assert_eq!(events[0].severity, Severity::Medium);
        assert_eq!(events[9].occurrence_index, 11);
    }

    #[test]
    fn test_evicted_product_never_realerts() {
        let mut tracker = AlertTracker::new(2);
        tracker.record("PRD_1", 0);
        tracker.record("PRD_2", 0);
        tracker.record("PRD_3", 0);
        assert!(tracker.record("PRD_1", 0).is_none());
        assert_eq!(tracker.len(), 2);
    }

    #[test]
    fn test_alarm_segments() {
        let points: Vec<StreamPoint> = [0, 1, 1, 0, 1, 0, 1, 1]
            .iter()
            .enumerate()
            .map(|(i, v)| StreamPoint::new(format!("P{}", i), *v))
            .collect();

        let segs = alarm_segments(&points);
        assert_eq!(
            segs,
            vec![
                AlarmSegment { from: "P1".into(), to: "P2".into() },
                AlarmSegment { from: "P4".into(), to: "P4".into() },
                AlarmSegment { from: "P6".into(), to: "P7".into() },
            ]
        );
        assert!(alarm_segments(&[]).is_empty());
    }
}
