// ==========================================
// 礼物交换抽签系统 - 通知分发
// ==========================================
// 并发投递所有揭晓记录，逐条收集结果
// 单条失败只记录，不影响其他投递，也不回滚已提交的配对
// ==========================================

use crate::domain::{ParticipantId, RevealRecord};
use crate::engine::ports::NotificationSink;
use futures::future::join_all;
use serde::Serialize;
use tracing::{info, warn};

/// 单条投递失败
#[derive(Debug, Clone, Serialize)]
pub struct DeliveryFailure {
    pub participant_id: ParticipantId,
    pub reason: String,
}

/// 投递汇总
#[derive(Debug, Clone, Default, Serialize)]
pub struct DeliveryReport {
    pub delivered: Vec<ParticipantId>,
    pub failures: Vec<DeliveryFailure>,
}

impl DeliveryReport {
    pub fn attempted(&self) -> usize {
        self.delivered.len() + self.failures.len()
    }

    pub fn all_delivered(&self) -> bool {
        self.failures.is_empty()
    }
}

/// 并发投递揭晓通知
///
/// # 返回
/// - DeliveryReport: 成功与失败按揭晓记录顺序排列
pub async fn deliver_all<N>(sink: &N, records: &[RevealRecord]) -> DeliveryReport
where
    N: NotificationSink + ?Sized,
{
    let results = join_all(records.iter().map(|r| sink.deliver_reveal(r))).await;

    let mut report = DeliveryReport::default();
    for (record, result) in records.iter().zip(results) {
        match result {
            Ok(()) => report.delivered.push(record.giver.id),
            Err(e) => {
                warn!(
                    round = %record.round,
                    participant_id = %record.giver.id,
                    error = %e,
                    "揭晓通知投递失败"
                );
                report.failures.push(DeliveryFailure {
                    participant_id: record.giver.id,
                    reason: e.to_string(),
                });
            }
        }
    }

    info!(
        delivered = report.delivered.len(),
        failed = report.failures.len(),
        "揭晓通知投递完成"
    );
    report
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{Participant, Round};
    use crate::engine::error::DeliveryError;
    use async_trait::async_trait;
    use std::sync::Mutex;

    /// 对指定送礼人失败的投递端
    struct FlakySink {
        fail_for: ParticipantId,
        seen: Mutex<Vec<ParticipantId>>,
    }

    #[async_trait]
    impl NotificationSink for FlakySink {
        async fn deliver_reveal(&self, record: &RevealRecord) -> Result<(), DeliveryError> {
            self.seen.lock().unwrap().push(record.giver.id);
            if record.giver.id == self.fail_for {
                return Err(DeliveryError::Rejected("mailbox full".to_string()));
            }
            Ok(())
        }

        async fn deliver_report(&self, _round: Round, _records: &[RevealRecord]) -> Result<(), DeliveryError> {
            Ok(())
        }
    }

    #[tokio::test]
    async fn test_one_failure_does_not_block_others() {
        let people: Vec<Participant> = (1..=3)
            .map(|i| Participant::new(i, format!("P{}", i), "", i, Some("p@example.com")))
            .collect();
        let records: Vec<RevealRecord> = (0..3)
            .map(|i| RevealRecord {
                round: Round(2025),
                giver: people[i].clone(),
                receiver: people[(i + 1) % 3].clone(),
            })
            .collect();

        let sink = FlakySink {
            fail_for: ParticipantId(2),
            seen: Mutex::new(Vec::new()),
        };
        let report = deliver_all(&sink, &records).await;

        assert_eq!(sink.seen.lock().unwrap().len(), 3);
        assert_eq!(report.delivered, vec![ParticipantId(1), ParticipantId(3)]);
        assert_eq!(report.failures.len(), 1);
        assert_eq!(report.failures[0].participant_id, ParticipantId(2));
        assert_eq!(report.attempted(), 3);
        assert!(!report.all_delivered());
    }
}
