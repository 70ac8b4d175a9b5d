// ==========================================
// 测试辅助函数
// ==========================================
// 职责: 提供测试所需的数据库初始化、测试数据生成、记录型投递端
// ==========================================

#![allow(dead_code)]

use async_trait::async_trait;
use secret_santa::app::AppState;
use secret_santa::domain::{GroupTag, NewParticipant, ParticipantId, RevealRecord, Round};
use secret_santa::engine::{DeliveryError, NotificationSink};
use std::collections::HashSet;
use std::error::Error;
use std::sync::{Arc, Mutex};
use tempfile::NamedTempFile;

/// 创建临时测试数据库并初始化 schema
///
/// # 返回
/// - NamedTempFile: 临时数据库文件（需要保持存活）
/// - String: 数据库文件路径
pub fn create_test_db() -> Result<(NamedTempFile, String), Box<dyn Error>> {
    let temp_file = NamedTempFile::new()?;
    let db_path = temp_file.path().to_string_lossy().to_string();

    let conn = secret_santa::db::open_sqlite_connection(&db_path)?;
    secret_santa::db::init_schema(&conn)?;

    Ok((temp_file, db_path))
}

/// 创建使用记录型投递端的 AppState
pub fn create_test_state(db_path: &str, sink: Arc<RecordingSink>) -> AppState {
    AppState::new(db_path.to_string())
        .expect("Failed to create AppState")
        .with_notifier(sink)
}

/// 写入名单，返回按输入顺序的参与者 id
///
/// 每项: (first_name, email, group)
pub fn seed_roster(state: &AppState, people: &[(&str, &str, i64)]) -> Vec<ParticipantId> {
    let batch: Vec<NewParticipant> = people
        .iter()
        .map(|(name, email, group)| NewParticipant {
            first_name: name.to_string(),
            last_name: "Test".to_string(),
            email: email.to_string(),
            group: GroupTag(*group),
        })
        .collect();
    state
        .participant_repo
        .batch_insert(&batch)
        .expect("Failed to seed roster")
}

/// 三个家庭、六个人的标准名单
pub fn three_families(state: &AppState) -> Vec<ParticipantId> {
    seed_roster(
        state,
        &[
            ("Alice", "alice@example.com", 1),
            ("Bob", "bob@example.com", 1),
            ("Charlie", "charlie@example.com", 2),
            ("Carol", "carol@example.com", 2),
            ("Daisy", "daisy@example.com", 3),
            ("Dan", "dan@example.com", 3),
        ],
    )
}

// ==========================================
// RecordingSink - 记录型投递端
// ==========================================
#[derive(Default)]
pub struct RecordingSink {
    pub reveals: Mutex<Vec<RevealRecord>>,
    pub reports: Mutex<Vec<(Round, usize)>>,
    fail_for: HashSet<ParticipantId>,
}

impl RecordingSink {
    /// 对指定送礼人投递失败
    pub fn failing_for(ids: &[ParticipantId]) -> Self {
        Self {
            fail_for: ids.iter().copied().collect(),
            ..Default::default()
        }
    }

    pub fn reveal_count(&self) -> usize {
        self.reveals.lock().unwrap().len()
    }

    pub fn report_count(&self) -> usize {
        self.reports.lock().unwrap().len()
    }
}

#[async_trait]
impl NotificationSink for RecordingSink {
    async fn deliver_reveal(&self, record: &RevealRecord) -> Result<(), DeliveryError> {
        self.reveals.lock().unwrap().push(record.clone());
        if self.fail_for.contains(&record.giver.id) {
            return Err(DeliveryError::Rejected("mailbox unavailable".to_string()));
        }
        Ok(())
    }

    async fn deliver_report(&self, round: Round, records: &[RevealRecord]) -> Result<(), DeliveryError> {
        self.reports.lock().unwrap().push((round, records.len()));
        Ok(())
    }
}
