// ==========================================
// 礼物交换抽签系统 - 打开追踪 API
// ==========================================
// 尽力而为: 记录失败只写日志，不向调用方（像素请求）暴露
// ==========================================

use crate::domain::{ParticipantId, Round};
use crate::repository::EmailOpenRepository;
use std::sync::Arc;
use tracing::{debug, warn};

pub struct TrackingApi {
    open_repo: Arc<EmailOpenRepository>,
}

impl TrackingApi {
    pub fn new(open_repo: Arc<EmailOpenRepository>) -> Self {
        Self { open_repo }
    }

    /// 记录一次打开，返回是否记录成功
    pub fn record_open(
        &self,
        participant_id: ParticipantId,
        round: Round,
        ip: Option<&str>,
        user_agent: Option<&str>,
    ) -> bool {
        match self.open_repo.record_open(participant_id, round, ip, user_agent) {
            Ok(()) => {
                debug!(participant_id = %participant_id, round = %round, "打开已记录");
                true
            }
            Err(e) => {
                warn!(participant_id = %participant_id, round = %round, error = %e, "打开记录失败，已忽略");
                false
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rusqlite::Connection;
    use std::sync::Mutex;

    #[test]
    fn test_unknown_participant_is_swallowed() {
        let conn = Connection::open_in_memory().unwrap();
        crate::db::configure_sqlite_connection(&conn).unwrap();
        crate::db::init_schema(&conn).unwrap();
        let repo = Arc::new(EmailOpenRepository::new(Arc::new(Mutex::new(conn))));
        let api = TrackingApi::new(repo.clone());

        // 外键约束拒绝未知参与者，但不向调用方报错
        assert!(!api.record_open(ParticipantId(404), Round(2025), None, None));
        assert!(repo.list_by_round(Round(2025)).unwrap().is_empty());
    }
}
