// ==========================================
// 礼物交换抽签系统 - 打开追踪数据仓储
// ==========================================
// 职责: (参与者, 轮次) 维度的通知打开计数
// 说明: 尽力而为的辅助信号，不参与抽签/提交的正确性
// ==========================================

use crate::domain::{OpenStat, ParticipantId, Round};
use crate::repository::error::{RepositoryError, RepositoryResult};
use chrono::NaiveDateTime;
use rusqlite::{params, Connection};
use std::sync::{Arc, Mutex};

const DATETIME_FMT: &str = "%Y-%m-%d %H:%M:%S";

// ==========================================
// EmailOpenRepository - 打开追踪仓储
// ==========================================
pub struct EmailOpenRepository {
    conn: Arc<Mutex<Connection>>,
}

impl EmailOpenRepository {
    /// 创建新的EmailOpenRepository实例
    pub fn new(conn: Arc<Mutex<Connection>>) -> Self {
        Self { conn }
    }

    /// 获取数据库连接
    fn get_conn(&self) -> RepositoryResult<std::sync::MutexGuard<Connection>> {
        self.conn
            .lock()
            .map_err(|e| RepositoryError::LockError(e.to_string()))
    }

    /// 记录一次打开
    ///
    /// # 规则
    /// - 首次打开: 插入，open_count = 1
    /// - 再次打开: open_count + 1，刷新 last_* 字段，first_opened_at 不变
    pub fn record_open(
        &self,
        participant_id: ParticipantId,
        round: Round,
        ip: Option<&str>,
        user_agent: Option<&str>,
    ) -> RepositoryResult<()> {
        let conn = self.get_conn()?;

        conn.execute(
            r#"INSERT INTO email_opens (
                    participant_id, round, first_opened_at, last_opened_at,
                    open_count, last_ip, last_user_agent
                ) VALUES (?1, ?2, datetime('now'), datetime('now'), 1, ?3, ?4)
                ON CONFLICT(participant_id, round) DO UPDATE SET
                    last_opened_at = datetime('now'),
                    open_count = open_count + 1,
                    last_ip = ?3,
                    last_user_agent = ?4"#,
            params![participant_id.0, round.0, ip, user_agent],
        )?;

        Ok(())
    }

    /// 查询某轮的打开统计（按参与者 id 排序）
    pub fn list_by_round(&self, round: Round) -> RepositoryResult<Vec<OpenStat>> {
        let conn = self.get_conn()?;

        let mut stmt = conn.prepare(
            r#"SELECT participant_id, round, first_opened_at, last_opened_at,
                      open_count, last_ip, last_user_agent
               FROM email_opens
               WHERE round = ?
               ORDER BY participant_id"#,
        )?;

        let stats = stmt
            .query_map(params![round.0], map_row)?
            .collect::<Result<Vec<OpenStat>, _>>()?;

        Ok(stats)
    }

    /// 清空某轮的打开统计（正式抽签后重新计数）
    pub fn clear_round(&self, round: Round) -> RepositoryResult<usize> {
        let conn = self.get_conn()?;
        let count = conn.execute("DELETE FROM email_opens WHERE round = ?", params![round.0])?;
        Ok(count)
    }
}

fn parse_ts(idx: usize, raw: String) -> rusqlite::Result<NaiveDateTime> {
    NaiveDateTime::parse_from_str(&raw, DATETIME_FMT).map_err(|e| {
        rusqlite::Error::FromSqlConversionFailure(idx, rusqlite::types::Type::Text, Box::new(e))
    })
}

fn map_row(row: &rusqlite::Row) -> rusqlite::Result<OpenStat> {
    Ok(OpenStat {
        participant_id: ParticipantId(row.get(0)?),
        round: Round(row.get(1)?),
        first_opened_at: parse_ts(2, row.get(2)?)?,
        last_opened_at: parse_ts(3, row.get(3)?)?,
        open_count: row.get(4)?,
        last_ip: row.get(5)?,
        last_user_agent: row.get(6)?,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn setup_test_db() -> Arc<Mutex<Connection>> {
        let conn = Connection::open_in_memory().unwrap();
        crate::db::configure_sqlite_connection(&conn).unwrap();
        crate::db::init_schema(&conn).unwrap();
        conn.execute_batch(
            "INSERT INTO participants (id, first_name, group_tag) VALUES (1, 'A', 1), (2, 'B', 2);",
        )
        .unwrap();
        Arc::new(Mutex::new(conn))
    }

    #[test]
    fn test_repeat_opens_increment_counter() {
        let repo = EmailOpenRepository::new(setup_test_db());

        repo.record_open(ParticipantId(1), Round(2025), Some("10.0.0.1"), Some("ua-1"))
            .unwrap();
        repo.record_open(ParticipantId(1), Round(2025), Some("10.0.0.2"), None)
            .unwrap();
        repo.record_open(ParticipantId(2), Round(2025), None, None).unwrap();

        let stats = repo.list_by_round(Round(2025)).unwrap();
        assert_eq!(stats.len(), 2);
        assert_eq!(stats[0].participant_id, ParticipantId(1));
        assert_eq!(stats[0].open_count, 2);
        assert_eq!(stats[0].last_ip.as_deref(), Some("10.0.0.2"));
        assert_eq!(stats[0].last_user_agent, None);
        assert_eq!(stats[1].open_count, 1);
    }

    #[test]
    fn test_rounds_are_independent() {
        let repo = EmailOpenRepository::new(setup_test_db());
        repo.record_open(ParticipantId(1), Round(2024), None, None).unwrap();
        repo.record_open(ParticipantId(1), Round(2025), None, None).unwrap();

        assert_eq!(repo.clear_round(Round(2025)).unwrap(), 1);
        assert!(repo.list_by_round(Round(2025)).unwrap().is_empty());
        assert_eq!(repo.list_by_round(Round(2024)).unwrap().len(), 1);
    }

    #[test]
    fn test_unknown_participant_rejected() {
        let repo = EmailOpenRepository::new(setup_test_db());
        let err = repo
            .record_open(ParticipantId(42), Round(2025), None, None)
            .unwrap_err();
        assert!(matches!(err, RepositoryError::ForeignKeyViolation(_)));
    }
}
