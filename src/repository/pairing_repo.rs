// ==========================================
// 礼物交换抽签系统 - 配对数据仓储
// ==========================================
// 红线: Repository 不含业务逻辑
// 红线: 同一轮最多存在一份配对；重跑 = 事务内删除后写入
// ==========================================

use crate::domain::{Assignment, HistoryMap, ParticipantId, Round, StoredPairing};
use crate::engine::ports::{CommitSink, HistoryStore};
use crate::repository::error::{RepositoryError, RepositoryResult};
use chrono::NaiveDateTime;
use rusqlite::{params, Connection};
use std::sync::{Arc, Mutex};
use tracing::debug;

// ==========================================
// PairingRepository - 配对仓储
// ==========================================
pub struct PairingRepository {
    conn: Arc<Mutex<Connection>>,
}

impl PairingRepository {
    /// 创建新的PairingRepository实例
    pub fn new(conn: Arc<Mutex<Connection>>) -> Self {
        Self { conn }
    }

    /// 获取数据库连接
    fn get_conn(&self) -> RepositoryResult<std::sync::MutexGuard<Connection>> {
        self.conn
            .lock()
            .map_err(|e| RepositoryError::LockError(e.to_string()))
    }

    /// 查询某轮的全部配对（按送礼人 id 排序）
    pub fn find_by_round(&self, round: Round) -> RepositoryResult<Vec<StoredPairing>> {
        let conn = self.get_conn()?;

        let mut stmt = conn.prepare(
            r#"SELECT round, giver_id, receiver_id, created_at
               FROM pairings
               WHERE round = ?
               ORDER BY giver_id"#,
        )?;

        let rows = stmt
            .query_map(params![round.0], |row| {
                let created_at: String = row.get(3)?;
                let created_at = NaiveDateTime::parse_from_str(&created_at, "%Y-%m-%d %H:%M:%S")
                    .map_err(|e| {
                        rusqlite::Error::FromSqlConversionFailure(
                            3,
                            rusqlite::types::Type::Text,
                            Box::new(e),
                        )
                    })?;
                Ok(StoredPairing {
                    round: Round(row.get(0)?),
                    giver_id: ParticipantId(row.get(1)?),
                    receiver_id: ParticipantId(row.get(2)?),
                    created_at,
                })
            })?
            .collect::<Result<Vec<StoredPairing>, _>>()?;

        Ok(rows)
    }

    /// 原子替换某轮配对
    ///
    /// # 返回
    /// - `Ok(count)`: 写入行数
    /// - `Err`: 任一语句失败，事务回滚，原有配对保持不变
    pub fn replace_round(&self, round: Round, assignment: &Assignment) -> RepositoryResult<usize> {
        let mut conn = self.get_conn()?;
        let tx = conn.transaction()?;

        let removed = tx.execute("DELETE FROM pairings WHERE round = ?", params![round.0])?;

        {
            let mut stmt = tx.prepare(
                r#"INSERT INTO pairings (round, giver_id, receiver_id)
                   VALUES (?, ?, ?)"#,
            )?;

            for pair in assignment.pairs() {
                stmt.execute(params![round.0, pair.giver.0, pair.receiver.0])?;
            }
        }

        tx.commit()
            .map_err(|e| RepositoryError::DatabaseTransactionError(e.to_string()))?;

        debug!(round = %round, removed, inserted = assignment.len(), "配对已替换");
        Ok(assignment.len())
    }

    /// 删除某轮配对
    pub fn delete_round(&self, round: Round) -> RepositoryResult<usize> {
        let conn = self.get_conn()?;
        let count = conn.execute("DELETE FROM pairings WHERE round = ?", params![round.0])?;
        Ok(count)
    }

    /// 已有配对的轮次（降序）
    pub fn list_rounds(&self) -> RepositoryResult<Vec<Round>> {
        let conn = self.get_conn()?;

        let mut stmt = conn.prepare("SELECT DISTINCT round FROM pairings ORDER BY round DESC")?;
        let rounds = stmt
            .query_map([], |row| Ok(Round(row.get(0)?)))?
            .collect::<Result<Vec<Round>, _>>()?;

        Ok(rounds)
    }
}

impl HistoryStore for PairingRepository {
    fn load_round(&self, round: Round) -> RepositoryResult<HistoryMap> {
        let conn = self.get_conn()?;

        let mut stmt = conn.prepare("SELECT giver_id, receiver_id FROM pairings WHERE round = ?")?;
        let history = stmt
            .query_map(params![round.0], |row| {
                Ok((ParticipantId(row.get(0)?), ParticipantId(row.get(1)?)))
            })?
            .collect::<Result<HistoryMap, _>>()?;

        Ok(history)
    }
}

impl CommitSink for PairingRepository {
    fn replace_round(&self, round: Round, assignment: &Assignment) -> RepositoryResult<usize> {
        PairingRepository::replace_round(self, round, assignment)
    }
}
