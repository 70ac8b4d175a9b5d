// ==========================================
// 礼物交换抽签系统 - 参与者数据仓储
// ==========================================
// 红线: Repository 不含业务逻辑
// 约束: 所有查询使用参数化
// ==========================================

use crate::domain::{GroupTag, NewParticipant, Participant, ParticipantId, ParticipantRecord};
use crate::repository::error::{RepositoryError, RepositoryResult};
use chrono::NaiveDateTime;
use rusqlite::{params, Connection};
use std::collections::HashSet;
use std::sync::{Arc, Mutex};

const DATETIME_FMT: &str = "%Y-%m-%d %H:%M:%S";

// ==========================================
// ParticipantRepository - 参与者仓储
// ==========================================
pub struct ParticipantRepository {
    conn: Arc<Mutex<Connection>>,
}

impl ParticipantRepository {
    /// 创建新的ParticipantRepository实例
    pub fn new(conn: Arc<Mutex<Connection>>) -> Self {
        Self { conn }
    }

    /// 获取数据库连接
    fn get_conn(&self) -> RepositoryResult<std::sync::MutexGuard<Connection>> {
        self.conn
            .lock()
            .map_err(|e| RepositoryError::LockError(e.to_string()))
    }

    /// 新增参与者，返回自增 id
    pub fn insert(&self, participant: &NewParticipant) -> RepositoryResult<ParticipantId> {
        let conn = self.get_conn()?;

        conn.execute(
            r#"INSERT INTO participants (first_name, last_name, email, group_tag)
               VALUES (?, ?, ?, ?)"#,
            params![
                &participant.first_name,
                &participant.last_name,
                &participant.email,
                participant.group.0,
            ],
        )?;

        Ok(ParticipantId(conn.last_insert_rowid()))
    }

    /// 批量新增参与者
    ///
    /// # 红线
    /// - 必须在事务中完成：任一行失败则整批不落库
    pub fn batch_insert(&self, participants: &[NewParticipant]) -> RepositoryResult<Vec<ParticipantId>> {
        if participants.is_empty() {
            return Ok(Vec::new());
        }

        let mut conn = self.get_conn()?;
        let tx = conn.transaction()?;
        let mut ids = Vec::with_capacity(participants.len());

        {
            let mut stmt = tx.prepare(
                r#"INSERT INTO participants (first_name, last_name, email, group_tag)
                   VALUES (?, ?, ?, ?)"#,
            )?;

            for p in participants {
                stmt.execute(params![&p.first_name, &p.last_name, &p.email, p.group.0])?;
                ids.push(ParticipantId(tx.last_insert_rowid()));
            }
        }

        tx.commit()?;
        Ok(ids)
    }

    /// 查询全部参与者（按 id 升序，即抽签的送礼人顺序）
    pub fn find_all(&self) -> RepositoryResult<Vec<Participant>> {
        Ok(self
            .find_all_records()?
            .into_iter()
            .map(|r| r.participant)
            .collect())
    }

    /// 查询全部参与者（含创建时间）
    pub fn find_all_records(&self) -> RepositoryResult<Vec<ParticipantRecord>> {
        let conn = self.get_conn()?;

        let mut stmt = conn.prepare(
            r#"SELECT id, first_name, last_name, email, group_tag, created_at
               FROM participants
               ORDER BY id ASC"#,
        )?;

        let records = stmt
            .query_map([], map_row)?
            .collect::<Result<Vec<ParticipantRecord>, _>>()?;

        Ok(records)
    }

    /// 已存在的邮箱集合（小写）
    pub fn existing_emails(&self) -> RepositoryResult<HashSet<String>> {
        let conn = self.get_conn()?;

        let mut stmt = conn.prepare("SELECT email FROM participants WHERE email IS NOT NULL")?;
        let emails = stmt
            .query_map([], |row| row.get::<_, String>(0))?
            .collect::<Result<Vec<String>, _>>()?;

        Ok(emails.into_iter().map(|e| e.to_lowercase()).collect())
    }

    /// 参与者总数
    pub fn count(&self) -> RepositoryResult<usize> {
        let conn = self.get_conn()?;
        let n: i64 = conn.query_row("SELECT COUNT(*) FROM participants", [], |row| row.get(0))?;
        Ok(n as usize)
    }
}

/// 映射数据库行到ParticipantRecord对象
fn map_row(row: &rusqlite::Row) -> rusqlite::Result<ParticipantRecord> {
    let created_at: String = row.get(5)?;
    let created_at = NaiveDateTime::parse_from_str(&created_at, DATETIME_FMT).map_err(|e| {
        rusqlite::Error::FromSqlConversionFailure(5, rusqlite::types::Type::Text, Box::new(e))
    })?;

    Ok(ParticipantRecord {
        participant: Participant {
            id: ParticipantId(row.get(0)?),
            first_name: row.get(1)?,
            last_name: row.get(2)?,
            email: row.get(3)?,
            group: GroupTag(row.get(4)?),
        },
        created_at,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn setup_test_db() -> Arc<Mutex<Connection>> {
        let conn = Connection::open_in_memory().unwrap();
        crate::db::configure_sqlite_connection(&conn).unwrap();
        crate::db::init_schema(&conn).unwrap();
        Arc::new(Mutex::new(conn))
    }

    fn new_participant(first: &str, email: &str, group: i64) -> NewParticipant {
        NewParticipant {
            first_name: first.to_string(),
            last_name: "Test".to_string(),
            email: email.to_string(),
            group: GroupTag(group),
        }
    }

    #[test]
    fn test_insert_and_find() {
        let repo = ParticipantRepository::new(setup_test_db());

        let id = repo.insert(&new_participant("Ann", "ann@example.com", 1)).unwrap();
        let all = repo.find_all().unwrap();

        assert_eq!(all.len(), 1);
        let found = &all[0];
        assert_eq!(found.id, id);
        assert_eq!(found.first_name, "Ann");
        assert_eq!(found.group, GroupTag(1));
        assert_eq!(found.email.as_deref(), Some("ann@example.com"));
    }

    #[test]
    fn test_find_all_orders_by_id() {
        let repo = ParticipantRepository::new(setup_test_db());
        let ids = repo
            .batch_insert(&[
                new_participant("A", "a@example.com", 1),
                new_participant("B", "b@example.com", 2),
                new_participant("C", "c@example.com", 1),
            ])
            .unwrap();

        let all = repo.find_all().unwrap();
        assert_eq!(all.iter().map(|p| p.id).collect::<Vec<_>>(), ids);
        assert_eq!(repo.count().unwrap(), 3);
    }

    #[test]
    fn test_email_uniqueness_is_case_insensitive() {
        let repo = ParticipantRepository::new(setup_test_db());
        repo.insert(&new_participant("A", "Same@Example.com", 1)).unwrap();

        let err = repo
            .insert(&new_participant("B", "same@example.com", 2))
            .unwrap_err();
        assert!(matches!(err, RepositoryError::UniqueConstraintViolation(_)));

        let emails = repo.existing_emails().unwrap();
        assert!(emails.contains("same@example.com"));
    }

    #[test]
    fn test_batch_insert_is_all_or_nothing() {
        let repo = ParticipantRepository::new(setup_test_db());

        let result = repo.batch_insert(&[
            new_participant("A", "dup@example.com", 1),
            new_participant("B", "dup@example.com", 2),
        ]);

        assert!(result.is_err());
        assert_eq!(repo.count().unwrap(), 0);
    }
}
