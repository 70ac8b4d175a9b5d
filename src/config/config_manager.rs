// ==========================================
// 礼物交换抽签系统 - 配置管理器
// ==========================================
// 职责: 配置加载、查询、覆写管理
// 存储: config_kv 表 (key-value)
// ==========================================

use crate::config::draw_config_trait::DrawConfigReader;
use crate::repository::error::{RepositoryError, RepositoryResult};
use rusqlite::{params, Connection, OptionalExtension};
use std::collections::BTreeMap;
use std::path::PathBuf;
use std::sync::{Arc, Mutex};

// ==========================================
// ConfigManager - 配置管理器
// ==========================================
pub struct ConfigManager {
    conn: Arc<Mutex<Connection>>,
}

impl ConfigManager {
    /// 从已有连接创建 ConfigManager
    pub fn from_connection(conn: Arc<Mutex<Connection>>) -> Self {
        Self { conn }
    }

    fn get_conn(&self) -> RepositoryResult<std::sync::MutexGuard<Connection>> {
        self.conn
            .lock()
            .map_err(|e| RepositoryError::LockError(e.to_string()))
    }

    /// 从 config_kv 表读取配置值
    ///
    /// # 返回
    /// - Some(String): 配置值
    /// - None: 配置不存在
    pub fn get_config_value(&self, key: &str) -> RepositoryResult<Option<String>> {
        let conn = self.get_conn()?;

        let value = conn
            .query_row(
                "SELECT value FROM config_kv WHERE key = ?1",
                params![key],
                |row| row.get::<_, String>(0),
            )
            .optional()?;

        Ok(value)
    }

    /// 从 config_kv 表读取配置值，带默认值（空白值视为未配置）
    fn get_config_or_default(&self, key: &str, default: &str) -> RepositoryResult<String> {
        Ok(self
            .get_config_value(key)?
            .map(|v| v.trim().to_string())
            .filter(|v| !v.is_empty())
            .unwrap_or_else(|| default.to_string()))
    }

    /// 写入配置（UPSERT）
    pub fn set_config(&self, key: &str, value: &str) -> RepositoryResult<()> {
        let key = key.trim();
        if key.is_empty() {
            return Err(RepositoryError::FieldValueError {
                field: "key".to_string(),
                message: "配置键不能为空".to_string(),
            });
        }

        let conn = self.get_conn()?;
        conn.execute(
            "INSERT INTO config_kv (key, value) VALUES (?1, ?2)
             ON CONFLICT(key) DO UPDATE SET value = ?2, updated_at = datetime('now')",
            params![key, value],
        )?;

        Ok(())
    }

    /// 列出全部配置（按键排序）
    pub fn list_configs(&self) -> RepositoryResult<BTreeMap<String, String>> {
        let conn = self.get_conn()?;

        let mut stmt = conn.prepare("SELECT key, value FROM config_kv ORDER BY key")?;
        let rows = stmt
            .query_map([], |row| Ok((row.get::<_, String>(0)?, row.get::<_, String>(1)?)))?
            .collect::<Result<BTreeMap<String, String>, _>>()?;

        Ok(rows)
    }
}

impl DrawConfigReader for ConfigManager {
    fn base_url(&self) -> RepositoryResult<String> {
        let url = self.get_config_or_default(config_keys::APP_BASE_URL, defaults::BASE_URL)?;
        Ok(url.trim_end_matches('/').to_string())
    }

    fn from_email(&self) -> RepositoryResult<Option<String>> {
        Ok(self
            .get_config_value(config_keys::MAIL_FROM_EMAIL)?
            .filter(|v| !v.trim().is_empty()))
    }

    fn from_name(&self) -> RepositoryResult<String> {
        self.get_config_or_default(config_keys::MAIL_FROM_NAME, defaults::FROM_NAME)
    }

    fn admin_email(&self) -> RepositoryResult<Option<String>> {
        Ok(self
            .get_config_value(config_keys::MAIL_ADMIN_EMAIL)?
            .filter(|v| !v.trim().is_empty()))
    }

    fn outbox_dir(&self) -> RepositoryResult<PathBuf> {
        Ok(PathBuf::from(self.get_config_or_default(
            config_keys::MAIL_OUTBOX_DIR,
            defaults::OUTBOX_DIR,
        )?))
    }

    fn avoid_previous_round(&self) -> RepositoryResult<bool> {
        let raw = self.get_config_or_default(config_keys::DRAW_AVOID_PREVIOUS_ROUND, "true")?;
        match raw.to_lowercase().as_str() {
            "1" | "true" | "yes" | "on" => Ok(true),
            "0" | "false" | "no" | "off" => Ok(false),
            _ => Err(RepositoryError::FieldValueError {
                field: config_keys::DRAW_AVOID_PREVIOUS_ROUND.to_string(),
                message: format!("无法解析为布尔值: {}", raw),
            }),
        }
    }
}

// ==========================================
// 配置键常量
// ==========================================
pub mod config_keys {
    // 应用
    pub const APP_BASE_URL: &str = "app.base_url";

    // 邮件
    pub const MAIL_FROM_EMAIL: &str = "mail.from_email";
    pub const MAIL_FROM_NAME: &str = "mail.from_name";
    pub const MAIL_ADMIN_EMAIL: &str = "mail.admin_email";
    pub const MAIL_OUTBOX_DIR: &str = "mail.outbox_dir";

    // 抽签
    pub const DRAW_AVOID_PREVIOUS_ROUND: &str = "draw.avoid_previous_round";

    /// 全部已知键（CLI 校验用）
    pub const ALL: &[&str] = &[
        APP_BASE_URL,
        MAIL_FROM_EMAIL,
        MAIL_FROM_NAME,
        MAIL_ADMIN_EMAIL,
        MAIL_OUTBOX_DIR,
        DRAW_AVOID_PREVIOUS_ROUND,
    ];
}

// ==========================================
// 默认值
// ==========================================
pub mod defaults {
    pub const BASE_URL: &str = "http://localhost:8080";
    pub const FROM_NAME: &str = "Secret Santa Bot";
    pub const OUTBOX_DIR: &str = "./outbox";
}
