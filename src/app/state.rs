// ==========================================
// 礼物交换抽签系统 - 应用状态
// ==========================================
// 职责: 管理应用级别的共享连接、仓储与 API 实例
// ==========================================

use std::path::PathBuf;
use std::sync::{Arc, Mutex};

use crate::api::{DrawApi, TrackingApi};
use crate::config::ConfigManager;
use crate::db::{init_schema, open_sqlite_connection};
use crate::engine::ports::NotificationSink;
use crate::importer::RosterImporter;
use crate::notify::OutboxNotifier;
use crate::repository::{
    EmailOpenRepository, PairingRepository, ParticipantRepository, RepositoryError,
    RepositoryResult,
};

/// 数据库路径环境变量
pub const DB_PATH_ENV: &str = "SECRET_SANTA_DB_PATH";

/// 应用状态
///
/// 所有仓储共享同一个连接
pub struct AppState {
    /// 数据库路径
    pub db_path: String,

    pub participant_repo: Arc<ParticipantRepository>,
    pub pairing_repo: Arc<PairingRepository>,
    pub open_repo: Arc<EmailOpenRepository>,

    /// 配置管理器
    pub config_manager: Arc<ConfigManager>,

    /// 通知投递端（发件箱）
    pub notifier: Arc<dyn NotificationSink>,
}

impl AppState {
    /// 创建新的AppState实例
    ///
    /// # 参数
    /// - db_path: 数据库文件路径（不存在时自动创建并建表）
    ///
    /// # 说明
    /// 该方法会：
    /// 1. 打开共享连接并建表
    /// 2. 初始化所有Repository
    /// 3. 按当前配置构造发件箱投递端
    pub fn new(db_path: String) -> RepositoryResult<Self> {
        tracing::info!(db_path = %db_path, "初始化AppState");

        let conn = open_sqlite_connection(&db_path)
            .map_err(|e| RepositoryError::DatabaseConnectionError(format!("无法打开数据库: {}", e)))?;
        init_schema(&conn)?;
        let conn = Arc::new(Mutex::new(conn));

        // ==========================================
        // 初始化Repository层
        // ==========================================
        let participant_repo = Arc::new(ParticipantRepository::new(conn.clone()));
        let pairing_repo = Arc::new(PairingRepository::new(conn.clone()));
        let open_repo = Arc::new(EmailOpenRepository::new(conn.clone()));
        let config_manager = Arc::new(ConfigManager::from_connection(conn));

        // ==========================================
        // 初始化通知投递端
        // ==========================================
        let notifier: Arc<dyn NotificationSink> =
            Arc::new(OutboxNotifier::from_config(&*config_manager)?);

        tracing::info!("AppState初始化完成");

        Ok(Self {
            db_path,
            participant_repo,
            pairing_repo,
            open_repo,
            config_manager,
            notifier,
        })
    }

    /// 替换通知投递端（测试或外部中继）
    pub fn with_notifier(mut self, notifier: Arc<dyn NotificationSink>) -> Self {
        self.notifier = notifier;
        self
    }

    /// 构造抽签API
    ///
    /// # 参数
    /// - seed: 固定随机种子（None 表示使用系统熵）
    pub fn draw_api(&self, seed: Option<u64>) -> DrawApi {
        DrawApi::new(
            self.participant_repo.clone(),
            self.pairing_repo.clone(),
            self.open_repo.clone(),
            self.config_manager.clone(),
            self.notifier.clone(),
        )
        .with_seed(seed)
    }

    pub fn tracking_api(&self) -> TrackingApi {
        TrackingApi::new(self.open_repo.clone())
    }

    pub fn importer(&self) -> RosterImporter {
        RosterImporter::new(self.participant_repo.clone())
    }
}

/// 获取默认数据库路径
///
/// 优先级: 环境变量 SECRET_SANTA_DB_PATH → 用户数据目录 → 当前目录
pub fn get_default_db_path() -> String {
    // 允许通过环境变量显式指定 DB 路径（便于调试/测试/CI）
    if let Ok(path) = std::env::var(DB_PATH_ENV) {
        let trimmed = path.trim();
        if !trimmed.is_empty() {
            return trimmed.to_string();
        }
    }

    let mut path = PathBuf::from("./secret_santa.db");

    if let Some(data_dir) = dirs::data_dir() {
        let dir = data_dir.join("secret-santa");
        // 目录创建失败时回退到当前目录
        if std::fs::create_dir_all(&dir).is_ok() {
            path = dir.join("secret_santa.db");
        }
    }

    path.to_string_lossy().to_string()
}
