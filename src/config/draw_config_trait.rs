// ==========================================
// 礼物交换抽签系统 - 抽签配置读取 Trait
// ==========================================
// 职责: 定义抽签/通知所需的配置读取接口（不包含实现）
// 红线: 不包含配置写入、不包含业务逻辑
// ==========================================

use crate::repository::error::RepositoryResult;
use std::path::PathBuf;

// ==========================================
// DrawConfigReader Trait
// ==========================================
// 实现者: ConfigManager（从 config_kv 表读取）
pub trait DrawConfigReader: Send + Sync {
    /// 公开访问地址（用于通知中的链接），末尾无 '/'
    ///
    /// # 默认值
    /// - http://localhost:8080
    fn base_url(&self) -> RepositoryResult<String>;

    /// 发件人地址（未配置时由投递端决定）
    fn from_email(&self) -> RepositoryResult<Option<String>>;

    /// 发件人名称
    ///
    /// # 默认值
    /// - Secret Santa Bot
    fn from_name(&self) -> RepositoryResult<String>;

    /// 管理员地址（接收汇总名单）；未配置时不发送汇总
    fn admin_email(&self) -> RepositoryResult<Option<String>>;

    /// 发件箱目录
    ///
    /// # 默认值
    /// - ./outbox
    fn outbox_dir(&self) -> RepositoryResult<PathBuf>;

    /// 是否默认回避上一轮配对
    ///
    /// # 默认值
    /// - true
    fn avoid_previous_round(&self) -> RepositoryResult<bool>;
}
