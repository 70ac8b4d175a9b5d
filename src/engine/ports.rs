// ==========================================
// 礼物交换抽签系统 - 引擎层外部接缝
// ==========================================
// 职责: 定义会话依赖的协作方 trait，实现依赖倒置
// 说明: Engine 层定义 trait，Repository / Notify 层实现
// ==========================================

use crate::domain::{Assignment, HistoryMap, RevealRecord, Round};
use crate::engine::error::DeliveryError;
use crate::repository::error::RepositoryResult;
use async_trait::async_trait;

// ==========================================
// 历史存储
// ==========================================

/// 历史配对存储
///
/// 实现者: `PairingRepository`
pub trait HistoryStore: Send + Sync {
    /// 读取某轮已提交的送礼人 → 收礼人映射（无记录时返回空映射）
    fn load_round(&self, round: Round) -> RepositoryResult<HistoryMap>;
}

// ==========================================
// 提交落库
// ==========================================

/// 配对提交接收方
///
/// 实现者: `PairingRepository`
///
/// # 红线
/// - 删除旧结果 + 写入新结果必须是同一事务
/// - 失败时原有结果保持不变
pub trait CommitSink: Send + Sync {
    /// 原子替换某轮的配对，返回写入行数
    fn replace_round(&self, round: Round, assignment: &Assignment) -> RepositoryResult<usize>;
}

// ==========================================
// 通知投递
// ==========================================

/// 通知投递接收方
///
/// 实现者: `OutboxNotifier`
///
/// # 说明
/// - 每条投递相互独立，单条失败不影响其他投递
/// - 投递发生在提交之后，失败不回滚已提交的配对
#[async_trait]
pub trait NotificationSink: Send + Sync {
    /// 向送礼人投递一条揭晓通知
    async fn deliver_reveal(&self, record: &RevealRecord) -> Result<(), DeliveryError>;

    /// 向管理员投递本轮汇总名单
    async fn deliver_report(&self, round: Round, records: &[RevealRecord]) -> Result<(), DeliveryError>;
}
