// ==========================================
// 礼物交换抽签系统 - 引擎层错误类型
// ==========================================
// 工具: thiserror 派生宏
// 分类: 无可行解 / 名单校验 / 持久化 / 投递
// ==========================================

use crate::domain::{ParticipantId, Round};
use crate::repository::error::RepositoryError;
use thiserror::Error;

/// 搜索穷尽、无可行配对
///
/// 属于正常结果（可放宽约束后重试），不是故障
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("无可行配对: 送礼人 {givers} 名, 已尝试候选 {explored} 次")]
pub struct Infeasible {
    pub givers: usize,
    pub explored: u64,
}

/// 抽签会话错误类型
#[derive(Error, Debug)]
pub enum SessionError {
    // ===== 名单校验 =====
    #[error("名单校验失败: {0}")]
    Validation(String),

    // ===== 搜索结果 =====
    #[error("第 {round} 轮无可行配对: {cause}")]
    Infeasible {
        round: Round,
        #[source]
        cause: Infeasible,
    },

    // ===== 持久化 =====
    #[error("历史配对加载失败 (round={round}): {source}")]
    HistoryLoad {
        round: Round,
        #[source]
        source: RepositoryError,
    },

    #[error("配对提交失败 (round={round})，已保留原有结果: {source}")]
    Persistence {
        round: Round,
        #[source]
        source: RepositoryError,
    },
}

impl SessionError {
    pub fn is_infeasible(&self) -> bool {
        matches!(self, SessionError::Infeasible { .. })
    }
}

/// 单个收件人的投递错误（不影响其他投递与已提交结果）
#[derive(Error, Debug)]
pub enum DeliveryError {
    #[error("参与者缺少联系地址: participant_id={0}")]
    MissingAddress(ParticipantId),

    #[error("消息写出失败: {0}")]
    Io(#[from] std::io::Error),

    #[error("消息序列化失败: {0}")]
    Render(#[from] serde_json::Error),

    #[error("投递失败: {0}")]
    Rejected(String),
}
