// ==========================================
// 礼物交换抽签系统 - 抽签 API
// ==========================================
// 职责: 试运行 / 正式抽签 / 结果查询
// 红线: 试运行不写库、不发信
// 红线: 正式抽签提交失败时不发送任何通知
// 红线: 提交成功后的任何步骤都不得以抽签失败返回
// ==========================================

use crate::api::error::{ApiError, ApiResult};
use crate::config::DrawConfigReader;
use crate::domain::{
    Assignment, DrawMode, GroupTag, HistoryMap, OpenStat, Participant, ParticipantId, Round,
};
use crate::engine::ports::NotificationSink;
use crate::engine::session::PairingSession;
use crate::notify::dispatch::{deliver_all, DeliveryReport};
use crate::repository::{EmailOpenRepository, PairingRepository, ParticipantRepository};
use chrono::NaiveDateTime;
use serde::Serialize;
use std::collections::HashMap;
use std::sync::Arc;
use tracing::{info, warn};

// ==========================================
// 返回结构
// ==========================================

/// 试运行预览行
#[derive(Debug, Clone, Serialize)]
pub struct DrawPreview {
    pub giver_id: ParticipantId,
    pub giver_name: String,
    pub giver_group: GroupTag,
    pub receiver_id: ParticipantId,
    pub receiver_name: String,
    pub receiver_group: GroupTag,
    /// 与上一轮配对相同（仅在关闭历史回避时可能为 true）
    pub repeats_previous: bool,
}

/// 试运行结果
#[derive(Debug, Clone, Serialize)]
pub struct TrialDraw {
    pub round: Round,
    pub mode: DrawMode,
    pub history_applied: bool,
    pub rows: Vec<DrawPreview>,
}

/// 仅落库结果（未发送任何通知）
#[derive(Debug, Clone, Serialize)]
pub struct CommittedDraw {
    pub round: Round,
    pub mode: DrawMode,
    pub history_applied: bool,
    pub pairs_committed: usize,
    pub rows: Vec<DrawPreview>,
}

/// 汇总名单投递状态
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "status", content = "detail", rename_all = "SCREAMING_SNAKE_CASE")]
pub enum MasterListStatus {
    Sent,
    /// 未配置管理员地址
    Skipped,
    Failed(String),
}

/// 正式抽签结果
#[derive(Debug, Clone, Serialize)]
pub struct LiveDrawSummary {
    pub round: Round,
    pub mode: DrawMode,
    pub history_applied: bool,
    pub pairs_committed: usize,
    pub delivery: DeliveryReport,
    pub master_list: MasterListStatus,
}

/// 已提交配对（带姓名，报表用）
#[derive(Debug, Clone, Serialize)]
pub struct PairingView {
    pub round: Round,
    pub giver_id: ParticipantId,
    pub giver_name: String,
    pub receiver_id: ParticipantId,
    pub receiver_name: String,
    pub created_at: NaiveDateTime,
}

// ==========================================
// DrawApi - 抽签API
// ==========================================
pub struct DrawApi {
    participant_repo: Arc<ParticipantRepository>,
    pairing_repo: Arc<PairingRepository>,
    open_repo: Arc<EmailOpenRepository>,
    config: Arc<dyn DrawConfigReader>,
    notifier: Arc<dyn NotificationSink>,
    seed: Option<u64>,
}

impl DrawApi {
    /// 创建新的DrawApi实例
    ///
    /// # 参数
    /// - participant_repo: 参与者仓储（名单来源）
    /// - pairing_repo: 配对仓储（历史 + 提交）
    /// - open_repo: 打开追踪仓储
    /// - config: 抽签配置读取
    /// - notifier: 通知投递端
    pub fn new(
        participant_repo: Arc<ParticipantRepository>,
        pairing_repo: Arc<PairingRepository>,
        open_repo: Arc<EmailOpenRepository>,
        config: Arc<dyn DrawConfigReader>,
        notifier: Arc<dyn NotificationSink>,
    ) -> Self {
        Self {
            participant_repo,
            pairing_repo,
            open_repo,
            config,
            notifier,
            seed: None,
        }
    }

    /// 固定随机种子（复现用）
    pub fn with_seed(mut self, seed: Option<u64>) -> Self {
        self.seed = seed;
        self
    }

    fn session(&self) -> PairingSession<PairingRepository, PairingRepository> {
        PairingSession::new(self.pairing_repo.clone(), self.pairing_repo.clone()).with_seed(self.seed)
    }

    fn resolve_avoid_previous(&self, avoid_previous: Option<bool>) -> ApiResult<bool> {
        match avoid_previous {
            Some(flag) => Ok(flag),
            None => Ok(self.config.avoid_previous_round()?),
        }
    }

    // ==========================================
    // 试运行
    // ==========================================

    /// 试运行抽签（不写库、不发信）
    ///
    /// # 参数
    /// - round: 本轮标签
    /// - avoid_previous: 是否回避上一轮配对（None 表示按配置）
    pub fn trial(&self, round: Round, avoid_previous: Option<bool>) -> ApiResult<TrialDraw> {
        let history_applied = self.resolve_avoid_previous(avoid_previous)?;
        let participants = self.participant_repo.find_all()?;
        let session = self.session();

        let assignment = session.run(&participants, round, history_applied)?;
        let rows = preview_rows(&session, &participants, &assignment, round)?;

        info!(round = %round, mode = %DrawMode::Trial, "试运行完成（未落库）");

        Ok(TrialDraw {
            round,
            mode: DrawMode::Trial,
            history_applied,
            rows,
        })
    }

    // ==========================================
    // 仅落库
    // ==========================================

    /// 生成并提交本轮配对，但不发送通知、不清空打开计数
    ///
    /// # 用途
    /// - 补录往年配对作为历史
    /// - 重测某一轮（同轮再次提交会整体替换）
    pub fn commit_only(&self, round: Round, avoid_previous: Option<bool>) -> ApiResult<CommittedDraw> {
        let history_applied = self.resolve_avoid_previous(avoid_previous)?;
        let participants = self.participant_repo.find_all()?;
        let session = self.session();

        let assignment = session.run(&participants, round, history_applied)?;
        let rows = preview_rows(&session, &participants, &assignment, round)?;
        let pairs_committed = session.commit(round, &assignment)?;

        info!(
            round = %round,
            mode = %DrawMode::CommitOnly,
            pairs = pairs_committed,
            "配对已提交（未发送通知）"
        );

        Ok(CommittedDraw {
            round,
            mode: DrawMode::CommitOnly,
            history_applied,
            pairs_committed,
            rows,
        })
    }

    // ==========================================
    // 正式抽签
    // ==========================================

    /// 正式抽签
    ///
    /// # 流程
    /// 0. 读取配置（在提交之前，读取失败不产生任何副作用）
    /// 1. 校验 + 搜索（失败直接返回，不写库）
    /// 2. 原子提交（失败直接返回，不发信）
    /// 3. 清空本轮打开计数
    /// 4. 并发投递揭晓通知（逐条独立）
    /// 5. 投递汇总名单
    pub async fn live(&self, round: Round, avoid_previous: Option<bool>) -> ApiResult<LiveDrawSummary> {
        let history_applied = self.resolve_avoid_previous(avoid_previous)?;
        let admin_email = self.config.admin_email()?;
        let participants = self.participant_repo.find_all()?;
        let session = self.session();

        let assignment = session.run(&participants, round, history_applied)?;
        let pairs_committed = session.commit(round, &assignment)?;

        match self.open_repo.clear_round(round) {
            Ok(cleared) => info!(round = %round, cleared, "本轮打开计数已清空"),
            Err(e) => warn!(round = %round, error = %e, "打开计数清空失败，继续投递"),
        }

        let records = session.notifications(&participants, &assignment, round);
        let delivery = deliver_all(self.notifier.as_ref(), &records).await;

        let master_list = match admin_email {
            None => {
                info!(round = %round, "未配置管理员地址，跳过汇总名单");
                MasterListStatus::Skipped
            }
            Some(_) => match self.notifier.deliver_report(round, &records).await {
                Ok(()) => MasterListStatus::Sent,
                Err(e) => {
                    warn!(round = %round, error = %e, "汇总名单投递失败");
                    MasterListStatus::Failed(e.to_string())
                }
            },
        };

        info!(
            round = %round,
            mode = %DrawMode::Live,
            pairs = pairs_committed,
            delivered = delivery.delivered.len(),
            failed = delivery.failures.len(),
            "正式抽签完成"
        );

        Ok(LiveDrawSummary {
            round,
            mode: DrawMode::Live,
            history_applied,
            pairs_committed,
            delivery,
            master_list,
        })
    }

    // ==========================================
    // 查询
    // ==========================================

    /// 查询某轮已提交的配对（带姓名）
    pub fn pairings(&self, round: Round) -> ApiResult<Vec<PairingView>> {
        let stored = self.pairing_repo.find_by_round(round)?;
        let names: HashMap<ParticipantId, Participant> = self
            .participant_repo
            .find_all()?
            .into_iter()
            .map(|p| (p.id, p))
            .collect();

        stored
            .into_iter()
            .map(|row| {
                let name_of = |id: ParticipantId| {
                    names
                        .get(&id)
                        .map(|p| p.display_name())
                        .ok_or_else(|| ApiError::NotFound(format!("Participant(id={})不存在", id)))
                };
                Ok(PairingView {
                    round: row.round,
                    giver_id: row.giver_id,
                    giver_name: name_of(row.giver_id)?,
                    receiver_id: row.receiver_id,
                    receiver_name: name_of(row.receiver_id)?,
                    created_at: row.created_at,
                })
            })
            .collect()
    }

    /// 查询某轮的打开统计
    pub fn open_stats(&self, round: Round) -> ApiResult<Vec<OpenStat>> {
        Ok(self.open_repo.list_by_round(round)?)
    }

    /// 已提交过配对的轮次（倒序）
    pub fn rounds(&self) -> ApiResult<Vec<Round>> {
        Ok(self.pairing_repo.list_rounds()?)
    }
}

/// 预览行（带姓名与分组），并标出与上一轮相同的配对
///
/// 无论是否回避，都按上一轮比对
fn preview_rows(
    session: &PairingSession<PairingRepository, PairingRepository>,
    participants: &[Participant],
    assignment: &Assignment,
    round: Round,
) -> ApiResult<Vec<DrawPreview>> {
    let previous = match round.previous() {
        Some(prev) => session.load_history(prev)?,
        None => HistoryMap::new(),
    };

    Ok(session
        .notifications(participants, assignment, round)
        .into_iter()
        .map(|r| DrawPreview {
            giver_id: r.giver.id,
            giver_name: r.giver.display_name(),
            giver_group: r.giver.group,
            receiver_id: r.receiver.id,
            receiver_name: r.receiver.display_name(),
            receiver_group: r.receiver.group,
            repeats_previous: previous.previous_receiver(r.giver.id) == Some(r.receiver.id),
        })
        .collect())
}
