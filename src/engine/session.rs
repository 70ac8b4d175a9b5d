// ==========================================
// 礼物交换抽签系统 - 抽签会话
// ==========================================
// 用途: 包装一次分配引擎调用
// 流程: 加载历史 → 构造排除规则 → 引擎搜索 → (正式模式) 原子提交 → 生成揭晓记录
// ==========================================

use crate::domain::{Assignment, HistoryMap, Participant, RevealRecord, Round};
use crate::engine::assignment::AssignmentEngine;
use crate::engine::error::SessionError;
use crate::engine::exclusion::ExclusionRules;
use crate::engine::ports::{CommitSink, HistoryStore};
use crate::engine::validation::{has_dominant_group, largest_group, validate_roster};
use std::collections::HashMap;
use std::sync::Arc;
use tracing::{debug, info, warn};

// ==========================================
// PairingSession - 抽签会话
// ==========================================
pub struct PairingSession<H, C>
where
    H: HistoryStore,
    C: CommitSink,
{
    history: Arc<H>,
    sink: Arc<C>,
    seed: Option<u64>,
}

impl<H, C> PairingSession<H, C>
where
    H: HistoryStore,
    C: CommitSink,
{
    /// 创建会话实例
    ///
    /// # 参数
    /// - history: 历史配对存储
    /// - sink: 提交接收方
    pub fn new(history: Arc<H>, sink: Arc<C>) -> Self {
        Self {
            history,
            sink,
            seed: None,
        }
    }

    /// 固定随机种子（None 表示使用系统熵）
    pub fn with_seed(mut self, seed: Option<u64>) -> Self {
        self.seed = seed;
        self
    }

    fn engine(&self) -> AssignmentEngine {
        match self.seed {
            Some(seed) => AssignmentEngine::with_seed(seed),
            None => AssignmentEngine::from_entropy(),
        }
    }

    /// 读取某轮已提交的配对映射（无记录时为空）
    pub fn load_history(&self, round: Round) -> Result<HistoryMap, SessionError> {
        let history = self
            .history
            .load_round(round)
            .map_err(|source| SessionError::HistoryLoad { round, source })?;

        debug!(round = %round, entries = history.len(), "历史配对已加载");
        Ok(history)
    }

    /// 执行一轮抽签（不落库）
    ///
    /// # 参数
    /// - participants: 名单（顺序即送礼人搜索顺序）
    /// - round: 本轮标签
    /// - history_enabled: 是否回避上一轮配对
    ///
    /// # 返回
    /// - Ok(Assignment): 可行配对
    /// - Err(SessionError::Validation): 名单无效，引擎未调用
    /// - Err(SessionError::Infeasible): 搜索穷尽
    pub fn run(
        &self,
        participants: &[Participant],
        round: Round,
        history_enabled: bool,
    ) -> Result<Assignment, SessionError> {
        validate_roster(participants)?;

        if has_dominant_group(participants) {
            if let Some((group, size)) = largest_group(participants) {
                warn!(
                    round = %round,
                    group = %group,
                    size,
                    total = participants.len(),
                    "存在超过半数的分组，预计无可行配对"
                );
            }
        }

        let history = match (history_enabled, round.previous()) {
            (true, Some(previous)) => self.load_history(previous)?,
            _ => HistoryMap::new(),
        };

        info!(
            round = %round,
            participants = participants.len(),
            history_enabled,
            history_entries = history.len(),
            "开始抽签"
        );

        let rules = ExclusionRules::standard(history);
        let assignment = self
            .engine()
            .assign(participants, &rules)
            .map_err(|cause| SessionError::Infeasible { round, cause })?;

        info!(round = %round, pairs = assignment.len(), "抽签完成");
        Ok(assignment)
    }

    /// 原子替换某轮已提交的配对
    ///
    /// # 红线
    /// - 删除 + 写入在同一事务内
    /// - 失败时保留原有结果，并以 Persistence 错误上报（不自动重试）
    pub fn commit(&self, round: Round, assignment: &Assignment) -> Result<usize, SessionError> {
        let written = self
            .sink
            .replace_round(round, assignment)
            .map_err(|source| SessionError::Persistence { round, source })?;

        info!(round = %round, rows = written, "配对已提交");
        Ok(written)
    }

    /// 生成揭晓记录（纯投影，无副作用）
    ///
    /// 输出顺序与名单顺序一致
    pub fn notifications(
        &self,
        participants: &[Participant],
        assignment: &Assignment,
        round: Round,
    ) -> Vec<RevealRecord> {
        reveal_records(participants, assignment, round)
    }
}

/// 揭晓记录投影
///
/// 不在配对中的送礼人被跳过
pub fn reveal_records(
    participants: &[Participant],
    assignment: &Assignment,
    round: Round,
) -> Vec<RevealRecord> {
    let by_id: HashMap<_, _> = participants.iter().map(|p| (p.id, p)).collect();

    participants
        .iter()
        .filter_map(|giver| {
            let receiver_id = assignment.receiver_of(giver.id)?;
            let receiver = by_id.get(&receiver_id)?;
            Some(RevealRecord {
                round,
                giver: giver.clone(),
                receiver: (*receiver).clone(),
            })
        })
        .collect()
}
