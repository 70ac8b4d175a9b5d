// ==========================================
// 礼物交换抽签系统 - 排除规则
// ==========================================
// 职责: (送礼人, 候选人) 二元谓词，按合取组合
// 红线: 无状态、无副作用、无 I/O 操作
// 红线: 每条否决都必须能给出规则原因
// ==========================================

use crate::domain::{HistoryMap, Participant};
use serde::{Deserialize, Serialize};
use std::fmt;

// ==========================================
// ExclusionRule - 单条排除规则
// ==========================================
// 开放列表: 新约束以新变体加入，不改动已有规则
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
#[non_exhaustive]
pub enum ExclusionRule {
    /// 不能送给自己
    SelfPairing,
    /// 不能送给同组（同家庭）成员
    SameGroup,
    /// 不能重复上一轮的收礼人
    RepeatOfPrevious,
}

impl ExclusionRule {
    /// 该规则是否否决 (giver, candidate)
    pub fn rejects(&self, giver: &Participant, candidate: &Participant, history: &HistoryMap) -> bool {
        match self {
            ExclusionRule::SelfPairing => candidate.id == giver.id,
            ExclusionRule::SameGroup => candidate.group == giver.group,
            ExclusionRule::RepeatOfPrevious => {
                history.previous_receiver(giver.id) == Some(candidate.id)
            }
        }
    }

    pub fn code(&self) -> &'static str {
        match self {
            ExclusionRule::SelfPairing => "SELF_PAIRING",
            ExclusionRule::SameGroup => "SAME_GROUP",
            ExclusionRule::RepeatOfPrevious => "REPEAT_OF_PREVIOUS",
        }
    }
}

impl fmt::Display for ExclusionRule {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.code())
    }
}

// ==========================================
// ExclusionRules - 规则集合 + 历史上下文
// ==========================================
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExclusionRules {
    rules: Vec<ExclusionRule>,
    history: HistoryMap,
}

impl ExclusionRules {
    /// 标准三条规则；history 为空时历史规则不施加约束
    pub fn standard(history: HistoryMap) -> Self {
        Self {
            rules: vec![
                ExclusionRule::SelfPairing,
                ExclusionRule::SameGroup,
                ExclusionRule::RepeatOfPrevious,
            ],
            history,
        }
    }

    /// 空规则集（仅用于组合自定义规则）
    pub fn empty() -> Self {
        Self {
            rules: Vec::new(),
            history: HistoryMap::new(),
        }
    }

    /// 追加规则（重复添加被忽略）
    pub fn with_rule(mut self, rule: ExclusionRule) -> Self {
        if !self.rules.contains(&rule) {
            self.rules.push(rule);
        }
        self
    }

    pub fn rules(&self) -> &[ExclusionRule] {
        &self.rules
    }

    /// 第一条否决该配对的规则；None 表示允许
    pub fn rejection(&self, giver: &Participant, candidate: &Participant) -> Option<ExclusionRule> {
        self.rules
            .iter()
            .copied()
            .find(|rule| rule.rejects(giver, candidate, &self.history))
    }

    /// 所有规则均放行
    pub fn allows(&self, giver: &Participant, candidate: &Participant) -> bool {
        self.rejection(giver, candidate).is_none()
    }
}

impl Default for ExclusionRules {
    fn default() -> Self {
        Self::standard(HistoryMap::new())
    }
}
