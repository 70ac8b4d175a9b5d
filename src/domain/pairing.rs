// ==========================================
// 礼物交换抽签系统 - 配对结果实体
// ==========================================
// Assignment: 参与者集合上的双射（送礼人 → 收礼人）
// HistoryMap: 上一轮已提交的送礼人 → 收礼人映射
// ==========================================

use crate::domain::participant::Participant;
use crate::domain::types::{ParticipantId, Round};
use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};

// ==========================================
// Pairing - 单条配对
// ==========================================
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Pairing {
    pub giver: ParticipantId,
    pub receiver: ParticipantId,
}

// ==========================================
// Assignment - 一轮的完整配对
// ==========================================
// pairs 按送礼人名单顺序排列
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Assignment {
    pairs: Vec<Pairing>,
}

impl Assignment {
    pub fn new(pairs: Vec<Pairing>) -> Self {
        Self { pairs }
    }

    pub fn pairs(&self) -> &[Pairing] {
        &self.pairs
    }

    pub fn len(&self) -> usize {
        self.pairs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.pairs.is_empty()
    }

    /// 查询送礼人的收礼人
    pub fn receiver_of(&self, giver: ParticipantId) -> Option<ParticipantId> {
        self.pairs
            .iter()
            .find(|p| p.giver == giver)
            .map(|p| p.receiver)
    }

    /// 转换为历史映射（供下一轮排除使用）
    pub fn to_history(&self) -> HistoryMap {
        self.pairs.iter().map(|p| (p.giver, p.receiver)).collect()
    }

    /// 是否为给定 ID 集合上无不动点的双射
    pub fn is_derangement_of(&self, ids: &BTreeSet<ParticipantId>) -> bool {
        if self.pairs.len() != ids.len() {
            return false;
        }
        let givers: BTreeSet<_> = self.pairs.iter().map(|p| p.giver).collect();
        let receivers: BTreeSet<_> = self.pairs.iter().map(|p| p.receiver).collect();
        givers == *ids
            && receivers == *ids
            && self.pairs.iter().all(|p| p.giver != p.receiver)
    }
}

// ==========================================
// HistoryMap - 历史配对映射
// ==========================================
// 缺失条目不施加约束
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct HistoryMap(BTreeMap<ParticipantId, ParticipantId>);

impl HistoryMap {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, giver: ParticipantId, receiver: ParticipantId) {
        self.0.insert(giver, receiver);
    }

    /// 上一轮该送礼人的收礼人
    pub fn previous_receiver(&self, giver: ParticipantId) -> Option<ParticipantId> {
        self.0.get(&giver).copied()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl FromIterator<(ParticipantId, ParticipantId)> for HistoryMap {
    fn from_iter<T: IntoIterator<Item = (ParticipantId, ParticipantId)>>(iter: T) -> Self {
        Self(iter.into_iter().collect())
    }
}

// ==========================================
// RevealRecord - 揭晓记录（通知投递载荷）
// ==========================================
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RevealRecord {
    pub round: Round,
    pub giver: Participant,
    pub receiver: Participant,
}

// ==========================================
// StoredPairing - 已提交的配对行
// ==========================================
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StoredPairing {
    pub round: Round,
    pub giver_id: ParticipantId,
    pub receiver_id: ParticipantId,
    pub created_at: NaiveDateTime,
}

// ==========================================
// OpenStat - 打开追踪计数
// ==========================================
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OpenStat {
    pub participant_id: ParticipantId,
    pub round: Round,
    pub first_opened_at: NaiveDateTime,
    pub last_opened_at: NaiveDateTime,
    pub open_count: i64,
    pub last_ip: Option<String>,
    pub last_user_agent: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn pid(v: i64) -> ParticipantId {
        ParticipantId(v)
    }

    #[test]
    fn test_receiver_lookup_and_history() {
        let a = Assignment::new(vec![
            Pairing { giver: pid(1), receiver: pid(2) },
            Pairing { giver: pid(2), receiver: pid(1) },
        ]);
        assert_eq!(a.receiver_of(pid(1)), Some(pid(2)));
        assert_eq!(a.receiver_of(pid(3)), None);

        let h = a.to_history();
        assert_eq!(h.previous_receiver(pid(2)), Some(pid(1)));
        assert_eq!(h.len(), 2);
    }

    #[test]
    fn test_is_derangement_of() {
        let ids: BTreeSet<_> = [pid(1), pid(2), pid(3)].into_iter().collect();

        let ok = Assignment::new(vec![
            Pairing { giver: pid(1), receiver: pid(2) },
            Pairing { giver: pid(2), receiver: pid(3) },
            Pairing { giver: pid(3), receiver: pid(1) },
        ]);
        assert!(ok.is_derangement_of(&ids));

        let fixed_point = Assignment::new(vec![
            Pairing { giver: pid(1), receiver: pid(1) },
            Pairing { giver: pid(2), receiver: pid(3) },
            Pairing { giver: pid(3), receiver: pid(2) },
        ]);
        assert!(!fixed_point.is_derangement_of(&ids));

        let double_receive = Assignment::new(vec![
            Pairing { giver: pid(1), receiver: pid(2) },
            Pairing { giver: pid(2), receiver: pid(1) },
            Pairing { giver: pid(3), receiver: pid(1) },
        ]);
        assert!(!double_receive.is_derangement_of(&ids));
    }
}
