// ==========================================
// 礼物交换抽签系统 - 名单校验
// ==========================================
// 职责: 调用引擎前拒绝结构性无效名单
// 说明: 可行性不做闭式预判，由搜索穷尽发现；这里只给诊断提示
// ==========================================

use crate::domain::{GroupTag, Participant};
use crate::engine::error::SessionError;
use std::collections::{BTreeMap, HashSet};

/// 最少参与人数
pub const MIN_PARTICIPANTS: usize = 2;

/// 校验名单结构
///
/// # 规则
/// 1. 人数 >= 2
/// 2. id 必须为正数（0/负数视为缺失）
/// 3. id 不得重复
pub fn validate_roster(participants: &[Participant]) -> Result<(), SessionError> {
    if participants.len() < MIN_PARTICIPANTS {
        return Err(SessionError::Validation(format!(
            "参与人数不足: {} < {}",
            participants.len(),
            MIN_PARTICIPANTS
        )));
    }

    let mut seen = HashSet::with_capacity(participants.len());
    for (idx, p) in participants.iter().enumerate() {
        if p.id.0 <= 0 {
            return Err(SessionError::Validation(format!(
                "第 {} 条名单记录缺少有效 id ({})",
                idx + 1,
                p.id
            )));
        }
        if !seen.insert(p.id) {
            return Err(SessionError::Validation(format!(
                "参与者 id 重复: {}",
                p.id
            )));
        }
    }

    Ok(())
}

/// 最大分组及其人数
///
/// 最大分组超过半数时必然无解（鸽巢原理），仅用于日志提示
pub fn largest_group(participants: &[Participant]) -> Option<(GroupTag, usize)> {
    let mut sizes: BTreeMap<GroupTag, usize> = BTreeMap::new();
    for p in participants {
        *sizes.entry(p.group).or_default() += 1;
    }
    sizes.into_iter().max_by_key(|(_, n)| *n)
}

/// 是否存在超过半数的分组
pub fn has_dominant_group(participants: &[Participant]) -> bool {
    largest_group(participants)
        .map(|(_, n)| n * 2 > participants.len())
        .unwrap_or(false)
}
